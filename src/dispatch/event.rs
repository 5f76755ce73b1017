//! Inbound event surface
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::BTreeMap;

use crate::definitions::{CommandKind, ComponentKind, LifecycleEvent};

/// The tagged union of events the dispatcher consumes from the transport.
///
/// The core only requires the stable discriminant plus the identifying
/// string; everything platform-specific stays behind the responder.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// An application-command invocation.
    Command {
        name: String,
        kind: CommandKind,
        user_id: String,
        guild_id: Option<String>,
        locale: Option<String>,
        /// Option values flattened by name; subcommand paths join with '.'.
        options: BTreeMap<String, serde_json::Value>,
    },
    /// An autocomplete request for one focused option.
    Autocomplete {
        command: String,
        option: String,
        input: String,
        user_id: String,
        locale: Option<String>,
    },
    /// A message-component interaction or modal submission.
    Component {
        custom_id: String,
        kind: ComponentKind,
        user_id: String,
        guild_id: Option<String>,
        locale: Option<String>,
        /// Selected values for select menus.
        values: Vec<String>,
        /// Submitted inputs for modals, keyed by field custom id.
        fields: BTreeMap<String, String>,
    },
    /// A lifecycle event from the gateway.
    Lifecycle { event: LifecycleEvent },
    /// A scheduled task firing.
    Scheduled { task: String },
}

impl InboundEvent {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::Autocomplete { .. } => "autocomplete",
            Self::Component { .. } => "component",
            Self::Lifecycle { .. } => "lifecycle",
            Self::Scheduled { .. } => "scheduled",
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Command { user_id, .. }
            | Self::Autocomplete { user_id, .. }
            | Self::Component { user_id, .. } => Some(user_id),
            Self::Lifecycle { .. } | Self::Scheduled { .. } => None,
        }
    }

    pub fn locale(&self) -> Option<&str> {
        match self {
            Self::Command { locale, .. }
            | Self::Autocomplete { locale, .. }
            | Self::Component { locale, .. } => locale.as_deref(),
            Self::Lifecycle { .. } | Self::Scheduled { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        let event = InboundEvent::Lifecycle {
            event: LifecycleEvent::Ready,
        };
        assert_eq!(event.kind_label(), "lifecycle");
        assert_eq!(event.user_id(), None);
    }
}
