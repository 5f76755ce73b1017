//! Shared invocation context for handler bodies
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use super::event::InboundEvent;
use super::responder::Responder;
use crate::definitions::ParamValue;
use crate::i18n::Translator;
use crate::store::RecordStore;

/// Collaborators shared by every handler invocation.
pub struct Services {
    pub translator: Arc<Translator>,
    pub store: Arc<dyn RecordStore>,
}

impl Services {
    pub fn new(translator: Arc<Translator>, store: Arc<dyn RecordStore>) -> Self {
        Self { translator, store }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            translator: Arc::new(Translator::empty("en-US")),
            store: Arc::new(crate::store::MemoryStore::new()),
        }
    }
}

/// Per-invocation context handed to actions and middlewares.
pub struct HandlerContext {
    /// Correlates log lines across a single dispatch.
    pub request_id: Uuid,
    pub event: InboundEvent,
    /// Route parameters extracted and coerced by the router; empty for
    /// commands, tasks and lifecycle events.
    pub params: BTreeMap<String, ParamValue>,
    responder: Option<Arc<dyn Responder>>,
    pub services: Arc<Services>,
}

impl HandlerContext {
    pub fn new(
        event: InboundEvent,
        params: BTreeMap<String, ParamValue>,
        responder: Option<Arc<dyn Responder>>,
        services: Arc<Services>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event,
            params,
            responder,
            services,
        }
    }

    pub fn responder(&self) -> Option<Arc<dyn Responder>> {
        self.responder.clone()
    }

    pub fn command_name(&self) -> Option<&str> {
        match &self.event {
            InboundEvent::Command { name, .. } => Some(name),
            InboundEvent::Autocomplete { command, .. } => Some(command),
            _ => None,
        }
    }

    pub fn custom_id(&self) -> Option<&str> {
        match &self.event {
            InboundEvent::Component { custom_id, .. } => Some(custom_id),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.event.user_id()
    }

    /// Locale for user-facing text: the event's, or the default.
    pub fn locale(&self) -> &str {
        self.event
            .locale()
            .unwrap_or_else(|| self.services.translator.default_locale())
    }

    /// Translate a key in this invocation's locale.
    pub fn t(&self, key: &str) -> String {
        self.services.translator.translate(self.locale(), key, &[])
    }

    /// String value of a command option.
    pub fn option_str(&self, name: &str) -> Option<&str> {
        match &self.event {
            InboundEvent::Command { options, .. } => {
                options.get(name).and_then(|v| v.as_str())
            }
            _ => None,
        }
    }

    /// Integer value of a command option.
    pub fn option_i64(&self, name: &str) -> Option<i64> {
        match &self.event {
            InboundEvent::Command { options, .. } => options.get(name).and_then(|v| v.as_i64()),
            _ => None,
        }
    }

    /// Submitted modal field by custom id.
    pub fn field(&self, name: &str) -> Option<&str> {
        match &self.event {
            InboundEvent::Component { fields, .. } => fields.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Selected values of a select-menu interaction.
    pub fn values(&self) -> &[String] {
        match &self.event {
            InboundEvent::Component { values, .. } => values,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::CommandKind;

    #[test]
    fn test_option_accessors() {
        let mut options = BTreeMap::new();
        options.insert("name".to_string(), serde_json::json!("muppet"));
        options.insert("count".to_string(), serde_json::json!(3));

        let ctx = HandlerContext::new(
            InboundEvent::Command {
                name: "persona".into(),
                kind: CommandKind::ChatInput,
                user_id: "123456789012345678".into(),
                guild_id: None,
                locale: Some("es-ES".into()),
                options,
            },
            BTreeMap::new(),
            None,
            Arc::new(Services::for_tests()),
        );

        assert_eq!(ctx.command_name(), Some("persona"));
        assert_eq!(ctx.option_str("name"), Some("muppet"));
        assert_eq!(ctx.option_i64("count"), Some(3));
        assert_eq!(ctx.option_str("absent"), None);
        assert_eq!(ctx.locale(), "es-ES");
    }

    #[test]
    fn test_locale_falls_back_to_default() {
        let ctx = HandlerContext::new(
            InboundEvent::Scheduled {
                task: "beat".into(),
            },
            BTreeMap::new(),
            None,
            Arc::new(Services::for_tests()),
        );
        assert_eq!(ctx.locale(), "en-US");
    }
}
