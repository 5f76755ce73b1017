//! Lifecycle event handler definitions
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::fmt;

use serde::Deserialize;

use super::action::HandlerAction;

/// The closed set of lifecycle events handlers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Ready,
    MessageCreate,
    GuildCreate,
    GuildDelete,
    GuildMemberAdd,
    GuildMemberRemove,
    InteractionCreate,
    Error,
    Shutdown,
}

impl LifecycleEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::MessageCreate => "message_create",
            Self::GuildCreate => "guild_create",
            Self::GuildDelete => "guild_delete",
            Self::GuildMemberAdd => "guild_member_add",
            Self::GuildMemberRemove => "guild_member_remove",
            Self::InteractionCreate => "interaction_create",
            Self::Error => "error",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A lifecycle event handler definition.
#[derive(Debug, Clone)]
pub struct EventDefinition {
    pub event: LifecycleEvent,
    /// Identifier within the event registry; defaults to the event label
    /// but manifests may name handlers to register several per event.
    pub name: String,
    /// Fire at most one time, then stay consumed.
    pub once: bool,
    pub silent: bool,
    pub action: HandlerAction,
}
