//! Application-command handler definitions
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Add interaction contexts and default member permissions
//! - 1.0.0: Initial creation

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Deserialize;

use super::action::HandlerAction;
use crate::middleware::Middleware;

/// The three application-command kinds Discord dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    ChatInput,
    User,
    Message,
}

impl CommandKind {
    /// Numeric code used on the wire.
    pub fn code(&self) -> u8 {
        match self {
            Self::ChatInput => 1,
            Self::User => 2,
            Self::Message => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ChatInput => "/",
            Self::User => "User",
            Self::Message => "Message",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Option node kinds, matching the wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Subcommand,
    SubcommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl OptionKind {
    pub fn code(&self) -> u8 {
        match self {
            Self::Subcommand => 1,
            Self::SubcommandGroup => 2,
            Self::String => 3,
            Self::Integer => 4,
            Self::Boolean => 5,
            Self::User => 6,
            Self::Channel => 7,
            Self::Role => 8,
            Self::Mentionable => 9,
            Self::Number => 10,
            Self::Attachment => 11,
        }
    }

    /// Only subcommands and groups carry child options.
    pub fn is_nesting(&self) -> bool {
        matches!(self, Self::Subcommand | Self::SubcommandGroup)
    }
}

/// A fixed choice presented for an option.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: serde_json::Value,
}

/// Async callback producing autocomplete suggestions as (name, value) pairs.
pub type AutocompleteFn = Arc<
    dyn Fn(String) -> BoxFuture<'static, anyhow::Result<Vec<(String, String)>>> + Send + Sync,
>;

/// Where an option's autocomplete suggestions come from.
///
/// Manifests declare static suggestion lists; host code may register native
/// callbacks for dynamic sources.
#[derive(Clone)]
pub enum AutocompleteSource {
    /// Fixed list, filtered by the focused input's prefix at dispatch time.
    Static(Vec<String>),
    /// Host callback receiving the focused input.
    Native(AutocompleteFn),
}

impl fmt::Debug for AutocompleteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(values) => f.debug_tuple("Static").field(values).finish(),
            Self::Native(_) => f.write_str("Native(..)"),
        }
    }
}

/// One node of a command's option tree.
#[derive(Debug, Clone)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
    pub choices: Vec<OptionChoice>,
    /// Child options; only meaningful for subcommands and groups.
    pub options: Vec<CommandOption>,
    pub autocomplete: Option<AutocompleteSource>,
}

/// An application-command handler definition.
#[derive(Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub kind: CommandKind,
    /// Required for ChatInput commands, ignored for context menus.
    pub description: String,
    pub options: Vec<CommandOption>,
    /// Guild IDs this command deploys to; empty means global scope.
    pub guilds: Vec<String>,
    /// Permission bit set serialized as a decimal string, as on the wire.
    pub default_member_permissions: Option<String>,
    /// Interaction context codes (0 guild, 1 bot DM, 2 private channel).
    pub contexts: Option<Vec<u8>>,
    /// Middleware chain run around the action, in order.
    pub middlewares: Vec<Middleware>,
    pub silent: bool,
    pub action: HandlerAction,
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("options", &self.options)
            .field("guilds", &self.guilds)
            .field("default_member_permissions", &self.default_member_permissions)
            .field("contexts", &self.contexts)
            .field("middlewares", &self.middlewares.len())
            .field("silent", &self.silent)
            .field("action", &self.action)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_kind_codes() {
        assert_eq!(CommandKind::ChatInput.code(), 1);
        assert_eq!(CommandKind::User.code(), 2);
        assert_eq!(CommandKind::Message.code(), 3);
    }

    #[test]
    fn test_option_kind_nesting() {
        assert!(OptionKind::Subcommand.is_nesting());
        assert!(OptionKind::SubcommandGroup.is_nesting());
        assert!(!OptionKind::String.is_nesting());
    }

    #[test]
    fn test_kind_deserialize() {
        let kind: CommandKind = serde_yaml::from_str("chat_input").unwrap();
        assert_eq!(kind, CommandKind::ChatInput);
        let kind: OptionKind = serde_yaml::from_str("subcommand_group").unwrap();
        assert_eq!(kind, OptionKind::SubcommandGroup);
    }
}
