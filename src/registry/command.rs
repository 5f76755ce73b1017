//! Command registry with the autocomplete sub-index
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use super::validators;
use super::Registry;
use crate::definitions::{AutocompleteSource, CommandDefinition, CommandKind, CommandOption};

/// Registry for application commands.
///
/// The nested sub-index maps a command name (the static key) to the
/// autocomplete sources found anywhere in its option tree, keyed by option
/// name. It is rebuilt for a command on every successful registration, so
/// overwriting a command also replaces its autocomplete entries.
pub struct CommandRegistry {
    inner: Registry<CommandDefinition>,
    autocomplete: DashMap<String, HashMap<String, AutocompleteSource>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            inner: Registry::new(
                "Command",
                vec![
                    Box::new(validators::CommandSchemaValidator),
                    Box::new(validators::RunActionValidator),
                ],
            ),
            autocomplete: DashMap::new(),
        }
    }

    pub fn register(&self, item: CommandDefinition) {
        let Some(stored) = self.inner.register(item) else {
            return;
        };

        if stored.kind == CommandKind::ChatInput {
            let mut sources = HashMap::new();
            collect_autocomplete(&stored.options, &mut sources);
            if sources.is_empty() {
                self.autocomplete.remove(&stored.name);
            } else {
                self.autocomplete.insert(stored.name.clone(), sources);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<CommandDefinition>> {
        self.inner.get(name)
    }

    pub fn values(&self) -> Vec<Arc<CommandDefinition>> {
        self.inner.values()
    }

    /// The autocomplete source for one option of one command, if any.
    pub fn autocomplete_source(
        &self,
        command: &str,
        option: &str,
    ) -> Option<AutocompleteSource> {
        self.autocomplete
            .get(command)
            .and_then(|sources| sources.get(option).cloned())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk an option tree collecting autocomplete sources by option name,
/// descending into subcommands and groups.
fn collect_autocomplete(
    options: &[CommandOption],
    sources: &mut HashMap<String, AutocompleteSource>,
) {
    for option in options {
        if let Some(source) = &option.autocomplete {
            sources.insert(option.name.clone(), source.clone());
        }
        if option.kind.is_nesting() {
            collect_autocomplete(&option.options, sources);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{HandlerAction, OptionKind, ReplySpec};

    fn reply_action() -> HandlerAction {
        HandlerAction::Reply(ReplySpec {
            content: "ok".into(),
            ephemeral: false,
        })
    }

    fn string_option(name: &str, autocomplete: Option<Vec<&str>>) -> CommandOption {
        CommandOption {
            name: name.into(),
            description: "an option".into(),
            kind: OptionKind::String,
            required: false,
            choices: vec![],
            options: vec![],
            autocomplete: autocomplete
                .map(|v| AutocompleteSource::Static(v.into_iter().map(String::from).collect())),
        }
    }

    fn command(name: &str, options: Vec<CommandOption>) -> CommandDefinition {
        CommandDefinition {
            name: name.into(),
            kind: CommandKind::ChatInput,
            description: "a command".into(),
            options,
            guilds: vec![],
            default_member_permissions: None,
            contexts: None,
            middlewares: vec![],
            silent: true,
            action: reply_action(),
        }
    }

    #[test]
    fn test_autocomplete_indexed_from_top_level() {
        let registry = CommandRegistry::new();
        registry.register(command(
            "play",
            vec![string_option("track", Some(vec!["one", "two"]))],
        ));

        assert!(registry.autocomplete_source("play", "track").is_some());
        assert!(registry.autocomplete_source("play", "volume").is_none());
        assert!(registry.autocomplete_source("stop", "track").is_none());
    }

    #[test]
    fn test_autocomplete_indexed_through_subcommands() {
        let registry = CommandRegistry::new();
        let sub = CommandOption {
            name: "add".into(),
            description: "add something".into(),
            kind: OptionKind::Subcommand,
            required: false,
            choices: vec![],
            options: vec![string_option("item", Some(vec!["apple"]))],
            autocomplete: None,
        };
        registry.register(command("list", vec![sub]));

        assert!(registry.autocomplete_source("list", "item").is_some());
    }

    #[test]
    fn test_overwrite_replaces_autocomplete_entries() {
        let registry = CommandRegistry::new();
        registry.register(command(
            "play",
            vec![string_option("track", Some(vec!["one"]))],
        ));
        registry.register(command("play", vec![string_option("track", None)]));

        assert_eq!(registry.len(), 1);
        assert!(registry.autocomplete_source("play", "track").is_none());
    }

    #[test]
    fn test_invalid_command_skipped() {
        let registry = CommandRegistry::new();
        // Chat input commands require a description.
        let mut bad = command("ping", vec![]);
        bad.description = String::new();
        registry.register(bad);

        assert!(registry.get("ping").is_none());
    }
}
