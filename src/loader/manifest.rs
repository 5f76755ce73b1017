//! Module manifest parsing and definition registration
//!
//! A module is a YAML manifest declaring handler definitions. Importing a
//! module parses the file, loads its `includes` through the loader (the
//! path by which import cycles arise), resolves declared actions and
//! middlewares against the host tables, and registers every definition.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::path::Path;
use std::sync::Arc;

use log::error;
use serde::Deserialize;

use super::ModuleLoader;
use crate::core::ManifestError;
use crate::definitions::{
    ActionTable, AutocompleteSource, CommandDefinition, CommandKind, CommandOption,
    ComponentDefinition, ComponentKind, EventDefinition, ExecSpec, HandlerAction, LifecycleEvent,
    OptionChoice, OptionKind, ParamsSchema, ReplySpec, Schedule, TaskDefinition,
};
use crate::middleware::MiddlewareTable;

/// Root document of a module manifest.
#[derive(Debug, Default, Deserialize)]
pub struct ModuleManifest {
    /// Other module files to import first, relative to this file.
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub commands: Vec<CommandManifest>,
    #[serde(default)]
    pub components: Vec<ComponentManifest>,
    #[serde(default)]
    pub events: Vec<EventManifest>,
    #[serde(default)]
    pub tasks: Vec<TaskManifest>,
}

/// Declarative action body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionManifest {
    Reply(ReplyManifest),
    Builtin(String),
    Exec(ExecManifest),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReplyManifest {
    Short(String),
    Full {
        content: String,
        #[serde(default)]
        ephemeral: bool,
    },
}

#[derive(Debug, Deserialize)]
pub struct ExecManifest {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_exec_timeout")]
    pub timeout_secs: u64,
}

fn default_exec_timeout() -> u64 {
    30
}

impl ActionManifest {
    fn resolve(self, actions: &ActionTable) -> HandlerAction {
        match self {
            Self::Reply(ReplyManifest::Short(content)) => HandlerAction::Reply(ReplySpec {
                content,
                ephemeral: false,
            }),
            Self::Reply(ReplyManifest::Full { content, ephemeral }) => {
                HandlerAction::Reply(ReplySpec { content, ephemeral })
            }
            Self::Builtin(name) => actions.resolve(&name),
            Self::Exec(exec) => HandlerAction::Exec(ExecSpec {
                command: exec.command,
                args: exec.args,
                timeout_secs: exec.timeout_secs,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandManifest {
    pub name: String,
    #[serde(rename = "type", default = "default_command_kind")]
    pub kind: CommandKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: Vec<OptionManifest>,
    #[serde(default)]
    pub guilds: Vec<String>,
    #[serde(default)]
    pub default_member_permissions: Option<String>,
    #[serde(default)]
    pub contexts: Option<Vec<u8>>,
    #[serde(default)]
    pub middlewares: Vec<String>,
    #[serde(default)]
    pub silent: bool,
    pub action: ActionManifest,
}

fn default_command_kind() -> CommandKind {
    CommandKind::ChatInput
}

#[derive(Debug, Deserialize)]
pub struct OptionManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub choices: Vec<OptionChoice>,
    #[serde(default)]
    pub options: Vec<OptionManifest>,
    /// Static autocomplete suggestions, filtered by prefix at dispatch.
    #[serde(default)]
    pub suggest: Vec<String>,
}

impl OptionManifest {
    fn into_option(self) -> CommandOption {
        CommandOption {
            name: self.name,
            description: self.description,
            kind: self.kind,
            required: self.required,
            choices: self.choices,
            options: self.options.into_iter().map(|o| o.into_option()).collect(),
            autocomplete: if self.suggest.is_empty() {
                None
            } else {
                Some(AutocompleteSource::Static(self.suggest))
            },
        }
    }
}

impl CommandManifest {
    fn into_definition(
        self,
        actions: &ActionTable,
        middlewares: &MiddlewareTable,
    ) -> Result<CommandDefinition, ManifestError> {
        let mut resolved_middlewares = Vec::with_capacity(self.middlewares.len());
        for name in &self.middlewares {
            match middlewares.get(name) {
                Some(middleware) => resolved_middlewares.push(middleware),
                None => {
                    return Err(ManifestError::Invalid(format!(
                        "command \"{}\" references unknown middleware \"{name}\"",
                        self.name
                    )))
                }
            }
        }

        Ok(CommandDefinition {
            name: self.name,
            kind: self.kind,
            description: self.description,
            options: self.options.into_iter().map(|o| o.into_option()).collect(),
            guilds: self.guilds,
            default_member_permissions: self.default_member_permissions,
            contexts: self.contexts,
            middlewares: resolved_middlewares,
            silent: self.silent,
            action: self.action.resolve(actions),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ComponentManifest {
    pub custom_id: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    #[serde(default)]
    pub params: ParamsSchema,
    #[serde(default)]
    pub silent: bool,
    pub action: ActionManifest,
}

impl ComponentManifest {
    fn into_definition(self, actions: &ActionTable) -> ComponentDefinition {
        ComponentDefinition {
            custom_id: self.custom_id,
            kind: self.kind,
            params: self.params,
            silent: self.silent,
            action: self.action.resolve(actions),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EventManifest {
    pub event: LifecycleEvent,
    /// Registry name; defaults to the event label.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub once: bool,
    #[serde(default)]
    pub silent: bool,
    pub action: ActionManifest,
}

impl EventManifest {
    fn into_definition(self, actions: &ActionTable) -> EventDefinition {
        let name = self
            .name
            .unwrap_or_else(|| self.event.label().to_string());
        EventDefinition {
            event: self.event,
            name,
            once: self.once,
            silent: self.silent,
            action: self.action.resolve(actions),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskManifest {
    pub name: String,
    pub schedule: Schedule,
    #[serde(default)]
    pub run_immediately: bool,
    #[serde(default)]
    pub silent: bool,
    pub action: ActionManifest,
}

impl TaskManifest {
    fn into_definition(self, actions: &ActionTable) -> TaskDefinition {
        TaskDefinition {
            name: self.name,
            schedule: self.schedule,
            run_immediately: self.run_immediately,
            silent: self.silent,
            action: self.action.resolve(actions),
        }
    }
}

/// Import one manifest file: parse, load includes, register definitions.
///
/// Registration failures are contained per definition by the registries;
/// only unreadable or unparseable files fail the module itself.
pub async fn import_manifest(
    loader: &Arc<ModuleLoader>,
    path: &Path,
) -> Result<(), ManifestError> {
    let contents = tokio::fs::read_to_string(path).await?;
    let manifest: ModuleManifest = serde_yaml::from_str(&contents)?;

    // Includes load first, mirroring import side effects: a cycle back to
    // this file is caught by the module cache.
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for include in &manifest.includes {
        loader.load_module(base.join(include)).await;
    }

    let registries = loader.registries();
    let actions = loader.actions();
    let middlewares = loader.middlewares();

    for command in manifest.commands {
        match command.into_definition(&actions, &middlewares) {
            Ok(definition) => registries.commands.register(definition),
            Err(e) => error!("Skipping command in {}: {e}", path.display()),
        }
    }
    for component in manifest.components {
        registries
            .components
            .register(component.into_definition(&actions));
    }
    for event in manifest.events {
        registries.events.register(event.into_definition(&actions));
    }
    for task in manifest.tasks {
        registries.tasks.register(task.into_definition(&actions));
    }

    Ok(())
}
