//! Serenity event adapter
//!
//! Translates gateway events into the runtime's inbound event surface and
//! hands them to the dispatcher. Command sync and the task runner start on
//! the first ready event.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info};
use serenity::async_trait;
use serenity::model::application::command::CommandType;
use serenity::model::application::component::{ActionRowComponent, ComponentType};
use serenity::model::application::interaction::application_command::CommandDataOption;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, Member, UnavailableGuild};
use serenity::model::id::GuildId;
use serenity::model::user::User;
use serenity::prelude::{Context, EventHandler};

use super::commands_api::DiscordCommandsGateway;
use super::responder::{ResponderTarget, SerenityResponder};
use crate::definitions::{CommandKind, ComponentKind, LifecycleEvent};
use crate::dispatch::{Dispatcher, InboundEvent};
use crate::registry::Registries;
use crate::schedule::TaskRunner;
use crate::sync::sync_commands;

/// Serenity [`EventHandler`] driving the dispatch runtime.
pub struct GatewayHandler {
    dispatcher: Arc<Dispatcher>,
    registries: Arc<Registries>,
    task_runner: Arc<TaskRunner>,
    /// Guild IDs from configuration, merged into the sync iteration set.
    configured_guilds: Vec<String>,
    started: AtomicBool,
}

impl GatewayHandler {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        registries: Arc<Registries>,
        task_runner: Arc<TaskRunner>,
        configured_guilds: Vec<String>,
    ) -> Self {
        Self {
            dispatcher,
            registries,
            task_runner,
            configured_guilds,
            started: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EventHandler for GatewayHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Connected as {}", ready.user.name);

        // Reconnects re-deliver ready; sync and the task runner run once.
        if !self.started.swap(true, Ordering::SeqCst) {
            let mut known_guilds: Vec<String> = self.configured_guilds.clone();
            known_guilds.extend(ready.guilds.iter().map(|guild| guild.id.0.to_string()));
            known_guilds.sort();
            known_guilds.dedup();

            let gateway = DiscordCommandsGateway::new(Arc::clone(&ctx.http));
            let commands = self.registries.commands.values();
            let services = self.dispatcher.services();

            match sync_commands(&gateway, &commands, &services.translator, &known_guilds).await {
                Ok(report) => {
                    if report.global_replaced || !report.guilds_replaced.is_empty() {
                        info!(
                            "Command sync complete (global replaced: {}, guilds replaced: {})",
                            report.global_replaced,
                            report.guilds_replaced.len()
                        );
                    } else {
                        info!("Commands already in sync; no replace calls issued.");
                    }
                }
                Err(e) => {
                    // Startup must not proceed with commands in an unknown
                    // deployment state.
                    error!("Command sync failed: {e}");
                    ctx.shard.shutdown_clean();
                    std::process::exit(1);
                }
            }

            self.task_runner
                .start(Arc::clone(&self.dispatcher), &self.registries);
        }

        self.dispatcher.emit(LifecycleEvent::Ready).await;
    }

    async fn message(&self, _ctx: Context, _message: Message) {
        self.dispatcher.emit(LifecycleEvent::MessageCreate).await;
    }

    async fn guild_create(&self, _ctx: Context, _guild: Guild, _is_new: bool) {
        self.dispatcher.emit(LifecycleEvent::GuildCreate).await;
    }

    async fn guild_delete(
        &self,
        _ctx: Context,
        _incomplete: UnavailableGuild,
        _full: Option<Guild>,
    ) {
        self.dispatcher.emit(LifecycleEvent::GuildDelete).await;
    }

    async fn guild_member_addition(&self, _ctx: Context, _member: Member) {
        self.dispatcher.emit(LifecycleEvent::GuildMemberAdd).await;
    }

    async fn guild_member_removal(
        &self,
        _ctx: Context,
        _guild_id: GuildId,
        _user: User,
        _member: Option<Member>,
    ) {
        self.dispatcher
            .emit(LifecycleEvent::GuildMemberRemove)
            .await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        self.dispatcher.emit(LifecycleEvent::InteractionCreate).await;

        match interaction {
            Interaction::ApplicationCommand(command) => {
                let Some(kind) = command_kind(command.data.kind) else {
                    return;
                };
                let mut options = BTreeMap::new();
                flatten_options(&command.data.options, "", &mut options);

                let event = InboundEvent::Command {
                    name: command.data.name.clone(),
                    kind,
                    user_id: command.user.id.0.to_string(),
                    guild_id: command.guild_id.map(|id| id.0.to_string()),
                    locale: Some(command.locale.clone()),
                    options,
                };
                let responder = SerenityResponder::new(
                    Arc::clone(&ctx.http),
                    ResponderTarget::Command(command),
                );
                self.dispatcher.dispatch(event, Some(Arc::new(responder))).await;
            }
            Interaction::Autocomplete(autocomplete) => {
                let Some((option, input)) = find_focused(&autocomplete.data.options) else {
                    return;
                };
                let event = InboundEvent::Autocomplete {
                    command: autocomplete.data.name.clone(),
                    option,
                    input,
                    user_id: autocomplete.user.id.0.to_string(),
                    locale: Some(autocomplete.locale.clone()),
                };
                let responder = SerenityResponder::new(
                    Arc::clone(&ctx.http),
                    ResponderTarget::Autocomplete(autocomplete),
                );
                self.dispatcher.dispatch(event, Some(Arc::new(responder))).await;
            }
            Interaction::MessageComponent(component) => {
                let Some(kind) = component_kind(component.data.component_type) else {
                    return;
                };
                let event = InboundEvent::Component {
                    custom_id: component.data.custom_id.clone(),
                    kind,
                    user_id: component.user.id.0.to_string(),
                    guild_id: component.guild_id.map(|id| id.0.to_string()),
                    locale: Some(component.locale.clone()),
                    values: component.data.values.clone(),
                    fields: BTreeMap::new(),
                };
                let responder = SerenityResponder::new(
                    Arc::clone(&ctx.http),
                    ResponderTarget::Component(component),
                );
                self.dispatcher.dispatch(event, Some(Arc::new(responder))).await;
            }
            Interaction::ModalSubmit(modal) => {
                let mut fields = BTreeMap::new();
                for row in &modal.data.components {
                    for component in &row.components {
                        if let ActionRowComponent::InputText(input) = component {
                            fields.insert(input.custom_id.clone(), input.value.clone());
                        }
                    }
                }

                let event = InboundEvent::Component {
                    custom_id: modal.data.custom_id.clone(),
                    kind: ComponentKind::Modal,
                    user_id: modal.user.id.0.to_string(),
                    guild_id: modal.guild_id.map(|id| id.0.to_string()),
                    locale: Some(modal.locale.clone()),
                    values: Vec::new(),
                    fields,
                };
                let responder = SerenityResponder::new(
                    Arc::clone(&ctx.http),
                    ResponderTarget::Modal(modal),
                );
                self.dispatcher.dispatch(event, Some(Arc::new(responder))).await;
            }
            Interaction::Ping(_) => {
                // Health checks are answered by the transport itself.
            }
        }
    }
}

fn command_kind(kind: CommandType) -> Option<CommandKind> {
    match kind {
        CommandType::ChatInput => Some(CommandKind::ChatInput),
        CommandType::User => Some(CommandKind::User),
        CommandType::Message => Some(CommandKind::Message),
        _ => None,
    }
}

/// The 0.11 gateway models every select menu as one component type; the
/// router sees them as string selects.
fn component_kind(kind: ComponentType) -> Option<ComponentKind> {
    match kind {
        ComponentType::Button => Some(ComponentKind::Button),
        ComponentType::SelectMenu => Some(ComponentKind::StringSelect),
        _ => None,
    }
}

/// Flatten option values by name; subcommand paths join with '.'.
fn flatten_options(
    options: &[CommandDataOption],
    prefix: &str,
    out: &mut BTreeMap<String, serde_json::Value>,
) {
    for option in options {
        let key = if prefix.is_empty() {
            option.name.clone()
        } else {
            format!("{prefix}.{}", option.name)
        };

        if option.options.is_empty() {
            if let Some(value) = &option.value {
                out.insert(key, value.clone());
            }
        } else {
            flatten_options(&option.options, &key, out);
        }
    }
}

/// Locate the focused option of an autocomplete interaction, descending
/// into subcommands.
fn find_focused(options: &[CommandDataOption]) -> Option<(String, String)> {
    for option in options {
        if option.focused {
            let input = option
                .value
                .as_ref()
                .and_then(|value| value.as_str().map(String::from))
                .unwrap_or_default();
            return Some((option.name.clone(), input));
        }
        if let Some(found) = find_focused(&option.options) {
            return Some(found);
        }
    }
    None
}
