//! # Event Dispatch
//!
//! The outermost dispatch boundary: routes inbound events to registered
//! handlers, runs command middleware chains, resolves component custom ids
//! through the router, and serves autocomplete requests. Any error thrown
//! by a middleware or handler is caught exactly once here, logged with the
//! request id, and converted into a single user-visible failure reply,
//! guarded so an already-acknowledged event never receives a second
//! initial response.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Add once-event tracking and scheduled-task dispatch
//! - 1.0.0: Initial implementation

pub mod context;
pub mod event;
pub mod responder;

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashSet;
use log::{debug, error, warn};

use crate::core::RouteError;
use crate::definitions::{AutocompleteSource, LifecycleEvent};
use crate::middleware::{run_chain, Terminal};
use crate::registry::Registries;
use crate::router;

pub use context::{HandlerContext, Services};
pub use event::InboundEvent;
pub use responder::Responder;

/// Routes inbound events to their handlers.
pub struct Dispatcher {
    registries: Arc<Registries>,
    services: Arc<Services>,
    /// Names of `once` event handlers that have already fired.
    once_fired: DashSet<String>,
}

impl Dispatcher {
    pub fn new(registries: Arc<Registries>, services: Arc<Services>) -> Self {
        Self {
            registries,
            services,
            once_fired: DashSet::new(),
        }
    }

    pub fn services(&self) -> Arc<Services> {
        Arc::clone(&self.services)
    }

    /// Dispatch one inbound event. Never panics and never returns an
    /// error: every failure is handled at this boundary.
    pub async fn dispatch(&self, event: InboundEvent, responder: Option<Arc<dyn Responder>>) {
        match &event {
            InboundEvent::Command { .. } => self.dispatch_command(event, responder).await,
            InboundEvent::Autocomplete { .. } => {
                self.dispatch_autocomplete(event, responder).await
            }
            InboundEvent::Component { .. } => self.dispatch_component(event, responder).await,
            InboundEvent::Lifecycle { event: lifecycle } => self.emit(*lifecycle).await,
            InboundEvent::Scheduled { .. } => self.dispatch_scheduled(event).await,
        }
    }

    async fn dispatch_command(&self, event: InboundEvent, responder: Option<Arc<dyn Responder>>) {
        let InboundEvent::Command { name, .. } = &event else {
            return;
        };

        let Some(command) = self.registries.commands.get(name) else {
            error!("Command \"{name}\" not found.");
            self.fail_reply(&responder, event.locale(), "common_errors.generic").await;
            return;
        };

        let ctx = Arc::new(HandlerContext::new(
            event,
            BTreeMap::new(),
            responder.clone(),
            Arc::clone(&self.services),
        ));

        let action = command.action.clone();
        let terminal: Terminal = Arc::new(move |ctx: Arc<HandlerContext>| {
            let action = action.clone();
            Box::pin(async move { action.invoke(ctx).await })
        });

        let middlewares = command.middlewares.clone();
        if let Err(e) = run_chain(Arc::clone(&ctx), middlewares, terminal).await {
            error!(
                "[{}] Error executing command \"{}\": {e:#}",
                ctx.request_id, command.name
            );
            self.fail_reply(&responder, Some(ctx.locale()), "common_errors.generic").await;
        }
    }

    async fn dispatch_autocomplete(
        &self,
        event: InboundEvent,
        responder: Option<Arc<dyn Responder>>,
    ) {
        let InboundEvent::Autocomplete {
            command, option, input, ..
        } = &event
        else {
            return;
        };

        if self.registries.commands.get(command).is_none() {
            return;
        }

        let Some(source) = self.registries.commands.autocomplete_source(command, option) else {
            warn!("No autocomplete handler found for option \"{option}\" in command \"{command}\"");
            return;
        };

        let choices = match source {
            AutocompleteSource::Static(values) => {
                let needle = input.to_lowercase();
                values
                    .into_iter()
                    .filter(|value| value.to_lowercase().starts_with(&needle))
                    .take(25)
                    .map(|value| (value.clone(), value))
                    .collect()
            }
            AutocompleteSource::Native(handler) => match handler(input.clone()).await {
                Ok(choices) => choices.into_iter().take(25).collect(),
                Err(e) => {
                    error!("Autocomplete error for \"{command}:{option}\": {e:#}");
                    return;
                }
            },
        };

        if let Some(responder) = responder {
            if let Err(e) = responder.suggest(choices).await {
                error!("Failed to send autocomplete response for \"{command}\": {e:#}");
            }
        }
    }

    async fn dispatch_component(&self, event: InboundEvent, responder: Option<Arc<dyn Responder>>) {
        let InboundEvent::Component {
            custom_id, kind, ..
        } = &event
        else {
            return;
        };

        let locale = event.locale().map(str::to_string);
        let resolution = router::resolve(&self.registries.components, *kind, custom_id);

        let matched = match resolution {
            Ok(matched) => matched,
            Err(RouteError::NotFound { custom_id }) => {
                error!("No matching handler found for custom id: {custom_id}");
                self.fail_reply(&responder, locale.as_deref(), "common_errors.no_handler").await;
                return;
            }
            Err(e @ RouteError::KindMismatch { .. }) => {
                error!("{e}");
                self.fail_reply(&responder, locale.as_deref(), "common_errors.no_handler").await;
                return;
            }
            Err(e @ RouteError::InvalidParams { .. }) => {
                error!("{e}");
                self.fail_reply(&responder, locale.as_deref(), "common_errors.invalid_params")
                    .await;
                return;
            }
        };

        let ctx = Arc::new(HandlerContext::new(
            event,
            matched.params,
            responder.clone(),
            Arc::clone(&self.services),
        ));

        debug!(
            "[{}] component \"{}\" routed to \"{}\"",
            ctx.request_id,
            ctx.custom_id().unwrap_or("?"),
            matched.handler.custom_id
        );

        if let Err(e) = matched.handler.action.invoke(Arc::clone(&ctx)).await {
            error!(
                "[{}] Error executing handler for \"{}\": {e:#}",
                ctx.request_id, matched.handler.custom_id
            );
            self.fail_reply(&responder, Some(ctx.locale()), "common_errors.generic").await;
        }
    }

    async fn dispatch_scheduled(&self, event: InboundEvent) {
        let InboundEvent::Scheduled { task } = &event else {
            return;
        };

        let Some(definition) = self.registries.tasks.get(task) else {
            warn!("Task \"{task}\" was requested to run but not found in registry.");
            return;
        };

        let ctx = Arc::new(HandlerContext::new(
            event.clone(),
            BTreeMap::new(),
            None,
            Arc::clone(&self.services),
        ));

        if let Err(e) = definition.action.invoke(ctx).await {
            error!("Error executing task \"{}\": {e:#}", definition.name);
        }
    }

    /// Run every handler subscribed to a lifecycle event.
    ///
    /// `once` handlers fire at most one time per process. Failures are
    /// isolated per handler.
    pub async fn emit(&self, lifecycle: LifecycleEvent) {
        for definition in self.registries.events.for_event(lifecycle) {
            if definition.once && !self.once_fired.insert(definition.name.clone()) {
                continue;
            }

            let ctx = Arc::new(HandlerContext::new(
                InboundEvent::Lifecycle { event: lifecycle },
                BTreeMap::new(),
                None,
                Arc::clone(&self.services),
            ));

            if let Err(e) = definition.action.invoke(ctx).await {
                error!(
                    "Error executing event handler for \"{}\": {e:#}",
                    definition.name
                );
            }
        }
    }

    /// Send the translated failure message for `key`, at most once.
    ///
    /// Falls back to plain English when the key has no translation, and to
    /// `follow_up` when the event was already acknowledged.
    async fn fail_reply(
        &self,
        responder: &Option<Arc<dyn Responder>>,
        locale: Option<&str>,
        key: &str,
    ) {
        let Some(responder) = responder else {
            return;
        };

        let locale = locale.unwrap_or_else(|| self.services.translator.default_locale());
        let mut message = self.services.translator.translate(locale, key, &[]);
        if crate::i18n::Translator::is_missing(&message) {
            message = match key {
                "common_errors.no_handler" => "This interaction is not handled.".to_string(),
                "common_errors.invalid_params" => {
                    "This interaction carried invalid data.".to_string()
                }
                _ => "Something went wrong while handling this interaction.".to_string(),
            };
        }

        let result = if responder.is_acknowledged() {
            responder.follow_up(&message, true).await
        } else {
            responder.reply(&message, true).await
        };

        if let Err(e) = result {
            error!("Failed to deliver failure reply: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{
        CommandDefinition, CommandKind, ComponentDefinition, ComponentKind, EventDefinition,
        HandlerAction, ParamsSchema, ReplySpec,
    };
    use crate::middleware::Middleware;
    use super::responder::test_support::RecordingResponder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn reply_action(content: &str) -> HandlerAction {
        HandlerAction::Reply(ReplySpec {
            content: content.into(),
            ephemeral: false,
        })
    }

    fn dispatcher() -> (Dispatcher, Arc<Registries>) {
        let registries = Arc::new(Registries::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registries), Arc::new(Services::for_tests()));
        (dispatcher, registries)
    }

    fn command_event(name: &str) -> InboundEvent {
        InboundEvent::Command {
            name: name.into(),
            kind: CommandKind::ChatInput,
            user_id: "123456789012345678".into(),
            guild_id: None,
            locale: None,
            options: BTreeMap::new(),
        }
    }

    fn component_event(custom_id: &str, kind: ComponentKind) -> InboundEvent {
        InboundEvent::Component {
            custom_id: custom_id.into(),
            kind,
            user_id: "123456789012345678".into(),
            guild_id: None,
            locale: None,
            values: vec![],
            fields: BTreeMap::new(),
        }
    }

    fn basic_command(name: &str, middlewares: Vec<Middleware>) -> CommandDefinition {
        CommandDefinition {
            name: name.into(),
            kind: CommandKind::ChatInput,
            description: "test command".into(),
            options: vec![],
            guilds: vec![],
            default_member_permissions: None,
            contexts: None,
            middlewares,
            silent: true,
            action: reply_action("Pong!"),
        }
    }

    #[tokio::test]
    async fn test_command_dispatch_replies() {
        let (dispatcher, registries) = dispatcher();
        registries.commands.register(basic_command("ping", vec![]));

        let responder = Arc::new(RecordingResponder::default());
        dispatcher
            .dispatch(command_event("ping"), Some(responder.clone()))
            .await;

        assert_eq!(*responder.replies.lock(), vec!["Pong!".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_command_gets_single_failure_reply() {
        let (dispatcher, _registries) = dispatcher();

        let responder = Arc::new(RecordingResponder::default());
        dispatcher
            .dispatch(command_event("ghost"), Some(responder.clone()))
            .await;

        assert_eq!(responder.replies.lock().len(), 1);
        assert!(responder.follow_ups.lock().is_empty());
    }

    #[tokio::test]
    async fn test_gating_middleware_blocks_handler() {
        let (dispatcher, registries) = dispatcher();
        let gate: Middleware = Arc::new(|ctx: Arc<HandlerContext>, _next| {
            Box::pin(async move {
                if let Some(responder) = ctx.responder() {
                    responder.reply("blocked", true).await?;
                }
                Ok(())
            })
        });
        registries.commands.register(basic_command("admin", vec![gate]));

        let responder = Arc::new(RecordingResponder::default());
        dispatcher
            .dispatch(command_event("admin"), Some(responder.clone()))
            .await;

        assert_eq!(*responder.replies.lock(), vec!["blocked".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_handler_after_ack_uses_follow_up() {
        let (dispatcher, registries) = dispatcher();
        let acked: Middleware = Arc::new(|ctx: Arc<HandlerContext>, next| {
            Box::pin(async move {
                if let Some(responder) = ctx.responder() {
                    responder.defer().await?;
                }
                next.proceed().await
            })
        });
        let mut command = basic_command("broken", vec![acked]);
        command.action = HandlerAction::Native(Arc::new(|_ctx| {
            Box::pin(async { Err(anyhow::anyhow!("handler exploded")) })
        }));
        registries.commands.register(command);

        let responder = Arc::new(RecordingResponder::default());
        dispatcher
            .dispatch(command_event("broken"), Some(responder.clone()))
            .await;

        // Initial response was the defer; the failure text arrives as a
        // follow-up, never a second initial reply.
        assert!(responder.replies.lock().is_empty());
        assert_eq!(responder.follow_ups.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_component_route_errors_map_to_distinct_messages() {
        let (dispatcher, registries) = dispatcher();
        registries.components.register(ComponentDefinition {
            custom_id: "modal/open".into(),
            kind: ComponentKind::Modal,
            params: ParamsSchema::default(),
            silent: true,
            action: reply_action("opened"),
        });

        // Kind mismatch: registered as modal, arrives as button.
        let responder = Arc::new(RecordingResponder::default());
        dispatcher
            .dispatch(
                component_event("modal/open", ComponentKind::Button),
                Some(responder.clone()),
            )
            .await;
        assert_eq!(responder.replies.lock().len(), 1);

        // Unknown static key.
        let responder = Arc::new(RecordingResponder::default());
        dispatcher
            .dispatch(
                component_event("nothing/here", ComponentKind::Button),
                Some(responder.clone()),
            )
            .await;
        assert_eq!(responder.replies.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_component_match_invokes_with_params() {
        let (dispatcher, registries) = dispatcher();
        registries.components.register(ComponentDefinition {
            custom_id: "page/{n}".into(),
            kind: ComponentKind::Button,
            params: ParamsSchema::default(),
            silent: true,
            action: reply_action("page {n}"),
        });

        let responder = Arc::new(RecordingResponder::default());
        dispatcher
            .dispatch(
                component_event("page/4", ComponentKind::Button),
                Some(responder.clone()),
            )
            .await;

        assert_eq!(*responder.replies.lock(), vec!["page 4".to_string()]);
    }

    #[tokio::test]
    async fn test_once_event_fires_at_most_once() {
        let (dispatcher, registries) = dispatcher();
        let count = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&count);
        registries.events.register(EventDefinition {
            event: LifecycleEvent::Ready,
            name: "banner".into(),
            once: true,
            silent: true,
            action: HandlerAction::Native(Arc::new(move |_ctx| {
                counted.fetch_add(1, Ordering::SeqCst);
                Box::pin(async { Ok(()) })
            })),
        });

        dispatcher.emit(LifecycleEvent::Ready).await;
        dispatcher.emit(LifecycleEvent::Ready).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_autocomplete_static_prefix_filter() {
        let (dispatcher, registries) = dispatcher();
        let mut command = basic_command("play", vec![]);
        command.options = vec![crate::definitions::CommandOption {
            name: "track".into(),
            description: "track name".into(),
            kind: crate::definitions::OptionKind::String,
            required: true,
            choices: vec![],
            options: vec![],
            autocomplete: Some(AutocompleteSource::Static(vec![
                "alpha".into(),
                "beta".into(),
                "altair".into(),
            ])),
        }];
        registries.commands.register(command);

        let responder = Arc::new(RecordingResponder::default());
        dispatcher
            .dispatch(
                InboundEvent::Autocomplete {
                    command: "play".into(),
                    option: "track".into(),
                    input: "al".into(),
                    user_id: "123456789012345678".into(),
                    locale: None,
                },
                Some(responder.clone()),
            )
            .await;

        let suggestions = responder.suggestions.lock();
        assert_eq!(suggestions.len(), 1);
        let names: Vec<&str> = suggestions[0].iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["alpha", "altair"]);
    }
}
