//! # Bootstrap
//!
//! Composition root: builds the registries, action and middleware tables,
//! runs the module loader, and starts the gateway client. Command sync and
//! the task runner kick in on the first ready event; ctrl-c triggers a
//! graceful teardown.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::sync::Arc;

use anyhow::{Context as _, Result};
use log::{error, info, warn};
use serenity::model::gateway::GatewayIntents;
use serenity::Client;

use crate::core::Config;
use crate::definitions::{ActionTable, NativeHandler};
use crate::dispatch::{Dispatcher, Services};
use crate::gateway::GatewayHandler;
use crate::i18n::Translator;
use crate::loader::ModuleLoader;
use crate::middleware::{Middleware, MiddlewareTable};
use crate::registry::Registries;
use crate::schedule::TaskRunner;
use crate::store::SqliteStore;

/// Builder wiring the runtime together.
///
/// Hosts register native actions and middlewares here before `run`, so
/// module manifests can reference them by name.
pub struct Bootstrap {
    config: Config,
    actions: ActionTable,
    middlewares: MiddlewareTable,
}

impl Bootstrap {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            actions: ActionTable::new(),
            middlewares: MiddlewareTable::with_builtins(),
        }
    }

    pub fn register_action(mut self, name: impl Into<String>, handler: NativeHandler) -> Self {
        self.actions.register(name, handler);
        self
    }

    pub fn register_middleware(
        mut self,
        name: impl Into<String>,
        middleware: Middleware,
    ) -> Self {
        self.middlewares.register(name, middleware);
        self
    }

    /// Load modules, connect, and run until shutdown.
    ///
    /// Failures that compromise global invariants (an unreachable store,
    /// a client that cannot be built) return an error here and terminate
    /// the process. Per-module load failures are reported and tolerated.
    pub async fn run(self) -> Result<()> {
        let config = self.config;

        let store = SqliteStore::open(&config.database_path)
            .context("cannot establish the persistence connection")?;

        let translator = match Translator::load_dir(&config.locales_dir, config.default_locale.as_str())
        {
            Ok(translator) => {
                info!(
                    "Supported locales: {}",
                    translator.supported_locales().join(", ")
                );
                translator
            }
            Err(e) => {
                warn!("No translations loaded ({e}); falling back to declared strings only.");
                Translator::empty(config.default_locale.as_str())
            }
        };

        let registries = Arc::new(Registries::new());
        let services = Arc::new(Services::new(Arc::new(translator), Arc::new(store)));

        let loader = Arc::new(ModuleLoader::new(
            &config.modules_dir,
            Arc::clone(&registries),
            Arc::new(self.actions),
            Arc::new(self.middlewares),
        ));
        let report = loader.load_all().await;
        info!(
            "Registered {} command(s), {} component(s), {} event(s), {} task(s) from {} module(s)",
            registries.commands.len(),
            registries.components.len(),
            registries.events.len(),
            registries.tasks.len(),
            report.loaded
        );

        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registries), services));
        let task_runner = Arc::new(TaskRunner::new());

        let (guild_ids, rejected): (Vec<String>, Vec<String>) = config
            .guild_ids
            .iter()
            .cloned()
            .partition(|id| crate::core::is_valid_snowflake(id));
        for id in rejected {
            warn!("Ignoring configured guild id \"{id}\": not a valid snowflake");
        }

        let handler = GatewayHandler::new(
            Arc::clone(&dispatcher),
            Arc::clone(&registries),
            Arc::clone(&task_runner),
            guild_ids,
        );

        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::DIRECT_MESSAGES;

        let mut client = Client::builder(&config.discord_token, intents)
            .event_handler(handler)
            .await
            .context("failed to create the gateway client")?;

        // Graceful teardown on ctrl-c: stop task loops, let shutdown
        // handlers run, then close the shards.
        let shard_manager = client.shard_manager.clone();
        let shutdown_runner = Arc::clone(&task_runner);
        let shutdown_dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            warn!("Shutting down...");
            shutdown_runner.shutdown();
            shutdown_dispatcher
                .emit(crate::definitions::LifecycleEvent::Shutdown)
                .await;
            shard_manager.lock().await.shutdown_all().await;
        });

        info!("Connecting to the gateway...");
        if let Err(e) = client.start().await {
            error!("Gateway connection failed: {e:?}");
            task_runner.shutdown();
            return Err(anyhow::anyhow!("failed to establish gateway connection: {e}"));
        }

        Ok(())
    }
}
