// Core layer - configuration and error taxonomy
pub mod core;

// Handler definitions and executable bodies
pub mod definitions;

// Typed registries with chain validation
pub mod registry;

// Module loader - discovery, cycle-safe import, worker pool
pub mod loader;

// Custom-id router with parameter extraction
pub mod router;

// Middleware chain executor
pub mod middleware;

// Event dispatch boundary
pub mod dispatch;

// Remote command diff & sync
pub mod sync;

// Task scheduling (cron + runner)
pub mod schedule;

// External collaborators
pub mod gateway;
pub mod i18n;
pub mod store;

// Composition root
pub mod bootstrap;

// Re-export core config
pub use core::Config;

// Re-export the pieces hosts touch when embedding the runtime
pub use bootstrap::Bootstrap;
pub use definitions::{
    ActionTable, CommandDefinition, ComponentDefinition, EventDefinition, HandlerAction,
    LifecycleEvent, NativeHandler, TaskDefinition,
};
pub use dispatch::{Dispatcher, HandlerContext, InboundEvent, Responder, Services};
pub use loader::{LoadReport, ModuleLoader};
pub use middleware::{run_chain, Middleware, MiddlewareTable, Next};
pub use registry::Registries;
pub use router::{match_pattern, resolve, RouteMatch};
pub use schedule::{Cron, CronExpr, TaskRunner};
pub use sync::{sync_commands, CommandPayload, CommandScope, CommandsGateway, SyncReport};
