//! # Handler Definitions
//!
//! Declarative descriptions of the four handler variants the runtime
//! dispatches: application commands, message components, lifecycle events,
//! and scheduled tasks. Definitions are created once during module loading
//! and live for the process lifetime.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Split executable bodies into the action module
//! - 1.0.0: Initial creation

pub mod action;
pub mod command;
pub mod component;
pub mod event;
pub mod task;

pub use action::{ActionTable, ExecSpec, HandlerAction, NativeHandler, ReplySpec};
pub use command::{
    AutocompleteFn, AutocompleteSource, CommandDefinition, CommandKind, CommandOption,
    OptionChoice, OptionKind,
};
pub use component::{
    ComponentDefinition, ComponentKind, ParamKind, ParamSpec, ParamValue, ParamsSchema,
    CUSTOM_ID_MAX_LEN,
};
pub use event::{EventDefinition, LifecycleEvent};
pub use task::{Schedule, TaskDefinition, MIN_INTERVAL_MS};

/// Common surface every registrable definition exposes to the registry.
pub trait Definition: Send + Sync + 'static {
    /// Unique key within the owning registry (name, or custom id for
    /// components).
    fn key(&self) -> &str;

    /// Suppress the post-registration log line.
    fn silent(&self) -> bool;

    /// Executable body, inspected by run-action validation.
    fn action(&self) -> &HandlerAction;

    /// Short label for log lines, e.g. `"/"` or `"Button"`.
    fn type_label(&self) -> String;
}

impl Definition for CommandDefinition {
    fn key(&self) -> &str {
        &self.name
    }

    fn silent(&self) -> bool {
        self.silent
    }

    fn action(&self) -> &HandlerAction {
        &self.action
    }

    fn type_label(&self) -> String {
        self.kind.label().to_string()
    }
}

impl Definition for ComponentDefinition {
    fn key(&self) -> &str {
        &self.custom_id
    }

    fn silent(&self) -> bool {
        self.silent
    }

    fn action(&self) -> &HandlerAction {
        &self.action
    }

    fn type_label(&self) -> String {
        self.kind.label().to_string()
    }
}

impl Definition for EventDefinition {
    fn key(&self) -> &str {
        &self.name
    }

    fn silent(&self) -> bool {
        self.silent
    }

    fn action(&self) -> &HandlerAction {
        &self.action
    }

    fn type_label(&self) -> String {
        self.event.label().to_string()
    }
}

impl Definition for TaskDefinition {
    fn key(&self) -> &str {
        &self.name
    }

    fn silent(&self) -> bool {
        self.silent
    }

    fn action(&self) -> &HandlerAction {
        &self.action
    }

    fn type_label(&self) -> String {
        match &self.schedule {
            Schedule::Every(ms) => format!("every {ms}ms"),
            Schedule::Cron(expr) => format!("cron {expr}"),
        }
    }
}
