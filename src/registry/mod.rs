//! # Typed Handler Registries
//!
//! Keyed stores for the four handler variants. Registration validates
//! through an ordered chain, warns and overwrites on duplicate keys, and
//! never lets a validation failure escape to the caller: an invalid
//! definition is logged and skipped, the process continues.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Dependency-injected registries behind a composition root
//! - 1.0.0: Initial implementation

pub mod command;
pub mod component;
pub mod validators;

use std::sync::Arc;

use dashmap::DashMap;
use log::{error, info, warn};

use crate::definitions::{Definition, EventDefinition, LifecycleEvent, TaskDefinition};
use validators::{run_chain, Validator};

pub use command::CommandRegistry;
pub use component::ComponentRegistry;

/// Generic keyed store with chain validation and a post-registration hook.
pub struct Registry<T: Definition> {
    registry_name: &'static str,
    store: DashMap<String, Arc<T>>,
    validators: Vec<Box<dyn Validator<T>>>,
}

impl<T: Definition> Registry<T> {
    pub fn new(registry_name: &'static str, validators: Vec<Box<dyn Validator<T>>>) -> Self {
        Self {
            registry_name,
            store: DashMap::new(),
            validators,
        }
    }

    /// Validate and store a definition.
    ///
    /// Returns the stored `Arc` on success so specializations can index it
    /// further, or `None` if validation rejected the item. Errors never
    /// propagate: they are logged with the item's identifier.
    pub fn register(&self, item: T) -> Option<Arc<T>> {
        if let Err(e) = run_chain(&self.validators, &item) {
            error!(
                "Failed to register {} \"{}\": {e}",
                self.registry_name.to_lowercase(),
                item.key()
            );
            return None;
        }

        let key = item.key().to_string();
        if self.store.contains_key(&key) {
            warn!(
                "{} \"{key}\" is already registered. It will be overwritten.",
                self.registry_name
            );
        }

        let stored = Arc::new(item);
        self.store.insert(key, Arc::clone(&stored));
        self.post_register(&stored);
        Some(stored)
    }

    fn post_register(&self, item: &Arc<T>) {
        if !item.silent() {
            info!(
                "Registered {}: {} ({})",
                self.registry_name.to_lowercase(),
                item.key(),
                item.type_label()
            );
        }
    }

    /// Lookup by key; absent keys return `None`, never an error.
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.store.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn values(&self) -> Vec<Arc<T>> {
        self.store
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Registry for lifecycle event handlers.
pub struct EventRegistry {
    inner: Registry<EventDefinition>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self {
            inner: Registry::new(
                "Event",
                vec![
                    Box::new(validators::NameValidator),
                    Box::new(validators::RunActionValidator),
                ],
            ),
        }
    }

    pub fn register(&self, item: EventDefinition) {
        self.inner.register(item);
    }

    pub fn get(&self, name: &str) -> Option<Arc<EventDefinition>> {
        self.inner.get(name)
    }

    /// All handlers subscribed to one lifecycle event.
    pub fn for_event(&self, event: LifecycleEvent) -> Vec<Arc<EventDefinition>> {
        self.inner
            .values()
            .into_iter()
            .filter(|def| def.event == event)
            .collect()
    }

    pub fn values(&self) -> Vec<Arc<EventDefinition>> {
        self.inner.values()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry for scheduled tasks.
pub struct TaskRegistry {
    inner: Registry<TaskDefinition>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            inner: Registry::new(
                "Task",
                vec![
                    Box::new(validators::NameValidator),
                    Box::new(validators::RunActionValidator),
                    Box::new(validators::TaskScheduleValidator),
                ],
            ),
        }
    }

    pub fn register(&self, item: TaskDefinition) {
        self.inner.register(item);
    }

    pub fn get(&self, name: &str) -> Option<Arc<TaskDefinition>> {
        self.inner.get(name)
    }

    pub fn values(&self) -> Vec<Arc<TaskDefinition>> {
        self.inner.values()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Composition root owning one instance of every registry.
///
/// Constructed once per process by the bootstrap and shared by `Arc` with
/// the loader, router, dispatcher and sync routine: single-instance
/// semantics without hidden global state.
pub struct Registries {
    pub commands: CommandRegistry,
    pub components: ComponentRegistry,
    pub events: EventRegistry,
    pub tasks: TaskRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Self {
            commands: CommandRegistry::new(),
            components: ComponentRegistry::new(),
            events: EventRegistry::new(),
            tasks: TaskRegistry::new(),
        }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}
