//! Component registry with the pattern sub-index
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::sync::Arc;

use dashmap::DashMap;

use super::validators;
use super::Registry;
use crate::definitions::ComponentDefinition;

/// Registry for message-component and modal handlers.
///
/// On top of the flat store it keeps a nested sub-index keyed by static
/// key, holding `(pattern, handler)` pairs **in registration order**: the
/// router's first-match-wins rule makes that order part of the dispatch
/// contract. When two registered patterns under one static key can match
/// the same identifier, the earlier registration wins; re-registering an
/// existing pattern overwrites the handler in place without changing its
/// position.
pub struct ComponentRegistry {
    inner: Registry<ComponentDefinition>,
    buckets: DashMap<String, Vec<(String, Arc<ComponentDefinition>)>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            inner: Registry::new(
                "Component",
                vec![
                    Box::new(validators::CustomIdValidator),
                    Box::new(validators::RunActionValidator),
                    Box::new(validators::SchemaParamsValidator),
                ],
            ),
            buckets: DashMap::new(),
        }
    }

    pub fn register(&self, item: ComponentDefinition) {
        // The flat store validates, warns on duplicates and logs; the
        // nested index only ever holds entries the flat store accepted.
        let Some(stored) = self.inner.register(item) else {
            return;
        };

        let static_key = stored.static_key().to_string();
        let mut bucket = self.buckets.entry(static_key).or_default();
        match bucket
            .iter_mut()
            .find(|(pattern, _)| pattern == &stored.custom_id)
        {
            Some((_, existing)) => *existing = stored,
            None => bucket.push((stored.custom_id.clone(), stored)),
        }
    }

    pub fn get(&self, custom_id: &str) -> Option<Arc<ComponentDefinition>> {
        self.inner.get(custom_id)
    }

    /// The ordered `(pattern, handler)` pairs registered under a static key.
    pub fn bucket(&self, static_key: &str) -> Option<Vec<(String, Arc<ComponentDefinition>)>> {
        self.buckets.get(static_key).map(|entry| entry.clone())
    }

    pub fn values(&self) -> Vec<Arc<ComponentDefinition>> {
        self.inner.values()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{ComponentKind, HandlerAction, ParamsSchema, ReplySpec};

    fn component(custom_id: &str, content: &str) -> ComponentDefinition {
        ComponentDefinition {
            custom_id: custom_id.into(),
            kind: ComponentKind::Button,
            params: ParamsSchema::default(),
            silent: true,
            action: HandlerAction::Reply(ReplySpec {
                content: content.into(),
                ephemeral: false,
            }),
        }
    }

    #[test]
    fn test_bucket_groups_by_static_key() {
        let registry = ComponentRegistry::new();
        registry.register(component("page/next/{n}", "a"));
        registry.register(component("page/prev/{n}", "b"));
        registry.register(component("confirm/{action}", "c"));

        assert_eq!(registry.bucket("page").unwrap().len(), 2);
        assert_eq!(registry.bucket("confirm").unwrap().len(), 1);
        assert!(registry.bucket("ghost").is_none());
    }

    #[test]
    fn test_bucket_preserves_registration_order() {
        let registry = ComponentRegistry::new();
        registry.register(component("a/{x}", "wildcard"));
        registry.register(component("a/fixed", "literal"));

        let bucket = registry.bucket("a").unwrap();
        assert_eq!(bucket[0].0, "a/{x}");
        assert_eq!(bucket[1].0, "a/fixed");
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let registry = ComponentRegistry::new();
        registry.register(component("a/{x}", "first"));
        registry.register(component("a/fixed", "second"));
        registry.register(component("a/{x}", "replacement"));

        let bucket = registry.bucket("a").unwrap();
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket[0].0, "a/{x}");
        match &bucket[0].1.action {
            HandlerAction::Reply(spec) => assert_eq!(spec.content, "replacement"),
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_component_not_indexed() {
        let registry = ComponentRegistry::new();
        registry.register(component("", "broken"));

        assert!(registry.is_empty());
        assert!(registry.bucket("").is_none());
    }

    #[test]
    fn test_nested_entries_also_in_flat_store() {
        let registry = ComponentRegistry::new();
        registry.register(component("menu/open/{id}", "x"));

        for (pattern, _) in registry.bucket("menu").unwrap() {
            assert!(registry.get(&pattern).is_some());
        }
    }
}
