//! # Custom-Id Router
//!
//! Maps dynamic component identifiers to handlers. The first `/`-delimited
//! segment is the static key for O(1) bucket lookup; the remaining segments
//! are matched positionally against each registered pattern in registration
//! order. **First match wins**, even when a later pattern is more
//! specific. Extracted parameters are validated against the handler's
//! optional schema, and the handler's declared interaction kind must agree
//! with the incoming event.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

pub mod params;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::RouteError;
use crate::definitions::{ComponentDefinition, ComponentKind, ParamValue};
use crate::registry::ComponentRegistry;

pub use params::validate_params;

/// Ephemeral result of a successful resolution; never persisted.
#[derive(Debug)]
pub struct RouteMatch {
    pub handler: Arc<ComponentDefinition>,
    pub params: BTreeMap<String, ParamValue>,
}

/// Positionally match a pattern against an identifier.
///
/// Segment counts must be equal. A `{name}` segment matches any value and
/// binds it; a literal segment must match exactly. Returns the bound
/// parameters, or `None` if the pattern does not match.
pub fn match_pattern(pattern: &str, custom_id: &str) -> Option<BTreeMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').collect();
    let id_parts: Vec<&str> = custom_id.split('/').collect();

    if pattern_parts.len() != id_parts.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (pattern_part, id_part) in pattern_parts.iter().zip(&id_parts) {
        if let Some(name) = pattern_part
            .strip_prefix('{')
            .and_then(|p| p.strip_suffix('}'))
        {
            params.insert(name.to_string(), id_part.to_string());
        } else if pattern_part != id_part {
            return None;
        }
    }

    Some(params)
}

/// Resolve an incoming identifier to its handler.
///
/// The failure variants are distinct so callers can tell *no handler* from
/// *wrong kind* from *invalid parameters*.
pub fn resolve(
    registry: &ComponentRegistry,
    kind: ComponentKind,
    custom_id: &str,
) -> Result<RouteMatch, RouteError> {
    let static_key = custom_id.split('/').next().unwrap_or_default();

    let bucket = registry
        .bucket(static_key)
        .ok_or_else(|| RouteError::NotFound {
            custom_id: custom_id.to_string(),
        })?;

    let mut matched: Option<(String, Arc<ComponentDefinition>, BTreeMap<String, String>)> = None;
    for (pattern, handler) in bucket {
        if let Some(raw) = match_pattern(&pattern, custom_id) {
            matched = Some((pattern, handler, raw));
            break;
        }
    }

    let Some((pattern, handler, raw)) = matched else {
        return Err(RouteError::NotFound {
            custom_id: custom_id.to_string(),
        });
    };

    if handler.kind != kind {
        return Err(RouteError::KindMismatch {
            pattern,
            expected: handler.kind.label(),
            actual: kind.label(),
        });
    }

    let params = validate_params(&raw, &handler.params).map_err(|reason| {
        RouteError::InvalidParams {
            pattern: pattern.clone(),
            reason,
        }
    })?;

    Ok(RouteMatch { handler, params })
}
