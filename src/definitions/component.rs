//! Message-component handler definitions
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use super::action::HandlerAction;

/// Maximum length Discord accepts for a component custom id.
pub const CUSTOM_ID_MAX_LEN: usize = 100;

/// The seven interaction kinds a component handler can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Button,
    StringSelect,
    UserSelect,
    RoleSelect,
    MentionableSelect,
    ChannelSelect,
    Modal,
}

impl ComponentKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Button => "Button",
            Self::StringSelect => "StringSelect",
            Self::UserSelect => "UserSelect",
            Self::RoleSelect => "RoleSelect",
            Self::MentionableSelect => "MentionableSelect",
            Self::ChannelSelect => "ChannelSelect",
            Self::Modal => "Modal",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Expected type of an extracted route parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    #[default]
    String,
    Integer,
    Number,
    Bool,
}

/// Constraints for one named parameter extracted from a custom id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamSpec {
    #[serde(default)]
    pub kind: ParamKind,
    /// Regex the raw string must fully match (checked before coercion).
    #[serde(default)]
    pub pattern: Option<String>,
    /// Inclusive lower bound for integer/number params.
    #[serde(default)]
    pub min: Option<i64>,
    /// Inclusive upper bound for integer/number params.
    #[serde(default)]
    pub max: Option<i64>,
}

/// Declarative schema for the parameters a custom-id pattern binds.
///
/// Keys are parameter names as they appear inside `{...}` segments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ParamsSchema {
    pub fields: BTreeMap<String, ParamSpec>,
}

impl ParamsSchema {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A coerced parameter value after schema validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    Number(f64),
    Bool(bool),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A message-component (or modal) handler definition.
///
/// The `custom_id` doubles as the routing pattern: `/`-delimited segments
/// where `{name}` segments bind parameters. The first segment must be a
/// literal; it is the static key used for bucket lookup.
#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    pub custom_id: String,
    pub kind: ComponentKind,
    pub params: ParamsSchema,
    pub silent: bool,
    pub action: HandlerAction,
}

impl ComponentDefinition {
    /// First `/`-delimited segment of the custom id.
    pub fn static_key(&self) -> &str {
        self.custom_id.split('/').next().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::action::ReplySpec;

    fn component(custom_id: &str) -> ComponentDefinition {
        ComponentDefinition {
            custom_id: custom_id.to_string(),
            kind: ComponentKind::Button,
            params: ParamsSchema::default(),
            silent: true,
            action: HandlerAction::Reply(ReplySpec {
                content: "ok".into(),
                ephemeral: false,
            }),
        }
    }

    #[test]
    fn test_static_key() {
        assert_eq!(component("menu/page/{n}").static_key(), "menu");
        assert_eq!(component("menu").static_key(), "menu");
    }

    #[test]
    fn test_param_kind_deserialize() {
        let spec: ParamSpec = serde_yaml::from_str("kind: integer\nmin: 1\n").unwrap();
        assert_eq!(spec.kind, ParamKind::Integer);
        assert_eq!(spec.min, Some(1));
    }

    #[test]
    fn test_params_schema_transparent() {
        let schema: ParamsSchema =
            serde_yaml::from_str("page:\n  kind: integer\nuser: {}\n").unwrap();
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields["page"].kind, ParamKind::Integer);
        assert_eq!(schema.fields["user"].kind, ParamKind::String);
    }
}
