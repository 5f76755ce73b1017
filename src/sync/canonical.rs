//! Canonical command payloads for remote comparison
//!
//! A `CommandPayload` is the normalized wire record built once per command
//! definition, and also the shape remote state is parsed into, so "has
//! anything changed" is a field-by-field comparison of two values of one
//! type instead of a generic deep-equality walk. Localization side-maps
//! ride along on the payload but are excluded from the canonical equality
//! view: only base-locale values drive the diff.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::definitions::{CommandDefinition, CommandKind, CommandOption};
use crate::i18n::Translator;

/// Wire form of one application command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandPayload {
    pub name: String,
    #[serde(rename = "type", default = "default_kind_code")]
    pub kind: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PayloadOption>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub default_member_permissions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_localizations: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_localizations: Option<BTreeMap<String, String>>,
}

fn default_kind_code() -> u8 {
    1
}

/// Wire form of one option node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadOption {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<PayloadChoice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PayloadOption>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub autocomplete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_localizations: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_localizations: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadChoice {
    pub name: String,
    pub value: serde_json::Value,
}

/// Remote APIs report permission bit sets as strings, but some transports
/// surface them as integers; accept both.
fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value: Option<serde_json::Value> = Option::deserialize(d)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

/// The equality view used by the diff: canonical base-locale fields only.
///
/// Localization maps, contexts and the autocomplete flag are excluded;
/// remote systems echo those inconsistently, and the original deployment
/// comparison keyed on exactly these fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalCommand {
    pub name: String,
    pub kind: u8,
    pub description: String,
    pub options: Vec<CanonicalOption>,
    pub default_member_permissions: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalOption {
    pub kind: u8,
    pub name: String,
    pub description: String,
    pub required: bool,
    /// Choice values string-coerced, so `"1"` and `1` compare equal.
    pub choices: Vec<(String, String)>,
    pub options: Vec<CanonicalOption>,
}

impl CommandPayload {
    pub fn canonical(&self) -> CanonicalCommand {
        CanonicalCommand {
            name: self.name.clone(),
            kind: self.kind,
            description: self.description.clone(),
            options: self.options.iter().map(PayloadOption::canonical).collect(),
            default_member_permissions: self.default_member_permissions.clone(),
        }
    }
}

impl PayloadOption {
    fn canonical(&self) -> CanonicalOption {
        CanonicalOption {
            kind: self.kind,
            name: self.name.clone(),
            description: self.description.clone(),
            required: self.required,
            choices: self
                .choices
                .iter()
                .map(|choice| (choice.name.clone(), coerce_value(&choice.value)))
                .collect(),
            options: self.options.iter().map(PayloadOption::canonical).collect(),
        }
    }
}

fn coerce_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the deployable payload for a command definition.
///
/// Canonical name and description come from the base locale: a base-locale
/// translation overrides the declared value when present, mirroring how
/// the live dispatcher announces the command. Per-locale variants are
/// attached as side maps and never replace the canonical fields.
pub fn build_payload(definition: &CommandDefinition, translator: &Translator) -> CommandPayload {
    let key_base = match definition.kind {
        CommandKind::ChatInput => format!("commands.{}", definition.name),
        // Context menu names may contain spaces; key them slug-style.
        CommandKind::User | CommandKind::Message => format!(
            "commands.{}",
            definition.name.to_lowercase().replace(' ', "-")
        ),
    };

    let name_key = format!("{key_base}.name");
    let description_key = format!("{key_base}.description");

    let name = canonical_text(translator, &name_key, &definition.name);
    let (description, description_localizations) = match definition.kind {
        CommandKind::ChatInput => (
            canonical_text(translator, &description_key, &definition.description),
            side_map(translator.localizations(&description_key)),
        ),
        CommandKind::User | CommandKind::Message => (String::new(), None),
    };

    let options = match definition.kind {
        CommandKind::ChatInput => localize_options(&key_base, &definition.options, translator),
        CommandKind::User | CommandKind::Message => Vec::new(),
    };

    CommandPayload {
        name,
        kind: definition.kind.code(),
        description,
        options,
        default_member_permissions: definition.default_member_permissions.clone(),
        contexts: definition.contexts.clone(),
        name_localizations: side_map(translator.localizations(&name_key)),
        description_localizations,
    }
}

/// Side maps are omitted entirely when no locale carries the key.
fn side_map(map: BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

fn canonical_text(translator: &Translator, key: &str, declared: &str) -> String {
    let translated = translator.translate(translator.default_locale(), key, &[]);
    if Translator::is_missing(&translated) {
        declared.to_string()
    } else {
        translated
    }
}

fn localize_options(
    base_key: &str,
    options: &[CommandOption],
    translator: &Translator,
) -> Vec<PayloadOption> {
    options
        .iter()
        .map(|option| {
            let option_key = format!("{base_key}.options.{}", option.name);
            let name_key = format!("{option_key}.name");
            let description_key = format!("{option_key}.description");

            let nested = if option.kind.is_nesting() {
                localize_options(&option_key, &option.options, translator)
            } else {
                Vec::new()
            };

            PayloadOption {
                kind: option.kind.code(),
                name: option.name.clone(),
                description: canonical_text(translator, &description_key, &option.description),
                required: option.required,
                choices: option
                    .choices
                    .iter()
                    .map(|choice| PayloadChoice {
                        name: choice.name.clone(),
                        value: choice.value.clone(),
                    })
                    .collect(),
                options: nested,
                autocomplete: option.autocomplete.is_some(),
                name_localizations: side_map(translator.localizations(&name_key)),
                description_localizations: side_map(translator.localizations(&description_key)),
            }
        })
        .collect()
}
