//! # Translation Loading
//!
//! File-backed translation tables, one YAML document per locale. Nested
//! mappings are flattened into dotted keys (`common_errors.generic`).
//! A lookup miss yields the documented sentinel `[missing: <key>]` which
//! callers must detect with [`Translator::is_missing`] rather than treat
//! as a valid string.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context as _, Result};
use log::{debug, warn};

/// In-memory translation tables for all supported locales.
pub struct Translator {
    default_locale: String,
    tables: HashMap<String, HashMap<String, String>>,
}

impl Translator {
    /// Translator with no tables; every lookup is a miss.
    pub fn empty(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            tables: HashMap::new(),
        }
    }

    /// Load every `<locale>.yaml` / `<locale>.yml` file under `dir`.
    pub fn load_dir(dir: impl AsRef<Path>, default_locale: impl Into<String>) -> Result<Self> {
        let default_locale = default_locale.into();
        let mut tables = HashMap::new();

        let entries = std::fs::read_dir(dir.as_ref())
            .with_context(|| format!("cannot read locales dir {}", dir.as_ref().display()))?;

        for entry in entries {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yaml" || e == "yml")
                .unwrap_or(false);
            if !is_yaml {
                continue;
            }

            let Some(locale) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let contents = std::fs::read_to_string(&path)?;
            let document: serde_yaml::Value = serde_yaml::from_str(&contents)
                .with_context(|| format!("invalid locale file {}", path.display()))?;

            let mut flat = HashMap::new();
            flatten("", &document, &mut flat);
            debug!("Loaded locale {locale} ({} keys)", flat.len());
            tables.insert(locale.to_string(), flat);
        }

        if !tables.contains_key(&default_locale) {
            warn!("Default locale \"{default_locale}\" has no translation file");
        }

        Ok(Self {
            default_locale,
            tables,
        })
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn supported_locales(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Translate a key for a locale, falling back to the default locale,
    /// then to the missing-key sentinel. `{name}` placeholders are
    /// substituted from `params`.
    pub fn translate(&self, locale: &str, key: &str, params: &[(&str, &str)]) -> String {
        let template = self
            .tables
            .get(locale)
            .and_then(|table| table.get(key))
            .or_else(|| {
                self.tables
                    .get(&self.default_locale)
                    .and_then(|table| table.get(key))
            });

        match template {
            Some(template) => {
                let mut rendered = template.clone();
                for (name, value) in params {
                    rendered = rendered.replace(&format!("{{{name}}}"), value);
                }
                rendered
            }
            None => format!("[missing: {key}]"),
        }
    }

    /// Whether a translated string is the missing-key sentinel.
    pub fn is_missing(value: &str) -> bool {
        value.starts_with("[missing:")
    }

    /// Per-locale values for one key, for attaching localization side-maps.
    ///
    /// Locales without the key are omitted; the map never contains the
    /// sentinel.
    pub fn localizations(&self, key: &str) -> BTreeMap<String, String> {
        self.tables
            .iter()
            .filter_map(|(locale, table)| {
                table.get(key).map(|value| (locale.clone(), value.clone()))
            })
            .collect()
    }
}

fn flatten(prefix: &str, value: &serde_yaml::Value, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(mapping) => {
            for (k, v) in mapping {
                if let Some(k) = k.as_str() {
                    let key = if prefix.is_empty() {
                        k.to_string()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    flatten(&key, v, out);
                }
            }
        }
        serde_yaml::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        serde_yaml::Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        serde_yaml::Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> Translator {
        let mut tables = HashMap::new();

        let mut en = HashMap::new();
        en.insert("common_errors.generic".to_string(), "Something broke".to_string());
        en.insert("greeting".to_string(), "Hello {name}!".to_string());
        en.insert("commands.ping.name".to_string(), "ping".to_string());
        tables.insert("en-US".to_string(), en);

        let mut es = HashMap::new();
        es.insert("greeting".to_string(), "¡Hola {name}!".to_string());
        tables.insert("es-ES".to_string(), es);

        Translator {
            default_locale: "en-US".to_string(),
            tables,
        }
    }

    #[test]
    fn test_translate_with_params() {
        let t = translator();
        assert_eq!(t.translate("es-ES", "greeting", &[("name", "Ana")]), "¡Hola Ana!");
    }

    #[test]
    fn test_fallback_to_default_locale() {
        let t = translator();
        assert_eq!(
            t.translate("es-ES", "common_errors.generic", &[]),
            "Something broke"
        );
    }

    #[test]
    fn test_missing_sentinel_detected() {
        let t = translator();
        let missed = t.translate("en-US", "no.such.key", &[]);
        assert!(Translator::is_missing(&missed));
        assert!(!Translator::is_missing("a normal string"));
    }

    #[test]
    fn test_localizations_skip_absent_locales() {
        let t = translator();
        let map = t.localizations("commands.ping.name");
        assert_eq!(map.len(), 1);
        assert_eq!(map["en-US"], "ping");
    }

    #[test]
    fn test_flatten_nested_mapping() {
        let doc: serde_yaml::Value =
            serde_yaml::from_str("a:\n  b:\n    c: deep\n  d: shallow\n").unwrap();
        let mut out = HashMap::new();
        flatten("", &doc, &mut out);
        assert_eq!(out["a.b.c"], "deep");
        assert_eq!(out["a.d"], "shallow");
    }
}
