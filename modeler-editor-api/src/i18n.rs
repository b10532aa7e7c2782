//! Localized display strings.
//!
//! String tables are bundled TOML files keyed by symbolic identifiers such as
//! `menu.save_file`. Values may contain `{{name}}` placeholders that are
//! replaced at lookup time. Lookups fall back to English, then to the key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

const EN: &str = include_str!("../locales/en.toml");
const RU: &str = include_str!("../locales/ru.toml");

/// Languages with bundled string tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
        }
    }

    fn bundled(&self) -> &'static str {
        match self {
            Language::En => EN,
            Language::Ru => RU,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ru" => Ok(Language::Ru),
            other => Err(format!("unsupported language <{}>", other)),
        }
    }
}

/// String lookup for one language.
///
/// # Example
///
/// ```rust
/// use modeler_editor_api::{Language, Locale};
///
/// let locale = Locale::new(Language::En);
/// assert_eq!(locale.t("menu.save_file"), "Save File");
/// assert_eq!(
///     locale.t_with("dialog.close_message", &[("name", "diagram.bpmn")]),
///     "Save changes to diagram.bpmn before closing?"
/// );
/// assert_eq!(locale.t("no.such.key"), "no.such.key");
/// ```
#[derive(Debug, Clone)]
pub struct Locale {
    language: Language,
    strings: HashMap<String, String>,
    fallback: HashMap<String, String>,
}

impl Locale {
    /// Load the bundled table for `language`.
    pub fn new(language: Language) -> Self {
        let fallback = load_bundled(Language::En);
        let strings = if language == Language::En {
            fallback.clone()
        } else {
            load_bundled(language)
        };

        Self {
            language,
            strings,
            fallback,
        }
    }

    /// Build a locale from a custom TOML table, falling back to English.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` is not valid TOML.
    pub fn from_toml(language: Language, source: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(source)?;
        let mut strings = HashMap::new();
        flatten("", &table, &mut strings);

        Ok(Self {
            language,
            strings,
            fallback: load_bundled(Language::En),
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Look up a string.
    pub fn t(&self, key: &str) -> String {
        self.strings
            .get(key)
            .or_else(|| self.fallback.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Look up a string and replace `{{name}}` placeholders.
    pub fn t_with(&self, key: &str, substitutions: &[(&str, &str)]) -> String {
        substitutions
            .iter()
            .fold(self.t(key), |text, (name, value)| {
                text.replace(&format!("{{{{{}}}}}", name), value)
            })
    }

    /// Whether the key exists in this locale or the fallback.
    pub fn contains(&self, key: &str) -> bool {
        self.strings.contains_key(key) || self.fallback.contains_key(key)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new(Language::En)
    }
}

fn load_bundled(language: Language) -> HashMap<String, String> {
    let mut strings = HashMap::new();

    match toml::from_str::<toml::Table>(language.bundled()) {
        Ok(table) => flatten("", &table, &mut strings),
        Err(e) => warn!("Failed to parse bundled {} strings: {}", language, e),
    }

    strings
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut HashMap<String, String>) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            toml::Value::String(text) => {
                out.insert(path, text.clone());
            }
            toml::Value::Table(nested) => flatten(&path, nested, out),
            other => {
                out.insert(path, other.to_string());
            }
        }
    }
}
