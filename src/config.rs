//! Ordered, case-sensitive view over an INI-style rules document.
//!
//! Sections and entries enumerate in the order they appear in the file.
//! Names are compared byte-exactly; no case folding anywhere.

use std::io::Read;

use indexmap::IndexMap;

use crate::errors::AuthzError;

#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: IndexMap<String, Section>,
}

#[derive(Debug, Clone, Default)]
pub struct Section {
    entries: IndexMap<String, String>,
}

impl Section {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Config {
    /// Parse an INI-style rules document.
    ///
    /// Accepted syntax: `[section]` headers, `key = value` / `key: value`
    /// entries, `#` and `;` comment lines, and continuation lines (a line
    /// starting with whitespace extends the previous entry's value).  A
    /// section appearing twice is merged; a key appearing twice in one
    /// section keeps the later value.
    pub fn parse(text: &str) -> Result<Self, AuthzError> {
        let mut config = Config::default();
        let mut current: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                last_key = None;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if raw.starts_with(char::is_whitespace) {
                // Continuation of the previous entry's value.
                let value = current
                    .as_deref()
                    .zip(last_key.as_deref())
                    .and_then(|(section, key)| {
                        config.sections.get_mut(section)?.entries.get_mut(key)
                    });
                let Some(value) = value else {
                    return Err(AuthzError::ConfigSyntax {
                        line,
                        reason: "continuation line without a preceding entry".into(),
                    });
                };
                value.push(' ');
                value.push_str(trimmed);
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix('[') {
                let Some(name) = rest.strip_suffix(']') else {
                    return Err(AuthzError::ConfigSyntax {
                        line,
                        reason: format!("section header `{trimmed}` is not terminated by ']'"),
                    });
                };
                if name.is_empty() {
                    return Err(AuthzError::ConfigSyntax {
                        line,
                        reason: "empty section name".into(),
                    });
                }
                config.sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                last_key = None;
                continue;
            }

            let Some(section) = current.as_deref() else {
                return Err(AuthzError::ConfigSyntax {
                    line,
                    reason: format!("entry `{trimmed}` appears before any section header"),
                });
            };
            let Some(sep) = trimmed.find(['=', ':']) else {
                return Err(AuthzError::ConfigSyntax {
                    line,
                    reason: format!("expected `key = value`, found `{trimmed}`"),
                });
            };
            let key = trimmed[..sep].trim_end();
            let value = trimmed[sep + 1..].trim_start();
            if key.is_empty() {
                return Err(AuthzError::ConfigSyntax {
                    line,
                    reason: "entry has an empty key".into(),
                });
            }

            config
                .sections
                .entry(section.to_string())
                .or_default()
                .entries
                .insert(key.to_string(), value.to_string());
            last_key = Some(key.to_string());
        }

        Ok(config)
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, AuthzError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Sections in file order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(name, s)| (name.as_str(), s))
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key)
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .entries
            .insert(key.to_string(), value.to_string());
    }
}
