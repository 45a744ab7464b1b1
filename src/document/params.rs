//! Slicer parameters from the config block (`; key = value`).

use std::collections::HashMap;

use serde::Serialize;

/// One `; key = value` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    /// 1-based line number in the file
    pub line: usize,
}

/// A config-block line that is not a `key = value` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedEntry {
    pub line: usize,
    pub text: String,
}

/// The slicer settings captured in the config block.
///
/// Every entry is kept in order; lookups return the last occurrence of a key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlicerConfig {
    pub entries: Vec<ConfigEntry>,
    pub malformed: Vec<MalformedEntry>,
}

impl SlicerConfig {
    /// Record one config-block comment (text after the `;`).
    pub(crate) fn push_comment(&mut self, line: usize, comment: &str) {
        match parse_entry(comment) {
            Some((key, value)) => self.entries.push(ConfigEntry {
                key: key.to_string(),
                value: value.to_string(),
                line,
            }),
            None => self.malformed.push(MalformedEntry {
                line,
                text: comment.trim().to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Value with surrounding double quotes removed (`"Bambu PLA Basic"`)
    pub fn get_unquoted(&self, key: &str) -> Option<&str> {
        self.get(key).map(|v| {
            v.strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(v)
        })
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)?.trim_end_matches('%').parse().ok()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        }
    }

    /// Comma-separated per-extruder/per-filament values (`220,220`)
    pub fn get_list(&self, key: &str) -> Option<Vec<&str>> {
        let value = self.get(key)?;
        if value.is_empty() {
            return Some(Vec::new());
        }
        Some(value.split(',').map(str::trim).collect())
    }

    /// Keys that appear more than once, with the lines they appear on
    pub fn duplicates(&self) -> Vec<(&str, Vec<usize>)> {
        let mut seen: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut order = Vec::new();
        for entry in &self.entries {
            let lines = seen.entry(entry.key.as_str()).or_default();
            if lines.is_empty() {
                order.push(entry.key.as_str());
            }
            lines.push(entry.line);
        }

        order
            .into_iter()
            .filter_map(|key| {
                let lines = seen.remove(key)?;
                (lines.len() > 1).then_some((key, lines))
            })
            .collect()
    }
}

/// Split ` key = value` into its parts. Keys never contain whitespace or `=`.
fn parse_entry(comment: &str) -> Option<(&str, &str)> {
    let (key, value) = comment.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, value.trim()))
}
