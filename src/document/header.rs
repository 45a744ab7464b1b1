//! Header block metadata.
//!
//! BambuStudio writes summary statistics as `; key: value` comments, sometimes
//! several per line (`; model printing time: 1m 32s; total estimated time: 7m 44s`).

use std::time::Duration;

use serde::Serialize;

/// Summary metadata found between `HEADER_BLOCK_START` and `HEADER_BLOCK_END`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Header {
    /// `key: value` pairs in order of appearance
    pub entries: Vec<(String, String)>,
    /// Header comments that are not `key: value` pairs (e.g. the generator line)
    pub notes: Vec<String>,
}

impl Header {
    /// Record one header comment (text after the `;`).
    pub(crate) fn push_comment(&mut self, comment: &str) {
        for segment in comment.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once(':') {
                Some((key, value)) if !key.trim().is_empty() => {
                    self.entries
                        .push((key.trim().to_string(), value.trim().to_string()));
                }
                _ => self.notes.push(segment.to_string()),
            }
        }
    }

    /// Value of the first entry with this key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn total_layers(&self) -> Option<u32> {
        self.get("total layer number")?.parse().ok()
    }

    pub fn model_printing_time(&self) -> Option<&str> {
        self.get("model printing time")
    }

    pub fn estimated_time(&self) -> Option<&str> {
        self.get("total estimated time")
    }

    /// Total filament weight in grams, when the slicer reported it
    pub fn filament_weight(&self) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k.starts_with("total filament weight"))
            .and_then(|(_, v)| v.split(',').next()?.trim().parse().ok())
    }

    /// Generator line such as "BambuStudio 01.08.04.51"
    pub fn generator(&self) -> Option<&str> {
        self.notes.first().map(String::as_str)
    }
}

/// Parse a slicer duration like `1d 2h 3m 4s`, `7m 44s` or `59s`.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let mut seconds = 0u64;
    let mut any = false;

    for part in text.split_whitespace() {
        let (number, unit) = part.split_at(part.find(|c: char| !c.is_ascii_digit())?);
        let value: u64 = number.parse().ok()?;
        let scale = match unit {
            "d" => 86_400,
            "h" => 3_600,
            "m" => 60,
            "s" => 1,
            _ => return None,
        };
        seconds = seconds.checked_add(value.checked_mul(scale)?)?;
        any = true;
    }

    any.then(|| Duration::from_secs(seconds))
}
