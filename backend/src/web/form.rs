//! Access helpers over url-encoded form bodies.
//!
//! Handlers extract `web::Form<Vec<(String, String)>>` so that repeated keys
//! (multi-selects, numbered detail rows) survive, then wrap the pairs here.

use chrono::{NaiveDate, NaiveTime};

#[derive(Debug, Clone, Default)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl FormData {
    /// First value of `name`, trimmed.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
    }

    /// Trimmed value or the empty string.
    pub fn text(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_owned()
    }

    /// Trimmed value when non-empty.
    pub fn opt(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.is_empty()).map(str::to_owned)
    }

    pub fn all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// HTML checkboxes are present only when ticked.
    pub fn checkbox(&self, name: &str) -> bool {
        matches!(self.get(name), Some(v) if !v.is_empty() && v != "false" && v != "off")
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(parse_date)
    }

    pub fn time(&self, name: &str) -> Option<NaiveTime> {
        self.get(name).and_then(parse_time)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// First value per key, for echoing a rejected form back into its page.
    pub fn values(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        for (key, value) in &self.pairs {
            if key.starts_with("password") || map.contains_key(key) {
                continue;
            }
            map.insert(key.clone(), serde_json::Value::String(value.trim().to_owned()));
        }
        map
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Accepts `HH:MM` from time inputs and `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// `YYYY-MM` into `(year, month)`.
pub fn parse_month(raw: &str) -> Option<(i32, u32)> {
    let (year, month) = raw.trim().split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}
