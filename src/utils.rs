use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::StoreError;

/// Cuts `text` to at most `max_chars` characters, appending "..." when something was dropped.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Capitalises the first character, used for personality display names.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))
}

pub(crate) fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let data = serde_json::to_string_pretty(value).map_err(|e| StoreError::json(path, e))?;
    fs::write(path, data).map_err(|e| StoreError::io(path, e))
}

/// Timestamp fields that accept RFC 3339 as well as offset-less ISO 8601 read as UTC.
///
/// A value that parses as neither is replaced instead of failing the document.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use tracing::warn;

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(text: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
            return Some(ts.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|naive| naive.and_utc())
    }

    /// Unparseable values become the current time.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        Ok(optional(deserializer)?.unwrap_or_else(Utc::now))
    }

    /// Unparseable values become `None`.
    pub fn optional<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let parsed = match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => {
                let parsed = parse(&text);
                if parsed.is_none() {
                    warn!("Unreadable timestamp '{}'", text);
                }
                parsed
            }
            Some(other) => {
                warn!("Unreadable timestamp {}", other);
                None
            }
        };
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn preview_leaves_short_text_alone() {
        assert_eq!(preview("hola", 10), "hola");
        assert_eq!(preview("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        assert_eq!(preview("técnica experta", 4), "técn...");
    }

    #[test]
    fn capitalize_handles_unicode_and_empty() {
        assert_eq!(capitalize("técnica"), "Técnica");
        assert_eq!(capitalize("ñandú"), "Ñandú");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn timestamps_without_offset_read_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(timestamp::parse("2024-05-01T10:00:00"), Some(expected));
        assert_eq!(timestamp::parse("2024-05-01 10:00:00"), Some(expected));
        assert_eq!(
            timestamp::parse("2024-05-01T10:00:00.123456").map(|t| t.timestamp_subsec_micros()),
            Some(123456)
        );
        assert_eq!(timestamp::parse("2024-05-01T12:00:00+02:00"), Some(expected));
        assert_eq!(timestamp::parse("yesterday"), None);
    }
}
