//! Person names as extracted from LLM replies and as searched in documents.
//!
//! Replies mark an unknown name part with sentinels such as `"-"`. Those are
//! mapped to `None` once, here, so nothing downstream compares against
//! sentinel strings.

use serde::{Deserialize, Serialize};

use crate::repair::Record;

/// Separator used in name keys unless configured otherwise (`Last_First`).
pub const DEFAULT_KEY_SEPARATOR: &str = "_";

/// Spellings that mean "this part of the name is unknown".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sentinels(Vec<String>);

impl Default for Sentinels {
    fn default() -> Self {
        Self(
            ["-", "UNKNOWN_Number", "unknown", "n/a"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }
}

impl Sentinels {
    pub fn new(spellings: Vec<String>) -> Self {
        Self(spellings)
    }

    /// Normalize a raw field value: trimmed text, or `None` for blanks and
    /// sentinels (compared case-insensitively).
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let value = raw.trim();
        if value.is_empty() || self.0.iter().any(|s| s.trim().eq_ignore_ascii_case(value)) {
            None
        } else {
            Some(value.to_string())
        }
    }
}

/// Which record fields hold the first and last name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFields {
    pub first: String,
    pub last: String,
}

impl Default for NameFields {
    fn default() -> Self {
        Self {
            first: "First Name".into(),
            last: "Last Name".into(),
        }
    }
}

/// A person name with either part possibly unknown.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NameRecord {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NameRecord {
    /// Build a name from a repaired record.
    ///
    /// Field lookup ignores case, spaces, `_` and `-`, so `firstName`,
    /// `first_name` and `First Name` all address the same field. Returns
    /// `None` when neither part is known.
    pub fn from_record(record: &Record, fields: &NameFields, sentinels: &Sentinels) -> Option<Self> {
        let first_name = field(record, &fields.first).and_then(|v| sentinels.normalize(v));
        let last_name = field(record, &fields.last).and_then(|v| sentinels.normalize(v));
        if first_name.is_none() && last_name.is_none() {
            return None;
        }
        Some(Self {
            first_name,
            last_name,
        })
    }

    /// The name key searched by the indexer.
    ///
    /// `Last{sep}First` when both parts are known, otherwise the single known
    /// part on its own.
    pub fn key(&self, separator: &str) -> Option<String> {
        match (&self.last_name, &self.first_name) {
            (Some(last), Some(first)) => Some(format!("{last}{separator}{first}")),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }
}

fn field<'a>(record: &'a Record, name: &str) -> Option<&'a str> {
    let wanted = fold_field_name(name);
    record
        .iter()
        .find(|(key, _)| fold_field_name(key) == wanted)
        .map(|(_, value)| value.as_str())
}

fn fold_field_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// A decomposed name key: last name always, first name when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameKey {
    pub last: String,
    pub first: Option<String>,
}

impl NameKey {
    /// Decompose a key such as `Einstein_Albert` or `Einstein`.
    ///
    /// With `strip_parenthetical`, the last name is cut at the first `(`
    /// (`Mayer (1950)` becomes `Mayer`). Returns `None` when no last name is
    /// left, which callers treat as a no-op entry.
    pub fn parse(key: &str, separator: &str, strip_parenthetical: bool) -> Option<Self> {
        let (last, first) = match key.split_once(separator).filter(|_| !separator.is_empty()) {
            Some((last, first)) => (last, Some(first)),
            None => (key, None),
        };

        let mut last = last.trim();
        if strip_parenthetical {
            last = last.split('(').next().unwrap_or_default().trim();
        }
        if last.is_empty() {
            return None;
        }

        let first = first
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from);

        Some(Self {
            last: last.to_string(),
            first,
        })
    }

    /// `First Last`, or just the last name.
    pub fn full_name(&self) -> String {
        match &self.first {
            Some(first) => format!("{first} {}", self.last),
            None => self.last.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn sentinels_become_absent() {
        let s = Sentinels::default();
        assert_eq!(s.normalize("-"), None);
        assert_eq!(s.normalize("  "), None);
        assert_eq!(s.normalize("UNKNOWN_Number"), None);
        assert_eq!(s.normalize("Unknown"), None);
        assert_eq!(s.normalize(" Ada "), Some("Ada".into()));
    }

    #[test]
    fn record_with_both_parts() {
        let r = record(&[("First Name", "Albert"), ("Last Name", "Einstein")]);
        let name = NameRecord::from_record(&r, &NameFields::default(), &Sentinels::default()).unwrap();
        assert_eq!(name.first_name.as_deref(), Some("Albert"));
        assert_eq!(name.last_name.as_deref(), Some("Einstein"));
        assert_eq!(name.key("_").as_deref(), Some("Einstein_Albert"));
    }

    #[test]
    fn field_lookup_is_lenient() {
        let r = record(&[("firstName", "Paul"), ("last_name", "Hawking")]);
        let name = NameRecord::from_record(&r, &NameFields::default(), &Sentinels::default()).unwrap();
        assert_eq!(name.key(", ").as_deref(), Some("Hawking, Paul"));
    }

    #[test]
    fn partial_names_use_the_known_part() {
        let fields = NameFields::default();
        let sentinels = Sentinels::default();

        let last_only = record(&[("First Name", "-"), ("Last Name", "Krieber")]);
        let name = NameRecord::from_record(&last_only, &fields, &sentinels).unwrap();
        assert_eq!(name.key("_").as_deref(), Some("Krieber"));

        let first_only = record(&[("First Name", "Augustine"), ("Last Name", "-")]);
        let name = NameRecord::from_record(&first_only, &fields, &sentinels).unwrap();
        assert_eq!(name.key("_").as_deref(), Some("Augustine"));
    }

    #[test]
    fn record_without_any_name_is_dropped() {
        let r = record(&[("First Name", "-"), ("Last Name", "")]);
        assert!(NameRecord::from_record(&r, &NameFields::default(), &Sentinels::default()).is_none());
        let r = record(&[("age", "30")]);
        assert!(NameRecord::from_record(&r, &NameFields::default(), &Sentinels::default()).is_none());
    }

    #[test]
    fn parse_key_with_first_name() {
        let key = NameKey::parse("Einstein_Albert", "_", false).unwrap();
        assert_eq!(key.last, "Einstein");
        assert_eq!(key.first.as_deref(), Some("Albert"));
        assert_eq!(key.full_name(), "Albert Einstein");
    }

    #[test]
    fn parse_key_last_name_only() {
        let key = NameKey::parse("Einstein", "_", false).unwrap();
        assert_eq!(key.first, None);
        assert_eq!(key.full_name(), "Einstein");

        let key = NameKey::parse("Einstein_", "_", false).unwrap();
        assert_eq!(key.first, None);
    }

    #[test]
    fn parse_key_with_comma_separator() {
        let key = NameKey::parse("Mayer, Hans Günther", ", ", false).unwrap();
        assert_eq!(key.last, "Mayer");
        assert_eq!(key.first.as_deref(), Some("Hans Günther"));
    }

    #[test]
    fn parse_key_strips_parenthetical() {
        let key = NameKey::parse("Mayer (1950)_Hans", "_", true).unwrap();
        assert_eq!(key.last, "Mayer");
        let key = NameKey::parse("Mayer (1950)_Hans", "_", false).unwrap();
        assert_eq!(key.last, "Mayer (1950)");
    }

    #[test]
    fn empty_keys_are_no_ops() {
        assert!(NameKey::parse("", "_", false).is_none());
        assert!(NameKey::parse("  _Albert", "_", false).is_none());
        assert!(NameKey::parse("(1950)", "_", true).is_none());
    }
}
