//! Display names for metering points.
//!
//! The nickname table maps a meter label (usually an EIC code) to a human
//! readable name and an optional chart color. Entries are kept in the order
//! they were declared; the first entry that matches a label wins.
//!
//! Two settings shapes are accepted:
//!
//! ```json
//! { "eic_nicknames": { "38ZEE-1": "House", "38ZEE-2": { "nick": "Garage", "color": "#f80" } } }
//! { "eic_nicknames": [ { "key": "38ZEE-1", "nick": "House", "color": null } ] }
//! ```
//!
//! The object form is read in document order, not key order.

use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Nickname Entry
// ============================================================================

/// One configured nickname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicknameEntry {
    /// Substring matched against the meter label.
    #[serde(default)]
    pub key: String,
    /// Display name.
    #[serde(default)]
    pub nick: String,
    /// Optional display color.
    #[serde(default)]
    pub color: Option<String>,
}

impl NicknameEntry {
    /// Creates a nickname entry.
    pub fn new(key: impl Into<String>, nick: impl Into<String>, color: Option<&str>) -> Self {
        Self {
            key: key.into(),
            nick: nick.into(),
            color: color.map(str::to_string),
        }
    }

    /// Returns true if this entry applies to `label`.
    ///
    /// Either a non-empty key or a non-empty nick contained in the label
    /// counts as a match. Matching is case-sensitive.
    pub fn matches(&self, label: &str) -> bool {
        (!self.key.is_empty() && label.contains(&self.key))
            || (!self.nick.is_empty() && label.contains(&self.nick))
    }
}

// ============================================================================
// Nickname Table
// ============================================================================

/// Ordered nickname table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NicknameTable(Vec<NicknameEntry>);

impl NicknameTable {
    /// Creates a table from entries in priority order.
    pub fn new(entries: Vec<NicknameEntry>) -> Self {
        Self(entries)
    }

    /// Returns the entries in priority order.
    pub fn entries(&self) -> &[NicknameEntry] {
        &self.0
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no nicknames are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolves the display name and color for a meter label.
    ///
    /// Returns `(label, None)` when nothing matches.
    pub fn resolve(&self, label: &str) -> (String, Option<String>) {
        match self.0.iter().find(|entry| entry.matches(label)) {
            Some(entry) => {
                let display = if entry.nick.is_empty() {
                    label
                } else {
                    entry.nick.as_str()
                };
                (display.to_string(), entry.color.clone())
            }
            None => (label.to_string(), None),
        }
    }
}

impl From<Vec<NicknameEntry>> for NicknameTable {
    fn from(entries: Vec<NicknameEntry>) -> Self {
        Self(entries)
    }
}

// ============================================================================
// Deserialization
// ============================================================================

/// Value side of the object form: a bare nick or a `{nick, color}` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum NicknameValue {
    Plain(String),
    Detailed {
        #[serde(default)]
        nick: Option<String>,
        #[serde(default)]
        color: Option<String>,
    },
}

impl NicknameValue {
    fn into_entry(self, key: String) -> NicknameEntry {
        match self {
            Self::Plain(nick) => NicknameEntry {
                key,
                nick,
                color: None,
            },
            Self::Detailed { nick, color } => NicknameEntry {
                key,
                nick: nick.unwrap_or_default(),
                color,
            },
        }
    }
}

struct NicknameTableVisitor;

impl<'de> Visitor<'de> for NicknameTableVisitor {
    type Value = NicknameTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of nicknames or a list of nickname entries")
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(NicknameTable::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, NicknameValue>()? {
            entries.push(value.into_entry(key));
        }
        Ok(NicknameTable(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(entry) = seq.next_element::<NicknameEntry>()? {
            entries.push(entry);
        }
        Ok(NicknameTable(entries))
    }
}

impl<'de> Deserialize<'de> for NicknameTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NicknameTableVisitor)
    }
}

// ============================================================================
// Tests
// ============================================================================
