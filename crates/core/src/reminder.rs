// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reminder schedule model
//!
//! A [`Schedule`] is pushed whole by the foreground client and replaces any
//! previous one. Entries are decoded leniently: a field of the wrong shape
//! degrades to an empty value so a single bad entry cannot reject the batch.
//! Whether an entry is usable is decided later, when its time is parsed.

use crate::notification::NotificationTag;
use crate::time_of_day::{TimeOfDay, TimeParseError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Opaque identifier of an item (e.g. a medication) a reminder covers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Accept the JSON shapes clients use for identifiers
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(ItemId(s.clone())),
            Value::Number(n) => Some(ItemId(number_key(n))),
            _ => None,
        }
    }
}

/// `1.0` and `1` name the same item, as they do for JavaScript clients
fn number_key(n: &Number) -> String {
    // Integers beyond 2^53 are not exact in a double anyway
    const EXACT: f64 = 9_007_199_254_740_992.0;
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < EXACT => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(s)
    }
}

/// One reminder: a local time of day, a message, and the items it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSpec {
    /// Raw `HH:MM` as received; may be malformed
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: String,
    #[serde(
        rename = "msg",
        alias = "message",
        default,
        deserialize_with = "lenient_string"
    )]
    pub message: String,
    #[serde(
        rename = "medIds",
        alias = "itemIds",
        default,
        deserialize_with = "lenient_item_ids"
    )]
    pub item_ids: Vec<ItemId>,
}

impl ReminderSpec {
    pub fn new(time: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            message: message.into(),
            item_ids: Vec::new(),
        }
    }

    pub fn with_items<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        self.item_ids = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn time_of_day(&self) -> Result<TimeOfDay, TimeParseError> {
        self.time.parse()
    }

    /// De-duplication tag: the normalized time string, so reminders sharing a
    /// time coalesce and different times never collapse into one alert.
    pub fn tag(&self) -> Option<NotificationTag> {
        self.time_of_day().ok().map(NotificationTag::for_time)
    }
}

/// The full set of reminders currently supplied by the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule(#[serde(deserialize_with = "lenient_entries")] Vec<ReminderSpec>);

impl Schedule {
    pub fn new(entries: Vec<ReminderSpec>) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReminderSpec> {
        self.0.iter()
    }

    pub fn entries(&self) -> &[ReminderSpec] {
        &self.0
    }
}

impl From<Vec<ReminderSpec>> for Schedule {
    fn from(entries: Vec<ReminderSpec>) -> Self {
        Self(entries)
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a ReminderSpec;
    type IntoIter = std::slice::Iter<'a, ReminderSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

fn lenient_item_ids<'de, D>(deserializer: D) -> Result<Vec<ItemId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(values)) => values.iter().filter_map(ItemId::from_value).collect(),
        _ => Vec::new(),
    })
}

fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<ReminderSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(values)) => values,
        _ => return Ok(Vec::new()),
    };

    let mut entries = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<ReminderSpec>(value) {
            Ok(spec) => entries.push(spec),
            Err(e) => {
                // Not an object at all; keep the slot so counts match what the
                // client sent, it will never arm.
                tracing::debug!(error = %e, "unusable schedule entry");
                entries.push(ReminderSpec::new("", ""));
            }
        }
    }
    Ok(entries)
}

#[cfg(test)]
#[path = "reminder_tests.rs"]
mod tests;
