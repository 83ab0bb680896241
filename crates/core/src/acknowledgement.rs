// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Items the user has marked as handled today

use crate::reminder::{ItemId, ReminderSpec};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;

/// Acknowledged item ids, as reported by the client in `CHECK_NOW.checks`.
///
/// On the wire this is an object of `itemId -> value`; an item counts as
/// acknowledged when its value is truthy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acknowledgements {
    items: BTreeSet<ItemId>,
}

impl Acknowledgements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acknowledge(&mut self, id: impl Into<ItemId>) {
        self.items.insert(id.into());
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.contains(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when every item the reminder covers is acknowledged.
    ///
    /// Vacuously true for a reminder with no items.
    pub fn covers(&self, spec: &ReminderSpec) -> bool {
        spec.item_ids.iter().all(|id| self.contains(id))
    }
}

impl<T: Into<ItemId>> FromIterator<T> for Acknowledgements {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl<'de> Deserialize<'de> for Acknowledgements {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Object(map)) => map
                .into_iter()
                .filter(|(_, v)| is_truthy(v))
                .map(|(k, _)| ItemId(k))
                .collect(),
            _ => BTreeSet::new(),
        };
        Ok(Self { items })
    }
}

impl Serialize for Acknowledgements {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.items.iter().map(|id| (&id.0, true)))
    }
}

/// The latest acknowledgements, valid only for the day they were reported
#[derive(Debug, Clone, Default)]
pub struct AckLedger {
    current: Option<(NaiveDate, Acknowledgements)>,
}

impl AckLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, date: NaiveDate, acks: Acknowledgements) {
        self.current = Some((date, acks));
    }

    /// Acknowledgements for `date`, if the last report was made that day
    pub fn for_date(&self, date: NaiveDate) -> Option<&Acknowledgements> {
        match &self.current {
            Some((day, acks)) if *day == date => Some(acks),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
#[path = "acknowledgement_tests.rs"]
mod tests;
