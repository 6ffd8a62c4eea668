use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::quiz::ScalarValue;

/// Synthetic key written by the tone slider of a tone-faces step.
pub const TONE_KEY: &str = "tone";
/// Synthetic key written by the face grid of a tone-faces step.
pub const FACE_KEY: &str = "face";
/// Key used by the undertone step regardless of its question id.
pub const UNDERTONE_KEY: &str = "undertone";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Scalar(String),
    MultiSelect(Vec<String>),
}

impl AnswerValue {
    /// Every value this answer compares as; arrays expand per element.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::MultiSelect(values) => values,
        };
        values.iter().map(String::as_str)
    }

    pub fn contains(&self, expected: &str) -> bool {
        self.values().any(|value| value == expected)
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::MultiSelect(_) => None,
        }
    }
}

/// Answers collected by the wizard, keyed by question id or synthetic key.
///
/// Iteration follows the order in which keys were first written.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap {
    entries: IndexMap<String, AnswerValue>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.entries.get(key)
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AnswerValue::as_scalar)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// True when the answer under `key` equals `expected` (any element for
    /// multi-select answers).
    pub fn matches(&self, key: &str, expected: &str) -> bool {
        self.get(key).is_some_and(|value| value.contains(expected))
    }

    pub fn set_scalar(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), AnswerValue::Scalar(value.into()));
    }

    /// Adds `value` to the multi-select answer under `key`, or removes it when
    /// already selected. A scalar stored under the key is replaced.
    pub fn toggle(&mut self, key: &str, value: &str) {
        let mut selected = match self.entries.get(key) {
            Some(AnswerValue::MultiSelect(values)) => values.clone(),
            _ => Vec::new(),
        };
        match selected.iter().position(|existing| existing == value) {
            Some(index) => {
                selected.remove(index);
            }
            None => selected.push(value.to_string()),
        }
        self.entries.insert(key.to_string(), AnswerValue::MultiSelect(selected));
    }

    pub fn remove(&mut self, key: &str) -> Option<AnswerValue> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Wire form with multi-select answers flattened to one entry per value.
    pub fn to_entries(&self) -> Vec<AnswerEntry> {
        self.iter()
            .flat_map(|(key, value)| {
                value.values().map(move |item| AnswerEntry {
                    question_id: key.to_string(),
                    value: Some(EntryValue::One(ScalarValue::Text(item.to_string()))),
                })
            })
            .collect()
    }

    /// Rebuilds a map from wire entries. Repeated keys collapse into a
    /// multi-select answer in first-seen order; duplicates are dropped.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = AnswerEntry>,
    {
        let mut map = Self::new();
        for entry in entries {
            match entry.value {
                None => {}
                Some(EntryValue::One(value)) => {
                    let value = value.as_key();
                    match map.entries.get(&entry.question_id) {
                        None => map.set_scalar(entry.question_id, value),
                        Some(AnswerValue::Scalar(existing)) if *existing == value => {}
                        Some(_) => map.push_unique(entry.question_id, [value]),
                    }
                }
                Some(EntryValue::Many(values)) => {
                    map.push_unique(entry.question_id, values.iter().map(ScalarValue::as_key));
                }
            }
        }
        map
    }

    fn push_unique<I>(&mut self, key: String, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        let slot = self.entries.entry(key).or_insert_with(|| AnswerValue::MultiSelect(Vec::new()));
        let mut selected = match std::mem::replace(slot, AnswerValue::MultiSelect(Vec::new())) {
            AnswerValue::Scalar(existing) => vec![existing],
            AnswerValue::MultiSelect(existing) => existing,
        };
        for value in values {
            if !selected.contains(&value) {
                selected.push(value);
            }
        }
        *slot = AnswerValue::MultiSelect(selected);
    }
}

/// One `{questionId, value}` pair as posted by the widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<EntryValue>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryValue {
    One(ScalarValue),
    Many(Vec<ScalarValue>),
}
