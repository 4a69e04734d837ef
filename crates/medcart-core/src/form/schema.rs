use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A validator that turns raw form values into a typed payload.
///
/// Implementations decide everything about a form's rules; the form
/// layer only knows that validation either yields `Output` or a set of
/// per-field messages.
pub trait Schema {
    type Output: Serialize;

    fn validate(&self, values: &FormValues) -> Result<Self::Output, FieldErrors>;
}

// ── Values ───────────────────────────────────────────────────────────

/// Raw text values of a form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(IndexMap<String, String>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `field`, or `""` when it was never set.
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map_or("", String::as_str)
    }

    /// Value of `field` with surrounding whitespace removed.
    pub fn trimmed(&self, field: &str) -> &str {
        self.get(field).trim()
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(String::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ── Errors ───────────────────────────────────────────────────────────

/// Field-level validation messages, one per field, in the order found.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(IndexMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field`. The first message per field wins.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Run `check` for `field`, recording its error if it fails.
    pub fn check<T>(&mut self, field: &str, check: impl FnOnce() -> Result<T, String>) -> Option<T> {
        match check() {
            Ok(value) => Some(value),
            Err(message) => {
                self.insert(field, message);
                None
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.shift_remove(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}
