// ── Resource keys ──
//
// A key is a request path plus query parameters, rendered to one stable
// string. Parameters are sorted by name so that insertion order never
// splits a logical resource across two cache slots.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Identifies one logical remote resource and its cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKey {
    path: String,
    query: Vec<(String, String)>,
    rendered: String,
}

impl ResourceKey {
    /// A key for `path` with no query parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self::from_parts(normalize_path(&path.into()), Vec::new())
    }

    /// Parse a raw `path?query` string, normalizing parameter order.
    pub fn parse(raw: &str) -> Self {
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self::from_parts(normalize_path(path), pairs)
    }

    /// Add a query parameter. Existing parameters with the same name are kept.
    pub fn with_query(self, name: impl Into<String>, value: impl ToString) -> Self {
        let mut query = self.query;
        query.push((name.into(), value.to_string()));
        Self::from_parts(self.path, query)
    }

    /// Add a query parameter only when `value` is present.
    pub fn with_optional_query<V: ToString>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with_query(name, v),
            None => self,
        }
    }

    fn from_parts(path: String, mut query: Vec<(String, String)>) -> Self {
        // Stable sort: repeated names keep their relative order.
        query.sort_by(|a, b| a.0.cmp(&b.0));
        let rendered = if query.is_empty() {
            path.clone()
        } else {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.iter())
                .finish();
            format!("{path}?{encoded}")
        };
        Self {
            path,
            query,
            rendered,
        }
    }

    /// The stable key string (also the request target).
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value of the first query parameter named `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl From<&str> for ResourceKey {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for ResourceKey {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ResourceKey> for String {
    fn from(key: ResourceKey) -> Self {
        key.rendered
    }
}
