use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CoreError;
use crate::key::ResourceKey;

/// Observable state of one cache slot.
///
/// `data` survives failed revalidations: a background error only fills
/// `error`, so views can render stale data next to an error indicator.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: ResourceKey,
    pub data: Option<Arc<Value>>,
    pub error: Option<Arc<medcart_api::Error>>,
    /// A fetch is running and there is no data to show yet.
    pub is_loading: bool,
    /// A fetch is running (with or without data on screen).
    pub is_validating: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub(crate) fn empty(key: ResourceKey) -> Self {
        Self {
            key,
            data: None,
            error: None,
            is_loading: false,
            is_validating: false,
            last_fetched_at: None,
        }
    }

    /// Decode `data` into a typed model. `Ok(None)` when nothing is cached.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, CoreError> {
        let Some(ref value) = self.data else {
            return Ok(None);
        };
        T::deserialize(value.as_ref())
            .map(Some)
            .map_err(|e| CoreError::Decode {
                what: self.key.to_string(),
                message: e.to_string(),
            })
    }
}
