// ── Read seam for the resource cache ──
//
// The cache only ever needs "give me the current value behind this key".
// Abstracting that behind a trait keeps the cache testable without HTTP.

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::client::{ApiClient, RequestOptions};
use crate::error::Error;

/// Something that can resolve a resource key to its current value.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, key: &str) -> BoxFuture<'static, Result<Value, Error>>;
}

impl Fetcher for ApiClient {
    fn fetch(&self, key: &str) -> BoxFuture<'static, Result<Value, Error>> {
        let client = self.clone();
        let key = key.to_owned();
        Box::pin(async move { ApiClient::fetch(&client, &key, RequestOptions::default()).await })
    }
}
