// ── Mutation coordinator ──
//
// All writes go through `MutationCoordinator`. It never returns `Err`:
// failures become `MutationResult { success: false, message }` so callers
// can branch without error plumbing. On success it revalidates exactly the
// keys the request declares as affected. There is no dependency graph
// between keys.

pub mod requests;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use medcart_api::{ApiClient, Method, RequestOptions};

use crate::cache::Cache;
use crate::error::CoreError;
use crate::key::ResourceKey;

/// One write against the backend, plus the cache keys it makes stale.
#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub affected: Vec<ResourceKey>,
}

impl MutationRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_owned(),
            body: None,
            affected: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn affects(mut self, keys: impl IntoIterator<Item = ResourceKey>) -> Self {
        self.affected.extend(keys);
        self
    }
}

/// Outcome of a write. `message` carries the backend's message on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationResult {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<Value>,
}

impl MutationResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl From<Result<Value, CoreError>> for MutationResult {
    fn from(result: Result<Value, CoreError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct MutationCoordinator {
    client: ApiClient,
    cache: Cache,
}

impl MutationCoordinator {
    pub fn new(client: ApiClient, cache: Cache) -> Self {
        Self { client, cache }
    }

    /// Send `request`; on success revalidate its affected keys.
    pub async fn perform(&self, request: &MutationRequest) -> MutationResult {
        let result = self.send(request).await;
        if result.success {
            // Revalidations run on their own; the caller need not wait.
            drop(self.cache.invalidate(&request.affected));
        }
        result
    }

    /// Apply `updater` to `key` before the server answers.
    ///
    /// On success the affected keys are revalidated as in [`perform`](Self::perform).
    /// On failure `key` is restored to what it held before the update,
    /// unless other data has been committed to it in the meantime.
    pub async fn perform_optimistic(
        &self,
        request: &MutationRequest,
        key: &ResourceKey,
        updater: impl FnOnce(Option<&Value>) -> Value + Send + 'static,
    ) -> MutationResult {
        let (snapshot, written) = self.cache.apply_update(key, updater);
        debug!(%key, "applied optimistic update");

        let result = self.perform(request).await;
        if !result.success {
            if self.cache.roll_back(key, &written, snapshot) {
                debug!(%key, "rolled back optimistic update");
            } else {
                debug!(%key, "newer data committed, keeping it over rollback");
            }
        }
        result
    }

    async fn send(&self, request: &MutationRequest) -> MutationResult {
        let mut options = RequestOptions::new(request.method.clone());
        options.body.clone_from(&request.body);

        match self.client.fetch(&request.path, options).await {
            Ok(data) => {
                debug!(method = %request.method, path = %request.path, "mutation succeeded");
                MutationResult::ok(data)
            }
            Err(e) => {
                warn!(method = %request.method, path = %request.path, error = %e, "mutation failed");
                MutationResult::failed(e.user_message())
            }
        }
    }
}
