// ── Composition root ──
//
// Builds the client, cache, coordinator, and session once and hands out
// handles. Tests build their own `Storefront` (or bare `Cache`) per case;
// nothing here is global.

use std::sync::Arc;
use std::time::Duration;

use medcart_api::ApiClient;

use crate::cache::{Cache, CacheConfig, SubscribeOptions};
use crate::config::ClientConfig;
use crate::drafts::DraftStore;
use crate::error::CoreError;
use crate::form::{Form, FormValues, Schema};
use crate::key::ResourceKey;
use crate::mutation::MutationCoordinator;
use crate::session::Session;
use crate::subscription::Subscription;

const MIN_JANITOR_PERIOD: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct Storefront {
    client: ApiClient,
    cache: Cache,
    mutations: MutationCoordinator,
    session: Session,
    drafts: Option<DraftStore>,
}

impl Storefront {
    /// Wire everything up from `config` and start the idle-entry janitor.
    ///
    /// Must be called within a Tokio runtime. [`from_parts`](Self::from_parts)
    /// leaves eviction to the caller.
    pub fn new(config: &ClientConfig) -> Result<Self, CoreError> {
        let client = ApiClient::new(config.base_url.as_str(), &config.transport())?;
        if let Some(ref token) = config.token {
            client.set_token(token.clone());
        }
        let store = Self::from_parts(
            client,
            config.cache.clone(),
            config.drafts_dir.clone().map(DraftStore::new),
        );
        drop(
            store
                .cache
                .spawn_janitor(config.cache.idle_eviction.max(MIN_JANITOR_PERIOD)),
        );
        Ok(store)
    }

    /// Build around an existing client.
    pub fn from_parts(
        client: ApiClient,
        cache_config: CacheConfig,
        drafts: Option<DraftStore>,
    ) -> Self {
        let cache = Cache::new(Arc::new(client.clone()), cache_config);
        Self {
            mutations: MutationCoordinator::new(client.clone(), cache.clone()),
            session: Session::new(client.clone(), cache.clone()),
            client,
            cache,
            drafts,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Form draft storage, when a drafts directory is configured.
    pub fn drafts(&self) -> Option<&DraftStore> {
        self.drafts.as_ref()
    }

    pub fn subscribe(&self, key: ResourceKey, options: SubscribeOptions) -> Subscription {
        self.cache.subscribe(key, options)
    }

    /// Bind a form, with drafts under `draft_name` when a drafts directory
    /// is configured.
    pub fn form<S: Schema>(
        &self,
        schema: S,
        defaults: FormValues,
        draft_name: Option<&str>,
    ) -> Result<Form<S>, CoreError> {
        match (&self.drafts, draft_name) {
            (Some(store), Some(name)) => Form::with_drafts(schema, defaults, store.clone(), name),
            _ => Ok(Form::bind(schema, defaults)),
        }
    }

    /// Stop the janitor and background refresh tasks.
    pub fn shutdown(&self) {
        self.cache.shutdown();
    }
}
