//! Data-synchronization layer between `medcart-api` and storefront views.
//!
//! - **[`Cache`]**: keyed stale-while-revalidate cache. Views
//!   [`subscribe`](Cache::subscribe) to a [`ResourceKey`] and get a
//!   [`Subscription`]; concurrent subscribers share one in-flight request,
//!   and a per-key sequence number keeps older responses from overwriting
//!   newer ones.
//!
//! - **[`MutationCoordinator`]**: runs writes, folds failures into a
//!   [`MutationResult`], and revalidates the keys each
//!   [`MutationRequest`] declares. Optimistic updates roll back on failure.
//!
//! - **[`Form`]**: binds raw field values to a [`Schema`], validating
//!   locally before anything is sent.
//!
//! - **[`Storefront`]**: composition root wiring the above to one
//!   [`ApiClient`](medcart_api::ApiClient) from a [`ClientConfig`].

pub mod cache;
pub mod config;
pub mod context;
pub mod drafts;
pub mod endpoints;
pub mod error;
pub mod form;
pub mod key;
pub mod model;
pub mod mutation;
pub mod session;
pub mod subscription;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{
    Cache, CacheConfig, CacheEntry, FetchOutcome, MutateAction, Revalidation, SubscribeOptions,
};
pub use config::{ClientConfig, TlsVerification};
pub use context::Storefront;
pub use drafts::DraftStore;
pub use error::CoreError;
pub use form::{
    FieldErrors, Form, FormStatus, FormValues, Notification, NotificationLevel, Schema,
    SubmitOutcome,
};
pub use key::ResourceKey;
pub use mutation::{MutationCoordinator, MutationRequest, MutationResult};
pub use session::Session;
pub use subscription::{Subscription, SubscriptionStream};

pub use model::{
    AuthToken, Category, ChatMessage, ConsultationRoom, Order, OrderItem, OrderStatus, Page,
    Pharmacy, Product, Role, User,
};
