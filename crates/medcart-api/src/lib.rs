//! Async REST client for the medcart storefront backend.
//!
//! [`ApiClient`] resolves resource keys against a configured base URL,
//! injects the bearer token, and normalizes the backend's
//! `{ success, message, data }` envelope. [`Fetcher`] is the read-only
//! seam the resource cache in `medcart-core` is built on.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod transport;

pub use client::{ApiClient, RequestOptions};
pub use error::Error;
pub use fetcher::Fetcher;
pub use reqwest::Method;
pub use transport::{TlsMode, TransportConfig};
