//! Caching proxy in front of the TMDB metadata API.
//!
//! An inbound `GET /?action=<name>&...` is validated, looked up in a
//! process-wide [`gavetta_cache::ResponseStore`] with a per-action TTL, and on
//! a miss forwarded to TMDB, normalized into a [`payload::Payload`] and stored.

pub mod action;
pub mod coalesce;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod payload;
pub mod proxy;
pub mod request;
pub mod upstream;

pub use action::{Action, ActionClass, TtlPolicy};
pub use config::Config;
pub use dispatch::{CacheStatus, Dispatched, Dispatcher};
pub use error::ProxyError;
pub use payload::Payload;
pub use proxy::{admin_router, router, AppState};
pub use request::{Locale, Params};
pub use upstream::{Endpoint, TmdbClient, Upstream, UpstreamError};
