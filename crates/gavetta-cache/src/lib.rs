//! In-memory response store for the TMDB proxy.
//!
//! - [`CacheKey`]: order-independent key over an action and its parameters
//! - [`ResponseStore`]: bounded map with read-time TTL and bulk oldest-first eviction
//! - [`Clock`]: time source, swappable for [`ManualClock`] in tests

pub mod clock;
pub mod key;
pub mod store;
pub mod traits;

pub use clock::{ManualClock, SystemClock};
pub use key::CacheKey;
pub use store::{ResponseStore, StoreConfig};
pub use traits::{CacheEntry, CacheStats, Clock};
