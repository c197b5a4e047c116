//! Upstream API client
//!
//! Composes a rate limiter, TTL response cache, retrying fetcher, and typed
//! response validation into the endpoint methods of [`CfbdClient`].

mod cache;
mod cfbd;
mod fetch;
mod key;
mod limiter;
mod transport;
mod validate;


// Re-export public types
pub use cache::{BoundedCache, CacheEntry, CacheStats, ResponseCache};
pub use cfbd::{CfbdClient, RequestOptions};
pub use fetch::RetryingFetcher;
pub use key::RequestKey;
pub use limiter::RateLimiter;
pub use transport::{HttpTransport, Transport, TransportResponse};
pub use validate::Decoded;

// == Public Constants ==
/// Default response-cache TTL in milliseconds (5 minutes)
pub const DEFAULT_CACHE_TTL_MS: u64 = 300_000;

/// Default minimum spacing between upstream requests in milliseconds
pub const DEFAULT_RATE_LIMIT_MS: u64 = 100;

/// Capacity of the bounded teams cache
pub const TEAMS_CACHE_CAPACITY: usize = 32;
