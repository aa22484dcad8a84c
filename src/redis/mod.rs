//! Redis backend for domain stats
//!
//! # Architecture
//!
//! ```text
//! Redis Schema:
//! {prefix}-domain-{entity}       → ZSET(epoch_ms → snapshot JSON)
//! {key}                          → STRING (scalar helpers, optional PX expiry)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use domain_stats::redis::{RedisConfig, RedisStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisStore::connect(RedisConfig::with_url("redis://localhost:6379/0")).await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod store;
pub mod util;

pub use connection::{CommandStats, RedisConfig, RedisConnection};
pub use store::RedisStore;
