//! Redis client initialization from layered configuration.
//!
//! Builds up to three pooled Redis clients from [`core_config::RedisSettings`]:
//!
//! - a **standalone** client, when `enable` is set
//! - a sentinel **master** client for the first node group
//! - a sentinel **replica** client for the last of the remaining node groups
//!
//! Zero-valued pool bounds and timeouts fall back to built-in defaults, and a
//! `PING` probe for the standalone client runs in the background so startup
//! never waits on the network.
//!
//! # Example
//!
//! ```ignore
//! use core_config::{FromEnv, InitPolicy, RedisSettings};
//! use redis::Commands;
//!
//! let settings = RedisSettings::from_env()?;
//! let policy = InitPolicy::from_env()?;
//!
//! let registry = redis_pool::ConnectionRegistry::new();
//! registry.initialize(&settings, &policy)?;
//!
//! if let Some(client) = registry.standalone() {
//!     let mut conn = client.get()?;
//!     conn.set::<_, _, ()>("key", "value")?;
//! }
//! ```
//!
//! Processes that prefer ambient access call [`bootstrap`] once at startup and
//! use [`standalone_client`], [`ha_master`] and [`ha_replica`] afterwards.

pub mod connector;
pub mod error;
pub mod health;
pub mod manager;
pub mod options;
pub mod registry;

pub use connector::{
    ClientOptions, PooledRedisConnection, RedisHandle, Role, connect_failover, connect_standalone,
};
pub use error::{RedisPoolError, RedisPoolResult};
pub use health::{HealthStatus, ProbeHandle, check_health, check_health_detailed, spawn_probe};
pub use manager::{SentinelManager, StandaloneManager};
pub use options::{FailoverOptions, StandaloneOptions, split_addresses};
pub use registry::{
    ConnectionRegistry, InitReport, InitSummary, bootstrap, bootstrap_from_env, ha_master,
    ha_replica, registry, standalone_client,
};

// Re-export redis types for convenience
pub use redis::{Commands, RedisResult};
