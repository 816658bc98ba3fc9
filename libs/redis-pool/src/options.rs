//! Client options derived from [`RedisSettings`].
//!
//! Zero-valued bounds are treated as unset and replaced with the defaults
//! below, so a constructed option set never carries a zero pool size,
//! minimum-idle count or dial timeout.

use core_config::{HostResolution, InitPolicy, RedisSettings, SentinelNodeSettings, TimeoutSource};
use std::fmt;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_POOL_SIZE: u32 = 5;
pub const DEFAULT_STANDALONE_MIN_IDLE: u32 = 2;
pub const DEFAULT_SENTINEL_MIN_IDLE: u32 = 5;
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Options of the standalone client
#[derive(Clone, PartialEq, Eq)]
pub struct StandaloneOptions {
    /// `host:port`
    pub addr: String,
    pub host: String,
    pub port: u16,
    pub password: String,
    pub db: i64,
    pub pool_size: u32,
    pub min_idle_conns: u32,
    pub dial_timeout: Duration,
}

/// Options of a sentinel-backed (failover) client
#[derive(Clone, PartialEq, Eq)]
pub struct FailoverOptions {
    /// Master name monitored by the sentinels
    pub master_name: String,
    /// Seed list of sentinel `host:port` addresses
    pub sentinel_addrs: Vec<String>,
    pub password: String,
    pub db: i64,
    pub pool_size: u32,
    pub min_idle_conns: u32,
    pub dial_timeout: Duration,
}

impl StandaloneOptions {
    pub fn from_settings(settings: &RedisSettings, policy: &InitPolicy) -> Self {
        let host = match policy.host_resolution {
            HostResolution::Environment => core_config::resolve_env(&settings.host),
            HostResolution::Raw => settings.host.clone(),
        };

        let pool_size = or_default(settings.max_idle, DEFAULT_POOL_SIZE);
        let min_idle_default = or_default(
            policy.standalone_min_idle_default,
            DEFAULT_STANDALONE_MIN_IDLE,
        );
        let min_idle_conns = clamp_min_idle(
            or_default(settings.max_active, min_idle_default),
            pool_size,
            "standalone",
        );

        Self {
            addr: format!("{}:{}", host, settings.port),
            host,
            port: settings.port,
            password: settings.password.clone(),
            db: settings.db,
            pool_size,
            min_idle_conns,
            dial_timeout: dial_timeout(settings.timeout),
        }
    }
}

impl FailoverOptions {
    /// Options for one node group. `shared_timeout` is the standalone
    /// `timeout` setting in seconds.
    pub fn from_node(node: &SentinelNodeSettings, shared_timeout: u64, policy: &InitPolicy) -> Self {
        let timeout = match policy.sentinel_timeout {
            TimeoutSource::Shared => shared_timeout,
            TimeoutSource::PerGroup => node
                .timeout
                .filter(|seconds| *seconds > 0)
                .unwrap_or(shared_timeout),
        };

        let pool_size = or_default(node.pool_size, DEFAULT_POOL_SIZE);
        let min_idle_conns = clamp_min_idle(
            or_default(node.min_idle_conns, DEFAULT_SENTINEL_MIN_IDLE),
            pool_size,
            &node.name,
        );

        Self {
            master_name: node.name.clone(),
            sentinel_addrs: split_addresses(&node.address),
            password: node.password.clone(),
            db: node.db,
            pool_size,
            min_idle_conns,
            dial_timeout: dial_timeout(timeout),
        }
    }
}

/// Split a comma-joined address list. Entries are kept as-is, empty ones included.
pub fn split_addresses(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// Dial timeout from a seconds setting, where 0 means the default.
pub fn dial_timeout(seconds: u64) -> Duration {
    if seconds == 0 {
        DEFAULT_DIAL_TIMEOUT
    } else {
        Duration::from_secs(seconds)
    }
}

fn or_default(value: u32, default: u32) -> u32 {
    if value == 0 { default } else { value }
}

// The pool cannot keep more idle connections than it may open.
fn clamp_min_idle(min_idle: u32, pool_size: u32, client: &str) -> u32 {
    if min_idle > pool_size {
        warn!(
            client,
            min_idle, pool_size, "Minimum idle connections exceed pool size, clamping"
        );
        pool_size
    } else {
        min_idle
    }
}

fn redact(password: &str) -> &'static str {
    if password.is_empty() { "" } else { "******" }
}

impl fmt::Debug for StandaloneOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandaloneOptions")
            .field("addr", &self.addr)
            .field("password", &redact(&self.password))
            .field("db", &self.db)
            .field("pool_size", &self.pool_size)
            .field("min_idle_conns", &self.min_idle_conns)
            .field("dial_timeout", &self.dial_timeout)
            .finish()
    }
}

impl fmt::Debug for FailoverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailoverOptions")
            .field("master_name", &self.master_name)
            .field("sentinel_addrs", &self.sentinel_addrs)
            .field("password", &redact(&self.password))
            .field("db", &self.db)
            .field("pool_size", &self.pool_size)
            .field("min_idle_conns", &self.min_idle_conns)
            .field("dial_timeout", &self.dial_timeout)
            .finish()
    }
}
