//! Redis connection settings.
//!
//! Numeric pool bounds use `0` to mean "not configured"; the initializer
//! replaces them with its built-in defaults.

use serde::Deserialize;
use std::str::FromStr;

use crate::{env_flag, env_or_default, env_parse_or, ConfigError, FromEnv};

/// Standalone Redis settings plus the sentinel node groups.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RedisSettings {
    /// Whether the standalone client is built at all
    pub enable: bool,

    /// Host, possibly an environment reference such as `${REDIS_HOST_PROD}`
    pub host: String,

    pub port: u16,

    /// Database index
    pub db: i64,

    /// Empty means no AUTH
    pub password: String,

    /// Pool size of the standalone client
    pub max_idle: u32,

    /// Minimum idle connections of the standalone client
    pub max_active: u32,

    /// Dial timeout in seconds, shared with the sentinel groups
    pub timeout: u64,

    /// Sentinel node groups; the first one is the master
    pub sentinel: Vec<SentinelNodeSettings>,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            enable: false,
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
            password: String::new(),
            max_idle: 0,
            max_active: 0,
            timeout: 0,
            sentinel: Vec::new(),
        }
    }
}

/// One sentinel-monitored node group.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SentinelNodeSettings {
    /// Master name as known to the sentinels
    pub name: String,

    /// Comma-joined `host:port` list of sentinel nodes
    pub address: String,

    pub password: String,
    pub db: i64,
    pub pool_size: u32,
    pub min_idle_conns: u32,

    /// Per-group dial timeout in seconds, only read with [`TimeoutSource::PerGroup`]
    pub timeout: Option<u64>,
}

impl RedisSettings {
    pub fn standalone(host: impl Into<String>, port: u16) -> Self {
        Self {
            enable: true,
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_sentinel(mut self, node: SentinelNodeSettings) -> Self {
        self.sentinel.push(node);
        self
    }

    pub fn has_sentinel(&self) -> bool {
        !self.sentinel.is_empty()
    }
}

impl SentinelNodeSettings {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            ..Self::default()
        }
    }

    fn from_env_indexed(index: usize) -> Result<Option<Self>, ConfigError> {
        let key = |field: &str| format!("REDIS_SENTINEL_{}_{}", index, field);

        let Ok(name) = std::env::var(key("NAME")) else {
            return Ok(None);
        };

        let timeout = match std::env::var(key("TIMEOUT")) {
            Ok(raw) if !raw.trim().is_empty() => Some(env_parse_or(&key("TIMEOUT"), 0u64)?),
            _ => None,
        };

        Ok(Some(Self {
            name,
            address: env_or_default(&key("ADDRESS"), ""),
            password: env_or_default(&key("PASSWORD"), ""),
            db: env_parse_or(&key("DB"), 0)?,
            pool_size: env_parse_or(&key("POOL_SIZE"), 0)?,
            min_idle_conns: env_parse_or(&key("MIN_IDLE_CONNS"), 0)?,
            timeout,
        }))
    }
}

impl FromEnv for RedisSettings {
    /// Environment variables (all optional):
    /// - `REDIS_ENABLE`, `REDIS_HOST`, `REDIS_PORT`, `REDIS_DB`, `REDIS_PASSWORD`
    /// - `REDIS_MAX_IDLE`, `REDIS_MAX_ACTIVE`, `REDIS_TIMEOUT`
    /// - `REDIS_SENTINEL_<i>_{NAME,ADDRESS,PASSWORD,DB,POOL_SIZE,MIN_IDLE_CONNS,TIMEOUT}`
    ///   for `i = 0, 1, ...`, stopping at the first index without a `NAME`
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut sentinel = Vec::new();
        while let Some(node) = SentinelNodeSettings::from_env_indexed(sentinel.len())? {
            sentinel.push(node);
        }

        Ok(Self {
            enable: env_flag("REDIS_ENABLE", defaults.enable)?,
            host: env_or_default("REDIS_HOST", &defaults.host),
            port: env_parse_or("REDIS_PORT", defaults.port)?,
            db: env_parse_or("REDIS_DB", defaults.db)?,
            password: env_or_default("REDIS_PASSWORD", ""),
            max_idle: env_parse_or("REDIS_MAX_IDLE", 0)?,
            max_active: env_parse_or("REDIS_MAX_ACTIVE", 0)?,
            timeout: env_parse_or("REDIS_TIMEOUT", 0)?,
            sentinel,
        })
    }
}

/// What a failed liveness probe does to the process.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProbePolicy {
    /// Log the failure and keep running
    #[default]
    LogOnly,
    /// Log the failure and exit the process
    Abort,
}

/// Where sentinel groups take their dial timeout from.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TimeoutSource {
    /// The standalone `timeout` setting
    #[default]
    Shared,
    /// The group's own `timeout`, falling back to the standalone one
    PerGroup,
}

/// How the standalone host is interpreted.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HostResolution {
    /// Resolve `${VAR}` / `$VAR` references through the environment
    #[default]
    Environment,
    /// Use the configured host verbatim
    Raw,
}

impl FromStr for ProbePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "log" | "log-only" | "warn" => Ok(Self::LogOnly),
            "abort" | "fatal" | "exit" => Ok(Self::Abort),
            other => Err(format!("unknown probe policy '{}'", other)),
        }
    }
}

impl FromStr for TimeoutSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "per-group" | "per_group" | "group" => Ok(Self::PerGroup),
            other => Err(format!("unknown timeout source '{}'", other)),
        }
    }
}

impl FromStr for HostResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "env" | "environment" => Ok(Self::Environment),
            "raw" => Ok(Self::Raw),
            other => Err(format!("unknown host resolution '{}'", other)),
        }
    }
}

/// Knobs selecting between the behaviors deployments have relied on.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InitPolicy {
    pub probe_failure: ProbePolicy,

    /// Minimum idle connections for the standalone client when `max_active` is 0
    pub standalone_min_idle_default: u32,

    pub sentinel_timeout: TimeoutSource,
    pub host_resolution: HostResolution,
}

impl Default for InitPolicy {
    fn default() -> Self {
        Self {
            probe_failure: ProbePolicy::LogOnly,
            standalone_min_idle_default: 2,
            sentinel_timeout: TimeoutSource::Shared,
            host_resolution: HostResolution::Environment,
        }
    }
}

impl InitPolicy {
    pub fn with_probe_failure(mut self, policy: ProbePolicy) -> Self {
        self.probe_failure = policy;
        self
    }

    pub fn with_standalone_min_idle_default(mut self, min_idle: u32) -> Self {
        self.standalone_min_idle_default = min_idle;
        self
    }

    pub fn with_sentinel_timeout(mut self, source: TimeoutSource) -> Self {
        self.sentinel_timeout = source;
        self
    }

    pub fn with_host_resolution(mut self, resolution: HostResolution) -> Self {
        self.host_resolution = resolution;
        self
    }
}

impl FromEnv for InitPolicy {
    /// Environment variables (all optional):
    /// - `REDIS_PROBE_FAILURE`: `log` (default) or `abort`
    /// - `REDIS_STANDALONE_MIN_IDLE_DEFAULT`: default 2
    /// - `REDIS_SENTINEL_TIMEOUT`: `shared` (default) or `per-group`
    /// - `REDIS_HOST_RESOLUTION`: `env` (default) or `raw`
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            probe_failure: env_parse_or("REDIS_PROBE_FAILURE", defaults.probe_failure)?,
            standalone_min_idle_default: env_parse_or(
                "REDIS_STANDALONE_MIN_IDLE_DEFAULT",
                defaults.standalone_min_idle_default,
            )?,
            sentinel_timeout: env_parse_or("REDIS_SENTINEL_TIMEOUT", defaults.sentinel_timeout)?,
            host_resolution: env_parse_or("REDIS_HOST_RESOLUTION", defaults.host_resolution)?,
        })
    }
}
