use core_config::{FromEnv, InitPolicy, RedisSettings};
use std::sync::{LazyLock, Mutex, OnceLock, PoisonError, RwLock};
use tracing::{debug, info};

use crate::connector::{RedisHandle, Role, connect_failover, connect_standalone};
use crate::error::RedisPoolResult;
use crate::health::{ProbeHandle, spawn_probe};
use crate::options::{FailoverOptions, StandaloneOptions};

#[derive(Clone, Default)]
struct Handles {
    standalone: Option<RedisHandle>,
    master: Option<RedisHandle>,
    replica: Option<RedisHandle>,
}

/// Holds the standalone, sentinel master and sentinel replica handles.
///
/// Pass it to consumers directly, or use the process-wide instance behind
/// [`bootstrap`] and the free accessor functions.
#[derive(Default)]
pub struct ConnectionRegistry {
    handles: RwLock<Handles>,
}

/// What an initialization pass configured
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InitSummary {
    /// `host:port` of the standalone client
    pub standalone: Option<String>,
    /// Master name of the first node group
    pub master: Option<String>,
    /// Master name of the last non-primary node group
    pub replica: Option<String>,
}

impl InitSummary {
    pub fn is_empty(&self) -> bool {
        self.standalone.is_none() && self.master.is_none() && self.replica.is_none()
    }
}

/// Result of [`ConnectionRegistry::initialize`]
#[derive(Debug)]
pub struct InitReport {
    pub summary: InitSummary,
    probe: Option<ProbeHandle>,
}

impl InitReport {
    /// The liveness probe dispatched for the standalone client, if any.
    /// Only the first call returns it.
    pub fn take_probe(&mut self) -> Option<ProbeHandle> {
        self.probe.take()
    }

    pub fn probe_dispatched(&self) -> bool {
        self.probe.is_some()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured client and replace the current handles.
    ///
    /// - With `settings.enable`, a standalone client is built and a liveness
    ///   probe is dispatched for it without waiting on the result.
    /// - Node group 0 becomes the master; every later group replaces the
    ///   replica in turn, so the last one wins.
    ///
    /// Slots that the settings no longer configure are cleared. Sentinel
    /// clients are always registered, even when some of their seed addresses
    /// are unusable; only a standalone client that cannot be built fails the
    /// call, and then the previous handles stay in place.
    pub fn initialize(
        &self,
        settings: &RedisSettings,
        policy: &InitPolicy,
    ) -> RedisPoolResult<InitReport> {
        let mut next = Handles::default();
        let mut summary = InitSummary::default();

        if settings.enable {
            let options = StandaloneOptions::from_settings(settings, policy);
            summary.standalone = Some(options.addr.clone());
            next.standalone = Some(connect_standalone(options, Role::Standalone)?);
        } else {
            debug!("Standalone Redis disabled");
        }

        for (index, node) in settings.sentinel.iter().enumerate() {
            let options = FailoverOptions::from_node(node, settings.timeout, policy);

            if index == 0 {
                summary.master = Some(options.master_name.clone());
                next.master = Some(connect_failover(options, Role::Master));
                info!(master_name = %node.name, "Redis sentinel master initialized");
            } else {
                summary.replica = Some(options.master_name.clone());
                next.replica = Some(connect_failover(options, Role::Replica));
                info!(master_name = %node.name, "Redis sentinel replica initialized");
            }
        }

        let probe_target = next.standalone.clone();
        *self.handles.write().unwrap_or_else(PoisonError::into_inner) = next;

        let probe = probe_target.map(|handle| spawn_probe(handle, policy.probe_failure));

        info!(
            standalone = summary.standalone.as_deref().unwrap_or("-"),
            master = summary.master.as_deref().unwrap_or("-"),
            replica = summary.replica.as_deref().unwrap_or("-"),
            "Redis connection registry initialized"
        );

        Ok(InitReport { summary, probe })
    }

    /// The standalone client, if one is configured
    pub fn standalone(&self) -> Option<RedisHandle> {
        self.read().standalone.clone()
    }

    /// The sentinel master client (node group 0), if configured
    pub fn ha_master(&self) -> Option<RedisHandle> {
        self.read().master.clone()
    }

    /// The sentinel replica client (last non-primary node group), if configured
    pub fn ha_replica(&self) -> Option<RedisHandle> {
        self.read().replica.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Handles> {
        self.handles.read().unwrap_or_else(PoisonError::into_inner)
    }
}

static GLOBAL: LazyLock<ConnectionRegistry> = LazyLock::new(ConnectionRegistry::new);
static BOOTSTRAPPED: OnceLock<InitSummary> = OnceLock::new();
static BOOTSTRAP_LOCK: Mutex<()> = Mutex::new(());

/// The process-wide registry
pub fn registry() -> &'static ConnectionRegistry {
    &GLOBAL
}

/// Initialize the process-wide registry once.
///
/// The first successful call builds the clients; later calls log and return
/// the first summary without a probe. A failed call leaves the registry
/// uninitialized so it can be retried.
pub fn bootstrap(settings: &RedisSettings, policy: &InitPolicy) -> RedisPoolResult<InitReport> {
    let _guard = BOOTSTRAP_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(summary) = BOOTSTRAPPED.get() {
        debug!("Redis connection registry already initialized");
        return Ok(InitReport {
            summary: summary.clone(),
            probe: None,
        });
    }

    let report = GLOBAL.initialize(settings, policy)?;
    let _ = BOOTSTRAPPED.set(report.summary.clone());
    Ok(report)
}

/// [`bootstrap`] with settings and policy read from `REDIS_*` variables
pub fn bootstrap_from_env() -> RedisPoolResult<InitReport> {
    let settings = RedisSettings::from_env()?;
    let policy = InitPolicy::from_env()?;
    bootstrap(&settings, &policy)
}

/// Standalone client of the process-wide registry
pub fn standalone_client() -> Option<RedisHandle> {
    GLOBAL.standalone()
}

/// Sentinel master client of the process-wide registry
pub fn ha_master() -> Option<RedisHandle> {
    GLOBAL.ha_master()
}

/// Sentinel replica client of the process-wide registry
pub fn ha_replica() -> Option<RedisHandle> {
    GLOBAL.ha_replica()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::SentinelNodeSettings;
    use std::time::Duration;

    fn standalone_settings(port: u16) -> RedisSettings {
        RedisSettings {
            timeout: 1,
            ..RedisSettings::standalone("127.0.0.1", port)
        }
    }

    #[test]
    fn test_uninitialized_registry_is_empty() {
        let registry = ConnectionRegistry::new();
        assert!(registry.standalone().is_none());
        assert!(registry.ha_master().is_none());
        assert!(registry.ha_replica().is_none());
    }

    #[test]
    fn test_nothing_configured_builds_nothing() {
        let registry = ConnectionRegistry::new();
        let report = registry
            .initialize(&RedisSettings::default(), &InitPolicy::default())
            .unwrap();

        assert!(report.summary.is_empty());
        assert!(!report.probe_dispatched());
        assert!(registry.standalone().is_none());
        assert!(registry.ha_master().is_none());
        assert!(registry.ha_replica().is_none());
    }

    #[test]
    fn test_standalone_only() {
        let registry = ConnectionRegistry::new();
        let report = registry
            .initialize(&standalone_settings(6392), &InitPolicy::default())
            .unwrap();

        assert_eq!(report.summary.standalone.as_deref(), Some("127.0.0.1:6392"));
        assert!(report.probe_dispatched());

        let handle = registry.standalone().unwrap();
        assert_eq!(handle.role(), Role::Standalone);
        assert!(registry.ha_master().is_none());
        assert!(registry.ha_replica().is_none());
    }

    #[test]
    fn test_first_group_is_master_last_group_is_replica() {
        let settings = RedisSettings::default()
            .with_sentinel(SentinelNodeSettings::new("m", "s1:26379,s2:26379"))
            .with_sentinel(SentinelNodeSettings::new("r1", "s3:26379"))
            .with_sentinel(SentinelNodeSettings::new("r2", "s4:26379"));

        let registry = ConnectionRegistry::new();
        let report = registry.initialize(&settings, &InitPolicy::default()).unwrap();

        assert_eq!(report.summary.master.as_deref(), Some("m"));
        assert_eq!(report.summary.replica.as_deref(), Some("r2"));
        assert!(!report.probe_dispatched());

        let master = registry.ha_master().unwrap();
        assert_eq!(master.role(), Role::Master);
        assert_eq!(master.options().as_failover().unwrap().master_name, "m");

        let replica = registry.ha_replica().unwrap();
        assert_eq!(replica.role(), Role::Replica);
        let replica_options = replica.options().as_failover().unwrap();
        assert_eq!(replica_options.master_name, "r2");
        assert_eq!(replica_options.sentinel_addrs, vec!["s4:26379"]);
    }

    #[test]
    fn test_single_group_has_no_replica() {
        let settings =
            RedisSettings::default().with_sentinel(SentinelNodeSettings::new("m", "s1:26379"));

        let registry = ConnectionRegistry::new();
        registry.initialize(&settings, &InitPolicy::default()).unwrap();

        assert!(registry.ha_master().is_some());
        assert!(registry.ha_replica().is_none());
    }

    #[test]
    fn test_reinitialize_replaces_standalone() {
        let registry = ConnectionRegistry::new();
        registry
            .initialize(&standalone_settings(6393), &InitPolicy::default())
            .unwrap();
        let first = registry.standalone().unwrap();

        registry
            .initialize(&standalone_settings(6394), &InitPolicy::default())
            .unwrap();
        let second = registry.standalone().unwrap();

        assert!(!first.same_client(&second));
        assert!(second.same_client(&registry.standalone().unwrap()));
        assert_eq!(
            second.options().as_standalone().unwrap().addr,
            "127.0.0.1:6394"
        );
    }

    #[test]
    fn test_reinitialize_clears_dropped_sections() {
        let registry = ConnectionRegistry::new();
        let settings = standalone_settings(6395)
            .with_sentinel(SentinelNodeSettings::new("m", "s1:26379"))
            .with_sentinel(SentinelNodeSettings::new("r", "s2:26379"));
        registry.initialize(&settings, &InitPolicy::default()).unwrap();
        assert!(registry.ha_replica().is_some());

        registry
            .initialize(&RedisSettings::default(), &InitPolicy::default())
            .unwrap();
        assert!(registry.standalone().is_none());
        assert!(registry.ha_master().is_none());
        assert!(registry.ha_replica().is_none());
    }

    #[test]
    fn test_spaced_seed_list_still_registers_every_handle() {
        let settings = standalone_settings(6396)
            .with_sentinel(SentinelNodeSettings::new("m", "s1:26379, s2:26379"))
            .with_sentinel(SentinelNodeSettings::new("r", ""));

        let registry = ConnectionRegistry::new();
        let report = registry.initialize(&settings, &InitPolicy::default()).unwrap();

        assert_eq!(report.summary.standalone.as_deref(), Some("127.0.0.1:6396"));
        assert!(registry.standalone().is_some());

        let master = registry.ha_master().unwrap();
        assert_eq!(
            master.options().as_failover().unwrap().sentinel_addrs,
            vec!["s1:26379", " s2:26379"]
        );

        let replica = registry.ha_replica().unwrap();
        assert_eq!(replica.options().as_failover().unwrap().sentinel_addrs, vec![""]);
    }

    #[tokio::test]
    async fn test_probe_outcome_is_observable() {
        let registry = ConnectionRegistry::new();
        let mut report = registry
            .initialize(&standalone_settings(6398), &InitPolicy::default())
            .unwrap();

        let status = report
            .take_probe()
            .unwrap()
            .outcome_within(Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!status.healthy);
        assert!(report.take_probe().is_none());
    }
}
