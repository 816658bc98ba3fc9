//! End-to-end initialization scenarios against unreachable targets.
//!
//! Client construction never touches the network, so these run without a
//! Redis server; the probe is expected to report either outcome.

use core_config::{InitPolicy, RedisSettings, SentinelNodeSettings, TimeoutSource};
use redis_pool::{ConnectionRegistry, Role, split_addresses};
use std::time::Duration;

#[tokio::test]
async fn standalone_with_zeroed_bounds_uses_defaults() {
    let settings = RedisSettings {
        enable: true,
        host: "localhost".to_string(),
        port: 6379,
        db: 0,
        max_idle: 0,
        max_active: 0,
        timeout: 0,
        ..RedisSettings::default()
    };

    let registry = ConnectionRegistry::new();
    let mut report = registry
        .initialize(&settings, &InitPolicy::default())
        .expect("initialization must not fail on an unreachable server");

    let handle = registry.standalone().expect("standalone handle");
    assert_eq!(handle.role(), Role::Standalone);

    let options = handle.options().as_standalone().unwrap();
    assert_eq!(options.addr, "localhost:6379");
    assert_eq!(options.db, 0);
    assert_eq!(options.pool_size, 5);
    assert_eq!(options.min_idle_conns, 2);
    assert_eq!(options.dial_timeout, Duration::from_secs(5));

    // Healthy or not, the probe reports back instead of raising
    let probe = report.take_probe().expect("probe dispatched");
    let status = probe
        .outcome_within(Duration::from_secs(15))
        .await
        .expect("probe result");
    assert_eq!(status.healthy, status.message.is_none());
}

#[test]
fn standalone_min_idle_variant_default() {
    let settings = RedisSettings::standalone("localhost", 6379);
    let policy = InitPolicy::default().with_standalone_min_idle_default(5);

    let registry = ConnectionRegistry::new();
    registry.initialize(&settings, &policy).unwrap();

    let handle = registry.standalone().unwrap();
    assert_eq!(handle.options().as_standalone().unwrap().min_idle_conns, 5);
}

#[test]
fn two_node_groups_become_master_and_replica() {
    let settings = RedisSettings::default()
        .with_sentinel(SentinelNodeSettings::new("m", "s1:26379,s2:26379"))
        .with_sentinel(SentinelNodeSettings::new("r", "s3:26379"));

    let registry = ConnectionRegistry::new();
    let report = registry.initialize(&settings, &InitPolicy::default()).unwrap();

    assert!(registry.standalone().is_none());
    assert!(!report.probe_dispatched());

    let master = registry.ha_master().expect("master handle");
    let master_options = master.options().as_failover().unwrap();
    assert_eq!(master_options.master_name, "m");
    assert_eq!(master_options.sentinel_addrs, vec!["s1:26379", "s2:26379"]);
    assert_eq!(master_options.pool_size, 5);
    assert_eq!(master_options.min_idle_conns, 5);

    let replica = registry.ha_replica().expect("replica handle");
    let replica_options = replica.options().as_failover().unwrap();
    assert_eq!(replica_options.master_name, "r");
    assert_eq!(replica_options.sentinel_addrs, vec!["s3:26379"]);
}

#[test]
fn node_groups_share_the_standalone_timeout_by_default() {
    let settings = RedisSettings {
        timeout: 8,
        ..RedisSettings::default()
    }
    .with_sentinel(SentinelNodeSettings {
        timeout: Some(3),
        ..SentinelNodeSettings::new("m", "s1:26379")
    });

    let shared = ConnectionRegistry::new();
    shared.initialize(&settings, &InitPolicy::default()).unwrap();
    assert_eq!(
        shared.ha_master().unwrap().options().dial_timeout(),
        Duration::from_secs(8)
    );

    let per_group = ConnectionRegistry::new();
    per_group
        .initialize(
            &settings,
            &InitPolicy::default().with_sentinel_timeout(TimeoutSource::PerGroup),
        )
        .unwrap();
    assert_eq!(
        per_group.ha_master().unwrap().options().dial_timeout(),
        Duration::from_secs(3)
    );
}

#[test]
fn only_the_last_non_primary_group_is_the_replica() {
    for group_count in 2..6 {
        let settings = (0..group_count).fold(RedisSettings::default(), |settings, i| {
            settings.with_sentinel(SentinelNodeSettings::new(
                format!("group-{}", i),
                format!("sentinel-{}:26379", i),
            ))
        });

        let registry = ConnectionRegistry::new();
        registry.initialize(&settings, &InitPolicy::default()).unwrap();

        let master = registry.ha_master().unwrap();
        assert_eq!(master.options().as_failover().unwrap().master_name, "group-0");

        let replica = registry.ha_replica().unwrap();
        assert_eq!(
            replica.options().as_failover().unwrap().master_name,
            format!("group-{}", group_count - 1)
        );
    }
}

#[test]
fn defaults_are_never_zero() {
    let bounds = [0u32, 3, 10];
    let timeouts = [0u64, 30];

    for &max_idle in &bounds {
        for &max_active in &bounds {
            for &timeout in &timeouts {
                let settings = RedisSettings {
                    max_idle,
                    max_active,
                    timeout,
                    ..RedisSettings::standalone("127.0.0.1", 6399)
                }
                .with_sentinel(SentinelNodeSettings {
                    pool_size: max_idle,
                    min_idle_conns: max_active,
                    ..SentinelNodeSettings::new("m", "127.0.0.1:26399")
                });

                let registry = ConnectionRegistry::new();
                registry.initialize(&settings, &InitPolicy::default()).unwrap();

                let standalone = registry.standalone().unwrap();
                let options = standalone.options().as_standalone().unwrap();
                assert!(options.pool_size > 0);
                assert!(options.min_idle_conns > 0);
                assert!(options.min_idle_conns <= options.pool_size);
                assert!(options.dial_timeout > Duration::ZERO);

                let master = registry.ha_master().unwrap();
                let options = master.options().as_failover().unwrap();
                assert!(options.pool_size > 0);
                assert!(options.min_idle_conns > 0);
                assert!(options.dial_timeout > Duration::ZERO);
            }
        }
    }
}

#[test]
fn comma_joined_addresses_split_in_order() {
    assert_eq!(split_addresses("a:1,b:2,c:3"), vec!["a:1", "b:2", "c:3"]);
}
