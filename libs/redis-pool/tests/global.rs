//! Process-wide registry. Kept in its own test binary so no other test
//! touches the global state.

use core_config::{InitPolicy, RedisSettings};
use redis_pool::RedisPoolError;

#[test]
fn bootstrap_initializes_once() {
    assert!(redis_pool::standalone_client().is_none());
    assert!(redis_pool::ha_master().is_none());
    assert!(redis_pool::ha_replica().is_none());

    // Bad environment is reported and leaves the registry uninitialized
    temp_env::with_vars(
        [("REDIS_ENABLE", Some("true")), ("REDIS_PORT", Some("notaport"))],
        || {
            let err = redis_pool::bootstrap_from_env().unwrap_err();
            assert!(matches!(err, RedisPoolError::Config(_)));
        },
    );
    assert!(redis_pool::standalone_client().is_none());

    let first = redis_pool::bootstrap(&RedisSettings::default(), &InitPolicy::default()).unwrap();
    assert!(first.summary.is_empty());
    assert!(!first.probe_dispatched());

    // Later calls return the first summary and build nothing
    let enabled = RedisSettings::standalone("127.0.0.1", 6399);
    let second = redis_pool::bootstrap(&enabled, &InitPolicy::default()).unwrap();
    assert_eq!(second.summary, first.summary);
    assert!(!second.probe_dispatched());

    assert!(redis_pool::standalone_client().is_none());
    assert!(redis_pool::ha_master().is_none());
    assert!(redis_pool::ha_replica().is_none());

    // The explicit registry API still allows replacing the handles
    redis_pool::registry()
        .initialize(&enabled, &InitPolicy::default())
        .unwrap();
    let handle = redis_pool::standalone_client().unwrap();
    assert_eq!(
        handle.options().as_standalone().unwrap().addr,
        "127.0.0.1:6399"
    );
}
