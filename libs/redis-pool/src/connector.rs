use r2d2::{HandleError, Pool, PooledConnection};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::RedisPoolResult;
use crate::health;
use crate::manager::{SentinelManager, StandaloneManager};
use crate::options::{FailoverOptions, StandaloneOptions};

/// Which slot of the registry a handle occupies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Standalone,
    Master,
    Replica,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Standalone => f.write_str("standalone"),
            Role::Master => f.write_str("master"),
            Role::Replica => f.write_str("replica"),
        }
    }
}

/// The options a handle was constructed from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientOptions {
    Standalone(StandaloneOptions),
    Failover(FailoverOptions),
}

impl ClientOptions {
    pub fn dial_timeout(&self) -> Duration {
        match self {
            ClientOptions::Standalone(options) => options.dial_timeout,
            ClientOptions::Failover(options) => options.dial_timeout,
        }
    }

    pub fn as_standalone(&self) -> Option<&StandaloneOptions> {
        match self {
            ClientOptions::Standalone(options) => Some(options),
            ClientOptions::Failover(_) => None,
        }
    }

    pub fn as_failover(&self) -> Option<&FailoverOptions> {
        match self {
            ClientOptions::Failover(options) => Some(options),
            ClientOptions::Standalone(_) => None,
        }
    }
}

enum ClientPool {
    Standalone(Pool<StandaloneManager>),
    Failover(Pool<SentinelManager>),
}

struct HandleInner {
    role: Role,
    options: ClientOptions,
    pool: ClientPool,
}

/// Shared handle to a pooled Redis client.
///
/// Cloning is cheap; all clones share one pool. Connections are blocking
/// [`redis::Connection`]s checked out of an r2d2 pool.
#[derive(Clone)]
pub struct RedisHandle {
    inner: Arc<HandleInner>,
}

impl RedisHandle {
    pub fn role(&self) -> Role {
        self.inner.role
    }

    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Check out a connection, waiting at most the dial timeout
    pub fn get(&self) -> RedisPoolResult<PooledRedisConnection> {
        let conn = match &self.inner.pool {
            ClientPool::Standalone(pool) => PooledRedisConnection::Standalone(pool.get()?),
            ClientPool::Failover(pool) => PooledRedisConnection::Failover(pool.get()?),
        };
        Ok(conn)
    }

    /// Send a `PING` over a pooled connection
    pub fn ping(&self) -> RedisPoolResult<()> {
        let mut conn = self.get()?;
        health::check_health(&mut conn)
    }

    /// Connections currently opened by the pool and how many of them are idle
    pub fn pool_state(&self) -> r2d2::State {
        match &self.inner.pool {
            ClientPool::Standalone(pool) => pool.state(),
            ClientPool::Failover(pool) => pool.state(),
        }
    }

    /// Whether both handles share the same underlying client
    pub fn same_client(&self, other: &RedisHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for RedisHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisHandle")
            .field("role", &self.inner.role)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

/// A connection checked out of a handle's pool; returned to the pool on drop
pub enum PooledRedisConnection {
    Standalone(PooledConnection<StandaloneManager>),
    Failover(PooledConnection<SentinelManager>),
}

impl Deref for PooledRedisConnection {
    type Target = redis::Connection;

    fn deref(&self) -> &Self::Target {
        match self {
            PooledRedisConnection::Standalone(conn) => conn,
            PooledRedisConnection::Failover(conn) => conn,
        }
    }
}

impl DerefMut for PooledRedisConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            PooledRedisConnection::Standalone(conn) => conn,
            PooledRedisConnection::Failover(conn) => conn,
        }
    }
}

/// Reports connection errors raised while the pool replenishes idle connections
#[derive(Debug)]
struct TracingErrorHandler {
    target: String,
}

impl HandleError<redis::RedisError> for TracingErrorHandler {
    fn handle_error(&self, error: redis::RedisError) {
        warn!(target_addr = %self.target, error = %error, "Redis pool connection error");
    }
}

fn pool_builder<M: r2d2::ManageConnection<Error = redis::RedisError>>(
    pool_size: u32,
    min_idle_conns: u32,
    dial_timeout: Duration,
    target: String,
) -> r2d2::Builder<M> {
    Pool::builder()
        .max_size(pool_size)
        .min_idle(Some(min_idle_conns))
        .connection_timeout(dial_timeout)
        .error_handler(Box::new(TracingErrorHandler { target }))
}

/// Build a standalone client handle.
///
/// No connection is made here; the pool opens its minimum-idle connections
/// in the background and the first checkout waits at most the dial timeout.
pub fn connect_standalone(options: StandaloneOptions, role: Role) -> RedisPoolResult<RedisHandle> {
    info!(
        addr = %options.addr,
        db = options.db,
        pool_size = options.pool_size,
        min_idle = options.min_idle_conns,
        "Building standalone Redis client"
    );

    let manager = StandaloneManager::new(&options)?;

    let pool = pool_builder(
        options.pool_size,
        options.min_idle_conns,
        options.dial_timeout,
        options.addr.clone(),
    )
    .build_unchecked(manager);

    Ok(RedisHandle {
        inner: Arc::new(HandleInner {
            role,
            options: ClientOptions::Standalone(options),
            pool: ClientPool::Standalone(pool),
        }),
    })
}

/// Build a sentinel-backed client handle that always targets the current
/// master of `options.master_name`.
///
/// Never fails: seeds that do not parse are skipped with a warning, and
/// unreachable sentinels surface as connection errors on checkout.
pub fn connect_failover(options: FailoverOptions, role: Role) -> RedisHandle {
    info!(
        master_name = %options.master_name,
        sentinels = ?options.sentinel_addrs,
        db = options.db,
        %role,
        "Building sentinel Redis client"
    );

    let manager = SentinelManager::new(&options);
    if manager.usable_sentinels() == 0 {
        warn!(master_name = %options.master_name, "No usable sentinel address");
    }

    let pool = pool_builder(
        options.pool_size,
        options.min_idle_conns,
        options.dial_timeout,
        options.master_name.clone(),
    )
    .build_unchecked(manager);

    RedisHandle {
        inner: Arc::new(HandleInner {
            role,
            options: ClientOptions::Failover(options),
            pool: ClientPool::Failover(pool),
        }),
    }
}
