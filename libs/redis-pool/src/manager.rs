//! r2d2 connection managers that bound every dial by the configured timeout.
//!
//! The managers the redis crate ships connect without a timeout, so a
//! blackholed host would hold a pool thread for the OS connect timeout.

use r2d2::ManageConnection;
use redis::{
    Client, Connection, ConnectionAddr, ConnectionInfo, ConnectionLike, ErrorKind, IntoConnectionInfo,
    RedisConnectionInfo, RedisError, RedisResult,
};
use std::time::Duration;
use tracing::{debug, warn};

use crate::options::{FailoverOptions, StandaloneOptions};

fn redis_connection_info(password: &str, db: i64) -> RedisConnectionInfo {
    let info = RedisConnectionInfo::default().set_db(db);
    if password.is_empty() {
        info
    } else {
        info.set_password(password)
    }
}

fn ping(conn: &mut Connection) -> RedisResult<()> {
    let pong: String = redis::cmd("PING").query(conn)?;
    if pong == "PONG" {
        Ok(())
    } else {
        Err((ErrorKind::UnexpectedReturnType, "ping request", pong).into())
    }
}

/// Opens connections to one fixed server
pub struct StandaloneManager {
    client: Client,
    dial_timeout: Duration,
}

impl StandaloneManager {
    pub fn new(options: &StandaloneOptions) -> RedisResult<Self> {
        let info = ConnectionAddr::Tcp(options.host.clone(), options.port)
            .into_connection_info()?
            .set_redis_settings(redis_connection_info(&options.password, options.db));

        Ok(Self {
            client: Client::open(info)?,
            dial_timeout: options.dial_timeout,
        })
    }
}

impl ManageConnection for StandaloneManager {
    type Connection = Connection;
    type Error = RedisError;

    fn connect(&self) -> Result<Connection, RedisError> {
        self.client.get_connection_with_timeout(self.dial_timeout)
    }

    fn is_valid(&self, conn: &mut Connection) -> Result<(), RedisError> {
        ping(conn)
    }

    fn has_broken(&self, conn: &mut Connection) -> bool {
        !conn.is_open()
    }
}

/// Asks the sentinels for the current master of a group on every connect,
/// then dials that master.
///
/// Seeds are parsed one by one. A seed that does not parse is logged and
/// skipped, so a bad entry never prevents the pool from being built.
pub struct SentinelManager {
    master_name: String,
    sentinels: Vec<ConnectionInfo>,
    node_info: RedisConnectionInfo,
    dial_timeout: Duration,
}

impl SentinelManager {
    pub fn new(options: &FailoverOptions) -> Self {
        let sentinels = options
            .sentinel_addrs
            .iter()
            .filter_map(|addr| match sentinel_url(addr).into_connection_info() {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!(
                        master_name = %options.master_name,
                        seed = %addr,
                        error = %e,
                        "Skipping unusable sentinel address"
                    );
                    None
                }
            })
            .collect();

        Self {
            master_name: options.master_name.clone(),
            sentinels,
            node_info: redis_connection_info(&options.password, options.db),
            dial_timeout: options.dial_timeout,
        }
    }

    /// Number of seeds that parsed
    pub fn usable_sentinels(&self) -> usize {
        self.sentinels.len()
    }

    fn query_sentinel(&self, sentinel: &ConnectionInfo) -> RedisResult<Option<(String, u16)>> {
        let mut conn = Client::open(sentinel.clone())?.get_connection_with_timeout(self.dial_timeout)?;
        conn.set_read_timeout(Some(self.dial_timeout))?;
        conn.set_write_timeout(Some(self.dial_timeout))?;

        redis::cmd("SENTINEL")
            .arg("get-master-addr-by-name")
            .arg(&self.master_name)
            .query(&mut conn)
    }

    /// First sentinel that knows the master wins
    fn master_addr(&self) -> RedisResult<ConnectionAddr> {
        if self.sentinels.is_empty() {
            return Err((
                ErrorKind::EmptySentinelList,
                "no usable sentinel address",
                self.master_name.clone(),
            )
                .into());
        }

        let mut last_error: Option<RedisError> = None;
        for sentinel in &self.sentinels {
            match self.query_sentinel(sentinel) {
                Ok(Some((host, port))) => {
                    debug!(master_name = %self.master_name, %host, port, "Sentinel resolved master");
                    return Ok(ConnectionAddr::Tcp(host, port));
                }
                Ok(None) => {
                    debug!(
                        master_name = %self.master_name,
                        sentinel = %sentinel.addr(),
                        "Sentinel does not know the master"
                    );
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            (
                ErrorKind::MasterNameNotFoundBySentinel,
                "master name not found by any sentinel",
                self.master_name.clone(),
            )
                .into()
        }))
    }
}

impl ManageConnection for SentinelManager {
    type Connection = Connection;
    type Error = RedisError;

    fn connect(&self) -> Result<Connection, RedisError> {
        let info = self
            .master_addr()?
            .into_connection_info()?
            .set_redis_settings(self.node_info.clone());
        Client::open(info)?.get_connection_with_timeout(self.dial_timeout)
    }

    fn is_valid(&self, conn: &mut Connection) -> Result<(), RedisError> {
        ping(conn)
    }

    fn has_broken(&self, conn: &mut Connection) -> bool {
        !conn.is_open()
    }
}

/// Turn a `host:port` seed into a URL the redis crate accepts
fn sentinel_url(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("redis://{}", addr)
    }
}
