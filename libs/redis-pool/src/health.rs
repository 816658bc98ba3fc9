use core_config::ProbePolicy;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::connector::RedisHandle;
use crate::error::{RedisPoolError, RedisPoolResult};

/// Check a Redis connection with `PING`
///
/// # Returns
/// * `Ok(())` if Redis answered `PONG`
/// * `Err(RedisPoolError)` otherwise
pub fn check_health(conn: &mut redis::Connection) -> RedisPoolResult<()> {
    debug!("Running Redis health check");

    let response: String = redis::cmd("PING").query(conn).map_err(|e| {
        RedisPoolError::HealthCheckFailed(format!("Redis health check failed: {}", e))
    })?;

    if response != "PONG" {
        return Err(RedisPoolError::HealthCheckFailed(format!(
            "Redis PING returned unexpected response: {}",
            response
        )));
    }

    debug!("Redis health check passed");
    Ok(())
}

/// Outcome of a liveness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,

    /// Error message if unhealthy
    pub message: Option<String>,

    pub response_time_ms: u64,
}

impl HealthStatus {
    pub fn healthy(response_time_ms: u64) -> Self {
        Self {
            healthy: true,
            message: None,
            response_time_ms,
        }
    }

    pub fn unhealthy(message: String, response_time_ms: u64) -> Self {
        Self {
            healthy: false,
            message: Some(message),
            response_time_ms,
        }
    }
}

/// Ping a handle and time it. Blocks for at most the handle's dial timeout
/// plus the round trip.
pub fn check_health_detailed(handle: &RedisHandle) -> HealthStatus {
    let start = Instant::now();
    let result = handle.ping();
    let elapsed = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HealthStatus::healthy(elapsed),
        Err(e) => HealthStatus::unhealthy(e.to_string(), elapsed),
    }
}

/// Receiving end of a dispatched liveness probe.
///
/// Dropping it does not cancel the probe.
#[derive(Debug)]
pub struct ProbeHandle {
    rx: oneshot::Receiver<HealthStatus>,
}

impl ProbeHandle {
    /// Wait for the probe to finish
    pub async fn outcome(self) -> RedisPoolResult<HealthStatus> {
        self.rx.await.map_err(|_| RedisPoolError::ProbeCancelled)
    }

    /// Wait for the probe to finish, giving up after `timeout`
    pub async fn outcome_within(self, timeout: Duration) -> RedisPoolResult<HealthStatus> {
        match tokio::time::timeout(timeout, self.outcome()).await {
            Ok(result) => result,
            Err(_) => Err(RedisPoolError::HealthCheckFailed(format!(
                "no probe result within {:?}",
                timeout
            ))),
        }
    }

    /// Blocking variant of [`ProbeHandle::outcome`]; must not be called from async code
    pub fn blocking_outcome(self) -> RedisPoolResult<HealthStatus> {
        self.rx
            .blocking_recv()
            .map_err(|_| RedisPoolError::ProbeCancelled)
    }
}

/// Dispatch a fire-and-forget `PING` against `handle`.
///
/// Runs on Tokio's blocking pool when called inside a runtime, otherwise on a
/// dedicated thread; the caller never waits. Success is logged at info and
/// failure at error. With [`ProbePolicy::Abort`] a failure exits the process.
pub fn spawn_probe(handle: RedisHandle, policy: ProbePolicy) -> ProbeHandle {
    let (tx, rx) = oneshot::channel();

    let probe = move || {
        let target = handle.role();
        let status = check_health_detailed(&handle);

        if status.healthy {
            info!(
                role = %target,
                response_time_ms = status.response_time_ms,
                "Redis connection succeeded"
            );
        } else {
            error!(
                role = %target,
                options = ?handle.options(),
                error = status.message.as_deref().unwrap_or("unknown"),
                "Redis connection failed"
            );
            if policy == ProbePolicy::Abort {
                error!("Redis probe failure is fatal, exiting");
                std::process::exit(1);
            }
        }

        let _ = tx.send(status);
    };

    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn_blocking(probe);
        }
        Err(_) => {
            if let Err(e) = std::thread::Builder::new()
                .name("redis-probe".to_string())
                .spawn(probe)
            {
                warn!(error = %e, "Could not start Redis probe thread");
            }
        }
    }

    ProbeHandle { rx }
}
