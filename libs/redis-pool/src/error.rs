/// Error type for building and probing Redis clients
#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    /// Client construction or command failure reported by the redis crate
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// No connection could be checked out of the pool in time
    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    /// The probe task ended without reporting a result
    #[error("Liveness probe ended without a result")]
    ProbeCancelled,

    #[error("Configuration error: {0}")]
    Config(#[from] core_config::ConfigError),
}

/// Result type alias for redis_pool operations
pub type RedisPoolResult<T> = Result<T, RedisPoolError>;
