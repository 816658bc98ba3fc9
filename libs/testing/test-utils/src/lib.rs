//! Shared test utilities
//!
//! - `TestRedis`: Redis container with automatic cleanup (feature: "redis")
//! - `TestKeys`: deterministic, per-test key namespaces (always available)
//!
//! # Redis Testing
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { workspace = true, features = ["redis"] }
//! ```
//!
//! ```rust,ignore
//! use test_utils::TestRedis;
//!
//! #[tokio::test]
//! async fn my_redis_test() {
//!     let redis = TestRedis::new().await;
//!     let settings = redis.settings();
//!     // build clients from `settings`
//! }
//! ```

#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "redis")]
pub use redis::TestRedis;

/// Deterministic key names so concurrent tests sharing a server do not collide
pub struct TestKeys {
    seed: u64,
}

impl TestKeys {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the test name
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestKeys;
    ///
    /// let keys = TestKeys::from_test_name("test_set_get");
    /// let key = keys.key("session", "main");
    /// assert!(key.starts_with("test:session:"));
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// `test:<prefix>:<seed>:<suffix>`
    pub fn key(&self, prefix: &str, suffix: &str) -> String {
        format!("test:{}:{}:{}", prefix, self.seed, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_deterministic() {
        let a = TestKeys::from_test_name("my_test");
        let b = TestKeys::from_test_name("my_test");
        assert_eq!(a.key("session", "x"), b.key("session", "x"));
    }

    #[test]
    fn test_keys_differ_per_test() {
        let a = TestKeys::from_test_name("test1");
        let b = TestKeys::from_test_name("test2");
        assert_ne!(a.key("session", "x"), b.key("session", "x"));
    }
}
