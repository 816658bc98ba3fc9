//! Pool Check
//!
//! Loads the Redis settings from the environment, initializes the connection
//! registry the way a service would at startup, and reports what was built
//! and whether the standalone server answered.

use clap::Parser;
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::Environment;
use eyre::{Result, WrapErr};
use redis_pool::{ClientOptions, RedisHandle};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pool-check")]
#[command(about = "Initialize the configured Redis clients and report their status")]
struct Cli {
    /// Return right after initialization instead of waiting for the probe
    #[arg(long)]
    no_wait: bool,

    /// Seconds to wait for the probe. Defaults to the dial timeout plus one second.
    #[arg(long)]
    probe_timeout: Option<u64>,
}

fn describe(label: &str, handle: Option<RedisHandle>) {
    let Some(handle) = handle else {
        println!("{label:<10} not configured");
        return;
    };

    let state = handle.pool_state();
    match handle.options() {
        ClientOptions::Standalone(options) => println!(
            "{label:<10} {} db={} pool={} min_idle={} dial_timeout={:?} open={} idle={}",
            options.addr,
            options.db,
            options.pool_size,
            options.min_idle_conns,
            options.dial_timeout,
            state.connections,
            state.idle_connections
        ),
        ClientOptions::Failover(options) => println!(
            "{label:<10} {} sentinels={} db={} pool={} min_idle={} dial_timeout={:?} open={} idle={}",
            options.master_name,
            options.sentinel_addrs.join(","),
            options.db,
            options.pool_size,
            options.min_idle_conns,
            options.dial_timeout,
            state.connections,
            state.idle_connections
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();

    let mut report =
        redis_pool::bootstrap_from_env().wrap_err("Failed to initialize Redis clients")?;

    describe("standalone", redis_pool::standalone_client());
    describe("master", redis_pool::ha_master());
    describe("replica", redis_pool::ha_replica());

    let Some(probe) = report.take_probe() else {
        info!("No standalone client configured, nothing to probe");
        return Ok(());
    };

    if cli.no_wait {
        info!("Not waiting for the probe");
        return Ok(());
    }

    let dial_timeout = redis_pool::standalone_client()
        .map(|handle| handle.options().dial_timeout())
        .unwrap_or(redis_pool::options::DEFAULT_DIAL_TIMEOUT);
    let wait = cli
        .probe_timeout
        .map(Duration::from_secs)
        .unwrap_or(dial_timeout + Duration::from_secs(1));

    let status = probe
        .outcome_within(wait)
        .await
        .wrap_err("Liveness probe did not complete")?;

    if status.healthy {
        println!("probe      ok ({} ms)", status.response_time_ms);
        Ok(())
    } else {
        let message = status.message.unwrap_or_default();
        warn!(%message, "Standalone Redis unreachable");
        Err(eyre::eyre!("probe failed: {}", message))
    }
}
