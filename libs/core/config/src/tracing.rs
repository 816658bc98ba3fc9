use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre for binaries.
///
/// Reports carry the error location but not the environment section.
/// Calling it again is a no-op.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Filter used when `RUST_LOG` is not set
pub fn default_directives(environment: &Environment) -> &'static str {
    if environment.is_production() {
        "warn,redis_pool=info"
    } else {
        "debug"
    }
}

/// Initialize the global subscriber.
///
/// - **Production** (`APP_ENV=production`): flattened JSON lines without
///   event targets.
/// - **Development**: pretty multi-line output that includes the event
///   target, without file and line.
///
/// Both capture span traces for error reports. `RUST_LOG` replaces
/// [`default_directives`]. Only the first call installs a subscriber.
pub fn init_tracing(environment: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(environment)));

    let installed = if environment.is_production() {
        let json = tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .flatten_event(true);
        tracing_subscriber::registry()
            .with(json)
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        let pretty = tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        tracing_subscriber::registry()
            .with(pretty)
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    if installed.is_ok() {
        info!(?environment, "Tracing initialized");
    } else {
        debug!("Subscriber already installed");
    }
}
