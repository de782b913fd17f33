//! Logging utilities for hosts and add-ins
//!
//! Simple logging initialization that:
//! - Respects the RUST_LOG environment variable
//! - Falls back to a filter from configuration
//! - Gives each add-in its own default filter
//!
//! Several add-ins in one host may each try to initialise logging; only the
//! first call installs a subscriber and later calls are ignored.
//!
//! # Usage
//!
//! ## Host
//! ```rust,ignore
//! use addin_resolver::utils::init_logging;
//!
//! init_logging(None); // Uses RUST_LOG or defaults to "info"
//! ```
//!
//! ## Add-in
//! ```rust,ignore
//! use addin_resolver::utils::init_addin_logging;
//!
//! init_addin_logging("my_addin", None);
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ResolverConfig;
use crate::utils::env::env_opt;

/// RUST_LOG wins, then the configured filter, then `default`
fn build_filter(filter: Option<&str>, default: &str) -> EnvFilter {
    if env_opt("RUST_LOG").is_some() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(filter.unwrap_or(default))
}

fn ansi_enabled() -> bool {
    env_opt("NO_COLOR").is_none()
}

/// Initialize logging for the host process
///
/// # Arguments
/// * `filter` - Optional log filter from config (e.g., "info", "addin_resolver=debug").
///              Ignored when RUST_LOG is set. Defaults to "info".
pub fn init_logging(filter: Option<&str>) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(ansi_enabled()),
        )
        .with(build_filter(filter, "info"))
        .try_init();
}

/// Initialize logging for an add-in
///
/// Without RUST_LOG or a configured filter the add-in logs at info and the
/// resolver at debug: `"{addin_name}=info,addin_resolver=debug"`.
pub fn init_addin_logging(addin_name: &str, filter: Option<&str>) {
    let default_filter = format!("{}=info,addin_resolver=debug", addin_name);

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(ansi_enabled()),
        )
        .with(build_filter(filter, &default_filter))
        .try_init();
}

/// Initialize logging with JSON output (for log aggregation)
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(build_filter(filter, "info"))
        .try_init();
}

/// Initialize logging from ResolverConfig
pub fn init_logging_from_config(config: &ResolverConfig) {
    init_logging(config.log_filter.as_deref());
}
