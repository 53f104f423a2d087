//! Logging bootstrap for GDI consumers.
//!
//! The analytics crates only emit `tracing` events; installing a subscriber is
//! the job of whichever binary embeds them, through [`init_logging`] or
//! [`init_from_config`].
//!
//! # Noise Filtering
//!
//! Modules listed in [`NOISY_MODULES`] plus any configured
//! `excluded_targets` are set to `warn` while business logs stay at the
//! requested level. `RUST_LOG` overrides everything.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

/// Default noisy modules that should be filtered to warn level.
pub const NOISY_MODULES: &[&str] = &["arc_swap", "lru"];

/// Build the filter directive string for a base level plus exclusions.
pub fn build_directives(log_level: &str, excluded_targets: &[String]) -> String {
    let mut directives = String::from(log_level);

    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }

    for target in excluded_targets {
        directives.push_str(&format!(",{}=warn", target));
    }

    directives
}

fn build_filter(log_level: &str, excluded_targets: &[String]) -> EnvFilter {
    // Environment variable wins when present
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(build_directives(log_level, excluded_targets)))
}

/// Initialize logging with the given level and format.
///
/// * `log_level` - Base log level (trace, debug, info, warn, error)
/// * `log_format` - "json" for structured JSON, anything else for human-readable
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging(log_level: &str, log_format: &str) {
    init_logging_with_exclusions(log_level, log_format, &[]);
}

/// Initialize logging with custom excluded targets.
pub fn init_logging_with_exclusions(
    log_level: &str,
    log_format: &str,
    excluded_targets: &[String],
) {
    let filter = build_filter(log_level, excluded_targets);
    let subscriber = tracing_subscriber::registry().with(filter);

    if log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        let _ = subscriber.with(fmt_layer).try_init();
    }

    tracing::info!(
        log_level = %log_level,
        log_format = %log_format,
        noise_filtered = NOISY_MODULES.len() + excluded_targets.len(),
        "Logging initialized"
    );
}

/// Initialize logging from an [`ObservabilityConfig`].
pub fn init_from_config(config: &ObservabilityConfig) {
    init_logging_with_exclusions(
        &config.log_level,
        &config.log_format,
        &config.excluded_targets,
    );
}
