//! Structured logging setup.
//!
//! Events go to stderr so that command output on stdout stays parseable.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting the configured log level unless `RUST_LOG` is set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// An API description has been compiled into routes.
    pub const SPEC_COMPILED: &str = "spec_compiled";

    /// Two operations normalized to the same route name.
    pub const ROUTE_DUPLICATE: &str = "route_duplicate";

    /// A request descriptor has been built.
    pub const REQUEST_BUILT: &str = "request_built";

    /// Supplied parameters failed coercion.
    pub const COERCION_FAILURE: &str = "coercion_failure";

    /// An interceptor set the response before the chain finished.
    pub const PIPELINE_SHORT_CIRCUIT: &str = "pipeline_short_circuit";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_spec_compiled {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::SPEC_COMPILED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_route_duplicate {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::ROUTE_DUPLICATE,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_request_built {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::REQUEST_BUILT,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_coercion_failure {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::COERCION_FAILURE,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_pipeline_short_circuit {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::PIPELINE_SHORT_CIRCUIT,
            $($field)*
        )
    };
}
