//! Tracing utilities for query and transaction observability.
//!
//! Enable the `tracing` feature to emit spans and events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site. The calling crate must declare its own `tracing` feature.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// trellis_trace_query!(&sql, params.len());
/// ```
#[macro_export]
macro_rules! trellis_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, params = $param_count, "trellis.query");
    };
}

/// Emit an info-level tracing event for transaction lifecycle (begin, commit, rollback).
///
/// ```ignore
/// trellis_trace_tx!("begin", 0);
/// trellis_trace_tx!("release", depth);
/// ```
#[macro_export]
macro_rules! trellis_trace_tx {
    ($event:literal, $depth:expr) => {
        #[cfg(feature = "tracing")]
        tracing::info!(event = $event, depth = $depth, "trellis.transaction");
    };
}

/// Emit a warn-level tracing event with a formatted message.
#[macro_export]
macro_rules! trellis_warn {
    ($($arg:tt)+) => {
        #[cfg(feature = "tracing")]
        tracing::warn!($($arg)+);
    };
}
