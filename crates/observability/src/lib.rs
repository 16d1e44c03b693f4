//! Tracing/logging setup shared by the binaries.

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize process-wide logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat, default_filter: &str) {
    crate::tracing::init(format, default_filter);
}
