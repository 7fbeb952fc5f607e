//! Logging facilities for Lattice Grid.
//!
//! Lattice Grid uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt::init();
//! ```
//!
//! Every log line carries one of the [`targets`] so that subsystems can be
//! filtered independently, e.g. `RUST_LOG=lattice_grid::source=debug`.

/// Target names for log filtering.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "lattice_grid_core::signal";
    /// Data source materialization and eviction.
    pub const SOURCE: &str = "lattice_grid::source";
    /// Column configuration and effective state.
    pub const COLUMN: &str = "lattice_grid::column";
    /// Binding ledger.
    pub const BINDING: &str = "lattice_grid::binding";
    /// Widget pool.
    pub const FACTORY: &str = "lattice_grid::factory";
    /// Grid configuration loading.
    pub const CONFIG: &str = "lattice_grid::config";
    /// Performance spans.
    pub const PERF: &str = "lattice_grid::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to time operations such as window materialization.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "lattice_grid::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let _span = PerfSpan::new("test_operation");
        tracing::info!(target: targets::PERF, "inside span");
    }
}
