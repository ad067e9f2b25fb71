//! Logging sink for the relaybot backend.
//!
//! Leveled, component-tagged console output with per-level coloring, an
//! optional per-day log file, and a tracing layer that ingests raw
//! transport traces from the wire library.

pub mod sink;
pub mod trace;

pub use sink::{LogConfig, LogLevel, LogSink};
pub use trace::TransportTraceLayer;
