//! Wallcast Supervisor
//!
//! Keeps one encoder process alive per source, forever, and extracts
//! loudness telemetry from its diagnostic stream:
//! - **Backend:** the encoder process seam (production ffmpeg, scripted
//!   test doubles)
//! - **Supervisor:** the unbounded restart state machine with its
//!   per-source journal
//! - **Telemetry:** the line classifier, cycle accumulator, and
//!   whole-file snapshot sink

pub mod backend;
pub mod journal;
pub mod snapshot;
pub mod supervisor;
pub mod telemetry;

pub use backend::*;
pub use journal::*;
pub use snapshot::*;
pub use supervisor::*;
pub use telemetry::TelemetryExtractor;
