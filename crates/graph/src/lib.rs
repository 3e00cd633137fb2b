//! Wallcast Graph
//!
//! Turns probed source geometry and audio topology into the per-source
//! compositing graph: scaled and bordered video, a loudness meter panel
//! with one cell per physical audio channel, and the final canvas. Graphs
//! are built as typed segment records and rendered to the encoder's
//! textual form only at the invocation boundary.

pub mod composite;
pub mod invocation;
pub mod meter;
pub mod segment;

pub use composite::*;
pub use invocation::*;
pub use meter::*;
pub use segment::*;
