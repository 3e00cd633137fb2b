//! Wallcast Wall Model
//!
//! Defines the core data contracts of the video wall:
//! - **Layout:** declarative frame grid, strict validation, collision-free
//!   occupancy map
//! - **Streams:** per-source media topology as reported by the prober
//!
//! Both are built exactly once per run and treated as immutable inputs by
//! every downstream component.

pub mod layout;
pub mod stream;

pub use layout::*;
pub use stream::*;
