//! Interactive stop map rendering.
//!
//! Produces a single self-contained Leaflet page: a CartoDB Positron base
//! layer, every stop as a small canvas-drawn dot, and an optional layer of
//! ACE violation hotspots.

pub mod bounds;
pub mod render;

pub use bounds::Bounds;
pub use render::{MapOptions, render_map, write_map};
