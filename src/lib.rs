//! chunked-area: gap-aware area chart rendering.
//!
//! Partitions an ordered point sequence into defined and gap runs,
//! subdivides the defined runs into named chunks, and renders one
//! continuous area outline per chunk that clip rectangles mask down to
//! its segments. Re-rendering with new data animates the boundaries
//! smoothly instead of jumping.
//!
//! # Example
//!
//! ```
//! use chunked_area::{AreaChart, RenderMode, Surface, SvgScene};
//!
//! let chart = AreaChart::new().defined(|d: &(f64, f64)| !d.1.is_nan());
//! let data = vec![(0.0, 1.0), (1.0, 2.0), (2.0, f64::NAN), (3.0, 1.0)];
//!
//! let mut scene = SvgScene::new();
//! let root = scene.root();
//! let group = scene.append(root, "g");
//! chart.render(&mut scene, group, &data, RenderMode::Immediate)?;
//! # Ok::<(), chunked_area::RenderError>(())
//! ```

#![forbid(unsafe_code)]

mod config;
mod geometry;
mod path;
mod render;
mod segment;
mod shape;
mod style;

pub mod error;
pub mod scene;

// Re-export kurbo so downstream users get the same version used by
// the outline and rectangle geometry.
pub use kurbo;

pub use config::{
    AreaChart, ChunkDefinition, Coord, Label, Predicate, PropertySet, Value, AREA_LABEL,
    GAP_LABEL,
};
pub use error::RenderError;
pub use render::{
    chunk_class, clip_class, RenderMode, DEBUG_CLASS, DEFINED_CLASS, UNDEFINED_CLASS,
};
pub use scene::{Change, Ease, NodeId, Surface, SvgScene, TransitionSpec};
pub use shape::{area_outline, flattened_outline, AreaPoint, Curve};
pub use style::EvaluatedChunk;
