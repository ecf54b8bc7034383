//! Geometry engine for Carta.
//!
//! This crate provides the two geometric halves of the runtime:
//!
//! - **Extent**: the rectangular geographic viewport bound to a map model,
//!   with pixel/line ↔ projection coordinate conversion, resolution and
//!   map-scale handling, and pan/zoom operations.
//! - **Projection**: a family of coordinate-transform strategies selected by
//!   a spatial-reference identifier (geographic pass-through, Lambert
//!   Conformal Conic, Polar Stereographic, corner-interpolated scene space,
//!   raw pixel space).
//!
//! Screen coordinates have their origin at the viewport's top-left with y
//! increasing downward; projection coordinates have y increasing upward.
//!
//! # Example
//!
//! ```
//! use carta_geo::{Bounds, Extent, Projection};
//!
//! let proj = Projection::for_srs("EPSG:4326").unwrap();
//! let mut extent = Extent::new(proj);
//! extent.init(Bounds::new(-180.0, -90.0, 180.0, 90.0), [360.0, 180.0], None);
//!
//! let xy = extent.to_projection([180.0, 90.0]);
//! assert_eq!(xy, [0.0, 0.0]);
//! ```

pub mod bounds;
pub mod extent;
pub mod projection;

pub use bounds::Bounds;
pub use extent::Extent;
pub use projection::{
    LambertConformalConic, LccParams, PolarStereographic, Projection, ProjectionError,
    SceneCorners, Units,
};
