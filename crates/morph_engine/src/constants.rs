//! Shared layout constants and build defaults.
//!
//! # Corner Layout
//!
//! Every cube in the crate (octree cells, distance samples, marching cubes
//! cells) numbers its corners with the binary ZYX convention: bit 0 selects
//! +X, bit 1 selects +Y, bit 2 selects +Z. Child cells use the same bits to
//! pick the half of the parent along each axis.
//!
//! ```text
//!       6──────7
//!      /│     /│        index = x | y << 1 | z << 2
//!     4─┼────5 │
//!     │ 2────┼─3        child i covers [min, center] on an axis when the
//!     │/     │/         bit is clear, [center, max] when it is set
//!     0──────1
//! ```

/// Octree depth used when no configuration is supplied.
///
/// Debug builds stay one level shallower; distance queries are far slower
/// without optimizations.
pub const DEFAULT_MAX_DEPTH: u8 = if cfg!(debug_assertions) { 5 } else { 6 };

/// Largest accepted octree depth (path coordinates pack 3 bits per level).
pub const MAX_SUPPORTED_DEPTH: u8 = 16;

/// Maximum deviation from trilinear interpolation tolerated in an ADF cell.
pub const DEFAULT_MIN_ERROR: f64 = 1e-5;

/// Face octree cells holding this many faces or fewer stop subdividing.
pub const DEFAULT_MIN_FACES_FOR_SUBDIVIDE: usize = 0;

/// Angular tolerance (degrees) when grouping coplanar triangles.
pub const DEFAULT_PLANE_ANGULAR_TOLERANCE: f64 = 1e-3;

/// Offset tolerance when grouping parallel planes.
pub const DEFAULT_PLANE_LINEAR_TOLERANCE: f64 = 1e-6;

/// Distance under which two extracted vertices are merged.
pub const DEFAULT_WELD_TOLERANCE: f64 = 1e-9;

/// Corner offsets in binary ZYX order.
pub const CORNER_OFFSETS: [[u8; 3]; 8] = [
  [0, 0, 0],
  [1, 0, 0],
  [0, 1, 0],
  [1, 1, 0],
  [0, 0, 1],
  [1, 0, 1],
  [0, 1, 1],
  [1, 1, 1],
];

/// Corner index for a binary offset.
#[inline(always)]
pub const fn corner_index(x: u8, y: u8, z: u8) -> usize {
  (x as usize) | (y as usize) << 1 | (z as usize) << 2
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
