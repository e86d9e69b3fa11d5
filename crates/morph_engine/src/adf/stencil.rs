//! Refinement stencil of a distance octree cell.
//!
//! A cell's samples live on a 3×3×3 lattice: per axis 0 = min, 1 = center,
//! 2 = max. The 8 lattice points with no center coordinate are the cell
//! corners; the other 19 are the stencil:
//!
//! ```text
//!   centers per axis   kind          count
//!   1                  edge midpoint   12
//!   2                  face center      6
//!   3                  cell center      1
//! ```
//!
//! Lattice slots are numbered `x + 3y + 9z`.

use crate::constants::CORNER_OFFSETS;

/// Number of stencil points per cell.
pub const STENCIL_LEN: usize = 19;

/// Lattice coordinates of the stencil points, z-major then y then x.
pub const STENCIL_POINTS: [[u8; 3]; STENCIL_LEN] = build_stencil_points();

/// Lattice slot of corner `j` of child `i`.
pub const CHILD_CORNER_SLOTS: [[usize; 8]; 8] = build_child_corner_slots();

/// Slot of a lattice coordinate in a 27-entry sample array.
#[inline(always)]
pub const fn lattice_slot(lattice: [u8; 3]) -> usize {
  lattice[0] as usize + 3 * lattice[1] as usize + 9 * lattice[2] as usize
}

/// Lattice coordinate of corner `i`.
#[inline(always)]
pub const fn corner_lattice(i: usize) -> [u8; 3] {
  let [x, y, z] = CORNER_OFFSETS[i];
  [x * 2, y * 2, z * 2]
}

const fn build_stencil_points() -> [[u8; 3]; STENCIL_LEN] {
  let mut points = [[0u8; 3]; STENCIL_LEN];
  let mut n = 0;
  let mut z = 0;
  while z < 3 {
    let mut y = 0;
    while y < 3 {
      let mut x = 0;
      while x < 3 {
        if x == 1 || y == 1 || z == 1 {
          points[n] = [x, y, z];
          n += 1;
        }
        x += 1;
      }
      y += 1;
    }
    z += 1;
  }
  points
}

const fn build_child_corner_slots() -> [[usize; 8]; 8] {
  let mut slots = [[0usize; 8]; 8];
  let mut child = 0;
  while child < 8 {
    let c = CORNER_OFFSETS[child];
    let mut corner = 0;
    while corner < 8 {
      let k = CORNER_OFFSETS[corner];
      slots[child][corner] = lattice_slot([c[0] + k[0], c[1] + k[1], c[2] + k[2]]);
      corner += 1;
    }
    child += 1;
  }
  slots
}

/// Value trilinear interpolation of the corner samples predicts at a lattice
/// point: the mean of the corners it lies between.
pub fn predict(corners: &[f64; 8], lattice: [u8; 3]) -> f64 {
  let mut sum = 0.0;
  let mut count = 0u32;
  for (i, &d) in corners.iter().enumerate() {
    let offsets = CORNER_OFFSETS[i];
    let between = (0..3).all(|axis| lattice[axis] == 1 || lattice[axis] == offsets[axis] * 2);
    if between {
      sum += d;
      count += 1;
    }
  }
  sum / count as f64
}

/// Full 27-slot lattice from a cell's corners and stencil samples.
pub fn assemble(corners: &[f64; 8], stencil: &[f64; STENCIL_LEN]) -> [f64; 27] {
  let mut lattice = [0.0; 27];
  for (i, &d) in corners.iter().enumerate() {
    lattice[lattice_slot(corner_lattice(i))] = d;
  }
  for (point, &d) in STENCIL_POINTS.iter().zip(stencil) {
    lattice[lattice_slot(*point)] = d;
  }
  lattice
}

/// Corner samples of child `child`, taken from its parent's lattice.
#[inline]
pub fn child_corners(lattice: &[f64; 27], child: usize) -> [f64; 8] {
  std::array::from_fn(|j| lattice[CHILD_CORNER_SLOTS[child][j]])
}

/// Trilinear interpolation of corner samples at `t` in [0, 1]³.
pub fn trilinear(corners: &[f64; 8], t: glam::DVec3) -> f64 {
  let x00 = corners[0] + (corners[1] - corners[0]) * t.x;
  let x10 = corners[2] + (corners[3] - corners[2]) * t.x;
  let x01 = corners[4] + (corners[5] - corners[4]) * t.x;
  let x11 = corners[6] + (corners[7] - corners[6]) * t.x;
  let y0 = x00 + (x10 - x00) * t.y;
  let y1 = x01 + (x11 - x01) * t.y;
  y0 + (y1 - y0) * t.z
}

#[cfg(test)]
#[path = "stencil_test.rs"]
mod stencil_test;
