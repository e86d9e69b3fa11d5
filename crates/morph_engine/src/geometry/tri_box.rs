//! Triangle / axis-aligned box overlap test.
//!
//! Separating axis test over 13 axes, after Akenine-Möller:
//!
//! ```text
//! 1. 9 axes  edge_i × box_axis_j   (i, j in 0..3)
//! 2. 3 axes  box face normals      (triangle AABB vs box)
//! 3. 1 axis  triangle normal       (plane vs box)
//! ```
//!
//! All comparisons are strict, so touching counts as overlapping.

use glam::DVec3;

use crate::octree::DAabb3;

/// True unless some axis separates the triangle from the box.
pub fn triangle_box_overlap(triangle: &[DVec3; 3], bounds: &DAabb3) -> bool {
  let center = bounds.center();
  let half = bounds.size() * 0.5;

  // Move the box to the origin
  let v0 = triangle[0] - center;
  let v1 = triangle[1] - center;
  let v2 = triangle[2] - center;

  let edges = [v1 - v0, v2 - v1, v0 - v2];

  // Pass 1: edge cross products
  for edge in edges {
    for axis in [DVec3::X, DVec3::Y, DVec3::Z] {
      let a = axis.cross(edge);
      let p0 = a.dot(v0);
      let p1 = a.dot(v1);
      let p2 = a.dot(v2);
      let radius = half.x * a.x.abs() + half.y * a.y.abs() + half.z * a.z.abs();
      let min = p0.min(p1).min(p2);
      let max = p0.max(p1).max(p2);
      if min > radius || max < -radius {
        return false;
      }
    }
  }

  // Pass 2: box face normals
  let tri_min = v0.min(v1).min(v2);
  let tri_max = v0.max(v1).max(v2);
  if tri_min.cmpgt(half).any() || tri_max.cmplt(-half).any() {
    return false;
  }

  // Pass 3: triangle plane
  let normal = edges[0].cross(edges[1]);
  plane_box_overlap(normal, v0, half)
}

/// Plane through `vertex` with `normal` against an origin-centered box.
fn plane_box_overlap(normal: DVec3, vertex: DVec3, half: DVec3) -> bool {
  let mut vmin = DVec3::ZERO;
  let mut vmax = DVec3::ZERO;
  for axis in 0..3 {
    if normal[axis] > 0.0 {
      vmin[axis] = -half[axis] - vertex[axis];
      vmax[axis] = half[axis] - vertex[axis];
    } else {
      vmin[axis] = half[axis] - vertex[axis];
      vmax[axis] = -half[axis] - vertex[axis];
    }
  }
  if normal.dot(vmin) > 0.0 {
    return false;
  }
  normal.dot(vmax) >= 0.0
}

#[cfg(test)]
#[path = "tri_box_test.rs"]
mod tri_box_test;
