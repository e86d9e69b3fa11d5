//! Test utilities shared by module tests.
//!
//! Provides closed fixture meshes and their exact signed distance functions.

use std::collections::HashMap;

use glam::DVec3;

use crate::adf::DistanceSampler;
use crate::octree::{DAabb3, PathCoord};
use crate::types::TriMesh;

// =============================================================================
// Fixture meshes
// =============================================================================

/// Unit cube [0, 1]³: 8 vertices (binary ZYX order), 12 outward-facing faces.
pub fn unit_cube() -> TriMesh {
  cube(DVec3::splat(0.5), 1.0)
}

/// Axis-aligned cube with outward winding.
pub fn cube(center: DVec3, side: f64) -> TriMesh {
  let half = side * 0.5;
  let vertices = (0..8)
    .map(|i| {
      let offset = DVec3::new(
        if i & 1 != 0 { half } else { -half },
        if i & 2 != 0 { half } else { -half },
        if i & 4 != 0 { half } else { -half },
      );
      center + offset
    })
    .collect();
  let faces = vec![
    [0, 4, 6],
    [0, 6, 2], // -X
    [1, 3, 7],
    [1, 7, 5], // +X
    [0, 1, 5],
    [0, 5, 4], // -Y
    [2, 6, 7],
    [2, 7, 3], // +Y
    [0, 2, 3],
    [0, 3, 1], // -Z
    [4, 5, 7],
    [4, 7, 6], // +Z
  ];
  TriMesh { vertices, faces }
}

/// Sphere approximation by subdividing an octahedron `subdivisions` times.
pub fn sphere(center: DVec3, radius: f64, subdivisions: u32) -> TriMesh {
  let mut vertices = vec![
    DVec3::X,
    DVec3::NEG_X,
    DVec3::Y,
    DVec3::NEG_Y,
    DVec3::Z,
    DVec3::NEG_Z,
  ];
  let mut faces: Vec<[u32; 3]> = vec![
    [0, 2, 4],
    [2, 1, 4],
    [1, 3, 4],
    [3, 0, 4],
    [2, 0, 5],
    [1, 2, 5],
    [3, 1, 5],
    [0, 3, 5],
  ];

  for _ in 0..subdivisions {
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut midpoint = |a: u32, b: u32, vertices: &mut Vec<DVec3>| {
      let key = (a.min(b), a.max(b));
      *midpoints.entry(key).or_insert_with(|| {
        let p = (vertices[a as usize] + vertices[b as usize]).normalize();
        vertices.push(p);
        vertices.len() as u32 - 1
      })
    };
    let mut next = Vec::with_capacity(faces.len() * 4);
    for [a, b, c] in faces {
      let ab = midpoint(a, b, &mut vertices);
      let bc = midpoint(b, c, &mut vertices);
      let ca = midpoint(c, a, &mut vertices);
      next.extend([[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]);
    }
    faces = next;
  }

  TriMesh {
    vertices: vertices.into_iter().map(|v| center + v * radius).collect(),
    faces,
  }
}

// =============================================================================
// Exact distance functions
// =============================================================================

/// Exact signed distance to an axis-aligned box.
pub fn box_sdf(p: DVec3, bounds: &DAabb3) -> f64 {
  let q = (p - bounds.center()).abs() - bounds.size() * 0.5;
  let outside = q.max(DVec3::ZERO).length();
  let inside = q.max_element().min(0.0);
  outside + inside
}

/// Analytic sphere field.
pub struct SphereSampler {
  pub center: DVec3,
  pub radius: f64,
}

impl SphereSampler {
  pub fn new(center: DVec3, radius: f64) -> Self {
    Self { center, radius }
  }
}

impl DistanceSampler for SphereSampler {
  fn distance(&mut self, point: DVec3) -> f64 {
    (point - self.center).length() - self.radius
  }
}

/// Linear field `dot(normal, p) - offset`; trilinear interpolation is exact.
pub struct PlaneSampler {
  pub normal: DVec3,
  pub offset: f64,
}

impl DistanceSampler for PlaneSampler {
  fn distance(&mut self, point: DVec3) -> f64 {
    self.normal.dot(point) - self.offset
  }
}

/// Wraps a sampler and reports no surface anywhere.
pub struct EmptyRegions<S>(pub S);

impl<S: DistanceSampler> DistanceSampler for EmptyRegions<S> {
  fn distance(&mut self, point: DVec3) -> f64 {
    self.0.distance(point)
  }

  fn may_contain_surface(&mut self, _coord: &PathCoord, _bounds: &DAabb3) -> bool {
    false
  }
}

/// Deterministic LCG for reproducible point batteries.
pub struct Lcg(pub u64);

impl Lcg {
  pub fn next_f64(&mut self) -> f64 {
    self.0 = self
      .0
      .wrapping_mul(6364136223846793005)
      .wrapping_add(1442695040888963407);
    (self.0 >> 11) as f64 / (1u64 << 53) as f64
  }

  /// Uniform point in `bounds`.
  pub fn point_in(&mut self, bounds: &DAabb3) -> DVec3 {
    let t = DVec3::new(self.next_f64(), self.next_f64(), self.next_f64());
    bounds.min + t * bounds.size()
  }
}
