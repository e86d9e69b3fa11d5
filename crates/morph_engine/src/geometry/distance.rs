//! Closest point and signed distance from a point to a set of triangles.
//!
//! The nearest point of each candidate triangle is classified as a face,
//! edge or vertex hit. The sign of the final distance comes from the matching
//! pseudo-normal in [`AveragedNormals`], which keeps the sign consistent when
//! the nearest point sits on a crease.

use glam::DVec3;

use super::normals::AveragedNormals;
use crate::types::TriMesh;

/// Triangle feature holding the closest point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feature {
  /// Interior of the face.
  Face,
  /// Edge between two mesh vertices.
  Edge(u32, u32),
  /// A mesh vertex.
  Vertex(u32),
}

/// Closest surface point among a candidate set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosestPoint {
  pub point: DVec3,
  pub distance_squared: f64,
  /// Face the point was found on.
  pub face: u32,
  pub feature: Feature,
}

/// Feature of a single triangle, by corner slot (0-2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriangleFeature {
  Face,
  Edge(usize, usize),
  Vertex(usize),
}

/// Closest point of one triangle to `p`.
pub fn closest_point_on_triangle(p: DVec3, triangle: &[DVec3; 3]) -> (DVec3, TriangleFeature) {
  let [a, b, c] = *triangle;
  let normal = (b - a).cross(c - a);
  let normal_sq = normal.length_squared();

  if normal_sq > 0.0 {
    let projected = p - normal * ((p - a).dot(normal) / normal_sq);
    let inside = (b - a).cross(projected - a).dot(normal) >= 0.0
      && (c - b).cross(projected - b).dot(normal) >= 0.0
      && (a - c).cross(projected - c).dot(normal) >= 0.0;
    if inside {
      return (projected, TriangleFeature::Face);
    }
  }

  let mut best = (a, TriangleFeature::Vertex(0));
  let mut best_sq = f64::INFINITY;
  for (i, j) in [(0, 1), (1, 2), (0, 2)] {
    let candidate = closest_point_on_segment(p, triangle[i], triangle[j], i, j);
    let dist_sq = p.distance_squared(candidate.0);
    if dist_sq < best_sq {
      best_sq = dist_sq;
      best = candidate;
    }
  }
  best
}

/// Clamped projection onto segment `a`-`b`; endpoints are returned exactly.
#[inline]
fn closest_point_on_segment(
  p: DVec3,
  a: DVec3,
  b: DVec3,
  ia: usize,
  ib: usize,
) -> (DVec3, TriangleFeature) {
  let ab = b - a;
  let len_sq = ab.length_squared();
  let t = if len_sq > 0.0 {
    (p - a).dot(ab) / len_sq
  } else {
    0.0
  };
  if t <= 0.0 {
    (a, TriangleFeature::Vertex(ia))
  } else if t >= 1.0 {
    (b, TriangleFeature::Vertex(ib))
  } else {
    (a + ab * t, TriangleFeature::Edge(ia, ib))
  }
}

/// Nearest point of the candidate faces.
///
/// # Panics
/// Panics if `candidates` is empty; callers must supply a complete list.
pub fn closest_point(mesh: &TriMesh, candidates: &[u32], p: DVec3) -> ClosestPoint {
  assert!(
    !candidates.is_empty(),
    "distance query needs at least one candidate face"
  );

  let mut best = ClosestPoint {
    point: p,
    distance_squared: f64::INFINITY,
    face: candidates[0],
    feature: Feature::Face,
  };

  for &face in candidates {
    let triangle = mesh.triangle(face as usize);
    let (point, local) = closest_point_on_triangle(p, &triangle);
    let distance_squared = p.distance_squared(point);
    if distance_squared < best.distance_squared {
      let indices = mesh.faces[face as usize];
      let feature = match local {
        TriangleFeature::Face => Feature::Face,
        TriangleFeature::Edge(i, j) => Feature::Edge(indices[i], indices[j]),
        TriangleFeature::Vertex(i) => Feature::Vertex(indices[i]),
      };
      best = ClosestPoint {
        point,
        distance_squared,
        face,
        feature,
      };
    }
  }
  best
}

/// Signed distance to the candidate faces: negative inside, positive outside.
///
/// # Panics
/// Panics if `candidates` is empty.
pub fn signed_distance(
  mesh: &TriMesh,
  normals: &AveragedNormals,
  candidates: &[u32],
  p: DVec3,
) -> f64 {
  let closest = closest_point(mesh, candidates, p);
  let normal = match closest.feature {
    Feature::Face => normals.face(closest.face as usize),
    Feature::Edge(a, b) => normals
      .edge(a, b)
      .unwrap_or_else(|| normals.face(closest.face as usize)),
    Feature::Vertex(v) => normals.vertex(v),
  };

  let distance = closest.distance_squared.sqrt();
  if (p - closest.point).dot(normal) >= 0.0 {
    distance
  } else {
    -distance
  }
}

/// Unsigned squared distance to the nearest candidate face.
pub fn distance_squared(mesh: &TriMesh, candidates: &[u32], p: DVec3) -> f64 {
  candidates
    .iter()
    .map(|&face| {
      let (point, _) = closest_point_on_triangle(p, &mesh.triangle(face as usize));
      p.distance_squared(point)
    })
    .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
#[path = "distance_test.rs"]
mod distance_test;
