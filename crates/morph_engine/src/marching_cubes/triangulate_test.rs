use glam::{DVec2, DVec3};

use super::*;

fn v(x: f64, y: f64) -> DVec2 {
  DVec2::new(x, y)
}

fn area(points: &[DVec2], triangles: &[[usize; 3]]) -> f64 {
  triangles
    .iter()
    .map(|&[a, b, c]| orient(points[a], points[b], points[c]) * 0.5)
    .sum()
}

fn assert_ccw(points: &[DVec2], triangles: &[[usize; 3]]) {
  for &[a, b, c] in triangles {
    assert!(orient(points[a], points[b], points[c]) > 0.0, "Triangle {:?} not CCW", [a, b, c]);
  }
}

// =========================================================================
// Ear clipping
// =========================================================================

#[test]
fn test_square() {
  let square = [v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)];
  let triangles = ear_clip(&square).unwrap();
  assert_eq!(triangles.len(), 2);
  assert_ccw(&square, &triangles);
  assert!((area(&square, &triangles) - 1.0).abs() < 1e-12);
}

#[test]
fn test_concave_l_shape() {
  let l = [
    v(0.0, 0.0),
    v(2.0, 0.0),
    v(2.0, 1.0),
    v(1.0, 1.0),
    v(1.0, 2.0),
    v(0.0, 2.0),
  ];
  let triangles = ear_clip(&l).unwrap();
  assert_eq!(triangles.len(), 4);
  assert_ccw(&l, &triangles);
  assert!((area(&l, &triangles) - 3.0).abs() < 1e-12);
}

/// Vertices in the middle of an edge vanish without a sliver.
#[test]
fn test_collinear_vertices_dropped() {
  let square = [
    v(0.0, 0.0),
    v(0.5, 0.0),
    v(1.0, 0.0),
    v(1.0, 0.5),
    v(1.0, 1.0),
    v(0.0, 1.0),
  ];
  let triangles = ear_clip(&square).unwrap();
  assert_ccw(&square, &triangles);
  assert!((area(&square, &triangles) - 1.0).abs() < 1e-12);
}

/// Comb with deep notches: every tooth must become its own ears.
#[test]
fn test_comb() {
  let comb = [
    v(0.0, 0.0),
    v(5.0, 0.0),
    v(5.0, 3.0),
    v(4.0, 3.0),
    v(4.0, 1.0),
    v(3.0, 1.0),
    v(3.0, 3.0),
    v(2.0, 3.0),
    v(2.0, 1.0),
    v(1.0, 1.0),
    v(1.0, 3.0),
    v(0.0, 3.0),
  ];
  assert!((signed_area2(&comb) - 22.0).abs() < 1e-12);

  let triangles = ear_clip(&comb).unwrap();
  assert!(triangles.len() <= comb.len() - 2);
  assert_ccw(&comb, &triangles);
  assert!((area(&comb, &triangles) - 11.0).abs() < 1e-9);
}

#[test]
fn test_tiny_inputs() {
  assert_eq!(ear_clip(&[]), Some(vec![]));
  assert_eq!(ear_clip(&[v(0.0, 0.0), v(1.0, 0.0)]), Some(vec![]));
  let tri = [v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)];
  assert_eq!(ear_clip(&tri), Some(vec![[0, 1, 2]]));
}

/// A clockwise ring has no convex ear to start from.
#[test]
fn test_clockwise_ring_stalls() {
  let square = [v(0.0, 0.0), v(0.0, 1.0), v(1.0, 1.0), v(1.0, 0.0)];
  assert_eq!(ear_clip(&square), None);
}

// =========================================================================
// Predicates and projection
// =========================================================================

#[test]
fn test_segments_intersect() {
  assert!(segments_intersect(v(0.0, 0.0), v(2.0, 2.0), v(0.0, 2.0), v(2.0, 0.0)));
  // T-touch
  assert!(segments_intersect(v(0.0, 0.0), v(2.0, 0.0), v(1.0, 0.0), v(1.0, 1.0)));
  // Collinear overlap
  assert!(segments_intersect(v(0.0, 0.0), v(2.0, 0.0), v(1.0, 0.0), v(3.0, 0.0)));
  // Collinear, disjoint
  assert!(!segments_intersect(v(0.0, 0.0), v(1.0, 0.0), v(2.0, 0.0), v(3.0, 0.0)));
  assert!(!segments_intersect(v(0.0, 0.0), v(1.0, 1.0), v(1.0, 0.0), v(2.0, -1.0)));
}

#[test]
fn test_point_in_polygon() {
  let l = [
    v(0.0, 0.0),
    v(2.0, 0.0),
    v(2.0, 1.0),
    v(1.0, 1.0),
    v(1.0, 2.0),
    v(0.0, 2.0),
  ];
  assert!(point_in_polygon(v(0.5, 0.5), &l));
  assert!(point_in_polygon(v(0.5, 1.5), &l));
  assert!(!point_in_polygon(v(1.5, 1.5), &l));
  assert!(!point_in_polygon(v(3.0, 0.5), &l));
}

/// Loops counter-clockwise around the normal project to positive area for
/// every dominant axis and sign.
#[test]
fn test_projection_keeps_orientation() {
  for normal in [DVec3::X, DVec3::NEG_X, DVec3::Y, DVec3::NEG_Y, DVec3::Z, DVec3::NEG_Z] {
    let u = normal.any_orthonormal_vector();
    let w = normal.cross(u);
    let loop3: Vec<DVec3> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
      .iter()
      .map(|&(a, b)| u * a + w * b)
      .collect();
    let area = signed_area2(&project(&loop3, normal));
    assert!((area - 2.0).abs() < 1e-12, "{:?}: {}", normal, area);
  }
}
