//! Planar polygon helpers: projection, orientation and ear clipping.

use glam::{DVec2, DVec3};

/// Project points onto the plane of `normal` by dropping its dominant axis.
///
/// The remaining axes are taken in cyclic order and the second is mirrored
/// when the dominant component is negative, so a loop winding counter-
/// clockwise around `normal` has positive area in 2D.
pub fn project(points: &[DVec3], normal: DVec3) -> Vec<DVec2> {
  let abs = normal.abs();
  let axis = if abs.x >= abs.y && abs.x >= abs.z {
    0
  } else if abs.y >= abs.z {
    1
  } else {
    2
  };
  let s = (axis + 1) % 3;
  let t = (axis + 2) % 3;
  let flip = if normal[axis] < 0.0 { -1.0 } else { 1.0 };
  points
    .iter()
    .map(|p| DVec2::new(p[s], p[t] * flip))
    .collect()
}

/// Twice the signed area of a closed loop (shoelace).
pub fn signed_area2(points: &[DVec2]) -> f64 {
  let n = points.len();
  (0..n)
    .map(|i| points[i].perp_dot(points[(i + 1) % n]))
    .sum()
}

/// Even-odd containment test.
pub fn point_in_polygon(point: DVec2, polygon: &[DVec2]) -> bool {
  let n = polygon.len();
  let mut inside = false;
  let mut j = n.wrapping_sub(1);
  for i in 0..n {
    let a = polygon[i];
    let b = polygon[j];
    if (a.y > point.y) != (b.y > point.y) {
      let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
      if point.x < x {
        inside = !inside;
      }
    }
    j = i;
  }
  inside
}

#[inline]
fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 {
  (b - a).perp_dot(c - a)
}

#[inline]
fn on_segment(a: DVec2, b: DVec2, p: DVec2) -> bool {
  p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Closed segment intersection; touching and collinear overlap count.
pub fn segments_intersect(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> bool {
  let d1 = orient(q1, q2, p1);
  let d2 = orient(q1, q2, p2);
  let d3 = orient(p1, p2, q1);
  let d4 = orient(p1, p2, q2);

  if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
    && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
  {
    return true;
  }
  (d1 == 0.0 && on_segment(q1, q2, p1))
    || (d2 == 0.0 && on_segment(q1, q2, p2))
    || (d3 == 0.0 && on_segment(p1, p2, q1))
    || (d4 == 0.0 && on_segment(p1, p2, q2))
}

/// Triangulate a simple counter-clockwise polygon by ear clipping.
///
/// Returns triangles as index triples into `points`, wound like the input.
/// Collinear vertices are dropped without emitting a triangle. Returns
/// `None` when no ear is found within `2 * len` consecutive attempts.
pub fn ear_clip(points: &[DVec2]) -> Option<Vec<[usize; 3]>> {
  let mut ring: Vec<usize> = (0..points.len()).collect();
  let mut triangles = Vec::with_capacity(points.len().saturating_sub(2));
  if ring.len() < 3 {
    return Some(triangles);
  }

  let extent = points
    .iter()
    .fold(DVec2::ZERO, |acc, p| acc.max(p.abs()))
    .max_element()
    .max(f64::MIN_POSITIVE);
  let epsilon = 1e-12 * extent * extent;

  let mut cursor = 0;
  let mut failures = 0;
  while ring.len() > 3 {
    if failures > 2 * ring.len() {
      return None;
    }
    let n = ring.len();
    let i = cursor % n;
    let prev = ring[(i + n - 1) % n];
    let cur = ring[i];
    let next = ring[(i + 1) % n];
    let (a, b, c) = (points[prev], points[cur], points[next]);

    let turn = orient(a, b, c);
    if turn.abs() <= epsilon && (b - a).dot(c - b) > 0.0 {
      ring.remove(i);
      failures = 0;
      continue;
    }
    if turn > epsilon && is_ear(points, &ring, prev, next) {
      triangles.push([prev, cur, next]);
      ring.remove(i);
      failures = 0;
      continue;
    }

    cursor = i + 1;
    failures += 1;
  }

  let last = [ring[0], ring[1], ring[2]];
  if orient(points[last[0]], points[last[1]], points[last[2]]) > epsilon {
    triangles.push(last);
  }
  Some(triangles)
}

/// Diagonal `prev -> next` crosses no ring edge and runs inside the ring.
fn is_ear(points: &[DVec2], ring: &[usize], prev: usize, next: usize) -> bool {
  let (a, c) = (points[prev], points[next]);
  let n = ring.len();
  for k in 0..n {
    let u = ring[k];
    let v = ring[(k + 1) % n];
    if u == prev || u == next || v == prev || v == next {
      continue;
    }
    if segments_intersect(a, c, points[u], points[v]) {
      return false;
    }
  }

  let polygon: Vec<DVec2> = ring.iter().map(|&k| points[k]).collect();
  point_in_polygon((a + c) * 0.5, &polygon)
}

#[cfg(test)]
#[path = "triangulate_test.rs"]
mod triangulate_test;
