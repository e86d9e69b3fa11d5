use glam::DVec3;

use super::*;
use crate::adf::stencil::trilinear;
use crate::adf::DistanceSampler;
use crate::cancel::CancelToken;
use crate::edge_table::MC_CORNER_ORDER;
use crate::test_utils::{box_sdf, SphereSampler};

fn unit_box() -> DAabb3 {
  DAabb3::new(DVec3::ZERO, DVec3::ONE)
}

fn normal(triangle: &Triangle) -> DVec3 {
  let [a, b, c] = *triangle;
  (b - a).cross(c - a)
}

struct BoxSampler(DAabb3);

impl DistanceSampler for BoxSampler {
  fn distance(&mut self, point: DVec3) -> f64 {
    box_sdf(point, &self.0)
  }
}

fn signed_volume(mesh: &TriMesh) -> f64 {
  mesh
    .faces
    .iter()
    .map(|&[a, b, c]| {
      let (a, b, c) = (
        mesh.vertices[a as usize],
        mesh.vertices[b as usize],
        mesh.vertices[c as usize],
      );
      a.dot(b.cross(c)) / 6.0
    })
    .sum()
}

// =========================================================================
// Single cell
// =========================================================================

/// Seven inside corners and one outside corner give one triangle facing
/// the outside corner.
#[test]
fn test_single_positive_corner() {
  for outside in 0..8 {
    let mut corners = [-1.0; 8];
    corners[outside] = 0.5;
    let mut out = Vec::new();
    assert_eq!(polygonize_cell(&unit_box(), &corners, &mut out), 1);
    assert_eq!(out.len(), 1);

    let towards = unit_box().corner(outside) - DVec3::splat(0.5);
    assert!(normal(&out[0]).dot(towards) > 0.0, "Corner {} faces inward", outside);
  }
}

#[test]
fn test_single_negative_corner() {
  let mut corners = [1.0; 8];
  corners[0] = -1.0;
  let mut out = Vec::new();
  assert_eq!(polygonize_cell(&unit_box(), &corners, &mut out), 1);

  // Crossings at the edge midpoints next to corner 0
  for p in out[0] {
    assert!((p.element_sum() - 0.5).abs() < 1e-12);
  }
  assert!(normal(&out[0]).dot(DVec3::ONE) > 0.0);
}

#[test]
fn test_homogeneous_cells_emit_nothing() {
  let mut out = Vec::new();
  assert_eq!(polygonize_cell(&unit_box(), &[1.0; 8], &mut out), 0);
  assert_eq!(polygonize_cell(&unit_box(), &[-1.0; 8], &mut out), 0);
  assert!(out.is_empty());
}

/// For every case, each triangle's normal points up the interpolated field.
#[test]
fn test_all_cases_face_outward() {
  for case in 1..255usize {
    let mut corners = [1.0; 8];
    for (ring, &corner) in MC_CORNER_ORDER.iter().enumerate() {
      if case & (1 << ring) != 0 {
        corners[corner] = -1.0;
      }
    }

    let mut out = Vec::new();
    let emitted = polygonize_cell(&unit_box(), &corners, &mut out);
    assert!(emitted >= 1 && emitted <= 5, "Case {} emitted {}", case, emitted);

    for triangle in &out {
      let n = normal(triangle).normalize();
      let center = (triangle[0] + triangle[1] + triangle[2]) / 3.0;
      let ahead = trilinear(&corners, center + n * 1e-3);
      let behind = trilinear(&corners, center - n * 1e-3);
      assert!(ahead > behind, "Case {} has an inward triangle", case);
    }
  }
}

/// Zero at a corner puts the vertex exactly on that corner.
#[test]
fn test_zero_corner_vertex() {
  let p = edge_vertex(DVec3::ZERO, DVec3::X, -0.0, 1.0);
  assert_eq!(p, DVec3::ZERO);
  let p = edge_vertex(DVec3::ZERO, DVec3::X, -1.0, 3.0);
  assert!((p - DVec3::new(0.25, 0.0, 0.0)).length() < 1e-15);
}

// =========================================================================
// Welding
// =========================================================================

#[test]
fn test_weld_shares_vertices_and_drops_collapsed() {
  let eps = 1e-12;
  let triangles = [
    [DVec3::ZERO, DVec3::X, DVec3::Y],
    [DVec3::X + DVec3::splat(eps), DVec3::ONE.with_z(0.0), DVec3::Y],
    [DVec3::ZERO, DVec3::splat(eps), DVec3::X],
  ];
  let mesh = weld(&triangles, 1e-9);
  assert_eq!(mesh.vertices.len(), 4);
  assert_eq!(mesh.faces.len(), 2);
}

// =========================================================================
// Whole-tree extraction
// =========================================================================

#[test]
fn test_sphere_extraction() {
  let bounds = DAabb3::from_center_half_extents(DVec3::ZERO, DVec3::splat(1.5));
  let mut adf = AdfOctree::new(bounds, 5, 1e-4);
  adf
    .fill(&mut SphereSampler::new(DVec3::ZERO, 1.0), &CancelToken::new())
    .unwrap();

  let config = MorphConfig::default().with_polygon_optimization(false);
  let (mesh, report) = extract(&adf, &config);
  assert!(!mesh.is_empty());
  assert_eq!(report.input_triangles, report.output_triangles);

  for v in &mesh.vertices {
    assert!((v.length() - 1.0).abs() < 0.02, "Vertex off the surface: {:?}", v);
  }

  let volume = signed_volume(&mesh);
  let exact = 4.0 / 3.0 * std::f64::consts::PI;
  assert!((volume - exact).abs() < 0.05 * exact, "Volume {} vs {}", volume, exact);
}

/// Optimizing a box rebuilds its flat faces with fewer triangles and keeps
/// the surface area.
#[test]
fn test_box_optimization_preserves_area() {
  let shape = DAabb3::new(DVec3::splat(-0.55), DVec3::new(0.45, 0.6, 0.5));
  let bounds = DAabb3::from_center_half_extents(DVec3::ZERO, DVec3::splat(1.0));
  let mut adf = AdfOctree::new(bounds, 4, 1e-6);
  adf.fill(&mut BoxSampler(shape), &CancelToken::new()).unwrap();

  let plain = extract(&adf, &MorphConfig::default().with_polygon_optimization(false)).0;
  let (optimized, report) = extract(&adf, &MorphConfig::default());

  assert!(report.rebuilt_sets > 0);
  assert!(optimized.faces.len() < plain.faces.len());
  let (a, b) = (plain.surface_area(), optimized.surface_area());
  assert!((a - b).abs() < 1e-6 * a, "Area {} became {}", a, b);
  assert!((signed_volume(&plain) - signed_volume(&optimized)).abs() < 1e-6);
}
