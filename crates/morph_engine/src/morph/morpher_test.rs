use glam::DVec3;

use super::*;
use crate::test_utils::{sphere, unit_cube};

fn config(max_depth: u8) -> MorphConfig {
  MorphConfig::default()
    .with_max_depth(max_depth)
    .with_min_error(1e-3)
}

fn build(mesh: TriMesh, max_depth: u8) -> MeshMorpher {
  MeshMorpher::build(mesh, None, &config(max_depth), &CancelToken::new()).unwrap()
}

// =========================================================================
// Build
// =========================================================================

#[test]
fn test_cube_field() {
  let morpher = build(unit_cube(), 4);
  let adf = morpher.distance_octree();

  assert!((morpher.signed_distance(DVec3::splat(0.5)) + 0.5).abs() < 1e-12);
  assert!((adf.sample(DVec3::new(0.5, 0.5, 0.95)) + 0.05).abs() < 1e-3);
  assert!(adf.sample(DVec3::new(0.5, 0.5, 1.05)) > 0.0);
  for corner in 0..8 {
    assert!(adf.corner_distances(crate::octree::ROOT)[corner] > 0.0);
  }
  assert!(morpher.stats().distance_octree.distance_queries > 0);
}

#[test]
fn test_octrees_share_padded_cube() {
  let morpher = build(unit_cube(), 3);
  let expected = DAabb3::new(DVec3::ZERO, DVec3::ONE).padded_cube(8);
  assert_eq!(*morpher.bounds(), expected);
  assert_eq!(*morpher.face_octree().bounds(), expected);
  assert_eq!(*morpher.source_bounds(), DAabb3::new(DVec3::ZERO, DVec3::ONE));
}

#[test]
fn test_explicit_source_bounds() {
  let real = DAabb3::new(DVec3::splat(-1.0), DVec3::splat(2.0));
  let morpher = MeshMorpher::build(unit_cube(), Some(real), &config(3), &CancelToken::new()).unwrap();
  assert_eq!(*morpher.source_bounds(), real);
}

#[test]
fn test_rejects_empty_and_degenerate() {
  let cancel = CancelToken::new();
  assert_eq!(
    MeshMorpher::build(TriMesh::new(), None, &config(3), &cancel).unwrap_err(),
    MorphError::EmptyMesh
  );

  let point = TriMesh {
    vertices: vec![DVec3::ONE],
    faces: vec![[0, 0, 0]],
  };
  assert_eq!(
    MeshMorpher::build(point, None, &config(3), &cancel).unwrap_err(),
    MorphError::DegenerateBounds
  );
}

#[test]
fn test_cancelled_build() {
  let cancel = CancelToken::new();
  cancel.cancel();
  let result = MeshMorpher::build(unit_cube(), None, &config(3), &cancel);
  assert_eq!(result.unwrap_err(), MorphError::Cancelled);
}

/// Cells away from every face are skipped at first and can be refined later.
#[test]
fn test_refine_skipped_cells() {
  let mut morpher = build(sphere(DVec3::ZERO, 1.0, 2), 4);
  assert!(!morpher.distance_octree().skipped_cells().is_empty());
  let cells_before = morpher.distance_octree().tree().len();

  morpher.refine_skipped(&CancelToken::new()).unwrap();
  assert!(morpher.distance_octree().skipped_cells().is_empty());
  assert!(morpher.distance_octree().tree().len() >= cells_before);
}

// =========================================================================
// Reconstruction
// =========================================================================

#[test]
fn test_reconstructs_sphere() {
  let morpher = build(sphere(DVec3::ZERO, 1.0, 3), 5);
  let (mesh, report) = morpher.reconstruct(&config(5));

  assert!(mesh.faces.len() > 100);
  assert!(report.output_triangles >= mesh.faces.len());
  for v in &mesh.vertices {
    assert!((v.length() - 1.0).abs() < 0.05, "Vertex off the surface: {:?}", v);
  }
}
