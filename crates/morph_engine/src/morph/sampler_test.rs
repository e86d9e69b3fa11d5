use glam::{DQuat, DVec3};

use super::*;
use crate::cancel::CancelToken;
use crate::geometry::closest_point;
use crate::test_utils::{box_sdf, cube, sphere, unit_cube, Lcg, SphereSampler};
use crate::types::{AnchorPair, MorphConfig};

struct Indexed {
  mesh: TriMesh,
  normals: AveragedNormals,
  faces: FaceOctree,
}

fn index(mesh: TriMesh, max_depth: u8) -> Indexed {
  let config = MorphConfig::default().with_max_depth(max_depth);
  let bounds = mesh.bounds().unwrap().padded_cube(config.grid_resolution());
  let mut faces = FaceOctree::new(bounds, &config);
  faces.fill(&mesh, &CancelToken::new()).unwrap();
  Indexed {
    normals: AveragedNormals::new(&mesh),
    mesh,
    faces,
  }
}

// =========================================================================
// Mesh distance
// =========================================================================

/// Unit cube: -0.5 at the center, +1 one unit out from a face center.
#[test]
fn test_unit_cube_distances() {
  let fixture = index(unit_cube(), 3);
  let mut sampler = MeshDistance::new(&fixture.mesh, &fixture.normals, &fixture.faces);

  assert!((sampler.distance(DVec3::splat(0.5)) + 0.5).abs() < 1e-12);
  assert!((sampler.distance(DVec3::new(0.5, 0.5, 2.0)) - 1.0).abs() < 1e-12);
  assert!((sampler.distance(DVec3::new(-1.0, 0.5, 0.5)) - 1.0).abs() < 1e-12);
}

/// Octree-narrowed distances equal the brute-force distance over all faces.
#[test]
fn test_matches_brute_force() {
  let fixture = index(sphere(DVec3::ZERO, 1.0, 2), 4);
  let all: Vec<u32> = (0..fixture.mesh.faces.len() as u32).collect();
  let mut sampler = MeshDistance::new(&fixture.mesh, &fixture.normals, &fixture.faces);

  let mut rng = Lcg(17);
  let region = DAabb3::from_center_half_extents(DVec3::ZERO, DVec3::splat(1.6));
  for _ in 0..300 {
    let p = rng.point_in(&region);
    let exact = closest_point(&fixture.mesh, &all, p).distance_squared.sqrt();
    let d = sampler.distance(p);
    assert!((d.abs() - exact).abs() < 1e-12, "At {:?}: {} vs {}", p, d, exact);
  }
}

#[test]
fn test_sign_follows_cube() {
  let shape = DAabb3::new(DVec3::splat(-1.0), DVec3::splat(1.0));
  let fixture = index(cube(DVec3::ZERO, 2.0), 3);
  let mut sampler = MeshDistance::new(&fixture.mesh, &fixture.normals, &fixture.faces);

  let mut rng = Lcg(4);
  let region = DAabb3::from_center_half_extents(DVec3::ZERO, DVec3::splat(1.5));
  for _ in 0..200 {
    let p = rng.point_in(&region);
    let expected = box_sdf(p, &shape);
    if expected.abs() < 1e-6 {
      continue;
    }
    assert!((sampler.distance(p) - expected).abs() < 1e-9, "At {:?}", p);
  }
}

#[test]
fn test_corner_distance_matches_distance() {
  let fixture = index(sphere(DVec3::new(0.2, 0.0, -0.1), 0.8, 1), 3);
  let mut sampler = MeshDistance::new(&fixture.mesh, &fixture.normals, &fixture.faces);
  let root = *fixture.faces.bounds();
  for corner in 0..8 {
    let p = root.corner(corner);
    let from_corner = sampler.corner_distance(corner, p);
    assert!((from_corner - sampler.distance(p)).abs() < 1e-12);
    assert!(from_corner > 0.0);
  }

  // A point that is not the root corner falls back to the full query
  assert!(sampler.corner_distance(0, DVec3::new(0.2, 0.0, -0.1)) < -0.5);
}

#[test]
fn test_surface_free_cells() {
  let fixture = index(sphere(DVec3::ZERO, 1.0, 2), 3);
  let mut sampler = MeshDistance::new(&fixture.mesh, &fixture.normals, &fixture.faces);
  let root = *fixture.faces.bounds();

  // Cell touching the sphere center at depth 3 holds no faces
  let center_cell = PathCoord::from_children(&[0, 7, 7]);
  let center_box = root.child(0).child(7).child(7);
  assert!(!sampler.may_contain_surface(&center_cell, &center_box));

  assert!(sampler.may_contain_surface(&PathCoord::ROOT, &root));

  // A box not covered by the face cell is never ruled out
  let elsewhere = DAabb3::new(DVec3::splat(10.0), DVec3::splat(11.0));
  assert!(sampler.may_contain_surface(&center_cell, &elsewhere));
}

// =========================================================================
// Blended field
// =========================================================================

fn sphere_adf(center: DVec3, radius: f64) -> AdfOctree {
  let bounds = DAabb3::from_center_half_extents(center, DVec3::splat(radius * 1.5));
  let mut adf = AdfOctree::new(bounds, 4, 1e-4);
  adf
    .fill(&mut SphereSampler::new(center, radius), &CancelToken::new())
    .unwrap();
  adf
}

#[test]
fn test_blend_endpoints() {
  let first = sphere_adf(DVec3::ZERO, 1.0);
  let second = sphere_adf(DVec3::new(5.0, 0.0, 0.0), 0.5);
  let points = [DVec3::ZERO, DVec3::new(0.4, -0.2, 0.9), DVec3::splat(0.7)];

  let to_second = RigidTransform {
    origin_offset: DVec3::new(5.0, 0.0, 0.0),
    ..RigidTransform::IDENTITY
  };
  let mut at_start = BlendedField::new(&first, &second, to_second, 0.0);
  let mut at_end = BlendedField::new(&first, &second, to_second, 1.0);
  for p in points {
    assert_eq!(at_start.distance(p), first.sample(p));
    assert_eq!(at_end.distance(p), second.sample(p + DVec3::new(5.0, 0.0, 0.0)));
  }

  let mut halfway = BlendedField::new(&first, &second, to_second, 0.5);
  let d = halfway.distance(DVec3::ZERO);
  assert!((d - 0.5 * (first.sample(DVec3::ZERO) + second.sample(DVec3::new(5.0, 0.0, 0.0)))).abs() < 1e-15);
}

/// The domain contains the second shape's box pulled back into the first
/// frame.
#[test]
fn test_blend_domain() {
  let first = sphere_adf(DVec3::ZERO, 1.0);
  let second = sphere_adf(DVec3::new(4.0, 1.0, 0.0), 1.0);
  let rotation = DQuat::from_rotation_y(0.5);
  let anchors: Vec<AnchorPair> = [DVec3::X, DVec3::Y, DVec3::Z, DVec3::ONE]
    .iter()
    .map(|&p| AnchorPair::new(p, rotation * p + DVec3::new(4.0, 1.0, 0.0)))
    .collect();
  let to_second = RigidTransform::from_anchors(&anchors, DVec3::ZERO, DVec3::new(4.0, 1.0, 0.0)).unwrap();

  let field = BlendedField::new(&first, &second, to_second, 0.5);
  let domain = field.domain();
  assert!(domain.contains_point(first.bounds().min) && domain.contains_point(first.bounds().max));
  for corner in 0..8 {
    let pulled = to_second.apply_inverse(second.bounds().corner(corner));
    assert!(domain.contains_point(pulled));
  }
}

#[test]
fn test_blend_rules_out_far_cells() {
  let first = sphere_adf(DVec3::ZERO, 1.0);
  let second = sphere_adf(DVec3::ZERO, 1.0);
  let mut field = BlendedField::new(&first, &second, RigidTransform::IDENTITY, 0.3);

  let near_center = DAabb3::from_center_half_extents(DVec3::ZERO, DVec3::splat(0.1));
  assert!(!field.may_contain_surface(&PathCoord::ROOT, &near_center));

  let on_surface = DAabb3::from_center_half_extents(DVec3::X, DVec3::splat(0.1));
  assert!(field.may_contain_surface(&PathCoord::ROOT, &on_surface));
}
