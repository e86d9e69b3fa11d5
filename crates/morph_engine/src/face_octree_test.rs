use glam::DVec3;

use super::*;
use crate::geometry::triangle_box_overlap;
use crate::test_utils::{sphere, unit_cube, Lcg};

fn config(max_depth: u8) -> MorphConfig {
  MorphConfig::default().with_max_depth(max_depth)
}

fn build(mesh: &TriMesh, config: &MorphConfig) -> FaceOctree {
  let bounds = mesh
    .bounds()
    .expect("fixture has vertices")
    .padded_cube(config.grid_resolution());
  let mut octree = FaceOctree::new(bounds, config);
  octree
    .fill(mesh, &CancelToken::new())
    .expect("uncancelled fill succeeds");
  octree
}

fn all_faces(mesh: &TriMesh) -> Vec<u32> {
  (0..mesh.faces.len() as u32).collect()
}

// =========================================================================
// Build
// =========================================================================

/// Every leaf lists exactly the faces overlapping its box.
#[test]
fn test_leaf_lists_match_brute_force() {
  let mesh = sphere(DVec3::ZERO, 1.0, 2);
  let octree = build(&mesh, &config(3));

  octree.tree().for_each_leaf(|id, bounds, _| {
    let expected: Vec<u32> = (0..mesh.faces.len() as u32)
      .filter(|&f| triangle_box_overlap(&mesh.triangle(f as usize), bounds))
      .collect();
    assert_eq!(octree.faces(id), expected.as_slice(), "Leaf {} list mismatch", id);
  });
}

/// A cell at or below the face threshold stays a leaf.
#[test]
fn test_min_faces_threshold_stops_subdivision() {
  let cube = unit_cube();
  let octree = build(&cube, &config(4).with_min_faces_for_subdivide(12));
  assert_eq!(octree.tree().len(), 1);
  assert_eq!(octree.faces(ROOT).len(), 12);
}

#[test]
fn test_empty_cells_are_not_subdivided() {
  let cube = unit_cube();
  let octree = build(&cube, &config(4));

  for id in 0..octree.tree().len() {
    if octree.faces(id).is_empty() {
      assert!(octree.tree().cell(id).is_leaf(), "Empty cell {} was split", id);
    }
  }

  // Cell in the middle of the cube at depth 2 holds no faces
  assert!(!octree.has_faces(&PathCoord::from_grid(1, 1, 1, 2)));
  // Cell at the cube corner does
  assert!(octree.has_faces(&PathCoord::from_grid(0, 0, 0, 2)));
  assert!(octree.has_faces(&PathCoord::ROOT));
}

#[test]
fn test_fill_cancelled() {
  let mesh = sphere(DVec3::ZERO, 1.0, 1);
  let config = config(3);
  let bounds = mesh.bounds().unwrap().padded_cube(config.grid_resolution());
  let mut octree = FaceOctree::new(bounds, &config);

  let cancel = CancelToken::new();
  cancel.cancel();
  assert_eq!(octree.fill(&mesh, &cancel), Err(MorphError::Cancelled));
}

#[test]
fn test_refill_replaces_contents() {
  let cube = unit_cube();
  let config = config(3);
  let bounds = cube.bounds().unwrap().padded_cube(config.grid_resolution());
  let mut octree = FaceOctree::new(bounds, &config);

  let first = octree.fill(&cube, &CancelToken::new()).unwrap();
  let len = octree.tree().len();
  let second = octree.fill(&cube, &CancelToken::new()).unwrap();

  assert_eq!(octree.tree().len(), len);
  assert_eq!(first.subdivisions, second.subdivisions);
  assert_eq!(second.cells_allocated(), len);
}

// =========================================================================
// Shared parent lists
// =========================================================================

/// A triangle through the root center touches every child box.
#[test]
fn test_shared_lists_mark_identical_children() {
  let mesh = TriMesh {
    vertices: vec![
      DVec3::new(-1.0, -1.0, 0.0),
      DVec3::new(1.0, -1.0, 0.0),
      DVec3::new(0.0, 1.0, 0.0),
      // Bounds helper so the box is a cube around the triangle
      DVec3::new(0.0, 0.0, 1.0),
      DVec3::new(0.0, 0.0, -1.0),
    ],
    faces: vec![[0, 1, 2]],
  };
  let shared = build(&mesh, &config(2).with_shared_face_lists(true));

  let first = shared.tree().child(ROOT, 0).unwrap();
  for octant in 0..8 {
    assert_eq!(shared.tree().value(first + octant), &FaceList::SameAsParent);
    assert_eq!(shared.faces(first + octant), &[0]);
  }
}

/// Resolved lists are identical with and without sharing.
#[test]
fn test_shared_lists_resolve_like_copies() {
  let mesh = sphere(DVec3::new(0.3, -0.2, 0.1), 2.0, 2);
  let plain = build(&mesh, &config(3));
  let shared = build(&mesh, &config(3).with_shared_face_lists(true));

  assert_eq!(plain.tree().len(), shared.tree().len());
  for id in 0..plain.tree().len() {
    assert_eq!(plain.faces(id), shared.faces(id), "Cell {} differs", id);
  }

  let mut a = Vec::new();
  let mut b = Vec::new();
  let mut rng = Lcg(11);
  for _ in 0..100 {
    let p = rng.point_in(plain.bounds());
    plain.list_of_faces(&mesh, p, &mut a);
    shared.list_of_faces(&mesh, p, &mut b);
    assert_eq!(a, b);
  }
}

// =========================================================================
// Queries
// =========================================================================

/// Querying at a vertex finds a face using that vertex.
#[test]
fn test_vertex_round_trip() {
  let mesh = sphere(DVec3::ZERO, 1.0, 2);
  let octree = build(&mesh, &config(4));
  let mut list = Vec::new();

  for (v, &p) in mesh.vertices.iter().enumerate() {
    octree.list_of_faces(&mesh, p, &mut list);
    assert!(
      list
        .iter()
        .any(|&f| mesh.faces[f as usize].contains(&(v as u32))),
      "No incident face for vertex {}",
      v
    );
  }
}

/// The candidate list always contains a globally nearest face.
#[test]
fn test_list_of_faces_is_complete() {
  let mesh = sphere(DVec3::ZERO, 1.0, 2);
  let octree = build(&mesh, &config(4));
  let everything = all_faces(&mesh);
  let mut list = Vec::new();

  let mut rng = Lcg(3);
  let region = DAabb3::new(DVec3::splat(-2.0), DVec3::splat(2.0));
  for _ in 0..500 {
    let p = rng.point_in(&region);
    octree.list_of_faces(&mesh, p, &mut list);
    assert!(!list.is_empty());
    assert!(list.windows(2).all(|w| w[0] < w[1]), "List not sorted/deduplicated");

    let best = distance_squared(&mesh, &everything, p);
    let found = distance_squared(&mesh, &list, p);
    assert!(
      (found - best).abs() <= 1e-12 * best.max(1.0),
      "Incomplete list at {:?}: {} vs {}",
      p,
      found,
      best
    );
  }
}

/// Deep leaves prune far-away faces.
#[test]
fn test_list_of_faces_prunes() {
  let mesh = sphere(DVec3::ZERO, 1.0, 3);
  let octree = build(&mesh, &config(5));
  let mut list = Vec::new();
  octree.list_of_faces(&mesh, DVec3::new(1.0, 0.0, 0.0), &mut list);
  assert!(list.len() < mesh.faces.len() / 4, "{} candidates", list.len());
}

#[test]
fn test_corner_lists_are_complete() {
  for mesh in [unit_cube(), sphere(DVec3::new(0.1, 0.2, -0.3), 1.5, 2)] {
    let octree = build(&mesh, &config(4));
    let everything = all_faces(&mesh);
    for corner in 0..8 {
      let p = octree.bounds().corner(corner);
      let list = octree.list_of_faces_from_corner(corner);
      assert!(!list.is_empty());
      let best = distance_squared(&mesh, &everything, p);
      let found = distance_squared(&mesh, list, p);
      assert!((found - best).abs() <= 1e-12 * best.max(1.0), "Corner {}", corner);
    }
  }
}

/// Points outside the root box fall back to a root-seeded search.
#[test]
fn test_outside_point() {
  let cube = unit_cube();
  let octree = build(&cube, &config(3));
  let mut list = Vec::new();
  let p = DVec3::new(5.0, 0.5, 0.5);
  octree.list_of_faces(&cube, p, &mut list);
  let best = distance_squared(&cube, &all_faces(&cube), p);
  assert!((distance_squared(&cube, &list, p) - best).abs() < 1e-12);
}
