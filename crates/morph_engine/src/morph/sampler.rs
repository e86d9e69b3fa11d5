//! Distance samplers feeding the distance octree builds.

use glam::DVec3;

use crate::adf::{AdfOctree, DistanceSampler};
use crate::alignment::RigidTransform;
use crate::face_octree::FaceOctree;
use crate::geometry::{signed_distance, AveragedNormals};
use crate::octree::{DAabb3, PathCoord};
use crate::types::TriMesh;

/// Exact signed distance to a mesh, narrowed by its face octree.
///
/// The face octree must index `mesh` and be non-empty. When the distance
/// octree shares the face octree's bounds, root corners use the cheaper
/// corner lists and empty face cells are reported as surface free.
pub struct MeshDistance<'a> {
  mesh: &'a TriMesh,
  normals: &'a AveragedNormals,
  faces: &'a FaceOctree,
  scratch: Vec<u32>,
}

impl<'a> MeshDistance<'a> {
  pub fn new(mesh: &'a TriMesh, normals: &'a AveragedNormals, faces: &'a FaceOctree) -> Self {
    Self {
      mesh,
      normals,
      faces,
      scratch: Vec::new(),
    }
  }
}

impl DistanceSampler for MeshDistance<'_> {
  fn distance(&mut self, point: DVec3) -> f64 {
    self.faces.list_of_faces(self.mesh, point, &mut self.scratch);
    signed_distance(self.mesh, self.normals, &self.scratch, point)
  }

  fn corner_distance(&mut self, corner: usize, point: DVec3) -> f64 {
    if self.faces.bounds().corner(corner) != point {
      return self.distance(point);
    }
    let candidates = self.faces.list_of_faces_from_corner(corner);
    signed_distance(self.mesh, self.normals, candidates, point)
  }

  /// An empty face cell covering `bounds` proves no triangle reaches it.
  fn may_contain_surface(&mut self, coord: &PathCoord, bounds: &DAabb3) -> bool {
    let tree = self.faces.tree();
    let cell = tree.cell_bounds(tree.navigate(coord));
    if !(cell.contains_point(bounds.min) && cell.contains_point(bounds.max)) {
      return true;
    }
    self.faces.has_faces(coord)
  }
}

/// Weighted blend of two distance octrees, evaluated in the first shape's
/// frame.
///
/// `to_second` carries a point of the first frame into the second, so the
/// second field is pulled back onto the first before blending.
pub struct BlendedField<'a> {
  first: &'a AdfOctree,
  second: &'a AdfOctree,
  to_second: RigidTransform,
  coefficient: f64,
  slack: f64,
}

impl<'a> BlendedField<'a> {
  pub fn new(
    first: &'a AdfOctree,
    second: &'a AdfOctree,
    to_second: RigidTransform,
    coefficient: f64,
  ) -> Self {
    Self {
      first,
      second,
      to_second,
      coefficient,
      slack: first.min_error().max(second.min_error()),
    }
  }

  /// Box in the first frame covering both fields' domains.
  pub fn domain(&self) -> DAabb3 {
    let second = self.second.bounds();
    let pulled_back = DAabb3::from_points((0..8).map(|i| self.to_second.apply_inverse(second.corner(i))));
    match pulled_back {
      Some(other) => self.first.bounds().union(&other),
      None => *self.first.bounds(),
    }
  }
}

impl DistanceSampler for BlendedField<'_> {
  fn distance(&mut self, point: DVec3) -> f64 {
    let c = self.coefficient;
    (1.0 - c) * self.first.sample(point) + c * self.second.sample(self.to_second.apply(point))
  }

  /// Both fields change by at most the distance moved, so a center value
  /// beyond the half diagonal rules out a crossing.
  fn may_contain_surface(&mut self, _coord: &PathCoord, bounds: &DAabb3) -> bool {
    self.distance(bounds.center()).abs() <= bounds.diagonal() * 0.5 + self.slack
  }
}

#[cfg(test)]
#[path = "sampler_test.rs"]
mod sampler_test;
