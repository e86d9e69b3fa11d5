//! Core data types for mesh morphing.

use glam::DVec3;

use crate::constants::{
  DEFAULT_MAX_DEPTH, DEFAULT_MIN_ERROR, DEFAULT_MIN_FACES_FOR_SUBDIVIDE,
  DEFAULT_PLANE_ANGULAR_TOLERANCE, DEFAULT_PLANE_LINEAR_TOLERANCE, DEFAULT_WELD_TOLERANCE,
  MAX_SUPPORTED_DEPTH,
};
use crate::error::MorphError;
use crate::octree::DAabb3;

/// Which of the two source meshes an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceSlot {
  /// Shape at blend coefficient 0.
  First,
  /// Shape at blend coefficient 1.
  Second,
}

impl SourceSlot {
  #[inline]
  pub fn index(self) -> usize {
    match self {
      SourceSlot::First => 0,
      SourceSlot::Second => 1,
    }
  }
}

/// How the engine produces meshes between the two sources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MorphingMode {
  /// Move mesh 1 along the interpolated rigid alignment.
  RigidOnly,
  /// Blend both distance fields and extract a new surface.
  #[default]
  Morphing,
}

/// Read-only triangle mesh access.
///
/// This is the only view of caller geometry the engine needs; builders copy
/// what they read into a [`TriMesh`].
pub trait MeshSource {
  fn vertex_count(&self) -> usize;
  fn vertex(&self, index: usize) -> DVec3;
  fn face_count(&self) -> usize;
  fn face(&self, index: usize) -> [u32; 3];

  /// Copy into an owned mesh, validating face indices.
  fn to_tri_mesh(&self) -> Result<TriMesh, MorphError> {
    let vertices = (0..self.vertex_count()).map(|i| self.vertex(i)).collect();
    let faces = (0..self.face_count()).map(|i| self.face(i)).collect();
    TriMesh::from_parts(vertices, faces)
  }
}

/// Indexed triangle mesh in double precision.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriMesh {
  /// Vertex positions.
  pub vertices: Vec<DVec3>,
  /// Triangles as vertex index triples.
  pub faces: Vec<[u32; 3]>,
}

impl TriMesh {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a mesh, rejecting out-of-range face indices.
  pub fn from_parts(vertices: Vec<DVec3>, faces: Vec<[u32; 3]>) -> Result<Self, MorphError> {
    let vertex_count = vertices.len();
    for (face, indices) in faces.iter().enumerate() {
      if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(MorphError::InvalidFaceIndex {
          face,
          index,
          vertex_count,
        });
      }
    }
    Ok(Self { vertices, faces })
  }

  /// Returns true if the mesh has no triangles.
  pub fn is_empty(&self) -> bool {
    self.faces.is_empty()
  }

  /// Number of triangles in the mesh.
  pub fn triangle_count(&self) -> usize {
    self.faces.len()
  }

  /// Corner positions of a triangle.
  #[inline]
  pub fn triangle(&self, face: usize) -> [DVec3; 3] {
    let [a, b, c] = self.faces[face];
    [
      self.vertices[a as usize],
      self.vertices[b as usize],
      self.vertices[c as usize],
    ]
  }

  /// Bounding box of all vertices, `None` when there are none.
  pub fn bounds(&self) -> Option<DAabb3> {
    let mut iter = self.vertices.iter();
    let first = *iter.next()?;
    let (min, max) = iter.fold((first, first), |(min, max), &v| (min.min(v), max.max(v)));
    Some(DAabb3::new(min, max))
  }

  /// Sum of triangle areas.
  pub fn surface_area(&self) -> f64 {
    (0..self.faces.len())
      .map(|f| {
        let [a, b, c] = self.triangle(f);
        (b - a).cross(c - a).length() * 0.5
      })
      .sum()
  }

  /// Copy of the mesh with every vertex mapped through `f`.
  pub fn map_vertices(&self, f: impl Fn(DVec3) -> DVec3) -> Self {
    Self {
      vertices: self.vertices.iter().map(|&v| f(v)).collect(),
      faces: self.faces.clone(),
    }
  }
}

impl MeshSource for TriMesh {
  fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  fn vertex(&self, index: usize) -> DVec3 {
    self.vertices[index]
  }

  fn face_count(&self) -> usize {
    self.faces.len()
  }

  fn face(&self, index: usize) -> [u32; 3] {
    self.faces[index]
  }

  fn to_tri_mesh(&self) -> Result<TriMesh, MorphError> {
    TriMesh::from_parts(self.vertices.clone(), self.faces.clone())
  }
}

/// A caller-supplied correspondence between the two source shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorPair {
  /// Point on mesh 1.
  pub source: DVec3,
  /// Matching point on mesh 2.
  pub target: DVec3,
}

impl AnchorPair {
  pub fn new(source: DVec3, target: DVec3) -> Self {
    Self { source, target }
  }
}

/// Configuration for octree builds and surface extraction.
#[derive(Clone, Debug, PartialEq)]
pub struct MorphConfig {
  /// Depth bound shared by the face and distance octrees.
  pub max_depth: u8,

  /// Maximum deviation from trilinear interpolation before an ADF cell
  /// subdivides.
  pub min_error: f64,

  /// Face octree cells with this many faces or fewer stay leaves.
  pub min_faces_for_subdivide: usize,

  /// Face octree cells whose list matches the parent's store a marker
  /// instead of a copy.
  pub share_parent_face_lists: bool,

  /// Merge coplanar marching cubes triangles into polygons and retriangulate.
  pub optimize_polygons: bool,

  /// Angular tolerance (degrees) for grouping coplanar triangles.
  pub plane_angular_tolerance: f64,

  /// Offset tolerance for grouping parallel planes.
  pub plane_linear_tolerance: f64,

  /// Distance under which extracted vertices are merged.
  pub weld_tolerance: f64,

  /// Extract the end meshes from their distance fields instead of returning
  /// copies of the sources.
  pub reconstruct_endpoints: bool,

  /// Keep computed results keyed by coefficient.
  pub cache_results: bool,
}

impl Default for MorphConfig {
  fn default() -> Self {
    Self {
      max_depth: DEFAULT_MAX_DEPTH,
      min_error: DEFAULT_MIN_ERROR,
      min_faces_for_subdivide: DEFAULT_MIN_FACES_FOR_SUBDIVIDE,
      share_parent_face_lists: false,
      optimize_polygons: true,
      plane_angular_tolerance: DEFAULT_PLANE_ANGULAR_TOLERANCE,
      plane_linear_tolerance: DEFAULT_PLANE_LINEAR_TOLERANCE,
      weld_tolerance: DEFAULT_WELD_TOLERANCE,
      reconstruct_endpoints: false,
      cache_results: true,
    }
  }
}

impl MorphConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_max_depth(mut self, max_depth: u8) -> Self {
    self.max_depth = max_depth;
    self
  }

  pub fn with_min_error(mut self, min_error: f64) -> Self {
    self.min_error = min_error;
    self
  }

  pub fn with_min_faces_for_subdivide(mut self, min_faces: usize) -> Self {
    self.min_faces_for_subdivide = min_faces;
    self
  }

  pub fn with_shared_face_lists(mut self, share: bool) -> Self {
    self.share_parent_face_lists = share;
    self
  }

  pub fn with_polygon_optimization(mut self, optimize: bool) -> Self {
    self.optimize_polygons = optimize;
    self
  }

  pub fn with_plane_tolerances(mut self, angular_degrees: f64, linear: f64) -> Self {
    self.plane_angular_tolerance = angular_degrees;
    self.plane_linear_tolerance = linear;
    self
  }

  pub fn with_weld_tolerance(mut self, tolerance: f64) -> Self {
    self.weld_tolerance = tolerance;
    self
  }

  pub fn with_reconstructed_endpoints(mut self, reconstruct: bool) -> Self {
    self.reconstruct_endpoints = reconstruct;
    self
  }

  pub fn with_result_cache(mut self, cache: bool) -> Self {
    self.cache_results = cache;
    self
  }

  /// Check ranges before any build starts.
  pub fn validate(&self) -> Result<(), MorphError> {
    if self.max_depth == 0 || self.max_depth > MAX_SUPPORTED_DEPTH {
      return Err(MorphError::InvalidConfig("max_depth must be in 1..=16"));
    }
    if !(self.min_error.is_finite() && self.min_error >= 0.0) {
      return Err(MorphError::InvalidConfig("min_error must be finite and non-negative"));
    }
    if !(self.plane_angular_tolerance >= 0.0 && self.plane_angular_tolerance < 90.0) {
      return Err(MorphError::InvalidConfig("plane_angular_tolerance must be in [0, 90)"));
    }
    if !(self.plane_linear_tolerance.is_finite() && self.plane_linear_tolerance >= 0.0) {
      return Err(MorphError::InvalidConfig("plane_linear_tolerance must be finite and non-negative"));
    }
    if !(self.weld_tolerance.is_finite() && self.weld_tolerance > 0.0) {
      return Err(MorphError::InvalidConfig("weld_tolerance must be finite and positive"));
    }
    Ok(())
  }

  /// Number of finest-level cells along one axis.
  #[inline]
  pub fn grid_resolution(&self) -> u32 {
    1 << self.max_depth
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
