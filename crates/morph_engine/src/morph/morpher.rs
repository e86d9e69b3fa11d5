//! Per-source state: the mesh, its pseudo-normals and both octrees.

use std::sync::Arc;

use glam::DVec3;
use tracing::info;
use web_time::Instant;

use super::sampler::MeshDistance;
use crate::adf::{AdfOctree, DistanceSampler};
use crate::cancel::CancelToken;
use crate::error::MorphError;
use crate::face_octree::FaceOctree;
use crate::geometry::AveragedNormals;
use crate::marching_cubes::{self, OptimizeReport};
use crate::octree::{DAabb3, FillStats};
use crate::types::{MorphConfig, TriMesh};

/// Timings and counters of one morpher build.
#[derive(Clone, Debug, Default)]
pub struct MorpherStats {
  pub face_octree: FillStats,
  pub distance_octree: FillStats,
}

/// One source mesh prepared for distance queries.
///
/// Both octrees span the same padded cube around the mesh, so a distance
/// octree cell and the face octree cell at the same path share a box.
#[derive(Clone, Debug)]
pub struct MeshMorpher {
  mesh: Arc<TriMesh>,
  source_bounds: DAabb3,
  normals: AveragedNormals,
  faces: FaceOctree,
  adf: AdfOctree,
  stats: MorpherStats,
}

impl MeshMorpher {
  /// Index `mesh` and sample its distance field.
  ///
  /// `source_bounds` is the caller's box for the shape (its center anchors
  /// rigid alignment); the mesh's own bounds are used when absent.
  #[cfg_attr(feature = "instrument", tracing::instrument(skip_all, name = "morpher::build", fields(faces = mesh.faces.len())))]
  pub fn build(
    mesh: TriMesh,
    source_bounds: Option<DAabb3>,
    config: &MorphConfig,
    cancel: &CancelToken,
  ) -> Result<Self, MorphError> {
    let start = Instant::now();
    if mesh.is_empty() {
      return Err(MorphError::EmptyMesh);
    }
    let mesh_bounds = mesh.bounds().ok_or(MorphError::EmptyMesh)?;
    if mesh_bounds.size().max_element() <= 0.0 {
      return Err(MorphError::DegenerateBounds);
    }
    let cube = mesh_bounds.padded_cube(config.grid_resolution());

    let normals = AveragedNormals::new(&mesh);
    let mut faces = FaceOctree::new(cube, config);
    let face_stats = faces.fill(&mesh, cancel)?;

    let mut adf = AdfOctree::new(cube, config.max_depth, config.min_error);
    let distance_stats = adf.fill(&mut MeshDistance::new(&mesh, &normals, &faces), cancel)?;

    info!(
      vertices = mesh.vertices.len(),
      faces = mesh.faces.len(),
      face_cells = faces.tree().len(),
      distance_cells = adf.tree().len(),
      skipped = adf.skipped_cells().len(),
      elapsed_ms = start.elapsed().as_millis() as u64,
      "mesh morpher built"
    );

    Ok(Self {
      source_bounds: source_bounds.unwrap_or(mesh_bounds),
      mesh: Arc::new(mesh),
      normals,
      faces,
      adf,
      stats: MorpherStats {
        face_octree: face_stats,
        distance_octree: distance_stats,
      },
    })
  }

  #[inline]
  pub fn mesh(&self) -> &Arc<TriMesh> {
    &self.mesh
  }

  /// Box whose center anchors this shape in rigid alignment.
  #[inline]
  pub fn source_bounds(&self) -> &DAabb3 {
    &self.source_bounds
  }

  /// Padded cube shared by both octrees.
  #[inline]
  pub fn bounds(&self) -> &DAabb3 {
    self.adf.bounds()
  }

  #[inline]
  pub fn normals(&self) -> &AveragedNormals {
    &self.normals
  }

  #[inline]
  pub fn face_octree(&self) -> &FaceOctree {
    &self.faces
  }

  #[inline]
  pub fn distance_octree(&self) -> &AdfOctree {
    &self.adf
  }

  #[inline]
  pub fn stats(&self) -> &MorpherStats {
    &self.stats
  }

  /// Exact signed distance from `point` to the mesh.
  pub fn signed_distance(&self, point: DVec3) -> f64 {
    MeshDistance::new(&self.mesh, &self.normals, &self.faces).distance(point)
  }

  /// Refine the cells the initial fill skipped for lack of nearby faces.
  pub fn refine_skipped(&mut self, cancel: &CancelToken) -> Result<FillStats, MorphError> {
    let stats = self
      .adf
      .refine_skipped(&mut MeshDistance::new(&self.mesh, &self.normals, &self.faces), cancel)?;
    self.stats.distance_octree.merge(&stats);
    Ok(stats)
  }

  /// Surface extracted from the distance octree.
  pub fn reconstruct(&self, config: &MorphConfig) -> (TriMesh, OptimizeReport) {
    marching_cubes::extract(&self.adf, config)
  }
}

#[cfg(test)]
#[path = "morpher_test.rs"]
mod morpher_test;
