//! Morph engine: two prepared sources, an optional rigid alignment and a
//! cache of results keyed by blend coefficient.
//!
//! # Result flow
//!
//! ```text
//! result_mesh(c)
//!   │  c not finite -> InvalidCoefficient, else clamp to [0, 1]
//!   │  cached?      -> shared mesh
//!   ▼
//! RigidOnly:  mesh 1 moved by the alignment scaled to c
//! Morphing:   c == 0 -> mesh 1, c == 1 -> mesh 2
//!             otherwise blend both distance octrees in mesh 1's frame,
//!             extract, optimize, move by the alignment scaled to c
//! ```
//!
//! Without validated anchors the alignment is the identity and the shapes
//! blend where they stand.

pub mod morpher;
pub mod sampler;

use std::sync::Arc;

use glam::DVec3;
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::adf::AdfOctree;
use crate::alignment::RigidTransform;
use crate::cancel::CancelToken;
use crate::error::MorphError;
use crate::marching_cubes;
use crate::octree::DAabb3;
use crate::types::{AnchorPair, MeshSource, MorphConfig, MorphingMode, SourceSlot, TriMesh};

pub use morpher::{MeshMorpher, MorpherStats};
pub use sampler::{BlendedField, MeshDistance};

/// Produces meshes between two source shapes.
pub struct MorphEngine {
  config: MorphConfig,
  sources: [Option<MeshMorpher>; 2],
  anchors: Vec<AnchorPair>,
  rigid: RigidTransform,
  mode: MorphingMode,
  cache: Vec<(f64, Arc<TriMesh>)>,
  cancel: CancelToken,
}

impl MorphEngine {
  pub fn new(config: MorphConfig) -> Result<Self, MorphError> {
    config.validate()?;
    Ok(Self {
      config,
      sources: [None, None],
      anchors: Vec::new(),
      rigid: RigidTransform::IDENTITY,
      mode: MorphingMode::default(),
      cache: Vec::new(),
      cancel: CancelToken::new(),
    })
  }

  #[inline]
  pub fn config(&self) -> &MorphConfig {
    &self.config
  }

  /// Token polled by every build this engine runs. Clone it to cancel from
  /// another thread; reset it before building again.
  #[inline]
  pub fn cancel_token(&self) -> &CancelToken {
    &self.cancel
  }

  // ===========================================================================
  // Sources
  // ===========================================================================

  /// Prepare `source` for `slot`, using its own bounds as the shape's box.
  pub fn set_mesh(&mut self, slot: SourceSlot, source: &impl MeshSource) -> Result<(), MorphError> {
    self.set_mesh_with_bounds(slot, source, None)
  }

  pub fn set_mesh1(&mut self, source: &impl MeshSource) -> Result<(), MorphError> {
    self.set_mesh(SourceSlot::First, source)
  }

  pub fn set_mesh2(&mut self, source: &impl MeshSource) -> Result<(), MorphError> {
    self.set_mesh(SourceSlot::Second, source)
  }

  /// Prepare `source` for `slot` with the caller's box for the shape.
  ///
  /// The slot is emptied first, so a failed or cancelled build leaves it
  /// unset. Cached results and the current alignment are discarded.
  pub fn set_mesh_with_bounds(
    &mut self,
    slot: SourceSlot,
    source: &impl MeshSource,
    source_bounds: Option<DAabb3>,
  ) -> Result<(), MorphError> {
    self.sources[slot.index()] = None;
    self.cache.clear();
    self.rigid = RigidTransform::IDENTITY;

    let mesh = source.to_tri_mesh()?;
    let morpher = MeshMorpher::build(mesh, source_bounds, &self.config, &self.cancel)?;
    self.sources[slot.index()] = Some(morpher);
    Ok(())
  }

  /// Prepared source in `slot`.
  pub fn morpher(&self, slot: SourceSlot) -> Result<&MeshMorpher, MorphError> {
    self.sources[slot.index()]
      .as_ref()
      .ok_or(MorphError::NotInitialized(slot))
  }

  pub fn mesh1(&self) -> Option<&Arc<TriMesh>> {
    self.sources[0].as_ref().map(MeshMorpher::mesh)
  }

  pub fn mesh2(&self) -> Option<&Arc<TriMesh>> {
    self.sources[1].as_ref().map(MeshMorpher::mesh)
  }

  /// Both sources are set.
  pub fn is_initialized(&self) -> bool {
    self.sources.iter().all(Option::is_some)
  }

  // ===========================================================================
  // Alignment
  // ===========================================================================

  /// Record a correspondence between a point on mesh 1 and one on mesh 2.
  /// Takes effect at the next [`validate_anchors`](Self::validate_anchors).
  pub fn add_anchor(&mut self, source: DVec3, target: DVec3) {
    self.anchors.push(AnchorPair::new(source, target));
  }

  pub fn anchors(&self) -> &[AnchorPair] {
    &self.anchors
  }

  #[inline]
  pub fn anchor_count(&self) -> usize {
    self.anchors.len()
  }

  /// Drop all anchors and return to the identity alignment.
  pub fn clear_anchors(&mut self) {
    self.anchors.clear();
    self.rigid = RigidTransform::IDENTITY;
    self.cache.clear();
  }

  /// Fit the rigid alignment to the recorded anchors.
  ///
  /// Needs both sources, whose box centers anchor the fit. On error the
  /// previous alignment is kept.
  pub fn validate_anchors(&mut self) -> Result<RigidTransform, MorphError> {
    let first = self.morpher(SourceSlot::First)?.source_bounds().center();
    let second = self.morpher(SourceSlot::Second)?.source_bounds().center();
    let rigid = RigidTransform::from_anchors(&self.anchors, first, second)?;

    let (axis, angle) = rigid.rotation.to_axis_angle();
    info!(
      anchors = self.anchors.len(),
      angle_deg = angle.to_degrees(),
      ?axis,
      translation = ?rigid.translation,
      "rigid alignment updated"
    );
    self.rigid = rigid;
    self.cache.clear();
    Ok(rigid)
  }

  #[inline]
  pub fn rigid_transform(&self) -> &RigidTransform {
    &self.rigid
  }

  // ===========================================================================
  // Results
  // ===========================================================================

  pub fn set_morphing_mode(&mut self, mode: MorphingMode) {
    if self.mode != mode {
      self.mode = mode;
      self.cache.clear();
    }
  }

  #[inline]
  pub fn morphing_mode(&self) -> MorphingMode {
    self.mode
  }

  /// Number of cached results.
  #[inline]
  pub fn cached_results(&self) -> usize {
    self.cache.len()
  }

  /// Drop sources, anchors, alignment and cached results.
  pub fn clear(&mut self) {
    self.sources = [None, None];
    self.anchors.clear();
    self.rigid = RigidTransform::IDENTITY;
    self.cache.clear();
  }

  /// Mesh at blend `coefficient`, clamped to [0, 1].
  pub fn result_mesh(&mut self, coefficient: f64) -> Result<Arc<TriMesh>, MorphError> {
    if !coefficient.is_finite() {
      return Err(MorphError::InvalidCoefficient(coefficient));
    }
    let c = coefficient.clamp(0.0, 1.0);

    if let Some((_, mesh)) = self.cache.iter().find(|(key, _)| *key == c) {
      debug!(coefficient = c, "result served from cache");
      return Ok(Arc::clone(mesh));
    }

    let start = Instant::now();
    let mesh = match self.mode {
      MorphingMode::RigidOnly => self.rigid_result(c)?,
      MorphingMode::Morphing => self.morphing_result(c)?,
    };
    info!(
      coefficient = c,
      mode = ?self.mode,
      faces = mesh.faces.len(),
      elapsed_ms = start.elapsed().as_millis() as u64,
      "result mesh computed"
    );

    if self.config.cache_results {
      self.cache.push((c, Arc::clone(&mesh)));
    }
    Ok(mesh)
  }

  fn rigid_result(&self, c: f64) -> Result<Arc<TriMesh>, MorphError> {
    let source = self.morpher(SourceSlot::First)?.mesh();
    if c == 0.0 {
      return Ok(Arc::clone(source));
    }
    let motion = self.rigid.interpolate(c);
    Ok(Arc::new(source.map_vertices(|p| motion.apply(p))))
  }

  fn morphing_result(&self, c: f64) -> Result<Arc<TriMesh>, MorphError> {
    if c == 0.0 {
      return self.endpoint(SourceSlot::First);
    }
    if c == 1.0 {
      return self.endpoint(SourceSlot::Second);
    }
    Ok(Arc::new(self.blend(c)?))
  }

  fn endpoint(&self, slot: SourceSlot) -> Result<Arc<TriMesh>, MorphError> {
    let morpher = self.morpher(slot)?;
    if !self.config.reconstruct_endpoints {
      return Ok(Arc::clone(morpher.mesh()));
    }
    let (mesh, report) = morpher.reconstruct(&self.config);
    for issue in &report.issues {
      warn!(%issue, ?slot, "coplanar set kept as extracted");
    }
    Ok(Arc::new(mesh))
  }

  /// Blend both fields in mesh 1's frame and move the surface part way.
  #[cfg_attr(feature = "instrument", tracing::instrument(skip(self), name = "morph::blend"))]
  fn blend(&self, c: f64) -> Result<TriMesh, MorphError> {
    let first = self.morpher(SourceSlot::First)?;
    let second = self.morpher(SourceSlot::Second)?;

    let mut field = BlendedField::new(first.distance_octree(), second.distance_octree(), self.rigid, c);
    let domain = field.domain();
    if domain.size().max_element() <= 0.0 {
      return Err(MorphError::DegenerateBounds);
    }

    let cube = domain.padded_cube(self.config.grid_resolution());
    let mut adf = AdfOctree::new(cube, self.config.max_depth, self.config.min_error);
    adf.fill(&mut field, &self.cancel)?;

    let (mesh, report) = marching_cubes::extract(&adf, &self.config);
    for issue in &report.issues {
      warn!(%issue, "coplanar set kept as extracted");
    }

    let motion = self.rigid.interpolate(c);
    Ok(mesh.map_vertices(|p| motion.apply(p)))
  }
}
