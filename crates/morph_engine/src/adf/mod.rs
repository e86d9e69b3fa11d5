//! Adaptive distance field octree.
//!
//! Each cell stores the signed distance at its 8 corners. A cell is split
//! when trilinear interpolation of those corners misses the true field by
//! more than `min_error` at any of the 19 stencil points (see [`stencil`]).
//! Refinement therefore follows the field, not the geometry: flat regions
//! stay coarse however many triangles they hold.
//!
//! ```text
//! refine(cell, corners):
//!   store corners
//!   depth == max_depth                  -> stop
//!   initial pass && no surface nearby   -> record as skipped, stop
//!   sample 19 stencil points (memoized)
//!   all within min_error of prediction  -> stop
//!   split, hand each child its 8 corners from the 27-point lattice, recurse
//! ```
//!
//! Samples come from any [`DistanceSampler`]; the morph engine plugs in a
//! mesh sampler backed by a face octree, tests use analytic fields.

pub mod stencil;

use std::collections::HashMap;

use glam::DVec3;
use tracing::debug;
use web_time::Instant;

use crate::cancel::CancelToken;
use crate::error::MorphError;
use crate::octree::{CellId, DAabb3, FillStats, Octree, PathCoord, ROOT};
use stencil::{STENCIL_LEN, STENCIL_POINTS};

/// Signed distances at the 8 corners of a cell, binary ZYX order.
pub type CornerDistances = [f64; 8];

/// Source of signed distance values for a distance octree fill.
pub trait DistanceSampler {
  /// Signed distance at `point`: negative inside, positive outside.
  fn distance(&mut self, point: DVec3) -> f64;

  /// Signed distance at root corner `corner`, located at `point`.
  fn corner_distance(&mut self, _corner: usize, point: DVec3) -> f64 {
    self.distance(point)
  }

  /// False if no surface can cross the cell. Checked only on the initial
  /// pass; cells answered false are left unrefined and recorded as skipped.
  fn may_contain_surface(&mut self, _coord: &PathCoord, _bounds: &DAabb3) -> bool {
    true
  }
}

/// Per-fill state: the sampler, the distance memo and counters.
///
/// The memo lives for one fill call only.
struct FillContext<'a, S: ?Sized> {
  sampler: &'a mut S,
  cancel: &'a CancelToken,
  memo: HashMap<[u64; 3], f64>,
  stats: FillStats,
  initial: bool,
}

impl<S: DistanceSampler + ?Sized> FillContext<'_, S> {
  fn sample(&mut self, point: DVec3) -> f64 {
    let key = point.to_array().map(f64::to_bits);
    if let Some(&d) = self.memo.get(&key) {
      self.stats.cache_hits += 1;
      return d;
    }
    self.stats.distance_queries += 1;
    let d = self.sampler.distance(point);
    self.memo.insert(key, d);
    d
  }
}

/// Octree of corner distances refined until trilinear interpolation is
/// accurate to `min_error`.
#[derive(Clone, Debug)]
pub struct AdfOctree {
  tree: Octree<CornerDistances>,
  min_error: f64,
  skipped: Vec<CellId>,
}

impl AdfOctree {
  pub fn new(bounds: DAabb3, max_depth: u8, min_error: f64) -> Self {
    Self {
      tree: Octree::new(bounds, max_depth),
      min_error,
      skipped: Vec::new(),
    }
  }

  #[inline]
  pub fn tree(&self) -> &Octree<CornerDistances> {
    &self.tree
  }

  #[inline]
  pub fn bounds(&self) -> &DAabb3 {
    self.tree.bounds()
  }

  #[inline]
  pub fn min_error(&self) -> f64 {
    self.min_error
  }

  /// Corner distances of a cell.
  #[inline]
  pub fn corner_distances(&self, id: CellId) -> &CornerDistances {
    self.tree.value(id)
  }

  /// Cells the initial pass left unrefined because no surface was nearby.
  #[inline]
  pub fn skipped_cells(&self) -> &[CellId] {
    &self.skipped
  }

  /// Sample the root corners and refine from scratch.
  #[cfg_attr(feature = "instrument", tracing::instrument(skip_all, name = "adf::fill"))]
  pub fn fill<S: DistanceSampler + ?Sized>(
    &mut self,
    sampler: &mut S,
    cancel: &CancelToken,
  ) -> Result<FillStats, MorphError> {
    let start = Instant::now();
    self.tree.reset();
    self.skipped.clear();

    let bounds = *self.tree.bounds();
    let mut ctx = FillContext {
      sampler,
      cancel,
      memo: HashMap::new(),
      stats: FillStats::default(),
      initial: true,
    };

    let corners: CornerDistances = std::array::from_fn(|i| {
      let point = bounds.corner(i);
      let d = ctx.sampler.corner_distance(i, point);
      ctx.memo.insert(point.to_array().map(f64::to_bits), d);
      d
    });
    ctx.stats.distance_queries += 8;

    self.refine(ROOT, bounds, PathCoord::ROOT, corners, &mut ctx);
    let mut stats = ctx.stats;
    stats.elapsed = start.elapsed();

    if cancel.is_cancelled() {
      return Err(MorphError::Cancelled);
    }

    debug!(
      cells = self.tree.len(),
      leaves = self.tree.leaf_count(),
      skipped = self.skipped.len(),
      queries = stats.distance_queries,
      cache_hits = stats.cache_hits,
      elapsed_us = stats.elapsed.as_micros() as u64,
      "distance octree filled"
    );
    Ok(stats)
  }

  /// Refine the cells skipped by the initial pass, ignoring the surface
  /// test. Clears the skipped list on success.
  #[cfg_attr(feature = "instrument", tracing::instrument(skip_all, name = "adf::refine_skipped"))]
  pub fn refine_skipped<S: DistanceSampler + ?Sized>(
    &mut self,
    sampler: &mut S,
    cancel: &CancelToken,
  ) -> Result<FillStats, MorphError> {
    let start = Instant::now();
    let mut ctx = FillContext {
      sampler,
      cancel,
      memo: HashMap::new(),
      stats: FillStats::default(),
      initial: false,
    };

    for id in std::mem::take(&mut self.skipped) {
      let bounds = self.tree.cell_bounds(id);
      let coord = self.tree.coordinate(id);
      let corners = *self.tree.value(id);
      self.refine(id, bounds, coord, corners, &mut ctx);
    }

    let mut stats = ctx.stats;
    stats.elapsed = start.elapsed();
    if cancel.is_cancelled() {
      return Err(MorphError::Cancelled);
    }
    Ok(stats)
  }

  fn refine<S: DistanceSampler + ?Sized>(
    &mut self,
    id: CellId,
    bounds: DAabb3,
    coord: PathCoord,
    corners: CornerDistances,
    ctx: &mut FillContext<'_, S>,
  ) {
    if ctx.cancel.is_cancelled() {
      return;
    }
    ctx.stats.cells_visited += 1;
    *self.tree.value_mut(id) = corners;

    if self.tree.cell(id).depth() >= self.tree.max_depth() {
      return;
    }
    if ctx.initial && !ctx.sampler.may_contain_surface(&coord, &bounds) {
      self.skipped.push(id);
      ctx.stats.skipped_cells += 1;
      return;
    }

    let samples: [f64; STENCIL_LEN] =
      std::array::from_fn(|k| ctx.sample(bounds.lattice_point(STENCIL_POINTS[k])));

    let linear = STENCIL_POINTS
      .iter()
      .zip(&samples)
      .all(|(&point, &d)| (d - stencil::predict(&corners, point)).abs() <= self.min_error);
    if linear {
      return;
    }

    let lattice = stencil::assemble(&corners, &samples);
    let first = self.tree.subdivide(id);
    ctx.stats.subdivisions += 1;
    for child in 0..8 {
      self.refine(
        first + child,
        bounds.child(child),
        coord.child(child as u8),
        stencil::child_corners(&lattice, child),
        ctx,
      );
    }
  }

  /// Interpolated signed distance at `point`.
  ///
  /// Inside the root box this is trilinear interpolation in the leaf holding
  /// the point. Outside, the nearest box point is sampled and the distance to
  /// the box is added.
  pub fn sample(&self, point: DVec3) -> f64 {
    let root = self.tree.bounds();
    let clamped = root.clamp_point(point);
    let outside = root.distance_squared(point).sqrt();

    let mut id = ROOT;
    let mut bounds = *root;
    while let Some(first) = self.tree.child(id, 0) {
      let center = bounds.center();
      let octant = (clamped.x >= center.x) as usize
        | ((clamped.y >= center.y) as usize) << 1
        | ((clamped.z >= center.z) as usize) << 2;
      id = first + octant;
      bounds = bounds.child(octant);
    }

    let t = ((clamped - bounds.min) / bounds.size()).clamp(DVec3::ZERO, DVec3::ONE);
    stencil::trilinear(self.tree.value(id), t) + outside
  }
}
