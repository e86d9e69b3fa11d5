//! Face octree: per-cell lists of the triangles overlapping each cell.
//!
//! # Build
//!
//! ```text
//! root ── all faces
//!   │
//!   ├─ depth < max_depth && faces > min_faces_for_subdivide ?
//!   │     yes: split, test every face against the 8 child boxes,
//!   │          append to each child it overlaps, recurse
//!   │     no:  leaf keeps its (possibly long) list
//! ```
//!
//! With shared lists enabled, a child whose list equals its parent's stores
//! [`FaceList::SameAsParent`] and lookups resolve it upward.
//!
//! # Queries
//!
//! Every query returns a *complete* candidate list: it contains the triangle
//! nearest to the query point. Lists may be longer than necessary.

use glam::DVec3;
use smallvec::SmallVec;
use tracing::debug;
use web_time::Instant;

use crate::cancel::CancelToken;
use crate::error::MorphError;
use crate::geometry::distance::distance_squared;
use crate::geometry::triangle_box_overlap;
use crate::octree::{CellId, DAabb3, FillStats, Octree, PathCoord, ROOT};
use crate::types::{MorphConfig, TriMesh};

/// Candidate faces stored on a face octree cell.
#[derive(Clone, Debug, PartialEq)]
pub enum FaceList {
  /// Faces overlapping the cell, in parent order.
  Faces(Vec<u32>),
  /// Same faces as the parent cell.
  SameAsParent,
}

impl Default for FaceList {
  fn default() -> Self {
    FaceList::Faces(Vec::new())
  }
}

/// Octree indexing which faces of a mesh overlap each cell.
#[derive(Clone, Debug)]
pub struct FaceOctree {
  tree: Octree<FaceList>,
  min_faces_for_subdivide: usize,
  share_parent_lists: bool,
}

impl FaceOctree {
  pub fn new(bounds: DAabb3, config: &MorphConfig) -> Self {
    Self {
      tree: Octree::new(bounds, config.max_depth),
      min_faces_for_subdivide: config.min_faces_for_subdivide,
      share_parent_lists: config.share_parent_face_lists,
    }
  }

  #[inline]
  pub fn tree(&self) -> &Octree<FaceList> {
    &self.tree
  }

  #[inline]
  pub fn bounds(&self) -> &DAabb3 {
    self.tree.bounds()
  }

  /// Index `mesh`, replacing any previous contents.
  ///
  /// Returns [`MorphError::Cancelled`] if the token fires mid-build; the tree
  /// is then incomplete and must be refilled before use.
  #[cfg_attr(feature = "instrument", tracing::instrument(skip_all, name = "face_octree::fill"))]
  pub fn fill(&mut self, mesh: &TriMesh, cancel: &CancelToken) -> Result<FillStats, MorphError> {
    let start = Instant::now();
    let mut stats = FillStats::default();

    self.tree.reset();
    *self.tree.value_mut(ROOT) = FaceList::Faces((0..mesh.faces.len() as u32).collect());

    let bounds = *self.tree.bounds();
    self.subdivide(ROOT, bounds, mesh, cancel, &mut stats);
    stats.elapsed = start.elapsed();

    if cancel.is_cancelled() {
      return Err(MorphError::Cancelled);
    }

    debug!(
      faces = mesh.faces.len(),
      cells = self.tree.len(),
      leaves = self.tree.leaf_count(),
      elapsed_us = stats.elapsed.as_micros() as u64,
      "face octree filled"
    );
    Ok(stats)
  }

  fn subdivide(
    &mut self,
    id: CellId,
    bounds: DAabb3,
    mesh: &TriMesh,
    cancel: &CancelToken,
    stats: &mut FillStats,
  ) {
    if cancel.is_cancelled() {
      return;
    }
    stats.cells_visited += 1;

    let faces = self.faces(id);
    if self.tree.cell(id).depth() >= self.tree.max_depth()
      || faces.len() <= self.min_faces_for_subdivide
    {
      return;
    }

    let parent_count = faces.len();
    let child_bounds: [DAabb3; 8] = std::array::from_fn(|i| bounds.child(i));
    let mut lists: [Vec<u32>; 8] = Default::default();
    for &face in faces {
      let triangle = mesh.triangle(face as usize);
      for (list, child_box) in lists.iter_mut().zip(&child_bounds) {
        if triangle_box_overlap(&triangle, child_box) {
          list.push(face);
        }
      }
    }

    let first = self.tree.subdivide(id);
    stats.subdivisions += 1;
    for (octant, list) in lists.into_iter().enumerate() {
      *self.tree.value_mut(first + octant) =
        if self.share_parent_lists && list.len() == parent_count {
          FaceList::SameAsParent
        } else {
          FaceList::Faces(list)
        };
    }

    for (octant, child_box) in child_bounds.into_iter().enumerate() {
      self.subdivide(first + octant, child_box, mesh, cancel, stats);
    }
  }

  /// Faces of a cell, resolving shared lists through the parents.
  pub fn faces(&self, id: CellId) -> &[u32] {
    let mut cursor = id;
    loop {
      match self.tree.value(cursor) {
        FaceList::Faces(list) => return list,
        FaceList::SameAsParent => match self.tree.parent(cursor) {
          Some(parent) => cursor = parent,
          None => return &[],
        },
      }
    }
  }

  /// True if the cell reached by `coord` (or the leaf where navigation stops)
  /// has candidate faces.
  pub fn has_faces(&self, coord: &PathCoord) -> bool {
    !self.faces(self.tree.navigate(coord)).is_empty()
  }

  /// Complete candidate list for the root box corner `corner`.
  ///
  /// Descends through child `corner` while the child still has faces, then
  /// backs up one level. The nearest face to the corner lies within the
  /// diagonal of the deepest non-empty cell, which the parent's box covers.
  pub fn list_of_faces_from_corner(&self, corner: usize) -> &[u32] {
    let mut id = ROOT;
    while let Some(child) = self.tree.child(id, corner) {
      if self.faces(child).is_empty() {
        break;
      }
      id = child;
    }
    self.faces(self.tree.parent(id).unwrap_or(id))
  }

  /// Collect a complete candidate list for `point` into `out`.
  ///
  /// The deepest non-empty cell containing the point bounds the distance to
  /// the surface; every leaf within that distance contributes its faces.
  /// Points outside the root box seed from the root list. `out` is sorted and
  /// deduplicated.
  pub fn list_of_faces(&self, mesh: &TriMesh, point: DVec3, out: &mut Vec<u32>) {
    out.clear();

    let seed = self.deepest_non_empty(point);
    let seed_faces = self.faces(seed);
    if seed_faces.is_empty() {
      return;
    }

    let bound = distance_squared(mesh, seed_faces, point).sqrt();
    // Rounding slack so touching leaves are never missed
    let radius = bound * (1.0 + 1e-9) + 1e-12 * self.bounds().diagonal();
    let radius_sq = radius * radius;

    let mut stack: SmallVec<[(CellId, DAabb3); 32]> = SmallVec::new();
    stack.push((ROOT, *self.bounds()));
    while let Some((id, bounds)) = stack.pop() {
      if bounds.distance_squared(point) > radius_sq {
        continue;
      }
      match self.tree.children(id) {
        None => out.extend_from_slice(self.faces(id)),
        Some(children) => {
          for (octant, child) in children.into_iter().enumerate() {
            stack.push((child, bounds.child(octant)));
          }
        }
      }
    }

    out.sort_unstable();
    out.dedup();
  }

  /// Deepest cell on the point's descent path with a non-empty list.
  fn deepest_non_empty(&self, point: DVec3) -> CellId {
    let mut id = ROOT;
    let mut best = ROOT;
    let mut bounds = *self.bounds();
    if !bounds.contains_point(point) {
      return best;
    }
    while let Some(first) = self.tree.child(id, 0) {
      let center = bounds.center();
      let octant = (point.x >= center.x) as usize
        | ((point.y >= center.y) as usize) << 1
        | ((point.z >= center.z) as usize) << 2;
      id = first + octant;
      bounds = bounds.child(octant);
      if !self.faces(id).is_empty() {
        best = id;
      }
    }
    best
  }
}

#[cfg(test)]
#[path = "face_octree_test.rs"]
mod face_octree_test;
