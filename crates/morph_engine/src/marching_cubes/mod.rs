//! Marching cubes surface extraction from a distance octree.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ leaves of the distance octree (depth-first)                      │
//! │   case index from corner signs, skip 0 and 255                   │
//! │   edge vertices by linear interpolation on crossed edges         │
//! │   up to 5 triangles from the case table                          │
//! └──────────────────────────────────────────────────────────────────┘
//!                                │ triangle soup
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ polygon optimizer (optional): coplanar sets -> outlines -> ears  │
//! └──────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ weld: shared vertices within weld tolerance, drop collapsed faces│
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inside is negative. Output triangles wind counter-clockwise seen from
//! outside.

pub mod plane_tree;
pub mod polygon;
pub mod triangulate;

use std::collections::HashMap;

use glam::DVec3;
use tracing::debug;
use web_time::Instant;

use crate::adf::AdfOctree;
use crate::edge_table::{case_index, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use crate::octree::DAabb3;
use crate::types::{MorphConfig, TriMesh};

pub use polygon::{optimize, OptimizeReport, Triangle};

/// Merges points that fall in the same `tolerance`-sized grid slot.
pub(crate) struct Welder {
  inverse: f64,
  lookup: HashMap<[i64; 3], u32>,
  points: Vec<DVec3>,
}

impl Welder {
  pub(crate) fn new(tolerance: f64) -> Self {
    Self {
      inverse: 1.0 / tolerance,
      lookup: HashMap::new(),
      points: Vec::new(),
    }
  }

  /// Index of the welded point for `p`, adding it if new.
  pub(crate) fn index(&mut self, p: DVec3) -> u32 {
    let key = (p * self.inverse).round().to_array().map(|c| c as i64);
    let points = &mut self.points;
    *self.lookup.entry(key).or_insert_with(|| {
      points.push(p);
      points.len() as u32 - 1
    })
  }

  pub(crate) fn into_points(self) -> Vec<DVec3> {
    self.points
  }
}

/// Zero crossing on the edge `p0 -> p1`.
#[inline]
fn edge_vertex(p0: DVec3, p1: DVec3, d0: f64, d1: f64) -> DVec3 {
  let denom = d0 - d1;
  let t = if denom != 0.0 {
    (d0 / denom).clamp(0.0, 1.0)
  } else {
    0.5
  };
  p0 + (p1 - p0) * t
}

/// Triangulate one cell. Returns the number of triangles appended.
pub fn polygonize_cell(bounds: &DAabb3, corners: &[f64; 8], out: &mut Vec<Triangle>) -> usize {
  let case = case_index(corners);
  let edge_mask = EDGE_TABLE[case];
  if edge_mask == 0 {
    return 0;
  }

  let mut vertices = [DVec3::ZERO; 12];
  for (edge, [c0, c1]) in EDGE_CORNERS.iter().enumerate() {
    if edge_mask & (1 << edge) != 0 {
      let (c0, c1) = (*c0 as usize, *c1 as usize);
      vertices[edge] = edge_vertex(bounds.corner(c0), bounds.corner(c1), corners[c0], corners[c1]);
    }
  }

  let row = &TRI_TABLE[case];
  let mut emitted = 0;
  for tri in row.chunks_exact(3) {
    if tri[0] < 0 {
      break;
    }
    // Table triangles face the inside corners
    out.push([
      vertices[tri[0] as usize],
      vertices[tri[2] as usize],
      vertices[tri[1] as usize],
    ]);
    emitted += 1;
  }
  emitted
}

/// Weld a triangle soup into an indexed mesh, dropping collapsed triangles.
pub fn weld(triangles: &[Triangle], tolerance: f64) -> TriMesh {
  let mut welder = Welder::new(tolerance);
  let mut faces = Vec::with_capacity(triangles.len());
  for triangle in triangles {
    let [a, b, c] = triangle.map(|p| welder.index(p));
    if a != b && b != c && a != c {
      faces.push([a, b, c]);
    }
  }
  TriMesh {
    vertices: welder.into_points(),
    faces,
  }
}

/// Raw marching cubes triangles for every leaf of `adf`.
pub fn polygonize(adf: &AdfOctree) -> Vec<Triangle> {
  let mut triangles = Vec::new();
  adf.tree().for_each_leaf(|id, bounds, _| {
    polygonize_cell(bounds, adf.corner_distances(id), &mut triangles);
  });
  triangles
}

/// Extract, optionally optimize, and weld the zero surface of `adf`.
#[cfg_attr(feature = "instrument", tracing::instrument(skip_all, name = "marching_cubes::extract"))]
pub fn extract(adf: &AdfOctree, config: &MorphConfig) -> (TriMesh, OptimizeReport) {
  let start = Instant::now();
  let raw = polygonize(adf);

  let (triangles, report) = if config.optimize_polygons {
    optimize(&raw, config)
  } else {
    let count = raw.len();
    (raw, OptimizeReport::passthrough(count))
  };

  let mesh = weld(&triangles, config.weld_tolerance);
  debug!(
    leaves = adf.tree().leaf_count(),
    raw = report.input_triangles,
    faces = mesh.faces.len(),
    vertices = mesh.vertices.len(),
    elapsed_us = start.elapsed().as_micros() as u64,
    "surface extracted"
  );
  (mesh, report)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
