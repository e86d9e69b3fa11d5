//! Coplanar patch optimizer.
//!
//! Marching cubes tiles flat regions with many small triangles. This pass
//! groups triangles by plane and rebuilds each group from its outline:
//!
//! ```text
//! triangles ─► plane tree ─► coplanar sets
//!                               │  (one rayon task per set)
//!                               ▼
//!   ≤ 2 triangles      ─► emitted as is, wound along the plane normal
//!   otherwise:
//!     weld vertices, cancel interior edges (each shared edge appears twice
//!     with opposite directions), merge collinear boundary edges, walk the
//!     rest into loops, drop collinear loop vertices, project to 2D,
//!     reject holes, ear clip each loop
//! ```
//!
//! A set that cannot be rebuilt keeps its original triangles and is reported
//! as a [`PolygonError`].

use std::collections::{BTreeMap, HashMap};

use glam::{DVec2, DVec3};
use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::plane_tree::{Plane, PlaneTree};
use super::triangulate::{ear_clip, point_in_polygon, project, signed_area2};
use super::Welder;
use crate::error::PolygonError;
use crate::types::MorphConfig;

/// Triangle by corner positions.
pub type Triangle = [DVec3; 3];

/// Sine of the largest angle still treated as a straight continuation.
const COLLINEAR_SINE: f64 = 1e-9;

/// Relative area change tolerated when a set is rebuilt.
const AREA_TOLERANCE: f64 = 1e-6;

/// Counters from one optimizer run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptimizeReport {
  pub input_triangles: usize,
  pub output_triangles: usize,
  /// Zero-area input triangles, dropped.
  pub degenerate_triangles: usize,
  pub coplanar_sets: usize,
  /// Sets replaced by a retriangulated outline.
  pub rebuilt_sets: usize,
  /// Sets kept as is because they could not be rebuilt.
  pub issues: Vec<PolygonError>,
}

impl OptimizeReport {
  /// Report for output that skipped optimization.
  pub fn passthrough(triangles: usize) -> Self {
    Self {
      input_triangles: triangles,
      output_triangles: triangles,
      ..Default::default()
    }
  }
}

enum SetOutcome {
  Kept(Vec<Triangle>),
  Rebuilt(Vec<Triangle>),
  Failed(PolygonError, Vec<Triangle>),
}

/// Merge coplanar triangles into polygons and retriangulate them.
#[cfg_attr(feature = "instrument", tracing::instrument(skip_all, name = "marching_cubes::optimize"))]
pub fn optimize(triangles: &[Triangle], config: &MorphConfig) -> (Vec<Triangle>, OptimizeReport) {
  let mut report = OptimizeReport {
    input_triangles: triangles.len(),
    ..Default::default()
  };

  let mut tree = PlaneTree::new(config.plane_angular_tolerance, config.plane_linear_tolerance);
  for (index, triangle) in triangles.iter().enumerate() {
    match Plane::from_triangle(triangle) {
      Some(plane) => {
        tree.insert(plane, index);
      }
      None => report.degenerate_triangles += 1,
    }
  }
  let sets = tree.into_sets();
  report.coplanar_sets = sets.len();

  let outcomes: Vec<SetOutcome> = sets
    .par_iter()
    .enumerate()
    .map(|(set, (plane, members))| {
      optimize_set(set, plane, members, triangles, config.weld_tolerance)
    })
    .collect();

  let mut output = Vec::with_capacity(triangles.len());
  for outcome in outcomes {
    match outcome {
      SetOutcome::Kept(kept) => output.extend(kept),
      SetOutcome::Rebuilt(rebuilt) => {
        report.rebuilt_sets += 1;
        output.extend(rebuilt);
      }
      SetOutcome::Failed(error, kept) => {
        warn!(%error, "keeping original triangles");
        report.issues.push(error);
        output.extend(kept);
      }
    }
  }
  report.output_triangles = output.len();

  debug!(
    input = report.input_triangles,
    output = report.output_triangles,
    sets = report.coplanar_sets,
    rebuilt = report.rebuilt_sets,
    issues = report.issues.len(),
    "polygon optimization done"
  );
  (output, report)
}

/// Wind a triangle so its normal agrees with `normal`.
#[inline]
fn wind_along(triangle: Triangle, normal: DVec3) -> Triangle {
  let [a, b, c] = triangle;
  if (b - a).cross(c - a).dot(normal) < 0.0 {
    [a, c, b]
  } else {
    triangle
  }
}

fn optimize_set(
  set: usize,
  plane: &Plane,
  members: &[usize],
  triangles: &[Triangle],
  weld_tolerance: f64,
) -> SetOutcome {
  let originals = || -> Vec<Triangle> {
    members
      .iter()
      .map(|&i| wind_along(triangles[i], plane.normal))
      .collect()
  };

  if members.len() <= 2 {
    return SetOutcome::Kept(originals());
  }

  match rebuild(set, plane, members, triangles, weld_tolerance) {
    Ok(rebuilt) => SetOutcome::Rebuilt(rebuilt),
    Err(error) => SetOutcome::Failed(error, originals()),
  }
}

fn area(triangle: &Triangle) -> f64 {
  let [a, b, c] = *triangle;
  (b - a).cross(c - a).length() * 0.5
}

/// Boundary edges keyed by unordered vertex pair. The value counts
/// `min -> max` traversals minus `max -> min` traversals.
#[derive(Default)]
struct EdgeSet(BTreeMap<(u32, u32), i32>);

impl EdgeSet {
  fn add(&mut self, from: u32, to: u32) {
    let (key, step) = if from < to {
      ((from, to), 1)
    } else {
      ((to, from), -1)
    };
    let net = self.0.entry(key).or_insert(0);
    *net += step;
    if *net == 0 {
      self.0.remove(&key);
    }
  }

  fn remove(&mut self, from: u32, to: u32) {
    self.add(to, from);
  }

  fn is_manifold(&self) -> bool {
    self.0.values().all(|net| net.abs() == 1)
  }

  fn directed(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
    self
      .0
      .iter()
      .map(|(&(a, b), &net)| if net > 0 { (a, b) } else { (b, a) })
  }

  fn len(&self) -> usize {
    self.0.len()
  }
}

#[inline]
fn collinear(u: DVec3, v: DVec3, w: DVec3) -> bool {
  let a = v - u;
  let b = w - v;
  a.cross(b).length() <= COLLINEAR_SINE * a.length() * b.length()
}

/// Merge pairs `u -> v -> w` of collinear boundary edges into `u -> w`.
///
/// Fold-backs (w on the segment back towards u) always merge. Straight
/// continuations merge only where v has no other boundary edges.
fn merge_collinear(edges: &mut EdgeSet, points: &[DVec3]) {
  loop {
    let mut incoming: HashMap<u32, SmallVec<[u32; 2]>> = HashMap::new();
    let mut outgoing: HashMap<u32, SmallVec<[u32; 2]>> = HashMap::new();
    for (u, v) in edges.directed() {
      outgoing.entry(u).or_default().push(v);
      incoming.entry(v).or_default().push(u);
    }

    let mut vertices: Vec<u32> = outgoing.keys().copied().collect();
    vertices.sort_unstable();

    let merge = vertices.into_iter().find_map(|v| {
      let ins = incoming.get(&v)?;
      let outs = outgoing.get(&v)?;
      let through = ins.len() == 1 && outs.len() == 1;
      ins.iter().find_map(|&u| {
        outs.iter().find_map(|&w| {
          let (pu, pv, pw) = (points[u as usize], points[v as usize], points[w as usize]);
          if !collinear(pu, pv, pw) {
            return None;
          }
          let folds = (pu - pv).dot(pw - pv) > 0.0;
          (folds || through).then_some((u, v, w))
        })
      })
    });

    match merge {
      Some((u, v, w)) => {
        edges.remove(u, v);
        edges.remove(v, w);
        edges.add(u, w);
      }
      None => return,
    }
  }
}

/// Follow directed edges into closed loops.
fn walk_loops(set: usize, edges: &EdgeSet) -> Result<Vec<Vec<u32>>, PolygonError> {
  let mut outgoing: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
  for (u, v) in edges.directed() {
    outgoing.entry(u).or_default().push(v);
  }

  let mut loops = Vec::new();
  let budget = edges.len();
  while let Some(start) = outgoing
    .iter()
    .find_map(|(&u, outs)| (!outs.is_empty()).then_some(u))
  {
    let mut ring = vec![start];
    let mut cursor = start;
    loop {
      let next = outgoing
        .get_mut(&cursor)
        .and_then(Vec::pop)
        .ok_or(PolygonError::OpenBoundary { set })?;
      if next == start {
        break;
      }
      if ring.len() > budget {
        return Err(PolygonError::OpenBoundary { set });
      }
      ring.push(next);
      cursor = next;
    }
    loops.push(ring);
  }
  Ok(loops)
}

/// Remove loop vertices lying on the straight line through their neighbours.
fn strip_collinear(ring: &mut Vec<u32>, points: &[DVec3]) {
  let mut i = 0;
  let mut stale = 0;
  while ring.len() >= 3 && stale < ring.len() {
    let n = ring.len();
    let prev = points[ring[(i + n - 1) % n] as usize];
    let cur = points[ring[i % n] as usize];
    let next = points[ring[(i + 1) % n] as usize];
    if collinear(prev, cur, next) {
      ring.remove(i % n);
      stale = 0;
    } else {
      i = (i + 1) % n;
      stale += 1;
    }
  }
}

fn bounds_2d(points: &[DVec2]) -> (DVec2, DVec2) {
  points.iter().fold(
    (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
    |(min, max), &p| (min.min(p), max.max(p)),
  )
}

fn rebuild(
  set: usize,
  plane: &Plane,
  members: &[usize],
  triangles: &[Triangle],
  weld_tolerance: f64,
) -> Result<Vec<Triangle>, PolygonError> {
  let mut welder = Welder::new(weld_tolerance);
  let mut edges = EdgeSet::default();
  let mut input_area = 0.0;
  for &index in members {
    let triangle = wind_along(triangles[index], plane.normal);
    input_area += area(&triangle);
    let [a, b, c] = triangle.map(|p| welder.index(p));
    if a == b || b == c || a == c {
      continue;
    }
    edges.add(a, b);
    edges.add(b, c);
    edges.add(c, a);
  }
  if !edges.is_manifold() {
    return Err(PolygonError::OpenBoundary { set });
  }

  let points = welder.into_points();
  merge_collinear(&mut edges, &points);
  if !edges.is_manifold() {
    return Err(PolygonError::OpenBoundary { set });
  }

  let mut loops = walk_loops(set, &edges)?;
  for ring in &mut loops {
    strip_collinear(ring, &points);
  }
  loops.retain(|ring| ring.len() >= 3);

  let projected: Vec<Vec<DVec2>> = loops
    .iter()
    .map(|ring| {
      let ring3: Vec<DVec3> = ring.iter().map(|&i| points[i as usize]).collect();
      project(&ring3, plane.normal)
    })
    .collect();

  let (outer, inner): (Vec<usize>, Vec<usize>) =
    (0..loops.len()).partition(|&i| signed_area2(&projected[i]) > 0.0);
  if !inner.is_empty() {
    let nested = inner
      .iter()
      .filter(|&&hole| {
        let probe = projected[hole][0];
        outer.iter().any(|&o| {
          let (min, max) = bounds_2d(&projected[o]);
          probe.cmpge(min).all() && probe.cmple(max).all() && point_in_polygon(probe, &projected[o])
        })
      })
      .count();
    debug!(set, loops = loops.len(), nested, "coplanar set has inner loops");
    return Err(PolygonError::Holes {
      set,
      holes: inner.len(),
    });
  }

  let mut output = Vec::new();
  for &o in &outer {
    let ring = &loops[o];
    let clipped = ear_clip(&projected[o]).ok_or(PolygonError::EarClippingStalled {
      set,
      vertices: ring.len(),
    })?;
    output.extend(
      clipped
        .into_iter()
        .map(|tri| tri.map(|k| points[ring[k] as usize])),
    );
  }

  let output_area: f64 = output.iter().map(area).sum();
  if (output_area - input_area).abs() > AREA_TOLERANCE * input_area.max(f64::MIN_POSITIVE) {
    return Err(PolygonError::AreaMismatch { set });
  }
  Ok(output)
}

#[cfg(test)]
#[path = "polygon_test.rs"]
mod polygon_test;
