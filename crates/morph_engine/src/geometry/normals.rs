//! Pseudo-normals for inside/outside classification.
//!
//! A point's nearest surface feature may be a face interior, an edge or a
//! vertex. Only the matching pseudo-normal gives a reliable sign:
//!
//! - face: the triangle's unit normal
//! - edge: sum of the normals of the faces sharing the edge
//! - vertex: sum of incident face normals weighted by the corner angle
//!
//! Bærentzen & Aanæs, "Signed distance computation using the angle weighted
//! pseudonormal", IEEE TVCG 2005.

use std::collections::HashMap;

use glam::DVec3;

use crate::types::TriMesh;

/// Unordered vertex pair naming a mesh edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeKey(u32, u32);

impl EdgeKey {
  #[inline]
  pub fn new(a: u32, b: u32) -> Self {
    if a <= b {
      Self(a, b)
    } else {
      Self(b, a)
    }
  }
}

/// Face, edge and vertex pseudo-normals of one mesh.
///
/// Degenerate (zero-area) faces get a zero normal and contribute nothing to
/// their edges and vertices.
#[derive(Clone, Debug, Default)]
pub struct AveragedNormals {
  face: Vec<DVec3>,
  vertex: Vec<DVec3>,
  edge: HashMap<EdgeKey, DVec3>,
}

impl AveragedNormals {
  pub fn new(mesh: &TriMesh) -> Self {
    let mut face = Vec::with_capacity(mesh.faces.len());
    let mut vertex = vec![DVec3::ZERO; mesh.vertices.len()];
    let mut edge: HashMap<EdgeKey, DVec3> = HashMap::with_capacity(mesh.faces.len() * 3 / 2);

    for (f, &indices) in mesh.faces.iter().enumerate() {
      let [a, b, c] = mesh.triangle(f);
      let normal = (b - a)
        .normalize_or_zero()
        .cross((c - a).normalize_or_zero())
        .normalize_or_zero();
      face.push(normal);

      // Every edge gets an entry, even next to degenerate faces
      for (i, j) in [(0, 1), (1, 2), (0, 2)] {
        *edge
          .entry(EdgeKey::new(indices[i], indices[j]))
          .or_insert(DVec3::ZERO) += normal;
      }

      if normal == DVec3::ZERO {
        continue;
      }
      let corners = [a, b, c];
      for k in 0..3 {
        let p = corners[k];
        let u = corners[(k + 1) % 3] - p;
        let v = corners[(k + 2) % 3] - p;
        vertex[indices[k] as usize] += normal * u.angle_between(v);
      }
    }

    Self { face, vertex, edge }
  }

  /// Unit normal of a face (zero for a degenerate face).
  #[inline]
  pub fn face(&self, face: usize) -> DVec3 {
    self.face[face]
  }

  /// Angle-weighted normal of a vertex (not normalized).
  #[inline]
  pub fn vertex(&self, vertex: u32) -> DVec3 {
    self.vertex[vertex as usize]
  }

  /// Summed normal of the faces sharing an edge (not normalized).
  ///
  /// Every edge of the mesh this set was built from has an entry.
  #[inline]
  pub fn edge(&self, a: u32, b: u32) -> Option<DVec3> {
    self.edge.get(&EdgeKey::new(a, b)).copied()
  }

  /// Number of distinct edges.
  pub fn edge_count(&self) -> usize {
    self.edge.len()
  }
}
