//! Error type for mesh morphing.

use crate::types::SourceSlot;

/// Errors surfaced by the morph engine and its builders.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum MorphError {
  /// A result was requested from a slot that has no source mesh.
  #[error("no source mesh set for {0:?}")]
  NotInitialized(SourceSlot),

  /// A source mesh has no triangles.
  #[error("a source mesh must contain at least one triangle")]
  EmptyMesh,

  /// A face references a vertex past the end of the vertex buffer.
  #[error("face {face} references vertex {index} but the mesh has {vertex_count} vertices")]
  InvalidFaceIndex {
    /// Offending face.
    face: usize,
    /// Vertex index stored in the face.
    index: u32,
    /// Number of vertices in the mesh.
    vertex_count: usize,
  },

  /// The mesh bounding box has zero extent.
  #[error("mesh bounding box is degenerate")]
  DegenerateBounds,

  /// The build was cancelled through its [`CancelToken`](crate::CancelToken).
  #[error("build cancelled")]
  Cancelled,

  /// The blend coefficient is NaN or infinite.
  #[error("blend coefficient {0} is not finite")]
  InvalidCoefficient(f64),

  /// Too few anchor pairs to solve for a rotation.
  #[error("rigid alignment needs at least {required} anchor pairs, got {found}")]
  NotEnoughAnchors {
    /// Minimum number of pairs.
    required: usize,
    /// Pairs supplied.
    found: usize,
  },

  /// Anchor points are coincident or collinear.
  #[error("anchor points are degenerate (coincident or collinear)")]
  DegenerateAnchors,

  /// The singular value decomposition did not produce both bases.
  #[error("singular value decomposition failed")]
  AlignmentFailed,

  /// A configuration value is out of range.
  #[error("invalid configuration: {0}")]
  InvalidConfig(&'static str),
}

/// Coplanar patch the polygon optimizer could not rebuild.
///
/// The optimizer keeps the patch's original triangles and reports the issue.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum PolygonError {
  /// The merged outline encloses holes.
  #[error("coplanar set {set} has {holes} hole(s)")]
  Holes {
    /// Coplanar set index.
    set: usize,
    /// Number of inner loops.
    holes: usize,
  },

  /// No valid ear was found within the retry budget.
  #[error("ear clipping stalled on a {vertices}-vertex polygon in coplanar set {set}")]
  EarClippingStalled {
    /// Coplanar set index.
    set: usize,
    /// Vertices left in the ring.
    vertices: usize,
  },

  /// Boundary edges do not close into loops.
  #[error("coplanar set {set} has an open or non-manifold boundary")]
  OpenBoundary {
    /// Coplanar set index.
    set: usize,
  },

  /// The rebuilt triangles do not cover the same area as the originals.
  #[error("retriangulating coplanar set {set} changed its area")]
  AreaMismatch {
    /// Coplanar set index.
    set: usize,
  },
}
