//! morph_engine - shape morphing through adaptive distance fields
//!
//! Two triangle meshes become a family of in-between meshes. Each source is
//! indexed by a face octree, sampled into an adaptive signed distance octree,
//! and the blended field is turned back into triangles by marching cubes.
//! Caller-supplied anchor pairs drive a least-squares rigid alignment that
//! moves the in-between shapes from one source to the other.
//!
//! # Modules
//!
//! - [`octree`]: arena octree, boxes and path coordinates
//! - [`geometry`]: triangle/box overlap, pseudo-normals, signed distance
//! - [`face_octree`]: per-cell candidate triangle lists
//! - [`adf`]: adaptive distance field octree
//! - [`marching_cubes`]: surface extraction and coplanar polygon optimization
//! - [`alignment`]: SVD rigid fit from anchor pairs
//! - [`morph`]: the engine tying sources, alignment and results together
//!
//! # Example
//!
//! ```ignore
//! use morph_engine::{MorphConfig, MorphEngine};
//!
//! let mut engine = MorphEngine::new(MorphConfig::default())?;
//! engine.set_mesh1(&first)?;
//! engine.set_mesh2(&second)?;
//!
//! let halfway = engine.result_mesh(0.5)?;
//! println!("{} triangles", halfway.triangle_count());
//! ```

pub mod adf;
pub mod alignment;
pub mod cancel;
pub mod constants;
pub mod edge_table;
pub mod error;
pub mod face_octree;
pub mod geometry;
pub mod marching_cubes;
pub mod morph;
pub mod octree;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export commonly used items
pub use adf::{AdfOctree, DistanceSampler};
pub use alignment::RigidTransform;
pub use cancel::CancelToken;
pub use error::{MorphError, PolygonError};
pub use face_octree::FaceOctree;
pub use marching_cubes::OptimizeReport;
pub use morph::{MeshMorpher, MorphEngine};
pub use octree::{DAabb3, FillStats, PathCoord};
pub use types::{AnchorPair, MeshSource, MorphConfig, MorphingMode, SourceSlot, TriMesh};
