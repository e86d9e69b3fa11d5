//! Triangle geometry: box overlap, pseudo-normals and signed distance.

pub mod distance;
pub mod normals;
pub mod tri_box;

pub use distance::{closest_point, signed_distance, ClosestPoint, Feature};
pub use normals::{AveragedNormals, EdgeKey};
pub use tri_box::triangle_box_overlap;
