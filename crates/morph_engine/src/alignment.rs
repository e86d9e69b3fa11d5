//! Least-squares rigid alignment from anchor pairs.
//!
//! Anchors are first moved into each shape's local frame by subtracting the
//! shape's bounding-box center. With centroids `cs` and `ct` of the local
//! source and target anchors:
//!
//! ```text
//! M = Σ (t_i - ct)(s_i - cs)ᵀ = U W Vᵀ
//! R = U Vᵀ            (U column of the smallest singular value negated if det R < 0)
//! T = ct - R cs
//! ```
//!
//! The world transform is `p -> origin + offset + R (p - origin) + T` with
//! `origin` the source center and `offset` the center-to-center vector.

use glam::{DMat3, DQuat, DVec3};
use nalgebra::{Matrix3, Vector3};

use crate::error::MorphError;
use crate::types::AnchorPair;

/// Fewest anchor pairs that fix a rotation.
pub const MIN_ANCHORS: usize = 3;

/// Second singular value below this fraction of the first means the anchors
/// are collinear.
const DEGENERATE_RATIO: f64 = 1e-12;

/// Rotation about `origin` plus two translations, interpolable toward the
/// identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidTransform {
  /// Unit rotation with non-negative scalar part.
  pub rotation: DQuat,
  /// Translation fitted between the centered anchor sets.
  pub translation: DVec3,
  /// Target center minus source center.
  pub origin_offset: DVec3,
  /// Source center, the pivot of the rotation.
  pub origin: DVec3,
}

impl Default for RigidTransform {
  fn default() -> Self {
    Self::IDENTITY
  }
}

#[inline]
fn to_na(v: DVec3) -> Vector3<f64> {
  Vector3::new(v.x, v.y, v.z)
}

impl RigidTransform {
  pub const IDENTITY: Self = Self {
    rotation: DQuat::IDENTITY,
    translation: DVec3::ZERO,
    origin_offset: DVec3::ZERO,
    origin: DVec3::ZERO,
  };

  /// Fit the rigid motion carrying each anchor's `source` onto its `target`.
  pub fn from_anchors(
    anchors: &[AnchorPair],
    source_center: DVec3,
    target_center: DVec3,
  ) -> Result<Self, MorphError> {
    if anchors.len() < MIN_ANCHORS {
      return Err(MorphError::NotEnoughAnchors {
        required: MIN_ANCHORS,
        found: anchors.len(),
      });
    }

    let n = anchors.len() as f64;
    let local: Vec<(DVec3, DVec3)> = anchors
      .iter()
      .map(|a| (a.source - source_center, a.target - target_center))
      .collect();
    let cs = local.iter().map(|(s, _)| *s).sum::<DVec3>() / n;
    let ct = local.iter().map(|(_, t)| *t).sum::<DVec3>() / n;

    let mut m = Matrix3::<f64>::zeros();
    for (s, t) in &local {
      m += to_na(*t - ct) * to_na(*s - cs).transpose();
    }

    let svd = m.svd(true, true);
    let mut singular: Vec<(usize, f64)> = svd.singular_values.iter().copied().enumerate().collect();
    singular.sort_by(|a, b| b.1.total_cmp(&a.1));
    let (largest, middle, smallest) = (singular[0].1, singular[1].1, singular[2].0);
    if largest <= 0.0 || middle <= DEGENERATE_RATIO * largest {
      return Err(MorphError::DegenerateAnchors);
    }

    let mut u = svd.u.ok_or(MorphError::AlignmentFailed)?;
    let v_t = svd.v_t.ok_or(MorphError::AlignmentFailed)?;
    if (u * v_t).determinant() < 0.0 {
      u.column_mut(smallest).neg_mut();
    }
    let r = u * v_t;

    let matrix = DMat3::from_cols_slice(r.as_slice());
    let mut rotation = DQuat::from_mat3(&matrix).normalize();
    if rotation.w < 0.0 {
      rotation = -rotation;
    }

    Ok(Self {
      rotation,
      translation: ct - rotation * cs,
      origin_offset: target_center - source_center,
      origin: source_center,
    })
  }

  /// The transform scaled by `coefficient`: rotation slerped from identity,
  /// translations scaled linearly. 0 is the identity, 1 the full motion.
  pub fn interpolate(&self, coefficient: f64) -> Self {
    Self {
      rotation: DQuat::IDENTITY.slerp(self.rotation, coefficient),
      translation: self.translation * coefficient,
      origin_offset: self.origin_offset * coefficient,
      origin: self.origin,
    }
  }

  #[inline]
  pub fn rotation_matrix(&self) -> DMat3 {
    DMat3::from_quat(self.rotation)
  }

  #[inline]
  pub fn apply(&self, point: DVec3) -> DVec3 {
    self.origin + self.origin_offset + self.rotation * (point - self.origin) + self.translation
  }

  #[inline]
  pub fn apply_inverse(&self, point: DVec3) -> DVec3 {
    self.origin + self.rotation.inverse() * (point - self.origin - self.origin_offset - self.translation)
  }
}

#[cfg(test)]
#[path = "alignment_test.rs"]
mod alignment_test;
