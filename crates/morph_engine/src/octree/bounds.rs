//! Axis-aligned bounding box in double precision.

use glam::DVec3;

use crate::constants::CORNER_OFFSETS;

/// Double-precision axis-aligned bounding box.
///
/// Octrees own only their root box; every cell box is derived on demand with
/// [`DAabb3::child`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DAabb3 {
	/// Minimum corner (inclusive).
	pub min: DVec3,
	/// Maximum corner (inclusive).
	pub max: DVec3,
}

impl DAabb3 {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: DVec3, max: DVec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Create a new AABB from center and half-extents.
	pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
		Self {
			min: center - half_extents,
			max: center + half_extents,
		}
	}

	/// Smallest box containing all points, `None` when there are none.
	pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
		let mut iter = points.into_iter();
		let first = iter.next()?;
		let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
		Some(Self { min, max })
	}

	/// Cube centered on this box, large enough that a grid of `resolution`
	/// cells per axis leaves half a cell of margin on every side.
	///
	/// The box's largest extent spans `resolution - 1` cells of the cube.
	pub fn padded_cube(&self, resolution: u32) -> Self {
		let n = resolution.max(2) as f64;
		let half = self.size().max_element() * 0.5 * n / (n - 1.0);
		Self::from_center_half_extents(self.center(), DVec3::splat(half))
	}

	/// Box of child `i` (bit 0 = +X half, bit 1 = +Y half, bit 2 = +Z half).
	#[inline]
	pub fn child(&self, i: usize) -> Self {
		let center = self.center();
		let [x, y, z] = CORNER_OFFSETS[i];
		let min = DVec3::new(
			if x == 1 { center.x } else { self.min.x },
			if y == 1 { center.y } else { self.min.y },
			if z == 1 { center.z } else { self.min.z },
		);
		let max = DVec3::new(
			if x == 1 { self.max.x } else { center.x },
			if y == 1 { self.max.y } else { center.y },
			if z == 1 { self.max.z } else { center.z },
		);
		Self { min, max }
	}

	/// Corner `i` in binary ZYX order.
	#[inline]
	pub fn corner(&self, i: usize) -> DVec3 {
		let [x, y, z] = CORNER_OFFSETS[i];
		self.lattice_point([x * 2, y * 2, z * 2])
	}

	/// Point of the 3×3×3 lattice spanned by min, center and max
	/// (0 = min, 1 = center, 2 = max per axis).
	#[inline]
	pub fn lattice_point(&self, lattice: [u8; 3]) -> DVec3 {
		let center = self.center();
		let pick = |l: u8, min: f64, mid: f64, max: f64| match l {
			0 => min,
			1 => mid,
			_ => max,
		};
		DVec3::new(
			pick(lattice[0], self.min.x, center.x, self.max.x),
			pick(lattice[1], self.min.y, center.y, self.max.y),
			pick(lattice[2], self.min.z, center.z, self.max.z),
		)
	}

	/// Check if this AABB overlaps with another.
	///
	/// Two AABBs overlap if they share any interior or boundary points.
	#[inline]
	pub fn overlaps(&self, other: &DAabb3) -> bool {
		self.min.x <= other.max.x
			&& self.max.x >= other.min.x
			&& self.min.y <= other.max.y
			&& self.max.y >= other.min.y
			&& self.min.z <= other.max.z
			&& self.max.z >= other.min.z
	}

	/// Check if this AABB contains a point.
	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	/// Nearest point of the box to `point`.
	#[inline]
	pub fn clamp_point(&self, point: DVec3) -> DVec3 {
		point.clamp(self.min, self.max)
	}

	/// Squared distance from `point` to the box (zero inside).
	#[inline]
	pub fn distance_squared(&self, point: DVec3) -> f64 {
		point.distance_squared(self.clamp_point(point))
	}

	/// Smallest box containing both boxes.
	pub fn union(&self, other: &DAabb3) -> Self {
		Self {
			min: self.min.min(other.min),
			max: self.max.max(other.max),
		}
	}

	/// Get the size of the AABB (max - min).
	#[inline]
	pub fn size(&self) -> DVec3 {
		self.max - self.min
	}

	/// Get the center of the AABB.
	#[inline]
	pub fn center(&self) -> DVec3 {
		(self.min + self.max) * 0.5
	}

	/// Length of the main diagonal.
	#[inline]
	pub fn diagonal(&self) -> f64 {
		self.size().length()
	}
}
