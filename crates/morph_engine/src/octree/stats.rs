//! Counters reported by octree builds.

use std::time::Duration;

/// Statistics from one face octree or distance octree fill.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FillStats {
	/// Cells visited by the recursion.
	pub cells_visited: usize,
	/// Subdivisions performed (each adds 8 cells).
	pub subdivisions: usize,
	/// Cells left unrefined because no surface can cross them.
	pub skipped_cells: usize,
	/// Signed distance evaluations performed.
	pub distance_queries: usize,
	/// Distance lookups answered by the memo cache.
	pub cache_hits: usize,
	/// Wall time of the fill.
	pub elapsed: Duration,
}

impl FillStats {
	/// Cells allocated by the fill, root included.
	#[inline]
	pub fn cells_allocated(&self) -> usize {
		1 + self.subdivisions * 8
	}

	/// Fraction of distance lookups served from the cache.
	#[inline]
	pub fn cache_hit_rate(&self) -> f64 {
		let lookups = self.distance_queries + self.cache_hits;
		if lookups == 0 {
			0.0
		} else {
			self.cache_hits as f64 / lookups as f64
		}
	}

	/// Accumulate another fill's counters.
	pub fn merge(&mut self, other: &FillStats) {
		self.cells_visited += other.cells_visited;
		self.subdivisions += other.subdivisions;
		self.skipped_cells += other.skipped_cells;
		self.distance_queries += other.distance_queries;
		self.cache_hits += other.cache_hits;
		self.elapsed += other.elapsed;
	}
}
