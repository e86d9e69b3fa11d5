//! PathCoord - root-to-cell path through an octree.
//!
//! A path is a sequence of 3-bit child selectors, one per level below the
//! root, packed into a `u64`. Level 0 is the root; a coordinate at level `n`
//! names the cell reached after following its first `n` selectors.

use crate::constants::{CORNER_OFFSETS, MAX_SUPPORTED_DEPTH};

/// Octree cell path - small copyable cursor.
///
/// Selector bits beyond `level` are always zero, so derived equality and
/// hashing only see the meaningful prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct PathCoord {
  /// Child selectors, 3 bits per level, level 1 in the lowest bits.
  path: u64,
  /// Number of valid selectors.
  level: u8,
}

impl PathCoord {
  /// The root cell.
  pub const ROOT: Self = Self { path: 0, level: 0 };

  /// Build a path from its selectors, outermost first.
  pub fn from_children(children: &[u8]) -> Self {
    let mut coord = Self::ROOT;
    for &child in children {
      coord.descend(child);
    }
    coord
  }

  /// Path to the cell at grid position `(x, y, z)` of a `2^level` grid.
  pub fn from_grid(x: u32, y: u32, z: u32, level: u8) -> Self {
    debug_assert!(level <= MAX_SUPPORTED_DEPTH);
    let mut coord = Self::ROOT;
    for l in (0..level).rev() {
      let bx = ((x >> l) & 1) as u8;
      let by = ((y >> l) & 1) as u8;
      let bz = ((z >> l) & 1) as u8;
      coord.descend(bx | by << 1 | bz << 2);
    }
    coord
  }

  /// Number of selectors (0 = root).
  #[inline]
  pub fn level(&self) -> u8 {
    self.level
  }

  /// Selector taken at depth `index` (0 = the root's child).
  ///
  /// Returns None past the current level.
  #[inline]
  pub fn child_at(&self, index: u8) -> Option<u8> {
    (index < self.level).then(|| ((self.path >> (3 * index as u32)) & 7) as u8)
  }

  /// Iterate selectors from the root down.
  pub fn children(&self) -> impl Iterator<Item = u8> + '_ {
    (0..self.level).filter_map(move |i| self.child_at(i))
  }

  /// Move to child `child` (0-7).
  ///
  /// # Panics
  /// Debug-asserts the child index and the depth limit.
  #[inline]
  pub fn descend(&mut self, child: u8) {
    debug_assert!(child < 8, "child selector must be 0-7");
    debug_assert!(self.level < MAX_SUPPORTED_DEPTH, "path depth limit exceeded");
    self.path |= ((child & 7) as u64) << (3 * self.level as u32);
    self.level += 1;
  }

  /// Move to the parent. Returns false at the root.
  #[inline]
  pub fn ascend(&mut self) -> bool {
    if self.level == 0 {
      return false;
    }
    self.level -= 1;
    self.path &= !(7u64 << (3 * self.level as u32));
    true
  }

  /// Child coordinate (copying).
  #[inline]
  pub fn child(&self, child: u8) -> Self {
    let mut coord = *self;
    coord.descend(child);
    coord
  }

  /// Parent coordinate. Returns None at the root.
  #[inline]
  pub fn parent(&self) -> Option<Self> {
    let mut coord = *self;
    coord.ascend().then_some(coord)
  }

  /// Cut the path back to `level` (no-op if already shallower).
  pub fn truncate(&mut self, level: u8) {
    while self.level > level {
      self.ascend();
    }
  }

  /// True if `other` lies strictly below this cell.
  pub fn is_ancestor_of(&self, other: &PathCoord) -> bool {
    if other.level <= self.level {
      return false;
    }
    let mask = (1u64 << (3 * self.level as u32)) - 1;
    other.path & mask == self.path
  }

  /// Grid position of the cell in the `2^level` grid of its level.
  pub fn grid_position(&self) -> [u32; 3] {
    let mut grid = [0u32; 3];
    for child in self.children() {
      let offset = CORNER_OFFSETS[child as usize];
      for axis in 0..3 {
        grid[axis] = grid[axis] << 1 | offset[axis] as u32;
      }
    }
    grid
  }
}

#[cfg(test)]
#[path = "coordinate_test.rs"]
mod coordinate_test;
