//! Generic arena octree with a fixed depth bound.
//!
//! Cells live in a single `Vec` and refer to each other by index. A cell is
//! either a leaf or owns exactly 8 children allocated together, so a cell's
//! children are `first_child..first_child + 8`. The parent link is a plain
//! index used for upward walks; the arena owns every cell and frees them all
//! on [`Octree::reset`] or drop.
//!
//! # Module Structure
//!
//! - [`bounds`]: `DAabb3` - root box and derived child boxes
//! - [`coordinate`]: `PathCoord` - root-to-cell selector path
//! - [`stats`]: `FillStats` - counters reported by octree builds

pub mod bounds;
pub mod coordinate;
pub mod stats;

// Re-exports
pub use bounds::DAabb3;
pub use coordinate::PathCoord;
pub use stats::FillStats;

/// Index of a cell in its octree arena.
pub type CellId = usize;

/// Index of the root cell.
pub const ROOT: CellId = 0;

/// One octree cell.
#[derive(Clone, Debug)]
pub struct Cell<T> {
  /// Payload stored on the cell.
  pub value: T,
  parent: Option<CellId>,
  first_child: Option<CellId>,
  /// Which child of the parent this cell is (0 for the root).
  octant: u8,
  depth: u8,
}

impl<T> Cell<T> {
  #[inline]
  pub fn parent(&self) -> Option<CellId> {
    self.parent
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.first_child.is_none()
  }

  #[inline]
  pub fn octant(&self) -> u8 {
    self.octant
  }

  #[inline]
  pub fn depth(&self) -> u8 {
    self.depth
  }
}

/// Depth-bounded octree over a fixed box, generic over the cell payload.
///
/// New cells start from `T::default()`.
#[derive(Clone, Debug)]
pub struct Octree<T> {
  cells: Vec<Cell<T>>,
  bounds: DAabb3,
  max_depth: u8,
}

impl<T: Default> Octree<T> {
  /// Create a tree holding only the root cell.
  pub fn new(bounds: DAabb3, max_depth: u8) -> Self {
    let mut tree = Self {
      cells: Vec::new(),
      bounds,
      max_depth,
    };
    tree.reset();
    tree
  }

  /// Drop every cell and start over from a default root.
  pub fn reset(&mut self) {
    self.cells.clear();
    self.cells.push(Cell {
      value: T::default(),
      parent: None,
      first_child: None,
      octant: 0,
      depth: 0,
    });
  }

  /// Split a leaf into 8 children and return the first child's id.
  ///
  /// Subdividing a cell that already has children returns the existing ones.
  ///
  /// # Panics
  /// Debug-asserts that the cell is above `max_depth`.
  pub fn subdivide(&mut self, id: CellId) -> CellId {
    if let Some(first) = self.cells[id].first_child {
      return first;
    }
    let depth = self.cells[id].depth + 1;
    debug_assert!(depth <= self.max_depth, "subdivide past max_depth");

    let first = self.cells.len();
    self.cells.reserve(8);
    for octant in 0..8 {
      self.cells.push(Cell {
        value: T::default(),
        parent: Some(id),
        first_child: None,
        octant,
        depth,
      });
    }
    self.cells[id].first_child = Some(first);
    first
  }
}

impl<T> Octree<T> {
  #[inline]
  pub fn bounds(&self) -> &DAabb3 {
    &self.bounds
  }

  #[inline]
  pub fn max_depth(&self) -> u8 {
    self.max_depth
  }

  /// Total number of cells, internal and leaf.
  #[inline]
  pub fn len(&self) -> usize {
    self.cells.len()
  }

  /// Always false: the root exists for the tree's whole life.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  #[inline]
  pub fn cell(&self, id: CellId) -> &Cell<T> {
    &self.cells[id]
  }

  #[inline]
  pub fn value(&self, id: CellId) -> &T {
    &self.cells[id].value
  }

  #[inline]
  pub fn value_mut(&mut self, id: CellId) -> &mut T {
    &mut self.cells[id].value
  }

  #[inline]
  pub fn parent(&self, id: CellId) -> Option<CellId> {
    self.cells[id].parent
  }

  /// Child `octant` of a cell, None for a leaf.
  #[inline]
  pub fn child(&self, id: CellId, octant: usize) -> Option<CellId> {
    debug_assert!(octant < 8);
    self.cells[id].first_child.map(|first| first + octant)
  }

  /// All 8 children of a cell, None for a leaf.
  #[inline]
  pub fn children(&self, id: CellId) -> Option<[CellId; 8]> {
    self.cells[id]
      .first_child
      .map(|first| std::array::from_fn(|i| first + i))
  }

  /// Follow `coord` from the root as far as children exist.
  ///
  /// Returns the cell reached, which is shallower than `coord` when the path
  /// runs into a leaf.
  pub fn navigate(&self, coord: &PathCoord) -> CellId {
    let mut id = ROOT;
    for octant in coord.children() {
      match self.child(id, octant as usize) {
        Some(child) => id = child,
        None => break,
      }
    }
    id
  }

  /// Deepest cell whose box contains `point`, or the root when the point is
  /// outside the tree.
  pub fn locate(&self, point: glam::DVec3) -> CellId {
    let mut id = ROOT;
    let mut bounds = self.bounds;
    if !bounds.contains_point(point) {
      return id;
    }
    while let Some(first) = self.cells[id].first_child {
      let center = bounds.center();
      let octant = (point.x >= center.x) as usize
        | ((point.y >= center.y) as usize) << 1
        | ((point.z >= center.z) as usize) << 2;
      id = first + octant;
      bounds = bounds.child(octant);
    }
    id
  }

  /// Path from the root to a cell.
  pub fn coordinate(&self, id: CellId) -> PathCoord {
    let mut octants = smallvec::SmallVec::<[u8; 16]>::new();
    let mut cursor = id;
    while let Some(parent) = self.cells[cursor].parent {
      octants.push(self.cells[cursor].octant);
      cursor = parent;
    }
    octants.reverse();
    PathCoord::from_children(&octants)
  }

  /// Box of a cell, derived from the root box by repeated halving.
  pub fn cell_bounds(&self, id: CellId) -> DAabb3 {
    self
      .coordinate(id)
      .children()
      .fold(self.bounds, |bounds, octant| bounds.child(octant as usize))
  }

  /// Visit every leaf depth-first with its box and path.
  pub fn for_each_leaf(&self, mut visit: impl FnMut(CellId, &DAabb3, &PathCoord)) {
    self.visit_leaves(ROOT, self.bounds, PathCoord::ROOT, &mut visit);
  }

  fn visit_leaves(
    &self,
    id: CellId,
    bounds: DAabb3,
    coord: PathCoord,
    visit: &mut impl FnMut(CellId, &DAabb3, &PathCoord),
  ) {
    match self.children(id) {
      None => visit(id, &bounds, &coord),
      Some(children) => {
        for (octant, child) in children.into_iter().enumerate() {
          self.visit_leaves(child, bounds.child(octant), coord.child(octant as u8), visit);
        }
      }
    }
  }

  /// Number of leaf cells.
  pub fn leaf_count(&self) -> usize {
    self.cells.iter().filter(|c| c.is_leaf()).count()
  }
}
