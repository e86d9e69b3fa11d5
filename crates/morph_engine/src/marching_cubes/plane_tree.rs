//! Grouping of nearly coplanar triangles.
//!
//! An unbalanced binary search tree keyed by oriented plane equation
//! (Salesin & Tampieri, "Grouping Nearly Coplanar Polygons into Coplanar
//! Sets", Graphics Gems III). Nodes are compared by normal direction first
//! and, for parallel normals, by offset along the normal:
//!
//! ```text
//! cos = n_node · n_new
//! cos >= cos(angular tolerance)  -> parallel: compare offsets
//!   |d_new - d_node| <= linear   -> same set
//!   d_new < d_node               -> left
//!   else                         -> right
//! cos < -0.5                     -> left
//! else                           -> right
//! ```
//!
//! The direction branch splits at -0.5 so perpendicular planes (cos = 0, the
//! usual neighbour on axis-aligned surfaces) never sit on the threshold.

use std::cmp::Ordering;

use glam::DVec3;

/// Oriented plane `normal · p = offset` with a unit normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
  pub normal: DVec3,
  pub offset: f64,
}

impl Plane {
  /// Plane of a triangle, oriented by its winding. `None` if degenerate.
  pub fn from_triangle(triangle: &[DVec3; 3]) -> Option<Self> {
    let [a, b, c] = *triangle;
    let normal = (b - a).cross(c - a).try_normalize()?;
    let offset = normal.dot((a + b + c) / 3.0);
    Some(Self { normal, offset })
  }
}

#[derive(Clone, Debug)]
struct Node<T> {
  plane: Plane,
  items: Vec<T>,
  left: Option<usize>,
  right: Option<usize>,
}

/// Coplanar sets keyed by plane.
#[derive(Clone, Debug)]
pub struct PlaneTree<T> {
  nodes: Vec<Node<T>>,
  cos_tolerance: f64,
  linear_tolerance: f64,
}

impl<T> PlaneTree<T> {
  /// `angular_degrees` bounds the angle between normals of one set;
  /// `linear` bounds the offset difference.
  pub fn new(angular_degrees: f64, linear: f64) -> Self {
    Self {
      nodes: Vec::new(),
      cos_tolerance: angular_degrees.to_radians().cos(),
      linear_tolerance: linear,
    }
  }

  /// Number of sets.
  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  fn compare(&self, node: &Plane, plane: &Plane) -> Ordering {
    let cos = node.normal.dot(plane.normal);
    if cos >= self.cos_tolerance {
      let delta = plane.offset - node.offset;
      if delta.abs() <= self.linear_tolerance {
        Ordering::Equal
      } else if delta < 0.0 {
        Ordering::Less
      } else {
        Ordering::Greater
      }
    } else if cos < -0.5 {
      Ordering::Less
    } else {
      Ordering::Greater
    }
  }

  /// Add `item` to the set matching `plane`, creating the set if needed.
  /// Returns the set index.
  pub fn insert(&mut self, plane: Plane, item: T) -> usize {
    let mut cursor = if self.nodes.is_empty() { None } else { Some(0) };
    let mut link: Option<(usize, Ordering)> = None;

    while let Some(index) = cursor {
      match self.compare(&self.nodes[index].plane, &plane) {
        Ordering::Equal => {
          self.nodes[index].items.push(item);
          return index;
        }
        Ordering::Less => {
          link = Some((index, Ordering::Less));
          cursor = self.nodes[index].left;
        }
        Ordering::Greater => {
          link = Some((index, Ordering::Greater));
          cursor = self.nodes[index].right;
        }
      }
    }

    let index = self.nodes.len();
    self.nodes.push(Node {
      plane,
      items: vec![item],
      left: None,
      right: None,
    });
    match link {
      Some((parent, Ordering::Less)) => self.nodes[parent].left = Some(index),
      Some((parent, _)) => self.nodes[parent].right = Some(index),
      None => {}
    }
    index
  }

  /// Sets in creation order, each with the plane of its first member.
  pub fn into_sets(self) -> Vec<(Plane, Vec<T>)> {
    self
      .nodes
      .into_iter()
      .map(|node| (node.plane, node.items))
      .collect()
  }
}
