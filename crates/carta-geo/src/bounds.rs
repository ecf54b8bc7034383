//! Axis-aligned bounding boxes in projection coordinates.

use std::fmt;

/// A rectangular bounding box in projection coordinates.
///
/// `min_y` is the southern/lower edge and `max_y` the northern/upper edge;
/// projection space has y increasing upward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Western edge.
    pub min_x: f64,
    /// Southern edge.
    pub min_y: f64,
    /// Eastern edge.
    pub max_x: f64,
    /// Northern edge.
    pub max_y: f64,
}

impl Bounds {
    /// Create a bounding box from its four edges.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width along the x axis.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height along the y axis.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point as `[x, y]`.
    pub fn center(&self) -> [f64; 2] {
        [
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        ]
    }

    /// Upper-left corner as `[x, y]`.
    pub fn upper_left(&self) -> [f64; 2] {
        [self.min_x, self.max_y]
    }

    /// Lower-right corner as `[x, y]`.
    pub fn lower_right(&self) -> [f64; 2] {
        [self.max_x, self.min_y]
    }

    /// Whether a point lies inside (or on the edge of) the box.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min_x && p[0] <= self.max_x && p[1] >= self.min_y && p[1] <= self.max_y
    }

    /// Translate the box by `[dx, dy]`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.min_x + dx,
            self.min_y + dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{} {},{}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_and_size() {
        let b = Bounds::new(-10.0, -4.0, 10.0, 4.0);
        assert_eq!(b.width(), 20.0);
        assert_eq!(b.height(), 8.0);
        assert_eq!(b.center(), [0.0, 0.0]);
    }

    #[test]
    fn test_contains() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains([5.0, 5.0]));
        assert!(b.contains([0.0, 10.0]));
        assert!(!b.contains([-0.1, 5.0]));
    }

    #[test]
    fn test_translated() {
        let b = Bounds::new(0.0, 0.0, 2.0, 2.0).translated(1.0, -1.0);
        assert_eq!(b, Bounds::new(1.0, -1.0, 3.0, 1.0));
    }
}
