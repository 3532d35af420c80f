//! Pixel-space geometry and the tile-extent to pixel projection.

use serde::{Deserialize, Serialize};

/// A 2D point, either in tile extent units or in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_sq(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// An ordered vertex sequence: a polyline part, a polygon ring or a group of points.
pub type Ring = Vec<Point>;

/// Scales every vertex of `rings` down by `ratio` (`source extent / target pixel size`).
///
/// Plain division with no rounding, so hit-testing sees exactly the coordinates
/// that were painted.
#[must_use]
pub fn project(rings: &[Ring], ratio: f64) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|p| Point::new(p.x / ratio, p.y / ratio))
                .collect()
        })
        .collect()
}

/// Axis-aligned bounding box, inclusive on all edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    /// Bounds of all vertices, or `None` when there are none.
    #[must_use]
    pub fn from_rings(rings: &[Ring]) -> Option<Self> {
        let mut points = rings.iter().flatten();
        let first = points.next()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points.fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    #[must_use]
    pub fn expand(self, by: f64) -> Self {
        Self {
            min_x: self.min_x - by,
            min_y: self.min_y - by,
            max_x: self.max_x + by,
            max_y: self.max_y + by,
        }
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    fn square(min: f64, max: f64) -> Ring {
        vec![
            Point::new(min, min),
            Point::new(max, min),
            Point::new(max, max),
            Point::new(min, max),
            Point::new(min, min),
        ]
    }

    #[test]
    fn test_project_extent_to_pixels() {
        let rings = vec![square(1024.0, 3072.0)];
        let projected = project(&rings, 4096.0 / 256.0);
        assert_eq!(projected[0][0], Point::new(64.0, 64.0));
        assert_eq!(projected[0][2], Point::new(192.0, 192.0));
    }

    #[test]
    fn test_project_keeps_fractions() {
        let projected = project(&[vec![Point::new(1.0, 3.0)]], 16.0);
        assert_eq!(projected[0][0], Point::new(0.0625, 0.1875));
    }

    #[rstest]
    #[case(16.0)]
    #[case(8.0)]
    #[case(3.0)]
    #[case(0.5)]
    #[case(1.0 / 7.0)]
    fn test_project_is_reversible(#[case] ratio: f64) {
        let rings = vec![
            square(17.0, 4011.0),
            vec![Point::new(-33.0, 5000.0), Point::new(123.456, 0.001)],
        ];
        let back = project(&project(&rings, ratio), 1.0 / ratio);
        for (ring, ring_back) in rings.iter().zip(&back) {
            assert_eq!(ring.len(), ring_back.len());
            for (p, q) in ring.iter().zip(ring_back) {
                assert_relative_eq!(p.x, q.x, max_relative = 1e-12);
                assert_relative_eq!(p.y, q.y, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_bbox() {
        let bbox = BBox::from_rings(&[square(10.0, 20.0), vec![Point::new(-5.0, 12.0)]]).unwrap();
        assert_eq!(
            bbox,
            BBox {
                min_x: -5.0,
                min_y: 10.0,
                max_x: 20.0,
                max_y: 20.0
            }
        );
        assert!(bbox.contains(Point::new(20.0, 20.0)));
        assert!(!bbox.contains(Point::new(20.5, 20.0)));
        assert!(bbox.expand(1.0).contains(Point::new(20.5, 20.0)));
        assert_eq!(BBox::from_rings(&[]), None);
        assert_eq!(BBox::from_rings(&[vec![]]), None);
    }
}
