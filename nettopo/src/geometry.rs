//! Geometry primitives: points, grid snapping, and axis-aligned segment tests.
//!
//! All schematic coordinates live on a 10-unit grid. Connectivity analysis
//! keys points by their integer-rounded coordinates, so everything that wants
//! to compare positions goes through [`Point::key`] rather than comparing
//! floats directly.

use serde::{Deserialize, Serialize};

/// Schematic grid unit. All placed geometry snaps to multiples of this.
pub const GRID: f64 = 10.0;

/// Tolerance for point-on-wire matching, in schematic units.
pub const SNAP_TOLERANCE: f64 = 1.0;

/// A point in schematic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Snap both coordinates to the nearest grid multiple.
    pub fn snapped(&self) -> Point {
        Point {
            x: snap(self.x),
            y: snap(self.y),
        }
    }

    /// Integer-rounded coordinate key used by the connectivity arena.
    pub fn key(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Snap a single coordinate to the nearest grid multiple.
pub fn snap(v: f64) -> f64 {
    (v / GRID).round() * GRID
}

/// Transform a local pin offset into absolute schematic coordinates.
///
/// Mirror negates the local x first, then the offset is rotated by the
/// component's rotation (degrees, one of 0/90/180/270), then translated by
/// the component position.
pub fn transform_offset(offset: Point, rotation: u16, mirror: bool, position: Point) -> Point {
    let x = if mirror { -offset.x } else { offset.x };
    let y = offset.y;

    let (rx, ry) = match rotation % 360 {
        90 => (-y, x),
        180 => (-x, -y),
        270 => (y, -x),
        _ => (x, y),
    };

    Point {
        x: position.x + rx,
        y: position.y + ry,
    }
}

/// True when the segment is horizontal or vertical within tolerance.
pub fn is_axis_aligned(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < SNAP_TOLERANCE || (a.y - b.y).abs() < SNAP_TOLERANCE
}

/// Point-on-segment test for axis-aligned wires.
///
/// A point counts as "on" the wire only when it is within tolerance of the
/// wire's bounding box and aligned to the wire's axis. Diagonal segments
/// never match.
pub fn point_on_segment(p: Point, a: Point, b: Point, tol: f64) -> bool {
    if (a.y - b.y).abs() < tol {
        // Horizontal wire
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        (p.y - a.y).abs() <= tol && p.x >= x0 - tol && p.x <= x1 + tol
    } else if (a.x - b.x).abs() < tol {
        // Vertical wire
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
        (p.x - a.x).abs() <= tol && p.y >= y0 - tol && p.y <= y1 + tol
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_to_grid() {
        assert_eq!(snap(14.0), 10.0);
        assert_eq!(snap(15.0), 20.0);
        assert_eq!(snap(-4.9), -0.0);
        let p = Point::new(101.0, 98.0).snapped();
        assert_eq!(p, Point::new(100.0, 100.0));
    }

    #[test]
    fn rotation_quadrants() {
        let offset = Point::new(0.0, -30.0);
        let origin = Point::new(100.0, 100.0);

        assert_eq!(
            transform_offset(offset, 0, false, origin),
            Point::new(100.0, 70.0)
        );
        assert_eq!(
            transform_offset(offset, 90, false, origin),
            Point::new(130.0, 100.0)
        );
        assert_eq!(
            transform_offset(offset, 180, false, origin),
            Point::new(100.0, 130.0)
        );
        assert_eq!(
            transform_offset(offset, 270, false, origin),
            Point::new(70.0, 100.0)
        );
    }

    #[test]
    fn mirror_negates_local_x_before_rotation() {
        let offset = Point::new(30.0, 0.0);
        let origin = Point::new(0.0, 0.0);

        assert_eq!(
            transform_offset(offset, 0, true, origin),
            Point::new(-30.0, 0.0)
        );
        // Mirror applies in the local frame, so it composes with rotation
        assert_eq!(
            transform_offset(offset, 90, true, origin),
            Point::new(0.0, -30.0)
        );
    }

    #[test]
    fn on_segment_requires_axis_alignment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        assert!(point_on_segment(Point::new(50.0, 0.5), a, b, 1.0));
        assert!(!point_on_segment(Point::new(50.0, 5.0), a, b, 1.0));
        assert!(!point_on_segment(Point::new(150.0, 0.0), a, b, 1.0));

        // Diagonal segments never match, even for points on the line
        let d = Point::new(100.0, 100.0);
        assert!(!point_on_segment(Point::new(50.0, 50.0), a, d, 1.0));
    }
}
