//! # Geometry
//!
//! Geometric helpers over point sets.

use serde::Serialize;

pub type Point = glam::DVec3;

/// Axis-aligned bounding box of a point set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Bounding box of `points`, or `None` for an empty slice
    pub fn of(points: &[Point]) -> Option<Self> {
        let (&first, rest) = points.split_first()?;

        let mut min = first;
        let mut max = first;
        for &p in rest {
            min = min.min(p);
            max = max.max(p);
        }

        Some(Self { min, max })
    }

    /// Size of the box along each axis
    #[inline]
    pub fn extent(&self) -> Point {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Point {
        (self.min + self.max) * 0.5
    }

    /// Bounds in `xmin xmax ymin ymax zmin zmax` order
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.min.x, self.max.x,
            self.min.y, self.max.y,
            self.min.z, self.max.z,
        ]
    }

    pub fn contains(&self, p: Point) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Calculate the center of mass of a point set
#[inline]
pub fn center_of_mass(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ZERO;
    }

    let sum: Point = points.iter().fold(Point::ZERO, |acc, &p| acc + p);
    sum / points.len() as f64
}
