//! # Data Characteristics
//!
//! Summary counts, bounds and scalar range of a mesh, as printed by
//! `meshinfo`.

use std::fmt;

use serde::Serialize;

use crate::geometry::center_of_mass;
use crate::poly_data::PolyData;

/// Bounds reported for a mesh without points (an inverted box)
pub const EMPTY_BOUNDS: [f64; 6] = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];

/// Scalar range reported when a mesh carries no point scalars
pub const DEFAULT_SCALAR_RANGE: [f64; 2] = [0.0, 1.0];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Characteristics {
    pub points: usize,
    pub vertices: usize,
    pub cells: usize,
    pub lines: usize,
    pub polys: usize,
    pub strips: usize,
    pub pieces: usize,
    /// `xmin xmax ymin ymax zmin zmax`
    pub bounds: [f64; 6],
    pub center: [f64; 3],
    pub scalar_range: [f64; 2],
}

impl Characteristics {
    pub fn of(data: &PolyData) -> Self {
        let bounds = data.bounds().map_or(EMPTY_BOUNDS, |b| b.to_array());
        let scalar_range = data
            .scalar_range()
            .map_or(DEFAULT_SCALAR_RANGE, |(lo, hi)| [lo, hi]);

        Self {
            points: data.n_points(),
            vertices: data.n_verts(),
            cells: data.n_cells(),
            lines: data.n_lines(),
            polys: data.n_polys(),
            strips: data.n_strips(),
            pieces: data.n_pieces(),
            bounds,
            center: center_of_mass(&data.points.data).to_array(),
            scalar_range,
        }
    }
}

impl fmt::Display for Characteristics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of:  ")?;
        writeln!(f, "  Points:   {}", self.points)?;
        writeln!(f, "  Vertices: {}", self.vertices)?;
        writeln!(f, "  Cells:    {}", self.cells)?;
        writeln!(f, "  Lines:    {}", self.lines)?;
        writeln!(f, "  Polys:    {}", self.polys)?;
        writeln!(f, "  Strips:   {}", self.strips)?;
        writeln!(f, "  Pieces:   {}", self.pieces)?;

        write!(f, "  Bounds: ")?;
        for v in self.bounds {
            write!(f, "{:.2} ", v)?;
        }
        writeln!(f)?;

        write!(f, "  Center: ")?;
        for v in self.center {
            write!(f, "{:.2} ", v)?;
        }
        writeln!(f)?;

        write!(f, "  Scalar Range: ")?;
        for v in self.scalar_range {
            write!(f, "{:.2} ", v)?;
        }
        writeln!(f)
    }
}
