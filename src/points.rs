//! # Point Extraction
//!
//! Dumps the vertex coordinates of a mesh to a plain text file, one
//! `x y z` line per point.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::Result;
use crate::io::read_poly_data;
use crate::poly_data::Points;

/// Number formatting for the text dump
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointFormat {
    /// Fixed number of decimals. `None` prints the shortest text that reads
    /// back to the stored value.
    pub precision: Option<usize>,
}

impl PointFormat {
    fn coordinate(&self, points: &Points, value: f64) -> String {
        match self.precision {
            Some(precision) => format!("{:.*}", precision, value),
            None => points.scalar_type.format_ascii(value),
        }
    }
}

/// Result of an extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The mesh has no points; no file was created
    NoPoints,
    Written { path: PathBuf, count: usize },
}

/// Text file written for `input`: its last three characters replaced by `txt`
///
/// `mesh.vtk` becomes `mesh.txt`, `scan.ply` becomes `scan.txt`. The cut is
/// by characters, not by extension, so `a.b` becomes `txt`.
pub fn text_output_path(input: impl AsRef<Path>) -> PathBuf {
    let input = input.as_ref().to_string_lossy();
    let keep = input.chars().count().saturating_sub(3);
    let mut output: String = input.chars().take(keep).collect();
    output.push_str("txt");
    PathBuf::from(output)
}

/// Write one `x y z` line per point
pub fn write_points<W: Write>(writer: &mut W, points: &Points, format: &PointFormat) -> Result<()> {
    for p in points.iter() {
        writeln!(
            writer,
            "{} {} {}",
            format.coordinate(points, p.x),
            format.coordinate(points, p.y),
            format.coordinate(points, p.z)
        )?;
    }
    Ok(())
}

/// Read `input` and dump its points next to it.
///
/// The point count and output path go to `report` before the text file is
/// written. A mesh without points produces no file.
pub fn extract_points<R: Write>(
    input: impl AsRef<Path>,
    format: &PointFormat,
    report: &mut R,
) -> Result<ExtractOutcome> {
    let input = input.as_ref();
    let data = read_poly_data(input)?;

    let count = data.n_points();
    if count == 0 {
        info!("{} has no points", input.display());
        return Ok(ExtractOutcome::NoPoints);
    }

    let path = text_output_path(input);
    writeln!(report, "Number of points: {}", count)?;
    writeln!(report, "Output to: {}", path.display())?;
    report.flush()?;

    debug!("Writing {} points to {}", count, path.display());
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    write_points(&mut writer, &data.points, format)?;
    writer.flush()?;

    info!("Wrote {} lines to {}", count, path.display());
    Ok(ExtractOutcome::Written { path, count })
}
