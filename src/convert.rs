//! # Conversion
//!
//! Re-serialize a mesh file, typically binary to ASCII. The output format
//! follows the output extension, so the same call also converts between VTK
//! and PLY. An output without a `.vtk` or `.ply` extension keeps the input's
//! format.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{MeshError, Result};
use crate::io::{
    detect_format, read_poly_data_with_format, write_poly_data_as, Encoding, MeshFormat,
    WriteOptions,
};

/// What a conversion read and wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub points: usize,
    pub cells: usize,
    pub format: MeshFormat,
    pub encoding: Encoding,
}

/// True when both paths name the same file, either literally or after
/// resolving links and relative components
pub fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Read `input` and write it to `output`.
///
/// Refuses to run when both name the same file so the source is never
/// truncated before it is read.
pub fn convert(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &WriteOptions,
) -> Result<ConvertReport> {
    let input = input.as_ref();
    let output = output.as_ref();

    if same_file(input, output) {
        return Err(MeshError::SamePath(input.to_path_buf()));
    }

    let (data, input_format) = read_poly_data_with_format(input)?;
    let format = detect_format(output).unwrap_or(input_format);
    debug!(
        "Converting {} -> {} ({}, {:?}, {:?})",
        input.display(),
        output.display(),
        format.name(),
        options.encoding,
        options.byte_order
    );
    write_poly_data_as(&data, output, format, options)?;

    let report = ConvertReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        points: data.n_points(),
        cells: data.n_cells(),
        format,
        encoding: options.encoding,
    };
    info!(
        "Converted {} points and {} cells to {}",
        report.points,
        report.cells,
        output.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{read_poly_data, write_poly_data};
    use crate::poly_data::{CellArray, Points, PolyData, ScalarType};
    use glam::dvec3;
    use tempfile::tempdir;

    fn surface() -> PolyData {
        let mut data = PolyData::from_points(Points::from_vec(
            vec![
                dvec3(0.0, 0.0, 0.0),
                dvec3(1.0, 0.0, 0.25),
                dvec3(1.0, 1.0, 0.5),
                dvec3(0.0, 1.0, 0.75),
            ],
            ScalarType::Float,
        ));
        data.polys = CellArray::from_cells([[0usize, 1, 2], [0, 2, 3]]);
        data
    }

    fn binary() -> WriteOptions {
        WriteOptions {
            encoding: Encoding::Binary,
            ..WriteOptions::default()
        }
    }

    #[test]
    fn test_binary_to_ascii_to_binary() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.vtk");
        let ascii = dir.path().join("ascii.vtk");
        let back = dir.path().join("back.vtk");
        let data = surface();
        write_poly_data(&data, &source, &binary()).unwrap();

        let report = convert(&source, &ascii, &WriteOptions::default()).unwrap();
        assert_eq!(report.points, 4);
        assert_eq!(report.cells, 2);
        assert_eq!(report.encoding, Encoding::Ascii);
        let text = std::fs::read_to_string(&ascii).unwrap();
        assert_eq!(text.lines().nth(2), Some("ASCII"));

        convert(&ascii, &back, &binary()).unwrap();
        assert_eq!(read_poly_data(&back).unwrap(), data);
        assert_eq!(std::fs::read(&back).unwrap(), std::fs::read(&source).unwrap());
    }

    #[test]
    fn test_vtk_to_ply() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.vtk");
        let target = dir.path().join("target.ply");
        write_poly_data(&surface(), &source, &binary()).unwrap();

        convert(&source, &target, &WriteOptions::default()).unwrap();
        let back = read_poly_data(&target).unwrap();
        assert_eq!(back.points, surface().points);
        assert_eq!(back.polys, surface().polys);
    }

    #[test]
    fn test_output_without_known_extension_keeps_input_format() {
        let dir = tempdir().unwrap();
        let vtk_source = dir.path().join("source.vtk");
        let ply_source = dir.path().join("source.ply");
        write_poly_data(&surface(), &vtk_source, &binary()).unwrap();
        write_poly_data(&surface(), &ply_source, &binary()).unwrap();

        for name in ["out_ascii", "out.vtp", "out.asc"] {
            let target = dir.path().join(name);
            let report = convert(&vtk_source, &target, &WriteOptions::default()).unwrap();
            assert_eq!(report.format, MeshFormat::Vtk);
            let text = std::fs::read_to_string(&target).unwrap();
            assert!(text.starts_with("# vtk DataFile Version"));
            assert_eq!(text.lines().nth(2), Some("ASCII"));
            assert_eq!(read_poly_data(&target).unwrap(), surface());
        }

        let target = dir.path().join("from_ply");
        let report = convert(&ply_source, &target, &WriteOptions::default()).unwrap();
        assert_eq!(report.format, MeshFormat::Ply);
        assert!(std::fs::read(&target).unwrap().starts_with(b"ply\nformat ascii 1.0\n"));
    }

    #[test]
    fn test_same_path_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mesh.vtk");
        write_poly_data(&surface(), &path, &binary()).unwrap();
        let before = std::fs::read(&path).unwrap();

        let err = convert(&path, &path, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, MeshError::SamePath(_)));

        let dotted = dir.path().join(".").join("mesh.vtk");
        assert!(matches!(
            convert(&path, &dotted, &WriteOptions::default()),
            Err(MeshError::SamePath(_))
        ));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_missing_input_creates_no_output() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.vtk");
        assert!(convert(dir.path().join("in.vtk"), &output, &WriteOptions::default()).is_err());
        assert!(!output.exists());
    }
}
