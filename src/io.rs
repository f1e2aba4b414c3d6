//! # IO Module - File Import/Export
//!
//! Supports reading and writing polygonal data in:
//! - legacy VTK (`.vtk`), ASCII or big-endian binary
//! - PLY (`.ply`), ASCII or binary in either byte order

pub mod ply;
pub mod vtk;
mod source;

// Re-export for convenience
pub use ply::{read_ply, write_ply, PlyFormat};
pub use vtk::{read_vtk, write_vtk, VtkHeader};

use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};
use crate::poly_data::PolyData;

/// Supported container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Vtk,
    Ply,
}

impl MeshFormat {
    pub fn name(self) -> &'static str {
        match self {
            MeshFormat::Vtk => "VTK",
            MeshFormat::Ply => "PLY",
        }
    }
}

/// Body encoding of a written file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Ascii,
    Binary,
}

/// Byte order of binary PLY bodies. Legacy VTK binary is always big-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// Options shared by the writers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub encoding: Encoding,
    pub byte_order: Endianness,
    /// VTK title line, PLY comment
    pub header: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::Ascii,
            byte_order: Endianness::Little,
            header: "vtk output".to_string(),
        }
    }
}

/// Detect file format from extension
pub fn detect_format(path: impl AsRef<Path>) -> Option<MeshFormat> {
    let path = path.as_ref();
    let ext = path.extension()?.to_str()?.to_lowercase();

    match ext.as_str() {
        "vtk" => Some(MeshFormat::Vtk),
        "ply" => Some(MeshFormat::Ply),
        _ => None,
    }
}

/// Detect file format from the first bytes of its content
pub fn sniff_format(bytes: &[u8]) -> Option<MeshFormat> {
    if bytes.starts_with(b"# vtk") {
        Some(MeshFormat::Vtk)
    } else if bytes.starts_with(b"ply\n") || bytes.starts_with(b"ply\r\n") {
        Some(MeshFormat::Ply)
    } else {
        None
    }
}

/// Read polygonal data, choosing the decoder by extension and falling back
/// to the file's magic line
pub fn read_poly_data(path: impl AsRef<Path>) -> Result<PolyData> {
    read_poly_data_with_format(path).map(|(data, _)| data)
}

/// Like [`read_poly_data`], also returning the format the file was decoded as
pub fn read_poly_data_with_format(path: impl AsRef<Path>) -> Result<(PolyData, MeshFormat)> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let format = detect_format(path)
        .or_else(|| sniff_format(&bytes))
        .ok_or_else(|| {
            MeshError::UnsupportedFormat(format!("cannot tell the format of {}", path.display()))
        })?;

    debug!("Reading {} as {}", path.display(), format.name());
    let data = match format {
        MeshFormat::Vtk => vtk::parse_vtk(&bytes)?,
        MeshFormat::Ply => ply::parse_ply(&bytes)?,
    };
    info!(
        "Read {}: {} points, {} cells",
        path.display(),
        data.n_points(),
        data.n_cells()
    );
    Ok((data, format))
}

/// Write polygonal data in the format named by the path's extension
pub fn write_poly_data(data: &PolyData, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    let format = detect_format(path).ok_or_else(|| {
        MeshError::UnsupportedFormat(format!(
            "unknown output extension for {} (expected .vtk or .ply)",
            path.display()
        ))
    })?;
    write_poly_data_as(data, path, format, options)
}

/// Write polygonal data in `format` whatever the path's extension
pub fn write_poly_data_as(
    data: &PolyData,
    path: impl AsRef<Path>,
    format: MeshFormat,
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    debug!("Writing {} as {} ({:?})", path.display(), format.name(), options.encoding);
    match format {
        MeshFormat::Vtk => write_vtk(data, path, options)?,
        MeshFormat::Ply => write_ply(data, path, options)?,
    }
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly_data::{Points, ScalarType};
    use glam::dvec3;
    use tempfile::tempdir;

    fn triangle() -> PolyData {
        let mut data = PolyData::from_points(Points::from_vec(
            vec![dvec3(0.0, 0.0, 0.0), dvec3(1.0, 0.0, 0.0), dvec3(0.0, 1.0, 0.0)],
            ScalarType::Float,
        ));
        data.polys.push(&[0, 1, 2]);
        data
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("mesh.vtk"), Some(MeshFormat::Vtk));
        assert_eq!(detect_format("MESH.VTK"), Some(MeshFormat::Vtk));
        assert_eq!(detect_format("mesh.ply"), Some(MeshFormat::Ply));
        assert_eq!(detect_format("mesh.obj"), None);
        assert_eq!(detect_format("mesh"), None);
    }

    #[test]
    fn test_sniff_format() {
        assert_eq!(sniff_format(b"# vtk DataFile Version 4.2\n"), Some(MeshFormat::Vtk));
        assert_eq!(sniff_format(b"ply\nformat ascii 1.0\n"), Some(MeshFormat::Ply));
        assert_eq!(sniff_format(b"solid cube\n"), None);
    }

    #[test]
    fn test_roundtrip_through_both_formats() {
        let dir = tempdir().unwrap();
        let data = triangle();
        for name in ["a.vtk", "a.ply"] {
            for encoding in [Encoding::Ascii, Encoding::Binary] {
                let path = dir.path().join(name);
                let options = WriteOptions {
                    encoding,
                    ..WriteOptions::default()
                };
                write_poly_data(&data, &path, &options).unwrap();
                assert_eq!(read_poly_data(&path).unwrap(), data, "{} {:?}", name, encoding);
            }
        }
    }

    #[test]
    fn test_read_sniffs_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("surface.dat");
        let mut bytes = Vec::new();
        vtk::write_vtk_to(&triangle(), &mut bytes, &WriteOptions::default()).unwrap();
        std::fs::write(&path, bytes).unwrap();

        assert_eq!(read_poly_data(&path).unwrap().n_polys(), 1);
    }

    #[test]
    fn test_unknown_formats_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello\n").unwrap();

        assert!(matches!(read_poly_data(&path), Err(MeshError::UnsupportedFormat(_))));
        assert!(matches!(
            write_poly_data(&triangle(), &path, &WriteOptions::default()),
            Err(MeshError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_write_as_ignores_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("surface.out");
        write_poly_data_as(&triangle(), &path, MeshFormat::Ply, &WriteOptions::default()).unwrap();

        let (data, format) = read_poly_data_with_format(&path).unwrap();
        assert_eq!(format, MeshFormat::Ply);
        assert_eq!(data, triangle());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read_poly_data(dir.path().join("absent.vtk")).unwrap_err();
        assert!(matches!(err, MeshError::Io(_)));
    }

    #[test]
    fn test_encoding_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            encoding: Encoding,
            byte_order: Endianness,
        }
        let w: Wrapper = toml::from_str("encoding = \"binary\"\nbyte_order = \"big\"").unwrap();
        assert_eq!(w.encoding, Encoding::Binary);
        assert_eq!(w.byte_order, Endianness::Big);
    }
}
