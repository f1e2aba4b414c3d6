//! # polykit - Polydata Mesh Utilities
//!
//! Reads and writes polygonal meshes in legacy VTK and Stanford PLY, both
//! ASCII and binary, and backs three small tools:
//!
//! - `mesh2txt`: dump vertex coordinates to a text file
//! - `meshconv`: re-encode a mesh (binary to ASCII by default)
//! - `meshinfo`: print counts, bounds and scalar range
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use polykit::{convert, read_poly_data, Encoding, WriteOptions};
//!
//! let mesh = read_poly_data("surface.vtk")?;
//! println!("{} points", mesh.n_points());
//!
//! let options = WriteOptions { encoding: Encoding::Ascii, ..WriteOptions::default() };
//! convert("surface.vtk", "surface_ascii.vtk", &options)?;
//! # Ok::<(), polykit::MeshError>(())
//! ```

// Re-export types
pub use config::{LogLevel, ToolConfig};
pub use convert::{convert, ConvertReport};
pub use error::{MeshError, Result};
pub use geometry::{Bounds, Point};
pub use info::Characteristics;
pub use io::{
    detect_format, read_poly_data, read_poly_data_with_format, write_poly_data,
    write_poly_data_as, Encoding, Endianness, MeshFormat, WriteOptions,
};
pub use points::{extract_points, text_output_path, write_points, ExtractOutcome, PointFormat};
pub use poly_data::{CellArray, DataArray, Points, PolyData, ScalarType};

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod geometry;
pub mod info;
pub mod io;
pub mod points;
pub mod poly_data;
