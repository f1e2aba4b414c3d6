//! # PolyData
//!
//! In-memory polygonal data set: typed point coordinates, the four topology
//! classes (vertices, lines, polygons, triangle strips) and optional
//! per-point attributes.

use std::io::{self, Read, Write};

use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt};
use glam::DVec3;

use crate::error::{MeshError, Result};
use crate::geometry::Bounds;

/// Numeric type of an array as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Char,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    Float,
    Double,
}

impl Default for ScalarType {
    fn default() -> Self {
        ScalarType::Float
    }
}

impl ScalarType {
    /// Parse a legacy VTK type name (`float`, `unsigned_char`, `vtktypeint64`, ...)
    pub fn from_vtk_name(name: &str) -> Option<Self> {
        let ty = match name.to_ascii_lowercase().as_str() {
            "char" => ScalarType::Char,
            "unsigned_char" => ScalarType::UnsignedChar,
            "short" => ScalarType::Short,
            "unsigned_short" => ScalarType::UnsignedShort,
            "int" => ScalarType::Int,
            "unsigned_int" => ScalarType::UnsignedInt,
            "long" | "vtktypeint64" | "vtkidtype" => ScalarType::Long,
            "unsigned_long" | "vtktypeuint64" => ScalarType::UnsignedLong,
            "float" => ScalarType::Float,
            "double" => ScalarType::Double,
            _ => return None,
        };
        Some(ty)
    }

    pub fn vtk_name(self) -> &'static str {
        match self {
            ScalarType::Char => "char",
            ScalarType::UnsignedChar => "unsigned_char",
            ScalarType::Short => "short",
            ScalarType::UnsignedShort => "unsigned_short",
            ScalarType::Int => "int",
            ScalarType::UnsignedInt => "unsigned_int",
            ScalarType::Long => "vtktypeint64",
            ScalarType::UnsignedLong => "vtktypeuint64",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }

    /// Parse a PLY property type, accepting both the short and sized spellings
    pub fn from_ply_name(name: &str) -> Option<Self> {
        let ty = match name {
            "char" | "int8" => ScalarType::Char,
            "uchar" | "uint8" => ScalarType::UnsignedChar,
            "short" | "int16" => ScalarType::Short,
            "ushort" | "uint16" => ScalarType::UnsignedShort,
            "int" | "int32" => ScalarType::Int,
            "uint" | "uint32" => ScalarType::UnsignedInt,
            "int64" => ScalarType::Long,
            "uint64" => ScalarType::UnsignedLong,
            "float" | "float32" => ScalarType::Float,
            "double" | "float64" => ScalarType::Double,
            _ => return None,
        };
        Some(ty)
    }

    /// PLY spelling, `None` for types the PLY 1.0 grammar lacks
    pub fn ply_name(self) -> Option<&'static str> {
        match self {
            ScalarType::Char => Some("char"),
            ScalarType::UnsignedChar => Some("uchar"),
            ScalarType::Short => Some("short"),
            ScalarType::UnsignedShort => Some("ushort"),
            ScalarType::Int => Some("int"),
            ScalarType::UnsignedInt => Some("uint"),
            ScalarType::Float => Some("float"),
            ScalarType::Double => Some("double"),
            ScalarType::Long | ScalarType::UnsignedLong => None,
        }
    }

    /// Size in bytes of one binary value
    pub fn size(self) -> usize {
        match self {
            ScalarType::Char | ScalarType::UnsignedChar => 1,
            ScalarType::Short | ScalarType::UnsignedShort => 2,
            ScalarType::Int | ScalarType::UnsignedInt | ScalarType::Float => 4,
            ScalarType::Long | ScalarType::UnsignedLong | ScalarType::Double => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, ScalarType::Float | ScalarType::Double)
    }

    pub fn read<B: ByteOrder, R: Read>(self, reader: &mut R) -> io::Result<f64> {
        let value = match self {
            ScalarType::Char => reader.read_i8()? as f64,
            ScalarType::UnsignedChar => reader.read_u8()? as f64,
            ScalarType::Short => reader.read_i16::<B>()? as f64,
            ScalarType::UnsignedShort => reader.read_u16::<B>()? as f64,
            ScalarType::Int => reader.read_i32::<B>()? as f64,
            ScalarType::UnsignedInt => reader.read_u32::<B>()? as f64,
            ScalarType::Long => reader.read_i64::<B>()? as f64,
            ScalarType::UnsignedLong => reader.read_u64::<B>()? as f64,
            ScalarType::Float => reader.read_f32::<B>()? as f64,
            ScalarType::Double => reader.read_f64::<B>()?,
        };
        Ok(value)
    }

    /// Read a value that must be a non-negative integer (indices, counts)
    pub fn read_index<B: ByteOrder, R: Read>(self, reader: &mut R) -> io::Result<usize> {
        let value = match self {
            ScalarType::Char => i64::from(reader.read_i8()?),
            ScalarType::UnsignedChar => i64::from(reader.read_u8()?),
            ScalarType::Short => i64::from(reader.read_i16::<B>()?),
            ScalarType::UnsignedShort => i64::from(reader.read_u16::<B>()?),
            ScalarType::Int => i64::from(reader.read_i32::<B>()?),
            ScalarType::UnsignedInt => i64::from(reader.read_u32::<B>()?),
            ScalarType::Long => reader.read_i64::<B>()?,
            ScalarType::UnsignedLong => i64::try_from(reader.read_u64::<B>()?).unwrap_or(-1),
            ScalarType::Float | ScalarType::Double => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{} cannot hold an index", self.vtk_name()),
                ));
            }
        };
        usize::try_from(value).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, format!("negative index {}", value))
        })
    }

    pub fn write<B: ByteOrder, W: Write>(self, writer: &mut W, value: f64) -> io::Result<()> {
        match self {
            ScalarType::Char => writer.write_i8(value as i8),
            ScalarType::UnsignedChar => writer.write_u8(value as u8),
            ScalarType::Short => writer.write_i16::<B>(value as i16),
            ScalarType::UnsignedShort => writer.write_u16::<B>(value as u16),
            ScalarType::Int => writer.write_i32::<B>(value as i32),
            ScalarType::UnsignedInt => writer.write_u32::<B>(value as u32),
            ScalarType::Long => writer.write_i64::<B>(value as i64),
            ScalarType::UnsignedLong => writer.write_u64::<B>(value as u64),
            ScalarType::Float => writer.write_f32::<B>(value as f32),
            ScalarType::Double => writer.write_f64::<B>(value),
        }
    }

    /// Parse one ASCII token as this type
    pub fn parse_ascii(self, token: &str) -> Option<f64> {
        if self == ScalarType::Float {
            // widen from f32 so ASCII and binary reads agree bit for bit
            token.parse::<f32>().ok().map(f64::from)
        } else if self.is_float() {
            token.parse::<f64>().ok()
        } else if let Ok(v) = token.parse::<i64>() {
            Some(v as f64)
        } else {
            token.parse::<u64>().ok().map(|v| v as f64)
        }
    }

    /// Shortest text that reads back to the same stored value
    pub fn format_ascii(self, value: f64) -> String {
        match self {
            ScalarType::Float => (value as f32).to_string(),
            ScalarType::Double => value.to_string(),
            ScalarType::UnsignedLong => (value as u64).to_string(),
            _ => (value as i64).to_string(),
        }
    }
}

/// Point coordinates together with their on-disk type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Points {
    pub data: Vec<DVec3>,
    pub scalar_type: ScalarType,
}

impl Points {
    pub fn new(scalar_type: ScalarType) -> Self {
        Self {
            data: Vec::new(),
            scalar_type,
        }
    }

    pub fn from_vec(data: Vec<DVec3>, scalar_type: ScalarType) -> Self {
        Self { data, scalar_type }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DVec3> {
        self.data.iter()
    }
}

/// Cells stored as an offsets/connectivity pair.
///
/// `offsets` always starts with 0 and has one more entry than there are cells;
/// cell `i` is `connectivity[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellArray {
    offsets: Vec<usize>,
    connectivity: Vec<usize>,
}

impl Default for CellArray {
    fn default() -> Self {
        Self::new()
    }
}

impl CellArray {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            connectivity: Vec::new(),
        }
    }

    /// Build from explicit offsets and connectivity, checking their consistency
    pub fn from_raw(offsets: Vec<usize>, connectivity: Vec<usize>) -> Result<Self> {
        if offsets.is_empty() {
            return Ok(Self::new());
        }
        if offsets[0] != 0 {
            return Err(MeshError::InvalidData("cell offsets must start at 0".to_string()));
        }
        if offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err(MeshError::InvalidData("cell offsets must be non-decreasing".to_string()));
        }
        if offsets.last().copied() != Some(connectivity.len()) {
            return Err(MeshError::InvalidData(format!(
                "last cell offset {} does not match connectivity length {}",
                offsets.last().copied().unwrap_or(0),
                connectivity.len()
            )));
        }
        Ok(Self { offsets, connectivity })
    }

    pub fn from_cells<I, C>(cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[usize]>,
    {
        let mut array = Self::new();
        for cell in cells {
            array.push(cell.as_ref());
        }
        array
    }

    pub fn push(&mut self, cell: &[usize]) {
        self.connectivity.extend_from_slice(cell);
        self.offsets.push(self.connectivity.len());
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&[usize]> {
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some(&self.connectivity[start..end])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.offsets
            .windows(2)
            .map(move |w| &self.connectivity[w[0]..w[1]])
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn connectivity(&self) -> &[usize] {
        &self.connectivity
    }

    /// Size field of the legacy VTK layout: one count plus the indices per cell
    pub fn legacy_size(&self) -> usize {
        self.len() + self.connectivity.len()
    }

    pub fn max_index(&self) -> Option<usize> {
        self.connectivity.iter().copied().max()
    }

    /// Decompose every cell, read as a triangle strip, into triangles with
    /// consistent winding
    pub fn strip_triangles(&self) -> Vec<[usize; 3]> {
        let mut triangles = Vec::new();
        for strip in self.iter() {
            for i in 0..strip.len().saturating_sub(2) {
                if i % 2 == 0 {
                    triangles.push([strip[i], strip[i + 1], strip[i + 2]]);
                } else {
                    triangles.push([strip[i + 1], strip[i], strip[i + 2]]);
                }
            }
        }
        triangles
    }
}

/// Named attribute array with a fixed number of components per tuple
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    pub name: String,
    pub scalar_type: ScalarType,
    pub components: usize,
    pub values: Vec<f64>,
}

impl DataArray {
    pub fn new(name: impl Into<String>, scalar_type: ScalarType, components: usize) -> Self {
        Self {
            name: name.into(),
            scalar_type,
            components: components.max(1),
            values: Vec::new(),
        }
    }

    pub fn n_tuples(&self) -> usize {
        self.values.len() / self.components
    }

    pub fn tuple(&self, index: usize) -> Option<&[f64]> {
        let start = index * self.components;
        self.values.get(start..start + self.components)
    }

    /// Min and max of one component, ignoring NaN
    pub fn range(&self, component: usize) -> Option<(f64, f64)> {
        if component >= self.components {
            return None;
        }
        self.values
            .iter()
            .skip(component)
            .step_by(self.components)
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Polygonal data set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyData {
    pub points: Points,
    pub verts: CellArray,
    pub lines: CellArray,
    pub polys: CellArray,
    pub strips: CellArray,
    pub point_scalars: Option<DataArray>,
    pub point_normals: Option<Vec<DVec3>>,
}

impl PolyData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Points) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    #[inline]
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn n_verts(&self) -> usize {
        self.verts.len()
    }

    #[inline]
    pub fn n_lines(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn n_polys(&self) -> usize {
        self.polys.len()
    }

    #[inline]
    pub fn n_strips(&self) -> usize {
        self.strips.len()
    }

    pub fn n_cells(&self) -> usize {
        self.n_verts() + self.n_lines() + self.n_polys() + self.n_strips()
    }

    /// A file always decodes into a single piece
    pub fn n_pieces(&self) -> usize {
        1
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(&self.points.data)
    }

    /// Range of the first component of the point scalars
    pub fn scalar_range(&self) -> Option<(f64, f64)> {
        self.point_scalars.as_ref().and_then(|s| s.range(0))
    }

    /// Check that topology and attributes refer to existing points
    pub fn validate(&self) -> Result<()> {
        let n_points = self.n_points();
        let classes = [
            ("vertex", &self.verts),
            ("line", &self.lines),
            ("polygon", &self.polys),
            ("triangle strip", &self.strips),
        ];
        for (name, cells) in classes {
            if let Some(max) = cells.max_index() {
                if max >= n_points {
                    return Err(MeshError::InvalidData(format!(
                        "{} cell references point {} but only {} points exist",
                        name, max, n_points
                    )));
                }
            }
        }

        if let Some(scalars) = &self.point_scalars {
            if scalars.values.len() != n_points * scalars.components {
                return Err(MeshError::InvalidData(format!(
                    "scalar array '{}' has {} values, expected {}",
                    scalars.name,
                    scalars.values.len(),
                    n_points * scalars.components
                )));
            }
        }

        if let Some(normals) = &self.point_normals {
            if normals.len() != n_points {
                return Err(MeshError::InvalidData(format!(
                    "{} normals for {} points",
                    normals.len(),
                    n_points
                )));
            }
        }

        Ok(())
    }
}
