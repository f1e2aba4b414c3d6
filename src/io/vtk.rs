//! Legacy VTK PolyData Format Support
//!
//! File layout:
//! - `# vtk DataFile Version X.Y`
//! - Title line (up to 256 characters)
//! - `ASCII` or `BINARY`
//! - `DATASET POLYDATA`
//! - `POINTS n type` followed by 3n values
//! - `VERTICES`, `LINES`, `POLYGONS`, `TRIANGLE_STRIPS`, either as
//!   `KEY n size` + `k i0 .. ik-1` records, or (version 5 and later) as
//!   `KEY n+1 m` + `OFFSETS type` + `CONNECTIVITY type` arrays
//! - Optional `POINT_DATA n` / `CELL_DATA n` attribute blocks
//!
//! Binary blocks are big-endian and start right after the newline that ends
//! their keyword line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{BigEndian, WriteBytesExt};
use glam::DVec3;
use log::{debug, warn};

use super::source::Source;
use super::{Encoding, WriteOptions};
use crate::error::{MeshError, Result};
use crate::poly_data::{CellArray, DataArray, PolyData, Points, ScalarType};

const MAGIC: &str = "# vtk DataFile Version";
const WRITE_VERSION: &str = "4.2";
const MAX_TITLE_LEN: usize = 255;
// counts come from the file, so cap what is reserved up front
const PREALLOC_LIMIT: usize = 1 << 20;

/// Read a legacy VTK polydata file
pub fn read_vtk(path: impl AsRef<Path>) -> Result<PolyData> {
    let bytes = std::fs::read(path)?;
    parse_vtk(&bytes)
}

/// Write a legacy VTK polydata file
pub fn write_vtk(data: &PolyData, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_vtk_to(data, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}

/// Header fields of a legacy file
#[derive(Debug, Clone, PartialEq)]
pub struct VtkHeader {
    pub version: (u32, u32),
    pub title: String,
    pub encoding: Encoding,
}

struct Reader<'a> {
    src: Source<'a>,
    header: VtkHeader,
}

pub fn parse_vtk(bytes: &[u8]) -> Result<PolyData> {
    let mut src = Source::new(bytes);
    let header = read_header(&mut src)?;
    debug!(
        "VTK header: version {}.{}, {:?}, title '{}'",
        header.version.0, header.version.1, header.encoding, header.title
    );

    src.expect_keyword("DATASET")?;
    let kind = src.expect_token("dataset type")?;
    if !kind.eq_ignore_ascii_case("POLYDATA") {
        return Err(MeshError::UnsupportedFormat(format!(
            "VTK dataset type {} (only POLYDATA is supported)",
            kind
        )));
    }

    let mut reader = Reader { src, header };
    let data = reader.read_dataset()?;
    data.validate()?;
    Ok(data)
}

fn read_header(src: &mut Source<'_>) -> Result<VtkHeader> {
    let first = src
        .read_line()?
        .ok_or_else(|| src.error("empty file"))?;
    let rest = first
        .trim()
        .strip_prefix(MAGIC)
        .ok_or_else(|| src.error("missing '# vtk DataFile Version' header"))?;
    let version = parse_version(rest.trim())
        .ok_or_else(|| src.error(format!("invalid file version '{}'", rest.trim())))?;

    let title = src
        .read_line()?
        .ok_or_else(|| src.error("missing title line"))?
        .to_string();

    let encoding = match src.expect_token("ASCII or BINARY")? {
        t if t.eq_ignore_ascii_case("ASCII") => Encoding::Ascii,
        t if t.eq_ignore_ascii_case("BINARY") => Encoding::Binary,
        t => return Err(src.error(format!("expected ASCII or BINARY, found '{}'", t))),
    };

    Ok(VtkHeader { version, title, encoding })
}

fn parse_version(text: &str) -> Option<(u32, u32)> {
    let (major, minor) = text.split_once('.').unwrap_or((text, "0"));
    Some((major.parse().ok()?, minor.parse().ok()?))
}

impl<'a> Reader<'a> {
    fn binary(&self) -> bool {
        self.header.encoding == Encoding::Binary
    }

    /// Version 5 files store cells as offsets + connectivity arrays
    fn uses_offsets(&self) -> bool {
        self.header.version.0 >= 5
    }

    fn read_dataset(&mut self) -> Result<PolyData> {
        let mut data = PolyData::new();
        let mut have_points = false;

        while let Some(keyword) = self.src.next_token()? {
            match keyword.to_ascii_uppercase().as_str() {
                "POINTS" => {
                    data.points = self.read_points()?;
                    have_points = true;
                }
                "VERTICES" => data.verts = self.read_cells("VERTICES")?,
                "LINES" => data.lines = self.read_cells("LINES")?,
                "POLYGONS" => data.polys = self.read_cells("POLYGONS")?,
                "TRIANGLE_STRIPS" => data.strips = self.read_cells("TRIANGLE_STRIPS")?,
                "POINT_DATA" => {
                    let n: usize = self.src.parse_token("point data count")?;
                    if n != data.n_points() {
                        return Err(self.src.error(format!(
                            "POINT_DATA has {} tuples but the data set has {} points",
                            n,
                            data.n_points()
                        )));
                    }
                    self.read_attributes(n, Some(&mut data))?;
                }
                "CELL_DATA" => {
                    let n: usize = self.src.parse_token("cell data count")?;
                    debug!("Skipping CELL_DATA block with {} tuples", n);
                    self.read_attributes(n, None)?;
                }
                "FIELD" => self.skip_field()?,
                "METADATA" => self.skip_metadata()?,
                other => {
                    warn!(
                        "Unrecognized VTK keyword '{}' at line {}, ignoring the rest of the file",
                        other,
                        self.src.line()
                    );
                    break;
                }
            }
        }

        if !have_points {
            debug!("VTK file has no POINTS section");
        }
        Ok(data)
    }

    /// Value count of an array of `tuples` tuples with `width` components each
    fn array_len(&self, tuples: usize, width: usize, what: &str) -> Result<usize> {
        tuples.checked_mul(width).ok_or_else(|| {
            self.src.error(format!("{} of {} x {} values is too large", what, tuples, width))
        })
    }

    fn read_type(&mut self) -> Result<ScalarType> {
        let name = self.src.expect_token("data type")?;
        ScalarType::from_vtk_name(name)
            .ok_or_else(|| MeshError::UnsupportedType(format!("VTK data type '{}'", name)))
    }

    /// Read `count` values; binary blocks start on the line after the keyword
    fn read_values(&mut self, count: usize, ty: ScalarType) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        if self.binary() {
            self.src.skip_line();
            let len = count
                .checked_mul(ty.size())
                .ok_or_else(|| self.src.error("binary block size overflows"))?;
            let mut block = self.src.take(len)?;
            for _ in 0..count {
                values.push(ty.read::<BigEndian, _>(&mut block)?);
            }
        } else {
            for _ in 0..count {
                let token = self.src.expect_token("value")?;
                let value = ty
                    .parse_ascii(token)
                    .ok_or_else(|| self.src.error(format!("invalid {} value '{}'", ty.vtk_name(), token)))?;
                values.push(value);
            }
        }
        Ok(values)
    }

    fn read_indices(&mut self, count: usize, ty: ScalarType) -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        if self.binary() {
            self.src.skip_line();
            let len = count
                .checked_mul(ty.size())
                .ok_or_else(|| self.src.error("binary block size overflows"))?;
            let mut block = self.src.take(len)?;
            for _ in 0..count {
                indices.push(ty.read_index::<BigEndian, _>(&mut block)?);
            }
        } else {
            for _ in 0..count {
                indices.push(self.src.parse_token("index")?);
            }
        }
        Ok(indices)
    }

    fn read_points(&mut self) -> Result<Points> {
        let n: usize = self.src.parse_token("point count")?;
        let ty = self.read_type()?;
        let count = n
            .checked_mul(3)
            .ok_or_else(|| self.src.error(format!("point count {} is too large", n)))?;
        let values = self.read_values(count, ty)?;
        let data = values
            .chunks_exact(3)
            .map(|c| DVec3::new(c[0], c[1], c[2]))
            .collect();
        debug!("Read {} points of type {}", n, ty.vtk_name());
        Ok(Points::from_vec(data, ty))
    }

    fn read_cells(&mut self, keyword: &str) -> Result<CellArray> {
        let first: usize = self.src.parse_token("cell count")?;
        let second: usize = self.src.parse_token("cell array size")?;

        let cells = if self.uses_offsets() {
            self.read_offset_cells(first, second)?
        } else {
            self.read_legacy_cells(first, second)?
        };
        debug!("Read {} {} cells", cells.len(), keyword);
        Ok(cells)
    }

    fn read_legacy_cells(&mut self, n_cells: usize, size: usize) -> Result<CellArray> {
        let raw = self.read_indices(size, ScalarType::Int)?;
        let mut cells = CellArray::new();
        let mut rest = &raw[..];
        for i in 0..n_cells {
            let (&k, tail) = rest
                .split_first()
                .ok_or_else(|| self.src.error(format!("cell array ends before cell {}", i)))?;
            if tail.len() < k {
                return Err(self.src.error(format!(
                    "cell {} lists {} points but only {} values remain",
                    i,
                    k,
                    tail.len()
                )));
            }
            cells.push(&tail[..k]);
            rest = &tail[k..];
        }
        if !rest.is_empty() {
            return Err(self.src.error(format!(
                "cell array size {} does not match its {} cells",
                size, n_cells
            )));
        }
        Ok(cells)
    }

    fn read_offset_cells(&mut self, n_offsets: usize, n_connectivity: usize) -> Result<CellArray> {
        self.src.expect_keyword("OFFSETS")?;
        let ty = self.read_type()?;
        let offsets = self.read_indices(n_offsets, ty)?;

        self.src.expect_keyword("CONNECTIVITY")?;
        let ty = self.read_type()?;
        let connectivity = self.read_indices(n_connectivity, ty)?;

        CellArray::from_raw(offsets, connectivity)
            .map_err(|err| self.src.error(err.to_string()))
    }

    /// Read a POINT_DATA / CELL_DATA block. Point scalars and normals are
    /// kept when `target` is given; every other array is decoded and dropped.
    fn read_attributes(&mut self, n: usize, mut target: Option<&mut PolyData>) -> Result<()> {
        while let Some(keyword) = self.src.peek_token()? {
            match keyword.to_ascii_uppercase().as_str() {
                "SCALARS" => {
                    self.src.next_token()?;
                    let name = self.src.expect_token("scalar name")?.to_string();
                    let ty = self.read_type()?;
                    let rest = self.src.read_line()?.unwrap_or("");
                    let components = match rest.split_whitespace().next() {
                        Some(t) => t
                            .parse()
                            .map_err(|_| self.src.error(format!("invalid component count '{}'", t)))?,
                        None => 1,
                    };
                    match self.src.peek_token()? {
                        Some(t) if t.eq_ignore_ascii_case("LOOKUP_TABLE") => {
                            self.src.next_token()?;
                            self.src.expect_token("lookup table name")?;
                        }
                        _ if self.binary() => {
                            return Err(self.src.error(format!(
                                "scalar array '{}' has no LOOKUP_TABLE line",
                                name
                            )));
                        }
                        _ => {}
                    }
                    let len = self.array_len(n, components, "scalar array")?;
                    let values = self.read_values(len, ty)?;
                    match target.as_deref_mut() {
                        Some(data) if data.point_scalars.is_none() => {
                            let mut array = DataArray::new(name, ty, components);
                            array.values = values;
                            data.point_scalars = Some(array);
                        }
                        _ => debug!("Dropping scalar array '{}'", name),
                    }
                }
                "NORMALS" => {
                    self.src.next_token()?;
                    let name = self.src.expect_token("normals name")?.to_string();
                    let ty = self.read_type()?;
                    let len = self.array_len(n, 3, "normals array")?;
                    let values = self.read_values(len, ty)?;
                    match target.as_deref_mut() {
                        Some(data) if data.point_normals.is_none() => {
                            data.point_normals = Some(
                                values
                                    .chunks_exact(3)
                                    .map(|c| DVec3::new(c[0], c[1], c[2]))
                                    .collect(),
                            );
                        }
                        _ => debug!("Dropping normals array '{}'", name),
                    }
                }
                "VECTORS" | "TENSORS" => {
                    let width = if keyword.eq_ignore_ascii_case("VECTORS") { 3 } else { 9 };
                    self.src.next_token()?;
                    let name = self.src.expect_token("array name")?.to_string();
                    let ty = self.read_type()?;
                    let len = self.array_len(n, width, "attribute array")?;
                    self.read_values(len, ty)?;
                    debug!("Dropping {} array '{}'", keyword, name);
                }
                "TEXTURE_COORDINATES" => {
                    self.src.next_token()?;
                    let name = self.src.expect_token("array name")?.to_string();
                    let dim: usize = self.src.parse_token("texture dimension")?;
                    let ty = self.read_type()?;
                    let len = self.array_len(n, dim, "texture coordinates")?;
                    self.read_values(len, ty)?;
                    debug!("Dropping texture coordinates '{}'", name);
                }
                "COLOR_SCALARS" => {
                    self.src.next_token()?;
                    self.src.expect_token("array name")?;
                    let width: usize = self.src.parse_token("color components")?;
                    let ty = if self.binary() { ScalarType::UnsignedChar } else { ScalarType::Float };
                    let len = self.array_len(n, width, "color scalars")?;
                    self.read_values(len, ty)?;
                }
                "LOOKUP_TABLE" => {
                    self.src.next_token()?;
                    self.src.expect_token("lookup table name")?;
                    let size: usize = self.src.parse_token("lookup table size")?;
                    let ty = if self.binary() { ScalarType::UnsignedChar } else { ScalarType::Float };
                    let len = self.array_len(size, 4, "lookup table")?;
                    self.read_values(len, ty)?;
                }
                "FIELD" => {
                    self.src.next_token()?;
                    self.skip_field()?;
                }
                "METADATA" => {
                    self.src.next_token()?;
                    self.skip_metadata()?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// `FIELD name nArrays` followed by `arrayName nComponents nTuples type` arrays
    fn skip_field(&mut self) -> Result<()> {
        let name = self.src.expect_token("field name")?.to_string();
        let n_arrays: usize = self.src.parse_token("field array count")?;
        for _ in 0..n_arrays {
            let array = self.src.expect_token("field array name")?.to_string();
            let components: usize = self.src.parse_token("field array components")?;
            let tuples: usize = self.src.parse_token("field array tuples")?;
            let ty_name = self.src.expect_token("data type")?;
            if ty_name.eq_ignore_ascii_case("string") {
                return Err(MeshError::UnsupportedType(format!(
                    "string field array '{}'",
                    array
                )));
            }
            let ty = ScalarType::from_vtk_name(ty_name)
                .ok_or_else(|| MeshError::UnsupportedType(format!("VTK data type '{}'", ty_name)))?;
            let len = self.array_len(tuples, components, "field array")?;
            self.read_values(len, ty)?;
            if matches!(self.src.peek_token()?, Some(t) if t.eq_ignore_ascii_case("METADATA")) {
                self.src.next_token()?;
                self.skip_metadata()?;
            }
        }
        debug!("Skipped FIELD '{}' with {} arrays", name, n_arrays);
        Ok(())
    }

    /// METADATA blocks are text in both encodings and end at a blank line
    fn skip_metadata(&mut self) -> Result<()> {
        self.src.skip_line();
        while let Some(line) = self.src.read_line()? {
            if line.trim().is_empty() {
                break;
            }
        }
        Ok(())
    }
}

/// Serialize `data` in the legacy 4.2 layout
pub fn write_vtk_to<W: Write>(data: &PolyData, writer: &mut W, options: &WriteOptions) -> Result<()> {
    let binary = options.encoding == Encoding::Binary;

    let title: String = options
        .header
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(MAX_TITLE_LEN)
        .collect();

    writeln!(writer, "{} {}", MAGIC, WRITE_VERSION)?;
    writeln!(writer, "{}", title)?;
    writeln!(writer, "{}", if binary { "BINARY" } else { "ASCII" })?;
    writeln!(writer, "DATASET POLYDATA")?;

    let ty = data.points.scalar_type;
    writeln!(writer, "POINTS {} {}", data.n_points(), ty.vtk_name())?;
    let coords = data.points.iter().flat_map(|p| [p.x, p.y, p.z]);
    write_values(writer, coords, ty, binary, 9)?;

    let classes = [
        ("VERTICES", &data.verts),
        ("LINES", &data.lines),
        ("POLYGONS", &data.polys),
        ("TRIANGLE_STRIPS", &data.strips),
    ];
    for (keyword, cells) in classes {
        if cells.is_empty() {
            continue;
        }
        writeln!(writer, "{} {} {}", keyword, cells.len(), cells.legacy_size())?;
        write_legacy_cells(writer, cells, binary)?;
    }

    if data.point_scalars.is_some() || data.point_normals.is_some() {
        writeln!(writer, "POINT_DATA {}", data.n_points())?;
    }
    if let Some(scalars) = &data.point_scalars {
        writeln!(
            writer,
            "SCALARS {} {} {}",
            sanitize_name(&scalars.name),
            scalars.scalar_type.vtk_name(),
            scalars.components
        )?;
        writeln!(writer, "LOOKUP_TABLE default")?;
        write_values(
            writer,
            scalars.values.iter().copied(),
            scalars.scalar_type,
            binary,
            9,
        )?;
    }
    if let Some(normals) = &data.point_normals {
        writeln!(writer, "NORMALS Normals float")?;
        let values = normals.iter().flat_map(|n| [n.x, n.y, n.z]);
        write_values(writer, values, ScalarType::Float, binary, 9)?;
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    if name.is_empty() {
        return "scalars".to_string();
    }
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn write_values<W, I>(writer: &mut W, values: I, ty: ScalarType, binary: bool, per_line: usize) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = f64>,
{
    if binary {
        for v in values {
            ty.write::<BigEndian, _>(writer, v)?;
        }
        writeln!(writer)?;
        return Ok(());
    }

    let mut on_line = 0;
    for v in values {
        if on_line > 0 {
            write!(writer, " ")?;
        }
        write!(writer, "{}", ty.format_ascii(v))?;
        on_line += 1;
        if on_line == per_line {
            writeln!(writer)?;
            on_line = 0;
        }
    }
    if on_line > 0 {
        writeln!(writer)?;
    }
    Ok(())
}

fn write_legacy_cells<W: Write>(writer: &mut W, cells: &CellArray, binary: bool) -> Result<()> {
    let to_i32 = |v: usize| {
        i32::try_from(v).map_err(|_| {
            MeshError::InvalidData(format!("value {} does not fit the legacy 32-bit cell layout", v))
        })
    };

    for cell in cells.iter() {
        if binary {
            writer.write_i32::<BigEndian>(to_i32(cell.len())?)?;
            for &idx in cell {
                writer.write_i32::<BigEndian>(to_i32(idx)?)?;
            }
        } else {
            write!(writer, "{}", cell.len())?;
            for &idx in cell {
                write!(writer, " {}", idx)?;
            }
            writeln!(writer)?;
        }
    }
    if binary {
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;
    use tempfile::NamedTempFile;

    const TRIANGLE_ASCII: &str = "# vtk DataFile Version 3.0
vtk output
ASCII
DATASET POLYDATA
POINTS 3 float
0 0 0 1 0 0
0.5 1 0
POLYGONS 1 4
3 0 1 2
";

    fn options(encoding: Encoding) -> WriteOptions {
        WriteOptions {
            encoding,
            ..WriteOptions::default()
        }
    }

    fn sample() -> PolyData {
        let points = Points::from_vec(
            vec![
                dvec3(0.0, 0.0, 0.0),
                dvec3(1.5, 0.0, -2.25),
                dvec3(0.125, 1.0, 0.0),
                dvec3(3.0, 4.0, 5.0),
            ],
            ScalarType::Float,
        );
        let mut data = PolyData::from_points(points);
        data.verts.push(&[3]);
        data.lines.push(&[0, 3]);
        data.polys.push(&[0, 1, 2]);
        data.strips.push(&[0, 1, 2, 3]);
        let mut scalars = DataArray::new("height", ScalarType::Float, 1);
        scalars.values = vec![0.0, -2.25, 0.5, 5.0];
        data.point_scalars = Some(scalars);
        data
    }

    #[test]
    fn test_parse_ascii_triangle() {
        let data = parse_vtk(TRIANGLE_ASCII.as_bytes()).unwrap();
        assert_eq!(data.n_points(), 3);
        assert_eq!(data.n_polys(), 1);
        assert_eq!(data.points.scalar_type, ScalarType::Float);
        assert_eq!(data.points.data[2], dvec3(0.5, 1.0, 0.0));
        assert_eq!(data.polys.get(0), Some(&[0usize, 1, 2][..]));
    }

    #[test]
    fn test_read_vtk_from_file() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), TRIANGLE_ASCII).unwrap();
        let data = read_vtk(temp.path()).unwrap();
        assert_eq!(data.n_points(), 3);
    }

    #[test]
    fn test_ascii_roundtrip_keeps_everything() {
        let data = sample();
        let mut buf = Vec::new();
        write_vtk_to(&data, &mut buf, &options(Encoding::Ascii)).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("# vtk DataFile Version 4.2\nvtk output\nASCII\n"));
        assert!(text.contains("TRIANGLE_STRIPS 1 5\n4 0 1 2 3\n"));
        assert!(text.contains("0.125"));

        let back = parse_vtk(&buf).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_binary_roundtrip_keeps_everything() {
        let data = sample();
        let mut buf = Vec::new();
        write_vtk_to(&data, &mut buf, &options(Encoding::Binary)).unwrap();

        let back = parse_vtk(&buf).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_binary_points_are_big_endian() {
        let mut data = PolyData::from_points(Points::from_vec(
            vec![dvec3(1.0, 2.0, 3.0)],
            ScalarType::Float,
        ));
        data.verts.push(&[0]);
        let mut buf = Vec::new();
        write_vtk_to(&data, &mut buf, &options(Encoding::Binary)).unwrap();

        let marker = b"POINTS 1 float\n";
        let start = buf
            .windows(marker.len())
            .position(|w| w == marker)
            .unwrap()
            + marker.len();
        assert_eq!(&buf[start..start + 4], &1.0f32.to_be_bytes());
        assert_eq!(&buf[start + 8..start + 12], &3.0f32.to_be_bytes());
    }

    #[test]
    fn test_binary_block_may_contain_newlines() {
        // every byte of the value is '\n'
        let value = f32::from_be_bytes([0x0a, 0x0a, 0x0a, 0x0a]) as f64;
        let data = PolyData::from_points(Points::from_vec(
            vec![dvec3(value, value, value)],
            ScalarType::Float,
        ));
        let mut buf = Vec::new();
        write_vtk_to(&data, &mut buf, &options(Encoding::Binary)).unwrap();
        let back = parse_vtk(&buf).unwrap();
        assert_eq!(back.points.data[0].x, value);
    }

    #[test]
    fn test_double_precision_survives() {
        let data = PolyData::from_points(Points::from_vec(
            vec![dvec3(0.1, 1.0 / 3.0, -1e-12)],
            ScalarType::Double,
        ));
        for encoding in [Encoding::Ascii, Encoding::Binary] {
            let mut buf = Vec::new();
            write_vtk_to(&data, &mut buf, &options(encoding)).unwrap();
            let back = parse_vtk(&buf).unwrap();
            assert_eq!(back.points, data.points);
        }
    }

    #[test]
    fn test_version5_offsets_layout() {
        let content = "# vtk DataFile Version 5.1
vtk output
ASCII
DATASET POLYDATA
POINTS 4 double
0 0 0 1 0 0 1 1 0
0 1 0
POLYGONS 3 7
OFFSETS vtktypeint64
0 3 7
CONNECTIVITY vtktypeint64
0 1 2 0 1 2 3
";
        let data = parse_vtk(content.as_bytes()).unwrap();
        assert_eq!(data.n_polys(), 2);
        assert_eq!(data.polys.get(1), Some(&[0usize, 1, 2, 3][..]));
        assert_eq!(data.points.scalar_type, ScalarType::Double);
    }

    #[test]
    fn test_version5_binary_offsets_layout() {
        let mut bytes = b"# vtk DataFile Version 5.1\nt\nBINARY\nDATASET POLYDATA\nPOINTS 3 float\n".to_vec();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(b"\nPOLYGONS 2 3\nOFFSETS vtktypeint64\n");
        for v in [0i64, 3] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(b"\nCONNECTIVITY vtktypeint64\n");
        for v in [0i64, 1, 2] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(b"\n");

        let data = parse_vtk(&bytes).unwrap();
        assert_eq!(data.n_points(), 3);
        assert_eq!(data.n_polys(), 1);
        assert_eq!(data.points.data[1], dvec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_point_data_scalars_and_skipped_arrays() {
        let content = "# vtk DataFile Version 3.0
with attributes
ASCII
DATASET POLYDATA
FIELD FieldData 1
TimeValue 1 1 double
0.5
POINTS 2 float
0 0 0 1 1 1
LINES 1 3
2 0 1
CELL_DATA 1
SCALARS cell_id int 1
LOOKUP_TABLE default
7
POINT_DATA 2
VECTORS velocity float
1 0 0 0 1 0
SCALARS depth float
LOOKUP_TABLE default
-4.5 10
TEXTURE_COORDINATES uv 2 float
0 0 1 1
";
        let data = parse_vtk(content.as_bytes()).unwrap();
        assert_eq!(data.n_points(), 2);
        assert_eq!(data.n_lines(), 1);
        let scalars = data.point_scalars.as_ref().unwrap();
        assert_eq!(scalars.name, "depth");
        assert_eq!(scalars.values, vec![-4.5, 10.0]);
        assert_eq!(data.scalar_range(), Some((-4.5, 10.0)));
    }

    #[test]
    fn test_metadata_block_is_skipped() {
        let content = "# vtk DataFile Version 5.1
vtk output
ASCII
DATASET POLYDATA
POINTS 1 float
1 2 3
METADATA
INFORMATION 0

VERTICES 2 1
OFFSETS vtktypeint64
0 1
CONNECTIVITY vtktypeint64
0
";
        let data = parse_vtk(content.as_bytes()).unwrap();
        assert_eq!(data.n_verts(), 1);
    }

    #[test]
    fn test_rejects_other_datasets() {
        let content = "# vtk DataFile Version 3.0\nt\nASCII\nDATASET STRUCTURED_POINTS\n";
        let err = parse_vtk(content.as_bytes()).unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rejects_missing_magic() {
        let err = parse_vtk(b"ply\nformat ascii 1.0\n").unwrap_err();
        assert!(err.to_string().contains("header"));
    }

    #[test]
    fn test_rejects_bit_points() {
        let content = "# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\nPOINTS 1 bit\n1 1 1\n";
        let err = parse_vtk(content.as_bytes()).unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedType(_)));
    }

    #[test]
    fn test_rejects_truncated_points() {
        let content = "# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\nPOINTS 2 float\n0 0 0 1\n";
        let err = parse_vtk(content.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("unexpected end of file"));
    }

    #[test]
    fn test_rejects_dangling_cell_index() {
        let content = "# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\nPOINTS 1 float\n0 0 0\nVERTICES 1 2\n1 5\n";
        let err = parse_vtk(content.as_bytes()).unwrap_err();
        assert!(matches!(err, MeshError::InvalidData(_)));
    }

    #[test]
    fn test_rejects_inconsistent_cell_size() {
        let content = "# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\nPOINTS 3 float\n0 0 0 1 0 0 0 1 0\nPOLYGONS 1 5\n3 0 1 2 0\n";
        let err = parse_vtk(content.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_empty_polydata() {
        let content = "# vtk DataFile Version 3.0\nempty\nASCII\nDATASET POLYDATA\nPOINTS 0 float\n";
        let data = parse_vtk(content.as_bytes()).unwrap();
        assert_eq!(data.n_points(), 0);
        assert!(data.bounds().is_none());
    }

    #[test]
    fn test_title_is_single_line() {
        let data = PolyData::new();
        let opts = WriteOptions {
            header: "two\nlines".to_string(),
            ..WriteOptions::default()
        };
        let mut buf = Vec::new();
        write_vtk_to(&data, &mut buf, &opts).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().nth(1), Some("two lines"));
    }

    fn attribute_block(block: &str) -> String {
        format!(
            "# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\nPOINTS 2 float\n0 0 0 1 1 1\n{}",
            block
        )
    }

    #[test]
    fn test_rejects_oversized_attribute_arrays() {
        let huge = "9223372036854775808";
        let blocks = [
            format!("POINT_DATA 2\nSCALARS s float {}\nLOOKUP_TABLE default\n0 0\n", huge),
            format!("CELL_DATA {}\nSCALARS s float 3\nLOOKUP_TABLE default\n0\n", huge),
            format!("CELL_DATA {}\nNORMALS n float\n0\n", huge),
            format!("CELL_DATA {}\nVECTORS v float\n0\n", huge),
            format!("CELL_DATA {}\nTENSORS t float\n0\n", huge),
            format!("POINT_DATA 2\nTEXTURE_COORDINATES t {} float\n0\n", huge),
            format!("POINT_DATA 2\nCOLOR_SCALARS c {}\n0\n", huge),
            format!("POINT_DATA 2\nLOOKUP_TABLE lut {}\n0\n", huge),
            format!("FIELD f 1\na 2 {} float\n0\n", huge),
        ];
        for block in blocks {
            let err = parse_vtk(attribute_block(&block).as_bytes()).unwrap_err();
            assert!(err.to_string().contains("too large"), "{}: {}", block, err);
        }
    }
}
