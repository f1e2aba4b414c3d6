//! PLY File Format Support
//!
//! Stanford PLY (Polygon File Format) supports both ASCII and binary formats.
//!
//! File layout:
//! - Header with element definitions, always ASCII, ending in `end_header`
//! - Vertex element (x, y, z and optionally nx, ny, nz)
//! - Face element (list of vertex indices)
//!
//! Other elements and properties are decoded so the body stays in sync, then
//! dropped.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use glam::DVec3;
use log::{debug, warn};

use super::source::Source;
use super::{Encoding, Endianness, WriteOptions};
use crate::error::{MeshError, Result};
use crate::poly_data::{CellArray, PolyData, Points, ScalarType};

/// PLY body encoding as named on the `format` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyFormat {
    /// ASCII text format (human-readable)
    Ascii,
    /// Binary little-endian format
    BinaryLittleEndian,
    /// Binary big-endian format
    BinaryBigEndian,
}

impl PlyFormat {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "ascii" => Some(PlyFormat::Ascii),
            "binary_little_endian" => Some(PlyFormat::BinaryLittleEndian),
            "binary_big_endian" => Some(PlyFormat::BinaryBigEndian),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            PlyFormat::Ascii => "ascii",
            PlyFormat::BinaryLittleEndian => "binary_little_endian",
            PlyFormat::BinaryBigEndian => "binary_big_endian",
        }
    }

    fn from_options(options: &WriteOptions) -> Self {
        match (options.encoding, options.byte_order) {
            (Encoding::Ascii, _) => PlyFormat::Ascii,
            (Encoding::Binary, Endianness::Little) => PlyFormat::BinaryLittleEndian,
            (Encoding::Binary, Endianness::Big) => PlyFormat::BinaryBigEndian,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Property {
    Scalar { name: String, ty: ScalarType },
    List { name: String, count_ty: ScalarType, item_ty: ScalarType },
}

#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Debug)]
struct Header {
    format: PlyFormat,
    elements: Vec<Element>,
}

/// Read mesh from PLY file
pub fn read_ply(path: impl AsRef<Path>) -> Result<PolyData> {
    let bytes = std::fs::read(path)?;
    parse_ply(&bytes)
}

/// Write mesh to PLY file
pub fn write_ply(data: &PolyData, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_ply_to(data, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}

pub fn parse_ply(bytes: &[u8]) -> Result<PolyData> {
    let mut src = Source::new(bytes);
    let header = read_header(&mut src)?;
    debug!(
        "PLY header: {}, elements [{}]",
        header.format.name(),
        header
            .elements
            .iter()
            .map(|e| format!("{} {}", e.name, e.count))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let data = match header.format {
        PlyFormat::Ascii => read_body(&header, &mut AsciiBody { src }),
        PlyFormat::BinaryLittleEndian => read_body(&header, &mut BinaryBody::<LittleEndian>::new(src)),
        PlyFormat::BinaryBigEndian => read_body(&header, &mut BinaryBody::<BigEndian>::new(src)),
    }?;
    data.validate()?;
    Ok(data)
}

fn read_header(src: &mut Source<'_>) -> Result<Header> {
    let magic = src.read_line()?.ok_or_else(|| src.error("empty file"))?;
    if magic.trim() != "ply" {
        return Err(src.error("not a PLY file"));
    }

    let mut format = None;
    let mut elements: Vec<Element> = Vec::new();

    loop {
        let line = src
            .read_line()?
            .ok_or_else(|| src.error("header ends before end_header"))?;
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "end_header" => break,
            "comment" | "obj_info" => {}
            "format" => {
                let name = parts.next().unwrap_or_default();
                format = Some(PlyFormat::from_name(name).ok_or_else(|| {
                    MeshError::UnsupportedFormat(format!("PLY format '{}'", name))
                })?);
                if let Some(version) = parts.next() {
                    if version != "1.0" {
                        warn!("PLY version {} is not 1.0, decoding anyway", version);
                    }
                }
            }
            "element" => {
                let name = parts
                    .next()
                    .ok_or_else(|| src.error("element without a name"))?;
                let count = parts
                    .next()
                    .and_then(|c| c.parse().ok())
                    .ok_or_else(|| src.error(format!("element '{}' has no valid count", name)))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            "property" => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| src.error("property before any element"))?;
                element.properties.push(parse_property(src, parts)?);
            }
            other => {
                return Err(src.error(format!("unknown header keyword '{}'", other)));
            }
        }
    }

    let format = format.ok_or_else(|| src.error("missing format line"))?;
    if let Some(empty) = elements.iter().find(|e| e.count > 0 && e.properties.is_empty()) {
        return Err(src.error(format!(
            "element '{}' has {} rows but no properties",
            empty.name, empty.count
        )));
    }
    Ok(Header { format, elements })
}

fn parse_property<'a>(src: &Source<'_>, mut parts: impl Iterator<Item = &'a str>) -> Result<Property> {
    let lookup = |name: &str| {
        ScalarType::from_ply_name(name)
            .ok_or_else(|| MeshError::UnsupportedType(format!("PLY type '{}'", name)))
    };
    let mut next = |what: &str| {
        parts
            .next()
            .ok_or_else(|| src.error(format!("property definition lacks its {}", what)))
    };

    let first = next("type")?;
    if first == "list" {
        let count_ty = lookup(next("count type")?)?;
        let item_ty = lookup(next("item type")?)?;
        let name = next("name")?.to_string();
        Ok(Property::List { name, count_ty, item_ty })
    } else {
        let ty = lookup(first)?;
        let name = next("name")?.to_string();
        Ok(Property::Scalar { name, ty })
    }
}

/// Value source for the body of a PLY file
trait BodyReader {
    fn value(&mut self, ty: ScalarType) -> Result<f64>;

    fn count(&mut self, ty: ScalarType) -> Result<usize>;
}

struct AsciiBody<'a> {
    src: Source<'a>,
}

impl BodyReader for AsciiBody<'_> {
    fn value(&mut self, ty: ScalarType) -> Result<f64> {
        let token = self.src.expect_token("property value")?;
        ty.parse_ascii(token)
            .ok_or_else(|| self.src.error(format!("invalid {} value '{}'", ty.vtk_name(), token)))
    }

    fn count(&mut self, ty: ScalarType) -> Result<usize> {
        let value = self.value(ty)?;
        if value < 0.0 || value.fract() != 0.0 {
            return Err(self.src.error(format!("invalid list count or index {}", value)));
        }
        Ok(value as usize)
    }
}

struct BinaryBody<'a, B> {
    body: &'a [u8],
    _order: std::marker::PhantomData<B>,
}

impl<'a, B: ByteOrder> BinaryBody<'a, B> {
    fn new(src: Source<'a>) -> Self {
        Self {
            body: src.remaining(),
            _order: std::marker::PhantomData,
        }
    }
}

impl<B: ByteOrder> BodyReader for BinaryBody<'_, B> {
    fn value(&mut self, ty: ScalarType) -> Result<f64> {
        ty.read::<B, _>(&mut self.body).map_err(truncated)
    }

    fn count(&mut self, ty: ScalarType) -> Result<usize> {
        ty.read_index::<B, _>(&mut self.body).map_err(truncated)
    }
}

fn truncated(err: std::io::Error) -> MeshError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        MeshError::Format("PLY body ends before all elements were read".to_string())
    } else {
        MeshError::Format(format!("PLY body: {}", err))
    }
}

fn read_body<R: BodyReader>(header: &Header, body: &mut R) -> Result<PolyData> {
    let mut data = PolyData::new();
    let mut have_vertices = false;

    for element in &header.elements {
        match element.name.as_str() {
            "vertex" if !have_vertices => {
                read_vertices(element, body, &mut data)?;
                have_vertices = true;
            }
            "face" if data.polys.is_empty() => {
                data.polys = read_faces(element, body)?;
            }
            _ => {
                skip_element(element, body)?;
                debug!("Dropped PLY element '{}' ({} items)", element.name, element.count);
            }
        }
    }

    if !have_vertices {
        return Err(MeshError::Format("PLY file has no vertex element".to_string()));
    }
    Ok(data)
}

fn read_vertices<R: BodyReader>(element: &Element, body: &mut R, data: &mut PolyData) -> Result<()> {
    let position = |wanted: &str| {
        element.properties.iter().position(
            |p| matches!(p, Property::Scalar { name, .. } if name == wanted),
        )
    };

    let (Some(ix), Some(iy), Some(iz)) = (position("x"), position("y"), position("z")) else {
        return Err(MeshError::Format(
            "PLY vertex element needs x, y and z properties".to_string(),
        ));
    };
    let normal_slots = match (position("nx"), position("ny"), position("nz")) {
        (Some(a), Some(b), Some(c)) => Some([a, b, c]),
        _ => None,
    };

    let point_ty = match &element.properties[ix] {
        Property::Scalar { ty, .. } => *ty,
        Property::List { .. } => ScalarType::Float,
    };

    let mut points = Vec::with_capacity(element.count.min(1 << 20));
    let mut normals = Vec::new();
    let mut row = vec![0.0; element.properties.len()];

    for _ in 0..element.count {
        for (slot, property) in element.properties.iter().enumerate() {
            match property {
                Property::Scalar { ty, .. } => row[slot] = body.value(*ty)?,
                Property::List { count_ty, item_ty, .. } => {
                    let n = body.count(*count_ty)?;
                    for _ in 0..n {
                        body.value(*item_ty)?;
                    }
                }
            }
        }
        points.push(DVec3::new(row[ix], row[iy], row[iz]));
        if let Some([a, b, c]) = normal_slots {
            normals.push(DVec3::new(row[a], row[b], row[c]));
        }
    }

    data.points = Points::from_vec(points, point_ty);
    if normal_slots.is_some() {
        data.point_normals = Some(normals);
    }
    debug!("Read {} PLY vertices", data.n_points());
    Ok(())
}

fn read_faces<R: BodyReader>(element: &Element, body: &mut R) -> Result<CellArray> {
    let index_slot = element.properties.iter().position(|p| {
        matches!(p, Property::List { name, .. } if name == "vertex_indices" || name == "vertex_index")
    });
    if index_slot.is_none() {
        warn!("PLY face element has no vertex_indices list, faces dropped");
    }

    let mut cells = CellArray::new();
    let mut cell = Vec::new();
    for _ in 0..element.count {
        for (slot, property) in element.properties.iter().enumerate() {
            match property {
                Property::Scalar { ty, .. } => {
                    body.value(*ty)?;
                }
                Property::List { count_ty, item_ty, .. } => {
                    let n = body.count(*count_ty)?;
                    let keep = Some(slot) == index_slot;
                    cell.clear();
                    for _ in 0..n {
                        if keep {
                            cell.push(body.count(*item_ty)?);
                        } else {
                            body.value(*item_ty)?;
                        }
                    }
                    if keep {
                        cells.push(&cell);
                    }
                }
            }
        }
    }
    debug!("Read {} PLY faces", cells.len());
    Ok(cells)
}

fn skip_element<R: BodyReader>(element: &Element, body: &mut R) -> Result<()> {
    for _ in 0..element.count {
        for property in &element.properties {
            match property {
                Property::Scalar { ty, .. } => {
                    body.value(*ty)?;
                }
                Property::List { count_ty, item_ty, .. } => {
                    let n = body.count(*count_ty)?;
                    for _ in 0..n {
                        body.value(*item_ty)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Serialize `data` as PLY. Polygons and the triangles of any strips become
/// faces; vertex and line cells have no PLY counterpart and are dropped.
pub fn write_ply_to<W: Write>(data: &PolyData, writer: &mut W, options: &WriteOptions) -> Result<()> {
    let format = PlyFormat::from_options(options);
    let point_ty = data.points.scalar_type;
    let (coord_ty, coord_name) = match point_ty.ply_name() {
        Some(name) => (point_ty, name),
        None => (ScalarType::Double, "double"),
    };

    if data.n_verts() + data.n_lines() > 0 {
        warn!(
            "PLY cannot store vertex or line cells, dropping {} vertices and {} lines",
            data.n_verts(),
            data.n_lines()
        );
    }
    if data.point_scalars.is_some() {
        debug!("Point scalars are not written to PLY");
    }

    let strip_triangles = data.strips.strip_triangles();
    let n_faces = data.n_polys() + strip_triangles.len();

    writeln!(writer, "ply")?;
    writeln!(writer, "format {} 1.0", format.name())?;
    for line in options.header.lines().filter(|l| !l.trim().is_empty()) {
        writeln!(writer, "comment {}", line.trim())?;
    }
    writeln!(writer, "element vertex {}", data.n_points())?;
    writeln!(writer, "property {} x", coord_name)?;
    writeln!(writer, "property {} y", coord_name)?;
    writeln!(writer, "property {} z", coord_name)?;
    if data.point_normals.is_some() {
        writeln!(writer, "property float nx")?;
        writeln!(writer, "property float ny")?;
        writeln!(writer, "property float nz")?;
    }
    writeln!(writer, "element face {}", n_faces)?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    let faces = data
        .polys
        .iter()
        .chain(strip_triangles.iter().map(|t| &t[..]));

    match format {
        PlyFormat::Ascii => write_ascii_body(data, faces, writer, coord_ty),
        PlyFormat::BinaryLittleEndian => {
            write_binary_body::<LittleEndian, _, _>(data, faces, writer, coord_ty)
        }
        PlyFormat::BinaryBigEndian => {
            write_binary_body::<BigEndian, _, _>(data, faces, writer, coord_ty)
        }
    }
}

fn face_header(face: &[usize]) -> Result<u8> {
    u8::try_from(face.len()).map_err(|_| {
        MeshError::InvalidData(format!("face with {} vertices exceeds the uchar count", face.len()))
    })
}

fn face_index(idx: usize) -> Result<i32> {
    i32::try_from(idx)
        .map_err(|_| MeshError::InvalidData(format!("vertex index {} exceeds int range", idx)))
}

fn write_ascii_body<'f, W, F>(data: &PolyData, faces: F, writer: &mut W, coord_ty: ScalarType) -> Result<()>
where
    W: Write,
    F: Iterator<Item = &'f [usize]>,
{
    for (i, p) in data.points.iter().enumerate() {
        write!(
            writer,
            "{} {} {}",
            coord_ty.format_ascii(p.x),
            coord_ty.format_ascii(p.y),
            coord_ty.format_ascii(p.z)
        )?;
        if let Some(n) = data.point_normals.as_ref().and_then(|n| n.get(i)) {
            write!(
                writer,
                " {} {} {}",
                ScalarType::Float.format_ascii(n.x),
                ScalarType::Float.format_ascii(n.y),
                ScalarType::Float.format_ascii(n.z)
            )?;
        }
        writeln!(writer)?;
    }

    for face in faces {
        write!(writer, "{}", face_header(face)?)?;
        for &idx in face {
            write!(writer, " {}", face_index(idx)?)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_binary_body<'f, B, W, F>(data: &PolyData, faces: F, writer: &mut W, coord_ty: ScalarType) -> Result<()>
where
    B: ByteOrder,
    W: Write,
    F: Iterator<Item = &'f [usize]>,
{
    for (i, p) in data.points.iter().enumerate() {
        coord_ty.write::<B, _>(writer, p.x)?;
        coord_ty.write::<B, _>(writer, p.y)?;
        coord_ty.write::<B, _>(writer, p.z)?;
        if let Some(n) = data.point_normals.as_ref().and_then(|n| n.get(i)) {
            writer.write_f32::<B>(n.x as f32)?;
            writer.write_f32::<B>(n.y as f32)?;
            writer.write_f32::<B>(n.z as f32)?;
        }
    }

    for face in faces {
        writer.write_u8(face_header(face)?)?;
        for &idx in face {
            writer.write_i32::<B>(face_index(idx)?)?;
        }
    }
    Ok(())
}
