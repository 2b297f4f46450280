//! PLY point-cloud decoder.
//!
//! Parsing is done by `ply-rs`; this module checks the declared element
//! counts against the body, then picks `x y z` and optional
//! `red green blue` out of the `vertex` element. Colors keep the file's
//! range and are tagged with the declared channel type so the loader can
//! normalize them.

use futures::future::BoxFuture;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, ElementDef, Encoding, Header, Property, PropertyType, ScalarType};

use crate::assets::decoders::{ColorDepth, DecodedPointCloud, PointCloudDecoder};
use crate::assets::io::{AssetReader, FileAssetReader};
use crate::errors::{MirageError, Result};

const VERTEX: &str = "vertex";

fn ply_error(msg: impl Into<String>) -> MirageError {
    MirageError::PlyError(msg.into())
}

fn scalar_size(ty: &ScalarType) -> usize {
    match ty {
        ScalarType::Char | ScalarType::UChar => 1,
        ScalarType::Short | ScalarType::UShort => 2,
        ScalarType::Int | ScalarType::UInt | ScalarType::Float => 4,
        ScalarType::Double => 8,
    }
}

/// Smallest encoded size of one record: lists count only their length prefix.
fn min_record_size(element: &ElementDef) -> usize {
    element
        .properties
        .values()
        .map(|p| match &p.data_type {
            PropertyType::Scalar(ty) | PropertyType::List(ty, _) => scalar_size(ty),
        })
        .sum()
}

/// Rejects headers whose element counts cannot fit in `body`, before any
/// record is read.
fn check_declared_counts(header: &Header, body: &[u8]) -> Result<()> {
    match header.encoding {
        Encoding::Ascii => {
            let records = header
                .elements
                .values()
                .try_fold(0usize, |acc, e| acc.checked_add(e.count))
                .ok_or_else(|| ply_error("element counts overflow"))?;
            let lines = body
                .split(|&b| b == b'\n')
                .filter(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
                .count();
            if records > lines {
                return Err(ply_error(format!(
                    "header declares {records} records but the body has {lines} lines"
                )));
            }
        }
        Encoding::BinaryLittleEndian | Encoding::BinaryBigEndian => {
            let needed = header
                .elements
                .values()
                .try_fold(0usize, |acc, e| {
                    e.count
                        .checked_mul(min_record_size(e))
                        .and_then(|bytes| acc.checked_add(bytes))
                })
                .ok_or_else(|| ply_error("element sizes overflow"))?;
            if needed > body.len() {
                return Err(ply_error(format!(
                    "header needs at least {needed} bytes but the body has {}",
                    body.len()
                )));
            }
        }
    }
    Ok(())
}

fn as_f64(property: &Property) -> Option<f64> {
    Some(match *property {
        Property::Char(v) => f64::from(v),
        Property::UChar(v) => f64::from(v),
        Property::Short(v) => f64::from(v),
        Property::UShort(v) => f64::from(v),
        Property::Int(v) => f64::from(v),
        Property::UInt(v) => f64::from(v),
        Property::Float(v) => f64::from(v),
        Property::Double(v) => v,
        _ => return None,
    })
}

fn depth_of(ty: &ScalarType) -> ColorDepth {
    match ty {
        ScalarType::Char | ScalarType::UChar => ColorDepth::U8,
        ScalarType::Short | ScalarType::UShort => ColorDepth::U16,
        ScalarType::Int | ScalarType::UInt => ColorDepth::U32,
        ScalarType::Float | ScalarType::Double => ColorDepth::Unit,
    }
}

/// Property names read from the vertex element.
struct VertexLayout {
    position: [String; 3],
    color: Option<([String; 3], ColorDepth)>,
}

impl VertexLayout {
    fn from_element(element: &ElementDef) -> Result<Self> {
        let find = |names: &[&str]| {
            element
                .properties
                .values()
                .find(|p| names.contains(&p.name.as_str()) && matches!(p.data_type, PropertyType::Scalar(_)))
        };
        let axis = |n: &str| {
            find(&[n])
                .map(|p| p.name.clone())
                .ok_or_else(|| ply_error(format!("vertex element has no scalar '{n}'")))
        };
        let position = [axis("x")?, axis("y")?, axis("z")?];

        let color = match (
            find(&["red", "r", "diffuse_red"]),
            find(&["green", "g", "diffuse_green"]),
            find(&["blue", "b", "diffuse_blue"]),
        ) {
            (Some(r), Some(g), Some(b)) => {
                let depth = match &r.data_type {
                    PropertyType::Scalar(ty) => depth_of(ty),
                    PropertyType::List(..) => ColorDepth::Unit,
                };
                Some(([r.name.clone(), g.name.clone(), b.name.clone()], depth))
            }
            _ => None,
        };
        Ok(Self { position, color })
    }
}

fn read_triple(vertex: &DefaultElement, names: &[String; 3]) -> Result<[f32; 3]> {
    let mut out = [0.0; 3];
    for (slot, name) in out.iter_mut().zip(names) {
        let value = vertex
            .get(name)
            .and_then(as_f64)
            .ok_or_else(|| ply_error(format!("vertex record is missing '{name}'")))?;
        *slot = value as f32;
    }
    Ok(out)
}

/// Parses a PLY file held in memory.
pub fn parse_ply(bytes: &[u8]) -> Result<DecodedPointCloud> {
    let parser = Parser::<DefaultElement>::new();
    let mut body = bytes;
    let header = parser
        .read_header(&mut body)
        .map_err(|e| ply_error(format!("invalid header: {e}")))?;

    let vertex_def = header
        .elements
        .get(VERTEX)
        .ok_or_else(|| ply_error("no vertex element"))?;
    let layout = VertexLayout::from_element(vertex_def)?;
    check_declared_counts(&header, body)?;

    let payload = parser
        .read_payload(&mut body, &header)
        .map_err(|e| ply_error(format!("invalid body: {e}")))?;
    let vertices = payload.get(VERTEX).map(Vec::as_slice).unwrap_or_default();

    let mut positions = Vec::with_capacity(vertices.len());
    let mut colors = layout.color.as_ref().map(|_| Vec::with_capacity(vertices.len()));
    for vertex in vertices {
        positions.push(read_triple(vertex, &layout.position)?);
        if let (Some(colors), Some((names, _))) = (colors.as_mut(), layout.color.as_ref()) {
            colors.push(read_triple(vertex, names)?);
        }
    }

    log::debug!(
        "Decoded {} PLY vertices ({})",
        positions.len(),
        if colors.is_some() { "colored" } else { "uncolored" }
    );

    Ok(DecodedPointCloud {
        positions,
        colors,
        color_depth: layout.color.map_or(ColorDepth::Unit, |(_, depth)| depth),
    })
}

/// Built-in [`PointCloudDecoder`] for `.ply` files.
#[derive(Debug, Clone, Default)]
pub struct PlyDecoder<R = FileAssetReader> {
    reader: R,
}

impl<R: AssetReader> PlyDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: AssetReader> PointCloudDecoder for PlyDecoder<R> {
    fn decode<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<DecodedPointCloud>> {
        Box::pin(async move {
            let bytes = self.reader.read_bytes(path).await?;
            parse_ply(&bytes)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XYZ: &str = "property float x\nproperty float y\nproperty float z\n";

    #[test]
    fn parses_ascii_with_uchar_colors() {
        let src = format!(
            "ply\nformat ascii 1.0\ncomment scan\nelement vertex 2\n{XYZ}property uchar red\nproperty uchar green\nproperty uchar blue\nend_header\n0 0 0 255 0 0\n1 2 3 0 128 255\n"
        );
        let cloud = parse_ply(src.as_bytes()).unwrap();
        assert_eq!(cloud.positions, vec![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]]);
        assert_eq!(cloud.colors.unwrap(), vec![[255.0, 0.0, 0.0], [0.0, 128.0, 255.0]]);
        assert_eq!(cloud.color_depth, ColorDepth::U8);
    }

    #[test]
    fn ushort_colors_are_tagged_sixteen_bit() {
        let src = format!(
            "ply\nformat ascii 1.0\nelement vertex 1\n{XYZ}property ushort red\nproperty ushort green\nproperty ushort blue\nend_header\n0 0 0 65535 0 257\n"
        );
        let cloud = parse_ply(src.as_bytes()).unwrap();
        assert_eq!(cloud.color_depth, ColorDepth::U16);
        assert_eq!(cloud.colors.unwrap(), vec![[65535.0, 0.0, 257.0]]);
    }

    #[test]
    fn parses_binary_little_endian_without_colors() {
        let mut src = format!("ply\nformat binary_little_endian 1.0\nelement vertex 2\n{XYZ}end_header\n").into_bytes();
        for v in [1.0f32, 2.0, 3.0, -1.0, -2.0, -3.0] {
            src.extend_from_slice(&v.to_le_bytes());
        }
        let cloud = parse_ply(&src).unwrap();
        assert_eq!(cloud.positions, vec![[1.0, 2.0, 3.0], [-1.0, -2.0, -3.0]]);
        assert!(cloud.colors.is_none());
        assert_eq!(cloud.color_depth, ColorDepth::Unit);
    }

    #[test]
    fn parses_binary_big_endian_with_float_colors() {
        let mut src = b"ply\nformat binary_big_endian 1.0\nelement vertex 1\nproperty double x\nproperty double y\nproperty double z\nproperty float red\nproperty float green\nproperty float blue\nend_header\n".to_vec();
        for v in [0.5f64, 1.5, 2.5] {
            src.extend_from_slice(&v.to_be_bytes());
        }
        for v in [0.25f32, 0.5, 1.0] {
            src.extend_from_slice(&v.to_be_bytes());
        }
        let cloud = parse_ply(&src).unwrap();
        assert_eq!(cloud.positions, vec![[0.5, 1.5, 2.5]]);
        assert_eq!(cloud.colors.unwrap(), vec![[0.25, 0.5, 1.0]]);
        assert_eq!(cloud.color_depth, ColorDepth::Unit);
    }

    #[test]
    fn face_element_after_vertices_is_ignored() {
        let mut src = format!(
            "ply\nformat binary_little_endian 1.0\nelement vertex 1\n{XYZ}element face 1\nproperty list uchar int vertex_indices\nend_header\n"
        )
        .into_bytes();
        for v in [1.0f32, 2.0, 3.0] {
            src.extend_from_slice(&v.to_le_bytes());
        }
        src.push(3);
        for i in [0i32, 0, 0] {
            src.extend_from_slice(&i.to_le_bytes());
        }
        let cloud = parse_ply(&src).unwrap();
        assert_eq!(cloud.positions, vec![[1.0, 2.0, 3.0]]);
    }

    #[test]
    fn oversized_ascii_vertex_count_is_rejected() {
        let src = format!("ply\nformat ascii 1.0\nelement vertex 100000000000000\n{XYZ}end_header\n0 0 0\n");
        assert!(matches!(parse_ply(src.as_bytes()), Err(MirageError::PlyError(_))));
    }

    #[test]
    fn oversized_binary_vertex_count_is_rejected() {
        let mut src =
            format!("ply\nformat binary_little_endian 1.0\nelement vertex 100000000000000\n{XYZ}end_header\n").into_bytes();
        src.extend_from_slice(&[0u8; 12]);
        assert!(matches!(parse_ply(&src), Err(MirageError::PlyError(_))));
    }

    #[test]
    fn rejects_missing_axes() {
        let src = b"ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nend_header\n0 0\n";
        assert!(matches!(parse_ply(src), Err(MirageError::PlyError(_))));
    }

    #[test]
    fn rejects_garbage_header() {
        assert!(matches!(parse_ply(b"not a ply file"), Err(MirageError::PlyError(_))));
    }
}
