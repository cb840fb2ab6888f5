//! STL format support (ASCII and binary)

use crate::builder::MeshBuilder;
use crate::error::IoError;
use crate::ModelReader;
use meshscope_core::{Model, Point3f, Result};
use std::io::Read;

const HEADER_LEN: usize = 80;
const TRIANGLE_RECORD_LEN: usize = 50;

pub struct StlReader;

impl ModelReader for StlReader {
    fn read_model<R: Read>(mut reader: R) -> Result<Model> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).map_err(IoError::from)?;
        read_stl(&data)
    }
}

/// Decode an STL file held in memory, detecting ASCII vs binary
pub fn read_stl(data: &[u8]) -> Result<Model> {
    if is_binary(data) {
        read_binary(data)
    } else {
        read_ascii(data)
    }
}

/// Binary files may also start with "solid", so trust the size first
fn is_binary(data: &[u8]) -> bool {
    if let Some(count) = binary_triangle_count(data) {
        if HEADER_LEN + 4 + count * TRIANGLE_RECORD_LEN == data.len() {
            return true;
        }
    }

    let text_start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    !data[text_start..].starts_with(b"solid")
}

fn binary_triangle_count(data: &[u8]) -> Option<usize> {
    let bytes = data.get(HEADER_LEN..HEADER_LEN + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize)
}

fn read_binary(data: &[u8]) -> Result<Model> {
    let count = binary_triangle_count(data).ok_or_else(|| IoError::Truncated {
        format: "binary STL",
        message: format!("{} bytes is too small for header and triangle count", data.len()),
    })?;

    let expected = HEADER_LEN + 4 + count * TRIANGLE_RECORD_LEN;
    if data.len() < expected {
        return Err(IoError::Truncated {
            format: "binary STL",
            message: format!(
                "expected {} bytes for {} triangles, got {}",
                expected,
                count,
                data.len()
            ),
        }
        .into());
    }

    let mut builder = MeshBuilder::with_capacity(count);
    for record in data[HEADER_LEN + 4..expected].chunks_exact(TRIANGLE_RECORD_LEN) {
        // Skip the facet normal; corners follow at 12-byte strides
        builder.add_triangle([
            read_point(record, 12),
            read_point(record, 24),
            read_point(record, 36),
        ]);
    }

    tracing::debug!(
        triangles = builder.triangle_count(),
        vertices = builder.vertex_count(),
        "decoded binary STL"
    );
    builder.build()
}

fn read_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

fn read_point(data: &[u8], offset: usize) -> Point3f {
    Point3f::new(
        read_f32(data, offset),
        read_f32(data, offset + 4),
        read_f32(data, offset + 8),
    )
}

fn read_ascii(data: &[u8]) -> Result<Model> {
    let text = std::str::from_utf8(data).map_err(|e| IoError::ParseError {
        line: 0,
        message: format!("ASCII STL is not valid UTF-8: {}", e),
    })?;

    let mut builder = MeshBuilder::new();
    let mut corners: Vec<Point3f> = Vec::with_capacity(3);

    for (line_index, line) in text.lines().enumerate() {
        let line_number = line_index + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("facet") => corners.clear(),
            Some("vertex") => {
                let mut coordinate = || -> std::result::Result<f32, IoError> {
                    let token = tokens.next().ok_or_else(|| IoError::ParseError {
                        line: line_number,
                        message: "vertex needs three coordinates".to_string(),
                    })?;
                    token.parse::<f32>().map_err(|e| IoError::ParseError {
                        line: line_number,
                        message: format!("invalid coordinate {:?}: {}", token, e),
                    })
                };
                let x = coordinate()?;
                let y = coordinate()?;
                let z = coordinate()?;
                corners.push(Point3f::new(x, y, z));
            }
            Some("endfacet") => {
                let triangle: [Point3f; 3] =
                    corners.as_slice().try_into().map_err(|_| IoError::ParseError {
                        line: line_number,
                        message: format!("facet has {} vertices, expected 3", corners.len()),
                    })?;
                builder.add_triangle(triangle);
                corners.clear();
            }
            _ => {}
        }
    }

    tracing::debug!(
        triangles = builder.triangle_count(),
        vertices = builder.vertex_count(),
        "decoded ASCII STL"
    );
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshscope_core::Error;

    const ASCII_SQUARE: &str = "solid square
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 1 1 0
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 1 0
      vertex 0 1 0
    endloop
  endfacet
endsolid square
";

    fn binary_stl(triangles: &[[[f32; 3]; 3]], header: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data[..header.len()].copy_from_slice(header);
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for triangle in triangles {
            data.extend_from_slice(&[0u8; 12]);
            for corner in triangle {
                for value in corner {
                    data.extend_from_slice(&value.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0u8; 2]);
        }
        data
    }

    #[test]
    fn test_ascii_square_deduplicates() {
        let model = read_stl(ASCII_SQUARE.as_bytes()).unwrap();
        assert_eq!(model.vertex_count(), 4);
        assert_eq!(model.triangle_count(), 2);
        assert_eq!(model.triangles(), &[[0, 1, 2], [0, 2, 3]]);
        assert_eq!(model.vertices()[3], Point3f::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_binary_square() {
        let data = binary_stl(
            &[
                [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
                [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            ],
            b"binary",
        );
        let model = read_stl(&data).unwrap();
        assert_eq!(model.vertex_count(), 4);
        assert_eq!(model.triangles(), &[[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_binary_with_solid_header() {
        let data = binary_stl(&[[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]]], b"solid but binary");
        let model = read_stl(&data).unwrap();
        assert_eq!(model.vertex_count(), 3);
        assert_eq!(model.vertices()[1], Point3f::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = binary_stl(&[[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]], b"x");
        data.truncate(data.len() - 10);
        assert!(matches!(read_stl(&data), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_ascii_bad_facet() {
        let text = "solid bad\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nendloop\nendfacet\nendsolid\n";
        let result = read_stl(text.as_bytes());
        match result {
            Err(Error::InvalidData(message)) => assert!(message.contains("line 7")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_ascii_bad_coordinate() {
        let text = "solid bad\nfacet normal 0 0 1\nouter loop\nvertex 0 zero 0\n";
        assert!(read_stl(text.as_bytes()).is_err());
    }
}
