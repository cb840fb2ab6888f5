//! OBJ format support

use crate::builder::MeshBuilder;
use crate::ModelReader;
use meshscope_core::{Model, Point3f, Result};
use ::obj::raw::object::Polygon;
use std::io::{BufReader, Read};

pub struct ObjReader;

impl ModelReader for ObjReader {
    fn read_model<R: Read>(reader: R) -> Result<Model> {
        let raw = ::obj::raw::parse_obj(BufReader::new(reader))
            .map_err(|e| meshscope_core::Error::InvalidData(format!("OBJ parse error: {}", e)))?;

        let positions: Vec<Point3f> = raw
            .positions
            .iter()
            .map(|&(x, y, z, _w)| Point3f::new(x, y, z))
            .collect();

        let mut builder = MeshBuilder::with_capacity(raw.polygons.len());
        let mut skipped = 0usize;

        for polygon in &raw.polygons {
            let corners = polygon_positions(polygon);
            if corners.len() < 3 {
                skipped += 1;
                continue;
            }

            let corner = |i: usize| -> Result<Point3f> {
                positions.get(corners[i]).copied().ok_or_else(|| {
                    meshscope_core::Error::InvalidData(format!(
                        "OBJ face references position {} but only {} exist",
                        corners[i],
                        positions.len()
                    ))
                })
            };

            // Fan-triangulate polygons around their first corner
            let anchor = corner(0)?;
            for i in 1..corners.len() - 1 {
                builder.add_triangle([anchor, corner(i)?, corner(i + 1)?]);
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, "ignored OBJ faces with fewer than three corners");
        }
        tracing::debug!(
            triangles = builder.triangle_count(),
            vertices = builder.vertex_count(),
            "decoded OBJ"
        );
        builder.build()
    }
}

fn polygon_positions(polygon: &Polygon) -> Vec<usize> {
    match polygon {
        Polygon::P(indices) => indices.clone(),
        Polygon::PT(indices) => indices.iter().map(|&(p, _)| p).collect(),
        Polygon::PN(indices) => indices.iter().map(|&(p, _)| p).collect(),
        Polygon::PTN(indices) => indices.iter().map(|&(p, _, _)| p).collect(),
    }
}
