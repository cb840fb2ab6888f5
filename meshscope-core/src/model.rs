//! Immutable triangle model

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};

/// Three indices into a model's vertex list
pub type Triangle = [usize; 3];

/// An immutable triangle model with shared, deduplicated vertices
///
/// Fields are private so a constructed model always satisfies its index
/// invariant: every triangle refers to an existing vertex. Deserialization
/// goes through the same check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawModel")]
pub struct Model {
    vertices: Vec<Point3f>,
    triangles: Vec<Triangle>,
}

#[derive(Deserialize)]
struct RawModel {
    vertices: Vec<Point3f>,
    triangles: Vec<Triangle>,
}

impl TryFrom<RawModel> for Model {
    type Error = Error;

    fn try_from(raw: RawModel) -> Result<Self> {
        Model::new(raw.vertices, raw.triangles)
    }
}

impl Model {
    /// Create a model from vertices and triangles, validating every index
    pub fn new(vertices: Vec<Point3f>, triangles: Vec<Triangle>) -> Result<Self> {
        let vertex_count = vertices.len();
        if let Some((face, triangle)) = triangles
            .iter()
            .enumerate()
            .find(|(_, triangle)| triangle.iter().any(|&index| index >= vertex_count))
        {
            return Err(Error::InvalidModel(format!(
                "triangle {} references vertex {:?} but the model has {} vertices",
                face, triangle, vertex_count
            )));
        }

        Ok(Self { vertices, triangles })
    }

    /// Create a model with no geometry
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    /// Vertex positions, in index order
    pub fn vertices(&self) -> &[Point3f] {
        &self.vertices
    }

    /// Triangles as index triples
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Get a vertex by index
    pub fn vertex(&self, index: usize) -> Option<&Point3f> {
        self.vertices.get(index)
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the model is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }

    /// Iterate over the three edges of every triangle as vertex index pairs
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.triangles
            .iter()
            .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
    }

    /// Axis-aligned bounding box, or `None` for a model without vertices
    pub fn bounding_box(&self) -> Option<(Point3f, Point3f)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;

        for vertex in &self.vertices {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);

            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }

        Some((min, max))
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::empty()
    }
}
