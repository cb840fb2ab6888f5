//! Vertex deduplication shared by all importers

use meshscope_core::{Model, Point3f, Result, Triangle};
use std::collections::HashMap;

/// Accumulates triangles, collapsing bit-identical positions to one index
///
/// `-0.0` and `0.0` are treated as the same coordinate.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    vertices: Vec<Point3f>,
    triangles: Vec<Triangle>,
    lookup: HashMap<[u32; 3], usize>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve room for roughly `triangles` triangles
    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(triangles / 2 + 3),
            triangles: Vec::with_capacity(triangles),
            lookup: HashMap::with_capacity(triangles / 2 + 3),
        }
    }

    /// Index of `position`, adding it if it has not been seen yet
    pub fn add_vertex(&mut self, position: Point3f) -> usize {
        let key = position_key(&position);
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }

        let index = self.vertices.len();
        self.vertices.push(position);
        self.lookup.insert(key, index);
        index
    }

    /// Add a triangle given by its corner positions
    pub fn add_triangle(&mut self, corners: [Point3f; 3]) {
        let triangle = corners.map(|corner| self.add_vertex(corner));
        self.triangles.push(triangle);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn build(self) -> Result<Model> {
        Model::new(self.vertices, self.triangles)
    }
}

fn position_key(position: &Point3f) -> [u32; 3] {
    // Adding positive zero turns -0.0 into 0.0 and leaves everything else alone
    [
        (position.x + 0.0).to_bits(),
        (position.y + 0.0).to_bits(),
        (position.z + 0.0).to_bits(),
    ]
}
