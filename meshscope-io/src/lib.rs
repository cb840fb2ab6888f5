//! Mesh importers for meshscope
//!
//! Decodes STL (ASCII or binary) and OBJ files into immutable
//! [`Model`]s. Every importer deduplicates vertices by exact position, so
//! triangles sharing a corner share its index.

pub mod builder;
pub mod stl;
pub mod obj;
pub mod error;

pub use builder::MeshBuilder;
pub use error::*;

use meshscope_core::{Model, Result};
use std::io::Read;
use std::path::Path;

/// Trait for decoding a model from a byte stream
pub trait ModelReader {
    fn read_model<R: Read>(reader: R) -> Result<Model>;
}

/// Mesh file formats recognized by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
}

impl MeshFormat {
    /// Detect the format from a file name's extension, ignoring case
    pub fn from_name(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "stl" => Ok(MeshFormat::Stl),
            "obj" => Ok(MeshFormat::Obj),
            _ => Err(IoError::UnsupportedFormat {
                extension: if extension.is_empty() {
                    format!("{:?} has no extension", name)
                } else {
                    format!(".{}", extension)
                },
            }
            .into()),
        }
    }

    /// File name patterns for open dialogs
    pub fn patterns(self) -> &'static [&'static str] {
        match self {
            MeshFormat::Stl => &["*.stl"],
            MeshFormat::Obj => &["*.obj"],
        }
    }
}

/// Decode a model from a file name and a byte stream
///
/// The name only selects the format; nothing is read from disk.
pub fn import_model<R: Read>(name: &str, reader: R) -> Result<Model> {
    let model = match MeshFormat::from_name(name)? {
        MeshFormat::Stl => stl::StlReader::read_model(reader)?,
        MeshFormat::Obj => obj::ObjReader::read_model(reader)?,
    };

    tracing::info!(
        name,
        vertices = model.vertex_count(),
        triangles = model.triangle_count(),
        "model imported"
    );
    Ok(model)
}

/// Open and decode a model file, detecting the format from its extension
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<Model> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    // Reject unknown formats before touching the file
    MeshFormat::from_name(name)?;
    let file = std::fs::File::open(path).map_err(IoError::from)?;
    import_model(name, std::io::BufReader::new(file))
}
