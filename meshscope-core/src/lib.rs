//! Core data structures for meshscope
//!
//! This crate provides the fundamental types shared by the viewport engine:
//! immutable triangle models, the orbit camera and the view transforms it
//! produces, change notification, and the common error type.

pub mod point;
pub mod model;
pub mod transform;
pub mod camera;
pub mod notify;
pub mod error;

pub use point::*;
pub use model::*;
pub use transform::*;
pub use camera::*;
pub use notify::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point2, Point3, Vector2, Vector3, Matrix4, Unit};
