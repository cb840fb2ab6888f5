//! # meshscope
//!
//! Geometry engine for an interactive triangle-mesh viewer.
//!
//! This is the umbrella crate that provides convenient access to all meshscope
//! functionality. You can use this crate to get everything in one place, or use
//! individual crates for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Models, the orbit camera, view transforms and change notification
//! - **Viewport**: Generation-tagged screen snapshots, vertex picking and frame assembly
//! - **I/O**: STL (ASCII and binary) and OBJ import
//! - **Interaction**: Point requests, distance/angle measurement and the viewport session
//!
//! ## Quick Start
//!
//! ```rust
//! use meshscope::prelude::*;
//!
//! let model = Model::new(
//!     vec![
//!         Point3f::new(0.0, 0.0, 0.0),
//!         Point3f::new(1.0, 0.0, 0.0),
//!         Point3f::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![[0, 1, 2]],
//! )?;
//!
//! let session = ViewportSession::new(SessionConfig::default());
//! session.load_model(model);
//!
//! // One line per triangle edge, plus the axis indicator
//! let frame = session.frame();
//! assert_eq!(frame.edges.len(), 3);
//! assert_eq!(frame.axes.len(), 3);
//! # Ok::<(), meshscope::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables io and interaction
//! - `io`: Mesh file import
//! - `interaction`: Measurement commands and the viewport session
//! - `all`: Enables all features

// Re-export core functionality
pub use meshscope_core::*;

// Re-export sub-crates
pub use meshscope_viewport as viewport;

#[cfg(feature = "io")]
pub use meshscope_io as io;

#[cfg(feature = "interaction")]
pub use meshscope_interaction as interaction;

/// Convenient imports for common use cases
pub mod prelude {
    pub use meshscope_core::*;
    pub use meshscope_viewport::*;

    #[cfg(feature = "io")]
    pub use meshscope_io::{import_model, read_model, MeshFormat, ModelReader};

    #[cfg(feature = "interaction")]
    pub use meshscope_interaction::*;
}
