//! # meshscope Interaction
//!
//! The input side of the viewer: a single-slot point request sequencer,
//! distance and angle measurement commands that await picked vertices, an
//! observable status line, and [`ViewportSession`] which routes pointer
//! events to the camera, the picker and the waiting command.

pub mod sequencer;
pub mod commands;
pub mod status;
pub mod session;

pub use sequencer::*;
pub use commands::*;
pub use status::*;
pub use session::*;
