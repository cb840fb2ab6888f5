//! # meshscope Viewport
//!
//! Screen-space geometry for an interactive mesh viewer.
//!
//! This crate turns a [`Model`](meshscope_core::Model) and a camera view
//! transform into generation-tagged snapshots of projected vertices, picks
//! the vertex nearest to the cursor, and assembles the line list a renderer
//! draws for each frame.

pub mod parallel;
pub mod pipeline;
pub mod picker;
pub mod frame;

// Re-export commonly used items
pub use parallel::{get_thread_pool, init_thread_pool, ThreadPoolConfig};
pub use pipeline::*;
pub use picker::*;
pub use frame::*;
