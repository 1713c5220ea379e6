//! Core algorithms – file tree construction, route resolution, and the
//! viewer state machines.
//!
//! Nothing in this module depends on any TUI or rendering crate.

pub mod fs;
pub mod media;
pub mod playback;
pub mod probe;
pub mod route;
pub mod slicer;
pub mod thumbnail;
pub mod tree;
pub mod viewer;
pub mod viewport;
