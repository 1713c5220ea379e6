//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer takes the *core* data structures and turns them into pixels on
//! the terminal.  No filesystem I/O happens here.

pub mod halfblock;
pub mod layout;
pub mod listing;
pub mod preview;
pub mod theme;
pub mod viewer;
