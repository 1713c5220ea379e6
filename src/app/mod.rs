//! Application orchestration: state management, event loop plumbing, input
//! handling and background jobs.

pub mod event;
pub mod handler;
pub mod runtime;
pub mod state;
pub mod watch;
