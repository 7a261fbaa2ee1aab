//! Public runtime API surface.
//!
//! This module gathers the error and feedback types exposed to consumers of
//! the runtime crate so the map and worker modules can stay focused on
//! lifecycle and orchestration.

pub mod errors;
pub mod feedback;

pub use errors::{JoinRejected, Result, RuntimeError};
pub use feedback::FeedbackCode;
