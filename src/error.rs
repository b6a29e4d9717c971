//! Error handling for KittyPress operations
//!
//! This module re-exports the error types defined in [`crate::common`].
//! It uses thiserror for ergonomic error handling; every failure surfaces
//! to the top-level call with the originating path attached.

pub use crate::common::KittyError;
pub use crate::common::Result;
