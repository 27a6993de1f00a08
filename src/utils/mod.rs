//! Shared utilities: error types, logging setup, and tree rendering.

pub mod error;
pub mod logging;
pub mod tree;

pub use error::{LasplitError, Result};
pub use logging::{init_logging, LogConfig};
