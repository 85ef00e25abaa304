//! The configuration facade.
//!
//! This module handles:
//! - Loading a configuration file through the include and template passes
//! - Target option, tool, path, image, import and feature accessors

mod accessors;
pub mod loader;
pub mod types;

pub use loader::{BASE_VARIABLE, Config};
pub use types::LoadOptions;
