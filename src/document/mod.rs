//! Document loading and resolution.
//!
//! This module handles:
//! - YAML parsing with `!include`, `!template`, `!optional_template` and
//!   `!tuple` directives
//! - Recursive include expansion and deep merging
//! - `$`-placeholder template substitution

pub mod include;
pub mod merge;
pub mod parser;
mod source_map;
pub mod template;
pub mod types;

pub use include::{INCLUDES_KEY, IncludeResolver};
pub use merge::merge;
pub use parser::{parse_file, parse_str, read_document};
pub use template::{resolve_templates, substitute_optional, substitute_strict};
pub use types::{
	BlockScalar, DuplicateKeys, Include, Mapping, Marker, Opaque, Span, Substitutions, Value,
	environment,
};

use crate::error::{ConfigError, Result};

/// Render a document tree as YAML, preserving mapping order.
pub fn dump(value: &Value) -> Result<String> {
	serde_yaml::to_string(value).map_err(|source| ConfigError::SerializeError { source })
}
