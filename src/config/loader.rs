use crate::config::types::LoadOptions;
use crate::document::{
	IncludeResolver, Mapping, Substitutions, Value, parse_file, resolve_templates,
};
use crate::error::{ConfigError, Result};
use crate::paths::absolute;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Template variable bound to the directory of the configuration file.
pub const BASE_VARIABLE: &str = "BASE";

/// A fully resolved configuration document.
///
/// Construction runs the include pass and then the template pass; a
/// `Config` never holds a partially resolved tree.
#[derive(Debug, Clone)]
pub struct Config {
	pub(crate) data: Value,
	pub(crate) path: PathBuf,
	pub(crate) base: PathBuf,
	path_substitutions: Substitutions,
	value_substitutions: Substitutions,
}

impl Config {
	/// Load the configuration at `path`, substituting from the process
	/// environment.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		Self::load_with(path, LoadOptions::default())
	}

	/// Load the configuration at `path` with explicit options.
	pub fn load_with(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self> {
		let path = absolute(path.as_ref());
		let base = path
			.parent()
			.map(Path::to_path_buf)
			.unwrap_or_else(|| path.clone());

		let document = match parse_file(&path, options.duplicate_keys)? {
			Value::Null => Value::Mapping(Mapping::new()),
			document @ Value::Mapping(_) => document,
			other => {
				return Err(ConfigError::InvalidDocument {
					path,
					reason: format!("top level must be a mapping, found {}", other.type_name()),
				});
			}
		};

		let mut resolver = IncludeResolver::new(&options.path_substitutions, options.duplicate_keys);
		let mut data = resolver.resolve_document(&path, document)?;

		let mut mapping = options.value_substitutions.clone();
		mapping.insert(BASE_VARIABLE.to_string(), base.display().to_string());
		resolve_templates(&mut data, &mapping)
			.map_err(|error| ConfigError::from_template(&path, error))?;

		debug!(path = %path.display(), "Loaded configuration");

		Ok(Self {
			data,
			path,
			base,
			path_substitutions: options.path_substitutions,
			value_substitutions: options.value_substitutions,
		})
	}

	/// The resolved document tree.
	pub fn data(&self) -> &Value {
		&self.data
	}

	/// Absolute path of the configuration file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Directory of the configuration file; relative paths resolve here.
	pub fn base(&self) -> &Path {
		&self.base
	}

	pub fn path_substitutions(&self) -> &Substitutions {
		&self.path_substitutions
	}

	pub fn value_substitutions(&self) -> &Substitutions {
		&self.value_substitutions
	}
}
