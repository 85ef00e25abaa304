use crate::config::loader::Config;
use crate::document::{Mapping, Value};
use crate::error::LookupError;
use crate::paths::normalize;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

const TARGETS: &str = "targets";
const OPTIONS: &str = "options";
const TOOLS: &str = "tools";
const PATHS: &str = "paths";
const IMAGES: &str = "images";
const IMPORTS: &str = "imports";
const FEATURES: &str = "features";

impl Config {
	/// Look up `targets.<target>.options.<option>`.
	pub fn get_target_option(&self, target: &str, option: &str) -> Result<&Value, LookupError> {
		let target_value = self
			.data
			.get(TARGETS)
			.and_then(|targets| targets.get(target))
			.ok_or_else(|| LookupError::NoTarget {
				target: target.to_string(),
			})?;

		target_value
			.get(OPTIONS)
			.and_then(|options| options.get(option))
			.ok_or_else(|| LookupError::NoOption {
				target: target.to_string(),
				option: option.to_string(),
			})
	}

	/// Set `targets.<target>.options.<option>`, creating missing levels.
	pub fn set_target_option(&mut self, target: &str, option: &str, value: impl Into<Value>) {
		self.data
			.make_mapping()
			.entry(TARGETS.to_string())
			.or_default()
			.make_mapping()
			.entry(target.to_string())
			.or_default()
			.make_mapping()
			.entry(OPTIONS.to_string())
			.or_default()
			.make_mapping()
			.insert(option.to_string(), value.into());
	}

	/// Look up a top-level option.
	pub fn get_option(&self, name: &str) -> Option<&Value> {
		self.data.get(OPTIONS).and_then(|options| options.get(name))
	}

	/// Set a top-level option, creating the `options` section if needed.
	pub fn set_option(&mut self, name: &str, value: impl Into<Value>) {
		self.data
			.make_mapping()
			.entry(OPTIONS.to_string())
			.or_default()
			.make_mapping()
			.insert(name.to_string(), value.into());
	}

	/// All targets, if the configuration has a `targets` section.
	pub fn get_targets(&self) -> Option<&Mapping> {
		self.data.get(TARGETS).and_then(Value::as_mapping)
	}

	/// Resolve a tool name to the executable to run.
	///
	/// Tools listed under `tools` resolve against the configuration
	/// directory. An entry may name an explicit path, either directly or as
	/// `path:`; an empty entry uses the tool name as file name. Tools that
	/// are not listed are returned unchanged for a `PATH` lookup.
	pub fn get_tool(&self, name: &str) -> PathBuf {
		let Some(entry) = self.data.get(TOOLS).and_then(|tools| tools.get(name)) else {
			return PathBuf::from(name);
		};

		let file = match entry {
			Value::String(_) | Value::Block(_) => entry.as_str(),
			Value::Mapping(_) => entry.get("path").and_then(Value::as_str),
			_ => None,
		};
		self.resolve_path(file.unwrap_or(name))
	}

	/// Make `path` absolute relative to the configuration directory.
	pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
		normalize(&self.base.join(path.as_ref()))
	}

	pub fn get_paths(&self) -> Result<IndexMap<String, PathBuf>, LookupError> {
		self.resolved_section(PATHS)
	}

	pub fn get_path(&self, name: &str) -> Result<PathBuf, LookupError> {
		self.resolved_entry(PATHS, name)?
			.ok_or_else(|| LookupError::NoPath {
				name: name.to_string(),
			})
	}

	pub fn get_images(&self) -> Result<IndexMap<String, PathBuf>, LookupError> {
		self.resolved_section(IMAGES)
	}

	pub fn get_image_path(&self, name: &str) -> Result<PathBuf, LookupError> {
		self.resolved_entry(IMAGES, name)?
			.ok_or_else(|| LookupError::NoImage {
				name: name.to_string(),
			})
	}

	/// Entries of `imports`. File-like entries resolve against the
	/// configuration directory; module names are returned as they are.
	pub fn get_imports(&self) -> Vec<PathBuf> {
		let Some(imports) = self.data.get(IMPORTS).and_then(Value::as_sequence) else {
			return Vec::new();
		};
		imports
			.iter()
			.filter_map(Value::as_str)
			.map(|import| {
				if import.contains(MAIN_SEPARATOR) || import.contains('/') || import.ends_with(".py") {
					self.resolve_path(import)
				} else {
					PathBuf::from(import)
				}
			})
			.collect()
	}

	/// Feature names enabled at the top level.
	pub fn get_features(&self) -> BTreeSet<String> {
		self.data.get(FEATURES).map(feature_names).unwrap_or_default()
	}

	/// Union of the feature names enabled on every target.
	pub fn get_target_features(&self) -> BTreeSet<String> {
		self.get_targets()
			.into_iter()
			.flat_map(|targets| targets.values())
			.filter_map(|target| target.get(FEATURES))
			.flat_map(feature_names)
			.collect()
	}

	fn resolved_entry(&self, section: &str, name: &str) -> Result<Option<PathBuf>, LookupError> {
		match self.data.get(section).and_then(|entries| entries.get(name)) {
			None => Ok(None),
			Some(entry) => match entry.as_str() {
				Some(path) => Ok(Some(self.resolve_path(path))),
				None => Err(LookupError::NotAPath {
					section: section.to_string(),
					name: name.to_string(),
				}),
			},
		}
	}

	fn resolved_section(&self, section: &str) -> Result<IndexMap<String, PathBuf>, LookupError> {
		let Some(entries) = self.data.get(section).and_then(Value::as_mapping) else {
			return Ok(IndexMap::new());
		};
		entries
			.keys()
			.map(|name| -> Result<(String, PathBuf), LookupError> {
				let path = self.resolved_entry(section, name)?.unwrap_or_default();
				Ok((name.clone(), path))
			})
			.collect()
	}
}

fn feature_names(value: &Value) -> BTreeSet<String> {
	match value {
		Value::Sequence(items) | Value::Tuple(items) => items
			.iter()
			.filter_map(Value::as_str)
			.map(str::to_string)
			.collect(),
		Value::Mapping(mapping) => mapping.keys().cloned().collect(),
		Value::String(_) | Value::Block(_) => value.as_str().map(str::to_string).into_iter().collect(),
		_ => BTreeSet::new(),
	}
}
