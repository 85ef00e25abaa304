use crate::document::merge::merge;
use crate::document::parser::{parse_file, read_document};
use crate::document::template::substitute_strict;
use crate::document::types::{DuplicateKeys, Include, Mapping, Substitutions, Value};
use crate::error::{ConfigError, Result, TemplateError};
use crate::paths::normalize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reserved mapping key holding a list of includes to merge underneath.
pub const INCLUDES_KEY: &str = "includes";

/// Expands `!include` directives, depth first.
///
/// Included documents are fully resolved before they are merged into or
/// substituted for the node that referenced them. The chain of files
/// currently being included is tracked so that a file including itself,
/// directly or indirectly, fails instead of recursing forever.
#[derive(Debug)]
pub struct IncludeResolver<'a> {
	substitutions: &'a Substitutions,
	duplicate_keys: DuplicateKeys,
	chain: Vec<PathBuf>,
}

impl<'a> IncludeResolver<'a> {
	pub fn new(substitutions: &'a Substitutions, duplicate_keys: DuplicateKeys) -> Self {
		Self {
			substitutions,
			duplicate_keys,
			chain: Vec::new(),
		}
	}

	/// Resolve all includes of the document parsed from `path`.
	pub fn resolve_document(&mut self, path: &Path, document: Value) -> Result<Value> {
		let path = normalize(path);
		if self.chain.contains(&path) {
			return Err(ConfigError::IncludeCycle { path });
		}
		self.chain.push(path);
		let resolved = self.resolve(document);
		self.chain.pop();
		resolved
	}

	/// Resolve all includes in `value` and below.
	pub fn resolve(&mut self, value: Value) -> Result<Value> {
		match value {
			Value::Mapping(mapping) => self.resolve_mapping(mapping),
			Value::Sequence(items) => Ok(Value::Sequence(self.resolve_items(items)?)),
			Value::Tuple(items) => Ok(Value::Tuple(self.resolve_items(items)?)),
			Value::Include(include) => self.load(&include),
			other => Ok(other),
		}
	}

	fn resolve_items(&mut self, items: Vec<Value>) -> Result<Vec<Value>> {
		items.into_iter().map(|item| self.resolve(item)).collect()
	}

	fn resolve_mapping(&mut self, mut mapping: Mapping) -> Result<Value> {
		let includes = mapping.shift_remove(INCLUDES_KEY);

		let mut resolved = Mapping::with_capacity(mapping.len());
		for (key, value) in mapping {
			resolved.insert(key, self.resolve(value)?);
		}

		// The document wins over every include, and earlier includes win
		// over later ones: each fragment is merged underneath the running
		// result.
		let mut accumulator = Value::Mapping(resolved);
		for entry in self.include_entries(includes)? {
			let fragment = match entry {
				Value::Include(include) => self.load(&include)?,
				fragment @ Value::Mapping(_) => self.resolve(fragment)?,
				other => {
					return Err(ConfigError::InvalidDocument {
						path: self.current(),
						reason: format!(
							"'{INCLUDES_KEY}' entries must be include directives, found {}",
							other.type_name()
						),
					});
				}
			};
			accumulator = merge(fragment, accumulator)?;
		}

		Ok(accumulator)
	}

	/// Load the target of an include and resolve its own includes.
	fn load(&mut self, include: &Include) -> Result<Value> {
		let relative = substitute_strict(&include.template, self.substitutions).map_err(
			|error| match error {
				TemplateError::UnknownVariable { name } => ConfigError::UnresolvedIncludeKey {
					name,
					template: include.template.clone(),
				},
				source @ TemplateError::Malformed { .. } => ConfigError::InvalidIncludePath {
					template: include.template.clone(),
					source,
				},
			},
		)?;
		let path = normalize(&include.root.join(relative));
		let extension = path
			.extension()
			.and_then(|ext| ext.to_str())
			.unwrap_or_default();

		match extension {
			"yaml" | "yml" => {
				debug!(path = %path.display(), "Including YAML document");
				let document = parse_file(&path, self.duplicate_keys)?;
				self.resolve_document(&path, document)
			}
			"json" => {
				debug!(path = %path.display(), "Including JSON document");
				let content = read_document(&path)?;
				let json: serde_json::Value = serde_json::from_str(&content)
					.map_err(|source| ConfigError::JsonError { path, source })?;
				Ok(Value::from(json))
			}
			_ => {
				debug!(path = %path.display(), "Including raw text");
				Ok(Value::String(read_document(&path)?))
			}
		}
	}

	fn include_entries(&self, includes: Option<Value>) -> Result<Vec<Value>> {
		match includes {
			None | Some(Value::Null) => Ok(Vec::new()),
			Some(Value::Sequence(entries)) => Ok(entries),
			Some(include @ Value::Include(_)) => Ok(vec![include]),
			Some(other) => Err(ConfigError::InvalidDocument {
				path: self.current(),
				reason: format!(
					"'{INCLUDES_KEY}' must be a sequence of include directives, found {}",
					other.type_name()
				),
			}),
		}
	}

	/// File currently being resolved, for diagnostics.
	fn current(&self) -> PathBuf {
		self.chain.last().cloned().unwrap_or_default()
	}
}
