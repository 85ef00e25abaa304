use crate::document::{DuplicateKeys, Substitutions, environment};

/// Inputs threaded through loading a configuration.
///
/// Both substitution mappings default to the process environment. Callers
/// that need deterministic results (tests, embedding applications) pass
/// explicit mappings instead.
#[derive(Debug, Clone)]
pub struct LoadOptions {
	/// Variables available to `!include` path templates.
	pub path_substitutions: Substitutions,

	/// Variables available to `!template` and `!optional_template` values.
	pub value_substitutions: Substitutions,

	/// Whether duplicate mapping keys warn or fail.
	pub duplicate_keys: DuplicateKeys,
}

impl Default for LoadOptions {
	fn default() -> Self {
		let env = environment();
		Self {
			path_substitutions: env.clone(),
			value_substitutions: env,
			duplicate_keys: DuplicateKeys::default(),
		}
	}
}

impl LoadOptions {
	/// Use one mapping for both include paths and template values.
	pub fn with_substitutions(substitutions: Substitutions) -> Self {
		Self {
			path_substitutions: substitutions.clone(),
			value_substitutions: substitutions,
			duplicate_keys: DuplicateKeys::default(),
		}
	}

	pub fn path_substitutions(mut self, substitutions: Substitutions) -> Self {
		self.path_substitutions = substitutions;
		self
	}

	pub fn value_substitutions(mut self, substitutions: Substitutions) -> Self {
		self.value_substitutions = substitutions;
		self
	}

	pub fn duplicate_keys(mut self, duplicate_keys: DuplicateKeys) -> Self {
		self.duplicate_keys = duplicate_keys;
		self
	}

	/// Set `key` in both mappings, overriding existing values.
	pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		let key = key.into();
		let value = value.into();
		self.path_substitutions.insert(key.clone(), value.clone());
		self.value_substitutions.insert(key, value);
		self
	}
}
