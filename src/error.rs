use std::path::PathBuf;

/// Library-level structured errors for envcfg.
///
/// Every failure while loading a document, expanding includes, merging
/// fragments or substituting templates is reported as a `ConfigError`.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Config file not found: {path}")]
	NotFound { path: PathBuf },

	#[error("Failed to read config file: {path}")]
	ReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse YAML document: {path}")]
	YamlError {
		path: PathBuf,
		#[source]
		source: serde_yaml::Error,
	},

	#[error("Failed to parse JSON document: {path}")]
	JsonError {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("Failed to render document as YAML")]
	SerializeError {
		#[source]
		source: serde_yaml::Error,
	},

	#[error("{path}: unknown tag '!{tag}'")]
	UnknownTag { path: PathBuf, tag: String },

	#[error("{path}: tag '!{tag}' expects a {expected}, found {found}")]
	InvalidDirective {
		path: PathBuf,
		tag: String,
		expected: &'static str,
		found: &'static str,
	},

	#[error("{path}: mapping keys must be plain scalars, found {found}")]
	InvalidKey { path: PathBuf, found: &'static str },

	#[error("{path}: duplicate YAML mapping key '{key}'")]
	DuplicateKey { path: PathBuf, key: String },

	#[error("Could not resolve key '{name}' in include path '{template}'")]
	UnresolvedIncludeKey { name: String, template: String },

	#[error("Invalid include path '{template}'")]
	InvalidIncludePath {
		template: String,
		#[source]
		source: TemplateError,
	},

	#[error("Include cycle detected: {path} is already being included")]
	IncludeCycle { path: PathBuf },

	#[error("Configuration file '{path}' is invalid: {reason}")]
	InvalidDocument { path: PathBuf, reason: String },

	#[error(
		"Configuration file '{path}' is invalid: invalid template string '{template}' (line {line}, col {column})"
	)]
	InvalidTemplate {
		path: PathBuf,
		template: String,
		line: usize,
		column: usize,
	},

	#[error("Configuration file '{path}' refers to unknown variable '{name}'")]
	UnknownVariable { path: PathBuf, name: String },

	#[error(transparent)]
	Merge(#[from] MergeError),
}

impl ConfigError {
	/// Attach the configuration file path to a template substitution failure.
	pub fn from_template(path: impl Into<PathBuf>, error: TemplateError) -> Self {
		let path = path.into();
		match error {
			TemplateError::Malformed {
				template,
				line,
				column,
			} => ConfigError::InvalidTemplate {
				path,
				template,
				line,
				column,
			},
			TemplateError::UnknownVariable { name } => ConfigError::UnknownVariable { path, name },
		}
	}
}

/// Failures of the `$`-placeholder substitution engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
	#[error("Invalid placeholder in template string '{template}': line {line}, col {column}")]
	Malformed {
		template: String,
		line: usize,
		column: usize,
	},

	#[error("Template refers to unknown variable '{name}'")]
	UnknownVariable { name: String },
}

/// Failures of the deep merge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
	#[error("Datatype not supported: '{overlay}' into '{base}'")]
	Unsupported {
		base: &'static str,
		overlay: &'static str,
	},
}

/// Accessor lookup failures on a loaded configuration.
///
/// These are programmer-facing and deliberately kept apart from
/// `ConfigError`, which only describes document-load failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
	#[error("No target '{target}' found in configuration")]
	NoTarget { target: String },

	#[error("No option '{option}' found for target '{target}'")]
	NoOption { target: String, option: String },

	#[error("No path '{name}' found in configuration")]
	NoPath { name: String },

	#[error("No image '{name}' found in configuration")]
	NoImage { name: String },

	#[error("Entry '{name}' in '{section}' is not a path")]
	NotAPath { section: String, name: String },
}

/// Result type alias using ConfigError.
pub type Result<T> = std::result::Result<T, ConfigError>;
