use crate::document::source_map::{BlockScalars, split_marker};
use crate::document::types::{
	BlockScalar, DuplicateKeys, INCLUDE_TAG, Include, Mapping, OPTIONAL_TEMPLATE_TAG, Span,
	TEMPLATE_TAG, TUPLE_TAG, Value,
};
use crate::error::{ConfigError, Result};
use crate::paths::absolute;
use serde::de::{
	self, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor,
};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// YAML 1.1 merge key, flattened into the mapping that holds it.
pub const MERGE_KEY: &str = "<<";

/// Read a document from disk.
pub fn read_document(path: &Path) -> Result<String> {
	std::fs::read_to_string(path).map_err(|source| {
		if source.kind() == std::io::ErrorKind::NotFound {
			ConfigError::NotFound {
				path: path.to_path_buf(),
			}
		} else {
			ConfigError::ReadError {
				path: path.to_path_buf(),
				source,
			}
		}
	})
}

/// Parse a YAML document file into a tree with directive placeholders.
pub fn parse_file(path: &Path, duplicate_keys: DuplicateKeys) -> Result<Value> {
	let content = read_document(path)?;
	parse_str(&content, path, duplicate_keys)
}

/// Parse YAML text into a tree with directive placeholders.
///
/// `source` names the document in diagnostics; its directory becomes the
/// root that relative `!include` paths are resolved against.
pub fn parse_str(content: &str, source: &Path, duplicate_keys: DuplicateKeys) -> Result<Value> {
	// libyaml emits no document at all for blank input.
	if is_blank(content) {
		return Ok(Value::Null);
	}

	let source = absolute(source);
	let root = source
		.parent()
		.map(Path::to_path_buf)
		.unwrap_or_else(|| source.clone());

	let BlockScalars { text, spans } = BlockScalars::scan(content);
	let mut state = ParseState {
		source: &source,
		root,
		duplicate_keys,
		spans,
		failure: None,
	};

	let deserializer = serde_yaml::Deserializer::from_str(&text);
	let parsed = NodeSeed { state: &mut state }.deserialize(deserializer);

	parsed.map_err(|error| {
		state
			.failure
			.take()
			.unwrap_or_else(|| ConfigError::YamlError {
				path: state.source.to_path_buf(),
				source: error,
			})
	})
}

fn is_blank(content: &str) -> bool {
	content.lines().all(|line| {
		let line = line.trim();
		line.is_empty() || line.starts_with('#')
	})
}

struct ParseState<'a> {
	source: &'a Path,
	root: PathBuf,
	duplicate_keys: DuplicateKeys,
	spans: Vec<Span>,
	// Structured error behind the last custom deserializer error.
	failure: Option<ConfigError>,
}

impl ParseState<'_> {
	fn fail<E: de::Error>(&mut self, error: ConfigError) -> E {
		let message = error.to_string();
		self.failure = Some(error);
		E::custom(message)
	}

	fn mapping_key<E: de::Error>(&mut self, key: Value) -> std::result::Result<String, E> {
		match key {
			Value::String(s) => Ok(s),
			Value::Block(block) => Ok(block.text),
			Value::Bool(b) => Ok(b.to_string()),
			Value::Int(i) => Ok(i.to_string()),
			Value::Float(f) => Ok(f.to_string()),
			other => Err(self.fail(ConfigError::InvalidKey {
				path: self.source.to_path_buf(),
				found: other.type_name(),
			})),
		}
	}

	fn duplicate_key<E: de::Error>(&mut self, key: &str) -> std::result::Result<(), E> {
		match self.duplicate_keys {
			DuplicateKeys::Warn => {
				warn!(
					file = %self.source.display(),
					key,
					"Previous entry with duplicate YAML mapping key overwritten"
				);
				Ok(())
			}
			DuplicateKeys::Error => Err(self.fail(ConfigError::DuplicateKey {
				path: self.source.to_path_buf(),
				key: key.to_string(),
			})),
		}
	}

	/// Collect the mappings a merge key refers to, in the order their
	/// entries are applied: later entries overwrite earlier ones.
	fn merge_sources<E: de::Error>(
		&mut self,
		value: Value,
		sources: &mut Vec<Mapping>,
	) -> std::result::Result<(), E> {
		match value {
			Value::Mapping(mapping) => {
				sources.push(mapping);
				Ok(())
			}
			Value::Sequence(items) => {
				// Earlier mappings of the sequence win.
				for item in items.into_iter().rev() {
					match item {
						Value::Mapping(mapping) => sources.push(mapping),
						other => return Err(self.invalid_merge(&other)),
					}
				}
				Ok(())
			}
			other => Err(self.invalid_merge(&other)),
		}
	}

	fn invalid_merge<E: de::Error>(&mut self, found: &Value) -> E {
		self.fail(ConfigError::InvalidDocument {
			path: self.source.to_path_buf(),
			reason: format!(
				"merge key '{MERGE_KEY}' expects a mapping or a sequence of mappings, found {}",
				found.type_name()
			),
		})
	}

	fn directive_argument<E: de::Error>(
		&mut self,
		tag: &str,
		value: Value,
	) -> std::result::Result<String, E> {
		match value {
			Value::String(s) => Ok(s),
			Value::Block(block) => Ok(block.text),
			Value::Null => Ok(String::new()),
			Value::Bool(b) => Ok(b.to_string()),
			Value::Int(i) => Ok(i.to_string()),
			Value::Float(f) => Ok(f.to_string()),
			other => Err(self.fail(ConfigError::InvalidDirective {
				path: self.source.to_path_buf(),
				tag: tag.to_string(),
				expected: "scalar",
				found: other.type_name(),
			})),
		}
	}
}

struct NodeSeed<'s, 'a> {
	state: &'s mut ParseState<'a>,
}

impl<'de> DeserializeSeed<'de> for NodeSeed<'_, '_> {
	type Value = Value;

	fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Value, D::Error> {
		deserializer.deserialize_any(NodeVisitor { state: self.state })
	}
}

struct NodeVisitor<'s, 'a> {
	state: &'s mut ParseState<'a>,
}

impl<'de> Visitor<'de> for NodeVisitor<'_, '_> {
	type Value = Value;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("a YAML node")
	}

	fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Value, E> {
		Ok(Value::Bool(v))
	}

	fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Value, E> {
		Ok(Value::Int(v))
	}

	fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
		i64::try_from(v)
			.map(Value::Int)
			.map_err(|_| E::custom(format!("integer {v} is out of range")))
	}

	fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Value, E> {
		Ok(Value::Float(v))
	}

	fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
		Ok(Value::String(v.to_string()))
	}

	fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
		Ok(Value::Null)
	}

	fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
		Ok(Value::Null)
	}

	fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Value, D::Error> {
		NodeSeed { state: self.state }.deserialize(deserializer)
	}

	fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Value, A::Error> {
		let state = self.state;
		let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
		while let Some(item) = seq.next_element_seed(NodeSeed { state: &mut *state })? {
			items.push(item);
		}
		Ok(Value::Sequence(items))
	}

	fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Value, A::Error> {
		let state = self.state;
		let mut mapping = Mapping::new();
		let mut merged = Vec::new();
		while let Some(key) = map.next_key_seed(NodeSeed { state: &mut *state })? {
			let key = state.mapping_key(key)?;
			let value = map.next_value_seed(NodeSeed { state: &mut *state })?;
			if key == MERGE_KEY {
				state.merge_sources(value, &mut merged)?;
				continue;
			}
			if mapping.contains_key(&key) {
				state.duplicate_key(&key)?;
			}
			// Last value wins; the key keeps its first position.
			mapping.insert(key, value);
		}
		Ok(Value::Mapping(flatten(merged, mapping)))
	}

	fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> std::result::Result<Value, A::Error> {
		let state = self.state;
		let (tag, content) = data.variant::<String>()?;
		let (tag, block) = match split_marker(&tag) {
			(name, Some(index)) => (name.to_string(), state.spans.get(index).copied()),
			(_, None) => (tag.clone(), None),
		};

		if let (true, Some(span)) = (tag.is_empty(), block) {
			return match content.newtype_variant_seed(NodeSeed { state: &mut *state })? {
				Value::String(text) => Ok(Value::Block(BlockScalar { text, span })),
				other => Ok(other),
			};
		}

		match tag.as_str() {
			INCLUDE_TAG | TEMPLATE_TAG | OPTIONAL_TEMPLATE_TAG => {
				let argument = content.newtype_variant_seed(NodeSeed { state: &mut *state })?;
				let argument = state.directive_argument(&tag, argument)?;
				Ok(match tag.as_str() {
					INCLUDE_TAG => Value::Include(Include {
						template: argument,
						root: state.root.clone(),
					}),
					TEMPLATE_TAG => Value::Template(argument),
					_ => Value::OptionalTemplate(argument),
				})
			}
			TUPLE_TAG => match content.newtype_variant_seed(NodeSeed { state: &mut *state })? {
				Value::Sequence(items) => Ok(Value::Tuple(items)),
				other => Err(state.fail(ConfigError::InvalidDirective {
					path: state.source.to_path_buf(),
					tag: tag.clone(),
					expected: "sequence",
					found: other.type_name(),
				})),
			},
			_ => Err(state.fail(ConfigError::UnknownTag {
				path: state.source.to_path_buf(),
				tag: tag.clone(),
			})),
		}
	}
}

/// Apply merge-key sources underneath the explicit entries of a mapping.
///
/// Merged keys come first; explicit entries overwrite them in place.
fn flatten(sources: Vec<Mapping>, explicit: Mapping) -> Mapping {
	if sources.is_empty() {
		return explicit;
	}
	let mut flattened = Mapping::new();
	for (key, value) in sources.into_iter().flatten().chain(explicit) {
		flattened.insert(key, value);
	}
	flattened
}
