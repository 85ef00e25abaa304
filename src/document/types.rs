use indexmap::IndexMap;
use serde::ser::{Error as _, Serialize, Serializer};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Ordered mapping of a document tree. Insertion order follows the source.
pub type Mapping = IndexMap<String, Value>;

/// Variable mapping used for include paths and template values.
pub type Substitutions = HashMap<String, String>;

/// Tag names of the directives recognized by the parser.
pub const INCLUDE_TAG: &str = "include";
pub const TEMPLATE_TAG: &str = "template";
pub const OPTIONAL_TEMPLATE_TAG: &str = "optional_template";
pub const TUPLE_TAG: &str = "tuple";

/// Build a substitution mapping from the process environment.
pub fn environment() -> Substitutions {
	std::env::vars().collect()
}

/// How the parser treats a key that appears twice in one mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateKeys {
	/// Log a warning; the last value wins.
	#[default]
	Warn,
	/// Fail the parse.
	Error,
}

/// A node of a document tree.
///
/// Parsing produces directive placeholders (`Include`, `Template`,
/// `OptionalTemplate`); a fully resolved tree contains none of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	/// Literal block scalar with its location in the source document.
	Block(BlockScalar),
	Sequence(Vec<Value>),
	/// Fixed sequence; merges as a single unit rather than being extended.
	Tuple(Vec<Value>),
	Mapping(Mapping),
	Include(Include),
	Template(String),
	OptionalTemplate(String),
	/// Host object stored through the option setters.
	Opaque(Opaque),
}

/// A deferred `!include` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
	/// Path template, substituted against the path mapping when resolved.
	pub template: String,
	/// Directory of the document that declared the include.
	pub root: PathBuf,
}

/// Position in a source document. All fields are zero based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Marker {
	pub index: usize,
	pub line: usize,
	pub column: usize,
}

impl fmt::Display for Marker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "line {}, column {}", self.line + 1, self.column + 1)
	}
}

/// Start and end of a scalar in its source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
	pub start: Marker,
	pub end: Marker,
}

/// A string written in literal block style (`|`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockScalar {
	pub text: String,
	pub span: Span,
}

/// Shared handle to an arbitrary host object. Equality is identity.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
	pub fn new<T: Any + Send + Sync>(value: T) -> Self {
		Self(Arc::new(value))
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.downcast_ref::<T>()
	}
}

impl PartialEq for Opaque {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
	}
}

impl fmt::Debug for Opaque {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Opaque(..)")
	}
}

impl Value {
	/// Human readable name of the node kind, used in diagnostics.
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "boolean",
			Value::Int(_) => "integer",
			Value::Float(_) => "float",
			Value::String(_) | Value::Block(_) => "string",
			Value::Sequence(_) => "sequence",
			Value::Tuple(_) => "tuple",
			Value::Mapping(_) => "mapping",
			Value::Include(_) => "include",
			Value::Template(_) => "template",
			Value::OptionalTemplate(_) => "optional template",
			Value::Opaque(_) => "opaque",
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn is_mapping(&self) -> bool {
		matches!(self, Value::Mapping(_))
	}

	/// True for directive placeholders that still need a resolution pass.
	pub fn is_directive(&self) -> bool {
		matches!(
			self,
			Value::Include(_) | Value::Template(_) | Value::OptionalTemplate(_)
		)
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			Value::Block(block) => Some(&block.text),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Value::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Float(f) => Some(*f),
			Value::Int(i) => Some(*i as f64),
			_ => None,
		}
	}

	/// Items of a sequence or tuple.
	pub fn as_sequence(&self) -> Option<&[Value]> {
		match self {
			Value::Sequence(items) | Value::Tuple(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_mapping(&self) -> Option<&Mapping> {
		match self {
			Value::Mapping(mapping) => Some(mapping),
			_ => None,
		}
	}

	pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
		match self {
			Value::Mapping(mapping) => Some(mapping),
			_ => None,
		}
	}

	pub fn as_opaque(&self) -> Option<&Opaque> {
		match self {
			Value::Opaque(opaque) => Some(opaque),
			_ => None,
		}
	}

	/// Look up `key` when this node is a mapping.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.as_mapping().and_then(|mapping| mapping.get(key))
	}

	/// Turn this node into a mapping (replacing any other content) and
	/// return it for mutation.
	pub fn make_mapping(&mut self) -> &mut Mapping {
		if !self.is_mapping() {
			*self = Value::Mapping(Mapping::new());
		}
		match self {
			Value::Mapping(mapping) => mapping,
			_ => unreachable!("node was just replaced by a mapping"),
		}
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::String(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::String(value)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Int(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Float(value)
	}
}

impl From<Vec<Value>> for Value {
	fn from(value: Vec<Value>) -> Self {
		Value::Sequence(value)
	}
}

impl From<Mapping> for Value {
	fn from(value: Mapping) -> Self {
		Value::Mapping(value)
	}
}

impl From<Opaque> for Value {
	fn from(value: Opaque) -> Self {
		Value::Opaque(value)
	}
}

impl From<serde_json::Value> for Value {
	fn from(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(b) => Value::Bool(b),
			serde_json::Value::Number(n) => match n.as_i64() {
				Some(i) => Value::Int(i),
				None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
			},
			serde_json::Value::String(s) => Value::String(s),
			serde_json::Value::Array(items) => {
				Value::Sequence(items.into_iter().map(Value::from).collect())
			}
			serde_json::Value::Object(object) => Value::Mapping(
				object
					.into_iter()
					.map(|(key, value)| (key, Value::from(value)))
					.collect(),
			),
		}
	}
}

impl Serialize for Value {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Value::Null => serializer.serialize_unit(),
			Value::Bool(b) => serializer.serialize_bool(*b),
			Value::Int(i) => serializer.serialize_i64(*i),
			Value::Float(f) => serializer.serialize_f64(*f),
			Value::String(s) => serializer.serialize_str(s),
			Value::Block(block) => serializer.serialize_str(&block.text),
			Value::Sequence(items) | Value::Tuple(items) => serializer.collect_seq(items),
			Value::Mapping(mapping) => serializer.collect_map(mapping),
			// Directives render with their tag, e.g. `!include base.yaml`.
			Value::Include(include) => {
				serializer.serialize_newtype_variant("Value", 0, INCLUDE_TAG, &include.template)
			}
			Value::Template(template) => {
				serializer.serialize_newtype_variant("Value", 1, TEMPLATE_TAG, template)
			}
			Value::OptionalTemplate(template) => serializer.serialize_newtype_variant(
				"Value",
				2,
				OPTIONAL_TEMPLATE_TAG,
				template,
			),
			Value::Opaque(_) => Err(S::Error::custom("opaque values cannot be serialized")),
		}
	}
}
