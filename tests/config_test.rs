use envcfg::config::{Config, LoadOptions};
use envcfg::document::{Mapping, Opaque, Substitutions, Value};
use envcfg::error::{ConfigError, LookupError};
use std::fs;
use std::path::{Path, PathBuf};

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
	let path = dir.join(name);
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).unwrap();
	}
	fs::write(&path, content).unwrap();
	path
}

fn no_vars() -> LoadOptions {
	LoadOptions::with_substitutions(Substitutions::new())
}

fn include_vars() -> LoadOptions {
	no_vars()
		.var("ENV_FIRST", "first.yaml")
		.var("ENV_SECOND", "second.yaml")
		.var("ENV_THIRD", "third")
		.var("ENV_FOO", "bar")
}

fn contains(value: Option<&Value>, needle: &str) -> bool {
	value
		.and_then(Value::as_sequence)
		.is_some_and(|items| items.iter().any(|item| item.as_str() == Some(needle)))
}

fn load_error(path: &Path, options: LoadOptions) -> String {
	match Config::load_with(path, options) {
		Ok(config) => panic!("Expected configuration error, got {:?}", config.data()),
		Err(e) => e.to_string(),
	}
}

// ============================================================================
// Target options
// ============================================================================

#[test]
fn test_get_target_option() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"config.yaml",
		r#"
targets:
  main:
    options:
      str: test
      list: [1, 2, 3]
      dict:
        a: 1
        b: 2
      bool: False
      int: 32
      float: 2.5
      none: null
"#,
	);
	let config = Config::load_with(&path, no_vars()).unwrap();

	assert_eq!(config.get_target_option("main", "str"), Ok(&Value::from("test")));
	assert_eq!(
		config.get_target_option("main", "list"),
		Ok(&Value::from(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
	);
	let dict = config.get_target_option("main", "dict").unwrap();
	let keys: Vec<&str> = dict.as_mapping().unwrap().keys().map(String::as_str).collect();
	assert_eq!(keys, ["a", "b"]);
	assert_eq!(config.get_target_option("main", "bool"), Ok(&Value::Bool(false)));
	assert_eq!(config.get_target_option("main", "int"), Ok(&Value::Int(32)));
	assert_eq!(config.get_target_option("main", "float"), Ok(&Value::Float(2.5)));
	assert_eq!(config.get_target_option("main", "none"), Ok(&Value::Null));

	let err = config.get_target_option("main", "blah").unwrap_err();
	assert!(err.to_string().contains("No option"));
	let err = config.get_target_option("nonexist", "str").unwrap_err();
	assert!(err.to_string().contains("No target"));
}

#[test]
fn test_set_target_option() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(dir.path(), "config.yaml", "targets:\n  main:\n");
	let mut config = Config::load_with(&path, no_vars()).unwrap();

	assert!(matches!(
		config.get_target_option("main", "spam"),
		Err(LookupError::NoOption { .. })
	));

	config.set_target_option("main", "spam", "eggs");
	assert_eq!(config.get_target_option("main", "spam"), Ok(&Value::from("eggs")));

	let list = Value::from(vec![Value::Int(1), Value::from("two")]);
	config.set_target_option("main", "list", list.clone());
	assert_eq!(config.get_target_option("main", "list"), Ok(&list));

	let dict: Mapping = [
		("a".to_string(), Value::Int(1)),
		("b".to_string(), Value::Bool(true)),
	]
	.into_iter()
	.collect();
	config.set_target_option("main", "dict", dict.clone());
	assert_eq!(config.get_target_option("main", "dict"), Ok(&Value::Mapping(dict)));

	config.set_target_option("main", "bool", false);
	assert_eq!(config.get_target_option("main", "bool"), Ok(&Value::Bool(false)));
	config.set_target_option("main", "int", 32_i64);
	assert_eq!(config.get_target_option("main", "int"), Ok(&Value::Int(32)));
	config.set_target_option("main", "float", 2.5_f64);
	assert_eq!(config.get_target_option("main", "float"), Ok(&Value::Float(2.5)));
	config.set_target_option("main", "none", Value::Null);
	assert_eq!(config.get_target_option("main", "none"), Ok(&Value::Null));

	config.set_target_option("main", "spam", "ham");
	assert_eq!(config.get_target_option("main", "spam"), Ok(&Value::from("ham")));

	let obj = Opaque::new(String::from("handle"));
	config.set_target_option("main", "obj", obj.clone());
	let stored = config.get_target_option("main", "obj").unwrap();
	assert_eq!(stored.as_opaque(), Some(&obj));
	assert_ne!(stored.as_opaque(), Some(&Opaque::new(String::from("handle"))));
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_template() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"config.yaml",
		"dict:\n  list:\n  - a\n  - b\n  - !template $BASE\n  string: !template ${BASE}/suffix\n",
	);
	let config = Config::load_with(&path, no_vars()).unwrap();
	let dict = config.data().get("dict").unwrap();
	let base = dir.path().display().to_string();

	assert!(contains(dict.get("list"), "a"));
	assert_eq!(
		dict.get("list").and_then(Value::as_sequence).map(|items| &items[2]),
		Some(&Value::from(base.as_str()))
	);
	assert_eq!(dict.get("string"), Some(&Value::from(format!("{base}/suffix"))));
}

#[test]
fn test_template_bad_placeholder() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(dir.path(), "config.yaml", "string: !template $\n");

	let message = load_error(&path, no_vars());
	assert!(message.contains("is invalid"));
	assert!(message.contains("template string"));
}

#[test]
fn test_template_bad_key() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(dir.path(), "config.yaml", "string: !template ${INVALID}\n");

	let message = load_error(&path, no_vars());
	assert!(message.contains("unknown variable"));
}

#[test]
fn test_optional_template_tolerates_missing_variables() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"config.yaml",
		"known: !optional_template ${ENV_FOO}-x\nunknown: !optional_template ${MISSING}-x\n",
	);
	let config = Config::load_with(&path, include_vars()).unwrap();

	assert_eq!(config.data().get("known"), Some(&Value::from("bar-x")));
	assert_eq!(config.data().get("unknown"), Some(&Value::from("-x")));
}

// ============================================================================
// Tools
// ============================================================================

#[test]
fn test_tool() {
	let dir = tempfile::tempdir().unwrap();
	let tool = write(dir.path(), "testtool", "content");
	let path = write(dir.path(), "config.yaml", "tools:\n  testtool: {}\n");
	let config = Config::load_with(&path, no_vars()).unwrap();

	assert_eq!(config.get_tool("testtool"), tool);
}

#[test]
fn test_tool_no_explicit_tool() {
	let dir = tempfile::tempdir().unwrap();
	write(dir.path(), "testtool", "content");
	let path = write(dir.path(), "config.yaml", "dict: {}\n");
	let config = Config::load_with(&path, no_vars()).unwrap();

	assert_eq!(config.get_tool("testtool"), Path::new("testtool"));
}

// ============================================================================
// Includes
// ============================================================================

#[test]
fn test_include() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"configs/config.yaml",
		"---\ntarget:\n  main:\n    drivers: {}\nincludes:\n  - !include first.yaml\n  - !include second.yaml\n",
	);
	write(dir.path(), "configs/first.yaml", "first:\n  - a\n  - b\n  - c\n");
	write(dir.path(), "configs/second.yaml", "second:\n  foo: bar\n");

	let config = Config::load_with(&path, no_vars()).unwrap();
	assert!(contains(config.data().get("first"), "b"));
	assert_eq!(
		config.data().get("second").and_then(|second| second.get("foo")),
		Some(&Value::from("bar"))
	);
	assert!(config.data().get("includes").is_none());
}

#[test]
fn test_include_inline() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"configs/config.yaml",
		"---\ntarget:\n  main:\n    drivers: {}\n  subnode: !include first.yaml\n  another: !include second.yaml\n",
	);
	write(dir.path(), "configs/first.yaml", "---\nfirst:\n  - a\n  - b\n  - c\n");
	write(dir.path(), "configs/second.yaml", "---\nfoo: !template ${ENV_FOO}\n");

	let config = Config::load_with(&path, include_vars()).unwrap();
	let target = config.data().get("target").unwrap();
	assert!(contains(target.get("subnode").and_then(|n| n.get("first")), "a"));
	assert_eq!(
		target.get("another").and_then(|n| n.get("foo")),
		Some(&Value::from("bar"))
	);
}

#[test]
fn test_include_inline_var() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"configs/config.yaml",
		r#"---
target:
  main:
    drivers: {}
  subnode: !include ${ENV_FIRST}
  another: !include $ENV_SECOND
  yetanother: !include ${ENV_THIRD}.yaml
"#,
	);
	write(dir.path(), "configs/first.yaml", "---\nfirst:\n  - a\n  - b\n  - c\n");
	write(dir.path(), "configs/second.yaml", "---\nfoo: !template ${ENV_FOO}\n");
	write(dir.path(), "configs/third.yaml", "---\nhello: world\n");

	let config = Config::load_with(&path, include_vars()).unwrap();
	let target = config.data().get("target").unwrap();
	assert!(contains(target.get("subnode").and_then(|n| n.get("first")), "a"));
	assert_eq!(
		target.get("another").and_then(|n| n.get("foo")),
		Some(&Value::from("bar"))
	);
	assert_eq!(
		target.get("yetanother").and_then(|n| n.get("hello")),
		Some(&Value::from("world"))
	);
}

#[test]
fn test_include_inline_var_doesnotexist() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"configs/config.yaml",
		"---\ntarget:\n  subnode: !include ${ENV_DOESNOTEXIST}\n  another: !include ${ENV_FIRST}\n",
	);
	write(dir.path(), "configs/first.yaml", "---\nfirst:\n  - a\n");

	let message = load_error(&path, include_vars());
	assert!(message.contains("Could not resolve key"));
}

#[test]
fn test_include_var() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"configs/config.yaml",
		"---\ntarget:\n  main:\n    drivers: {}\nincludes:\n  - !include ${ENV_FIRST}\n",
	);
	write(dir.path(), "configs/first.yaml", "first:\n  - a\n  - b\n  - c\n");

	let config = Config::load_with(&path, include_vars()).unwrap();
	assert!(contains(config.data().get("first"), "b"));
}

#[test]
fn test_include_template() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"configs/config.yaml",
		"---\nincludes:\n  - !include ${ENV_FIRST}\n",
	);
	write(
		dir.path(),
		"configs/first.yaml",
		"first:\n  - foo\n  - !template ${ENV_FOO}\n  - baz\n",
	);

	let config = Config::load_with(&path, include_vars()).unwrap();
	assert!(contains(config.data().get("first"), "bar"));
}

#[test]
fn test_include_template_bad_placeholder() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"configs/config.yaml",
		"---\nincludes:\n  - !include first.yaml\n",
	);
	write(
		dir.path(),
		"configs/first.yaml",
		"first:\n  - foo\n  - !template $\n  - baz\n",
	);

	let message = load_error(&path, include_vars());
	assert!(message.contains("is invalid"));
	assert!(message.contains("template string"));
}

#[test]
fn test_include_template_bad_key() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"configs/config.yaml",
		"---\nincludes:\n  - !include ${ENV_FIRST}\n",
	);
	write(
		dir.path(),
		"configs/first.yaml",
		"first:\n  - foo\n  - !template ${ENV_DOESNOTEXIST}\n  - baz\n",
	);

	let message = load_error(&path, include_vars());
	assert!(message.contains("refers to unknown variable"));
}

#[test]
fn test_include_template_var_doesnotexist() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"configs/config.yaml",
		"---\nincludes:\n  - !include first.yaml\n  - !include ${ENV_DOESNOTEXIST}second.yaml\n",
	);
	write(dir.path(), "configs/first.yaml", "first:\n  - foo\n");
	write(dir.path(), "configs/second.yaml", "second:\n  foo: bar\n");

	let result = Config::load_with(&path, include_vars());
	match result {
		Err(ConfigError::UnresolvedIncludeKey { name, .. }) => assert_eq!(name, "ENV_DOESNOTEXIST"),
		other => panic!("Expected UnresolvedIncludeKey error, got {other:?}"),
	}
}

#[test]
fn test_nested_include_precedence() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"config.yaml",
		"includes:\n  - !include a.yaml\n  - !include b.yaml\nvalue: root\n",
	);
	write(
		dir.path(),
		"a.yaml",
		"includes:\n  - !include deep.yaml\nvalue: a\nfrom_a: a\n",
	);
	write(dir.path(), "b.yaml", "value: b\nfrom_a: b\nfrom_b: b\n");
	write(dir.path(), "deep.yaml", "from_a: deep\nfrom_deep: deep\n");

	let config = Config::load_with(&path, no_vars()).unwrap();
	let data = config.data();
	assert_eq!(data.get("value"), Some(&Value::from("root")));
	assert_eq!(data.get("from_a"), Some(&Value::from("a")));
	assert_eq!(data.get("from_b"), Some(&Value::from("b")));
	assert_eq!(data.get("from_deep"), Some(&Value::from("deep")));
}

#[test]
fn test_included_lists_are_concatenated() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"config.yaml",
		"includes:\n  - !include common.yaml\nimports:\n  - local.py\n",
	);
	write(dir.path(), "common.yaml", "imports:\n  - shared.py\n");

	let config = Config::load_with(&path, no_vars()).unwrap();
	assert_eq!(
		config.data().get("imports"),
		Some(&Value::from(vec![Value::from("shared.py"), Value::from("local.py")]))
	);
}

#[test]
fn test_include_type_conflict() {
	let dir = tempfile::tempdir().unwrap();
	let path = write(
		dir.path(),
		"config.yaml",
		"includes:\n  - !include common.yaml\nimports:\n  - local.py\n",
	);
	write(dir.path(), "common.yaml", "imports:\n  shared: shared.py\n");

	let message = load_error(&path, no_vars());
	assert!(message.contains("Datatype not supported"));
}
