//! `$`-placeholder substitution.
//!
//! Grammar: `$$` is a literal `$`, `$name` and `${name}` reference a
//! variable whose name matches `[_A-Za-z][_A-Za-z0-9]*`. Any other `$` is
//! malformed.

use crate::document::types::{Substitutions, Value};
use crate::error::TemplateError;
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\}|(?P<invalid>))",
	)
	.expect("placeholder pattern is valid")
});

/// Substitute every placeholder in `template`.
///
/// Fails on the first malformed placeholder or unknown variable, scanning
/// left to right.
pub fn substitute_strict(template: &str, mapping: &Substitutions) -> Result<String, TemplateError> {
	let mut output = String::with_capacity(template.len());
	let mut last = 0;

	for captures in PLACEHOLDER.captures_iter(template) {
		let Some(whole) = captures.get(0) else {
			continue;
		};
		output.push_str(&template[last..whole.start()]);

		if captures.name("escaped").is_some() {
			output.push('$');
		} else if let Some(name) = captures.name("named").or_else(|| captures.name("braced")) {
			let value =
				mapping
					.get(name.as_str())
					.ok_or_else(|| TemplateError::UnknownVariable {
						name: name.as_str().to_string(),
					})?;
			output.push_str(value);
		} else {
			return Err(malformed(template, whole.start()));
		}

		last = whole.end();
	}

	output.push_str(&template[last..]);
	Ok(output)
}

/// Substitute placeholders, resolving unknown variables to the empty string.
///
/// Each missing variable is bound to `""` in a private copy of `mapping`
/// and the substitution retried. Malformed templates still fail.
pub fn substitute_optional(
	template: &str,
	mapping: &Substitutions,
) -> Result<String, TemplateError> {
	let mut extended: Option<Substitutions> = None;
	loop {
		match substitute_strict(template, extended.as_ref().unwrap_or(mapping)) {
			Err(TemplateError::UnknownVariable { name }) => {
				info!(variable = %name, "Replacing undefined variable with empty string");
				extended
					.get_or_insert_with(|| mapping.clone())
					.insert(name, String::new());
			}
			result => return result,
		}
	}
}

/// Replace every template directive found as a value in `value`.
///
/// Mapping keys are never templates; plain strings are left untouched.
pub fn resolve_templates(value: &mut Value, mapping: &Substitutions) -> Result<(), TemplateError> {
	match value {
		Value::Mapping(entries) => {
			for item in entries.values_mut() {
				resolve_templates(item, mapping)?;
			}
		}
		Value::Sequence(items) | Value::Tuple(items) => {
			for item in items.iter_mut() {
				resolve_templates(item, mapping)?;
			}
		}
		Value::Template(template) => {
			*value = Value::String(substitute_strict(template, mapping)?);
		}
		Value::OptionalTemplate(template) => {
			*value = Value::String(substitute_optional(template, mapping)?);
		}
		_ => {}
	}
	Ok(())
}

fn malformed(template: &str, offset: usize) -> TemplateError {
	let before = &template[..offset];
	let line = before.matches('\n').count() + 1;
	let line_start = before.rfind('\n').map_or(0, |i| i + 1);
	let column = before[line_start..].chars().count() + 1;

	TemplateError::Malformed {
		template: template.to_string(),
		line,
		column,
	}
}
