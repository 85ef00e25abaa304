//! Type-directed deep merge of document fragments.

use crate::document::types::Value;
use crate::error::MergeError;

/// Merge `overlay` into `base` and return the result.
///
/// - Mappings merge key by key, recursing where both sides define a key.
///   Keys new to `base` are appended in `overlay` order.
/// - A sequence base is extended by an overlay sequence, or gets a
///   non-sequence overlay appended as a single item.
/// - A null, scalar, tuple or unresolved template base is replaced by
///   `overlay`.
/// - Anything else (a mapping base under a non-mapping overlay, opaque
///   values) is unsupported.
pub fn merge(base: Value, overlay: Value) -> Result<Value, MergeError> {
	match (base, overlay) {
		(Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
			for (key, overlay_value) in overlay_map {
				match base_map.get_mut(&key) {
					Some(slot) => {
						let base_value = std::mem::take(slot);
						*slot = merge(base_value, overlay_value)?;
					}
					None => {
						base_map.insert(key, overlay_value);
					}
				}
			}
			Ok(Value::Mapping(base_map))
		}
		(Value::Sequence(mut items), Value::Sequence(more)) => {
			items.extend(more);
			Ok(Value::Sequence(items))
		}
		(Value::Sequence(mut items), overlay) => {
			items.push(overlay);
			Ok(Value::Sequence(items))
		}
		(
			Value::Null
			| Value::Bool(_)
			| Value::Int(_)
			| Value::Float(_)
			| Value::String(_)
			| Value::Block(_)
			| Value::Tuple(_)
			| Value::Template(_)
			| Value::OptionalTemplate(_),
			overlay,
		) => Ok(overlay),
		(base, overlay) => Err(MergeError::Unsupported {
			base: base.type_name(),
			overlay: overlay.type_name(),
		}),
	}
}
