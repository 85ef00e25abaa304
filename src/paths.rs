//! Lexical path helpers shared by the include resolver and the accessors.

use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against the current directory and normalize it.
///
/// Symlinks are not resolved and the path need not exist.
pub fn absolute(path: &Path) -> PathBuf {
	if path.is_absolute() {
		return normalize(path);
	}
	match std::env::current_dir() {
		Ok(cwd) => normalize(&cwd.join(path)),
		Err(_) => normalize(path),
	}
}

/// Remove `.` components and fold `..` into the preceding component.
pub fn normalize(path: &Path) -> PathBuf {
	let mut normalized = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => match normalized.components().next_back() {
				Some(Component::Normal(_)) => {
					normalized.pop();
				}
				// `..` above the root stays at the root.
				Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
				_ => normalized.push(".."),
			},
			other => normalized.push(other.as_os_str()),
		}
	}
	normalized
}
