//! Feature gating for test harnesses.
//!
//! Harnesses collect the features a test wants and compare them with the
//! features a configuration enables (`Config::get_features` and
//! `Config::get_target_features`).

use std::collections::BTreeSet;

/// Return a skip reason when `have` lacks any of `wanted`.
pub fn missing_features(wanted: &BTreeSet<String>, have: &BTreeSet<String>) -> Option<String> {
	let missing: Vec<&str> = wanted.difference(have).map(String::as_str).collect();
	match missing.as_slice() {
		[] => None,
		[feature] => Some(format!(
			"Skipping because feature \"{feature}\" is not supported"
		)),
		features => Some(format!(
			"Skipping because features \"{}\" are not supported",
			features.join(", ")
		)),
	}
}
