//! Source locations of literal block scalars.
//!
//! The YAML deserializer hands strings to the tree builder without style or
//! position information. Literal block scalars (`|`) are located by scanning
//! the raw text up front, and each header gets a local tag carrying the
//! block's index. The tree builder meets that tag on exactly the node the
//! header opened, so a span can never attach to another scalar, and the
//! text itself still comes from the YAML parser.

use crate::document::types::{Marker, Span};
use regex::Regex;
use std::sync::LazyLock;

/// Tag suffix marking the node opened by the literal block at an index.
pub(crate) const BLOCK_MARKER: &str = "~block-";

static BLOCK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?:^|[ \t])\|(?P<indicators>[1-9][+-]?|[+-][1-9]?)?[ \t]*(?:#.*)?$")
		.expect("block header pattern is valid")
});

/// Where the index marker goes on a header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
	/// Untagged block: insert a whole tag before the `|`.
	Insert(usize),
	/// Locally tagged block: extend the tag ending here.
	Extend(usize),
	/// Global or verbatim tag; the block stays unmarked.
	Skip,
}

#[derive(Debug)]
struct Header {
	column: usize,
	indent: Option<usize>,
	mark: Mark,
}

/// Document text with literal block headers marked, and the block spans
/// in marker order.
#[derive(Debug, Default)]
pub(crate) struct BlockScalars {
	pub(crate) text: String,
	pub(crate) spans: Vec<Span>,
}

impl BlockScalars {
	pub(crate) fn scan(source: &str) -> Self {
		let mut lines = Vec::new();
		let mut offset = 0;
		for raw in source.split_inclusive('\n') {
			lines.push((offset, raw.trim_end_matches(['\n', '\r'])));
			offset += raw.len();
		}

		let mut text = String::with_capacity(source.len());
		let mut spans = Vec::new();
		let mut copied = 0;
		let mut row = 0;
		while row < lines.len() {
			let (line_offset, line) = lines[row];
			let Some(header) = parse_header(line) else {
				row += 1;
				continue;
			};
			let end_row = block_end(&lines, row, &header);

			let marker = format!("{BLOCK_MARKER}{}", spans.len());
			let (at, inserted) = match header.mark {
				Mark::Insert(at) => (at, format!("!{marker} ")),
				Mark::Extend(at) => (at, marker),
				Mark::Skip => {
					row = end_row.max(row + 1);
					continue;
				}
			};
			text.push_str(&source[copied..line_offset + at]);
			text.push_str(&inserted);
			copied = line_offset + at;

			let end = match lines.get(end_row) {
				Some((index, _)) => Marker {
					index: *index,
					line: end_row,
					column: 0,
				},
				None => Marker {
					index: source.len(),
					line: end_row,
					column: 0,
				},
			};
			spans.push(Span {
				start: Marker {
					index: line_offset + header.column,
					line: row,
					column: header.column,
				},
				end,
			});
			row = end_row.max(row + 1);
		}
		text.push_str(&source[copied..]);

		Self { text, spans }
	}
}

/// Split a block index marker off a tag.
///
/// `"template~block-3"` gives `("template", Some(3))`; tags without a
/// marker come back unchanged.
pub(crate) fn split_marker(tag: &str) -> (&str, Option<usize>) {
	match tag.rsplit_once(BLOCK_MARKER) {
		Some((name, index)) => match index.parse() {
			Ok(index) => (name, Some(index)),
			Err(_) => (tag, None),
		},
		None => (tag, None),
	}
}

/// Whitespace separated words of `text` with their byte offsets.
fn words(text: &str) -> impl Iterator<Item = (usize, &str)> {
	text.split([' ', '\t'])
		.scan(0, |offset, word| {
			let start = *offset;
			*offset += word.len() + 1;
			Some((start, word))
		})
		.filter(|(_, word)| !word.is_empty())
}

fn parse_header(line: &str) -> Option<Header> {
	if line.trim_start().starts_with('#') {
		return None;
	}
	let captures = BLOCK_HEADER.captures(line)?;
	let matched = captures.get(0)?;
	let column = matched.start() + matched.as_str().find('|')?;

	// Node properties (tag, anchor) may sit between the value position and
	// the header.
	let prefix: Vec<(usize, &str)> = words(&line[..column]).collect();
	let mut rest = prefix.as_slice();
	let mut tag = None;
	while let [init @ .., (start, word)] = rest {
		if word.starts_with('!') && tag.is_none() {
			tag = Some((*start, *word));
		} else if !word.starts_with('&') {
			break;
		}
		rest = init;
	}

	// Only a value position may open a block: after `key:`, `-`, a document
	// start, or at the very beginning of the line.
	let opens_value = match rest.last() {
		None => true,
		Some((_, word)) => word.ends_with(':') || *word == "-" || *word == "---",
	};
	if !opens_value {
		return None;
	}

	let mark = match tag {
		None => Mark::Insert(column),
		Some((_, word)) if word.starts_with("!!") || word.starts_with("!<") => Mark::Skip,
		Some((start, word)) => Mark::Extend(start + word.len()),
	};

	let indent = captures
		.name("indicators")
		.and_then(|m| m.as_str().chars().find_map(|c| c.to_digit(10)))
		.map(|digit| digit as usize);

	Some(Header {
		column,
		indent,
		mark,
	})
}

fn leading_spaces(line: &str) -> usize {
	line.len() - line.trim_start_matches(' ').len()
}

/// First row after the last content line of the block opened at
/// `header_row`.
fn block_end(lines: &[(usize, &str)], header_row: usize, header: &Header) -> usize {
	let parent_indent = leading_spaces(lines[header_row].1);
	let mut indent = header.indent.map(|n| parent_indent + n);
	let mut end_row = header_row + 1;

	for (row, (_, line)) in lines.iter().enumerate().skip(header_row + 1) {
		if line.trim().is_empty() {
			continue;
		}
		let spaces = leading_spaces(line);
		let n = *indent.get_or_insert(spaces);
		if spaces < n || n <= parent_indent {
			break;
		}
		end_row = row + 1;
	}

	end_row
}
