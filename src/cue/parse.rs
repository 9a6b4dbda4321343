use anyhow::anyhow;

use crate::cue::{
	error::Error,
	grammar::{
		Keyword,
		Level,
	},
	report::IssueList,
	tree::{
		Node,
		NodeId,
		Tree,
	},
};

/// Collapse whitespace runs to single spaces and trim the ends.
fn collapse(s: &str) -> String {
	s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn leading_spaces(s: &str) -> usize {
	s.bytes().take_while(|&b| b == b' ').count()
}

/// At least one cased character and no lower-case ones.
pub(crate) fn is_all_caps(s: &str) -> bool {
	let mut cased = false;
	for c in s.chars() {
		if c.is_lowercase() {
			return false;
		}
		if c.is_uppercase() {
			cased = true;
		}
	}

	cased
}

/// Classify each raw line and grow the tree.
///
/// Lines that are blank or carry an unknown keyword are reported and
/// skipped; bad indentation is reported and coerced so placement can still
/// proceed. The only hard failure is a line whose depth requires a FILE or
/// TRACK that hasn't been opened yet.
pub fn build(doc: &str, lines: &[&str], errors: &mut IssueList) -> Result<Tree, Error> {
	let mut tree = Tree::new(doc);
	// Most recent node at each structural level; deeper lines attach here.
	let mut open: [Option<NodeId>; 3] = [Some(Tree::ROOT), None, None];

	for (i, &raw) in lines.iter().enumerate() {
		let line = i + 1;
		let flat = collapse(raw);
		if flat.is_empty() {
			errors.add(line, raw, "is blank");
			continue;
		}

		let token = flat.split(' ').next().unwrap_or(&flat);
		if !is_all_caps(token) {
			errors.add(line, raw, "command not is capital");
		}

		let Some(kw) = Keyword::from_token(&token.to_ascii_uppercase()) else {
			errors.add(line, raw, "command not found");
			continue;
		};

		let rule = kw.rule();
		let written = leading_spaces(raw);
		let mut indent = written;
		if !rule.indents.contains(&written) {
			errors.add(line, raw, "indent error");
			// The sole legal depth, or the nested one when two are legal.
			indent = rule.indents[rule.indents.len() - 1];
		}

		// Resolve the open ancestor for the chosen depth. A line whose depth
		// had to be coerced may retry its other permitted depth when the
		// deeper ancestor hasn't been opened, so a misindented top-level
		// command still attaches at the root. A correctly indented line with
		// no ancestor is unplaceable and aborts the file.
		let resolved = match open[Level::of(indent) as usize] {
			Some(parent) => Some((indent, parent)),
			None if indent != written => rule
				.indents
				.iter()
				.rev()
				.find_map(|&depth| open[Level::of(depth) as usize].map(|p| (depth, p))),
			None => None,
		};
		let Some((indent, parent)) = resolved else {
			return Err(Error {
				ln: i,
				msg: anyhow!("parent error"),
			});
		};

		let id = tree.push(
			parent,
			Node {
				line,
				keyword: Some(kw),
				raw: raw.to_string(),
				indent,
				..Node::default()
			},
		);

		// A new FILE or TRACK takes over deep attachments from here on.
		match kw {
			Keyword::File => open[Level::File as usize] = Some(id),
			Keyword::Track => open[Level::Track as usize] = Some(id),
			_ => (),
		}
	}

	Ok(tree)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn build_ok(lines: &[&str]) -> (Tree, IssueList) {
		let mut errors = IssueList::new();
		let tree = build("test.cue", lines, &mut errors).expect("no fatal error");
		(tree, errors)
	}

	fn messages(errors: &IssueList, line: usize) -> Vec<String> {
		errors.get(line).map(|i| i.messages.clone()).unwrap_or_default()
	}

	#[test]
	fn blank_line_reported_without_a_node() {
		let (tree, errors) = build_ok(&["CATALOG 1234567890123", " \t ", "CDTEXTFILE \"x.txt\""]);
		assert_eq!(messages(&errors, 2), ["is blank"]);
		assert_eq!(tree.node(Tree::ROOT).children.len(), 2);
	}

	#[test]
	fn unknown_command_skipped() {
		let (tree, errors) = build_ok(&["BOGUS 1"]);
		assert_eq!(messages(&errors, 1), ["command not found"]);
		assert!(tree.node(Tree::ROOT).children.is_empty());
	}

	#[test]
	fn lower_case_keyword_still_classifies() {
		let (tree, errors) = build_ok(&["catalog 1234567890123"]);
		assert_eq!(messages(&errors, 1), ["command not is capital"]);
		assert_eq!(tree.node(Tree::ROOT).children.len(), 1);
		assert_eq!(
			tree.node(tree.node(Tree::ROOT).children[0]).keyword,
			Some(Keyword::Catalog)
		);
	}

	#[test]
	fn numeric_first_token_is_not_capital() {
		let (_, errors) = build_ok(&["01 AUDIO"]);
		assert_eq!(messages(&errors, 1), ["command not is capital", "command not found"]);
	}

	#[test]
	fn bad_indent_coerced_to_nested_depth() {
		let (tree, errors) = build_ok(&[
			"FILE \"a.bin\" BINARY",
			"  TRACK 01 AUDIO",
			"  TITLE \"x\"",
		]);
		assert_eq!(messages(&errors, 3), ["indent error"]);

		// TITLE allows depths 0 and 4; 2 coerces to 4, attaching to the track.
		let file = tree.node(Tree::ROOT).children[0];
		let track = tree.node(file).children[0];
		let title = tree.node(track).children[0];
		assert_eq!(tree.node(title).keyword, Some(Keyword::Title));
		assert_eq!(tree.node(title).indent, 4);
	}

	#[test]
	fn later_file_opens_a_new_scope() {
		let (tree, _) = build_ok(&[
			"FILE \"a.bin\" BINARY",
			"  TRACK 01 AUDIO",
			"    INDEX 01 00:00:00",
			"FILE \"b.bin\" BINARY",
			"  TRACK 02 AUDIO",
			"    INDEX 01 00:00:00",
		]);

		let root = tree.node(Tree::ROOT);
		assert_eq!(root.children.len(), 2);
		let second_file = root.children[1];
		let second_track = tree.node(second_file).children[0];
		assert_eq!(tree.node(second_track).line, 5);
		assert_eq!(tree.node(second_track).children.len(), 1);
	}

	#[test]
	fn track_level_line_without_a_track_is_fatal() {
		let mut errors = IssueList::new();
		let err = build("test.cue", &["    INDEX 01 00:00:00"], &mut errors)
			.err()
			.expect("fatal");
		assert_eq!(err.ln, 0);
		assert_eq!(err.msg.to_string(), "parent error");
	}

	#[test]
	fn file_level_line_without_a_file_is_fatal() {
		let mut errors = IssueList::new();
		assert!(build("test.cue", &["  TRACK 01 AUDIO"], &mut errors).is_err());
	}

	#[test]
	fn coerced_title_without_a_track_falls_back_to_the_root() {
		let (tree, errors) = build_ok(&["  TITLE \"x\""]);
		assert_eq!(messages(&errors, 1), ["indent error"]);

		let title = tree.node(Tree::ROOT).children[0];
		assert_eq!(tree.node(title).keyword, Some(Keyword::Title));
		assert_eq!(tree.node(title).indent, 0);
	}

	#[test]
	fn correctly_nested_title_without_a_track_is_fatal() {
		let mut errors = IssueList::new();
		assert!(build("test.cue", &["    TITLE \"x\""], &mut errors).is_err());
	}

	#[test]
	fn tab_indentation_counts_as_depth_zero() {
		let (_, errors) = build_ok(&["FILE \"a.bin\" BINARY", "\tTRACK 01 AUDIO"]);
		assert_eq!(messages(&errors, 2), ["indent error"]);
	}
}
