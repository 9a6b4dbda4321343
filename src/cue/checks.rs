use crate::cue::{
	grammar::Keyword,
	report::IssueList,
	tree::{
		NodeId,
		Tree,
	},
};

fn has_child(tree: &Tree, id: NodeId, kw: Keyword) -> bool {
	tree.node(id)
		.children
		.iter()
		.any(|&c| tree.node(c).keyword == Some(kw))
}

/// Allowed-child and mandatory-child checks.
pub fn structure(tree: &Tree, errors: &mut IssueList, warnings: &mut IssueList) {
	for id in tree.walk() {
		let node = tree.node(id);
		let Some(kw) = node.keyword else { continue };

		for &child in &node.children {
			let Some(ck) = tree.node(child).keyword else { continue };
			if !kw.rule().children.contains(&ck) {
				errors.add(node.line, &node.raw, format!("have error child {ck}"));
			}
		}

		match kw {
			Keyword::File => {
				if !has_child(tree, id, Keyword::Track) {
					errors.add(node.line, &node.raw, "FILE not have TRACK");
				}
			}
			Keyword::Track => {
				if !has_child(tree, id, Keyword::Index) {
					errors.add(node.line, &node.raw, "TRACK not have INDEX");
				}
				if !has_child(tree, id, Keyword::Title) {
					warnings.add(node.line, &node.raw, "TRACK not have TITLE");
				}
			}
			_ => (),
		}
	}
}

/// Singleton commands: when a keyword marked non-repeatable occurs more than
/// once under one parent, every occurrence reports at its own line.
pub fn multiplicity(tree: &Tree, errors: &mut IssueList) {
	for id in tree.walk() {
		let node = tree.node(id);
		let Some(kw) = node.keyword else { continue };
		if kw.rule().multiple {
			continue;
		}
		let Some(parent) = node.parent else { continue };

		let twins = tree
			.node(parent)
			.children
			.iter()
			.filter(|&&c| tree.node(c).keyword == Some(kw))
			.count();
		if twins > 1 {
			errors.add(node.line, &node.raw, "multiple command error");
		}
	}
}

/// Sibling ordering: keywords in a node's `after` set must not appear among
/// later siblings, keywords in its `before` set must not appear among
/// earlier ones. Both checks can fire for the same node.
pub fn order(tree: &Tree, errors: &mut IssueList) {
	for id in tree.walk() {
		let node = tree.node(id);
		let Some(kw) = node.keyword else { continue };
		let Some(parent) = node.parent else { continue };

		let pos = kw.position(tree.node(parent).keyword);
		let siblings = &tree.node(parent).children;
		let Some(me) = siblings.iter().position(|&c| c == id) else {
			continue;
		};

		if !pos.after.is_empty() {
			for &sib in &siblings[me + 1..] {
				if tree.node(sib).keyword.is_some_and(|k| pos.after.contains(&k)) {
					errors.add(node.line, &node.raw, "command order error");
				}
			}
		}
		if !pos.before.is_empty() {
			for &sib in &siblings[..me] {
				if tree.node(sib).keyword.is_some_and(|k| pos.before.contains(&k)) {
					errors.add(node.line, &node.raw, "command order error");
				}
			}
		}
	}
}

/// The three document-wide passes over nodes in source order. Pairs whose
/// operands were never extracted (a prior syntax failure) are skipped.
pub fn sequence(tree: &Tree, errors: &mut IssueList, warnings: &mut IssueList) {
	track_numbers(tree, errors, warnings);
	index_times(tree, errors);
	index_numbers(tree, errors);
}

/// Track numbers should start at 1 and increase by one.
fn track_numbers(tree: &Tree, errors: &mut IssueList, warnings: &mut IssueList) {
	let tracks: Vec<NodeId> = tree.with_keyword(Keyword::Track).collect();

	if let Some(&first) = tracks.first() {
		let node = tree.node(first);
		if node.number.is_some_and(|no| no != 1) {
			warnings.add(node.line, &node.raw, "first TRACK number not is 1");
		}
	}

	for pair in tracks.windows(2) {
		let (a, b) = (tree.node(pair[0]), tree.node(pair[1]));
		let (Some(x), Some(y)) = (a.number, b.number) else {
			continue;
		};
		if x + 1 != y {
			errors.add(a.line, &a.raw, format!("TRACK number error, {x} -> {y}"));
		}
	}
}

/// Within one FILE, index times start at zero and strictly increase.
fn index_times(tree: &Tree, errors: &mut IssueList) {
	for file in tree.with_keyword(Keyword::File) {
		let indexes = tree.descendants_with(file, Keyword::Index);

		if let Some(&first) = indexes.first() {
			let node = tree.node(first);
			if node.time.is_some_and(|t| t.frames() != 0) {
				errors.add(node.line, &node.raw, "first INDEX time not is 0 of FILE");
			}
		}

		for pair in indexes.windows(2) {
			let (a, b) = (tree.node(pair[0]), tree.node(pair[1]));
			let (Some(x), Some(y)) = (a.time, b.time) else {
				continue;
			};
			if x.frames() >= y.frames() {
				errors.add(a.line, &a.raw, format!("INDEX time error, {x} >= {y}"));
			}
		}
	}
}

/// Within one TRACK, index numbers start at 0 or 1 and increase by one.
fn index_numbers(tree: &Tree, errors: &mut IssueList) {
	for track in tree.with_keyword(Keyword::Track) {
		let indexes: Vec<NodeId> = tree
			.node(track)
			.children
			.iter()
			.copied()
			.filter(|&c| tree.node(c).keyword == Some(Keyword::Index))
			.collect();

		if let Some(&first) = indexes.first() {
			let node = tree.node(first);
			if node.number.is_some_and(|no| no > 1) {
				errors.add(
					node.line,
					&node.raw,
					"first INDEX number not is 0 or 1 of TRACK",
				);
			}
		}

		for pair in indexes.windows(2) {
			let (a, b) = (tree.node(pair[0]), tree.node(pair[1]));
			let (Some(x), Some(y)) = (a.number, b.number) else {
				continue;
			};
			if x + 1 != y {
				errors.add(a.line, &a.raw, format!("INDEX number error, {x} -> {y}"));
			}
		}
	}
}
