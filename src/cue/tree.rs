use core::fmt;

use crate::cue::grammar::Keyword;

/// Index of a node in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

/// An `mm:ss:ff` timestamp; 75 frames make a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timecode {
	pub min: u32,
	pub sec: u32,
	pub frame: u32,
}

impl Timecode {
	pub const fn frames(self) -> u32 {
		(self.min * 60 + self.sec) * 75 + self.frame
	}
}

impl fmt::Display for Timecode {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{:02}:{:02}:{:02}", self.min, self.sec, self.frame)
	}
}

/// One classified source line (or the document root, which has no keyword).
///
/// The typed fields stay `None` until the syntax pass extracts them, and
/// remain `None` on lines whose shape did not match.
#[derive(Debug, Clone, Default)]
pub struct Node {
	/// 1-based source line number; 0 for the root.
	pub line: usize,
	pub keyword: Option<Keyword>,
	/// The verbatim source line. For the root, the document name.
	pub raw: String,
	/// Leading-space count after coercion to a permitted depth.
	pub indent: usize,
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,

	pub content: Option<String>,
	pub number: Option<u32>,
	pub time: Option<Timecode>,
	pub path: Option<String>,
	pub mode: Option<&'static str>,
	pub tag: Option<String>,
}

/// The command tree, stored as an append-only arena.
///
/// Lines always attach to the most recent open ancestor, so arena order is
/// source order, which is also pre-order over the finished tree.
#[derive(Debug)]
pub struct Tree {
	nodes: Vec<Node>,
}

impl Tree {
	pub const ROOT: NodeId = NodeId(0);

	pub fn new(doc: &str) -> Self {
		Self {
			nodes: vec![Node {
				raw: doc.to_string(),
				..Node::default()
			}],
		}
	}

	pub fn push(&mut self, parent: NodeId, mut node: Node) -> NodeId {
		let id = NodeId(self.nodes.len());
		node.parent = Some(parent);
		self.nodes.push(node);
		self.nodes[parent.0].children.push(id);
		id
	}

	pub fn node(&self, id: NodeId) -> &Node {
		&self.nodes[id.0]
	}

	pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
		&mut self.nodes[id.0]
	}

	/// Every node id (the root included) in source order.
	pub fn walk(&self) -> impl Iterator<Item = NodeId> {
		(0..self.nodes.len()).map(NodeId)
	}

	/// Ids of every node with the given keyword, in source order.
	pub fn with_keyword(&self, kw: Keyword) -> impl Iterator<Item = NodeId> + '_ {
		self.walk()
			.filter(move |&id| self.node(id).keyword == Some(kw))
	}

	/// Descendants of `id` with the given keyword, in source order.
	pub fn descendants_with(&self, id: NodeId, kw: Keyword) -> Vec<NodeId> {
		let mut out = Vec::new();
		self.collect_descendants(id, kw, &mut out);
		out
	}

	fn collect_descendants(&self, id: NodeId, kw: Keyword, out: &mut Vec<NodeId>) {
		for &child in &self.node(id).children {
			if self.node(child).keyword == Some(kw) {
				out.push(child);
			}
			self.collect_descendants(child, kw, out);
		}
	}

	fn fmt_node(&self, f: &mut fmt::Formatter, id: NodeId) -> fmt::Result {
		let n = self.node(id);
		match n.keyword {
			None => writeln!(f, "{}", n.raw)?,
			Some(kw) => {
				write!(f, "{:indent$}{} line {}", "", kw, n.line, indent = n.indent)?;
				if let Some(path) = &n.path {
					write!(f, " file={path:?}")?;
				}
				if let Some(no) = n.number {
					write!(f, " number={no}")?;
				}
				if let Some(mode) = n.mode {
					write!(f, " mode={mode}")?;
				}
				if let Some(time) = n.time {
					write!(f, " time={time}")?;
				}
				if let Some(tag) = n.tag.as_deref().filter(|s| !s.is_empty()) {
					write!(f, " tag={tag}")?;
				}
				if let Some(content) = &n.content {
					write!(f, " content={content:?}")?;
				}
				writeln!(f)?;
			}
		}

		for &child in &n.children {
			self.fmt_node(f, child)?;
		}

		Ok(())
	}
}

impl fmt::Display for Tree {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		self.fmt_node(f, Self::ROOT)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn timecode_frames() {
		let t = Timecode {
			min: 1,
			sec: 2,
			frame: 3,
		};
		assert_eq!(t.frames(), (60 + 2) * 75 + 3);
		assert_eq!(t.to_string(), "01:02:03");
	}

	#[test]
	fn arena_order_is_source_order() {
		let mut tree = Tree::new("x.cue");
		let file = tree.push(
			Tree::ROOT,
			Node {
				line: 1,
				keyword: Some(Keyword::File),
				..Node::default()
			},
		);
		let track = tree.push(
			file,
			Node {
				line: 2,
				keyword: Some(Keyword::Track),
				..Node::default()
			},
		);
		tree.push(
			track,
			Node {
				line: 3,
				keyword: Some(Keyword::Index),
				..Node::default()
			},
		);

		let lines: Vec<_> = tree.walk().map(|id| tree.node(id).line).collect();
		assert_eq!(lines, [0, 1, 2, 3]);

		assert_eq!(tree.node(track).parent, Some(file));
		assert_eq!(tree.descendants_with(Tree::ROOT, Keyword::Index).len(), 1);
	}
}
