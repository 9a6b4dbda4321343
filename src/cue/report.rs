use core::fmt;
use std::collections::BTreeMap;

/// Every message recorded against one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
	pub line: usize,
	pub raw: String,
	pub messages: Vec<String>,
}

/// Issues keyed by line number.
///
/// Recording against an already-present line appends to that line's
/// messages instead of creating a second entry, so distinct problems on
/// one line are reported together. Iteration is ascending by line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueList {
	issues: BTreeMap<usize, Issue>,
}

impl IssueList {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, line: usize, raw: &str, message: impl Into<String>) {
		self.issues
			.entry(line)
			.or_insert_with(|| Issue {
				line,
				raw: raw.to_string(),
				messages: Vec::new(),
			})
			.messages
			.push(message.into());
	}

	pub fn is_empty(&self) -> bool {
		self.issues.is_empty()
	}

	pub fn len(&self) -> usize {
		self.issues.len()
	}

	pub fn get(&self, line: usize) -> Option<&Issue> {
		self.issues.get(&line)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Issue> {
		self.issues.values()
	}
}

impl fmt::Display for IssueList {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for issue in self.issues.values() {
			let head = format!("line {}: ", issue.line);
			for (i, msg) in issue.messages.iter().enumerate() {
				if i == 0 {
					writeln!(f, "{head}{msg}")?;
				} else {
					writeln!(f, "{:pad$}{msg}", "", pad = head.len())?;
				}
			}
			writeln!(f, "  -->{}", issue.raw)?;
		}

		Ok(())
	}
}
