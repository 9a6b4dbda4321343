mod checks;
mod error;
mod grammar;
mod parse;
mod report;
mod syntax;
mod tree;

use std::{
	fs,
	path::Path,
};

use anyhow::{
	anyhow,
	bail,
	Result,
};

pub use self::{
	grammar::Keyword,
	report::{
		Issue,
		IssueList,
	},
	tree::{
		Node,
		NodeId,
		Timecode,
		Tree,
	},
};

/// Everything one validation run produces. The sets and the tree all render
/// as deterministic text.
#[derive(Debug)]
pub struct Report {
	pub errors: IssueList,
	pub warnings: IssueList,
	pub tree: Tree,
}

/// Validate cuesheet text.
///
/// `doc` labels the tree root (usually the sheet's path). `exists` is asked
/// whether each referenced data file is present; paths are handed over as
/// written in the sheet.
///
/// The passes run in a fixed order and only ever append diagnostics; the
/// one `Err` case is a line whose depth has no open ancestor to attach to.
pub fn check(doc: &str, text: &str, exists: impl Fn(&str) -> bool) -> Result<Report> {
	let lines = text.lines().collect::<Vec<_>>();

	let mut errors = IssueList::new();
	let mut warnings = IssueList::new();

	let mut tree = parse::build(doc, &lines, &mut errors)
		.map_err(|e| anyhow!("line {}: {}\n> {}", e.ln + 1, e.msg, lines[e.ln]))?;

	syntax::run(&mut tree, &mut errors, &mut warnings, &exists);
	checks::structure(&tree, &mut errors, &mut warnings);
	checks::multiplicity(&tree, &mut errors);
	checks::order(&tree, &mut errors);
	checks::sequence(&tree, &mut errors, &mut warnings);

	Ok(Report {
		errors,
		warnings,
		tree,
	})
}

/// Read, decode and validate the cuesheet at `path`.
///
/// Referenced data files are looked up relative to the sheet's directory.
/// A wrong extension, an unreadable file or undecodable content fail here,
/// before any validation starts.
pub fn check_file(path: &Path) -> Result<Report> {
	if !path
		.extension()
		.is_some_and(|s| s.eq_ignore_ascii_case("cue"))
	{
		bail!("{} is not a cuesheet", path.display());
	}

	let data = fs::read(path).map_err(|e| anyhow!("error reading {}: {}", path.display(), e))?;

	let mut detect = chardetng::EncodingDetector::new();
	detect.feed(&data, true);
	let mut dec = detect.guess(None, true).new_decoder();
	let mut buf = String::with_capacity(dec.max_utf8_buffer_length(data.len()).unwrap());
	buf.extend((0..buf.capacity()).map(|_| '\0'));
	let (res, _read, len, had_replacements) = dec.decode_to_str(&data, &mut buf, true);
	debug_assert_eq!(res, encoding_rs::CoderResult::InputEmpty);
	if had_replacements {
		bail!("error decoding {}", path.display());
	}

	let text = buf[..len].strip_prefix('\u{feff}').unwrap_or(&buf[..len]);
	let dir = path.parent().unwrap_or_else(|| Path::new("."));

	check(&path.display().to_string(), text, |rel| {
		dir.join(rel).is_file()
	})
}
