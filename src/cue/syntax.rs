use crate::cue::{
	grammar::Keyword,
	parse::is_all_caps,
	report::IssueList,
	tree::{
		Timecode,
		Tree,
	},
};

const FILE_FORMATS: &[&str] = &["BINARY", "MOTOROLA", "AIFF", "WAVE", "MP3"];

const TRACK_MODES: &[&str] = &[
	"AUDIO",
	"CDG",
	"MODE1/2048",
	"MODE1/2352",
	"MODE2/2048",
	"MODE2/2324",
	"MODE2/2336",
	"MODE2/2352",
	"CDI/2336",
	"CDI/2352",
];

const TRACK_FLAGS: &[&str] = &["DCP", "4CH", "PRE", "SCMS"];

/// Consume exactly one space.
fn space(s: &str) -> Option<&str> {
	s.strip_prefix(' ')
}

/// Consume exactly `n` ASCII digits.
fn digits(s: &str, n: usize) -> Option<(&str, &str)> {
	if !s.is_char_boundary(n) {
		return None;
	}
	let (head, rest) = s.split_at(n);
	head.bytes().all(|b| b.is_ascii_digit()).then_some((head, rest))
}

fn num2(s: &str) -> Option<(u32, &str)> {
	let (head, rest) = digits(s, 2)?;
	Some((head.parse().ok()?, rest))
}

/// A double-quoted span (no embedded quotes) or a bare word containing
/// neither whitespace nor quotes. Empty matches are rejected.
fn string_arg(s: &str) -> Option<(&str, &str)> {
	if let Some(inner) = s.strip_prefix('"') {
		let end = inner.find('"')?;
		(end > 0).then(|| (&inner[..end], &inner[end + 1..]))
	} else {
		let end = s
			.find(|c: char| c.is_whitespace() || c == '"')
			.unwrap_or(s.len());
		(end > 0).then(|| (&s[..end], &s[end..]))
	}
}

fn one_of<'a>(s: &'a str, alts: &[&'static str]) -> Option<(&'static str, &'a str)> {
	alts.iter()
		.find_map(|&alt| s.strip_prefix(alt).map(|rest| (alt, rest)))
}

fn timecode(s: &str) -> Option<(Timecode, &str)> {
	let (min, s) = num2(s)?;
	let s = s.strip_prefix(':')?;
	let (sec, s) = num2(s)?;
	let s = s.strip_prefix(':')?;
	let (frame, s) = num2(s)?;
	Some((Timecode { min, sec, frame }, s))
}

/// The line must carry exactly `indent` leading spaces, then the upper-case
/// keyword; anything else (including the un-coerced original indentation
/// after an indent error) fails the whole match.
fn strip_head(raw: &str, indent: usize, kw: Keyword) -> Option<&str> {
	if !raw.is_char_boundary(indent) {
		return None;
	}
	let (head, rest) = raw.split_at(indent);
	if !head.bytes().all(|b| b == b' ') {
		return None;
	}

	rest.strip_prefix(kw.as_str())
}

/// `CATALOG <13 digits>`
fn catalog(s: &str) -> Option<&str> {
	let s = space(s)?;
	let (code, rest) = digits(s, 13)?;
	rest.is_empty().then_some(code)
}

/// `CDTEXTFILE <string>`
fn cdtextfile(s: &str) -> Option<()> {
	let s = space(s)?;
	let (_, rest) = string_arg(s)?;
	rest.is_empty().then_some(())
}

/// `TITLE/PERFORMER/SONGWRITER <string>`; yields the argument's length in
/// characters for the long-text warning.
fn text_arg(s: &str) -> Option<usize> {
	let s = space(s)?;
	let (inner, rest) = string_arg(s)?;
	rest.is_empty().then(|| inner.chars().count())
}

/// `FILE <string> <format>`
fn file(s: &str) -> Option<&str> {
	let s = space(s)?;
	let (path, s) = string_arg(s)?;
	let s = space(s)?;
	let (_, rest) = one_of(s, FILE_FORMATS)?;
	rest.is_empty().then_some(path)
}

/// `TRACK <2 digits> <mode>`
fn track(s: &str) -> Option<(u32, &'static str)> {
	let s = space(s)?;
	let (no, s) = num2(s)?;
	let s = space(s)?;
	let (mode, rest) = one_of(s, TRACK_MODES)?;
	rest.is_empty().then_some((no, mode))
}

/// `FLAGS (<flag>)+`
fn flags(mut s: &str) -> bool {
	if s.is_empty() {
		return false;
	}

	while !s.is_empty() {
		let Some(rest) = space(s) else {
			return false;
		};
		match one_of(rest, TRACK_FLAGS) {
			Some((_, rest)) => s = rest,
			None => return false,
		}
	}

	true
}

/// `ISRC <5 alphanumerics><7 digits>`
fn isrc(s: &str) -> Option<&str> {
	let s = space(s)?;
	if s.len() != 12 || !s.is_ascii() {
		return None;
	}
	let (head, tail) = s.split_at(5);
	(head.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
		&& tail.bytes().all(|b| b.is_ascii_digit()))
	.then_some(s)
}

/// `PREGAP/POSTGAP <mm:ss:ff>`
fn gap(s: &str) -> Option<Timecode> {
	let s = space(s)?;
	let (time, rest) = timecode(s)?;
	rest.is_empty().then_some(time)
}

/// `INDEX <2 digits> <mm:ss:ff>`
fn index(s: &str) -> Option<(u32, Timecode)> {
	let s = space(s)?;
	let (no, s) = num2(s)?;
	let s = space(s)?;
	let (time, rest) = timecode(s)?;
	rest.is_empty().then_some((no, time))
}

/// `REM <anything>`
fn rem(s: &str) -> bool {
	space(s).is_some_and(|rest| !rest.is_empty())
}

/// Collapsed remainder of the line with double quotes stripped; how the
/// free-text commands store their content.
fn collapsed_content(raw: &str) -> String {
	raw.split_whitespace()
		.skip(1)
		.collect::<Vec<_>>()
		.join(" ")
		.replace('"', "")
}

/// Match every node's text against its command's shape and populate the
/// typed fields. Mismatches leave the fields unset; later passes skip
/// unset operands.
pub fn run(
	tree: &mut Tree,
	errors: &mut IssueList,
	warnings: &mut IssueList,
	exists: &dyn Fn(&str) -> bool,
) {
	for id in tree.walk() {
		let (kw, indent, line, raw) = {
			let node = tree.node(id);
			match node.keyword {
				Some(kw) => (kw, node.indent, node.line, node.raw.clone()),
				None => continue,
			}
		};

		let Some(rest) = strip_head(&raw, indent, kw) else {
			errors.add(line, &raw, "command syntax error");
			continue;
		};

		match kw {
			Keyword::Catalog => match catalog(rest) {
				Some(code) => tree.node_mut(id).content = Some(code.to_string()),
				None => errors.add(line, &raw, "command syntax error"),
			},
			Keyword::CdTextFile => {
				if cdtextfile(rest).is_none() {
					errors.add(line, &raw, "command syntax error");
				}
			}
			Keyword::Title | Keyword::Performer | Keyword::Songwriter => match text_arg(rest) {
				Some(len) => {
					if len > 80 {
						warnings.add(
							line,
							&raw,
							format!("{kw} should not contain more than 80 characters"),
						);
					}
					tree.node_mut(id).content = Some(collapsed_content(&raw));
				}
				None => errors.add(line, &raw, "command syntax error"),
			},
			Keyword::File => match file(rest) {
				Some(path) => {
					if !exists(path) {
						errors.add(line, &raw, format!("{path} FILE not found"));
					}
					tree.node_mut(id).path = Some(path.to_string());
				}
				None => errors.add(line, &raw, "command syntax error"),
			},
			Keyword::Track => match track(rest) {
				Some((no, mode)) => {
					let node = tree.node_mut(id);
					node.number = Some(no);
					node.mode = Some(mode);
				}
				None => errors.add(line, &raw, "command syntax error"),
			},
			Keyword::Flags => {
				if !flags(rest) {
					errors.add(line, &raw, "command syntax error");
				}
			}
			Keyword::Isrc => match isrc(rest) {
				Some(code) => tree.node_mut(id).content = Some(code.to_string()),
				None => errors.add(line, &raw, "command syntax error"),
			},
			Keyword::Pregap | Keyword::Postgap => match gap(rest) {
				Some(time) => {
					if time.sec >= 60 || time.frame >= 75 {
						errors.add(line, &raw, "time error (second >= 60 or frame >= 75)");
					}
					tree.node_mut(id).time = Some(time);
				}
				None => errors.add(line, &raw, "command syntax error"),
			},
			Keyword::Index => match index(rest) {
				Some((no, time)) => {
					if time.sec >= 60 || time.frame >= 75 {
						errors.add(line, &raw, "time error (second >= 60 or frame >= 75)");
					}
					let node = tree.node_mut(id);
					node.number = Some(no);
					node.time = Some(time);
				}
				None => errors.add(line, &raw, "command syntax error"),
			},
			Keyword::Rem => {
				if rem(rest) {
					let words: Vec<&str> = raw.split_whitespace().collect();
					let node = tree.node_mut(id);
					if words.len() >= 3 && is_all_caps(words[1]) {
						node.tag = Some(words[1].to_string());
						node.content = Some(words[2..].join(" ").replace('"', ""));
					} else {
						node.tag = Some(String::new());
						// The verbatim remainder after the `REM ` prefix.
						node.content = Some(raw[4..].to_string());
					}
				} else {
					errors.add(line, &raw, "command syntax error");
				}
			}
		}
	}
}
