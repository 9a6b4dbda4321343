mod cue;

use std::path::{
	Path,
	PathBuf,
};

use anyhow::{
	ensure,
	Result,
};
use clap::Parser;
use jwalk::WalkDir;
use rayon::prelude::*;

use crate::cue::Report;

#[derive(Parser)]
/// Cuelint checks cuesheet files for syntax and structural problems.
#[command(version)]
struct Args {
	/// Cuesheet files, or directories to scan for .cue files
	#[arg(required = true)]
	paths: Vec<PathBuf>,

	/// Maximum number of files checked in parallel; defaults to about half the available logical CPU cores
	#[arg(short, long)]
	jobs: Option<usize>,

	/// Print warnings in addition to errors
	#[arg(short, long)]
	warn: bool,

	/// Print the command tree of each checked file
	#[arg(short = 'p', long = "print")]
	print_tree: bool,
}

fn gather(paths: &[PathBuf]) -> Vec<PathBuf> {
	let mut files = Vec::with_capacity(paths.len());

	for path in paths {
		if !path.is_dir() {
			files.push(path.clone());
			continue;
		}

		for entry in WalkDir::new(path).skip_hidden(false).follow_links(true) {
			let Ok(entry) = entry else {
				continue;
			};
			if entry.file_type.is_file()
				&& Path::new(&entry.file_name)
					.extension()
					.is_some_and(|s| s.eq_ignore_ascii_case("cue"))
			{
				files.push(entry.parent_path.join(entry.file_name));
			}
		}
	}

	files
}

fn run() -> Result<bool> {
	let args = Args::parse();

	if let Some(n) = args.jobs.or_else(|| {
		std::thread::available_parallelism()
			.ok()
			.map(|n| n.get() / 2 + 1)
	}) {
		let _ = rayon::ThreadPoolBuilder::new()
			.num_threads(n)
			.build_global();
	}

	let files = gather(&args.paths);
	ensure!(!files.is_empty(), "no .cue files found");

	// Runs are independent; results print in input order below.
	let reports = files
		.par_iter()
		.map(|p| cue::check_file(p))
		.collect::<Vec<_>>();

	let mut clean = true;
	for (path, res) in files.iter().zip(reports) {
		match res {
			Err(e) => {
				clean = false;
				eprintln!("error: {e}");
			}
			Ok(Report {
				errors,
				warnings,
				tree,
			}) => {
				if !errors.is_empty() {
					clean = false;
					println!("ERROR: {}", path.display());
					println!("{errors}");
				}
				if args.warn && !warnings.is_empty() {
					println!("WARN: {}", path.display());
					println!("{warnings}");
				}
				if args.print_tree {
					println!("{tree}");
				}
			}
		}
	}

	Ok(clean)
}

fn main() {
	match run() {
		Err(e) => {
			eprintln!("error: {e:?}");
			std::process::exit(1);
		}
		Ok(false) => std::process::exit(1),
		Ok(true) => (),
	}
}
