use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Extension of text corpora.
pub const CORPUS_EXTENSION: &str = "txt";

/// Extension of persisted models.
pub const MODEL_EXTENSION: &str = "mkv";

/// Reads a whole UTF-8 text file.
pub fn read_text<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	fs::read_to_string(filename)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"o2.mkv"` → `data/input.o2.mkv`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Path of the cached model built from `corpus_path` with the given order.
pub fn cache_path<P: AsRef<Path>>(corpus_path: P, order: usize) -> io::Result<PathBuf> {
	build_output_path(corpus_path, &format!("o{order}.{MODEL_EXTENSION}"))
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/shakespeare.txt"` → `"shakespeare"`
/// - `"shakespeare.txt"` → `"shakespeare"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// `"."` and `"./"` resolve to the current working directory, other paths
/// are returned as-is.
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists the stems of all files with a given extension in a directory, sorted.
pub fn list_names<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut names = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(OsStr::new(extension)) {
			if let Some(stem) = path.file_stem() {
				names.push(stem.to_string_lossy().to_string());
			}
		}
	}

	names.sort();
	Ok(names)
}
