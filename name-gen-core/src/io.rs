use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{GenError, Result};

/// Wraps an `io::Error` with the path it happened on.
pub(crate) fn io_error<P: AsRef<Path>>(path: P, source: io::Error) -> GenError {
	GenError::Io { path: path.as_ref().to_path_buf(), source }
}

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub(crate) fn read_file<P: AsRef<Path>>(filename: P) -> Result<Vec<String>> {
	let contents = fs::read_to_string(&filename).map_err(|e| io_error(&filename, e))?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Reads a whole binary file.
pub(crate) fn read_bytes<P: AsRef<Path>>(filename: P) -> Result<Vec<u8>> {
	fs::read(&filename).map_err(|e| io_error(&filename, e))
}

/// Writes a whole binary file, replacing any previous content.
pub(crate) fn write_bytes<P: AsRef<Path>>(filename: P, bytes: &[u8]) -> Result<()> {
	fs::write(&filename, bytes).map_err(|e| io_error(&filename, e))
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/pokemon.dat` + `"bin"` → `data/pokemon.bin`
pub(crate) fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path.file_stem().ok_or_else(|| {
		io_error(input_path, io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))
	})?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}
