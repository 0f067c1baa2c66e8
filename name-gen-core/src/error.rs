//! Error types for the name generation library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for corpus preparation, sampling and generation.
#[derive(Error, Debug)]
pub enum GenError {
	/// Empty or degenerate corpus, invalid settings, exhausted retries.
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// A weighted draw did not land in any bucket. Retrying with a fresh draw is expected to succeed.
	#[error("Sampling draw missed every bucket at position {position}")]
	TransientSampling { position: usize },

	/// Temperature outside `[0, 1]` (or NaN).
	#[error("Temperature must be between 0.0 and 1.0, got {0}")]
	InvalidTemperature(f32),

	/// Seed window that cannot be fed to the generator.
	#[error("Invalid seed: {0}")]
	InvalidSeed(String),

	/// Malformed argument (empty distribution, unknown index...).
	#[error("Invalid input: {0}")]
	InvalidInput(String),

	/// The predictive model failed or returned a malformed distribution.
	#[error("Prediction error: {0}")]
	Prediction(String),

	/// Two partial tables or models could not be combined.
	#[error("Merge error: {0}")]
	Merge(String),

	/// I/O error with file context
	#[error("I/O error for {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// Model artifact encoding/decoding failure.
	#[error("Serialization error: {0}")]
	Serialization(#[from] postcard::Error),
}

/// Result type alias for name generation operations.
pub type Result<T> = std::result::Result<T, GenError>;
