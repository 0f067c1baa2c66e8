//! Character-level name generation.
//!
//! This crate provides a small pipeline for synthesizing new names from a
//! corpus of existing ones:
//! - Corpus preprocessing (filtering, alphabet, length bounds)
//! - Sliding-window training data with one-hot encoding
//! - A positional bigram table to draw plausible seed windows
//! - Temperature sampling over a model's next-character distribution
//! - Autoregressive generation behind a single-method `Predictor` trait
//!
//! A framework-free n-gram predictor is included so names can be generated
//! without an external neural network; any other model plugs in by
//! implementing `Predictor`.

/// Corpus preprocessing: `CorpusConfig`, `Alphabet`, `Corpus`.
pub mod corpus;

/// Sliding windows and one-hot tensors.
pub mod encoder;

/// Error type shared by the whole crate.
pub mod error;

/// Seed sampling, prediction and generation.
pub mod model;

/// Temperature sampling.
pub mod sampling;

/// I/O utilities (file loading, path helpers).
///
/// Not exposed
pub(crate) mod io;

pub use corpus::{Alphabet, Corpus, CorpusConfig};
pub use error::{GenError, Result};
pub use model::bigram_table::BigramTable;
pub use model::generator::{Generator, Predictor, capitalize};
pub use model::name_model::NameModel;
pub use model::ngram_predictor::NGramPredictor;
pub use model::prediction_input::{PredictionInput, StartSeed};
