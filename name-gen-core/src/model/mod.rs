//! Seed sampling, prediction and generation.
//!
//! This module provides:
//! - The positional bigram table used to draw seed windows (`BigramTable`)
//! - Fixed-order character n-gram counts (`NGramModel`) and the predictor built on them (`NGramPredictor`)
//! - The `Predictor` contract and the autoregressive `Generator`
//! - Generation parameters (`PredictionInput`)
//! - The persisted artifact bundling all of the above (`NameModel`)

/// Positional bigram table and seed drawing with bounded retries.
pub mod bigram_table;

/// `Predictor` trait and the autoregressive generator.
///
/// Extends a seed one character at a time through the temperature sampler,
/// stopping on the sentinel or at the length cap.
pub mod generator;

/// Trained artifact: corpus, bigram table and predictor, with postcard save/load.
pub mod name_model;

/// Fixed-order n-gram model (`n >= 1`).
///
/// Handles sequence ingestion, transition counting and model merging.
pub mod ngram_model;

/// N-gram backed `Predictor` with suffix back-off.
pub mod ngram_predictor;

/// Generation parameters: temperature, length cap, retry limits and start seed.
pub mod prediction_input;

/// One row of transition counts with weighted sampling.
pub mod state;

/// Chunked multi-threaded construction of partial tables.
mod partial;
