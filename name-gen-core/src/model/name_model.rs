use std::path::Path;

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bigram_table::BigramTable;
use super::generator::{Generator, capitalize};
use super::ngram_predictor::NGramPredictor;
use super::prediction_input::{PredictionInput, StartSeed};
use crate::corpus::{Corpus, CorpusConfig};
use crate::encoder::{EncodedDataset, encode_corpus};
use crate::error::Result;
use crate::io::{build_output_path, read_bytes, write_bytes};

/// The trained artifact: everything needed to generate names.
///
/// This struct bundles:
/// - `config`: window length, sentinel and disallowed characters
/// - `corpus`: filtered names, alphabet and length bounds (also used to avoid re-generating existing names)
/// - `table`: positional bigram table for seed sequences
/// - `predictor`: n-gram next-character model
///
/// Built once, then only read.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NameModel {
	config: CorpusConfig,
	corpus: Corpus,
	table: BigramTable,
	predictor: NGramPredictor,
}

impl NameModel {
	/// Loads a `NameModel` from its binary artifact if one exists next to the
	/// corpus file, otherwise builds it from the corpus and writes the artifact.
	///
	/// - `filepath` is the corpus file (one name per line).
	/// - The artifact is `<stem>.bin` in the same folder, encoded with `postcard`.
	/// - An artifact built with another `config`, or one that cannot be
	///   decoded, is rebuilt.
	pub fn new<P: AsRef<Path>>(filepath: P, config: &CorpusConfig) -> Result<Self> {
		let binary_data_path = build_output_path(&filepath, "bin")?;
		if binary_data_path.exists() {
			match Self::load(&binary_data_path) {
				Ok(model) if model.config == *config => {
					info!("Loaded model artifact {}", binary_data_path.display());
					return Ok(model);
				}
				Ok(_) => warn!(
					"Artifact {} was built with another configuration, rebuilding",
					binary_data_path.display()
				),
				Err(e) => warn!("Artifact {} could not be loaded ({e}), rebuilding", binary_data_path.display()),
			}
		}

		let corpus = Corpus::from_file(&filepath, config)?;
		let model = Self::from_corpus(corpus, config)?;
		model.save(&binary_data_path)?;
		info!(
			"Built model from {} ({} names), saved to {}",
			filepath.as_ref().display(),
			model.corpus.names().len(),
			binary_data_path.display()
		);
		Ok(model)
	}

	/// Builds the bigram table and the predictor from a preprocessed corpus.
	///
	/// # Errors
	/// Returns `GenError::Configuration` if every name is shorter than the window.
	pub fn from_corpus(corpus: Corpus, config: &CorpusConfig) -> Result<Self> {
		let table = BigramTable::from_names(corpus.names(), config.seq_len())?;
		let predictor = NGramPredictor::from_names(corpus.names(), corpus.alphabet(), config.seq_len())?;
		Ok(Self { config: config.clone(), corpus, table, predictor })
	}

	/// Convenience: preprocess raw names, then build.
	pub fn from_names<I, S>(raw_names: I, config: &CorpusConfig) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self::from_corpus(Corpus::from_names(raw_names, config)?, config)
	}

	/// Reads a postcard artifact.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = read_bytes(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}

	/// Writes a postcard artifact.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		write_bytes(path, &bytes)
	}

	pub fn config(&self) -> &CorpusConfig {
		&self.config
	}

	pub fn corpus(&self) -> &Corpus {
		&self.corpus
	}

	pub fn table(&self) -> &BigramTable {
		&self.table
	}

	pub fn predictor(&self) -> &NGramPredictor {
		&self.predictor
	}

	/// One-hot training tensors for an external trainer.
	pub fn training_data(&self) -> EncodedDataset {
		encode_corpus(&self.corpus, self.config.seq_len())
	}

	/// Generator over the bundled n-gram predictor.
	pub fn generator(&self) -> Result<Generator<'_, NGramPredictor>> {
		Generator::new(&self.predictor, self.corpus.alphabet(), self.config.seq_len(), self.corpus.max_len())
	}

	/// Generates a name with the thread-local RNG.
	pub fn generate(&self, input: &PredictionInput) -> Result<String> {
		self.generate_with_rng(input, &mut rand::rng())
	}

	/// Generates a name, avoiding names of the corpus if possible.
	///
	/// # Behavior
	/// - `StartSeed::Random` draws a seed from the bigram table.
	/// - `StartSeed::Custom` extends the given seed.
	/// - If the result already exists in the corpus (case-insensitive),
	///   generation runs again, up to `nb_try` more times. The last attempt is
	///   returned even if it is a duplicate.
	pub fn generate_with_rng<R: Rng + ?Sized>(&self, input: &PredictionInput, rng: &mut R) -> Result<String> {
		let generator = self.generator()?;

		let mut remaining = input.nb_try;
		loop {
			let name = match &input.start_seed {
				StartSeed::Random => generator.random_name(
					&self.table,
					input.temperature(),
					input.max_length,
					input.seed_retries,
					rng,
				)?,
				StartSeed::Custom(seed) => {
					let seed: String = seed.chars().flat_map(char::to_lowercase).collect();
					capitalize(&generator.extend(&seed, input.temperature(), input.max_length, rng)?)
				}
			};

			if !self.corpus.contains(&name) {
				return Ok(name);
			}
			if remaining == 0 {
				if input.nb_try > 0 {
					warn!("Every attempt produced an existing name, returning '{name}'");
				}
				return Ok(name);
			}
			remaining -= 1;
			debug!("'{name}' already exists, {remaining} retries left");
		}
	}
}
