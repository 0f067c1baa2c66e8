use crate::error::Result;
use crate::model::bigram_table::DEFAULT_SEED_RETRIES;
use crate::sampling::check_temperature;

/// Temperature for raw sampling from a custom seed.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Temperature for random full names, lower for more coherent output.
pub const RANDOM_NAME_TEMPERATURE: f32 = 0.3;

/// Strategy used to select the starting seed when generating a name.
///
/// # Variants
/// - `Random`: draw a seed from the positional bigram table.
/// - `Custom(String)`: use the provided string (exactly `seq_len` characters).
#[derive(PartialEq, Debug, Clone)]
pub enum StartSeed {
	Random,
	Custom(String),
}

/// Input parameters for generating a name.
///
/// # Responsibilities
/// - Track generation parameters (`temperature`, `max_length`, `nb_try`, `seed_retries`, `start_seed`)
/// - Keep the temperature inside `[0, 1]`
///
/// # Invariants
/// - `temperature` is always in `[0.0, 1.0]`
#[derive(Debug, Clone)]
pub struct PredictionInput {
	/// Sampling temperature (0.0 = argmax, 1.0 = model distribution).
	temperature: f32,

	/// Maximum output length, `None` for the longest corpus name.
	pub max_length: Option<usize>,

	/// Number of regenerations when the result already exists in the corpus.
	pub nb_try: usize,

	/// Number of seed draws before giving up on a degenerate table.
	pub seed_retries: usize,

	/// Starting seed strategy.
	pub start_seed: StartSeed,
}

impl Default for PredictionInput {
	/// Random seed, low temperature.
	fn default() -> Self {
		Self {
			temperature: RANDOM_NAME_TEMPERATURE,
			max_length: None,
			nb_try: 0,
			seed_retries: DEFAULT_SEED_RETRIES,
			start_seed: StartSeed::Random,
		}
	}
}

impl PredictionInput {
	/// Input for extending a caller-supplied seed at the raw sampling temperature.
	pub fn custom(seed: &str) -> Self {
		Self {
			temperature: DEFAULT_TEMPERATURE,
			start_seed: StartSeed::Custom(seed.to_owned()),
			..Self::default()
		}
	}

	/// Returns the current temperature.
	pub fn temperature(&self) -> f32 {
		self.temperature
	}

	/// Sets the temperature (0.0..=1.0).
	///
	/// # Errors
	/// Returns an error if the value is outside the valid range.
	pub fn set_temperature(&mut self, temperature: f32) -> Result<()> {
		check_temperature(temperature)?;
		self.temperature = temperature;
		Ok(())
	}
}
