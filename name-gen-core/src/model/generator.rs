use log::debug;
use ndarray::{ArrayView1, ArrayView2};
use rand::Rng;

use crate::corpus::Alphabet;
use crate::encoder::{encode_position, encode_window};
use crate::error::{GenError, Result};
use crate::model::bigram_table::BigramTable;
use crate::sampling::{check_temperature, sample_with_temperature};

/// Next-character model queried by the generator.
///
/// `window` is a one-hot `(seq_len, alphabet)` matrix, `position` a one-hot
/// vector over `0..=max_len` holding the current output length. The result
/// is a probability-like vector with one entry per alphabet symbol, sentinel
/// last; it does not need to be exactly normalized.
pub trait Predictor {
	fn predict(&self, window: ArrayView2<f32>, position: ArrayView1<f32>) -> Result<Vec<f32>>;
}

impl<P: Predictor + ?Sized> Predictor for &P {
	fn predict(&self, window: ArrayView2<f32>, position: ArrayView1<f32>) -> Result<Vec<f32>> {
		(**self).predict(window, position)
	}
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
	fn predict(&self, window: ArrayView2<f32>, position: ArrayView1<f32>) -> Result<Vec<f32>> {
		(**self).predict(window, position)
	}
}

/// Uppercases the first character. Presentation only.
pub fn capitalize(name: &str) -> String {
	let mut chars = name.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Autoregressive name generator.
///
/// # Responsibilities
/// - Extend a seed window one character at a time using a `Predictor`
/// - Stop on the sentinel or at the length cap, never revisiting a character
/// - Compose seed drawing and extension into random full names
#[derive(Debug)]
pub struct Generator<'a, P: ?Sized> {
	predictor: &'a P,
	alphabet: &'a Alphabet,
	seq_len: usize,
	/// Longest corpus name: width of the position encoding and default cap.
	max_len: usize,
}

impl<'a, P: Predictor + ?Sized> Generator<'a, P> {
	/// # Errors
	/// Returns `GenError::Configuration` if `seq_len` is 0.
	pub fn new(predictor: &'a P, alphabet: &'a Alphabet, seq_len: usize, max_len: usize) -> Result<Self> {
		if seq_len == 0 {
			return Err(GenError::Configuration("seq_len must be >= 1".to_owned()));
		}
		Ok(Self { predictor, alphabet, seq_len, max_len })
	}

	pub fn seq_len(&self) -> usize {
		self.seq_len
	}

	fn check_seed(&self, seed: &str) -> Result<Vec<char>> {
		let chars: Vec<char> = seed.chars().collect();
		if chars.len() != self.seq_len {
			return Err(GenError::InvalidSeed(format!(
				"'{seed}' has {} characters, expected {}",
				chars.len(),
				self.seq_len
			)));
		}
		if let Some(c) = chars.iter().find(|c| **c == self.alphabet.sentinel() || !self.alphabet.contains(**c)) {
			return Err(GenError::InvalidSeed(format!("'{seed}' contains unusable character '{c}'")));
		}
		Ok(chars)
	}

	/// Extends `seed` until the model draws the sentinel or the output reaches
	/// `max_length` characters (`None` means the longest corpus name).
	///
	/// The seed itself is returned unchanged when the first draw is the
	/// sentinel. Output is lowercase, see [`capitalize`].
	///
	/// # Errors
	/// - `GenError::InvalidSeed` if the seed is not `seq_len` alphabet characters
	/// - `GenError::Configuration` if `max_length < seq_len`
	/// - `GenError::InvalidTemperature` if `temperature` is outside `[0, 1]`
	/// - `GenError::Prediction` if the model fails or returns a vector of the wrong size
	pub fn extend<R: Rng + ?Sized>(
		&self,
		seed: &str,
		temperature: f32,
		max_length: Option<usize>,
		rng: &mut R,
	) -> Result<String> {
		check_temperature(temperature)?;
		let mut output = self.check_seed(seed)?;

		let max_length = max_length.unwrap_or(self.max_len);
		if max_length < self.seq_len {
			return Err(GenError::Configuration(format!(
				"Maximum length {max_length} is shorter than the window length {}",
				self.seq_len
			)));
		}

		let sentinel = self.alphabet.sentinel_index();
		while output.len() < max_length {
			let window = encode_window(&output[output.len() - self.seq_len..], self.alphabet);
			let position = encode_position(output.len(), self.max_len);

			let probs = self.predictor.predict(window.view(), position.view())?;
			if probs.len() != self.alphabet.len() {
				return Err(GenError::Prediction(format!(
					"Model returned {} probabilities for {} symbols",
					probs.len(),
					self.alphabet.len()
				)));
			}

			let index = sample_with_temperature(&probs, temperature, rng)?;
			if index == sentinel {
				break;
			}
			match self.alphabet.char_at(index) {
				Some(c) => output.push(c),
				None => return Err(GenError::Prediction(format!("Sampled index {index} out of range"))),
			}
		}

		Ok(output.into_iter().collect())
	}

	/// Draws a seed from `table` (retrying transient failures up to
	/// `seed_retries` times), extends it, and capitalizes the result.
	///
	/// # Errors
	/// Same as [`Generator::extend`], plus `GenError::Configuration` when the
	/// table cannot produce a seed or its window length differs.
	pub fn random_name<R: Rng + ?Sized>(
		&self,
		table: &BigramTable,
		temperature: f32,
		max_length: Option<usize>,
		seed_retries: usize,
		rng: &mut R,
	) -> Result<String> {
		if table.seq_len() != self.seq_len {
			return Err(GenError::Configuration(format!(
				"Bigram table window {} does not match generator window {}",
				table.seq_len(),
				self.seq_len
			)));
		}

		let seed = table.sample_seed(seed_retries, rng)?;
		debug!("Extending seed '{seed}' at temperature {temperature}");
		let name = self.extend(&seed, temperature, max_length, rng)?;
		Ok(capitalize(&name))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::state::State;
	use rand::SeedableRng;
	use rand::rngs::StdRng;
	use std::cell::Cell;

	/// Puts all the mass on one index.
	struct Fixed(usize, usize);

	impl Predictor for Fixed {
		fn predict(&self, _window: ArrayView2<f32>, _position: ArrayView1<f32>) -> Result<Vec<f32>> {
			let mut probs = vec![0.0; self.1];
			probs[self.0] = 1.0;
			Ok(probs)
		}
	}

	/// Counts calls and returns a uniform distribution.
	struct Uniform {
		symbols: usize,
		calls: Cell<usize>,
	}

	impl Predictor for Uniform {
		fn predict(&self, window: ArrayView2<f32>, position: ArrayView1<f32>) -> Result<Vec<f32>> {
			assert_eq!(window.ncols(), self.symbols);
			assert_eq!(position.sum(), 1.0);
			self.calls.set(self.calls.get() + 1);
			Ok(vec![1.0 / self.symbols as f32; self.symbols])
		}
	}

	struct WrongSize;

	impl Predictor for WrongSize {
		fn predict(&self, _window: ArrayView2<f32>, _position: ArrayView1<f32>) -> Result<Vec<f32>> {
			Ok(vec![1.0])
		}
	}

	fn abc() -> Alphabet {
		Alphabet::new(['a', 'b', 'c'], '/').unwrap()
	}

	#[test]
	fn sentinel_model_returns_the_seed_unchanged() {
		let alphabet = abc();
		let model = Fixed(alphabet.sentinel_index(), alphabet.len());
		let generator = Generator::new(&model, &alphabet, 2, 10).unwrap();
		let mut rng = StdRng::seed_from_u64(0);

		assert_eq!(generator.extend("ab", 1.0, None, &mut rng).unwrap(), "ab");
		assert_eq!(generator.extend("ab", 0.0, None, &mut rng).unwrap(), "ab");
	}

	#[test]
	fn output_never_exceeds_max_length() {
		let alphabet = abc();
		let model = Uniform { symbols: alphabet.len(), calls: Cell::new(0) };
		let generator = Generator::new(&model, &alphabet, 2, 8).unwrap();
		let mut rng = StdRng::seed_from_u64(17);

		for max_length in [2, 3, 5, 8, 12] {
			for _ in 0..200 {
				let name = generator.extend("ca", 1.0, Some(max_length), &mut rng).unwrap();
				assert!(name.chars().count() <= max_length);
				assert!(name.starts_with("ca"));
			}
		}
	}

	#[test]
	fn never_ending_model_stops_at_the_cap() {
		let alphabet = abc();
		let model = Fixed(0, alphabet.len());
		let generator = Generator::new(&model, &alphabet, 2, 6).unwrap();
		let mut rng = StdRng::seed_from_u64(1);

		assert_eq!(generator.extend("bc", 0.0, None, &mut rng).unwrap(), "bcaaaa");
	}

	#[test]
	fn model_is_queried_once_per_appended_character() {
		let alphabet = abc();
		let model = Uniform { symbols: alphabet.len(), calls: Cell::new(0) };
		let generator = Generator::new(&model, &alphabet, 2, 5).unwrap();
		let mut rng = StdRng::seed_from_u64(4);

		let name = generator.extend("ab", 1.0, None, &mut rng).unwrap();
		let appended = name.chars().count() - 2;
		let stopped_on_sentinel = name.chars().count() < 5;
		assert_eq!(model.calls.get(), appended + usize::from(stopped_on_sentinel));
	}

	#[test]
	fn rejects_bad_seeds() {
		let alphabet = abc();
		let model = Fixed(0, alphabet.len());
		let generator = Generator::new(&model, &alphabet, 2, 6).unwrap();
		let mut rng = StdRng::seed_from_u64(1);

		for seed in ["a", "abc", "a/", "az"] {
			assert!(matches!(
				generator.extend(seed, 0.5, None, &mut rng),
				Err(GenError::InvalidSeed(_))
			));
		}
	}

	#[test]
	fn rejects_cap_below_window_and_bad_temperature() {
		let alphabet = abc();
		let model = Fixed(0, alphabet.len());
		let generator = Generator::new(&model, &alphabet, 2, 6).unwrap();
		let mut rng = StdRng::seed_from_u64(1);

		assert!(matches!(generator.extend("ab", 0.5, Some(1), &mut rng), Err(GenError::Configuration(_))));
		assert!(matches!(generator.extend("ab", 1.5, None, &mut rng), Err(GenError::InvalidTemperature(_))));
	}

	#[test]
	fn wrong_sized_prediction_is_an_error() {
		let alphabet = abc();
		let generator = Generator::new(&WrongSize, &alphabet, 2, 6).unwrap();
		let mut rng = StdRng::seed_from_u64(1);
		assert!(matches!(generator.extend("ab", 0.5, None, &mut rng), Err(GenError::Prediction(_))));
	}

	#[test]
	fn random_name_is_seeded_from_the_table_and_capitalized() {
		let alphabet = abc();
		let model = Fixed(alphabet.sentinel_index(), alphabet.len());
		let generator = Generator::new(&model, &alphabet, 2, 6).unwrap();

		let mut table = BigramTable::new(2).unwrap();
		table.insert_state(0, State::from_counts(None, [('c', 1)])).unwrap();
		table.insert_state(1, State::from_counts(Some('c'), [('a', 1)])).unwrap();

		let mut rng = StdRng::seed_from_u64(8);
		assert_eq!(generator.random_name(&table, 0.3, None, 10, &mut rng).unwrap(), "Ca");

		let mismatched = BigramTable::new(3).unwrap();
		assert!(matches!(
			generator.random_name(&mismatched, 0.3, None, 10, &mut rng),
			Err(GenError::Configuration(_))
		));
	}

	#[test]
	fn capitalize_only_touches_the_first_letter() {
		assert_eq!(capitalize("pikachu"), "Pikachu");
		assert_eq!(capitalize("éclair"), "Éclair");
		assert_eq!(capitalize(""), "");
	}
}
