use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::generator::Predictor;
use super::ngram_model::NGramModel;
use super::partial::build_partials;
use crate::corpus::Alphabet;
use crate::error::{GenError, Result};

/// Framework-free predictive model backed by n-gram counts.
///
/// Holds one `NGramModel` per context length `0..=seq_len` over
/// sentinel-terminated names. Prediction backs off from the longest context
/// seen in training to the unigram distribution.
///
/// # Invariants
/// - `models[k]` has order `k + 1`
/// - `models[0]` (unigram) is non-empty once built from a non-empty corpus
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NGramPredictor {
	alphabet: Alphabet,
	models: Vec<NGramModel>,
}

impl NGramPredictor {
	/// Creates an empty predictor with contexts up to `seq_len` characters.
	pub fn new(alphabet: Alphabet, seq_len: usize) -> Result<Self> {
		let models = (1..=seq_len + 1).map(NGramModel::new).collect::<Result<Vec<_>>>()?;
		Ok(Self { alphabet, models })
	}

	/// Counts every name on worker threads and merges the partial predictors.
	///
	/// # Errors
	/// Returns `GenError::Configuration` if `names` is empty.
	pub fn from_names(names: &[String], alphabet: &Alphabet, seq_len: usize) -> Result<Self> {
		if names.is_empty() {
			return Err(GenError::Configuration("Cannot build a predictor without names".to_owned()));
		}

		let mut predictor = Self::new(alphabet.clone(), seq_len)?;
		let partials = build_partials(names, |chunk| {
			let mut partial = Self::new(alphabet.clone(), seq_len)?;
			for name in chunk {
				partial.add_name(name);
			}
			Ok::<_, GenError>(partial)
		});
		for partial in partials {
			predictor.merge(&partial?)?;
		}
		Ok(predictor)
	}

	/// Longest context used for prediction.
	pub fn max_context(&self) -> usize {
		self.models.len() - 1
	}

	pub fn alphabet(&self) -> &Alphabet {
		&self.alphabet
	}

	/// Counts a name followed by the sentinel, for every context length.
	pub fn add_name(&mut self, name: &str) {
		let mut chars: Vec<char> = name.chars().collect();
		chars.push(self.alphabet.sentinel());
		for model in &mut self.models {
			model.add_sequence(&chars);
		}
	}

	/// Next-character distribution after `context`, in alphabet order.
	///
	/// Uses the longest suffix of `context` observed in training. Falls back
	/// to a uniform distribution if nothing matches (only possible when empty).
	pub fn distribution(&self, context: &[char]) -> Vec<f32> {
		let longest = context.len().min(self.max_context());
		for k in (0..=longest).rev() {
			let key: String = context[context.len() - k..].iter().collect();
			if let Some(counts) = self.models[k].counts(&key) {
				let total: usize = counts.values().sum();
				let mut probs = vec![0.0f32; self.alphabet.len()];
				for (c, count) in counts {
					if let Some(index) = self.alphabet.index_of(*c) {
						probs[index] = *count as f32 / total as f32;
					}
				}
				return probs;
			}
		}
		vec![1.0 / self.alphabet.len() as f32; self.alphabet.len()]
	}

	/// Decodes a one-hot window back to characters.
	///
	/// Sentinel rows (padding) and all-zero rows are dropped.
	fn decode_window(&self, window: ArrayView2<f32>) -> Result<Vec<char>> {
		if window.ncols() != self.alphabet.len() {
			return Err(GenError::Prediction(format!(
				"Window has {} columns, alphabet has {} symbols",
				window.ncols(),
				self.alphabet.len()
			)));
		}

		let sentinel = self.alphabet.sentinel_index();
		let mut context = Vec::with_capacity(window.nrows());
		for row in window.rows() {
			let hot = row.iter().position(|v| *v > 0.5);
			if let Some(index) = hot.filter(|index| *index != sentinel) {
				if let Some(c) = self.alphabet.char_at(index) {
					context.push(c);
				}
			}
		}
		Ok(context)
	}

	/// Merges another predictor built over the same alphabet.
	///
	/// # Errors
	/// Returns an error on alphabet or context length mismatch.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.alphabet != other.alphabet {
			return Err(GenError::Merge("Alphabet mismatch".to_owned()));
		}
		if self.models.len() != other.models.len() {
			return Err(GenError::Merge(format!(
				"Context length mismatch: {} vs {}",
				self.max_context(),
				other.max_context()
			)));
		}
		for (mine, theirs) in self.models.iter_mut().zip(&other.models) {
			mine.merge(theirs)?;
		}
		Ok(())
	}
}

impl Predictor for NGramPredictor {
	/// The position input is not used: name length is already captured by
	/// the sentinel counts of each context.
	fn predict(&self, window: ArrayView2<f32>, _position: ArrayView1<f32>) -> Result<Vec<f32>> {
		let context = self.decode_window(window)?;
		Ok(self.distribution(&context))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::encoder::{encode_position, encode_window};
	use approx::assert_abs_diff_eq;

	fn alphabet() -> Alphabet {
		Alphabet::new("abc".chars(), '/').unwrap()
	}

	fn names(list: &[&str]) -> Vec<String> {
		list.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn longest_context_wins() {
		let predictor = NGramPredictor::from_names(&names(&["abc", "abb"]), &alphabet(), 2).unwrap();
		let probs = predictor.distribution(&['a', 'b']);
		assert_abs_diff_eq!(probs[1], 0.5);
		assert_abs_diff_eq!(probs[2], 0.5);
		assert_abs_diff_eq!(probs[0], 0.0);
	}

	#[test]
	fn unseen_context_backs_off() {
		let predictor = NGramPredictor::from_names(&names(&["abc"]), &alphabet(), 2).unwrap();
		// "cc" is unknown, "c" is followed by the sentinel
		let probs = predictor.distribution(&['c', 'c']);
		assert_abs_diff_eq!(probs[3], 1.0);
	}

	#[test]
	fn distribution_sums_to_one() {
		let predictor = NGramPredictor::from_names(&names(&["abc", "cab", "bca", "aaa"]), &alphabet(), 3).unwrap();
		let contexts: [&[char]; 4] = [&['a'], &['b', 'c'], &['c', 'c', 'c'], &[]];
		for context in contexts {
			let sum: f32 = predictor.distribution(context).iter().sum();
			assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-5);
		}
	}

	#[test]
	fn predict_decodes_one_hot_windows() {
		let alphabet = alphabet();
		let predictor = NGramPredictor::from_names(&names(&["abc"]), &alphabet, 2).unwrap();
		let window = encode_window(&['a', 'b'], &alphabet);
		let position = encode_position(2, 3);
		let probs = predictor.predict(window.view(), position.view()).unwrap();
		assert_abs_diff_eq!(probs[2], 1.0);
	}

	#[test]
	fn padded_window_uses_the_real_characters() {
		let alphabet = alphabet();
		let predictor = NGramPredictor::from_names(&names(&["ab", "cab"]), &alphabet, 3).unwrap();
		let window = encode_window(&['a', 'b', '/'], &alphabet);
		let probs = predictor.predict(window.view(), encode_position(2, 3).view()).unwrap();
		assert_abs_diff_eq!(probs[3], 1.0);
	}

	#[test]
	fn rejects_windows_of_the_wrong_width() {
		let predictor = NGramPredictor::from_names(&names(&["abc"]), &alphabet(), 2).unwrap();
		let window = ndarray::Array2::<f32>::zeros((2, 7));
		let position = encode_position(2, 3);
		assert!(matches!(
			predictor.predict(window.view(), position.view()),
			Err(GenError::Prediction(_))
		));
	}

	#[test]
	fn empty_names_are_rejected() {
		assert!(NGramPredictor::from_names(&[], &alphabet(), 2).is_err());
	}
}
