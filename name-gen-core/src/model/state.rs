use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

/// Represents one row of the positional bigram table.
///
/// A `State` is keyed by the previously chosen character (`None` for the
/// first position of a seed) and stores how often every next character was
/// observed after it, at that position.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during construction
/// - Draw the next character using weighted random sampling
/// - Merge with another state having the same key (parallel construction)
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct State {
	/// Previous character, `None` at position 0.
	key: Option<char>,
	/// Outgoing transitions indexed by the next character.
	/// The value represents how many times this transition was observed.
	/// Example: { 'e' => 42, 'a' => 3 }
	transitions: BTreeMap<char, usize>,
}

impl State {
	/// Creates a new empty state for the given previous character.
	pub fn new(key: Option<char>) -> Self {
		Self {
			key,
			transitions: BTreeMap::new(),
		}
	}

	pub fn key(&self) -> Option<char> {
		self.key
	}

	/// Records an occurrence of a transition toward `next_char`.
	pub fn add_transition(&mut self, next_char: char) {
		*self.transitions.entry(next_char).or_insert(0) += 1;
	}

	/// Builds a state from explicit counts. Zero counts are skipped.
	pub fn from_counts<I: IntoIterator<Item = (char, usize)>>(key: Option<char>, counts: I) -> Self {
		let transitions = counts.into_iter().filter(|(_, count)| *count > 0).collect();
		Self { key, transitions }
	}

	/// Occurrence count of `next_char`, 0 when never seen.
	pub fn count(&self, next_char: char) -> usize {
		self.transitions.get(&next_char).copied().unwrap_or(0)
	}

	/// Sum of every occurrence count.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Normalized weights (`count / total`) in character order.
	pub fn weights(&self) -> Vec<(char, f64)> {
		let total = self.total() as f64;
		self.transitions
			.iter()
			.map(|(c, occurrence)| (*c, *occurrence as f64 / total))
			.collect()
	}

	/// Draws the next character with probability `count / total`.
	///
	/// The draw walks the cumulative weights with a float in `[0, 1)`. When
	/// rounding leaves the draw beyond the last bucket the call fails with
	/// `GenError::TransientSampling`; the caller is expected to draw again.
	///
	/// # Errors
	/// - `GenError::TransientSampling` when the draw lands in no bucket
	/// - `GenError::Configuration` when the state has no transitions
	pub fn predict<R: Rng + ?Sized>(&self, position: usize, rng: &mut R) -> Result<char> {
		if self.transitions.is_empty() {
			return Err(GenError::Configuration(format!("Empty transition row at position {position}")));
		}

		let r: f64 = rng.random();
		let mut cumulative = 0.0;
		for (next_char, weight) in self.weights() {
			cumulative += weight;
			if r < cumulative {
				return Ok(next_char);
			}
		}

		Err(GenError::TransientSampling { position })
	}

	/// Merges another state into this one.
	///
	/// Both states must represent the same previous character (`key`).
	/// Transition occurrence counts are summed.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.key != other.key {
			return Err(GenError::Merge(format!("Key mismatch: {:?} vs {:?}", self.key, other.key)));
		}

		for (next_char, occurrence) in &other.transitions {
			*self.transitions.entry(*next_char).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	/// Always returns the largest value below 1.0.
	struct EdgeRng;

	impl rand::RngCore for EdgeRng {
		fn next_u32(&mut self) -> u32 {
			u32::MAX
		}

		fn next_u64(&mut self) -> u64 {
			u64::MAX
		}

		fn fill_bytes(&mut self, dest: &mut [u8]) {
			dest.fill(0xff);
		}
	}

	#[test]
	fn counts_accumulate() {
		let mut state = State::new(Some('a'));
		state.add_transition('b');
		state.add_transition('b');
		state.add_transition('c');
		assert_eq!(state.count('b'), 2);
		assert_eq!(state.count('z'), 0);
		assert_eq!(state.total(), 3);
	}

	#[test]
	fn predict_only_returns_observed_characters() {
		let state = State::from_counts(None, [('x', 1), ('y', 5), ('z', 0)]);
		let mut rng = StdRng::seed_from_u64(1);
		for _ in 0..500 {
			let c = state.predict(0, &mut rng).unwrap();
			assert!(c == 'x' || c == 'y');
		}
	}

	#[test]
	fn draw_past_the_last_bucket_is_transient() {
		// seven sevenths add up to 0.9999999999999998, below the largest draw
		let state = State::from_counts(None, ('a'..='g').map(|c| (c, 1)));
		let cumulative: f64 = state.weights().iter().map(|(_, w)| w).sum();
		assert!(cumulative < 1.0);
		assert!(matches!(state.predict(2, &mut EdgeRng), Err(GenError::TransientSampling { position: 2 })));
	}

	#[test]
	fn draw_on_an_exact_total_lands_in_the_last_bucket() {
		let state = State::from_counts(None, [('a', 1), ('b', 3)]);
		assert_eq!(state.predict(0, &mut EdgeRng).unwrap(), 'b');
	}

	#[test]
	fn empty_state_is_a_configuration_error() {
		let state = State::new(None);
		let mut rng = StdRng::seed_from_u64(1);
		assert!(matches!(state.predict(0, &mut rng), Err(GenError::Configuration(_))));
	}

	#[test]
	fn merge_sums_counts_and_checks_keys() {
		let mut left = State::from_counts(Some('a'), [('b', 2)]);
		let right = State::from_counts(Some('a'), [('b', 1), ('c', 4)]);
		left.merge(&right).unwrap();
		assert_eq!(left.count('b'), 3);
		assert_eq!(left.count('c'), 4);

		let other_key = State::new(Some('z'));
		assert!(matches!(left.merge(&other_key), Err(GenError::Merge(_))));
	}
}
