use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

/// Represents a fixed-order n-gram model over characters.
///
/// The `NGramModel` stores, for every observed context of `n - 1`
/// characters, how often each next character followed it. `n == 1` is the
/// unigram model: a single empty context.
///
/// # Responsibilities
/// - Count transitions from sentinel-terminated names
/// - Return the normalized next-character counts of a context
/// - Merge with another n-gram model of the same order `n`
///
/// # Invariants
/// - `n >= 1`
/// - Each key in `states` has exactly `n - 1` characters
/// - All transition counts are >= 1
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NGramModel {
	/// The order of the model (context length + 1)
	n: usize,

	/// Mapping from a context (length n-1) to next-character counts
	states: HashMap<String, BTreeMap<char, usize>>,
}

impl NGramModel {
	/// Creates a new n-gram model of order `n`.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn new(n: usize) -> Result<Self> {
		if n < 1 {
			return Err(GenError::Configuration("n must be >= 1".to_owned()));
		}
		Ok(Self { n, states: HashMap::new() })
	}

	pub fn order(&self) -> usize {
		self.n
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Adds one name, already terminated by the sentinel.
	///
	/// Every character from index `n - 1` on is counted after its `n - 1`
	/// predecessors. Names shorter than `n` contribute nothing.
	pub fn add_sequence(&mut self, chars: &[char]) {
		let context_len = self.n - 1;
		if chars.len() < self.n {
			return;
		}

		for i in context_len..chars.len() {
			let context: String = chars[i - context_len..i].iter().collect();
			*self.states.entry(context).or_default().entry(chars[i]).or_insert(0) += 1;
		}
	}

	/// Next-character counts for `context`, `None` if the context was never seen.
	///
	/// `context` must hold exactly `n - 1` characters.
	pub fn counts(&self, context: &str) -> Option<&BTreeMap<char, usize>> {
		self.states.get(context)
	}

	/// Merges another n-gram model into this one.
	///
	/// # Notes
	/// - Both models must have the same order `n`.
	/// - Occurrence counts for matching contexts and transitions are summed.
	///
	/// # Errors
	/// Returns an error if the model orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.n != other.n {
			return Err(GenError::Merge(format!("N mismatch: {} vs {}", self.n, other.n)));
		}

		for (context, counts) in &other.states {
			let existing = self.states.entry(context.clone()).or_default();
			for (next_char, occurrence) in counts {
				*existing.entry(*next_char).or_insert(0) += *occurrence;
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chars(s: &str) -> Vec<char> {
		s.chars().collect()
	}

	#[test]
	fn unigram_counts_every_character() {
		let mut model = NGramModel::new(1).unwrap();
		model.add_sequence(&chars("abba/"));
		let counts = model.counts("").unwrap();
		assert_eq!(counts[&'a'], 2);
		assert_eq!(counts[&'b'], 2);
		assert_eq!(counts[&'/'], 1);
	}

	#[test]
	fn trigram_counts_follow_two_character_contexts() {
		let mut model = NGramModel::new(3).unwrap();
		model.add_sequence(&chars("abab/"));
		assert_eq!(model.counts("ab").unwrap()[&'a'], 1);
		assert_eq!(model.counts("ab").unwrap()[&'/'], 1);
		assert_eq!(model.counts("ba").unwrap()[&'b'], 1);
		assert!(model.counts("bb").is_none());
	}

	#[test]
	fn short_sequences_are_ignored() {
		let mut model = NGramModel::new(4).unwrap();
		model.add_sequence(&chars("ab/"));
		assert!(model.is_empty());
	}

	#[test]
	fn merge_checks_order() {
		let mut left = NGramModel::new(2).unwrap();
		left.add_sequence(&chars("ab/"));
		let mut right = NGramModel::new(2).unwrap();
		right.add_sequence(&chars("ac/"));
		left.merge(&right).unwrap();
		assert_eq!(left.counts("a").unwrap().len(), 2);

		assert!(left.merge(&NGramModel::new(3).unwrap()).is_err());
		assert!(NGramModel::new(0).is_err());
	}
}
