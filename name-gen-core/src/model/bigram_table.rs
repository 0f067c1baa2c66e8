use std::collections::BTreeMap;

use log::{debug, warn};
use rand::Rng;
use rand::prelude::IteratorRandom;
use serde::{Deserialize, Serialize};

use super::partial::build_partials;
use super::state::State;
use crate::error::{GenError, Result};

/// Default number of fresh draws before `sample_seed` gives up.
pub const DEFAULT_SEED_RETRIES: usize = 100;

/// Positional bigram table used to synthesize plausible seed sequences.
///
/// Position 0 counts which character starts a name. Every later position
/// `i` in `1..seq_len` maps the character at `i - 1` to the counts of the
/// character at `i`.
///
/// # Responsibilities
/// - Count first characters and positional transitions over names of length >= `seq_len`
/// - Draw a seed of exactly `seq_len` characters
/// - Merge with another table of the same window length
///
/// # Invariants
/// - `seq_len >= 1`
/// - `transitions.len() == seq_len - 1`
/// - Each state in `transitions[i]` is keyed by the map key it is stored under
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BigramTable {
	/// Length of the seeds drawn from this table.
	seq_len: usize,

	/// First-character counts.
	first: State,

	/// `transitions[i - 1]` holds the states for position `i`.
	transitions: Vec<BTreeMap<char, State>>,
}

impl BigramTable {
	/// Creates an empty table producing seeds of `seq_len` characters.
	///
	/// # Errors
	/// Returns an error if `seq_len < 1`.
	pub fn new(seq_len: usize) -> Result<Self> {
		if seq_len < 1 {
			return Err(GenError::Configuration("seq_len must be >= 1".to_owned()));
		}
		Ok(Self {
			seq_len,
			first: State::new(None),
			transitions: vec![BTreeMap::new(); seq_len - 1],
		})
	}

	/// Builds a table from every name of length >= `seq_len`.
	///
	/// Work is split across threads, then partial tables are merged.
	///
	/// # Errors
	/// Returns `GenError::Configuration` if no name is long enough.
	pub fn from_names(names: &[String], seq_len: usize) -> Result<Self> {
		let mut table = Self::new(seq_len)?;

		let partials = build_partials(names, |chunk| {
			let mut partial = Self::new(seq_len)?;
			for name in chunk {
				partial.add_name(name);
			}
			Ok::<_, GenError>(partial)
		});
		for partial in partials {
			table.merge(&partial?)?;
		}

		if table.is_empty() {
			return Err(GenError::Configuration(format!(
				"Every name is shorter than the window length {seq_len}"
			)));
		}

		debug!(
			"Bigram table: {} starting names, {} first characters",
			table.first.total(),
			table.first.weights().len()
		);
		Ok(table)
	}

	pub fn seq_len(&self) -> usize {
		self.seq_len
	}

	/// True when no name has been counted.
	pub fn is_empty(&self) -> bool {
		self.first.total() == 0
	}

	/// Counts the first `seq_len` characters of a name.
	///
	/// Names shorter than `seq_len` are ignored.
	pub fn add_name(&mut self, name: &str) {
		let chars: Vec<char> = name.chars().take(self.seq_len).collect();
		if chars.len() < self.seq_len {
			return;
		}

		self.first.add_transition(chars[0]);
		for position in 1..self.seq_len {
			let previous = chars[position - 1];
			self.transitions[position - 1]
				.entry(previous)
				.or_insert_with(|| State::new(Some(previous)))
				.add_transition(chars[position]);
		}
	}

	/// Adds a hand-made state for `position`, merging with what is already there.
	///
	/// Position 0 takes a state keyed by `None`; later positions take a state
	/// keyed by the previous character.
	///
	/// # Errors
	/// Returns an error if the position is out of range or the key does not fit it.
	pub fn insert_state(&mut self, position: usize, state: State) -> Result<()> {
		if position >= self.seq_len {
			return Err(GenError::InvalidInput(format!(
				"Position {position} out of range for window length {}",
				self.seq_len
			)));
		}
		match (position, state.key()) {
			(0, None) => self.first.merge(&state),
			(0, Some(_)) => Err(GenError::InvalidInput("Position 0 state cannot have a key".to_owned())),
			(_, None) => Err(GenError::InvalidInput(format!("Position {position} state needs a key"))),
			(_, Some(key)) => self.transitions[position - 1]
				.entry(key)
				.or_insert_with(|| State::new(Some(key)))
				.merge(&state),
		}
	}

	/// Normalized first-character weights, in character order.
	pub fn first_weights(&self) -> Vec<(char, f64)> {
		self.first.weights()
	}

	/// State for `previous` at `position` (>= 1), if observed.
	pub fn state(&self, position: usize, previous: char) -> Option<&State> {
		self.transitions.get(position.checked_sub(1)?)?.get(&previous)
	}

	/// Performs a single seed draw.
	///
	/// - Position 0: weighted choice over first-character counts.
	/// - Positions 1..seq_len: weighted choice in the row of the previous
	///   character. A previous character never seen at that position is
	///   replaced by a uniformly chosen key of that position.
	///
	/// # Errors
	/// - `GenError::TransientSampling` when one of the weighted draws misses
	/// - `GenError::Configuration` when the table is empty
	pub fn draw_seed<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String> {
		let mut seed = String::with_capacity(self.seq_len);
		let mut previous = self.first.predict(0, rng)?;
		seed.push(previous);

		for position in 1..self.seq_len {
			let states = &self.transitions[position - 1];
			let state = match states.get(&previous) {
				Some(state) => state,
				None => states.values().choose(rng).ok_or_else(|| {
					GenError::Configuration(format!("No transition observed at position {position}"))
				})?,
			};
			previous = state.predict(position, rng)?;
			seed.push(previous);
		}

		Ok(seed)
	}

	/// Draws a seed of exactly `seq_len` characters, retrying transient failures.
	///
	/// At most `retries` draws are made (at least one). Only
	/// `GenError::TransientSampling` is retried; other errors are returned as is.
	///
	/// # Errors
	/// Returns `GenError::Configuration` once every draw has failed.
	pub fn sample_seed<R: Rng + ?Sized>(&self, retries: usize, rng: &mut R) -> Result<String> {
		let attempts = retries.max(1);
		for attempt in 1..=attempts {
			match self.draw_seed(rng) {
				Ok(seed) if seed.chars().count() == self.seq_len => return Ok(seed),
				Ok(seed) => debug!("Seed draw {attempt} returned '{seed}' of the wrong length, retrying"),
				Err(GenError::TransientSampling { position }) => {
					debug!("Seed draw {attempt} missed at position {position}, retrying")
				}
				Err(e) => return Err(e),
			}
		}

		warn!("No seed of length {} after {} draws", self.seq_len, attempts);
		Err(GenError::Configuration(format!(
			"Could not draw a seed of length {} in {} attempts",
			self.seq_len, attempts
		)))
	}

	/// Merges another table into this one.
	///
	/// # Notes
	/// - Both tables must have the same window length.
	/// - Occurrence counts for matching states are summed.
	///
	/// # Errors
	/// Returns an error if the window lengths do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.seq_len != other.seq_len {
			return Err(GenError::Merge(format!(
				"Window length mismatch: {} vs {}",
				self.seq_len, other.seq_len
			)));
		}

		self.first.merge(&other.first)?;
		for (mine, theirs) in self.transitions.iter_mut().zip(&other.transitions) {
			for (key, state) in theirs {
				if let Some(existing) = mine.get_mut(key) {
					existing.merge(state)?;
				} else {
					mine.insert(*key, state.clone());
				}
			}
		}

		Ok(())
	}
}
