use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};
use crate::io::read_file;

/// Default window length used for training windows and seed sequences.
pub const DEFAULT_SEQ_LEN: usize = 4;

/// Default end-of-name marker.
pub const DEFAULT_SENTINEL: char = '/';

/// Characters that disqualify a whole name from the corpus.
const DEFAULT_DISALLOWED: &[char] = &[' ', '\'', '-', '.', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Corpus-side settings.
///
/// Shared by the preprocessor, the encoder, the seed sampler and the n-gram
/// predictor so that all of them agree on the window length and sentinel.
///
/// # Invariants
/// - `seq_len >= 1`
/// - `sentinel` is not whitespace and is never part of a kept name
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CorpusConfig {
	seq_len: usize,
	sentinel: char,
	disallowed: Vec<char>,
}

impl Default for CorpusConfig {
	fn default() -> Self {
		Self {
			seq_len: DEFAULT_SEQ_LEN,
			sentinel: DEFAULT_SENTINEL,
			disallowed: DEFAULT_DISALLOWED.to_vec(),
		}
	}
}

impl CorpusConfig {
	/// Creates a configuration with the default disallowed set.
	///
	/// # Errors
	/// Returns `GenError::Configuration` if `seq_len` is 0 or the sentinel is whitespace.
	pub fn new(seq_len: usize, sentinel: char) -> Result<Self> {
		let mut config = Self::default();
		config.set_seq_len(seq_len)?;
		config.set_sentinel(sentinel)?;
		Ok(config)
	}

	/// Window length.
	pub fn seq_len(&self) -> usize {
		self.seq_len
	}

	/// End-of-name marker.
	pub fn sentinel(&self) -> char {
		self.sentinel
	}

	/// Characters that disqualify a name.
	pub fn disallowed(&self) -> &[char] {
		&self.disallowed
	}

	/// Sets the window length.
	///
	/// # Errors
	/// Returns an error if `seq_len` is 0.
	pub fn set_seq_len(&mut self, seq_len: usize) -> Result<()> {
		if seq_len == 0 {
			return Err(GenError::Configuration("seq_len must be >= 1".to_owned()));
		}
		self.seq_len = seq_len;
		Ok(())
	}

	/// Sets the sentinel character.
	///
	/// # Errors
	/// Returns an error if the sentinel is whitespace (whitespace disqualifies a name).
	pub fn set_sentinel(&mut self, sentinel: char) -> Result<()> {
		if sentinel.is_whitespace() {
			return Err(GenError::Configuration("Sentinel cannot be whitespace".to_owned()));
		}
		self.sentinel = sentinel;
		Ok(())
	}

	/// Replaces the disallowed character set.
	pub fn set_disallowed(&mut self, disallowed: Vec<char>) {
		self.disallowed = disallowed;
	}

	/// Normalizes a raw name: lowercases it, then rejects it if it is empty or
	/// contains whitespace, a disallowed character or the sentinel.
	pub fn normalize(&self, raw: &str) -> Option<String> {
		let name: String = raw.chars().flat_map(char::to_lowercase).collect();
		if name.is_empty() {
			return None;
		}
		if name.chars().any(|c| c == self.sentinel || c.is_whitespace() || self.disallowed.contains(&c)) {
			return None;
		}
		Some(name)
	}
}

/// Ordered character set with a trailing sentinel.
///
/// Characters are sorted by code point and map to their position; the
/// sentinel always takes the last index.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
	/// Sorted characters, sentinel last.
	chars: Vec<char>,
}

impl Alphabet {
	/// Builds an alphabet from arbitrary characters plus a sentinel.
	///
	/// Duplicates are removed and the characters sorted.
	///
	/// # Errors
	/// Returns `GenError::Configuration` if the sentinel is among `chars`.
	pub fn new<I: IntoIterator<Item = char>>(chars: I, sentinel: char) -> Result<Self> {
		let set: BTreeSet<char> = chars.into_iter().collect();
		if set.contains(&sentinel) {
			return Err(GenError::Configuration(format!(
				"Sentinel '{sentinel}' cannot be part of the alphabet"
			)));
		}
		let mut chars: Vec<char> = set.into_iter().collect();
		chars.push(sentinel);
		Ok(Self { chars })
	}

	/// Number of symbols, sentinel included.
	pub fn len(&self) -> usize {
		self.chars.len()
	}

	/// True only for a malformed alphabet: construction always appends the sentinel.
	pub fn is_empty(&self) -> bool {
		self.chars.is_empty()
	}

	pub fn sentinel(&self) -> char {
		self.chars[self.sentinel_index()]
	}

	pub fn sentinel_index(&self) -> usize {
		self.chars.len() - 1
	}

	/// Index of a character, `None` if it is not part of the alphabet.
	pub fn index_of(&self, c: char) -> Option<usize> {
		let sentinel_index = self.sentinel_index();
		if c == self.chars[sentinel_index] {
			return Some(sentinel_index);
		}
		self.chars[..sentinel_index].binary_search(&c).ok()
	}

	/// Character at `index`, `None` if out of bounds.
	pub fn char_at(&self, index: usize) -> Option<char> {
		self.chars.get(index).copied()
	}

	/// All symbols in index order, sentinel last.
	pub fn chars(&self) -> &[char] {
		&self.chars
	}

	pub fn contains(&self, c: char) -> bool {
		self.index_of(c).is_some()
	}
}

/// Filtered, normalized list of training names.
///
/// # Invariants
/// - `names` is non-empty; repeated names are kept so counts reflect every occurrence
/// - every character of every name belongs to `alphabet`, none is the sentinel
/// - `min_len <= max_len`, both counted in characters
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Corpus {
	names: Vec<String>,
	lookup: HashSet<String>,
	alphabet: Alphabet,
	min_len: usize,
	max_len: usize,
}

impl Corpus {
	/// Preprocesses raw names.
	///
	/// Names are lowercased; names containing whitespace, a disallowed
	/// character or the sentinel are dropped, as are empty lines. Repeated
	/// names are kept.
	///
	/// # Errors
	/// Returns `GenError::Configuration` if no name survives filtering.
	pub fn from_names<I, S>(raw_names: I, config: &CorpusConfig) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut names = Vec::new();
		let mut lookup = HashSet::new();
		let mut rejected = 0usize;

		for raw in raw_names {
			match config.normalize(raw.as_ref()) {
				Some(name) => {
					lookup.insert(name.clone());
					names.push(name);
				}
				None => rejected += 1,
			}
		}

		if names.is_empty() {
			return Err(GenError::Configuration("No name survived corpus filtering".to_owned()));
		}

		let alphabet = Alphabet::new(names.iter().flat_map(|name| name.chars()), config.sentinel())?;
		let lengths = names.iter().map(|name| name.chars().count());
		let min_len = lengths.clone().min().unwrap_or(0);
		let max_len = lengths.max().unwrap_or(0);

		debug!(
			"Corpus: {} names kept, {} rejected, {} symbols, lengths {}..={}",
			names.len(),
			rejected,
			alphabet.len(),
			min_len,
			max_len
		);

		Ok(Self { names, lookup, alphabet, min_len, max_len })
	}

	/// Reads a corpus file (one name per line) and preprocesses it.
	pub fn from_file<P: AsRef<Path>>(filepath: P, config: &CorpusConfig) -> Result<Self> {
		let lines = read_file(filepath)?;
		Self::from_names(lines, config)
	}

	pub fn names(&self) -> &[String] {
		&self.names
	}

	pub fn alphabet(&self) -> &Alphabet {
		&self.alphabet
	}

	pub fn min_len(&self) -> usize {
		self.min_len
	}

	pub fn max_len(&self) -> usize {
		self.max_len
	}

	/// Case-insensitive membership test.
	pub fn contains(&self, name: &str) -> bool {
		let key: String = name.chars().flat_map(char::to_lowercase).collect();
		self.lookup.contains(&key)
	}
}
