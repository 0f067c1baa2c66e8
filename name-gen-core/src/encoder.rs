//! Sliding-window training data.
//!
//! Every name is cut into windows of `seq_len` characters. Each window is
//! paired with the position where it ends and the character that follows it
//! (the sentinel once the window reaches the end of the name). The triples are
//! one-hot encoded into dense tensors for an external trainer.

use ndarray::{Array1, Array2, Array3, ArrayViewMut1, ArrayViewMut2};

use crate::corpus::{Alphabet, Corpus};

/// One (window, end position, next character) triple, still as characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
	/// Exactly `seq_len` characters, right-padded with the sentinel.
	pub window: Vec<char>,
	/// Index in the name right after the window (the number of characters consumed).
	pub end_position: usize,
	/// Next character or the sentinel.
	pub target: char,
}

/// One-hot encoded training set, three parallel tensors.
///
/// - `windows`: `(examples, seq_len, alphabet)`
/// - `positions`: `(examples, max_len + 1)`
/// - `targets`: `(examples, alphabet)`
#[derive(Debug, Clone)]
pub struct EncodedDataset {
	pub windows: Array3<f32>,
	pub positions: Array2<f32>,
	pub targets: Array2<f32>,
}

impl EncodedDataset {
	pub fn len(&self) -> usize {
		self.targets.nrows()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Builds the windows for a single name.
///
/// - names shorter than `seq_len` yield one padded window targeting the sentinel
/// - otherwise `len - seq_len + 1` windows, the last one targeting the sentinel
pub fn name_examples(name: &str, seq_len: usize, sentinel: char) -> Vec<TrainingExample> {
	let chars: Vec<char> = name.chars().collect();

	if chars.len() < seq_len {
		let mut window = chars.clone();
		window.resize(seq_len, sentinel);
		return vec![TrainingExample { window, end_position: chars.len(), target: sentinel }];
	}

	(0..=chars.len() - seq_len)
		.map(|start| {
			let end = start + seq_len;
			TrainingExample {
				window: chars[start..end].to_vec(),
				end_position: end,
				target: chars.get(end).copied().unwrap_or(sentinel),
			}
		})
		.collect()
}

/// Builds the windows of every name in the corpus, in corpus order.
pub fn corpus_examples(corpus: &Corpus, seq_len: usize) -> Vec<TrainingExample> {
	let sentinel = corpus.alphabet().sentinel();
	corpus
		.names()
		.iter()
		.flat_map(|name| name_examples(name, seq_len, sentinel))
		.collect()
}

/// Writes the one-hot encoding of `window` into a `(seq_len, alphabet)` view.
///
/// Characters outside the alphabet leave their row zeroed.
fn fill_window(mut out: ArrayViewMut2<f32>, window: &[char], alphabet: &Alphabet) {
	for (row, c) in window.iter().enumerate() {
		if let Some(index) = alphabet.index_of(*c) {
			out[[row, index]] = 1.0;
		}
	}
}

fn fill_position(mut out: ArrayViewMut1<f32>, position: usize) {
	let last = out.len().saturating_sub(1);
	if !out.is_empty() {
		out[position.min(last)] = 1.0;
	}
}

/// One-hot encodes a window as a `(window.len(), alphabet.len())` matrix.
pub fn encode_window(window: &[char], alphabet: &Alphabet) -> Array2<f32> {
	let mut encoded = Array2::zeros((window.len(), alphabet.len()));
	fill_window(encoded.view_mut(), window, alphabet);
	encoded
}

/// One-hot encodes a position over `0..=max_len`. Larger positions clamp to `max_len`.
pub fn encode_position(position: usize, max_len: usize) -> Array1<f32> {
	let mut encoded = Array1::zeros(max_len + 1);
	fill_position(encoded.view_mut(), position);
	encoded
}

/// One-hot encodes a whole list of examples.
pub fn encode(examples: &[TrainingExample], seq_len: usize, alphabet: &Alphabet, max_len: usize) -> EncodedDataset {
	let n = examples.len();
	let mut windows = Array3::zeros((n, seq_len, alphabet.len()));
	let mut positions = Array2::zeros((n, max_len + 1));
	let mut targets = Array2::zeros((n, alphabet.len()));

	for (i, example) in examples.iter().enumerate() {
		fill_window(windows.index_axis_mut(ndarray::Axis(0), i), &example.window, alphabet);
		fill_position(positions.row_mut(i), example.end_position);
		if let Some(index) = alphabet.index_of(example.target) {
			targets[[i, index]] = 1.0;
		}
	}

	EncodedDataset { windows, positions, targets }
}

/// Convenience: windows of the whole corpus, encoded against its alphabet and `max_len`.
pub fn encode_corpus(corpus: &Corpus, seq_len: usize) -> EncodedDataset {
	let examples = corpus_examples(corpus, seq_len);
	encode(&examples, seq_len, corpus.alphabet(), corpus.max_len())
}
