use std::sync::mpsc;
use std::thread;

use log::debug;

/// Chunks per CPU when splitting construction work.
const CHUNK_FACTOR: usize = 8;

/// Splits `names` into chunks and builds one partial value per chunk on its own thread.
///
/// - Chunk count is `num_cpus * 8`, so a worker never holds much more than its share.
/// - Partial values are collected over an MPSC channel, in completion order.
/// - An empty `names` slice yields no partial value.
///
/// Callers merge the partial values; every merge used here is commutative.
pub(crate) fn build_partials<T, F>(names: &[String], build: F) -> Vec<T>
where
	T: Send,
	F: Fn(&[String]) -> T + Sync,
{
	if names.is_empty() {
		return Vec::new();
	}

	let chunks = num_cpus::get() * CHUNK_FACTOR;
	let chunk_size = names.len().div_ceil(chunks).max(1);
	debug!("Building {} names in chunks of {}", names.len(), chunk_size);

	let (tx, rx) = mpsc::channel();
	let build = &build;
	thread::scope(|scope| {
		for chunk in names.chunks(chunk_size) {
			let tx = tx.clone();
			scope.spawn(move || {
				// the receiver outlives the scope, sending cannot fail
				let _ = tx.send(build(chunk));
			});
		}
	});
	drop(tx);

	rx.iter().collect()
}
