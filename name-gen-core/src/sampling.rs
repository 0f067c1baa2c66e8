//! Temperature sampling over a probability vector.

use rand::Rng;

use crate::error::{GenError, Result};

/// Floor applied to every probability before taking its logarithm.
pub const PROBABILITY_EPSILON: f64 = 1e-12;

/// Checks that a temperature lies in `[0, 1]`.
pub fn check_temperature(temperature: f32) -> Result<()> {
	if !(0.0..=1.0).contains(&temperature) {
		return Err(GenError::InvalidTemperature(temperature));
	}
	Ok(())
}

/// Index of the largest entry, first one on ties.
///
/// NaN entries never win.
pub fn argmax(probs: &[f32]) -> Option<usize> {
	let mut best: Option<(usize, f32)> = None;
	for (index, &p) in probs.iter().enumerate() {
		match best {
			Some((_, value)) if !(p > value) => {}
			_ if p.is_nan() => {}
			_ => best = Some((index, p)),
		}
	}
	best.map(|(index, _)| index)
}

/// Rescales `probs` by `temperature` and returns the renormalized distribution.
///
/// Each entry is clamped to [`PROBABILITY_EPSILON`] before `ln`, so zero (or
/// negative) entries never produce `-inf`/NaN.
pub fn apply_temperature(probs: &[f32], temperature: f32) -> Vec<f64> {
	let temperature = temperature as f64;
	let logits: Vec<f64> = probs
		.iter()
		.map(|&p| {
			let p = if p.is_nan() { 0.0 } else { p as f64 };
			p.max(PROBABILITY_EPSILON).ln() / temperature
		})
		.collect();

	// shift by the max so exp never overflows
	let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
	let weights: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
	let sum: f64 = weights.iter().sum();
	weights.into_iter().map(|w| w / sum).collect()
}

/// Draws one index from a categorical distribution.
///
/// Falls back to the last non-zero bucket when rounding leaves the draw
/// past the cumulative sum.
pub fn sample_categorical<R: Rng + ?Sized>(distribution: &[f64], rng: &mut R) -> Option<usize> {
	let total: f64 = distribution.iter().sum();
	if !(total > 0.0) {
		return None;
	}
	let mut r = rng.random::<f64>() * total;
	let mut fallback = None;
	for (index, &weight) in distribution.iter().enumerate() {
		if weight <= 0.0 {
			continue;
		}
		if r < weight {
			return Some(index);
		}
		r -= weight;
		fallback = Some(index);
	}
	fallback
}

/// Draws an index from `probs` after temperature rescaling.
///
/// - `temperature == 0`: argmax, deterministic
/// - `temperature > 0`: `exp(ln(max(p, eps)) / t)`, renormalized, one categorical draw
///
/// `probs` only needs to be roughly normalized.
///
/// # Errors
/// - `GenError::InvalidTemperature` if `temperature` is outside `[0, 1]`
/// - `GenError::InvalidInput` if `probs` is empty
pub fn sample_with_temperature<R: Rng + ?Sized>(probs: &[f32], temperature: f32, rng: &mut R) -> Result<usize> {
	check_temperature(temperature)?;
	if probs.is_empty() {
		return Err(GenError::InvalidInput("Cannot sample from an empty distribution".to_owned()));
	}

	if temperature == 0.0 {
		return argmax(probs).ok_or_else(|| GenError::InvalidInput("Distribution has no comparable entry".to_owned()));
	}

	let distribution = apply_temperature(probs, temperature);
	sample_categorical(&distribution, rng)
		.ok_or_else(|| GenError::InvalidInput("Distribution collapsed after temperature scaling".to_owned()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn zero_temperature_is_deterministic_argmax() {
		let mut rng = StdRng::seed_from_u64(7);
		let probs = [0.1, 0.5, 0.2, 0.2];
		for _ in 0..100 {
			assert_eq!(sample_with_temperature(&probs, 0.0, &mut rng).unwrap(), 1);
		}
	}

	#[test]
	fn argmax_breaks_ties_on_first_occurrence() {
		assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
		assert_eq!(argmax(&[f32::NAN, 0.1]), Some(1));
		assert_eq!(argmax(&[]), None);
	}

	#[test]
	fn one_hot_input_wins_at_any_temperature() {
		let mut rng = StdRng::seed_from_u64(11);
		let probs = [0.0, 0.0, 1.0, 0.0, 0.0];
		for &temperature in &[0.05, 0.3, 0.7, 1.0] {
			let hits = (0..2_000)
				.filter(|_| sample_with_temperature(&probs, temperature, &mut rng).unwrap() == 2)
				.count();
			assert_eq!(hits, 2_000, "temperature {temperature}");
		}
	}

	#[test]
	fn zero_entries_do_not_poison_the_distribution() {
		let distribution = apply_temperature(&[0.0, 0.25, 0.75, 0.0], 0.5);
		assert!(distribution.iter().all(|p| p.is_finite()));
		assert_abs_diff_eq!(distribution.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
		// t = 0.5 squares then renormalizes: 0.0625 / 0.625 and 0.5625 / 0.625
		assert_abs_diff_eq!(distribution[1], 0.1, epsilon = 1e-9);
		assert_abs_diff_eq!(distribution[2], 0.9, epsilon = 1e-9);
	}

	#[test]
	fn temperature_one_keeps_the_distribution() {
		let distribution = apply_temperature(&[0.2, 0.3, 0.5], 1.0);
		assert_abs_diff_eq!(distribution[0], 0.2, epsilon = 1e-6);
		assert_abs_diff_eq!(distribution[1], 0.3, epsilon = 1e-6);
		assert_abs_diff_eq!(distribution[2], 0.5, epsilon = 1e-6);
	}

	#[test]
	fn unnormalized_input_is_accepted() {
		let distribution = apply_temperature(&[2.0, 2.0], 1.0);
		assert_abs_diff_eq!(distribution[0], 0.5, epsilon = 1e-9);
	}

	#[test]
	fn empirical_frequencies_follow_the_distribution() {
		let mut rng = StdRng::seed_from_u64(3);
		let probs = [0.25, 0.75];
		let draws = 10_000;
		let ones = (0..draws)
			.filter(|_| sample_with_temperature(&probs, 1.0, &mut rng).unwrap() == 1)
			.count();
		assert_abs_diff_eq!(ones as f64 / draws as f64, 0.75, epsilon = 0.03);
	}

	#[test]
	fn rejects_bad_arguments() {
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(
			sample_with_temperature(&[1.0], 1.5, &mut rng),
			Err(GenError::InvalidTemperature(_))
		));
		assert!(matches!(
			sample_with_temperature(&[1.0], -0.1, &mut rng),
			Err(GenError::InvalidTemperature(_))
		));
		assert!(matches!(
			sample_with_temperature(&[1.0], f32::NAN, &mut rng),
			Err(GenError::InvalidTemperature(_))
		));
		assert!(matches!(sample_with_temperature(&[], 0.5, &mut rng), Err(GenError::InvalidInput(_))));
	}
}
