use std::collections::BTreeMap;

use rand::Rng;

/// Picks a key with probability proportional to its weight.
///
/// Draws `r` uniformly in `[1, total]` and returns the first key, in map
/// order, whose cumulative weight reaches `r`. Zero weights are never
/// selected.
///
/// Returns `None` if the map is empty, every weight is zero or the weights
/// do not sum within a `u64`.
pub fn weighted_choice<'a, K, R>(options: &'a BTreeMap<K, u64>, rng: &mut R) -> Option<&'a K>
where
	R: Rng + ?Sized,
{
	let total = options.values().try_fold(0u64, |total, weight| total.checked_add(*weight))?;
	if total == 0 {
		return None;
	}

	let r = rng.random_range(1..=total);
	let mut running = 0;
	for (option, weight) in options {
		running += weight;
		if r <= running {
			return Some(option);
		}
	}

	// Unreachable while the weights sum to `total`.
	None
}
