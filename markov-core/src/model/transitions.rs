use std::collections::BTreeMap;

use rand::Rng;

use super::choice::weighted_choice;
use super::context::Context;

/// Outgoing edges of one context in the chain.
///
/// Conceptually this is a node of the Markov chain: each entry is a
/// successor context weighted by how many times the transition was observed.
///
/// ## Invariants
/// - Each count is strictly positive
/// - `total` is the sum of all counts and fits in a `u64`
/// - A `Transitions` stored in a model is never empty
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transitions {
	/// Example: { (cat) => 42, (dog) => 3 }
	counts: BTreeMap<Context, u64>,
	total: u64,
}

impl Transitions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `count` more occurrences of the transition toward `next`.
	///
	/// Callers check that `total() + count` fits in a `u64`.
	pub(crate) fn add(&mut self, next: Context, count: u64) {
		debug_assert!(count > 0, "transition counts are strictly positive");
		*self.counts.entry(next).or_insert(0) += count;
		self.total += count;
	}

	/// Samples a successor proportionally to the observed counts.
	///
	/// Returns `None` if there are no transitions.
	pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Context> {
		weighted_choice(&self.counts, rng)
	}

	/// Number of times `next` followed this context.
	pub fn count(&self, next: &Context) -> u64 {
		self.counts.get(next).copied().unwrap_or(0)
	}

	/// Sum of all outgoing counts.
	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Context, u64)> {
		self.counts.iter().map(|(context, count)| (context, *count))
	}
}
