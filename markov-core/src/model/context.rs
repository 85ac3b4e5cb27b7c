use serde::{Deserialize, Serialize};

use super::symbol::StateId;

/// A window of `order` consecutive state ids.
///
/// Contexts compare element-wise and are ordered lexicographically, which
/// gives sampling a deterministic iteration order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Context(Vec<StateId>);

impl Context {
	pub fn new(ids: Vec<StateId>) -> Self {
		Self(ids)
	}

	pub fn ids(&self) -> &[StateId] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// The most recent state of the window.
	pub fn last(&self) -> Option<StateId> {
		self.0.last().copied()
	}

	/// Whether `next` is this window shifted by one state.
	pub fn is_followed_by(&self, next: &Context) -> bool {
		self.len() == next.len() && self.0.get(1..) == next.0.get(..next.len().saturating_sub(1))
	}

	/// Translates every state id through `mapping` (`old id -> new id`).
	pub(crate) fn remap(&self, mapping: &[StateId]) -> Self {
		Self(self.0.iter().map(|&id| mapping[id]).collect())
	}
}

impl From<&[StateId]> for Context {
	fn from(ids: &[StateId]) -> Self {
		Self(ids.to_vec())
	}
}
