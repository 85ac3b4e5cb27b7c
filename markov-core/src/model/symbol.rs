use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MarkovError, Result};

/// Dense identifier of an interned symbol.
///
/// State ids are handed out in order of first appearance and always form
/// the contiguous range `0..num_states`.
pub type StateId = usize;

/// A discrete token of a path.
///
/// Only text and integer symbols exist. Values arriving through a dynamically
/// typed boundary (JSON) are checked with `Symbol::try_from`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
	Text(String),
	Integer(i64),
}

impl fmt::Display for Symbol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Symbol::Text(text) => f.write_str(text),
			Symbol::Integer(value) => write!(f, "{value}"),
		}
	}
}

impl From<&str> for Symbol {
	fn from(text: &str) -> Self {
		Symbol::Text(text.to_owned())
	}
}

impl From<String> for Symbol {
	fn from(text: String) -> Self {
		Symbol::Text(text)
	}
}

impl From<&String> for Symbol {
	fn from(text: &String) -> Self {
		Symbol::Text(text.clone())
	}
}

impl From<i64> for Symbol {
	fn from(value: i64) -> Self {
		Symbol::Integer(value)
	}
}

impl TryFrom<&Value> for Symbol {
	type Error = MarkovError;

	/// Accepts JSON strings and integral numbers, everything else is rejected.
	fn try_from(value: &Value) -> Result<Self> {
		match value {
			Value::String(text) => Ok(Symbol::Text(text.clone())),
			Value::Number(number) => number
				.as_i64()
				.map(Symbol::Integer)
				.ok_or_else(|| MarkovError::InvalidSymbolType(format!("number {number}"))),
			Value::Null => Err(MarkovError::InvalidSymbolType("null".to_owned())),
			Value::Bool(_) => Err(MarkovError::InvalidSymbolType("bool".to_owned())),
			Value::Array(_) => Err(MarkovError::InvalidSymbolType("array".to_owned())),
			Value::Object(_) => Err(MarkovError::InvalidSymbolType("object".to_owned())),
		}
	}
}

/// Bidirectional mapping between symbols and their state ids.
///
/// ## Invariants
/// - `labels[id]` is the symbol of state `id`
/// - `label_to_state` is the exact inverse of `labels`
/// - The table only grows
#[derive(Clone, Debug, Default)]
pub struct LabelTable {
	labels: Vec<Symbol>,
	label_to_state: HashMap<Symbol, StateId>,
}

impl LabelTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the state id of `symbol`, assigning the next id if it is new.
	pub fn intern(&mut self, symbol: Symbol) -> StateId {
		if let Some(&id) = self.label_to_state.get(&symbol) {
			return id;
		}
		let id = self.labels.len();
		self.labels.push(symbol.clone());
		self.label_to_state.insert(symbol, id);
		id
	}

	/// Returns the state id of an already interned symbol.
	pub fn lookup(&self, symbol: &Symbol) -> Option<StateId> {
		self.label_to_state.get(symbol).copied()
	}

	/// Returns the symbol labelling state `id`.
	pub fn label(&self, id: StateId) -> Option<&Symbol> {
		self.labels.get(id)
	}

	pub fn len(&self) -> usize {
		self.labels.len()
	}

	pub fn is_empty(&self) -> bool {
		self.labels.is_empty()
	}

	/// Labels in state id order.
	pub fn as_slice(&self) -> &[Symbol] {
		&self.labels
	}

	pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
		self.labels.iter()
	}

	/// Rebuilds a table from a label list, rejecting duplicated labels.
	pub(crate) fn from_labels(labels: Vec<Symbol>) -> Result<Self> {
		let mut table = Self::new();
		for symbol in labels {
			let expected = table.len();
			if table.intern(symbol.clone()) != expected {
				return Err(MarkovError::CorruptModel(format!("duplicated label `{symbol}`")));
			}
		}
		Ok(table)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn interning_is_idempotent() {
		let mut table = LabelTable::new();
		let first = table.intern("cat".into());
		let second = table.intern("cat".into());
		assert_eq!(first, second);
		assert_eq!(table.len(), 1);
	}

	#[test]
	fn ids_follow_first_appearance() {
		let mut table = LabelTable::new();
		let ids: Vec<StateId> = ["b", "a", "b", "c", "a"]
			.into_iter()
			.map(|s| table.intern(s.into()))
			.collect();
		assert_eq!(ids, vec![0, 1, 0, 2, 1]);
		assert_eq!(table.len(), 3);
		assert_eq!(table.label(2), Some(&Symbol::from("c")));
		assert_eq!(table.lookup(&Symbol::from("a")), Some(1));
		assert_eq!(table.lookup(&Symbol::from("z")), None);
	}

	#[test]
	fn text_and_integer_symbols_are_distinct() {
		let mut table = LabelTable::new();
		let text = table.intern(Symbol::from("1"));
		let integer = table.intern(Symbol::from(1));
		assert_ne!(text, integer);
		assert_eq!(table.len(), 2);
	}

	#[test]
	fn json_values_are_validated() {
		assert_eq!(Symbol::try_from(&json!("word")).unwrap(), Symbol::from("word"));
		assert_eq!(Symbol::try_from(&json!(-4)).unwrap(), Symbol::Integer(-4));

		for invalid in [json!(1.5), json!(null), json!(true), json!([1]), json!({"a": 1})] {
			assert!(matches!(Symbol::try_from(&invalid), Err(MarkovError::InvalidSymbolType(_))));
		}
	}

	#[test]
	fn duplicated_labels_are_rejected() {
		let labels = vec![Symbol::from("a"), Symbol::from("b"), Symbol::from("a")];
		assert!(matches!(LabelTable::from_labels(labels), Err(MarkovError::CorruptModel(_))));
	}
}
