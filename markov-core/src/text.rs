//! Turns raw text into sentence paths.
//!
//! The policy is deliberately simple: quote characters are dropped, words are
//! split on whitespace and a sentence ends with a word finishing with `.`,
//! `!` or `?`. Words after the last terminator are discarded.

use crate::error::Result;
use crate::model::MarkovModel;

const QUOTES: [char; 3] = ['“', '”', '"'];
const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Outcome of feeding a text to a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
	/// Sentences added to the model.
	pub added: usize,
	/// Sentences too short for the model order.
	pub skipped: usize,
}

/// Splits `raw` into sentences of words.
pub fn split_sentences(raw: &str) -> Vec<Vec<String>> {
	let cleaned: String = raw.chars().filter(|c| !QUOTES.contains(c)).collect();

	let mut sentences = Vec::new();
	let mut sentence = Vec::new();
	for word in cleaned.split_whitespace() {
		sentence.push(word.to_owned());
		if word.ends_with(TERMINATORS) {
			sentences.push(std::mem::take(&mut sentence));
		}
	}
	sentences
}

/// Splits `raw` into sentences and keeps those longer than `order`.
///
/// Returns the kept sentences and the number of discarded ones.
pub fn trainable_sentences(raw: &str, order: usize) -> (Vec<Vec<String>>, usize) {
	let (kept, skipped): (Vec<_>, Vec<_>) = split_sentences(raw)
		.into_iter()
		.partition(|sentence| sentence.len() > order);
	for sentence in &skipped {
		log::debug!("Skipping sentence shorter than order {order}: {:?}", sentence.join(" "));
	}
	(kept, skipped.len())
}

/// Adds every sentence of `raw` long enough for the model order.
pub fn ingest_text(model: &mut MarkovModel, raw: &str) -> Result<IngestReport> {
	let (sentences, skipped) = trainable_sentences(raw, model.order());
	let added = sentences.len();
	for sentence in sentences {
		model.add_path(sentence)?;
	}
	Ok(IngestReport { added, skipped })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sentences_end_with_terminators() {
		let sentences = split_sentences("The cat sat. Did it?\nYes!  It did");
		assert_eq!(
			sentences,
			vec![
				vec!["The", "cat", "sat."],
				vec!["Did", "it?"],
				vec!["Yes!"],
			]
		);
	}

	#[test]
	fn quotes_are_removed() {
		let sentences = split_sentences("“Hello there,” she said. \"Bye.\"");
		assert_eq!(sentences, vec![vec!["Hello", "there,", "she", "said."], vec!["Bye."]]);
	}

	#[test]
	fn ingestion_skips_short_sentences() {
		let mut model = MarkovModel::new(2).unwrap();
		let report = ingest_text(&mut model, "Go! The dog ran. Stop now. A b c d.").unwrap();
		assert_eq!(report, IngestReport { added: 2, skipped: 2 });
		assert_eq!(model.num_paths(), 2);
	}

	#[test]
	fn empty_text_adds_nothing() {
		let mut model = MarkovModel::new(1).unwrap();
		assert_eq!(ingest_text(&mut model, "  \n ").unwrap(), IngestReport::default());
		assert!(model.is_empty());
	}
}
