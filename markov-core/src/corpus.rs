//! Loading models from corpora and model files.

use std::fs;
use std::path::Path;

use crate::error::{MarkovError, Result};
use crate::io::{cache_path, read_text};
use crate::model::{MarkovModel, Symbol};
use crate::{persist, text};

/// Builds a model of the given order from raw text.
///
/// Sentences are ingested in parallel; sentences not longer than the order
/// are skipped.
pub fn build_from_text(raw: &str, order: usize) -> Result<MarkovModel> {
	let (sentences, skipped) = text::trainable_sentences(raw, order);
	let paths: Vec<Vec<Symbol>> = sentences
		.into_iter()
		.map(|sentence| sentence.into_iter().map(Symbol::from).collect())
		.collect();

	let model = MarkovModel::from_paths(order, paths)?;
	log::info!(
		"Built order-{order} model: {} sentences, {} skipped, {} states",
		model.num_paths(),
		skipped,
		model.num_states()
	);
	Ok(model)
}

/// Opens `path` as a model file, or as a text corpus if it is not one.
///
/// A model file keeps its own order; a mismatch with `order` is only logged.
///
/// # Errors
/// A corrupt model file is reported as such and never read as text.
pub fn open_model<P: AsRef<Path>>(path: P, order: usize) -> Result<MarkovModel> {
	let path = path.as_ref();
	let bytes = fs::read(path)?;

	match persist::from_bytes(&bytes) {
		Ok(model) => {
			if model.order() != order {
				log::warn!(
					"{} holds an order-{} model, ignoring requested order {order}",
					path.display(),
					model.order()
				);
			}
			log::info!("Loaded model {} ({} states)", path.display(), model.num_states());
			Ok(model)
		}
		Err(MarkovError::NotAModelFile) => {
			log::debug!("{} is not a model file, reading it as text", path.display());
			let raw = String::from_utf8(bytes)
				.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
			build_from_text(&raw, order)
		}
		Err(e) => Err(e),
	}
}

/// Builds a model from a text corpus, reusing a cached model file if present.
///
/// The cache lives next to the corpus as `<stem>.o<order>.mkv`. An unreadable
/// cache is rebuilt.
pub fn load_cached<P: AsRef<Path>>(corpus_path: P, order: usize) -> Result<MarkovModel> {
	let corpus_path = corpus_path.as_ref();
	let cached = cache_path(corpus_path, order)?;

	if cached.exists() {
		match persist::load(&cached) {
			Ok(model) if model.order() == order => return Ok(model),
			Ok(model) => log::warn!(
				"Cache {} has order {}, rebuilding",
				cached.display(),
				model.order()
			),
			Err(e) => log::warn!("Cache {} unusable ({e}), rebuilding", cached.display()),
		}
	}

	let model = build_from_text(&read_text(corpus_path)?, order)?;
	persist::save(&model, &cached)?;
	Ok(model)
}

#[cfg(test)]
mod tests {
	use super::*;

	const CORPUS: &str = "The cat sat. The dog ran. The cat ran away!";

	#[test]
	fn text_files_are_read_as_corpora() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.txt");
		fs::write(&path, CORPUS).unwrap();

		let model = open_model(&path, 1).unwrap();
		assert_eq!(model.num_paths(), 3);
		assert_eq!(model.order(), 1);
	}

	#[test]
	fn model_files_keep_their_order() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("saved.mkv");
		persist::save(&build_from_text(CORPUS, 2).unwrap(), &path).unwrap();

		let model = open_model(&path, 1).unwrap();
		assert_eq!(model.order(), 2);
	}

	#[test]
	fn corrupt_models_do_not_fall_back_to_text() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("broken.mkv");
		let mut bytes = persist::to_bytes(&build_from_text(CORPUS, 1).unwrap()).unwrap();
		bytes.truncate(bytes.len() - 3);
		fs::write(&path, bytes).unwrap();

		assert!(matches!(open_model(&path, 1), Err(MarkovError::CorruptModel(_))));
	}

	#[test]
	fn cache_is_written_and_reused() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.txt");
		fs::write(&path, CORPUS).unwrap();

		let built = load_cached(&path, 1).unwrap();
		let cached = dir.path().join("corpus.o1.mkv");
		assert!(cached.exists());

		// the cache wins over the corpus once written
		fs::write(&path, "Something else entirely.").unwrap();
		let reloaded = load_cached(&path, 1).unwrap();
		assert_eq!(reloaded.labels(), built.labels());

		let other_order = load_cached(&path, 2).unwrap();
		assert_eq!(other_order.num_paths(), 1);
	}
}
