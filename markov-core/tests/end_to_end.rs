use markov_core::model::{Context, MarkovModel, Symbol};
use markov_core::{MarkovError, corpus, persist, text};
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Random source whose every draw is the lowest possible value.
struct LowestDraw;

impl RngCore for LowestDraw {
	fn next_u32(&mut self) -> u32 {
		0
	}

	fn next_u64(&mut self) -> u64 {
		0
	}

	fn fill_bytes(&mut self, dst: &mut [u8]) {
		dst.fill(0);
	}
}

fn words(sentence: &str) -> Vec<Symbol> {
	sentence.split(' ').map(Symbol::from).collect()
}

fn two_sentences() -> MarkovModel {
	let mut model = MarkovModel::new(1).unwrap();
	model.add_path(words("the cat sat .")).unwrap();
	model.add_path(words("the dog ran .")).unwrap();
	model
}

#[test]
fn two_sentence_chain() {
	let model = two_sentences();

	assert_eq!(model.order(), 1);
	assert_eq!(model.num_states(), 6);

	let the = model.context_of(["the"]).unwrap();
	let cat = model.context_of(["cat"]).unwrap();
	let dog = model.context_of(["dog"]).unwrap();
	assert_eq!(model.initial_counts().collect::<Vec<_>>(), vec![(&the, 2)]);

	let from_the = model.transitions_from(&the).unwrap();
	assert_eq!(from_the.iter().collect::<Vec<_>>(), vec![(&cat, 1), (&dog, 1)]);
}

#[test]
fn lowest_draws_replay_the_first_sentence() {
	let model = two_sentences();
	let path = model.generate_path_with(None, &mut LowestDraw).unwrap();
	assert_eq!(path, words("the cat sat ."));
}

#[test]
fn generated_sentences_use_known_transitions() {
	let model = two_sentences();
	let mut rng = StdRng::seed_from_u64(2024);
	let sentences = [words("the cat sat ."), words("the dog ran ."), words("the cat ran ."), words("the dog sat .")];

	for _ in 0..100 {
		let path = model.generate_path_with(None, &mut rng).unwrap();
		assert!(sentences.contains(&path), "unexpected path {path:?}");
	}
}

#[test]
fn invalid_inputs_are_named_errors() {
	assert!(matches!(MarkovModel::new(0), Err(MarkovError::InvalidOrder(_))));
	assert!(matches!(markov_core::model::checked_order(-1), Err(MarkovError::InvalidOrder(-1))));

	let mut model = MarkovModel::new(1).unwrap();
	assert!(matches!(model.add_path(["only"]), Err(MarkovError::InvalidPathLength { .. })));
	assert!(matches!(model.generate_path(Some(10)), Err(MarkovError::EmptyModelGeneration)));
}

#[test]
fn text_to_file_and_back() {
	let raw = "“The cat sat.” The dog ran. The cat ran. Trailing words";
	let mut model = MarkovModel::new(1).unwrap();
	let report = text::ingest_text(&mut model, raw).unwrap();
	assert_eq!(report.added, 3);

	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("cats.mkv");
	persist::save(&model, &path).unwrap();
	let restored = corpus::open_model(&path, 1).unwrap();

	let seed = Context::new(vec![0]);
	assert_eq!(restored.initial_count(&seed), 3);
	assert_eq!(
		restored.generate_path_with(None, &mut LowestDraw).unwrap(),
		words("The cat sat.")
	);
}
