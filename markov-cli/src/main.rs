use std::path::PathBuf;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use markov_core::model::{MarkovModel, Symbol, checked_order};
use markov_core::{corpus, io, persist};

/// Builds a Markov chain from a text corpus (or loads a saved model)
/// and prints randomly generated sentences.
#[derive(Parser, Debug)]
#[command(name = "markov-cli", version)]
struct Args {
	/// Text corpus or model file.
	input: PathBuf,

	/// Order of the chain (ignored when INPUT is a model file).
	#[arg(allow_negative_numbers = true)]
	order: i64,

	/// Number of sentences to generate.
	#[arg(short, long, default_value_t = 1)]
	count: usize,

	/// Maximum number of words per sentence.
	#[arg(short, long)]
	max_len: Option<usize>,

	/// Seed for reproducible output.
	#[arg(short, long)]
	seed: Option<u64>,

	/// Write the model to this file.
	#[arg(long)]
	save: Option<PathBuf>,

	/// Reuse (or create) a cached model next to the corpus.
	#[arg(long)]
	cache: bool,
}

fn join(path: &[Symbol]) -> String {
	path.iter().map(Symbol::to_string).collect::<Vec<_>>().join(" ")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();
	let args = Args::parse();

	let order = checked_order(args.order)?;
	let name = io::get_filename(&args.input)?;
	let model: MarkovModel = if args.cache {
		corpus::load_cached(&args.input, order)?
	} else {
		corpus::open_model(&args.input, order)?
	};
	log::info!(
		"Model '{name}' ready: order {}, {} states, {} paths",
		model.order(),
		model.num_states(),
		model.num_paths()
	);

	if let Some(save) = &args.save {
		persist::save(&model, save)?;
		log::info!("Model written to {}", save.display());
	}

	let mut rng = match args.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_rng(&mut rand::rng()),
	};
	for _ in 0..args.count {
		println!("{}", join(&model.generate_path_with(args.max_len, &mut rng)?));
	}

	Ok(())
}
