use std::path::{Path, PathBuf};
use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, post, put, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use markov_core::io::{list_names, normalize_folder, CORPUS_EXTENSION};
use markov_core::model::{MarkovModel, Symbol};
use markov_core::{corpus, text, MarkovError};

/// Server configuration, from the command line or `MARKOV_*` variables.
#[derive(Parser, Debug, Clone)]
#[command(name = "markov-server", version)]
struct Config {
	#[arg(long, env = "MARKOV_HOST", default_value = "127.0.0.1")]
	host: String,

	#[arg(long, env = "MARKOV_PORT", default_value_t = 5000)]
	port: u16,

	/// Directory holding `*.txt` corpora.
	#[arg(long, env = "MARKOV_DATA_DIR", default_value = "./data")]
	data_dir: String,

	/// Default chain order.
	#[arg(long, env = "MARKOV_ORDER", default_value_t = 2)]
	order: usize,

	/// Upper bound on generated path lengths; requests may only lower it.
	#[arg(long, env = "MARKOV_MAX_LEN", default_value_t = 100)]
	max_len: usize,

	/// Comma separated corpora to load at startup.
	#[arg(long, env = "MARKOV_PRELOAD", value_delimiter = ',')]
	preload: Vec<String>,
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	max_len: Option<usize>,
	seed: Option<u64>,
}

#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>,
	order: Option<usize>,
}

#[derive(Deserialize)]
struct PathBody {
	path: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct Summary<'a> {
	order: usize,
	num_states: usize,
	num_paths: u64,
	num_contexts: usize,
	models: &'a [String],
}

#[derive(Serialize)]
struct IngestSummary {
	added: usize,
	skipped: usize,
}

/// The model served to every worker, guarded by one `RwLock`.
struct SharedData {
	model: MarkovModel,
	model_names: Vec<String>,
	data_dir: PathBuf,
	max_len: usize,
}

impl SharedData {
	fn new(data_dir: PathBuf, order: usize, max_len: usize) -> Result<Self, MarkovError> {
		Ok(Self { model: MarkovModel::new(order)?, model_names: Vec::new(), data_dir, max_len })
	}

	/// Replaces the model by the merge of the named corpora.
	///
	/// The current model is kept if any corpus fails to load.
	fn load_models(&mut self, names: &[&str], order: usize) -> Result<(), MarkovError> {
		let mut model = MarkovModel::new(order)?;
		for name in names {
			let path = corpus_path(&self.data_dir, name).ok_or_else(|| {
				std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("Invalid model name '{name}'"))
			})?;
			model.merge(&corpus::load_cached(path, order)?)?;
		}
		self.model = model;
		self.model_names = names.iter().map(|name| (*name).to_owned()).collect();
		log::info!("Loaded models {:?} (order {order})", self.model_names);
		Ok(())
	}
}

/// Resolves a corpus name inside the data directory, refusing anything
/// that could escape it.
fn corpus_path(data_dir: &Path, name: &str) -> Option<PathBuf> {
	if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
		return None;
	}
	Some(data_dir.join(format!("{name}.{CORPUS_EXTENSION}")))
}

/// Maps a library error to the matching HTTP status.
fn error_response(error: &MarkovError) -> HttpResponse {
	match error {
		MarkovError::InvalidOrder(_)
		| MarkovError::InvalidSymbolType(_)
		| MarkovError::InvalidPathLength { .. }
		| MarkovError::OrderMismatch { .. } => HttpResponse::BadRequest().body(error.to_string()),
		MarkovError::EmptyModelGeneration | MarkovError::CountOverflow => {
			HttpResponse::Conflict().body(error.to_string())
		}
		MarkovError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
			HttpResponse::NotFound().body(error.to_string())
		}
		MarkovError::Io(e) if e.kind() == std::io::ErrorKind::InvalidInput => {
			HttpResponse::BadRequest().body(error.to_string())
		}
		_ => HttpResponse::InternalServerError().body(error.to_string()),
	}
}

fn join(path: &[Symbol]) -> String {
	path.iter().map(Symbol::to_string).collect::<Vec<_>>().join(" ")
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates one path from the shared model; words are joined by spaces.
/// `seed` makes the output reproducible. `max_len` is capped by the server
/// limit, since a cyclic chain would otherwise never stop.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<RwLock<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let max_len = Some(query.max_len.map_or(shared_data.max_len, |max_len| max_len.min(shared_data.max_len)));
	let generated = match query.seed {
		Some(seed) => shared_data.model.generate_path_with(max_len, &mut StdRng::seed_from_u64(seed)),
		None => shared_data.model.generate_path(max_len),
	};

	match generated {
		Ok(path) => HttpResponse::Ok().body(join(&path)),
		Err(e) => error_response(&e),
	}
}

#[get("/v1/models")]
async fn get_models(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let data_dir = match data.read() {
		Ok(m) => m.data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match list_names(&data_dir, CORPUS_EXTENSION) {
		Ok(names) => HttpResponse::Ok().body(names.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list models"),
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.model_names.join("\n"))
}

#[get("/v1/summary")]
async fn get_summary(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let model = &shared_data.model;
	HttpResponse::Ok().json(Summary {
		order: model.order(),
		num_states: model.num_states(),
		num_paths: model.num_paths(),
		num_contexts: model.num_contexts(),
		models: &shared_data.model_names,
	})
}

#[put("/v1/load_models")]
async fn put_model(data: web::Data<RwLock<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let mut shared_data = match data.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};

	let model_names: Vec<&str> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.collect();

	let order = query.order.unwrap_or_else(|| shared_data.model.order());
	match shared_data.load_models(&model_names, order) {
		Ok(()) => HttpResponse::Ok().body("Models loaded successfully"),
		Err(e) => {
			log::warn!("Failed to load models {model_names:?}: {e}");
			error_response(&e)
		}
	}
}

/// HTTP POST endpoint `/v1/paths`
///
/// Adds one JSON path (`{"path": ["the", "cat", 3]}`) to the shared model.
#[post("/v1/paths")]
async fn post_path(data: web::Data<RwLock<SharedData>>, body: web::Json<PathBody>) -> impl Responder {
	let mut shared_data = match data.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match shared_data.model.add_raw_path(&body.path) {
		Ok(()) => HttpResponse::Ok().body("Path added"),
		Err(e) => error_response(&e),
	}
}

/// HTTP POST endpoint `/v1/text`
///
/// Splits a plain text body into sentences and adds them to the shared model.
#[post("/v1/text")]
async fn post_text(data: web::Data<RwLock<SharedData>>, body: String) -> impl Responder {
	let mut shared_data = match data.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match text::ingest_text(&mut shared_data.model, &body) {
		Ok(report) => HttpResponse::Ok().json(IngestSummary { added: report.added, skipped: report.skipped }),
		Err(e) => error_response(&e),
	}
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_generated)
		.service(get_models)
		.service(get_loaded_models)
		.service(get_summary)
		.service(put_model)
		.service(post_path)
		.service(post_text);
}

/// Main entry point for the server.
///
/// Builds the shared model (optionally preloading corpora), wraps it in an
/// `RwLock` and starts the Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let config = Config::parse();

	let data_dir = normalize_folder(&config.data_dir);
	let mut shared_data =
		SharedData::new(data_dir, config.order, config.max_len).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

	if !config.preload.is_empty() {
		let names: Vec<&str> = config.preload.iter().map(String::as_str).collect();
		shared_data
			.load_models(&names, config.order)
			.map_err(|e| std::io::Error::other(e.to_string()))?;
	}
	let shared_model = web::Data::new(RwLock::new(shared_data));

	log::info!("Listening on {}:{}", config.host, config.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.configure(routes)
	})
		.bind((config.host.as_str(), config.port))?
		.run()
		.await
}
