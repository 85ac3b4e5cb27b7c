use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc;
use std::thread;

use rand::Rng;

use super::choice::weighted_choice;
use super::context::Context;
use super::symbol::{LabelTable, StateId, Symbol};
use super::transitions::Transitions;
use crate::error::{MarkovError, Result};

/// Validates a signed, user supplied order.
///
/// # Errors
/// Returns `InvalidOrder` if `order < 1`.
pub fn checked_order(order: i64) -> Result<usize> {
	match usize::try_from(order) {
		Ok(order) if order >= 1 => Ok(order),
		_ => Err(MarkovError::InvalidOrder(order)),
	}
}

/// A variable-order Markov chain over interned symbols.
///
/// Every ingested path contributes one count to the context formed by its
/// first `order` symbols and one count to every transition between two
/// consecutive windows of `order` symbols.
///
/// # Responsibilities
/// - Intern symbols into dense state ids
/// - Accumulate initial and transition counts
/// - Generate random paths by weighted sampling
/// - Merge with another model of the same order
///
/// # Invariants
/// - `order` is always >= 1 and never changes
/// - Every context in both tables has exactly `order` state ids, all interned
/// - Every count is >= 1 and every transition source has at least one successor
/// - The initial total and every per-context transition total fit in a `u64`
/// - Tables only grow
#[derive(Clone, Debug)]
pub struct MarkovModel {
	order: usize,

	labels: LabelTable,

	/// Mapping from a context to its observed successors.
	transitions: HashMap<Context, Transitions>,

	/// Number of paths starting with each context.
	initial: BTreeMap<Context, u64>,

	/// Sum of the initial counts.
	paths: u64,

	/// Largest of `paths` and every transition total.
	largest_total: u64,
}

impl MarkovModel {
	/// Creates an empty model of the given order.
	///
	/// # Errors
	/// Returns `InvalidOrder` if `order == 0`.
	pub fn new(order: usize) -> Result<Self> {
		if order < 1 {
			return Err(MarkovError::InvalidOrder(0));
		}
		Ok(Self {
			order,
			labels: LabelTable::new(),
			transitions: HashMap::new(),
			initial: BTreeMap::new(),
			paths: 0,
			largest_total: 0,
		})
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of distinct symbols seen so far.
	pub fn num_states(&self) -> usize {
		self.labels.len()
	}

	/// Number of ingested paths.
	pub fn num_paths(&self) -> u64 {
		self.paths
	}

	/// Number of contexts having at least one successor.
	pub fn num_contexts(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.initial.is_empty()
	}

	/// Labels in state id order.
	pub fn labels(&self) -> &[Symbol] {
		self.labels.as_slice()
	}

	pub fn label_table(&self) -> &LabelTable {
		&self.labels
	}

	/// Iterates over the initial contexts and their counts, in context order.
	pub fn initial_counts(&self) -> impl Iterator<Item = (&Context, u64)> {
		self.initial.iter().map(|(context, count)| (context, *count))
	}

	/// Number of paths that started with `context`.
	pub fn initial_count(&self, context: &Context) -> u64 {
		self.initial.get(context).copied().unwrap_or(0)
	}

	/// Iterates over every transition source and its successors (unordered).
	pub fn transition_counts(&self) -> impl Iterator<Item = (&Context, &Transitions)> {
		self.transitions.iter()
	}

	/// Successors of `context`, if it has any.
	pub fn transitions_from(&self, context: &Context) -> Option<&Transitions> {
		self.transitions.get(context)
	}

	/// Builds the context of already interned symbols.
	///
	/// Returns `None` if a symbol is unknown.
	pub fn context_of<I>(&self, symbols: I) -> Option<Context>
	where
		I: IntoIterator,
		I::Item: Into<Symbol>,
	{
		symbols
			.into_iter()
			.map(|symbol| self.labels.lookup(&symbol.into()))
			.collect::<Option<Vec<StateId>>>()
			.map(Context::new)
	}

	/// Adds a path (for instance one sentence) to the model.
	///
	/// The first `order` symbols count as one initial context, then each
	/// window of `order` symbols counts one transition toward the window
	/// shifted by one symbol.
	///
	/// # Errors
	/// - `InvalidPathLength` if the path is not longer than the order
	/// - `CountOverflow` if a count total could exceed `u64::MAX`
	///
	/// The model is left untouched on error.
	pub fn add_path<I>(&mut self, path: I) -> Result<()>
	where
		I: IntoIterator,
		I::Item: Into<Symbol>,
	{
		let path: Vec<Symbol> = path.into_iter().map(Into::into).collect();
		if path.len() <= self.order {
			return Err(MarkovError::InvalidPathLength { len: path.len(), order: self.order });
		}
		// A path raises any single total by at most its length.
		self.largest_total
			.checked_add(path.len() as u64)
			.ok_or(MarkovError::CountOverflow)?;

		let ids: Vec<StateId> = path.into_iter().map(|symbol| self.labels.intern(symbol)).collect();

		*self.initial.entry(Context::from(&ids[..self.order])).or_insert(0) += 1;
		self.paths += 1;
		self.largest_total = self.largest_total.max(self.paths);
		for window in ids.windows(self.order + 1) {
			let from = Context::from(&window[..self.order]);
			let to = Context::from(&window[1..]);
			let transitions = self.transitions.entry(from).or_default();
			transitions.add(to, 1);
			self.largest_total = self.largest_total.max(transitions.total());
		}
		Ok(())
	}

	/// Adds a path of dynamically typed values.
	///
	/// Every value is validated before anything is interned.
	///
	/// # Errors
	/// - `InvalidSymbolType` if a value is neither a string nor an integer
	/// - `InvalidPathLength` if the path is not longer than the order
	pub fn add_raw_path(&mut self, path: &[serde_json::Value]) -> Result<()> {
		let symbols = path.iter().map(Symbol::try_from).collect::<Result<Vec<_>>>()?;
		self.add_path(symbols)
	}

	/// Generates a random path using the thread-local generator.
	///
	/// See [`MarkovModel::generate_path_with`].
	pub fn generate_path(&self, max_len: Option<usize>) -> Result<Vec<Symbol>> {
		self.generate_path_with(max_len, &mut rand::rng())
	}

	/// Generates a random path.
	///
	/// Starts from an initial context drawn proportionally to its count, then
	/// follows weighted transitions until a context has no successor or the
	/// path holds `max_len` symbols. The starting context is always emitted
	/// whole, so the result is never shorter than the order.
	///
	/// # Errors
	/// Returns `EmptyModelGeneration` if no path was ever added.
	pub fn generate_path_with<R>(&self, max_len: Option<usize>, rng: &mut R) -> Result<Vec<Symbol>>
	where
		R: Rng + ?Sized,
	{
		let mut current = weighted_choice(&self.initial, rng).ok_or(MarkovError::EmptyModelGeneration)?;
		let mut path: Vec<Symbol> = current.ids().iter().map(|&id| self.symbol(id)).collect();

		while max_len.is_none_or(|max_len| path.len() < max_len) {
			let Some(next) = self.transitions.get(current).and_then(|transitions| transitions.choose(rng)) else {
				break;
			};
			path.extend(next.last().map(|id| self.symbol(id)));
			current = next;
		}

		Ok(path)
	}

	fn symbol(&self, id: StateId) -> Symbol {
		self.labels.as_slice()[id].clone()
	}

	/// Merges another model into this one.
	///
	/// Labels of `other` are interned in its state id order, then every
	/// initial and transition count is added to the translated contexts.
	///
	/// # Errors
	/// - `OrderMismatch` if the orders differ
	/// - `CountOverflow` if a merged count would not fit in a `u64`
	///
	/// The model is left untouched on error.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.order != other.order {
			return Err(MarkovError::OrderMismatch { expected: self.order, found: other.order });
		}

		// Totals of both models fit in a u64; if the merged totals do too, so does every merged count.
		self.num_paths().checked_add(other.num_paths()).ok_or(MarkovError::CountOverflow)?;
		for (from, transitions) in &other.transitions {
			let current = self
				.translate_known(from, &other.labels)
				.and_then(|context| self.transitions.get(&context))
				.map_or(0, Transitions::total);
			current.checked_add(transitions.total()).ok_or(MarkovError::CountOverflow)?;
		}

		let mapping: Vec<StateId> = other.labels.iter().map(|symbol| self.labels.intern(symbol.clone())).collect();

		for (context, count) in &other.initial {
			*self.initial.entry(context.remap(&mapping)).or_insert(0) += count;
		}
		self.paths += other.paths;
		for (from, transitions) in &other.transitions {
			let entry = self.transitions.entry(from.remap(&mapping)).or_default();
			for (to, count) in transitions.iter() {
				entry.add(to.remap(&mapping), count);
			}
		}
		self.refresh_largest_total();

		Ok(())
	}

	fn refresh_largest_total(&mut self) {
		self.largest_total = self
			.transitions
			.values()
			.map(Transitions::total)
			.fold(self.paths, u64::max);
	}

	/// Translates a context of `labels` into this model's ids without interning.
	///
	/// Returns `None` if one of its symbols is unknown here.
	fn translate_known(&self, context: &Context, labels: &LabelTable) -> Option<Context> {
		context
			.ids()
			.iter()
			.map(|&id| labels.label(id).and_then(|symbol| self.labels.lookup(symbol)))
			.collect::<Option<Vec<StateId>>>()
			.map(Context::new)
	}

	/// Builds a model from many paths using one worker thread per chunk.
	///
	/// Partial models are merged in chunk order, so state ids match the ones
	/// sequential ingestion would assign.
	///
	/// # Errors
	/// - `InvalidOrder` if `order == 0`
	/// - `InvalidPathLength` if any path is too short
	/// - `ThreadPanic` if a worker died
	pub fn from_paths(order: usize, paths: Vec<Vec<Symbol>>) -> Result<Self> {
		let mut model = Self::new(order)?;
		if paths.is_empty() {
			return Ok(model);
		}

		let chunks = num_cpus::get() * 8;
		let chunk_size = paths.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		let mut spawned = 0;
		for (index, chunk) in paths.chunks(chunk_size).enumerate() {
			let tx = tx.clone();
			let chunk: Vec<Vec<Symbol>> = chunk.to_vec();

			thread::spawn(move || {
				let partial = Self::new(order).and_then(|mut partial| {
					for path in chunk {
						partial.add_path(path)?;
					}
					Ok(partial)
				});
				if tx.send((index, partial)).is_err() {
					log::warn!("Partial model {index} dropped, receiver is gone");
				}
			});
			spawned += 1;
		}
		drop(tx);

		let mut partials: Vec<(usize, Result<Self>)> = rx.iter().collect();
		if partials.len() != spawned {
			return Err(MarkovError::ThreadPanic(format!(
				"{} of {spawned} ingestion workers did not report",
				spawned - partials.len()
			)));
		}
		partials.sort_by_key(|(index, _)| *index);

		for (_, partial) in partials {
			model.merge(&partial?)?;
		}
		log::debug!("Built order-{order} model from {} paths in {spawned} chunks", model.num_paths());

		Ok(model)
	}

	/// Rebuilds a model from its raw tables, typically a decoded snapshot.
	///
	/// # Errors
	/// Returns `CorruptModel` if any invariant of the model is violated.
	pub fn from_parts(
		order: usize,
		labels: Vec<Symbol>,
		initial: Vec<(Context, u64)>,
		transitions: Vec<(Context, Vec<(Context, u64)>)>,
	) -> Result<Self> {
		let corrupt = |reason: String| MarkovError::CorruptModel(reason);

		if order < 1 {
			return Err(corrupt("order must be >= 1".to_owned()));
		}
		let labels = LabelTable::from_labels(labels)?;
		let num_states = labels.len();
		let check_context = |context: &Context| -> Result<()> {
			if context.len() != order {
				return Err(corrupt(format!("context of length {} in an order-{order} model", context.len())));
			}
			if let Some(id) = context.ids().iter().find(|&&id| id >= num_states) {
				return Err(corrupt(format!("state {id} out of range (num_states = {num_states})")));
			}
			Ok(())
		};

		let mut model = Self::new(order)?;
		model.labels = labels;

		// Per-table totals must fit in a u64, which bounds every single count too.
		let mut initial_total: u64 = 0;
		for (context, count) in initial {
			check_context(&context)?;
			if count == 0 {
				return Err(corrupt("zero initial count".to_owned()));
			}
			initial_total = initial_total.checked_add(count).ok_or_else(|| corrupt("count overflow".to_owned()))?;
			*model.initial.entry(context).or_insert(0) += count;
		}
		model.paths = initial_total;

		for (from, successors) in transitions {
			check_context(&from)?;
			if successors.is_empty() {
				return Err(corrupt("context without successors".to_owned()));
			}
			let entry = model.transitions.entry(from.clone()).or_default();
			let mut total = entry.total();
			for (to, count) in successors {
				check_context(&to)?;
				if count == 0 {
					return Err(corrupt("zero transition count".to_owned()));
				}
				if !from.is_followed_by(&to) {
					return Err(corrupt("transition between non-overlapping contexts".to_owned()));
				}
				total = total.checked_add(count).ok_or_else(|| corrupt("count overflow".to_owned()))?;
				entry.add(to, count);
			}
		}
		model.refresh_largest_total();

		Ok(model)
	}
}
