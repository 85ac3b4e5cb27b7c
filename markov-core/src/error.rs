//! Error types shared by the whole crate.

/// Result alias defaulting to [`MarkovError`].
pub type Result<T, E = MarkovError> = std::result::Result<T, E>;

/// Every failure the model, the tokenizer or the persistence layer can report.
///
/// The first group concerns the model itself and is raised synchronously by
/// the operation that detected it. The second group is only produced while
/// reading or writing model files.
#[derive(Debug, thiserror::Error)]
pub enum MarkovError {
	/// The chain order must be a positive integer.
	#[error("`order` must be a positive integer, got {0}")]
	InvalidOrder(i64),

	/// A dynamically typed symbol was neither a string nor an integer.
	#[error("invalid symbol type ({0}), must be a string or an integer")]
	InvalidSymbolType(String),

	/// A path must hold strictly more symbols than the order.
	#[error("length of path ({len}) must be > Markov chain order ({order})")]
	InvalidPathLength { len: usize, order: usize },

	/// Generation was requested before any path was ingested.
	#[error("cannot generate a path from an empty model, add a path first")]
	EmptyModelGeneration,

	/// Two models of different orders cannot be combined.
	#[error("order mismatch: expected {expected}, found {found}")]
	OrderMismatch { expected: usize, found: usize },

	/// Adding the counts would push a total past `u64::MAX`.
	#[error("transition counts would overflow")]
	CountOverflow,

	/// A background ingestion worker died before reporting its partial model.
	#[error("background thread panicked: {0}")]
	ThreadPanic(String),

	/// The bytes do not start with the model file header.
	#[error("not a model file")]
	NotAModelFile,

	/// The header is valid but the format version is unknown.
	#[error("unsupported model format version {0}")]
	UnsupportedFormatVersion(u8),

	/// The file claims to be a model but its content is unusable.
	#[error("corrupt model file: {0}")]
	CorruptModel(String),

	/// Encoding a model snapshot failed.
	#[error(transparent)]
	Encoding(#[from] postcard::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}
