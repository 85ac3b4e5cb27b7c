//! Variable-order Markov chain text generation library.
//!
//! This crate provides:
//! - A Markov chain over string or integer symbols (`model::MarkovModel`)
//! - A simple sentence tokenizer feeding text into a model
//! - A compact binary model file format
//! - Helpers to build models from corpora, with on-disk caching
//!
//! The model never touches the filesystem; everything else is glue around it.

/// Core Markov chain model and sampling logic.
pub mod model;

/// Crate-wide error type.
pub mod error;

/// Sentence splitting and text ingestion.
pub mod text;

/// Binary model files (`NMKV` + postcard).
pub mod persist;

/// Opening model files and text corpora.
pub mod corpus;

/// I/O utilities (file loading, path helpers).
pub mod io;

pub use error::{MarkovError, Result};
pub use model::{MarkovModel, Symbol};
