//! Markov chain model and its building blocks.
//!
//! - Symbols and their interning table (`Symbol`, `LabelTable`)
//! - Fixed-length windows of state ids (`Context`)
//! - Weighted successor sets (`Transitions`) and the sampling primitive
//! - The model itself (`MarkovModel`)

/// The variable-order Markov chain.
///
/// Handles path ingestion, transition counting, random generation
/// and model merging.
pub mod chain;

/// Weighted categorical sampling over integer counts.
pub mod choice;

/// Fixed-length window of state ids used as a chain state.
pub mod context;

/// Symbols and the label table mapping them to dense state ids.
pub mod symbol;

/// Outgoing transitions of a single context.
pub mod transitions;

pub use chain::{MarkovModel, checked_order};
pub use choice::weighted_choice;
pub use context::Context;
pub use symbol::{LabelTable, StateId, Symbol};
pub use transitions::Transitions;
