//! Binary model files.
//!
//! A model file is the 4-byte magic `NMKV`, a format version byte and a
//! postcard encoded [`Snapshot`]. Anything without the magic is reported as
//! `NotAModelFile` so callers can try another reader, while a file with the
//! magic and an unusable body is `CorruptModel`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MarkovError, Result};
use crate::model::{Context, MarkovModel, Symbol};

pub const MAGIC: &[u8; 4] = b"NMKV";
pub const FORMAT_VERSION: u8 = 1;

/// Everything needed to rebuild a model with the same behaviour.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Snapshot {
	order: usize,
	labels: Vec<Symbol>,
	initial: Vec<(Context, u64)>,
	transitions: Vec<(Context, Vec<(Context, u64)>)>,
}

impl Snapshot {
	fn of(model: &MarkovModel) -> Self {
		let mut transitions: Vec<(Context, Vec<(Context, u64)>)> = model
			.transition_counts()
			.map(|(from, successors)| {
				let successors = successors.iter().map(|(to, count)| (to.clone(), count)).collect();
				(from.clone(), successors)
			})
			.collect();
		// stable output for identical models
		transitions.sort_by(|a, b| a.0.cmp(&b.0));

		Self {
			order: model.order(),
			labels: model.labels().to_vec(),
			initial: model.initial_counts().map(|(context, count)| (context.clone(), count)).collect(),
			transitions,
		}
	}
}

/// Whether `bytes` start with the model file magic.
pub fn is_model_bytes(bytes: &[u8]) -> bool {
	bytes.starts_with(MAGIC)
}

/// Encodes a model into the model file format.
pub fn to_bytes(model: &MarkovModel) -> Result<Vec<u8>> {
	let mut bytes = Vec::from(MAGIC.as_slice());
	bytes.push(FORMAT_VERSION);
	bytes.extend(postcard::to_stdvec(&Snapshot::of(model))?);
	Ok(bytes)
}

/// Decodes a model file.
///
/// # Errors
/// - `NotAModelFile` if the magic is missing
/// - `UnsupportedFormatVersion` if the version byte is unknown
/// - `CorruptModel` if the body cannot be decoded or is inconsistent
pub fn from_bytes(bytes: &[u8]) -> Result<MarkovModel> {
	if !is_model_bytes(bytes) {
		return Err(MarkovError::NotAModelFile);
	}
	let (&version, body) = bytes[MAGIC.len()..]
		.split_first()
		.ok_or_else(|| MarkovError::CorruptModel("missing format version".to_owned()))?;
	if version != FORMAT_VERSION {
		return Err(MarkovError::UnsupportedFormatVersion(version));
	}

	let snapshot: Snapshot = postcard::from_bytes(body).map_err(|e| MarkovError::CorruptModel(e.to_string()))?;
	MarkovModel::from_parts(snapshot.order, snapshot.labels, snapshot.initial, snapshot.transitions)
}

/// Writes a model file.
pub fn save<P: AsRef<Path>>(model: &MarkovModel, path: P) -> Result<()> {
	fs::write(path, to_bytes(model)?)?;
	Ok(())
}

/// Reads a model file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<MarkovModel> {
	from_bytes(&fs::read(path)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn sample_model() -> MarkovModel {
		let mut model = MarkovModel::new(2).unwrap();
		model.add_path(["the", "cat", "sat", "on", "the", "mat", "."]).unwrap();
		model.add_path(["the", "cat", "ate", "."]).unwrap();
		model.add_path(vec![Symbol::from(1), Symbol::from("cat"), Symbol::from(2)]).unwrap();
		model
	}

	#[test]
	fn snapshot_restores_behaviour() {
		let model = sample_model();
		let restored = from_bytes(&to_bytes(&model).unwrap()).unwrap();

		assert_eq!(restored.order(), model.order());
		assert_eq!(restored.labels(), model.labels());
		assert_eq!(Snapshot::of(&restored), Snapshot::of(&model));

		let mut left = StdRng::seed_from_u64(99);
		let mut right = StdRng::seed_from_u64(99);
		for _ in 0..50 {
			assert_eq!(
				model.generate_path_with(None, &mut left).unwrap(),
				restored.generate_path_with(None, &mut right).unwrap()
			);
		}
	}

	#[test]
	fn encoding_is_stable() {
		let model = sample_model();
		assert_eq!(to_bytes(&model).unwrap(), to_bytes(&model.clone()).unwrap());
	}

	#[test]
	fn text_is_not_a_model() {
		assert!(matches!(from_bytes(b"The cat sat."), Err(MarkovError::NotAModelFile)));
		assert!(matches!(from_bytes(b""), Err(MarkovError::NotAModelFile)));
	}

	#[test]
	fn damaged_models_are_corrupt() {
		let bytes = to_bytes(&sample_model()).unwrap();

		assert!(matches!(from_bytes(&bytes[..MAGIC.len()]), Err(MarkovError::CorruptModel(_))));
		assert!(matches!(from_bytes(&bytes[..bytes.len() / 2]), Err(MarkovError::CorruptModel(_))));

		let mut future = bytes.clone();
		future[MAGIC.len()] = FORMAT_VERSION + 1;
		assert!(matches!(from_bytes(&future), Err(MarkovError::UnsupportedFormatVersion(2))));
	}

	#[test]
	fn inconsistent_snapshots_are_corrupt() {
		let snapshot = Snapshot {
			order: 1,
			labels: vec![Symbol::from("a")],
			initial: vec![(Context::new(vec![3]), 1)],
			transitions: vec![],
		};
		assert!(matches!(from_bytes(&encode(&snapshot)), Err(MarkovError::CorruptModel(_))));
	}

	fn encode(snapshot: &Snapshot) -> Vec<u8> {
		let mut bytes = Vec::from(MAGIC.as_slice());
		bytes.push(FORMAT_VERSION);
		bytes.extend(postcard::to_stdvec(snapshot).unwrap());
		bytes
	}

	#[test]
	fn overflowing_counts_are_corrupt() {
		let a = Context::new(vec![0]);
		let b = Context::new(vec![1]);

		let initial_overflow = Snapshot {
			order: 1,
			labels: vec![Symbol::from("a"), Symbol::from("b")],
			initial: vec![(a.clone(), u64::MAX), (b.clone(), 2)],
			transitions: vec![],
		};
		assert!(matches!(from_bytes(&encode(&initial_overflow)), Err(MarkovError::CorruptModel(_))));

		let transition_overflow = Snapshot {
			order: 1,
			labels: vec![Symbol::from("a"), Symbol::from("b")],
			initial: vec![(a.clone(), 1)],
			transitions: vec![
				(a.clone(), vec![(a.clone(), u64::MAX)]),
				(a.clone(), vec![(b.clone(), 1)]),
			],
		};
		assert!(matches!(from_bytes(&encode(&transition_overflow)), Err(MarkovError::CorruptModel(_))));

		let at_the_limit = Snapshot {
			order: 1,
			labels: vec![Symbol::from("a"), Symbol::from("b")],
			initial: vec![(a.clone(), u64::MAX - 2), (b.clone(), 2)],
			transitions: vec![(a, vec![(b, u64::MAX)])],
		};
		let model = from_bytes(&encode(&at_the_limit)).unwrap();
		assert_eq!(model.num_paths(), u64::MAX);
		assert!(model.generate_path(Some(4)).is_ok());
	}

	#[test]
	fn files_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("model.mkv");
		save(&sample_model(), &path).unwrap();
		assert_eq!(load(&path).unwrap().num_paths(), 3);
	}
}
