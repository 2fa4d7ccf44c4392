//! Saving and loading models.
//!
//! A model file is one frame:
//!
//! ```text
//! magic "NBCM" | format version (u32 LE) | payload length (u64 LE) | payload | CRC32 (u32 LE)
//! ```
//!
//! The payload is the bincode encoding of a [`ModelSnapshot`]. A file that is
//! truncated, has trailing bytes or fails the checksum does not load at all.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::info;
use serde::{Deserialize, Serialize};

use crate::aggregation::WordFrequencyTable;
use crate::corpus::ClassLabel;
use crate::error::{CorpusBayesError, Result};
use crate::model::naive_bayes::NaiveBayesModel;
use crate::storage::Storage;

/// File magic of a persisted model.
pub const MODEL_MAGIC: &[u8; 4] = b"NBCM";

/// Current snapshot format version.
pub const MODEL_FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 4 + 4 + 8;

/// The persisted form of a [`NaiveBayesModel`].
///
/// Fields are encoded in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub format_version: u32,
    pub train_docs: BTreeMap<ClassLabel, Vec<String>>,
    pub test_docs: BTreeMap<ClassLabel, Vec<String>>,
    pub priors: BTreeMap<ClassLabel, f64>,
    pub total_train_docs: u64,
    pub total_words: BTreeMap<ClassLabel, u64>,
    pub word_counts: BTreeMap<ClassLabel, BTreeMap<String, u64>>,
}

impl From<&NaiveBayesModel> for ModelSnapshot {
    fn from(model: &NaiveBayesModel) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            train_docs: model.train_docs.clone(),
            test_docs: model.test_docs.clone(),
            priors: model.priors.clone(),
            total_train_docs: model.total_train_docs,
            total_words: model.total_words.clone(),
            word_counts: model
                .word_counts
                .iter()
                .map(|(class, table)| (class.clone(), table.counts().clone()))
                .collect(),
        }
    }
}

impl TryFrom<ModelSnapshot> for NaiveBayesModel {
    type Error = CorpusBayesError;

    fn try_from(snapshot: ModelSnapshot) -> Result<Self> {
        if snapshot.format_version != MODEL_FORMAT_VERSION {
            return Err(CorpusBayesError::model(format!(
                "Unsupported model format version {}",
                snapshot.format_version
            )));
        }

        let word_counts = snapshot
            .word_counts
            .into_iter()
            .map(|(class, counts)| (class, WordFrequencyTable::from_counts(counts)))
            .collect();

        NaiveBayesModel::from_parts(
            snapshot.train_docs,
            snapshot.test_docs,
            snapshot.priors,
            snapshot.total_train_docs,
            snapshot.total_words,
            word_counts,
        )
    }
}

/// Encode a model into a framed byte buffer.
pub fn encode_model(model: &NaiveBayesModel) -> Result<Vec<u8>> {
    let payload = bincode::serialize(&ModelSnapshot::from(model))?;

    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + 4);
    buf.write_all(MODEL_MAGIC)?;
    buf.write_u32::<LittleEndian>(MODEL_FORMAT_VERSION)?;
    buf.write_u64::<LittleEndian>(payload.len() as u64)?;
    buf.write_all(&payload)?;
    buf.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
    Ok(buf)
}

/// Decode a framed model.
pub fn decode_model(bytes: &[u8]) -> Result<NaiveBayesModel> {
    let truncated = |_| CorpusBayesError::model("Model file is truncated");
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic).map_err(truncated)?;
    if &magic != MODEL_MAGIC {
        return Err(CorpusBayesError::model("Not a model file (bad magic)"));
    }

    let version = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    if version != MODEL_FORMAT_VERSION {
        return Err(CorpusBayesError::model(format!(
            "Unsupported model format version {version}"
        )));
    }

    let len = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
    let expected = (HEADER_LEN as u64)
        .checked_add(len)
        .and_then(|n| n.checked_add(4));
    if expected != Some(bytes.len() as u64) {
        return Err(CorpusBayesError::model(format!(
            "Model file size {} does not match payload length {len}",
            bytes.len()
        )));
    }

    let payload = &bytes[HEADER_LEN..HEADER_LEN + len as usize];
    cursor.set_position((HEADER_LEN as u64) + len);
    let checksum = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    if crc32fast::hash(payload) != checksum {
        return Err(CorpusBayesError::model("Model checksum mismatch"));
    }

    let snapshot: ModelSnapshot = bincode::deserialize(payload)?;
    NaiveBayesModel::try_from(snapshot)
}

/// Write `model` to `path`, replacing any existing file.
pub fn save_model(storage: &dyn Storage, path: &str, model: &NaiveBayesModel) -> Result<()> {
    let bytes = encode_model(model)?;

    let mut output = storage.create_output(path)?;
    output.write_all(&bytes)?;
    output.flush_and_sync()?;
    output.close()?;

    info!(
        "Saved model with {} classes to {path} ({} bytes)",
        model.num_classes(),
        bytes.len()
    );
    Ok(())
}

/// Read a model previously written by [`save_model`].
pub fn load_model(storage: &dyn Storage, path: &str) -> Result<NaiveBayesModel> {
    let mut input = storage.open_input(path)?;
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    input.close()?;

    let model = decode_model(&bytes)
        .map_err(|e| CorpusBayesError::model(format!("Failed to load model from {path}: {e}")))?;
    info!("Loaded model with {} classes from {path}", model.num_classes());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusSplit;
    use crate::model::ModelBuilder;
    use crate::storage::MemoryStorage;

    fn model() -> NaiveBayesModel {
        let mut train = BTreeMap::new();
        train.insert("A".to_string(), vec!["a1".to_string(), "a2".to_string()]);
        train.insert("B".to_string(), vec!["b1".to_string()]);
        let mut test = BTreeMap::new();
        test.insert("A".to_string(), vec!["a3".to_string()]);

        let table = |pairs: &[(&str, u64)]| -> WordFrequencyTable {
            pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect()
        };

        ModelBuilder::new(CorpusSplit::from_parts(train, test))
            .add_class_counts("A", table(&[("x", 3), ("New York", 1)]))
            .add_class_counts("B", table(&[("y", 2), ("z", 2)]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_save_load_round_trip() {
        let storage = MemoryStorage::new_default();
        let model = model();

        save_model(&storage, "out/Classifier", &model).unwrap();
        let loaded = load_model(&storage, "out/Classifier").unwrap();

        assert_eq!(loaded, model);
        assert_eq!(ModelSnapshot::from(&loaded), ModelSnapshot::from(&model));
        assert_eq!(loaded.test_docs("A"), model.test_docs("A"));
        assert_eq!(loaded.prior("B"), model.prior("B"));
    }

    #[test]
    fn test_frame_layout() {
        let bytes = encode_model(&model()).unwrap();

        assert_eq!(&bytes[..4], MODEL_MAGIC);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), MODEL_FORMAT_VERSION);
        let len = u64::from_le_bytes(bytes[8..16].try_into().unwrap()) as usize;
        assert_eq!(bytes.len(), HEADER_LEN + len + 4);
    }

    #[test]
    fn test_truncated_file_fails() {
        let bytes = encode_model(&model()).unwrap();

        for cut in [0, 3, 10, HEADER_LEN, bytes.len() / 2, bytes.len() - 1] {
            assert!(decode_model(&bytes[..cut]).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn test_corrupted_payload_fails() {
        let mut bytes = encode_model(&model()).unwrap();
        let middle = HEADER_LEN + 5;
        bytes[middle] ^= 0xff;

        let err = decode_model(&bytes).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut bytes = encode_model(&model()).unwrap();
        bytes[0] = b'X';
        assert!(decode_model(&bytes).is_err());

        let mut bytes = encode_model(&model()).unwrap();
        bytes[4] = 99;
        assert!(decode_model(&bytes).is_err());
    }

    #[test]
    fn test_trailing_bytes_fail() {
        let mut bytes = encode_model(&model()).unwrap();
        bytes.push(0);
        assert!(decode_model(&bytes).is_err());
    }

    #[test]
    fn test_missing_file_fails() {
        let storage = MemoryStorage::new_default();
        assert!(load_model(&storage, "out/Classifier").is_err());
    }
}
