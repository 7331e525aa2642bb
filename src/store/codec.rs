//! Byte encoding shared by the persisted stores.
//!
//! An embedding is stored as its f32 values in little-endian order, four
//! bytes each, with no header. This round-trips every bit pattern exactly.

use crate::error::{CacheError, Result};
use crate::Embedding;

pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode bytes written by [`encode_embedding`]. `key` is only used for the error.
pub fn decode_embedding(key: &str, blob: &[u8]) -> Result<Embedding> {
    if blob.len() % 4 != 0 {
        return Err(CacheError::Corrupt {
            key: key.to_string(),
            reason: format!("length {} is not a multiple of 4", blob.len()),
        });
    }
    Ok(blob
        .chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect())
}
