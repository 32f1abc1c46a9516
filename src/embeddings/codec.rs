//! Binary layout of stored embeddings: a packed little-endian f32 array.
//!
//! Vectors persisted with this layout stay comparable across builds and
//! platforms, so the byte order is fixed rather than native.

use crate::error::CodecError;

/// Encode an embedding as little-endian f32 bytes
pub fn encode_embedding(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|&f| f.to_le_bytes()).collect()
}

/// Decode little-endian f32 bytes back into an embedding
pub fn decode_embedding(bytes: &[u8]) -> Result<Vec<f32>, CodecError> {
    if bytes.len() % 4 != 0 {
        return Err(CodecError::InvalidLength(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
