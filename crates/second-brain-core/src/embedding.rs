//! Vector utilities for embeddings.
//!
//! Pure helpers for dimension checking, BLOB serialization, and
//! similarity computation. Provider traits live in [`crate::provider`].

use crate::error::BrainError;

/// Reject any vector whose length differs from the configured dimension.
///
/// Never truncates or pads: a wrong-length vector in the index would
/// silently corrupt every later similarity search.
pub fn ensure_dims(vector: &[f32], expected: usize) -> Result<(), BrainError> {
    if vector.len() != expected {
        return Err(BrainError::EmbeddingDimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Serialize an embedding for the `knowledge_items.embedding` column.
///
/// The layout is `embed_dim` little-endian `f32` values back to back, so
/// a stored row's blob is always `4 × embed_dim` bytes.
///
/// ```rust
/// use second_brain_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Inverse of [`vec_to_blob`]. Trailing bytes that do not form a whole
/// `f32` are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .filter_map(|chunk| <[u8; 4]>::try_from(chunk).ok().map(f32::from_le_bytes))
        .collect()
}

/// Cosine similarity of a query embedding against a stored one.
///
/// This is the score compared against the inclusive match threshold,
/// which is always positive. Vectors of different lengths, empty vectors,
/// and zero-magnitude vectors score `0.0`, so like negative scores they
/// can never match.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}
