//! Fixed-size, overlapping character windows over normalized document text.
//!
//! Windows are measured in Unicode scalar values so multi-byte scripts (Korean in particular)
//! are never split inside a character. Consecutive windows start `chunk_size - overlap`
//! characters apart; traversal ends with the first window that reaches the end of the text.

use super::types::ChunkingError;

/// Split `text` into overlapping windows of at most `chunk_size` characters.
///
/// - Blank input yields no chunks (not an error).
/// - `chunk_size <= 0` fails with [`ChunkingError::InvalidChunkSize`].
/// - `overlap < 0` or `overlap >= chunk_size` fails with [`ChunkingError::InvalidChunkOverlap`].
/// - Each window is trimmed; windows that trim to nothing are dropped while the stride still
///   advances, so output order always follows ascending start offset.
pub fn split(text: &str, chunk_size: i64, overlap: i64) -> Result<Vec<String>, ChunkingError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    if chunk_size <= 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap < 0 || overlap >= chunk_size {
        return Err(ChunkingError::InvalidChunkOverlap);
    }

    let chunk_size = chunk_size as usize;
    let stride = chunk_size - overlap as usize;

    // Byte offset of every char boundary, plus the end of the string.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < char_len {
        let end = (start + chunk_size).min(char_len);
        let window = text[boundaries[start]..boundaries[end]].trim();
        if !window.is_empty() {
            chunks.push(window.to_string());
        }
        if end == char_len {
            break;
        }
        start += stride;
    }
    Ok(chunks)
}
