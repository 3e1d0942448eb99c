//! Batch embedding validation.
//!
//! Batch providers occasionally drop or filter inputs. Pairing by position is
//! only trustworthy when the counts match exactly, so any mismatch or empty
//! vector fails the whole batch. Nothing is truncated, padded or skipped.

use super::RawEmbeddings;
use crate::unit::{PendingUnit, RetrievalUnit};
use thiserror::Error;

const PREVIEW_CHARS: usize = 60;

/// Integrity failure of a batch embedding response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error(
        "embedding count mismatch: {expected} items submitted but {actual} embeddings returned \
         (first item: {first_preview:?}, last item: {last_preview:?})"
    )]
    CountMismatch {
        expected: usize,
        actual: usize,
        first_preview: String,
        last_preview: String,
    },

    #[error("empty embedding vector returned at position {index}")]
    EmptyVector { index: usize },
}

/// Check a raw response against the submitted texts and return the vectors in
/// input order.
pub fn validate_vectors<S: AsRef<str>>(
    inputs: &[S],
    raw: RawEmbeddings,
) -> Result<Vec<Vec<f32>>, BatchError> {
    let vectors = raw.into_vectors();

    if vectors.len() != inputs.len() {
        return Err(BatchError::CountMismatch {
            expected: inputs.len(),
            actual: vectors.len(),
            first_preview: inputs.first().map(|s| preview(s.as_ref())).unwrap_or_default(),
            last_preview: inputs.last().map(|s| preview(s.as_ref())).unwrap_or_default(),
        });
    }

    if let Some(index) = vectors.iter().position(|v| v.is_empty()) {
        return Err(BatchError::EmptyVector { index });
    }

    Ok(vectors)
}

/// Validate `raw` against `units` and pair them by position.
///
/// On failure no unit is returned, so a failed batch can never be published.
pub fn attach(units: Vec<PendingUnit>, raw: RawEmbeddings) -> Result<Vec<RetrievalUnit>, BatchError> {
    let texts: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
    let vectors = validate_vectors(&texts[..], raw)?;

    Ok(units
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(order, (unit, vector))| RetrievalUnit::embedded(order, unit, vector))
        .collect())
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
