//! Cosine-similarity top-k ranking over a single video's units.
//!
//! Exhaustive linear scan; a video holds tens to a few hundred units.

use crate::unit::RetrievalUnit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores at or above this are labelled [`Confidence::High`].
pub const HIGH_CONFIDENCE: f32 = 0.80;
/// Scores at or above this are labelled [`Confidence::Medium`].
pub const MEDIUM_CONFIDENCE: f32 = 0.60;

/// Anything that carries an embedding vector.
pub trait Scorable {
    fn vector(&self) -> &[f32];
}

impl Scorable for Vec<f32> {
    fn vector(&self) -> &[f32] {
        self
    }
}

impl Scorable for RetrievalUnit {
    fn vector(&self) -> &[f32] {
        self.embedding()
    }
}

impl<T: Scorable> Scorable for &T {
    fn vector(&self) -> &[f32] {
        (*self).vector()
    }
}

/// Cosine similarity, or `None` when the score is undefined: either vector
/// empty, dimensions differ, a zero norm, or a non-finite result.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    let score = dot_product / (norm_a * norm_b);
    score.is_finite().then(|| score.clamp(-1.0, 1.0))
}

/// One ranked candidate.
#[derive(Debug, Clone, Copy)]
pub struct Ranked<'a, T> {
    /// Position of the candidate in the input slice.
    pub index: usize,
    pub item: &'a T,
    pub score: f32,
}

/// Rank `candidates` against `query` and return at most `k` of them,
/// best first.
///
/// Candidates with an undefined score are dropped, never padded back in.
/// Equal scores keep their input order.
pub fn rank<'a, T: Scorable>(query: &[f32], candidates: &'a [T], k: usize) -> Vec<Ranked<'a, T>> {
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<Ranked<'a, T>> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            cosine_similarity(query, item.vector()).map(|score| Ranked { index, item, score })
        })
        .collect();

    // Stable sort: ties stay in candidate order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}

/// Coarse confidence label for visual search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_score(score: f32) -> Self {
        if score >= HIGH_CONFIDENCE {
            Confidence::High
        } else if score >= MEDIUM_CONFIDENCE {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}
