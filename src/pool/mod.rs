//! The in-memory training pool.
//!
//! A [`Pool`] is the fully parsed training dataset: one [`Document`] per
//! input row, the set of categorical factor indices, optional feature ids,
//! the auxiliary winner/loser [`Pair`] relation, and the mapping from
//! categorical hash values back to the original strings.
//!
//! The pool is created empty, populated block-by-block during ingestion
//! (see [`crate::ingest`]), finalized once, and afterwards read-only except
//! for [`permutation::apply_permutation`].

pub mod permutation;

use std::collections::HashMap;

use crate::error::PoolError;

/// One training example.
///
/// Numeric and categorical factors share one dense index space in CD order;
/// categorical values are stored as the bit-reinterpretation of their 32-bit
/// hash (see [`crate::ingest::hash`]).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    /// Factor values, length = factor count.
    pub factors: Vec<f32>,
    /// Precomputed prediction offsets, length = baseline count.
    pub baseline: Vec<f64>,
    /// Learning target.
    pub target: f32,
    /// Sample weight, 1.0 unless a Weight column is present.
    pub weight: f32,
    /// Document id, possibly empty.
    pub id: String,
}

impl Document {
    /// Create a default-initialized document with the pool's factor and
    /// baseline arity.
    pub fn with_shape(factor_count: usize, baseline_count: usize) -> Self {
        Document {
            factors: vec![0.0; factor_count],
            baseline: vec![0.0; baseline_count],
            target: 0.0,
            weight: 1.0,
            id: String::new(),
        }
    }
}

/// Ordered (winner, loser) relation between two documents, used by pairwise
/// losses. Both fields are document indices into [`Pool::docs`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pair {
    pub winner_id: usize,
    pub loser_id: usize,
}

impl Pair {
    pub fn new(winner_id: usize, loser_id: usize) -> Self {
        Pair {
            winner_id,
            loser_id,
        }
    }
}

/// The fully parsed training dataset.
#[derive(Clone, Debug, Default)]
pub struct Pool {
    /// Documents in physical row order of the input file.
    pub docs: Vec<Document>,
    /// Factor indices that hold categorical values, ascending.
    pub cat_features: Vec<usize>,
    /// Feature ids in factor order; empty when neither a header nor CD ids
    /// were supplied.
    pub feature_ids: Vec<String>,
    /// Auxiliary winner/loser pairs.
    pub pairs: Vec<Pair>,
    /// Original string for every categorical hash that appears in any
    /// document.
    pub cat_hash_to_string: HashMap<i32, String>,
}

impl Pool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Pool::default()
    }

    /// Number of documents.
    #[inline]
    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    /// Number of factors per document (0 for an empty pool).
    #[inline]
    pub fn factor_count(&self) -> usize {
        self.docs.first().map_or(0, |d| d.factors.len())
    }

    /// Target values in document order.
    pub fn targets(&self) -> Vec<f32> {
        self.docs.iter().map(|d| d.target).collect()
    }
}

/// Derive the class count from integer-valued class labels.
///
/// When `specified` is zero the count is `max_label + 1`; otherwise it is
/// `specified`, and every label must lie in `0..specified`.
pub fn classes_count(targets: &[f32], specified: usize) -> Result<usize, PoolError> {
    let max_class = targets
        .iter()
        .fold(f32::MIN, |acc, &t| acc.max(t)) as usize;
    if specified == 0 {
        Ok(max_class + 1)
    } else if max_class < specified {
        Ok(specified)
    } else {
        Err(PoolError::Schema(format!(
            "class label {} is outside 0..{}",
            max_class, specified
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_with_shape_defaults() {
        let doc = Document::with_shape(3, 2);
        assert_eq!(doc.factors, vec![0.0; 3]);
        assert_eq!(doc.baseline, vec![0.0; 2]);
        assert_eq!(doc.weight, 1.0);
        assert!(doc.id.is_empty());
    }

    #[test]
    fn pool_factor_count() {
        let mut pool = Pool::new();
        assert_eq!(pool.factor_count(), 0);
        pool.docs.push(Document::with_shape(4, 0));
        assert_eq!(pool.factor_count(), 4);
        assert_eq!(pool.doc_count(), 1);
    }

    #[test]
    fn classes_count_unspecified() {
        assert_eq!(classes_count(&[0.0, 2.0, 1.0], 0).unwrap(), 3);
        assert_eq!(classes_count(&[0.0], 0).unwrap(), 1);
    }

    #[test]
    fn classes_count_specified() {
        assert_eq!(classes_count(&[0.0, 1.0], 4).unwrap(), 4);
        assert!(classes_count(&[0.0, 4.0], 4).is_err());
    }
}
