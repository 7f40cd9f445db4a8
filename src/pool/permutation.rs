//! In-place document reordering.
//!
//! [`apply_permutation`] reorders [`Pool::docs`] by cycle decomposition
//! (O(n) swaps, O(n) scratch for the working copy of the permutation) and
//! then rewrites the pair ids so they keep naming the same documents.

use crate::error::PoolError;
use crate::pool::Pool;

/// Reorder `pool.docs` in place so that position `i` receives the document
/// previously at `permutation[i]`, then rewrite every pair id through the
/// permutation.
///
/// Pair rewriting happens after all document swaps: a pair `(w, l)` becomes
/// `(permutation[w], permutation[l])`.
pub fn apply_permutation(permutation: &[usize], pool: &mut Pool) -> Result<(), PoolError> {
    if permutation.len() != pool.docs.len() {
        return Err(PoolError::Permutation(format!(
            "length {} does not match document count {}",
            permutation.len(),
            pool.docs.len()
        )));
    }
    validate_permutation(permutation)?;

    // Cycle decomposition scatters by its working copy; scattering by the
    // inverse places docs[i] = old[permutation[i]].
    let mut to_indices = invert_permutation(permutation);
    for i in 0..to_indices.len() {
        while to_indices[i] != i {
            let destination = to_indices[i];
            pool.docs.swap(i, destination);
            to_indices.swap(i, destination);
        }
    }

    for pair in &mut pool.pairs {
        pair.winner_id = permutation[pair.winner_id];
        pair.loser_id = permutation[pair.loser_id];
    }
    Ok(())
}

/// Invert a permutation by scatter: `result[permutation[i]] = i`.
pub fn invert_permutation(permutation: &[usize]) -> Vec<usize> {
    let mut result = vec![0; permutation.len()];
    for (i, &p) in permutation.iter().enumerate() {
        result[p] = i;
    }
    result
}

fn validate_permutation(permutation: &[usize]) -> Result<(), PoolError> {
    let mut seen = vec![false; permutation.len()];
    for &p in permutation {
        if p >= permutation.len() || seen[p] {
            return Err(PoolError::Permutation(format!(
                "index {} is out of range or repeated",
                p
            )));
        }
        seen[p] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Document, Pair};

    fn doc(target: f32) -> Document {
        Document {
            target,
            ..Document::with_shape(1, 0)
        }
    }

    fn pool_with_targets(targets: &[f32]) -> Pool {
        Pool {
            docs: targets.iter().map(|&t| doc(t)).collect(),
            ..Pool::default()
        }
    }

    #[test]
    fn reorders_documents() {
        let mut pool = pool_with_targets(&[0.0, 1.0, 2.0, 3.0]);
        apply_permutation(&[2, 0, 3, 1], &mut pool).unwrap();
        let targets = pool.targets();
        assert_eq!(targets, vec![2.0, 0.0, 3.0, 1.0]);
    }

    #[test]
    fn rewrites_pair_ids() {
        let mut pool = pool_with_targets(&[0.0, 1.0, 2.0, 3.0]);
        pool.pairs.push(Pair::new(0, 3));
        apply_permutation(&[2, 0, 3, 1], &mut pool).unwrap();
        assert_eq!(pool.pairs[0], Pair::new(2, 1));
    }

    #[test]
    fn identity_is_noop() {
        let mut pool = pool_with_targets(&[5.0, 6.0]);
        apply_permutation(&[0, 1], &mut pool).unwrap();
        assert_eq!(pool.targets(), vec![5.0, 6.0]);
    }

    #[test]
    fn invert_twice_is_identity() {
        let perm = vec![3, 1, 4, 0, 2];
        assert_eq!(invert_permutation(&invert_permutation(&perm)), perm);
    }

    #[test]
    fn apply_then_inverse_restores_pool() {
        let mut pool = pool_with_targets(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        pool.pairs.push(Pair::new(1, 4));
        let original = pool.clone();

        let perm = vec![2, 0, 3, 1, 4];
        apply_permutation(&perm, &mut pool).unwrap();
        apply_permutation(&invert_permutation(&perm), &mut pool).unwrap();

        assert_eq!(pool.targets(), original.targets());
        assert_eq!(pool.pairs, original.pairs);
    }

    #[test]
    fn rejects_wrong_length() {
        let mut pool = pool_with_targets(&[0.0, 1.0]);
        assert!(apply_permutation(&[0], &mut pool).is_err());
    }

    #[test]
    fn rejects_repeated_index() {
        let mut pool = pool_with_targets(&[0.0, 1.0, 2.0]);
        assert!(apply_permutation(&[0, 0, 2], &mut pool).is_err());
    }
}
