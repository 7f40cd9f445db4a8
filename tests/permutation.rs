//! Pool permutation tests.

use rand::seq::SliceRandom;
use rand::SeedableRng;

use poolers::pool::permutation::{apply_permutation, invert_permutation};
use poolers::{Document, Pair, Pool};

fn pool_of(ids: &[&str]) -> Pool {
    Pool {
        docs: ids
            .iter()
            .map(|id| Document {
                id: id.to_string(),
                ..Document::with_shape(1, 0)
            })
            .collect(),
        ..Pool::default()
    }
}

fn ids(pool: &Pool) -> Vec<String> {
    pool.docs.iter().map(|d| d.id.clone()).collect()
}

#[test]
fn reorder_with_pair_rewrite() {
    let mut pool = pool_of(&["A", "B", "C", "D"]);
    pool.pairs.push(Pair::new(0, 3));

    apply_permutation(&[2, 0, 3, 1], &mut pool).unwrap();

    assert_eq!(ids(&pool), vec!["C", "A", "D", "B"]);
    assert_eq!(pool.pairs[0], Pair::new(2, 1));
}

#[test]
fn invert_of_invert_is_identity() {
    let perm = vec![4, 2, 0, 1, 3];
    assert_eq!(invert_permutation(&invert_permutation(&perm)), perm);
}

#[test]
fn applying_permutation_then_inverse_restores_everything() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(17);
    let n = 64;

    let names: Vec<String> = (0..n).map(|i| format!("doc{}", i)).collect();
    let name_refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
    let mut pool = pool_of(&name_refs);
    pool.pairs.push(Pair::new(3, 40));
    pool.pairs.push(Pair::new(63, 0));
    let original = pool.clone();

    let mut perm: Vec<usize> = (0..n).collect();
    perm.shuffle(&mut rng);

    apply_permutation(&perm, &mut pool).unwrap();
    apply_permutation(&invert_permutation(&perm), &mut pool).unwrap();

    assert_eq!(ids(&pool), ids(&original));
    assert_eq!(pool.pairs, original.pairs);
}

#[test]
fn shuffled_pool_keeps_every_document() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(5);
    let names: Vec<String> = (0..31).map(|i| format!("doc{}", i)).collect();
    let name_refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
    let mut pool = pool_of(&name_refs);

    let mut perm: Vec<usize> = (0..31).collect();
    perm.shuffle(&mut rng);
    apply_permutation(&perm, &mut pool).unwrap();

    let mut seen = ids(&pool);
    seen.sort();
    let mut expected = names.clone();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn length_mismatch_is_rejected() {
    let mut pool = pool_of(&["A", "B"]);
    assert!(apply_permutation(&[0, 1, 2], &mut pool).is_err());
}

#[test]
fn non_permutation_is_rejected() {
    let mut pool = pool_of(&["A", "B", "C"]);
    assert!(apply_permutation(&[0, 1, 1], &mut pool).is_err());
    assert!(apply_permutation(&[0, 1, 5], &mut pool).is_err());
}
