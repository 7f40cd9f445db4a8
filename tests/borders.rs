//! Border generation tests over ingested pools.

use std::io::Write;

use approx::assert_relative_eq;
use tempfile::NamedTempFile;

use poolers::borders::best_split::BorderSelectionType;
use poolers::{
    generate_borders, read_pool, run_with_threads, BorderOptions, NanMode, Parallelism, Pool,
    PoolError, PoolReadOptions,
};

fn ingest(cd: &str, content: &str) -> Pool {
    let mut pool_file = NamedTempFile::new().unwrap();
    pool_file.write_all(content.as_bytes()).unwrap();
    let mut cd_file = NamedTempFile::new().unwrap();
    cd_file.write_all(cd.as_bytes()).unwrap();

    let mut pool = Pool::new();
    read_pool(
        Some(cd_file.path()),
        pool_file.path(),
        None,
        &PoolReadOptions::default(),
        &mut pool,
    )
    .unwrap();
    pool
}

#[test]
fn nan_min_policy_prepends_lowest_float() {
    let pool = ingest("0\tTarget\n1\tNum\n", "0\t1.0\n0\tnan\n0\t2.0\n0\t3.0\n");
    let options = BorderOptions::builder()
        .border_count(2)
        .nan_mode(NanMode::Min)
        .build().unwrap();
    let borders = generate_borders(&pool, &options, Parallelism::Sequential).unwrap();

    assert_eq!(borders.len(), 1);
    assert!(borders[0].has_nans);
    assert_eq!(borders[0].thresholds[0], f32::MIN);
}

#[test]
fn nan_forbidden_policy_fails() {
    let pool = ingest("0\tTarget\n1\tNum\n", "0\t1.0\n0\tnan\n0\t2.0\n0\t3.0\n");
    let options = BorderOptions::builder()
        .border_count(2)
        .nan_mode(NanMode::Forbidden)
        .build().unwrap();
    let err = generate_borders(&pool, &options, Parallelism::Sequential).unwrap_err();
    assert!(matches!(err, PoolError::Nan));
}

#[test]
fn borders_follow_numeric_feature_order() {
    let pool = ingest(
        "0\tTarget\n1\tNum\n2\tCateg\n3\tNum\n",
        "0\t1.0\tred\t10.0\n0\t2.0\tblue\t20.0\n0\t3.0\tred\t30.0\n0\t4.0\tblue\t40.0\n",
    );
    let options = BorderOptions::builder().border_count(1).build().unwrap();
    let borders = generate_borders(&pool, &options, Parallelism::Sequential).unwrap();

    // Two numeric features; the categorical one is skipped.
    assert_eq!(borders.len(), 2);
    assert_relative_eq!(borders[0].thresholds[0], 2.5);
    assert_relative_eq!(borders[1].thresholds[0], 25.0);
}

#[test]
fn uniform_selection_spreads_the_range() {
    let pool = ingest("0\tTarget\n1\tNum\n", "0\t0.0\n0\t1.0\n0\t10.0\n");
    let options = BorderOptions::builder()
        .border_count(4)
        .selection(BorderSelectionType::Uniform)
        .build().unwrap();
    let borders = generate_borders(&pool, &options, Parallelism::Sequential).unwrap();
    assert_eq!(borders[0].thresholds, vec![2.0, 4.0, 6.0, 8.0]);
}

#[test]
fn thresholds_are_strictly_increasing_under_threads() {
    let mut content = String::new();
    for i in 0..500 {
        content.push_str(&format!(
            "0\t{}\t{}\t{}\n",
            (i % 23) as f32 * 0.5,
            (i % 3) as f32,
            if i % 10 == 0 { "nan".into() } else { format!("{}", i as f32) },
        ));
    }
    let pool = ingest("0\tTarget\n1\tNum\n2\tNum\n3\tNum\n", &content);

    let options = BorderOptions::builder()
        .border_count(16)
        .nan_mode(NanMode::Max)
        .build().unwrap();
    let borders = run_with_threads(4, |parallelism| {
        generate_borders(&pool, &options, parallelism)
    })
    .unwrap();

    assert_eq!(borders.len(), 3);
    assert!(borders[2].has_nans);
    for feature in &borders {
        for pair in feature.thresholds.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    let sequential = generate_borders(&pool, &options, Parallelism::Sequential).unwrap();
    assert_eq!(borders, sequential);
}

#[test]
fn single_document_pool_yields_sentinel_only_or_empty() {
    let pool = ingest("0\tTarget\n1\tNum\n", "0\t1.0\n");
    let options = BorderOptions::builder()
        .border_count(4)
        .nan_mode(NanMode::Min)
        .build().unwrap();
    let borders = generate_borders(&pool, &options, Parallelism::Sequential).unwrap();
    assert_eq!(borders.len(), 1);
    assert!(borders[0].thresholds.is_empty());
    assert!(!borders[0].has_nans);
}

#[test]
fn insufficient_memory_budget_is_reported_in_mib() {
    let pool = ingest("0\tTarget\n1\tNum\n", "0\t1.0\n0\t2.0\n");
    let options = BorderOptions::builder().used_ram_limit(1024).build().unwrap();
    let err = generate_borders(&pool, &options, Parallelism::Sequential).unwrap_err();
    match err {
        PoolError::Memory { need_mib } => assert!(need_mib > 0),
        other => panic!("unexpected error: {other:?}"),
    }
}
