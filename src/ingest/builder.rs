//! Typed row-assembly sink.
//!
//! [`PoolSink`] is the capability contract between the block parser and
//! whatever owns the parsed rows; [`PoolBuilder`] is the default sink and
//! fills a caller-owned [`Pool`]. Alternative sinks (validating, streaming)
//! compose by delegation.
//!
//! # Concurrency contract
//!
//! `start`, `start_next_block`, `set_feature_ids`, `set_pairs` and `finish`
//! are single-threaded (`&mut self`). After `start_next_block(n)` the `n`
//! row slots of the block may be filled concurrently through the `&self`
//! `add_*` operations, provided no two threads use the same `local_idx`.
//! All writes of a block happen-before the next `start_next_block` via the
//! parser's block barrier.

use std::collections::HashMap;
use std::ptr;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::error::PoolError;
use crate::ingest::hash::{cat_feature_hash, cat_hash_to_float};
use crate::pool::{Document, Pair, Pool};
use crate::schema::PoolMetaInfo;

/// Sink for typed field events emitted by the block parser.
///
/// Events for one row arrive with the row's block-local index; rows of a
/// block may be produced by distinct threads, each owning its `local_idx`
/// exclusively.
pub trait PoolSink {
    /// Reset the sink for a new pool with the given shape.
    fn start(&mut self, meta: &PoolMetaInfo);

    /// Open a block of `block_size` default-initialized rows.
    fn start_next_block(&mut self, block_size: usize);

    /// Store a categorical factor token (hashed) for a row of the block.
    fn add_cat_feature(&self, local_idx: usize, factor_idx: usize, token: &str);

    /// Store a numeric factor value for a row of the block.
    fn add_float_feature(&self, local_idx: usize, factor_idx: usize, value: f32);

    fn add_target(&self, local_idx: usize, value: f32);

    fn add_weight(&self, local_idx: usize, value: f32);

    /// Store one baseline dimension; `offset` is the baseline sub-index
    /// within the row.
    fn add_baseline(&self, local_idx: usize, offset: usize, value: f64);

    fn add_doc_id(&self, local_idx: usize, token: &str);

    /// Query ids are accepted and discarded.
    fn add_query_id(&self, _local_idx: usize, _token: &str) {}

    /// Set feature ids; their count must equal the factor count.
    fn set_feature_ids(&mut self, ids: Vec<String>) -> Result<(), PoolError>;

    /// Replace the auxiliary pairs relation.
    fn set_pairs(&mut self, pairs: Vec<Pair>);

    /// Number of rows committed so far.
    fn doc_count(&self) -> usize;

    /// Finalize after the last block.
    fn finish(&mut self);
}

// =============================================================================
// Categorical hash shard table
// =============================================================================

const SHARD_COUNT: usize = 256;

/// Sharded hash-to-string table for concurrent categorical insertion.
///
/// Parser threads of one block insert concurrently; a single map would
/// serialize them, so the keyspace is split into 256 independently locked
/// shards selected by the low byte of the hash.
struct CatHashShards {
    shards: Vec<Mutex<HashMap<i32, String>>>,
}

impl CatHashShards {
    fn new() -> Self {
        CatHashShards {
            shards: (0..SHARD_COUNT)
                .map(|_| Mutex::new(HashMap::new()))
                .collect(),
        }
    }

    fn insert_if_absent(&self, hash: i32, token: &str) {
        let mut shard = self.shards[(hash & 0xff) as usize].lock();
        shard
            .entry(hash)
            .or_insert_with(|| token.to_string());
    }

    /// Union all shard maps into `target`.
    fn drain_into(&mut self, target: &mut HashMap<i32, String>) {
        for shard in &mut self.shards {
            target.extend(shard.get_mut().drain());
        }
    }
}

// =============================================================================
// PoolBuilder
// =============================================================================

/// The default sink: assembles documents directly into a borrowed [`Pool`].
///
/// The builder borrows the pool exclusively for its lifetime; the caller
/// owns the pool and reads it back once ingestion returns.
pub struct PoolBuilder<'a> {
    pool: &'a mut Pool,
    factor_count: usize,
    baseline_count: usize,
    cursor: usize,
    block: *mut Document,
    block_len: usize,
    hash_shards: CatHashShards,
}

// SAFETY: the raw block pointer is only dereferenced by the `add_*`
// operations, and the PoolSink contract guarantees each `local_idx` slot is
// written by at most one thread per block; the shard table is internally
// locked. All `&mut self` operations are single-threaded by construction.
unsafe impl Send for PoolBuilder<'_> {}
unsafe impl Sync for PoolBuilder<'_> {}

impl<'a> PoolBuilder<'a> {
    pub fn new(pool: &'a mut Pool) -> Self {
        PoolBuilder {
            pool,
            factor_count: 0,
            baseline_count: 0,
            cursor: 0,
            block: ptr::null_mut(),
            block_len: 0,
            hash_shards: CatHashShards::new(),
        }
    }

    #[inline]
    fn slot(&self, local_idx: usize) -> *mut Document {
        debug_assert!(local_idx < self.block_len, "row index outside open block");
        // SAFETY: `block` points at the `block_len` rows appended by the
        // last `start_next_block`, which outlive the block.
        unsafe { self.block.add(local_idx) }
    }
}

impl PoolSink for PoolBuilder<'_> {
    fn start(&mut self, meta: &PoolMetaInfo) {
        if meta.has_query_ids {
            warn!("query ids are not supported and will be ignored");
        }
        *self.pool = Pool::new();
        self.pool.cat_features = meta.cat_feature_ids.clone();
        self.factor_count = meta.factor_count;
        self.baseline_count = meta.baseline_count;
        self.cursor = 0;
        self.block = ptr::null_mut();
        self.block_len = 0;
    }

    fn start_next_block(&mut self, block_size: usize) {
        let (factor_count, baseline_count) = (self.factor_count, self.baseline_count);
        self.cursor = self.pool.docs.len();
        self.pool.docs.extend(
            std::iter::repeat_with(|| Document::with_shape(factor_count, baseline_count))
                .take(block_size),
        );
        self.block = self.pool.docs[self.cursor..].as_mut_ptr();
        self.block_len = block_size;
    }

    fn add_cat_feature(&self, local_idx: usize, factor_idx: usize, token: &str) {
        let hash = cat_feature_hash(token);
        self.hash_shards.insert_if_absent(hash, token);
        self.add_float_feature(local_idx, factor_idx, cat_hash_to_float(hash));
    }

    fn add_float_feature(&self, local_idx: usize, factor_idx: usize, value: f32) {
        // SAFETY: `local_idx` slots are disjoint per the PoolSink contract.
        let doc = unsafe { &mut *self.slot(local_idx) };
        doc.factors[factor_idx] = value;
    }

    fn add_target(&self, local_idx: usize, value: f32) {
        // SAFETY: as in add_float_feature.
        let doc = unsafe { &mut *self.slot(local_idx) };
        doc.target = value;
    }

    fn add_weight(&self, local_idx: usize, value: f32) {
        // SAFETY: as in add_float_feature.
        let doc = unsafe { &mut *self.slot(local_idx) };
        doc.weight = value;
    }

    fn add_baseline(&self, local_idx: usize, offset: usize, value: f64) {
        // SAFETY: as in add_float_feature.
        let doc = unsafe { &mut *self.slot(local_idx) };
        doc.baseline[offset] = value;
    }

    fn add_doc_id(&self, local_idx: usize, token: &str) {
        // SAFETY: as in add_float_feature.
        let doc = unsafe { &mut *self.slot(local_idx) };
        doc.id = token.to_string();
    }

    fn set_feature_ids(&mut self, ids: Vec<String>) -> Result<(), PoolError> {
        if ids.len() != self.factor_count {
            return Err(PoolError::Schema(format!(
                "feature ids size {} should be equal to factor count {}",
                ids.len(),
                self.factor_count
            )));
        }
        self.pool.feature_ids = ids;
        Ok(())
    }

    fn set_pairs(&mut self, pairs: Vec<Pair>) {
        self.pool.pairs = pairs;
    }

    fn doc_count(&self) -> usize {
        self.pool.docs.len()
    }

    fn finish(&mut self) {
        if self.pool.docs.is_empty() {
            error!("no documents loaded");
            return;
        }
        self.hash_shards
            .drain_into(&mut self.pool.cat_hash_to_string);
        info!(
            docs = self.pool.docs.len(),
            factors = self.factor_count,
            "pool loaded"
        );
    }
}
