//! poolers: training-pool ingestion and feature binning for gradient
//! boosted decision trees.
//!
//! This crate is the data front end of a GBDT training pipeline. It turns a
//! delimited pool file (plus optional column description and pairs files)
//! into an in-memory [`Pool`], and computes per-feature split thresholds
//! ("borders") for histogram-based split search.
//!
//! # Key Types
//!
//! - [`Pool`] / [`Document`] / [`Pair`] - the parsed training dataset
//! - [`ingest::PoolReadOptions`] / [`ingest::read_pool`] - streaming ingestion
//! - [`ingest::PoolSink`] - the sink contract for custom row consumers
//! - [`borders::BorderOptions`] / [`borders::generate_borders`] - threshold
//!   generation with NaN policy and a memory budget
//! - [`pool::permutation`] - in-place document reordering
//!
//! # Ingestion
//!
//! ```no_run
//! use poolers::ingest::{read_pool, PoolReadOptions};
//! use poolers::Pool;
//! use std::path::Path;
//!
//! let options = PoolReadOptions::builder().thread_count(4).build()?;
//! let mut pool = Pool::new();
//! read_pool(
//!     Some(Path::new("train.cd")),
//!     Path::new("train.tsv"),
//!     None,
//!     &options,
//!     &mut pool,
//! )?;
//! # Ok::<(), poolers::PoolError>(())
//! ```

pub mod borders;
pub mod error;
pub mod ingest;
pub mod pool;
pub mod schema;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use error::PoolError;
pub use pool::{classes_count, Document, Pair, Pool};

pub use borders::{generate_borders, BorderOptions, FeatureBorders, NanMode};
pub use ingest::{read_pool, read_pool_with, PoolBuilder, PoolReadOptions, PoolSink};
pub use schema::{Column, ColumnType, PoolMetaInfo};

pub use utils::{run_with_threads, Parallelism};
