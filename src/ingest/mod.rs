//! Pool ingestion.
//!
//! [`read_pool`] drives the full pipeline: probe the column count, read the
//! column description, then stream the pool file block-by-block — the block
//! reader overlaps the next block's I/O with the current block's parallel
//! parse — into a [`PoolSink`]. After the last block the sink is finalized
//! and the optional pairs file is loaded and validated.
//!
//! Document order in the pool equals the physical row order of the input
//! file; blocks are committed sequentially with a barrier between them, and
//! lines within a block may parse in any order.

pub mod builder;
pub mod hash;
pub mod pairs;
pub mod parser;
mod reader;

pub use builder::{PoolBuilder, PoolSink};
pub use parser::{TargetConvertError, TargetConverter};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bon::Builder;
use tracing::{debug, info};

use crate::error::PoolError;
use crate::pool::Pool;
use crate::schema::{default_columns, read_cd, Column, PoolMetaInfo};
use crate::utils::{run_with_threads, Parallelism};
use reader::{trim_line_ending, BlockReader};

/// Ingestion options.
///
/// The builder validates at build time; a zero `thread_count` or
/// `block_size` is an error rather than a panic.
///
/// ```
/// use poolers::ingest::PoolReadOptions;
///
/// let options = PoolReadOptions::builder()
///     .thread_count(4)
///     .has_header(true)
///     .build()
///     .unwrap();
/// assert_eq!(options.block_size, 10_000);
///
/// assert!(PoolReadOptions::builder().thread_count(0).build().is_err());
/// ```
#[derive(Clone, Debug, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct PoolReadOptions {
    /// Worker threads; `1` makes every step synchronous.
    #[builder(default = 1)]
    pub thread_count: usize,
    /// Single-character field delimiter of the pool file.
    #[builder(default = '\t')]
    pub field_delimiter: char,
    /// Whether the first line is a header naming the columns.
    #[builder(default)]
    pub has_header: bool,
    /// Class names for the target; empty means a numeric target.
    #[builder(default)]
    pub class_names: Vec<String>,
    /// Lines per block.
    #[builder(default = 10_000)]
    pub block_size: usize,
    /// Log per-block progress at info level instead of debug.
    #[builder(default)]
    pub verbose: bool,
}

/// Custom finishing function that validates the options.
impl<S: pool_read_options_builder::IsComplete> PoolReadOptionsBuilder<S> {
    /// Build and validate the options.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Options`] when `thread_count` or `block_size`
    /// is zero.
    pub fn build(self) -> Result<PoolReadOptions, PoolError> {
        let options = self.__build_internal();
        options.validate()?;
        Ok(options)
    }
}

impl PoolReadOptions {
    fn validate(&self) -> Result<(), PoolError> {
        if self.thread_count == 0 {
            return Err(PoolError::Options("thread count must be positive"));
        }
        if self.block_size == 0 {
            return Err(PoolError::Options("block size must be positive"));
        }
        Ok(())
    }
}

impl Default for PoolReadOptions {
    fn default() -> Self {
        Self::builder().build().expect("default options are valid")
    }
}

/// Read a pool file into `pool`.
///
/// `cd_path` is the optional column description (without it, column 0 is
/// the target and the rest numeric factors); `pairs_path` the optional
/// winner/loser pairs file.
pub fn read_pool(
    cd_path: Option<&Path>,
    pool_path: &Path,
    pairs_path: Option<&Path>,
    options: &PoolReadOptions,
    pool: &mut Pool,
) -> Result<(), PoolError> {
    let mut builder = PoolBuilder::new(pool);
    read_pool_with(cd_path, pool_path, pairs_path, options, &mut builder)
}

/// Read a pool file into an arbitrary [`PoolSink`].
pub fn read_pool_with<B: PoolSink + Send + Sync>(
    cd_path: Option<&Path>,
    pool_path: &Path,
    pairs_path: Option<&Path>,
    options: &PoolReadOptions,
    sink: &mut B,
) -> Result<(), PoolError> {
    // Builder-constructed options are already valid; this covers options
    // assembled as struct literals.
    options.validate()?;

    let column_count = read_column_count(pool_path, options.field_delimiter)?;
    let columns = match cd_path {
        Some(path) => read_cd(path, column_count)?,
        None => default_columns(column_count),
    };
    let meta = PoolMetaInfo::from_columns(&columns)?;

    run_with_threads(options.thread_count, |parallelism| {
        ingest(
            pool_path,
            pairs_path,
            &columns,
            &meta,
            options,
            sink,
            parallelism,
        )
    })
}

fn ingest<B: PoolSink + Send + Sync>(
    pool_path: &Path,
    pairs_path: Option<&Path>,
    columns: &[Column],
    meta: &PoolMetaInfo,
    options: &PoolReadOptions,
    sink: &mut B,
    parallelism: Parallelism,
) -> Result<(), PoolError> {
    let file = File::open(pool_path).map_err(|e| PoolError::io(pool_path, e))?;
    let mut file_reader = BufReader::new(file);
    let mut lines_read = 0;

    let header_ids = if options.has_header {
        let mut line = String::new();
        file_reader
            .read_line(&mut line)
            .map_err(|e| PoolError::io(pool_path, e))?;
        trim_line_ending(&mut line);
        lines_read = 1;

        let tokens: Vec<&str> = line.split(options.field_delimiter).collect();
        if tokens.len() != columns.len() {
            return Err(PoolError::ColumnCount {
                row: 1,
                expected: columns.len(),
                found: tokens.len(),
            });
        }
        let ids = tokens
            .iter()
            .zip(columns)
            .filter(|(_, column)| column.kind.is_factor())
            .map(|(token, _)| token.to_string())
            .collect();
        Some(ids)
    } else {
        None
    };

    sink.start(meta);
    if let Some(ids) = header_ids {
        sink.set_feature_ids(ids)?;
    }

    let converter = TargetConverter::new(options.class_names.clone());
    let mut block_reader = BlockReader::new(
        file_reader,
        options.block_size,
        parallelism,
        pool_path.to_path_buf(),
    );

    while block_reader.read_block()? {
        let lines = block_reader.lines();
        sink.start_next_block(lines.len());
        parser::parse_block(
            lines,
            columns,
            options.field_delimiter,
            &converter,
            lines_read + 1,
            &*sink,
            parallelism,
        )?;
        lines_read += lines.len();
        if options.verbose {
            info!(rows = lines_read, "pool rows parsed");
        } else {
            debug!(rows = lines_read, "pool rows parsed");
        }
    }

    // Ids from the column description win over header-derived ids.
    if columns.iter().any(|column| !column.id.is_empty()) {
        let ids = columns
            .iter()
            .filter(|column| column.kind.is_factor())
            .map(|column| column.id.clone())
            .collect();
        sink.set_feature_ids(ids)?;
    }
    sink.finish();

    if let Some(pairs_path) = pairs_path {
        let pairs = pairs::read_pairs(pairs_path, sink.doc_count())?;
        sink.set_pairs(pairs);
    }
    Ok(())
}

fn read_column_count(path: &Path, delimiter: char) -> Result<usize, PoolError> {
    let file = File::open(path).map_err(|e| PoolError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let bytes = reader
        .read_line(&mut line)
        .map_err(|e| PoolError::io(path, e))?;
    if bytes == 0 {
        return Err(PoolError::Schema("pool file is empty".into()));
    }
    trim_line_ending(&mut line);
    Ok(line.split(delimiter).count())
}
