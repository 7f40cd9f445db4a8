//! Shared error type for pool ingestion and border generation.

use std::io;
use std::path::PathBuf;

/// Errors surfaced by pool ingestion, permutation, and border generation.
///
/// Errors are synchronous: ingestion never returns a partial pool, and the
/// first failing row of a parallel block wins after the block barrier.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid options: {0}")]
    Options(&'static str),

    #[error("invalid column description: {0}")]
    Schema(String),

    #[error("wrong column count in row {row}: expected {expected}, found {found}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("cannot parse '{token}' in row {row}, column {column}: {reason}")]
    Parse {
        row: usize,
        column: usize,
        token: String,
        reason: &'static str,
    },

    #[error("unknown class name '{0}'")]
    Target(String),

    #[error("invalid pairs row {row}: {reason}")]
    Pairs { row: usize, reason: String },

    #[error("invalid permutation: {0}")]
    Permutation(String),

    #[error("border generation needs {need_mib} MiB of memory")]
    Memory { need_mib: u64 },

    #[error("there are nan factor values and nan mode is Forbidden")]
    Nan,
}

impl PoolError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PoolError::Io {
            path: path.into(),
            source,
        }
    }
}
