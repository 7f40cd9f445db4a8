//! Auxiliary winner/loser pairs.
//!
//! A pairs file holds one `winner loser` pair of document indices per line,
//! whitespace separated. The loader validates every index against the
//! document count of the freshly ingested pool.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::PoolError;
use crate::pool::Pair;

/// Read and validate a pairs file against `doc_count` documents.
pub fn read_pairs(path: &Path, doc_count: usize) -> Result<Vec<Pair>, PoolError> {
    let content = fs::read_to_string(path).map_err(|e| PoolError::io(path, e))?;
    let mut pairs = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line_idx + 1;
        let mut tokens = line.split_whitespace();
        let winner_id = parse_index(tokens.next(), row)?;
        let loser_id = parse_index(tokens.next(), row)?;
        if tokens.next().is_some() {
            return Err(PoolError::Pairs {
                row,
                reason: "expected exactly two document indices".into(),
            });
        }
        for id in [winner_id, loser_id] {
            if id >= doc_count {
                return Err(PoolError::Pairs {
                    row,
                    reason: format!("document index {} is outside 0..{}", id, doc_count),
                });
            }
        }
        pairs.push(Pair::new(winner_id, loser_id));
    }

    debug!(pairs = pairs.len(), "pairs loaded");
    Ok(pairs)
}

fn parse_index(token: Option<&str>, row: usize) -> Result<usize, PoolError> {
    let token = token.ok_or_else(|| PoolError::Pairs {
        row,
        reason: "expected exactly two document indices".into(),
    })?;
    token.parse().map_err(|_| PoolError::Pairs {
        row,
        reason: format!("'{}' is not a document index", token),
    })
}
