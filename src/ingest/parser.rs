//! Per-line tokenization and typed dispatch.
//!
//! Each line of a block is split on the field delimiter, validated against
//! the column description, converted, and emitted to the sink as typed
//! field events. Lines of one block are independent and parse in parallel;
//! the caller opens the block on the sink before parsing begins and the
//! parallel map is the block barrier.

use crate::error::PoolError;
use crate::ingest::builder::PoolSink;
use crate::schema::{Column, ColumnType};
use crate::utils::Parallelism;

// =============================================================================
// Target conversion
// =============================================================================

/// Converts target tokens to floats.
///
/// With an empty class list every target parses as a float; otherwise the
/// target is looked up in the class list and its position is the value.
#[derive(Clone, Debug, Default)]
pub struct TargetConverter {
    class_names: Vec<String>,
}

/// Why a target token failed to convert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetConvertError {
    UnknownClass,
    NotFloat,
}

impl TargetConverter {
    pub fn new(class_names: Vec<String>) -> Self {
        TargetConverter { class_names }
    }

    pub fn convert(&self, token: &str) -> Result<f32, TargetConvertError> {
        if self.class_names.is_empty() {
            parse_float_token(token).ok_or(TargetConvertError::NotFloat)
        } else {
            self.class_names
                .iter()
                .position(|name| name == token)
                .map(|index| index as f32)
                .ok_or(TargetConvertError::UnknownClass)
        }
    }
}

// =============================================================================
// Block parsing
// =============================================================================

/// Parse every line of an open block and emit field events to `sink`.
///
/// `first_row` is the 1-based file row of `lines[0]` (header included).
/// The first failing row in file order wins; later workers may complete
/// before the error surfaces at the barrier.
pub(crate) fn parse_block<B: PoolSink + Sync>(
    lines: &[String],
    columns: &[Column],
    delimiter: char,
    converter: &TargetConverter,
    first_row: usize,
    sink: &B,
    parallelism: Parallelism,
) -> Result<(), PoolError> {
    let errors = parallelism.maybe_par_map(0..lines.len(), |line_idx| {
        parse_line(
            &lines[line_idx],
            columns,
            delimiter,
            converter,
            first_row + line_idx,
            line_idx,
            sink,
        )
        .err()
    });
    match errors.into_iter().flatten().next() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn parse_line<B: PoolSink>(
    line: &str,
    columns: &[Column],
    delimiter: char,
    converter: &TargetConverter,
    row: usize,
    local_idx: usize,
    sink: &B,
) -> Result<(), PoolError> {
    let tokens: Vec<&str> = line.split(delimiter).collect();
    if tokens.len() != columns.len() {
        return Err(PoolError::ColumnCount {
            row,
            expected: columns.len(),
            found: tokens.len(),
        });
    }

    let mut factor_idx = 0;
    let mut baseline_idx = 0;
    for (column_idx, (&token, column)) in tokens.iter().zip(columns).enumerate() {
        let column_no = column_idx + 1;
        match column.kind {
            ColumnType::Categ => {
                sink.add_cat_feature(local_idx, factor_idx, token);
                factor_idx += 1;
            }
            ColumnType::Num => {
                reject_empty(row, column_no, token)?;
                let value = match parse_float_token(token) {
                    Some(value) => value,
                    None if is_nan_token(token) => f32::NAN,
                    None => {
                        return Err(PoolError::Parse {
                            row,
                            column: column_no,
                            token: token.to_string(),
                            reason: "declared as numeric and cannot be parsed as float",
                        })
                    }
                };
                sink.add_float_feature(local_idx, factor_idx, value);
                factor_idx += 1;
            }
            ColumnType::Target => {
                reject_empty(row, column_no, token)?;
                let value = converter.convert(token).map_err(|e| match e {
                    TargetConvertError::UnknownClass => PoolError::Target(token.to_string()),
                    TargetConvertError::NotFloat => PoolError::Parse {
                        row,
                        column: column_no,
                        token: token.to_string(),
                        reason: "target cannot be parsed as float",
                    },
                })?;
                sink.add_target(local_idx, value);
            }
            ColumnType::Weight => {
                reject_empty(row, column_no, token)?;
                let value = parse_float_token(token).ok_or_else(|| PoolError::Parse {
                    row,
                    column: column_no,
                    token: token.to_string(),
                    reason: "weight cannot be parsed as float",
                })?;
                sink.add_weight(local_idx, value);
            }
            ColumnType::Baseline => {
                reject_empty(row, column_no, token)?;
                let value = parse_double_token(token).ok_or_else(|| PoolError::Parse {
                    row,
                    column: column_no,
                    token: token.to_string(),
                    reason: "baseline cannot be parsed as float",
                })?;
                sink.add_baseline(local_idx, baseline_idx, value);
                baseline_idx += 1;
            }
            ColumnType::DocId => {
                reject_empty(row, column_no, token)?;
                sink.add_doc_id(local_idx, token);
            }
            ColumnType::QueryId => {
                sink.add_query_id(local_idx, token);
            }
            ColumnType::Auxiliary => {}
        }
    }
    Ok(())
}

// Pool file numbers exclude the NaN and infinity spellings that the stock
// float parser accepts; the only NaN entry point is the exact
// `nan`/`NaN`/`NAN` literal set on Num columns.

fn parse_float_token(token: &str) -> Option<f32> {
    token.parse::<f32>().ok().filter(|value| value.is_finite())
}

fn parse_double_token(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn is_nan_token(token: &str) -> bool {
    matches!(token, "nan" | "NaN" | "NAN")
}

fn reject_empty(row: usize, column: usize, token: &str) -> Result<(), PoolError> {
    if token.is_empty() {
        return Err(PoolError::Parse {
            row,
            column,
            token: String::new(),
            reason: "empty values are not supported",
        });
    }
    Ok(())
}
