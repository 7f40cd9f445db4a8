//! Column description (CD) schema for pool files.
//!
//! A CD file declares the type (and optional id) of each physical column of
//! the pool file, one `index<TAB>type[<TAB>id]` line per column. Columns not
//! mentioned default to `Num`. Without a CD file, column 0 is the target and
//! every other column is numeric.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::PoolError;

/// Physical column classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Numeric factor.
    Num,
    /// Categorical factor (hashed).
    Categ,
    /// Learning target.
    Target,
    /// Sample weight.
    Weight,
    /// Prediction offset; one column per baseline dimension.
    Baseline,
    /// Document id.
    DocId,
    /// Query id, accepted and ignored.
    QueryId,
    /// Ignored column.
    Auxiliary,
}

impl ColumnType {
    /// Whether this column contributes a factor to every document.
    #[inline]
    pub fn is_factor(self) -> bool {
        matches!(self, ColumnType::Num | ColumnType::Categ)
    }
}

impl FromStr for ColumnType {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, PoolError> {
        match s {
            "Num" => Ok(ColumnType::Num),
            "Categ" => Ok(ColumnType::Categ),
            "Target" => Ok(ColumnType::Target),
            "Weight" => Ok(ColumnType::Weight),
            "Baseline" => Ok(ColumnType::Baseline),
            "DocId" => Ok(ColumnType::DocId),
            "QueryId" => Ok(ColumnType::QueryId),
            "Auxiliary" => Ok(ColumnType::Auxiliary),
            other => Err(PoolError::Schema(format!(
                "unknown column type '{}'",
                other
            ))),
        }
    }
}

/// One schema entry: column type plus optional id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub kind: ColumnType,
    pub id: String,
}

impl Column {
    pub fn new(kind: ColumnType) -> Self {
        Column {
            kind,
            id: String::new(),
        }
    }
}

/// Pool shape derived from the column description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolMetaInfo {
    pub factor_count: usize,
    pub baseline_count: usize,
    /// Factor indices (not column indices) of categorical columns, ascending.
    pub cat_feature_ids: Vec<usize>,
    pub has_weights: bool,
    pub has_doc_ids: bool,
    pub has_query_ids: bool,
}

impl PoolMetaInfo {
    /// Classify and validate a column sequence.
    ///
    /// The factor index assigned to a factor column is the running count of
    /// factor columns seen before it. Fails when a singleton column type
    /// (Target, Weight, DocId, QueryId) appears more than once or when no
    /// factor column exists.
    pub fn from_columns(columns: &[Column]) -> Result<Self, PoolError> {
        let mut meta = PoolMetaInfo::default();
        let mut targets = 0usize;
        let mut weights = 0usize;
        let mut doc_ids = 0usize;
        let mut query_ids = 0usize;

        for column in columns {
            match column.kind {
                ColumnType::Num => meta.factor_count += 1,
                ColumnType::Categ => {
                    meta.cat_feature_ids.push(meta.factor_count);
                    meta.factor_count += 1;
                }
                ColumnType::Target => targets += 1,
                ColumnType::Weight => weights += 1,
                ColumnType::Baseline => meta.baseline_count += 1,
                ColumnType::DocId => doc_ids += 1,
                ColumnType::QueryId => query_ids += 1,
                ColumnType::Auxiliary => {}
            }
        }

        if targets > 1 {
            return Err(PoolError::Schema("too many Target columns".into()));
        }
        if weights > 1 {
            return Err(PoolError::Schema("too many Weight columns".into()));
        }
        if doc_ids > 1 {
            return Err(PoolError::Schema("too many DocId columns".into()));
        }
        if query_ids > 1 {
            return Err(PoolError::Schema("too many QueryId columns".into()));
        }
        if meta.factor_count == 0 {
            return Err(PoolError::Schema(
                "pool should have at least one factor".into(),
            ));
        }

        meta.has_weights = weights == 1;
        meta.has_doc_ids = doc_ids == 1;
        meta.has_query_ids = query_ids == 1;
        Ok(meta)
    }
}

/// The schema used when no CD file is supplied: column 0 is the target,
/// every other column a numeric factor.
pub fn default_columns(column_count: usize) -> Vec<Column> {
    let mut columns = vec![Column::new(ColumnType::Num); column_count];
    if let Some(first) = columns.first_mut() {
        first.kind = ColumnType::Target;
    }
    columns
}

/// Read a CD file describing `column_count` physical columns.
///
/// Empty lines are skipped; column indices out of range and malformed lines
/// are schema errors. Columns the file does not mention stay `Num`.
pub fn read_cd(path: &Path, column_count: usize) -> Result<Vec<Column>, PoolError> {
    let content = fs::read_to_string(path).map_err(|e| PoolError::io(path, e))?;
    let mut columns = vec![Column::new(ColumnType::Num); column_count];

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut tokens = line.split('\t');
        let index_token = tokens.next().unwrap_or_default();
        let index: usize = index_token.trim().parse().map_err(|_| {
            PoolError::Schema(format!("bad column index '{}'", index_token))
        })?;
        if index >= column_count {
            return Err(PoolError::Schema(format!(
                "column index {} is outside the pool's {} columns",
                index, column_count
            )));
        }
        let kind_token = tokens
            .next()
            .ok_or_else(|| PoolError::Schema(format!("missing column type in '{}'", line)))?;
        columns[index].kind = kind_token.trim().parse()?;
        if let Some(id) = tokens.next() {
            columns[index].id = id.trim().to_string();
        }
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cd_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn default_schema_targets_first_column() {
        let columns = default_columns(3);
        assert_eq!(columns[0].kind, ColumnType::Target);
        assert_eq!(columns[1].kind, ColumnType::Num);
        assert_eq!(columns[2].kind, ColumnType::Num);
    }

    #[test]
    fn factor_indices_skip_non_factor_columns() {
        let columns = vec![
            Column::new(ColumnType::Target),
            Column::new(ColumnType::Num),
            Column::new(ColumnType::Categ),
            Column::new(ColumnType::Weight),
            Column::new(ColumnType::Categ),
        ];
        let meta = PoolMetaInfo::from_columns(&columns).unwrap();
        assert_eq!(meta.factor_count, 3);
        assert_eq!(meta.cat_feature_ids, vec![1, 2]);
        assert!(meta.has_weights);
        assert!(!meta.has_doc_ids);
    }

    #[test]
    fn rejects_duplicate_target() {
        let columns = vec![
            Column::new(ColumnType::Target),
            Column::new(ColumnType::Target),
            Column::new(ColumnType::Num),
        ];
        assert!(matches!(
            PoolMetaInfo::from_columns(&columns),
            Err(PoolError::Schema(_))
        ));
    }

    #[test]
    fn rejects_zero_factors() {
        let columns = vec![Column::new(ColumnType::Target)];
        assert!(PoolMetaInfo::from_columns(&columns).is_err());
    }

    #[test]
    fn read_cd_applies_types_and_ids() {
        let file = cd_file("0\tTarget\n2\tCateg\tcolor\n");
        let columns = read_cd(file.path(), 3).unwrap();
        assert_eq!(columns[0].kind, ColumnType::Target);
        assert_eq!(columns[1].kind, ColumnType::Num);
        assert_eq!(columns[2].kind, ColumnType::Categ);
        assert_eq!(columns[2].id, "color");
    }

    #[test]
    fn read_cd_rejects_unknown_type() {
        let file = cd_file("0\tLabel\n");
        assert!(matches!(
            read_cd(file.path(), 2),
            Err(PoolError::Schema(_))
        ));
    }

    #[test]
    fn read_cd_rejects_out_of_range_index() {
        let file = cd_file("5\tNum\n");
        assert!(read_cd(file.path(), 2).is_err());
    }
}
