//! Per-feature split threshold generation.
//!
//! For every numeric factor (categorical factors are skipped) the generator
//! collects the non-NaN values, sorts them, and asks [`best_split`] for up
//! to `border_count` thresholds. Features are processed in memory-budgeted
//! batches: the degree of parallelism is sized so that the peak working
//! memory of concurrently running features stays within `used_ram_limit`,
//! and the Forbidden-NaN failure flag is checked once per batch rather than
//! per feature.

pub mod best_split;

use std::collections::HashSet;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};

use bon::Builder;
use tracing::{debug, info};

use crate::error::PoolError;
use crate::pool::{Document, Pool};
use crate::utils::Parallelism;
use best_split::{best_split, BorderSelectionType};

/// How NaN factor values participate in split search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NanMode {
    /// NaN values fail border generation.
    Forbidden,
    /// NaN sorts below every real value: prepend the lowest float border.
    #[default]
    Min,
    /// NaN sorts above every real value: append the highest float border.
    Max,
}

/// Border generation options.
///
/// The builder validates at build time; a zero `border_count` is an error
/// rather than a panic.
#[derive(Clone, Debug, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct BorderOptions {
    /// Border budget per feature.
    #[builder(default = 128)]
    pub border_count: usize,
    #[builder(default)]
    pub selection: BorderSelectionType,
    #[builder(default)]
    pub nan_mode: NanMode,
    /// Total-process memory budget in bytes used to size concurrency.
    #[builder(default = u64::MAX)]
    pub used_ram_limit: u64,
}

/// Custom finishing function that validates the options.
impl<S: border_options_builder::IsComplete> BorderOptionsBuilder<S> {
    /// Build and validate the options.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Options`] when `border_count` is zero.
    pub fn build(self) -> Result<BorderOptions, PoolError> {
        let options = self.__build_internal();
        options.validate()?;
        Ok(options)
    }
}

impl BorderOptions {
    fn validate(&self) -> Result<(), PoolError> {
        if self.border_count == 0 {
            return Err(PoolError::Options("border count must be at least 1"));
        }
        Ok(())
    }
}

impl Default for BorderOptions {
    fn default() -> Self {
        Self::builder().build().expect("default options are valid")
    }
}

/// Thresholds for one numeric feature.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureBorders {
    /// Strictly increasing split thresholds.
    pub thresholds: Vec<f32>,
    /// Whether any document held NaN for this feature.
    pub has_nans: bool,
}

/// Generate borders for every numeric feature of the pool.
///
/// Output order is numeric-feature order: factor order with categorical
/// indices removed. Fails with [`PoolError::Memory`] when the budget does
/// not fit a single feature computation and with [`PoolError::Nan`] when a
/// NaN is met under [`NanMode::Forbidden`].
pub fn generate_borders(
    pool: &Pool,
    options: &BorderOptions,
    parallelism: Parallelism,
) -> Result<Vec<FeatureBorders>, PoolError> {
    // Builder-constructed options are already valid; this covers options
    // assembled as struct literals.
    options.validate()?;

    let cat_features: HashSet<usize> = pool.cat_features.iter().copied().collect();
    let float_indexes: Vec<usize> = (0..pool.factor_count())
        .filter(|idx| !cat_features.contains(idx))
        .collect();
    if float_indexes.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = concurrency_budget(pool, float_indexes.len(), options)?;
    debug!(
        features = float_indexes.len(),
        batch_size, "sized border generation"
    );

    let nan_forbidden_hit = AtomicBool::new(false);
    let mut borders = Vec::with_capacity(float_indexes.len());
    for batch in float_indexes.chunks(batch_size) {
        let batch_borders = parallelism.maybe_par_map(0..batch.len(), |i| {
            one_feature_borders(pool, batch[i], options, &nan_forbidden_hit)
        });
        borders.extend(batch_borders);
        if nan_forbidden_hit.load(Ordering::Relaxed) {
            return Err(PoolError::Nan);
        }
    }

    info!("borders for float features generated");
    Ok(borders)
}

fn one_feature_borders(
    pool: &Pool,
    factor_idx: usize,
    options: &BorderOptions,
    nan_forbidden_hit: &AtomicBool,
) -> FeatureBorders {
    let mut values = Vec::with_capacity(pool.doc_count());
    let mut has_nans = false;
    for doc in &pool.docs {
        let value = doc.factors[factor_idx];
        if value.is_nan() {
            has_nans = true;
        } else {
            values.push(value);
        }
    }
    values.sort_by(f32::total_cmp);

    let mut thresholds = best_split(&values, options.border_count, options.selection);
    if has_nans {
        match options.nan_mode {
            NanMode::Min => thresholds.insert(0, f32::MIN),
            NanMode::Max => thresholds.push(f32::MAX),
            NanMode::Forbidden => nan_forbidden_hit.store(true, Ordering::Relaxed),
        }
    }
    FeatureBorders {
        thresholds,
        has_nans,
    }
}

// =============================================================================
// Memory-budgeted concurrency sizing
// =============================================================================

const BYTES_1M: u64 = 1024 * 1024;
const THREAD_STACK_BYTES: u64 = 2 * BYTES_1M;

/// How many features may run concurrently within the memory budget.
fn concurrency_budget(
    pool: &Pool,
    float_feature_count: usize,
    options: &BorderOptions,
) -> Result<usize, PoolError> {
    let n = pool.doc_count() as u64;
    let k = options.border_count as u64;
    let best_split_bytes = n * (4 + (k - 1) * 8 + 2 * 8 + 2 * 8 + 2 * 8);
    let collect_bytes = n * 4;
    let per_thread = THREAD_STACK_BYTES + collect_bytes + best_split_bytes;

    let used = resident_bytes(pool);
    let batch = options
        .used_ram_limit
        .checked_sub(used)
        .map_or(0, |available| available / per_thread)
        .min(float_feature_count as u64) as usize;

    if batch == 0 {
        return Err(PoolError::Memory {
            need_mib: (used + per_thread) / BYTES_1M + 1,
        });
    }
    Ok(batch)
}

/// Current resident-set size, falling back to the pool's own footprint when
/// the platform exposes no measurement.
fn resident_bytes(pool: &Pool) -> u64 {
    if let Some(stats) = memory_stats::memory_stats() {
        return stats.physical_mem as u64;
    }
    let baseline_count = pool.docs.first().map_or(0, |d| d.baseline.len());
    let per_doc = mem::size_of::<Document>()
        + pool.factor_count() * mem::size_of::<f32>()
        + baseline_count * mem::size_of::<f64>();
    (pool.doc_count() * per_doc) as u64
}
