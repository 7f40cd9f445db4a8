//! Parallelism configuration shared across ingestion and border generation.

use rayon::prelude::*;

/// Whether parallel execution is allowed.
///
/// Components don't manage thread pools; the pool is set up once at the
/// entry point via [`run_with_threads`] and components only respect this
/// flag. When `Sequential`, every operation runs on the caller thread and
/// produces output identical to the parallel path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics: `<= 1` = sequential, `> 1` = parallel.
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads <= 1 {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

/// Run a closure with the appropriate thread pool.
///
/// `n_threads <= 1` runs sequentially with no pool at all; `n > 1` installs
/// a scoped rayon pool with exactly `n` threads. The closure receives the
/// resulting [`Parallelism`] to thread through components.
#[inline]
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> T {
    let parallelism = Parallelism::from_threads(n_threads);

    match parallelism {
        Parallelism::Sequential => f(Parallelism::Sequential),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()
                .expect("failed to create thread pool");
            pool.install(|| f(Parallelism::Parallel))
        }
    }
}
