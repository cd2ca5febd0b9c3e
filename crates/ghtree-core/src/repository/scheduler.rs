//! Sequential or bounded-parallel execution of per-blob work.

use std::num::NonZeroUsize;

use rayon::prelude::*;

use crate::error::{BlobFailure, Error, Result};

/// How a collection of blobs is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One item at a time, in source order; stops at the first failure
    Sequential,
    /// A worker pool of at most `max_threads` threads (None = one per logical CPU)
    Parallel { max_threads: Option<NonZeroUsize> },
}

/// Pick a strategy from the caller's flags.
///
/// Supplying a thread count opts into parallelism even when `use_threads`
/// is false.
///
/// # Errors
///
/// Returns [`Error::InvalidWorkerCount`] for `max_threads == Some(0)`.
pub fn resolve_strategy(use_threads: bool, max_threads: Option<usize>) -> Result<Strategy> {
    match max_threads {
        Some(n) => {
            let max_threads = NonZeroUsize::new(n).ok_or(Error::InvalidWorkerCount)?;
            Ok(Strategy::Parallel {
                max_threads: Some(max_threads),
            })
        }
        None if use_threads => Ok(Strategy::Parallel { max_threads: None }),
        None => Ok(Strategy::Sequential),
    }
}

impl Strategy {
    /// Apply `op` to every item and return the results in item order.
    ///
    /// Sequential execution returns the first error as-is. Parallel execution
    /// lets every dispatched item finish and reports all failures together in
    /// [`Error::BatchFailed`], each labelled by `label`.
    pub fn execute<T, R, F, L>(self, items: &[T], label: L, op: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Sync,
        L: Fn(&T) -> String,
    {
        match self {
            Strategy::Sequential => {
                tracing::info!("Sequential downloading for {} blobs", items.len());
                items.iter().map(&op).collect()
            }
            Strategy::Parallel { max_threads } => {
                tracing::info!(
                    "Parallel downloading for {} blobs with {} workers",
                    items.len(),
                    max_threads.map_or_else(|| "default".to_string(), |n| n.to_string())
                );
                let pool = build_pool(max_threads)?;
                let results: Vec<Result<R>> =
                    pool.install(|| items.par_iter().map(&op).collect());

                let mut values = Vec::with_capacity(results.len());
                let mut failures = Vec::new();
                for (item, result) in items.iter().zip(results) {
                    match result {
                        Ok(value) => values.push(value),
                        Err(error) => failures.push(BlobFailure {
                            path: label(item),
                            error,
                        }),
                    }
                }

                if failures.is_empty() {
                    Ok(values)
                } else {
                    Err(Error::BatchFailed { failures })
                }
            }
        }
    }
}

fn build_pool(max_threads: Option<NonZeroUsize>) -> Result<rayon::ThreadPool> {
    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|i| format!("ghtree-download-{i}"));
    if let Some(n) = max_threads {
        builder = builder.num_threads(n.get());
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn resolve_defaults_to_sequential() {
        assert_eq!(resolve_strategy(false, None).unwrap(), Strategy::Sequential);
    }

    #[test]
    fn resolve_use_threads_without_count() {
        assert_eq!(
            resolve_strategy(true, None).unwrap(),
            Strategy::Parallel { max_threads: None }
        );
    }

    #[test]
    fn resolve_count_implies_parallel() {
        let expected = Strategy::Parallel {
            max_threads: NonZeroUsize::new(4),
        };
        assert_eq!(resolve_strategy(false, Some(4)).unwrap(), expected);
        assert_eq!(resolve_strategy(true, Some(4)).unwrap(), expected);
    }

    #[test]
    fn resolve_rejects_zero_workers() {
        assert!(matches!(
            resolve_strategy(false, Some(0)),
            Err(Error::InvalidWorkerCount)
        ));
    }

    #[test]
    fn sequential_preserves_order_and_stops_at_first_error() {
        let seen = Mutex::new(Vec::new());
        let items = [1, 2, 3, 4];

        let result = Strategy::Sequential.execute(
            &items,
            |i| i.to_string(),
            |i| {
                seen.lock().unwrap().push(*i);
                if *i == 3 {
                    Err(Error::InvalidWorkerCount)
                } else {
                    Ok(*i)
                }
            },
        );

        assert!(matches!(result, Err(Error::InvalidWorkerCount)));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn parallel_returns_results_in_item_order() {
        let items: Vec<usize> = (0..64).collect();
        let strategy = resolve_strategy(true, Some(8)).unwrap();

        let doubled = strategy
            .execute(&items, |i| i.to_string(), |i| Ok(i * 2))
            .unwrap();

        assert_eq!(doubled, items.iter().map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn parallel_runs_every_item_and_collects_all_failures() {
        let items: Vec<usize> = (0..20).collect();
        let calls = AtomicUsize::new(0);

        let result = resolve_strategy(false, Some(3)).unwrap().execute(
            &items,
            |i| format!("item-{i}"),
            |i| {
                calls.fetch_add(1, Ordering::SeqCst);
                if i % 5 == 0 {
                    Err(Error::InvalidWorkerCount)
                } else {
                    Ok(())
                }
            },
        );

        assert_eq!(calls.load(Ordering::SeqCst), items.len());
        match result {
            Err(Error::BatchFailed { failures }) => {
                let paths: HashSet<String> = failures.into_iter().map(|f| f.path).collect();
                let expected: HashSet<String> =
                    ["item-0", "item-5", "item-10", "item-15"].map(String::from).into();
                assert_eq!(paths, expected);
            }
            other => panic!("expected BatchFailed, got {other:?}"),
        }
    }

    #[test]
    fn parallel_respects_worker_bound() {
        let items: Vec<usize> = (0..32).collect();
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        resolve_strategy(true, Some(2))
            .unwrap()
            .execute(
                &items,
                |i| i.to_string(),
                |_| {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(2));
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                },
            )
            .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
