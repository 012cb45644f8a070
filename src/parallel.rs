//! The parallel driver (§4.8): splits the search tree at one or more depths,
//! farms the resulting leaves out to a worker pool, and aggregates results
//! under a global cap with cooperative cancellation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::warn;

use crate::engine::{search, Cap, MaxDepth, Results, SearchOptions};
use crate::error::{HomError, HomResult};
use crate::graph::Graph;
use crate::partial::PartialMap;
use crate::stats::SearchStats;
use crate::symmetry::adjusted_prefix;

/// Configuration for [`find_homomorphisms_parallel`].
#[derive(Clone, Debug)]
pub struct ParallelOptions {
    pub cap: Cap,
    pub max_depth: MaxDepth,
    pub only_count: bool,
    pub sym_prefix: usize,
    pub retract: bool,
    /// The split-phase depth sequence, e.g. `[3]` or `[1, 2, 3]`. Each entry
    /// but the last is run single-threaded to generate the next generation
    /// of partial maps; the final stage dispatches one job per leaf to the
    /// worker pool.
    pub depths: Vec<usize>,
    /// Per-parent cap applied during the split phase. Guarded to a minimum
    /// of 1 regardless of caller input (see the source's `len(args)/100`
    /// reporting-modulus bug this crate avoids repeating).
    pub branchlimit: usize,
    /// Worker pool size. `None` uses
    /// [`std::thread::available_parallelism`].
    pub thread_count: Option<usize>,
}

/// The result of a parallel search.
#[derive(Clone, Debug)]
pub struct ParallelOutcome {
    pub results: Results,
    pub stats: SearchStats,
    /// `true` if the split phase hit `branchlimit` for any parent, meaning
    /// the search explored a sound but possibly incomplete subset of the
    /// tree.
    pub partial: bool,
}

struct WorkerOutcome {
    results: Results,
    stats: SearchStats,
}

/// Runs the split-and-dispatch search described in §4.8.
///
/// `g` is the source graph, `h` the target (equal to `g`, by reference, in
/// retract mode). `f0` is the initial partial map shared by every branch of
/// the split.
///
/// # Errors
/// Returns [`HomError::WorkerFailure`] if any final-stage worker panics —
/// fatal for the whole search, per §7.
pub fn find_homomorphisms_parallel(
    g: &Graph,
    h: &Graph,
    f0: &PartialMap,
    opts: &ParallelOptions,
) -> HomResult<ParallelOutcome> {
    let branchlimit = opts.branchlimit.max(1);
    let mut stats = SearchStats::new();
    let mut partial = false;

    let mut generation = vec![f0.clone()];

    if let Some((_last, split_depths)) = opts.depths.split_last() {
        for &d in split_depths {
            let mut next_gen = Vec::with_capacity(generation.len());
            for f in &generation {
                let sym_prefix = adjusted_prefix(opts.sym_prefix, f0.assigned_count(), f.assigned_count());
                let split_opts = SearchOptions {
                    cap: Cap::Limited(branchlimit),
                    max_depth: MaxDepth::Bounded(d),
                    only_count: false,
                    sym_prefix,
                    retract: opts.retract,
                    order: Vec::new(),
                };
                let (results, local_stats) = search(g, h, f, &split_opts, None);
                stats.merge(&local_stats);
                let maps = results
                    .into_maps()
                    .expect("split phase always runs with only_count = false");
                if maps.len() >= branchlimit {
                    partial = true;
                    warn!(depth = d, branchlimit, "branchlimit reached in split phase; results may be incomplete");
                }
                next_gen.extend(maps.iter().map(|snapshot| PartialMap::from_snapshot(snapshot)));
            }
            generation = next_gen;
        }
    }

    let outcome = dispatch_final_stage(g, h, f0, &generation, opts)?;
    stats.merge(&outcome.stats);

    Ok(ParallelOutcome {
        results: outcome.results,
        stats,
        partial,
    })
}

fn dispatch_final_stage(
    g: &Graph,
    h: &Graph,
    f0: &PartialMap,
    jobs: &[PartialMap],
    opts: &ParallelOptions,
) -> HomResult<WorkerOutcome> {
    let pool_size = opts
        .thread_count
        .unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
        .max(1)
        .min(jobs.len().max(1));

    let cancel = Arc::new(AtomicBool::new(false));
    let g = Arc::new(g.clone());
    let h = Arc::new(h.clone());
    let jobs = Arc::new(jobs.to_vec());
    let next_job = Arc::new(Mutex::new(0usize));
    let f0_size = f0.assigned_count();

    let (tx, rx) = mpsc::channel::<Option<WorkerOutcome>>();
    let mut handles = Vec::with_capacity(pool_size);

    for _ in 0..pool_size {
        let g = Arc::clone(&g);
        let h = Arc::clone(&h);
        let cancel = Arc::clone(&cancel);
        let next_job = Arc::clone(&next_job);
        let jobs = Arc::clone(&jobs);
        let tx = tx.clone();
        let template = SearchOptions {
            cap: opts.cap,
            max_depth: opts.max_depth,
            only_count: opts.only_count,
            sym_prefix: opts.sym_prefix,
            retract: opts.retract,
            order: Vec::new(),
        };

        handles.push(thread::spawn(move || loop {
            let idx = {
                let mut guard = next_job.lock().expect("job queue mutex poisoned");
                if *guard >= jobs.len() || cancel.load(Ordering::Relaxed) {
                    break;
                }
                let i = *guard;
                *guard += 1;
                i
            };

            let f = &jobs[idx];
            let sym_prefix = adjusted_prefix(template.sym_prefix, f0_size, f.assigned_count());
            let job_opts = SearchOptions {
                sym_prefix,
                ..template.clone()
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| search(&g, &h, f, &job_opts, Some(&*cancel))));
            let sent = match outcome {
                Ok((results, local_stats)) => tx.send(Some(WorkerOutcome { results, stats: local_stats })),
                Err(_) => tx.send(None),
            };
            if sent.is_err() {
                break;
            }
        }));
    }
    drop(tx);

    let mut stats = SearchStats::new();
    let mut count = 0usize;
    let mut maps: Vec<Vec<Option<usize>>> = Vec::new();
    let mut worker_failed = false;

    for received in rx {
        match received {
            None => {
                worker_failed = true;
                cancel.store(true, Ordering::Relaxed);
            }
            Some(WorkerOutcome { results, stats: local_stats }) => {
                stats.merge(&local_stats);
                match results {
                    Results::Count(n) => count += n,
                    Results::Maps(m) => {
                        count += m.len();
                        maps.extend(m);
                    }
                }
                if opts.cap.reached(count) {
                    stats.mark_cap_reached();
                    cancel.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    for handle in handles {
        let _ = handle.join();
    }

    if worker_failed {
        return Err(HomError::WorkerFailure);
    }

    let capped_count = match opts.cap {
        Cap::Unlimited => count,
        Cap::Limited(n) => count.min(n),
    };
    let results = if opts.only_count {
        Results::Count(capped_count)
    } else {
        maps.truncate(capped_count);
        Results::Maps(maps)
    };

    Ok(WorkerOutcome { results, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k_n(n: usize) -> Graph {
        let adj: Vec<Vec<usize>> = (0..n)
            .map(|v| (0..n).filter(|&u| u != v).collect())
            .collect();
        Graph::new(&adj).unwrap()
    }

    #[test]
    fn parallel_search_with_no_split_matches_sequential_count() {
        let k4 = k_n(4);
        let f0 = PartialMap::new(4);
        let opts = ParallelOptions {
            cap: Cap::Unlimited,
            max_depth: MaxDepth::Unbounded,
            only_count: true,
            sym_prefix: 0,
            retract: false,
            depths: vec![],
            branchlimit: 1000,
            thread_count: Some(2),
        };
        let outcome = find_homomorphisms_parallel(&k4, &k4, &f0, &opts).unwrap();
        assert_eq!(outcome.results.len(), 24);
        assert!(!outcome.partial);
    }

    #[test]
    fn parallel_search_with_a_split_depth_matches_sequential_count() {
        let k4 = k_n(4);
        let f0 = PartialMap::new(4);
        let opts = ParallelOptions {
            cap: Cap::Unlimited,
            max_depth: MaxDepth::Unbounded,
            only_count: true,
            sym_prefix: 0,
            retract: false,
            depths: vec![1],
            branchlimit: 1000,
            thread_count: Some(4),
        };
        let outcome = find_homomorphisms_parallel(&k4, &k4, &f0, &opts).unwrap();
        assert_eq!(outcome.results.len(), 24);
    }

    #[test]
    fn global_cap_is_respected_across_workers() {
        let k4 = k_n(4);
        let f0 = PartialMap::new(4);
        let opts = ParallelOptions {
            cap: Cap::Limited(5),
            max_depth: MaxDepth::Unbounded,
            only_count: true,
            sym_prefix: 0,
            retract: false,
            depths: vec![1],
            branchlimit: 1000,
            thread_count: Some(4),
        };
        let outcome = find_homomorphisms_parallel(&k4, &k4, &f0, &opts).unwrap();
        assert!(outcome.results.len() <= 5);
    }
}
