//! Parallel hypercube-expansion scheduler.
//!
//! Models a growing axis-aligned hypercube centered at the origin. Each
//! outward step raises the half-side from the proven baseline B to a goal
//! G, and the new shell is cut into one thin slab per signed axis. Workers
//! claim slabs under a single mutex, then run the branch-and-bound search
//! outside the lock; the first worker to find a grid-code-zero point stops
//! the expansion, and every worker probing an equal-or-larger baseline is
//! told to abandon its slab through its own atomic flag. Workers probing a
//! smaller baseline are left running since they might pin a tighter bound.
//!
//! The scheduler thread waits on a condition variable so it can emit a
//! progress log block every [`PROGRESS_LOG_INTERVAL`] while the workers
//! grind, and notices the process-wide interrupt flag on every wake.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::grid_uniqueness::error::UniquenessError;
use crate::grid_uniqueness::geometry::PhaseModule;
use crate::grid_uniqueness::interrupt;
use crate::grid_uniqueness::search::find_grid_code_zero_recursive;

/// Growth factor applied to the hypercube half-side after each full shell.
const EXPANSION_GROWTH_FACTOR: f64 = 1.01;

/// Cadence of the scheduler's progress log.
const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Expansion bookkeeping, guarded by the one scheduler mutex.
struct ExpansionState {
    /// Half-side of the hypercube already proven free of grid code zero.
    /// Monotonically non-decreasing.
    baseline_radius: f64,
    /// Half-side of the hypercube currently being probed. Always above the
    /// baseline.
    expansion_radius_goal: f64,
    /// Per axis, the radius up to which that axis has been probed under the
    /// current goal.
    expansion_progress: Vec<f64>,
    /// Axis and sign of the next slab to hand out.
    expanding_dim: usize,
    positive_expand: bool,
    /// Cleared once a witness has been recorded.
    continue_expansion: bool,

    /// Best witness so far and the baseline it was found under.
    point_with_grid_code_zero: Vec<f64>,
    found_point_baseline_radius: f64,

    num_active_workers: usize,
    worker_baseline_radius: Vec<f64>,
    worker_query_x0: Vec<Vec<f64>>,
    worker_query_dims: Vec<Vec<f64>>,
    worker_running: Vec<bool>,
}

/// Everything the workers share. The per-worker continue flags live outside
/// the mutex so the searcher can poll them from inside a recursion; the
/// vector is sized once before any worker starts and never reallocated.
struct ExpansionShared<'a> {
    modules: &'a [PhaseModule],
    readout_resolution: f64,
    num_dims: usize,
    state: Mutex<ExpansionState>,
    finished: Condvar,
    worker_should_continue: Vec<AtomicBool>,
}

/// Formats a slice of coordinates as `[a, b, c]` for the progress log.
struct DisplayVec<'a>(&'a [f64]);

impl fmt::Display for DisplayVec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

/// Record a worker's witness. Always halts the expansion; only updates the
/// best witness when the worker's baseline improves on it.
fn record_result(
    worker: usize,
    state: &mut ExpansionState,
    worker_should_continue: &[AtomicBool],
    point_with_grid_code_zero: &[f64],
) {
    state.continue_expansion = false;
    if state.worker_baseline_radius[worker] < state.found_point_baseline_radius {
        state.found_point_baseline_radius = state.worker_baseline_radius[worker];
        state
            .point_with_grid_code_zero
            .copy_from_slice(point_with_grid_code_zero);

        // Stop every other worker whose baseline can no longer beat this
        // bound. A worker still probing a smaller baseline must be allowed
        // to finish; it might pin an even tighter one.
        for other in 0..worker_should_continue.len() {
            if other != worker
                && worker_should_continue[other].load(Ordering::Relaxed)
                && state.worker_baseline_radius[other] >= state.found_point_baseline_radius
            {
                worker_should_continue[other].store(false, Ordering::Relaxed);
            }
        }
    }
}

/// Assign the next slab of the expanding shell to a worker and advance the
/// dispatch cursor. Caller holds the scheduler mutex.
fn claim_next_task(worker: usize, state: &mut ExpansionState) {
    state.worker_baseline_radius[worker] = state.baseline_radius;

    let num_dims = state.expansion_progress.len();

    // The slab spans the full probed extent along every settled axis.
    for dim in 0..num_dims - 1 {
        state.worker_query_dims[worker][dim] = 2.0 * state.expansion_progress[dim];
        state.worker_query_x0[worker][dim] = -state.expansion_progress[dim];
    }

    // The grid code is antipodally symmetric: the negative half of the final
    // axis holds equal-and-opposite phases of the positive half, so it is
    // never probed.
    state.worker_query_dims[worker][num_dims - 1] = state.expansion_progress[num_dims - 1];
    state.worker_query_x0[worker][num_dims - 1] = 0.0;

    // Overwrite the expanding axis with the thin newly probed slab.
    let dim = state.expanding_dim;
    state.worker_query_dims[worker][dim] =
        state.expansion_radius_goal - state.baseline_radius;
    state.worker_query_x0[worker][dim] = if state.positive_expand {
        state.baseline_radius
    } else {
        -state.expansion_radius_goal
    };

    // Advance: negative slab of the same axis next, except on the final
    // axis; after both slabs, settle the axis; after the last axis, commit
    // the goal as the new baseline and grow.
    if state.positive_expand && dim < num_dims - 1 {
        state.positive_expand = false;
    } else {
        state.positive_expand = true;
        state.expansion_progress[dim] = state.expansion_radius_goal;
        state.expanding_dim += 1;
        if state.expanding_dim >= num_dims {
            state.baseline_radius = state.expansion_radius_goal;
            state.expansion_radius_goal *= EXPANSION_GROWTH_FACTOR;
            state.expanding_dim = 0;
        }
    }
}

/// Worker body: record the previous result, claim the next slab, search it
/// outside the lock. Exits when the expansion halts or the process-wide
/// interrupt fires.
fn worker_loop(worker: usize, shared: &ExpansionShared<'_>) {
    let mut x0 = vec![0.0; shared.num_dims];
    let mut dims = vec![0.0; shared.num_dims];
    let mut point_with_grid_code_zero = vec![0.0; shared.num_dims];
    let mut found_grid_code_zero = false;

    while !interrupt::is_stopping() {
        {
            let mut state = shared.state.lock().unwrap();

            if found_grid_code_zero {
                record_result(
                    worker,
                    &mut state,
                    &shared.worker_should_continue,
                    &point_with_grid_code_zero,
                );
            }

            if !state.continue_expansion {
                break;
            }

            claim_next_task(worker, &mut state);

            // Private copies; the recursion mutates them in place.
            x0.copy_from_slice(&state.worker_query_x0[worker]);
            dims.copy_from_slice(&state.worker_query_dims[worker]);
        }

        found_grid_code_zero = find_grid_code_zero_recursive(
            shared.modules,
            &mut x0,
            &mut dims,
            shared.readout_resolution,
            &mut point_with_grid_code_zero,
            &shared.worker_should_continue[worker],
        );
    }

    let mut state = shared.state.lock().unwrap();
    state.num_active_workers -= 1;
    if state.num_active_workers == 0 {
        shared.finished.notify_all();
    }
    state.worker_running[worker] = false;
}

fn log_progress(shared: &ExpansionShared<'_>, state: &ExpansionState, started: Instant) {
    log::info!(
        "{} modules, {} dimensions, {} seconds elapsed",
        shared.modules.len(),
        shared.num_dims,
        started.elapsed().as_secs()
    );

    if state.found_point_baseline_radius.is_finite() {
        log::info!(
            "**Hypercube side length upper bound: {}**",
            state.found_point_baseline_radius
        );
        log::info!(
            "**Grid code zero found at: {}**",
            DisplayVec(&state.point_with_grid_code_zero)
        );
    }

    for worker in 0..state.worker_running.len() {
        if state.worker_running[worker] {
            if shared.worker_should_continue[worker].load(Ordering::Relaxed) {
                log::info!(
                    "  Worker {} assuming hypercube side length lower bound {}, querying x0 {} and dims {}",
                    worker,
                    state.worker_baseline_radius[worker],
                    DisplayVec(&state.worker_query_x0[worker]),
                    DisplayVec(&state.worker_query_dims[worker])
                );
            } else {
                log::info!("  Worker {} has been ordered to stop.", worker);
            }
        } else {
            log::info!("  Worker {} is finished.", worker);
        }
    }
}

/// Run the expansion until a witness is found or the interrupt fires.
///
/// Returns the baseline half-side under which the best witness was found,
/// together with the witness itself.
pub(crate) fn run(
    modules: &[PhaseModule],
    readout_resolution: f64,
    ignored_center_diameter: f64,
) -> Result<(f64, Vec<f64>), UniquenessError> {
    let num_dims = modules[0].num_dims();
    let num_workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);

    let shared = ExpansionShared {
        modules,
        readout_resolution,
        num_dims,
        state: Mutex::new(ExpansionState {
            baseline_radius: ignored_center_diameter,
            // The first step doubles the ignored center rather than growing
            // it by the usual factor; the tiny seed cube would otherwise
            // take thousands of steps to reach interesting radii.
            expansion_radius_goal: ignored_center_diameter * 2.0,
            expansion_progress: vec![ignored_center_diameter; num_dims],
            expanding_dim: 0,
            positive_expand: true,
            continue_expansion: true,
            point_with_grid_code_zero: vec![0.0; num_dims],
            found_point_baseline_radius: f64::INFINITY,
            num_active_workers: 0,
            worker_baseline_radius: vec![f64::INFINITY; num_workers],
            worker_query_x0: vec![vec![0.0; num_dims]; num_workers],
            worker_query_dims: vec![vec![0.0; num_dims]; num_workers],
            worker_running: vec![true; num_workers],
        }),
        finished: Condvar::new(),
        worker_should_continue: (0..num_workers).map(|_| AtomicBool::new(true)).collect(),
    };

    let started = Instant::now();

    thread::scope(|scope| {
        let shared = &shared;

        // Hold the lock while spawning so no worker can finish before the
        // scheduler starts waiting; the exit notification cannot be missed.
        let mut state = shared.state.lock().unwrap();
        for worker in 0..num_workers {
            scope.spawn(move || worker_loop(worker, shared));
            state.num_active_workers += 1;
        }

        let mut processing_quit = false;
        loop {
            let (guard, wait) = shared
                .finished
                .wait_timeout(state, PROGRESS_LOG_INTERVAL)
                .unwrap();
            state = guard;

            if interrupt::is_stopping() && !processing_quit {
                processing_quit = true;
                for flag in &shared.worker_should_continue {
                    flag.store(false, Ordering::Relaxed);
                }
            }

            if state.num_active_workers == 0 {
                break;
            }

            if wait.timed_out() {
                log_progress(shared, &state, started);
            }
        }
        drop(state);
    });

    if interrupt::is_stopping() {
        // The hosting process is likely to catch this and continue, so
        // prepare to run again.
        interrupt::clear();
        return Err(UniquenessError::Interrupted);
    }

    let state = shared.state.into_inner().unwrap();
    Ok((
        state.found_point_baseline_radius,
        state.point_with_grid_code_zero,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_state(num_dims: usize, num_workers: usize, seed_radius: f64) -> ExpansionState {
        ExpansionState {
            baseline_radius: seed_radius,
            expansion_radius_goal: seed_radius * 2.0,
            expansion_progress: vec![seed_radius; num_dims],
            expanding_dim: 0,
            positive_expand: true,
            continue_expansion: true,
            point_with_grid_code_zero: vec![0.0; num_dims],
            found_point_baseline_radius: f64::INFINITY,
            num_active_workers: num_workers,
            worker_baseline_radius: vec![f64::INFINITY; num_workers],
            worker_query_x0: vec![vec![0.0; num_dims]; num_workers],
            worker_query_dims: vec![vec![0.0; num_dims]; num_workers],
            worker_running: vec![true; num_workers],
        }
    }

    #[test]
    fn test_claim_walks_signed_axes_then_commits_the_shell() {
        let mut state = fresh_state(2, 1, 1.0);

        // Positive slab of axis 0.
        claim_next_task(0, &mut state);
        assert_eq!(state.worker_baseline_radius[0], 1.0);
        assert_eq!(state.worker_query_x0[0], vec![1.0, 0.0]);
        assert_eq!(state.worker_query_dims[0], vec![1.0, 1.0]);

        // Negative slab of axis 0.
        claim_next_task(0, &mut state);
        assert_eq!(state.worker_query_x0[0], vec![-2.0, 0.0]);
        assert_eq!(state.worker_query_dims[0], vec![1.0, 1.0]);

        // Axis 1 is the final axis: only its positive slab is dispatched,
        // spanning the already-widened axis 0, and the shell commits.
        claim_next_task(0, &mut state);
        assert_eq!(state.worker_query_x0[0], vec![-2.0, 1.0]);
        assert_eq!(state.worker_query_dims[0], vec![4.0, 1.0]);

        assert_eq!(state.baseline_radius, 2.0);
        assert!((state.expansion_radius_goal - 2.0 * EXPANSION_GROWTH_FACTOR).abs() < 1e-12);
        assert_eq!(state.expanding_dim, 0);
        assert!(state.positive_expand);
    }

    #[test]
    fn test_claim_keeps_the_baseline_monotonic() {
        let mut state = fresh_state(3, 1, 0.5);
        let mut last_baseline = state.baseline_radius;

        for _ in 0..200 {
            claim_next_task(0, &mut state);
            assert!(
                state.baseline_radius >= last_baseline,
                "baseline must never shrink"
            );
            assert!(state.expansion_radius_goal > state.baseline_radius);
            last_baseline = state.baseline_radius;
        }
    }

    #[test]
    fn test_record_result_keeps_the_smallest_baseline_and_stops_stale_workers() {
        let mut state = fresh_state(2, 3, 1.0);
        let flags: Vec<AtomicBool> = (0..3).map(|_| AtomicBool::new(true)).collect();

        state.worker_baseline_radius = vec![5.0, 3.0, 2.0];

        record_result(1, &mut state, &flags, &[0.0, 3.0]);
        assert!(!state.continue_expansion);
        assert_eq!(state.found_point_baseline_radius, 3.0);
        assert_eq!(state.point_with_grid_code_zero, vec![0.0, 3.0]);
        // Worker 0 is probing a larger baseline and can stop; worker 2 is
        // below the bound and may still tighten it.
        assert!(!flags[0].load(Ordering::Relaxed));
        assert!(flags[2].load(Ordering::Relaxed));

        // A later, worse result halts expansion but leaves the best alone.
        record_result(0, &mut state, &flags, &[0.0, 5.0]);
        assert_eq!(state.found_point_baseline_radius, 3.0);
        assert_eq!(state.point_with_grid_code_zero, vec![0.0, 3.0]);

        // A better one replaces it.
        record_result(2, &mut state, &flags, &[2.0, 0.0]);
        assert_eq!(state.found_point_baseline_radius, 2.0);
        assert_eq!(state.point_with_grid_code_zero, vec![2.0, 0.0]);
    }
}
