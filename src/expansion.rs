//! Outward-expansion coordinator: grows a hypercube from the ignored centre
//! in geometric rings, slicing each ring into face-slab tasks that worker
//! threads decide with the recursive zero search.
//!
//! All task bookkeeping lives under one mutex and is touched only at task
//! boundaries; inside a task a worker reads nothing shared except its own
//! cancellation flag. The coordinator sleeps on a condition variable that
//! wakes on worker completion or on the periodic log pulse.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::error::GridCodeError;
use crate::zero_search::{find_zero_in, SearchSpace};
use crate::UniquenessOutput;

/// Ring goal growth per completed ring: 1% geometric expansion.
const RING_GROWTH_FACTOR: f64 = 1.01;

/// Cadence of the progress log pulse.
const LOG_PULSE: Duration = Duration::from_secs(10);

/// Process-wide quit flag, observed by the coordinator and by workers at
/// task boundaries. Reset before `Interrupted` is surfaced so the engine can
/// be driven again.
static QUIT: AtomicBool = AtomicBool::new(false);

/// Ask any running [`compute_grid_uniqueness_hypercube`] call to stop and
/// return [`GridCodeError::Interrupted`].
///
/// A single atomic store, so it is safe to call from an interrupt handler.
///
/// [`compute_grid_uniqueness_hypercube`]: crate::compute_grid_uniqueness_hypercube
pub fn request_interrupt() {
    QUIT.store(true, Ordering::SeqCst);
}

/// Mutable expansion state, shared under the coordinator's mutex.
struct ExpansionState {
    // Task scheduling.
    baseline_radius: f64,
    expansion_radius_goal: f64,
    expansion_progress: Vec<f64>,
    expanding_dim: usize,
    positive_expand: bool,
    continue_expansion: bool,

    // Results.
    point_with_grid_code_zero: Vec<f64>,
    found_point_baseline_radius: f64,

    // Worker bookkeeping.
    num_active_threads: usize,
    thread_baseline_radius: Vec<f64>,
    thread_query_x0: Vec<Vec<f64>>,
    thread_query_dims: Vec<Vec<f64>>,
    thread_running: Vec<bool>,
}

impl ExpansionState {
    fn new(num_dims: usize, num_threads: usize, ignored_center_diameter: f64) -> Self {
        Self {
            baseline_radius: ignored_center_diameter,
            expansion_radius_goal: ignored_center_diameter * 2.0,
            expansion_progress: vec![ignored_center_diameter; num_dims],
            expanding_dim: 0,
            positive_expand: true,
            continue_expansion: true,
            point_with_grid_code_zero: vec![0.0; num_dims],
            found_point_baseline_radius: f64::MAX,
            num_active_threads: 0,
            thread_baseline_radius: vec![f64::MAX; num_threads],
            thread_query_x0: vec![vec![0.0; num_dims]; num_threads],
            thread_query_dims: vec![vec![0.0; num_dims]; num_threads],
            thread_running: vec![true; num_threads],
        }
    }
}

/// Everything the workers share: read-only module data, the mutexed state,
/// the completion condvar and the lock-free cancellation flags.
struct SharedSearch<'a> {
    space: &'a SearchSpace<'a>,
    state: Mutex<ExpansionState>,
    finished: Condvar,
    should_continue: Vec<AtomicBool>,
}

/// Select the next face-slab task for `i_worker` and advance the
/// `(expanding_dim, positive_expand)` cursor, promoting the ring when the
/// cursor wraps.
fn claim_next_task(state: &mut ExpansionState, i_worker: usize, num_dims: usize) {
    state.thread_baseline_radius[i_worker] = state.baseline_radius;

    // Split borrows: the query buffers are written while the scalars are read.
    let baseline = state.baseline_radius;
    let goal = state.expansion_radius_goal;

    {
        let x0 = &mut state.thread_query_x0[i_worker];
        for (slot, &progress) in x0.iter_mut().zip(&state.expansion_progress) {
            *slot = -progress;
        }
        // Never probe negative values along the final dimension: zeros come
        // in equal-and-opposite pairs under full domain negation, so the
        // lower half would repeat the upper half's phases.
        x0[num_dims - 1] = 0.0;
        x0[state.expanding_dim] = if state.positive_expand { baseline } else { -goal };
    }
    {
        let dims = &mut state.thread_query_dims[i_worker];
        for (slot, &progress) in dims.iter_mut().zip(&state.expansion_progress) {
            *slot = 2.0 * progress;
        }
        dims[num_dims - 1] = state.expansion_progress[num_dims - 1];
        dims[state.expanding_dim] = goal - baseline;
    }

    // Advance the cursor; the final dimension skips its negative face.
    if state.positive_expand && state.expanding_dim < num_dims - 1 {
        state.positive_expand = false;
    } else {
        state.positive_expand = true;
        state.expansion_progress[state.expanding_dim] = state.expansion_radius_goal;
        state.expanding_dim += 1;
        if state.expanding_dim >= num_dims {
            state.baseline_radius = state.expansion_radius_goal;
            state.expansion_radius_goal *= RING_GROWTH_FACTOR;
            state.expanding_dim = 0;
        }
    }
}

/// Record a worker's witness under the lock: tighten the global bound if the
/// task's baseline improves on it, and cancel every other worker whose
/// baseline can no longer beat the new bound.
fn record_result(
    state: &mut ExpansionState,
    should_continue: &[AtomicBool],
    i_worker: usize,
    witness: &[f64],
) {
    if state.thread_baseline_radius[i_worker] < state.found_point_baseline_radius {
        state.found_point_baseline_radius = state.thread_baseline_radius[i_worker];
        state.point_with_grid_code_zero.copy_from_slice(witness);
        state.continue_expansion = false;
        debug!(
            "worker {} found grid code zero at baseline {}",
            i_worker, state.found_point_baseline_radius
        );

        for (i_other, flag) in should_continue.iter().enumerate() {
            if i_other != i_worker
                && flag.load(Ordering::SeqCst)
                && state.thread_baseline_radius[i_other] >= state.found_point_baseline_radius
            {
                flag.store(false, Ordering::SeqCst);
            }
        }
    }
}

/// Worker body: report the previous task's result, claim the next task,
/// run the recursive search on an unshared copy of the box.
fn expansion_worker(shared: &SharedSearch<'_>, i_worker: usize) {
    let num_dims = shared.space.num_dims;
    let mut x0 = vec![0.0; num_dims];
    let mut dims = vec![0.0; num_dims];
    let mut witness = vec![0.0; num_dims];
    let mut found_grid_code_zero = false;

    while !QUIT.load(Ordering::SeqCst) {
        {
            let mut state = shared.state.lock().unwrap();

            if found_grid_code_zero {
                record_result(&mut state, &shared.should_continue, i_worker, &witness);
            }

            if !state.continue_expansion {
                break;
            }

            claim_next_task(&mut state, i_worker, num_dims);
            x0.copy_from_slice(&state.thread_query_x0[i_worker]);
            dims.copy_from_slice(&state.thread_query_dims[i_worker]);
        }

        found_grid_code_zero = find_zero_in(
            shared.space,
            &mut x0,
            &mut dims,
            &mut witness,
            &shared.should_continue[i_worker],
        );
    }

    let mut state = shared.state.lock().unwrap();
    state.num_active_threads -= 1;
    if state.num_active_threads == 0 {
        shared.finished.notify_all();
    }
    state.thread_running[i_worker] = false;
}

fn log_progress(shared: &SharedSearch<'_>, state: &ExpansionState, started: Instant) {
    info!(
        "{} modules, {} dimensions, {} seconds elapsed",
        shared.space.modules.len(),
        shared.space.num_dims,
        started.elapsed().as_secs()
    );

    if state.found_point_baseline_radius < f64::MAX {
        info!(
            "hypercube side length upper bound: {}",
            state.found_point_baseline_radius
        );
        info!("grid code zero found at: {:?}", state.point_with_grid_code_zero);
    }

    for (i_worker, &running) in state.thread_running.iter().enumerate() {
        if !running {
            info!("  worker {} is finished", i_worker);
        } else if shared.should_continue[i_worker].load(Ordering::SeqCst) {
            info!(
                "  worker {} assuming lower bound {}, querying x0 {:?} dims {:?}",
                i_worker,
                state.thread_baseline_radius[i_worker],
                state.thread_query_x0[i_worker],
                state.thread_query_dims[i_worker]
            );
        } else {
            info!("  worker {} has been ordered to stop", i_worker);
        }
    }
}

/// Run the outward expansion to completion (or interruption) and return the
/// tightest bound found.
pub(crate) fn run_expansion(
    space: &SearchSpace<'_>,
    ignored_center_diameter: f64,
    num_threads: usize,
) -> Result<UniquenessOutput, GridCodeError> {
    let num_threads = num_threads.max(1);
    let shared = SharedSearch {
        space,
        state: Mutex::new(ExpansionState::new(
            space.num_dims,
            num_threads,
            ignored_center_diameter,
        )),
        finished: Condvar::new(),
        should_continue: (0..num_threads).map(|_| AtomicBool::new(true)).collect(),
    };

    let started = Instant::now();

    thread::scope(|scope| {
        let mut state = shared.state.lock().unwrap();
        for i_worker in 0..num_threads {
            state.num_active_threads += 1;
            let shared = &shared;
            scope.spawn(move || expansion_worker(shared, i_worker));
        }

        let mut next_pulse = started + LOG_PULSE;
        let mut processing_quit = false;

        loop {
            if QUIT.load(Ordering::SeqCst) && !processing_quit {
                // Still need the workers to exit cleanly; tell them to
                // abandon their current searches.
                processing_quit = true;
                for flag in &shared.should_continue {
                    flag.store(false, Ordering::SeqCst);
                }
            }

            if state.num_active_threads == 0 {
                break;
            }

            let timeout = next_pulse.saturating_duration_since(Instant::now());
            let (guard, wait) = shared.finished.wait_timeout(state, timeout).unwrap();
            state = guard;
            if wait.timed_out() {
                log_progress(&shared, &state, started);
                next_pulse = Instant::now() + LOG_PULSE;
            }
        }
    });

    let state = shared.state.into_inner().unwrap();

    if QUIT.swap(false, Ordering::SeqCst) {
        // The caller may be a long-lived host; the flag is already reset so
        // the engine can run again.
        return Err(GridCodeError::Interrupted);
    }

    Ok(UniquenessOutput {
        upper_bound: state.found_point_baseline_radius,
        witness: state.point_with_grid_code_zero,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim_sequence(
        num_dims: usize,
        ignored: f64,
        count: usize,
    ) -> Vec<(f64, Vec<f64>, Vec<f64>)> {
        let mut state = ExpansionState::new(num_dims, 1, ignored);
        let mut out = Vec::new();
        for _ in 0..count {
            claim_next_task(&mut state, 0, num_dims);
            out.push((
                state.thread_baseline_radius[0],
                state.thread_query_x0[0].clone(),
                state.thread_query_dims[0].clone(),
            ));
        }
        out
    }

    #[test]
    fn first_ring_emits_three_faces_then_promotes() {
        let tasks = claim_sequence(2, 0.5, 4);

        // Ring 1: positive and negative faces of dim 0, positive face of the
        // final dim only.
        assert_eq!(tasks[0], (0.5, vec![0.5, 0.0], vec![0.5, 0.5]));
        assert_eq!(tasks[1], (0.5, vec![-1.0, 0.0], vec![0.5, 0.5]));
        assert_eq!(tasks[2], (0.5, vec![-1.0, 0.5], vec![2.0, 0.5]));

        // Ring 2 starts from the promoted baseline with a 1% goal.
        let (baseline, x0, dims) = &tasks[3];
        assert_eq!(*baseline, 1.0);
        assert_eq!(x0, &vec![1.0, 0.0]);
        assert!((dims[0] - 0.01).abs() < 1e-12);
        assert_eq!(dims[1], 1.0);
    }

    #[test]
    fn final_dimension_never_goes_negative() {
        for num_dims in [1, 2, 3, 4] {
            let tasks = claim_sequence(num_dims, 0.25, 40);
            for (_, x0, dims) in &tasks {
                assert!(x0[num_dims - 1] >= 0.0);
                assert!(dims[num_dims - 1] > 0.0);
            }
        }
    }

    #[test]
    fn one_dimensional_rings_are_single_tasks() {
        let tasks = claim_sequence(1, 0.5, 3);
        assert_eq!(tasks[0], (0.5, vec![0.5], vec![0.5]));

        let (baseline, x0, dims) = &tasks[1];
        assert_eq!(*baseline, 1.0);
        assert_eq!(x0, &vec![1.0]);
        assert!((dims[0] - 0.01).abs() < 1e-12);

        let (baseline, x0, _) = &tasks[2];
        assert!((baseline - 1.01).abs() < 1e-12);
        assert!((x0[0] - 1.01).abs() < 1e-12);
    }

    #[test]
    fn record_result_keeps_the_tightest_witness() {
        let mut state = ExpansionState::new(2, 3, 0.5);
        let flags: Vec<AtomicBool> = (0..3).map(|_| AtomicBool::new(true)).collect();

        state.thread_baseline_radius = vec![2.0, 1.0, 3.0];
        record_result(&mut state, &flags, 0, &[2.0, 0.0]);
        assert_eq!(state.found_point_baseline_radius, 2.0);
        assert!(!state.continue_expansion);
        // Worker 1 is under the bound and keeps going; worker 2 is not.
        assert!(flags[1].load(Ordering::SeqCst));
        assert!(!flags[2].load(Ordering::SeqCst));

        // A tighter witness replaces the bound...
        record_result(&mut state, &flags, 1, &[1.0, 0.0]);
        assert_eq!(state.found_point_baseline_radius, 1.0);
        assert_eq!(state.point_with_grid_code_zero, vec![1.0, 0.0]);

        // ...and a stale one is discarded.
        record_result(&mut state, &flags, 2, &[3.0, 0.0]);
        assert_eq!(state.found_point_baseline_radius, 1.0);
        assert_eq!(state.point_with_grid_code_zero, vec![1.0, 0.0]);
    }
}
