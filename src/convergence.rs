//! Shared convergence protocol and per-iteration diagnostics
//!
//! Every solver in this crate terminates the same way: the residual 2-norm
//! `||b - Ax||` is compared against an absolute tolerance by a
//! [`ResidualTest`], and the outcome is packaged as a [`SolverResult`].
//! When requested, a [`History`] records one `(residual norm, wall time)`
//! sample per iteration, optionally with the iterate itself, for the
//! plotting/diagnostic collaborators downstream.

use crate::traits::RealScalar;
use ndarray::Array1;
use std::time::{Duration, Instant};

/// Pre-allocation cap for history storage; real capacity is
/// `min(max_iterations, HISTORY_CAPACITY_CAP)`.
const HISTORY_CAPACITY_CAP: usize = 256;

/// Absolute residual-norm convergence test shared by all solvers
#[derive(Debug, Clone, Copy)]
pub struct ResidualTest<T> {
    tolerance: T,
}

impl<T: RealScalar> ResidualTest<T> {
    /// Create a test against an absolute tolerance
    pub fn new(tolerance: T) -> Self {
        Self { tolerance }
    }

    /// Whether a residual norm meets the tolerance
    #[inline]
    pub fn is_met(&self, residual_norm: T) -> bool {
        residual_norm < self.tolerance
    }
}

/// One history sample, taken once per iteration
#[derive(Debug, Clone, Copy)]
pub struct HistoryEntry<T> {
    /// Iteration index the sample was taken at (0-based)
    pub iteration: usize,
    /// Residual 2-norm at that iteration
    pub residual_norm: T,
    /// Wall-clock time since the solve started (diagnostics only)
    pub elapsed: Duration,
}

/// Append-only per-iteration diagnostics
///
/// Pre-sized to bound allocation during the iteration loop. Iterate
/// snapshots are only stored when explicitly enabled since they cost
/// O(n) memory per iteration.
#[derive(Debug, Clone)]
pub struct History<T: RealScalar> {
    /// Residual samples, one per iteration
    pub entries: Vec<HistoryEntry<T>>,
    /// Iterate snapshots (empty unless iterate recording was enabled)
    pub iterates: Vec<Array1<T>>,
    record_iterates: bool,
    started: Instant,
}

impl<T: RealScalar> History<T> {
    /// Create a history sized for up to `max_iterations` samples
    pub fn for_run(max_iterations: usize, record_iterates: bool) -> Self {
        let capacity = max_iterations.min(HISTORY_CAPACITY_CAP);
        Self {
            entries: Vec::with_capacity(capacity),
            iterates: if record_iterates {
                Vec::with_capacity(capacity)
            } else {
                Vec::new()
            },
            record_iterates,
            started: Instant::now(),
        }
    }

    /// Append one sample for iteration `iteration`
    pub fn record(&mut self, iteration: usize, residual_norm: T, x: &Array1<T>) {
        self.entries.push(HistoryEntry {
            iteration,
            residual_norm,
            elapsed: self.started.elapsed(),
        });
        if self.record_iterates {
            self.iterates.push(x.clone());
        }
    }

    /// Residual norms in iteration order
    pub fn residual_norms(&self) -> impl Iterator<Item = T> + '_ {
        self.entries.iter().map(|e| e.residual_norm)
    }
}

/// Outcome of a solver run
///
/// Created once at completion and immutable thereafter. `converged = false`
/// with the best-effort iterate is a normal outcome (iteration cap reached),
/// never an error.
#[derive(Debug, Clone)]
pub struct SolverResult<T: RealScalar> {
    /// Final solution estimate
    pub x: Array1<T>,
    /// Number of iterations performed
    pub iterations: usize,
    /// Final residual 2-norm
    pub residual_norm: T,
    /// Whether the tolerance was met within the iteration cap
    pub converged: bool,
    /// Per-iteration diagnostics, when recording was enabled
    pub history: Option<History<T>>,
}

/// Internal helper carrying the optional history through an iteration loop
pub(crate) struct Recorder<T: RealScalar> {
    history: Option<History<T>>,
}

impl<T: RealScalar> Recorder<T> {
    pub(crate) fn new(
        record_history: bool,
        record_iterates: bool,
        max_iterations: usize,
    ) -> Self {
        let history = if record_history || record_iterates {
            Some(History::for_run(max_iterations, record_iterates))
        } else {
            None
        };
        Self { history }
    }

    #[inline]
    pub(crate) fn record(&mut self, iteration: usize, residual_norm: T, x: &Array1<T>) {
        if let Some(history) = self.history.as_mut() {
            history.record(iteration, residual_norm, x);
        }
    }

    pub(crate) fn finish(self) -> Option<History<T>> {
        self.history
    }
}
