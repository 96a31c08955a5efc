//! Stepwise solver execution model.
//!
//! Every solver in the pipeline exposes the same cooperative interface: one
//! [`StepSolver::step`] call performs one unit of work (one cell subdivision,
//! one candidate expansion) and returns. A driver loops `step()` until the
//! solver reports solved or failed, interleaving visualization, timeboxing,
//! or cancellation between steps. No I/O and no blocking calls occur inside
//! a step.

/// Cooperative, single-threaded solver interface.
pub trait StepSolver {
    /// Performs one unit of work and returns.
    fn step(&mut self);

    /// True once the solver has produced its final result.
    fn solved(&self) -> bool;

    /// True if the solver stopped without reaching a solution.
    fn failed(&self) -> bool;

    /// Number of steps taken so far.
    fn iterations(&self) -> u64;

    /// Drives the solver until it is solved, failed, or `max_steps` have run.
    fn run(&mut self, max_steps: Option<u64>) {
        while !self.solved() && !self.failed() {
            if let Some(limit) = max_steps {
                if self.iterations() >= limit {
                    break;
                }
            }
            self.step();
        }
    }
}

/// Progress callback for long-running solves.
pub type ProgressCallback = Box<dyn Fn(ProgressInfo) + Send + Sync>;

/// Snapshot of a solver's progress, reported between steps.
#[derive(Debug, Clone, Default)]
pub struct ProgressInfo {
    /// Current phase/stage description.
    pub phase: String,
    /// Steps taken so far.
    pub iteration: u64,
    /// Items still waiting for work (worklist or candidate queue length).
    pub queue_len: usize,
    /// Best cost seen so far, if the solver tracks one.
    pub best_cost: Option<f64>,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: u64,
    /// Whether the solver is still running.
    pub running: bool,
}

impl ProgressInfo {
    /// Creates a new progress snapshot marked as running.
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            running: true,
            ..Default::default()
        }
    }

    /// Sets the step count.
    pub fn with_iteration(mut self, iteration: u64) -> Self {
        self.iteration = iteration;
        self
    }

    /// Sets the pending work count.
    pub fn with_queue_len(mut self, queue_len: usize) -> Self {
        self.queue_len = queue_len;
        self
    }

    /// Sets the best cost seen so far.
    pub fn with_best_cost(mut self, cost: f64) -> Self {
        self.best_cost = Some(cost);
        self
    }

    /// Sets the elapsed time.
    pub fn with_elapsed(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Marks the solver as finished.
    pub fn finished(mut self) -> Self {
        self.running = false;
        self
    }
}
