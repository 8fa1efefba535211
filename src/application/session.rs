//! Host-driven optimization runs.
//!
//! When samples are executed by a host runtime the loop does not control
//! (a test runner, a job queue, a fleet of workers), completions arrive
//! concurrently from many places. [`OptimizationSession`] funnels them
//! through an mpsc channel into a single actor task that owns the
//! [`OptimizationLoop`], so the buffer and the completion sequence have
//! exactly one writer.
//!
//! ```text
//!   SampleSink ─┐
//!   SampleSink ─┼─► mpsc ─► actor (OptimizationLoop) ─► watch<SessionState>
//!   SampleSink ─┘                                          │
//!                                                          ▼
//!                                                   hosts pick up the
//!                                                   next factor suit
//! ```
//!
//! Every event is tagged with the iteration it was executed for. Events for
//! any other iteration are stale and dropped. Dropping every sink before
//! the run terminates cancels it.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::optimization_loop::{LoopStep, OptimizationLoop, OptimizationSetup};
use super::progress::ProgressCounters;
use crate::domain::errors::{ExecutionError, OptimizationError, OptimizationResult};
use crate::domain::models::{
    FactorSuit, FactorValue, OptimizationHistory, SampleOutcome, TerminationReason,
};

/// What hosts should be doing right now.
#[derive(Debug, Clone)]
pub enum SessionState<F> {
    /// Execute samples of `iteration` with `suit`.
    Collecting { iteration: u32, suit: FactorSuit<F> },
    /// The run is over.
    Terminated(TerminationReason),
}

impl<F> SessionState<F> {
    pub fn is_terminated(&self) -> bool {
        matches!(self, SessionState::Terminated(_))
    }
}

#[derive(Debug)]
enum SessionEvent {
    Sample {
        iteration: u32,
        outcome: SampleOutcome,
    },
    ExecutionFailure {
        iteration: u32,
        error: ExecutionError,
    },
}

impl SessionEvent {
    fn iteration(&self) -> u32 {
        match self {
            SessionEvent::Sample { iteration, .. } | SessionEvent::ExecutionFailure { iteration, .. } => {
                *iteration
            }
        }
    }
}

/// Cloneable handle through which hosts deliver sample completions.
#[derive(Debug, Clone)]
pub struct SampleSink {
    tx: mpsc::Sender<SessionEvent>,
}

impl SampleSink {
    /// Deliver the outcome of one sample executed for `iteration`.
    pub async fn submit(&self, iteration: u32, outcome: SampleOutcome) -> OptimizationResult<()> {
        self.tx
            .send(SessionEvent::Sample { iteration, outcome })
            .await
            .map_err(|_| OptimizationError::SessionClosed)
    }

    /// Report that samples for `iteration` cannot be produced at all.
    pub async fn fail(&self, iteration: u32, error: ExecutionError) -> OptimizationResult<()> {
        self.tx
            .send(SessionEvent::ExecutionFailure { iteration, error })
            .await
            .map_err(|_| OptimizationError::SessionClosed)
    }

    /// Whether the session has stopped accepting events.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A running optimization fed by external sample completions.
pub struct OptimizationSession<F: FactorValue> {
    run_id: Uuid,
    sink: SampleSink,
    state: watch::Receiver<SessionState<F>>,
    counters: Arc<ProgressCounters>,
    handle: JoinHandle<OptimizationResult<OptimizationHistory<F>>>,
}

impl<F: FactorValue> OptimizationSession<F> {
    /// Spawn the actor on the current tokio runtime.
    pub fn start(setup: OptimizationSetup<F>, channel_capacity: usize) -> OptimizationResult<Self> {
        if channel_capacity == 0 {
            return Err(OptimizationError::InvalidConfiguration(
                "session_channel_capacity must be at least 1".to_string(),
            ));
        }

        let optimization = OptimizationLoop::new(setup)?;
        let run_id = optimization.run_id();
        let counters = optimization.counters();

        let (tx, rx) = mpsc::channel(channel_capacity);
        let (state_tx, state_rx) = watch::channel(SessionState::Collecting {
            iteration: optimization.current_iteration(),
            suit: optimization.current_suit().clone(),
        });

        let handle = tokio::spawn(run_actor(optimization, rx, state_tx));

        Ok(Self {
            run_id,
            sink: SampleSink { tx },
            state: state_rx,
            counters,
            handle,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn sink(&self) -> SampleSink {
        self.sink.clone()
    }

    /// Follow the current iteration and factor suit.
    pub fn subscribe(&self) -> watch::Receiver<SessionState<F>> {
        self.state.clone()
    }

    pub fn state(&self) -> SessionState<F> {
        self.state.borrow().clone()
    }

    pub fn counters(&self) -> Arc<ProgressCounters> {
        Arc::clone(&self.counters)
    }

    /// Wait for the run to finish and return its history.
    ///
    /// The session's own sink is released first, so the run ends as soon as
    /// every sink handed out has been dropped, even if no termination
    /// condition fired.
    pub async fn join(self) -> OptimizationResult<OptimizationHistory<F>> {
        let Self { sink, handle, .. } = self;
        drop(sink);
        handle
            .await
            .map_err(|err| OptimizationError::SessionAborted(err.to_string()))?
    }
}

async fn run_actor<F: FactorValue>(
    mut optimization: OptimizationLoop<F>,
    mut rx: mpsc::Receiver<SessionEvent>,
    state_tx: watch::Sender<SessionState<F>>,
) -> OptimizationResult<OptimizationHistory<F>> {
    info!(run_id = %optimization.run_id(), "Optimization session started");

    while let Some(event) = rx.recv().await {
        let current = optimization.current_iteration();
        if event.iteration() != current {
            debug!(
                run_id = %optimization.run_id(),
                event_iteration = event.iteration(),
                current_iteration = current,
                "Dropping stale session event"
            );
            continue;
        }

        let step = match event {
            SessionEvent::Sample { outcome, .. } => optimization.record_sample(outcome).await?,
            SessionEvent::ExecutionFailure { error, .. } => {
                optimization.record_execution_failure(&error)?
            }
        };

        match step {
            LoopStep::Accepted => {}
            LoopStep::Advanced { iteration } => {
                state_tx.send_replace(SessionState::Collecting {
                    iteration,
                    suit: optimization.current_suit().clone(),
                });
            }
            LoopStep::Terminated => break,
        }
    }

    // Refuse further sends before freezing the history.
    rx.close();
    if !optimization.is_terminated() {
        warn!(
            run_id = %optimization.run_id(),
            "All sample sinks closed before the run terminated"
        );
        optimization.cancel("all sample sinks were closed before termination");
    }

    let history = optimization.finish()?;
    if let Some(reason) = history.termination_reason() {
        state_tx.send_replace(SessionState::Terminated(reason.clone()));
    }
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{FixedFactors, IterationStatus};
    use crate::services::{MaxIterationsPolicy, NoOpMutator, SuccessRateScorer};
    use std::time::Duration;

    fn setup(max_iterations: u32, samples: usize) -> OptimizationSetup<String> {
        let suit =
            FactorSuit::new("prompt", "v0".to_string(), Arc::new(FixedFactors::new())).unwrap();
        OptimizationSetup::new(
            "extract",
            suit,
            Arc::new(SuccessRateScorer::new()),
            Arc::new(NoOpMutator),
            Arc::new(MaxIterationsPolicy::new(max_iterations)),
        )
        .with_samples_per_iteration(samples)
    }

    fn pass() -> SampleOutcome {
        SampleOutcome::pass(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_rejects_zero_capacity() {
        assert!(matches!(
            OptimizationSession::start(setup(1, 1), 0),
            Err(OptimizationError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_runs_to_policy_termination() {
        let session = OptimizationSession::start(setup(2, 2), 8).unwrap();
        let sink = session.sink();
        for iteration in 0..2 {
            sink.submit(iteration, pass()).await.unwrap();
            sink.submit(iteration, pass()).await.unwrap();
        }
        drop(sink);

        let history = session.join().await.unwrap();
        assert_eq!(history.iteration_count(), 2);
        assert_eq!(
            history.termination_reason(),
            Some(&TerminationReason::MaxIterations { iterations: 2 })
        );
    }

    #[tokio::test]
    async fn test_stale_events_are_dropped() {
        let session = OptimizationSession::start(setup(2, 1), 8).unwrap();
        let sink = session.sink();
        let mut state = session.subscribe();

        sink.submit(0, pass()).await.unwrap();
        state.changed().await.unwrap();
        assert!(matches!(
            *state.borrow(),
            SessionState::Collecting { iteration: 1, .. }
        ));

        // A late sample of iteration 0 and a failure report for it.
        sink.submit(0, SampleOutcome::fail(Duration::ZERO)).await.unwrap();
        sink.fail(0, ExecutionError::new("late")).await.unwrap();
        sink.submit(1, pass()).await.unwrap();
        drop(sink);

        let history = session.join().await.unwrap();
        assert_eq!(history.iteration_count(), 2);
        assert!(history
            .iterations()
            .iter()
            .all(|r| r.status() == IterationStatus::Success));
    }

    #[tokio::test]
    async fn test_dropping_sinks_cancels() {
        let session = OptimizationSession::start(setup(5, 3), 8).unwrap();
        let mut state = session.subscribe();
        session.sink().submit(0, pass()).await.unwrap();

        let history = session.join().await.unwrap();
        assert_eq!(history.iteration_count(), 0);
        assert_eq!(history.termination_reason().unwrap().cause(), "CANCELLED");

        state.changed().await.unwrap();
        assert!(state.borrow().is_terminated());
    }

    #[tokio::test]
    async fn test_execution_failure_through_sink() {
        let session = OptimizationSession::start(setup(5, 3), 8).unwrap();
        let sink = session.sink();
        sink.submit(0, pass()).await.unwrap();
        sink.fail(0, ExecutionError::new("worker pool gone")).await.unwrap();

        let history = session.join().await.unwrap();
        assert_eq!(
            history.iterations()[0].status(),
            IterationStatus::ExecutionFailed
        );
        assert!(sink.is_closed());
        assert!(matches!(
            sink.submit(0, pass()).await,
            Err(OptimizationError::SessionClosed)
        ));
    }
}
