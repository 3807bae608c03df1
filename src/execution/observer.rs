use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::EvalError;
use crate::processing::ReduceOp;
use crate::types::Value;

/// Evaluation events emitted by the [`super::Evaluator`].
#[derive(Debug, Clone)]
pub enum EvaluationEvent {
    FilterStarted {
        model: String,
        rows: usize,
        terms: usize,
    },
    FilterFinished {
        model: String,
        kept: usize,
        removed: usize,
        elapsed: Duration,
    },
    AggregateStarted {
        model: String,
        column: String,
        op: ReduceOp,
    },
    AggregateFinished {
        model: String,
        result: Value,
    },
    Failed {
        model: String,
        error: EvalError,
    },
}

/// Observer hook for evaluation events.
pub trait EvaluationObserver: Send + Sync {
    fn on_event(&self, event: &EvaluationEvent);
}

/// A simple stderr logger for evaluation events.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl EvaluationObserver for StdErrObserver {
    fn on_event(&self, event: &EvaluationEvent) {
        match event {
            EvaluationEvent::Failed { model, error } => {
                eprintln!("[eval][fail] model={model} err={error}")
            }
            other => eprintln!("[eval] {other:?}"),
        }
    }
}

/// Forwards evaluation events to `tracing`: `debug!` per event, `warn!` on failure.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl EvaluationObserver for TracingObserver {
    fn on_event(&self, event: &EvaluationEvent) {
        match event {
            EvaluationEvent::FilterStarted { model, rows, terms } => {
                tracing::debug!(model = %model, rows, terms, "filter started")
            }
            EvaluationEvent::FilterFinished {
                model,
                kept,
                removed,
                elapsed,
            } => tracing::debug!(model = %model, kept, removed, ?elapsed, "filter finished"),
            EvaluationEvent::AggregateStarted { model, column, op } => {
                tracing::debug!(model = %model, column = %column, op = %op, "aggregate started")
            }
            EvaluationEvent::AggregateFinished { model, result } => {
                tracing::debug!(model = %model, result = %result, "aggregate finished")
            }
            EvaluationEvent::Failed { model, error } => {
                tracing::warn!(model = %model, %error, "evaluation failed")
            }
        }
    }
}

/// Fans events out to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn EvaluationObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn EvaluationObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl EvaluationObserver for CompositeObserver {
    fn on_event(&self, event: &EvaluationEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}

/// Counters across every evaluation run by one [`super::Evaluator`].
///
/// Callers can snapshot them at any time.
#[derive(Debug, Default)]
pub struct EvaluationMetrics {
    filters_run: AtomicU64,
    aggregates_run: AtomicU64,
    failures: AtomicU64,
    rows_in: AtomicU64,
    rows_kept: AtomicU64,
    terms_compiled: AtomicU64,
}

impl EvaluationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_filter(&self, rows_in: usize, rows_kept: usize, terms: usize) {
        let _ = self.filters_run.fetch_add(1, Ordering::SeqCst);
        let _ = self.rows_in.fetch_add(rows_in as u64, Ordering::SeqCst);
        let _ = self.rows_kept.fetch_add(rows_kept as u64, Ordering::SeqCst);
        let _ = self.terms_compiled.fetch_add(terms as u64, Ordering::SeqCst);
    }

    pub fn on_aggregate(&self) {
        let _ = self.aggregates_run.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_failure(&self) {
        let _ = self.failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> EvaluationMetricsSnapshot {
        EvaluationMetricsSnapshot {
            filters_run: self.filters_run.load(Ordering::SeqCst),
            aggregates_run: self.aggregates_run.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            rows_in: self.rows_in.load(Ordering::SeqCst),
            rows_kept: self.rows_kept.load(Ordering::SeqCst),
            terms_compiled: self.terms_compiled.load(Ordering::SeqCst),
        }
    }
}

/// Immutable snapshot of [`EvaluationMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationMetricsSnapshot {
    pub filters_run: u64,
    pub aggregates_run: u64,
    pub failures: u64,
    pub rows_in: u64,
    pub rows_kept: u64,
    pub terms_compiled: u64,
}

impl fmt::Display for EvaluationMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "filters={}, aggregates={}, failures={}, rows_kept={}/{}, terms={}",
            self.filters_run,
            self.aggregates_run,
            self.failures,
            self.rows_kept,
            self.rows_in,
            self.terms_compiled
        )
    }
}
