//! Evaluation front-end used by command handlers.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - [`FilterOptions`]: the process-wide `--filter`/`--aggregate` values, parsed once (fail fast)
//! - [`Evaluator`]: runs filter then aggregate for one model, honoring per-command
//!   capability flags
//! - Metrics + observer hooks for monitoring, plus `tracing` events
//!
//! ```rust
//! use rowfilter::execution::{EvaluationOptions, Evaluator};
//! use rowfilter::{filterable_row, row_model};
//! use rowfilter::types::Value;
//!
//! struct Port { id: i32, admin_state: &'static str }
//! filterable_row!(Port {
//!     "id" => Integer, |p| p.id,
//!     "adminState" => Symbolic["Enabled", "Disabled"], |p| p.admin_state,
//! });
//! struct ShowPortModel { port_entries: Vec<Port> }
//! row_model!(ShowPortModel => port_entries: Port);
//!
//! let evaluator = Evaluator::new(EvaluationOptions::default());
//! let options = evaluator
//!     .parse_options(Some("adminState==Enabled"), Some("count(id)"))
//!     .unwrap();
//! let model = ShowPortModel {
//!     port_entries: vec![
//!         Port { id: 1, admin_state: "Enabled" },
//!         Port { id: 2, admin_state: "Disabled" },
//!     ],
//! };
//! let out = evaluator.run_static(model, &options).unwrap();
//! assert_eq!(out.model.port_entries.len(), 1);
//! assert_eq!(out.aggregate, Some(Value::Int64(1)));
//! ```

mod observer;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;

use crate::error::{EvalError, EvalResult};
use crate::expr::{parse_filter, FilterSyntax, UnionList};
use crate::processing::{
    evaluate_aggregate, parse_aggregate, AggregateRequest, CompiledFilter,
};
use crate::registry::ColumnRegistry;
use crate::row::{RowModel, StaticRow};
use crate::types::Value;

pub use observer::{
    CompositeObserver, EvaluationEvent, EvaluationMetrics, EvaluationMetricsSnapshot,
    EvaluationObserver, StdErrObserver, TracingObserver,
};

/// Configuration for the [`Evaluator`].
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Separator tokens of the `--filter` grammar.
    pub syntax: FilterSyntax,
    /// Optional observer for evaluation events.
    #[serde(skip)]
    pub observer: Option<Arc<dyn EvaluationObserver>>,
}

impl EvaluationOptions {
    /// Load options from a JSON config document.
    ///
    /// Missing keys fall back to defaults: `{"syntax": {"and_token": ","}}` keeps `||` for OR.
    pub fn from_json_str(input: &str) -> EvalResult<Self> {
        serde_json::from_str(input).map_err(|e| EvalError::InvalidModelDocument {
            message: format!("evaluation options: {e}"),
        })
    }
}

impl fmt::Debug for EvaluationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationOptions")
            .field("syntax", &self.syntax)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .finish()
    }
}

/// Filter and aggregate requests for one CLI invocation.
///
/// Build it once, before any RPC call, so malformed input aborts immediately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub filter: UnionList,
    pub aggregate: Option<AggregateRequest>,
}

impl FilterOptions {
    pub fn parse(
        filter: Option<&str>,
        aggregate: Option<&str>,
        syntax: &FilterSyntax,
    ) -> EvalResult<Self> {
        let filter = match filter {
            Some(raw) => parse_filter(raw, syntax)?,
            None => UnionList::default(),
        };
        let aggregate = aggregate.map(parse_aggregate).transpose()?;
        Ok(Self { filter, aggregate })
    }
}

/// Result of [`Evaluator::run`]: the filtered model and the optional aggregate scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<M> {
    pub model: M,
    pub aggregate: Option<Value>,
}

/// Runs filter and aggregate passes for command handlers.
pub struct Evaluator {
    opts: EvaluationOptions,
    metrics: Arc<EvaluationMetrics>,
}

impl Evaluator {
    pub fn new(opts: EvaluationOptions) -> Self {
        Self {
            opts,
            metrics: Arc::new(EvaluationMetrics::new()),
        }
    }

    /// Attach an observer for evaluation events.
    pub fn with_observer(mut self, observer: Arc<dyn EvaluationObserver>) -> Self {
        self.opts.observer = Some(observer);
        self
    }

    /// Get a handle to evaluation metrics.
    pub fn metrics(&self) -> Arc<EvaluationMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Parse raw `--filter`/`--aggregate` strings with this evaluator's syntax.
    pub fn parse_options(
        &self,
        filter: Option<&str>,
        aggregate: Option<&str>,
    ) -> EvalResult<FilterOptions> {
        FilterOptions::parse(filter, aggregate, &self.opts.syntax)
    }

    /// Apply `union` to the model. An empty union is a pass-through.
    pub fn filter<M: RowModel>(
        &self,
        mut model: M,
        union: &UnionList,
        registry: &ColumnRegistry,
    ) -> EvalResult<M> {
        if union.is_empty() {
            return Ok(model);
        }
        let name = model.model_name();
        let outcome = self.filter_impl(&mut model, &name, union, registry);
        self.track(&name, outcome)?;
        Ok(model)
    }

    fn filter_impl<M: RowModel>(
        &self,
        model: &mut M,
        name: &str,
        union: &UnionList,
        registry: &ColumnRegistry,
    ) -> EvalResult<()> {
        if !M::ALLOW_FILTERING {
            return Err(EvalError::FilteringNotSupported { model: name.to_string() });
        }
        let start = Instant::now();
        let rows_in = model.rows().len();
        let compiled = CompiledFilter::compile(union, &registry.comparators)?;
        let terms = compiled.term_count();
        self.emit(EvaluationEvent::FilterStarted {
            model: name.to_string(),
            rows: rows_in,
            terms,
        });

        let removed = compiled.retain(model)?;
        let kept = rows_in - removed;
        self.metrics.on_filter(rows_in, kept, terms);
        tracing::debug!(model = name, rows_in, kept, terms, "filter applied");
        self.emit(EvaluationEvent::FilterFinished {
            model: name.to_string(),
            kept,
            removed,
            elapsed: start.elapsed(),
        });
        Ok(())
    }

    /// Fold the requested column into a scalar.
    pub fn aggregate<M: RowModel>(
        &self,
        model: &M,
        request: &AggregateRequest,
        registry: &ColumnRegistry,
    ) -> EvalResult<Value> {
        let name = model.model_name();
        let outcome = self.aggregate_impl(model, &name, request, registry);
        self.track(&name, outcome)
    }

    fn aggregate_impl<M: RowModel>(
        &self,
        model: &M,
        name: &str,
        request: &AggregateRequest,
        registry: &ColumnRegistry,
    ) -> EvalResult<Value> {
        if !M::ALLOW_AGGREGATION {
            return Err(EvalError::AggregationNotSupported { model: name.to_string() });
        }
        self.emit(EvaluationEvent::AggregateStarted {
            model: name.to_string(),
            column: request.column.clone(),
            op: request.op,
        });
        let result = evaluate_aggregate(model, &request.column, request.op, &registry.reducers)?;
        self.metrics.on_aggregate();
        tracing::debug!(model = name, aggregate = %request, result = %result, "aggregate computed");
        self.emit(EvaluationEvent::AggregateFinished {
            model: name.to_string(),
            result: result.clone(),
        });
        Ok(result)
    }

    /// Filter, then aggregate the surviving rows if requested.
    pub fn run<M: RowModel>(
        &self,
        model: M,
        options: &FilterOptions,
        registry: &ColumnRegistry,
    ) -> EvalResult<Evaluation<M>> {
        let model = self.filter(model, &options.filter, registry)?;
        let aggregate = match &options.aggregate {
            Some(request) => Some(self.aggregate(&model, request, registry)?),
            None => None,
        };
        Ok(Evaluation { model, aggregate })
    }

    /// [`Self::run`] using the row type's own static registry.
    pub fn run_static<M>(&self, model: M, options: &FilterOptions) -> EvalResult<Evaluation<M>>
    where
        M: RowModel,
        M::Row: StaticRow,
    {
        self.run(model, options, <M::Row as StaticRow>::registry())
    }

    fn track<T>(&self, name: &str, outcome: EvalResult<T>) -> EvalResult<T> {
        if let Err(error) = &outcome {
            self.metrics.on_failure();
            tracing::warn!(model = name, %error, "evaluation failed");
            self.emit(EvaluationEvent::Failed {
                model: name.to_string(),
                error: error.clone(),
            });
        }
        outcome
    }

    fn emit(&self, event: EvaluationEvent) {
        if let Some(o) = &self.opts.observer {
            o.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Operator;

    #[test]
    fn parse_options_defaults_to_no_filter() {
        let opts = FilterOptions::parse(None, None, &FilterSyntax::default()).unwrap();
        assert!(opts.filter.is_empty());
        assert!(opts.aggregate.is_none());
    }

    #[test]
    fn parse_options_fails_fast_on_either_flag() {
        let syntax = FilterSyntax::default();
        assert!(FilterOptions::parse(Some("id>"), None, &syntax).is_err());
        assert!(FilterOptions::parse(None, Some("sum id"), &syntax).is_err());
        let opts = FilterOptions::parse(Some("id>=3"), Some("max(id)"), &syntax).unwrap();
        assert_eq!(opts.filter.groups[0].terms[0].operator, Operator::Gte);
        assert_eq!(opts.aggregate.unwrap().column, "id");
    }

    #[test]
    fn options_load_from_json() {
        let opts = EvaluationOptions::from_json_str(r#"{"syntax": {"and_token": ","}}"#).unwrap();
        assert_eq!(opts.syntax.and_token, ",");
        assert_eq!(opts.syntax.or_token, "||");
        assert!(opts.observer.is_none());
        assert!(EvaluationOptions::from_json_str("{").is_err());
    }
}
