//! Aggregate evaluation over a model's row collection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};
use crate::registry::{Accumulator, ReducerRegistry};
use crate::row::{Row, RowModel};
use crate::types::Value;

/// Built-in reduction operations over a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceOp {
    /// Count all rows (including nulls). Works on any column kind.
    Count,
    /// Sum numeric values, ignoring nulls.
    Sum,
    /// Minimum numeric value, ignoring nulls.
    Min,
    /// Maximum numeric value, ignoring nulls.
    Max,
    /// Arithmetic mean of numeric values, ignoring nulls. Always real-valued.
    Avg,
}

impl fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReduceOp::Count => "count",
            ReduceOp::Sum => "sum",
            ReduceOp::Min => "min",
            ReduceOp::Max => "max",
            ReduceOp::Avg => "avg",
        };
        f.write_str(s)
    }
}

impl FromStr for ReduceOp {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(ReduceOp::Count),
            "sum" => Ok(ReduceOp::Sum),
            "min" => Ok(ReduceOp::Min),
            "max" => Ok(ReduceOp::Max),
            "avg" => Ok(ReduceOp::Avg),
            _ => Err(EvalError::MalformedAggregateExpression {
                input: s.to_string(),
                message: "expected one of sum, min, max, count, avg".to_string(),
            }),
        }
    }
}

/// A parsed `--aggregate` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRequest {
    pub column: String,
    pub op: ReduceOp,
}

impl AggregateRequest {
    pub fn new(column: impl Into<String>, op: ReduceOp) -> Self {
        Self {
            column: column.into(),
            op,
        }
    }
}

impl fmt::Display for AggregateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.op, self.column)
    }
}

/// Parse an `--aggregate` string of the form `op(column)`, e.g. `SUM(id)`.
pub fn parse_aggregate(input: &str) -> EvalResult<AggregateRequest> {
    let malformed = |message: &str| EvalError::MalformedAggregateExpression {
        input: input.to_string(),
        message: message.to_string(),
    };
    let trimmed = input.trim();
    let (op, rest) = trimmed
        .split_once('(')
        .ok_or_else(|| malformed("expected op(column)"))?;
    let column = rest
        .strip_suffix(')')
        .ok_or_else(|| malformed("missing closing ')'"))?
        .trim();
    if column.is_empty() || column.contains(['(', ')']) {
        return Err(malformed("expected a single column name"));
    }
    let op = op.parse::<ReduceOp>().map_err(|_| malformed("unknown aggregate op"))?;
    Ok(AggregateRequest::new(column, op))
}

/// Fold `column` across the model's rows into one scalar.
///
/// This is a stable left-to-right fold: the first contributing row seeds the accumulator via
/// [`crate::registry::ReducerEntry::init`] and every later row applies
/// [`crate::registry::ReducerEntry::fold`] in collection order. Floating-point results therefore
/// depend on row order and are reproducible for a given order.
///
/// - `Count` counts rows (including nulls) and returns `Int64`; an empty collection gives `0`.
/// - `Sum`/`Min`/`Max` preserve the column type; `Avg` returns `Float64`. Nulls are skipped, and
///   if no value contributes the result is [`Value::Null`].
pub fn evaluate_aggregate<M: RowModel>(
    model: &M,
    column: &str,
    op: ReduceOp,
    reducers: &ReducerRegistry,
) -> EvalResult<Value> {
    let entry = reducers.lookup(column)?;
    entry.check(column, op)?;

    let mut acc: Option<Accumulator> = None;
    for row in model.rows() {
        let value = row.field(column).ok_or_else(|| EvalError::UnreadableColumn {
            column: column.to_string(),
            row_type: std::any::type_name::<M::Row>().to_string(),
        })?;
        if value.is_null() && op != ReduceOp::Count {
            continue;
        }
        acc = Some(match acc {
            None => entry.init(column, &value, op)?,
            Some(a) => entry.fold(column, &value, a, op)?,
        });
    }
    Ok(entry.finish(acc, op))
}

/// Reduce a column using a built-in [`ReduceOp`], taking the request as one value.
pub fn reduce<M: RowModel>(
    model: &M,
    request: &AggregateRequest,
    reducers: &ReducerRegistry,
) -> EvalResult<Value> {
    evaluate_aggregate(model, &request.column, request.op, reducers)
}
