use thiserror::Error;

use crate::processing::ReduceOp;
use crate::types::ColumnKind;

/// Convenience result type for parsing and evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Error type returned by filter/aggregate parsing and evaluation.
///
/// All variants are deterministic, input-derived failures. Each one carries the offending
/// column and/or literal verbatim so the invocation can be corrected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A `--filter` term does not split into `<column><operator><literal>`.
    #[error("malformed filter expression at '{token}': {message}")]
    MalformedFilterExpression { token: String, message: String },

    /// An `--aggregate` request is not of the form `op(column)`.
    #[error("malformed aggregate expression '{input}': {message}")]
    MalformedAggregateExpression { input: String, message: String },

    /// The column is not registered for this row type.
    #[error("unknown filter column '{column}' (available: {available})")]
    UnknownFilterColumn { column: String, available: String },

    /// The aggregate column is not registered for this row type.
    #[error("unknown aggregate column '{column}' (available: {available})")]
    UnknownAggregateColumn { column: String, available: String },

    /// The literal cannot be parsed into the column's kind.
    #[error("invalid literal '{literal}' for {kind} column '{column}'{hint}")]
    InvalidFilterLiteral {
        column: String,
        literal: String,
        kind: ColumnKind,
        hint: String,
    },

    /// An ordering operator was applied to a column without a numeric order.
    #[error("operator '{operator}' is not supported on {kind} column '{column}'")]
    UnsupportedOperator {
        column: String,
        operator: String,
        kind: ColumnKind,
    },

    /// A numeric-only aggregate was requested on a non-numeric column.
    #[error("aggregate '{op}' is not supported on {kind} column '{column}'")]
    UnsupportedAggregate {
        column: String,
        op: ReduceOp,
        kind: ColumnKind,
    },

    /// An integer fold left the `i64` range.
    #[error("aggregate '{op}' overflowed on column '{column}'")]
    AggregateOverflow { column: String, op: ReduceOp },

    /// A live row value does not fit the kind registered for its column.
    #[error("field '{column}' holds '{found}', which is not a {expected} value")]
    FieldKindMismatch {
        column: String,
        expected: ColumnKind,
        found: String,
    },

    /// The column is registered, but the row type has no accessor for it.
    #[error("column '{column}' is registered but {row_type} rows do not expose it")]
    UnreadableColumn { column: String, row_type: String },

    /// The model does not expose exactly one row collection.
    #[error("model must expose exactly one row collection, found {found}")]
    AmbiguousRowCollection { found: String },

    /// A JSON result document could not be read as a model.
    #[error("invalid model document: {message}")]
    InvalidModelDocument { message: String },

    /// The command's model does not allow `--filter`.
    #[error("filtering is not supported for '{model}'")]
    FilteringNotSupported { model: String },

    /// The command's model does not allow `--aggregate`.
    #[error("aggregation is not supported for '{model}'")]
    AggregationNotSupported { model: String },
}
