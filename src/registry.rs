//! Per-row-type column registries.
//!
//! A [`ComparatorRegistry`] maps column names to [`ComparatorEntry`] verifiers (literal parsing and
//! comparison), a [`ReducerRegistry`] maps them to [`ReducerEntry`] aggregators (seed and fold).
//! [`ColumnRegistry`] bundles both so that a single [`ColumnRegistry::register_column`] call
//! installs a column for filtering and aggregation alike.
//!
//! Registries are append-only: they are built once when a command registers its row type and are
//! read-only afterwards, so they can be shared freely across threads.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{EvalError, EvalResult};
use crate::expr::Operator;
use crate::processing::ReduceOp;
use crate::types::{ColumnKind, Value};

/// Comparison capability for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparatorEntry {
    kind: ColumnKind,
    accepted: Option<Vec<String>>,
}

impl ComparatorEntry {
    pub fn new(kind: ColumnKind) -> Self {
        Self {
            kind,
            accepted: None,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Values a symbolic column accepts in filter literals, if restricted.
    pub fn accepted_values(&self) -> Option<&[String]> {
        self.accepted.as_deref()
    }

    /// Parse a filter literal into the column's native form.
    pub fn parse_literal(&self, column: &str, literal: &str) -> EvalResult<Value> {
        let invalid = |hint: String| EvalError::InvalidFilterLiteral {
            column: column.to_string(),
            literal: literal.to_string(),
            kind: self.kind,
            hint,
        };
        match self.kind {
            ColumnKind::Integer => literal
                .parse::<i64>()
                .map(Value::Int64)
                .map_err(|e| invalid(format!(": {e}"))),
            ColumnKind::Real => match literal.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Value::Float64(v)),
                Ok(_) => Err(invalid(": value must be finite".to_string())),
                Err(e) => Err(invalid(format!(": {e}"))),
            },
            ColumnKind::String => Ok(Value::Utf8(literal.to_string())),
            ColumnKind::Symbolic => match &self.accepted {
                Some(accepted) if !accepted.iter().any(|a| a == literal) => Err(invalid(format!(
                    " (accepted: {})",
                    accepted.join(", ")
                ))),
                _ => Ok(Value::Utf8(literal.to_string())),
            },
        }
    }

    /// Reject ordering operators on kinds without a numeric order.
    pub fn check_operator(&self, column: &str, operator: Operator) -> EvalResult<()> {
        if operator.is_ordering() && !self.kind.is_numeric() {
            return Err(EvalError::UnsupportedOperator {
                column: column.to_string(),
                operator: operator.symbol().to_string(),
                kind: self.kind,
            });
        }
        Ok(())
    }

    /// Evaluate `operator(live, literal)`.
    ///
    /// `literal` must come from [`Self::parse_literal`]. A null live value never matches.
    pub fn compare(
        &self,
        column: &str,
        operator: Operator,
        live: &Value,
        literal: &Value,
    ) -> EvalResult<bool> {
        self.check_operator(column, operator)?;
        let Some(live) = coerce(column, self.kind, live)? else {
            return Ok(false);
        };
        let verdict = match (&live, literal) {
            (Value::Int64(a), Value::Int64(b)) => operator.holds(a.cmp(b)),
            (Value::Float64(a), Value::Float64(b)) => match a.partial_cmp(b) {
                Some(ord) => operator.holds(ord),
                // NaN is unordered: it differs from every literal and satisfies nothing else
                None => operator == Operator::Neq,
            },
            (Value::Utf8(a), Value::Utf8(b)) => match operator {
                Operator::Eq => a == b,
                Operator::Neq => a != b,
                _ => false,
            },
            _ => false,
        };
        Ok(verdict)
    }
}

/// Running state of one aggregate fold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Accumulator {
    Int(i64),
    Real(f64),
    Count(i64),
    IntMean { sum: i128, count: u64 },
    RealMean { sum: f64, count: u64 },
}

/// Aggregation capability for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReducerEntry {
    kind: ColumnKind,
}

impl ReducerEntry {
    pub fn new(kind: ColumnKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Reject numeric-only ops on non-numeric columns.
    pub fn check(&self, column: &str, op: ReduceOp) -> EvalResult<()> {
        if op != ReduceOp::Count && !self.kind.is_numeric() {
            return Err(EvalError::UnsupportedAggregate {
                column: column.to_string(),
                op,
                kind: self.kind,
            });
        }
        Ok(())
    }

    /// Seed the accumulator from the first contributing value.
    pub fn init(&self, column: &str, value: &Value, op: ReduceOp) -> EvalResult<Accumulator> {
        self.check(column, op)?;
        if op == ReduceOp::Count {
            return Ok(Accumulator::Count(1));
        }
        let acc = match (coerce_required(column, self.kind, value)?, op) {
            (Value::Int64(v), ReduceOp::Avg) => Accumulator::IntMean {
                sum: i128::from(v),
                count: 1,
            },
            (Value::Int64(v), _) => Accumulator::Int(v),
            (Value::Float64(v), ReduceOp::Avg) => Accumulator::RealMean { sum: v, count: 1 },
            (Value::Float64(v), _) => Accumulator::Real(v),
            (other, _) => return Err(mismatch(column, self.kind, &other)),
        };
        Ok(acc)
    }

    /// Fold one more value into `acc`.
    pub fn fold(
        &self,
        column: &str,
        value: &Value,
        acc: Accumulator,
        op: ReduceOp,
    ) -> EvalResult<Accumulator> {
        if let Accumulator::Count(n) = acc {
            return Ok(Accumulator::Count(n + 1));
        }
        let overflow = || EvalError::AggregateOverflow {
            column: column.to_string(),
            op,
        };
        let next = match (acc, coerce_required(column, self.kind, value)?) {
            (Accumulator::Int(a), Value::Int64(v)) => Accumulator::Int(match op {
                ReduceOp::Sum => a.checked_add(v).ok_or_else(overflow)?,
                ReduceOp::Min => a.min(v),
                ReduceOp::Max => a.max(v),
                ReduceOp::Count | ReduceOp::Avg => a,
            }),
            (Accumulator::Real(a), Value::Float64(v)) => Accumulator::Real(match op {
                ReduceOp::Sum => a + v,
                ReduceOp::Min => a.min(v),
                ReduceOp::Max => a.max(v),
                ReduceOp::Count | ReduceOp::Avg => a,
            }),
            (Accumulator::IntMean { sum, count }, Value::Int64(v)) => Accumulator::IntMean {
                sum: sum + i128::from(v),
                count: count + 1,
            },
            (Accumulator::RealMean { sum, count }, Value::Float64(v)) => Accumulator::RealMean {
                sum: sum + v,
                count: count + 1,
            },
            (_, other) => return Err(mismatch(column, self.kind, &other)),
        };
        Ok(next)
    }

    /// Turn a finished accumulator into the scalar result.
    pub fn finish(&self, acc: Option<Accumulator>, op: ReduceOp) -> Value {
        match acc {
            None if op == ReduceOp::Count => Value::Int64(0),
            None => Value::Null,
            Some(Accumulator::Int(v)) | Some(Accumulator::Count(v)) => Value::Int64(v),
            Some(Accumulator::Real(v)) => Value::Float64(v),
            Some(Accumulator::IntMean { sum, count }) => Value::Float64(sum as f64 / count as f64),
            Some(Accumulator::RealMean { sum, count }) => Value::Float64(sum / count as f64),
        }
    }
}

/// Coerce a live value into the column's kind. `Ok(None)` means the value is null.
fn coerce(column: &str, kind: ColumnKind, live: &Value) -> EvalResult<Option<Value>> {
    match (kind, live) {
        (_, Value::Null) => Ok(None),
        (ColumnKind::Integer, Value::Int64(_))
        | (ColumnKind::Real, Value::Float64(_))
        | (ColumnKind::String | ColumnKind::Symbolic, Value::Utf8(_)) => Ok(Some(live.clone())),
        (ColumnKind::Real, Value::Int64(v)) => Ok(Some(Value::Float64(*v as f64))),
        (_, other) => Err(mismatch(column, kind, other)),
    }
}

fn coerce_required(column: &str, kind: ColumnKind, live: &Value) -> EvalResult<Value> {
    coerce(column, kind, live)?.ok_or_else(|| mismatch(column, kind, live))
}

fn mismatch(column: &str, expected: ColumnKind, found: &Value) -> EvalError {
    EvalError::FieldKindMismatch {
        column: column.to_string(),
        expected,
        found: format!("{found:?}"),
    }
}

/// Column name → [`ComparatorEntry`] for one row type.
#[derive(Debug, Clone, Default)]
pub struct ComparatorRegistry {
    entries: HashMap<String, ComparatorEntry>,
    order: Vec<String>,
}

impl ComparatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a column. Re-registering an existing column keeps the first entry.
    pub fn register(&mut self, column: &str, kind: ColumnKind) {
        if !self.entries.contains_key(column) {
            self.entries
                .insert(column.to_string(), ComparatorEntry::new(kind));
            self.order.push(column.to_string());
        }
    }

    /// Restrict the literals a registered symbolic column accepts.
    pub fn accept_values(&mut self, column: &str, values: &[&str]) {
        if let Some(entry) = self.entries.get_mut(column) {
            entry
                .accepted
                .get_or_insert_with(Vec::new)
                .extend(values.iter().map(|v| v.to_string()));
        }
    }

    pub fn get(&self, column: &str) -> Option<&ComparatorEntry> {
        self.entries.get(column)
    }

    /// Look up a column, failing with [`EvalError::UnknownFilterColumn`].
    pub fn lookup(&self, column: &str) -> EvalResult<&ComparatorEntry> {
        self.get(column)
            .ok_or_else(|| EvalError::UnknownFilterColumn {
                column: column.to_string(),
                available: self.order.join(", "),
            })
    }

    /// Registered column names in registration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Column name → [`ReducerEntry`] for one row type.
#[derive(Debug, Clone, Default)]
pub struct ReducerRegistry {
    entries: HashMap<String, ReducerEntry>,
    order: Vec<String>,
}

impl ReducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a column. Re-registering an existing column keeps the first entry.
    pub fn register(&mut self, column: &str, kind: ColumnKind) {
        if !self.entries.contains_key(column) {
            self.entries
                .insert(column.to_string(), ReducerEntry::new(kind));
            self.order.push(column.to_string());
        }
    }

    pub fn get(&self, column: &str) -> Option<&ReducerEntry> {
        self.entries.get(column)
    }

    /// Look up a column, failing with [`EvalError::UnknownAggregateColumn`].
    pub fn lookup(&self, column: &str) -> EvalResult<&ReducerEntry> {
        self.get(column)
            .ok_or_else(|| EvalError::UnknownAggregateColumn {
                column: column.to_string(),
                available: self.order.join(", "),
            })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// One column declaration, as loaded from a JSON registry description.
///
/// ```json
/// [{"column": "linkState", "kind": "symbolic", "accepted": ["Up", "Down"]}]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnSpec {
    pub column: String,
    pub kind: ColumnKind,
    #[serde(default)]
    pub accepted: Vec<String>,
}

/// Comparator and reducer registries for one row type.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    pub comparators: ComparatorRegistry,
    pub reducers: ReducerRegistry,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `column` with `kind` for both filtering and aggregation.
    pub fn register_column(&mut self, column: &str, kind: ColumnKind) -> &mut Self {
        self.comparators.register(column, kind);
        self.reducers.register(column, kind);
        self
    }

    /// Restrict the filter literals accepted by a symbolic column.
    pub fn accept_values(&mut self, column: &str, values: &[&str]) -> &mut Self {
        self.comparators.accept_values(column, values);
        self
    }

    /// Build a registry from column declarations, in order.
    pub fn from_specs(specs: &[ColumnSpec]) -> Self {
        let mut registry = Self::new();
        for spec in specs {
            registry.register_column(&spec.column, spec.kind);
            if !spec.accepted.is_empty() {
                let accepted: Vec<&str> = spec.accepted.iter().map(String::as_str).collect();
                registry.accept_values(&spec.column, &accepted);
            }
        }
        registry
    }

    /// Build a registry from a JSON array of [`ColumnSpec`]s.
    pub fn from_json_str(input: &str) -> EvalResult<Self> {
        let specs: Vec<ColumnSpec> =
            serde_json::from_str(input).map_err(|e| EvalError::InvalidModelDocument {
                message: format!("column registry: {e}"),
            })?;
        Ok(Self::from_specs(&specs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ColumnRegistry {
        let mut r = ColumnRegistry::new();
        r.register_column("id", ColumnKind::Integer)
            .register_column("speed", ColumnKind::Real)
            .register_column("name", ColumnKind::String)
            .register_column("linkState", ColumnKind::Symbolic)
            .accept_values("linkState", &["Up", "Down"]);
        r
    }

    #[test]
    fn parses_literals_by_kind() {
        let r = registry();
        let c = &r.comparators;
        assert_eq!(c.lookup("id").unwrap().parse_literal("id", "42").unwrap(), Value::Int64(42));
        assert_eq!(
            c.lookup("speed").unwrap().parse_literal("speed", "2.5").unwrap(),
            Value::Float64(2.5)
        );
        assert_eq!(
            c.lookup("name").unwrap().parse_literal("name", "eth1/1/1").unwrap(),
            Value::Utf8("eth1/1/1".to_string())
        );
    }

    #[test]
    fn invalid_literal_names_column_and_literal() {
        let r = registry();
        let err = r.comparators.lookup("id").unwrap().parse_literal("id", "abc").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'abc'") && msg.contains("'id'"), "{msg}");

        let err = r.comparators.lookup("speed").unwrap().parse_literal("speed", "inf").unwrap_err();
        assert!(matches!(err, EvalError::InvalidFilterLiteral { .. }));
    }

    #[test]
    fn symbolic_literal_outside_accepted_set_is_rejected() {
        let r = registry();
        let entry = r.comparators.lookup("linkState").unwrap();
        assert!(entry.parse_literal("linkState", "Up").is_ok());
        let msg = entry.parse_literal("linkState", "up").unwrap_err().to_string();
        assert!(msg.contains("accepted: Up, Down"), "{msg}");
    }

    #[test]
    fn unknown_column_lists_available_columns() {
        let r = registry();
        let msg = r.comparators.lookup("ID").unwrap_err().to_string();
        assert!(msg.contains("'ID'"));
        assert!(msg.contains("id, speed, name, linkState"), "{msg}");
    }

    #[test]
    fn ordering_operators_need_numeric_columns() {
        let r = registry();
        let entry = r.comparators.lookup("linkState").unwrap();
        assert!(entry.check_operator("linkState", Operator::Eq).is_ok());
        assert!(entry.check_operator("linkState", Operator::Neq).is_ok());
        for op in [Operator::Gt, Operator::Gte, Operator::Lt, Operator::Lte] {
            assert!(matches!(
                entry.check_operator("linkState", op),
                Err(EvalError::UnsupportedOperator { .. })
            ));
        }
    }

    #[test]
    fn compares_numeric_values() {
        let r = registry();
        let id = r.comparators.lookup("id").unwrap();
        let lit = Value::Int64(2);
        assert!(id.compare("id", Operator::Gt, &Value::Int64(3), &lit).unwrap());
        assert!(!id.compare("id", Operator::Gt, &Value::Int64(2), &lit).unwrap());
        assert!(id.compare("id", Operator::Gte, &Value::Int64(2), &lit).unwrap());
        assert!(id.compare("id", Operator::Lte, &Value::Int64(1), &lit).unwrap());
        assert!(id.compare("id", Operator::Neq, &Value::Int64(1), &lit).unwrap());

        let speed = r.comparators.lookup("speed").unwrap();
        // integer live values widen into real columns
        assert!(speed
            .compare("speed", Operator::Eq, &Value::Int64(100), &Value::Float64(100.0))
            .unwrap());
    }

    #[test]
    fn null_never_matches_and_wrong_variant_is_an_error() {
        let r = registry();
        let id = r.comparators.lookup("id").unwrap();
        assert!(!id.compare("id", Operator::Neq, &Value::Null, &Value::Int64(1)).unwrap());
        let err = id
            .compare("id", Operator::Eq, &Value::Utf8("1".to_string()), &Value::Int64(1))
            .unwrap_err();
        assert!(matches!(err, EvalError::FieldKindMismatch { .. }));
    }

    #[test]
    fn reducer_folds_left_to_right() {
        let r = registry();
        let id = r.reducers.lookup("id").unwrap();
        let acc = id.init("id", &Value::Int64(1), ReduceOp::Sum).unwrap();
        let acc = id.fold("id", &Value::Int64(2), acc, ReduceOp::Sum).unwrap();
        let acc = id.fold("id", &Value::Int64(3), acc, ReduceOp::Sum).unwrap();
        assert_eq!(id.finish(Some(acc), ReduceOp::Sum), Value::Int64(6));
    }

    #[test]
    fn integer_sum_overflow_is_reported() {
        let r = registry();
        let id = r.reducers.lookup("id").unwrap();
        let acc = id.init("id", &Value::Int64(i64::MAX), ReduceOp::Sum).unwrap();
        let err = id.fold("id", &Value::Int64(1), acc, ReduceOp::Sum).unwrap_err();
        assert!(matches!(err, EvalError::AggregateOverflow { .. }));
    }

    #[test]
    fn integer_mean_survives_a_sum_past_i64() {
        let r = registry();
        let id = r.reducers.lookup("id").unwrap();
        let acc = id.init("id", &Value::Int64(i64::MAX), ReduceOp::Avg).unwrap();
        let acc = id.fold("id", &Value::Int64(i64::MAX), acc, ReduceOp::Avg).unwrap();
        assert_eq!(id.finish(Some(acc), ReduceOp::Avg), Value::Float64(i64::MAX as f64));

        let acc = id.init("id", &Value::Int64(i64::MIN), ReduceOp::Avg).unwrap();
        let acc = id.fold("id", &Value::Int64(i64::MIN), acc, ReduceOp::Avg).unwrap();
        assert_eq!(id.finish(Some(acc), ReduceOp::Avg), Value::Float64(i64::MIN as f64));
    }

    #[test]
    fn nan_live_value_only_satisfies_not_equal() {
        let r = registry();
        let speed = r.comparators.lookup("speed").unwrap();
        let lit = Value::Float64(5.0);
        let nan = Value::Float64(f64::NAN);
        assert!(speed.compare("speed", Operator::Neq, &nan, &lit).unwrap());
        for op in [Operator::Eq, Operator::Gt, Operator::Gte, Operator::Lt, Operator::Lte] {
            assert!(!speed.compare("speed", op, &nan, &lit).unwrap(), "{op:?}");
        }
    }

    #[test]
    fn numeric_aggregates_rejected_on_strings() {
        let r = registry();
        let name = r.reducers.lookup("name").unwrap();
        assert!(name.check("name", ReduceOp::Count).is_ok());
        assert!(matches!(
            name.check("name", ReduceOp::Sum),
            Err(EvalError::UnsupportedAggregate { .. })
        ));
    }

    #[test]
    fn registry_loads_from_json_specs() {
        let r = ColumnRegistry::from_json_str(
            r#"[
                {"column": "id", "kind": "integer"},
                {"column": "linkState", "kind": "symbolic", "accepted": ["Up", "Down"]}
            ]"#,
        )
        .unwrap();
        let cols: Vec<&str> = r.reducers.columns().collect();
        assert_eq!(cols, vec!["id", "linkState"]);
        let entry = r.comparators.lookup("linkState").unwrap();
        assert_eq!(entry.accepted_values(), Some(&["Up".to_string(), "Down".to_string()][..]));

        assert!(ColumnRegistry::from_json_str(r#"[{"column": "x", "kind": "bool"}]"#).is_err());
    }

    #[test]
    fn empty_fold_finishes_to_null_or_zero() {
        let entry = ReducerEntry::new(ColumnKind::Integer);
        assert_eq!(entry.finish(None, ReduceOp::Count), Value::Int64(0));
        assert_eq!(entry.finish(None, ReduceOp::Max), Value::Null);
    }
}
