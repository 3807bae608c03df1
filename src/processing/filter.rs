//! Filter evaluation over a model's row collection.

use crate::error::{EvalError, EvalResult};
use crate::expr::{Operator, UnionList};
use crate::registry::{ComparatorEntry, ComparatorRegistry};
use crate::row::{Row, RowModel};
use crate::types::Value;

/// One term resolved against a registry: entry looked up and literal parsed.
#[derive(Debug, Clone)]
struct CompiledTerm<'r> {
    column: &'r str,
    operator: Operator,
    entry: &'r ComparatorEntry,
    literal: Value,
}

/// A [`UnionList`] checked against a [`ComparatorRegistry`].
///
/// Compilation validates every term in declared order (unknown column, bad literal, unsupported
/// operator), so evaluation errors never depend on row content.
#[derive(Debug, Clone)]
pub struct CompiledFilter<'r> {
    groups: Vec<Vec<CompiledTerm<'r>>>,
}

impl<'r> CompiledFilter<'r> {
    pub fn compile(union: &'r UnionList, comparators: &'r ComparatorRegistry) -> EvalResult<Self> {
        let groups = union
            .groups
            .iter()
            .map(|group| {
                group
                    .terms
                    .iter()
                    .map(|term| -> EvalResult<CompiledTerm<'r>> {
                        let entry = comparators.lookup(&term.column)?;
                        let literal = entry.parse_literal(&term.column, &term.literal)?;
                        entry.check_operator(&term.column, term.operator)?;
                        Ok(CompiledTerm {
                            column: term.column.as_str(),
                            operator: term.operator,
                            entry,
                            literal,
                        })
                    })
                    .collect::<EvalResult<Vec<_>>>()
            })
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(Self { groups })
    }

    /// Number of terms across all groups.
    pub fn term_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// OR over groups of (AND over terms), short-circuiting left to right.
    pub fn satisfies<R: Row>(&self, row: &R) -> EvalResult<bool> {
        for group in &self.groups {
            if self.group_matches(group, row)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Drop the rows of `model` that do not satisfy the filter, keeping survivors in order.
    ///
    /// Every row is evaluated before any is removed, so an error leaves the model untouched.
    /// Returns the number of rows removed.
    pub fn retain<M: RowModel>(&self, model: &mut M) -> EvalResult<usize> {
        let keep = model
            .rows()
            .iter()
            .map(|row| self.satisfies(row))
            .collect::<EvalResult<Vec<bool>>>()?;

        let rows = model.rows_mut();
        let before = rows.len();
        let mut verdicts = keep.into_iter();
        rows.retain(|_| verdicts.next().unwrap_or(false));
        Ok(before - rows.len())
    }

    fn group_matches<R: Row>(&self, group: &[CompiledTerm<'r>], row: &R) -> EvalResult<bool> {
        for term in group {
            let live = row.field(term.column).ok_or_else(|| EvalError::UnreadableColumn {
                column: term.column.to_string(),
                row_type: std::any::type_name::<R>().to_string(),
            })?;
            if !term
                .entry
                .compare(term.column, term.operator, &live, &term.literal)?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Apply `union` to the model's rows, keeping matching rows in their original order.
///
/// An empty union returns the model unchanged. On error the model's rows are left untouched;
/// a partially filtered collection is never produced.
pub fn evaluate_filter<M: RowModel>(
    mut model: M,
    union: &UnionList,
    comparators: &ComparatorRegistry,
) -> EvalResult<M> {
    filter_in_place(&mut model, union, comparators)?;
    Ok(model)
}

/// In-place variant of [`evaluate_filter`]. Returns the number of rows removed.
pub fn filter_in_place<M: RowModel>(
    model: &mut M,
    union: &UnionList,
    comparators: &ComparatorRegistry,
) -> EvalResult<usize> {
    if union.is_empty() {
        return Ok(0);
    }
    CompiledFilter::compile(union, comparators)?.retain(model)
}
