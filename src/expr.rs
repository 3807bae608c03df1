//! Filter expression model (disjunctive normal form) and the `--filter` string parser.
//!
//! A [`UnionList`] is an OR over [`IntersectionList`]s, each of which is an AND over
//! [`FilterTerm`]s. Parsing does not know about row types; column names and literals are only
//! checked against a registry at evaluation time.
//!
//! ```rust
//! use rowfilter::expr::{parse_filter, FilterSyntax, Operator};
//!
//! let union = parse_filter("id>2 || adminState==Disabled", &FilterSyntax::default()).unwrap();
//! assert_eq!(union.groups.len(), 2);
//! assert_eq!(union.groups[0].terms[0].operator, Operator::Gt);
//! ```

use std::fmt;

use serde::Deserialize;

use crate::error::{EvalError, EvalResult};

/// Comparison operator of a [`FilterTerm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    /// Canonical symbol used when printing the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
        }
    }

    /// Whether the operator needs an ordered kind (numeric columns only).
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
        )
    }

    /// Map an [`std::cmp::Ordering`] of `live` against `literal` to the operator's verdict.
    pub fn holds(self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Operator::Eq => ord == Equal,
            Operator::Neq => ord != Equal,
            Operator::Gt => ord == Greater,
            Operator::Gte => ord != Less,
            Operator::Lt => ord == Less,
            Operator::Lte => ord != Greater,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single `(column, operator, literal)` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTerm {
    pub column: String,
    pub operator: Operator,
    pub literal: String,
}

impl FilterTerm {
    pub fn new(column: impl Into<String>, operator: Operator, literal: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            literal: literal.into(),
        }
    }
}

impl fmt::Display for FilterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.column, self.operator, self.literal)
    }
}

/// AND-group of terms. An empty list is vacuously true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntersectionList {
    pub terms: Vec<FilterTerm>,
}

impl IntersectionList {
    pub fn new(terms: Vec<FilterTerm>) -> Self {
        Self { terms }
    }
}

impl FromIterator<FilterTerm> for IntersectionList {
    fn from_iter<I: IntoIterator<Item = FilterTerm>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// OR-group of [`IntersectionList`]s: the full filter expression.
///
/// An empty union applies no filtering at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnionList {
    pub groups: Vec<IntersectionList>,
}

impl UnionList {
    pub fn new(groups: Vec<IntersectionList>) -> Self {
        Self { groups }
    }

    /// Returns `true` when no filter was requested.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate every term in declared order (groups left to right, terms left to right).
    pub fn terms(&self) -> impl Iterator<Item = &FilterTerm> {
        self.groups.iter().flat_map(|g| g.terms.iter())
    }
}

impl FromIterator<IntersectionList> for UnionList {
    fn from_iter<I: IntoIterator<Item = IntersectionList>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Separator tokens of the `--filter` grammar.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterSyntax {
    /// Joins terms into an [`IntersectionList`].
    pub and_token: String,
    /// Joins AND-groups into the [`UnionList`].
    pub or_token: String,
}

impl Default for FilterSyntax {
    fn default() -> Self {
        Self {
            and_token: "&&".to_string(),
            or_token: "||".to_string(),
        }
    }
}

const OPERATOR_CHARS: &[char] = &['=', '!', '<', '>'];

/// Parse a `--filter` string into a [`UnionList`].
///
/// The input is split on [`FilterSyntax::or_token`] first, then on [`FilterSyntax::and_token`].
/// Each term must read `<column><op><literal>` with `op` one of `==`, `=`, `!=`, `>`, `>=`, `<`,
/// `<=`. An empty (or all-whitespace) input yields an empty union.
pub fn parse_filter(input: &str, syntax: &FilterSyntax) -> EvalResult<UnionList> {
    check_syntax(syntax)?;
    if input.trim().is_empty() {
        return Ok(UnionList::default());
    }

    input
        .split(syntax.or_token.as_str())
        .map(|group| {
            group
                .split(syntax.and_token.as_str())
                .map(parse_term)
                .collect::<EvalResult<IntersectionList>>()
        })
        .collect()
}

fn check_syntax(syntax: &FilterSyntax) -> EvalResult<()> {
    let (and, or) = (syntax.and_token.as_str(), syntax.or_token.as_str());
    let bad = if and.is_empty() || or.is_empty() {
        Some("separator tokens must be non-empty")
    } else if and == or || and.contains(or) || or.contains(and) {
        Some("AND and OR separators must be distinct")
    } else if and.contains(OPERATOR_CHARS) || or.contains(OPERATOR_CHARS) {
        Some("separators must not contain operator characters")
    } else {
        None
    };
    match bad {
        Some(message) => Err(EvalError::MalformedFilterExpression {
            token: format!("{and} {or}"),
            message: message.to_string(),
        }),
        None => Ok(()),
    }
}

/// Parse one `<column><op><literal>` term.
pub fn parse_term(raw: &str) -> EvalResult<FilterTerm> {
    let token = raw.trim();
    let malformed = |message: &str| EvalError::MalformedFilterExpression {
        token: token.to_string(),
        message: message.to_string(),
    };

    if token.is_empty() {
        return Err(malformed("empty term"));
    }
    let op_start = token
        .find(OPERATOR_CHARS)
        .ok_or_else(|| malformed("missing comparison operator"))?;

    let rest = &token[op_start..];
    let (operator, op_len) = if rest.starts_with("==") {
        (Operator::Eq, 2)
    } else if rest.starts_with("!=") {
        (Operator::Neq, 2)
    } else if rest.starts_with(">=") {
        (Operator::Gte, 2)
    } else if rest.starts_with("<=") {
        (Operator::Lte, 2)
    } else if rest.starts_with('=') {
        (Operator::Eq, 1)
    } else if rest.starts_with('>') {
        (Operator::Gt, 1)
    } else if rest.starts_with('<') {
        (Operator::Lt, 1)
    } else {
        return Err(malformed("unknown comparison operator"));
    };

    let column = token[..op_start].trim();
    let literal = rest[op_len..].trim();
    if column.is_empty() {
        return Err(malformed("missing column name"));
    }
    if literal.is_empty() {
        return Err(malformed("missing literal"));
    }
    if literal.contains(OPERATOR_CHARS) {
        return Err(malformed("expected exactly one comparison operator"));
    }

    Ok(FilterTerm::new(column, operator, literal))
}
