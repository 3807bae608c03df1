//! Filter and aggregate evaluators.
//!
//! Both evaluators are generic over [`crate::row::RowModel`] and take the row type's registry
//! explicitly. They are synchronous, single-threaded, and never retain the model past the call.
//!
//! - [`evaluate_filter()`]: drop rows that fail a [`crate::expr::UnionList`], preserving order
//! - [`evaluate_aggregate()`]: fold one column into a scalar (count/sum/min/max/avg)
//!
//! ## Example: filter → aggregate
//!
//! ```rust
//! use rowfilter::expr::{parse_filter, FilterSyntax};
//! use rowfilter::filterable_row;
//! use rowfilter::processing::{evaluate_aggregate, evaluate_filter, ReduceOp};
//! use rowfilter::row::StaticRow;
//! use rowfilter::types::Value;
//!
//! struct Port {
//!     id: i32,
//!     link_state: &'static str,
//! }
//!
//! filterable_row!(Port {
//!     "id" => Integer, |p| p.id,
//!     "linkState" => Symbolic["Up", "Down"], |p| p.link_state,
//! });
//!
//! let rows = vec![
//!     Port { id: 1, link_state: "Down" },
//!     Port { id: 2, link_state: "Up" },
//!     Port { id: 3, link_state: "Up" },
//! ];
//!
//! let union = parse_filter("linkState==Up", &FilterSyntax::default()).unwrap();
//! let up = evaluate_filter(rows, &union, &Port::registry().comparators).unwrap();
//! let sum = evaluate_aggregate(&up, "id", ReduceOp::Sum, &Port::registry().reducers).unwrap();
//! assert_eq!(sum, Value::Int64(5));
//! ```

pub mod filter;
pub mod reduce;

pub use filter::{evaluate_filter, filter_in_place, CompiledFilter};
pub use reduce::{evaluate_aggregate, parse_aggregate, reduce, AggregateRequest, ReduceOp};
