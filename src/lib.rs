//! `rowfilter` is the filter-and-aggregate engine behind a network CLI's `--filter` and
//! `--aggregate` flags.
//!
//! Given the typed result of a remote query (a *model* holding one collection of homogeneous
//! *rows*), it drops every row that fails a user-supplied boolean expression and folds one column
//! of the surviving rows into a single scalar. It works uniformly across unrelated row types
//! (port status, ARP entries, firmware entries, ...) without any per-type filter code.
//!
//! ## Filter syntax
//!
//! A filter is a disjunction of conjunctions (DNF). With the default [`expr::FilterSyntax`]:
//!
//! ```text
//! linkState==Down && adminState==Disabled || id>2
//! ```
//!
//! - terms read `<column><op><literal>` with `op` one of `==` (or `=`), `!=`, `>`, `>=`, `<`, `<=`
//! - `&&` joins terms into an AND-group, `||` joins AND-groups
//! - ordering operators are only valid on numeric columns
//!
//! ## Column kinds
//!
//! Each row type registers its columns with a [`types::ColumnKind`]:
//!
//! - [`types::ColumnKind::Integer`], [`types::ColumnKind::Real`]: numeric, all operators, all
//!   aggregates
//! - [`types::ColumnKind::String`]: `==`/`!=` only, `count` only
//! - [`types::ColumnKind::Symbolic`]: like `String`, optionally restricted to accepted values
//!
//! ## Example: filter → aggregate
//!
//! ```rust
//! use rowfilter::execution::{EvaluationOptions, Evaluator};
//! use rowfilter::types::Value;
//! use rowfilter::{filterable_row, row_model};
//!
//! struct PortEntry {
//!     id: i32,
//!     name: String,
//!     link_state: &'static str,
//!     admin_state: &'static str,
//! }
//!
//! filterable_row!(PortEntry {
//!     "id" => Integer, |p| p.id,
//!     "name" => String, |p| &p.name,
//!     "linkState" => Symbolic["Up", "Down"], |p| p.link_state,
//!     "adminState" => Symbolic["Enabled", "Disabled"], |p| p.admin_state,
//! });
//!
//! struct ShowPortModel {
//!     port_entries: Vec<PortEntry>,
//! }
//!
//! row_model!(ShowPortModel => port_entries: PortEntry);
//!
//! let model = ShowPortModel {
//!     port_entries: vec![
//!         PortEntry { id: 1, name: "eth1/1/1".into(), link_state: "Down", admin_state: "Enabled" },
//!         PortEntry { id: 2, name: "eth1/2/1".into(), link_state: "Down", admin_state: "Disabled" },
//!         PortEntry { id: 3, name: "eth1/3/1".into(), link_state: "Up", admin_state: "Enabled" },
//!     ],
//! };
//!
//! let evaluator = Evaluator::new(EvaluationOptions::default());
//! let options = evaluator
//!     .parse_options(Some("id>2 || adminState==Disabled"), Some("sum(id)"))
//!     .unwrap();
//! let out = evaluator.run_static(model, &options).unwrap();
//!
//! let ids: Vec<i32> = out.model.port_entries.iter().map(|p| p.id).collect();
//! assert_eq!(ids, vec![2, 3]);
//! assert_eq!(out.aggregate, Some(Value::Int64(5)));
//! ```
//!
//! ## Modules
//!
//! - [`expr`]: filter expression model and parser
//! - [`registry`]: per-row-type comparator/reducer registries
//! - [`row`]: row/model traits and the accessor-table macros
//! - [`processing`]: filter and aggregate evaluators
//! - [`ingestion`]: models located at runtime from JSON documents
//! - [`execution`]: evaluator front-end, options, observers, metrics
//! - [`error`]: error types

pub mod error;
pub mod execution;
pub mod expr;
pub mod ingestion;
pub mod processing;
pub mod registry;
pub mod row;
pub mod types;

pub use error::{EvalError, EvalResult};
