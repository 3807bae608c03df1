//! Result models that are only available as documents at runtime.
//!
//! Statically typed commands implement [`crate::row::RowModel`] directly; everything here
//! locates the row collection by introspecting the document instead.
//!
//! - [`json`]: [`JsonModel`] over a JSON object with one list-of-records field

pub mod json;

pub use json::{JsonModel, JsonRow};
