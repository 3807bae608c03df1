//! Generic row access and the row locator.
//!
//! A command's result model implements [`RowModel`], which names its single row collection
//! through an associated [`Row`] type and a `rows_mut` accessor. Because a model can only
//! implement the trait once, "exactly one row collection per model" is enforced by the compiler.
//!
//! Row types expose their fields by column name through [`Row::field`]. The
//! [`filterable_row!`](crate::filterable_row) macro generates that accessor table together with
//! the static column schema and a cached [`ColumnRegistry`]; [`row_model!`](crate::row_model)
//! generates the locator for a model struct.
//!
//! ```rust
//! use rowfilter::{filterable_row, row_model};
//! use rowfilter::row::{RowModel, StaticRow};
//!
//! struct ArpEntry {
//!     ip: String,
//!     port: i32,
//! }
//!
//! filterable_row!(ArpEntry {
//!     "ip" => String, |e| &e.ip,
//!     "port" => Integer, |e| e.port,
//! });
//!
//! struct ShowArpModel {
//!     arp_entries: Vec<ArpEntry>,
//! }
//!
//! row_model!(ShowArpModel => arp_entries: ArpEntry);
//!
//! let model = ShowArpModel { arp_entries: vec![ArpEntry { ip: "10.0.0.1".into(), port: 3 }] };
//! assert_eq!(model.rows().len(), 1);
//! assert!(ArpEntry::registry().comparators.get("port").is_some());
//! ```

use crate::registry::ColumnRegistry;
use crate::types::{ColumnKind, Value};

/// A flat record whose fields can be read by column name.
pub trait Row {
    /// Live value of `column`, or `None` if the row type has no such field.
    fn field(&self, column: &str) -> Option<Value>;
}

/// A row type whose schema is known statically.
pub trait StaticRow: Row {
    /// Column names and kinds, in declaration order.
    fn columns() -> &'static [(&'static str, ColumnKind)];

    /// Process-lifetime registry built from [`Self::columns`].
    fn registry() -> &'static ColumnRegistry;
}

/// A command result model holding exactly one collection of rows.
///
/// All other fields of the model are metadata and are left untouched by the evaluators.
pub trait RowModel {
    type Row: Row;

    /// Whether the command accepts `--filter`.
    const ALLOW_FILTERING: bool = true;
    /// Whether the command accepts `--aggregate`.
    const ALLOW_AGGREGATION: bool = true;

    /// Name used in error messages and logs.
    fn model_name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn rows(&self) -> &[Self::Row];

    fn rows_mut(&mut self) -> &mut Vec<Self::Row>;
}

impl<R: Row> RowModel for Vec<R> {
    type Row = R;

    fn rows(&self) -> &[R] {
        self
    }

    fn rows_mut(&mut self) -> &mut Vec<R> {
        self
    }
}

/// Implement [`Row`] and [`StaticRow`] for a struct from a column table.
///
/// Each entry reads `"column" => Kind, |row| accessor`, where `Kind` is a
/// [`ColumnKind`] variant and the accessor returns anything convertible into [`Value`].
/// Symbolic columns may list accepted literals: `"linkState" => Symbolic["Up", "Down"], ...`.
#[macro_export]
macro_rules! filterable_row {
    ($row:ty {
        $($column:literal => $kind:ident $([$($accepted:literal),* $(,)?])?, |$r:ident| $access:expr),* $(,)?
    }) => {
        impl $crate::row::Row for $row {
            fn field(&self, column: &str) -> ::std::option::Option<$crate::types::Value> {
                match column {
                    $($column => {
                        let $r = self;
                        ::std::option::Option::Some($crate::types::Value::from($access))
                    })*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl $crate::row::StaticRow for $row {
            fn columns() -> &'static [(&'static str, $crate::types::ColumnKind)] {
                &[$(($column, $crate::types::ColumnKind::$kind)),*]
            }

            fn registry() -> &'static $crate::registry::ColumnRegistry {
                static REGISTRY: ::std::sync::OnceLock<$crate::registry::ColumnRegistry> =
                    ::std::sync::OnceLock::new();
                REGISTRY.get_or_init(|| {
                    let mut registry = $crate::registry::ColumnRegistry::new();
                    $(
                        registry.register_column($column, $crate::types::ColumnKind::$kind);
                        $(registry.accept_values($column, &[$($accepted),*]);)?
                    )*
                    registry
                })
            }
        }
    };
}

/// Implement [`RowModel`] for a struct by naming its row collection field.
///
/// Optional trailing flags disable filtering or aggregation for the command:
/// `row_model!(Model => entries: Entry, filtering = false)`.
#[macro_export]
macro_rules! row_model {
    ($model:ty => $field:ident : $row:ty $(, filtering = $filtering:literal)? $(, aggregation = $aggregation:literal)? $(,)?) => {
        impl $crate::row::RowModel for $model {
            type Row = $row;
            $(const ALLOW_FILTERING: bool = $filtering;)?
            $(const ALLOW_AGGREGATION: bool = $aggregation;)?

            fn rows(&self) -> &[$row] {
                &self.$field
            }

            fn rows_mut(&mut self) -> &mut ::std::vec::Vec<$row> {
                &mut self.$field
            }
        }
    };
}
