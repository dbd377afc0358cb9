//! Column configuration for tabular data grids.
//!
//! Combines the schema of a [`Table`], a user supplied JSON column
//! configuration and the widget level [`GridPolicy`] into the ordered list of
//! [`GridColumn`]s a grid renders.

pub mod column;
pub mod config;
pub mod domain;
pub mod loader;
pub mod table;
pub mod types;
pub mod width;

pub use column::{ColumnDescriptor, ContentAlignment};
pub use config::{ColumnConfig, ColumnConfigMapping, apply, lookup, parse_column_config};
pub use domain::{EditingMode, GridError, GridPolicy};
pub use loader::load_columns;
pub use table::Table;
pub use types::{ColumnKind, ColumnType, GridColumn, resolve_type};
pub use width::{WidthSpec, resolve_width};
