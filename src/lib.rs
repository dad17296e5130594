//! # fiql-sql
//!
//! Safe, parameterized SQL from client-supplied FIQL filter and sort strings.
//!
//! fiql-sql provides:
//! - Field catalogs declared with `#[derive(Filterable)]` or built by hand
//! - Dialect presets for PostgreSQL, SQL Server, MariaDB/MySQL, SQLite and SQL92
//! - Predicates that are always fully parenthesized, with ordered parameters
//! - `ORDER BY` column lists from `+alias;-alias` sort strings
//! - Accumulated errors that report every bad selector in one pass
//!
//! ## Quick Start
//!
//! ```rust
//! use fiql_sql::prelude::*;
//!
//! #[derive(Filterable)]
//! struct Person {
//!     #[fiql("name")]
//!     display_name: String,
//!     #[fiql("age,db:age_years")]
//!     age: Option<i32>,
//!     password_hash: String,
//! }
//!
//! let adapter = Adapter::for_model::<Person>().with_dialect(Dialect::Postgres);
//!
//! // name==jo*;age=ge=18
//! let expr = Group::new(Constraint::new("name", ComparisonOperator::Eq, Argument::infer("jo*")))
//!     .and(Constraint::new("age", ComparisonOperator::Gte, Argument::infer("18")))
//!     .into();
//!
//! let predicate = adapter.build_predicate(&expr)?;
//! assert_eq!(
//!     predicate.sql(),
//!     r#"("display_name" LIKE CONCAT($1,'%') AND "age_years" >= $2)"#
//! );
//! assert_eq!(predicate.params(), &[SqlValue::from("jo"), SqlValue::Int(18)]);
//!
//! let order = adapter.build_order_clause("-age;+name")?;
//! assert_eq!(order.sql(), r#""age_years" DESC, "display_name" ASC"#);
//! # Ok::<(), fiql_sql::FiqlError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use fiql_query::{
    adapter, catalog, config, dialect, error, expr, logging, order, predicate, value,
};

// Re-export proc macros
pub use fiql_codegen::Filterable;

// Re-export key types at the crate root
pub use fiql_query::{
    Adapter, AdapterConfig, Argument, ComparisonOperator, Constraint, Dialect, DialectProfile,
    ErrorCode, Expression, FieldCatalog, FieldDescriptor, FiqlConfig, FiqlError, FiqlResult,
    Filterable, Group, LogicalOperator, OrderClause, Predicate, SqlValue, TypeTag,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        Adapter, Argument, ComparisonOperator, Constraint, Dialect, Expression, FieldCatalog,
        Filterable, FiqlError, Group, SqlValue, TypeTag,
    };
}
