//! # fiql-query
//!
//! Translation of parsed FIQL filter expressions into parameterized SQL.
//!
//! This crate provides:
//! - Field catalogs mapping client-facing selector aliases to columns
//! - Dialect profiles for identifier quoting, placeholders and concatenation
//! - A predicate builder producing `(...)` SQL text plus ordered parameters
//! - An order clause builder for `+alias;-alias` sort strings
//! - Accumulated, diagnostic-rich errors
//!
//! ## Predicates
//!
//! ```rust
//! use fiql_query::expr::{Argument, ComparisonOperator, Constraint, Group};
//! use fiql_query::{Adapter, Dialect, FieldCatalog, SqlValue};
//!
//! let catalog = FieldCatalog::builder()
//!     .string("mylife", "ml")
//!     .string("love", "lo")
//!     .build();
//! let adapter = Adapter::new(catalog).with_dialect(Dialect::Mssql);
//!
//! // ml==life;lo==me
//! let expr = Group::new(Constraint::new("ml", ComparisonOperator::Eq, Argument::infer("life")))
//!     .and(Constraint::new("lo", ComparisonOperator::Eq, Argument::infer("me")))
//!     .into();
//!
//! let predicate = adapter.build_predicate(&expr).unwrap();
//! assert_eq!(predicate.sql(), "([mylife] LIKE @1 AND [love] LIKE @2)");
//! assert_eq!(predicate.params(), &[SqlValue::from("life"), SqlValue::from("me")]);
//! ```
//!
//! ## Errors
//!
//! Every unknown selector and bad argument found in one pass is reported:
//!
//! ```rust
//! use fiql_query::expr::{Argument, ComparisonOperator, Constraint, Group};
//! use fiql_query::{Adapter, FieldCatalog, FiqlError};
//!
//! let adapter = Adapter::new(FieldCatalog::builder().integer("id", "id").build());
//! let expr = Group::new(Constraint::new("id", ComparisonOperator::Eq, Argument::infer("abc")))
//!     .and(Constraint::new("secret", ComparisonOperator::Eq, Argument::infer("x")))
//!     .into();
//!
//! let err = adapter.build_predicate(&expr).unwrap_err();
//! assert_eq!(err.errors().len(), 2);
//! assert!(matches!(err.errors()[1], FiqlError::InvalidSelector { .. }));
//! ```

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod logging;
pub mod order;
pub mod predicate;
pub mod value;

pub use adapter::Adapter;
pub use catalog::{
    Annotation, FieldCatalog, FieldCatalogBuilder, FieldDeclaration, FieldDescriptor, Filterable,
    TypeTag,
};
pub use config::{AdapterConfig, FiqlConfig};
pub use dialect::{Concatenation, Dialect, DialectProfile, IdentifierDelimiter, ParameterStyle};
pub use error::{ConversionError, ErrorCode, ErrorList, FiqlError, FiqlResult};
pub use expr::{
    Argument, ComparisonOperator, Constraint, Expression, Group, LogicalOperator, ValueKind,
};
pub use order::{OrderClause, SortOrder};
pub use predicate::{Predicate, PredicateBuilder};
pub use value::SqlValue;

