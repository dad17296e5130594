//! Procedural macros for fiql-sql.
//!
//! # Macros
//!
//! - [`Filterable`] - Derive a field catalog from struct field annotations
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(fiql_sql::Filterable)]
//! struct Order {
//!     #[fiql("id")]
//!     id: i64,
//!     #[fiql("cre,db:orders.created_at")]
//!     created: chrono::DateTime<chrono::Utc>,
//!     #[fiql("note")]
//!     note: Option<String>,
//!     // Not filterable
//!     secret: String,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod generators;
mod types;

/// Derive macro implementing `Filterable` for a struct.
///
/// Only fields carrying an annotation become catalog entries.
///
/// # Attributes
///
/// - `#[fiql("alias")]` - Filter the field as `alias`; the column is the field name
/// - `#[fiql("alias,db:column")]` - Map to a different column
/// - `#[fiql("alias,db:schema.table.column")]` - Qualified column
/// - `#[fiql("-")]` or `#[fiql(skip)]` - Exclude the field
/// - `#[fiql(kind = "float")]` - Override the inferred type
///   (`string`, `integer`, `float`, `datetime`, `duration`)
///
/// The type is inferred from the field type: strings, integers, floats and
/// `Decimal`, date/time types, and `Duration`/`TimeDelta`. `Option<T>` marks
/// the field nullable. Malformed annotations and uninferable types are
/// compile errors.
#[proc_macro_derive(Filterable, attributes(fiql))]
pub fn derive_filterable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generators::derive_filterable_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
