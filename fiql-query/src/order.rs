//! Sort strings to `ORDER BY` column lists.
//!
//! A sort string is a `;`-separated list of `+alias` (ascending) or `-alias`
//! (descending) tokens. Unlike predicates, the first bad token fails the call.

use std::fmt;

use crate::catalog::FieldCatalog;
use crate::dialect::DialectProfile;
use crate::error::{FiqlError, FiqlResult};

/// Sort order for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    fn from_sign(sign: char) -> Option<Self> {
        match sign {
            '+' => Some(Self::Asc),
            '-' => Some(Self::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Comma-joined `column DIRECTION` pairs, without the `ORDER BY` keyword.
///
/// An empty clause is valid and means "no ordering".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderClause {
    sql: String,
}

impl OrderClause {
    /// The SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Check whether no column was requested.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Consume into the SQL text.
    pub fn into_sql(self) -> String {
        self.sql
    }
}

impl fmt::Display for OrderClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Build an order clause from a sort string.
///
/// Columns are rendered exactly like predicate columns, including the
/// descriptor's table qualifier or, failing that, `default_table`.
///
/// ```rust
/// use fiql_query::order::build_order_clause;
/// use fiql_query::{DialectProfile, FieldCatalog};
///
/// let catalog = FieldCatalog::builder().string("colA", "a").string("colB", "b").build();
/// let clause = build_order_clause(DialectProfile::SQL92, &catalog, None, "+a;-b").unwrap();
/// assert_eq!(clause.sql(), r#""colA" ASC, "colB" DESC"#);
/// ```
pub fn build_order_clause(
    dialect: DialectProfile,
    catalog: &FieldCatalog,
    default_table: Option<&str>,
    input: &str,
) -> FiqlResult<OrderClause> {
    let mut sql = String::new();
    if input.is_empty() {
        return Ok(OrderClause { sql });
    }

    for (i, token) in input.split(';').enumerate() {
        let mut chars = token.chars();
        let order = chars.next().and_then(SortOrder::from_sign);
        let alias = chars.as_str();
        let (Some(order), false) = (order, alias.is_empty()) else {
            return Err(FiqlError::invalid_order_by(token));
        };
        let field = catalog
            .resolve(alias)
            .ok_or_else(|| FiqlError::invalid_order_by(token))?;

        if i > 0 {
            sql.push_str(", ");
        }
        let qualifier = field.table_qualifier.as_deref().or(default_table);
        dialect.write_column(qualifier, &field.db_name, &mut sql);
        sql.push(' ');
        sql.push_str(order.as_sql());
    }

    Ok(OrderClause { sql })
}
