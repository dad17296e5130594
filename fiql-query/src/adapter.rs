//! The public entry point tying a catalog, a dialect and a default table
//! together.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::catalog::{FieldCatalog, Filterable};
use crate::config::AdapterConfig;
use crate::dialect::{Dialect, DialectProfile};
use crate::error::FiqlResult;
use crate::expr::Expression;
use crate::order::{self, OrderClause};
use crate::predicate::{Predicate, PredicateBuilder};

/// Builds predicates and order clauses for one model.
///
/// An adapter is immutable; clone it (cheaply, the catalog is shared) or put
/// it behind an `Arc` to use it from several threads.
///
/// ```rust
/// use fiql_query::expr::{Argument, ComparisonOperator, Constraint, Group};
/// use fiql_query::{Adapter, Dialect, FieldCatalog};
///
/// let catalog = FieldCatalog::builder()
///     .integer("ID", "id")
///     .date_time("created_at", "cre")
///     .build();
/// let adapter = Adapter::new(catalog).with_dialect(Dialect::Postgres);
///
/// let expr = Group::new(Constraint::new("id", ComparisonOperator::Eq, Argument::infer("7"))).into();
/// let predicate = adapter.build_predicate(&expr).unwrap();
/// assert_eq!(predicate.sql(), r#"("ID" = $1)"#);
///
/// let order = adapter.build_order_clause("-cre;+id").unwrap();
/// assert_eq!(order.sql(), r#""created_at" DESC, "ID" ASC"#);
/// ```
#[derive(Debug, Clone)]
pub struct Adapter {
    catalog: Arc<FieldCatalog>,
    dialect: Option<Dialect>,
    profile: DialectProfile,
    table_name: Option<SmolStr>,
}

impl Adapter {
    /// Create an adapter using the SQL92 dialect and no default table.
    pub fn new(catalog: impl Into<Arc<FieldCatalog>>) -> Self {
        let adapter = Self {
            catalog: catalog.into(),
            dialect: Some(Dialect::default()),
            profile: Dialect::default().profile(),
            table_name: None,
        };
        adapter.log_created();
        adapter
    }

    /// Create an adapter for a type deriving [`Filterable`].
    pub fn for_model<T: Filterable>() -> Self {
        Self::new(T::field_catalog())
    }

    /// Create an adapter from configuration.
    pub fn from_config(catalog: impl Into<Arc<FieldCatalog>>, config: &AdapterConfig) -> Self {
        let adapter = Self::new(catalog).with_dialect(config.dialect);
        match &config.table_name {
            Some(table) => adapter.with_table_name(table.as_str()),
            None => adapter,
        }
    }

    /// Use a preset dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self.profile = dialect.profile();
        debug!(dialect = %dialect, "adapter dialect set");
        self
    }

    /// Use a custom dialect profile.
    pub fn with_profile(mut self, profile: DialectProfile) -> Self {
        self.dialect = Dialect::ALL.into_iter().find(|d| d.profile() == profile);
        self.profile = profile;
        debug!(profile = ?profile, "adapter dialect profile set");
        self
    }

    /// Qualify columns whose descriptor has no table qualifier.
    pub fn with_table_name(mut self, table: impl Into<SmolStr>) -> Self {
        let table = table.into();
        if table.trim().is_empty() {
            debug!("blank default table ignored");
            self.table_name = None;
            return self;
        }
        debug!(table = %table, "adapter default table set");
        self.table_name = Some(table);
        self
    }

    /// The field catalog.
    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// The preset dialect, if the profile matches one.
    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    /// The dialect profile.
    pub fn profile(&self) -> DialectProfile {
        self.profile
    }

    /// The default table.
    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    /// Translate a filter expression into a predicate.
    ///
    /// Duration arguments are resolved against the current time, read once
    /// per call.
    pub fn build_predicate(&self, expr: &Expression) -> FiqlResult<Predicate> {
        self.build_predicate_at(expr, Utc::now())
    }

    /// Translate a filter expression, resolving durations against `now`.
    pub fn build_predicate_at(&self, expr: &Expression, now: DateTime<Utc>) -> FiqlResult<Predicate> {
        let predicate = PredicateBuilder::new(&self.catalog, self.profile)
            .default_table(self.table_name.as_deref())
            .reference_time(now)
            .build(expr)?;
        trace!(
            sql_len = predicate.sql().len(),
            params = predicate.params().len(),
            "predicate built"
        );
        Ok(predicate)
    }

    /// Translate a sort string such as `+name;-created` into an order clause.
    pub fn build_order_clause(&self, input: &str) -> FiqlResult<OrderClause> {
        let clause = order::build_order_clause(self.profile, &self.catalog, self.table_name.as_deref(), input)?;
        trace!(sql_len = clause.sql().len(), "order clause built");
        Ok(clause)
    }

    fn log_created(&self) {
        debug!(
            fields = self.catalog.len(),
            dialect = ?self.dialect,
            "adapter created"
        );
    }
}
