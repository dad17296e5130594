//! Translation of filter expressions into parameterized SQL predicates.
//!
//! The builder makes one depth-first pass over the [`Expression`]. Every
//! selector is resolved against the [`FieldCatalog`], every argument is
//! converted to the selector's declared type and bound as a parameter. Errors
//! do not stop the pass; they are collected and reported together, and no
//! predicate is returned if any occurred.
//!
//! ```rust
//! use fiql_query::expr::{Argument, ComparisonOperator, Constraint, Group};
//! use fiql_query::{DialectProfile, FieldCatalog, PredicateBuilder, SqlValue};
//!
//! let catalog = FieldCatalog::builder().string("mylife", "ml").build();
//! let expr = Group::new(Constraint::new("ml", ComparisonOperator::Eq, Argument::infer("life"))).into();
//!
//! let predicate = PredicateBuilder::new(&catalog, DialectProfile::POSTGRES)
//!     .build(&expr)
//!     .unwrap();
//! assert_eq!(predicate.sql(), r#"("mylife" LIKE $1)"#);
//! assert_eq!(predicate.params(), &[SqlValue::from("life")]);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};

use crate::catalog::{FieldCatalog, FieldDescriptor, TypeTag};
use crate::dialect::DialectProfile;
use crate::error::{ConversionError, ErrorList, FiqlError, FiqlResult};
use crate::expr::{Argument, ComparisonOperator, Event, Expression, ValueKind};
use crate::value::SqlValue;

/// A parenthesized boolean SQL expression and its bound parameters.
///
/// The text never contains the `WHERE` keyword and is always wrapped in one
/// outermost pair of parentheses, so it can be combined with other conditions
/// without an inner `OR` changing their meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    sql: String,
    params: Vec<SqlValue>,
}

impl Predicate {
    /// The SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The parameters, in placeholder order.
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// The SQL text and parameters.
    pub fn to_sql(&self) -> (&str, &[SqlValue]) {
        (&self.sql, &self.params)
    }

    /// Consume into the SQL text and parameters.
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Builds [`Predicate`]s for one catalog and dialect.
///
/// The builder is cheap to copy and holds no per-call state; each
/// [`build`](Self::build) allocates its own buffers.
#[derive(Debug, Clone, Copy)]
pub struct PredicateBuilder<'a> {
    catalog: &'a FieldCatalog,
    dialect: DialectProfile,
    default_table: Option<&'a str>,
    reference_time: Option<DateTime<Utc>>,
}

impl<'a> PredicateBuilder<'a> {
    /// Create a builder.
    pub fn new(catalog: &'a FieldCatalog, dialect: DialectProfile) -> Self {
        Self {
            catalog,
            dialect,
            default_table: None,
            reference_time: None,
        }
    }

    /// Qualify columns whose descriptor has no table qualifier.
    pub fn default_table(mut self, table: Option<&'a str>) -> Self {
        self.default_table = table;
        self
    }

    /// Resolve duration arguments against `now` instead of the clock.
    pub fn reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Translate `expr`.
    ///
    /// A root that is not a group is wrapped in parentheses all the same.
    pub fn build(&self, expr: &Expression) -> FiqlResult<Predicate> {
        let mut pass = Pass {
            catalog: self.catalog,
            dialect: self.dialect,
            default_table: self.default_table,
            now: self.reference_time.unwrap_or_else(Utc::now),
            sql: String::with_capacity(64),
            params: Vec::new(),
            errors: ErrorList::new(),
            current: None,
        };

        let implicit_group = !matches!(expr, Expression::Group(_));
        if implicit_group {
            pass.handle(Event::GroupEnter);
        }
        expr.walk(&mut |event| pass.handle(event));
        if implicit_group {
            pass.handle(Event::GroupLeave);
        }

        pass.errors.finish(Predicate {
            sql: pass.sql,
            params: pass.params,
        })
    }
}

/// The selector awaiting its comparison and argument.
#[derive(Debug, Clone, Copy)]
struct Pending<'c, 'e> {
    field: &'c FieldDescriptor,
    selector: &'e str,
    like: bool,
}

/// State of a single build call.
struct Pass<'c, 'e> {
    catalog: &'c FieldCatalog,
    dialect: DialectProfile,
    default_table: Option<&'c str>,
    now: DateTime<Utc>,
    sql: String,
    params: Vec<SqlValue>,
    errors: ErrorList,
    current: Option<Pending<'c, 'e>>,
}

impl<'c, 'e> Pass<'c, 'e> {
    fn handle(&mut self, event: Event<'e>) {
        match event {
            Event::GroupEnter => self.sql.push('('),
            Event::GroupLeave => self.sql.push(')'),
            Event::Operator(operator) => self.sql.push_str(operator.as_sql()),
            Event::Selector { name, unary } => self.selector(name, unary),
            Event::Comparison(operator) => self.comparison(operator),
            Event::Argument(argument) => self.argument(argument),
        }
    }

    fn selector(&mut self, name: &'e str, unary: bool) {
        let Some(field) = self.catalog.resolve(name) else {
            self.errors.push(FiqlError::invalid_selector(name));
            self.current = None;
            return;
        };

        let qualifier = field.table_qualifier.as_deref().or(self.default_table);
        self.dialect.write_column(qualifier, &field.db_name, &mut self.sql);

        if unary {
            self.sql.push_str(" IS NOT NULL");
            self.current = None;
        } else {
            self.current = Some(Pending {
                field,
                selector: name,
                like: false,
            });
        }
    }

    fn comparison(&mut self, operator: ComparisonOperator) {
        let Some(pending) = self.current.as_mut() else {
            return;
        };
        let sql = match operator {
            ComparisonOperator::Eq if pending.field.type_tag == TypeTag::String => {
                pending.like = true;
                " LIKE "
            }
            ComparisonOperator::Eq => " = ",
            ComparisonOperator::Neq => " <> ",
            ComparisonOperator::Gt => " > ",
            ComparisonOperator::Gte => " >= ",
            ComparisonOperator::Lt => " < ",
            ComparisonOperator::Lte => " <= ",
        };
        self.sql.push_str(sql);
    }

    fn argument(&mut self, argument: &'e Argument) {
        let Some(pending) = self.current.take() else {
            return;
        };

        let negotiated = match self.negotiate(pending, argument) {
            Ok(negotiated) => negotiated,
            Err(err) => {
                self.errors.push(err);
                return;
            }
        };

        self.params.push(negotiated.value);
        let placeholder = self.dialect.parameter_style.placeholder(self.params.len());
        let (leading, trailing) = if negotiated.wildcard_eligible && pending.like {
            (argument.starts_with_wildcard(), argument.ends_with_wildcard())
        } else {
            (false, false)
        };
        self.dialect
            .concatenation
            .write_wildcard(&placeholder, leading, trailing, &mut self.sql);
    }

    /// Pick the parameter value for `argument` given the selector's type.
    ///
    /// A string column always takes the literal as text, even when the parser
    /// hinted at a number or timestamp.
    fn negotiate(&self, pending: Pending<'c, 'e>, argument: &Argument) -> FiqlResult<Negotiated> {
        let expected = pending.field.type_tag;
        let converted = |result: Result<SqlValue, ConversionError>| {
            result
                .map(Negotiated::typed)
                .map_err(|source| FiqlError::conversion_failure(pending.selector, argument.to_string(), source))
        };

        match (argument.kind(), expected) {
            (ValueKind::String, TypeTag::String) => return Ok(Negotiated::text(argument)),
            (ValueKind::DateTime, TypeTag::DateTime) => {
                return converted(argument.as_date_time().map(SqlValue::DateTime));
            }
            (ValueKind::Duration, TypeTag::DateTime) => {
                let instant = argument.as_duration().and_then(|offset| {
                    self.now
                        .checked_add_signed(offset)
                        .ok_or_else(|| ConversionError::new(argument.as_str(), "duration"))
                });
                return converted(instant.map(SqlValue::DateTime));
            }
            (ValueKind::Number, TypeTag::Integer) => return converted(argument.as_int().map(SqlValue::Int)),
            (ValueKind::Number, TypeTag::Float) => return converted(argument.as_float().map(SqlValue::Float)),
            _ => {}
        }

        if expected == TypeTag::String {
            return Ok(Negotiated::text(argument));
        }
        Err(FiqlError::invalid_argument_type(
            pending.selector,
            argument.to_string(),
            expected,
        ))
    }
}

struct Negotiated {
    value: SqlValue,
    wildcard_eligible: bool,
}

impl Negotiated {
    fn text(argument: &Argument) -> Self {
        Self {
            value: SqlValue::String(argument.as_str().to_string()),
            wildcard_eligible: true,
        }
    }

    fn typed(value: SqlValue) -> Self {
        Self {
            value,
            wildcard_eligible: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::expr::{Constraint, Group};
    use chrono::{TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;

    fn catalog() -> FieldCatalog {
        FieldCatalog::builder()
            .string("mylife", "ml")
            .string("love", "lo")
            .integer("ID", "id")
            .float("amount", "amt")
            .date_time("created_at", "cre")
            .duration("ttl", "ttl")
            .build()
    }

    fn eq(selector: &str, literal: &str) -> Constraint {
        Constraint::new(selector, ComparisonOperator::Eq, Argument::infer(literal))
    }

    fn cmp(selector: &str, op: &str, literal: &str) -> Constraint {
        Constraint::new(selector, op.parse().unwrap(), Argument::infer(literal))
    }

    fn build(dialect: DialectProfile, expr: impl Into<Expression>) -> FiqlResult<Predicate> {
        let catalog = catalog();
        PredicateBuilder::new(&catalog, dialect).build(&expr.into())
    }

    #[test]
    fn test_single_constraint() {
        let p = build(DialectProfile::SQL92, Group::new(eq("ml", "life"))).unwrap();
        assert_eq!(p.sql(), r#"("mylife" LIKE ?)"#);
        assert_eq!(p.params(), &[SqlValue::from("life")]);
        assert_eq!(p.to_string(), p.sql());
    }

    #[test]
    fn test_root_constraint_is_parenthesized() {
        let p = build(DialectProfile::SQL92, eq("ml", "life")).unwrap();
        assert_eq!(p.sql(), r#"("mylife" LIKE ?)"#);
    }

    #[test]
    fn test_or_at_top_level_is_parenthesized() {
        let p = build(DialectProfile::SQL92, Group::new(eq("ml", "life")).or(eq("ml", "hard"))).unwrap();
        assert_eq!(p.sql(), r#"("mylife" LIKE ? OR "mylife" LIKE ?)"#);
    }

    #[test]
    fn test_nested_groups_numbering() {
        let expr = Group::new(Group::new(eq("ml", "life")).and(eq("lo", "me")))
            .or(Group::new(eq("ml", "hard")).and(eq("lo", "you")));
        let p = build(DialectProfile::MSSQL, expr).unwrap();
        assert_eq!(
            p.sql(),
            "(([mylife] LIKE @1 AND [love] LIKE @2) OR ([mylife] LIKE @3 AND [love] LIKE @4))"
        );
        assert_eq!(
            p.params(),
            &[
                SqlValue::from("life"),
                SqlValue::from("me"),
                SqlValue::from("hard"),
                SqlValue::from("you")
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        let expr = Group::new(cmp("id", "!=", "1"))
            .and(cmp("id", "=gt=", "2"))
            .and(cmp("id", "=ge=", "3"))
            .and(cmp("id", "=lt=", "4"))
            .and(cmp("id", "=le=", "5"))
            .and(eq("id", "6"));
        let p = build(DialectProfile::POSTGRES, expr).unwrap();
        assert_eq!(
            p.sql(),
            r#"("ID" <> $1 AND "ID" > $2 AND "ID" >= $3 AND "ID" < $4 AND "ID" <= $5 AND "ID" = $6)"#
        );
        let ints: Vec<_> = p.params().iter().filter_map(SqlValue::as_int).collect();
        assert_eq!(ints, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_unary_selector() {
        let p = build(DialectProfile::SQL92, Group::new(Constraint::unary("ml"))).unwrap();
        assert_eq!(p.sql(), r#"("mylife" IS NOT NULL)"#);
        assert!(p.params().is_empty());
    }

    #[test]
    fn test_unary_selector_then_comparison() {
        let expr = Group::new(Constraint::unary("ml")).and(eq("lo", "me"));
        let p = build(DialectProfile::POSTGRES, expr).unwrap();
        assert_eq!(p.sql(), r#"("mylife" IS NOT NULL AND "love" LIKE $1)"#);
    }

    #[test]
    fn test_wildcards_function_concat() {
        let p = build(DialectProfile::MSSQL, Group::new(eq("ml", "*life"))).unwrap();
        assert_eq!(p.sql(), "([mylife] LIKE CONCAT('%',@1))");
        assert_eq!(p.params(), &[SqlValue::from("life")]);

        let p = build(DialectProfile::MSSQL, Group::new(eq("ml", "life*"))).unwrap();
        assert_eq!(p.sql(), "([mylife] LIKE CONCAT(@1,'%'))");

        let p = build(DialectProfile::POSTGRES, Group::new(eq("ml", "*life*"))).unwrap();
        assert_eq!(p.sql(), r#"("mylife" LIKE CONCAT('%',$1,'%'))"#);
    }

    #[test]
    fn test_wildcards_infix_concat() {
        let p = build(DialectProfile::SQLITE, Group::new(eq("ml", "*life"))).unwrap();
        assert_eq!(p.sql(), r#"("mylife" LIKE '%' || ?)"#);

        let p = build(DialectProfile::SQLITE, Group::new(eq("ml", "*life*"))).unwrap();
        assert_eq!(p.sql(), r#"("mylife" LIKE '%' || ? || '%')"#);
    }

    #[test]
    fn test_wildcards_only_for_like() {
        let p = build(DialectProfile::POSTGRES, Group::new(cmp("ml", "!=", "*life"))).unwrap();
        assert_eq!(p.sql(), r#"("mylife" <> $1)"#);
        assert_eq!(p.params(), &[SqlValue::from("life")]);
    }

    #[test]
    fn test_string_column_prefers_text() {
        let p = build(DialectProfile::POSTGRES, Group::new(eq("ml", "001020"))).unwrap();
        assert_eq!(p.sql(), r#"("mylife" LIKE $1)"#);
        assert_eq!(p.params(), &[SqlValue::from("001020")]);

        let p = build(DialectProfile::POSTGRES, Group::new(eq("ml", "2022-09-16"))).unwrap();
        assert_eq!(p.params(), &[SqlValue::from("2022-09-16")]);
    }

    #[test]
    fn test_string_fallback_is_wildcard_eligible() {
        let arg = Argument::number("42").with_wildcards(true, false);
        let expr = Group::new(Constraint::new("ml", ComparisonOperator::Eq, arg));
        let p = build(DialectProfile::POSTGRES, expr).unwrap();
        assert_eq!(p.sql(), r#"("mylife" LIKE CONCAT('%',$1))"#);
    }

    #[test]
    fn test_float_and_int_params() {
        let expr = Group::new(eq("id", "1")).and(cmp("amt", "=gt=", "0"));
        let p = build(DialectProfile::POSTGRES, expr).unwrap();
        assert_eq!(p.sql(), r#"("ID" = $1 AND "amount" > $2)"#);
        assert_eq!(p.params(), &[SqlValue::Int(1), SqlValue::Float(0.0)]);
    }

    #[test]
    fn test_date_time_param() {
        let p = build(DialectProfile::POSTGRES, Group::new(cmp("cre", "=gt=", "2022-09-16T10:15:04Z"))).unwrap();
        assert_eq!(
            p.params(),
            &[SqlValue::DateTime(Utc.with_ymd_and_hms(2022, 9, 16, 10, 15, 4).unwrap())]
        );
    }

    #[test]
    fn test_duration_is_offset_from_reference_time() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let catalog = catalog();
        let expr = Group::new(cmp("cre", "=lt=", "-P1D")).or(cmp("cre", "=gt=", "PT2H")).into();
        let p = PredicateBuilder::new(&catalog, DialectProfile::POSTGRES)
            .reference_time(now)
            .build(&expr)
            .unwrap();
        assert_eq!(p.sql(), r#"("created_at" < $1 OR "created_at" > $2)"#);
        assert_eq!(
            p.params(),
            &[
                SqlValue::DateTime(now - TimeDelta::days(1)),
                SqlValue::DateTime(now + TimeDelta::hours(2))
            ]
        );
    }

    #[test]
    fn test_numeric_column_rejects_date_time() {
        let err = build(DialectProfile::SQL92, Group::new(eq("id", "2022-09-16T10:15:04Z"))).unwrap_err();
        assert!(matches!(
            err.first(),
            Some(FiqlError::InvalidArgumentType { expected: TypeTag::Integer, .. })
        ));
    }

    #[test]
    fn test_duration_column_rejects_everything() {
        let err = build(DialectProfile::SQL92, Group::new(eq("ttl", "PT1H"))).unwrap_err();
        assert!(matches!(err.first(), Some(FiqlError::InvalidArgumentType { .. })));
    }

    #[test]
    fn test_malformed_number_is_conversion_failure() {
        let err = build(DialectProfile::SQL92, Group::new(eq("id", "4.5"))).unwrap_err();
        assert!(matches!(
            err.first(),
            Some(FiqlError::ArgumentConversionFailure { selector, .. }) if selector == "id"
        ));
    }

    #[test]
    fn test_malformed_date_is_conversion_failure() {
        let arg = Argument::date_time("2022-02-30");
        let expr = Group::new(Constraint::new("cre", ComparisonOperator::Eq, arg));
        let err = build(DialectProfile::SQL92, expr).unwrap_err();
        assert!(matches!(err.first(), Some(FiqlError::ArgumentConversionFailure { .. })));
    }

    #[test]
    fn test_inferred_malformed_literal_is_conversion_failure() {
        for literal in ["2022-13-45", "2022-02-30T10:00:00Z", "-P1DT"] {
            let err = build(DialectProfile::SQL92, Group::new(cmp("cre", "=lt=", literal))).unwrap_err();
            assert_eq!(
                err.first().map(FiqlError::code),
                Some(ErrorCode::ArgumentConversionFailure),
                "{literal}"
            );
        }
    }

    #[test]
    fn test_mismatched_hints_are_invalid_type() {
        let err = build(DialectProfile::SQL92, Group::new(eq("cre", "42"))).unwrap_err();
        assert!(matches!(
            err.first(),
            Some(FiqlError::InvalidArgumentType { expected: TypeTag::DateTime, .. })
        ));

        let err = build(DialectProfile::SQL92, Group::new(eq("id", "-P1D"))).unwrap_err();
        assert!(matches!(
            err.first(),
            Some(FiqlError::InvalidArgumentType { expected: TypeTag::Integer, .. })
        ));
    }

    #[test]
    fn test_date_shaped_text_on_string_column() {
        let p = build(DialectProfile::SQL92, Group::new(eq("ml", "2022-13-45"))).unwrap();
        assert_eq!(p.params(), &[SqlValue::from("2022-13-45")]);
    }

    #[test]
    fn test_errors_accumulate_in_order() {
        let expr = Group::new(eq("secret", "1"))
            .and(eq("ml", "life"))
            .and(eq("id", "abc"))
            .and(eq("blocked", "x"));
        let err = build(DialectProfile::SQL92, expr).unwrap_err();
        assert!(err.is_rejected());
        let errors = err.errors();
        assert_eq!(errors.len(), 3);
        assert!(matches!(&errors[0], FiqlError::InvalidSelector { selector } if selector == "secret"));
        assert!(matches!(&errors[1], FiqlError::InvalidArgumentType { argument, .. } if argument == "abc"));
        assert!(matches!(&errors[2], FiqlError::InvalidSelector { selector } if selector == "blocked"));
    }

    #[test]
    fn test_selector_lookup_is_case_insensitive() {
        let p = build(DialectProfile::SQL92, Group::new(eq("ML", "life"))).unwrap();
        assert_eq!(p.sql(), r#"("mylife" LIKE ?)"#);
    }

    #[test]
    fn test_default_table_and_qualifier() {
        let catalog = FieldCatalog::builder()
            .string("name", "name")
            .field(FieldDescriptor::new("total", "total", TypeTag::Float).qualified("sales.orders"))
            .build();
        let expr = Group::new(eq("name", "x")).and(cmp("total", "=gt=", "1.5")).into();

        let p = PredicateBuilder::new(&catalog, DialectProfile::POSTGRES)
            .default_table(Some("customers"))
            .build(&expr)
            .unwrap();
        assert_eq!(
            p.sql(),
            r#"("customers"."name" LIKE $1 AND "sales"."orders"."total" > $2)"#
        );
    }

    #[test]
    fn test_no_delimiter_dialect() {
        let p = build(DialectProfile::SQL92_NO_DELIMITER, Group::new(eq("ml", "life"))).unwrap();
        assert_eq!(p.sql(), "(mylife LIKE ?)");
    }

    #[test]
    fn test_placeholder_count_matches_params() {
        let expr: Expression = Group::new(Group::new(eq("ml", "*a")).or(eq("lo", "b*")))
            .and(cmp("id", "=ge=", "3"))
            .and(Constraint::unary("amt"))
            .and(cmp("cre", "=lt=", "2021-01-01"))
            .into();
        let catalog = catalog();
        for dialect in crate::dialect::Dialect::ALL {
            let profile = dialect.profile();
            let p = PredicateBuilder::new(&catalog, profile).build(&expr).unwrap();
            assert_eq!(p.params().len(), 4, "{dialect}");
            if profile.parameter_style.is_numbered() {
                for n in 1..=4 {
                    let token = profile.parameter_style.placeholder(n);
                    assert_eq!(p.sql().matches(token.as_str()).count(), 1, "{dialect} {token}");
                }
            } else {
                assert_eq!(p.sql().matches('?').count(), 4, "{dialect}");
            }
            assert!(p.sql().starts_with('(') && p.sql().ends_with(')'));
        }
    }
}
