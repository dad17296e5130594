//! Parsed filter expression trees.
//!
//! The tree is produced by a FIQL parser outside this crate. It is a closed
//! set of node kinds: a [`Group`] joins operands with logical operators and a
//! [`Constraint`] compares one selector with one argument (or tests it for
//! presence when it has no comparison).
//!
//! ```rust
//! use fiql_query::expr::{Argument, ComparisonOperator, Constraint, Expression, Group};
//!
//! // ml==life;lo==me
//! let expr: Expression = Group::new(Constraint::new("ml", ComparisonOperator::Eq, Argument::infer("life")))
//!     .and(Constraint::new("lo", ComparisonOperator::Eq, Argument::infer("me")))
//!     .into();
//!
//! assert_eq!(expr.constraints().count(), 2);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::error::{ConversionError, FiqlError};

/// Logical operator joining two operands of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    /// `;` in FIQL.
    And,
    /// `,` in FIQL.
    Or,
}

impl LogicalOperator {
    /// Get the SQL keyword, padded with spaces.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Comparison between a selector and its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// `==`
    Eq,
    /// `!=`
    Neq,
    /// `=gt=` / `>`
    Gt,
    /// `=ge=` / `>=`
    Gte,
    /// `=lt=` / `<`
    Lt,
    /// `=le=` / `<=`
    Lte,
}

impl ComparisonOperator {
    /// Get the FIQL spelling.
    pub fn as_fiql(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Gt => "=gt=",
            Self::Gte => "=ge=",
            Self::Lt => "=lt=",
            Self::Lte => "=le=",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_fiql())
    }
}

impl FromStr for ComparisonOperator {
    type Err = FiqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Self::Eq),
            "!=" => Ok(Self::Neq),
            "=gt=" | ">" => Ok(Self::Gt),
            "=ge=" | ">=" => Ok(Self::Gte),
            "=lt=" | "<" => Ok(Self::Lt),
            "=le=" | "<=" => Ok(Self::Lte),
            _ => Err(FiqlError::unknown_token("comparison", s)),
        }
    }
}

/// The parser's hint about what an argument literal looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Free text.
    String,
    /// Integer or decimal number.
    Number,
    /// Date or RFC 3339 timestamp.
    DateTime,
    /// ISO 8601 duration such as `-P1D`.
    Duration,
}

/// The right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    literal: String,
    kind: ValueKind,
    leading_wildcard: bool,
    trailing_wildcard: bool,
}

impl Argument {
    /// Create an argument from an already classified literal.
    ///
    /// `literal` must not contain the wildcard characters; set them with
    /// [`Argument::with_wildcards`].
    pub fn new(literal: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            literal: literal.into(),
            kind,
            leading_wildcard: false,
            trailing_wildcard: false,
        }
    }

    /// Create a string argument.
    pub fn string(literal: impl Into<String>) -> Self {
        Self::new(literal, ValueKind::String)
    }

    /// Create a number argument.
    pub fn number(literal: impl Into<String>) -> Self {
        Self::new(literal, ValueKind::Number)
    }

    /// Create a date-time argument.
    pub fn date_time(literal: impl Into<String>) -> Self {
        Self::new(literal, ValueKind::DateTime)
    }

    /// Create a duration argument.
    pub fn duration(literal: impl Into<String>) -> Self {
        Self::new(literal, ValueKind::Duration)
    }

    /// Set the wildcard flags.
    pub fn with_wildcards(mut self, leading: bool, trailing: bool) -> Self {
        self.leading_wildcard = leading;
        self.trailing_wildcard = trailing;
        self
    }

    /// Classify a raw FIQL literal.
    ///
    /// Durations, timestamps and numbers are recognized by shape first, so a
    /// malformed `2022-13-45` is still a date-time and fails on conversion.
    /// Anything else is a string whose leading and trailing `*` become
    /// wildcard flags.
    ///
    /// ```rust
    /// use fiql_query::expr::{Argument, ValueKind};
    ///
    /// assert_eq!(Argument::infer("-P1D").kind(), ValueKind::Duration);
    /// assert_eq!(Argument::infer("2022-09-16T10:15:04Z").kind(), ValueKind::DateTime);
    /// assert_eq!(Argument::infer("0.5").kind(), ValueKind::Number);
    ///
    /// let arg = Argument::infer("*life*");
    /// assert_eq!(arg.as_str(), "life");
    /// assert!(arg.starts_with_wildcard() && arg.ends_with_wildcard());
    /// ```
    pub fn infer(raw: &str) -> Self {
        if looks_like_duration(raw) {
            return Self::duration(raw);
        }
        if looks_like_date_time(raw) {
            return Self::date_time(raw);
        }
        if is_number(raw) {
            return Self::number(raw);
        }

        let (leading, rest) = match raw.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let (trailing, rest) = match rest.strip_suffix('*') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        Self::string(rest).with_wildcards(leading, trailing)
    }

    /// The parser's value-kind hint.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether the literal started with a wildcard.
    pub fn starts_with_wildcard(&self) -> bool {
        self.leading_wildcard
    }

    /// Whether the literal ended with a wildcard.
    pub fn ends_with_wildcard(&self) -> bool {
        self.trailing_wildcard
    }

    /// The literal, without wildcard characters.
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// Convert to an integer.
    pub fn as_int(&self) -> Result<i64, ConversionError> {
        self.literal
            .parse()
            .map_err(|_| ConversionError::new(&self.literal, "integer"))
    }

    /// Convert to a finite float.
    pub fn as_float(&self) -> Result<f64, ConversionError> {
        self.literal
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| ConversionError::new(&self.literal, "float"))
    }

    /// Convert to a UTC timestamp.
    ///
    /// Accepts RFC 3339, a timestamp without offset (read as UTC) or a bare
    /// date (midnight UTC).
    pub fn as_date_time(&self) -> Result<DateTime<Utc>, ConversionError> {
        parse_date_time(&self.literal).ok_or_else(|| ConversionError::new(&self.literal, "date-time"))
    }

    /// Convert to a signed time span.
    pub fn as_duration(&self) -> Result<TimeDelta, ConversionError> {
        parse_duration(&self.literal).ok_or_else(|| ConversionError::new(&self.literal, "duration"))
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.leading_wildcard {
            f.write_str("*")?;
        }
        f.write_str(&self.literal)?;
        if self.trailing_wildcard {
            f.write_str("*")?;
        }
        Ok(())
    }
}

/// A named field reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// The selector as written by the client.
    pub name: String,
}

impl Selector {
    /// Create a selector.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An operator and its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// The comparison operator.
    pub operator: ComparisonOperator,
    /// The argument.
    pub argument: Argument,
}

/// A selector, optionally compared with an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// The field being constrained.
    pub selector: Selector,
    /// `None` for a bare selector, which tests the field for presence.
    pub comparison: Option<Comparison>,
}

impl Constraint {
    /// Create a comparison constraint.
    pub fn new(selector: impl Into<String>, operator: ComparisonOperator, argument: Argument) -> Self {
        Self {
            selector: Selector::new(selector),
            comparison: Some(Comparison { operator, argument }),
        }
    }

    /// Create a bare selector constraint.
    pub fn unary(selector: impl Into<String>) -> Self {
        Self {
            selector: Selector::new(selector),
            comparison: None,
        }
    }

    /// Whether this is a bare selector.
    pub fn is_unary(&self) -> bool {
        self.comparison.is_none()
    }
}

/// A parenthesized, non-empty sequence of operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    first: Box<Expression>,
    rest: Vec<(LogicalOperator, Expression)>,
}

impl Group {
    /// Start a group with its first operand.
    pub fn new(first: impl Into<Expression>) -> Self {
        Self {
            first: Box::new(first.into()),
            rest: Vec::new(),
        }
    }

    /// Append an operand joined with `operator`.
    pub fn push(mut self, operator: LogicalOperator, operand: impl Into<Expression>) -> Self {
        self.rest.push((operator, operand.into()));
        self
    }

    /// Append an operand joined with AND.
    pub fn and(self, operand: impl Into<Expression>) -> Self {
        self.push(LogicalOperator::And, operand)
    }

    /// Append an operand joined with OR.
    pub fn or(self, operand: impl Into<Expression>) -> Self {
        self.push(LogicalOperator::Or, operand)
    }

    /// The first operand.
    pub fn first(&self) -> &Expression {
        &self.first
    }

    /// The remaining operands with their joining operators.
    pub fn rest(&self) -> &[(LogicalOperator, Expression)] {
        &self.rest
    }

    /// Number of operands.
    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    /// Always `false`; a group has at least one operand.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A node of the filter expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Parenthesized operands.
    Group(Group),
    /// A single constraint.
    Constraint(Constraint),
}

impl From<Group> for Expression {
    fn from(group: Group) -> Self {
        Self::Group(group)
    }
}

impl From<Constraint> for Expression {
    fn from(constraint: Constraint) -> Self {
        Self::Constraint(constraint)
    }
}

/// One step of a depth-first, left-to-right walk over an [`Expression`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event<'a> {
    /// Entering a group.
    GroupEnter,
    /// Leaving a group.
    GroupLeave,
    /// Between two operands of a group.
    Operator(LogicalOperator),
    /// A selector; `unary` when no comparison follows.
    Selector { name: &'a str, unary: bool },
    /// The comparison following a non-unary selector.
    Comparison(ComparisonOperator),
    /// The argument following a comparison.
    Argument(&'a Argument),
}

impl Expression {
    /// Walk the tree, reporting each node to `visit`.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(Event<'a>)) {
        match self {
            Self::Group(group) => {
                visit(Event::GroupEnter);
                group.first.walk(visit);
                for (operator, operand) in &group.rest {
                    visit(Event::Operator(*operator));
                    operand.walk(visit);
                }
                visit(Event::GroupLeave);
            }
            Self::Constraint(constraint) => {
                visit(Event::Selector {
                    name: &constraint.selector.name,
                    unary: constraint.is_unary(),
                });
                if let Some(comparison) = &constraint.comparison {
                    visit(Event::Comparison(comparison.operator));
                    visit(Event::Argument(&comparison.argument));
                }
            }
        }
    }

    /// Iterate all constraints, left to right.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        let mut out = Vec::new();
        self.collect_constraints(&mut out);
        out.into_iter()
    }

    fn collect_constraints<'a>(&'a self, out: &mut Vec<&'a Constraint>) {
        match self {
            Self::Group(group) => {
                group.first.collect_constraints(out);
                for (_, operand) in &group.rest {
                    operand.collect_constraints(out);
                }
            }
            Self::Constraint(constraint) => out.push(constraint),
        }
    }
}

fn is_number(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    !digits.is_empty()
        && digits.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && digits.parse::<f64>().is_ok_and(f64::is_finite)
}

/// `YYYY-MM-DD`, optionally followed by a `T` time part.
fn looks_like_date_time(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    if bytes.len() < 10 {
        return false;
    }
    let date = bytes[..10].iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    date && (bytes.len() == 10 || bytes[10] == b'T')
}

/// `[-+]P` followed by digits, designators and `.` only.
fn looks_like_duration(raw: &str) -> bool {
    let rest = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    let Some(body) = rest.strip_prefix('P') else {
        return false;
    };
    body.bytes().any(|b| b.is_ascii_digit())
        && body
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b'.' || b"YMWDTHS".contains(&b))
}

fn parse_date_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(t.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

const DATE_UNITS: [(char, f64); 4] = [
    ('Y', 365.0 * 86_400.0),
    ('M', 30.0 * 86_400.0),
    ('W', 7.0 * 86_400.0),
    ('D', 86_400.0),
];
const TIME_UNITS: [(char, f64); 3] = [('H', 3_600.0), ('M', 60.0), ('S', 1.0)];

/// Parse an ISO 8601 duration, `[-+]PnYnMnWnDTnHnMnS`.
///
/// Years count as 365 days and months as 30 days.
fn parse_duration(raw: &str) -> Option<TimeDelta> {
    let (negative, rest) = match raw.as_bytes().first()? {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };
    let rest = rest.strip_prefix('P')?;
    let (date, time) = match rest.split_once('T') {
        Some((_, "")) => return None,
        Some((date, time)) => (date, time),
        None => (rest, ""),
    };
    if date.is_empty() && time.is_empty() {
        return None;
    }

    let seconds = sum_components(date, &DATE_UNITS)? + sum_components(time, &TIME_UNITS)?;
    let millis = (seconds * 1_000.0).round();
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::try_milliseconds(millis as i64)?;
    Some(if negative { -delta } else { delta })
}

/// Sum `<number><unit>` components, units in the given order, each at most once.
fn sum_components(mut part: &str, units: &[(char, f64)]) -> Option<f64> {
    let mut total = 0.0;
    let mut next_unit = 0;
    while !part.is_empty() {
        let end = part.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        if end == 0 {
            return None;
        }
        let value: f64 = part[..end].parse().ok()?;
        let unit = part[end..].chars().next()?;
        let offset = units[next_unit..].iter().position(|(u, _)| *u == unit)?;
        total += value * units[next_unit + offset].1;
        next_unit += offset + 1;
        part = &part[end + unit.len_utf8()..];
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::TimeZone;

    #[test]
    fn test_infer_string_with_wildcards() {
        let arg = Argument::infer("*life");
        assert_eq!(arg.kind(), ValueKind::String);
        assert_eq!(arg.as_str(), "life");
        assert!(arg.starts_with_wildcard());
        assert!(!arg.ends_with_wildcard());
        assert_eq!(arg.to_string(), "*life");

        let arg = Argument::infer("001020*");
        assert_eq!(arg.kind(), ValueKind::String);
        assert_eq!(arg.as_str(), "001020");
        assert!(arg.ends_with_wildcard());
    }

    #[test]
    fn test_infer_kinds() {
        assert_eq!(Argument::infer("1").kind(), ValueKind::Number);
        assert_eq!(Argument::infer("-3.25").kind(), ValueKind::Number);
        assert_eq!(Argument::infer("2022-09-16").kind(), ValueKind::DateTime);
        assert_eq!(Argument::infer("P1DT2H").kind(), ValueKind::Duration);
        assert_eq!(Argument::infer("PARIS").kind(), ValueKind::String);
        assert_eq!(Argument::infer("PHD").kind(), ValueKind::String);
        assert_eq!(Argument::infer("2022-09").kind(), ValueKind::String);
        assert_eq!(Argument::infer("2022-09-16 10:00").kind(), ValueKind::String);
        assert_eq!(Argument::infer("inf").kind(), ValueKind::String);
        assert_eq!(Argument::infer("NaN").kind(), ValueKind::String);
    }

    #[test]
    fn test_infer_malformed_keeps_kind() {
        for raw in ["2022-13-45", "2022-02-30T10:00:00Z"] {
            let arg = Argument::infer(raw);
            assert_eq!(arg.kind(), ValueKind::DateTime, "{raw}");
            assert!(arg.as_date_time().is_err(), "{raw}");
        }
        for raw in ["-P1DT", "P1D1Y", "PT1D"] {
            let arg = Argument::infer(raw);
            assert_eq!(arg.kind(), ValueKind::Duration, "{raw}");
            assert!(arg.as_duration().is_err(), "{raw}");
        }
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Argument::number("42").as_int(), Ok(42));
        assert!(Argument::number("4.2").as_int().is_err());
        assert_eq!(Argument::number("0").as_float(), Ok(0.0));
        assert!(Argument::number("NaN").as_float().is_err());
    }

    #[test]
    fn test_date_time_accessor() {
        let expected = Utc.with_ymd_and_hms(2022, 9, 16, 10, 15, 4).unwrap();
        assert_eq!(Argument::date_time("2022-09-16T10:15:04Z").as_date_time(), Ok(expected));
        assert_eq!(
            Argument::date_time("2022-09-16T12:15:04+02:00").as_date_time(),
            Ok(expected)
        );
        assert_eq!(Argument::date_time("2022-09-16T10:15:04").as_date_time(), Ok(expected));
        assert_eq!(
            Argument::date_time("2022-09-16").as_date_time(),
            Ok(Utc.with_ymd_and_hms(2022, 9, 16, 0, 0, 0).unwrap())
        );

        let err = Argument::date_time("2022-13-45").as_date_time().unwrap_err();
        assert_eq!(err.target, "date-time");
    }

    #[test]
    fn test_duration_accessor() {
        assert_eq!(Argument::duration("-P1D").as_duration(), Ok(TimeDelta::days(-1)));
        assert_eq!(Argument::duration("PT1H30M").as_duration(), Ok(TimeDelta::minutes(90)));
        assert_eq!(Argument::duration("P1W").as_duration(), Ok(TimeDelta::days(7)));
        assert_eq!(Argument::duration("PT0.5S").as_duration(), Ok(TimeDelta::milliseconds(500)));
        assert_eq!(
            Argument::duration("P1Y2M").as_duration(),
            Ok(TimeDelta::days(365 + 60))
        );
    }

    #[test]
    fn test_duration_rejects_malformed() {
        for raw in ["P", "PT", "P1DT", "1D", "P1H", "PT1D", "P1D1Y", "P1D1D", "P-1D", "P.D"] {
            assert!(parse_duration(raw).is_none(), "{raw} should not parse");
        }
    }

    #[test]
    fn test_walk_order() {
        let expr: Expression = Group::new(Constraint::new("a", ComparisonOperator::Eq, Argument::string("x")))
            .or(Group::new(Constraint::unary("b")))
            .into();

        let mut events = Vec::new();
        expr.walk(&mut |event| events.push(format!("{event:?}")));

        assert_eq!(
            events,
            vec![
                "GroupEnter",
                "Selector { name: \"a\", unary: false }",
                "Comparison(Eq)",
                "Argument(Argument { literal: \"x\", kind: String, leading_wildcard: false, trailing_wildcard: false })",
                "Operator(Or)",
                "GroupEnter",
                "Selector { name: \"b\", unary: true }",
                "GroupLeave",
                "GroupLeave",
            ]
        );
    }

    #[test]
    fn test_comparison_from_str() {
        assert_eq!("=ge=".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::Gte);
        assert_eq!("<".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::Lt);
        let err = "=in=".parse::<ComparisonOperator>().unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownToken);
    }

    #[test]
    fn test_group_len() {
        let group = Group::new(Constraint::unary("a")).and(Constraint::unary("b"));
        assert_eq!(group.len(), 2);
        assert_eq!(group.rest()[0].0, LogicalOperator::And);
    }
}
