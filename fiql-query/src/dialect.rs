//! SQL dialect profiles.
//!
//! A [`DialectProfile`] captures the three lexical details that differ
//! between the supported engines: identifier quoting, parameter placeholders
//! and string concatenation. [`Dialect`] names the presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FiqlError;

/// How identifiers are delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierDelimiter {
    /// Identifiers are emitted verbatim.
    None,
    /// `"name"`, as defined by SQL92.
    DoubleQuote,
    /// `[name]`, used by MSSQL.
    Bracket,
    /// `` `name` ``, used by MariaDB and MySQL.
    Backtick,
}

impl IdentifierDelimiter {
    fn pair(&self) -> Option<(char, char)> {
        match self {
            Self::None => None,
            Self::DoubleQuote => Some(('"', '"')),
            Self::Bracket => Some(('[', ']')),
            Self::Backtick => Some(('`', '`')),
        }
    }

    /// Write `name` delimited, doubling any embedded closing delimiter.
    pub fn write_quoted(&self, name: &str, buffer: &mut String) {
        let Some((open, close)) = self.pair() else {
            buffer.push_str(name);
            return;
        };
        buffer.push(open);
        for c in name.chars() {
            if c == close {
                buffer.push(close);
            }
            buffer.push(c);
        }
        buffer.push(close);
    }
}

/// How parameter placeholders are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterStyle {
    /// `$1`, `$2`, ... (PostgreSQL).
    DollarNumbered,
    /// `@1`, `@2`, ... (MSSQL).
    AtNumbered,
    /// `?` for every parameter.
    QuestionMark,
}

impl ParameterStyle {
    /// Write the placeholder for the 1-based parameter `index`.
    #[inline]
    pub fn write_placeholder(&self, index: usize, buffer: &mut String) {
        match self {
            Self::DollarNumbered => {
                buffer.push('$');
                buffer.push_str(&index.to_string());
            }
            Self::AtNumbered => {
                buffer.push('@');
                buffer.push_str(&index.to_string());
            }
            Self::QuestionMark => buffer.push('?'),
        }
    }

    /// Get the placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        let mut buffer = String::with_capacity(4);
        self.write_placeholder(index, &mut buffer);
        buffer
    }

    /// Whether placeholders carry their index.
    pub fn is_numbered(&self) -> bool {
        !matches!(self, Self::QuestionMark)
    }
}

/// How strings are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concatenation {
    /// `CONCAT(a, b, ...)`.
    Function,
    /// `a || b`.
    Infix,
}

impl Concatenation {
    /// Write `placeholder` wrapped with `'%'` on the requested sides.
    ///
    /// Without wildcards the placeholder is written as is.
    pub fn write_wildcard(&self, placeholder: &str, leading: bool, trailing: bool, buffer: &mut String) {
        if !leading && !trailing {
            buffer.push_str(placeholder);
            return;
        }
        match self {
            Self::Function => {
                buffer.push_str("CONCAT(");
                if leading {
                    buffer.push_str("'%',");
                }
                buffer.push_str(placeholder);
                if trailing {
                    buffer.push_str(",'%'");
                }
                buffer.push(')');
            }
            Self::Infix => {
                if leading {
                    buffer.push_str("'%' || ");
                }
                buffer.push_str(placeholder);
                if trailing {
                    buffer.push_str(" || '%'");
                }
            }
        }
    }
}

/// Lexical rules of a target SQL engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialectProfile {
    /// Identifier quoting.
    pub delimiter: IdentifierDelimiter,
    /// Placeholder scheme.
    pub parameter_style: ParameterStyle,
    /// Concatenation idiom used for wildcard matching.
    pub concatenation: Concatenation,
}

impl DialectProfile {
    /// PostgreSQL.
    pub const POSTGRES: Self = Self {
        delimiter: IdentifierDelimiter::DoubleQuote,
        parameter_style: ParameterStyle::DollarNumbered,
        concatenation: Concatenation::Function,
    };

    /// Microsoft SQL Server.
    pub const MSSQL: Self = Self {
        delimiter: IdentifierDelimiter::Bracket,
        parameter_style: ParameterStyle::AtNumbered,
        concatenation: Concatenation::Function,
    };

    /// MariaDB and MySQL.
    pub const MARIADB: Self = Self {
        delimiter: IdentifierDelimiter::Backtick,
        parameter_style: ParameterStyle::QuestionMark,
        concatenation: Concatenation::Function,
    };

    /// SQLite.
    pub const SQLITE: Self = Self {
        delimiter: IdentifierDelimiter::DoubleQuote,
        parameter_style: ParameterStyle::QuestionMark,
        concatenation: Concatenation::Infix,
    };

    /// Standard SQL92.
    pub const SQL92: Self = Self {
        delimiter: IdentifierDelimiter::DoubleQuote,
        parameter_style: ParameterStyle::QuestionMark,
        concatenation: Concatenation::Function,
    };

    /// SQL92 without identifier delimiters.
    pub const SQL92_NO_DELIMITER: Self = Self {
        delimiter: IdentifierDelimiter::None,
        parameter_style: ParameterStyle::QuestionMark,
        concatenation: Concatenation::Function,
    };

    /// Write a single delimited identifier.
    #[inline]
    pub fn write_identifier(&self, name: &str, buffer: &mut String) {
        self.delimiter.write_quoted(name, buffer);
    }

    /// Get a single delimited identifier.
    pub fn quote_identifier(&self, name: &str) -> String {
        let mut buffer = String::with_capacity(name.len() + 2);
        self.write_identifier(name, &mut buffer);
        buffer
    }

    /// Write a column reference, optionally qualified.
    ///
    /// Each dot-separated segment of the qualifier is delimited on its own,
    /// so `sales.orders` + `id` becomes `"sales"."orders"."id"`.
    pub fn write_column(&self, qualifier: Option<&str>, column: &str, buffer: &mut String) {
        if let Some(qualifier) = qualifier {
            for segment in qualifier.split('.') {
                self.write_identifier(segment, buffer);
                buffer.push('.');
            }
        }
        self.write_identifier(column, buffer);
    }
}

impl Default for DialectProfile {
    fn default() -> Self {
        Self::SQL92
    }
}

/// Named dialect presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dialect {
    /// PostgreSQL.
    Postgres,
    /// Microsoft SQL Server.
    Mssql,
    /// MariaDB / MySQL.
    MariaDb,
    /// SQLite.
    Sqlite,
    /// Standard SQL92.
    #[default]
    Sql92,
    /// SQL92 without identifier delimiters.
    Sql92NoDelimiter,
}

impl Dialect {
    /// All presets.
    pub const ALL: [Self; 6] = [
        Self::Postgres,
        Self::Mssql,
        Self::MariaDb,
        Self::Sqlite,
        Self::Sql92,
        Self::Sql92NoDelimiter,
    ];

    /// Get the canonical preset name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mssql => "mssql",
            Self::MariaDb => "mariadb",
            Self::Sqlite => "sqlite",
            Self::Sql92 => "sql92",
            Self::Sql92NoDelimiter => "sql92-no-delimiter",
        }
    }

    /// Get the profile for this preset.
    pub fn profile(&self) -> DialectProfile {
        match self {
            Self::Postgres => DialectProfile::POSTGRES,
            Self::Mssql => DialectProfile::MSSQL,
            Self::MariaDb => DialectProfile::MARIADB,
            Self::Sqlite => DialectProfile::SQLITE,
            Self::Sql92 => DialectProfile::SQL92,
            Self::Sql92NoDelimiter => DialectProfile::SQL92_NO_DELIMITER,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = FiqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mssql" | "sqlserver" => Ok(Self::Mssql),
            "mariadb" | "maria" | "mysql" => Ok(Self::MariaDb),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "sql92" | "standard" => Ok(Self::Sql92),
            "sql92-no-delimiter" | "sql92_no_delimiter" => Ok(Self::Sql92NoDelimiter),
            _ => Err(FiqlError::Config {
                message: format!(
                    "unknown dialect `{s}`, expected one of: {}",
                    Self::ALL.map(|d| d.as_str()).join(", ")
                ),
            }),
        }
    }
}

impl TryFrom<String> for Dialect {
    type Error = FiqlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dialect> for String {
    fn from(dialect: Dialect) -> Self {
        dialect.as_str().to_string()
    }
}

impl From<Dialect> for DialectProfile {
    fn from(dialect: Dialect) -> Self {
        dialect.profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(DialectProfile::SQL92.quote_identifier("mylife"), "\"mylife\"");
        assert_eq!(DialectProfile::MSSQL.quote_identifier("mylife"), "[mylife]");
        assert_eq!(DialectProfile::MARIADB.quote_identifier("mylife"), "`mylife`");
        assert_eq!(DialectProfile::SQL92_NO_DELIMITER.quote_identifier("mylife"), "mylife");
    }

    #[test]
    fn test_quote_identifier_escapes_closing_delimiter() {
        assert_eq!(DialectProfile::POSTGRES.quote_identifier("has\"quote"), "\"has\"\"quote\"");
        assert_eq!(DialectProfile::MSSQL.quote_identifier("a]b"), "[a]]b]");
        assert_eq!(DialectProfile::MARIADB.quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(ParameterStyle::DollarNumbered.placeholder(1), "$1");
        assert_eq!(ParameterStyle::DollarNumbered.placeholder(12), "$12");
        assert_eq!(ParameterStyle::AtNumbered.placeholder(3), "@3");
        assert_eq!(ParameterStyle::QuestionMark.placeholder(3), "?");
        assert!(!ParameterStyle::QuestionMark.is_numbered());
    }

    #[test]
    fn test_write_column_qualified() {
        let mut sql = String::new();
        DialectProfile::POSTGRES.write_column(Some("sales.orders"), "id", &mut sql);
        assert_eq!(sql, "\"sales\".\"orders\".\"id\"");

        let mut sql = String::new();
        DialectProfile::MSSQL.write_column(None, "id", &mut sql);
        assert_eq!(sql, "[id]");
    }

    #[test]
    fn test_wildcard_function() {
        let render = |leading, trailing| {
            let mut sql = String::new();
            Concatenation::Function.write_wildcard("@1", leading, trailing, &mut sql);
            sql
        };
        assert_eq!(render(true, false), "CONCAT('%',@1)");
        assert_eq!(render(false, true), "CONCAT(@1,'%')");
        assert_eq!(render(true, true), "CONCAT('%',@1,'%')");
        assert_eq!(render(false, false), "@1");
    }

    #[test]
    fn test_wildcard_infix() {
        let render = |leading, trailing| {
            let mut sql = String::new();
            Concatenation::Infix.write_wildcard("?", leading, trailing, &mut sql);
            sql
        };
        assert_eq!(render(true, false), "'%' || ?");
        assert_eq!(render(false, true), "? || '%'");
        assert_eq!(render(true, true), "'%' || ? || '%'");
        assert_eq!(render(false, false), "?");
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("MSSQL".parse::<Dialect>().unwrap(), Dialect::Mssql);
        assert_eq!("maria".parse::<Dialect>().unwrap(), Dialect::MariaDb);
        assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::MariaDb);
        assert_eq!("sqlite3".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert_eq!(
            "sql92-no-delimiter".parse::<Dialect>().unwrap(),
            Dialect::Sql92NoDelimiter
        );
        let err = "oracle".parse::<Dialect>().unwrap_err();
        assert!(err.to_string().contains("configuration error"));
    }

    #[test]
    fn test_dialect_round_trips_names() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.as_str().parse::<Dialect>().unwrap(), dialect);
        }
    }

    #[test]
    fn test_presets() {
        assert_eq!(Dialect::default().profile(), DialectProfile::SQL92);
        assert_eq!(Dialect::Sqlite.profile().concatenation, Concatenation::Infix);
        assert_eq!(
            Dialect::Postgres.profile().parameter_style,
            ParameterStyle::DollarNumbered
        );
    }
}
