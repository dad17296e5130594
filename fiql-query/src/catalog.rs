//! Field catalogs mapping filter selectors to database columns.
//!
//! A catalog is built once and then shared read-only by every build call.
//! Lookups are case-insensitive: aliases are lower-cased on insertion and on
//! lookup.
//!
//! ```rust
//! use fiql_query::{FieldCatalog, TypeTag};
//!
//! let catalog = FieldCatalog::builder()
//!     .string("display_name", "name")
//!     .integer("age_years", "age")
//!     .build();
//!
//! let field = catalog.resolve("NAME").unwrap();
//! assert_eq!(field.db_name, "display_name");
//! assert_eq!(field.type_tag, TypeTag::String);
//! ```

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::{FiqlError, FiqlResult};

/// The declared value type of a catalog field.
///
/// Optional columns use the same tag as their non-optional form; see
/// [`FieldDescriptor::nullable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// Text column.
    String,
    /// Whole number column.
    Integer,
    /// Decimal / floating point column.
    Float,
    /// Point in time column.
    DateTime,
    /// Time span column.
    Duration,
}

impl TypeTag {
    /// Get the tag name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::DateTime => "datetime",
            Self::Duration => "duration",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = FiqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => Ok(Self::String),
            "integer" | "int" => Ok(Self::Integer),
            "float" | "decimal" => Ok(Self::Float),
            "datetime" | "date_time" | "timestamp" => Ok(Self::DateTime),
            "duration" => Ok(Self::Duration),
            _ => Err(FiqlError::unknown_token("field type", s)),
        }
    }
}

/// One filterable / sortable column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Backing column name.
    pub db_name: SmolStr,
    /// Selector alias as declared.
    pub alias: SmolStr,
    /// Declared value type.
    pub type_tag: TypeTag,
    /// Whether the source field is optional. Never affects predicate shape.
    pub nullable: bool,
    /// Table (or `schema.table`) qualifier for the column.
    pub table_qualifier: Option<SmolStr>,
}

impl FieldDescriptor {
    /// Create a new descriptor.
    pub fn new(db_name: impl Into<SmolStr>, alias: impl Into<SmolStr>, type_tag: TypeTag) -> Self {
        Self {
            db_name: db_name.into(),
            alias: alias.into(),
            type_tag,
            nullable: false,
            table_qualifier: None,
        }
    }

    /// Mark the field as optional.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the table qualifier.
    pub fn qualified(mut self, qualifier: impl Into<SmolStr>) -> Self {
        self.table_qualifier = Some(qualifier.into());
        self
    }
}

/// Parsed field annotation: `alias[,db:[qualifier.]column]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Selector alias.
    pub alias: String,
    /// Column override; `None` means the field name is the column.
    pub column: Option<String>,
    /// Table qualifier, everything before the last dot of the `db:` value.
    pub qualifier: Option<String>,
}

impl Annotation {
    /// Parse an annotation value for `field`.
    ///
    /// Returns `Ok(None)` for `-`, which excludes the field.
    ///
    /// ```rust
    /// use fiql_query::catalog::Annotation;
    ///
    /// let a = Annotation::parse("created", "cre,db:sales.orders.created_at")
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(a.alias, "cre");
    /// assert_eq!(a.qualifier.as_deref(), Some("sales.orders"));
    /// assert_eq!(a.column.as_deref(), Some("created_at"));
    /// ```
    pub fn parse(field: &str, value: &str) -> FiqlResult<Option<Self>> {
        let invalid = |message: &str| FiqlError::invalid_annotation(field, value, message);

        let mut parts = value.split(',');
        let alias = parts.next().unwrap_or_default().trim();
        if alias == "-" {
            return Ok(None);
        }
        if alias.is_empty() {
            return Err(invalid("alias must not be empty"));
        }

        let mut annotation = Self {
            alias: alias.to_string(),
            column: None,
            qualifier: None,
        };

        for part in parts {
            let part = part.trim();
            let Some(db) = part.strip_prefix("db:") else {
                return Err(invalid(&format!("unknown option `{part}`")));
            };
            match db.rsplit_once('.') {
                Some((qualifier, column)) => {
                    if column.is_empty() || qualifier.split('.').any(str::is_empty) {
                        return Err(invalid("`db:` has an empty qualifier or column"));
                    }
                    annotation.qualifier = Some(qualifier.to_string());
                    annotation.column = Some(column.to_string());
                }
                None if db.is_empty() => return Err(invalid("`db:` needs a column name")),
                None => annotation.column = Some(db.to_string()),
            }
        }

        Ok(Some(annotation))
    }

    /// Build the descriptor for a field with this annotation.
    pub fn into_descriptor(self, field: &str, type_tag: TypeTag, nullable: bool) -> FieldDescriptor {
        let column = self.column.unwrap_or_else(|| field.to_string());
        let descriptor = FieldDescriptor::new(column, self.alias, type_tag).nullable(nullable);
        match self.qualifier {
            Some(qualifier) => descriptor.qualified(qualifier),
            None => descriptor,
        }
    }
}

/// A row of a static registration table, see [`FieldCatalog::from_annotations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDeclaration<'a> {
    /// Field name, used as the column when the annotation has no `db:` part.
    pub name: &'a str,
    /// Declared value type.
    pub type_tag: TypeTag,
    /// Whether the field is optional.
    pub nullable: bool,
    /// Annotation value; `None` excludes the field.
    pub annotation: Option<&'a str>,
}

impl<'a> FieldDeclaration<'a> {
    /// Declare an annotated field.
    pub const fn new(name: &'a str, type_tag: TypeTag, annotation: &'a str) -> Self {
        Self {
            name,
            type_tag,
            nullable: false,
            annotation: Some(annotation),
        }
    }

    /// Declare a field without an annotation (excluded from the catalog).
    pub const fn hidden(name: &'a str, type_tag: TypeTag) -> Self {
        Self {
            name,
            type_tag,
            nullable: false,
            annotation: None,
        }
    }

    /// Mark the field as optional.
    pub const fn optional(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Types that describe their own field catalog.
///
/// Usually implemented with `#[derive(Filterable)]`.
pub trait Filterable {
    /// Build the catalog for this type.
    fn field_catalog() -> FieldCatalog;
}

/// Case-insensitive mapping from selector alias to [`FieldDescriptor`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCatalog {
    fields: IndexMap<SmolStr, FieldDescriptor>,
}

impl FieldCatalog {
    /// Start building a catalog.
    pub fn builder() -> FieldCatalogBuilder {
        FieldCatalogBuilder::default()
    }

    /// Build a catalog from a static registration table.
    ///
    /// ```rust
    /// use fiql_query::catalog::{FieldCatalog, FieldDeclaration};
    /// use fiql_query::TypeTag;
    ///
    /// let catalog = FieldCatalog::from_annotations(&[
    ///     FieldDeclaration::new("id", TypeTag::Integer, "id"),
    ///     FieldDeclaration::new("fee", TypeTag::Float, "fee,db:fee_total").optional(),
    ///     FieldDeclaration::hidden("secret", TypeTag::String),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(catalog.len(), 2);
    /// assert!(catalog.resolve("secret").is_none());
    /// ```
    pub fn from_annotations(declarations: &[FieldDeclaration<'_>]) -> FiqlResult<Self> {
        let mut builder = Self::builder();
        for declaration in declarations {
            let Some(value) = declaration.annotation else {
                continue;
            };
            if let Some(annotation) = Annotation::parse(declaration.name, value)? {
                builder = builder.field(annotation.into_descriptor(
                    declaration.name,
                    declaration.type_tag,
                    declaration.nullable,
                ));
            }
        }
        Ok(builder.build())
    }

    /// Look up a selector alias, ignoring case.
    pub fn resolve(&self, alias: &str) -> Option<&FieldDescriptor> {
        self.fields.get(alias.to_lowercase().as_str())
    }

    /// Check if an alias is registered.
    pub fn contains(&self, alias: &str) -> bool {
        self.resolve(alias).is_some()
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    fn insert(&mut self, descriptor: FieldDescriptor) {
        let key = SmolStr::new(descriptor.alias.to_lowercase());
        self.fields.insert(key, descriptor);
    }
}

impl FromIterator<FieldDescriptor> for FieldCatalog {
    fn from_iter<I: IntoIterator<Item = FieldDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::default();
        for descriptor in iter {
            catalog.insert(descriptor);
        }
        catalog
    }
}

/// Fluent builder for [`FieldCatalog`]. The last entry for an alias wins.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalogBuilder {
    catalog: FieldCatalog,
}

impl FieldCatalogBuilder {
    /// Add a descriptor.
    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.catalog.insert(descriptor);
        self
    }

    /// Map `alias` to a string column.
    pub fn string(self, column: impl Into<SmolStr>, alias: impl Into<SmolStr>) -> Self {
        self.field(FieldDescriptor::new(column, alias, TypeTag::String))
    }

    /// Map `alias` to an integer column.
    pub fn integer(self, column: impl Into<SmolStr>, alias: impl Into<SmolStr>) -> Self {
        self.field(FieldDescriptor::new(column, alias, TypeTag::Integer))
    }

    /// Map `alias` to a float column.
    pub fn float(self, column: impl Into<SmolStr>, alias: impl Into<SmolStr>) -> Self {
        self.field(FieldDescriptor::new(column, alias, TypeTag::Float))
    }

    /// Map `alias` to a date-time column.
    pub fn date_time(self, column: impl Into<SmolStr>, alias: impl Into<SmolStr>) -> Self {
        self.field(FieldDescriptor::new(column, alias, TypeTag::DateTime))
    }

    /// Map `alias` to a duration column.
    pub fn duration(self, column: impl Into<SmolStr>, alias: impl Into<SmolStr>) -> Self {
        self.field(FieldDescriptor::new(column, alias, TypeTag::Duration))
    }

    /// Finish the catalog.
    pub fn build(self) -> FieldCatalog {
        self.catalog
    }
}
