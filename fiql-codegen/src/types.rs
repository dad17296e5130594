//! Mapping from Rust field types to catalog type tags.

use fiql_query::TypeTag;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{GenericArgument, PathArguments, Type};

/// The inferred catalog type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferredType {
    pub tag: Option<TypeTag>,
    pub nullable: bool,
}

/// Infer the type tag of `ty`.
///
/// `Option<T>` marks the field nullable and is inferred from `T`. References
/// and smart pointers are looked through. `tag` is `None` for types with no
/// obvious mapping.
pub fn infer_type(ty: &Type) -> InferredType {
    match ty {
        Type::Reference(reference) => infer_type(&reference.elem),
        Type::Paren(paren) => infer_type(&paren.elem),
        Type::Group(group) => infer_type(&group.elem),
        Type::Path(type_path) => {
            let Some(segment) = type_path.path.segments.last() else {
                return InferredType::unknown();
            };
            let ident = segment.ident.to_string();
            match ident.as_str() {
                "Option" => match first_type_argument(&segment.arguments) {
                    Some(inner) => InferredType {
                        nullable: true,
                        ..infer_type(inner)
                    },
                    None => InferredType::unknown(),
                },
                "Box" | "Arc" | "Rc" => match first_type_argument(&segment.arguments) {
                    Some(inner) => infer_type(inner),
                    None => InferredType::unknown(),
                },
                name => InferredType {
                    tag: scalar_tag(name),
                    nullable: false,
                },
            }
        }
        _ => InferredType::unknown(),
    }
}

impl InferredType {
    fn unknown() -> Self {
        Self {
            tag: None,
            nullable: false,
        }
    }
}

fn scalar_tag(name: &str) -> Option<TypeTag> {
    let tag = match name {
        "String" | "str" | "Cow" | "SmolStr" | "char" => TypeTag::String,
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128"
        | "usize" => TypeTag::Integer,
        "f32" | "f64" | "Decimal" => TypeTag::Float,
        "DateTime" | "NaiveDateTime" | "NaiveDate" | "SystemTime" | "OffsetDateTime"
        | "PrimitiveDateTime" => TypeTag::DateTime,
        "Duration" | "TimeDelta" => TypeTag::Duration,
        _ => return None,
    };
    Some(tag)
}

fn first_type_argument(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

/// Tokens naming `tag` through the facade crate.
pub fn type_tag_tokens(tag: TypeTag) -> TokenStream {
    match tag {
        TypeTag::String => quote! { ::fiql_sql::TypeTag::String },
        TypeTag::Integer => quote! { ::fiql_sql::TypeTag::Integer },
        TypeTag::Float => quote! { ::fiql_sql::TypeTag::Float },
        TypeTag::DateTime => quote! { ::fiql_sql::TypeTag::DateTime },
        TypeTag::Duration => quote! { ::fiql_sql::TypeTag::Duration },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn infer(ty: Type) -> (Option<TypeTag>, bool) {
        let inferred = infer_type(&ty);
        (inferred.tag, inferred.nullable)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(infer(parse_quote!(String)), (Some(TypeTag::String), false));
        assert_eq!(infer(parse_quote!(u64)), (Some(TypeTag::Integer), false));
        assert_eq!(infer(parse_quote!(f32)), (Some(TypeTag::Float), false));
        assert_eq!(infer(parse_quote!(rust_decimal::Decimal)), (Some(TypeTag::Float), false));
        assert_eq!(
            infer(parse_quote!(chrono::DateTime<chrono::Utc>)),
            (Some(TypeTag::DateTime), false)
        );
        assert_eq!(infer(parse_quote!(std::time::Duration)), (Some(TypeTag::Duration), false));
    }

    #[test]
    fn test_option_is_nullable() {
        assert_eq!(infer(parse_quote!(Option<String>)), (Some(TypeTag::String), true));
        assert_eq!(
            infer(parse_quote!(Option<chrono::NaiveDate>)),
            (Some(TypeTag::DateTime), true)
        );
    }

    #[test]
    fn test_references_and_pointers() {
        assert_eq!(infer(parse_quote!(&'a str)), (Some(TypeTag::String), false));
        assert_eq!(infer(parse_quote!(Cow<'a, str>)), (Some(TypeTag::String), false));
        assert_eq!(infer(parse_quote!(Option<Box<i32>>)), (Some(TypeTag::Integer), true));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(infer(parse_quote!(bool)), (None, false));
        assert_eq!(infer(parse_quote!(Vec<i32>)), (None, false));
        assert_eq!(infer(parse_quote!(Option<uuid::Uuid>)), (None, true));
        assert_eq!(infer(parse_quote!((i32, i32))), (None, false));
    }
}
