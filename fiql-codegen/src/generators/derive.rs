//! Implementation of the `#[derive(Filterable)]` macro.

use std::collections::HashSet;

use fiql_query::{Annotation, TypeTag};
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Token};

use crate::types::{infer_type, type_tag_tokens};

/// Parse and generate code for the `#[derive(Filterable)]` macro.
pub fn derive_filterable_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Filterable derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Filterable derive only supports structs",
            ));
        }
    };

    let mut aliases = HashSet::new();
    let mut descriptors = Vec::new();
    for field in fields {
        let Some(descriptor) = parse_field(field)? else {
            continue;
        };
        if !aliases.insert(descriptor.alias.to_lowercase()) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate filter alias `{}`", descriptor.alias),
            ));
        }
        descriptors.push(descriptor.to_tokens());
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::fiql_sql::Filterable for #name #ty_generics #where_clause {
            fn field_catalog() -> ::fiql_sql::FieldCatalog {
                ::fiql_sql::FieldCatalog::builder()
                    #(.field(#descriptors))*
                    .build()
            }
        }
    })
}

/// A catalog entry resolved at expansion time.
#[derive(Debug)]
struct DescriptorInfo {
    column: String,
    alias: String,
    tag: TypeTag,
    nullable: bool,
    qualifier: Option<String>,
}

impl DescriptorInfo {
    fn to_tokens(&self) -> TokenStream {
        let column = &self.column;
        let alias = &self.alias;
        let tag = type_tag_tokens(self.tag);
        let nullable = self.nullable;
        let qualified = self.qualifier.as_ref().map(|q| quote! { .qualified(#q) });
        quote! {
            ::fiql_sql::FieldDescriptor::new(#column, #alias, #tag)
                .nullable(#nullable)
                #qualified
        }
    }
}

/// One item inside `#[fiql(...)]`.
enum FieldArg {
    Annotation(LitStr),
    Skip,
    Kind(LitStr),
}

impl Parse for FieldArg {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        if input.peek(LitStr) {
            return Ok(Self::Annotation(input.parse()?));
        }
        let ident: Ident = input.parse()?;
        if ident == "skip" {
            Ok(Self::Skip)
        } else if ident == "kind" {
            input.parse::<Token![=]>()?;
            Ok(Self::Kind(input.parse()?))
        } else {
            Err(syn::Error::new_spanned(
                ident,
                "expected an annotation string, `skip` or `kind = \"...\"`",
            ))
        }
    }
}

/// Field-level `#[fiql(...)]` options.
#[derive(Default)]
struct FieldAttrs {
    annotation: Option<LitStr>,
    skip: bool,
    kind: Option<LitStr>,
}

fn parse_field_attrs(field: &syn::Field) -> Result<FieldAttrs, syn::Error> {
    let mut attrs = FieldAttrs::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("fiql") {
            continue;
        }

        let args = attr.parse_args_with(Punctuated::<FieldArg, Token![,]>::parse_terminated)?;
        for arg in args {
            match arg {
                FieldArg::Annotation(lit) if attrs.annotation.is_some() => {
                    return Err(syn::Error::new_spanned(lit, "duplicate annotation"));
                }
                FieldArg::Annotation(lit) => attrs.annotation = Some(lit),
                FieldArg::Skip => attrs.skip = true,
                FieldArg::Kind(lit) => attrs.kind = Some(lit),
            }
        }
    }

    Ok(attrs)
}

/// Resolve a field to its catalog entry; `None` when it is not filterable.
fn parse_field(field: &syn::Field) -> Result<Option<DescriptorInfo>, syn::Error> {
    let name = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "Fields must be named"))?
        .unraw()
        .to_string();

    let attrs = parse_field_attrs(field)?;
    let Some(lit) = attrs.annotation.filter(|_| !attrs.skip) else {
        if let (Some(kind), false) = (&attrs.kind, attrs.skip) {
            return Err(syn::Error::new_spanned(kind, "`kind` requires an annotation string"));
        }
        return Ok(None);
    };

    let annotation = Annotation::parse(&name, &lit.value())
        .map_err(|e| syn::Error::new_spanned(&lit, e.to_string()))?;
    let Some(annotation) = annotation else {
        return Ok(None);
    };

    let inferred = infer_type(&field.ty);
    let tag = match &attrs.kind {
        Some(kind) => kind
            .value()
            .parse::<TypeTag>()
            .map_err(|e| syn::Error::new_spanned(kind, e.to_string()))?,
        None => inferred.tag.ok_or_else(|| {
            syn::Error::new_spanned(
                &field.ty,
                format!(
                    "cannot infer a filter type for field `{name}`; add #[fiql(kind = \"...\")]"
                ),
            )
        })?,
    };

    let descriptor = annotation.into_descriptor(&name, tag, inferred.nullable);
    Ok(Some(DescriptorInfo {
        column: descriptor.db_name.to_string(),
        alias: descriptor.alias.to_string(),
        tag: descriptor.type_tag,
        nullable: descriptor.nullable,
        qualifier: descriptor.table_qualifier.map(|q| q.to_string()),
    }))
}
