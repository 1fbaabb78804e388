use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, GenericArgument, Lit, PathArguments, Type, parse_macro_input};

/// Semantic field type as emitted into the generated descriptor.
enum Mapped {
    Integer,
    Text,
    Boolean,
    Unsupported(String),
}

/// Map a Rust type to a semantic field type, unwrapping `Option<T>`.
///
/// Returns the mapped type and whether the field is nullable.
fn map_type(ty: &Type) -> (Mapped, bool) {
    if let Some(inner) = option_inner(ty) {
        let (mapped, _) = map_type(inner);
        return (mapped, true);
    }

    let mapped = match ty {
        Type::Reference(r) => match &*r.elem {
            Type::Path(p) if p.path.is_ident("str") => Mapped::Text,
            other => Mapped::Unsupported(type_string(other)),
        },
        Type::Path(p) => match p.path.segments.last().map(|s| s.ident.to_string()).as_deref() {
            Some(
                "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize",
            ) => Mapped::Integer,
            Some("String" | "char") => Mapped::Text,
            Some("bool") => Mapped::Boolean,
            _ => Mapped::Unsupported(type_string(ty)),
        },
        _ => Mapped::Unsupported(type_string(ty)),
    };
    (mapped, false)
}

fn type_string(ty: &Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(p) = ty else { return None };
    let segment = p.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

/// Skip the value of a nested meta item we do not interpret (`key = value` or `key(...)`).
fn skip_meta_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.input.parse::<syn::Token![=]>()?;
        meta.input.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<proc_macro2::TokenStream>()?;
    }
    Ok(())
}

/// Read the serialize-side value of `key = "..."` or `key(serialize = "...")`.
fn serialize_name(meta: &syn::meta::ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(syn::Token![=]) {
        meta.input.parse::<syn::Token![=]>()?;
        let lit: Lit = meta.input.parse()?;
        return Ok(match lit {
            Lit::Str(s) => Some(s.value()),
            _ => None,
        });
    }
    let mut name = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            let lit: Lit = inner.value()?.parse()?;
            if let Lit::Str(s) = lit {
                name = Some(s.value());
            }
            Ok(())
        } else {
            skip_meta_value(&inner)
        }
    })?;
    Ok(name)
}

/// Get the serialized name from `#[serde(rename = "...")]`, if any.
fn serde_rename(field: &syn::Field) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in &field.attrs {
        if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    name = serialize_name(&meta)?;
                    Ok(())
                } else {
                    skip_meta_value(&meta)
                }
            })?;
        }
    }
    Ok(name)
}

/// Get the container rule from `#[serde(rename_all = "...")]`, if any.
fn serde_rename_all(input: &DeriveInput) -> syn::Result<Option<String>> {
    let mut rule = None;
    for attr in &input.attrs {
        if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    rule = serialize_name(&meta)?;
                    Ok(())
                } else {
                    skip_meta_value(&meta)
                }
            })?;
        }
    }
    Ok(rule)
}

/// Apply a serde `rename_all` rule to a snake_case field name.
fn apply_rename_rule(rule: &str, field: &str) -> Option<String> {
    let renamed = match rule {
        "lowercase" => field.to_lowercase(),
        "UPPERCASE" => field.to_uppercase(),
        "PascalCase" => field.to_upper_camel_case(),
        "camelCase" => field.to_lower_camel_case(),
        "snake_case" => field.to_snake_case(),
        "SCREAMING_SNAKE_CASE" => field.to_shouty_snake_case(),
        "kebab-case" => field.to_kebab_case(),
        "SCREAMING-KEBAB-CASE" => field.to_shouty_kebab_case(),
        _ => return None,
    };
    Some(renamed)
}

/// Parse `#[record(table = "...", primary_key = "a, b")]`.
fn parse_record_attr(input: &DeriveInput) -> syn::Result<(Option<String>, Vec<String>)> {
    let mut table = None;
    let mut primary_key = Vec::new();
    for attr in &input.attrs {
        if attr.path().is_ident("record") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    meta.input.parse::<syn::Token![=]>()?;
                    let lit: Lit = meta.input.parse()?;
                    if let Lit::Str(s) = lit {
                        table = Some(s.value());
                    }
                    Ok(())
                } else if meta.path.is_ident("primary_key") {
                    meta.input.parse::<syn::Token![=]>()?;
                    let lit: Lit = meta.input.parse()?;
                    if let Lit::Str(s) = lit {
                        primary_key = s
                            .value()
                            .split(',')
                            .map(|k| k.trim().to_string())
                            .filter(|k| !k.is_empty())
                            .collect();
                    }
                    Ok(())
                } else {
                    Err(meta.error("expected `table` or `primary_key`"))
                }
            })?;
        }
    }
    Ok((table, primary_key))
}

/// Derive macro for the `Record` trait.
///
/// Generates the explicit field descriptors a table binding needs. Field types
/// map as follows:
/// - integer primitives → Integer
/// - `String`, `&str`, `char` → Text
/// - `bool` → Boolean
/// - `Option<T>` → as `T`, nullable (`None` means "not provided")
///
/// Column names follow serde: `#[serde(rename)]` on a field and
/// `#[serde(rename_all)]` on the struct are honored.
///
/// Any other type is recorded as unsupported and rejected when the table is
/// created.
///
/// ## Example
///
/// ```text
/// #[derive(Clone, Serialize, Deserialize, Record)]
/// #[record(table = "members", primary_key = "org, id")]
/// struct Member {
///     pub org: String,
///     pub id: i64,
///     pub admin: bool,
/// }
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Record only supports structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Record only supports structs")),
    };

    let (table, primary_key) = parse_record_attr(input)?;
    let rename_all = serde_rename_all(input)?;
    if let Some(rule) = &rename_all {
        if apply_rename_rule(rule, "").is_none() {
            return Err(syn::Error::new_spanned(
                name,
                format!("unsupported serde rename_all rule `{}`", rule),
            ));
        }
    }

    let mut descriptors = Vec::new();
    for field in fields.iter() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let column = match serde_rename(field)? {
            Some(renamed) => renamed,
            None => {
                let declared = ident.to_string().trim_start_matches("r#").to_string();
                match &rename_all {
                    Some(rule) => apply_rename_rule(rule, &declared).unwrap_or(declared),
                    None => declared,
                }
            }
        };
        let (mapped, nullable) = map_type(&field.ty);
        let field_type = match mapped {
            Mapped::Integer => quote! { tablemap::FieldType::Integer },
            Mapped::Text => quote! { tablemap::FieldType::Text },
            Mapped::Boolean => quote! { tablemap::FieldType::Boolean },
            Mapped::Unsupported(ty) => quote! { tablemap::FieldType::Unsupported(#ty) },
        };
        let nullable = if nullable {
            quote! { .nullable() }
        } else {
            quote! {}
        };
        descriptors.push(quote! {
            tablemap::FieldDescriptor::new(#column, #field_type)#nullable
        });
    }

    let type_name = name.to_string();
    let table_name_impl = table.map(|table| {
        quote! {
            fn table_name() -> Option<&'static str> {
                Some(#table)
            }
        }
    });
    let primary_key_impl = if primary_key.is_empty() {
        None
    } else {
        Some(quote! {
            fn primary_key() -> &'static [&'static str] {
                &[#(#primary_key),*]
            }
        })
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics tablemap::Record for #name #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #type_name
            }

            fn fields() -> &'static [tablemap::FieldDescriptor] {
                const FIELDS: &[tablemap::FieldDescriptor] = &[#(#descriptors),*];
                FIELDS
            }

            #table_name_impl

            #primary_key_impl
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_rules_match_serde() {
        assert_eq!(apply_rename_rule("camelCase", "user_name").as_deref(), Some("userName"));
        assert_eq!(apply_rename_rule("PascalCase", "user_name").as_deref(), Some("UserName"));
        assert_eq!(
            apply_rename_rule("SCREAMING_SNAKE_CASE", "user_name").as_deref(),
            Some("USER_NAME")
        );
        assert_eq!(apply_rename_rule("kebab-case", "user_name").as_deref(), Some("user-name"));
        assert_eq!(apply_rename_rule("lowercase", "user_name").as_deref(), Some("user_name"));
        assert_eq!(apply_rename_rule("Title Case", "user_name"), None);
    }

    #[test]
    fn container_rename_all_is_read() {
        let input: DeriveInput = syn::parse_quote! {
            #[serde(deny_unknown_fields, rename_all = "camelCase")]
            struct UserProfile {
                user_name: String,
            }
        };
        assert_eq!(serde_rename_all(&input).unwrap().as_deref(), Some("camelCase"));

        let input: DeriveInput = syn::parse_quote! {
            #[serde(rename_all(serialize = "kebab-case", deserialize = "kebab-case"))]
            struct UserProfile {
                user_name: String,
            }
        };
        assert_eq!(serde_rename_all(&input).unwrap().as_deref(), Some("kebab-case"));
    }

    #[test]
    fn field_rename_overrides_container_rule() {
        let input: DeriveInput = syn::parse_quote! {
            #[serde(rename_all = "camelCase")]
            struct UserProfile {
                #[serde(rename = "display")]
                display_name: String,
                user_name: String,
            }
        };
        let expanded = expand(&input).unwrap().to_string();
        assert!(expanded.contains("\"display\""));
        assert!(expanded.contains("\"userName\""));
        assert!(!expanded.contains("\"user_name\""));
        assert!(!expanded.contains("\"displayName\""));
    }
}
