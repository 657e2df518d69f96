use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr};

pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let collection = match extract_collection(&input) {
        Ok(c) => c,
        Err(err) => return err.to_compile_error().into(),
    };

    let fields = match named_fields(&input) {
        Ok(f) => f,
        Err(err) => return err.to_compile_error().into(),
    };

    let flags = match field_flags(&fields) {
        Ok(f) => f,
        Err(err) => return err.to_compile_error().into(),
    };

    let id_field = match extract_id_field(&input, &fields, &flags) {
        Ok(f) => f,
        Err(err) => return err.to_compile_error().into(),
    };

    let unique_fields: Vec<&Ident> = flags
        .iter()
        .filter(|(_, flag)| flag == "unique")
        .map(|(field, _)| field)
        .collect();
    let unique_keys = unique_fields.iter().map(|field| {
        let key = field.to_string();
        quote! {
            (#key, ::std::string::ToString::to_string(&self.#field))
        }
    });

    let expanded = quote! {
        impl ::minimal_planner::Record for #name {
            const COLLECTION: &'static str = #collection;

            fn id(&self) -> &str {
                &self.#id_field
            }

            fn unique_keys(&self) -> ::std::vec::Vec<(&'static str, ::std::string::String)> {
                ::std::vec![#(#unique_keys),*]
            }
        }
    };

    TokenStream::from(expanded)
}

fn extract_collection(input: &DeriveInput) -> syn::Result<String> {
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        let mut collection = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `collection = \"...\"`"))
            }
        })?;

        if let Some(c) = collection {
            return Ok(c);
        }
    }

    Ok(to_snake_case(&input.ident.to_string()))
}

fn named_fields(input: &DeriveInput) -> syn::Result<Vec<&syn::Field>> {
    if let Data::Struct(data_struct) = &input.data {
        if let Fields::Named(fields) = &data_struct.fields {
            return Ok(fields.named.iter().collect());
        }
    }

    Err(syn::Error::new_spanned(
        &input.ident,
        "Record derive: only structs with named fields are supported",
    ))
}

fn extract_id_field(
    input: &DeriveInput,
    fields: &[&syn::Field],
    flags: &[(Ident, String)],
) -> syn::Result<Ident> {
    if let Some((field, _)) = flags.iter().find(|(_, flag)| flag == "id") {
        return Ok(field.clone());
    }

    fields
        .iter()
        .filter_map(|field| field.ident.clone())
        .find(|ident| ident == "id")
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &input.ident,
                "Record derive: no field marked with #[record(id)] and no field named `id`",
            )
        })
}

/// `(field, flag)` for every `#[record(id)]` / `#[record(unique)]` on a field.
fn field_flags(fields: &[&syn::Field]) -> syn::Result<Vec<(Ident, String)>> {
    let mut found = Vec::new();
    for field in fields {
        for attr in &field.attrs {
            if !attr.path().is_ident("record") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                let flag = if meta.path.is_ident("id") {
                    "id"
                } else if meta.path.is_ident("unique") {
                    "unique"
                } else {
                    return Err(meta.error("expected `id` or `unique`"));
                };
                if !meta.input.is_empty() && !meta.input.peek(syn::Token![,]) {
                    return Err(meta.error(format!("`{flag}` takes no value")));
                }
                if let Some(ident) = &field.ident {
                    found.push((ident.clone(), flag.to_string()));
                }
                Ok(())
            })?;
        }
    }
    Ok(found)
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
