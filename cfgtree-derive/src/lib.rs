//! Derive macros for `cfgtree`.
//!
//! `#[derive(ConfigTree)]` generates the traversal code the populate engine
//! walks: a `cfgtree::Node` impl that exposes the struct as a record (and,
//! with `#[tree(populate)]`, as a populatable node) plus a `cfgtree::Record`
//! impl listing its fields in declaration order.

#![warn(
    bare_trait_objects,
    elided_lifetimes_in_paths,
    rust_2018_idioms,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates
)]
#![warn(clippy::all, clippy::unwrap_used, clippy::uninlined_format_args)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Index, Result, parse_macro_input, parse_quote};

mod container;

use container::{ContainerOptions, parse_container_options, parse_field_options};

/// Derives `cfgtree::Node` and `cfgtree::Record` for a struct.
///
/// # Container attributes
///
/// - `#[tree(populate)]`: the type implements `cfgtree::Populate` and the
///   engine calls it whenever the struct appears as a nested field.
///
/// # Field attributes
///
/// - `#[tree(skip)]`: the field is invisible to traversal. It is neither
///   populated nor recursed into.
///
/// Every other field's type must implement `cfgtree::Node`. Std scalars and
/// collections already do; nested config structs get it from this derive.
///
/// Enums and unions are rejected. Implement `cfgtree::Node` by hand for them
/// (the default methods make an enum a plain leaf).
#[proc_macro_derive(ConfigTree, attributes(tree))]
pub fn derive_config_tree(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// One traversable field: its reported name and how to reach it on `self`.
struct TreeField {
    name: String,
    member: TokenStream,
    ty: syn::Type,
}

fn expand(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput {
        ident,
        mut generics,
        data,
        attrs,
        ..
    } = input;

    let ContainerOptions { populate } = parse_container_options(&attrs)?;

    let data = match data {
        Data::Struct(data) => data,
        Data::Enum(e) => {
            return Err(syn::Error::new(
                e.enum_token.span,
                "`ConfigTree` can only be derived for structs; implement `cfgtree::Node` by hand for enums",
            ));
        }
        Data::Union(u) => {
            return Err(syn::Error::new(
                u.union_token.span,
                "`ConfigTree` cannot be derived for unions",
            ));
        }
    };

    let fields = collect_fields(data.fields)?;

    // Field types only need explicit bounds when they can mention a type parameter.
    if generics.type_params().next().is_some() {
        let where_clause = generics.make_where_clause();
        for field in &fields {
            let ty = &field.ty;
            where_clause
                .predicates
                .push(parse_quote!(#ty: ::cfgtree::Node));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let populate_fn = if populate {
        quote! {
            fn as_populate(&mut self) -> ::core::option::Option<&mut dyn ::cfgtree::Populate> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        quote! {}
    };

    let entries = fields.iter().map(|field| {
        let name = &field.name;
        let member = &field.member;
        quote! { ::cfgtree::Field::new(#name, &mut self.#member) }
    });

    Ok(quote! {
        impl #impl_generics ::cfgtree::Node for #ident #ty_generics #where_clause {
            fn as_record(&mut self) -> ::core::option::Option<&mut dyn ::cfgtree::Record> {
                ::core::option::Option::Some(self)
            }

            #populate_fn
        }

        impl #impl_generics ::cfgtree::Record for #ident #ty_generics #where_clause {
            fn fields_mut(&mut self) -> ::std::vec::Vec<::cfgtree::Field<'_>> {
                ::std::vec![#(#entries),*]
            }
        }
    })
}

fn collect_fields(fields: Fields) -> Result<Vec<TreeField>> {
    let mut out = Vec::new();
    match fields {
        Fields::Named(named) => {
            for field in named.named {
                if parse_field_options(&field.attrs)?.skip {
                    continue;
                }
                let Some(ident) = field.ident else {
                    continue;
                };
                // Raw identifiers report their plain name.
                let name = ident.to_string().trim_start_matches("r#").to_string();
                out.push(TreeField {
                    name,
                    member: quote! { #ident },
                    ty: field.ty,
                });
            }
        }
        Fields::Unnamed(unnamed) => {
            for (i, field) in unnamed.unnamed.into_iter().enumerate() {
                if parse_field_options(&field.attrs)?.skip {
                    continue;
                }
                let index = Index::from(i);
                out.push(TreeField {
                    name: i.to_string(),
                    member: quote! { #index },
                    ty: field.ty,
                });
            }
        }
        Fields::Unit => {}
    }
    Ok(out)
}
