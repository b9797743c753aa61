//! Attribute parsing for `#[derive(ConfigTree)]`.
//!
//! Container options live on the struct itself (`#[tree(populate)]`), field
//! options on individual fields (`#[tree(skip)]`).

use syn::{Attribute, Meta, Result};

/// Options parsed from container-level `#[tree(...)]` attributes.
#[derive(Clone, Debug, Default)]
pub(crate) struct ContainerOptions {
    /// The type implements `cfgtree::Populate` and wants the engine to call it.
    pub(crate) populate: bool,
}

/// Options parsed from field-level `#[tree(...)]` attributes.
#[derive(Clone, Debug, Default)]
pub(crate) struct FieldOptions {
    /// Hide the field from traversal entirely.
    pub(crate) skip: bool,
}

/// Parses container-level `#[tree(...)]` attributes.
pub(crate) fn parse_container_options(attrs: &[Attribute]) -> Result<ContainerOptions> {
    let mut options = ContainerOptions::default();
    parse_tree_attrs(attrs, "populate", |flag| match flag {
        "populate" => {
            options.populate = true;
            true
        }
        _ => false,
    })?;
    Ok(options)
}

/// Parses field-level `#[tree(...)]` attributes.
pub(crate) fn parse_field_options(attrs: &[Attribute]) -> Result<FieldOptions> {
    let mut options = FieldOptions::default();
    parse_tree_attrs(attrs, "skip", |flag| match flag {
        "skip" => {
            options.skip = true;
            true
        }
        _ => false,
    })?;
    Ok(options)
}

/// Walks every `#[tree(...)]` attribute and hands each bare flag to `accept`.
///
/// `accept` returns `false` for flags it does not know; `expected` names the
/// valid flags in the resulting error.
fn parse_tree_attrs(
    attrs: &[Attribute],
    expected: &str,
    mut accept: impl FnMut(&str) -> bool,
) -> Result<()> {
    for attr in attrs {
        if !attr.path().is_ident("tree") {
            continue;
        }

        match &attr.meta {
            Meta::List(list) => {
                list.parse_nested_meta(|meta| {
                    let name = meta
                        .path
                        .get_ident()
                        .map_or_else(|| "?".to_string(), ToString::to_string);
                    if accept(&name) {
                        Ok(())
                    } else {
                        Err(meta.error(format!(
                            "unknown tree option `{name}`; expected `{expected}`"
                        )))
                    }
                })?;
            }
            Meta::Path(path) => {
                return Err(syn::Error::new_spanned(
                    path,
                    format!("bare #[tree] has no meaning; use #[tree({expected})]"),
                ));
            }
            Meta::NameValue(nv) => {
                return Err(syn::Error::new_spanned(
                    nv,
                    "name-value syntax is not supported for #[tree]",
                ));
            }
        }
    }

    Ok(())
}
