use std::path::PathBuf;
use thiserror::Error;

use crate::node::BoxError;
use crate::validate::ViolationSet;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum CfgTreeError {
    #[error("Failed to load env file {path}: {source}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(cfgtree::env_load),
            help("fix the syntax of the env file or remove it")
        )
    )]
    EnvLoad {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error("Expected a config record at the root, got {found}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(cfgtree::invalid_root),
            help("pass a struct deriving `ConfigTree`, or an Option/Box around one")
        )
    )]
    InvalidRoot { found: &'static str },

    #[error("Failed to populate field '{field}': {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(cfgtree::populate_field)))]
    PopulateField { field: String, source: BoxError },

    #[error("Config validation failed: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(cfgtree::validation)))]
    Validation(ViolationSet),
}

impl CfgTreeError {
    /// The violations behind a [`Validation`](Self::Validation) error.
    pub fn violations(&self) -> Option<&ViolationSet> {
        match self {
            CfgTreeError::Validation(set) => Some(set),
            _ => None,
        }
    }
}
