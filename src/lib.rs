//! Populate, validate and dump nested configuration trees.
//!
//! An application describes its configuration as a tree of plain structs.
//! Sections that know how to load themselves (from environment variables, a
//! secrets store, computed defaults) implement [`Populate`]. One call fills in
//! the whole tree and checks it:
//!
//! ```ignore
//! #[derive(ConfigTree, Validate, Serialize, Default)]
//! struct AppConfig {
//!     #[validate(nested)]
//!     database: DatabaseConfig,
//! }
//!
//! #[derive(ConfigTree, Validate, Serialize, Default)]
//! #[tree(populate)]
//! struct DatabaseConfig {
//!     host: String,
//!     #[validate(length(min = 8))]
//!     password: String,
//! }
//!
//! impl Populate for DatabaseConfig {
//!     fn populate(&mut self) -> Result<(), BoxError> {
//!         self.host = std::env::var("DB_HOST")?;
//!         self.password = std::env::var("DB_PASSWORD")?;
//!         Ok(())
//!     }
//! }
//!
//! let mut config = AppConfig::default();
//! CompositeConfig::new().populate_and_validate(&mut config, "dev", ".")?;
//! println!("{}", cfgtree::render(&config, &["pass", "secret"]));
//! ```
//!
//! # Population
//!
//! [`CompositeConfig::populate_and_validate`] loads the `.env` cascade for the
//! chosen environment, then walks the tree depth-first in field declaration
//! order. A nested section that populates itself does so before its own
//! fields are visited, so a parent can set up what its children read. The
//! first failure stops the walk and names the dotted path of the field
//! (`database.replica`).
//!
//! The root is never populated by the engine. If the root has values of its
//! own to load, call its `populate` before handing it in.
//!
//! What counts as a nested section is decided by the [`Node`] trait:
//!
//! - **Records** (`#[derive(ConfigTree)]` structs) are recursed into.
//!   `#[tree(populate)]` on the struct opts into [`Populate`];
//!   `#[tree(skip)]` on a field hides it from the walk.
//! - **`Option<T>`, `Box<T>` and `&mut T`** stand in for `T`. An absent
//!   `Option` is simply skipped.
//! - **Scalars and collections** are leaves. Records inside a `Vec` or a map
//!   are not populated.
//!
//! # Env file cascade
//!
//! See [`env`] for the file list and priority rules. Files never overwrite
//! variables that are already set. Disable loading with
//! [`.no_env()`](CompositeConfigBuilder::no_env) for trees that do not read
//! the environment.
//!
//! # Validation
//!
//! After population the whole tree goes to a [`Validator`] once. The default,
//! [`StructValidator`], runs the `validator` crate's `#[validate(...)]`
//! constraints and reports every violation with its dotted path, sorted:
//!
//! ```text
//! Config validation failed: database.password: failed `length` constraint (min = 8) (length)
//! ```
//!
//! Constraint values are echoed in messages; the offending field value never is.
//!
//! # Debug output
//!
//! [`render`] dumps any `Serialize` value as indented text, masking values
//! whose field or key name contains a word from the vocabulary:
//!
//! ```text
//! Config Debug Output:
//! database:
//!   host: db.internal
//!   password: d***********3
//! ```
//!
//! Rendering never fails, so it is safe to call from error paths.
//!
//! # Error handling
//!
//! All fallible operations return [`CfgTreeError`]. With the `rich-errors`
//! feature the error also implements `miette::Diagnostic`.

extern crate self as cfgtree;

pub mod debug;
pub mod env;
pub mod error;
pub mod shape;

#[cfg(feature = "clap")]
mod cli;
mod composite;
mod node;
mod validate;

#[cfg(test)]
mod fixtures;

pub use cfgtree_derive::ConfigTree;
#[cfg(feature = "clap")]
pub use cli::EnvArgs;
pub use composite::{CompositeConfig, CompositeConfigBuilder};
pub use debug::{mask, render};
pub use env::{EnvCascade, load_env_vars};
pub use error::CfgTreeError;
pub use node::{BoxError, Field, Node, Populate, Record};
pub use shape::Shape;
pub use validate::{NoValidation, StructValidator, Validator, Violation, ViolationSet};
