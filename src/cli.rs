//! Clap adapter for cfgtree.
//!
//! Compiled only with the `clap` Cargo feature (on by default). [`EnvArgs`]
//! adds `--env` and `--env-dir` to an application's own clap derive and hands
//! them to the engine:
//!
//! ```ignore
//! #[derive(Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     env: EnvArgs,
//! }
//!
//! let cli = Cli::parse();
//! cli.env.populate_and_validate(&CompositeConfig::new(), &mut config)?;
//! ```
//!
//! Everything here is a thin wrapper: applications using another argument
//! parser call [`CompositeConfig::populate_and_validate`] directly.

use std::path::PathBuf;

use clap::Args;

use crate::composite::CompositeConfig;
use crate::env::EnvCascade;
use crate::error::CfgTreeError;
use crate::node::Node;
use crate::validate::Validator;

/// Clap-derived args selecting which env files to load.
#[derive(Debug, Clone, PartialEq, Args)]
pub struct EnvArgs {
    /// Environment name; picks `.env.<NAME>` and `.env.<NAME>.local`.
    #[arg(long = "env", value_name = "NAME", default_value = "dev")]
    pub env: String,

    /// Directory the env files are looked up in.
    #[arg(long = "env-dir", value_name = "DIR", default_value = ".")]
    pub env_dir: PathBuf,
}

impl EnvArgs {
    /// The env file cascade these args select.
    pub fn cascade(&self) -> EnvCascade {
        EnvCascade::new(&self.env, &self.env_dir)
    }

    /// Run `engine` over `tree` with the selected environment and directory.
    pub fn populate_and_validate<T, V>(
        &self,
        engine: &CompositeConfig<V>,
        tree: &mut T,
    ) -> Result<(), CfgTreeError>
    where
        T: Node,
        V: Validator<T>,
    {
        engine.populate_and_validate(tree, &self.env, &self.env_dir)
    }
}
