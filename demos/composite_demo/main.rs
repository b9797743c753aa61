//! # cfgtree demo application
//!
//! A sample CLI that populates a nested configuration tree from env files and
//! environment variables, validates it, and prints a redacted dump. It exists
//! to demonstrate and manually verify cfgtree's features.
//!
//! ## Running
//!
//! ```sh
//! DEMO_DB_PASSWORD=dbpassword123 cargo run --example composite_demo
//! cargo run --example composite_demo -- --env staging --env-dir ./conf
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                | How to exercise it                                                      |
//! |------------------------|-------------------------------------------------------------------------|
//! | Env file cascade       | Put `DEMO_DB_PASSWORD=...` in `.env.dev`, then run without args          |
//! | Environment selection  | `--env staging` reads `.env.staging` and `.env.staging.local`           |
//! | Validation failure     | Run without `DEMO_DB_PASSWORD`; the password length check fails         |
//! | Populate failure       | `DEMO_DB_PORT=abc`; the error names `database`                          |
//! | Optional section       | `--no-cache` leaves `cache` absent; it renders as `nil`                 |
//! | Redacted dump          | `password`, `dsn` and `api_key` are masked in the output                |
//! | Custom vocabulary      | `--sensitive host` masks hosts too                                      |

mod config;

use std::process::ExitCode;

use clap::Parser;

use cfgtree::{CompositeConfig, EnvArgs, Populate};

use config::{CacheConfig, DemoConfig};

/// cfgtree demo: populate, validate and dump a nested config.
#[derive(Parser, Debug)]
#[command(name = "composite-demo")]
struct Cli {
    #[command(flatten)]
    env: EnvArgs,

    /// Leave the optional cache section out.
    #[arg(long)]
    no_cache: bool,

    /// Extra words marking field names as sensitive.
    #[arg(long = "sensitive", value_name = "WORD")]
    sensitive: Vec<String>,
}

const DEFAULT_SENSITIVE: &[&str] = &["pass", "secret", "key", "dsn"];

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = DemoConfig::default();
    if !cli.no_cache {
        config.cache = Some(CacheConfig::default());
    }

    let mut sensitive: Vec<String> = DEFAULT_SENSITIVE.iter().map(|s| s.to_string()).collect();
    sensitive.extend(cli.sensitive.iter().cloned());

    // The engine never populates the root, and the root reads the same env
    // files, so load them first.
    if let Err(err) = cli.env.cascade().load() {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    if let Err(err) = config.populate() {
        eprintln!("error: failed to populate root: {err}");
        return ExitCode::FAILURE;
    }

    let engine = CompositeConfig::new();
    let result = cli.env.populate_and_validate(&engine, &mut config);

    print!("{}", cfgtree::render(&config, &sensitive));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
