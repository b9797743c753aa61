//! The `.env` file cascade loaded before population.
//!
//! For environment `dev` and base directory `app/`, the candidates are, in
//! priority order:
//!
//! | Priority | File |
//! |----------|------|
//! | 1 | `app/.env.dev.local` |
//! | 2 | `app/.env.local` (skipped when the environment is `test`) |
//! | 3 | `app/.env.dev` |
//! | 4 | `app/.env` |
//!
//! Files are loaded in that order and a file never overwrites a variable that
//! is already set, so the first file to define a variable wins and anything
//! already in the process environment beats every file. Missing files are
//! skipped silently; a file that exists but cannot be read or parsed aborts
//! the cascade.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CfgTreeError;

/// Environment name whose cascade leaves out the shared `.env.local`, so
/// test runs are not affected by a developer's local overrides.
pub const TEST_ENV: &str = "test";

/// The ordered set of env files for one environment and base directory.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvCascade {
    env: String,
    base_dir: PathBuf,
}

impl EnvCascade {
    pub fn new(env: &str, base_dir: impl AsRef<Path>) -> Self {
        Self {
            env: env.to_string(),
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Candidate files, highest priority first. Existence is not checked.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let env = &self.env;
        let mut files = vec![self.base_dir.join(format!(".env.{env}.local"))];
        if env != TEST_ENV {
            files.push(self.base_dir.join(".env.local"));
        }
        files.push(self.base_dir.join(format!(".env.{env}")));
        files.push(self.base_dir.join(".env"));
        files
    }

    /// Load every existing candidate into the process environment.
    ///
    /// Returns the files that were actually loaded, in load order.
    pub fn load(&self) -> Result<Vec<PathBuf>, CfgTreeError> {
        let mut loaded = Vec::new();
        for path in self.candidates() {
            if !path.exists() {
                continue;
            }
            dotenvy::from_path(&path).map_err(|source| CfgTreeError::EnvLoad {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), env = %self.env, "loaded env file");
            loaded.push(path);
        }
        Ok(loaded)
    }
}

/// Load the env cascade for `env` from `base_dir` into the process environment.
pub fn load_env_vars(env: &str, base_dir: impl AsRef<Path>) -> Result<(), CfgTreeError> {
    EnvCascade::new(env, base_dir).load().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // Each test uses its own variable names: the process environment is shared
    // between tests running in parallel.

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn candidates_in_priority_order() {
        let cascade = EnvCascade::new("dev", "/srv/app");
        assert_eq!(
            cascade.candidates(),
            vec![
                PathBuf::from("/srv/app/.env.dev.local"),
                PathBuf::from("/srv/app/.env.local"),
                PathBuf::from("/srv/app/.env.dev"),
                PathBuf::from("/srv/app/.env"),
            ]
        );
    }

    #[test]
    fn test_env_skips_shared_local_file() {
        let cascade = EnvCascade::new("test", "/srv/app");
        assert_eq!(
            names(&cascade.candidates()),
            vec![".env.test.local", ".env.test", ".env"]
        );
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let loaded = EnvCascade::new("dev", dir.path()).load().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn only_existing_files_are_loaded() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".env", "CFGTREE_ENV_T1_BASE=base\n");
        write(&dir, ".env.dev", "CFGTREE_ENV_T1_DEV=dev\n");

        let loaded = EnvCascade::new("dev", dir.path()).load().unwrap();
        assert_eq!(names(&loaded), vec![".env.dev", ".env"]);
        assert_eq!(std::env::var("CFGTREE_ENV_T1_BASE").unwrap(), "base");
        assert_eq!(std::env::var("CFGTREE_ENV_T1_DEV").unwrap(), "dev");
    }

    #[test]
    fn first_file_wins() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".env.dev.local", "CFGTREE_ENV_T2=env-local\n");
        write(&dir, ".env.local", "CFGTREE_ENV_T2=local\n");
        write(&dir, ".env.dev", "CFGTREE_ENV_T2=env\n");
        write(&dir, ".env", "CFGTREE_ENV_T2=base\n");

        load_env_vars("dev", dir.path()).unwrap();
        assert_eq!(std::env::var("CFGTREE_ENV_T2").unwrap(), "env-local");
    }

    #[test]
    fn shared_local_beats_env_specific_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".env.local", "CFGTREE_ENV_T3=local\n");
        write(&dir, ".env.staging", "CFGTREE_ENV_T3=staging\n");

        load_env_vars("staging", dir.path()).unwrap();
        assert_eq!(std::env::var("CFGTREE_ENV_T3").unwrap(), "local");
    }

    #[test]
    fn test_env_ignores_shared_local_values() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".env.local", "CFGTREE_ENV_T4=local\n");
        write(&dir, ".env.test", "CFGTREE_ENV_T4=test\n");

        load_env_vars("test", dir.path()).unwrap();
        assert_eq!(std::env::var("CFGTREE_ENV_T4").unwrap(), "test");
    }

    #[test]
    fn existing_process_variables_are_not_overwritten() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".env", "CFGTREE_ENV_T5=from-file\n");
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("CFGTREE_ENV_T5", "from-process") };

        load_env_vars("dev", dir.path()).unwrap();
        assert_eq!(std::env::var("CFGTREE_ENV_T5").unwrap(), "from-process");
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".env.dev", "CFGTREE_ENV_T6='unterminated\n");

        let err = load_env_vars("dev", dir.path()).unwrap_err();
        match &err {
            CfgTreeError::EnvLoad { path, .. } => {
                assert_eq!(path, &dir.path().join(".env.dev"));
            }
            other => panic!("Expected EnvLoad, got: {other:?}"),
        }
        assert!(err.to_string().contains(".env.dev"));
    }
}
