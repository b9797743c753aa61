//! The populate-and-validate engine.
//!
//! [`CompositeConfig::populate_and_validate`] runs three steps, each fatal to
//! the whole call:
//!
//! 1. Load the `.env` cascade (see [`env`](crate::env)).
//! 2. Walk the tree depth-first in field declaration order. Every nested field
//!    that declares [`Populate`](crate::Populate) is populated *before* its own
//!    fields are visited; every nested record is recursed into whether or not
//!    it populates itself. Collections are never descended into. The first
//!    failure aborts the walk.
//! 3. Hand the whole tree to the [`Validator`] once.
//!
//! The root itself is never populated by the engine. Callers populate the root
//! (if it has anything of its own to load) before calling in.

use std::path::Path;

use tracing::{debug, info};

use crate::env::EnvCascade;
use crate::error::CfgTreeError;
use crate::node::{Field, Node, Record};
use crate::validate::{StructValidator, Validator};

/// Populates and validates composite configuration trees.
///
/// Holds only the validation engine handle, so one instance can serve any
/// number of trees.
#[derive(Debug, Clone)]
pub struct CompositeConfig<V = StructValidator> {
    validator: V,
    env_enabled: bool,
}

impl CompositeConfig<StructValidator> {
    /// An engine using [`StructValidator`] with env loading enabled.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> CompositeConfigBuilder<StructValidator> {
        CompositeConfigBuilder::new()
    }
}

impl Default for CompositeConfig<StructValidator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CompositeConfig<V> {
    /// An engine using a custom validation engine, with env loading enabled.
    pub fn with_validator(validator: V) -> Self {
        Self {
            validator,
            env_enabled: true,
        }
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Load env files, populate every nested record of `tree`, then validate.
    ///
    /// `env` picks the environment-specific files (`.env.{env}`,
    /// `.env.{env}.local`) and `base_dir` is where they are looked up.
    pub fn populate_and_validate<T>(
        &self,
        tree: &mut T,
        env: &str,
        base_dir: impl AsRef<Path>,
    ) -> Result<(), CfgTreeError>
    where
        T: Node,
        V: Validator<T>,
    {
        if self.env_enabled {
            EnvCascade::new(env, base_dir).load()?;
        }

        self.populate(tree)?;

        self.validator
            .validate(tree)
            .map_err(CfgTreeError::Validation)?;

        info!(env, "configuration populated and validated");
        Ok(())
    }

    /// Populate every nested record of `tree` without loading env files or
    /// validating.
    pub fn populate<T: Node>(&self, tree: &mut T) -> Result<(), CfgTreeError> {
        let record = tree.as_record().ok_or(CfgTreeError::InvalidRoot {
            found: std::any::type_name::<T>(),
        })?;
        populate_fields(record, "")
    }
}

fn dotted(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn populate_fields(record: &mut dyn Record, prefix: &str) -> Result<(), CfgTreeError> {
    for Field { name, node } in record.fields_mut() {
        let path = dotted(prefix, name);

        if let Some(populatable) = node.as_populate() {
            debug!(field = %path, "populating config node");
            if let Err(source) = populatable.populate() {
                return Err(CfgTreeError::PopulateField {
                    field: path,
                    source,
                });
            }
        }

        if let Some(nested) = node.as_record() {
            populate_fields(nested, &path)?;
        }
    }
    Ok(())
}

/// Builder for [`CompositeConfig`].
#[derive(Debug, Clone)]
pub struct CompositeConfigBuilder<V> {
    validator: V,
    env_enabled: bool,
}

impl CompositeConfigBuilder<StructValidator> {
    fn new() -> Self {
        Self {
            validator: StructValidator,
            env_enabled: true,
        }
    }
}

impl<V> CompositeConfigBuilder<V> {
    /// Replace the validation engine (default: [`StructValidator`]).
    pub fn validator<W>(self, validator: W) -> CompositeConfigBuilder<W> {
        CompositeConfigBuilder {
            validator,
            env_enabled: self.env_enabled,
        }
    }

    /// Skip the `.env` cascade entirely, e.g. in tests or when the process
    /// environment is already prepared.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    pub fn build(self) -> CompositeConfig<V> {
        CompositeConfig {
            validator: self.validator,
            env_enabled: self.env_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{AppConfig, DatabaseConfig};
    use crate::node::BoxError;
    use crate::validate::{NoValidation, Violation, ViolationSet};
    use crate::{ConfigTree, Populate};
    use std::fs;
    use tempfile::TempDir;

    fn engine() -> CompositeConfig<NoValidation> {
        CompositeConfig::builder()
            .validator(NoValidation)
            .no_env()
            .build()
    }

    // -- Probe tree: records the order in which nodes populate ---------------

    #[derive(ConfigTree, Default, Debug)]
    #[tree(populate)]
    struct Probe {
        label: String,
        fail: bool,
        log: Vec<String>,
        calls: u32,
    }

    impl Populate for Probe {
        fn populate(&mut self) -> Result<(), BoxError> {
            self.calls += 1;
            if self.fail {
                return Err(format!("{} exploded", self.label).into());
            }
            self.log.push(self.label.clone());
            Ok(())
        }
    }

    fn probe(label: &str) -> Probe {
        Probe {
            label: label.into(),
            ..Default::default()
        }
    }

    #[derive(ConfigTree, Default, Debug)]
    #[tree(populate)]
    struct Section {
        probe: Probe,
        touched: bool,
    }

    impl Populate for Section {
        fn populate(&mut self) -> Result<(), BoxError> {
            // Pre-order: the section runs before its own fields.
            assert_eq!(self.probe.calls, 0);
            self.touched = true;
            Ok(())
        }
    }

    #[derive(ConfigTree, Default, Debug)]
    #[tree(populate)]
    struct Root {
        first: Probe,
        section: Section,
        plain: Plain,
        last: Probe,
        root_populated: bool,
    }

    impl Populate for Root {
        fn populate(&mut self) -> Result<(), BoxError> {
            self.root_populated = true;
            Ok(())
        }
    }

    /// A record without its own population capability.
    #[derive(ConfigTree, Default, Debug)]
    struct Plain {
        inner: Probe,
    }

    fn root() -> Root {
        Root {
            first: probe("first"),
            section: Section {
                probe: probe("section.probe"),
                touched: false,
            },
            plain: Plain {
                inner: probe("plain.inner"),
            },
            last: probe("last"),
            root_populated: false,
        }
    }

    #[test]
    fn populates_every_nested_record() {
        let mut tree = root();
        engine().populate_and_validate(&mut tree, "dev", ".").unwrap();
        assert_eq!(tree.first.calls, 1);
        assert!(tree.section.touched);
        assert_eq!(tree.section.probe.calls, 1);
        assert_eq!(tree.plain.inner.calls, 1);
        assert_eq!(tree.last.calls, 1);
    }

    #[test]
    fn root_is_never_populated_by_the_engine() {
        // Callers populate the root themselves; only descendants are automatic.
        let mut tree = root();
        engine().populate_and_validate(&mut tree, "dev", ".").unwrap();
        assert!(!tree.root_populated);
    }

    #[test]
    fn failing_field_aborts_with_path_and_cause() {
        let mut tree = root();
        tree.section.probe.fail = true;

        let err = engine()
            .populate_and_validate(&mut tree, "dev", ".")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Failed to populate field"), "got: {msg}");
        assert!(msg.contains("section.probe"), "got: {msg}");
        assert!(msg.contains("section.probe exploded"), "got: {msg}");

        // Fields declared after the failing one are left untouched.
        assert_eq!(tree.first.calls, 1);
        assert_eq!(tree.plain.inner.calls, 0);
        assert_eq!(tree.last.calls, 0);
    }

    #[test]
    fn failure_keeps_original_error_as_source() {
        let mut tree = root();
        tree.first.fail = true;
        let err = engine().populate(&mut tree).unwrap_err();
        match &err {
            CfgTreeError::PopulateField { field, source } => {
                assert_eq!(field, "first");
                assert_eq!(source.to_string(), "first exploded");
            }
            other => panic!("Expected PopulateField, got: {other:?}"),
        }
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn non_record_root_is_rejected() {
        let mut not_a_record = String::from("hello");
        let err = engine()
            .populate_and_validate(&mut not_a_record, "dev", ".")
            .unwrap_err();
        match &err {
            CfgTreeError::InvalidRoot { found } => assert!(found.contains("String")),
            other => panic!("Expected InvalidRoot, got: {other:?}"),
        }
        assert!(err.to_string().contains("String"));
    }

    #[test]
    fn reference_to_record_is_accepted_as_root() {
        let mut boxed: Box<Root> = Box::new(root());
        engine().populate(&mut boxed).unwrap();
        assert_eq!(boxed.last.calls, 1);

        let mut optional = Some(root());
        engine().populate(&mut optional).unwrap();
        assert_eq!(optional.unwrap().first.calls, 1);

        let mut empty: Option<Root> = None;
        assert!(matches!(
            engine().populate(&mut empty),
            Err(CfgTreeError::InvalidRoot { .. })
        ));
    }

    #[derive(ConfigTree, Default, Debug)]
    struct WithReferences {
        maybe: Option<Probe>,
        missing: Option<Probe>,
        boxed: Box<Probe>,
        list: Vec<Probe>,
        #[tree(skip)]
        hidden: Probe,
    }

    #[test]
    fn options_and_boxes_are_traversed_collections_are_not() {
        let mut tree = WithReferences {
            maybe: Some(probe("maybe")),
            missing: None,
            boxed: Box::new(probe("boxed")),
            list: vec![probe("list")],
            hidden: probe("hidden"),
        };
        engine().populate(&mut tree).unwrap();
        assert_eq!(tree.maybe.unwrap().calls, 1);
        assert_eq!(tree.boxed.calls, 1);
        assert_eq!(tree.list[0].calls, 0);
        assert_eq!(tree.hidden.calls, 0);
    }

    #[derive(ConfigTree, Default, Debug)]
    struct Deep {
        outer: Plain,
        nested: DeepInner,
    }

    #[derive(ConfigTree, Default, Debug)]
    struct DeepInner {
        deeper: Plain,
    }

    #[test]
    fn error_path_accumulates_through_levels() {
        let mut tree = Deep::default();
        tree.nested.deeper.inner = probe("deepest");
        tree.nested.deeper.inner.fail = true;

        let err = engine().populate(&mut tree).unwrap_err();
        match err {
            CfgTreeError::PopulateField { field, .. } => {
                assert_eq!(field, "nested.deeper.inner");
            }
            other => panic!("Expected PopulateField, got: {other:?}"),
        }
        // `outer` came first and was populated before the failure.
        assert_eq!(tree.outer.inner.calls, 1);
    }

    #[test]
    fn fixture_tree_populates_and_validates() {
        let mut app = AppConfig {
            app_name: "billing".into(),
            ..Default::default()
        };
        app.database.password = "dbpassword123".into();

        let engine = CompositeConfig::builder().no_env().build();
        engine.populate_and_validate(&mut app, "dev", ".").unwrap();

        assert_eq!(app.database.host, "localhost");
        assert_eq!(app.database.port, 5432);
        assert_eq!(app.database.populate_calls, 1);
        assert_eq!(app.server.port, 8080);
    }

    #[test]
    fn missing_required_value_fails_validation_after_population() {
        // The password has no default, so population succeeds but validation does not.
        let mut app = AppConfig {
            app_name: "billing".into(),
            ..Default::default()
        };

        let err = CompositeConfig::builder()
            .no_env()
            .build()
            .populate_and_validate(&mut app, "dev", ".")
            .unwrap_err();

        assert!(err.to_string().contains("validation failed"), "got: {err}");
        let violations = err.violations().unwrap();
        assert!(violations.contains_field("database.password"));
        // Population still ran to completion.
        assert_eq!(app.database.populate_calls, 1);
    }

    struct RejectAll;

    impl<T> Validator<T> for RejectAll {
        fn validate(&self, _tree: &T) -> Result<(), ViolationSet> {
            Err(ViolationSet::new(vec![Violation::new("", "custom", "nope")]).unwrap())
        }
    }

    #[test]
    fn custom_validator_is_used() {
        let engine = CompositeConfig::builder()
            .validator(RejectAll)
            .no_env()
            .build();
        let err = engine
            .populate_and_validate(&mut root(), "dev", ".")
            .unwrap_err();
        assert!(matches!(err, CfgTreeError::Validation(_)));
    }

    #[test]
    fn with_validator_loads_env_by_default() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env.qa"), "CFGTREE_COMPOSITE_T1=from-qa\n").unwrap();

        let engine = CompositeConfig::with_validator(NoValidation);
        engine
            .populate_and_validate(&mut root(), "qa", dir.path())
            .unwrap();
        assert_eq!(std::env::var("CFGTREE_COMPOSITE_T1").unwrap(), "from-qa");
    }

    #[derive(ConfigTree, Default, Debug)]
    #[tree(populate)]
    struct EnvBacked {
        value: String,
    }

    impl Populate for EnvBacked {
        fn populate(&mut self) -> Result<(), BoxError> {
            self.value = std::env::var("CFGTREE_COMPOSITE_T2")?;
            Ok(())
        }
    }

    #[derive(ConfigTree, Default, Debug)]
    struct EnvRoot {
        backed: EnvBacked,
    }

    #[test]
    fn env_files_load_before_population() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "CFGTREE_COMPOSITE_T2=loaded\n").unwrap();

        let mut tree = EnvRoot::default();
        CompositeConfig::with_validator(NoValidation)
            .populate_and_validate(&mut tree, "dev", dir.path())
            .unwrap();
        assert_eq!(tree.backed.value, "loaded");
    }

    #[test]
    fn env_load_failure_stops_before_population() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "BROKEN='unterminated\n").unwrap();

        let mut tree = root();
        let err = CompositeConfig::with_validator(NoValidation)
            .populate_and_validate(&mut tree, "dev", dir.path())
            .unwrap_err();
        assert!(matches!(err, CfgTreeError::EnvLoad { .. }));
        assert_eq!(tree.first.calls, 0);
    }

    #[test]
    fn engine_is_reusable_across_trees() {
        let engine = engine();
        let mut a = root();
        let mut b = root();
        engine.populate(&mut a).unwrap();
        engine.populate(&mut b).unwrap();
        assert_eq!(a.first.calls, 1);
        assert_eq!(b.first.calls, 1);
    }

    #[test]
    fn default_engine_uses_struct_validator() {
        let dir = TempDir::new().unwrap();
        let engine: CompositeConfig = CompositeConfig::default();
        let mut db = DatabaseConfig::default();

        let err = engine
            .populate_and_validate(&mut db, "dev", dir.path())
            .unwrap_err();
        let violations = err.violations().unwrap();
        assert!(violations.contains_field("host"));
        assert!(violations.contains_field("password"));
        // A record root is accepted, but its own populate is never called.
        assert_eq!(db.populate_calls, 0);
    }
}
