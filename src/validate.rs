//! Validation of a populated tree.
//!
//! The engine treats validation as a black box: a [`Validator`] looks at the
//! whole tree once population has finished and either accepts it or returns a
//! [`ViolationSet`]. [`StructValidator`] (the default) drives the `validator`
//! crate's `#[validate(...)]` field constraints; [`NoValidation`] accepts
//! everything.
//!
//! Violations are flattened into dotted field paths (`database.port`,
//! `replicas[1].host`) and sorted, so error output is stable across runs.

use std::borrow::Cow;
use std::fmt;

use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// A validation engine the populate engine can hand a finished tree to.
pub trait Validator<T: ?Sized> {
    fn validate(&self, tree: &T) -> Result<(), ViolationSet>;
}

/// Validates trees that derive [`validator::Validate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StructValidator;

impl<T: Validate> Validator<T> for StructValidator {
    fn validate(&self, tree: &T) -> Result<(), ViolationSet> {
        match tree.validate() {
            Ok(()) => Ok(()),
            Err(errors) => {
                let mut violations = Vec::new();
                collect_violations(&errors, "", &mut violations);
                // A failed run always reports at least one constraint; keep a
                // marker entry if the error tree somehow came back empty.
                if violations.is_empty() {
                    violations.push(Violation::new("", "invalid", errors.to_string()));
                }
                Err(ViolationSet::from_vec(violations))
            }
        }
    }
}

/// Accepts every tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidation;

impl<T: ?Sized> Validator<T> for NoValidation {
    fn validate(&self, _tree: &T) -> Result<(), ViolationSet> {
        Ok(())
    }
}

/// One unmet constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path from the root, e.g. `database.port`.
    pub field: String,
    /// The constraint that failed, e.g. `range` or `required`.
    pub rule: String,
    pub message: String,
}

impl Violation {
    pub fn new(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{} ({})", self.message, self.rule)
        } else {
            write!(f, "{}: {} ({})", self.field, self.message, self.rule)
        }
    }
}

/// A non-empty, ordered collection of [`Violation`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationSet(Vec<Violation>);

impl ViolationSet {
    /// Build a set, or `None` when there is nothing to report.
    pub fn new(violations: Vec<Violation>) -> Option<Self> {
        (!violations.is_empty()).then(|| Self::from_vec(violations))
    }

    fn from_vec(mut violations: Vec<Violation>) -> Self {
        debug_assert!(!violations.is_empty());
        violations.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.rule.cmp(&b.rule)));
        Self(violations)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// Whether any violation points at `field` (a dotted path).
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}

impl fmt::Display for ViolationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ViolationSet {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn dotted(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Walk a `validator` error tree, emitting one violation per failed rule.
fn collect_violations(errors: &ValidationErrors, prefix: &str, out: &mut Vec<Violation>) {
    for (field, kind) in errors.errors() {
        let path = dotted(prefix, field.as_ref());
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.push(Violation::new(
                        path.clone(),
                        error.code.to_string(),
                        describe(error),
                    ));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_violations(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_violations(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

/// Human-readable text for one failed rule.
///
/// Uses the rule's explicit message when present. Otherwise the rule code and
/// its parameters are listed, leaving out the offending `value`: it may be a
/// secret and this text ends up in logs.
fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let mut params: Vec<(&Cow<'static, str>, &serde_json::Value)> = error
        .params
        .iter()
        .filter(|(name, _)| name.as_ref() != "value")
        .collect();
    params.sort_by(|a, b| a.0.cmp(b.0));

    if params.is_empty() {
        return format!("failed `{}` constraint", error.code);
    }

    let rendered: Vec<String> = params
        .into_iter()
        .map(|(name, value)| match value {
            serde_json::Value::String(s) => format!("{name} = {s}"),
            other => format!("{name} = {other}"),
        })
        .collect();
    format!("failed `{}` constraint ({})", error.code, rendered.join(", "))
}
