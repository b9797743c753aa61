//! Redacted debug dumps of configuration trees.
//!
//! [`render`] turns any `Serialize` value into indented text, two spaces per
//! level, masking the values of fields and map keys whose name contains a
//! word from the caller's sensitivity vocabulary:
//!
//! ```text
//! Config Debug Output:
//! database:
//!   host: db.internal
//!   password: d***********3
//! tags:
//!   [0]: production
//! ```
//!
//! Rendering is read-only and never fails: every shape, including absent
//! values and empty collections, has a text form, so it is safe to call while
//! reporting another error.

use std::fmt::Write as _;

use serde::Serialize;

use crate::shape::{Shape, shape_of};

/// First line of every dump.
pub const HEADER: &str = "Config Debug Output:\n";

const INDENT: &str = "  ";

/// Case-insensitive substrings that mark a field or key name as sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensitiveKeys {
    needles: Vec<String>,
}

impl SensitiveKeys {
    pub fn new<S: AsRef<str>>(keys: &[S]) -> Self {
        Self {
            needles: keys.iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    /// Whether `name` contains any vocabulary entry, ignoring case.
    pub fn matches(&self, name: &str) -> bool {
        if self.needles.is_empty() {
            return false;
        }
        let name = name.to_lowercase();
        self.needles.iter().any(|needle| name.contains(needle.as_str()))
    }
}

/// Render `value` as a redacted, indented dump.
///
/// `sensitive_keys` are matched case-insensitively as substrings of field
/// names and map keys. Map entries are sorted by key so the output is
/// reproducible.
pub fn render<T, S>(value: &T, sensitive_keys: &[S]) -> String
where
    T: Serialize + ?Sized,
    S: AsRef<str>,
{
    let keys = SensitiveKeys::new(sensitive_keys);
    let mut out = String::from(HEADER);
    match shape_of(value) {
        Ok(shape) => write_node(&shape, &keys, &mut out, 0),
        Err(err) => {
            let _ = writeln!(out, "<unrenderable: {err}>");
        }
    }
    out
}

fn write_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str(INDENT);
    }
}

fn write_node(shape: &Shape, keys: &SensitiveKeys, out: &mut String, indent: usize) {
    match shape {
        Shape::Nil => {
            write_indent(out, indent);
            out.push_str("nil\n");
        }
        Shape::Scalar(text) => {
            write_indent(out, indent);
            out.push_str(text);
            out.push('\n');
        }
        Shape::Record(fields) => {
            for (name, value) in fields {
                write_indent(out, indent);
                let _ = write!(out, "{name}: ");

                if keys.matches(name) {
                    out.push_str(&masked(value, keys));
                    out.push('\n');
                } else if value.is_compound() {
                    out.push('\n');
                    write_node(value, keys, out, indent + 1);
                } else {
                    out.push_str(&inline(value, keys));
                    out.push('\n');
                }
            }
        }
        Shape::Sequence(items) => {
            if items.is_empty() {
                write_indent(out, indent);
                out.push_str("[]\n");
                return;
            }
            for (i, item) in items.iter().enumerate() {
                write_indent(out, indent);
                let _ = write!(out, "[{i}]: ");
                if item.is_record() {
                    out.push('\n');
                    write_node(item, keys, out, indent + 1);
                } else {
                    out.push_str(&inline(item, keys));
                    out.push('\n');
                }
            }
        }
        Shape::Mapping(entries) => {
            if entries.is_empty() {
                write_indent(out, indent);
                out.push_str("{}\n");
                return;
            }
            for (key, value) in sorted(entries) {
                write_indent(out, indent);
                let _ = write!(out, "{key}: ");
                if keys.matches(key) {
                    out.push_str(&masked(value, keys));
                    out.push('\n');
                } else if value.is_record() {
                    out.push('\n');
                    write_node(value, keys, out, indent + 1);
                } else {
                    out.push_str(&inline(value, keys));
                    out.push('\n');
                }
            }
        }
    }
}

fn sorted(entries: &[(String, Shape)]) -> Vec<&(String, Shape)> {
    let mut entries: Vec<&(String, Shape)> = entries.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

/// Single-line text of a value, masking sensitive names nested inside it.
fn inline(shape: &Shape, keys: &SensitiveKeys) -> String {
    match shape {
        Shape::Nil | Shape::Scalar(_) => shape.inline_text(),
        Shape::Sequence(items) => {
            let parts: Vec<String> = items.iter().map(|item| inline(item, keys)).collect();
            format!("[{}]", parts.join(", "))
        }
        Shape::Mapping(entries) => {
            let parts: Vec<String> = sorted(entries)
                .into_iter()
                .map(|(key, value)| inline_entry(key, value, keys))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        Shape::Record(fields) => {
            let parts: Vec<String> = fields
                .iter()
                .map(|(name, value)| inline_entry(name, value, keys))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

fn inline_entry(name: &str, value: &Shape, keys: &SensitiveKeys) -> String {
    if keys.matches(name) {
        format!("{name}: {}", masked(value, keys))
    } else {
        format!("{name}: {}", inline(value, keys))
    }
}

/// Masked text of a value under a sensitive name. An absent value stays
/// `nil` so unset secrets are told apart from set ones.
fn masked(shape: &Shape, keys: &SensitiveKeys) -> String {
    match shape {
        Shape::Nil => shape.inline_text(),
        _ => mask(&inline(shape, keys)),
    }
}

/// Mask a sensitive value for display, keeping only its outline.
///
/// - Connection strings (containing both `@` and `:`) keep everything from the
///   first `@` on; the credentials before it keep their first and last
///   character. Credentials of two characters or fewer fall through to the
///   generic rule.
/// - Anything else keeps its first and last character. Values of up to two
///   characters become all `*`.
///
/// The masked text has as many characters as the input.
pub fn mask(data: &str) -> String {
    if data.is_empty() {
        return String::new();
    }

    if data.contains('@')
        && data.contains(':')
        && let Some((credentials, rest)) = data.split_once('@')
        && credentials.chars().count() > 2
    {
        return format!("{}@{rest}", keep_outline(credentials));
    }

    let len = data.chars().count();
    if len <= 2 {
        return "*".repeat(len);
    }
    keep_outline(data)
}

/// First char + `*` for each interior char + last char. Needs at least two chars.
fn keep_outline(text: &str) -> String {
    let mut chars = text.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return "*".repeat(text.chars().count());
    };
    let interior = chars.count();
    format!("{first}{}{last}", "*".repeat(interior))
}
