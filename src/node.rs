//! The mutable view of a configuration tree.
//!
//! The populate engine does not know the concrete types it walks. Every value
//! in a tree is a [`Node`], which may answer two questions through dynamic
//! dispatch:
//!
//! - *are you a record?* ([`Node::as_record`]) — if so, the engine recurses
//!   into the record's fields;
//! - *can you populate yourself?* ([`Node::as_populate`]) — if so, the engine
//!   calls [`Populate::populate`] before recursing.
//!
//! Both default to `None`, so a leaf type only needs an empty `impl Node`.
//! Structs normally get both impls from `#[derive(ConfigTree)]`.
//!
//! `Option<T>` and `Box<T>` are reference-like: they answer for the value they
//! point at, and an empty `Option` is a plain leaf.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::ffi::OsString;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::num::{
    NonZeroI32, NonZeroI64, NonZeroU8, NonZeroU16, NonZeroU32, NonZeroU64, NonZeroUsize,
};
use std::path::PathBuf;
use std::time::Duration;

/// Error type returned by [`Populate::populate`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Self-initialization of a config node, typically from environment variables.
///
/// The engine calls this on every nested record that opts in. It is **not**
/// called on the root value passed to
/// [`CompositeConfig::populate_and_validate`](crate::CompositeConfig::populate_and_validate);
/// populate the root yourself first.
///
/// ```ignore
/// #[derive(ConfigTree, Default)]
/// #[tree(populate)]
/// struct DatabaseConfig {
///     host: String,
/// }
///
/// impl Populate for DatabaseConfig {
///     fn populate(&mut self) -> Result<(), BoxError> {
///         self.host = std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".into());
///         Ok(())
///     }
/// }
/// ```
pub trait Populate {
    fn populate(&mut self) -> Result<(), BoxError>;
}

/// A value that can appear in a configuration tree.
pub trait Node {
    /// The value seen as a record with named fields, if it is one.
    fn as_record(&mut self) -> Option<&mut dyn Record> {
        None
    }

    /// The value's population capability, if it declares one.
    fn as_populate(&mut self) -> Option<&mut dyn Populate> {
        None
    }
}

/// A structured node whose fields the engine can visit.
pub trait Record {
    /// Traversable fields in declaration order.
    fn fields_mut(&mut self) -> Vec<Field<'_>>;
}

/// One field of a [`Record`], borrowed mutably for the duration of a visit.
pub struct Field<'a> {
    pub name: &'static str,
    pub node: &'a mut dyn Node,
}

impl<'a> Field<'a> {
    pub fn new(name: &'static str, node: &'a mut dyn Node) -> Self {
        Self { name, node }
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field").field("name", &self.name).finish()
    }
}

macro_rules! leaf_nodes {
    ($($ty:ty),* $(,)?) => {
        $(impl Node for $ty {})*
    };
}

leaf_nodes!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    (), String, OsString, PathBuf, Duration, IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr,
    NonZeroU8, NonZeroU16, NonZeroU32, NonZeroU64, NonZeroUsize, NonZeroI32, NonZeroI64,
);

impl Node for &'static str {}

// Collections are leaves: population composes over nested records only,
// never over collection elements.
impl<T> Node for Vec<T> {}
impl<T> Node for VecDeque<T> {}
impl<T, S> Node for HashSet<T, S> {}
impl<T> Node for BTreeSet<T> {}
impl<K, V, S> Node for HashMap<K, V, S> {}
impl<K, V> Node for BTreeMap<K, V> {}
impl<T, const N: usize> Node for [T; N] {}

impl<T: Node> Node for Option<T> {
    fn as_record(&mut self) -> Option<&mut dyn Record> {
        self.as_mut().and_then(Node::as_record)
    }

    fn as_populate(&mut self) -> Option<&mut dyn Populate> {
        self.as_mut().and_then(Node::as_populate)
    }
}

impl<T: Node + ?Sized> Node for Box<T> {
    fn as_record(&mut self) -> Option<&mut dyn Record> {
        (**self).as_record()
    }

    fn as_populate(&mut self) -> Option<&mut dyn Populate> {
        (**self).as_populate()
    }
}

impl<T: Node + ?Sized> Node for &mut T {
    fn as_record(&mut self) -> Option<&mut dyn Record> {
        (**self).as_record()
    }

    fn as_populate(&mut self) -> Option<&mut dyn Populate> {
        (**self).as_populate()
    }
}
