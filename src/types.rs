//! Core types for spark-fiber.
//!
//! These types define the foundation that everything builds on.
//! They flow through the work loop and define what the renderer understands.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Lane (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Pending-mutation bitset carried by every fiber.
    ///
    /// UPDATE/INSERT/REMOVE classify what commit must do with the fiber's
    /// output node, SVG marks the namespace, and DIRTY marks the root of an
    /// in-flight batch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Lane: u8 {
        const NONE = 0;
        const UPDATE = 1 << 1;
        const INSERT = 1 << 2;
        const REMOVE = 1 << 3;
        const SVG = 1 << 4;
        const DIRTY = 1 << 5;
    }
}

impl Lane {
    /// Bits that describe a pending mutation (cleared once commit consumes them).
    pub const MUTATIONS: Self = Self::UPDATE.union(Self::INSERT).union(Self::REMOVE);
}

// =============================================================================
// Key
// =============================================================================

/// Author-supplied identity token for a child among its siblings.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key(Rc<str>);

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(Rc::from(value))
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self(Rc::from(value.to_string()))
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self(Rc::from(value.to_string()))
    }
}

// =============================================================================
// PropValue
// =============================================================================

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(Rc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

// =============================================================================
// Output node handles
// =============================================================================

/// Opaque handle to an output node owned by a [`Renderer`](crate::Renderer).
///
/// The reconciler only caches it; the renderer decides what it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u64);

/// Shared slot filled with a host fiber's output node at commit.
///
/// Cleared again when the fiber is removed.
#[derive(Debug, Clone, Default)]
pub struct NodeRef(Rc<Cell<Option<NodeHandle>>>);

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// The attached output node, if the owning fiber is mounted.
    pub fn get(&self) -> Option<NodeHandle> {
        self.0.get()
    }

    pub(crate) fn set(&self, node: Option<NodeHandle>) {
        self.0.set(node);
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// =============================================================================
// Reserved tags
// =============================================================================

/// Tag of text leaves produced from bare string children.
pub const TEXT_TAG: &str = "#text";

/// Attribute holding a text leaf's content.
pub const TEXT_ATTR: &str = "nodeValue";

/// Tag of the synthetic root fiber created by `render`.
pub const ROOT_TAG: &str = "#root";

/// Tag that switches a host subtree into the SVG namespace.
pub const SVG_TAG: &str = "svg";
