//! Element descriptions - What authors hand to the reconciler.
//!
//! An [`Element`] is an immutable description: a kind (host tag or
//! component), an optional key, and shared [`Props`]. Cloning is shallow,
//! so fibers can keep their description around for the next diff.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::component::Component;
use crate::error::DiffError;
use crate::types::{Key, NodeRef, PropValue, TEXT_ATTR, TEXT_TAG};

// =============================================================================
// ElementKind
// =============================================================================

/// What a fiber is, fixed once at creation.
#[derive(Clone)]
pub enum ElementKind {
    /// A node the renderer materializes, identified by tag name.
    Host(Rc<str>),
    /// A render function producing more elements.
    Component(Component),
}

impl ElementKind {
    #[inline]
    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }

    /// Host tag, or `None` for components.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Host(tag) => Some(tag),
            Self::Component(_) => None,
        }
    }

    /// Display name (tag or component name).
    pub fn name(&self) -> &str {
        match self {
            Self::Host(tag) => tag,
            Self::Component(component) => component.name(),
        }
    }
}

impl PartialEq for ElementKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Host(a), Self::Host(b)) => a == b,
            (Self::Component(a), Self::Component(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(tag) => write!(f, "Host({tag:?})"),
            Self::Component(component) => write!(f, "Component({:?})", component.name()),
        }
    }
}

// =============================================================================
// Children
// =============================================================================

/// A children description: omitted, a single child, a sequence, or text.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Children {
    #[default]
    Empty,
    One(Box<Element>),
    Many(Vec<Element>),
    /// Bare scalar content, normalized into a text leaf.
    Text(Rc<str>),
}

impl Children {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Many(kids) => kids.is_empty(),
            Self::One(_) | Self::Text(_) => false,
        }
    }

    /// Normalize into an ordered sequence, validating each element.
    pub fn into_elements(self) -> Result<Vec<Element>, DiffError> {
        let elements = match self {
            Self::Empty => Vec::new(),
            Self::One(element) => vec![*element],
            Self::Many(elements) => elements,
            Self::Text(text) => vec![Element::text(text)],
        };
        for element in &elements {
            element.validate()?;
        }
        Ok(elements)
    }

    fn push(&mut self, element: Element) {
        *self = match std::mem::take(self) {
            Self::Empty => Self::One(Box::new(element)),
            Self::One(first) => Self::Many(vec![*first, element]),
            Self::Many(mut kids) => {
                kids.push(element);
                Self::Many(kids)
            }
            Self::Text(text) => Self::Many(vec![Element::text(text), element]),
        };
    }
}

impl From<Element> for Children {
    fn from(value: Element) -> Self {
        Self::One(Box::new(value))
    }
}

impl From<Vec<Element>> for Children {
    fn from(value: Vec<Element>) -> Self {
        Self::Many(value)
    }
}

impl From<Option<Element>> for Children {
    fn from(value: Option<Element>) -> Self {
        value.map_or(Self::Empty, Self::from)
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<&str> for Children {
    fn from(value: &str) -> Self {
        Self::Text(Rc::from(value))
    }
}

impl From<String> for Children {
    fn from(value: String) -> Self {
        Self::Text(Rc::from(value))
    }
}

impl From<i64> for Children {
    fn from(value: i64) -> Self {
        Self::Text(Rc::from(value.to_string()))
    }
}

impl FromIterator<Element> for Children {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self::Many(iter.into_iter().collect())
    }
}

// =============================================================================
// Props
// =============================================================================

/// Attribute map plus the children description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    attrs: BTreeMap<Rc<str>, PropValue>,
    children: Children,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_children(children: Children) -> Self {
        Self {
            attrs: BTreeMap::new(),
            children,
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attrs.get(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attrs.iter().map(|(name, value)| (&**name, value))
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    /// Whether the attribute maps differ (children are diffed separately).
    pub fn attrs_differ(&self, other: &Props) -> bool {
        self.attrs != other.attrs
    }
}

// =============================================================================
// Element
// =============================================================================

/// Immutable description of one node in the declarative tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub(crate) kind: ElementKind,
    pub(crate) key: Option<Key>,
    pub(crate) props: Rc<Props>,
    pub(crate) node_ref: Option<NodeRef>,
}

impl Element {
    /// Describe a host node with the given tag.
    pub fn host(tag: &str) -> Self {
        Self {
            kind: ElementKind::Host(Rc::from(tag)),
            key: None,
            props: Rc::default(),
            node_ref: None,
        }
    }

    /// Describe a text leaf.
    pub fn text(content: impl Into<Rc<str>>) -> Self {
        Self::host(TEXT_TAG).attr(TEXT_ATTR, PropValue::Str(content.into()))
    }

    /// Describe an instance of `component`.
    pub fn component(component: &Component) -> Self {
        Self {
            kind: ElementKind::Component(component.clone()),
            key: None,
            props: Rc::default(),
            node_ref: None,
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach a ref that receives the output node at commit.
    pub fn node_ref(mut self, node_ref: &NodeRef) -> Self {
        self.node_ref = Some(node_ref.clone());
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.props)
            .attrs
            .insert(Rc::from(name), value.into());
        self
    }

    /// Append one child.
    pub fn child(mut self, child: Element) -> Self {
        Rc::make_mut(&mut self.props).children.push(child);
        self
    }

    /// Replace the children description.
    pub fn children(mut self, children: impl Into<Children>) -> Self {
        Rc::make_mut(&mut self.props).children = children.into();
        self
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn key_ref(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn validate(&self) -> Result<(), DiffError> {
        match self.kind.tag() {
            Some("") => Err(DiffError::EmptyTag),
            Some(TEXT_TAG) if !self.props.children.is_empty() => Err(DiffError::TextWithChildren),
            _ => Ok(()),
        }
    }
}
