//! Primitives - Element descriptions and components.
//!
//! This module provides what authors build trees from:
//! - [`Element`] - Host node, text leaf or component instance
//! - [`Component`] - Named render function with identity
//! - [`Children`] / [`Props`] - Attribute maps and children descriptions
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::{Component, Element};
//!
//! let item = Component::new("Item", |props, _cx| {
//!     Element::host("li").children(props.get("label").map(|v| v.to_string()).unwrap_or_default())
//! });
//!
//! let list = Element::host("ul")
//!     .child(Element::component(&item).key("a").attr("label", "first"))
//!     .child(Element::component(&item).key("b").attr("label", "second"));
//! ```

mod component;
mod element;

pub use component::{Component, RenderResult};
pub use element::{Children, Element, ElementKind, Props};
