//! Components - Render functions with identity.
//!
//! Two component elements match during diffing only if they point at the
//! same render function, so a [`Component`] is created once and cloned
//! (cheaply) wherever it is used.

use std::fmt;
use std::rc::Rc;

use super::element::{Children, Props};
use crate::engine::RenderCx;
use crate::error::RenderError;

/// Result of invoking a component's render function.
pub type RenderResult = Result<Children, RenderError>;

type RenderFn = dyn Fn(&Props, &mut RenderCx<'_>) -> RenderResult;

/// A named render function.
///
/// # Example
///
/// ```ignore
/// use spark_fiber::{Component, Element};
///
/// let greeting = Component::new("Greeting", |props, _cx| {
///     let name = props.get("name").map(|v| v.to_string()).unwrap_or_default();
///     format!("hello {name}")
/// });
///
/// let tree = Element::component(&greeting).attr("name", "fiber");
/// ```
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    render: Rc<RenderFn>,
}

impl Component {
    /// Create an infallible component.
    pub fn new<F, R>(name: &str, render: F) -> Self
    where
        F: Fn(&Props, &mut RenderCx<'_>) -> R + 'static,
        R: Into<Children>,
    {
        Self::fallible(name, move |props: &Props, cx: &mut RenderCx<'_>| {
            Ok(render(props, cx).into())
        })
    }

    /// Create a component whose render can fail, aborting the batch.
    pub fn fallible<F>(name: &str, render: F) -> Self
    where
        F: Fn(&Props, &mut RenderCx<'_>) -> RenderResult + 'static,
    {
        Self {
            name: Rc::from(name),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn render(&self, props: &Props, cx: &mut RenderCx<'_>) -> RenderResult {
        (self.render)(props, cx).map_err(|err| err.in_component(&self.name))
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").field("name", &self.name).finish()
    }
}
