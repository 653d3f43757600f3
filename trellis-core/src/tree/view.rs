//! Views and Components
//!
//! A component is anything that can render a [`View`] from a [`Hooks`]
//! handle. Plain functions and closures with the right signature are
//! components; types with props implement [`Component`] directly.
//!
//! A view is the render result: text leaves, fragments, child components
//! and context providers. The runtime lowers each view into an [`Output`]
//! that points at child instances by position, and flattens the whole tree
//! into a [`Frame`] at commit time.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use super::instance::ChildIdent;
use crate::error::RenderResult;
use crate::hooks::{ContextBinding, ContextMap, Hooks};

/// A renderable unit of UI.
pub trait Component: 'static {
    /// Compute the view from current state.
    fn render(&self, hooks: &mut Hooks<'_>) -> RenderResult;

    /// Name used in logs, errors and snapshots.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl<F> Component for F
where
    F: Fn(&mut Hooks<'_>) -> RenderResult + 'static,
{
    fn render(&self, hooks: &mut Hooks<'_>) -> RenderResult {
        self(hooks)
    }
}

/// A component placed in a view.
#[derive(Clone)]
pub struct ComponentNode {
    key: Option<String>,
    type_id: TypeId,
    component: Rc<dyn Component>,
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentNode")
            .field("name", &self.component.name())
            .field("key", &self.key)
            .finish()
    }
}

/// The result of rendering a component.
#[derive(Debug, Clone, Default)]
pub enum View {
    #[default]
    Empty,
    Text(String),
    Fragment(Vec<View>),
    Component(ComponentNode),
    Provide {
        binding: ContextBinding,
        child: Box<View>,
    },
}

impl View {
    pub fn text(text: impl Into<String>) -> Self {
        View::Text(text.into())
    }

    /// A child component identified by its type and position.
    pub fn component<C: Component>(component: C) -> Self {
        View::Component(ComponentNode {
            key: None,
            type_id: TypeId::of::<C>(),
            component: Rc::new(component),
        })
    }

    /// A child component identified by its type and `key`.
    pub fn keyed<C: Component>(key: impl Into<String>, component: C) -> Self {
        View::Component(ComponentNode {
            key: Some(key.into()),
            type_id: TypeId::of::<C>(),
            component: Rc::new(component),
        })
    }

    pub fn fragment(children: impl IntoIterator<Item = View>) -> Self {
        View::Fragment(children.into_iter().collect())
    }

    /// Make `binding` visible to every component inside `child`.
    pub fn provide(binding: ContextBinding, child: impl Into<View>) -> Self {
        View::Provide {
            binding,
            child: Box::new(child.into()),
        }
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        View::text(text)
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        View::Text(text)
    }
}

impl From<Vec<View>> for View {
    fn from(children: Vec<View>) -> Self {
        View::Fragment(children)
    }
}

/// A view with its components replaced by indices into the instance's children.
#[derive(Debug, Clone, Default)]
pub(crate) enum Output {
    #[default]
    Empty,
    Text(String),
    List(Vec<Output>),
    Child(usize),
}

/// A child component discovered while lowering a view.
pub(crate) struct ChildEntry {
    pub(crate) ident: ChildIdent,
    pub(crate) component: Rc<dyn Component>,
    pub(crate) context: ContextMap,
}

/// Lowers one render result, collecting child components in view order.
#[derive(Default)]
pub(crate) struct Lowering {
    pub(crate) children: Vec<ChildEntry>,
    positions: HashMap<TypeId, usize>,
}

impl Lowering {
    pub(crate) fn lower(&mut self, view: View, context: &ContextMap) -> Output {
        match view {
            View::Empty => Output::Empty,
            View::Text(text) => Output::Text(text),
            View::Fragment(views) => Output::List(
                views
                    .into_iter()
                    .map(|view| self.lower(view, context))
                    .collect(),
            ),
            View::Component(node) => {
                let ident = match node.key {
                    Some(key) => ChildIdent::Keyed(node.type_id, key),
                    None => {
                        let position = self.positions.entry(node.type_id).or_insert(0);
                        let ident = ChildIdent::Positional(node.type_id, *position);
                        *position += 1;
                        ident
                    }
                };
                self.children.push(ChildEntry {
                    ident,
                    component: node.component,
                    context: context.clone(),
                });
                Output::Child(self.children.len() - 1)
            }
            View::Provide { binding, child } => {
                let inner = context.with(binding);
                self.lower(*child, &inner)
            }
        }
    }
}

/// A committed render: the text leaves of the tree in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Frame {
    lines: Vec<String>,
}

impl Frame {
    pub(crate) fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn contains(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l == line)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
