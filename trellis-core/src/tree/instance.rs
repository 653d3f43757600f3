//! Component Instances
//!
//! This module defines the records that live in the render tree.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::view::{Component, Output};
use crate::hooks::{ContextMap, SlotList};

/// Unique identifier for a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Generate a new unique instance ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a child is recognised across renders of its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ChildIdent {
    /// Explicit key supplied by the view.
    Keyed(TypeId, String),

    /// The n-th unkeyed child of this component type.
    Positional(TypeId, usize),
}

/// A mounted component.
pub(crate) struct Instance {
    pub(crate) id: InstanceId,
    pub(crate) parent: Option<InstanceId>,
    pub(crate) depth: usize,
    pub(crate) ident: ChildIdent,
    pub(crate) name: &'static str,
    pub(crate) component: Rc<dyn Component>,

    /// Hook storage, filled in declaration order.
    pub(crate) slots: SlotList,

    /// Context bindings visible to this instance.
    pub(crate) context: ContextMap,

    /// Child instances, indexed by `Output::Child`.
    pub(crate) children: Vec<InstanceId>,

    /// Lowered result of the last render.
    pub(crate) output: Output,

    pub(crate) dirty: bool,
    pub(crate) render_count: usize,
}

impl Instance {
    pub(crate) fn new(
        parent: Option<InstanceId>,
        depth: usize,
        ident: ChildIdent,
        component: Rc<dyn Component>,
        context: ContextMap,
    ) -> Self {
        Self {
            id: InstanceId::new(),
            parent,
            depth,
            ident,
            name: component.name(),
            component,
            slots: SlotList::new(),
            context,
            children: Vec::new(),
            output: Output::Empty,
            // Start dirty to ensure the first render.
            dirty: true,
            render_count: 0,
        }
    }

    pub(crate) fn is_mounting(&self) -> bool {
        self.render_count == 0
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("depth", &self.depth)
            .field("slots", &self.slots.len())
            .field("children", &self.children)
            .field("dirty", &self.dirty)
            .finish()
    }
}
