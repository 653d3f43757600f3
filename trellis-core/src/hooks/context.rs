//! Context Propagation
//!
//! A context scope carries a value from a providing ancestor to any
//! descendant that reads it, without threading it through every component
//! in between.
//!
//! # Implementation
//!
//! The binding is an explicit, immutable [`ContextMap`] handed to each
//! render. A provider never mutates the map it receives. It pushes a new
//! layer on top and hands that to its subtree, so:
//!
//! - a nested provider of the same scope shadows the outer one for its own
//!   subtree only
//! - sibling subtrees hold different maps and never observe each other's
//!   values
//! - a read with no provider above it falls back to the scope's default
//!
//! Layers are reference counted, so pushing one is O(1). Lookup walks from
//! the innermost layer outwards.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::Hooks;
use crate::tree::View;

/// Unique identifier for a context scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Generate a new unique scope ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A context scope with a default value.
///
/// Clones refer to the same scope.
///
/// # Example
///
/// ```rust,ignore
/// let theme = ContextScope::new("light");
///
/// let button = {
///     let theme = theme.clone();
///     move |hooks: &mut Hooks<'_>| -> RenderResult {
///         Ok(View::text(format!("button:{}", hooks.use_context(&theme))))
///     }
/// };
///
/// let app = move |_: &mut Hooks<'_>| -> RenderResult {
///     Ok(theme.provide("dark", View::component(button.clone())))
/// };
/// ```
pub struct ContextScope<T> {
    id: ScopeId,
    default: Rc<T>,
}

impl<T: 'static> ContextScope<T> {
    pub fn new(default: T) -> Self {
        Self {
            id: ScopeId::new(),
            default: Rc::new(default),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// The value seen by readers with no provider above them.
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Bind `value` to this scope, ready to layer onto a [`ContextMap`].
    pub fn bind(&self, value: T) -> ContextBinding {
        ContextBinding {
            scope: self.id,
            value: Rc::new(value),
        }
    }

    /// Provide `value` to every component inside `child`.
    pub fn provide(&self, value: T, child: impl Into<View>) -> View {
        View::provide(self.bind(value), child)
    }

    /// Read the nearest provided value during render.
    pub fn read(&self, hooks: &Hooks<'_>) -> T
    where
        T: Clone,
    {
        hooks.use_context(self)
    }

    /// Resolve against an explicit map.
    pub fn resolve<'m>(&'m self, map: &'m ContextMap) -> &'m T {
        map.lookup::<T>(self.id).unwrap_or(&*self.default)
    }
}

impl<T> Clone for ContextScope<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            default: Rc::clone(&self.default),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ContextScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextScope")
            .field("id", &self.id)
            .field("default", &self.default)
            .finish()
    }
}

/// A value bound to one scope.
#[derive(Clone)]
pub struct ContextBinding {
    scope: ScopeId,
    value: Rc<dyn Any>,
}

impl ContextBinding {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

impl fmt::Debug for ContextBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBinding")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

struct Layer {
    binding: ContextBinding,
    parent: Option<Rc<Layer>>,
}

/// The context bindings visible at one point of the tree.
#[derive(Clone, Default)]
pub struct ContextMap {
    head: Option<Rc<Layer>>,
}

impl ContextMap {
    /// A map with no providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new map with `binding` layered over this one.
    pub fn with(&self, binding: ContextBinding) -> Self {
        Self {
            head: Some(Rc::new(Layer {
                binding,
                parent: self.head.clone(),
            })),
        }
    }

    /// The innermost value bound to `scope`.
    pub fn lookup<T: 'static>(&self, scope: ScopeId) -> Option<&T> {
        let mut layer = self.head.as_deref();
        while let Some(current) = layer {
            if current.binding.scope == scope {
                return current.binding.value.downcast_ref::<T>();
            }
            layer = current.parent.as_deref();
        }
        None
    }

    /// Number of layers, shadowed ones included.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut layer = self.head.as_deref();
        while let Some(current) = layer {
            depth += 1;
            layer = current.parent.as_deref();
        }
        depth
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

impl fmt::Debug for ContextMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextMap")
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_falls_back_to_default() {
        let theme = ContextScope::new("light");
        let map = ContextMap::new();

        assert!(map.is_empty());
        assert_eq!(*theme.resolve(&map), "light");
    }

    #[test]
    fn nested_binding_shadows_outer() {
        let theme = ContextScope::new("light");
        let outer = ContextMap::new().with(theme.bind("dark"));
        let inner = outer.with(theme.bind("solarized"));

        assert_eq!(*theme.resolve(&inner), "solarized");
        // The outer map is untouched by the inner layer.
        assert_eq!(*theme.resolve(&outer), "dark");
        assert_eq!(inner.depth(), 2);
    }

    #[test]
    fn siblings_do_not_see_each_other() {
        let theme = ContextScope::new("light");
        let parent = ContextMap::new().with(theme.bind("dark"));
        let left = parent.with(theme.bind("red"));
        let right = parent.clone();

        assert_eq!(*theme.resolve(&left), "red");
        assert_eq!(*theme.resolve(&right), "dark");
    }

    #[test]
    fn scopes_are_independent() {
        let theme = ContextScope::new("light");
        let locale = ContextScope::new("en");
        let map = ContextMap::new()
            .with(theme.bind("dark"))
            .with(locale.bind("fr"));

        assert_eq!(*theme.resolve(&map), "dark");
        assert_eq!(*locale.resolve(&map), "fr");
    }

    #[test]
    fn clones_share_the_scope() {
        let theme = ContextScope::new(0u8);
        let copy = theme.clone();
        let map = ContextMap::new().with(theme.bind(9));

        assert_eq!(copy.id(), theme.id());
        assert_eq!(*copy.resolve(&map), 9);
    }
}
