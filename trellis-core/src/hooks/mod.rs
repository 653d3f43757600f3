//! Hook Primitives
//!
//! This module implements the per-instance primitives a component uses while
//! rendering: state cells, effects, ref cells and context reads.
//!
//! # Concepts
//!
//! ## State
//!
//! A state cell holds a value owned by one component instance. Its
//! [`Setter`] queues a replacement; the owning instance re-renders once per
//! flush, however many updates were queued.
//!
//! ## Effects
//!
//! An effect is a callback tied to the instance's lifecycle. It runs after
//! the commit when its dependency list changed, and the [`Cleanup`] it
//! returns runs before its next run and when the instance is destroyed.
//!
//! ## Refs
//!
//! A [`MutRef`] is a mutable cell that survives re-renders and never
//! triggers one.
//!
//! ## Context
//!
//! A [`ContextScope`] carries a value from a providing ancestor down to any
//! descendant, through an explicit [`ContextMap`] passed to each render.
//!
//! # Implementation Notes
//!
//! Hooks are positional: the n-th declaration of a render binds to the n-th
//! slot of the instance. The slots live in an explicit, indexed list that is
//! filled on the first render and checked on every later one. Kind, value
//! type and count must match, and a mismatch is returned as a
//! [`HookError`](crate::HookError) instead of being patched over.

mod cell;
mod context;
mod effect;
mod handle;
mod slot;
mod state;

pub use cell::MutRef;
pub use context::{ContextBinding, ContextMap, ContextScope, ScopeId};
pub use effect::Cleanup;
pub use handle::Hooks;
pub use slot::SlotKind;
pub use state::Setter;

pub(crate) use effect::EffectSlot;
pub(crate) use slot::{Slot, SlotList};
pub(crate) use state::UpdateQueue;

/// Create a context scope whose readers see `default` when no provider is above them.
pub fn create_context<T: 'static>(default: T) -> ContextScope<T> {
    ContextScope::new(default)
}
