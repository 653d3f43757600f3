//! The render-time hook handle.
//!
//! A [`Hooks`] value exists only for the duration of one render of one
//! instance, so a hook cannot be declared outside a render. It walks the
//! instance's slot list with a cursor, creating slots on the first render
//! and validating them on every later one.

use std::any::type_name;
use std::sync::Arc;

use super::cell::{MutRef, RefSlot};
use super::context::{ContextMap, ContextScope};
use super::effect::{Cleanup, EffectDeps, EffectSlot};
use super::slot::{Slot, SlotKind, SlotList};
use super::state::{Setter, StateSlot, UpdateQueue};
use crate::error::HookError;
use crate::tree::InstanceId;

/// Access to the hook primitives during a render.
pub struct Hooks<'r> {
    instance: InstanceId,
    component: &'static str,
    slots: &'r mut SlotList,
    cursor: usize,
    mounting: bool,
    context: &'r ContextMap,
    updates: &'r Arc<UpdateQueue>,
}

impl<'r> Hooks<'r> {
    pub(crate) fn new(
        instance: InstanceId,
        component: &'static str,
        slots: &'r mut SlotList,
        context: &'r ContextMap,
        updates: &'r Arc<UpdateQueue>,
        mounting: bool,
    ) -> Self {
        Self {
            instance,
            component,
            slots,
            cursor: 0,
            mounting,
            context,
            updates,
        }
    }

    /// The instance being rendered.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Whether this is the instance's first render.
    pub fn is_mounting(&self) -> bool {
        self.mounting
    }

    /// Declare a state cell initialised to `initial` on the first render.
    pub fn use_state<T>(&mut self, initial: T) -> Result<(T, Setter<T>), HookError>
    where
        T: Clone + 'static,
    {
        self.use_state_with(move || initial)
    }

    /// Declare a state cell whose initial value is computed on the first render only.
    pub fn use_state_with<T, F>(&mut self, init: F) -> Result<(T, Setter<T>), HookError>
    where
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        let index = self.advance(SlotKind::State, || Slot::State(StateSlot::new(init())))?;

        let value = match &self.slots[index] {
            Slot::State(state) => state.get::<T>().ok_or_else(|| HookError::SlotTypeMismatch {
                component: self.component,
                index,
                stored: state.type_name(),
                requested: type_name::<T>(),
            })?,
            other => return Err(self.kind_mismatch(index, other.kind(), SlotKind::State)),
        };

        let setter = Setter::new(self.instance, index, Arc::clone(self.updates));
        Ok((value, setter))
    }

    /// Declare an effect that re-runs after a commit whenever `deps` changed.
    ///
    /// Pass `()` to run once after the first commit. The callback never runs
    /// during render.
    pub fn use_effect<D, F>(&mut self, deps: D, callback: F) -> Result<(), HookError>
    where
        D: PartialEq + 'static,
        F: FnOnce() -> Cleanup + 'static,
    {
        self.declare_effect(EffectDeps::tracked(deps), Box::new(callback))
    }

    /// Declare an effect that re-runs after every commit of this instance.
    pub fn use_effect_always<F>(&mut self, callback: F) -> Result<(), HookError>
    where
        F: FnOnce() -> Cleanup + 'static,
    {
        self.declare_effect(EffectDeps::Always, Box::new(callback))
    }

    /// Declare a ref cell initialised to `initial` on the first render.
    pub fn use_ref<T: 'static>(&mut self, initial: T) -> Result<MutRef<T>, HookError> {
        self.use_ref_with(move || initial)
    }

    /// Declare a ref cell whose initial value is computed on the first render only.
    pub fn use_ref_with<T, F>(&mut self, init: F) -> Result<MutRef<T>, HookError>
    where
        T: 'static,
        F: FnOnce() -> T,
    {
        let index = self.advance(SlotKind::Ref, || Slot::Ref(RefSlot::new(init())))?;

        match &self.slots[index] {
            Slot::Ref(cell) => cell.handle::<T>().ok_or_else(|| HookError::SlotTypeMismatch {
                component: self.component,
                index,
                stored: cell.type_name(),
                requested: type_name::<T>(),
            }),
            other => Err(self.kind_mismatch(index, other.kind(), SlotKind::Ref)),
        }
    }

    /// Read the value of the nearest enclosing provider of `scope`, or its default.
    ///
    /// Context reads do not occupy a slot.
    pub fn use_context<T>(&self, scope: &ContextScope<T>) -> T
    where
        T: Clone + 'static,
    {
        scope.resolve(self.context).clone()
    }

    /// The context map this render was given.
    pub fn context(&self) -> &ContextMap {
        self.context
    }

    /// Check the declared count once the component function returns.
    pub(crate) fn finish(self) -> Result<(), HookError> {
        if !self.mounting && self.cursor != self.slots.len() {
            return Err(HookError::SlotCountChanged {
                component: self.component,
                expected: self.slots.len(),
                found: self.cursor,
            });
        }
        Ok(())
    }

    fn declare_effect(
        &mut self,
        deps: EffectDeps,
        callback: Box<dyn FnOnce() -> Cleanup>,
    ) -> Result<(), HookError> {
        let index = self.advance(SlotKind::Effect, || Slot::Effect(EffectSlot::default()))?;

        let found = self.slots[index].kind();
        match &mut self.slots[index] {
            Slot::Effect(effect) => {
                effect.declare(deps, callback);
                Ok(())
            }
            _ => Err(self.kind_mismatch(index, found, SlotKind::Effect)),
        }
    }

    /// Move the cursor forward, creating the slot on the first render.
    fn advance(
        &mut self,
        kind: SlotKind,
        create: impl FnOnce() -> Slot,
    ) -> Result<usize, HookError> {
        let index = self.cursor;
        self.cursor += 1;

        if index == self.slots.len() {
            if !self.mounting {
                return Err(HookError::SlotCountChanged {
                    component: self.component,
                    expected: self.slots.len(),
                    found: self.cursor,
                });
            }
            self.slots.push(create());
        }

        let stored = self.slots[index].kind();
        if stored != kind {
            return Err(self.kind_mismatch(index, stored, kind));
        }
        Ok(index)
    }

    fn kind_mismatch(&self, index: usize, expected: SlotKind, found: SlotKind) -> HookError {
        HookError::SlotKindMismatch {
            component: self.component,
            index,
            expected,
            found,
        }
    }
}
