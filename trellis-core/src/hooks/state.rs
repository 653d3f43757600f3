//! State Cells
//!
//! A state cell holds one value per component instance. The value is read
//! during render and replaced only through the cell's [`Setter`].
//!
//! # How Updates Flow
//!
//! 1. A setter call does not touch the cell. It appends a pending update to
//!    the runtime's [`UpdateQueue`] and wakes the host if the queue was empty.
//!
//! 2. At the start of the next flush, the runtime drains the queue in order,
//!    applies each update to its cell and marks the owning instance dirty.
//!
//! 3. Every dirty instance renders once, whatever the number of updates
//!    queued for it. The last write per cell wins.
//!
//! # Thread Safety
//!
//! The queue is the only shared structure. It sits behind a
//! `parking_lot::Mutex`, which makes setters `Send + Sync` so that timers and
//! worker threads may call them. Cell values themselves are only ever touched
//! on the thread that owns the runtime.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::tree::InstanceId;

/// Callback used to ask the host for a render.
pub(crate) type Waker = Arc<dyn Fn() + Send + Sync>;

/// An update waiting to be applied to a state cell.
pub(crate) struct PendingUpdate {
    pub(crate) instance: InstanceId,
    pub(crate) slot: usize,
    /// Returns `false` when the cell holds a different type.
    pub(crate) apply: Box<dyn FnOnce(&mut dyn Any) -> bool + Send>,
}

/// Updates produced by setters between two flushes.
#[derive(Default)]
pub(crate) struct UpdateQueue {
    pending: Mutex<Vec<PendingUpdate>>,
    waker: Mutex<Option<Waker>>,
}

impl UpdateQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue an update, waking the host on the empty to non-empty transition.
    pub(crate) fn push(&self, update: PendingUpdate) {
        let was_empty = {
            let mut pending = self.pending.lock();
            let was_empty = pending.is_empty();
            pending.push(update);
            was_empty
        };

        if was_empty {
            // Clone out of the lock so the waker may itself queue updates.
            let waker = self.waker.lock().clone();
            if let Some(wake) = waker {
                wake();
            }
        }
    }

    /// Take every queued update in submission order.
    pub(crate) fn drain(&self) -> Vec<PendingUpdate> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub(crate) fn set_waker(&self, waker: Waker) {
        *self.waker.lock() = Some(waker);
    }
}

/// Storage for a `use_state` slot.
pub(crate) struct StateSlot {
    value: Box<dyn Any>,
    type_name: &'static str,
}

impl StateSlot {
    pub(crate) fn new<T: 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    pub(crate) fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.value.downcast_ref::<T>().cloned()
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Apply a queued update. Returns whether it matched the stored type.
    pub(crate) fn apply(&mut self, apply: Box<dyn FnOnce(&mut dyn Any) -> bool + Send>) -> bool {
        apply(&mut *self.value)
    }
}

/// Replaces the value of one state cell and schedules a re-render.
///
/// Setters stay valid across renders and compare equal when they address
/// the same cell. Updates sent after the owning instance is destroyed are
/// discarded.
pub struct Setter<T> {
    instance: InstanceId,
    slot: usize,
    queue: Arc<UpdateQueue>,
    _value: PhantomData<fn(T)>,
}

impl<T> Setter<T> {
    pub(crate) fn new(instance: InstanceId, slot: usize, queue: Arc<UpdateQueue>) -> Self {
        Self {
            instance,
            slot,
            queue,
            _value: PhantomData,
        }
    }

    /// The instance owning the cell.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }
}

impl<T: Send + 'static> Setter<T> {
    /// Replace the value.
    pub fn set(&self, value: T) {
        self.modify(move |current| *current = value);
    }

    /// Compute the next value from the value current when the update applies.
    ///
    /// Several queued `update` calls compose, unlike `set(value + 1)` calls
    /// built from a value captured at render time.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T + Send + 'static,
    {
        self.modify(move |current| *current = f(current));
    }

    /// Mutate the value in place.
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        self.queue.push(PendingUpdate {
            instance: self.instance,
            slot: self.slot,
            apply: Box::new(move |value: &mut dyn Any| match value.downcast_mut::<T>() {
                Some(current) => {
                    f(current);
                    true
                }
                None => false,
            }),
        });
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance,
            slot: self.slot,
            queue: Arc::clone(&self.queue),
            _value: PhantomData,
        }
    }
}

impl<T> PartialEq for Setter<T> {
    fn eq(&self, other: &Self) -> bool {
        self.instance == other.instance && self.slot == other.slot
    }
}

impl<T> Eq for Setter<T> {}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("instance", &self.instance)
            .field("slot", &self.slot)
            .field("type", &type_name::<T>())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
