//! Effect Scheduler
//!
//! The scheduler holds the work that must run after a commit and drains it
//! in a fixed order.
//!
//! # Algorithm
//!
//! While the tree renders, two kinds of work are queued:
//!
//! - the last cleanup of every effect of a destroyed instance, parent
//!   before child, in declaration order
//! - every effect whose dependencies changed, as `(instance, slot)`. An
//!   instance's effects are queued in declaration order once its whole
//!   subtree has rendered, so children come before parents.
//!
//! After the host has committed the frame, [`EffectQueue::drain`] runs three
//! phases:
//!
//! 1. teardown cleanups
//! 2. the previous cleanup of every queued effect
//! 3. every queued callback, storing the cleanup it returns
//!
//! So an effect's cleanup always precedes its next run, and no callback
//! observes a sibling's half-released resources.
//!
//! Each callback and cleanup runs under `catch_unwind`. A panic is recorded
//! and the drain carries on, so the slots stay consistent and the failure
//! can be surfaced once the queue is empty.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use indexmap::IndexMap;
use serde::Serialize;

use super::instance::{Instance, InstanceId};
use crate::hooks::{Cleanup, EffectSlot, Slot};

/// Where in the effect lifecycle a panic happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectPhase {
    /// Cleanup of a destroyed instance.
    Teardown,
    /// Cleanup before a re-run.
    Cleanup,
    /// The effect callback itself.
    Callback,
}

/// Description of a panicked effect, handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectFailure {
    pub instance: InstanceId,
    pub component: &'static str,
    pub slot: usize,
    pub phase: EffectPhase,
    pub message: String,
}

/// A failure plus the payload needed to resume the unwind.
pub(crate) struct FailedEffect {
    pub(crate) failure: EffectFailure,
    pub(crate) payload: Box<dyn Any + Send>,
}

struct Teardown {
    instance: InstanceId,
    component: &'static str,
    slot: usize,
    cleanup: Cleanup,
}

/// Post-commit work queued by the last render pass.
#[derive(Default)]
pub(crate) struct EffectQueue {
    teardowns: Vec<Teardown>,
    pending: Vec<(InstanceId, usize)>,
}

impl EffectQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue the cleanups still owed by a destroyed instance.
    pub(crate) fn push_teardown(
        &mut self,
        instance: InstanceId,
        component: &'static str,
        slot: usize,
        effect: EffectSlot,
    ) {
        if let Some(cleanup) = effect.into_cleanup() {
            self.teardowns.push(Teardown {
                instance,
                component,
                slot,
                cleanup,
            });
        }
    }

    /// Queue the pending effects of an instance.
    ///
    /// Entries left over from a failed render are not queued twice.
    pub(crate) fn push_instance(&mut self, instance: &Instance) {
        for (index, slot) in instance.slots.iter().enumerate() {
            if let Slot::Effect(effect) = slot {
                let entry = (instance.id, index);
                if effect.has_pending() && !self.pending.contains(&entry) {
                    self.pending.push(entry);
                }
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.teardowns.is_empty() && self.pending.is_empty()
    }

    /// Run all queued work in order, returning the panics it produced.
    pub(crate) fn drain(
        &mut self,
        instances: &mut IndexMap<InstanceId, Instance>,
    ) -> Vec<FailedEffect> {
        let mut failures = Vec::new();

        for teardown in std::mem::take(&mut self.teardowns) {
            let Teardown {
                instance,
                component,
                slot,
                cleanup,
            } = teardown;
            if let Err(payload) = guarded(|| cleanup.run()) {
                failures.push(FailedEffect::new(
                    instance,
                    component,
                    slot,
                    EffectPhase::Teardown,
                    payload,
                ));
            }
        }

        let pending = std::mem::take(&mut self.pending);

        for &(id, index) in &pending {
            let Some((component, effect)) = effect_slot(instances, id, index) else {
                continue;
            };
            // A later render may have found the deps unchanged after all.
            if !effect.has_pending() {
                continue;
            }
            if let Some(cleanup) = effect.take_cleanup() {
                if let Err(payload) = guarded(|| cleanup.run()) {
                    failures.push(FailedEffect::new(
                        id,
                        component,
                        index,
                        EffectPhase::Cleanup,
                        payload,
                    ));
                }
            }
        }

        for &(id, index) in &pending {
            let Some(run) =
                effect_slot(instances, id, index).and_then(|(_, effect)| effect.take_pending())
            else {
                continue;
            };

            let outcome = guarded(run.callback);

            let Some((component, effect)) = effect_slot(instances, id, index) else {
                continue;
            };
            match outcome {
                Ok(cleanup) => effect.commit(run.deps, Some(cleanup)),
                Err(payload) => {
                    // The deps still count as seen; the effect re-runs when they change.
                    effect.commit(run.deps, None);
                    failures.push(FailedEffect::new(
                        id,
                        component,
                        index,
                        EffectPhase::Callback,
                        payload,
                    ));
                }
            }
        }

        failures
    }
}

impl FailedEffect {
    fn new(
        instance: InstanceId,
        component: &'static str,
        slot: usize,
        phase: EffectPhase,
        payload: Box<dyn Any + Send>,
    ) -> Self {
        Self {
            failure: EffectFailure {
                instance,
                component,
                slot,
                phase,
                message: panic_message(payload.as_ref()),
            },
            payload,
        }
    }
}

fn effect_slot(
    instances: &mut IndexMap<InstanceId, Instance>,
    id: InstanceId,
    index: usize,
) -> Option<(&'static str, &mut EffectSlot)> {
    let instance = instances.get_mut(&id)?;
    let component = instance.name;
    match instance.slots.get_mut(index)? {
        Slot::Effect(effect) => Some((component, effect)),
        _ => None,
    }
}

fn guarded<R>(f: impl FnOnce() -> R) -> Result<R, Box<dyn Any + Send>> {
    panic::catch_unwind(AssertUnwindSafe(f))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::TypeId;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use crate::error::RenderResult;
    use crate::hooks::{ContextMap, Hooks, UpdateQueue};
    use crate::tree::instance::ChildIdent;
    use crate::tree::view::Component;
    use crate::tree::View;

    type Log = Rc<RefCell<Vec<String>>>;

    fn noop(_: &mut Hooks<'_>) -> RenderResult {
        Ok(View::Empty)
    }

    /// An instance whose slots were filled by `declare`.
    fn instance_with(declare: impl FnOnce(&mut Hooks<'_>)) -> Instance {
        let component: Rc<dyn Component> = Rc::new(noop);
        let mut instance = Instance::new(
            None,
            0,
            ChildIdent::Positional(TypeId::of::<()>(), 0),
            component,
            ContextMap::new(),
        );
        let updates = Arc::new(UpdateQueue::new());
        let context = ContextMap::new();
        let mut hooks = Hooks::new(
            instance.id,
            "test",
            &mut instance.slots,
            &context,
            &updates,
            true,
        );
        declare(&mut hooks);
        instance
    }

    fn logging_effect(hooks: &mut Hooks<'_>, log: &Log, name: &'static str) {
        let log = Rc::clone(log);
        hooks
            .use_effect((), move || {
                log.borrow_mut().push(format!("run {name}"));
                let log = Rc::clone(&log);
                Cleanup::new(move || log.borrow_mut().push(format!("cleanup {name}")))
            })
            .unwrap();
    }

    #[test]
    fn queued_effects_run_in_declaration_order() {
        let log = Log::default();
        let instance = instance_with(|hooks| {
            logging_effect(hooks, &log, "a");
            logging_effect(hooks, &log, "b");
        });

        let mut queue = EffectQueue::new();
        queue.push_instance(&instance);
        let mut instances = IndexMap::new();
        instances.insert(instance.id, instance);

        assert!(queue.drain(&mut instances).is_empty());
        assert!(queue.is_empty());
        assert_eq!(*log.borrow(), vec!["run a", "run b"]);
    }

    #[test]
    fn teardown_runs_stored_cleanups() {
        let log = Log::default();
        let instance = instance_with(|hooks| logging_effect(hooks, &log, "a"));
        let id = instance.id;

        let mut queue = EffectQueue::new();
        queue.push_instance(&instance);
        let mut instances = IndexMap::new();
        instances.insert(id, instance);
        queue.drain(&mut instances);

        let removed = instances.shift_remove(&id).unwrap();
        for (index, slot) in removed.slots.into_iter().enumerate() {
            if let Slot::Effect(effect) = slot {
                queue.push_teardown(id, removed.name, index, effect);
            }
        }
        queue.drain(&mut instances);

        assert_eq!(*log.borrow(), vec!["run a", "cleanup a"]);
    }

    #[test]
    fn panicking_callback_is_recorded_and_siblings_still_run() {
        let log = Log::default();
        let instance = instance_with(|hooks| {
            hooks.use_effect((), || -> Cleanup { panic!("boom") }).unwrap();
            logging_effect(hooks, &log, "b");
        });
        let id = instance.id;

        let mut queue = EffectQueue::new();
        queue.push_instance(&instance);
        let mut instances = IndexMap::new();
        instances.insert(id, instance);

        let failures = queue.drain(&mut instances);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].failure.phase, EffectPhase::Callback);
        assert_eq!(failures[0].failure.slot, 0);
        assert_eq!(failures[0].failure.message, "boom");
        assert_eq!(*log.borrow(), vec!["run b"]);
    }

    #[test]
    fn instance_queued_twice_runs_once() {
        let log = Log::default();
        let instance = instance_with(|hooks| logging_effect(hooks, &log, "a"));

        let mut queue = EffectQueue::new();
        queue.push_instance(&instance);
        queue.push_instance(&instance);
        let mut instances = IndexMap::new();
        instances.insert(instance.id, instance);

        assert!(queue.drain(&mut instances).is_empty());
        assert_eq!(*log.borrow(), vec!["run a"]);
    }

    #[test]
    fn entry_without_pending_run_keeps_its_cleanup() {
        let log = Log::default();
        let instance = instance_with(|hooks| logging_effect(hooks, &log, "a"));
        let id = instance.id;

        let mut queue = EffectQueue::new();
        queue.push_instance(&instance);
        let mut instances = IndexMap::new();
        instances.insert(id, instance);
        queue.drain(&mut instances);

        // Left over from an aborted pass; the effect has nothing to re-run.
        queue.pending.push((id, 0));
        assert!(queue.drain(&mut instances).is_empty());
        assert_eq!(*log.borrow(), vec!["run a"]);
    }

    #[test]
    fn skips_effects_of_removed_instances() {
        let log = Log::default();
        let instance = instance_with(|hooks| logging_effect(hooks, &log, "a"));

        let mut queue = EffectQueue::new();
        queue.push_instance(&instance);
        let mut instances = IndexMap::new();

        assert!(queue.drain(&mut instances).is_empty());
        assert!(log.borrow().is_empty());
    }
}
