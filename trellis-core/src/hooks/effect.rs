//! Effect Records
//!
//! An effect is a side-effecting callback scoped to a component instance's
//! lifecycle. It is declared during render but never runs there.
//!
//! # How Effects Work
//!
//! 1. On declaration, the new dependency list is compared against the list
//!    committed by the last run. Comparison is `PartialEq` on the whole
//!    value, so tuples, arrays and vectors compare element by element,
//!    order- and length-sensitively. A change of dependency type counts as
//!    a change.
//!
//! 2. If the deps changed, or on the first render, the callback is parked in
//!    the slot as a pending run. Otherwise it is dropped unused.
//!
//! 3. After the commit, the scheduler runs the previous cleanup and then the
//!    pending callback, storing what it returns as the next cleanup.
//!
//! 4. When the instance is destroyed, the stored cleanup runs
//!    unconditionally.
//!
//! # Cleanup
//!
//! Callbacks return a [`Cleanup`]. Timers, subscriptions and other resources
//! acquired by the callback are released there; the scheduler only
//! guarantees that it is invoked.

use std::any::Any;
use std::fmt;

/// Work to undo an effect's previous run.
#[derive(Default)]
pub struct Cleanup(Option<Box<dyn FnOnce()>>);

impl Cleanup {
    /// An effect with nothing to release.
    pub fn none() -> Self {
        Self(None)
    }

    /// Run `f` before the effect re-runs and when its instance is destroyed.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self(Some(Box::new(f)))
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub(crate) fn run(self) {
        if let Some(f) = self.0 {
            f();
        }
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cleanup")
            .field(&if self.0.is_some() { "some" } else { "none" })
            .finish()
    }
}

/// Callback type stored for a pending run.
pub(crate) type EffectCallback = Box<dyn FnOnce() -> Cleanup>;

/// The dependency policy of one declaration.
pub(crate) enum EffectDeps {
    /// No dependency list: run after every commit.
    Always,

    /// Run when the value differs from the committed one.
    Tracked {
        value: Box<dyn Any>,
        eq: fn(&dyn Any, &dyn Any) -> bool,
    },
}

fn deps_eq<D: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<D>(), b.downcast_ref::<D>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

impl EffectDeps {
    pub(crate) fn tracked<D: PartialEq + 'static>(deps: D) -> Self {
        EffectDeps::Tracked {
            value: Box::new(deps),
            eq: deps_eq::<D>,
        }
    }

    /// Whether moving from `self` to `next` requires a re-run.
    fn changed(&self, next: &EffectDeps) -> bool {
        match (self, next) {
            (
                EffectDeps::Tracked { value: prev, eq },
                EffectDeps::Tracked { value: next, .. },
            ) => !eq(&**prev, &**next),
            _ => true,
        }
    }
}

/// A callback waiting for the next commit.
pub(crate) struct PendingRun {
    pub(crate) deps: EffectDeps,
    pub(crate) callback: EffectCallback,
}

/// Storage for a `use_effect` slot.
#[derive(Default)]
pub(crate) struct EffectSlot {
    committed: Option<EffectDeps>,
    pending: Option<PendingRun>,
    cleanup: Option<Cleanup>,
    run_count: usize,
}

impl EffectSlot {
    /// Record a declaration made during render.
    pub(crate) fn declare(&mut self, deps: EffectDeps, callback: EffectCallback) {
        let changed = self
            .committed
            .as_ref()
            .map_or(true, |committed| committed.changed(&deps));

        self.pending = changed.then(|| PendingRun { deps, callback });
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn take_pending(&mut self) -> Option<PendingRun> {
        self.pending.take()
    }

    pub(crate) fn take_cleanup(&mut self) -> Option<Cleanup> {
        self.cleanup.take()
    }

    /// Record a completed run: its deps become the comparison baseline.
    pub(crate) fn commit(&mut self, deps: EffectDeps, cleanup: Option<Cleanup>) {
        self.committed = Some(deps);
        self.cleanup = cleanup;
        self.run_count += 1;
    }

    pub(crate) fn run_count(&self) -> usize {
        self.run_count
    }

    /// Consume the slot on teardown, yielding the cleanup still owed.
    pub(crate) fn into_cleanup(self) -> Option<Cleanup> {
        self.cleanup
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    fn callback(log: &Log, name: &'static str) -> EffectCallback {
        let log = Rc::clone(log);
        Box::new(move || {
            log.borrow_mut().push(format!("run {name}"));
            let log = Rc::clone(&log);
            Cleanup::new(move || log.borrow_mut().push(format!("cleanup {name}")))
        })
    }

    /// Mimics the scheduler: cleanup of the previous run, then the callback.
    fn run_pending(slot: &mut EffectSlot) {
        if let Some(run) = slot.take_pending() {
            if let Some(cleanup) = slot.take_cleanup() {
                cleanup.run();
            }
            let cleanup = (run.callback)();
            slot.commit(run.deps, Some(cleanup));
        }
    }

    #[test]
    fn first_declaration_is_pending() {
        let log = Log::default();
        let mut slot = EffectSlot::default();

        slot.declare(EffectDeps::tracked([1]), callback(&log, "a"));
        assert!(slot.has_pending());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn unchanged_deps_do_not_rerun() {
        let log = Log::default();
        let mut slot = EffectSlot::default();

        slot.declare(EffectDeps::tracked([1]), callback(&log, "a"));
        run_pending(&mut slot);
        slot.declare(EffectDeps::tracked([1]), callback(&log, "b"));

        assert!(!slot.has_pending());
        assert_eq!(slot.run_count(), 1);
    }

    #[test]
    fn changed_deps_clean_up_then_rerun() {
        let log = Log::default();
        let mut slot = EffectSlot::default();

        slot.declare(EffectDeps::tracked([1]), callback(&log, "a"));
        run_pending(&mut slot);
        slot.declare(EffectDeps::tracked([2]), callback(&log, "b"));
        run_pending(&mut slot);

        assert_eq!(*log.borrow(), vec!["run a", "cleanup a", "run b"]);
        assert_eq!(slot.run_count(), 2);
    }

    #[test]
    fn length_and_order_matter() {
        let prev = EffectDeps::tracked(vec![1, 2]);

        assert!(prev.changed(&EffectDeps::tracked(vec![2, 1])));
        assert!(prev.changed(&EffectDeps::tracked(vec![1, 2, 3])));
        assert!(!prev.changed(&EffectDeps::tracked(vec![1, 2])));
    }

    #[test]
    fn type_change_counts_as_change() {
        let prev = EffectDeps::tracked(1u32);
        assert!(prev.changed(&EffectDeps::tracked(1u64)));
    }

    #[test]
    fn always_reruns() {
        let log = Log::default();
        let mut slot = EffectSlot::default();

        slot.declare(EffectDeps::Always, callback(&log, "a"));
        run_pending(&mut slot);
        slot.declare(EffectDeps::Always, callback(&log, "a"));

        assert!(slot.has_pending());
    }

    #[test]
    fn teardown_yields_last_cleanup() {
        let log = Log::default();
        let mut slot = EffectSlot::default();

        slot.declare(EffectDeps::tracked(()), callback(&log, "a"));
        run_pending(&mut slot);

        slot.into_cleanup().unwrap().run();
        assert_eq!(*log.borrow(), vec!["run a", "cleanup a"]);
    }
}
