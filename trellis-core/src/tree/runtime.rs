//! Render Runtime
//!
//! The runtime owns the component tree and drives the render/commit cycle.
//! It is the piece the host event loop talks to.
//!
//! # How It Works
//!
//! Each call to [`Runtime::flush`] performs one cycle:
//!
//! 1. Drain the update queue. Every queued setter call is applied to its
//!    cell in submission order, and the owning instance is marked dirty.
//!
//! 2. Render. The tree is walked from the root. A dirty instance re-renders,
//!    and so does every descendant of a re-rendered instance, since their
//!    props may have changed. Clean subtrees are skipped. Each render is
//!    lowered and its children reconciled by type and key or position:
//!    matches are reused, new children are mounted and missing ones
//!    destroyed.
//!
//! 3. Commit. The tree is flattened into a [`Frame`] and handed to the
//!    [`Host`].
//!
//! 4. Drain the effect queue (see [`scheduler`](super::scheduler)).
//!
//! # Failed Renders
//!
//! A render that returns an error or panics leaves its instance dirty, with
//! its slots intact, so the next flush retries it. Effects queued by
//! instances that did render before the failure stay queued and run after
//! the next successful commit.
//!
//! # Threading
//!
//! The runtime is single-threaded and `!Send`. Only setters cross threads,
//! and they only append to the update queue. [`Runtime::set_waker`] lets the
//! host learn that a flush is due.

use std::any::TypeId;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, error, trace, warn};

use super::instance::{ChildIdent, Instance, InstanceId};
use super::scheduler::{EffectFailure, EffectQueue, FailedEffect};
use super::view::{ChildEntry, Component, Frame, Lowering, Output};
use crate::config::{EffectPanicPolicy, RuntimeConfig};
use crate::debug::TreeSnapshot;
use crate::error::HookError;
use crate::hooks::{ContextMap, Hooks, Slot, UpdateQueue};

/// The visual side of the host UI runtime.
pub trait Host {
    /// Apply a rendered frame to the visible UI.
    fn commit(&mut self, frame: &Frame);

    /// Called for every effect callback or cleanup that panicked.
    fn effect_failed(&mut self, _failure: &EffectFailure) {}
}

/// Owns a component tree and runs its render/commit cycle.
pub struct Runtime {
    config: RuntimeConfig,
    root: Rc<dyn Component>,
    root_type: TypeId,
    root_id: Option<InstanceId>,
    instances: IndexMap<InstanceId, Instance>,
    updates: Arc<UpdateQueue>,
    effects: EffectQueue,
    host: Option<Box<dyn Host>>,
    frame: Frame,
    shut_down: bool,
}

impl Runtime {
    /// Create a runtime for `root`. Nothing renders until the first flush.
    pub fn new<C: Component>(root: C) -> Self {
        Self::with_config(root, RuntimeConfig::default())
    }

    pub fn with_config<C: Component>(root: C, config: RuntimeConfig) -> Self {
        Self {
            config,
            root: Rc::new(root),
            root_type: TypeId::of::<C>(),
            root_id: None,
            instances: IndexMap::new(),
            updates: Arc::new(UpdateQueue::new()),
            effects: EffectQueue::new(),
            host: None,
            frame: Frame::default(),
            shut_down: false,
        }
    }

    /// Send committed frames and effect failures to `host`.
    pub fn set_host(&mut self, host: impl Host + 'static) {
        self.host = Some(Box::new(host));
    }

    /// Call `wake` whenever a setter queues work into an empty queue.
    ///
    /// It may run on any thread that holds a setter.
    pub fn set_waker<F>(&self, wake: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.updates.set_waker(Arc::new(wake));
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The last committed frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn root_id(&self) -> Option<InstanceId> {
        self.root_id
    }

    /// Number of mounted instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Number of times an instance has rendered, if it is mounted.
    pub fn render_count(&self, id: InstanceId) -> Option<usize> {
        self.instances.get(&id).map(|instance| instance.render_count)
    }

    /// Whether a flush would render something.
    pub fn has_pending_work(&self) -> bool {
        !self.shut_down
            && (self.root_id.is_none()
                || !self.updates.is_empty()
                || self.instances.values().any(|instance| instance.dirty))
    }

    /// Serializable description of the current tree.
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot::capture(&self.instances, self.root_id)
    }

    /// Run one update/render/commit/effect cycle.
    ///
    /// Returns the committed frame, or `None` when nothing was dirty.
    pub fn flush(&mut self) -> Result<Option<Frame>, HookError> {
        if self.shut_down {
            return Err(HookError::ShutDown);
        }

        let _span = tracing::debug_span!("flush").entered();

        self.apply_updates();

        let root = match self.root_id {
            Some(root) => root,
            None => self.mount_root(),
        };

        if !self.instances.values().any(|instance| instance.dirty) {
            return Ok(None);
        }

        // On failure the queued runs stay put. Instances that did render keep
        // their output, and their effects run after the next commit.
        self.render_subtree(root, false)?;

        let frame = self.build_frame(root);
        if let Some(host) = self.host.as_mut() {
            host.commit(&frame);
        }
        self.frame = frame.clone();

        self.drain_effects()?;
        Ok(Some(frame))
    }

    /// Flush until no updates are pending.
    ///
    /// Fails with [`HookError::UpdateLoop`] when effects keep queuing updates
    /// for `max_render_passes` consecutive flushes.
    pub fn run_until_idle(&mut self) -> Result<Frame, HookError> {
        for _ in 0..self.config.max_render_passes {
            self.flush()?;
            if !self.has_pending_work() {
                return Ok(self.frame.clone());
            }
        }

        let passes = self.config.max_render_passes;
        warn!(passes, "updates still pending after render pass limit");
        Err(HookError::UpdateLoop { passes })
    }

    /// Destroy the whole tree, running every outstanding cleanup.
    ///
    /// Later flushes fail with [`HookError::ShutDown`].
    pub fn shutdown(&mut self) -> Result<(), HookError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        if let Some(root) = self.root_id.take() {
            self.unmount(root);
        }
        let dropped = self.updates.drain().len();
        if dropped > 0 {
            debug!(dropped, "discarding updates queued before shutdown");
        }

        self.drain_effects()
    }

    fn apply_updates(&mut self) {
        for update in self.updates.drain() {
            let Some(instance) = self.instances.get_mut(&update.instance) else {
                debug!(instance = %update.instance, "dropping update for unmounted instance");
                continue;
            };

            match instance.slots.get_mut(update.slot) {
                Some(Slot::State(state)) => {
                    if state.apply(update.apply) {
                        instance.dirty = true;
                    } else {
                        warn!(
                            instance = %update.instance,
                            slot = update.slot,
                            stored = state.type_name(),
                            "dropping update with mismatched type"
                        );
                    }
                }
                _ => warn!(
                    instance = %update.instance,
                    slot = update.slot,
                    "dropping update for a slot that is not a state cell"
                ),
            }
        }
    }

    fn mount_root(&mut self) -> InstanceId {
        let entry = ChildEntry {
            ident: ChildIdent::Positional(self.root_type, 0),
            component: Rc::clone(&self.root),
            context: ContextMap::new(),
        };
        let root = self.mount(None, 0, entry);
        self.root_id = Some(root);
        root
    }

    fn mount(&mut self, parent: Option<InstanceId>, depth: usize, entry: ChildEntry) -> InstanceId {
        let instance = Instance::new(parent, depth, entry.ident, entry.component, entry.context);
        let id = instance.id;
        debug!(instance = %id, component = instance.name, depth, "mount");
        self.instances.insert(id, instance);
        id
    }

    /// Remove `id` and its subtree, queueing their cleanups parent first.
    fn unmount(&mut self, id: InstanceId) {
        let Some(instance) = self.instances.shift_remove(&id) else {
            return;
        };
        debug!(instance = %id, component = instance.name, "unmount");

        let Instance {
            name,
            slots,
            children,
            ..
        } = instance;

        for (index, slot) in slots.into_iter().enumerate() {
            if let Slot::Effect(effect) = slot {
                self.effects.push_teardown(id, name, index, effect);
            }
        }
        for child in children {
            self.unmount(child);
        }
    }

    fn render_subtree(&mut self, id: InstanceId, force: bool) -> Result<(), HookError> {
        let Some(instance) = self.instances.get(&id) else {
            return Ok(());
        };
        let rendered = force || instance.dirty;

        if rendered {
            self.render_instance(id)?;
        }

        let children = self
            .instances
            .get(&id)
            .map(|instance| instance.children.clone())
            .unwrap_or_default();
        for child in children {
            self.render_subtree(child, rendered)?;
        }

        // Clean instances are queued too: a run declared during a failed pass
        // is still pending there.
        if let Some(instance) = self.instances.get(&id) {
            self.effects.push_instance(instance);
        }
        Ok(())
    }

    fn render_instance(&mut self, id: InstanceId) -> Result<(), HookError> {
        let Some(instance) = self.instances.get_mut(&id) else {
            return Ok(());
        };

        let component = Rc::clone(&instance.component);
        let context = instance.context.clone();
        let name = instance.name;
        let mounting = instance.is_mounting();
        let mut slots = std::mem::take(&mut instance.slots);

        trace!(instance = %id, component = name, mounting, "render");

        let updates = &self.updates;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut hooks = Hooks::new(id, name, &mut slots, &context, updates, mounting);
            let view = component.render(&mut hooks);
            let finished = hooks.finish();
            view.and_then(|view| finished.map(|()| view))
        }));

        // The slots go back before anything else, so a failed render keeps
        // every stored value and cleanup.
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.slots = slots;
        }
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                self.mark_dirty(id);
                panic::resume_unwind(payload);
            }
        };

        let reconciled = result.and_then(|view| {
            let mut lowering = Lowering::default();
            let output = lowering.lower(view, &context);
            self.reconcile(id, lowering.children).map(|()| output)
        });
        let output = match reconciled {
            Ok(output) => output,
            Err(err) => {
                self.mark_dirty(id);
                return Err(err);
            }
        };

        if let Some(instance) = self.instances.get_mut(&id) {
            instance.output = output;
            instance.dirty = false;
            instance.render_count += 1;
        }
        Ok(())
    }

    /// Retry `id` on the next flush.
    fn mark_dirty(&mut self, id: InstanceId) {
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.dirty = true;
        }
    }

    /// Match freshly rendered children against the previous ones.
    fn reconcile(&mut self, parent: InstanceId, entries: Vec<ChildEntry>) -> Result<(), HookError> {
        let Some(instance) = self.instances.get(&parent) else {
            return Ok(());
        };
        let parent_name = instance.name;
        let depth = instance.depth + 1;

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(&entry.ident) {
                if let ChildIdent::Keyed(_, key) = &entry.ident {
                    return Err(HookError::DuplicateKey {
                        parent: parent_name,
                        key: key.clone(),
                    });
                }
            }
        }

        let mut previous: IndexMap<ChildIdent, InstanceId> = instance
            .children
            .iter()
            .filter_map(|child| {
                self.instances
                    .get(child)
                    .map(|child_instance| (child_instance.ident.clone(), *child))
            })
            .collect();

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            match previous.shift_remove(&entry.ident) {
                Some(child) => {
                    if let Some(child_instance) = self.instances.get_mut(&child) {
                        child_instance.name = entry.component.name();
                        child_instance.component = entry.component;
                        child_instance.context = entry.context;
                    }
                    children.push(child);
                }
                None => children.push(self.mount(Some(parent), depth, entry)),
            }
        }

        for (_, stale) in previous {
            self.unmount(stale);
        }

        if let Some(instance) = self.instances.get_mut(&parent) {
            instance.children = children;
        }
        Ok(())
    }

    fn build_frame(&self, root: InstanceId) -> Frame {
        let mut lines = Vec::new();
        self.collect_instance(root, &mut lines);
        Frame::new(lines)
    }

    fn collect_instance(&self, id: InstanceId, lines: &mut Vec<String>) {
        if let Some(instance) = self.instances.get(&id) {
            self.collect_output(instance, &instance.output, lines);
        }
    }

    fn collect_output(&self, instance: &Instance, output: &Output, lines: &mut Vec<String>) {
        match output {
            Output::Empty => {}
            Output::Text(text) => lines.push(text.clone()),
            Output::List(items) => {
                for item in items {
                    self.collect_output(instance, item, lines);
                }
            }
            Output::Child(index) => {
                if let Some(child) = instance.children.get(*index) {
                    self.collect_instance(*child, lines);
                }
            }
        }
    }

    fn drain_effects(&mut self) -> Result<(), HookError> {
        let failures = self.effects.drain(&mut self.instances);

        let mut first: Option<FailedEffect> = None;
        for failed in failures {
            let failure = &failed.failure;
            error!(
                instance = %failure.instance,
                component = failure.component,
                slot = failure.slot,
                phase = ?failure.phase,
                message = %failure.message,
                "effect panicked"
            );
            if let Some(host) = self.host.as_mut() {
                host.effect_failed(failure);
            }
            if first.is_none() {
                first = Some(failed);
            }
        }

        let Some(failed) = first else {
            return Ok(());
        };
        match self.config.effect_panics {
            EffectPanicPolicy::Report => Err(HookError::EffectPanicked {
                instance: failed.failure.instance,
                component: failed.failure.component,
                slot: failed.failure.slot,
                message: failed.failure.message,
            }),
            EffectPanicPolicy::Resume => std::panic::resume_unwind(failed.payload),
        }
    }
}

impl Drop for Runtime {
    /// Runs every outstanding cleanup, except while the thread is already
    /// unwinding. Call [`Runtime::shutdown`] first when cleanups must run
    /// after a caught panic.
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        self.config.effect_panics = EffectPanicPolicy::Report;
        if let Err(err) = self.shutdown() {
            warn!(%err, "cleanup failed while dropping runtime");
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("root", &self.root_id)
            .field("instances", &self.instances.len())
            .field("pending_effects", &!self.effects.is_empty())
            .field("shut_down", &self.shut_down)
            .finish()
    }
}
