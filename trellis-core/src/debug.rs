//! Tree snapshots for inspection tools.
//!
//! A [`TreeSnapshot`] is a plain-data copy of the mounted tree: instance ids,
//! component names, the kind of every hook slot and render counts. It can be
//! written as JSON for humans or MessagePack for tooling.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::hooks::{Slot, SlotKind};
use crate::tree::{Instance, InstanceId};

/// One mounted instance as seen by a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub id: u64,
    pub parent: Option<u64>,
    pub depth: usize,
    pub component: String,
    pub slots: Vec<SlotKind>,
    pub render_count: usize,
    /// Completed effect callbacks across all effect slots.
    pub effect_runs: usize,
    pub children: Vec<u64>,
}

/// The mounted tree in pre-order, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub instances: Vec<InstanceSnapshot>,
}

impl TreeSnapshot {
    pub(crate) fn capture(
        instances: &IndexMap<InstanceId, Instance>,
        root: Option<InstanceId>,
    ) -> Self {
        let mut snapshot = Self::default();
        if let Some(root) = root {
            snapshot.visit(instances, root);
        }
        snapshot
    }

    fn visit(&mut self, instances: &IndexMap<InstanceId, Instance>, id: InstanceId) {
        let Some(instance) = instances.get(&id) else {
            return;
        };

        self.instances.push(InstanceSnapshot {
            id: id.raw(),
            parent: instance.parent.map(|parent| parent.raw()),
            depth: instance.depth,
            component: instance.name.to_string(),
            slots: instance.slots.iter().map(|slot| slot.kind()).collect(),
            render_count: instance.render_count,
            effect_runs: instance
                .slots
                .iter()
                .map(|slot| match slot {
                    Slot::Effect(effect) => effect.run_count(),
                    _ => 0,
                })
                .sum(),
            children: instance.children.iter().map(|child| child.raw()).collect(),
        });

        for child in &instance.children {
            self.visit(instances, *child);
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The first instance whose component name ends with `suffix`.
    pub fn find(&self, suffix: &str) -> Option<&InstanceSnapshot> {
        self.instances
            .iter()
            .find(|instance| instance.component.ends_with(suffix))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
