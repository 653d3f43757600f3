//! Hook slots.
//!
//! Every component instance owns a [`SlotList`]: an indexed list of typed
//! slots populated in declaration order on the first render. Later renders
//! walk the same list with a cursor and must declare the same kinds, in the
//! same order, with the same value types.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::cell::RefSlot;
use super::effect::EffectSlot;
use super::state::StateSlot;

/// Most components declare a handful of hooks, so keep them inline.
pub(crate) type SlotList = SmallVec<[Slot; 4]>;

/// The kind of primitive stored in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    State,
    Effect,
    Ref,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotKind::State => "use_state",
            SlotKind::Effect => "use_effect",
            SlotKind::Ref => "use_ref",
        };
        f.write_str(name)
    }
}

/// A single declared primitive.
pub(crate) enum Slot {
    State(StateSlot),
    Effect(EffectSlot),
    Ref(RefSlot),
}

impl Slot {
    pub(crate) fn kind(&self) -> SlotKind {
        match self {
            Slot::State(_) => SlotKind::State,
            Slot::Effect(_) => SlotKind::Effect,
            Slot::Ref(_) => SlotKind::Ref,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_reports_its_kind() {
        let state = Slot::State(StateSlot::new(1u8));
        let effect = Slot::Effect(EffectSlot::default());
        let cell = Slot::Ref(RefSlot::new(String::new()));

        assert_eq!(state.kind(), SlotKind::State);
        assert_eq!(effect.kind(), SlotKind::Effect);
        assert_eq!(cell.kind(), SlotKind::Ref);
    }

    #[test]
    fn kind_displays_as_hook_name() {
        assert_eq!(SlotKind::Effect.to_string(), "use_effect");
    }
}
