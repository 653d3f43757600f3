//! Error types for the hooks runtime.
//!
//! Every usage error that would corrupt the positional slot mapping of a
//! component instance is reported as soon as it is detected. Nothing here is
//! recovered silently.

use thiserror::Error;

use crate::hooks::SlotKind;
use crate::tree::InstanceId;

/// Result alias used by component render functions.
pub type RenderResult = Result<crate::tree::View, HookError>;

/// Errors raised while rendering, committing, or running effects.
#[derive(Debug, Error)]
pub enum HookError {
    /// A hook was declared with a different kind than on the previous render.
    #[error("hook #{index} of `{component}` was declared as {found} but was {expected} on the previous render")]
    SlotKindMismatch {
        component: &'static str,
        index: usize,
        expected: SlotKind,
        found: SlotKind,
    },

    /// A hook holds a value of a different type than the one requested.
    #[error("hook #{index} of `{component}` holds `{stored}` but was declared with `{requested}`")]
    SlotTypeMismatch {
        component: &'static str,
        index: usize,
        stored: &'static str,
        requested: &'static str,
    },

    /// A re-render declared a different number of hooks than the first render.
    #[error("`{component}` declared {found} hooks but declared {expected} on its first render")]
    SlotCountChanged {
        component: &'static str,
        expected: usize,
        found: usize,
    },

    /// Two sibling components share an explicit key.
    #[error("key `{key}` is used by more than one child of `{parent}`")]
    DuplicateKey { parent: &'static str, key: String },

    /// Updates kept arriving after every flush.
    #[error("state updates were still pending after {passes} render passes")]
    UpdateLoop { passes: usize },

    /// An effect callback or cleanup panicked.
    #[error("effect #{slot} of `{component}` ({instance:?}) panicked: {message}")]
    EffectPanicked {
        instance: InstanceId,
        component: &'static str,
        slot: usize,
        message: String,
    },

    /// The runtime was used after `shutdown`.
    #[error("the runtime has been shut down")]
    ShutDown,
}
