//! Trellis Core
//!
//! This crate provides a small hooks-style runtime for declarative UI
//! components. It implements:
//!
//! - Local state cells with batched, thread-safe setters
//! - Effects with dependency tracking and cleanup
//! - Mutable ref cells that survive re-renders
//! - Tree-scoped context values
//!
//! Drawing, event dispatch and styling belong to the host. The host drives
//! the runtime by calling [`Runtime::flush`] and receives each committed
//! [`Frame`] through the [`Host`] trait.
//!
//! # Architecture
//!
//! - `hooks`: the per-instance primitives and the [`Hooks`] handle
//! - `tree`: component instances, reconciliation, the effect queue and the
//!   [`Runtime`]
//! - `config`: runtime limits and the effect panic policy
//! - `debug`: serializable snapshots of the mounted tree
//!
//! # Example
//!
//! ```rust
//! use trellis_core::{Hooks, RenderResult, Runtime, View};
//!
//! fn counter(hooks: &mut Hooks<'_>) -> RenderResult {
//!     let (count, set_count) = hooks.use_state(0)?;
//!     if count == 0 {
//!         set_count.set(1);
//!     }
//!     Ok(View::text(format!("You clicked {count} times")))
//! }
//!
//! let mut runtime = Runtime::new(counter);
//! let frame = runtime.run_until_idle()?;
//! assert_eq!(frame.text(), "You clicked 1 times");
//! # Ok::<(), trellis_core::HookError>(())
//! ```

pub mod config;
pub mod debug;
pub mod error;
pub mod hooks;
pub mod tree;

pub use config::{ConfigError, EffectPanicPolicy, RuntimeConfig};
pub use debug::{InstanceSnapshot, TreeSnapshot};
pub use error::{HookError, RenderResult};
pub use hooks::{create_context, Cleanup, ContextScope, Hooks, MutRef, Setter, SlotKind};
pub use tree::{Component, EffectFailure, EffectPhase, Frame, Host, InstanceId, Runtime, View};
