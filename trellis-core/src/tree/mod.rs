//! Component Tree
//!
//! This module implements the tree of mounted component instances and the
//! runtime that renders, commits and runs effects for it.
//!
//! # Overview
//!
//! Each mounted component is an [`InstanceId`]-addressed record holding its
//! hook slots, its context map, its children and the output of its last
//! render. The tree is stored flat in insertion order, so parents always
//! precede the children they mounted.
//!
//! # Design Decisions
//!
//! 1. Children are matched across renders by component type plus either an
//!    explicit key or their position among siblings of the same type. A
//!    changed type is a different child, never a reused one.
//!
//! 2. Re-rendering a component re-renders its whole subtree. Untouched
//!    subtrees are skipped entirely.
//!
//! 3. Effects run only after the host has committed the frame, so an effect
//!    never observes a half-rendered tree.

mod instance;
mod runtime;
mod scheduler;
mod view;

pub use instance::InstanceId;
pub use runtime::{Host, Runtime};
pub use scheduler::{EffectFailure, EffectPhase};
pub use view::{Component, ComponentNode, Frame, View};

pub(crate) use instance::Instance;
