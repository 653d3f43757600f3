//! Ref cells.
//!
//! A ref cell holds one mutable value per component instance. It survives
//! re-renders and never schedules one. The usual occupant is a handle to an
//! external object, such as a focusable widget, so that event handlers can
//! make imperative calls outside the render path.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Storage for a `use_ref` slot.
pub(crate) struct RefSlot {
    cell: Rc<dyn Any>,
    type_name: &'static str,
}

impl RefSlot {
    pub(crate) fn new<T: 'static>(value: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(value)),
            type_name: type_name::<T>(),
        }
    }

    pub(crate) fn handle<T: 'static>(&self) -> Option<MutRef<T>> {
        Rc::clone(&self.cell)
            .downcast::<RefCell<T>>()
            .ok()
            .map(MutRef)
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Handle to a ref cell. Clones share the same cell.
///
/// Reads and writes take effect immediately and are invisible to the
/// scheduler.
pub struct MutRef<T>(Rc<RefCell<T>>);

impl<T> MutRef<T> {
    /// Current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().clone()
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    /// Store `value`, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    pub fn take(&self) -> T
    where
        T: Default,
    {
        self.0.take()
    }

    /// Borrow the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow())
    }

    /// Borrow the current value mutably.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Whether two handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for MutRef<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for MutRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutRef").field(&*self.0.borrow()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_share_the_cell() {
        let slot = RefSlot::new(1);
        let a = slot.handle::<i32>().unwrap();
        let b = slot.handle::<i32>().unwrap();

        a.set(7);
        assert_eq!(b.get(), 7);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn wrong_type_yields_none() {
        let slot = RefSlot::new(1i32);
        assert!(slot.handle::<String>().is_none());
        assert_eq!(slot.type_name(), "i32");
    }

    #[test]
    fn replace_and_take() {
        let slot = RefSlot::new(Some("input"));
        let cell = slot.handle::<Option<&str>>().unwrap();

        assert_eq!(cell.replace(Some("button")), Some("input"));
        assert_eq!(cell.take(), Some("button"));
        assert_eq!(cell.get(), None);
    }

    #[test]
    fn with_mut_edits_in_place() {
        let slot = RefSlot::new(vec![1, 2]);
        let cell = slot.handle::<Vec<i32>>().unwrap();

        cell.with_mut(|v| v.push(3));
        assert_eq!(cell.with(|v| v.len()), 3);
    }
}
