//! Signal - mutable reactive cell.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::node::{Flags, ReactiveCore};
use super::root::Root;
use crate::error::ReactiveError;

/// A mutable reactive cell.
///
/// Reading with [`get`](Signal::get) inside a computation subscribes that
/// computation. Writing an equal value is a no-op; writing a different value
/// marks direct observers dirty and flushes effects unless a batch is open.
pub struct Signal<T> {
    core: Rc<ReactiveCore>,
    value: Rc<RefCell<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub fn new(root: &Root, value: T) -> Self {
        Self {
            core: ReactiveCore::new(root.inner(), None, Flags::empty()),
            value: Rc::new(RefCell::new(value)),
        }
    }

    /// Current value, subscribing the running computation.
    pub fn get(&self) -> T {
        self.core.track();
        self.value.borrow().clone()
    }

    /// Borrow the current value, subscribing the running computation.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.core.track();
        f(&self.value.borrow())
    }

    /// Current value without subscribing.
    pub fn peek(&self) -> T {
        self.value.borrow().clone()
    }

    pub fn set(&self, value: T) -> Result<(), ReactiveError> {
        if *self.value.borrow() == value {
            return Ok(());
        }
        let Some(root) = self.core.root() else {
            *self.value.borrow_mut() = value;
            return Ok(());
        };
        root.batch(|| {
            *self.value.borrow_mut() = value;
            self.core.mark_observers_dirty();
        })
    }

    /// Set from the current value.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<(), ReactiveError> {
        let next = f(&self.value.borrow());
        self.set(next)
    }

    pub(crate) fn id(&self) -> usize {
        self.core.id()
    }

    /// Number of live subscribers.
    pub fn observer_count(&self) -> usize {
        self.core.observer_count()
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&self.value.borrow()).finish()
    }
}

/// Signals compare by identity: two handles are equal when they share a cell.
impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}
