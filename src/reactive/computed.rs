//! Computed - memoized derivation.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::node::{Body, Flags, ReactiveCore};
use super::root::Root;
use crate::error::ReactiveError;

struct Cache<T> {
    value: RefCell<Option<T>>,
    error: RefCell<Option<ReactiveError>>,
}

/// A lazily evaluated, memoized derivation.
///
/// The body re-runs only when read after a source changed. When the new
/// value equals the cached one, observers are left clean.
///
/// A failing body keeps the last good value; reads without any good value
/// report the error that produced the failure.
pub struct Computed<T> {
    core: Rc<ReactiveCore>,
    cache: Rc<Cache<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    pub fn new(root: &Root, f: impl Fn() -> T + 'static) -> Self {
        Self::try_new(root, move || Ok(f()))
    }

    /// Derivation whose body may fail.
    pub fn try_new(root: &Root, f: impl Fn() -> Result<T, ReactiveError> + 'static) -> Self {
        let cache = Rc::new(Cache {
            value: RefCell::new(None),
            error: RefCell::new(None),
        });
        let slot = cache.clone();
        let body: Body = Rc::new(move || match f() {
            Ok(next) => {
                slot.error.borrow_mut().take();
                let mut value = slot.value.borrow_mut();
                let changed = value.as_ref() != Some(&next);
                if changed {
                    *value = Some(next);
                }
                Ok(changed)
            }
            Err(err) => {
                *slot.error.borrow_mut() = Some(err.clone());
                Err(err)
            }
        });
        Self {
            core: ReactiveCore::new(root.inner(), Some(body), Flags::empty()),
            cache,
        }
    }

    /// Current value, subscribing the running computation.
    pub fn get(&self) -> Result<T, ReactiveError> {
        if self.core.is_disposed() {
            return Err(ReactiveError::Disposed);
        }
        self.core.track();
        self.core.update_if_necessary()?;
        self.cached()
    }

    /// Current value without subscribing. Still resolves pending changes.
    pub fn peek(&self) -> Result<T, ReactiveError> {
        match self.core.root() {
            Some(root) => root.untracked(|| self.get()),
            None => self.get(),
        }
    }

    fn cached(&self) -> Result<T, ReactiveError> {
        if let Some(value) = self.cache.value.borrow().as_ref() {
            return Ok(value.clone());
        }
        Err(self
            .cache
            .error
            .borrow()
            .clone()
            .unwrap_or(ReactiveError::Disposed))
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }

    pub(crate) fn id(&self) -> usize {
        self.core.id()
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("state", &self.core.state())
            .field("value", &self.cache.value.borrow())
            .finish()
    }
}

impl<T> PartialEq for Computed<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::CacheState;
    use std::cell::Cell;

    #[test]
    fn test_lazy_until_read() {
        let root = Root::new();
        let runs = Rc::new(Cell::new(0));
        let computed = Computed::new(&root, {
            let runs = runs.clone();
            move || {
                runs.set(runs.get() + 1);
                42
            }
        });
        assert_eq!(runs.get(), 0);
        assert_eq!(computed.get().unwrap(), 42);
        assert_eq!(computed.get().unwrap(), 42);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_recomputes_after_source_change() {
        let root = Root::new();
        let source = root.signal(2);
        let squared = Computed::new(&root, {
            let source = source.clone();
            move || source.get() * source.get()
        });
        assert_eq!(squared.get().unwrap(), 4);
        source.set(3).unwrap();
        assert_eq!(squared.core.state(), CacheState::Dirty);
        assert_eq!(squared.get().unwrap(), 9);
    }

    #[test]
    fn test_error_keeps_last_good_value() {
        let root = Root::new();
        let source = root.signal(1);
        let checked = Computed::try_new(&root, {
            let source = source.clone();
            move || match source.get() {
                n if n < 0 => Err(ReactiveError::failed("negative")),
                n => Ok(n),
            }
        });
        assert_eq!(checked.get().unwrap(), 1);

        source.set(-1).unwrap();
        assert_eq!(checked.get(), Err(ReactiveError::failed("negative")));
        assert_eq!(checked.get().unwrap(), 1, "stale but consistent after failure");

        source.set(7).unwrap();
        assert_eq!(checked.get().unwrap(), 7, "old subscriptions allow a retry");
    }

    #[test]
    fn test_first_failure_reports_error() {
        let root = Root::new();
        let broken: Computed<i32> = Computed::try_new(&root, || Err(ReactiveError::failed("boom")));
        assert_eq!(broken.get(), Err(ReactiveError::failed("boom")));
        assert_eq!(broken.get(), Err(ReactiveError::failed("boom")));
    }

    #[test]
    fn test_first_failure_retries_on_input_change() {
        let root = Root::new();
        let source = root.signal(-1);
        let checked = Computed::try_new(&root, {
            let source = source.clone();
            move || match source.get() {
                n if n < 0 => Err(ReactiveError::failed("negative")),
                n => Ok(n),
            }
        });
        assert_eq!(checked.get(), Err(ReactiveError::failed("negative")));
        assert_eq!(source.observer_count(), 1, "failed run still subscribes");

        source.set(5).unwrap();
        assert_eq!(checked.get().unwrap(), 5);
        assert_eq!(source.observer_count(), 1);
    }

    #[test]
    fn test_peek_resolves_without_subscribing() {
        let root = Root::new();
        let source = root.signal(1);
        let doubled = Computed::new(&root, {
            let source = source.clone();
            move || source.get() * 2
        });
        let tripled = Computed::new(&root, {
            let doubled = doubled.clone();
            move || doubled.get().map_or(0, |n| n + n / 2)
        });
        assert_eq!(tripled.get().unwrap(), 3);

        source.set(2).unwrap();
        assert_eq!(tripled.core.state(), CacheState::Check);

        let runs = Rc::new(Cell::new(0));
        let seen = Rc::new(Cell::new(0));
        let _effect = root
            .effect({
                let (tripled, runs, seen) = (tripled.clone(), runs.clone(), seen.clone());
                move || {
                    runs.set(runs.get() + 1);
                    seen.set(tripled.peek()?);
                    Ok(())
                }
            })
            .unwrap();
        assert_eq!(seen.get(), 6, "peek forces the pending change through");
        assert_eq!(tripled.core.observer_count(), 0);

        source.set(3).unwrap();
        assert_eq!(runs.get(), 1, "a peeked computed never re-runs the reader");
    }

    #[test]
    fn test_disposed_read_is_error() {
        let root = Root::new();
        let computed = Computed::new(&root, || 1);
        assert_eq!(computed.get().unwrap(), 1);
        computed.dispose();
        assert_eq!(computed.get(), Err(ReactiveError::Disposed));
    }

    #[test]
    fn test_self_read_is_reentrant_error() {
        let root = Root::new();
        let cell: Rc<RefCell<Option<Computed<i32>>>> = Rc::new(RefCell::new(None));
        let computed = Computed::try_new(&root, {
            let cell = cell.clone();
            move || {
                let me = cell.borrow().clone();
                match me {
                    Some(me) => me.get().map(|n| n + 1),
                    None => Ok(0),
                }
            }
        });
        *cell.borrow_mut() = Some(computed.clone());
        assert_eq!(computed.get(), Err(ReactiveError::Reentrant));
    }
}
