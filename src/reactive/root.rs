//! Root - tracking context, batching and the pending-effect queue.
//!
//! One [`Root`] exists per rendering session. It is passed explicitly to
//! every constructor; there is no global "current root".

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::node::ReactiveCore;
use super::{Computed, Effect, Signal};
use crate::config::DEFAULT_MAX_BATCH_DEPTH;
use crate::error::ReactiveError;

// =============================================================================
// Tracking frame
// =============================================================================

/// Reads recorded while one computation body runs.
pub(crate) struct Frame {
    pub(crate) reaction: Rc<ReactiveCore>,
    /// Sources read this run that diverge from the previous source list.
    pub(crate) gets: Option<Vec<Rc<ReactiveCore>>>,
    /// Length of the prefix of the previous source list read again in order.
    pub(crate) gets_index: usize,
}

impl Frame {
    fn new(reaction: Rc<ReactiveCore>) -> Self {
        Self {
            reaction,
            gets: None,
            gets_index: 0,
        }
    }
}

// =============================================================================
// RootInner
// =============================================================================

pub(crate) struct RootInner {
    frame: RefCell<Option<Frame>>,
    queue: RefCell<VecDeque<Rc<ReactiveCore>>>,
    depth: Cell<usize>,
    open: Cell<usize>,
    max_depth: usize,
}

/// Increments a counter for the lifetime of the guard.
struct Enter<'a>(&'a Cell<usize>);

impl<'a> Enter<'a> {
    fn new(counter: &'a Cell<usize>) -> Self {
        counter.set(counter.get() + 1);
        Self(counter)
    }
}

impl Drop for Enter<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl RootInner {
    pub(crate) fn track(&self, source: &Rc<ReactiveCore>) {
        let mut slot = self.frame.borrow_mut();
        let Some(frame) = slot.as_mut() else {
            return;
        };
        if Rc::ptr_eq(&frame.reaction, source) {
            return;
        }
        if frame.gets.is_none() {
            let same = frame
                .reaction
                .source_at(frame.gets_index)
                .is_some_and(|previous| Rc::ptr_eq(&previous, source));
            if same {
                frame.gets_index += 1;
                return;
            }
        }
        frame.gets.get_or_insert_with(Vec::new).push(source.clone());
    }

    pub(crate) fn with_frame<R>(
        &self,
        reaction: &Rc<ReactiveCore>,
        f: impl FnOnce() -> R,
    ) -> (R, Option<Frame>) {
        let outer = self.frame.replace(Some(Frame::new(reaction.clone())));
        let out = f();
        let frame = self.frame.replace(outer);
        (out, frame)
    }

    pub(crate) fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        let outer = self.frame.take();
        let out = f();
        self.frame.replace(outer);
        out
    }

    fn current(&self) -> Option<Rc<ReactiveCore>> {
        self.frame.borrow().as_ref().map(|frame| frame.reaction.clone())
    }

    pub(crate) fn enqueue(&self, effect: Rc<ReactiveCore>) {
        self.queue.borrow_mut().push_back(effect);
    }

    pub(crate) fn batch<R>(&self, f: impl FnOnce() -> R) -> Result<R, ReactiveError> {
        if self.depth.get() >= self.max_depth {
            tracing::warn!(limit = self.max_depth, "batch depth limit reached");
            return Err(ReactiveError::CycleDetected {
                limit: self.max_depth,
            });
        }
        let _depth = Enter::new(&self.depth);
        let out = {
            let _open = Enter::new(&self.open);
            f()
        };
        if self.open.get() == 0 {
            self.stabilize()?;
        }
        Ok(out)
    }

    /// Drain the queue until it is empty, including effects queued while
    /// draining. Failures are isolated per effect except `CycleDetected`,
    /// which aborts the enclosing batch.
    fn stabilize(&self) -> Result<(), ReactiveError> {
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(effect) = next else {
                return Ok(());
            };
            if effect.is_disposed() {
                continue;
            }
            match effect.update_if_necessary() {
                Ok(()) => {}
                Err(err @ ReactiveError::CycleDetected { .. }) => return Err(err),
                Err(err) => {
                    tracing::error!(node = effect.id(), error = %err, "effect failed during flush");
                }
            }
        }
    }
}

// =============================================================================
// Root
// =============================================================================

/// Owner of the tracking context and the pending-effect queue.
///
/// Cheap to clone; clones share the same queue.
///
/// # Example
///
/// ```ignore
/// let root = Root::new();
/// let count = root.signal(1);
/// let doubled = root.computed({
///     let count = count.clone();
///     move || count.get() * 2
/// });
///
/// root.batch(|| {
///     count.set(2)?;
///     count.set(3)
/// })??;
/// assert_eq!(doubled.get()?, 6);
/// ```
#[derive(Clone)]
pub struct Root {
    inner: Rc<RootInner>,
}

impl Default for Root {
    fn default() -> Self {
        Self::new()
    }
}

impl Root {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_BATCH_DEPTH)
    }

    /// Root with a custom batch depth bound.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            inner: Rc::new(RootInner {
                frame: RefCell::new(None),
                queue: RefCell::new(VecDeque::new()),
                depth: Cell::new(0),
                open: Cell::new(0),
                max_depth,
            }),
        }
    }

    pub(crate) fn inner(&self) -> &Rc<RootInner> {
        &self.inner
    }

    pub fn max_depth(&self) -> usize {
        self.inner.max_depth
    }

    /// Run `f` with signal writes coalesced. Queued effects run once the
    /// outermost batch body returns.
    ///
    /// Returns `CycleDetected` when nesting goes past the depth bound, or
    /// when an effect flushed at the end of this batch hit it.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> Result<R, ReactiveError> {
        self.inner.batch(f)
    }

    /// Run `f` without recording reads into the running computation.
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.untracked(f)
    }

    /// Whether a computation body is currently recording reads.
    pub fn is_tracking(&self) -> bool {
        self.inner.current().is_some()
    }

    /// Register a cleanup on the running computation. It runs untracked
    /// before the next re-run and on disposal.
    pub fn on_cleanup(&self, cleanup: impl FnOnce() + 'static) -> Result<(), ReactiveError> {
        let reaction = self.inner.current().ok_or(ReactiveError::NoReaction)?;
        reaction.add_cleanup(Box::new(cleanup));
        Ok(())
    }

    /// Number of effects waiting for the next flush.
    pub fn pending_effects(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    pub fn signal<T: Clone + PartialEq + 'static>(&self, value: T) -> Signal<T> {
        Signal::new(self, value)
    }

    pub fn computed<T: Clone + PartialEq + 'static>(
        &self,
        f: impl Fn() -> T + 'static,
    ) -> Computed<T> {
        Computed::new(self, f)
    }

    pub fn effect(
        &self,
        f: impl Fn() -> Result<(), ReactiveError> + 'static,
    ) -> Result<Effect, ReactiveError> {
        Effect::new(self, f)
    }
}

impl std::fmt::Debug for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Root")
            .field("depth", &self.inner.depth.get())
            .field("pending", &self.inner.queue.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_on_cleanup_outside_computation() {
        let root = Root::new();
        assert_eq!(root.on_cleanup(|| {}), Err(ReactiveError::NoReaction));
    }

    #[test]
    fn test_batch_returns_body_value() {
        let root = Root::new();
        assert_eq!(root.batch(|| 7).unwrap(), 7);
    }

    #[test]
    fn test_nested_batch_defers_flush_to_outermost() {
        let root = Root::new();
        let source = root.signal(0);
        let runs = Rc::new(Cell::new(0));
        let _effect = root
            .effect({
                let source = source.clone();
                let runs = runs.clone();
                move || {
                    source.get();
                    runs.set(runs.get() + 1);
                    Ok(())
                }
            })
            .unwrap();

        root.batch(|| {
            source.set(1).unwrap();
            root.batch(|| source.set(2).unwrap()).unwrap();
            assert_eq!(runs.get(), 1, "inner batch exit must not flush");
            source.set(3).unwrap();
        })
        .unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_depth_bound() {
        let root = Root::with_max_depth(3);
        let result = root.batch(|| root.batch(|| root.batch(|| root.batch(|| ()))));
        assert_eq!(
            result.unwrap().unwrap().unwrap(),
            Err(ReactiveError::CycleDetected { limit: 3 })
        );
    }

    #[test]
    fn test_untracked_restores_tracking() {
        let root = Root::new();
        let seen = Rc::new(Cell::new((false, false)));
        let _effect = root
            .effect({
                let root = root.clone();
                let seen = seen.clone();
                move || {
                    let inside = root.untracked(|| root.is_tracking());
                    seen.set((inside, root.is_tracking()));
                    Ok(())
                }
            })
            .unwrap();
        assert_eq!(seen.get(), (false, true));
        assert!(!root.is_tracking());
    }
}
