//! Type-erased reactive node and the three-state propagation algorithm.
//!
//! Every [`Signal`](super::Signal), [`Computed`](super::Computed) and
//! [`Effect`](super::Effect) wraps one [`ReactiveCore`]. The core carries the
//! graph links and the cache state; the typed wrappers own the values.
//!
//! # Propagation
//!
//! A write marks direct observers `Dirty` and everything further downstream
//! `Check`. Effects leaving `Clean` are queued on the root. Reading a node in
//! `Check` first walks its sources in order and stops as soon as the node
//! itself turns `Dirty`; only then is the body re-run. A body that reports an
//! unchanged value leaves its observers alone, which is what stops a diamond
//! from evaluating twice and a stable derivation from re-rendering.
//!
//! # Source tracking
//!
//! While a body runs, the root records reads in a [`Frame`](super::root::Frame):
//! reads that match the previous source list position by position only bump
//! `gets_index`; the first divergent read starts a fresh `gets` list. After the
//! run, the tail past `gets_index` is unsubscribed and `gets` subscribed.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use bitflags::bitflags;

use super::root::{Frame, RootInner};
use crate::error::ReactiveError;

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// Cache state of a reactive node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CacheState {
    /// Value is current.
    Clean,
    /// Some upstream node may have changed.
    Check,
    /// A direct source changed; the body must re-run.
    Dirty,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct Flags: u8 {
        const EFFECT = 1 << 0;
        const DISPOSED = 1 << 1;
        const RUNNING = 1 << 2;
    }
}

/// Body of a computation. Returns whether the produced value changed.
pub(crate) type Body = Rc<dyn Fn() -> Result<bool, ReactiveError>>;

pub(crate) type CleanupFn = Box<dyn FnOnce()>;

pub(crate) struct ReactiveCore {
    id: usize,
    root: Weak<RootInner>,
    state: Cell<CacheState>,
    flags: Cell<Flags>,
    body: RefCell<Option<Body>>,
    sources: RefCell<Vec<Rc<ReactiveCore>>>,
    observers: RefCell<Vec<Weak<ReactiveCore>>>,
    cleanups: RefCell<Vec<CleanupFn>>,
}

impl ReactiveCore {
    pub(crate) fn new(root: &Rc<RootInner>, body: Option<Body>, flags: Flags) -> Rc<Self> {
        let state = if body.is_some() {
            CacheState::Dirty
        } else {
            CacheState::Clean
        };
        Rc::new(Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            root: Rc::downgrade(root),
            state: Cell::new(state),
            flags: Cell::new(flags),
            body: RefCell::new(body),
            sources: RefCell::new(Vec::new()),
            observers: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn state(&self) -> CacheState {
        self.state.get()
    }

    pub(crate) fn root(&self) -> Option<Rc<RootInner>> {
        self.root.upgrade()
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.flags.get().contains(Flags::DISPOSED)
    }

    fn is_effect(&self) -> bool {
        self.flags.get().contains(Flags::EFFECT)
    }

    fn set_flag(&self, flag: Flags, on: bool) {
        let mut flags = self.flags.get();
        flags.set(flag, on);
        self.flags.set(flags);
    }

    pub(crate) fn source_at(&self, index: usize) -> Option<Rc<ReactiveCore>> {
        self.sources.borrow().get(index).cloned()
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.borrow().iter().filter(|o| o.strong_count() > 0).count()
    }

    /// Record this node as a source of whatever computation is running.
    pub(crate) fn track(self: &Rc<Self>) {
        if let Some(root) = self.root() {
            root.track(self);
        }
    }

    /// Live observers, pruning dropped ones.
    fn observers(&self) -> Vec<Rc<ReactiveCore>> {
        let mut observers = self.observers.borrow_mut();
        observers.retain(|o| o.strong_count() > 0);
        observers.iter().filter_map(Weak::upgrade).collect()
    }

    fn add_observer(&self, observer: &Rc<ReactiveCore>) {
        self.observers.borrow_mut().push(Rc::downgrade(observer));
    }

    fn remove_observer(&self, observer: &Rc<ReactiveCore>) {
        let mut observers = self.observers.borrow_mut();
        let target = Rc::as_ptr(observer);
        if let Some(pos) = observers.iter().position(|o| o.as_ptr() == target) {
            observers.swap_remove(pos);
        }
    }

    /// A signal value changed: direct observers must re-run.
    pub(crate) fn mark_observers_dirty(&self) {
        for observer in self.observers() {
            observer.stale(CacheState::Dirty);
        }
    }

    /// Raise this node to `state` and push `Check` downstream.
    pub(crate) fn stale(self: &Rc<Self>, state: CacheState) {
        let current = self.state.get();
        if current >= state || self.is_disposed() {
            return;
        }
        self.state.set(state);
        if current == CacheState::Clean && self.is_effect() {
            if let Some(root) = self.root() {
                root.enqueue(self.clone());
            }
        }
        for observer in self.observers() {
            observer.stale(CacheState::Check);
        }
    }

    /// Bring the cached value up to date, re-running the body only if a
    /// source actually changed.
    pub(crate) fn update_if_necessary(self: &Rc<Self>) -> Result<(), ReactiveError> {
        if self.is_disposed() {
            return Err(ReactiveError::Disposed);
        }
        if !self.is_effect() && self.flags.get().contains(Flags::RUNNING) {
            return Err(ReactiveError::Reentrant);
        }
        if self.state.get() == CacheState::Check {
            let mut index = 0;
            while let Some(source) = self.source_at(index) {
                if let Err(err) = source.update_if_necessary() {
                    self.state.set(CacheState::Clean);
                    return Err(err);
                }
                if self.state.get() == CacheState::Dirty {
                    break;
                }
                index += 1;
            }
            if self.state.get() == CacheState::Check {
                self.state.set(CacheState::Clean);
            }
        }
        if self.state.get() == CacheState::Dirty {
            self.update()?;
        }
        Ok(())
    }

    /// Re-run the body unconditionally.
    pub(crate) fn update(self: &Rc<Self>) -> Result<(), ReactiveError> {
        let body = self.body.borrow().clone();
        let (Some(root), Some(body)) = (self.root(), body) else {
            self.state.set(CacheState::Clean);
            return Ok(());
        };
        let running = self.flags.get().contains(Flags::RUNNING);
        if running && !self.is_effect() {
            return Err(ReactiveError::Reentrant);
        }

        self.run_cleanups(&root);
        self.state.set(CacheState::Clean);
        self.set_flag(Flags::RUNNING, true);
        let (result, frame) = root.with_frame(self, || body());
        if !running {
            self.set_flag(Flags::RUNNING, false);
        }

        let frame = frame.filter(|_| !self.is_disposed());
        let changed = match result {
            Ok(changed) => changed,
            Err(err) => {
                if let Some(frame) = frame {
                    self.link_additional(frame);
                }
                return Err(err);
            }
        };
        if let Some(frame) = frame {
            self.relink(frame);
        }
        if changed {
            for observer in self.observers() {
                if observer.state.get() != CacheState::Clean {
                    observer.state.set(CacheState::Dirty);
                }
            }
        }
        Ok(())
    }

    fn relink(self: &Rc<Self>, frame: Frame) {
        let (stale, added_from) = {
            let mut sources = self.sources.borrow_mut();
            let keep = frame.gets_index.min(sources.len());
            let stale = sources.split_off(keep);
            let added_from = sources.len();
            if let Some(gets) = frame.gets {
                sources.extend(gets);
            }
            (stale, added_from)
        };
        for source in &stale {
            source.remove_observer(self);
        }
        let sources = self.sources.borrow();
        for source in &sources[added_from..] {
            source.add_observer(self);
        }
    }

    /// After a failed run: keep every previous source and also subscribe
    /// the new ones read before the failure, so any of them can retry it.
    fn link_additional(self: &Rc<Self>, frame: Frame) {
        let Some(gets) = frame.gets else {
            return;
        };
        let added: Vec<Rc<ReactiveCore>> = {
            let mut sources = self.sources.borrow_mut();
            let mut added = Vec::new();
            for source in gets {
                if sources.iter().any(|known| Rc::ptr_eq(known, &source)) {
                    continue;
                }
                sources.push(source.clone());
                added.push(source);
            }
            added
        };
        for source in &added {
            source.add_observer(self);
        }
    }

    pub(crate) fn add_cleanup(&self, cleanup: CleanupFn) {
        self.cleanups.borrow_mut().push(cleanup);
    }

    fn run_cleanups(&self, root: &RootInner) {
        let cleanups = std::mem::take(&mut *self.cleanups.borrow_mut());
        if cleanups.is_empty() {
            return;
        }
        root.untracked(|| {
            for cleanup in cleanups {
                cleanup();
            }
        });
    }

    /// Permanently retire this node: run cleanups, drop source links and the body.
    pub(crate) fn dispose(self: &Rc<Self>) {
        if self.is_disposed() {
            return;
        }
        self.set_flag(Flags::DISPOSED, true);
        match self.root() {
            Some(root) => self.run_cleanups(&root),
            None => {
                let cleanups = std::mem::take(&mut *self.cleanups.borrow_mut());
                for cleanup in cleanups {
                    cleanup();
                }
            }
        }
        let sources = std::mem::take(&mut *self.sources.borrow_mut());
        for source in &sources {
            source.remove_observer(self);
        }
        let body = self.body.borrow_mut().take();
        drop(body);
        self.observers.borrow_mut().clear();
    }
}
