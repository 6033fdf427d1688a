//! Components.
//!
//! A component is a type implementing [`Component`]. The node tree creates
//! one instance per mounted component descriptor and renders it inside an
//! effect: reading a signal during `render` is enough to re-render when it
//! changes. New props from the parent and [`ComponentContext::rerender`]
//! also trigger a render.
//!
//! # Example
//!
//! ```ignore
//! struct Counter {
//!     count: Signal<i64>,
//! }
//!
//! impl Component for Counter {
//!     fn create(cx: &ComponentContext) -> Self {
//!         Self { count: cx.signal(0) }
//!     }
//!
//!     fn render(&self, _cx: &ComponentContext) -> Result<Children, RenderError> {
//!         let count = self.count.clone();
//!         Ok(h("button")
//!             .on("click", Handler::new(move || count.update(|n| n + 1)))
//!             .child(self.count.get())
//!             .into())
//!     }
//! }
//! ```

use std::any::{TypeId, type_name};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use tokio::task::JoinHandle;

use super::children::Children;
use super::props::{PropValue, Props};
use crate::error::{ReactiveError, RenderError};
use crate::reactive::{Computed, Effect, Root, Signal};

/// A server-side component.
pub trait Component: 'static {
    /// Build the instance. Runs once per mount, untracked.
    fn create(cx: &ComponentContext) -> Self
    where
        Self: Sized;

    /// Produce the component's content. Runs tracked.
    fn render(&self, cx: &ComponentContext) -> Result<Children, RenderError>;

    /// Called once after the first render. Use [`ComponentContext::spawn`]
    /// for background work.
    fn mount(&self, _cx: &ComponentContext) {}
}

// =============================================================================
// ComponentType
// =============================================================================

/// Runtime handle on a component type, stored in descriptors.
#[derive(Clone, Copy)]
pub struct ComponentType {
    name: &'static str,
    type_id: TypeId,
    create: fn(&ComponentContext) -> Rc<dyn Component>,
}

fn create_instance<C: Component>(cx: &ComponentContext) -> Rc<dyn Component> {
    Rc::new(C::create(cx))
}

impl ComponentType {
    pub fn of<C: Component>() -> Self {
        let full = type_name::<C>();
        Self {
            name: full.rsplit("::").next().unwrap_or(full),
            type_id: TypeId::of::<C>(),
            create: create_instance::<C>,
        }
    }

    /// Short type name, for logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn instantiate(&self, cx: &ComponentContext) -> Rc<dyn Component> {
        (self.create)(cx)
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// =============================================================================
// ComponentContext
// =============================================================================

struct ContextInner {
    root: Root,
    name: &'static str,
    props: Signal<Props>,
    tick: Signal<u64>,
    effects: RefCell<Vec<Effect>>,
    tasks: RefCell<Vec<JoinHandle<()>>>,
    cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Per-instance context handed to every [`Component`] method.
///
/// Cheap to clone into handlers. Everything created through it (effects,
/// spawned tasks, cleanups) is released when the component unmounts.
#[derive(Clone)]
pub struct ComponentContext(Rc<ContextInner>);

impl ComponentContext {
    pub(crate) fn new(root: &Root, name: &'static str, props: Signal<Props>) -> Self {
        Self(Rc::new(ContextInner {
            root: root.clone(),
            name,
            props,
            tick: Signal::new(root, 0),
            effects: RefCell::new(Vec::new()),
            tasks: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
        }))
    }

    pub fn root(&self) -> &Root {
        &self.0.root
    }

    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// All props, subscribing the caller.
    pub fn props(&self) -> Props {
        self.0.props.get()
    }

    /// One prop, subscribing the caller.
    pub fn prop(&self, name: &str) -> Option<PropValue> {
        self.0.props.with(|props| props.get(name).cloned())
    }

    /// Force a render even if nothing the render reads has changed.
    pub fn rerender(&self) -> Result<(), ReactiveError> {
        self.0.tick.update(|tick| tick.wrapping_add(1))
    }

    pub(crate) fn track_rerender(&self) {
        self.0.tick.get();
    }

    pub fn signal<T: Clone + PartialEq + 'static>(&self, value: T) -> Signal<T> {
        Signal::new(&self.0.root, value)
    }

    pub fn computed<T: Clone + PartialEq + 'static>(
        &self,
        f: impl Fn() -> T + 'static,
    ) -> Computed<T> {
        Computed::new(&self.0.root, f)
    }

    /// Effect owned by the component, disposed on unmount.
    pub fn effect(
        &self,
        f: impl Fn() -> Result<(), ReactiveError> + 'static,
    ) -> Result<(), ReactiveError> {
        let effect = Effect::new(&self.0.root, f)?;
        self.0.effects.borrow_mut().push(effect);
        Ok(())
    }

    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> Result<R, ReactiveError> {
        self.0.root.batch(f)
    }

    /// Run `cleanup` when the component unmounts.
    pub fn on_cleanup(&self, cleanup: impl FnOnce() + 'static) {
        self.0.cleanups.borrow_mut().push(Box::new(cleanup));
    }

    /// Spawn a local task aborted when the component unmounts.
    ///
    /// Must be called from inside the session's `LocalSet`.
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        let handle = tokio::task::spawn_local(task);
        let mut tasks = self.0.tasks.borrow_mut();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Release everything the component owns.
    pub(crate) fn dispose(&self) {
        let tasks = std::mem::take(&mut *self.0.tasks.borrow_mut());
        for task in tasks {
            task.abort();
        }
        let effects = std::mem::take(&mut *self.0.effects.borrow_mut());
        drop(effects);
        let cleanups = std::mem::take(&mut *self.0.cleanups.borrow_mut());
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
    }
}

impl fmt::Debug for ComponentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentContext")
            .field("name", &self.0.name)
            .finish()
    }
}
