//! Child groups.
//!
//! A [`Group`] reconciles an ordered child list. Children are matched to
//! live nodes by identity, first come first served: the n-th child with a
//! given identity reuses the n-th live node with that identity, so keyed
//! children survive reordering and unkeyed siblings of the same kind are
//! updated positionally. Unmatched children start new nodes, unmatched
//! nodes are stopped.
//!
//! Each live child sits in a [`ChildSlot`] recording its index and the DOM
//! node (or nested group) mounted there. Reorders only raise a flag; the
//! group's own task then sends one `AssignSlot` with the final order.
//! Fragments nest a group inside a slot of the outer group: their nodes are
//! inserted into, and ordered by, the outer DOM parent.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use tokio::task::JoinHandle;

use super::component::SlotScope;
use super::mailbox::Mailbox;
use super::runtime::Runtime;
use super::task::NodeTask;
use super::{Content, Scope};
use crate::descriptor::Children;
use crate::patch::{DomId, Patch};

/// Where a group's DOM nodes go.
pub(crate) enum Target {
    /// Directly under `parent_id` (the session root when `None`), in `slot`.
    Dom {
        parent_id: Option<DomId>,
        slot: Option<String>,
    },
    /// Spliced into the slot of an enclosing group.
    Nested(Rc<ChildSlot>),
}

// =============================================================================
// ChildSlot
// =============================================================================

enum Mounted {
    Empty,
    Node(DomId),
    Group(Weak<Group>),
}

/// Position of one child inside its group.
pub(crate) struct ChildSlot {
    index: Cell<usize>,
    mounted: RefCell<Mounted>,
    group: Weak<Group>,
}

impl ChildSlot {
    fn new(index: usize, group: Weak<Group>) -> Self {
        Self {
            index: Cell::new(index),
            mounted: RefCell::new(Mounted::Empty),
            group,
        }
    }

    fn occupy(&self, mounted: Mounted) -> bool {
        let mut current = self.mounted.borrow_mut();
        if !matches!(*current, Mounted::Empty) {
            tracing::error!("child slot is already mounted");
            debug_assert!(false, "child slot is already mounted");
            return false;
        }
        *current = mounted;
        true
    }

    /// Insert DOM node `id` here.
    pub(crate) fn mount(&self, id: &DomId) {
        if !self.occupy(Mounted::Node(id.clone())) {
            return;
        }
        if let Some(group) = self.group.upgrade() {
            group.insert_dom(id);
            group.request_reorder();
        }
    }

    /// Remove DOM node `id` from here.
    pub(crate) fn unmount(&self, id: &DomId) {
        let previous = std::mem::replace(&mut *self.mounted.borrow_mut(), Mounted::Empty);
        if !matches!(&previous, Mounted::Node(current) if current == id) {
            tracing::warn!(%id, "unmounting a node that is not mounted here");
        }
        if let Some(group) = self.group.upgrade() {
            group.remove_dom(id);
            group.request_reorder();
        }
    }

    /// Splice a nested group in here.
    pub(crate) fn attach(&self, nested: &Rc<Group>) {
        self.occupy(Mounted::Group(Rc::downgrade(nested)));
    }

    pub(crate) fn detach(&self) {
        *self.mounted.borrow_mut() = Mounted::Empty;
        self.request_reorder();
    }

    fn insert_dom(&self, id: &DomId) {
        if let Some(group) = self.group.upgrade() {
            group.insert_dom(id);
        }
    }

    fn remove_dom(&self, id: &DomId) {
        if let Some(group) = self.group.upgrade() {
            group.remove_dom(id);
        }
    }

    fn request_reorder(&self) {
        if let Some(group) = self.group.upgrade() {
            group.request_reorder();
        }
    }

    fn collect_ids(&self, out: &mut Vec<DomId>) {
        match &*self.mounted.borrow() {
            Mounted::Empty => {}
            Mounted::Node(id) => out.push(id.clone()),
            Mounted::Group(group) => {
                if let Some(group) = group.upgrade() {
                    group.collect_ids(out);
                }
            }
        }
    }
}

// =============================================================================
// Group
// =============================================================================

struct Entry {
    identity: u64,
    slot: Rc<ChildSlot>,
    node: NodeTask,
}

pub(crate) struct Group {
    runtime: Rc<Runtime>,
    target: Target,
    slots: Option<Rc<SlotScope>>,
    entries: RefCell<Vec<Entry>>,
    order: RefCell<Vec<DomId>>,
    reorder: Rc<Mailbox<()>>,
    task: RefCell<Option<JoinHandle<()>>>,
}

impl Group {
    /// Create an empty group. Groups targeting the DOM spawn their reorder
    /// task, so this must run inside the session's `LocalSet`.
    pub(crate) fn new(
        runtime: &Rc<Runtime>,
        target: Target,
        slots: Option<Rc<SlotScope>>,
    ) -> Rc<Self> {
        let group = Rc::new(Self {
            runtime: runtime.clone(),
            target,
            slots,
            entries: RefCell::new(Vec::new()),
            order: RefCell::new(Vec::new()),
            reorder: Rc::new(Mailbox::new(runtime.pending().clone())),
            task: RefCell::new(None),
        });
        if matches!(group.target, Target::Dom { .. }) {
            let weak = Rc::downgrade(&group);
            let reorder = group.reorder.clone();
            let task = tokio::task::spawn_local(async move {
                while reorder.recv().await.is_some() {
                    match weak.upgrade() {
                        Some(group) => group.flush_order(),
                        None => break,
                    }
                }
            });
            *group.task.borrow_mut() = Some(task);
        }
        group
    }

    /// Reconcile the live children with `children`.
    pub(crate) fn update(self: &Rc<Self>, children: &Children) {
        let previous = std::mem::take(&mut *self.entries.borrow_mut());
        let mut pool: HashMap<u64, VecDeque<Entry>> = HashMap::new();
        for entry in previous {
            pool.entry(entry.identity).or_default().push_back(entry);
        }

        let mut next = Vec::with_capacity(children.len());
        for (index, child) in children.iter().enumerate() {
            let identity = child.identity();
            let content = Content::from(child.clone());
            match pool.get_mut(&identity).and_then(VecDeque::pop_front) {
                Some(entry) => {
                    entry.slot.index.set(index);
                    entry.node.resume(content);
                    next.push(entry);
                }
                None => next.push(self.spawn(index, identity, content)),
            }
        }
        *self.entries.borrow_mut() = next;

        let mut leftovers: Vec<Entry> = pool.into_values().flatten().collect();
        leftovers.sort_by_key(|entry| entry.slot.index.get());
        for entry in leftovers.into_iter().rev() {
            entry.node.stop();
        }
        self.request_reorder();
    }

    fn spawn(self: &Rc<Self>, index: usize, identity: u64, content: Content) -> Entry {
        let slot = Rc::new(ChildSlot::new(index, Rc::downgrade(self)));
        let scope = Scope {
            runtime: self.runtime.clone(),
            mount: slot.clone(),
            slots: self.slots.clone(),
        };
        Entry {
            identity,
            node: NodeTask::spawn(scope, content),
            slot,
        }
    }

    /// Stop every child, last first.
    pub(crate) fn stop(&self) {
        if let Some(task) = self.task.borrow_mut().take() {
            task.abort();
        }
        self.reorder.close();
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        for entry in entries.into_iter().rev() {
            entry.node.stop();
        }
    }

    fn insert_dom(&self, id: &DomId) {
        match &self.target {
            Target::Dom { parent_id, .. } => self.runtime.patch(Patch::InsertBefore {
                parent_id: parent_id.clone(),
                id: id.clone(),
                ref_id: None,
            }),
            Target::Nested(outer) => outer.insert_dom(id),
        }
    }

    fn remove_dom(&self, id: &DomId) {
        match &self.target {
            Target::Dom { parent_id, .. } => self.runtime.patch(Patch::RemoveChild {
                parent_id: parent_id.clone(),
                id: id.clone(),
            }),
            Target::Nested(outer) => outer.remove_dom(id),
        }
    }

    fn request_reorder(&self) {
        match &self.target {
            Target::Dom { .. } => self.reorder.send(()),
            Target::Nested(outer) => outer.request_reorder(),
        }
    }

    fn collect_ids(&self, out: &mut Vec<DomId>) {
        for entry in self.entries.borrow().iter() {
            entry.slot.collect_ids(out);
        }
    }

    fn flush_order(&self) {
        let Target::Dom { parent_id, slot } = &self.target else {
            return;
        };
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        if *self.order.borrow() == ids {
            return;
        }
        tracing::debug!(parent = ?parent_id, count = ids.len(), "assign slot");
        self.runtime.patch(Patch::AssignSlot {
            parent_id: parent_id.clone(),
            slot: slot.clone(),
            ids: ids.clone(),
        });
        *self.order.borrow_mut() = ids;
    }
}
