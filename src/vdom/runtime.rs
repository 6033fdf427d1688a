//! Per-session state shared by every node.
//!
//! The patch queue and the handler registry are the only things nodes
//! mutate in common. Patches go through an unbounded mpsc channel with a
//! single consumer, so their order is the order nodes emitted them.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::sync::mpsc::UnboundedSender;

use super::mailbox::Pending;
use crate::config::{IdStrategy, SessionConfig};
use crate::descriptor::{CustomElement, Handler};
use crate::patch::{DomId, HandlerId, Patch};
use crate::reactive::Root;

// =============================================================================
// Ids
// =============================================================================

/// Sequential ids count separately per prefix (`n1`, `h1`, `s1`, ...).
pub(crate) struct IdGenerator {
    strategy: IdStrategy,
    counters: RefCell<HashMap<char, u64>>,
}

impl IdGenerator {
    fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            counters: RefCell::new(HashMap::new()),
        }
    }

    fn next(&self, prefix: char, len: usize) -> String {
        match self.strategy {
            IdStrategy::Random => rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(len)
                .map(char::from)
                .collect(),
            IdStrategy::Sequential => {
                let mut counters = self.counters.borrow_mut();
                let n = counters.entry(prefix).or_insert(0);
                *n += 1;
                format!("{prefix}{n}")
            }
        }
    }
}

// =============================================================================
// Runtime
// =============================================================================

pub(crate) struct Runtime {
    root: Root,
    config: SessionConfig,
    patches: UnboundedSender<Patch>,
    callbacks: RefCell<HashMap<HandlerId, Handler>>,
    defined: RefCell<HashSet<String>>,
    ids: IdGenerator,
    pending: Pending,
}

impl Runtime {
    pub(crate) fn new(config: SessionConfig, patches: UnboundedSender<Patch>) -> Rc<Self> {
        Rc::new(Self {
            root: Root::with_max_depth(config.max_batch_depth),
            ids: IdGenerator::new(config.ids),
            config,
            patches,
            callbacks: RefCell::new(HashMap::new()),
            defined: RefCell::new(HashSet::new()),
            pending: Pending::default(),
        })
    }

    pub(crate) fn root(&self) -> &Root {
        &self.root
    }

    pub(crate) fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn pending(&self) -> &Pending {
        &self.pending
    }

    pub(crate) fn patch(&self, patch: Patch) {
        tracing::trace!(patch = patch.name(), "emit");
        if self.patches.send(patch).is_err() {
            tracing::trace!("patch consumer gone, dropping patch");
        }
    }

    pub(crate) fn dom_id(&self) -> DomId {
        DomId::new(self.ids.next('n', self.config.dom_id_len))
    }

    pub(crate) fn handler_id(&self) -> HandlerId {
        HandlerId::new(self.ids.next('h', self.config.handler_id_len))
    }

    pub(crate) fn session_id(&self) -> String {
        self.ids.next('s', self.config.session_id_len)
    }

    /// Register or replace the handler stored under `id`.
    pub(crate) fn register_handler(&self, id: &HandlerId, handler: Handler) {
        self.callbacks.borrow_mut().insert(id.clone(), handler);
    }

    pub(crate) fn unregister_handler(&self, id: &HandlerId) {
        self.callbacks.borrow_mut().remove(id);
    }

    pub(crate) fn handler(&self, id: &str) -> Option<Handler> {
        self.callbacks.borrow().get(&HandlerId::new(id)).cloned()
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Send the definition of `element` unless this session already did.
    pub(crate) fn define(&self, element: &CustomElement) {
        let first = self.defined.borrow_mut().insert(element.name().to_string());
        if first {
            tracing::debug!(name = element.name(), "define custom element");
            self.patch(Patch::DefineCustomElement {
                name: element.name().to_string(),
                template: element.definition_html(),
                stylesheet: element.stylesheet().map(|sheet| sheet.filename().to_string()),
            });
        }
    }
}
