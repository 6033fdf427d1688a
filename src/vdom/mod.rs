//! VDom Module - the live node tree behind a session.
//!
//! Every mounted descriptor becomes a node that owns its remote DOM node
//! (if any) and translates changes into [`Patch`](crate::patch::Patch)es:
//!
//! - [`VAny`](any::VAny) - dispatches content to the node type matching its identity
//! - `VText`, `VElement`, `VCustomElement` - nodes backed by a DOM node
//! - `VComponent`, `VSlot`, `VReactive` - nodes that render other content from an effect
//! - `VFragment` - a nested child group spliced into its parent
//! - [`Group`](children::Group) - identity-based reconciliation of an ordered child list
//!
//! # Scheduling
//!
//! Each child node runs in its own local task ([`NodeTask`](task::NodeTask))
//! and receives new content through a single-slot [`Mailbox`](mailbox::Mailbox):
//! when a parent re-renders several times before the child gets to run, the
//! child only sees the last version. Node start-up and teardown are
//! synchronous, so creation and removal patches come out in tree order.
//!
//! Children are mounted with `InsertBefore(parent, id, None)`; their final
//! order is sent separately as one `AssignSlot` per parent once all pending
//! reorders of that parent were coalesced.

mod any;
mod children;
mod component;
mod custom_element;
mod driven;
mod element;
mod fragment;
mod mailbox;
mod props;
mod reactive;
mod root;
mod runtime;
mod slot;
mod task;
mod text;

use std::rc::Rc;

use crate::descriptor::{Child, Children, Descriptor, Reactive, fragment_identity, text_identity};

pub(crate) use root::VRoot;
pub(crate) use runtime::Runtime;

use children::ChildSlot;
use component::SlotScope;

/// Where a node lives: its session, its place in the parent's child list and
/// the slots of the closest enclosing component.
#[derive(Clone)]
pub(crate) struct Scope {
    pub(crate) runtime: Rc<Runtime>,
    pub(crate) mount: Rc<ChildSlot>,
    pub(crate) slots: Option<Rc<SlotScope>>,
}

/// What a single node renders.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Content {
    Text(String),
    Descriptor(Descriptor),
    Reactive(Reactive),
    Fragment(Children),
}

impl Content {
    /// Collapse a rendered child list: nothing renders as empty text and a
    /// single child renders as itself.
    pub(crate) fn from_children(children: Children) -> Self {
        if children.len() > 1 {
            return Content::Fragment(children);
        }
        match children.into_iter().next() {
            Some(child) => Content::from(child),
            None => Content::Text(String::new()),
        }
    }

    pub(crate) fn identity(&self) -> u64 {
        match self {
            Content::Text(_) => text_identity(),
            Content::Descriptor(descriptor) => descriptor.identity(),
            Content::Reactive(reactive) => reactive.identity(),
            Content::Fragment(_) => fragment_identity(),
        }
    }
}

impl From<Child> for Content {
    fn from(child: Child) -> Self {
        match child {
            Child::Descriptor(descriptor) => Content::Descriptor(descriptor),
            Child::Text(text) => Content::Text(text),
            Child::Reactive(reactive) => Content::Reactive(reactive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::h;

    #[test]
    fn test_from_children_collapses() {
        assert_eq!(Content::from_children(Children::new()), Content::Text(String::new()));
        assert_eq!(Content::from_children(Children::from("hi")), Content::Text("hi".into()));
        assert!(matches!(
            Content::from_children(Children::from(h("p"))),
            Content::Descriptor(_)
        ));
        assert!(matches!(
            Content::from_children(Children::from(vec!["a", "b"])),
            Content::Fragment(children) if children.len() == 2
        ));
    }

    #[test]
    fn test_text_and_fragment_identities_differ() {
        let text = Content::Text("a".into());
        let fragment = Content::Fragment(Children::from(vec!["a", "b"]));
        assert_ne!(text.identity(), fragment.identity());
        assert_eq!(text.identity(), Content::Text("b".into()).identity());
    }
}
