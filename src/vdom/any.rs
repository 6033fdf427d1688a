//! The polymorphic node.
//!
//! [`VAny`] remembers the identity of the content it was started with. New
//! content with the same identity updates the running node in place;
//! anything else stops it and starts a fresh node of the right type in the
//! same child slot.

use super::component::VComponent;
use super::custom_element::VCustomElement;
use super::element::VElement;
use super::fragment::VFragment;
use super::reactive::VReactive;
use super::slot::VSlot;
use super::text::VText;
use super::{Content, Scope};
use crate::descriptor::{Descriptor, Kind};

enum Running {
    Idle,
    Text(VText),
    Element(VElement),
    CustomElement(VCustomElement),
    Component(VComponent),
    Slot(VSlot),
    Reactive(VReactive),
    Fragment(VFragment),
}

impl Running {
    fn start(scope: &Scope, content: Content) -> Self {
        match content {
            Content::Text(text) => Running::Text(VText::start(scope, text)),
            Content::Reactive(reactive) => Running::Reactive(VReactive::start(scope, reactive)),
            Content::Fragment(children) => Running::Fragment(VFragment::start(scope, &children)),
            Content::Descriptor(descriptor) => Self::start_descriptor(scope, descriptor),
        }
    }

    fn start_descriptor(scope: &Scope, descriptor: Descriptor) -> Self {
        match descriptor.kind() {
            Kind::Element(tag) => Running::Element(VElement::start(scope, tag, &descriptor)),
            Kind::CustomElement(element) => {
                Running::CustomElement(VCustomElement::start(scope, element, &descriptor))
            }
            Kind::Component(ty) => Running::Component(VComponent::start(scope, *ty, &descriptor)),
            Kind::Slot => Running::Slot(VSlot::start(scope, &descriptor)),
        }
    }

    /// Update in place, handing the content back if this node cannot take it.
    fn update(&mut self, content: Content) -> Result<(), Content> {
        match (self, content) {
            (Running::Text(node), Content::Text(text)) => node.update(text),
            (Running::Element(node), Content::Descriptor(descriptor)) => node.update(&descriptor),
            (Running::CustomElement(node), Content::Descriptor(descriptor)) => {
                node.update(&descriptor)
            }
            (Running::Component(node), Content::Descriptor(descriptor)) => node.update(&descriptor),
            (Running::Slot(node), Content::Descriptor(descriptor)) => node.update(&descriptor),
            (Running::Reactive(_), Content::Reactive(_)) => {}
            (Running::Fragment(node), Content::Fragment(children)) => node.update(&children),
            (_, content) => return Err(content),
        }
        Ok(())
    }

    fn stop(self) {
        match self {
            Running::Idle => {}
            Running::Text(node) => node.stop(),
            Running::Element(node) => node.stop(),
            Running::CustomElement(node) => node.stop(),
            Running::Component(node) => node.stop(),
            Running::Slot(node) => node.stop(),
            Running::Reactive(node) => node.stop(),
            Running::Fragment(node) => node.stop(),
        }
    }
}

/// A node of whatever type its current content calls for.
pub(crate) struct VAny {
    scope: Scope,
    identity: u64,
    running: Running,
}

impl VAny {
    pub(crate) fn start(scope: Scope, content: Content) -> Self {
        let identity = content.identity();
        let running = Running::start(&scope, content);
        Self {
            scope,
            identity,
            running,
        }
    }

    pub(crate) fn update(&mut self, content: Content) {
        let identity = content.identity();
        let content = if identity == self.identity {
            match self.running.update(content) {
                Ok(()) => return,
                Err(content) => content,
            }
        } else {
            content
        };
        tracing::debug!("content identity changed, replacing node");
        std::mem::replace(&mut self.running, Running::Idle).stop();
        self.identity = identity;
        self.running = Running::start(&self.scope, content);
    }

    pub(crate) fn stop(self) {
        self.running.stop();
    }
}
