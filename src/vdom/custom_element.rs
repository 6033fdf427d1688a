//! Mounted custom elements.
//!
//! The element's template is defined once per session. Each instance fills
//! named template slots with child groups (ordered with `AssignSlot` under
//! the slot name) and applies props to template parts addressed by ref.

use std::collections::BTreeMap;
use std::rc::Rc;

use super::Scope;
use super::children::{Group, Target};
use super::props::{PropTarget, VProps};
use crate::descriptor::{Children, CustomElement, Descriptor, Props, ref_props, slot_contents};
use crate::patch::{DomId, Patch};

const RESERVED_PROPS: [&str; 2] = ["slots", "refs"];

fn host_props(props: &Props) -> Props {
    props
        .iter()
        .filter(|(name, _)| !RESERVED_PROPS.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

pub(crate) struct VCustomElement {
    scope: Scope,
    id: DomId,
    attrs: VProps,
    slots: BTreeMap<String, Rc<Group>>,
    refs: BTreeMap<String, VProps>,
}

impl VCustomElement {
    pub(crate) fn start(scope: &Scope, element: &CustomElement, descriptor: &Descriptor) -> Self {
        let runtime = &scope.runtime;
        runtime.define(element);
        let id = runtime.dom_id();
        runtime.patch(Patch::CreateElement {
            id: id.clone(),
            tag: element.name().to_string(),
        });
        let attrs = VProps::start(
            PropTarget::new(runtime, &id, None),
            &host_props(descriptor.props()),
        );
        let mut node = Self {
            scope: scope.clone(),
            id,
            attrs,
            slots: BTreeMap::new(),
            refs: BTreeMap::new(),
        };
        node.update_slots(slot_contents(descriptor.props()));
        node.update_refs(ref_props(descriptor.props()));
        scope.mount.mount(&node.id);
        node
    }

    pub(crate) fn update(&mut self, descriptor: &Descriptor) {
        self.attrs.update(&host_props(descriptor.props()));
        self.update_slots(slot_contents(descriptor.props()));
        self.update_refs(ref_props(descriptor.props()));
    }

    fn update_slots(&mut self, contents: BTreeMap<String, Children>) {
        let removed: Vec<String> = self
            .slots
            .keys()
            .filter(|name| !contents.contains_key(*name))
            .cloned()
            .collect();
        for name in removed {
            if let Some(group) = self.slots.remove(&name) {
                group.stop();
            }
        }
        for (name, children) in contents {
            let group = self.slots.entry(name.clone()).or_insert_with(|| {
                Group::new(
                    &self.scope.runtime,
                    Target::Dom {
                        parent_id: Some(self.id.clone()),
                        slot: Some(name),
                    },
                    self.scope.slots.clone(),
                )
            });
            group.update(&children);
        }
    }

    fn update_refs(&mut self, parts: BTreeMap<String, Props>) {
        let removed: Vec<String> = self
            .refs
            .keys()
            .filter(|name| !parts.contains_key(*name))
            .cloned()
            .collect();
        for name in removed {
            // The part stays in the template: clear what was set on it.
            if let Some(mut part) = self.refs.remove(&name) {
                part.update(&Props::new());
            }
        }
        for (name, props) in parts {
            match self.refs.get_mut(&name) {
                Some(part) => part.update(&props),
                None => {
                    let target = PropTarget::new(&self.scope.runtime, &self.id, Some(&name));
                    self.refs.insert(name, VProps::start(target, &props));
                }
            }
        }
    }

    pub(crate) fn stop(self) {
        for group in self.slots.values().rev() {
            group.stop();
        }
        for part in self.refs.into_values() {
            part.stop();
        }
        self.attrs.stop();
        self.scope.mount.unmount(&self.id);
        self.scope.runtime.patch(Patch::RemoveNode { id: self.id });
    }
}
