//! Mounted components.
//!
//! A component has no DOM node of its own: whatever it renders goes into
//! the component's own child slot. Props and slotted children are held in
//! signals, so a parent update only re-renders the component when they
//! actually changed.

use std::collections::BTreeMap;
use std::rc::Rc;

use super::Scope;
use super::driven::Driven;
use crate::descriptor::{Children, ComponentContext, ComponentType, Descriptor, Props};
use crate::reactive::Signal;

/// Children passed to a component, grouped by slot name.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SlotMap(BTreeMap<Option<String>, Children>);

impl SlotMap {
    pub(crate) fn group(children: &Children) -> Self {
        let mut slots: BTreeMap<Option<String>, Children> = BTreeMap::new();
        for child in children {
            slots
                .entry(child.slot().map(str::to_string))
                .or_default()
                .extend(child.clone());
        }
        Self(slots)
    }

    pub(crate) fn get(&self, name: Option<&str>) -> Option<&Children> {
        self.0.get(&name.map(str::to_string))
    }
}

/// Slots visible to the outlets inside one component.
///
/// Slot content was written by the component's parent, so it is rendered
/// with the parent's slots (`outer`).
pub(crate) struct SlotScope {
    pub(crate) slots: Signal<SlotMap>,
    pub(crate) outer: Option<Rc<SlotScope>>,
}

pub(crate) struct VComponent {
    cx: ComponentContext,
    props: Signal<Props>,
    slots: Signal<SlotMap>,
    driven: Driven,
}

impl VComponent {
    pub(crate) fn start(scope: &Scope, ty: ComponentType, descriptor: &Descriptor) -> Self {
        let root = scope.runtime.root().clone();
        let props = Signal::new(&root, descriptor.props().clone());
        let slots = Signal::new(&root, SlotMap::group(descriptor.children()));
        let cx = ComponentContext::new(&root, ty.name(), props.clone());
        let instance = root.untracked(|| ty.instantiate(&cx));
        tracing::debug!(component = ty.name(), "mount component");

        let inner = Scope {
            runtime: scope.runtime.clone(),
            mount: scope.mount.clone(),
            slots: Some(Rc::new(SlotScope {
                slots: slots.clone(),
                outer: scope.slots.clone(),
            })),
        };
        let driven = Driven::start(inner, ty.name(), {
            let cx = cx.clone();
            let instance = instance.clone();
            move || {
                cx.track_rerender();
                match instance.render(&cx) {
                    Ok(children) => Some(children),
                    Err(err) => {
                        tracing::error!(component = cx.name(), error = %err, "render failed");
                        None
                    }
                }
            }
        });
        root.untracked(|| instance.mount(&cx));
        Self {
            cx,
            props,
            slots,
            driven,
        }
    }

    pub(crate) fn update(&mut self, descriptor: &Descriptor) {
        let props = descriptor.props().clone();
        let slots = SlotMap::group(descriptor.children());
        let result = self
            .cx
            .batch(|| {
                self.props.set(props)?;
                self.slots.set(slots)
            })
            .and_then(|inner| inner);
        if let Err(err) = result {
            tracing::error!(component = self.cx.name(), error = %err, "component update failed");
        }
    }

    pub(crate) fn stop(self) {
        tracing::debug!(component = self.cx.name(), "unmount component");
        self.driven.stop();
        self.cx.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::h;

    #[test]
    fn test_slot_map_groups_by_slot() {
        let children = Children::from(vec![
            Children::from(h("h1").slot("header")),
            Children::from("body"),
            Children::from(h("p")),
            Children::from(h("small").slot("footer")),
        ]);
        let slots = SlotMap::group(&children);
        assert_eq!(slots.get(Some("header")).map(Children::len), Some(1));
        assert_eq!(slots.get(None).map(Children::len), Some(2));
        assert_eq!(slots.get(Some("footer")).map(Children::len), Some(1));
        assert!(slots.get(Some("missing")).is_none());
    }
}
