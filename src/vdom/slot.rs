use super::Scope;
use super::driven::Driven;
use crate::descriptor::{Children, Descriptor, PropValue, SLOT_NAME_PROP};
use crate::reactive::Signal;

fn slot_name(descriptor: &Descriptor) -> Option<String> {
    descriptor
        .prop(SLOT_NAME_PROP)
        .and_then(PropValue::as_str)
        .map(str::to_string)
}

/// Outlet rendering the enclosing component's children for one slot.
pub(crate) struct VSlot {
    name: Signal<Option<String>>,
    driven: Driven,
}

impl VSlot {
    pub(crate) fn start(scope: &Scope, descriptor: &Descriptor) -> Self {
        let name = Signal::new(scope.runtime.root(), slot_name(descriptor));
        let slots = scope.slots.clone();
        let inner = Scope {
            runtime: scope.runtime.clone(),
            mount: scope.mount.clone(),
            slots: slots.as_ref().and_then(|slots| slots.outer.clone()),
        };
        let driven = Driven::start(inner, "slot", {
            let name = name.clone();
            move || {
                let name = name.get();
                let Some(scope) = &slots else {
                    tracing::warn!(slot = ?name, "slot outlet outside of a component");
                    return Some(Children::new());
                };
                let children = scope.slots.with(|slots| slots.get(name.as_deref()).cloned());
                Some(children.unwrap_or_else(|| {
                    tracing::warn!(slot = ?name, "could not find slot");
                    Children::new()
                }))
            }
        });
        Self { name, driven }
    }

    pub(crate) fn update(&mut self, descriptor: &Descriptor) {
        if let Err(err) = self.name.set(slot_name(descriptor)) {
            tracing::error!(error = %err, "slot rename failed");
        }
    }

    pub(crate) fn stop(self) {
        self.driven.stop();
    }
}
