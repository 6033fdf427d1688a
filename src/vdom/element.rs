use std::rc::Rc;

use super::Scope;
use super::children::{Group, Target};
use super::props::{PropTarget, VProps};
use crate::descriptor::Descriptor;
use crate::patch::{DomId, Patch};

/// A plain DOM element with props and a child group.
pub(crate) struct VElement {
    scope: Scope,
    id: DomId,
    props: VProps,
    children: Rc<Group>,
}

impl VElement {
    pub(crate) fn start(scope: &Scope, tag: &str, descriptor: &Descriptor) -> Self {
        let runtime = &scope.runtime;
        let id = runtime.dom_id();
        runtime.patch(Patch::CreateElement {
            id: id.clone(),
            tag: tag.to_string(),
        });
        let props = VProps::start(PropTarget::new(runtime, &id, None), descriptor.props());
        let children = Group::new(
            runtime,
            Target::Dom {
                parent_id: Some(id.clone()),
                slot: None,
            },
            scope.slots.clone(),
        );
        children.update(descriptor.children());
        scope.mount.mount(&id);
        Self {
            scope: scope.clone(),
            id,
            props,
            children,
        }
    }

    pub(crate) fn update(&mut self, descriptor: &Descriptor) {
        self.props.update(descriptor.props());
        self.children.update(descriptor.children());
    }

    /// Children first, then props, then the element itself.
    pub(crate) fn stop(self) {
        self.children.stop();
        self.props.stop();
        self.scope.mount.unmount(&self.id);
        self.scope.runtime.patch(Patch::RemoveNode { id: self.id });
    }
}
