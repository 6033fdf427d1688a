use std::rc::Rc;

use super::Scope;
use super::children::{Group, Target};
use crate::descriptor::Children;

/// Several children occupying one slot of the enclosing group.
pub(crate) struct VFragment {
    scope: Scope,
    group: Rc<Group>,
}

impl VFragment {
    pub(crate) fn start(scope: &Scope, children: &Children) -> Self {
        let group = Group::new(
            &scope.runtime,
            Target::Nested(scope.mount.clone()),
            scope.slots.clone(),
        );
        scope.mount.attach(&group);
        group.update(children);
        Self {
            scope: scope.clone(),
            group,
        }
    }

    pub(crate) fn update(&mut self, children: &Children) {
        self.group.update(children);
    }

    pub(crate) fn stop(self) {
        self.group.stop();
        self.scope.mount.detach();
    }
}
