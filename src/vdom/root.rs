use std::rc::Rc;

use tokio::task::JoinHandle;

use super::children::{Group, Target};
use super::mailbox::Mailbox;
use super::runtime::Runtime;
use crate::descriptor::{Children, CustomElement};
use crate::patch::Patch;

/// Name of the slot of the root element holding the session's children.
const ROOT_SLOT: &str = "children";

/// The session root: the `rdom-root` element and its child group.
pub(crate) struct VRoot {
    runtime: Rc<Runtime>,
    mailbox: Rc<Mailbox<Children>>,
    group: Rc<Group>,
    task: JoinHandle<()>,
}

impl VRoot {
    /// Mount `children` under a fresh root. Must run inside a `LocalSet`.
    pub(crate) fn start(runtime: &Rc<Runtime>, children: &Children) -> Self {
        runtime.define(&CustomElement::root());
        runtime.patch(Patch::CreateRoot);
        let group = Group::new(
            runtime,
            Target::Dom {
                parent_id: None,
                slot: Some(ROOT_SLOT.to_string()),
            },
            None,
        );
        group.update(children);

        let mailbox = Rc::new(Mailbox::new(runtime.pending().clone()));
        let task = tokio::task::spawn_local({
            let mailbox = mailbox.clone();
            let group = group.clone();
            async move {
                while let Some(children) = mailbox.recv().await {
                    group.update(&children);
                }
            }
        });
        Self {
            runtime: runtime.clone(),
            mailbox,
            group,
            task,
        }
    }

    pub(crate) fn resume(&self, children: Children) {
        self.mailbox.send(children);
    }

    pub(crate) fn stop(self) {
        self.task.abort();
        self.mailbox.close();
        self.group.stop();
        self.runtime.patch(Patch::DestroyRoot);
    }
}
