//! Node tasks.
//!
//! A [`NodeTask`] owns one child node. The node starts synchronously in the
//! caller so its creation patches keep tree order; later content arrives
//! through the mailbox and is applied by a local task. Stopping is
//! synchronous too.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::task::JoinHandle;

use super::any::VAny;
use super::mailbox::Mailbox;
use super::{Content, Scope};

pub(crate) struct NodeTask {
    mailbox: Rc<Mailbox<Content>>,
    node: Rc<RefCell<Option<VAny>>>,
    join: JoinHandle<()>,
}

impl NodeTask {
    /// Start a node for `content` and spawn its update loop.
    ///
    /// Must be called inside the session's `LocalSet`.
    pub(crate) fn spawn(scope: Scope, content: Content) -> Self {
        let mailbox = Rc::new(Mailbox::new(scope.runtime.pending().clone()));
        let node = Rc::new(RefCell::new(Some(VAny::start(scope, content))));
        let join = tokio::task::spawn_local({
            let mailbox = mailbox.clone();
            let node = node.clone();
            async move {
                while let Some(content) = mailbox.recv().await {
                    // Take the node out while it updates: updates may stop
                    // or start other nodes synchronously.
                    let Some(mut current) = node.borrow_mut().take() else {
                        break;
                    };
                    current.update(content);
                    if mailbox.is_closed() {
                        current.stop();
                        break;
                    }
                    *node.borrow_mut() = Some(current);
                }
            }
        });
        Self {
            mailbox,
            node,
            join,
        }
    }

    /// Deliver new content. Unread content is replaced.
    pub(crate) fn resume(&self, content: Content) {
        self.mailbox.send(content);
    }

    /// Abort the update loop and tear the node down.
    pub(crate) fn stop(&self) {
        self.join.abort();
        self.mailbox.close();
        let node = self.node.borrow_mut().take();
        if let Some(node) = node {
            node.stop();
        }
    }
}

impl Drop for NodeTask {
    fn drop(&mut self) {
        self.stop();
    }
}
