//! Single-slot mailboxes.
//!
//! A node only ever cares about the latest input it was sent: a [`Mailbox`]
//! keeps one value and a send overwrites whatever is still unread. The
//! receiver is woken through a `tokio::sync::Notify`.
//!
//! Every unread value is counted in a session-wide [`Pending`] counter, so
//! the session can tell when all queued work has been processed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::sync::Notify;

/// Count of unread mailbox values across a session.
#[derive(Clone, Debug, Default)]
pub(crate) struct Pending(Rc<Cell<usize>>);

impl Pending {
    fn inc(&self) {
        self.0.set(self.0.get() + 1);
    }

    fn dec(&self) {
        self.0.set(self.0.get().saturating_sub(1));
    }

    pub(crate) fn get(&self) -> usize {
        self.0.get()
    }
}

/// Latest-value channel between one sender side and one receiving task.
pub(crate) struct Mailbox<T> {
    slot: RefCell<Option<T>>,
    notify: Notify,
    closed: Cell<bool>,
    pending: Pending,
}

impl<T> Mailbox<T> {
    pub(crate) fn new(pending: Pending) -> Self {
        Self {
            slot: RefCell::new(None),
            notify: Notify::new(),
            closed: Cell::new(false),
            pending,
        }
    }

    /// Store `value`, replacing any unread one.
    pub(crate) fn send(&self, value: T) {
        if self.closed.get() {
            return;
        }
        let replaced = self.slot.borrow_mut().replace(value);
        if replaced.is_none() {
            self.pending.inc();
        }
        self.notify.notify_one();
    }

    fn take(&self) -> Option<T> {
        let value = self.slot.borrow_mut().take();
        if value.is_some() {
            self.pending.dec();
        }
        value
    }

    /// Wait for the next value. `None` once closed.
    pub(crate) async fn recv(&self) -> Option<T> {
        loop {
            if let Some(value) = self.take() {
                return Some(value);
            }
            if self.closed.get() {
                return None;
            }
            self.notify.notified().await;
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Drop any unread value and wake the receiver so it can exit.
    pub(crate) fn close(&self) {
        self.closed.set(true);
        drop(self.take());
        self.notify.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_value_wins() {
        let pending = Pending::default();
        let mailbox = Mailbox::new(pending.clone());
        mailbox.send(1);
        mailbox.send(2);
        mailbox.send(3);
        assert_eq!(pending.get(), 1, "overwrites are not counted twice");
        assert_eq!(mailbox.recv().await, Some(3));
        assert_eq!(pending.get(), 0);
    }

    #[tokio::test]
    async fn test_close_discards_and_ends() {
        let pending = Pending::default();
        let mailbox = Mailbox::new(pending.clone());
        mailbox.send("stale");
        mailbox.close();
        assert_eq!(pending.get(), 0);
        assert_eq!(mailbox.recv().await, None);
        mailbox.send("ignored");
        assert_eq!(pending.get(), 0);
    }

    #[tokio::test]
    async fn test_receiver_wakes_on_send() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let mailbox = Rc::new(Mailbox::new(Pending::default()));
                let receiver = tokio::task::spawn_local({
                    let mailbox = mailbox.clone();
                    async move { mailbox.recv().await }
                });
                tokio::task::yield_now().await;
                mailbox.send(7);
                assert_eq!(receiver.await.unwrap(), Some(7));
            })
            .await;
    }
}
