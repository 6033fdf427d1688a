//! Session - one client connection's worth of state.
//!
//! A [`Session`] owns the reactive root, the handler registry and the node
//! tree mounted for one client. Patches come out of the [`PatchStream`]
//! returned by [`Session::new`]; client messages go in through
//! [`Session::dispatch`] (or [`Session::run`], which also sends pings).
//!
//! Sessions are single-threaded. Everything must run inside a
//! `tokio::task::LocalSet`:
//!
//! ```ignore
//! let local = tokio::task::LocalSet::new();
//! local.run_until(async {
//!     let (session, mut patches) = Session::new(SessionConfig::default());
//!     session.mount(component::<App>());
//!     session.settle().await;
//!     while let Some(line) = patches.try_next_line()? {
//!         transport.send(line).await?;
//!     }
//! }).await;
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::SessionConfig;
use crate::descriptor::Children;
use crate::error::SessionError;
use crate::patch::Patch;
use crate::reactive::Root;
use crate::vdom::{Runtime, VRoot};

/// Yields [`Session::settle`] allows before giving up.
const SETTLE_LIMIT: usize = 10_000;

// =============================================================================
// Inbound messages
// =============================================================================

/// A message from the client.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// An event fired on an element with a bound handler.
    Callback { id: String, payload: Value },
    /// Answer to a [`Patch::Ping`], echoing its time.
    Pong { time: f64 },
}

impl Inbound {
    /// Parse `["callback", id, payload]` or `["pong", time]`.
    pub fn from_json(line: &str) -> Result<Self, SessionError> {
        let value: Value = serde_json::from_str(line)?;
        let malformed = || SessionError::Malformed(line.to_string());
        let items = value.as_array().ok_or_else(malformed)?;
        match items.first().and_then(Value::as_str) {
            Some("callback") => {
                let id = items.get(1).and_then(Value::as_str).ok_or_else(malformed)?;
                Ok(Inbound::Callback {
                    id: id.to_string(),
                    payload: items.get(2).cloned().unwrap_or(Value::Null),
                })
            }
            Some("pong") => {
                let time = items.get(1).and_then(Value::as_f64).ok_or_else(malformed)?;
                Ok(Inbound::Pong { time })
            }
            _ => Err(malformed()),
        }
    }
}

// =============================================================================
// PatchStream
// =============================================================================

/// Receiving end of a session's patches, in emission order.
pub struct PatchStream {
    rx: mpsc::UnboundedReceiver<Patch>,
}

impl PatchStream {
    /// Next patch. `None` once the session is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<Patch> {
        self.rx.recv().await
    }

    /// Next already-queued patch, if any.
    pub fn try_recv(&mut self) -> Option<Patch> {
        self.rx.try_recv().ok()
    }

    /// Everything queued right now.
    pub fn drain(&mut self) -> Vec<Patch> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Next queued patch as one line of JSON.
    pub fn try_next_line(&mut self) -> Result<Option<String>, SessionError> {
        match self.try_recv() {
            Some(patch) => Ok(Some(patch.to_json_line()?)),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Session
// =============================================================================

pub struct Session {
    id: String,
    runtime: Rc<Runtime>,
    root: RefCell<Option<VRoot>>,
    started: Instant,
}

impl Session {
    pub fn new(config: SessionConfig) -> (Self, PatchStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Runtime::new(config, tx);
        let id = runtime.session_id();
        tracing::info!(session = %id, "session created");
        let session = Self {
            id,
            runtime,
            root: RefCell::new(None),
            started: Instant::now(),
        };
        (session, PatchStream { rx })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The reactive root all of this session's signals live in.
    pub fn root(&self) -> &Root {
        self.runtime.root()
    }

    pub fn config(&self) -> &SessionConfig {
        self.runtime.config()
    }

    /// Render `content` under the session root. The first call creates the
    /// root and mounts synchronously; later calls reconcile asynchronously.
    pub fn mount(&self, content: impl Into<Children>) {
        let children = content.into();
        let mut root = self.root.borrow_mut();
        if let Some(root) = root.as_ref() {
            root.resume(children);
            return;
        }
        *root = Some(VRoot::start(&self.runtime, &children));
    }

    /// Handle one client message.
    pub fn dispatch(&self, message: Inbound) -> Result<(), SessionError> {
        match message {
            Inbound::Callback { id, payload } => self.callback(&id, &payload),
            Inbound::Pong { time } => {
                let latency_ms = self.now_ms() - time;
                tracing::info!(session = %self.id, latency_ms, "pong");
                Ok(())
            }
        }
    }

    /// Run the handler registered under `id` with the event payload. Signal
    /// writes made by the handler are batched.
    pub fn callback(&self, id: &str, payload: &Value) -> Result<(), SessionError> {
        let handler = self
            .runtime
            .handler(id)
            .ok_or_else(|| SessionError::UnknownHandler(id.to_string()))?;
        tracing::debug!(session = %self.id, handler = id, "callback");
        self.runtime.root().batch(|| handler.call(payload))??;
        Ok(())
    }

    /// Queue a ping carrying the session's monotonic clock in milliseconds.
    pub fn ping(&self) {
        self.runtime.patch(Patch::Ping {
            time: self.now_ms(),
        });
    }

    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Number of handlers currently bound on the client.
    pub fn handler_count(&self) -> usize {
        self.runtime.handler_count()
    }

    /// Wait until every node has processed the content sent to it.
    pub async fn settle(&self) {
        for _ in 0..SETTLE_LIMIT {
            if self.runtime.pending().get() == 0 {
                return;
            }
            tokio::task::yield_now().await;
        }
        tracing::warn!(session = %self.id, "session did not settle");
    }

    /// Dispatch inbound messages and send pings until `inbound` closes,
    /// then stop the session.
    pub async fn run(&self, mut inbound: mpsc::UnboundedReceiver<Inbound>) {
        let mut ping = tokio::time::interval(self.runtime.config().ping_interval());
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ping.tick().await;
        loop {
            tokio::select! {
                message = inbound.recv() => match message {
                    Some(message) => {
                        if let Err(err) = self.dispatch(message) {
                            tracing::warn!(session = %self.id, error = %err, "inbound message failed");
                        }
                    }
                    None => break,
                },
                _ = ping.tick() => self.ping(),
            }
        }
        self.stop();
    }

    /// Tear the tree down. Idempotent.
    pub fn stop(&self) {
        let root = self.root.borrow_mut().take();
        if let Some(root) = root {
            tracing::info!(session = %self.id, "session stopped");
            root.stop();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}
