//! Event handlers.
//!
//! A [`Handler`] declares the payload fields it accepts. When the client
//! reports an event, only fields present in both the payload and the
//! declaration are passed through, so handlers never see fields they did not
//! ask for and missing fields are simply absent.

use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::ReactiveError;

/// Handler callback type (Rc so descriptors stay cheap to clone).
pub type HandlerFn = Rc<dyn Fn(&EventArgs) -> Result<(), ReactiveError>>;

/// An event handler attached to an element prop such as `onclick`.
#[derive(Clone)]
pub struct Handler {
    params: Rc<[String]>,
    f: HandlerFn,
}

impl Handler {
    /// Handler that ignores the payload.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let count = cx.signal(0);
    /// let increment = Handler::new({
    ///     let count = count.clone();
    ///     move || count.update(|n| n + 1)
    /// });
    /// ```
    pub fn new(f: impl Fn() -> Result<(), ReactiveError> + 'static) -> Self {
        Self {
            params: Rc::from(Vec::new()),
            f: Rc::new(move |_| f()),
        }
    }

    /// Handler receiving the named payload fields.
    ///
    /// ```ignore
    /// Handler::with_args(&["target"], move |args| {
    ///     value.set(args.target_value().unwrap_or_default().to_string())
    /// })
    /// ```
    pub fn with_args(
        params: &[&str],
        f: impl Fn(&EventArgs) -> Result<(), ReactiveError> + 'static,
    ) -> Self {
        Self {
            params: params.iter().map(|p| p.to_string()).collect(),
            f: Rc::new(f),
        }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Invoke with a raw payload, filtered down to the declared fields.
    pub fn call(&self, payload: &Value) -> Result<(), ReactiveError> {
        let args = EventArgs::filtered(payload, &self.params);
        (self.f)(&args)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.f, &other.f)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("params", &self.params).finish()
    }
}

// =============================================================================
// EventArgs
// =============================================================================

/// Payload fields passed to a handler.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventArgs(Map<String, Value>);

impl EventArgs {
    fn filtered(payload: &Value, params: &[String]) -> Self {
        let Some(fields) = payload.as_object() else {
            return Self::default();
        };
        Self(
            fields
                .iter()
                .filter(|(name, _)| params.iter().any(|p| p == *name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name)?.as_str()
    }

    /// The `type` field (`"click"`, `"input"`, ...).
    pub fn event_type(&self) -> Option<&str> {
        self.str("type")
    }

    /// The `target.value` field of input-like events.
    pub fn target_value(&self) -> Option<&str> {
        self.0.get("target")?.get("value")?.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
