//! # spark-rdom
//!
//! Server-rendered reactive component trees for a remote DOM.
//!
//! Components run on the server. Whatever they render is kept as a live
//! node tree, and every change to that tree is streamed to the client as a
//! small DOM mutation ([`Patch`]). The client only applies patches and sends
//! events back.
//!
//! ## Architecture
//!
//! ```text
//! Signal writes → effects → component render → descriptors
//!     → node reconciliation → Patch stream → client
//! client event → Session::dispatch → handler → Signal writes
//! ```
//!
//! ## Modules
//!
//! - [`reactive`] - Signals, computeds, effects, batching
//! - [`descriptor`] - Immutable descriptions of elements, components and slots
//! - [`patch`] - The DOM mutation protocol
//! - [`text_diff`] - Character-level text node edits
//! - [`session`] - One client's node tree, handler registry and message loop
//! - [`config`] - Session configuration
//! - [`error`] - Error types

pub mod config;
pub mod descriptor;
pub mod error;
pub mod patch;
pub mod reactive;
pub mod session;
pub mod text_diff;

mod vdom;

pub use config::{IdStrategy, OffsetUnit, SessionConfig};

pub use descriptor::{
    Child, Children, Component, ComponentContext, ComponentType, CustomElement, Descriptor,
    DescriptorBuilder, EventArgs, Handler, Kind, PropValue, Props, Reactive, StyleSheet,
    component, custom, default_slot, h, slot,
};

pub use error::{ReactiveError, RenderError, SessionError};

pub use patch::{DomId, HandlerId, Patch};

pub use reactive::{CacheState, Computed, Effect, Root, Signal};

pub use session::{Inbound, PatchStream, Session};
