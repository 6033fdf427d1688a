//! Reactive Module - fine-grained signals, derivations and effects.
//!
//! - [`Signal`] - mutable cell
//! - [`Computed`] - memoized derivation, evaluated on read
//! - [`Effect`] - side-effecting derivation, evaluated from the root's queue
//! - [`Root`] - owns the tracking context, batching and the effect queue
//!
//! # Pattern: Explicit Root
//!
//! Every node is created against a [`Root`]. The root records which
//! computation is running so reads can subscribe it; nothing is global, so
//! independent sessions never observe each other.
//!
//! ```ignore
//! let root = Root::new();
//! let a = root.signal(1);
//! let b = root.computed({ let a = a.clone(); move || a.get() + 1 });
//! let c = root.computed({ let a = a.clone(); move || a.get() * 2 });
//! let d = Computed::try_new(&root, move || Ok(b.get()? + c.get()?));
//!
//! a.set(5)?;          // d's body runs once on the next read
//! assert_eq!(d.get()?, 16);
//! ```
//!
//! # Batching and the depth bound
//!
//! [`Root::batch`] coalesces writes; effects flush once the outermost batch
//! body returns, draining until the queue is empty. Writes made by effects
//! while flushing open nested batches that flush eagerly, so an effect that
//! keeps re-triggering itself recurses until the depth bound
//! ([`DEFAULT_MAX_BATCH_DEPTH`](crate::config::DEFAULT_MAX_BATCH_DEPTH))
//! raises [`ReactiveError::CycleDetected`](crate::ReactiveError::CycleDetected).
//! The bound is a liveness net, not a cycle proof.

mod computed;
mod node;
mod effect;
mod root;
mod signal;

pub use computed::Computed;
pub use node::CacheState;
pub use effect::Effect;
pub use root::Root;
pub use signal::Signal;
