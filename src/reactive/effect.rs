//! Effect - derivation run for its side effects.

use std::fmt;
use std::rc::Rc;

use super::node::{Body, Flags, ReactiveCore};
use super::root::Root;
use crate::error::ReactiveError;

/// A computation run eagerly on creation and again from the root's queue
/// whenever one of its sources changes.
///
/// Dropping the handle disposes the effect.
///
/// # Example
///
/// ```ignore
/// let title = root.signal("Hello".to_string());
/// let _log = Effect::new(&root, {
///     let title = title.clone();
///     move || {
///         tracing::info!(title = %title.get(), "title changed");
///         Ok(())
///     }
/// })?;
/// ```
pub struct Effect {
    core: Rc<ReactiveCore>,
}

impl Effect {
    /// Create and run the effect. An error from the first run disposes it
    /// and is returned.
    pub fn new(
        root: &Root,
        f: impl Fn() -> Result<(), ReactiveError> + 'static,
    ) -> Result<Self, ReactiveError> {
        let body: Body = Rc::new(move || f().map(|()| false));
        let effect = Self {
            core: ReactiveCore::new(root.inner(), Some(body), Flags::EFFECT),
        };
        effect.core.update()?;
        Ok(effect)
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        self.core.dispose();
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.core.id())
            .field("state", &self.core.state())
            .finish()
    }
}
