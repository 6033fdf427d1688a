use super::Scope;
use super::driven::Driven;
use crate::descriptor::Reactive;

/// Content bound to a signal or computed.
pub(crate) struct VReactive {
    driven: Driven,
}

impl VReactive {
    pub(crate) fn start(scope: &Scope, reactive: Reactive) -> Self {
        let driven = Driven::start(scope.clone(), "reactive", move || match reactive.read() {
            Ok(value) => Some(value.into_children()),
            Err(err) => {
                tracing::error!(reactive = reactive.id(), error = %err, "reactive content failed");
                None
            }
        });
        Self { driven }
    }

    pub(crate) fn stop(self) {
        self.driven.stop();
    }
}
