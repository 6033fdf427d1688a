use std::cell::RefCell;
use std::rc::Rc;

use super::task::NodeTask;
use super::{Content, Scope};
use crate::descriptor::Children;
use crate::reactive::Effect;

/// A single child rendered from inside an effect.
///
/// The effect re-runs `render` whenever something it read changes and
/// hands the result to the child node. `render` returning `None` keeps the
/// current child.
pub(crate) struct Driven {
    child: Rc<RefCell<Option<NodeTask>>>,
    effect: Option<Effect>,
}

impl Driven {
    pub(crate) fn start(
        scope: Scope,
        what: &'static str,
        render: impl Fn() -> Option<Children> + 'static,
    ) -> Self {
        let child: Rc<RefCell<Option<NodeTask>>> = Rc::default();
        let root = scope.runtime.root().clone();
        let effect = Effect::new(&root, {
            let child = child.clone();
            let root = root.clone();
            move || {
                let Some(children) = render() else {
                    return Ok(());
                };
                let content = Content::from_children(children);
                root.untracked(|| deliver(&child, &scope, content));
                Ok(())
            }
        });
        let effect = match effect {
            Ok(effect) => Some(effect),
            Err(err) => {
                tracing::error!(node = what, error = %err, "render effect failed");
                None
            }
        };
        Self { child, effect }
    }

    /// Dispose the effect, then stop the child.
    pub(crate) fn stop(self) {
        drop(self.effect);
        let child = self.child.borrow_mut().take();
        if let Some(child) = child {
            child.stop();
        }
    }
}

fn deliver(child: &RefCell<Option<NodeTask>>, scope: &Scope, content: Content) {
    if let Some(task) = child.borrow().as_ref() {
        task.resume(content);
        return;
    }
    let task = NodeTask::spawn(scope.clone(), content);
    *child.borrow_mut() = Some(task);
}
