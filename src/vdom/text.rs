use super::Scope;
use crate::patch::{DomId, Patch};
use crate::text_diff;

/// A DOM text node.
pub(crate) struct VText {
    scope: Scope,
    id: DomId,
    content: String,
}

impl VText {
    pub(crate) fn start(scope: &Scope, content: String) -> Self {
        let id = scope.runtime.dom_id();
        scope.runtime.patch(Patch::CreateTextNode {
            id: id.clone(),
            content: content.clone(),
        });
        scope.mount.mount(&id);
        Self {
            scope: scope.clone(),
            id,
            content,
        }
    }

    /// Send the character-level edits from the old content to `content`.
    pub(crate) fn update(&mut self, content: String) {
        let unit = self.scope.runtime.config().text_offsets;
        for patch in text_diff::diff(&self.id, &self.content, &content, unit) {
            self.scope.runtime.patch(patch);
        }
        self.content = content;
    }

    pub(crate) fn stop(self) {
        self.scope.mount.unmount(&self.id);
        self.scope.runtime.patch(Patch::RemoveNode { id: self.id });
    }
}
