//! Patch protocol - mutation records for the remote DOM.
//!
//! Every record serializes as a JSON array whose first element is the
//! record's type name followed by its positional fields:
//!
//! ```text
//! ["CreateElement","a1B2c","div"]
//! ["InsertBefore",null,"a1B2c",null]
//! ["SetAttribute","a1B2c",null,"class","card"]
//! ```
//!
//! Records are newline-delimited on the wire (see [`Patch::to_json_line`]).

use std::fmt;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

// =============================================================================
// Ids
// =============================================================================

/// Id of a DOM node created by a session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DomId(String);

impl DomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Id under which an event handler is registered with the session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HandlerId(String);

impl HandlerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Patch
// =============================================================================

/// One mutation of the remote DOM.
///
/// `parent_id: None` addresses the session root. `ref_id` on prop patches
/// addresses a named part inside a custom element template; `None` means
/// the element itself.
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    CreateRoot,
    DestroyRoot,
    CreateElement {
        id: DomId,
        tag: String,
    },
    CreateTextNode {
        id: DomId,
        content: String,
    },
    /// Insert `id` under `parent_id` before `ref_id` (append when `None`).
    InsertBefore {
        parent_id: Option<DomId>,
        id: DomId,
        ref_id: Option<DomId>,
    },
    RemoveChild {
        parent_id: Option<DomId>,
        id: DomId,
    },
    /// Forget a node on the client. Sent after it was removed from its parent.
    RemoveNode {
        id: DomId,
    },
    DefineCustomElement {
        name: String,
        template: String,
        stylesheet: Option<String>,
    },
    /// Order the children of `parent_id` (within `slot`) as `ids`.
    AssignSlot {
        parent_id: Option<DomId>,
        slot: Option<String>,
        ids: Vec<DomId>,
    },
    SetAttribute {
        parent_id: DomId,
        ref_id: Option<String>,
        name: String,
        value: String,
    },
    RemoveAttribute {
        parent_id: DomId,
        ref_id: Option<String>,
        name: String,
    },
    SetHandler {
        parent_id: DomId,
        ref_id: Option<String>,
        event: String,
        handler_id: HandlerId,
    },
    RemoveHandler {
        parent_id: DomId,
        ref_id: Option<String>,
        event: String,
        handler_id: HandlerId,
    },
    SetCssProperty {
        parent_id: DomId,
        ref_id: Option<String>,
        name: String,
        value: String,
    },
    RemoveCssProperty {
        parent_id: DomId,
        ref_id: Option<String>,
        name: String,
    },
    SetTextContent {
        id: DomId,
        content: String,
    },
    InsertData {
        id: DomId,
        offset: usize,
        data: String,
    },
    DeleteData {
        id: DomId,
        offset: usize,
        count: usize,
    },
    ReplaceData {
        id: DomId,
        offset: usize,
        count: usize,
        data: String,
    },
    /// Keepalive carrying a monotonic timestamp in milliseconds.
    Ping {
        time: f64,
    },
}

impl Patch {
    /// Wire type name.
    pub fn name(&self) -> &'static str {
        match self {
            Patch::CreateRoot => "CreateRoot",
            Patch::DestroyRoot => "DestroyRoot",
            Patch::CreateElement { .. } => "CreateElement",
            Patch::CreateTextNode { .. } => "CreateTextNode",
            Patch::InsertBefore { .. } => "InsertBefore",
            Patch::RemoveChild { .. } => "RemoveChild",
            Patch::RemoveNode { .. } => "RemoveNode",
            Patch::DefineCustomElement { .. } => "DefineCustomElement",
            Patch::AssignSlot { .. } => "AssignSlot",
            Patch::SetAttribute { .. } => "SetAttribute",
            Patch::RemoveAttribute { .. } => "RemoveAttribute",
            Patch::SetHandler { .. } => "SetHandler",
            Patch::RemoveHandler { .. } => "RemoveHandler",
            Patch::SetCssProperty { .. } => "SetCSSProperty",
            Patch::RemoveCssProperty { .. } => "RemoveCSSProperty",
            Patch::SetTextContent { .. } => "SetTextContent",
            Patch::InsertData { .. } => "InsertData",
            Patch::DeleteData { .. } => "DeleteData",
            Patch::ReplaceData { .. } => "ReplaceData",
            Patch::Ping { .. } => "Ping",
        }
    }

    /// DOM ids this patch refers to.
    pub fn dom_ids(&self) -> Vec<&DomId> {
        match self {
            Patch::CreateRoot | Patch::DestroyRoot | Patch::DefineCustomElement { .. } => vec![],
            Patch::Ping { .. } => vec![],
            Patch::CreateElement { id, .. }
            | Patch::CreateTextNode { id, .. }
            | Patch::RemoveNode { id }
            | Patch::SetTextContent { id, .. }
            | Patch::InsertData { id, .. }
            | Patch::DeleteData { id, .. }
            | Patch::ReplaceData { id, .. } => vec![id],
            Patch::InsertBefore { parent_id, id, ref_id } => {
                parent_id.iter().chain([id]).chain(ref_id.iter()).collect()
            }
            Patch::RemoveChild { parent_id, id } => parent_id.iter().chain([id]).collect(),
            Patch::AssignSlot { parent_id, ids, .. } => parent_id.iter().chain(ids.iter()).collect(),
            Patch::SetAttribute { parent_id, .. }
            | Patch::RemoveAttribute { parent_id, .. }
            | Patch::SetHandler { parent_id, .. }
            | Patch::RemoveHandler { parent_id, .. }
            | Patch::SetCssProperty { parent_id, .. }
            | Patch::RemoveCssProperty { parent_id, .. } => vec![parent_id],
        }
    }

    /// Serialize as one newline-terminated JSON record.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

impl Serialize for Patch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        seq.serialize_element(self.name())?;
        match self {
            Patch::CreateRoot | Patch::DestroyRoot => {}
            Patch::CreateElement { id, tag } => {
                seq.serialize_element(id)?;
                seq.serialize_element(tag)?;
            }
            Patch::CreateTextNode { id, content } | Patch::SetTextContent { id, content } => {
                seq.serialize_element(id)?;
                seq.serialize_element(content)?;
            }
            Patch::InsertBefore { parent_id, id, ref_id } => {
                seq.serialize_element(parent_id)?;
                seq.serialize_element(id)?;
                seq.serialize_element(ref_id)?;
            }
            Patch::RemoveChild { parent_id, id } => {
                seq.serialize_element(parent_id)?;
                seq.serialize_element(id)?;
            }
            Patch::RemoveNode { id } => seq.serialize_element(id)?,
            Patch::DefineCustomElement {
                name,
                template,
                stylesheet,
            } => {
                seq.serialize_element(name)?;
                seq.serialize_element(template)?;
                seq.serialize_element(stylesheet)?;
            }
            Patch::AssignSlot { parent_id, slot, ids } => {
                seq.serialize_element(parent_id)?;
                seq.serialize_element(slot)?;
                seq.serialize_element(ids)?;
            }
            Patch::SetAttribute {
                parent_id,
                ref_id,
                name,
                value,
            }
            | Patch::SetCssProperty {
                parent_id,
                ref_id,
                name,
                value,
            } => {
                seq.serialize_element(parent_id)?;
                seq.serialize_element(ref_id)?;
                seq.serialize_element(name)?;
                seq.serialize_element(value)?;
            }
            Patch::RemoveAttribute {
                parent_id,
                ref_id,
                name,
            }
            | Patch::RemoveCssProperty {
                parent_id,
                ref_id,
                name,
            } => {
                seq.serialize_element(parent_id)?;
                seq.serialize_element(ref_id)?;
                seq.serialize_element(name)?;
            }
            Patch::SetHandler {
                parent_id,
                ref_id,
                event,
                handler_id,
            }
            | Patch::RemoveHandler {
                parent_id,
                ref_id,
                event,
                handler_id,
            } => {
                seq.serialize_element(parent_id)?;
                seq.serialize_element(ref_id)?;
                seq.serialize_element(event)?;
                seq.serialize_element(handler_id)?;
            }
            Patch::InsertData { id, offset, data } => {
                seq.serialize_element(id)?;
                seq.serialize_element(offset)?;
                seq.serialize_element(data)?;
            }
            Patch::DeleteData { id, offset, count } => {
                seq.serialize_element(id)?;
                seq.serialize_element(offset)?;
                seq.serialize_element(count)?;
            }
            Patch::ReplaceData {
                id,
                offset,
                count,
                data,
            } => {
                seq.serialize_element(id)?;
                seq.serialize_element(offset)?;
                seq.serialize_element(count)?;
                seq.serialize_element(data)?;
            }
            Patch::Ping { time } => seq.serialize_element(time)?,
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(s: &str) -> DomId {
        DomId::new(s)
    }

    #[test]
    fn test_unit_records() {
        assert_eq!(serde_json::to_value(Patch::CreateRoot).unwrap(), json!(["CreateRoot"]));
        assert_eq!(serde_json::to_value(Patch::DestroyRoot).unwrap(), json!(["DestroyRoot"]));
    }

    #[test]
    fn test_positional_fields() {
        let insert = Patch::InsertBefore {
            parent_id: None,
            id: id("abcde"),
            ref_id: None,
        };
        assert_eq!(serde_json::to_value(&insert).unwrap(), json!(["InsertBefore", null, "abcde", null]));

        let css = Patch::SetCssProperty {
            parent_id: id("p"),
            ref_id: Some("header".into()),
            name: "font-size".into(),
            value: "12px".into(),
        };
        assert_eq!(
            serde_json::to_value(&css).unwrap(),
            json!(["SetCSSProperty", "p", "header", "font-size", "12px"])
        );

        let slot = Patch::AssignSlot {
            parent_id: None,
            slot: Some("children".into()),
            ids: vec![id("a"), id("b")],
        };
        assert_eq!(
            serde_json::to_value(&slot).unwrap(),
            json!(["AssignSlot", null, "children", ["a", "b"]])
        );

        let replace = Patch::ReplaceData {
            id: id("t"),
            offset: 3,
            count: 2,
            data: "xy".into(),
        };
        assert_eq!(serde_json::to_value(&replace).unwrap(), json!(["ReplaceData", "t", 3, 2, "xy"]));
    }

    #[test]
    fn test_json_line() {
        let line = Patch::RemoveNode { id: id("n1") }.to_json_line().unwrap();
        assert_eq!(line, "[\"RemoveNode\",\"n1\"]\n");
    }

    #[test]
    fn test_dom_ids() {
        let patch = Patch::InsertBefore {
            parent_id: Some(id("p")),
            id: id("c"),
            ref_id: None,
        };
        assert_eq!(patch.dom_ids(), vec![&id("p"), &id("c")]);
        assert!(Patch::Ping { time: 1.0 }.dom_ids().is_empty());
    }
}
