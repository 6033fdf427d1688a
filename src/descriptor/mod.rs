//! Descriptor Module - immutable descriptions of what should be rendered.
//!
//! - [`Descriptor`] - one element, component, custom element or slot outlet
//! - [`Children`] / [`Child`] - normalized child lists
//! - [`PropValue`] / [`Props`] - attribute, style, handler and reactive values
//! - [`Reactive`] - type-erased signal or computed used as content
//! - [`Handler`] / [`EventArgs`] - event callbacks with structural payload filtering
//! - [`Component`] / [`ComponentContext`] - server-side components
//! - [`CustomElement`] - template-backed custom elements
//!
//! # Identity
//!
//! Every descriptor carries an identity hash over its kind, key and slot
//! (and the `type` prop of `<input>`). Children and other props are left
//! out: two descriptors with the same identity render into the same live
//! node, which is then updated in place.
//!
//! # Building descriptors
//!
//! ```ignore
//! let list = h("ul")
//!     .attr("class", "todos")
//!     .children(todos.iter().map(|todo| h("li").key(&todo.id).child(&todo.title)));
//!
//! let page = component::<TodoApp>()
//!     .prop("title", "Todos")
//!     .child(h("p").slot("footer").child("made with rdom"));
//! ```

mod children;
mod component;
mod custom_element;
mod handler;
mod props;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub use children::{Child, Children, Reactive};
pub use component::{Component, ComponentContext, ComponentType};
pub use custom_element::{CustomElement, ROOT_ELEMENT, StyleSheet};
pub use handler::{EventArgs, Handler, HandlerFn};
pub use props::{PropValue, Props};

pub(crate) use children::{fragment_identity, hash_of, text_identity};
pub(crate) use custom_element::{ref_props, slot_contents};

/// Prop naming the slot a slot outlet renders.
pub(crate) const SLOT_NAME_PROP: &str = "name";

// =============================================================================
// Kind
// =============================================================================

/// What a descriptor renders as.
#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    /// A plain DOM element by tag name.
    Element(String),
    Component(ComponentType),
    CustomElement(Rc<CustomElement>),
    /// Outlet for the enclosing component's slotted children.
    Slot,
}

// =============================================================================
// Descriptor
// =============================================================================

#[derive(Debug, PartialEq)]
struct DescriptorData {
    kind: Kind,
    key: Option<String>,
    slot: Option<String>,
    children: Children,
    props: Props,
    identity: u64,
}

/// Immutable description of one node.
///
/// Cheap to clone (shared). Equality is structural.
#[derive(Clone)]
pub struct Descriptor(Rc<DescriptorData>);

fn compute_identity(kind: &Kind, key: Option<&str>, slot: Option<&str>, props: &Props) -> u64 {
    let input_type = match kind {
        Kind::Element(tag) if tag == "input" => props.get("type").map(PropValue::to_text),
        _ => None,
    };
    match kind {
        Kind::Element(tag) => hash_of(("element", tag, key, slot, input_type)),
        Kind::Component(ty) => hash_of(("component", ty, key, slot)),
        Kind::CustomElement(element) => hash_of(("custom", element.name(), key, slot)),
        Kind::Slot => hash_of(("slot", key, slot)),
    }
}

impl Descriptor {
    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }

    pub fn key(&self) -> Option<&str> {
        self.0.key.as_deref()
    }

    /// Name of the component slot this descriptor is assigned to.
    pub fn slot(&self) -> Option<&str> {
        self.0.slot.as_deref()
    }

    pub fn children(&self) -> &Children {
        &self.0.children
    }

    pub fn props(&self) -> &Props {
        &self.0.props
    }

    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.0.props.get(name)
    }

    pub fn identity(&self) -> u64 {
        self.0.identity
    }

    /// Copy with different children. Identity is unchanged.
    pub fn with_children(&self, children: impl Into<Children>) -> Self {
        Self(Rc::new(DescriptorData {
            kind: self.0.kind.clone(),
            key: self.0.key.clone(),
            slot: self.0.slot.clone(),
            children: children.into(),
            props: self.0.props.clone(),
            identity: self.0.identity,
        }))
    }

    /// Copy with props merged over the current ones.
    pub fn with_props(&self, props: Props) -> Self {
        let mut merged = self.0.props.clone();
        merged.extend(props);
        let identity = compute_identity(&self.0.kind, self.key(), self.slot(), &merged);
        Self(Rc::new(DescriptorData {
            kind: self.0.kind.clone(),
            key: self.0.key.clone(),
            slot: self.0.slot.clone(),
            children: self.0.children.clone(),
            props: merged,
            identity,
        }))
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Descriptor");
        out.field("kind", &self.0.kind);
        if let Some(key) = &self.0.key {
            out.field("key", key);
        }
        if let Some(slot) = &self.0.slot {
            out.field("slot", slot);
        }
        out.field("props", &self.0.props)
            .field("children", &self.0.children)
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Descriptor`]. Converts into descriptors, children and prop
/// values, so it can be passed anywhere those are expected.
#[derive(Clone, Debug)]
pub struct DescriptorBuilder {
    kind: Kind,
    key: Option<String>,
    slot: Option<String>,
    children: Children,
    pub(crate) props: Props,
}

/// Start an element descriptor.
pub fn h(tag: impl Into<String>) -> DescriptorBuilder {
    DescriptorBuilder::new(Kind::Element(tag.into()))
}

/// Start a component descriptor.
pub fn component<C: Component>() -> DescriptorBuilder {
    DescriptorBuilder::new(Kind::Component(ComponentType::of::<C>()))
}

/// Start a descriptor for an instance of `element`.
pub fn custom(element: &Rc<CustomElement>) -> DescriptorBuilder {
    element.instance()
}

/// Outlet for the enclosing component's children assigned to slot `name`.
pub fn slot(name: impl Into<String>) -> DescriptorBuilder {
    DescriptorBuilder::new(Kind::Slot).prop(SLOT_NAME_PROP, name.into())
}

/// Outlet for the enclosing component's children without a slot.
pub fn default_slot() -> DescriptorBuilder {
    DescriptorBuilder::new(Kind::Slot)
}

impl DescriptorBuilder {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            key: None,
            slot: None,
            children: Children::new(),
            props: Props::new(),
        }
    }

    pub fn key(mut self, key: impl ToString) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Assign to a named slot of the enclosing component.
    pub fn slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    pub fn child(mut self, child: impl Into<Children>) -> Self {
        self.children.extend(child);
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Children>,
    {
        for child in children {
            self.children.extend(child);
        }
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Alias of [`prop`](Self::prop) reading better on elements.
    pub fn attr(self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.prop(name, value)
    }

    /// Set one inline style property.
    pub fn style(mut self, property: impl Into<String>, value: impl Into<PropValue>) -> Self {
        let styles = self
            .props
            .entry("style".to_string())
            .or_insert_with(|| PropValue::Map(BTreeMap::new()));
        if !matches!(styles, PropValue::Map(_)) {
            *styles = PropValue::Map(BTreeMap::new());
        }
        if let PropValue::Map(styles) = styles {
            styles.insert(property.into(), value.into());
        }
        self
    }

    /// Attach a handler for `event` (stored as the `on<event>` prop).
    pub fn on(self, event: &str, handler: Handler) -> Self {
        let name = if event.starts_with("on") {
            event.to_string()
        } else {
            format!("on{event}")
        };
        self.prop(name, handler)
    }

    pub fn build(self) -> Descriptor {
        let identity = compute_identity(
            &self.kind,
            self.key.as_deref(),
            self.slot.as_deref(),
            &self.props,
        );
        Descriptor(Rc::new(DescriptorData {
            kind: self.kind,
            key: self.key,
            slot: self.slot,
            children: self.children,
            props: self.props,
            identity,
        }))
    }
}

impl From<DescriptorBuilder> for Descriptor {
    fn from(builder: DescriptorBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_children_and_props() {
        let a = h("li").key(1).attr("class", "a").child("one").build();
        let b = h("li").key(1).attr("class", "b").child("two").build();
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a, b);
    }

    #[test]
    fn test_identity_covers_kind_key_slot() {
        let base = h("li").key(1).build().identity();
        assert_ne!(base, h("li").key(2).build().identity());
        assert_ne!(base, h("p").key(1).build().identity());
        assert_ne!(base, h("li").key(1).slot("x").build().identity());
        assert_ne!(base, component::<Nothing>().key(1).build().identity());
    }

    #[test]
    fn test_input_type_is_part_of_identity() {
        let text = h("input").attr("type", "text").build();
        let check = h("input").attr("type", "checkbox").build();
        assert_ne!(text.identity(), check.identity());

        let button_a = h("button").attr("type", "submit").build();
        let button_b = h("button").attr("type", "reset").build();
        assert_eq!(button_a.identity(), button_b.identity());
    }

    #[test]
    fn test_style_and_on() {
        let d = h("div")
            .style("font_size", "12px")
            .style("margin", vec!["0", "auto"])
            .on("click", Handler::new(|| Ok(())))
            .build();
        let style = d.prop("style").and_then(PropValue::as_map).unwrap();
        assert_eq!(style.len(), 2);
        assert!(d.prop("onclick").and_then(PropValue::as_handler).is_some());
    }

    #[test]
    fn test_with_children_keeps_identity() {
        let d = h("p").key("k").child("a").build();
        let e = d.with_children("b");
        assert_eq!(d.identity(), e.identity());
        assert_eq!(e.children().text(), "b");
    }

    #[test]
    fn test_slot_outlet() {
        let outlet = slot("header").build();
        assert_eq!(outlet.kind(), &Kind::Slot);
        assert_eq!(outlet.prop(SLOT_NAME_PROP), Some(&PropValue::from("header")));
        assert_eq!(
            outlet.identity(),
            slot("footer").build().identity(),
            "renaming an outlet updates it in place"
        );
    }

    struct Nothing;

    impl Component for Nothing {
        fn create(_cx: &ComponentContext) -> Self {
            Nothing
        }

        fn render(&self, _cx: &ComponentContext) -> Result<Children, crate::error::RenderError> {
            Ok(Children::new())
        }
    }
}
