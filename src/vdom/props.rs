//! Props of a DOM element or of a part inside a custom element template.
//!
//! Each prop name is driven by one of three nodes:
//!
//! - handlers (`PropValue::Handler`) are registered under a handler id and
//!   bound with `SetHandler`. A new handler value replaces the registry entry
//!   and sends nothing.
//! - `style` maps are diffed per CSS property.
//! - everything else is an attribute. `true` sets an empty value, `false`
//!   and null remove it.
//!
//! Attribute and style values may be reactive: an effect then keeps the
//! remote value in sync. Underscores in attribute names, style names and
//! style values become hyphens.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::runtime::Runtime;
use crate::descriptor::{Handler, PropValue, Props, Reactive};
use crate::patch::{DomId, HandlerId, Patch};
use crate::reactive::Effect;

const STYLE: &str = "style";

fn dasherize(name: &str) -> String {
    name.replace('_', "-")
}

// =============================================================================
// PropTarget
// =============================================================================

/// The element (or template part) props are applied to.
#[derive(Clone)]
pub(crate) struct PropTarget {
    runtime: Rc<Runtime>,
    parent_id: DomId,
    ref_id: Option<String>,
}

impl PropTarget {
    pub(crate) fn new(runtime: &Rc<Runtime>, parent_id: &DomId, ref_id: Option<&str>) -> Self {
        Self {
            runtime: runtime.clone(),
            parent_id: parent_id.clone(),
            ref_id: ref_id.map(str::to_string),
        }
    }

    fn set_attribute(&self, name: &str, value: &PropValue) {
        let patch = match value {
            PropValue::Null | PropValue::Bool(false) => Patch::RemoveAttribute {
                parent_id: self.parent_id.clone(),
                ref_id: self.ref_id.clone(),
                name: name.to_string(),
            },
            PropValue::Bool(true) => Patch::SetAttribute {
                parent_id: self.parent_id.clone(),
                ref_id: self.ref_id.clone(),
                name: name.to_string(),
                value: String::new(),
            },
            value => Patch::SetAttribute {
                parent_id: self.parent_id.clone(),
                ref_id: self.ref_id.clone(),
                name: name.to_string(),
                value: value.to_text(),
            },
        };
        self.runtime.patch(patch);
    }

    fn remove_attribute(&self, name: &str) {
        self.runtime.patch(Patch::RemoveAttribute {
            parent_id: self.parent_id.clone(),
            ref_id: self.ref_id.clone(),
            name: name.to_string(),
        });
    }

    fn set_css_property(&self, name: &str, value: &str) {
        self.runtime.patch(Patch::SetCssProperty {
            parent_id: self.parent_id.clone(),
            ref_id: self.ref_id.clone(),
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn remove_css_property(&self, name: &str) {
        self.runtime.patch(Patch::RemoveCssProperty {
            parent_id: self.parent_id.clone(),
            ref_id: self.ref_id.clone(),
            name: name.to_string(),
        });
    }

    fn watch(&self, reactive: &Reactive, apply: impl Fn(&PropValue) + 'static) -> Option<Effect> {
        let reactive = reactive.clone();
        let parent_id = self.parent_id.clone();
        let effect = Effect::new(self.runtime.root(), move || {
            match reactive.read() {
                Ok(value) => apply(&value),
                Err(err) => {
                    tracing::error!(parent = %parent_id, error = %err, "reactive prop failed");
                }
            }
            Ok(())
        });
        match effect {
            Ok(effect) => Some(effect),
            Err(err) => {
                tracing::error!(parent = %self.parent_id, error = %err, "reactive prop effect failed");
                None
            }
        }
    }
}

// =============================================================================
// Attributes
// =============================================================================

struct VAttr {
    target: PropTarget,
    name: String,
    value: PropValue,
    effect: Option<Effect>,
}

impl VAttr {
    fn start(target: &PropTarget, name: &str, value: &PropValue) -> Self {
        let mut attr = Self {
            target: target.clone(),
            name: dasherize(name),
            value: PropValue::Null,
            effect: None,
        };
        attr.apply(value);
        attr
    }

    fn update(&mut self, value: &PropValue) {
        if *value != self.value {
            self.apply(value);
        }
    }

    fn apply(&mut self, value: &PropValue) {
        self.effect = None;
        self.value = value.clone();
        match value {
            PropValue::Reactive(reactive) => {
                let target = self.target.clone();
                let name = self.name.clone();
                self.effect = self
                    .target
                    .watch(reactive, move |value| target.set_attribute(&name, value));
            }
            value => self.target.set_attribute(&self.name, value),
        }
    }

    fn stop(self, detaching: bool) {
        drop(self.effect);
        if !detaching {
            self.target.remove_attribute(&self.name);
        }
    }
}

// =============================================================================
// Styles
// =============================================================================

fn style_map(value: &PropValue) -> BTreeMap<String, String> {
    value
        .as_map()
        .map(|styles| {
            styles
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(name, value)| (dasherize(name), dasherize(&value.to_text())))
                .collect()
        })
        .unwrap_or_default()
}

fn apply_styles(
    target: &PropTarget,
    current: &RefCell<BTreeMap<String, String>>,
    next: BTreeMap<String, String>,
) {
    let mut current = current.borrow_mut();
    for name in current.keys() {
        if !next.contains_key(name) {
            target.remove_css_property(name);
        }
    }
    for (name, value) in &next {
        if current.get(name) != Some(value) {
            target.set_css_property(name, value);
        }
    }
    *current = next;
}

struct VStyles {
    target: PropTarget,
    value: PropValue,
    current: Rc<RefCell<BTreeMap<String, String>>>,
    effect: Option<Effect>,
}

impl VStyles {
    fn start(target: &PropTarget, value: &PropValue) -> Self {
        let mut styles = Self {
            target: target.clone(),
            value: PropValue::Null,
            current: Rc::default(),
            effect: None,
        };
        styles.apply(value);
        styles
    }

    fn update(&mut self, value: &PropValue) {
        if *value != self.value {
            self.apply(value);
        }
    }

    fn apply(&mut self, value: &PropValue) {
        self.effect = None;
        self.value = value.clone();
        match value {
            PropValue::Reactive(reactive) => {
                let target = self.target.clone();
                let current = self.current.clone();
                self.effect = self.target.watch(reactive, move |value| {
                    apply_styles(&target, &current, style_map(value));
                });
            }
            value => apply_styles(&self.target, &self.current, style_map(value)),
        }
    }

    fn stop(self, detaching: bool) {
        drop(self.effect);
        if !detaching {
            for name in self.current.borrow().keys() {
                self.target.remove_css_property(name);
            }
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

struct VHandler {
    target: PropTarget,
    event: String,
    id: HandlerId,
}

impl VHandler {
    fn start(target: &PropTarget, event: &str, handler: &Handler) -> Self {
        let runtime = &target.runtime;
        let id = runtime.handler_id();
        runtime.register_handler(&id, handler.clone());
        runtime.patch(Patch::SetHandler {
            parent_id: target.parent_id.clone(),
            ref_id: target.ref_id.clone(),
            event: event.to_string(),
            handler_id: id.clone(),
        });
        Self {
            target: target.clone(),
            event: event.to_string(),
            id,
        }
    }

    fn update(&self, handler: &Handler) {
        self.target.runtime.register_handler(&self.id, handler.clone());
    }

    fn stop(self) {
        let runtime = &self.target.runtime;
        runtime.unregister_handler(&self.id);
        runtime.patch(Patch::RemoveHandler {
            parent_id: self.target.parent_id,
            ref_id: self.target.ref_id,
            event: self.event,
            handler_id: self.id,
        });
    }
}

// =============================================================================
// VProps
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum PropKind {
    Attr,
    Styles,
    Handler,
}

fn classify(name: &str, value: &PropValue) -> PropKind {
    match value {
        PropValue::Handler(_) => PropKind::Handler,
        PropValue::Map(_) | PropValue::Reactive(_) if name == STYLE => PropKind::Styles,
        _ => PropKind::Attr,
    }
}

enum VProp {
    Attr(VAttr),
    Styles(VStyles),
    Handler(VHandler),
}

impl VProp {
    fn start(target: &PropTarget, name: &str, value: &PropValue) -> Self {
        match value {
            PropValue::Handler(handler) => VProp::Handler(VHandler::start(target, name, handler)),
            value if classify(name, value) == PropKind::Styles => {
                VProp::Styles(VStyles::start(target, value))
            }
            value => VProp::Attr(VAttr::start(target, name, value)),
        }
    }

    fn kind(&self) -> PropKind {
        match self {
            VProp::Attr(_) => PropKind::Attr,
            VProp::Styles(_) => PropKind::Styles,
            VProp::Handler(_) => PropKind::Handler,
        }
    }

    fn update(&mut self, value: &PropValue) {
        match (self, value) {
            (VProp::Handler(handler), PropValue::Handler(value)) => handler.update(value),
            (VProp::Styles(styles), value) => styles.update(value),
            (VProp::Attr(attr), value) => attr.update(value),
            (VProp::Handler(_), _) => {}
        }
    }

    fn stop(self, detaching: bool) {
        match self {
            VProp::Attr(attr) => attr.stop(detaching),
            VProp::Styles(styles) => styles.stop(detaching),
            VProp::Handler(handler) => handler.stop(),
        }
    }
}

/// All props applied to one target.
pub(crate) struct VProps {
    target: PropTarget,
    entries: BTreeMap<String, VProp>,
}

impl VProps {
    pub(crate) fn start(target: PropTarget, props: &Props) -> Self {
        let mut vprops = Self {
            target,
            entries: BTreeMap::new(),
        };
        vprops.update(props);
        vprops
    }

    pub(crate) fn update(&mut self, props: &Props) {
        let removed: Vec<String> = self
            .entries
            .keys()
            .filter(|name| !props.contains_key(*name))
            .cloned()
            .collect();
        for name in removed {
            if let Some(prop) = self.entries.remove(&name) {
                prop.stop(false);
            }
        }

        for (name, value) in props {
            match self.entries.get_mut(name) {
                Some(prop) if prop.kind() == classify(name, value) => prop.update(value),
                _ => {
                    if let Some(previous) = self.entries.remove(name) {
                        previous.stop(false);
                    }
                    let prop = VProp::start(&self.target, name, value);
                    self.entries.insert(name.clone(), prop);
                }
            }
        }
    }

    /// Release everything. The target itself is going away, so only
    /// handlers are unbound remotely.
    pub(crate) fn stop(self) {
        for prop in self.entries.into_values() {
            prop.stop(true);
        }
    }
}
