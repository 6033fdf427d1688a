//! Prop values.
//!
//! A [`PropValue`] is what a descriptor carries for one attribute, style
//! map, event handler or reactive binding. It is also what a [`Reactive`]
//! yields when read, so reactive children and reactive attributes share one
//! representation.

use std::collections::BTreeMap;

use super::children::{Children, Reactive};
use super::handler::Handler;
use super::{Descriptor, DescriptorBuilder};
use crate::reactive::{Computed, Signal};

/// Props of a descriptor, ordered by name.
pub type Props = BTreeMap<String, PropValue>;

/// A property value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PropValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<PropValue>),
    Map(BTreeMap<String, PropValue>),
    /// Renderable content.
    Children(Children),
    /// Event handler.
    Handler(Handler),
    /// Reactive binding, read when rendered.
    Reactive(Reactive),
}

impl PropValue {
    /// Text form used for attribute values and text nodes.
    ///
    /// Lists join with spaces. Maps, handlers and unread reactive values
    /// have no text form.
    pub fn to_text(&self) -> String {
        match self {
            PropValue::Null => String::new(),
            PropValue::Bool(b) => b.to_string(),
            PropValue::Int(n) => n.to_string(),
            PropValue::Float(f) => f.to_string(),
            PropValue::Str(s) => s.clone(),
            PropValue::List(items) => items
                .iter()
                .map(PropValue::to_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            PropValue::Children(children) => children.text(),
            PropValue::Map(_) | PropValue::Handler(_) | PropValue::Reactive(_) => String::new(),
        }
    }

    /// Content form used when the value is rendered as children.
    pub fn into_children(self) -> Children {
        match self {
            PropValue::Null | PropValue::Handler(_) | PropValue::Map(_) => Children::new(),
            PropValue::Children(children) => children,
            PropValue::Reactive(reactive) => Children::from(reactive),
            PropValue::List(items) => items.into_iter().map(PropValue::into_children).collect(),
            other => Children::from(other.to_text()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, PropValue>> {
        match self {
            PropValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

macro_rules! int_prop {
    ($($t:ty),*) => {
        $(impl From<$t> for PropValue {
            fn from(value: $t) -> Self {
                PropValue::Int(i64::from(value))
            }
        })*
    };
}

int_prop!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for PropValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(PropValue::Float(value as f64), PropValue::Int)
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(PropValue::Float(value as f64), PropValue::Int)
    }
}

impl From<f32> for PropValue {
    fn from(value: f32) -> Self {
        PropValue::Float(f64::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<&String> for PropValue {
    fn from(value: &String) -> Self {
        PropValue::Str(value.clone())
    }
}

impl<T: Into<PropValue>> From<Vec<T>> for PropValue {
    fn from(items: Vec<T>) -> Self {
        PropValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropValue::Null, Into::into)
    }
}

impl From<BTreeMap<String, PropValue>> for PropValue {
    fn from(map: BTreeMap<String, PropValue>) -> Self {
        PropValue::Map(map)
    }
}

impl From<Children> for PropValue {
    fn from(children: Children) -> Self {
        PropValue::Children(children)
    }
}

impl From<Descriptor> for PropValue {
    fn from(descriptor: Descriptor) -> Self {
        PropValue::Children(Children::from(descriptor))
    }
}

impl From<DescriptorBuilder> for PropValue {
    fn from(builder: DescriptorBuilder) -> Self {
        PropValue::from(builder.build())
    }
}

impl From<Handler> for PropValue {
    fn from(handler: Handler) -> Self {
        PropValue::Handler(handler)
    }
}

impl From<Reactive> for PropValue {
    fn from(reactive: Reactive) -> Self {
        PropValue::Reactive(reactive)
    }
}

impl<T> From<Signal<T>> for PropValue
where
    T: Into<PropValue> + Clone + PartialEq + 'static,
{
    fn from(signal: Signal<T>) -> Self {
        PropValue::Reactive(Reactive::from(signal))
    }
}

impl<T> From<Computed<T>> for PropValue
where
    T: Into<PropValue> + Clone + PartialEq + 'static,
{
    fn from(computed: Computed<T>) -> Self {
        PropValue::Reactive(Reactive::from(computed))
    }
}
