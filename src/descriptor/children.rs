//! Children lists and reactive content.
//!
//! [`Children`] is always normalized: nested lists are flattened and absent
//! values dropped as they are converted in, so every entry is a descriptor,
//! a text leaf or a reactive binding. Normalizing twice changes nothing.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::rc::Rc;

use super::props::PropValue;
use super::{Descriptor, DescriptorBuilder};
use crate::error::ReactiveError;
use crate::reactive::{Computed, Root, Signal};

pub(crate) fn hash_of(value: impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Identity shared by every text leaf.
pub(crate) fn text_identity() -> u64 {
    hash_of("#text")
}

/// Identity shared by every fragment.
pub(crate) fn fragment_identity() -> u64 {
    hash_of("#fragment")
}

pub(crate) fn reactive_identity(id: usize) -> u64 {
    hash_of(("#reactive", id))
}

// =============================================================================
// Reactive
// =============================================================================

/// A type-erased reactive value.
///
/// Built from a [`Signal`] or [`Computed`]. Nodes that hold one subscribe to
/// it and re-render its value whenever it changes. Two handles are equal
/// when they wrap the same reactive node.
#[derive(Clone)]
pub struct Reactive {
    id: usize,
    read: Rc<dyn Fn() -> Result<PropValue, ReactiveError>>,
}

impl Reactive {
    /// Derive reactive content from a closure.
    pub fn computed<T>(root: &Root, f: impl Fn() -> T + 'static) -> Self
    where
        T: Into<PropValue> + Clone + PartialEq + 'static,
    {
        Self::from(Computed::new(root, f))
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Read the current value, subscribing the running computation.
    pub fn read(&self) -> Result<PropValue, ReactiveError> {
        (self.read)()
    }

    pub(crate) fn identity(&self) -> u64 {
        reactive_identity(self.id)
    }
}

impl<T> From<Signal<T>> for Reactive
where
    T: Into<PropValue> + Clone + PartialEq + 'static,
{
    fn from(signal: Signal<T>) -> Self {
        Self {
            id: signal.id(),
            read: Rc::new(move || Ok(signal.get().into())),
        }
    }
}

impl<T> From<Computed<T>> for Reactive
where
    T: Into<PropValue> + Clone + PartialEq + 'static,
{
    fn from(computed: Computed<T>) -> Self {
        Self {
            id: computed.id(),
            read: Rc::new(move || computed.get().map(Into::into)),
        }
    }
}

impl PartialEq for Reactive {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reactive").field(&self.id).finish()
    }
}

// =============================================================================
// Child
// =============================================================================

/// One normalized child.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Descriptor(Descriptor),
    Text(String),
    Reactive(Reactive),
}

impl Child {
    /// Identity used to match children across renders. All text leaves
    /// share one identity; reactive children are identified by their node.
    pub fn identity(&self) -> u64 {
        match self {
            Child::Descriptor(descriptor) => descriptor.identity(),
            Child::Text(_) => text_identity(),
            Child::Reactive(reactive) => reactive.identity(),
        }
    }

    /// Slot this child is assigned to inside a component.
    pub fn slot(&self) -> Option<&str> {
        match self {
            Child::Descriptor(descriptor) => descriptor.slot(),
            _ => None,
        }
    }
}

macro_rules! text_child {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Child {
                fn from(value: $t) -> Self {
                    Child::Text(value.to_string())
                }
            }

            impl From<$t> for Children {
                fn from(value: $t) -> Self {
                    Children(vec![Child::from(value)])
                }
            }
        )*
    };
}

text_child!(&str, String, &String, char, i32, i64, u32, u64, usize, f64);

impl From<Descriptor> for Child {
    fn from(descriptor: Descriptor) -> Self {
        Child::Descriptor(descriptor)
    }
}

impl From<DescriptorBuilder> for Child {
    fn from(builder: DescriptorBuilder) -> Self {
        Child::Descriptor(builder.build())
    }
}

impl From<Reactive> for Child {
    fn from(reactive: Reactive) -> Self {
        Child::Reactive(reactive)
    }
}

impl<T> From<Signal<T>> for Child
where
    T: Into<PropValue> + Clone + PartialEq + 'static,
{
    fn from(signal: Signal<T>) -> Self {
        Child::Reactive(Reactive::from(signal))
    }
}

impl<T> From<Computed<T>> for Child
where
    T: Into<PropValue> + Clone + PartialEq + 'static,
{
    fn from(computed: Computed<T>) -> Self {
        Child::Reactive(Reactive::from(computed))
    }
}

// =============================================================================
// Children
// =============================================================================

/// A normalized, ordered list of children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Children(Vec<Child>);

impl Children {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Child> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Child> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Child] {
        &self.0
    }

    /// Append more content, flattening it.
    pub fn extend(&mut self, more: impl Into<Children>) {
        self.0.extend(more.into().0);
    }

    /// Concatenated text of the text leaves.
    pub fn text(&self) -> String {
        self.0
            .iter()
            .filter_map(|child| match child {
                Child::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl IntoIterator for Children {
    type Item = Child;
    type IntoIter = std::vec::IntoIter<Child>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Children {
    type Item = &'a Child;
    type IntoIter = std::slice::Iter<'a, Child>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: Into<Children>> FromIterator<T> for Children {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut children = Children::new();
        for item in iter {
            children.extend(item);
        }
        children
    }
}

impl From<Child> for Children {
    fn from(child: Child) -> Self {
        Children(vec![child])
    }
}

impl From<Descriptor> for Children {
    fn from(descriptor: Descriptor) -> Self {
        Children(vec![Child::Descriptor(descriptor)])
    }
}

impl From<DescriptorBuilder> for Children {
    fn from(builder: DescriptorBuilder) -> Self {
        Children(vec![Child::from(builder)])
    }
}

impl From<Reactive> for Children {
    fn from(reactive: Reactive) -> Self {
        Children(vec![Child::Reactive(reactive)])
    }
}

impl From<PropValue> for Children {
    fn from(value: PropValue) -> Self {
        value.into_children()
    }
}

impl<T> From<Signal<T>> for Children
where
    T: Into<PropValue> + Clone + PartialEq + 'static,
{
    fn from(signal: Signal<T>) -> Self {
        Children(vec![Child::from(signal)])
    }
}

impl<T> From<Computed<T>> for Children
where
    T: Into<PropValue> + Clone + PartialEq + 'static,
{
    fn from(computed: Computed<T>) -> Self {
        Children(vec![Child::from(computed)])
    }
}

impl<T: Into<Children>> From<Vec<T>> for Children {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Into<Children>> From<Option<T>> for Children {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Children::new, Into::into)
    }
}
