//! Custom element definitions.
//!
//! A [`CustomElement`] is a named template with named `<slot>`s. The first
//! time a session renders one, it sends a `DefineCustomElement` patch; every
//! instance then fills slots with children and sets attributes on parts of
//! the template addressed by ref name.

use std::collections::BTreeMap;
use std::rc::Rc;

use super::children::Children;
use super::props::{PropValue, Props};
use super::{DescriptorBuilder, Kind};

/// Tag of the element every session mounts its children under.
pub const ROOT_ELEMENT: &str = "rdom-root";

/// Prop holding slot name -> children.
pub(crate) const SLOTS_PROP: &str = "slots";
/// Prop holding ref name -> props.
pub(crate) const REFS_PROP: &str = "refs";

/// A stylesheet served alongside a custom element template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StyleSheet {
    filename: String,
}

impl StyleSheet {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// URL path the client fetches the stylesheet from.
    pub fn path(&self) -> String {
        format!("/.rdom/{}", self.filename)
    }

    fn import_html(&self) -> String {
        format!("<style>@import \"{}\";</style>", self.path())
    }
}

/// A custom element definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomElement {
    name: String,
    template: String,
    stylesheet: Option<StyleSheet>,
}

impl CustomElement {
    /// Underscores in `name` become hyphens.
    pub fn new(name: impl AsRef<str>, template: impl Into<String>) -> Self {
        Self {
            name: name.as_ref().replace('_', "-"),
            template: template.into(),
            stylesheet: None,
        }
    }

    /// The session root element: a single slot named `children`.
    pub fn root() -> Self {
        Self::new(ROOT_ELEMENT, r#"<slot id="children"></slot>"#)
    }

    pub fn with_stylesheet(mut self, stylesheet: StyleSheet) -> Self {
        self.stylesheet = Some(stylesheet);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn stylesheet(&self) -> Option<&StyleSheet> {
        self.stylesheet.as_ref()
    }

    /// Template HTML as sent to the client, stylesheet import first.
    pub fn definition_html(&self) -> String {
        match &self.stylesheet {
            Some(sheet) => format!("{}{}", sheet.import_html(), self.template),
            None => self.template.clone(),
        }
    }

    /// Start a descriptor for an instance of this element.
    pub fn instance(self: &Rc<Self>) -> DescriptorBuilder {
        DescriptorBuilder::new(Kind::CustomElement(self.clone()))
    }
}

// =============================================================================
// Builder extensions
// =============================================================================

impl DescriptorBuilder {
    /// Fill a named template slot with children.
    pub fn fill(mut self, slot: impl Into<String>, children: impl Into<Children>) -> Self {
        let slots = self
            .props
            .entry(SLOTS_PROP.to_string())
            .or_insert_with(|| PropValue::Map(BTreeMap::new()));
        if let PropValue::Map(slots) = slots {
            slots.insert(slot.into(), PropValue::Children(children.into()));
        }
        self
    }

    /// Set a prop on the template part with the given ref name.
    pub fn ref_prop(
        mut self,
        part: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<PropValue>,
    ) -> Self {
        let refs = self
            .props
            .entry(REFS_PROP.to_string())
            .or_insert_with(|| PropValue::Map(BTreeMap::new()));
        if let PropValue::Map(refs) = refs {
            let part = refs
                .entry(part.into())
                .or_insert_with(|| PropValue::Map(BTreeMap::new()));
            if let PropValue::Map(part) = part {
                part.insert(name.into(), value.into());
            }
        }
        self
    }
}

/// Slot contents of a custom element descriptor.
pub(crate) fn slot_contents(props: &Props) -> BTreeMap<String, Children> {
    props
        .get(SLOTS_PROP)
        .and_then(PropValue::as_map)
        .map(|slots| {
            slots
                .iter()
                .map(|(name, value)| (name.clone(), value.clone().into_children()))
                .collect()
        })
        .unwrap_or_default()
}

/// Ref part props of a custom element descriptor.
pub(crate) fn ref_props(props: &Props) -> BTreeMap<String, Props> {
    props
        .get(REFS_PROP)
        .and_then(PropValue::as_map)
        .map(|refs| {
            refs.iter()
                .filter_map(|(name, value)| Some((name.clone(), value.as_map()?.clone())))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_normalized() {
        let element = CustomElement::new("my_card", "<div></div>");
        assert_eq!(element.name(), "my-card");
    }

    #[test]
    fn test_definition_html_with_stylesheet() {
        let element = CustomElement::new("x-card", "<slot id=\"body\"></slot>")
            .with_stylesheet(StyleSheet::new("card-abc123.css"));
        assert_eq!(
            element.definition_html(),
            "<style>@import \"/.rdom/card-abc123.css\";</style><slot id=\"body\"></slot>"
        );
    }

    #[test]
    fn test_fill_and_ref_prop() {
        let element = Rc::new(CustomElement::new("x-card", ""));
        let descriptor = element
            .instance()
            .fill("title", "Hello")
            .fill("body", vec!["a", "b"])
            .ref_prop("header", "class", "big")
            .build();

        let slots = slot_contents(descriptor.props());
        assert_eq!(slots["title"].text(), "Hello");
        assert_eq!(slots["body"].len(), 2);

        let refs = ref_props(descriptor.props());
        assert_eq!(refs["header"]["class"], PropValue::from("big"));
    }
}
