// Loosely-typed XML document tree
//
// GMP responses are deeply nested XML with a habit of collapsing a
// single-element list into a bare element. `Element` is the uniform
// intermediate representation every model parser consumes: attributes and
// text are entity-decoded strings, and `children(name)` always behaves
// like a list regardless of how many children the document carried.

use super::decode::decode;

/// One XML element: name, decoded attributes, child elements, and the
/// decoded concatenation of its direct text nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    /// Build an element tree from a parsed XML node, decoding the fixed
    /// entity set on every attribute value and text node and stripping
    /// namespace prefixes from element names.
    pub(crate) fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let attributes = node
            .attributes()
            .map(|a| (a.name().to_owned(), decode(a.value())))
            .collect();

        let mut children = Vec::new();
        let mut text = String::new();
        for child in node.children() {
            if child.is_element() {
                children.push(Self::from_node(child));
            } else if let Some(t) = child.text() {
                text.push_str(t);
            }
        }

        let trimmed = text.trim();
        Self {
            name: node.tag_name().name().to_owned(),
            attributes,
            children,
            text: if trimmed.is_empty() {
                None
            } else {
                Some(decode(trimmed))
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// An attribute value, entity-decoded.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The first child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Every child element with the given name.
    ///
    /// This is the singular/plural normalization point: zero children yield
    /// an empty vec, one child a one-element vec — callers never branch on
    /// whether the document collapsed a list.
    pub fn children(&self, name: &str) -> Vec<&Element> {
        self.children.iter().filter(|c| c.name == name).collect()
    }

    /// All child elements in document order.
    pub fn all_children(&self) -> &[Element] {
        &self.children
    }

    /// The element's own text content.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text content of the first child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Element::text)
    }

    /// Remove and return the first child with the given name. Used by the
    /// envelope parser to relocate protocol metadata out of the payload.
    pub(crate) fn remove_child(&mut self, name: &str) -> Option<Element> {
        let pos = self.children.iter().position(|c| c.name == name)?;
        Some(self.children.remove(pos))
    }
}
