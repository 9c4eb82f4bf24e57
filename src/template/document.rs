//! Structured markup document consumed by notification transports
//!
//! A small element tree with ordered attributes. Lookups walk the tree in
//! document order, the same way the platform DOM resolves
//! `GetElementsByTagName`.

use std::fmt::Write as _;

use super::model::Layout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Replace the attribute value, keeping its position
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Append a child element and return a handle to it
    pub fn append_child(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        match self.children.last_mut() {
            Some(Node::Element(element)) => element,
            _ => unreachable!("just pushed an element"),
        }
    }

    /// Replace the content with a single text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|node| matches!(node, Node::Element(_)));
        self.children.push(Node::Text(text.into()));
    }

    /// Concatenated text content of direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    fn collect_by_tag<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        if self.name == name {
            out.push(self);
        }
        for child in self.child_elements() {
            child.collect_by_tag(name, out);
        }
    }

    fn nth_by_tag_mut<'a>(
        &'a mut self,
        name: &str,
        remaining: &mut usize,
    ) -> Option<&'a mut Element> {
        if self.name == name {
            if *remaining == 0 {
                return Some(self);
            }
            *remaining -= 1;
        }
        for child in self.children.iter_mut() {
            if let Node::Element(child) = child {
                if let Some(found) = child.nth_by_tag_mut(name, remaining) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", key, escape(value));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(element) => element.write_xml(out),
                Node::Text(text) => out.push_str(&escape(text)),
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

/// Compiled notification document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastDocument {
    root: Element,
}

impl ToastDocument {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Empty skeleton for a layout: one binding with the image slot (if any)
    /// and one empty text placeholder per declared field
    pub fn skeleton(layout: Layout) -> Self {
        let mut binding = Element::new("binding").with_attr("template", layout.name());
        if layout.has_image_slot() {
            binding.append_child(Element::new("image").with_attr("id", "1").with_attr("src", ""));
        }
        for id in 1..=layout.text_field_count() {
            binding.append_child(Element::new("text").with_attr("id", id.to_string()));
        }

        let mut visual = Element::new("visual");
        visual.append_child(binding);
        let mut toast = Element::new("toast");
        toast.append_child(visual);
        Self::new(toast)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// All elements with the tag, in document order
    pub fn elements_by_tag(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.root.collect_by_tag(name, &mut out);
        out
    }

    pub fn first_by_tag(&self, name: &str) -> Option<&Element> {
        self.elements_by_tag(name).into_iter().next()
    }

    /// The `index`-th element with the tag, in document order
    pub fn nth_by_tag_mut(&mut self, name: &str, index: usize) -> Option<&mut Element> {
        let mut remaining = index;
        self.root.nth_by_tag_mut(name, &mut remaining)
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.root.write_xml(&mut out);
        out
    }
}

impl std::fmt::Display for ToastDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_xml())
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
