//! Fragment parsing and serialization.

use std::rc::Rc;

use html5ever::serialize::{SerializeOpts, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{LocalName, Namespace, ParseOpts, QualName, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use url::Url;

use crate::FragmentError;
use crate::image::Images;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// A parsed HTML fragment.
///
/// The markup is parsed in the context of a `<body>` element, so leading
/// `<style>`, `<script>` or comments stay where they were written. The
/// fragment root stands in for `body` when serializing.
pub struct Fragment {
    dom: RcDom,
    base: Url,
}

impl Fragment {
    /// Parse `html`, resolving image references against `base_uri`.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::BaseUri`] if `base_uri` is not an absolute URL.
    /// Malformed HTML is never an error.
    pub fn parse(html: &str, base_uri: &str) -> Result<Self, FragmentError> {
        let base = Url::parse(base_uri)?;
        // Scripting disabled so `<noscript>` content is parsed as markup
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                scripting_enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let context = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from("body"),
        );
        let dom = parse_fragment(RcDom::default(), opts, context, Vec::new()).one(html);

        let fragment = Self { dom, base };
        inline_template_contents(&fragment.root());
        Ok(fragment)
    }

    /// All `<img>` elements in document order, at any depth.
    pub fn images(&self) -> Images<'_> {
        Images::new(self.root(), &self.base)
    }

    /// Synthetic `<html>` element that fragment parsing puts every node under.
    fn root(&self) -> Handle {
        self.dom
            .document
            .children
            .borrow()
            .first()
            .cloned()
            .unwrap_or_else(|| self.dom.document.clone())
    }

    /// Serialize the children of the first element named `selector`.
    ///
    /// `selector` is a tag name. `body` selects the whole fragment. Returns an
    /// empty string when no element matches.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::Serialize`] if the serializer fails.
    pub fn serialize(&self, selector: &str) -> Result<String, FragmentError> {
        let root = self.root();
        let target = if selector.eq_ignore_ascii_case("body") {
            Some(root)
        } else {
            find_element(&root, selector)
        };
        let Some(target) = target else {
            return Ok(String::new());
        };

        let mut buf = Vec::new();
        let handle: SerializableHandle = target.into();
        serialize(&mut buf, &handle, SerializeOpts::default())?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Move `<template>` contents into the template's children.
///
/// The tree builder keeps them in a detached document fragment, which neither
/// the image walk nor the serializer visits.
fn inline_template_contents(node: &Handle) {
    if let NodeData::Element {
        template_contents, ..
    } = &node.data
        && let Some(contents) = template_contents.borrow().as_ref()
    {
        let moved = contents.children.take();
        for child in &moved {
            child.parent.set(Some(Rc::downgrade(node)));
        }
        node.children.borrow_mut().extend(moved);
    }
    for child in node.children.borrow().iter() {
        inline_template_contents(child);
    }
}

/// Depth-first search for the first element with the given local name.
fn find_element(node: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &node.data
        && (*name.local).eq_ignore_ascii_case(tag)
    {
        return Some(node.clone());
    }
    node.children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}
