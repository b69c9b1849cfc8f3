//! Image element handles.

use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData};
use percent_encoding::percent_decode_str;
use url::Url;

/// An image reference resolved against the synthetic base authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedUri {
    /// Path on the base authority with the authority stripped, dot segments
    /// normalized and percent-escapes decoded (e.g. `/images/a b.png`).
    /// No decoded segment is `.` or `..` or contains a separator.
    Local(String),
    /// Absolute URL on another authority or scheme.
    External(String),
    /// `src` value that cannot be resolved, or whose escapes decode to a
    /// separator or dot segment.
    Invalid(String),
}

impl ResolvedUri {
    /// The resolved reference as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local(s) | Self::External(s) | Self::Invalid(s) => s,
        }
    }

    pub(crate) fn resolve(raw: &str, base: &Url) -> Self {
        let Ok(url) = base.join(raw.trim()) else {
            return Self::Invalid(raw.to_owned());
        };
        if url.origin() != base.origin() {
            return Self::External(url.into());
        }
        let Some(segments) = url.path_segments() else {
            return Self::Invalid(raw.to_owned());
        };

        let mut path = String::new();
        for segment in segments {
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            // Escaped separators or dot segments would climb out of the source prefix
            if decoded == "." || decoded == ".." || decoded.contains(['/', '\\', '\0']) {
                return Self::Invalid(raw.to_owned());
            }
            path.push('/');
            path.push_str(&decoded);
        }
        if path.is_empty() {
            path.push('/');
        }
        Self::Local(path)
    }
}

/// Handle to one `<img>` element of a parsed fragment.
///
/// Mutations through the handle are visible to later serialization.
pub struct ImageNode<'a> {
    handle: Handle,
    base: &'a Url,
}

impl<'a> ImageNode<'a> {
    pub(crate) fn new(handle: Handle, base: &'a Url) -> Self {
        Self { handle, base }
    }

    /// Value of an attribute, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        let NodeData::Element { attrs, .. } = &self.handle.data else {
            return None;
        };
        attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == name)
            .map(|attr| attr.value.to_string())
    }

    /// The `src` attribute as authored.
    #[must_use]
    pub fn raw_uri(&self) -> Option<String> {
        self.attribute("src")
    }

    /// The `src` attribute resolved against the base authority.
    ///
    /// Returns `None` when the element has no `src` attribute.
    #[must_use]
    pub fn resolved_uri(&self) -> Option<ResolvedUri> {
        self.raw_uri()
            .map(|raw| ResolvedUri::resolve(&raw, self.base))
    }

    /// Set attributes in place.
    ///
    /// Existing attributes keep their position; new ones are appended in the
    /// given order.
    pub fn set_attributes(&self, values: &[(&str, &str)]) {
        let NodeData::Element { attrs, .. } = &self.handle.data else {
            return;
        };
        let mut attrs = attrs.borrow_mut();
        for &(name, value) in values {
            let value = StrTendril::from_slice(value);
            if let Some(attr) = attrs.iter_mut().find(|attr| &*attr.name.local == name) {
                attr.value = value;
            } else {
                attrs.push(Attribute {
                    name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                    value,
                });
            }
        }
    }
}

/// Lazy depth-first iterator over `<img>` elements in document order.
///
/// Created by [`Fragment::images`](crate::Fragment::images). Each call walks
/// the tree afresh; an exhausted iterator stays exhausted.
pub struct Images<'a> {
    stack: Vec<Handle>,
    base: &'a Url,
}

impl<'a> Images<'a> {
    pub(crate) fn new(root: Handle, base: &'a Url) -> Self {
        Self {
            stack: vec![root],
            base,
        }
    }
}

impl<'a> Iterator for Images<'a> {
    type Item = ImageNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            self.stack
                .extend(node.children.borrow().iter().rev().cloned());
            if let NodeData::Element { name, .. } = &node.data
                && &*name.local == "img"
            {
                return Some(ImageNode::new(node, self.base));
            }
        }
        None
    }
}
