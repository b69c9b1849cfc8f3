//! HTML fragment parsing and image attribute rewriting.
//!
//! Parses an HTML fragment into a mutable DOM, yields its `<img>` elements in
//! document order, lets callers rewrite their attributes, and serializes a
//! subtree back to HTML.
//!
//! Parsing is tolerant: malformed markup is repaired the way browsers repair
//! it and never produces an error.
//!
//! # Example
//!
//! ```
//! use imgreloc_html::{Fragment, ResolvedUri, SYNTHETIC_BASE_URI};
//!
//! let fragment = Fragment::parse(r#"<p><img src="a.png"></p>"#, SYNTHETIC_BASE_URI).unwrap();
//! for image in fragment.images() {
//!     assert_eq!(image.resolved_uri(), Some(ResolvedUri::Local("/a.png".to_owned())));
//!     image.set_attributes(&[("src", "/files/a.png")]);
//! }
//! assert_eq!(fragment.serialize("body").unwrap(), r#"<p><img src="/files/a.png"></p>"#);
//! ```

mod fragment;
mod image;

pub use fragment::Fragment;
pub use image::{ImageNode, Images, ResolvedUri};

/// Base authority that relative image references are resolved against.
pub const SYNTHETIC_BASE_URI: &str = "http://localhost";

/// Fragment parsing and serialization error.
#[derive(Debug, thiserror::Error)]
pub enum FragmentError {
    /// The base URI is not an absolute URL.
    #[error("Invalid base URI: {0}")]
    BaseUri(#[from] url::ParseError),
    /// Writing the serialized HTML failed.
    #[error("Serialization failed: {0}")]
    Serialize(#[from] std::io::Error),
}
