//! Mapping from stored paths to public URLs.

use std::path::{Component, Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped inside a single URL path segment.
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Builds the URL a stored file is served from.
///
/// The URL is `base_url` followed by the percent-encoded segments of the
/// stored path. When a public root is set and the stored path lies under it,
/// the root is stripped first.
#[derive(Debug, Default, Clone)]
pub struct PublicUrls {
    base_url: String,
    root: Option<PathBuf>,
}

impl PublicUrls {
    /// Create a URL builder.
    #[must_use]
    pub fn new(base_url: impl Into<String>, root: Option<PathBuf>) -> Self {
        let mut base_url: String = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, root }
    }

    /// URL prefix without trailing slashes.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Directory stripped from stored paths, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Public URL for a stored path.
    #[must_use]
    pub fn url_for(&self, path: &Path) -> String {
        let relative = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);

        let mut url = self.base_url.clone();
        for component in relative.components() {
            if let Component::Normal(segment) = component {
                url.push('/');
                url.extend(utf8_percent_encode(&segment.to_string_lossy(), SEGMENT_ENCODE_SET));
            }
        }
        if url.is_empty() {
            url.push('/');
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_bare_path_without_base() {
        let urls = PublicUrls::default();
        assert_eq!(
            urls.url_for(Path::new("/srv/public/bat-1/a.png")),
            "/srv/public/bat-1/a.png"
        );
    }

    #[test]
    fn test_base_url_prefix() {
        let urls = PublicUrls::new("https://cdn.example.com/", None);
        assert_eq!(
            urls.url_for(Path::new("/srv/public/a.png")),
            "https://cdn.example.com/srv/public/a.png"
        );
    }

    #[test]
    fn test_public_root_is_stripped() {
        let urls = PublicUrls::new("/files", Some(PathBuf::from("/srv/public")));
        assert_eq!(
            urls.url_for(Path::new("/srv/public/bat-1/a.png")),
            "/files/bat-1/a.png"
        );
    }

    #[test]
    fn test_path_outside_root_keeps_full_path() {
        let urls = PublicUrls::new("", Some(PathBuf::from("/srv/public")));
        assert_eq!(urls.url_for(Path::new("/tmp/a.png")), "/tmp/a.png");
    }

    #[test]
    fn test_relative_path_gets_leading_slash() {
        let urls = PublicUrls::default();
        assert_eq!(urls.url_for(Path::new("public/a.png")), "/public/a.png");
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let urls = PublicUrls::default();
        assert_eq!(
            urls.url_for(Path::new("/srv/my photos/a#1?.png")),
            "/srv/my%20photos/a%231%3F.png"
        );
    }

    #[test]
    fn test_non_ascii_segments_are_encoded() {
        let urls = PublicUrls::default();
        assert_eq!(urls.url_for(Path::new("/srv/é.png")), "/srv/%C3%A9.png");
    }
}
