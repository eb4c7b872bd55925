//! The generated game document.

use std::fmt;

/// Substring every accepted document must contain (compared case-insensitively).
pub const HTML_MARKER: &str = "<html";

/// Returns true if `text` contains [`HTML_MARKER`], ignoring ASCII case.
#[must_use]
pub fn contains_html_marker(text: &str) -> bool {
    text.to_ascii_lowercase().contains(HTML_MARKER)
}

/// The most recently accepted HTML document of a session, or nothing.
///
/// A non-empty artifact always contains [`HTML_MARKER`]: the only way to
/// build one is [`Artifact::accept`], which checks it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Artifact(String);

impl Artifact {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Accept a model reply as the new document if it passes the marker check.
    #[must_use]
    pub fn accept(candidate: impl Into<String>) -> Option<Self> {
        let candidate = candidate.into();
        contains_html_marker(&candidate).then_some(Self(candidate))
    }

    /// True once a document has been accepted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        contains_html_marker(&self.0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("len", &self.0.len())
            .finish()
    }
}
