//! Document state and the backend port
//!
//! The editor never parses PDF itself. A [`DocumentBackend`] reads page
//! geometry out of the source bytes and bakes an annotation list into a new
//! copy of the document.

use crate::annotation::{Annotation, PageSize};

/// Two-function interface to a PDF manipulation library
pub trait DocumentBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Parse `bytes` and report the size of every page, in page order
    fn load(&self, bytes: &[u8]) -> Result<Vec<PageSize>, Self::Error>;

    /// Produce a new document with `annotations` drawn onto their pages
    ///
    /// `original` is left untouched. Annotations referencing pages the
    /// document does not have are skipped without error.
    fn bake(&self, original: &[u8], annotations: &[Annotation]) -> Result<Vec<u8>, Self::Error>;
}

/// A successfully loaded source document
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    bytes: Vec<u8>,
    pages: Vec<PageSize>,
}

impl LoadedDocument {
    pub fn new(bytes: Vec<u8>, pages: Vec<PageSize>) -> Self {
        Self { bytes, pages }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn pages(&self) -> &[PageSize] {
        &self.pages
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Size of a 1-based page
    pub fn page_size(&self, page: u32) -> Option<PageSize> {
        page.checked_sub(1).and_then(|index| self.pages.get(index as usize)).copied()
    }
}

/// Lifecycle of the document shown in the editor
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DocumentState {
    /// Nothing loaded yet
    #[default]
    Empty,
    Loaded(LoadedDocument),
    /// The last load attempt failed; the message is shown in place of the page
    Failed { reason: String },
}

impl DocumentState {
    pub fn loaded(&self) -> Option<&LoadedDocument> {
        match self {
            DocumentState::Loaded(document) => Some(document),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, DocumentState::Loaded(_))
    }

    pub fn page_count(&self) -> u32 {
        self.loaded().map(LoadedDocument::page_count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_one_based() {
        let document = LoadedDocument::new(
            b"%PDF".to_vec(),
            vec![PageSize::new(612.0, 792.0), PageSize::new(842.0, 595.0)],
        );
        assert_eq!(document.page_count(), 2);
        assert_eq!(document.page_size(0), None);
        assert_eq!(document.page_size(1), Some(PageSize::new(612.0, 792.0)));
        assert_eq!(document.page_size(2), Some(PageSize::new(842.0, 595.0)));
        assert_eq!(document.page_size(3), None);
    }

    #[test]
    fn test_state_page_count() {
        assert_eq!(DocumentState::Empty.page_count(), 0);
        assert_eq!(DocumentState::Failed { reason: "bad".to_owned() }.page_count(), 0);
        let loaded = DocumentState::Loaded(LoadedDocument::new(Vec::new(), vec![PageSize::default()]));
        assert_eq!(loaded.page_count(), 1);
        assert!(loaded.is_loaded());
    }
}
