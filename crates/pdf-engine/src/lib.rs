//! lopdf-backed document backend
//!
//! Reads page geometry and bakes annotation overlays into a new copy of a PDF.

mod encoding;
#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;
mod writer;

pub use encoding::{encode_win_ansi, is_win_ansi};

use annotator_core::annotation::{Annotation, PageSize};
use annotator_core::bake::BakePlan;
use annotator_core::document::DocumentBackend;
use lopdf::{Document, Object, ObjectId};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl OpenSource {
    /// Read the whole source into memory
    pub fn into_bytes(self) -> Result<Vec<u8>, PdfEngineError> {
        match self {
            OpenSource::Path(path) => Ok(fs::read(path)?),
            OpenSource::Bytes(bytes) => Ok(bytes),
        }
    }
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("document has no pages")]
    NoPages,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }

    fn parse(bytes: &[u8]) -> Result<Document, PdfEngineError> {
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(PdfEngineError::EncryptedUnsupported);
        }
        let doc = Document::load_mem(bytes)?;
        if doc.get_pages().is_empty() {
            return Err(PdfEngineError::NoPages);
        }
        Ok(doc)
    }

    /// MediaBox extent of a page, US Letter if it has none
    fn page_size(doc: &Document, page_id: ObjectId) -> Result<PageSize, PdfEngineError> {
        let size = writer::inherited(doc, page_id, b"MediaBox")?
            .and_then(|object| match object {
                Object::Reference(id) => doc.get_object(*id).ok(),
                other => Some(other),
            })
            .and_then(|object| object.as_array().ok())
            .and_then(|array| {
                if array.len() != 4 {
                    return None;
                }
                let x0 = array[0].as_float().ok()?;
                let y0 = array[1].as_float().ok()?;
                let x1 = array[2].as_float().ok()?;
                let y1 = array[3].as_float().ok()?;
                Some(PageSize::new((x1 - x0).abs(), (y1 - y0).abs()))
            })
            .unwrap_or_default();

        Ok(size)
    }

    /// Sizes of all pages of a parsed document, in page order
    fn page_sizes(doc: &Document) -> Result<Vec<PageSize>, PdfEngineError> {
        doc.get_pages().values().map(|page_id| Self::page_size(doc, *page_id)).collect()
    }

    /// Page geometry of a document read from `source`
    pub fn open(&self, source: OpenSource) -> Result<(Vec<u8>, Vec<PageSize>), PdfEngineError> {
        let bytes = source.into_bytes()?;
        let pages = self.load(&bytes)?;
        Ok((bytes, pages))
    }

    /// Draw plan for `annotations` against the pages of `original`
    pub fn plan(&self, original: &[u8], annotations: &[Annotation]) -> Result<BakePlan, PdfEngineError> {
        let heights: Vec<f32> = self.load(original)?.iter().map(|size| size.height).collect();
        Ok(BakePlan::build(annotations, &heights))
    }
}

impl DocumentBackend for LopdfEngine {
    type Error = PdfEngineError;

    fn load(&self, bytes: &[u8]) -> Result<Vec<PageSize>, PdfEngineError> {
        let doc = Self::parse(bytes)?;
        let sizes = Self::page_sizes(&doc)?;
        log::debug!("parsed {} pages", sizes.len());
        Ok(sizes)
    }

    fn bake(&self, original: &[u8], annotations: &[Annotation]) -> Result<Vec<u8>, PdfEngineError> {
        let mut doc = Self::parse(original)?;
        let pages = doc.get_pages();
        let heights = Self::page_sizes(&doc)?.iter().map(|size| size.height).collect::<Vec<_>>();
        let plan = BakePlan::build(annotations, &heights);

        {
            let mut writer = writer::PageWriter::new(&mut doc);
            for (page, commands) in &plan.pages {
                if let Some(page_id) = pages.get(page) {
                    writer.draw(*page_id, commands)?;
                }
            }
        }

        let mut output = Vec::new();
        doc.save_to(&mut output)?;
        log::info!(
            "baked {} annotations onto {} pages ({} skipped)",
            plan.drawn,
            plan.pages.len(),
            plan.skipped.len()
        );
        Ok(output)
    }
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}
