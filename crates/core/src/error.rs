//! Editor error taxonomy

/// Boxed backend error, so the editor stays independent of the PDF library
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures surfaced by editor operations
///
/// None of these invalidate the editing session: the annotation store and the
/// tool state are left as they were before the failed operation.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Source bytes could not be parsed as a PDF
    #[error("failed to load PDF: {0}")]
    LoadFailure(#[source] BackendError),

    /// Export requested while no document is loaded
    #[error("no PDF loaded")]
    EmptyDocumentExport,

    /// Drawing or serializing the annotated copy failed
    #[error("failed to save annotated PDF: {0}")]
    BakeFailure(#[source] BackendError),

    /// The host could not deliver the exported file
    #[error("failed to deliver annotated PDF: {0}")]
    Delivery(#[from] std::io::Error),
}

pub type EditorResult<T> = Result<T, EditorError>;
