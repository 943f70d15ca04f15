//! Annotator Core Library
//!
//! Overlay annotation model, coordinate transforms, tool state machine and
//! bake planning for the PDF annotation editor. PDF parsing and writing live
//! behind the [`DocumentBackend`] port.

pub mod annotation;
pub mod bake;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod store;
pub mod tool;
pub mod transform;

pub use annotation::{
    Annotation, AnnotationId, AnnotationKind, AnnotationType, Color, ColorParseError, PageCoordinate,
    PageRect, PageSize, Size,
};
pub use bake::{
    plan_annotation, BakePlan, DrawCommand, Fill, FontFace, PdfPoint, PdfRect, RgbColor, Stroke,
};
pub use config::{ConfigError, EditorConfig};
pub use document::{DocumentBackend, DocumentState, LoadedDocument};
pub use editor::{
    Editor, ExportArtifact, ExportHost, Notification, NotificationLevel, Overlay, PointerInput,
    Status, TextEdit,
};
pub use error::{EditorError, EditorResult};
pub use store::{AnnotationStore, StoreEvent, SubscriptionId};
pub use tool::{Interaction, Tool, ToolSession, ToolState};
pub use transform::{CanvasOrigin, DragOutcome, RenderRect, ScreenPoint};
