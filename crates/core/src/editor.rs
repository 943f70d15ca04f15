//! Editing session
//!
//! [`Editor`] ties the annotation store, the tool state machine and the viewer
//! state (page, zoom) to a loaded document. Pointer input arrives as plain
//! geometry so the whole session can be driven without a UI toolkit.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, AnnotationType, Color};
use crate::config::{ConfigError, EditorConfig, PDF_MIME_TYPE};
use crate::document::{DocumentBackend, DocumentState, LoadedDocument};
use crate::error::{EditorError, EditorResult};
use crate::store::{AnnotationStore, StoreEvent, SubscriptionId};
use crate::tool::{Interaction, Tool, ToolState};
use crate::transform::{rect_to_render_space, to_user_space, CanvasOrigin, RenderRect, ScreenPoint};
use serde::Serialize;
use std::io;

/// Pointer event geometry as reported by the host surface
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    pub client: ScreenPoint,
    /// Bounding-box origin of the rendered page at the time of the event
    pub canvas_origin: CanvasOrigin,
}

impl PointerInput {
    pub fn new(client: ScreenPoint, canvas_origin: CanvasOrigin) -> Self {
        Self { client, canvas_origin }
    }

    /// Pointer at `(x, y)` over a canvas anchored at the client origin
    pub fn at(x: f32, y: f32) -> Self {
        Self::new(ScreenPoint::new(x, y), CanvasOrigin::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// User-facing message produced by load and save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: &'static str,
    pub description: &'static str,
}

impl Notification {
    pub const SAVED: Notification = Notification {
        level: NotificationLevel::Success,
        title: "Saved",
        description: "Annotated PDF has been downloaded.",
    };

    pub const NO_DOCUMENT: Notification = Notification {
        level: NotificationLevel::Error,
        title: "Error",
        description: "No PDF loaded.",
    };

    pub const SAVE_FAILED: Notification = Notification {
        level: NotificationLevel::Error,
        title: "Error",
        description: "Failed to save annotated PDF.",
    };

    pub const LOAD_FAILED: Notification = Notification {
        level: NotificationLevel::Error,
        title: "Error",
        description: "Failed to load PDF file.",
    };

    /// Notification reported for a failed operation
    pub fn for_error(error: &EditorError) -> Self {
        match error {
            EditorError::EmptyDocumentExport => Self::NO_DOCUMENT,
            EditorError::LoadFailure(_) => Self::LOAD_FAILED,
            EditorError::BakeFailure(_) | EditorError::Delivery(_) => Self::SAVE_FAILED,
        }
    }
}

/// Baked document ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Side effects of saving, owned by the host application
pub trait ExportHost {
    /// Called once per successful bake, before [`Self::download`]
    fn on_save(&mut self, _bytes: &[u8], _annotations: &[Annotation]) {}

    /// Deliver the exported file to the user
    fn download(&mut self, artifact: &ExportArtifact) -> io::Result<()>;

    fn notify(&mut self, notification: Notification);
}

/// In-progress inline edit of a text field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub id: AnnotationId,
    pub draft: String,
}

/// Overlay box for one annotation on the current page, in render space
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub id: AnnotationId,
    pub annotation_type: AnnotationType,
    pub bounds: RenderRect,
    pub selected: bool,
    /// Text shown inside the box, if any
    pub label: Option<String>,
    /// Fill tint, highlights only
    pub color: Option<Color>,
}

/// Summary for the status bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub annotation_count: usize,
    pub current_page: u32,
    pub page_count: u32,
    pub zoom_percent: u16,
    pub tool: Tool,
    pub hint: Option<String>,
}

pub struct Editor<B: DocumentBackend> {
    backend: B,
    config: EditorConfig,
    document: DocumentState,
    store: AnnotationStore,
    tool: ToolState,
    current_page: u32,
    zoom_percent: u16,
    text_edit: Option<TextEdit>,
}

impl<B: DocumentBackend> Editor<B> {
    pub fn new(backend: B) -> Self {
        Self::build(backend, EditorConfig::default())
    }

    /// Editor with custom settings
    ///
    /// # Errors
    /// Rejects settings that fail [`EditorConfig::validate`], such as an empty
    /// or inverted zoom range.
    pub fn with_config(backend: B, config: EditorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(backend, config))
    }

    fn build(backend: B, config: EditorConfig) -> Self {
        let zoom_percent = config.initial_zoom_percent;
        Self {
            backend,
            config,
            document: DocumentState::Empty,
            store: AnnotationStore::new(),
            tool: ToolState::new(),
            current_page: 1,
            zoom_percent,
            text_edit: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // --- Document lifecycle ---

    /// Replace the current document with `bytes`
    ///
    /// The annotation list survives a reload; annotations pointing past the
    /// new page count are skipped when baking. On failure the previous
    /// document is dropped and the state records the reason.
    pub fn load(&mut self, bytes: Vec<u8>) -> EditorResult<u32> {
        self.tool.cancel();
        self.text_edit = None;
        self.current_page = 1;

        match self.backend.load(&bytes) {
            Ok(pages) => {
                let document = LoadedDocument::new(bytes, pages);
                let page_count = document.page_count();
                log::info!("loaded document with {page_count} pages");
                self.document = DocumentState::Loaded(document);
                Ok(page_count)
            }
            Err(err) => {
                log::error!("failed to load document: {err}");
                self.document = DocumentState::Failed { reason: err.to_string() };
                Err(EditorError::LoadFailure(Box::new(err)))
            }
        }
    }

    /// Discard the document and every piece of session state
    pub fn close(&mut self) {
        self.document = DocumentState::Empty;
        self.store.clear();
        self.tool = ToolState::new();
        self.text_edit = None;
        self.current_page = 1;
        self.zoom_percent = self.config.initial_zoom_percent;
    }

    pub fn document(&self) -> &DocumentState {
        &self.document
    }

    pub fn page_count(&self) -> u32 {
        self.document.page_count()
    }

    // --- Paging and zoom ---

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Jump to `page`, clamped to the document's page range
    pub fn go_to_page(&mut self, page: u32) -> u32 {
        self.current_page = page.clamp(1, self.page_count().max(1));
        self.current_page
    }

    pub fn next_page(&mut self) -> u32 {
        self.go_to_page(self.current_page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> u32 {
        self.go_to_page(self.current_page.saturating_sub(1))
    }

    pub fn zoom_percent(&self) -> u16 {
        self.zoom_percent
    }

    /// Render scale, 1.0 at 100%
    pub fn scale(&self) -> f32 {
        f32::from(self.zoom_percent) / 100.0
    }

    pub fn set_zoom_percent(&mut self, percent: u16) -> u16 {
        self.zoom_percent =
            percent.clamp(self.config.min_zoom_percent, self.config.max_zoom_percent);
        self.zoom_percent
    }

    pub fn zoom_in(&mut self) -> u16 {
        self.set_zoom_percent(self.zoom_percent.saturating_add(self.config.zoom_step_percent))
    }

    pub fn zoom_out(&mut self) -> u16 {
        self.set_zoom_percent(self.zoom_percent.saturating_sub(self.config.zoom_step_percent))
    }

    // --- Tools and pointer input ---

    pub fn tool(&self) -> Tool {
        self.tool.tool()
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool.set_tool(tool);
    }

    pub fn is_dragging(&self) -> bool {
        self.tool.is_dragging()
    }

    /// Pointer pressed on the page surface
    pub fn pointer_down(&mut self, input: PointerInput) -> Interaction {
        if !self.document.is_loaded() || self.text_edit.is_some() {
            return Interaction::Ignored;
        }
        let point = to_user_space(input.client, input.canvas_origin, self.scale());
        self.tool.press(&mut self.store, self.current_page, point)
    }

    /// Pointer released on the page surface
    ///
    /// The release is converted with the scale in effect now, not the one at
    /// press time.
    pub fn pointer_up(&mut self, input: PointerInput) -> Interaction {
        if !self.document.is_loaded() {
            self.tool.cancel();
            return Interaction::Ignored;
        }
        let point = to_user_space(input.client, input.canvas_origin, self.scale());
        self.tool.release(&mut self.store, point, &self.config.text_placeholder)
    }

    /// Click on an annotation's overlay box
    pub fn annotation_clicked(&mut self, id: AnnotationId) -> Interaction {
        if self.text_edit.is_some() {
            return Interaction::Ignored;
        }
        let interaction = self.tool.click_annotation(&mut self.store, id);
        if let Interaction::EditText(id) = interaction {
            let draft = self.store.get(id).and_then(Annotation::content).unwrap_or_default();
            self.text_edit = Some(TextEdit { id, draft: draft.to_owned() });
        }
        interaction
    }

    // --- Inline text editing ---

    pub fn text_edit(&self) -> Option<&TextEdit> {
        self.text_edit.as_ref()
    }

    /// Replace the draft of the open text edit. Returns false if none is open.
    pub fn set_text_draft(&mut self, text: impl Into<String>) -> bool {
        match &mut self.text_edit {
            Some(edit) => {
                edit.draft = text.into();
                true
            }
            None => false,
        }
    }

    /// Write the draft into the annotation and close the editor
    pub fn commit_text_edit(&mut self) -> bool {
        match self.text_edit.take() {
            Some(TextEdit { id, draft }) => self.store.update_content(id, draft),
            None => false,
        }
    }

    pub fn cancel_text_edit(&mut self) {
        self.text_edit = None;
    }

    // --- Store access ---

    pub fn annotations(&self) -> &[Annotation] {
        self.store.annotations()
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.store.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Add annotations restored by the host, keeping their ids
    pub fn import_annotations(&mut self, annotations: impl IntoIterator<Item = Annotation>) {
        for annotation in annotations {
            self.store.insert(annotation);
        }
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.store.selected()
    }

    pub fn delete_selected(&mut self) -> Option<Annotation> {
        let id = self.store.selected()?;
        if self.text_edit.as_ref().is_some_and(|edit| edit.id == id) {
            self.text_edit = None;
        }
        self.store.delete(id)
    }

    pub fn clear_annotations(&mut self) {
        self.text_edit = None;
        self.store.clear();
    }

    // --- View ---

    /// Overlay boxes for the current page only
    pub fn page_overlays(&self) -> Vec<Overlay> {
        let scale = self.scale();
        let selected = self.store.selected();

        self.store
            .filter_by_page(self.current_page)
            .map(|annotation| Overlay {
                id: annotation.id(),
                annotation_type: annotation.annotation_type(),
                bounds: rect_to_render_space(annotation.rect(), scale),
                selected: selected == Some(annotation.id()),
                label: overlay_label(annotation),
                color: match annotation.kind() {
                    AnnotationKind::Highlight { color } => Some(*color),
                    _ => None,
                },
            })
            .collect()
    }

    pub fn status(&self) -> Status {
        let tool = self.tool.tool();
        Status {
            annotation_count: self.store.len(),
            current_page: self.current_page,
            page_count: self.page_count(),
            zoom_percent: self.zoom_percent,
            tool,
            hint: tool.hint(),
        }
    }

    // --- Export ---

    /// Bake the current annotation list into a new copy of the document
    pub fn export(&self) -> EditorResult<Vec<u8>> {
        let document = self.document.loaded().ok_or(EditorError::EmptyDocumentExport)?;
        self.backend
            .bake(document.bytes(), self.store.annotations())
            .map_err(|err| EditorError::BakeFailure(Box::new(err)))
    }

    /// Export and hand the result to the host
    ///
    /// The host sees `on_save`, then `download`, then a notification. Any
    /// failure is reported through `notify` as well as returned; the
    /// annotation list is untouched either way.
    pub fn save(&mut self, host: &mut dyn ExportHost) -> EditorResult<()> {
        let result = self.deliver(host);
        match &result {
            Ok(()) => {
                log::info!("saved {} annotations", self.store.len());
                host.notify(Notification::SAVED);
            }
            Err(err) => {
                log::error!("save failed: {err}");
                host.notify(Notification::for_error(err));
            }
        }
        result
    }

    fn deliver(&self, host: &mut dyn ExportHost) -> EditorResult<()> {
        let bytes = self.export()?;
        host.on_save(&bytes, self.store.annotations());

        let artifact = ExportArtifact {
            file_name: self.config.export_file_name.clone(),
            mime_type: PDF_MIME_TYPE,
            bytes,
        };
        host.download(&artifact)?;
        Ok(())
    }
}

fn overlay_label(annotation: &Annotation) -> Option<String> {
    match annotation.annotation_type() {
        AnnotationType::Text => annotation.content().map(str::to_owned),
        AnnotationType::Signature => Some(crate::bake::SIGNATURE_PLACEHOLDER.to_owned()),
        AnnotationType::Checkbox => {
            annotation.checked().filter(|checked| *checked).map(|_| crate::bake::CHECK_MARK.to_owned())
        }
        AnnotationType::Highlight | AnnotationType::Rectangle => None,
    }
}
