//! Tool and drag-to-create state machine
//!
//! A gesture is a press followed by a release. Checkboxes are committed on
//! press; every other drawing tool opens a drag session on press and commits
//! on release. The select tool never draws: clicks on existing annotations
//! arrive through [`ToolState::click_annotation`] instead.

use crate::annotation::{AnnotationId, AnnotationKind, AnnotationType, PageCoordinate};
use crate::store::AnnotationStore;
use crate::transform::{checkbox_rect_at, resolve_drag, DragOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Active interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Select,
    Text,
    Signature,
    Checkbox,
    Highlight,
    Rectangle,
}

impl Tool {
    /// Annotation type this tool draws, `None` for the select tool
    pub fn annotation_type(self) -> Option<AnnotationType> {
        match self {
            Tool::Select => None,
            Tool::Text => Some(AnnotationType::Text),
            Tool::Signature => Some(AnnotationType::Signature),
            Tool::Checkbox => Some(AnnotationType::Checkbox),
            Tool::Highlight => Some(AnnotationType::Highlight),
            Tool::Rectangle => Some(AnnotationType::Rectangle),
        }
    }

    /// Short usage hint shown in the status bar, `None` for the select tool
    pub fn hint(self) -> Option<String> {
        let annotation_type = self.annotation_type()?;
        Some(format!("Click and drag to add a {annotation_type}"))
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.annotation_type() {
            Some(annotation_type) => write!(f, "{annotation_type}"),
            None => f.write_str("select"),
        }
    }
}

/// Transient gesture state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ToolSession {
    #[default]
    Idle,
    /// Pointer is down with a drawing tool; nothing is committed yet
    Dragging {
        anchor: PageCoordinate,
        page: u32,
        annotation_type: AnnotationType,
    },
}

/// What a single gesture did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// A drag session was opened
    DragStarted,
    Created(AnnotationId),
    /// The release was too close to the press to count as a drag
    Discarded,
    Toggled(AnnotationId),
    /// A text field was clicked and should open for inline editing
    EditText(AnnotationId),
    Selected(AnnotationId),
    Ignored,
}

/// Active tool plus the in-flight drag, if any
#[derive(Debug, Clone, Default)]
pub struct ToolState {
    tool: Tool,
    session: ToolSession,
}

impl ToolState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn session(&self) -> ToolSession {
        self.session
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.session, ToolSession::Dragging { .. })
    }

    /// Switch tools, dropping any drag in progress
    pub fn set_tool(&mut self, tool: Tool) {
        if self.is_dragging() {
            log::debug!("tool change to {tool} discards the active drag");
        }
        self.tool = tool;
        self.session = ToolSession::Idle;
    }

    /// Drop the in-flight drag without committing it
    pub fn cancel(&mut self) {
        self.session = ToolSession::Idle;
    }

    /// Handle a pointer press at `point` on `page`
    ///
    /// Presses landing on an existing annotation are left to
    /// [`Self::click_annotation`].
    pub fn press(
        &mut self,
        store: &mut AnnotationStore,
        page: u32,
        point: PageCoordinate,
    ) -> Interaction {
        let Some(annotation_type) = self.tool.annotation_type() else {
            return Interaction::Ignored;
        };

        if store.hit_test(page, &point).is_some() {
            return Interaction::Ignored;
        }

        if annotation_type == AnnotationType::Checkbox {
            let rect = checkbox_rect_at(point);
            let id = store.create(page, rect, AnnotationKind::Checkbox { checked: false }).id();
            return Interaction::Created(id);
        }

        self.session = ToolSession::Dragging { anchor: point, page, annotation_type };
        Interaction::DragStarted
    }

    /// Handle the pointer release ending a drag
    ///
    /// The annotation lands on the page the drag started on. `placeholder`
    /// becomes the content of new text fields.
    pub fn release(
        &mut self,
        store: &mut AnnotationStore,
        point: PageCoordinate,
        placeholder: &str,
    ) -> Interaction {
        let ToolSession::Dragging { anchor, page, annotation_type } =
            std::mem::take(&mut self.session)
        else {
            return Interaction::Ignored;
        };

        match resolve_drag(annotation_type, anchor, point) {
            DragOutcome::Discarded => Interaction::Discarded,
            DragOutcome::Commit(rect) => {
                let kind = AnnotationKind::for_drag_with_placeholder(annotation_type, placeholder);
                Interaction::Created(store.create(page, rect, kind).id())
            }
        }
    }

    /// Handle a click on an existing annotation
    ///
    /// Only the select tool reacts. The clicked annotation becomes selected;
    /// checkboxes additionally flip and text fields request inline editing.
    pub fn click_annotation(&mut self, store: &mut AnnotationStore, id: AnnotationId) -> Interaction {
        if self.tool != Tool::Select {
            return Interaction::Ignored;
        }
        let Some(annotation_type) = store.get(id).map(|a| a.annotation_type()) else {
            return Interaction::Ignored;
        };

        store.select(id);
        match annotation_type {
            AnnotationType::Checkbox => {
                store.toggle_checked(id);
                Interaction::Toggled(id)
            }
            AnnotationType::Text => Interaction::EditText(id),
            _ => Interaction::Selected(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{PageRect, DEFAULT_TEXT_CONTENT};

    fn drawing(tool: Tool) -> ToolState {
        let mut state = ToolState::new();
        state.set_tool(tool);
        state
    }

    #[test]
    fn test_tool_annotation_types() {
        assert_eq!(Tool::Select.annotation_type(), None);
        assert_eq!(Tool::Highlight.annotation_type(), Some(AnnotationType::Highlight));
        assert_eq!(Tool::Select.hint(), None);
        assert_eq!(Tool::Signature.hint().as_deref(), Some("Click and drag to add a signature"));
        assert_eq!(Tool::default(), Tool::Select);
    }

    #[test]
    fn test_select_tool_press_is_ignored() {
        let mut store = AnnotationStore::new();
        let mut state = ToolState::new();
        assert_eq!(state.press(&mut store, 1, PageCoordinate::new(10.0, 10.0)), Interaction::Ignored);
        assert!(!state.is_dragging());
        assert!(store.is_empty());
    }

    #[test]
    fn test_checkbox_commits_on_press() {
        let mut store = AnnotationStore::new();
        let mut state = drawing(Tool::Checkbox);

        let Interaction::Created(id) = state.press(&mut store, 1, PageCoordinate::new(200.0, 150.0))
        else {
            panic!("checkbox press should create");
        };
        let annotation = store.get(id).unwrap();
        assert_eq!(*annotation.rect(), PageRect::new(190.0, 140.0, 20.0, 20.0));
        assert_eq!(annotation.checked(), Some(false));
        assert!(!state.is_dragging());
    }

    #[test]
    fn test_drag_creates_on_release() {
        let mut store = AnnotationStore::new();
        let mut state = drawing(Tool::Text);

        assert_eq!(state.press(&mut store, 2, PageCoordinate::new(100.0, 100.0)), Interaction::DragStarted);
        assert!(store.is_empty());

        let Interaction::Created(id) =
            state.release(&mut store, PageCoordinate::new(40.0, 110.0), DEFAULT_TEXT_CONTENT)
        else {
            panic!("drag should create");
        };
        let annotation = store.get(id).unwrap();
        assert_eq!(annotation.page(), 2);
        assert_eq!(*annotation.rect(), PageRect::new(40.0, 100.0, 60.0, 20.0));
        assert_eq!(annotation.content(), Some("Enter text"));
        assert_eq!(state.session(), ToolSession::Idle);
    }

    #[test]
    fn test_micro_drag_is_discarded() {
        let mut store = AnnotationStore::new();
        let mut state = drawing(Tool::Highlight);

        state.press(&mut store, 1, PageCoordinate::new(100.0, 100.0));
        let outcome = state.release(&mut store, PageCoordinate::new(100.0, 100.0), DEFAULT_TEXT_CONTENT);
        assert_eq!(outcome, Interaction::Discarded);
        assert!(store.is_empty());
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut store = AnnotationStore::new();
        let mut state = drawing(Tool::Rectangle);
        let outcome = state.release(&mut store, PageCoordinate::new(50.0, 50.0), DEFAULT_TEXT_CONTENT);
        assert_eq!(outcome, Interaction::Ignored);
    }

    #[test]
    fn test_tool_change_discards_drag() {
        let mut store = AnnotationStore::new();
        let mut state = drawing(Tool::Rectangle);
        state.press(&mut store, 1, PageCoordinate::new(0.0, 0.0));
        state.set_tool(Tool::Signature);

        assert!(!state.is_dragging());
        let outcome = state.release(&mut store, PageCoordinate::new(90.0, 90.0), DEFAULT_TEXT_CONTENT);
        assert_eq!(outcome, Interaction::Ignored);
        assert!(store.is_empty());
    }

    #[test]
    fn test_press_on_existing_annotation_is_ignored() {
        let mut store = AnnotationStore::new();
        store.create(1, PageRect::new(0.0, 0.0, 100.0, 100.0), AnnotationKind::Rectangle);
        let mut state = drawing(Tool::Checkbox);

        assert_eq!(state.press(&mut store, 1, PageCoordinate::new(50.0, 50.0)), Interaction::Ignored);
        assert_eq!(store.len(), 1);

        // Same point on another page is free canvas
        assert!(matches!(
            state.press(&mut store, 2, PageCoordinate::new(50.0, 50.0)),
            Interaction::Created(_)
        ));
    }

    #[test]
    fn test_click_annotation_dispatch() {
        let mut store = AnnotationStore::new();
        let rect = PageRect::new(0.0, 0.0, 20.0, 20.0);
        let checkbox = store.create(1, rect, AnnotationKind::Checkbox { checked: false }).id();
        let text = store.create(1, rect, AnnotationKind::for_drag(AnnotationType::Text)).id();
        let signature = store.create(1, rect, AnnotationKind::Signature).id();
        let mut state = ToolState::new();

        assert_eq!(state.click_annotation(&mut store, checkbox), Interaction::Toggled(checkbox));
        assert_eq!(store.get(checkbox).unwrap().checked(), Some(true));
        assert_eq!(store.selected(), Some(checkbox));

        assert_eq!(state.click_annotation(&mut store, text), Interaction::EditText(text));
        assert_eq!(state.click_annotation(&mut store, signature), Interaction::Selected(signature));
        assert_eq!(store.selected(), Some(signature));

        assert_eq!(state.click_annotation(&mut store, AnnotationId::new_v4()), Interaction::Ignored);
    }

    #[test]
    fn test_click_annotation_with_drawing_tool_is_ignored() {
        let mut store = AnnotationStore::new();
        let id = store
            .create(1, PageRect::new(0.0, 0.0, 20.0, 20.0), AnnotationKind::Checkbox { checked: false })
            .id();
        let mut state = drawing(Tool::Rectangle);

        assert_eq!(state.click_annotation(&mut store, id), Interaction::Ignored);
        assert_eq!(store.get(id).unwrap().checked(), Some(false));
        assert_eq!(store.selected(), None);
    }
}
