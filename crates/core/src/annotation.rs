//! Annotation data model
//!
//! Overlay annotations anchored to a page. Geometry is stored in page-local
//! user space (points at scale 1.0) with the origin at the top-left corner of
//! the page and Y increasing downward. The conversion to the native PDF
//! convention happens once, when the annotation list is baked.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an annotation
///
/// Generated using UUID v4, so identifiers are never reused within a session.
pub type AnnotationId = uuid::Uuid;

/// Page-local coordinate in user space
///
/// - Origin (0, 0) at the top-left of the page
/// - X increases to the right
/// - Y increases downward
/// - Units are in points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageCoordinate {
    pub x: f32,
    pub y: f32,
}

impl PageCoordinate {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width and height pair in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Physical size of a PDF page in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for PageSize {
    /// US Letter
    fn default() -> Self {
        Self { width: 612.0, height: 792.0 }
    }
}

/// Axis-aligned rectangle in user space, anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Hit test with inclusive edges
    pub fn contains(&self, point: &PageCoordinate) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

/// RGBA color, exchanged with the host as a CSS `rgba(r, g, b, a)` string
///
/// The alpha channel is stored as 0..=255 and written as a 0..1 fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Semi-transparent yellow used for highlight overlays
    pub const fn highlight() -> Self {
        Self::HIGHLIGHT
    }

    /// 30% yellow
    pub const HIGHLIGHT: Color = Color { r: 255, g: 255, b: 0, a: 77 };
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}, expected rgb(r, g, b) or rgba(r, g, b, a)")]
pub struct ColorParseError(String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ColorParseError(value.to_owned());
        let trimmed = value.trim();

        let (body, has_alpha) = if let Some(body) = trimmed.strip_prefix("rgba(") {
            (body, true)
        } else if let Some(body) = trimmed.strip_prefix("rgb(") {
            (body, false)
        } else {
            return Err(invalid());
        };
        let body = body.strip_suffix(')').ok_or_else(invalid)?;

        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(invalid());
        }

        let channel = |part: &str| part.parse::<u8>().map_err(|_| invalid());
        let (r, g, b) = (channel(parts[0])?, channel(parts[1])?, channel(parts[2])?);

        let a = match parts.get(3) {
            Some(alpha) => {
                let alpha = alpha.parse::<f32>().map_err(|_| invalid())?;
                if !(0.0..=1.0).contains(&alpha) {
                    return Err(invalid());
                }
                (alpha * 255.0).round() as u8
            }
            None => 255,
        };

        Ok(Color::new(r, g, b, a))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alpha = format!("{:.2}", f32::from(self.a) / 255.0);
        let alpha = alpha.trim_end_matches('0').trim_end_matches('.');
        write!(f, "rgba({}, {}, {}, {alpha})", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// The closed set of annotation kinds, without payload
///
/// Used wherever only the tag matters: tool selection and the minimum-size
/// policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    Text,
    Signature,
    Checkbox,
    Highlight,
    Rectangle,
}

impl AnnotationType {
    pub const ALL: [AnnotationType; 5] = [
        AnnotationType::Text,
        AnnotationType::Signature,
        AnnotationType::Checkbox,
        AnnotationType::Highlight,
        AnnotationType::Rectangle,
    ];

    /// Minimum committed extent for a drag-created annotation of this type
    pub const fn min_size(self) -> Size {
        match self {
            AnnotationType::Checkbox => Size::new(20.0, 20.0),
            AnnotationType::Highlight => Size::new(5.0, 5.0),
            AnnotationType::Signature => Size::new(80.0, 30.0),
            AnnotationType::Text => Size::new(50.0, 20.0),
            AnnotationType::Rectangle => Size::new(10.0, 10.0),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            AnnotationType::Text => "text",
            AnnotationType::Signature => "signature",
            AnnotationType::Checkbox => "checkbox",
            AnnotationType::Highlight => "highlight",
            AnnotationType::Rectangle => "rectangle",
        }
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder content given to drag-created text fields
pub const DEFAULT_TEXT_CONTENT: &str = "Enter text";

/// Annotation kind with its type-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Text field; `content` is drawn inside the box when non-empty
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },

    /// Signature placeholder box
    Signature,

    /// Checkbox, drawn with an "X" when checked
    Checkbox {
        #[serde(default)]
        checked: bool,
    },

    /// Translucent highlight
    Highlight {
        #[serde(default = "Color::highlight")]
        color: Color,
    },

    /// Plain outlined rectangle
    Rectangle,
}

impl AnnotationKind {
    /// Payload a freshly drag-created annotation of `annotation_type` receives
    pub fn for_drag(annotation_type: AnnotationType) -> Self {
        Self::for_drag_with_placeholder(annotation_type, DEFAULT_TEXT_CONTENT)
    }

    pub fn for_drag_with_placeholder(annotation_type: AnnotationType, placeholder: &str) -> Self {
        match annotation_type {
            AnnotationType::Text => AnnotationKind::Text { content: Some(placeholder.to_owned()) },
            AnnotationType::Signature => AnnotationKind::Signature,
            AnnotationType::Checkbox => AnnotationKind::Checkbox { checked: false },
            AnnotationType::Highlight => AnnotationKind::Highlight { color: Color::HIGHLIGHT },
            AnnotationType::Rectangle => AnnotationKind::Rectangle,
        }
    }

    pub fn annotation_type(&self) -> AnnotationType {
        match self {
            AnnotationKind::Text { .. } => AnnotationType::Text,
            AnnotationKind::Signature => AnnotationType::Signature,
            AnnotationKind::Checkbox { .. } => AnnotationType::Checkbox,
            AnnotationKind::Highlight { .. } => AnnotationType::Highlight,
            AnnotationKind::Rectangle => AnnotationType::Rectangle,
        }
    }
}

/// A single overlay annotation
///
/// `id`, `page` and the annotation type are fixed at creation. Only the
/// payload (checkbox state, text content) may change afterwards, through the
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Payloads without an id get a fresh one
    #[serde(default = "AnnotationId::new_v4")]
    id: AnnotationId,

    /// 1-based page number
    page: u32,

    #[serde(flatten)]
    rect: PageRect,

    #[serde(flatten)]
    kind: AnnotationKind,
}

impl Annotation {
    /// Create a new annotation with a generated ID
    pub fn new(page: u32, rect: PageRect, kind: AnnotationKind) -> Self {
        Self::with_id(AnnotationId::new_v4(), page, rect, kind)
    }

    /// Create an annotation with a specific ID (for deserialization and tests)
    pub fn with_id(id: AnnotationId, page: u32, rect: PageRect, kind: AnnotationKind) -> Self {
        Self { id, page, rect, kind }
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn rect(&self) -> &PageRect {
        &self.rect
    }

    pub fn kind(&self) -> &AnnotationKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut AnnotationKind {
        &mut self.kind
    }

    pub fn annotation_type(&self) -> AnnotationType {
        self.kind.annotation_type()
    }

    /// Text payload, only present for text fields
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            AnnotationKind::Text { content } => content.as_deref(),
            _ => None,
        }
    }

    /// Checkbox state, only present for checkboxes
    pub fn checked(&self) -> Option<bool> {
        match self.kind {
            AnnotationKind::Checkbox { checked } => Some(checked),
            _ => None,
        }
    }

    /// Check if a user-space point hits this annotation
    pub fn hit_test(&self, point: &PageCoordinate) -> bool {
        self.rect.contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parses_css_strings() {
        assert_eq!("rgba(255, 255, 0, 0.3)".parse::<Color>(), Ok(Color::HIGHLIGHT));
        assert_eq!("rgb(10,20,30)".parse::<Color>(), Ok(Color::rgb(10, 20, 30)));
        assert_eq!(" rgba(0, 0, 0, 0) ".parse::<Color>(), Ok(Color::new(0, 0, 0, 0)));
        assert!("yellow".parse::<Color>().is_err());
        assert!("rgba(255, 255, 0)".parse::<Color>().is_err());
        assert!("rgb(256, 0, 0)".parse::<Color>().is_err());
        assert!("rgba(0, 0, 0, 1.5)".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color::HIGHLIGHT.to_string(), "rgba(255, 255, 0, 0.3)");
        assert_eq!(Color::rgb(1, 2, 3).to_string(), "rgba(1, 2, 3, 1)");
        assert_eq!(Color::new(1, 2, 3, 0).to_string(), "rgba(1, 2, 3, 0)");
    }

    #[test]
    fn test_min_size_table() {
        assert_eq!(AnnotationType::Checkbox.min_size(), Size::new(20.0, 20.0));
        assert_eq!(AnnotationType::Highlight.min_size(), Size::new(5.0, 5.0));
        assert_eq!(AnnotationType::Signature.min_size(), Size::new(80.0, 30.0));
        assert_eq!(AnnotationType::Text.min_size(), Size::new(50.0, 20.0));
        assert_eq!(AnnotationType::Rectangle.min_size(), Size::new(10.0, 10.0));
    }

    #[test]
    fn test_drag_payload_defaults() {
        assert_eq!(
            AnnotationKind::for_drag(AnnotationType::Text),
            AnnotationKind::Text { content: Some("Enter text".to_owned()) }
        );
        assert_eq!(
            AnnotationKind::for_drag(AnnotationType::Checkbox),
            AnnotationKind::Checkbox { checked: false }
        );
        assert_eq!(
            AnnotationKind::for_drag(AnnotationType::Highlight),
            AnnotationKind::Highlight { color: Color::HIGHLIGHT }
        );
        for annotation_type in AnnotationType::ALL {
            assert_eq!(AnnotationKind::for_drag(annotation_type).annotation_type(), annotation_type);
        }
    }

    #[test]
    fn test_rect_hit_testing_is_inclusive() {
        let rect = PageRect::new(10.0, 20.0, 30.0, 40.0);
        assert!(rect.contains(&PageCoordinate::new(10.0, 20.0)));
        assert!(rect.contains(&PageCoordinate::new(40.0, 60.0)));
        assert!(rect.contains(&PageCoordinate::new(25.0, 30.0)));
        assert!(!rect.contains(&PageCoordinate::new(9.9, 30.0)));
        assert!(!rect.contains(&PageCoordinate::new(25.0, 60.1)));
    }

    #[test]
    fn test_payload_accessors() {
        let text = Annotation::new(
            1,
            PageRect::new(0.0, 0.0, 50.0, 20.0),
            AnnotationKind::Text { content: Some("hello".to_owned()) },
        );
        assert_eq!(text.content(), Some("hello"));
        assert_eq!(text.checked(), None);

        let checkbox = Annotation::new(
            2,
            PageRect::new(0.0, 0.0, 20.0, 20.0),
            AnnotationKind::Checkbox { checked: true },
        );
        assert_eq!(checkbox.checked(), Some(true));
        assert_eq!(checkbox.content(), None);
        assert_eq!(checkbox.annotation_type(), AnnotationType::Checkbox);
        assert_eq!(checkbox.page(), 2);
    }

    #[test]
    fn test_serialized_shape_is_flat() {
        let id = AnnotationId::nil();
        let annotation = Annotation::with_id(
            id,
            1,
            PageRect::new(190.0, 140.0, 20.0, 20.0),
            AnnotationKind::Checkbox { checked: false },
        );

        let value = serde_json::to_value(&annotation).unwrap();
        assert_eq!(value["type"], "checkbox");
        assert_eq!(value["page"], 1);
        assert_eq!(value["x"], 190.0);
        assert_eq!(value["y"], 140.0);
        assert_eq!(value["width"], 20.0);
        assert_eq!(value["checked"], false);
        assert!(value.get("content").is_none());
    }

    #[test]
    fn test_deserialize_host_payload() {
        let json = r#"[
            {"id": "00000000-0000-0000-0000-000000000001", "type": "text",
             "page": 1, "x": 10, "y": 20, "width": 60, "height": 20, "content": "Name"},
            {"id": "00000000-0000-0000-0000-000000000002", "type": "signature",
             "page": 2, "x": 10.5, "y": 20, "width": 80, "height": 30},
            {"id": "00000000-0000-0000-0000-000000000003", "type": "highlight",
             "page": 1, "x": 0, "y": 0, "width": 5, "height": 5}
        ]"#;

        let annotations: Vec<Annotation> = serde_json::from_str(json).unwrap();
        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[0].content(), Some("Name"));
        assert_eq!(annotations[1].annotation_type(), AnnotationType::Signature);
        assert_eq!(annotations[1].rect().x, 10.5);
        assert_eq!(annotations[2].kind(), &AnnotationKind::Highlight { color: Color::HIGHLIGHT });
    }

    #[test]
    fn test_highlight_color_uses_css_string() {
        let json = r#"{"id": "00000000-0000-0000-0000-000000000004", "type": "highlight",
            "page": 1, "x": 100, "y": 100, "width": 50, "height": 20,
            "color": "rgba(255, 255, 0, 0.3)"}"#;

        let annotation: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(annotation.kind(), &AnnotationKind::Highlight { color: Color::HIGHLIGHT });

        let value = serde_json::to_value(&annotation).unwrap();
        assert_eq!(value["color"], "rgba(255, 255, 0, 0.3)");

        let bad = json.replace("rgba(255, 255, 0, 0.3)", "chartreuse");
        assert!(serde_json::from_str::<Annotation>(&bad).is_err());
    }

    #[test]
    fn test_deserialize_assigns_missing_ids() {
        let json = r#"[
            {"type": "checkbox", "page": 1, "x": 190, "y": 140, "width": 20, "height": 20},
            {"type": "checkbox", "page": 1, "x": 190, "y": 140, "width": 20, "height": 20, "checked": true}
        ]"#;

        let annotations: Vec<Annotation> = serde_json::from_str(json).unwrap();
        assert_ne!(annotations[0].id(), annotations[1].id());
        assert_eq!(annotations[0].checked(), Some(false));
        assert_eq!(annotations[1].checked(), Some(true));
    }
}
