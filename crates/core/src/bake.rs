//! Bake planning
//!
//! Turns the annotation list into drawing primitives in native PDF space
//! (origin bottom-left, Y up). Planning is pure; a document backend replays
//! the commands onto real pages.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind};
use crate::transform::flip_y;
use serde::Serialize;
use std::collections::BTreeMap;

/// Font size used for text field content and the signature placeholder
pub const LABEL_FONT_SIZE: f32 = 10.0;
/// Font size of the checkbox mark
pub const CHECK_MARK_FONT_SIZE: f32 = 14.0;
/// Left inset of text field content
pub const TEXT_INSET: f32 = 4.0;
/// Inset of the signature guide line from the box edges
pub const SIGNATURE_LINE_INSET: f32 = 10.0;
/// Opacity of highlight fills
pub const HIGHLIGHT_OPACITY: f32 = 0.3;
pub const SIGNATURE_PLACEHOLDER: &str = "Sign Here";
pub const CHECK_MARK: &str = "X";

/// Fill/stroke color with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RgbColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: f32) -> Self {
        Self { r: level, g: level, b: level }
    }

    pub const BLACK: RgbColor = RgbColor::gray(0.0);
    pub const BORDER_GRAY: RgbColor = RgbColor::gray(0.3);
    pub const PLACEHOLDER_GRAY: RgbColor = RgbColor::gray(0.5);
    pub const SIGNATURE_BLUE: RgbColor = RgbColor::new(0.2, 0.4, 0.8);
    pub const HIGHLIGHT_YELLOW: RgbColor = RgbColor::new(1.0, 1.0, 0.0);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub width: f32,
    pub color: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fill {
    pub color: RgbColor,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFace {
    Regular,
    Bold,
}

/// Rectangle in PDF space: (x, y) is the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PdfRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PdfPoint {
    pub x: f32,
    pub y: f32,
}

/// Drawing primitive understood by document backends
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DrawCommand {
    Rectangle { rect: PdfRect, border: Option<Stroke>, fill: Option<Fill> },
    Text { text: String, x: f32, y: f32, size: f32, font: FontFace, color: RgbColor },
    Line { start: PdfPoint, end: PdfPoint, thickness: f32, color: RgbColor },
}

/// Primitives for one annotation on a page of the given height
pub fn plan_annotation(annotation: &Annotation, page_height: f32) -> Vec<DrawCommand> {
    let rect = annotation.rect();
    let y = flip_y(rect.y, page_height, rect.height);
    let bounds = PdfRect { x: rect.x, y, width: rect.width, height: rect.height };
    let label_baseline = y + rect.height / 2.0 - 4.0;

    match annotation.kind() {
        AnnotationKind::Text { content } => {
            let mut commands = vec![outlined(bounds, 1.0, RgbColor::BORDER_GRAY)];
            if let Some(text) = content.as_deref().filter(|text| !text.is_empty()) {
                commands.push(DrawCommand::Text {
                    text: text.to_owned(),
                    x: rect.x + TEXT_INSET,
                    y: label_baseline,
                    size: LABEL_FONT_SIZE,
                    font: FontFace::Regular,
                    color: RgbColor::BLACK,
                });
            }
            commands
        }
        AnnotationKind::Signature => {
            let line_y = y + SIGNATURE_LINE_INSET;
            vec![
                outlined(bounds, 2.0, RgbColor::SIGNATURE_BLUE),
                DrawCommand::Text {
                    text: SIGNATURE_PLACEHOLDER.to_owned(),
                    x: rect.x + rect.width / 2.0 - 25.0,
                    y: label_baseline,
                    size: LABEL_FONT_SIZE,
                    font: FontFace::Regular,
                    color: RgbColor::PLACEHOLDER_GRAY,
                },
                DrawCommand::Line {
                    start: PdfPoint { x: rect.x + SIGNATURE_LINE_INSET, y: line_y },
                    end: PdfPoint { x: rect.x + rect.width - SIGNATURE_LINE_INSET, y: line_y },
                    thickness: 1.0,
                    color: RgbColor::BORDER_GRAY,
                },
            ]
        }
        AnnotationKind::Checkbox { checked } => {
            let mut commands = vec![outlined(bounds, 1.0, RgbColor::BORDER_GRAY)];
            if *checked {
                commands.push(DrawCommand::Text {
                    text: CHECK_MARK.to_owned(),
                    x: rect.x + 5.0,
                    y: y + 4.0,
                    size: CHECK_MARK_FONT_SIZE,
                    font: FontFace::Bold,
                    color: RgbColor::BLACK,
                });
            }
            commands
        }
        // Baked highlights are always yellow; the stored color only tints the overlay
        AnnotationKind::Highlight { .. } => vec![DrawCommand::Rectangle {
            rect: bounds,
            border: None,
            fill: Some(Fill { color: RgbColor::HIGHLIGHT_YELLOW, opacity: HIGHLIGHT_OPACITY }),
        }],
        AnnotationKind::Rectangle => vec![outlined(bounds, 2.0, RgbColor::BLACK)],
    }
}

fn outlined(rect: PdfRect, width: f32, color: RgbColor) -> DrawCommand {
    DrawCommand::Rectangle { rect, border: Some(Stroke { width, color }), fill: None }
}

/// Draw commands for a whole document, grouped by 1-based page number
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BakePlan {
    pub pages: BTreeMap<u32, Vec<DrawCommand>>,
    /// Annotations referencing pages the document does not have
    pub skipped: Vec<AnnotationId>,
    /// Number of annotations that produced commands
    pub drawn: usize,
}

impl BakePlan {
    /// Plan every annotation in store order against the given page heights
    ///
    /// `page_heights[i]` is the height of page `i + 1`. Out-of-range
    /// annotations are skipped silently.
    pub fn build(annotations: &[Annotation], page_heights: &[f32]) -> Self {
        let mut plan = BakePlan::default();

        for annotation in annotations {
            let page = annotation.page();
            let height = page
                .checked_sub(1)
                .and_then(|index| page_heights.get(index as usize))
                .copied();

            let Some(height) = height else {
                log::warn!(
                    "skipping annotation {} on page {page}: document has {} pages",
                    annotation.id(),
                    page_heights.len()
                );
                plan.skipped.push(annotation.id());
                continue;
            };

            plan.pages.entry(page).or_default().extend(plan_annotation(annotation, height));
            plan.drawn += 1;
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
