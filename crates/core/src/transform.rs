//! Coordinate transforms between pointer, render and user space
//!
//! Three spaces are involved:
//! - pointer space: raw client coordinates reported by the host surface
//! - render space: pixels of the page bitmap at the current zoom scale
//! - user space: PDF points at scale 1.0, Y-down, origin at the page's top-left
//!
//! Editing happens entirely in user space. [`flip_y`] converts to the native
//! bottom-up PDF convention and is applied only while baking.

use crate::annotation::{AnnotationType, PageCoordinate, PageRect};
use serde::{Deserialize, Serialize};

/// Drags smaller than this in both axes are treated as clicks
pub const CLICK_THRESHOLD: f32 = 3.0;

/// Edge length of a checkbox created with a single click
pub const CHECKBOX_CLICK_SIZE: f32 = 20.0;

/// Point in pointer (client) space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Top-left corner of the rendered page canvas, in pointer space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasOrigin {
    pub left: f32,
    pub top: f32,
}

impl CanvasOrigin {
    pub fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }
}

/// Rectangle in render space, used to position overlay boxes on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Convert a pointer position to user space
///
/// `scale` must be positive. It is read fresh for every event; no inverse is
/// cached, so a zoom change during a drag is picked up on release.
pub fn to_user_space(pointer: ScreenPoint, origin: CanvasOrigin, scale: f32) -> PageCoordinate {
    debug_assert!(scale > 0.0, "zoom scale must be positive");
    PageCoordinate::new((pointer.x - origin.left) / scale, (pointer.y - origin.top) / scale)
}

/// Convert a user-space point to render space
pub fn to_render_space(point: PageCoordinate, scale: f32) -> (f32, f32) {
    (point.x * scale, point.y * scale)
}

pub fn rect_to_render_space(rect: &PageRect, scale: f32) -> RenderRect {
    RenderRect {
        left: rect.x * scale,
        top: rect.y * scale,
        width: rect.width * scale,
        height: rect.height * scale,
    }
}

/// Bottom edge of a Y-down box expressed in Y-up PDF coordinates
pub fn flip_y(y: f32, page_height: f32, height: f32) -> f32 {
    page_height - y - height
}

/// Inverse of [`flip_y`]
pub fn unflip_y(pdf_y: f32, page_height: f32, height: f32) -> f32 {
    page_height - pdf_y - height
}

/// Result of releasing a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    /// Both raw extents were below [`CLICK_THRESHOLD`]
    Discarded,
    /// Final rectangle, already clamped to the type's minimum size
    Commit(PageRect),
}

/// Compute the committed rectangle for a drag from `anchor` to `release`
///
/// The anchor is the componentwise minimum of the two points. Undersized
/// extents grow to the minimum size from that anchor; the anchor itself is
/// never moved.
pub fn resolve_drag(
    annotation_type: AnnotationType,
    anchor: PageCoordinate,
    release: PageCoordinate,
) -> DragOutcome {
    let raw_width = (release.x - anchor.x).abs();
    let raw_height = (release.y - anchor.y).abs();

    if raw_width < CLICK_THRESHOLD && raw_height < CLICK_THRESHOLD {
        log::debug!("drag of {raw_width}x{raw_height} treated as a click");
        return DragOutcome::Discarded;
    }

    let min = annotation_type.min_size();
    let rect = PageRect::new(
        anchor.x.min(release.x),
        anchor.y.min(release.y),
        raw_width.max(min.width),
        raw_height.max(min.height),
    );

    DragOutcome::Commit(rect)
}

/// Fixed-size checkbox box centered on a click, clamped to the page origin
///
/// Only checkboxes are clamped to non-negative coordinates; drag-created
/// annotations keep whatever anchor the pointer produced.
pub fn checkbox_rect_at(click: PageCoordinate) -> PageRect {
    let half = CHECKBOX_CLICK_SIZE / 2.0;
    PageRect::new(
        (click.x - half).max(0.0),
        (click.y - half).max(0.0),
        CHECKBOX_CLICK_SIZE,
        CHECKBOX_CLICK_SIZE,
    )
}
