//! Replays draw commands into a lopdf document
//!
//! Each touched page gets its original content isolated between `q`/`Q` and
//! one extra content stream holding the annotation primitives. Fonts and
//! opacity states are registered in a private copy of the page's resources,
//! so resources shared with other pages are never modified.

use crate::encoding::{encode_win_ansi, is_win_ansi};
use crate::PdfEngineError;
use annotator_core::bake::{DrawCommand, Fill, FontFace, PdfRect, RgbColor, Stroke};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;

pub(crate) const REGULAR_FONT_NAME: &str = "AnnotHelv";
pub(crate) const BOLD_FONT_NAME: &str = "AnnotHelvB";

/// Object ids of the fonts shared by every annotated page
#[derive(Debug, Clone, Copy)]
struct Fonts {
    regular: ObjectId,
    bold: ObjectId,
}

/// Writes annotation primitives into one document
pub(crate) struct PageWriter<'a> {
    doc: &'a mut Document,
    fonts: Option<Fonts>,
}

impl<'a> PageWriter<'a> {
    pub(crate) fn new(doc: &'a mut Document) -> Self {
        Self { doc, fonts: None }
    }

    /// Append `commands` on top of the existing content of `page_id`
    pub(crate) fn draw(
        &mut self,
        page_id: ObjectId,
        commands: &[DrawCommand],
    ) -> Result<(), PdfEngineError> {
        if commands.is_empty() {
            return Ok(());
        }

        let mut states = BTreeMap::new();
        let mut operations = vec![Operation::new("Q", vec![]), Operation::new("q", vec![])];
        for command in commands {
            encode_command(command, &mut states, &mut operations);
        }
        operations.push(Operation::new("Q", vec![]));

        let uses_text = commands.iter().any(|c| matches!(c, DrawCommand::Text { .. }));
        let fonts = if uses_text { Some(self.fonts()) } else { None };
        self.install_resources(page_id, fonts, &states)?;

        let content = Content { operations }.encode()?;
        self.wrap_contents(page_id, content)
    }

    fn fonts(&mut self) -> Fonts {
        if let Some(fonts) = self.fonts {
            return fonts;
        }
        let fonts = Fonts {
            regular: self.doc.add_object(standard_font("Helvetica")),
            bold: self.doc.add_object(standard_font("Helvetica-Bold")),
        };
        self.fonts = Some(fonts);
        fonts
    }

    /// Give the page its own resource dictionary extended with our entries
    fn install_resources(
        &mut self,
        page_id: ObjectId,
        fonts: Option<Fonts>,
        states: &BTreeMap<String, f32>,
    ) -> Result<(), PdfEngineError> {
        let mut resources = self.effective_resources(page_id)?;

        if let Some(fonts) = fonts {
            let mut font_dict = self.sub_dictionary(&resources, b"Font");
            font_dict.set(REGULAR_FONT_NAME, fonts.regular);
            font_dict.set(BOLD_FONT_NAME, fonts.bold);
            resources.set("Font", font_dict);
        }

        if !states.is_empty() {
            let mut state_dict = self.sub_dictionary(&resources, b"ExtGState");
            for (name, opacity) in states {
                state_dict.set(
                    name.as_str(),
                    dictionary! {
                        "Type" => "ExtGState",
                        "ca" => *opacity,
                        "CA" => *opacity,
                    },
                );
            }
            resources.set("ExtGState", state_dict);
        }

        self.page_mut(page_id)?.set("Resources", resources);
        Ok(())
    }

    /// Resources in effect for the page, following `/Parent` inheritance
    fn effective_resources(&self, page_id: ObjectId) -> Result<Dictionary, PdfEngineError> {
        match inherited(&*self.doc, page_id, b"Resources")? {
            Some(object) => Ok(self.resolve_dictionary(object).unwrap_or_default()),
            None => Ok(Dictionary::new()),
        }
    }

    /// Owned copy of `resources[key]`, dereferencing if needed
    fn sub_dictionary(&self, resources: &Dictionary, key: &[u8]) -> Dictionary {
        resources.get(key).ok().and_then(|object| self.resolve_dictionary(object)).unwrap_or_default()
    }

    fn resolve_dictionary(&self, object: &Object) -> Option<Dictionary> {
        match object {
            Object::Dictionary(dict) => Some(dict.clone()),
            Object::Reference(id) => self.doc.get_dictionary(*id).ok().cloned(),
            _ => None,
        }
    }

    /// Surround the page's existing content with `q`/`Q` and append ours
    ///
    /// `content` starts with the closing `Q` of the original content.
    fn wrap_contents(&mut self, page_id: ObjectId, content: Vec<u8>) -> Result<(), PdfEngineError> {
        let existing = match self.doc.get_dictionary(page_id)?.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        let save_id = self.doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let annotations_id = self.doc.add_object(Stream::new(dictionary! {}, content));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(annotations_id));

        self.page_mut(page_id)?.set("Contents", contents);
        Ok(())
    }

    fn page_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary, PdfEngineError> {
        Ok(self.doc.get_object_mut(page_id)?.as_dict_mut()?)
    }
}

/// Look up `key` on the page or the nearest ancestor in the page tree
pub(crate) fn inherited<'d>(
    doc: &'d Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'d Object>, PdfEngineError> {
    let mut node = doc.get_dictionary(page_id)?;
    // Bounded walk; malformed files can contain /Parent cycles
    for _ in 0..64 {
        if let Ok(value) = node.get(key) {
            return Ok(Some(value));
        }
        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = doc.get_dictionary(parent)?,
            Err(_) => return Ok(None),
        }
    }
    Ok(None)
}

fn standard_font(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn state_name(opacity: f32) -> String {
    format!("AnnotGS{}", (opacity.clamp(0.0, 1.0) * 100.0).round() as u32)
}

fn encode_command(
    command: &DrawCommand,
    states: &mut BTreeMap<String, f32>,
    ops: &mut Vec<Operation>,
) {
    match command {
        DrawCommand::Rectangle { rect, border, fill } => {
            if let Some(fill) = fill {
                encode_fill(rect, fill, states, ops);
            }
            if let Some(border) = border {
                encode_border(rect, border, ops);
            }
        }
        DrawCommand::Text { text, x, y, size, font, color } => {
            let font_name = match font {
                FontFace::Regular => REGULAR_FONT_NAME,
                FontFace::Bold => BOLD_FONT_NAME,
            };
            if !is_win_ansi(text) {
                log::warn!("text {text:?} has characters outside WinAnsi; they are drawn as '?'");
            }
            ops.push(Operation::new("q", vec![]));
            ops.push(color_op("rg", *color));
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec![font_name.into(), (*size).into()]));
            ops.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ));
            ops.push(Operation::new("ET", vec![]));
            ops.push(Operation::new("Q", vec![]));
        }
        DrawCommand::Line { start, end, thickness, color } => {
            ops.push(Operation::new("q", vec![]));
            ops.push(color_op("RG", *color));
            ops.push(Operation::new("w", vec![(*thickness).into()]));
            ops.push(Operation::new("m", vec![start.x.into(), start.y.into()]));
            ops.push(Operation::new("l", vec![end.x.into(), end.y.into()]));
            ops.push(Operation::new("S", vec![]));
            ops.push(Operation::new("Q", vec![]));
        }
    }
}

fn encode_fill(
    rect: &PdfRect,
    fill: &Fill,
    states: &mut BTreeMap<String, f32>,
    ops: &mut Vec<Operation>,
) {
    ops.push(Operation::new("q", vec![]));
    if fill.opacity < 1.0 {
        let name = state_name(fill.opacity);
        ops.push(Operation::new("gs", vec![Object::Name(name.clone().into_bytes())]));
        states.insert(name, fill.opacity);
    }
    ops.push(color_op("rg", fill.color));
    ops.push(rect_op(rect));
    ops.push(Operation::new("f", vec![]));
    ops.push(Operation::new("Q", vec![]));
}

fn encode_border(rect: &PdfRect, border: &Stroke, ops: &mut Vec<Operation>) {
    ops.push(Operation::new("q", vec![]));
    ops.push(color_op("RG", border.color));
    ops.push(Operation::new("w", vec![border.width.into()]));
    ops.push(rect_op(rect));
    ops.push(Operation::new("S", vec![]));
    ops.push(Operation::new("Q", vec![]));
}

fn rect_op(rect: &PdfRect) -> Operation {
    Operation::new(
        "re",
        vec![rect.x.into(), rect.y.into(), rect.width.into(), rect.height.into()],
    )
}

fn color_op(operator: &str, color: RgbColor) -> Operation {
    Operation::new(operator, vec![color.r.into(), color.g.into(), color.b.into()])
}
