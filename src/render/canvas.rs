//! Drawing primitives over `lopdf` content streams.
//!
//! Callers work in top-down page coordinates (origin at the top-left corner,
//! y growing downwards); the canvas flips them into PDF user space.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, GenericImageView, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::render::RenderError;
use crate::render::fonts::{Font, encode_win_ansi};

/// US Letter, in points.
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

/// Bezier handle length for quarter circles.
const KAPPA: f32 = 0.552_284_8;

/// Quality used when an embedded image has to be re-encoded.
const EMBED_JPEG_QUALITY: u8 = 90;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb(f32, f32, f32);

impl Rgb {
    pub const fn hex(value: u32) -> Self {
        Self(
            ((value >> 16) & 0xFF) as f32 / 255.0,
            ((value >> 8) & 0xFF) as f32 / 255.0,
            (value & 0xFF) as f32 / 255.0,
        )
    }

    fn operands(self) -> Vec<Object> {
        vec![self.0.into(), self.1.into(), self.2.into()]
    }
}

/// JPEG payload ready to become an image XObject.
pub struct EmbeddedImage {
    width: u32,
    height: u32,
    jpeg: Vec<u8>,
}

impl EmbeddedImage {
    /// Loads an image file, keeping RGB JPEG data as-is and re-encoding
    /// anything else.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let bytes = fs::read(path)?;
        let format = image::guess_format(&bytes)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        let (width, height) = decoded.dimensions();

        let jpeg = if format == ImageFormat::Jpeg && decoded.color() == ColorType::Rgb8 {
            bytes
        } else {
            let mut buffer = Vec::new();
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, EMBED_JPEG_QUALITY);
            encoder.encode_image(&decoded.to_rgb8())?;
            buffer
        };

        Ok(Self {
            width,
            height,
            jpeg,
        })
    }

    /// Like [`EmbeddedImage::load`], but a file that is gone yields `None`
    /// and an undecodable one is logged and skipped.
    pub fn load_optional(path: &Path) -> Option<Self> {
        match Self::load(path) {
            Ok(image) => Some(image),
            Err(RenderError::Io(e)) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Skipping image {}: {e}", path.display());
                None
            }
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// An image registered in the document, usable from any page.
#[derive(Clone, Debug)]
pub struct ImageHandle {
    name: String,
    id: ObjectId,
    aspect_ratio: f32,
}

impl ImageHandle {
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }
}

/// Operations for a single page plus the XObjects it references.
pub struct PageCanvas {
    operations: Vec<Operation>,
    xobjects: Vec<(String, ObjectId)>,
}

impl Default for PageCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCanvas {
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            xobjects: Vec::new(),
        }
    }

    fn flip(y: f32) -> f32 {
        PAGE_HEIGHT - y
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    pub fn save_state(&mut self) {
        self.op("q", vec![]);
    }

    pub fn restore_state(&mut self) {
        self.op("Q", vec![]);
    }

    /// Draws one line of text whose line box starts at `top`.
    pub fn text(&mut self, font: Font, size: f32, color: Rgb, x: f32, top: f32, text: &str) {
        let baseline = Self::flip(top + font.ascent(size));
        self.op("BT", vec![]);
        self.op(
            "Tf",
            vec![
                Object::Name(font.resource_name().as_bytes().to_vec()),
                size.into(),
            ],
        );
        self.op("rg", color.operands());
        self.op("Td", vec![x.into(), baseline.into()]);
        self.op(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        );
        self.op("ET", vec![]);
    }

    /// Draws `text` horizontally centered inside `[left, left + width]`.
    #[allow(clippy::too_many_arguments)]
    pub fn text_centered(
        &mut self,
        font: Font,
        size: f32,
        color: Rgb,
        left: f32,
        width: f32,
        top: f32,
        text: &str,
    ) {
        let x = left + (width - font.text_width(text, size)) / 2.0;
        self.text(font, size, color, x, top, text);
    }

    pub fn horizontal_rule(&mut self, x1: f32, x2: f32, y: f32, color: Rgb, line_width: f32) {
        self.save_state();
        self.op("RG", color.operands());
        self.op("w", vec![line_width.into()]);
        self.op("m", vec![x1.into(), Self::flip(y).into()]);
        self.op("l", vec![x2.into(), Self::flip(y).into()]);
        self.op("S", vec![]);
        self.restore_state();
    }

    fn rounded_rect_path(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32) {
        let r = radius.min(width / 2.0).min(height / 2.0);
        let k = r * KAPPA;
        let left = x;
        let right = x + width;
        let top = Self::flip(y);
        let bottom = Self::flip(y + height);

        self.op("m", vec![(left + r).into(), top.into()]);
        self.op("l", vec![(right - r).into(), top.into()]);
        self.op(
            "c",
            vec![
                (right - r + k).into(),
                top.into(),
                right.into(),
                (top - r + k).into(),
                right.into(),
                (top - r).into(),
            ],
        );
        self.op("l", vec![right.into(), (bottom + r).into()]);
        self.op(
            "c",
            vec![
                right.into(),
                (bottom + r - k).into(),
                (right - r + k).into(),
                bottom.into(),
                (right - r).into(),
                bottom.into(),
            ],
        );
        self.op("l", vec![(left + r).into(), bottom.into()]);
        self.op(
            "c",
            vec![
                (left + r - k).into(),
                bottom.into(),
                left.into(),
                (bottom + r - k).into(),
                left.into(),
                (bottom + r).into(),
            ],
        );
        self.op("l", vec![left.into(), (top - r).into()]);
        self.op(
            "c",
            vec![
                left.into(),
                (top - r + k).into(),
                (left + r - k).into(),
                top.into(),
                (left + r).into(),
                top.into(),
            ],
        );
        self.op("h", vec![]);
    }

    /// Filled and outlined rounded rectangle.
    #[allow(clippy::too_many_arguments)]
    pub fn rounded_panel(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        fill: Rgb,
        stroke: Rgb,
    ) {
        self.save_state();
        self.op("rg", fill.operands());
        self.op("RG", stroke.operands());
        self.rounded_rect_path(x, y, width, height, radius);
        self.op("B", vec![]);
        self.restore_state();
    }

    /// Restricts subsequent drawing to a rounded rectangle. Pair with
    /// [`PageCanvas::restore_state`].
    pub fn clip_rounded(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32) {
        self.save_state();
        self.rounded_rect_path(x, y, width, height, radius);
        self.op("W", vec![]);
        self.op("n", vec![]);
    }

    /// Paints an image stretched to the given box.
    pub fn image(&mut self, image: &ImageHandle, x: f32, y: f32, width: f32, height: f32) {
        if !self.xobjects.iter().any(|(name, _)| name == &image.name) {
            self.xobjects.push((image.name.clone(), image.id));
        }
        self.save_state();
        self.op(
            "cm",
            vec![
                width.into(),
                0.into(),
                0.into(),
                height.into(),
                x.into(),
                Self::flip(y + height).into(),
            ],
        );
        self.op("Do", vec![Object::Name(image.name.as_bytes().to_vec())]);
        self.restore_state();
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

/// Accumulates pages and shared resources into a `lopdf` document.
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    fonts: Dictionary,
    page_ids: Vec<ObjectId>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for font in [Font::Regular, Font::Bold] {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), font_id);
        }

        Self {
            doc,
            pages_id,
            fonts,
            page_ids: Vec::new(),
        }
    }

    /// Adds the image as an XObject and returns a handle for drawing it.
    pub fn embed_image(&mut self, image: EmbeddedImage) -> ImageHandle {
        let aspect_ratio = image.aspect_ratio();
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.jpeg,
        );
        let id = self.doc.add_object(Object::Stream(stream));
        ImageHandle {
            name: format!("Im{}", id.0),
            id,
            aspect_ratio,
        }
    }

    pub fn add_page(&mut self, page: PageCanvas) -> Result<(), RenderError> {
        let content = Content {
            operations: page.operations,
        };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, encoded)));

        let mut xobjects = Dictionary::new();
        for (name, id) in page.xobjects {
            xobjects.set(name.into_bytes(), id);
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => dictionary! {
                "Font" => self.fonts.clone(),
                "XObject" => xobjects,
            },
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Finalizes the page tree and serializes the document.
    pub fn write_to<W: Write>(mut self, target: &mut W) -> Result<(), RenderError> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| (*id).into()).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        self.doc
            .save_to(target)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(())
    }
}
