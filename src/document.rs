//! Master Document - Single Source of Truth
//!
//! One master design (hero image + ordered placed objects) from which all
//! artboards derive. Coordinates live in master pixel space; scaling to a
//! given artboard happens at render time, never here.
//!
//! Mutation goes through `DocumentCommand` so every edit has an inverse; the
//! raw mutators are crate-private on purpose.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::Pixmap;
use uuid::Uuid;

use crate::color::Rgb;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Image decode failed: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Unsupported image dimensions {0}x{1}")]
    BadDimensions(u32, u32),

    #[error("Object index {0} out of bounds (document has {1} objects)")]
    IndexOutOfBounds(usize, usize),
}

/// Decoded image owned by the document (hero) or by a logo object.
///
/// Cheap to clone: the pixel surface is shared. Identity (not pixel content)
/// drives equality so undo/redo of hero swaps stays O(1).
#[derive(Debug, Clone)]
pub struct ImageHandle {
    id: Uuid,
    surface: Arc<Pixmap>,
}

impl ImageHandle {
    /// Decode PNG/JPEG bytes into a drawable surface.
    pub fn decode(bytes: &[u8]) -> Result<Self, DocumentError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        let mut surface =
            Pixmap::new(width, height).ok_or(DocumentError::BadDimensions(width, height))?;

        // tiny-skia stores premultiplied RGBA
        for (dst, src) in surface.pixels_mut().iter_mut().zip(decoded.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        Ok(Self {
            id: Uuid::new_v4(),
            surface: Arc::new(surface),
        })
    }

    pub fn from_pixmap(surface: Pixmap) -> Self {
        Self {
            id: Uuid::new_v4(),
            surface: Arc::new(surface),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn surface(&self) -> &Pixmap {
        &self.surface
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// A positioned text block. `x`/`y` anchor the first line's baseline; the
/// alignment decides whether `x` is the left, center, or right edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextObject {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: Rgb,
    pub font_family: String,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub background_color: Option<Rgb>,
    pub shadow: bool,
    pub outline: bool,
}

impl Default for TextObject {
    fn default() -> Self {
        Self {
            text: String::new(),
            x: 0.0,
            y: 0.0,
            size: 48.0,
            color: Rgb::BLACK,
            font_family: "sans-serif".to_string(),
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_align: TextAlign::Left,
            line_height: 1.2,
            background_color: None,
            shadow: false,
            outline: false,
        }
    }
}

/// A positioned raster logo.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoObject {
    pub image: ImageHandle,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// An object placed on the master design. Insertion order is paint order;
/// later objects draw on top.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacedObject {
    Text(TextObject),
    Logo(LogoObject),
}

impl PlacedObject {
    pub fn position(&self) -> (f32, f32) {
        match self {
            PlacedObject::Text(t) => (t.x, t.y),
            PlacedObject::Logo(l) => (l.x, l.y),
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        match self {
            PlacedObject::Text(t) => {
                t.x = x;
                t.y = y;
            }
            PlacedObject::Logo(l) => {
                l.x = x;
                l.y = y;
            }
        }
    }
}

/// The single authoritative design all artboards derive from.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterDocument {
    width: u32,
    height: u32,
    hero: Option<ImageHandle>,
    objects: Vec<PlacedObject>,
}

impl MasterDocument {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            hero: None,
            objects: Vec::new(),
        }
    }

    /// Assemble a document in one step, e.g. when loading a saved design.
    /// History-tracked edits still go through `DocumentCommand`.
    pub fn from_parts(
        width: u32,
        height: u32,
        hero: Option<ImageHandle>,
        objects: Vec<PlacedObject>,
    ) -> Self {
        Self {
            width,
            height,
            hero,
            objects,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn hero(&self) -> Option<&ImageHandle> {
        self.hero.as_ref()
    }

    pub fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }

    // --- Raw mutators, reserved for commands ---

    pub(crate) fn set_hero_raw(&mut self, hero: Option<ImageHandle>) {
        self.hero = hero;
    }

    pub(crate) fn insert_object_raw(
        &mut self,
        index: usize,
        object: PlacedObject,
    ) -> Result<(), DocumentError> {
        if index > self.objects.len() {
            return Err(DocumentError::IndexOutOfBounds(index, self.objects.len()));
        }
        self.objects.insert(index, object);
        Ok(())
    }

    pub(crate) fn remove_object_raw(&mut self, index: usize) -> Result<PlacedObject, DocumentError> {
        if index >= self.objects.len() {
            return Err(DocumentError::IndexOutOfBounds(index, self.objects.len()));
        }
        Ok(self.objects.remove(index))
    }

    pub(crate) fn object_mut_raw(
        &mut self,
        index: usize,
    ) -> Result<&mut PlacedObject, DocumentError> {
        let len = self.objects.len();
        self.objects
            .get_mut(index)
            .ok_or(DocumentError::IndexOutOfBounds(index, len))
    }
}
