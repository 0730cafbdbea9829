//! Text Rendering - System-Font Glyph Rasterization
//!
//! Draws `TextObject`s onto artboard surfaces: glyph outlines come from
//! system fonts (`fontdb` lookup, `ttf-parser` outlines) and are filled with
//! tiny-skia. No shaping or kerning; glyphs advance by their horizontal
//! metrics, which is sufficient for display/headline collateral text.
//!
//! All geometry is computed in master-document space and mapped onto the
//! artboard by a per-axis scale transform, so positions, sizes, and line
//! advances all follow the artboard's (possibly non-uniform) scale.

use std::sync::Once;

use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::document::{FontStyle, FontWeight, TextAlign, TextObject};

/// Fallback advance per character (fraction of font size) when no usable
/// font is installed and only box metrics can be estimated.
const FALLBACK_ADVANCE: f32 = 0.6;

static NO_FONT_WARNING: Once = Once::new();

/// Resolved geometry for one text object, in master-document units.
struct TextLayout {
    /// Filled glyph outlines for every line, already aligned.
    path: Option<tiny_skia::Path>,
    /// Widest line.
    width: f32,
    /// Distance from the first baseline up to the text top.
    ascent: f32,
    /// Distance from the last baseline down to the text bottom.
    descent: f32,
    /// Leftmost x across lines after alignment.
    left: f32,
    line_count: usize,
}

/// System font lookup plus glyph rasterization.
pub struct FontLibrary {
    db: fontdb::Database,
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl FontLibrary {
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if db.is_empty() {
            log::warn!("No system fonts found, text will render without glyphs");
        }
        Self { db }
    }

    /// Measured bounds of `obj` in master units: (width, height).
    pub fn measure(&self, obj: &TextObject) -> (f32, f32) {
        let layout = self.layout(obj);
        (
            layout.width,
            layout.ascent + layout.descent + (layout.line_count.saturating_sub(1)) as f32
                * obj.size * obj.line_height,
        )
    }

    /// Draw `obj` onto `surface` with the artboard's per-axis scale.
    ///
    /// Paint order: background box, outline stroke, shadow fill, plain fill.
    pub fn draw(&self, surface: &mut Pixmap, obj: &TextObject, scale_x: f32, scale_y: f32) {
        if obj.text.is_empty() || obj.size <= 0.0 {
            return;
        }

        let layout = self.layout(obj);
        let transform = Transform::from_scale(scale_x, scale_y);
        let advance = obj.size * obj.line_height;

        if let Some(bg) = obj.background_color {
            let pad = obj.size * 0.15;
            let height =
                layout.ascent + layout.descent + (layout.line_count - 1) as f32 * advance;
            if let Some(rect) = tiny_skia::Rect::from_xywh(
                layout.left - pad,
                obj.y - layout.ascent - pad,
                layout.width + pad * 2.0,
                height + pad * 2.0,
            ) {
                let mut paint = Paint::default();
                paint.set_color_rgba8(bg.r, bg.g, bg.b, 255);
                paint.anti_alias = true;
                surface.fill_rect(rect, &paint, transform, None);
            }
        }

        let path = match &layout.path {
            Some(path) => path,
            None => {
                NO_FONT_WARNING.call_once(|| {
                    log::warn!(
                        "Font '{}' unavailable and no fallback face, skipping glyphs",
                        obj.font_family
                    );
                });
                return;
            }
        };

        if obj.outline {
            let contrast = obj.color.contrasting();
            let mut paint = Paint::default();
            paint.set_color_rgba8(contrast.r, contrast.g, contrast.b, 255);
            paint.anti_alias = true;
            let stroke = Stroke {
                width: (obj.size * 0.05).max(1.5),
                ..Stroke::default()
            };
            surface.stroke_path(path, &paint, &stroke, transform, None);
        }

        if obj.shadow {
            let offset = (obj.size * 0.06).max(2.0);
            let mut paint = Paint::default();
            paint.set_color_rgba8(0, 0, 0, 128);
            paint.anti_alias = true;
            let shadow_transform = transform.post_translate(offset * scale_x, offset * scale_y);
            surface.fill_path(path, &paint, FillRule::Winding, shadow_transform, None);
        }

        let mut paint = Paint::default();
        paint.set_color_rgba8(obj.color.r, obj.color.g, obj.color.b, 255);
        paint.anti_alias = true;
        surface.fill_path(path, &paint, FillRule::Winding, transform, None);
    }

    fn layout(&self, obj: &TextObject) -> TextLayout {
        let lines: Vec<&str> = obj.text.split('\n').collect();
        let advance = obj.size * obj.line_height;

        let built = self.face_id(obj).and_then(|id| {
            self.db
                .with_face_data(id, |data, index| build_glyph_layout(data, index, obj, &lines, advance))
                .flatten()
        });

        if let Some(layout) = built {
            return layout;
        }

        // No face: estimate box metrics so backgrounds still size sensibly.
        let width = lines
            .iter()
            .map(|l| l.chars().count() as f32 * obj.size * FALLBACK_ADVANCE)
            .fold(0.0, f32::max);
        TextLayout {
            path: None,
            width,
            ascent: obj.size * 0.8,
            descent: obj.size * 0.2,
            left: aligned_left(obj, width),
            line_count: lines.len(),
        }
    }

    fn face_id(&self, obj: &TextObject) -> Option<fontdb::ID> {
        let primary = match obj.font_family.as_str() {
            "sans-serif" => fontdb::Family::SansSerif,
            "serif" => fontdb::Family::Serif,
            "monospace" => fontdb::Family::Monospace,
            name => fontdb::Family::Name(name),
        };
        let query = fontdb::Query {
            families: &[primary, fontdb::Family::SansSerif],
            weight: match obj.font_weight {
                FontWeight::Normal => fontdb::Weight::NORMAL,
                FontWeight::Bold => fontdb::Weight::BOLD,
            },
            stretch: fontdb::Stretch::Normal,
            style: match obj.font_style {
                FontStyle::Normal => fontdb::Style::Normal,
                FontStyle::Italic => fontdb::Style::Italic,
            },
        };
        self.db.query(&query)
    }
}

/// Where the leftmost edge of a line of `width` lands given the alignment
/// anchor at `obj.x`.
fn aligned_left(obj: &TextObject, width: f32) -> f32 {
    match obj.text_align {
        TextAlign::Left => obj.x,
        TextAlign::Center => obj.x - width / 2.0,
        TextAlign::Right => obj.x - width,
    }
}

fn build_glyph_layout(
    data: &[u8],
    index: u32,
    obj: &TextObject,
    lines: &[&str],
    advance: f32,
) -> Option<TextLayout> {
    let face = ttf_parser::Face::parse(data, index).ok()?;
    let units = face.units_per_em() as f32;
    let scale = obj.size / units;

    let line_widths: Vec<f32> = lines
        .iter()
        .map(|line| {
            line.chars()
                .map(|ch| char_advance(&face, ch, scale, obj.size))
                .sum()
        })
        .collect();
    let width = line_widths.iter().copied().fold(0.0, f32::max);

    let mut builder = PathBuilder::new();
    let mut left = f32::MAX;
    for (i, line) in lines.iter().enumerate() {
        let mut pen_x = aligned_left(obj, line_widths[i]);
        left = left.min(pen_x);
        let baseline = obj.y + i as f32 * advance;
        for ch in line.chars() {
            if let Some(glyph) = face.glyph_index(ch) {
                let mut sink = GlyphSink {
                    builder: &mut builder,
                    scale,
                    x: pen_x,
                    y: baseline,
                };
                face.outline_glyph(glyph, &mut sink);
            }
            pen_x += char_advance(&face, ch, scale, obj.size);
        }
    }
    if left == f32::MAX {
        left = obj.x;
    }

    Some(TextLayout {
        path: builder.finish(),
        width,
        ascent: face.ascender() as f32 * scale,
        descent: -(face.descender() as f32) * scale,
        left,
        line_count: lines.len(),
    })
}

fn char_advance(face: &ttf_parser::Face, ch: char, scale: f32, size: f32) -> f32 {
    match face.glyph_index(ch) {
        Some(glyph) => face
            .glyph_hor_advance(glyph)
            .map(|adv| adv as f32 * scale)
            .unwrap_or(size * FALLBACK_ADVANCE),
        None => size * FALLBACK_ADVANCE,
    }
}

/// Bridges ttf-parser outlines into a tiny-skia path, flipping the y axis
/// (font units are y-up, the surface is y-down).
struct GlyphSink<'a> {
    builder: &'a mut PathBuilder,
    scale: f32,
    x: f32,
    y: f32,
}

impl ttf_parser::OutlineBuilder for GlyphSink<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(self.x + x * self.scale, self.y - y * self.scale);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.x + x * self.scale, self.y - y * self.scale);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(
            self.x + x1 * self.scale,
            self.y - y1 * self.scale,
            self.x + x * self.scale,
            self.y - y * self.scale,
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(
            self.x + x1 * self.scale,
            self.y - y1 * self.scale,
            self.x + x2 * self.scale,
            self.y - y2 * self.scale,
            self.x + x * self.scale,
            self.y - y * self.scale,
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These hold with real system fonts and with the advance-estimate
    // fallback, so they do not depend on what the host has installed.
    #[test]
    fn measure_grows_with_content() {
        let fonts = FontLibrary::new();
        let short = TextObject {
            text: "Hi".to_string(),
            ..Default::default()
        };
        let long = TextObject {
            text: "Hi there, world".to_string(),
            ..Default::default()
        };
        let (short_w, short_h) = fonts.measure(&short);
        let (long_w, _) = fonts.measure(&long);
        assert!(short_w > 0.0);
        assert!(long_w > short_w);

        let stacked = TextObject {
            text: "Hi\nHi".to_string(),
            ..Default::default()
        };
        let (_, stacked_h) = fonts.measure(&stacked);
        assert!(stacked_h > short_h);
    }
}
