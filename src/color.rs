//! Color Management - RGB/CMYK Conversion and Soft Proofing
//!
//! Naive device conversion, not ICC color management. CMYK channels are
//! fractional percent; rounding happens only at the RGB edge, keeping the
//! round trip within the ±1 per-channel contract.

use serde::{Deserialize, Serialize};
use tiny_skia::{BlendMode, Paint, Pixmap, Transform};

/// Working color mode for rendering and export.
///
/// Threaded explicitly through export calls; there is no process-wide flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorMode {
    #[default]
    Rgb,
    Cmyk,
}

/// Convert an RGB color (0-255 per channel) to CMYK (0.0-100.0 per channel).
///
/// Channels stay fractional; rounding to whole percent is a display concern.
/// Quantizing here would compound with the reverse conversion's rounding and
/// push the round trip outside the ±1 tolerance.
pub fn rgb_to_cmyk(r: u8, g: u8, b: u8) -> [f32; 4] {
    let c = 1.0 - r as f32 / 255.0;
    let m = 1.0 - g as f32 / 255.0;
    let y = 1.0 - b as f32 / 255.0;
    let k = c.min(m).min(y);

    if k >= 1.0 {
        // Pure black: the chromatic fractions are undefined
        return [0.0, 0.0, 0.0, 100.0];
    }

    let scale = |ch: f32| ((ch - k) / (1.0 - k)) * 100.0;
    [scale(c), scale(m), scale(y), k * 100.0]
}

/// Convert a CMYK color (0.0-100.0 per channel) back to RGB (0-255 per
/// channel).
pub fn cmyk_to_rgb(c: f32, m: f32, y: f32, k: f32) -> [u8; 3] {
    let k = k / 100.0;
    let channel = |ch: f32| (255.0 * (1.0 - ch / 100.0) * (1.0 - k)).round().clamp(0.0, 255.0) as u8;
    [channel(c), channel(m), channel(y)]
}

/// Tint drawn over the full surface when soft proofing. Low-alpha warm gray,
/// approximating ink-on-paper dullness.
const PROOF_TINT: [u8; 4] = [233, 229, 214, 30];

/// Return a soft-proof rendition of `surface`: a copy with a flat low-alpha
/// tint over the whole area. This is a visual approximation only; the input
/// surface is untouched and export always reads the original pixels.
pub fn soft_proof(surface: &Pixmap) -> Pixmap {
    let mut proofed = surface.clone();
    let full = tiny_skia::Rect::from_xywh(0.0, 0.0, surface.width() as f32, surface.height() as f32);
    if let Some(rect) = full {
        let mut paint = Paint::default();
        paint.set_color_rgba8(PROOF_TINT[0], PROOF_TINT[1], PROOF_TINT[2], PROOF_TINT[3]);
        paint.blend_mode = BlendMode::SourceOver;
        proofed.fill_rect(rect, &paint, Transform::identity(), None);
    }
    proofed
}

/// Opaque RGB color value used by text objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        // length check counts bytes; non-ASCII would split a char boundary
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Relative luminance in 0..=1, used to pick contrasting outline colors.
    pub fn luminance(&self) -> f32 {
        (0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32) / 255.0
    }

    /// Black or white, whichever contrasts more with this color.
    pub fn contrasting(&self) -> Rgb {
        if self.luminance() > 0.5 {
            Rgb::BLACK
        } else {
            Rgb::WHITE
        }
    }

    pub fn to_cmyk(&self) -> [f32; 4] {
        rgb_to_cmyk(self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_convert_exactly() {
        assert_eq!(rgb_to_cmyk(255, 0, 0), [0.0, 100.0, 100.0, 0.0]);
        assert_eq!(rgb_to_cmyk(0, 255, 0), [100.0, 0.0, 100.0, 0.0]);
        assert_eq!(rgb_to_cmyk(0, 0, 255), [100.0, 100.0, 0.0, 0.0]);
        assert_eq!(rgb_to_cmyk(255, 255, 255), [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(rgb_to_cmyk(0, 0, 0), [0.0, 0.0, 0.0, 100.0]);
        assert_eq!(Rgb::new(255, 0, 0).to_cmyk(), [0.0, 100.0, 100.0, 0.0]);
    }

    #[test]
    fn reverse_primaries() {
        assert_eq!(cmyk_to_rgb(0.0, 0.0, 0.0, 0.0), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(0.0, 0.0, 0.0, 100.0), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(0.0, 100.0, 100.0, 0.0), [255, 0, 0]);
    }

    #[test]
    fn mid_tone_round_trip_is_exact() {
        // mid tones sit on quantization boundaries; fractional channels keep
        // the reverse conversion exact
        for &(r, g, b) in &[(136, 136, 136), (17, 102, 187), (250, 3, 128)] {
            let [c, m, y, k] = rgb_to_cmyk(r, g, b);
            assert_eq!(cmyk_to_rgb(c, m, y, k), [r, g, b]);
        }
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgb::from_hex("#ff8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::from_hex("ff8000"), None);
        assert_eq!(Rgb::from_hex("#ff80"), None);
        assert_eq!(Rgb::from_hex("#gg8000"), None);
        // 6 bytes but a multibyte char; must not panic on the slice
        assert_eq!(Rgb::from_hex("#aé000"), None);
    }

    #[test]
    fn contrasting_picks_readable_color() {
        assert_eq!(Rgb::WHITE.contrasting(), Rgb::BLACK);
        assert_eq!(Rgb::BLACK.contrasting(), Rgb::WHITE);
        assert_eq!(Rgb::new(255, 240, 10).contrasting(), Rgb::BLACK);
    }
}
