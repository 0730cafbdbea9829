//! Fit Engine - Pure Image Fitting Math
//!
//! Maps a source image and a target rectangle to a draw rectangle (and an
//! optional source crop) under one of six fit modes. No I/O, no surfaces.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle of the given size anchored at the origin.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// How a source image is scaled/cropped into a target rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// Scale to fully cover the target, centered, excess cropped.
    #[default]
    Cover,
    /// Scale to fit entirely inside the target, centered, letterboxed.
    Contain,
    /// Non-uniform stretch to exactly match the target.
    Fill,
    /// Contain, but never upscale.
    ScaleDown,
    /// No scaling; native size, centered.
    None,
    /// Center-crop the source to the target's own aspect ratio.
    Crop,
}

/// Result of a fit computation.
///
/// `draw` is where the (possibly cropped) source should land in target space.
/// `source` is the crop region in source space; absent means the whole image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub draw: Rect,
    pub source: Option<Rect>,
}

/// Compute the placement of a `source_width x source_height` image inside
/// `target` under `mode`.
///
/// `aspect_ratio` (width / height) constrains cover/contain/fill as described
/// on each mode; `Crop` always uses the target's own ratio and ignores it.
pub fn fit(
    source_width: f32,
    source_height: f32,
    target: Rect,
    mode: FitMode,
    aspect_ratio: Option<f32>,
) -> Placement {
    match mode {
        FitMode::Cover => {
            let source = aspect_ratio.map(|r| crop_to_aspect(source_width, source_height, r));
            let (sw, sh) = source
                .map(|s| (s.width, s.height))
                .unwrap_or((source_width, source_height));
            let scale = (target.width / sw).max(target.height / sh);
            Placement {
                draw: center_in(target, sw * scale, sh * scale),
                source,
            }
        }
        FitMode::Contain => {
            let inner = reduce_to_aspect(target, aspect_ratio);
            let scale = (inner.width / source_width).min(inner.height / source_height);
            Placement {
                draw: center_in(inner, source_width * scale, source_height * scale),
                source: None,
            }
        }
        FitMode::Fill => Placement {
            draw: reduce_to_aspect(target, aspect_ratio),
            source: None,
        },
        FitMode::ScaleDown => {
            let inner = reduce_to_aspect(target, aspect_ratio);
            let scale = (inner.width / source_width)
                .min(inner.height / source_height)
                .min(1.0);
            Placement {
                draw: center_in(inner, source_width * scale, source_height * scale),
                source: None,
            }
        }
        FitMode::None => Placement {
            draw: center_in(target, source_width, source_height),
            source: None,
        },
        FitMode::Crop => Placement {
            draw: target,
            source: Some(crop_to_aspect(source_width, source_height, target.aspect())),
        },
    }
}

/// Centered sub-rectangle of the target at the given aspect ratio, or the
/// target itself when no ratio is requested.
fn reduce_to_aspect(target: Rect, aspect_ratio: Option<f32>) -> Rect {
    match aspect_ratio {
        Some(ratio) if ratio > 0.0 => {
            if target.aspect() > ratio {
                center_in(target, target.height * ratio, target.height)
            } else {
                center_in(target, target.width, target.width / ratio)
            }
        }
        _ => target,
    }
}

/// Centered crop of a `width x height` source down to `ratio`, trimming the
/// longer dimension.
fn crop_to_aspect(width: f32, height: f32, ratio: f32) -> Rect {
    if width / height > ratio {
        let crop_w = height * ratio;
        Rect::new((width - crop_w) / 2.0, 0.0, crop_w, height)
    } else {
        let crop_h = width / ratio;
        Rect::new(0.0, (height - crop_h) / 2.0, width, crop_h)
    }
}

fn center_in(container: Rect, width: f32, height: f32) -> Rect {
    Rect::new(
        container.x + (container.width - width) / 2.0,
        container.y + (container.height - height) / 2.0,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn cover_landscape_into_square() {
        // 2000x1000 into 500x500: scale 0.5, draw 1000x500 centered
        let p = fit(2000.0, 1000.0, Rect::from_size(500.0, 500.0), FitMode::Cover, None);
        assert!(approx(p.draw.width, 1000.0));
        assert!(approx(p.draw.height, 500.0));
        assert!(approx(p.draw.x, -250.0));
        assert!(approx(p.draw.y, 0.0));
        assert!(p.source.is_none());
    }

    #[test]
    fn cover_with_explicit_ratio_crops_source_first() {
        let p = fit(2000.0, 1000.0, Rect::from_size(400.0, 400.0), FitMode::Cover, Some(1.0));
        let src = p.source.unwrap();
        assert!(approx(src.width, 1000.0));
        assert!(approx(src.height, 1000.0));
        assert!(approx(src.x, 500.0));
        assert!(approx(src.y, 0.0));
        // cropped square covers the square target exactly
        assert!(approx(p.draw.width, 400.0));
        assert!(approx(p.draw.height, 400.0));
    }

    #[test]
    fn contain_letterboxes() {
        let p = fit(2000.0, 1000.0, Rect::from_size(500.0, 500.0), FitMode::Contain, None);
        assert!(approx(p.draw.width, 500.0));
        assert!(approx(p.draw.height, 250.0));
        assert!(approx(p.draw.y, 125.0));
    }

    #[test]
    fn contain_with_ratio_reduces_target() {
        let p = fit(100.0, 100.0, Rect::from_size(600.0, 300.0), FitMode::Contain, Some(1.0));
        // target shrinks to a centered 300x300, image fills it
        assert!(approx(p.draw.width, 300.0));
        assert!(approx(p.draw.height, 300.0));
        assert!(approx(p.draw.x, 150.0));
    }

    #[test]
    fn fill_stretches_exactly() {
        let p = fit(123.0, 456.0, Rect::from_size(500.0, 200.0), FitMode::Fill, None);
        assert_eq!(p.draw, Rect::from_size(500.0, 200.0));
    }

    #[test]
    fn scale_down_never_upscales() {
        let p = fit(100.0, 100.0, Rect::from_size(500.0, 500.0), FitMode::ScaleDown, None);
        assert!(approx(p.draw.width, 100.0));
        assert!(approx(p.draw.x, 200.0));
    }

    #[test]
    fn crop_uses_container_ratio() {
        let p = fit(2000.0, 1000.0, Rect::from_size(500.0, 500.0), FitMode::Crop, None);
        let src = p.source.unwrap();
        assert!(approx(src.width, 1000.0));
        assert!(approx(src.height, 1000.0));
        assert!(approx(src.x, 500.0));
        assert_eq!(p.draw, Rect::from_size(500.0, 500.0));
    }

    #[test]
    fn none_centers_native_size() {
        let p = fit(100.0, 50.0, Rect::from_size(500.0, 250.0), FitMode::None, None);
        assert!(approx(p.draw.x, 200.0));
        assert!(approx(p.draw.y, 100.0));
        assert!(approx(p.draw.width, 100.0));
    }
}
