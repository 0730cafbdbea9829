//! Artboard Generation
//!
//! Derives one sized, rendered artboard per preset from the master document:
//! fit+draw the hero image, then replay the placed objects at the artboard's
//! per-axis scale. Per-artboard overrides (alternate hero, hero fit settings,
//! replacement object list) are stored sparsely in the generator, keyed by
//! preset name, so they survive wholesale regeneration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::{FilterQuality, IntRect, Pixmap, PixmapPaint, Transform};

use crate::document::{ImageHandle, MasterDocument, PlacedObject};
use crate::fit::{self, FitMode, Rect};
use crate::presets::{Channel, Preset};
use crate::text::FontLibrary;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Preset '{0}' has no resolvable pixel size")]
    UnsizedPreset(String),

    #[error("Surface allocation failed for {0}x{1}")]
    Allocation(u32, u32),
}

/// Hero fit settings for one artboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeroSettings {
    pub fit_mode: FitMode,
    /// Explicit crop ratio (width / height); `None` keeps the original.
    pub aspect_ratio: Option<f32>,
}

/// Opt-in per-artboard deviations from the master document. Absent fields
/// inherit from the document verbatim; nothing here ever mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtboardOverrides {
    pub custom_objects: Option<Vec<PlacedObject>>,
    pub hero_settings: Option<HeroSettings>,
    pub custom_hero: Option<ImageHandle>,
}

impl ArtboardOverrides {
    pub fn is_empty(&self) -> bool {
        self.custom_objects.is_none()
            && self.hero_settings.is_none()
            && self.custom_hero.is_none()
    }
}

/// One rendered output at a preset's native pixel size. DPI scaling is an
/// export-time concern; the surface here is always preset-native.
#[derive(Debug, Clone)]
pub struct Artboard {
    preset: Preset,
    surface: Pixmap,
}

impl Artboard {
    pub fn preset(&self) -> &Preset {
        &self.preset
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

/// Renders artboards from a master document and keeps the sparse override
/// layer that survives regeneration.
pub struct ArtboardGenerator {
    fonts: FontLibrary,
    overrides: HashMap<String, ArtboardOverrides>,
}

impl Default for ArtboardGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtboardGenerator {
    pub fn new() -> Self {
        Self {
            fonts: FontLibrary::new(),
            overrides: HashMap::new(),
        }
    }

    /// Install (or clear, when empty) the override set for one preset.
    pub fn set_overrides(&mut self, preset_name: &str, overrides: ArtboardOverrides) {
        if overrides.is_empty() {
            self.overrides.remove(preset_name);
        } else {
            self.overrides.insert(preset_name.to_string(), overrides);
        }
    }

    pub fn overrides_for(&self, preset_name: &str) -> Option<&ArtboardOverrides> {
        self.overrides.get(preset_name)
    }

    pub fn clear_overrides(&mut self, preset_name: &str) {
        self.overrides.remove(preset_name);
    }

    /// Render one artboard. `overrides` beats the generator's stored override
    /// layer; pass `None` to use the stored layer (if any).
    pub fn generate(
        &self,
        preset: &Preset,
        document: &MasterDocument,
        overrides: Option<&ArtboardOverrides>,
    ) -> Result<Artboard, GenerateError> {
        let (width, height) = preset
            .pixel_size()
            .ok_or_else(|| GenerateError::UnsizedPreset(preset.name.clone()))?;
        let mut surface =
            Pixmap::new(width, height).ok_or(GenerateError::Allocation(width, height))?;

        let overrides = overrides
            .or_else(|| self.overrides.get(&preset.name))
            .cloned()
            .unwrap_or_default();

        let hero = overrides.custom_hero.as_ref().or_else(|| document.hero());
        if let Some(hero) = hero {
            let settings = overrides.hero_settings.unwrap_or_default();
            draw_hero(&mut surface, hero, settings, width, height);
        }

        let objects = overrides
            .custom_objects
            .as_deref()
            .unwrap_or_else(|| document.objects());
        let scale_x = width as f32 / document.width() as f32;
        let scale_y = height as f32 / document.height() as f32;

        for object in objects {
            match object {
                PlacedObject::Text(text) => {
                    self.fonts.draw(&mut surface, text, scale_x, scale_y);
                }
                PlacedObject::Logo(logo) => {
                    let dest = Rect::new(
                        logo.x * scale_x,
                        logo.y * scale_y,
                        logo.width * scale_x,
                        logo.height * scale_y,
                    );
                    blit(&mut surface, logo.image.surface(), dest);
                }
            }
        }

        log::debug!(
            "Generated artboard '{}' at {}x{} (scale {:.3}x{:.3})",
            preset.name,
            width,
            height,
            scale_x,
            scale_y
        );

        Ok(Artboard {
            preset: preset.clone(),
            surface,
        })
    }

    /// Render every sized preset, optionally filtered by channel. Presets
    /// without a resolvable size are skipped.
    pub fn generate_all(
        &self,
        presets: &[Preset],
        document: &MasterDocument,
        channel: Option<Channel>,
    ) -> Vec<Artboard> {
        presets
            .iter()
            .filter(|p| channel.map_or(true, |c| p.channel == c))
            .filter_map(|preset| match self.generate(preset, document, None) {
                Ok(artboard) => Some(artboard),
                Err(GenerateError::UnsizedPreset(name)) => {
                    log::warn!("Skipping unsized preset '{}'", name);
                    None
                }
                Err(e) => {
                    log::warn!("Skipping preset '{}': {}", preset.name, e);
                    None
                }
            })
            .collect()
    }
}

fn draw_hero(
    surface: &mut Pixmap,
    hero: &ImageHandle,
    settings: HeroSettings,
    width: u32,
    height: u32,
) {
    let placement = fit::fit(
        hero.width() as f32,
        hero.height() as f32,
        Rect::from_size(width as f32, height as f32),
        settings.fit_mode,
        settings.aspect_ratio,
    );

    match placement.source {
        Some(crop) => {
            let rect = IntRect::from_xywh(
                crop.x.round() as i32,
                crop.y.round() as i32,
                (crop.width.round() as u32).max(1),
                (crop.height.round() as u32).max(1),
            );
            if let Some(cropped) = rect.and_then(|r| hero.surface().clone_rect(r)) {
                blit(surface, &cropped, placement.draw);
            }
        }
        None => blit(surface, hero.surface(), placement.draw),
    }
}

/// Scale-draw `image` into `dest` on `surface` with bilinear filtering.
fn blit(surface: &mut Pixmap, image: &Pixmap, dest: Rect) {
    if dest.width <= 0.0 || dest.height <= 0.0 {
        return;
    }
    let scale_x = dest.width / image.width() as f32;
    let scale_y = dest.height / image.height() as f32;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    surface.draw_pixmap(
        0,
        0,
        image.as_ref(),
        &paint,
        Transform::from_row(scale_x, 0.0, 0.0, scale_y, dest.x, dest.y),
        None,
    );
}
