//! Preset Catalog - Named Target Sizes
//!
//! A preset names one deliverable size (social post, poster, banner) either
//! in millimeters or in explicit pixels. Millimeter sizes resolve at the
//! 300 dpi reference scale regardless of the export DPI parameter.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Pixels per millimeter at the 300 dpi reference (300 / 25.4).
pub const MM_TO_PX: f64 = 11.811;

pub fn mm_to_px(mm: f64) -> u32 {
    (mm * MM_TO_PX).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Print,
    Digital,
    Social,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub width_mm: Option<f64>,
    #[serde(default)]
    pub height_mm: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    pub channel: Channel,
    pub category: String,
}

impl Preset {
    /// Pixel-sized preset for digital/social use.
    pub fn pixels(name: &str, width: u32, height: u32, channel: Channel, category: &str) -> Self {
        Self {
            name: name.to_string(),
            width_mm: None,
            height_mm: None,
            width: Some(width),
            height: Some(height),
            channel,
            category: category.to_string(),
        }
    }

    /// Millimeter-sized preset for print use.
    pub fn millimeters(name: &str, width_mm: f64, height_mm: f64, category: &str) -> Self {
        Self {
            name: name.to_string(),
            width_mm: Some(width_mm),
            height_mm: Some(height_mm),
            width: None,
            height: None,
            channel: Channel::Print,
            category: category.to_string(),
        }
    }

    /// Resolved pixel width: explicit pixels win over millimeters.
    pub fn pixel_width(&self) -> Option<u32> {
        self.width.or_else(|| self.width_mm.map(mm_to_px))
    }

    pub fn pixel_height(&self) -> Option<u32> {
        self.height.or_else(|| self.height_mm.map(mm_to_px))
    }

    /// Both dimensions, if the preset is fully sized.
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        match (self.pixel_width(), self.pixel_height()) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// Preset registry - loads and holds the preset catalog in definition order.
#[derive(Debug, Default)]
pub struct PresetRegistry {
    presets: Vec<Preset>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self { presets: Vec::new() }
    }

    /// Load every `*.json` preset file from a directory. Files may hold a
    /// single preset or an array of presets; unreadable files are skipped.
    pub fn load_from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut registry = Self::new();
        if dir.exists() {
            let mut paths: Vec<_> = fs::read_dir(dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().map_or(false, |e| e == "json"))
                .collect();
            paths.sort();
            for path in paths {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(batch) = serde_json::from_str::<Vec<Preset>>(&content) {
                        for preset in batch {
                            registry.register(preset);
                        }
                    } else if let Ok(preset) = serde_json::from_str::<Preset>(&content) {
                        registry.register(preset);
                    } else {
                        log::warn!("Skipping unparseable preset file {}", path.display());
                    }
                }
            }
        }
        Ok(registry)
    }

    pub fn register(&mut self, preset: Preset) {
        if let Some(existing) = self.presets.iter_mut().find(|p| p.name == preset.name) {
            *existing = preset;
        } else {
            self.presets.push(preset);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn list(&self) -> &[Preset] {
        &self.presets
    }

    pub fn by_channel(&self, channel: Channel) -> Vec<&Preset> {
        self.presets.iter().filter(|p| p.channel == channel).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mm_resolution_uses_300dpi_reference() {
        // A4: 210x297mm
        let a4 = Preset::millimeters("a4-poster", 210.0, 297.0, "poster");
        assert_eq!(a4.pixel_size(), Some((2480, 3508)));
    }

    #[test]
    fn explicit_pixels_win_over_millimeters() {
        let mut p = Preset::millimeters("mixed", 210.0, 297.0, "poster");
        p.width = Some(1000);
        p.height = Some(500);
        assert_eq!(p.pixel_size(), Some((1000, 500)));
    }

    #[test]
    fn load_from_dir_reads_json_and_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("digital.json"),
            r#"[{"name":"ig-post","width":1080,"height":1080,"channel":"social","category":"post"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("print.json"),
            r#"{"name":"a4-poster","widthMm":210.0,"heightMm":297.0,"channel":"print","category":"poster"}"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "not a preset").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = PresetRegistry::load_from_dir(dir.path()).unwrap();
        assert_eq!(registry.list().len(), 2);
        assert_eq!(registry.get("ig-post").unwrap().pixel_size(), Some((1080, 1080)));
        assert_eq!(registry.get("a4-poster").unwrap().pixel_size(), Some((2480, 3508)));
    }

    #[test]
    fn by_channel_filters_and_keeps_order() {
        let mut registry = PresetRegistry::new();
        registry.register(Preset::pixels("ig-post", 1080, 1080, Channel::Social, "post"));
        registry.register(Preset::millimeters("a4-poster", 210.0, 297.0, "poster"));
        registry.register(Preset::pixels("ig-story", 1080, 1920, Channel::Social, "story"));

        let social: Vec<_> = registry
            .by_channel(Channel::Social)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(social, ["ig-post", "ig-story"]);
        assert_eq!(registry.by_channel(Channel::Print).len(), 1);
    }

    #[test]
    fn unsized_preset_resolves_to_none() {
        let p = Preset {
            name: "broken".to_string(),
            width_mm: None,
            height_mm: None,
            width: Some(100),
            height: None,
            channel: Channel::Digital,
            category: "misc".to_string(),
        };
        assert_eq!(p.pixel_size(), None);
    }
}
