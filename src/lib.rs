//! Artboard Core - Marketing Collateral Engine
//!
//! One master design in, many sized deliverables out:
//! 1. The master document is the single source of truth
//! 2. Every edit is reversible through the command stack
//! 3. Artboards are derived, never edited in place
//! 4. Coordinates live in master space; scaling happens at render time
//! 5. Export never mutates the document

pub mod artboard;
pub mod color;
pub mod commands;
pub mod document;
pub mod export;
pub mod fit;
pub mod presets;
pub mod text;

pub use artboard::{Artboard, ArtboardGenerator, ArtboardOverrides, GenerateError, HeroSettings};
pub use color::{cmyk_to_rgb, rgb_to_cmyk, soft_proof, ColorMode, Rgb};
pub use commands::{CommandStack, DocumentCommand, DEFAULT_HISTORY_CAPACITY};
pub use document::{
    DocumentError, ImageHandle, LogoObject, MasterDocument, PlacedObject, TextObject,
};
pub use export::{export_pdf, export_single, export_zip, ExportError, RasterFormat};
pub use fit::{fit, FitMode, Placement, Rect};
pub use presets::{Channel, Preset, PresetRegistry};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
