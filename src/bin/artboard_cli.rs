//! Artboard CLI - Bridge interface for the editor shell
//!
//! Commands: presets, generate, export
//! Outputs JSON to stdout
//! Returns non-zero on rejected input or failed export

use std::path::PathBuf;
use std::process::ExitCode;

use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use artboard_core::{
    export_pdf, export_single, export_zip, ArtboardGenerator, ArtboardOverrides, Channel,
    ColorMode, HeroSettings, ImageHandle, LogoObject, MasterDocument, PlacedObject, Preset,
    PresetRegistry, RasterFormat, TextObject, ENGINE_VERSION,
};

#[derive(Parser)]
#[command(name = "artboard-cli")]
#[command(about = "Artboard CLI - Marketing Collateral Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the preset catalog directory
    #[arg(short, long, default_value = "presets")]
    presets_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List available presets
    Presets,

    /// Generate artboards and return them as PNG manifests
    Generate {
        /// Preset name; omit to generate every sized preset
        #[arg(short = 't', long)]
        preset: Option<String>,

        /// JSON payload (DocumentSpec)
        #[arg(short, long)]
        payload: String,
    },

    /// Export artboards as raster files, a ZIP bundle, or a PDF
    Export {
        /// Output kind
        #[arg(short, long)]
        kind: ExportKind,

        /// Export DPI (rasters and ZIP; artboards are authored at 72)
        #[arg(short, long, default_value_t = 72)]
        dpi: u32,

        /// Keep transparency in ZIP entries instead of flattening to white
        #[arg(long, default_value_t = false)]
        transparent: bool,

        /// JSON payload (ExportRequest)
        #[arg(short, long)]
        payload: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Png,
    Jpeg,
    Zip,
    Pdf,
}

/// Wire form of the master document. Images travel base64-encoded.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentSpec {
    width: u32,
    height: u32,
    #[serde(default)]
    hero_base64: Option<String>,
    #[serde(default)]
    objects: Vec<ObjectSpec>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ObjectSpec {
    Text(TextObject),
    Logo {
        image_base64: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportRequest {
    document: DocumentSpec,
    /// Preset names to export; omit for every sized preset
    #[serde(default)]
    presets: Option<Vec<String>>,
    /// Restrict to one channel (print | digital | social)
    #[serde(default)]
    channel: Option<Channel>,
    #[serde(default)]
    color_mode: ColorMode,
    #[serde(default)]
    hero_settings: Option<HeroSettings>,
    #[serde(default)]
    icc_profile_url: Option<String>,
}

#[derive(Serialize)]
struct ExportedFile {
    id: String,
    filename: String,
    format: String,
    size: [u32; 2],
    data_base64: String,
    hash: String,
}

#[derive(Serialize)]
struct ExportManifest {
    success: bool,
    engine_version: &'static str,
    created_at: chrono::DateTime<chrono::Utc>,
    files: Vec<ExportedFile>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let registry = match PresetRegistry::load_from_dir(&cli.presets_dir) {
        Ok(r) => r,
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to load presets: {}"}}"#, e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Presets => {
            let presets: Vec<_> = registry
                .list()
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "name": p.name,
                        "channel": p.channel,
                        "category": p.category,
                        "pixelSize": p.pixel_size(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&presets).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Generate { preset, payload } => {
            let spec: DocumentSpec = match serde_json::from_str(&payload) {
                Ok(s) => s,
                Err(e) => return reject(&format!("Invalid payload: {}", e)),
            };
            let document = match build_document(&spec) {
                Ok(d) => d,
                Err(e) => return reject(&e),
            };

            let mut selected = match select_presets(&registry, preset.as_deref(), None) {
                Ok(p) => p,
                Err(e) => return reject(&e),
            };
            if preset.is_none() {
                selected.retain(|p| p.pixel_size().is_some());
            }

            let generator = ArtboardGenerator::new();
            let mut files = Vec::new();
            for preset in &selected {
                let artboard = match generator.generate(preset, &document, None) {
                    Ok(a) => a,
                    Err(e) => return reject(&e.to_string()),
                };
                match export_single(&artboard, RasterFormat::Png, 72, ColorMode::Rgb) {
                    Ok(png) => files.push(manifest_file(&preset.name, "png", &artboard, png)),
                    Err(e) => return reject(&e.to_string()),
                }
            }
            print_manifest(files)
        }

        Commands::Export {
            kind,
            dpi,
            transparent,
            payload,
        } => {
            let request: ExportRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => return reject(&format!("Invalid payload: {}", e)),
            };
            let document = match build_document(&request.document) {
                Ok(d) => d,
                Err(e) => return reject(&e),
            };

            let selected = match (request.presets.as_deref(), request.channel) {
                (Some(names), _) => match select_presets(&registry, None, Some(names)) {
                    Ok(p) => p,
                    Err(e) => return reject(&e),
                },
                (None, Some(channel)) => {
                    registry.by_channel(channel).into_iter().cloned().collect()
                }
                (None, None) => registry.list().to_vec(),
            };

            let mut generator = ArtboardGenerator::new();
            if let Some(settings) = request.hero_settings {
                for preset in &selected {
                    generator.set_overrides(
                        &preset.name,
                        ArtboardOverrides {
                            hero_settings: Some(settings),
                            ..Default::default()
                        },
                    );
                }
            }

            let artboards = generator.generate_all(&selected, &document, request.channel);
            if artboards.is_empty() {
                return reject("No artboards could be generated from the selection");
            }

            let result = match kind {
                ExportKind::Png | ExportKind::Jpeg => {
                    let format = if matches!(kind, ExportKind::Png) {
                        RasterFormat::Png
                    } else {
                        RasterFormat::Jpeg
                    };
                    let ext = if format == RasterFormat::Png { "png" } else { "jpg" };
                    let mut files = Vec::new();
                    for artboard in &artboards {
                        match export_single(artboard, format, dpi, request.color_mode) {
                            Ok(bytes) => files.push(manifest_file(
                                &artboard.preset().name,
                                ext,
                                artboard,
                                bytes,
                            )),
                            Err(e) => return reject(&e.to_string()),
                        }
                    }
                    Ok(files)
                }
                ExportKind::Zip => {
                    export_zip(&artboards, dpi, transparent, request.color_mode)
                        .map(|bytes| vec![blob_file("artboards", "zip", &artboards, bytes)])
                        .map_err(|e| e.to_string())
                }
                ExportKind::Pdf => export_pdf(
                    &artboards,
                    request.color_mode,
                    request.icc_profile_url.as_deref(),
                )
                .map(|bytes| vec![blob_file("artboards", "pdf", &artboards, bytes)])
                .map_err(|e| e.to_string()),
            };

            match result {
                Ok(files) => print_manifest(files),
                Err(e) => reject(&e),
            }
        }
    }
}

fn build_document(spec: &DocumentSpec) -> Result<MasterDocument, String> {
    let b64 = base64::engine::general_purpose::STANDARD;

    let hero = match &spec.hero_base64 {
        Some(data) => {
            let bytes = b64
                .decode(data)
                .map_err(|e| format!("Invalid hero image encoding: {}", e))?;
            Some(ImageHandle::decode(&bytes).map_err(|e| e.to_string())?)
        }
        None => None,
    };

    let mut objects = Vec::with_capacity(spec.objects.len());
    for obj in &spec.objects {
        match obj {
            ObjectSpec::Text(text) => objects.push(PlacedObject::Text(text.clone())),
            ObjectSpec::Logo {
                image_base64,
                x,
                y,
                width,
                height,
            } => {
                let bytes = b64
                    .decode(image_base64)
                    .map_err(|e| format!("Invalid logo image encoding: {}", e))?;
                let image = ImageHandle::decode(&bytes).map_err(|e| e.to_string())?;
                objects.push(PlacedObject::Logo(LogoObject {
                    image,
                    x: *x,
                    y: *y,
                    width: *width,
                    height: *height,
                }));
            }
        }
    }

    Ok(MasterDocument::from_parts(spec.width, spec.height, hero, objects))
}

fn select_presets(
    registry: &PresetRegistry,
    single: Option<&str>,
    names: Option<&[String]>,
) -> Result<Vec<Preset>, String> {
    if let Some(name) = single {
        return registry
            .get(name)
            .cloned()
            .map(|p| vec![p])
            .ok_or_else(|| format!("Preset not found: {}", name));
    }
    match names {
        Some(names) => names
            .iter()
            .map(|n| {
                registry
                    .get(n)
                    .cloned()
                    .ok_or_else(|| format!("Preset not found: {}", n))
            })
            .collect(),
        None => Ok(registry.list().to_vec()),
    }
}

fn manifest_file(
    name: &str,
    ext: &str,
    artboard: &artboard_core::Artboard,
    bytes: Vec<u8>,
) -> ExportedFile {
    ExportedFile {
        id: uuid::Uuid::new_v4().to_string(),
        filename: format!("{}.{}", name, ext),
        format: ext.to_string(),
        size: [artboard.width(), artboard.height()],
        hash: sha256_hex(&bytes),
        data_base64: base64::engine::general_purpose::STANDARD.encode(&bytes),
    }
}

/// Manifest entry for a bundle blob (ZIP or PDF); `size` carries the
/// artboard count rather than pixel dimensions.
fn blob_file(
    name: &str,
    ext: &str,
    artboards: &[artboard_core::Artboard],
    bytes: Vec<u8>,
) -> ExportedFile {
    ExportedFile {
        id: uuid::Uuid::new_v4().to_string(),
        filename: format!("{}.{}", name, ext),
        format: ext.to_string(),
        size: [artboards.len() as u32, 0],
        hash: sha256_hex(&bytes),
        data_base64: base64::engine::general_purpose::STANDARD.encode(&bytes),
    }
}

fn print_manifest(files: Vec<ExportedFile>) -> ExitCode {
    let manifest = ExportManifest {
        success: true,
        engine_version: ENGINE_VERSION,
        created_at: chrono::Utc::now(),
        files,
    };
    println!("{}", serde_json::to_string_pretty(&manifest).unwrap());
    ExitCode::SUCCESS
}

fn reject(message: &str) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": message,
    });
    println!("{}", serde_json::to_string(&output).unwrap());
    ExitCode::from(2)
}

/// SHA-256 hash of bytes as a hex string, for manifest integrity checks.
fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
