//! Export Pipeline - Raster, ZIP, and PDF Encoders
//!
//! Three independent encoders over rendered artboards. None of them touch
//! the master document, so a failed or abandoned export can never leave
//! partially-written document state. Each returns a complete byte blob or an
//! error, never a partial stream.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::artboard::Artboard;
use crate::color::ColorMode;

/// Baseline DPI of artboard surfaces; export upscales by `dpi / 72`.
pub const REFERENCE_DPI: f64 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    Png,
    Jpeg,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No artboards selected for export")]
    EmptySelection,

    #[error("Surface allocation failed for {0}x{1}")]
    Allocation(u32, u32),

    #[error("Raster encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Archive write failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode one artboard as PNG or JPEG at the requested DPI.
///
/// CMYK mode cannot be represented by RGB raster encoders; requesting a
/// non-PNG format in CMYK mode logs a warning and the bytes stay RGB.
pub fn export_single(
    artboard: &Artboard,
    format: RasterFormat,
    dpi: u32,
    mode: ColorMode,
) -> Result<Vec<u8>, ExportError> {
    if mode == ColorMode::Cmyk && format != RasterFormat::Png {
        log::warn!(
            "CMYK color mode requested for a {:?} raster; encoders are RGB-only, \
             use PDF export for print output",
            format
        );
    }

    let scaled = scale_for_dpi(artboard.surface(), dpi)?;
    match format {
        RasterFormat::Png => encode_png(&scaled),
        RasterFormat::Jpeg => encode_jpeg(&scaled),
    }
}

/// Encode every artboard as PNG at the requested DPI and bundle them into
/// one deflate ZIP archive with unique per-artboard entry names.
///
/// `transparent = false` flattens remaining transparency onto white before
/// encoding. Any failure aborts the whole export; no partial archive is
/// returned.
pub fn export_zip(
    artboards: &[Artboard],
    dpi: u32,
    transparent: bool,
    mode: ColorMode,
) -> Result<Vec<u8>, ExportError> {
    if artboards.is_empty() {
        return Err(ExportError::EmptySelection);
    }
    if mode == ColorMode::Cmyk {
        log::warn!("CMYK color mode requested for a PNG archive; entries stay RGB");
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut used_names = HashSet::new();

    for artboard in artboards {
        let mut surface = scale_for_dpi(artboard.surface(), dpi)?;
        if !transparent {
            surface = flatten_onto_white(&surface)?;
        }
        let png = encode_png(&surface)?;

        let name = unique_entry_name(&artboard.preset().name, &mut used_names);
        zip.start_file(&name, options)?;
        zip.write_all(&png)?;
        log::debug!("Archived {} ({} bytes)", name, png.len());
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Assemble one PDF with a page per artboard, each page sized to the
/// artboard's native pixel dimensions and filled by its image.
///
/// In CMYK mode every page gets a small fixed marker rectangle, and when an
/// ICC profile URL is given the profile is fetched and embedded as an output
/// intent. Fetch or embed problems are logged and the export still succeeds;
/// the page images themselves stay RGB.
pub fn export_pdf(
    artboards: &[Artboard],
    mode: ColorMode,
    icc_profile_url: Option<&str>,
) -> Result<Vec<u8>, ExportError> {
    if artboards.is_empty() {
        return Err(ExportError::EmptySelection);
    }

    let icc = match (mode, icc_profile_url) {
        (ColorMode::Cmyk, Some(url)) => fetch_icc_profile(url),
        _ => None,
    };

    let catalog_id = Ref::new(1);
    let pages_id = Ref::new(2);
    let icc_id = Ref::new(3);
    let intent_id = Ref::new(4);
    let first_page = 5;
    let page_ref = |i: i32| Ref::new(first_page + i * 3);
    let image_ref = |i: i32| Ref::new(first_page + i * 3 + 1);
    let content_ref = |i: i32| Ref::new(first_page + i * 3 + 2);

    let mut pdf = Pdf::new();

    {
        let mut catalog = pdf.catalog(catalog_id);
        catalog.pages(pages_id);
        if icc.is_some() {
            catalog.insert(Name(b"OutputIntents")).array().item(intent_id);
        }
    }

    let page_ids: Vec<Ref> = (0..artboards.len() as i32).map(page_ref).collect();
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(artboards.len() as i32);

    if let Some(profile) = &icc {
        let mut stream = pdf.stream(icc_id, profile);
        stream.pair(Name(b"N"), 4);
        stream.finish();

        let mut intent = pdf.indirect(intent_id).dict();
        intent.pair(Name(b"Type"), Name(b"OutputIntent"));
        intent.pair(Name(b"S"), Name(b"GTS_PDFX"));
        intent.pair(Name(b"OutputConditionIdentifier"), Str(b"Custom"));
        intent.pair(Name(b"DestOutputProfile"), icc_id);
    }

    for (i, artboard) in artboards.iter().enumerate() {
        let i = i as i32;
        let width = artboard.width() as f32;
        let height = artboard.height() as f32;

        {
            let mut page = pdf.page(page_ref(i));
            page.media_box(Rect::new(0.0, 0.0, width, height));
            page.parent(pages_id);
            page.contents(content_ref(i));
            page.resources()
                .x_objects()
                .pair(Name(b"Im0"), image_ref(i));
        }

        let rgb = flate_compressed_rgb(artboard.surface())?;
        let mut image = pdf.image_xobject(image_ref(i), &rgb);
        image.filter(Filter::FlateDecode);
        image.width(artboard.width() as i32);
        image.height(artboard.height() as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();

        let mut content = Content::new();
        content.save_state();
        content.transform([width, 0.0, 0.0, height, 0.0, 0.0]);
        content.x_object(Name(b"Im0"));
        content.restore_state();
        if mode == ColorMode::Cmyk {
            // Visual page flag only; the image data stays RGB
            content.set_fill_rgb(0.0, 0.65, 0.89);
            content.rect(10.0, height - 30.0, 20.0, 20.0);
            content.fill_nonzero();
        }
        pdf.stream(content_ref(i), &content.finish());
    }

    Ok(pdf.finish())
}

/// Upscale a surface by `dpi / 72` with bilinear filtering. 72 dpi returns a
/// plain copy.
fn scale_for_dpi(surface: &Pixmap, dpi: u32) -> Result<Pixmap, ExportError> {
    let factor = dpi as f64 / REFERENCE_DPI;
    if (factor - 1.0).abs() < f64::EPSILON {
        return Ok(surface.clone());
    }

    let width = ((surface.width() as f64) * factor).round() as u32;
    let height = ((surface.height() as f64) * factor).round() as u32;
    let mut scaled = Pixmap::new(width, height).ok_or(ExportError::Allocation(width, height))?;

    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    scaled.draw_pixmap(
        0,
        0,
        surface.as_ref(),
        &paint,
        Transform::from_scale(
            width as f32 / surface.width() as f32,
            height as f32 / surface.height() as f32,
        ),
        None,
    );
    Ok(scaled)
}

/// Composite the surface over opaque white, leaving only fully opaque pixels.
fn flatten_onto_white(surface: &Pixmap) -> Result<Pixmap, ExportError> {
    let mut flattened = Pixmap::new(surface.width(), surface.height())
        .ok_or(ExportError::Allocation(surface.width(), surface.height()))?;
    flattened.fill(tiny_skia::Color::WHITE);
    flattened.draw_pixmap(
        0,
        0,
        surface.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    Ok(flattened)
}

fn pixmap_to_rgba(surface: &Pixmap) -> image::RgbaImage {
    let mut buf = image::RgbaImage::new(surface.width(), surface.height());
    for (dst, src) in buf.pixels_mut().zip(surface.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    buf
}

fn encode_png(surface: &Pixmap) -> Result<Vec<u8>, ExportError> {
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(pixmap_to_rgba(surface))
        .write_to(&mut out, image::ImageOutputFormat::Png)?;
    Ok(out.into_inner())
}

fn encode_jpeg(surface: &Pixmap) -> Result<Vec<u8>, ExportError> {
    // JPEG has no alpha channel; matte onto white first
    let flattened = flatten_onto_white(surface)?;
    let rgb = image::DynamicImage::ImageRgba8(pixmap_to_rgba(&flattened)).to_rgb8();
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(rgb).write_to(&mut out, image::ImageOutputFormat::Jpeg(90))?;
    Ok(out.into_inner())
}

/// Raw RGB page pixels, zlib-compressed for a FlateDecode image stream.
fn flate_compressed_rgb(surface: &Pixmap) -> Result<Vec<u8>, ExportError> {
    let flattened = flatten_onto_white(surface)?;
    let mut raw = Vec::with_capacity((flattened.width() * flattened.height() * 3) as usize);
    for px in flattened.pixels() {
        let c = px.demultiply();
        raw.extend_from_slice(&[c.red(), c.green(), c.blue()]);
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

fn unique_entry_name(preset_name: &str, used: &mut HashSet<String>) -> String {
    let slug: String = preset_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let mut name = format!("{}.png", slug);
    let mut counter = 2;
    while !used.insert(name.clone()) {
        name = format!("{}-{}.png", slug, counter);
        counter += 1;
    }
    name
}

/// Best-effort download of an ICC profile. Any failure downgrades to a
/// warning; the PDF is still produced without an output intent.
fn fetch_icc_profile(url: &str) -> Option<Vec<u8>> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes());
    match response {
        Ok(bytes) if !bytes.is_empty() => Some(bytes.to_vec()),
        Ok(_) => {
            log::warn!("ICC profile at {} is empty, skipping embed", url);
            None
        }
        Err(e) => {
            log::warn!("ICC profile fetch failed ({}), exporting without intent", e);
            None
        }
    }
}
