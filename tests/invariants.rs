//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees of the layout/export
//! engine: fit bounds, color round trips, command stack laws, coordinate
//! mapping, and export sizing.

use std::io::{Cursor, Read};

use artboard_core::{
    cmyk_to_rgb, export_pdf, export_single, export_zip, fit, rgb_to_cmyk, soft_proof,
    ArtboardGenerator, Channel, ColorMode, CommandStack, DocumentCommand, FitMode, ImageHandle,
    LogoObject, MasterDocument, PlacedObject, Preset, RasterFormat, Rect, TextObject,
};
use tiny_skia::Pixmap;

fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> ImageHandle {
    let mut pixmap = Pixmap::new(width, height).unwrap();
    pixmap.fill(tiny_skia::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
    ImageHandle::from_pixmap(pixmap)
}

fn text_at(x: f32, y: f32) -> PlacedObject {
    PlacedObject::Text(TextObject {
        text: "headline".to_string(),
        x,
        y,
        ..Default::default()
    })
}

// --- FitEngine ---

#[test]
fn invariant_contain_never_exceeds_target() {
    let sizes = [(100.0, 100.0), (2000.0, 500.0), (30.0, 900.0), (512.0, 512.0)];
    let targets = [(500.0, 500.0), (300.0, 1200.0), (1920.0, 1080.0)];
    for &(sw, sh) in &sizes {
        for &(tw, th) in &targets {
            let p = fit(sw, sh, Rect::from_size(tw, th), FitMode::Contain, None);
            assert!(p.draw.width <= tw + 0.001, "{}x{} into {}x{}", sw, sh, tw, th);
            assert!(p.draw.height <= th + 0.001);
        }
    }
}

#[test]
fn invariant_cover_never_smaller_than_target() {
    let sizes = [(100.0, 100.0), (2000.0, 500.0), (30.0, 900.0)];
    let targets = [(500.0, 500.0), (300.0, 1200.0)];
    for &(sw, sh) in &sizes {
        for &(tw, th) in &targets {
            let p = fit(sw, sh, Rect::from_size(tw, th), FitMode::Cover, None);
            assert!(p.draw.width >= tw - 0.001);
            assert!(p.draw.height >= th - 0.001);
        }
    }
}

#[test]
fn invariant_scale_down_shrinks_like_contain_but_never_upscales() {
    let target = Rect::from_size(800.0, 600.0);

    // larger than target: identical to contain
    let contain = fit(4000.0, 1000.0, target, FitMode::Contain, None);
    let scale_down = fit(4000.0, 1000.0, target, FitMode::ScaleDown, None);
    assert_eq!(contain.draw, scale_down.draw);

    // smaller than target: native size, centered, no upscale
    let p = fit(200.0, 100.0, target, FitMode::ScaleDown, None);
    assert_eq!(p.draw, Rect::new(300.0, 250.0, 200.0, 100.0));
}

#[test]
fn invariant_cover_center_crop_scenario() {
    // 2000x1000 into 500x500: the visible source region is a centered
    // 1000x1000 square scaled onto the full target.
    let p = fit(2000.0, 1000.0, Rect::from_size(500.0, 500.0), FitMode::Cover, None);
    let scale = p.draw.width / 2000.0;
    let visible_w = 500.0 / scale;
    let visible_h = 500.0 / scale;
    let visible_x = -p.draw.x / scale;
    assert!((visible_w - 1000.0).abs() < 0.01);
    assert!((visible_h - 1000.0).abs() < 0.01);
    assert!((visible_x - 500.0).abs() < 0.01);
}

// --- ColorManager ---

#[test]
fn invariant_color_round_trip_within_tolerance() {
    for r in (0..=255).step_by(17) {
        for g in (0..=255).step_by(17) {
            for b in (0..=255).step_by(17) {
                let [c, m, y, k] = rgb_to_cmyk(r as u8, g as u8, b as u8);
                let [r2, g2, b2] = cmyk_to_rgb(c, m, y, k);
                assert!((r as i32 - r2 as i32).abs() <= 1, "r {} -> {}", r, r2);
                assert!((g as i32 - g2 as i32).abs() <= 1, "g {} -> {}", g, g2);
                assert!((b as i32 - b2 as i32).abs() <= 1, "b {} -> {}", b, b2);
            }
        }
    }
}

#[test]
fn invariant_soft_proof_leaves_source_untouched() {
    let mut pixmap = Pixmap::new(10, 10).unwrap();
    pixmap.fill(tiny_skia::Color::from_rgba8(10, 200, 30, 255));
    let before = pixmap.data().to_vec();
    let proofed = soft_proof(&pixmap);
    assert_eq!(pixmap.data(), &before[..]);
    assert_ne!(proofed.data(), &before[..]);
}

// --- CommandStack ---

#[test]
fn invariant_undo_restores_pre_push_state() {
    let mut doc = MasterDocument::new(1000, 1000);
    let baseline = doc.clone();
    let mut stack = CommandStack::new();

    for i in 0..5 {
        stack
            .apply_and_push(
                &mut doc,
                DocumentCommand::AddObject {
                    index: i,
                    object: text_at(i as f32 * 10.0, 0.0),
                },
            )
            .unwrap();
    }
    let after_push = doc.clone();

    for _ in 0..5 {
        assert!(stack.undo(&mut doc).unwrap());
    }
    assert_eq!(doc, baseline);
    assert!(!stack.undo(&mut doc).unwrap());

    for _ in 0..5 {
        assert!(stack.redo(&mut doc).unwrap());
    }
    assert_eq!(doc, after_push);
    assert!(!stack.redo(&mut doc).unwrap());
}

#[test]
fn invariant_push_discards_redo_tail() {
    let mut doc = MasterDocument::new(1000, 1000);
    let mut stack = CommandStack::new();

    stack
        .apply_and_push(&mut doc, DocumentCommand::AddObject { index: 0, object: text_at(1.0, 1.0) })
        .unwrap();
    stack
        .apply_and_push(&mut doc, DocumentCommand::AddObject { index: 1, object: text_at(2.0, 2.0) })
        .unwrap();
    stack.undo(&mut doc).unwrap();

    stack
        .apply_and_push(&mut doc, DocumentCommand::AddObject { index: 1, object: text_at(3.0, 3.0) })
        .unwrap();

    // the undone command is gone for good
    assert!(!stack.redo(&mut doc).unwrap());
    assert_eq!(doc.objects().len(), 2);
    assert_eq!(doc.objects()[1].position(), (3.0, 3.0));
}

#[test]
fn invariant_capacity_bounds_history() {
    let mut doc = MasterDocument::new(1000, 1000);
    let mut stack = CommandStack::with_capacity(3);

    for i in 0..10 {
        stack
            .apply_and_push(
                &mut doc,
                DocumentCommand::AddObject { index: i, object: text_at(i as f32, 0.0) },
            )
            .unwrap();
    }
    assert_eq!(stack.len(), 3);
    assert!(stack.len() <= stack.capacity());

    // evicted entries are unreachable; undo stops after three steps
    let mut undone = 0;
    while stack.undo(&mut doc).unwrap() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(doc.objects().len(), 7);
}

#[test]
fn invariant_move_and_hero_commands_invert() {
    let mut doc = MasterDocument::new(1000, 1000);
    let mut stack = CommandStack::new();
    let hero = solid_image(16, 16, [5, 5, 5, 255]);

    stack
        .apply_and_push(&mut doc, DocumentCommand::AddObject { index: 0, object: text_at(10.0, 20.0) })
        .unwrap();
    stack
        .apply_and_push(
            &mut doc,
            DocumentCommand::MoveObject { index: 0, from: (10.0, 20.0), to: (300.0, 400.0) },
        )
        .unwrap();
    stack
        .apply_and_push(
            &mut doc,
            DocumentCommand::SetHero { before: None, after: Some(hero.clone()) },
        )
        .unwrap();

    assert_eq!(doc.objects()[0].position(), (300.0, 400.0));
    assert!(doc.hero().is_some());

    stack.undo(&mut doc).unwrap();
    assert!(doc.hero().is_none());
    stack.undo(&mut doc).unwrap();
    assert_eq!(doc.objects()[0].position(), (10.0, 20.0));
}

// --- ArtboardGenerator ---

#[test]
fn invariant_objects_scale_per_axis() {
    // 1000x1000 master, 500x250 preset: (100,100) lands at (50,25)
    let logo = solid_image(10, 10, [255, 0, 0, 255]);
    let doc = MasterDocument::from_parts(
        1000,
        1000,
        None,
        vec![PlacedObject::Logo(LogoObject {
            image: logo,
            x: 100.0,
            y: 100.0,
            width: 200.0,
            height: 200.0,
        })],
    );
    let preset = Preset::pixels("half-banner", 500, 250, Channel::Digital, "banner");

    let generator = ArtboardGenerator::new();
    let artboard = generator.generate(&preset, &doc, None).unwrap();

    // scaled logo occupies (50,25)..(150,75)
    let surface = artboard.surface();
    let px = |x: u32, y: u32| surface.pixel(x, y).unwrap();
    assert!(px(60, 30).red() > 200, "inside the logo should be red");
    assert!(px(140, 70).red() > 200);
    assert_eq!(px(40, 20).alpha(), 0, "outside the logo stays empty");
    assert_eq!(px(160, 80).alpha(), 0);
}

#[test]
fn invariant_hero_cover_fills_surface() {
    let hero = solid_image(200, 100, [0, 0, 255, 255]);
    let doc = MasterDocument::from_parts(1000, 1000, Some(hero), vec![]);
    let preset = Preset::pixels("square", 300, 300, Channel::Social, "post");

    let generator = ArtboardGenerator::new();
    let artboard = generator.generate(&preset, &doc, None).unwrap();

    let surface = artboard.surface();
    for &(x, y) in &[(0, 0), (299, 0), (150, 150), (0, 299), (299, 299)] {
        assert!(surface.pixel(x, y).unwrap().blue() > 200, "({},{})", x, y);
    }
}

#[test]
fn invariant_custom_hero_override_wins() {
    let hero = solid_image(100, 100, [255, 0, 0, 255]);
    let alt = solid_image(100, 100, [0, 255, 0, 255]);
    let doc = MasterDocument::from_parts(500, 500, Some(hero), vec![]);
    let preset = Preset::pixels("post", 200, 200, Channel::Social, "post");

    let mut generator = ArtboardGenerator::new();
    generator.set_overrides(
        "post",
        artboard_core::ArtboardOverrides {
            custom_hero: Some(alt),
            ..Default::default()
        },
    );

    let artboard = generator.generate(&preset, &doc, None).unwrap();
    assert!(artboard.surface().pixel(100, 100).unwrap().green() > 200);
    // the document itself is untouched
    assert!(doc.hero().is_some());
}

#[test]
fn invariant_unsized_presets_are_skipped_in_bulk() {
    let doc = MasterDocument::new(500, 500);
    let sized = Preset::pixels("ok", 100, 100, Channel::Digital, "misc");
    let no_size = Preset {
        name: "broken".to_string(),
        width_mm: None,
        height_mm: None,
        width: None,
        height: None,
        channel: Channel::Digital,
        category: "misc".to_string(),
    };

    let generator = ArtboardGenerator::new();
    let artboards = generator.generate_all(&[sized, no_size], &doc, None);
    assert_eq!(artboards.len(), 1);
    assert_eq!(artboards[0].preset().name, "ok");
}

// --- ExportPipeline ---

fn sample_artboards(count: usize) -> Vec<artboard_core::Artboard> {
    let hero = solid_image(100, 100, [200, 120, 40, 255]);
    let doc = MasterDocument::from_parts(800, 600, Some(hero), vec![]);
    let generator = ArtboardGenerator::new();
    (0..count)
        .map(|i| {
            let preset = Preset::pixels(
                &format!("board-{}", i),
                200 + 10 * i as u32,
                150,
                Channel::Digital,
                "post",
            );
            generator.generate(&preset, &doc, None).unwrap()
        })
        .collect()
}

#[test]
fn invariant_single_export_scales_by_dpi() {
    let doc = MasterDocument::new(800, 600);
    let preset = Preset::pixels("raster", 800, 600, Channel::Digital, "post");
    let artboard = ArtboardGenerator::new().generate(&preset, &doc, None).unwrap();

    let png = export_single(&artboard, RasterFormat::Png, 300, ColorMode::Rgb).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    // 800 * 300/72 = 3333.3 -> 3333, 600 * 300/72 = 2500
    assert_eq!(decoded.width(), 3333);
    assert_eq!(decoded.height(), 2500);
}

#[test]
fn invariant_cmyk_jpeg_export_degrades_but_succeeds() {
    let artboards = sample_artboards(1);
    let jpeg = export_single(&artboards[0], RasterFormat::Jpeg, 72, ColorMode::Cmyk).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "JPEG SOI marker expected");
}

#[test]
fn invariant_zip_flattens_and_counts_entries() {
    let artboards = sample_artboards(3);
    let bytes = export_zip(&artboards, 72, false, ColorMode::Rgb).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 3);

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        assert!(entry.name().ends_with(".png"));
        let mut png = Vec::new();
        entry.read_to_end(&mut png).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert!(
            decoded.pixels().all(|p| p.0[3] == 255),
            "flattened entry must have no transparency"
        );
    }
}

#[test]
fn invariant_zip_entry_names_are_unique() {
    let hero = solid_image(50, 50, [1, 2, 3, 255]);
    let doc = MasterDocument::from_parts(100, 100, Some(hero), vec![]);
    let generator = ArtboardGenerator::new();
    let preset = Preset::pixels("same name", 100, 100, Channel::Digital, "post");
    let artboards: Vec<_> = (0..2)
        .map(|_| generator.generate(&preset, &doc, None).unwrap())
        .collect();

    let bytes = export_zip(&artboards, 72, true, ColorMode::Rgb).unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 2);
    let names: std::collections::HashSet<_> = archive.file_names().collect();
    assert_eq!(names.len(), 2);
}

#[test]
fn invariant_pdf_has_one_page_per_artboard() {
    let artboards = sample_artboards(3);
    let bytes = export_pdf(&artboards, ColorMode::Rgb, None).unwrap();

    assert!(bytes.starts_with(b"%PDF-"));
    let media_boxes = count_occurrences(&bytes, b"/MediaBox");
    assert_eq!(media_boxes, 3);
}

#[test]
fn invariant_empty_export_selection_is_rejected() {
    assert!(matches!(
        export_zip(&[], 72, true, ColorMode::Rgb),
        Err(artboard_core::ExportError::EmptySelection)
    ));
    assert!(matches!(
        export_pdf(&[], ColorMode::Rgb, None),
        Err(artboard_core::ExportError::EmptySelection)
    ));
}

fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|w| *w == needle)
        .count()
}
