use super::*;
use crate::assets::image_ref::{DecodedImage, ImageRef, decode_image};
use crate::render::surface::PreviewSurface;
use crate::scene::store::SceneStore;

fn solid(w: u32, h: u32, c: [u8; 4]) -> ImageRef {
    ImageRef::from_decoded(DecodedImage::from_rgba8_premul(w, h, c.repeat((w * h) as usize)).unwrap())
}

#[test]
fn export_uses_background_resolution() {
    let mut store = SceneStore::new();
    store.set_original_image(solid(1200, 800, [0, 0, 255, 255]));
    store.set_foreground_cutout(solid(600, 400, [0, 0, 0, 0]));

    // A small viewport must not influence the exported resolution.
    let mut preview = PreviewSurface::new(300.0, 200.0);
    let mut comp = Compositor::default();
    comp.draw(&store.snapshot(), preview.surface_mut()).unwrap();
    assert!(preview.display_scale() < 1.0);

    let out = ExportPipeline::default().export(&mut comp, &store.snapshot()).unwrap();
    assert_eq!((out.width, out.height), (1200, 800));
    let decoded = decode_image(&out.png).unwrap();
    assert_eq!((decoded.width, decoded.height), (1200, 800));
    assert_eq!(&decoded.rgba8_premul[..4], &[0, 0, 255, 255]);
    assert!(out.report.foreground_drawn);
}

#[test]
fn nothing_to_export_without_background() {
    let store = SceneStore::new();
    let err = ExportPipeline::default()
        .export(&mut Compositor::default(), &store.snapshot())
        .unwrap_err();
    assert!(matches!(err, UnderlayError::Export(_)));
}

#[test]
fn undecodable_foreground_fails_without_saving() {
    let mut store = SceneStore::new();
    store.set_original_image(solid(4, 4, [9, 9, 9, 255]));
    store.set_foreground_cutout(ImageRef::from_encoded(vec![1u8, 2, 3, 4]));

    let mut target = MemorySaveTarget::new();
    let err = ExportPipeline::default()
        .export_and_save(&mut Compositor::default(), &store.snapshot(), &mut target)
        .unwrap_err();
    assert!(err.to_string().starts_with("export error: foreground"));
    assert!(target.files().is_empty());
}

#[test]
fn save_uses_default_filename() {
    let mut store = SceneStore::new();
    store.set_original_image(solid(3, 2, [200, 100, 50, 255]));

    let mut target = MemorySaveTarget::new();
    let dims = ExportPipeline::default()
        .export_and_save(&mut Compositor::default(), &store.snapshot(), &mut target)
        .unwrap();
    assert_eq!(dims, (3, 2));
    assert_eq!(target.files().len(), 1);
    assert_eq!(target.files()[0].0, DEFAULT_EXPORT_FILENAME);
    assert!(target.files()[0].1.starts_with(b"\x89PNG"));
}

#[test]
fn file_target_writes_to_disk() {
    let dir = std::env::temp_dir().join(format!("underlay-export-{}", std::process::id()));
    let mut store = SceneStore::new();
    store.set_original_image(solid(2, 2, [1, 2, 3, 255]));

    let pipeline = ExportPipeline::new(ExportOpts::default().with_filename("scene.png"));
    let mut target = FileSaveTarget::in_dir(&dir);
    pipeline
        .export_and_save(&mut Compositor::default(), &store.snapshot(), &mut target)
        .unwrap();
    let path = dir.join("scene.png");
    assert_eq!(target.saved(), &[path.clone()]);
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(decode_image(&bytes).unwrap().width, 2);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn exact_path_target_ignores_suggested_name() {
    let t = FileSaveTarget::at_path("out/final.png");
    assert_eq!(t.resolve("underlay.png"), std::path::PathBuf::from("out/final.png"));
    let bare = FileSaveTarget::at_path("final.png");
    assert_eq!(bare.resolve("x.png"), std::path::PathBuf::from("./final.png"));
}
