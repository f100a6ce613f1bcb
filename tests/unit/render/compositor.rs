use super::*;
use crate::assets::image_ref::ImageRef;
use crate::scene::enhance::EnhancementField;
use crate::scene::layer::{Glow, LayerPatch};
use crate::scene::shapes::ShapeType;
use crate::scene::store::SceneStore;
use crate::foundation::core::Percent2;

fn solid(w: u32, h: u32, c: [u8; 4]) -> ImageRef {
    let px = c.repeat((w * h) as usize);
    ImageRef::from_decoded(DecodedImage::from_rgba8_premul(w, h, px).unwrap())
}

fn store_with_bg(w: u32, h: u32, c: [u8; 4]) -> SceneStore {
    let mut s = SceneStore::new();
    s.set_original_image(solid(w, h, c));
    s
}

fn render(store: &SceneStore) -> (Surface, DrawReport) {
    let mut comp = Compositor::default();
    let mut surface = Surface::default();
    let report = comp.draw(&store.snapshot(), &mut surface).unwrap();
    (surface, report)
}

#[test]
fn missing_background_is_an_error() {
    let store = SceneStore::new();
    let mut surface = Surface::default();
    assert!(Compositor::default().draw(&store.snapshot(), &mut surface).is_err());
}

#[test]
fn surface_takes_background_dimensions_and_pixels() {
    let store = store_with_bg(7, 3, [10, 20, 30, 255]);
    let (s, report) = render(&store);
    assert_eq!((s.width(), s.height()), (7, 3));
    assert_eq!((report.width, report.height), (7, 3));
    assert!(s.data().chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
}

#[test]
fn filled_shape_covers_its_center_at_configured_opacity() {
    let mut store = store_with_bg(100, 100, [0, 0, 0, 255]);
    let id = store.add_shape_layer(ShapeType::Square);
    let (s, report) = render(&store);
    assert_eq!(report.layers_drawn, 1);
    assert_eq!(s.pixel(50, 50), Some([255, 255, 255, 255]));
    assert_eq!(s.pixel(2, 2), Some([0, 0, 0, 255]));

    store
        .update_layer(
            id,
            &LayerPatch {
                opacity: Some(0.5),
                ..LayerPatch::default()
            },
        )
        .unwrap();
    let (s, _) = render(&store);
    assert_eq!(s.pixel(50, 50), Some([128, 128, 128, 255]));
}

#[test]
fn out_of_range_opacity_is_clamped() {
    let mut store = store_with_bg(40, 40, [0, 0, 0, 255]);
    let id = store.add_shape_layer(ShapeType::Circle);
    let (reference, _) = render(&store);
    store
        .update_layer(
            id,
            &LayerPatch {
                opacity: Some(4.0),
                ..LayerPatch::default()
            },
        )
        .unwrap();
    let (over, _) = render(&store);
    assert_eq!(reference, over);

    store
        .update_layer(
            id,
            &LayerPatch {
                opacity: Some(-1.0),
                ..LayerPatch::default()
            },
        )
        .unwrap();
    let (hidden, _) = render(&store);
    assert!(hidden.data().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
}

#[test]
fn unknown_shape_draws_nothing_without_failing() {
    let mut store = store_with_bg(20, 20, [0, 0, 0, 255]);
    store.add_shape_layer(ShapeType::Unknown);
    let (s, report) = render(&store);
    assert_eq!(report.layers_drawn, 0);
    assert!(report.layers_skipped.is_empty());
    assert!(s.data().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
}

#[test]
fn a_failing_layer_does_not_blank_the_rest() {
    let mut store = store_with_bg(50, 50, [0, 0, 0, 255]);
    let text = store.add_text_layer();
    store.add_shape_layer(ShapeType::Square);
    let (s, report) = render(&store);
    assert_eq!(report.layers_skipped, vec![text]);
    assert_eq!(report.layers_drawn, 1);
    assert_eq!(s.pixel(25, 25), Some([255, 255, 255, 255]));
}

#[test]
fn empty_text_is_legal_and_draws_nothing() {
    let mut store = store_with_bg(10, 10, [0, 0, 0, 255]);
    let id = store.add_text_layer();
    store
        .update_layer(
            id,
            &LayerPatch {
                text: Some(String::new()),
                ..LayerPatch::default()
            },
        )
        .unwrap();
    let (_, report) = render(&store);
    assert_eq!(report.layers_drawn, 0);
    assert!(report.layers_skipped.is_empty());
}

#[test]
fn glow_spreads_beyond_the_shape() {
    let mut store = store_with_bg(100, 100, [0, 0, 0, 255]);
    let id = store.add_shape_layer(ShapeType::Square);
    let (plain, _) = render(&store);
    store
        .update_layer(
            id,
            &LayerPatch {
                glow: Some(Glow {
                    enabled: true,
                    color: Rgba8::rgb(255, 0, 0),
                    intensity: 10.0,
                }),
                ..LayerPatch::default()
            },
        )
        .unwrap();
    let (glowing, _) = render(&store);
    // Square spans 37.5..62.5; a few pixels outside it only the glow reaches.
    assert_eq!(plain.pixel(50, 34), Some([0, 0, 0, 255]));
    let p = glowing.pixel(50, 34).unwrap();
    assert!(p[0] > 0 && p[1] == 0, "{p:?}");
    assert_eq!(glowing.pixel(50, 50), Some([255, 255, 255, 255]));
}

#[test]
fn transparent_mode_draws_checkerboard_without_fade() {
    let mut store = store_with_bg(32, 32, [200, 0, 0, 255]);
    store.set_transparent_background(true);
    store.set_enhancement(EnhancementField::Fade, 100.0);
    let (s, _) = render(&store);
    assert_eq!(s.pixel(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(s.pixel(16, 0), Some([0xCC, 0xCC, 0xCC, 255]));
}

#[test]
fn foreground_is_stretched_over_everything_but_strokes() {
    let mut store = store_with_bg(8, 8, [255, 0, 0, 255]);
    store.add_shape_layer(ShapeType::Square);
    store.set_foreground_cutout(solid(2, 2, [0, 0, 255, 255]));
    store.append_stroke(DrawingStroke {
        points: vec![Point::new(4.0, 4.0)],
        color: Rgba8::rgb(0, 255, 0),
        brush_size: 3.0,
    });
    let (s, report) = render(&store);
    assert!(report.foreground_drawn);
    assert_eq!(report.strokes_drawn, 1);
    assert_eq!(s.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(s.pixel(7, 7), Some([0, 0, 255, 255]));
    assert_eq!(s.pixel(4, 4), Some([0, 255, 0, 255]));
}

#[test]
fn transparent_foreground_pixels_show_the_layers_below() {
    let mut store = store_with_bg(2, 1, [255, 0, 0, 255]);
    let px = vec![0, 0, 255, 255, 0, 0, 0, 0];
    store.set_foreground_cutout(ImageRef::from_decoded(
        DecodedImage::from_rgba8_premul(2, 1, px).unwrap(),
    ));
    let (s, _) = render(&store);
    assert_eq!(s.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(s.pixel(1, 0), Some([255, 0, 0, 255]));
}

#[test]
fn multi_point_strokes_follow_their_segments() {
    let mut store = store_with_bg(20, 20, [0, 0, 0, 255]);
    store.append_stroke(DrawingStroke {
        points: vec![Point::new(2.0, 10.0), Point::new(18.0, 10.0)],
        color: Rgba8::WHITE,
        brush_size: 4.0,
    });
    let (s, _) = render(&store);
    assert_eq!(s.pixel(10, 10), Some([255, 255, 255, 255]));
    assert_eq!(s.pixel(10, 2), Some([0, 0, 0, 255]));
}

#[test]
fn frame_transform_translates_then_rotates() {
    let mut frame = LayerFrame {
        id: LayerId(1),
        position: Percent2::new(50.0, 25.0),
        rotation: 90.0,
        opacity: 1.0,
        glow: None,
    };
    let t = frame_transform(&frame, 200, 100);
    let p = t * Point::new(10.0, 0.0);
    assert!((p.x - 100.0).abs() < 1e-9 && (p.y - 35.0).abs() < 1e-9, "{p:?}");

    frame.rotation = 0.0;
    let o = frame_transform(&frame, 200, 100) * Point::ORIGIN;
    assert_eq!(o, Point::new(100.0, 25.0));
}

#[test]
fn shape_scale_uses_the_shorter_edge() {
    assert_eq!(shape_scale(25.0, 800, 400), 1.0);
    assert_eq!(shape_scale(50.0, 400, 800), 2.0);
}

#[test]
fn text_anchor_centers_the_box() {
    let p = text_anchor_offset(40.0, 10.0) * Point::new(20.0, 5.0);
    assert_eq!(p, Point::ORIGIN);
}
