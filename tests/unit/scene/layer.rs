use super::*;

#[test]
fn new_text_layer_uses_editor_defaults() {
    let t = TextLayer::new(LayerId(1));
    assert_eq!(t.text, "Edit text");
    assert_eq!(t.font_family, "Inter");
    assert_eq!(t.font_size, 32.0);
    assert_eq!(t.color, Rgba8::WHITE);
    assert_eq!(t.frame.position, Percent2::CENTER);
    assert_eq!(t.frame.opacity, 1.0);
    assert_eq!(t.font_string(), "400 32px Inter");
}

#[test]
fn patch_updates_shared_frame_on_any_kind() {
    let mut layer = OverlayLayer::Shape(ShapeLayer::new(LayerId(3), ShapeType::Star));
    let patch = LayerPatch {
        position: Some(Percent2::new(10.0, 90.0)),
        rotation: Some(270.0),
        opacity: Some(0.25),
        ..Default::default()
    };
    assert!(patch.apply(&mut layer).is_empty());
    let f = layer.frame();
    assert_eq!(f.position, Percent2::new(10.0, 90.0));
    assert_eq!(f.rotation, 180.0);
    assert_eq!(f.opacity, 0.25);
    assert_eq!(layer.id(), LayerId(3));
}

#[test]
fn patch_keeps_out_of_range_opacity_for_draw_time_clamping() {
    let mut layer = OverlayLayer::Text(TextLayer::new(LayerId(1)));
    LayerPatch {
        opacity: Some(4.0),
        ..Default::default()
    }
    .apply(&mut layer);
    assert_eq!(layer.frame().opacity, 4.0);
}

#[test]
fn patch_rejects_fields_of_other_kind_and_bad_values() {
    let mut layer = OverlayLayer::Text(TextLayer::new(LayerId(1)));
    let rejected = LayerPatch {
        scale: Some(50.0),
        font_size: Some(-3.0),
        text: Some("Hi".to_owned()),
        ..Default::default()
    }
    .apply(&mut layer);
    assert_eq!(rejected, vec!["font_size", "scale"]);
    let OverlayLayer::Text(t) = &layer else {
        panic!("kind changed");
    };
    assert_eq!(t.text, "Hi");
    assert_eq!(t.font_size, 32.0);
}

#[test]
fn glow_intensity_is_clamped_non_negative() {
    let mut layer = OverlayLayer::Text(TextLayer::new(LayerId(1)));
    LayerPatch {
        glow: Some(Glow {
            enabled: true,
            color: Rgba8::BLACK,
            intensity: -5.0,
        }),
        ..Default::default()
    }
    .apply(&mut layer);
    let g = layer.frame().glow.clone().unwrap();
    assert_eq!(g.intensity, 0.0);
    assert!(!g.is_visible());
}

#[test]
fn glow_intensity_is_capped_at_the_slider_maximum() {
    let mut layer = OverlayLayer::Shape(ShapeLayer::new(LayerId(2), ShapeType::Circle));
    LayerPatch {
        glow: Some(Glow {
            enabled: true,
            color: Rgba8::WHITE,
            intensity: 2.0e5,
        }),
        ..Default::default()
    }
    .apply(&mut layer);
    assert_eq!(layer.frame().glow.as_ref().unwrap().intensity, MAX_GLOW_INTENSITY);
}

#[test]
fn glow_defaults_fill_missing_fields() {
    let g: Glow = serde_json::from_str(r#"{"enabled": true}"#).unwrap();
    assert_eq!(g, Glow::enabled());
}

#[test]
fn layers_serialize_with_kind_tag() {
    let layer = OverlayLayer::Shape(ShapeLayer::new(LayerId(9), ShapeType::Circle));
    let v = serde_json::to_value(&layer).unwrap();
    assert_eq!(v["kind"], "shape");
    assert_eq!(v["shape_type"], "circle");
    let back: OverlayLayer = serde_json::from_value(v).unwrap();
    assert_eq!(back, layer);
}

#[test]
fn with_id_changes_only_the_id() {
    let src = OverlayLayer::Text(TextLayer::new(LayerId(1)));
    let dup = src.with_id(LayerId(2));
    assert_eq!(dup.id(), LayerId(2));
    assert_eq!(dup.with_id(LayerId(1)), src);
}
