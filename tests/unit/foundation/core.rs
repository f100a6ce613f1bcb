use super::*;

#[test]
fn percent_clamps_into_range() {
    let p = Percent2::new(-10.0, 250.0);
    assert_eq!(p.horizontal, 0.0);
    assert_eq!(p.vertical, 100.0);
}

#[test]
fn percent_non_finite_falls_back_to_center() {
    let p = Percent2::new(f64::NAN, f64::INFINITY);
    assert_eq!(p, Percent2::CENTER);
}

#[test]
fn percent_resolves_against_canvas() {
    let p = Percent2::new(25.0, 50.0);
    let px = p.to_pixels(200, 100);
    assert_eq!(px, Point::new(50.0, 50.0));
}

#[test]
fn layer_id_serializes_transparently() {
    let s = serde_json::to_string(&LayerId(7)).unwrap();
    assert_eq!(s, "7");
}
