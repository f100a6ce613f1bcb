use super::*;

#[test]
fn zero_or_oversized_surfaces_are_rejected() {
    assert!(Surface::new(0, 4).is_err());
    assert!(Surface::new(4, MAX_SURFACE_DIMENSION + 1).is_err());
    let s = Surface::new(3, 2).unwrap();
    assert_eq!(s.data().len(), 24);
    assert_eq!(s.pixel(2, 1), Some([0, 0, 0, 0]));
    assert_eq!(s.pixel(3, 0), None);
}

#[test]
fn resize_clears_previous_content() {
    let mut s = Surface::new(2, 2).unwrap();
    s.data_mut().fill(200);
    s.resize_and_clear(4, 1).unwrap();
    assert_eq!((s.width(), s.height()), (4, 1));
    assert!(s.data().iter().all(|&b| b == 0));
}

#[test]
fn straight_copy_unpremultiplies() {
    let mut s = Surface::new(1, 1).unwrap();
    s.data_mut().copy_from_slice(&[64, 0, 0, 128]);
    assert_eq!(s.to_rgba8_straight(), vec![128, 0, 0, 128]);
}

#[test]
fn preview_scale_is_contain_fit_without_enlarging() {
    let mut p = PreviewSurface::new(400.0, 400.0);
    p.surface_mut().resize_and_clear(1600, 800).unwrap();
    assert_eq!(p.display_scale(), 0.25);
    assert_eq!(p.display_size(), (400.0, 200.0));
    assert_eq!(
        p.display_to_canvas(Point::new(100.0, 50.0)),
        Point::new(400.0, 200.0)
    );

    p.set_viewport(4000.0, 4000.0);
    assert_eq!(p.display_scale(), 1.0);
}
