use super::*;

#[test]
fn over_opaque_source_replaces_destination() {
    assert_eq!(over([0, 0, 255, 255], [255, 0, 0, 255], 1.0), [255, 0, 0, 255]);
}

#[test]
fn over_respects_opacity_and_clamps_it() {
    let half = over([0, 0, 0, 255], [255, 255, 255, 255], 0.5);
    assert_eq!(half, [128, 128, 128, 255]);
    assert_eq!(over([1, 2, 3, 4], [255, 255, 255, 255], -3.0), [1, 2, 3, 4]);
    assert_eq!(
        over([0, 0, 0, 0], [10, 20, 30, 40], 7.0),
        over([0, 0, 0, 0], [10, 20, 30, 40], 1.0)
    );
}

#[test]
fn over_in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
}

#[test]
fn tint_keeps_coverage_only() {
    let src = [9, 9, 9, 255, 0, 0, 0, 0, 1, 1, 1, 128];
    let out = tint_by_alpha(&src, [255, 0, 0, 255]);
    assert_eq!(&out[0..4], &[255, 0, 0, 255]);
    assert_eq!(&out[4..8], &[0, 0, 0, 0]);
    assert_eq!(&out[8..12], &[128, 0, 0, 128]);
}
