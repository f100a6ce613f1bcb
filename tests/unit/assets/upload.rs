use super::*;
use crate::assets::image_ref::encode_png_rgba8;

fn png(w: u32, h: u32) -> Vec<u8> {
    encode_png_rgba8(&vec![128u8; (w * h * 4) as usize], w, h).unwrap()
}

#[test]
fn fit_keeps_small_images() {
    assert_eq!(fit_dimensions(800, 600, 1920), (800, 600));
}

#[test]
fn fit_scales_by_longest_edge() {
    assert_eq!(fit_dimensions(4000, 3000, 1920), (1920, 1440));
    assert_eq!(fit_dimensions(3000, 4000, 1920), (1440, 1920));
    assert_eq!(fit_dimensions(2000, 2000, 1920), (1920, 1920));
}

#[test]
fn png_upload_is_accepted() {
    let r = accept_upload(&png(4, 3), &UploadOpts::default().with_max_dimension(None)).unwrap();
    let img = r.decode().unwrap();
    assert_eq!((img.width, img.height), (4, 3));
}

#[test]
fn oversized_upload_is_downscaled() {
    let opts = UploadOpts::default().with_max_dimension(Some(8));
    let img = accept_upload(&png(16, 4), &opts).unwrap().decode().unwrap();
    assert_eq!((img.width, img.height), (8, 2));
}

#[test]
fn unknown_bytes_are_rejected_as_format_errors() {
    let err = accept_upload(b"definitely not an image", &UploadOpts::default()).unwrap_err();
    assert!(matches!(err, UnderlayError::UploadFormat(_)));
}

#[test]
fn heic_container_is_rejected_with_hint() {
    let mut bytes = vec![0u8, 0, 0, 24];
    bytes.extend_from_slice(b"ftypheic");
    bytes.extend_from_slice(&[0u8; 16]);
    let err = sniff_format(&bytes).unwrap_err();
    assert!(err.to_string().contains("HEIC"));
}

#[test]
fn gif_is_outside_the_whitelist() {
    let err = sniff_format(b"GIF89a\x01\x00\x01\x00").unwrap_err();
    assert!(matches!(err, UnderlayError::UploadFormat(_)));
}
