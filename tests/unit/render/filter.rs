use super::*;
use crate::scene::enhance::EnhancementField;

fn run(src: &[u8], e: &ImageEnhancements) -> Vec<u8> {
    let mut dst = vec![0u8; src.len()];
    apply_enhancements(src, &mut dst, e).unwrap();
    dst
}

#[test]
fn neutral_parameters_copy_exactly() {
    let src = [12, 34, 56, 255, 10, 5, 0, 128];
    assert_eq!(run(&src, &ImageEnhancements::NEUTRAL), src.to_vec());
}

#[test]
fn zero_brightness_is_black() {
    let mut e = ImageEnhancements::NEUTRAL;
    e.set(EnhancementField::Brightness, 0.0);
    assert_eq!(run(&[200, 150, 100, 255], &e), vec![0, 0, 0, 255]);
}

#[test]
fn zero_contrast_is_mid_gray() {
    let mut e = ImageEnhancements::NEUTRAL;
    e.set(EnhancementField::Contrast, 0.0);
    assert_eq!(run(&[255, 0, 30, 255], &e), vec![128, 128, 128, 255]);
}

#[test]
fn zero_saturation_is_grayscale() {
    let mut e = ImageEnhancements::NEUTRAL;
    e.set(EnhancementField::Saturation, 0.0);
    let out = run(&[255, 0, 0, 255], &e);
    assert_eq!(out[0], out[1]);
    assert_eq!(out[1], out[2]);
    assert_eq!(out[0], 54);
}

#[test]
fn full_fade_makes_background_transparent() {
    let mut e = ImageEnhancements::NEUTRAL;
    e.set(EnhancementField::Fade, 100.0);
    assert_eq!(run(&[200, 150, 100, 255, 1, 2, 3, 4], &e), vec![0; 8]);
}

#[test]
fn half_fade_halves_alpha() {
    let mut e = ImageEnhancements::NEUTRAL;
    e.set(EnhancementField::Fade, 50.0);
    assert_eq!(run(&[255, 255, 255, 255], &e), vec![128, 128, 128, 128]);
}

#[test]
fn checkerboard_alternates_cells() {
    let mut buf = vec![0u8; 4 * 4 * 4];
    fill_checkerboard(&mut buf, 4, 2, Rgba8::WHITE, Rgba8::BLACK);
    let px = |x: usize, y: usize| &buf[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
    assert_eq!(px(0, 0), &[255, 255, 255, 255]);
    assert_eq!(px(1, 1), &[255, 255, 255, 255]);
    assert_eq!(px(2, 0), &[0, 0, 0, 255]);
    assert_eq!(px(0, 2), &[0, 0, 0, 255]);
    assert_eq!(px(3, 3), &[255, 255, 255, 255]);
}
