use super::*;

#[test]
fn parses_all_hex_lengths() {
    assert_eq!(Rgba8::parse_hex("#fff").unwrap(), Rgba8::WHITE);
    assert_eq!(Rgba8::parse_hex("FF8000").unwrap(), Rgba8::rgb(255, 128, 0));
    assert_eq!(
        Rgba8::parse_hex("#11223344").unwrap(),
        Rgba8::rgba(0x11, 0x22, 0x33, 0x44)
    );
}

#[test]
fn rejects_malformed_hex() {
    assert!(Rgba8::parse_hex("#12").is_err());
    assert!(Rgba8::parse_hex("#zzzzzz").is_err());
    assert!(Rgba8::parse_hex("#ééé").is_err());
}

#[test]
fn serde_uses_hex_strings() {
    let s = serde_json::to_string(&Rgba8::rgb(0, 255, 16)).unwrap();
    assert_eq!(s, "\"#00FF10\"");
    let c: Rgba8 = serde_json::from_str("\"#00ff1080\"").unwrap();
    assert_eq!(c, Rgba8::rgba(0, 255, 16, 128));
}

#[test]
fn premul_scales_channels() {
    assert_eq!(Rgba8::rgba(255, 0, 0, 128).to_premul(), [128, 0, 0, 128]);
    assert_eq!(Rgba8::WHITE.to_premul(), [255, 255, 255, 255]);
}
