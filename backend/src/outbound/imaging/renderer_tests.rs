//! Tests for the raster ticket renderer.

use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{Rgba, RgbaImage};
use rstest::{fixture, rstest};

use super::*;
use crate::test_support::cap_fs::write_file;
use crate::test_support::fixtures::font_path;

const WHITE: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const GREEN: Rgba<u8> = Rgba([0x2E, 0x7D, 0x32, 0xFF]);
const GREY: Rgba<u8> = Rgba([0xCC, 0xCC, 0xCC, 0xFF]);
const BLACK: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xFF]);
const RED: Rgba<u8> = Rgba([0xFF, 0x00, 0x00, 0xFF]);

#[fixture]
fn config() -> ControlNumberImageConfig {
    ControlNumberImageConfig {
        width: 400,
        height: 200,
        canvas_color: WHITE,
        border_thickness: 10,
        border_pad: 10,
        border_color: GREEN,
        line_thickness: 2,
        line_spacing: 16,
        line_color: GREY,
        font_path: font_path(),
        font_color: BLACK,
        font_size: 32.0,
        logo_path: None,
        logo_pad: 5,
        qr_url_template: "https://clube.example/frequencia/%s/%s?verificacao=%s".to_owned(),
        qr_size: 80,
    }
}

fn control_number() -> ControlNumber {
    ControlNumber::new(4_000_000_001, 12_345)
}

fn render_image(renderer: &ImageControlNumberRenderer) -> RgbaImage {
    let encoded = renderer
        .render(control_number(), "380308", "code")
        .expect("render succeeds");
    let bytes = STANDARD.decode(encoded).expect("valid base64");
    image::load_from_memory(&bytes).expect("decodable PNG").to_rgba8()
}

#[rstest]
fn output_is_base64_png_of_configured_size(config: ControlNumberImageConfig) {
    let renderer = ImageControlNumberRenderer::new(config);
    let encoded = renderer
        .render(control_number(), "380308", "code")
        .expect("render succeeds");
    let bytes = STANDARD.decode(&encoded).expect("valid base64");

    assert!(!encoded.contains('\n'));
    assert!(bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]));
    let decoded = image::load_from_memory(&bytes).expect("decodable PNG");
    assert_eq!((decoded.width(), decoded.height()), (400, 200));
}

#[rstest]
fn frame_and_stripes_use_configured_colours(config: ControlNumberImageConfig) {
    let image = render_image(&ImageControlNumberRenderer::new(config));

    assert_eq!(*image.get_pixel(0, 0), WHITE, "outer margin");
    assert_eq!(*image.get_pixel(15, 100), GREEN, "left border");
    assert_eq!(*image.get_pixel(200, 185), GREEN, "bottom border");
    assert_eq!(*image.get_pixel(30, 20), GREY, "first stripe");
    assert_eq!(*image.get_pixel(30, 37), GREY, "second stripe");
    assert_eq!(*image.get_pixel(30, 25), WHITE, "gap between stripes");
}

#[rstest]
fn control_number_glyphs_are_drawn_near_the_centre(config: ControlNumberImageConfig) {
    let image = render_image(&ImageControlNumberRenderer::new(config));

    let inked = (80..120)
        .flat_map(|y| (30..290).map(move |x| (x, y)))
        .filter(|&(x, y)| *image.get_pixel(x, y) == BLACK)
        .count();
    assert!(inked > 50, "expected glyph pixels, found {inked}");
}

#[rstest]
fn qr_code_sits_in_the_bottom_right_corner(config: ControlNumberImageConfig) {
    let image = render_image(&ImageControlNumberRenderer::new(config));
    // 400 - (10 + 10 + 5) - 80 = 295 and 200 - 25 - 80 = 95.
    let (origin_x, origin_y) = (295, 95);

    assert_eq!(*image.get_pixel(origin_x, origin_y), WHITE, "quiet zone");
    let dark = (origin_y..origin_y + 80)
        .flat_map(|y| (origin_x..origin_x + 80).map(move |x| (x, y)))
        .filter(|&(x, y)| *image.get_pixel(x, y) == BLACK)
        .count();
    assert!(dark > 400, "expected QR modules, found {dark} dark pixels");
    assert!(dark < 80 * 80);
}

#[rstest]
fn rendering_is_deterministic(config: ControlNumberImageConfig) {
    let renderer = ImageControlNumberRenderer::new(config);
    let first = renderer.render(control_number(), "380308", "code");
    let second = renderer.render(control_number(), "380308", "code");
    assert_eq!(first, second);
}

#[rstest]
fn verification_code_changes_the_image(config: ControlNumberImageConfig) {
    let renderer = ImageControlNumberRenderer::new(config);
    let first = renderer.render(control_number(), "380308", "code-a");
    let second = renderer.render(control_number(), "380308", "code-b");
    assert_ne!(first, second);
}

#[rstest]
fn missing_font_reports_font_missing(mut config: ControlNumberImageConfig) {
    config.font_path = PathBuf::from("/nonexistent/fonts/missing.ttf");
    let renderer = ImageControlNumberRenderer::new(config);

    let err = renderer
        .render(control_number(), "380308", "code")
        .expect_err("font is required");
    assert!(matches!(err, RenderError::FontMissing { .. }), "{err:?}");
}

#[rstest]
fn corrupt_font_reports_font_missing(mut config: ControlNumberImageConfig) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.ttf");
    write_file(&path, b"not a font").expect("write font");
    config.font_path = path;

    let err = ImageControlNumberRenderer::new(config)
        .render(control_number(), "380308", "code")
        .expect_err("font must parse");
    assert!(matches!(err, RenderError::FontMissing { .. }), "{err:?}");
}

#[rstest]
fn logo_is_blitted_inside_the_border(mut config: ControlNumberImageConfig) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("logo.png");
    let logo = RgbaImage::from_pixel(6, 6, RED);
    logo.save(&path).expect("save logo");
    config.logo_path = Some(path);

    let image = render_image(&ImageControlNumberRenderer::new(config));
    assert_eq!(*image.get_pixel(25, 25), RED);
    assert_eq!(*image.get_pixel(30, 30), RED);
    assert_ne!(*image.get_pixel(31, 31), RED);
}

#[rstest]
fn unreadable_logo_fails_rendering(mut config: ControlNumberImageConfig) {
    config.logo_path = Some(PathBuf::from("/nonexistent/logo.png"));

    let err = ImageControlNumberRenderer::new(config)
        .render(control_number(), "380308", "code")
        .expect_err("logo is unreadable");
    assert!(
        matches!(&err, RenderError::Failed { operation, .. } if operation == "load logo"),
        "{err:?}"
    );
}

#[rstest]
fn empty_canvas_is_a_render_failure(mut config: ControlNumberImageConfig) {
    config.width = 0;
    let err = ImageControlNumberRenderer::new(config)
        .render(control_number(), "380308", "code")
        .expect_err("zero width");
    assert!(matches!(err, RenderError::Failed { .. }));
}

#[rstest]
#[case("%s/%s?v=%s", &["a", "b", "c"], "a/b?v=c")]
#[case("no placeholders", &["a"], "no placeholders")]
#[case("%s-%s", &["only"], "only-")]
#[case("%s%s%s", &["1", "2", "3"], "123")]
fn template_substitution_is_positional(
    #[case] template: &str,
    #[case] args: &[&str],
    #[case] expected: &str,
) {
    assert_eq!(fill_template(template, args), expected);
}
