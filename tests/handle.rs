//! End-to-end tests of the public API on the pure-Rust backend.
//!
//! Fixtures are 320x213 gradients written to a temp dir with the `image`
//! encoders, one per supported format.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, RgbImage};
use pixelchain::config::load_recipe;
use pixelchain::imaging::{ImageError, ImageFactory, Rgb};
use pixelchain::pipeline::apply_steps;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 213;

fn fixture(dir: &Path, name: &str, format: ImageFormat) -> PathBuf {
    let img = RgbImage::from_fn(WIDTH, HEIGHT, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let path = dir.join(name);
    // The GIF encoder wants RGBA input.
    if format == ImageFormat::Gif {
        DynamicImage::ImageRgb8(img)
            .to_rgba8()
            .save_with_format(&path, format)
            .unwrap();
    } else {
        img.save_with_format(&path, format).unwrap();
    }
    path
}

fn fixtures() -> (TempDir, PathBuf, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let jpg = fixture(tmp.path(), "fixture.jpg", ImageFormat::Jpeg);
    let png = fixture(tmp.path(), "fixture.png", ImageFormat::Png);
    let gif = fixture(tmp.path(), "fixture.gif", ImageFormat::Gif);
    (tmp, jpg, png, gif)
}

#[test]
fn open_reports_fixture_dimensions() {
    let (_tmp, jpg, png, gif) = fixtures();
    let factory = ImageFactory::new();
    for path in [jpg, png, gif] {
        let img = factory.open(&path).unwrap();
        assert_eq!(img.width(), Some(WIDTH), "{}", path.display());
        assert_eq!(img.height(), Some(HEIGHT), "{}", path.display());
    }
}

#[test]
fn open_ignores_extension_case() {
    let (tmp, _, png, _) = fixtures();
    let upper = tmp.path().join("FIXTURE.PNG");
    std::fs::copy(&png, &upper).unwrap();
    let factory = ImageFactory::new();
    assert_eq!(factory.open(&upper).unwrap().width(), Some(WIDTH));
}

#[test]
fn open_rejects_unknown_extension_and_missing_file() {
    let (tmp, _, png, _) = fixtures();
    let txt = tmp.path().join("fixture.txt");
    std::fs::copy(&png, &txt).unwrap();
    let factory = ImageFactory::new();

    assert!(matches!(
        factory.open(&txt).err(),
        Some(ImageError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        factory.open(tmp.path().join("missing.png")).err(),
        Some(ImageError::UnreadableFile { .. })
    ));
}

#[test]
fn open_gif_marks_black_transparent() {
    let (_tmp, _, _, gif) = fixtures();
    let factory = ImageFactory::new();
    let img = factory.open(&gif).unwrap();
    assert_eq!(img.buffer().unwrap().transparent(), Some(Rgb::BLACK));
}

#[test]
fn scale_fits_inside_target() {
    let (_tmp, jpg, _, _) = fixtures();
    let factory = ImageFactory::new();
    let mut img = factory.open(&jpg).unwrap();
    img.scale(100, 100).unwrap();
    assert_eq!(img.width(), Some(100));
    assert_eq!(img.height(), Some(66));
}

#[test]
fn scale_that_collapses_leaves_image_unchanged() {
    let (_tmp, _, png, _) = fixtures();
    let factory = ImageFactory::new();
    let mut img = factory.open(&png).unwrap();
    img.scale(1, 1000).unwrap();
    assert_eq!(img.width(), Some(WIDTH));
    assert_eq!(img.height(), Some(HEIGHT));
}

#[test]
fn save_png_round_trips_pixels_and_closes() {
    let (tmp, _, png, _) = fixtures();
    let factory = ImageFactory::new();
    let out = tmp.path().join("copy.png");

    let mut img = factory.open(&png).unwrap();
    let original = img.buffer().unwrap().pixels().clone();
    assert!(img.save(&out).unwrap());
    assert_eq!(img.width(), None);
    assert!(!img.save(&out).unwrap());

    let reopened = factory.open(&out).unwrap();
    assert_eq!(reopened.buffer().unwrap().pixels(), &original);
}

#[test]
fn save_extension_is_case_sensitive() {
    let (tmp, _, png, _) = fixtures();
    let factory = ImageFactory::new();
    let mut img = factory.open(&png).unwrap();
    let err = img.save(tmp.path().join("copy.PNG")).unwrap_err();
    assert!(matches!(err, ImageError::UnsupportedFormat(ref e) if e == "PNG"));
    assert!(img.is_open());
    assert!(!tmp.path().join("copy.PNG").exists());
}

#[test]
fn save_to_unwritable_location_keeps_handle_open() {
    let (tmp, _, png, _) = fixtures();
    let factory = ImageFactory::new();
    let mut img = factory.open(&png).unwrap();
    let err = img
        .save(tmp.path().join("no-such-dir").join("out.png"))
        .unwrap_err();
    assert!(matches!(err, ImageError::Encode { action: "saved", .. }));
    assert!(img.is_open());
}

#[test]
fn load_raw_and_base64_decode_identically() {
    let (_tmp, _, png, _) = fixtures();
    let bytes = std::fs::read(&png).unwrap();
    let factory = ImageFactory::new();

    let raw = factory.load(&bytes).unwrap();
    let encoded = factory.load(STANDARD.encode(&bytes)).unwrap();
    assert_eq!(raw.width(), Some(WIDTH));
    assert_eq!(
        raw.buffer().unwrap().pixels(),
        encoded.buffer().unwrap().pixels()
    );
}

#[test]
fn load_accepts_wrapped_base64_text() {
    let (_tmp, _, png, _) = fixtures();
    let encoded = STANDARD.encode(std::fs::read(&png).unwrap());
    let factory = ImageFactory::new();

    let newline_terminated = format!("{encoded}\n");
    let img = factory.load(&newline_terminated).unwrap();
    assert_eq!(img.width(), Some(WIDTH));

    // 76-column lines, as written by `base64` and MIME encoders.
    let wrapped: String = encoded
        .as_bytes()
        .chunks(76)
        .map(|line| format!("{}\r\n", std::str::from_utf8(line).unwrap()))
        .collect();
    let img = factory.load(&wrapped).unwrap();
    assert_eq!(img.width(), Some(WIDTH));
    assert_eq!(img.height(), Some(HEIGHT));
}

#[test]
fn save_over_existing_file_replaces_it() {
    let (tmp, jpg, png, _) = fixtures();
    let factory = ImageFactory::new();
    let target = tmp.path().join("target.png");
    std::fs::copy(&png, &target).unwrap();

    let mut img = factory.open(&jpg).unwrap();
    img.scale(32, 32).unwrap();
    assert!(img.save(&target).unwrap());

    let reopened = factory.open(&target).unwrap();
    assert_eq!(reopened.width(), Some(32));
    assert!(!tmp.path().join(".target.png.pixelchain-tmp").exists());
}

#[test]
fn load_garbage_is_decode_error() {
    let factory = ImageFactory::new();
    assert!(matches!(
        factory.load([0xde_u8, 0xad, 0xbe, 0xef]).err(),
        Some(ImageError::Decode(_))
    ));
    assert!(matches!(factory.load("").err(), Some(ImageError::EmptyInput)));
}

#[test]
fn transparent_color_requires_present_color() {
    let (_tmp, _, png, _) = fixtures();
    let factory = ImageFactory::new();
    let mut img = factory.open(&png).unwrap();

    // Blue channel is (x + y) % 256 while red is x % 256: never (0, 0, 255).
    let err = img.transparent_color(Rgb::new(0, 0, 255)).unwrap_err();
    assert_eq!(err.operation(), Some("transparent color"));
    assert!(img.is_open());

    let corner = Rgb::new(0, 0, 0);
    img.transparent_color(corner).unwrap();
    img.transparent_color(corner).unwrap();
    assert_eq!(img.buffer().unwrap().transparent(), Some(corner));
}

#[test]
fn color_queries_on_fixture() {
    let (_tmp, _, png, _) = fixtures();
    let factory = ImageFactory::new();
    let mut img = factory.open(&png).unwrap();
    assert!(img.has_color(Rgb::new(10, 20, 30)));
    assert!(!img.has_color(Rgb::new(0, 0, 255)));
    assert!(img.closest_color_index(Rgb::new(0, 0, 255)).is_some());
    assert!(img.color_index(Rgb::new(1, 2, 3)).is_some());
}

#[test]
fn antialias_and_alpha_blending_are_idempotent() {
    let (_tmp, jpg, _, _) = fixtures();
    let factory = ImageFactory::new();
    let mut img = factory.open(&jpg).unwrap();
    img.antialias(true).unwrap().antialias(true).unwrap();
    img.alpha_blending(false).unwrap().alpha_blending(false).unwrap();
    let raster = img.buffer().unwrap();
    assert!(raster.antialias());
    assert!(!raster.alpha_blending());
}

#[test]
fn full_filter_chain_then_dump() -> Result<(), ImageError> {
    let (_tmp, jpg, _, _) = fixtures();
    let factory = ImageFactory::new();
    let mut img = factory.open(&jpg)?;
    img.negative()?
        .grayscale()?
        .brightness(30)?
        .contrast(-20)?
        .gamma(1.0, 2.2)?
        .colorize(Rgb::new(40, 0, 0), 0)?
        .outline()?
        .emboss()?
        .blur()?
        .blur_gaussian()?
        .sharpen()?
        .sketchy()?
        .smooth(6)?
        .pixelation(4, true)?
        .scale(160, 160)?
        .set_quality(60);
    assert_eq!(img.width(), Some(160));

    let mut out = Vec::new();
    assert!(img.dump_to("JPG", &mut out)?);
    assert_eq!(&out[..2], &[0xff, 0xd8]);
    assert!(!img.is_open());
    Ok(())
}

#[test]
fn dump_unknown_type_keeps_handle_open() {
    let (_tmp, _, png, _) = fixtures();
    let factory = ImageFactory::new();
    let mut img = factory.open(&png).unwrap();
    let mut out = Vec::new();
    assert!(matches!(
        img.dump_to("bmp", &mut out),
        Err(ImageError::UnsupportedFormat(_))
    ));
    assert!(out.is_empty());
    assert!(img.is_open());
}

#[test]
fn created_canvas_saves_as_gif() {
    let tmp = TempDir::new().unwrap();
    let factory = ImageFactory::new();
    let out = tmp.path().join("blank.gif");
    let mut img = factory.create(12, 7).unwrap();
    assert!(img.save(&out).unwrap());

    let reopened = factory.open(&out).unwrap();
    assert_eq!(reopened.width(), Some(12));
    assert_eq!(reopened.height(), Some(7));
}

#[test]
fn recipe_file_drives_the_pipeline() {
    let (tmp, _, png, _) = fixtures();
    let recipe_path = tmp.path().join("recipe.toml");
    std::fs::write(
        &recipe_path,
        r#"
[output]
quality = 50

[[steps]]
op = "grayscale"

[[steps]]
op = "scale"
width = 64
height = 64
"#,
    )
    .unwrap();
    let recipe = load_recipe(Some(recipe_path.as_path())).unwrap();

    let factory = ImageFactory::new();
    let mut img = factory.open(&png).unwrap();
    apply_steps(&mut img, &recipe.steps).unwrap();
    img.set_quality(recipe.output.quality);

    assert_eq!(img.width(), Some(64));
    assert_eq!(img.height(), Some(42));
    assert_eq!(img.quality().value(), 50);
    let px = img.buffer().unwrap().pixels().get_pixel(10, 10);
    assert!(px.0[0] == px.0[1] && px.0[1] == px.0[2]);
}

#[test]
fn info_lists_every_extension() {
    let factory = ImageFactory::new();
    let info = factory.info();
    assert_eq!(info.version, factory.version());
    for ext in ["jpg", "jpeg", "jpe", "png", "gif"] {
        assert!(info.formats.iter().any(|f| f == ext), "{ext}");
        assert!(factory.is_supported_format(ext));
    }
    assert!(!factory.is_supported_format("webp"));
}
