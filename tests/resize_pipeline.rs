//! End-to-end tests for the resize pipeline
//!
//! These tests drive the pipeline through its public API against real files
//! in temporary directories and verify the output contract: exact target
//! dimensions, channel discipline, white-flattened transparency, embedded
//! ICC profile bytes, and an exact failure list.

use image::{DynamicImage, GenericImageView, GrayImage, ImageDecoder, Luma, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use trainset_prep::{ResizeConfig, ResizePipeline};

/// Minimal ICC payload with a valid `acsp` signature at offset 36
fn fake_srgb_profile() -> Vec<u8> {
    let mut profile = vec![0u8; 128];
    profile.splice(36..40, *b"acsp");
    profile.extend_from_slice(b"sRGB IEC61966-2.1 color profile");
    profile
}

struct Fixture {
    _dir: TempDir,
    input_dir: PathBuf,
    output_dir: PathBuf,
    icc_path: PathBuf,
    icc_bytes: Vec<u8>,
}

fn setup() -> Fixture {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("images");
    let output_dir = dir.path().join("resized_images");
    std::fs::create_dir_all(&input_dir).unwrap();

    let icc_path = dir.path().join("srgb.icc");
    let icc_bytes = fake_srgb_profile();
    std::fs::write(&icc_path, &icc_bytes).unwrap();

    Fixture {
        _dir: dir,
        input_dir,
        output_dir,
        icc_path,
        icc_bytes,
    }
}

/// RGBA image: left half fully transparent, right half opaque red
fn write_rgba_half_transparent(path: &Path, width: u32, height: u32) {
    let mut rgba = RgbaImage::new(width, height);
    for (x, _, pixel) in rgba.enumerate_pixels_mut() {
        *pixel = if x < width / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([255, 0, 0, 255])
        };
    }
    DynamicImage::ImageRgba8(rgba).save(path).unwrap();
}

fn write_grayscale(path: &Path, width: u32, height: u32) {
    let gray = GrayImage::from_pixel(width, height, Luma([99]));
    DynamicImage::ImageLuma8(gray).save(path).unwrap();
}

fn read_icc(path: &Path) -> Option<Vec<u8>> {
    let file = std::fs::File::open(path).unwrap();
    let mut decoder = image::codecs::png::PngDecoder::new(std::io::BufReader::new(file)).unwrap();
    decoder.icc_profile().unwrap()
}

fn config_for(fixture: &Fixture, width: u32, height: u32) -> ResizeConfig {
    ResizeConfig::builder()
        .input_dir(&fixture.input_dir)
        .output_dir(&fixture.output_dir)
        .target_size(width, height)
        .icc_profile_path(&fixture.icc_path)
        .workers(2)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_resize_outputs_exact_dimensions_for_any_aspect_ratio() {
    let fixture = setup();
    write_rgba_half_transparent(&fixture.input_dir.join("wide.png"), 64, 32);
    write_grayscale(&fixture.input_dir.join("tall.png"), 16, 100);

    let summary = ResizePipeline::new(config_for(&fixture, 512, 512))
        .run()
        .await
        .unwrap();
    assert_eq!(summary.files_found, 2);
    assert_eq!(summary.resized, 2);
    assert_eq!(summary.failed, 0);

    for name in ["wide.png", "tall.png"] {
        let out = image::open(fixture.output_dir.join(name)).unwrap();
        assert_eq!((out.width(), out.height()), (512, 512), "for {name}");
    }
}

#[tokio::test]
async fn test_transparency_is_flattened_onto_white_with_three_channels() {
    let fixture = setup();
    write_rgba_half_transparent(&fixture.input_dir.join("a.png"), 64, 64);

    ResizePipeline::new(config_for(&fixture, 128, 128))
        .run()
        .await
        .unwrap();

    let out = image::open(fixture.output_dir.join("a.png")).unwrap();
    assert_eq!(out.color(), image::ColorType::Rgb8);

    let rgb = out.to_rgb8();
    // Center of the originally-transparent half is pure white
    assert_eq!(rgb.get_pixel(16, 64), &image::Rgb([255, 255, 255]));
    // Center of the opaque half keeps its color
    assert_eq!(rgb.get_pixel(112, 64), &image::Rgb([255, 0, 0]));
}

#[tokio::test]
async fn test_grayscale_sources_stay_single_channel() {
    let fixture = setup();
    write_grayscale(&fixture.input_dir.join("gray.png"), 40, 40);

    ResizePipeline::new(config_for(&fixture, 64, 64))
        .run()
        .await
        .unwrap();

    let out = image::open(fixture.output_dir.join("gray.png")).unwrap();
    assert_eq!(out.color(), image::ColorType::L8);
    assert_eq!(out.to_luma8().get_pixel(32, 32), &Luma([99]));
}

#[tokio::test]
async fn test_outputs_embed_the_sidecar_profile_bytes() {
    let fixture = setup();
    write_rgba_half_transparent(&fixture.input_dir.join("a.png"), 32, 32);
    write_grayscale(&fixture.input_dir.join("b.png"), 32, 32);

    ResizePipeline::new(config_for(&fixture, 16, 16))
        .run()
        .await
        .unwrap();

    for name in ["a.png", "b.png"] {
        let embedded = read_icc(&fixture.output_dir.join(name))
            .unwrap_or_else(|| panic!("{name} has no ICC profile"));
        assert_eq!(embedded, fixture.icc_bytes, "for {name}");
    }
}

#[tokio::test]
async fn test_failure_list_contains_exactly_the_failed_stems() {
    let fixture = setup();
    write_rgba_half_transparent(&fixture.input_dir.join("good_one.png"), 32, 32);
    write_grayscale(&fixture.input_dir.join("good_two.png"), 32, 32);
    std::fs::write(fixture.input_dir.join("broken.png"), b"not an image").unwrap();
    std::fs::write(fixture.input_dir.join("truncated.jpg"), b"\xFF\xD8\xFF").unwrap();
    // Non-image files are not enumerated and must not appear anywhere
    std::fs::write(fixture.input_dir.join("notes.txt"), b"hello").unwrap();

    let summary = ResizePipeline::new(config_for(&fixture, 64, 64))
        .run()
        .await
        .unwrap();
    assert_eq!(summary.files_found, 4);
    assert_eq!(summary.resized, 2);
    assert_eq!(summary.failed, 2);

    let content = std::fs::read_to_string(&summary.failure_list).unwrap();
    assert_eq!(content, "image_names\nbroken\ntruncated\n");

    // The N-K good files exist as valid resized outputs, the failed do not
    assert!(fixture.output_dir.join("good_one.png").is_file());
    assert!(fixture.output_dir.join("good_two.png").is_file());
    assert!(!fixture.output_dir.join("broken.png").exists());
    assert!(!fixture.output_dir.join("truncated.png").exists());
}

#[tokio::test]
async fn test_empty_input_directory_writes_header_only_list() {
    let fixture = setup();

    let summary = ResizePipeline::new(config_for(&fixture, 512, 512))
        .run()
        .await
        .unwrap();
    assert_eq!(summary.files_found, 0);
    assert_eq!(summary.resized, 0);
    assert_eq!(summary.failed, 0);

    let content = std::fs::read_to_string(&summary.failure_list).unwrap();
    assert_eq!(content, "image_names\n");
}

#[tokio::test]
async fn test_missing_icc_profile_is_fatal_before_processing() {
    let fixture = setup();
    write_grayscale(&fixture.input_dir.join("gray.png"), 8, 8);

    let config = ResizeConfig::builder()
        .input_dir(&fixture.input_dir)
        .output_dir(&fixture.output_dir)
        .icc_profile_path(fixture._dir.path().join("nope.icc"))
        .build()
        .unwrap();

    let err = ResizePipeline::new(config).run().await.unwrap_err();
    assert!(err.to_string().contains("nope.icc"));
    // Nothing was processed or written
    assert!(!fixture.output_dir.exists());
}

#[tokio::test]
async fn test_pattern_limits_processing() {
    let fixture = setup();
    write_grayscale(&fixture.input_dir.join("keep.png"), 8, 8);
    write_grayscale(&fixture.input_dir.join("skip.jpg"), 8, 8);

    let config = ResizeConfig::builder()
        .input_dir(&fixture.input_dir)
        .output_dir(&fixture.output_dir)
        .target_size(16, 16)
        .icc_profile_path(&fixture.icc_path)
        .pattern("*.png")
        .build()
        .unwrap();

    let summary = ResizePipeline::new(config).run().await.unwrap();
    assert_eq!(summary.files_found, 1);
    assert!(fixture.output_dir.join("keep.png").is_file());
    assert!(!fixture.output_dir.join("skip.png").exists());
}
