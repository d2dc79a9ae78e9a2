//! Image file input/output operations
//!
//! Separates file I/O from pipeline logic. Loading tries extension-based
//! decoding first and falls back to content sniffing, since training-set
//! inputs frequently carry wrong or missing extensions.

use crate::color_profile::ColorProfile;
use crate::error::{PrepError, Result};
use image::codecs::png::PngEncoder;
use image::{
    DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder, Rgb, RgbImage, RgbaImage,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Service for handling image file input/output operations
pub struct ImageIoService;

impl ImageIoService {
    /// Load an image from a file path
    ///
    /// # Errors
    /// - File does not exist or is unreadable
    /// - Contents decode with neither extension-based nor content-based
    ///   format detection
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(PrepError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    PrepError::file_io_error("read image data", path_ref, &io_err)
                })?;

                image::load_from_memory(&data).map_err(|content_err| {
                    PrepError::processing(format!(
                        "Failed to load {} with both extension-based and content-based detection. Extension error: {}. Content error: {}",
                        path_ref.display(),
                        e,
                        content_err
                    ))
                })
            },
        }
    }

    /// Save an image as PNG with the sidecar ICC profile embedded
    ///
    /// Grayscale images are written as 8-bit luma, everything else as 8-bit
    /// RGB or RGBA depending on the buffer handed in.
    ///
    /// # Errors
    /// - Output directory cannot be created
    /// - Encoder rejects the profile or the pixel data
    pub fn save_png_with_profile<P: AsRef<Path>>(
        image: &DynamicImage,
        path: P,
        profile: &ColorProfile,
    ) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PrepError::file_io_error("create output directory", parent, &e)
            })?;
        }

        let file = File::create(path_ref)
            .map_err(|e| PrepError::file_io_error("create output file", path_ref, &e))?;
        let writer = BufWriter::new(file);
        let mut encoder = PngEncoder::new(writer);
        encoder
            .set_icc_profile(profile.data().to_vec())
            .map_err(|e| {
                PrepError::processing(format!(
                    "Failed to embed ICC profile into {}: {e}",
                    path_ref.display()
                ))
            })?;

        let (width, height) = (image.width(), image.height());
        let encode_result = match image {
            DynamicImage::ImageLuma8(gray) => {
                encoder.write_image(gray.as_raw(), width, height, ExtendedColorType::L8)
            },
            DynamicImage::ImageRgb8(rgb) => {
                encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            },
            DynamicImage::ImageRgba8(rgba) => {
                encoder.write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
            },
            other => {
                let rgb = other.to_rgb8();
                encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            },
        };

        encode_result.map_err(|e| {
            PrepError::processing(format!("Failed to encode {}: {e}", path_ref.display()))
        })
    }

    /// Composite an RGBA image onto an opaque white background
    ///
    /// Eliminates transparency so outputs always carry exactly three
    /// channels; fully transparent pixels become pure white.
    #[must_use]
    pub fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
        let (width, height) = rgba.dimensions();
        let mut rgb = RgbImage::new(width, height);
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let alpha = u16::from(pixel[3]);
            let blend =
                |channel: u8| -> u8 { ((u16::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8 };
            rgb.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
        }
        rgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_flatten_fully_transparent_is_white() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 0]));
        let rgb = ImageIoService::flatten_onto_white(&rgba);
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_flatten_opaque_is_unchanged() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let rgb = ImageIoService::flatten_onto_white(&rgba);
        assert_eq!(rgb.get_pixel(1, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_flatten_half_transparent_blends() {
        let rgba = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let rgb = ImageIoService::flatten_onto_white(&rgba);
        let pixel = rgb.get_pixel(0, 0);
        // Black at ~50% alpha over white lands near mid-gray
        assert!(pixel[0] > 120 && pixel[0] < 132, "got {}", pixel[0]);
    }

    #[test]
    fn test_load_image_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageIoService::load_image(dir.path().join("missing.png")).unwrap_err();
        assert!(err.to_string().contains("missing.png"));
    }

    #[test]
    fn test_load_image_wrong_extension_falls_back_to_content() {
        let dir = tempfile::tempdir().unwrap();
        // A PNG masquerading as a JPEG
        let path = dir.path().join("actually_png.jpg");
        let image = DynamicImage::new_rgb8(4, 4);
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(&path, &bytes).unwrap();

        let loaded = ImageIoService::load_image(&path).unwrap();
        assert_eq!(loaded.width(), 4);
    }

    #[test]
    fn test_load_image_undecodable_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"not an image at all").unwrap();
        assert!(ImageIoService::load_image(&path).is_err());
    }
}
