//! Exact-size resizing with area-averaging interpolation
//!
//! Wraps `fast_image_resize` with a box convolution filter, the equivalent of
//! area averaging: the right choice when shrinking photographs to a training
//! resolution, since every source pixel contributes to the output. Aspect
//! ratio is not preserved; the output is always exactly the requested size.

use crate::error::{PrepError, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GenericImageView, GrayImage, RgbImage, RgbaImage};

/// Resize an image to exactly `width` x `height` using area averaging
///
/// Grayscale, RGB, and RGBA buffers are resized in their own pixel layout;
/// any other layout is converted to RGBA first.
///
/// # Errors
/// - Source image has a zero dimension
/// - Resizer rejects the buffer
pub fn resize_exact(image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PrepError::processing(format!(
            "cannot resize a {}x{} image",
            image.width(),
            image.height()
        )));
    }

    match image {
        DynamicImage::ImageLuma8(gray) => {
            let resized = resize_plane(gray.as_raw(), image.width(), image.height(), width, height, PixelType::U8)?;
            let buffer = GrayImage::from_raw(width, height, resized)
                .ok_or_else(|| PrepError::processing("resized luma buffer has wrong length"))?;
            Ok(DynamicImage::ImageLuma8(buffer))
        },
        DynamicImage::ImageRgb8(rgb) => {
            let resized = resize_plane(rgb.as_raw(), image.width(), image.height(), width, height, PixelType::U8x3)?;
            let buffer = RgbImage::from_raw(width, height, resized)
                .ok_or_else(|| PrepError::processing("resized RGB buffer has wrong length"))?;
            Ok(DynamicImage::ImageRgb8(buffer))
        },
        DynamicImage::ImageRgba8(rgba) => {
            let resized = resize_plane(rgba.as_raw(), image.width(), image.height(), width, height, PixelType::U8x4)?;
            let buffer = RgbaImage::from_raw(width, height, resized)
                .ok_or_else(|| PrepError::processing("resized RGBA buffer has wrong length"))?;
            Ok(DynamicImage::ImageRgba8(buffer))
        },
        other => {
            let rgba = other.to_rgba8();
            let resized = resize_plane(rgba.as_raw(), rgba.width(), rgba.height(), width, height, PixelType::U8x4)?;
            let buffer = RgbaImage::from_raw(width, height, resized)
                .ok_or_else(|| PrepError::processing("resized RGBA buffer has wrong length"))?;
            Ok(DynamicImage::ImageRgba8(buffer))
        },
    }
}

fn resize_plane(
    data: &[u8],
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
    pixel_type: PixelType,
) -> Result<Vec<u8>> {
    let resize_options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(src_width, src_height, data.to_vec(), pixel_type)
        .map_err(|e| PrepError::processing(format!("invalid source image buffer: {e}")))?;
    let mut dst_image = Image::new(dst_width, dst_height, pixel_type);
    resizer
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(|e| PrepError::processing(format!("resize failed: {e}")))?;

    Ok(dst_image.into_vec())
}
