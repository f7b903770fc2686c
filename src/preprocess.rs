//! Image preprocessing pipeline.
//!
//! Turns an arbitrary source image into the sequence of raster chunks the
//! printer accepts: scale to the printable width preserving aspect ratio,
//! invert and threshold into a two-valued bitmap, then split into chunks
//! of at most [`MAX_CHUNK_ROWS`] rows.
//!
//! The chunk sequence starts with one synthetic all-background chunk.
//! The device drops the first few printed rows of a job, so the padding
//! chunk absorbs the loss instead of the image.

use image::{imageops::FilterType, DynamicImage, GrayImage, Luma};
use std::path::Path;

use crate::{
    error::Error,
    raster::{Bitmap, MAX_CHUNK_ROWS},
};

/// Luminance cutoff for binarization, strict `>` comparison.
pub const DEFAULT_THRESHOLD: u8 = 127;

/// Rows in the synthetic lead-in chunk.
pub const DEFAULT_PADDING_TOP: u32 = 5;

/// Scale and binarize a source image into the working bitmap.
///
/// The target height is `floor(target_width * src_h / src_w)`. After
/// resampling, luminance is inverted (the head burns where the source is
/// dark) and each pixel becomes 1 iff its inverted luminance exceeds
/// `threshold`.
///
/// Fails with [`Error::InvalidDimensions`] when the source has a zero
/// dimension, or is so wide that the computed target height is zero.
pub fn binarize(
    src: &DynamicImage,
    target_width: u32,
    threshold: u8,
) -> Result<Bitmap, Error> {
    let (src_w, src_h) = (src.width(), src.height());
    if src_w == 0 || src_h == 0 {
        return Err(Error::InvalidDimensions {
            width: src_w,
            height: src_h,
        });
    }

    let target_height = (target_width as u64 * src_h as u64 / src_w as u64) as u32;
    if target_height == 0 {
        return Err(Error::InvalidDimensions {
            width: src_w,
            height: src_h,
        });
    }

    let gray = src
        .resize_exact(target_width, target_height, FilterType::Triangle)
        .into_luma8();

    let mut pixels = Vec::with_capacity((target_width * target_height) as usize);
    for &Luma([luma]) in gray.pixels() {
        let inverted = 255 - luma;
        pixels.push((inverted > threshold) as u8);
    }

    Ok(Bitmap::from_pixels(target_width, target_height, pixels))
}

/// Split a bitmap into printable chunks.
///
/// Yields the padding chunk first, then `ceil(height / 255)` content
/// chunks of at most [`MAX_CHUNK_ROWS`] rows; the last one holds the
/// remainder. The iterator is one-shot and forward-only, consuming the
/// bitmap.
pub fn chunks(bitmap: Bitmap, padding_top: u32) -> Chunks {
    Chunks {
        padding: (padding_top > 0).then(|| Bitmap::new(bitmap.width(), padding_top)),
        bitmap,
        cursor: 0,
    }
}

/// Iterator over the raster chunks of one print job. See [`chunks`].
pub struct Chunks {
    bitmap: Bitmap,
    cursor: u32,
    padding: Option<Bitmap>,
}

impl Iterator for Chunks {
    type Item = Bitmap;

    fn next(&mut self) -> Option<Bitmap> {
        if let Some(padding) = self.padding.take() {
            return Some(padding);
        }
        if self.cursor >= self.bitmap.height() {
            return None;
        }

        let end = (self.cursor + MAX_CHUNK_ROWS).min(self.bitmap.height());
        let chunk = self.bitmap.crop_rows(self.cursor, end);
        self.cursor = end;
        Some(chunk)
    }
}

/// Save the working bitmap as a grayscale PNG for inspection.
///
/// Foreground pixels come out white, matching the inverted working
/// representation rather than the source image.
pub fn save_debug_bitmap<P: AsRef<Path>>(bitmap: &Bitmap, path: P) -> Result<(), Error> {
    let mut img = GrayImage::new(bitmap.width(), bitmap.height());
    for (i, pixel) in bitmap.pixels().iter().enumerate() {
        let x = i as u32 % bitmap.width();
        let y = i as u32 / bitmap.width();
        img.put_pixel(x, y, Luma([pixel * 255]));
    }
    img.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_source(width: u32, height: u32, luma: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([luma])))
    }

    #[test]
    fn scale_preserves_aspect_ratio() {
        let src = uniform_source(1024, 512, 0);
        let bitmap = binarize(&src, 512, DEFAULT_THRESHOLD).unwrap();
        assert_eq!(bitmap.width(), 512);
        assert_eq!(bitmap.height(), 256);
    }

    #[test]
    fn scale_floors_target_height() {
        // 512 * 300 / 1000 = 153.6
        let src = uniform_source(1000, 300, 0);
        let bitmap = binarize(&src, 512, DEFAULT_THRESHOLD).unwrap();
        assert_eq!(bitmap.height(), 153);
    }

    #[test]
    fn rejects_zero_sized_source() {
        let src = DynamicImage::ImageLuma8(GrayImage::new(0, 10));
        assert!(matches!(
            binarize(&src, 512, DEFAULT_THRESHOLD),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn rejects_source_scaling_to_zero_height() {
        let src = uniform_source(10000, 1, 0);
        assert!(matches!(
            binarize(&src, 512, DEFAULT_THRESHOLD),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn white_source_becomes_all_background() {
        let src = uniform_source(64, 64, 255);
        let bitmap = binarize(&src, 64, DEFAULT_THRESHOLD).unwrap();
        assert!(bitmap.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn black_source_becomes_all_foreground() {
        let src = uniform_source(64, 64, 0);
        let bitmap = binarize(&src, 64, DEFAULT_THRESHOLD).unwrap();
        assert!(bitmap.pixels().iter().all(|&p| p == 1));
    }

    #[test]
    fn threshold_comparison_is_strict() {
        // Inverted luminance 127 is not above the cutoff.
        let src = uniform_source(32, 32, 128);
        let bitmap = binarize(&src, 32, DEFAULT_THRESHOLD).unwrap();
        assert!(bitmap.pixels().iter().all(|&p| p == 0));

        // Inverted luminance 128 is.
        let src = uniform_source(32, 32, 127);
        let bitmap = binarize(&src, 32, DEFAULT_THRESHOLD).unwrap();
        assert!(bitmap.pixels().iter().all(|&p| p == 1));
    }

    #[test]
    fn chunking_splits_at_255_rows() {
        let bitmap = Bitmap::new(512, 256);
        let parts: Vec<Bitmap> = chunks(bitmap, DEFAULT_PADDING_TOP).collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].height(), 5);
        assert!(parts[0].pixels().iter().all(|&p| p == 0));
        assert_eq!(parts[1].height(), 255);
        assert_eq!(parts[2].height(), 1);
    }

    #[test]
    fn short_image_is_a_single_content_chunk() {
        let bitmap = Bitmap::new(8, 30);
        let parts: Vec<Bitmap> = chunks(bitmap, DEFAULT_PADDING_TOP).collect();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].height(), 5);
        assert_eq!(parts[1].height(), 30);
    }

    #[test]
    fn exact_multiple_has_no_blank_tail_chunk() {
        let bitmap = Bitmap::new(8, 510);
        let heights: Vec<u32> = chunks(bitmap, DEFAULT_PADDING_TOP)
            .map(|c| c.height())
            .collect();
        assert_eq!(heights, vec![5, 255, 255]);
    }

    #[test]
    fn end_to_end_chunk_count_for_tall_image() {
        let src = uniform_source(1024, 512, 0);
        let bitmap = binarize(&src, 512, DEFAULT_THRESHOLD).unwrap();
        let parts: Vec<Bitmap> = chunks(bitmap, DEFAULT_PADDING_TOP).collect();

        let heights: Vec<u32> = parts.iter().map(|c| c.height()).collect();
        assert_eq!(heights, vec![5, 255, 1]);
        assert!(parts.iter().all(|c| c.width() == 512));
    }
}
