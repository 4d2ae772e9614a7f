use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};

use crate::input::BitmapReader;
use crate::{Color, VectorizeError, VectorizeResult};

/// A dense, row-major raster with one (gray) or three (RGB) planes.
///
/// A zero width or height gives an empty pixel buffer, which every stage
/// accepts as a valid degenerate input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    planes: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Allocate a zero-filled bitmap.
    pub fn new(width: u32, height: u32, planes: u32) -> VectorizeResult<Self> {
        check_planes(planes)?;
        let len = buffer_len(width, height, planes);
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, 0);
        Ok(Self {
            width,
            height,
            planes,
            pixels,
        })
    }

    /// Wrap an existing pixel buffer.
    pub fn from_raw(width: u32, height: u32, planes: u32, pixels: Vec<u8>) -> VectorizeResult<Self> {
        check_planes(planes)?;
        let expected = buffer_len(width, height, planes);
        if pixels.len() != expected {
            return Err(VectorizeError::BufferMismatch {
                width,
                height,
                planes,
                expected,
                found: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            planes,
            pixels,
        })
    }

    /// A three-plane bitmap filled with one color.
    pub fn filled(width: u32, height: u32, color: Color) -> VectorizeResult<Self> {
        let mut bitmap = Self::new(width, height, 3)?;
        for px in bitmap.pixels.chunks_exact_mut(3) {
            px.copy_from_slice(&[color.r, color.g, color.b]);
        }
        Ok(bitmap)
    }

    /// Convert a decoded image. Gray color types keep one plane, everything
    /// else becomes RGB with any alpha channel dropped.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        if image.color().has_color() {
            Self::from(image.into_rgb8())
        } else {
            Self::from(image.into_luma8())
        }
    }

    /// Load a bitmap through a decoder.
    pub fn read<R>(reader: &R, source: impl AsRef<Path>) -> VectorizeResult<Self>
    where
        R: BitmapReader + ?Sized,
    {
        reader.read(source.as_ref())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn planes(&self) -> u32 {
        self.planes
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn is_gray(&self) -> bool {
        self.planes == 1
    }

    /// Number of pixels (not bytes).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Color of the pixel at a linear index; gray pixels read as `(v, v, v)`.
    pub fn color_at_index(&self, index: usize) -> Color {
        if self.planes == 1 {
            Color::gray(self.pixels[index])
        } else {
            let base = index * 3;
            Color::new(self.pixels[base], self.pixels[base + 1], self.pixels[base + 2])
        }
    }

    pub fn color_at(&self, x: u32, y: u32) -> Color {
        self.color_at_index(self.index(x, y))
    }

    /// Write a color at a linear index; gray bitmaps store its luminance.
    pub fn set_color_at_index(&mut self, index: usize, color: Color) {
        if self.planes == 1 {
            self.pixels[index] = color.luminance();
        } else {
            let base = index * 3;
            self.pixels[base..base + 3].copy_from_slice(&[color.r, color.g, color.b]);
        }
    }

    pub fn set_color(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.set_color_at_index(index, color);
    }

    /// Map a color into the bitmap's color space, so comparisons against
    /// stored pixels are exact.
    pub fn normalize_color(&self, color: Color) -> Color {
        if self.planes == 1 { color.to_gray() } else { color }
    }

    /// Copy the pixels into an RGB image buffer.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| self.color_at(x, y).into())
    }
}

impl From<RgbImage> for Bitmap {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            planes: 3,
            pixels: image.into_raw(),
        }
    }
}

impl From<GrayImage> for Bitmap {
    fn from(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            planes: 1,
            pixels: image.into_raw(),
        }
    }
}

fn check_planes(planes: u32) -> VectorizeResult<()> {
    match planes {
        1 | 3 => Ok(()),
        other => Err(VectorizeError::UnsupportedPlanes(other)),
    }
}

fn buffer_len(width: u32, height: u32, planes: u32) -> usize {
    width as usize * height as usize * planes as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, Rgba, RgbaImage};

    mod unit {
        use super::*;

        #[test]
        fn zero_dimensions_give_empty_buffer() {
            let bitmap = Bitmap::new(0, 7, 3).unwrap();
            assert!(bitmap.is_empty());
            assert_eq!(bitmap.dimensions(), (0, 7));
            assert_eq!(bitmap.pixel_count(), 0);
        }

        #[test]
        fn rejects_unsupported_planes() {
            let err = Bitmap::new(2, 2, 4).unwrap_err();
            assert!(matches!(err, VectorizeError::UnsupportedPlanes(4)));
        }

        #[test]
        fn from_raw_checks_length() {
            let err = Bitmap::from_raw(2, 2, 3, vec![0; 11]).unwrap_err();
            match err {
                VectorizeError::BufferMismatch { expected, found, .. } => {
                    assert_eq!(expected, 12);
                    assert_eq!(found, 11);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn set_and_get_rgb() {
            let mut bitmap = Bitmap::new(3, 2, 3).unwrap();
            bitmap.set_color(2, 1, Color::new(9, 8, 7));
            assert_eq!(bitmap.color_at(2, 1), Color::new(9, 8, 7));
            assert_eq!(bitmap.color_at(0, 0), Color::BLACK);
            assert_eq!(&bitmap.as_raw()[15..18], &[9, 8, 7]);
        }

        #[test]
        fn gray_stores_luminance() {
            let mut bitmap = Bitmap::new(1, 1, 1).unwrap();
            bitmap.set_color(0, 0, Color::WHITE);
            assert_eq!(bitmap.color_at(0, 0), Color::WHITE);
            bitmap.set_color(0, 0, Color::new(0, 255, 0));
            assert_eq!(bitmap.as_raw(), &[150]);
        }

        #[test]
        fn normalize_color_only_affects_gray() {
            let rgb = Bitmap::new(1, 1, 3).unwrap();
            let gray = Bitmap::new(1, 1, 1).unwrap();
            let c = Color::new(0, 255, 0);
            assert_eq!(rgb.normalize_color(c), c);
            assert_eq!(gray.normalize_color(c), Color::gray(150));
        }

        #[test]
        fn filled_sets_every_pixel() {
            let bitmap = Bitmap::filled(4, 3, Color::new(1, 2, 3)).unwrap();
            for i in 0..bitmap.pixel_count() {
                assert_eq!(bitmap.color_at_index(i), Color::new(1, 2, 3));
            }
        }

        #[test]
        fn converts_from_image_buffers() {
            let gray = GrayImage::from_pixel(2, 3, Luma([42]));
            let bitmap = Bitmap::from(gray);
            assert_eq!(bitmap.planes(), 1);
            assert_eq!(bitmap.color_at(1, 2), Color::gray(42));

            let rgb = RgbImage::from_pixel(2, 1, Rgb([1, 2, 3]));
            let bitmap = Bitmap::from(rgb);
            assert_eq!(bitmap.planes(), 3);
            assert_eq!(bitmap.color_at(1, 0), Color::new(1, 2, 3));
        }

        #[test]
        fn dynamic_rgba_drops_alpha() {
            let rgba = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 40]));
            let bitmap = Bitmap::from_dynamic(DynamicImage::ImageRgba8(rgba));
            assert_eq!(bitmap.planes(), 3);
            assert_eq!(bitmap.color_at(0, 0), Color::new(10, 20, 30));
        }

        #[test]
        fn dynamic_gray_keeps_one_plane() {
            let gray = GrayImage::from_pixel(2, 2, Luma([5]));
            let bitmap = Bitmap::from_dynamic(DynamicImage::ImageLuma8(gray));
            assert!(bitmap.is_gray());
        }

        #[test]
        fn to_rgb_image_expands_gray() {
            let bitmap = Bitmap::from(GrayImage::from_pixel(1, 1, Luma([7])));
            let rgb = bitmap.to_rgb_image();
            assert_eq!(rgb.get_pixel(0, 0), &Rgb([7, 7, 7]));
        }
    }
}
