use std::path::Path;

use crate::{Bitmap, VectorizeResult};

/// Decodes an image source into a [`Bitmap`].
pub trait BitmapReader {
    fn read(&self, source: &Path) -> VectorizeResult<Bitmap>;
}

/// Reads any file format the `image` crate can decode.
///
/// Gray images keep a single plane; color images are converted to RGB and
/// lose any alpha channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileReader;

impl BitmapReader for ImageFileReader {
    fn read(&self, source: &Path) -> VectorizeResult<Bitmap> {
        let image = image::open(source)?;
        let bitmap = Bitmap::from_dynamic(image);
        tracing::debug!(
            path = %source.display(),
            width = bitmap.width(),
            height = bitmap.height(),
            planes = bitmap.planes(),
            "decoded input bitmap"
        );
        Ok(bitmap)
    }
}
