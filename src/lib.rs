pub mod bitmap;
pub mod color;
pub mod config;
pub mod control;
pub mod despeckle;
pub mod diagnostics;
pub mod error;
pub mod fit;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod quantize;
pub mod spline;
pub mod thin;
pub mod trace;

pub use bitmap::Bitmap;
pub use color::Color;
pub use config::FittingOptions;
pub use control::{Cancellation, Flow, NeverCancel, NoProgress, Progress};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{VectorizeError, VectorizeResult};
pub use input::{BitmapReader, ImageFileReader};
pub use output::{VectorWriter, write_splines};
#[cfg(feature = "osm-writer")]
pub use output::osm::OsmWriter;
#[cfg(feature = "svg-writer")]
pub use output::svg::SvgWriter;
pub use pipeline::{Outcome, vectorize, vectorize_with};
pub use spline::{Degree, Spline, SplineList, SplineListArray};
pub use trace::{Coord, PixelOutline, PixelOutlineList};

use std::path::Path;

/// Library version, optionally prefixed with the library name.
pub fn version(long_format: bool) -> &'static str {
    if long_format {
        concat!("splinetrace version ", env!("CARGO_PKG_VERSION"))
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Entry point for configuring and running vectorization.
#[derive(Debug, Clone, Default)]
pub struct Vectorizer {
    options: FittingOptions,
}

impl Vectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all fitting options at once.
    pub fn with_options(mut self, options: FittingOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the color treated as empty space. `None` traces every color.
    pub fn with_background_color(mut self, color: Option<Color>) -> Self {
        self.options.background_color = color;
        self
    }

    /// Reduce the image to at most `color_count` colors first; 0 disables.
    pub fn with_color_count(mut self, color_count: u32) -> Self {
        self.options.color_count = color_count;
        self
    }

    /// Trace skeleton centerlines instead of region outlines.
    pub fn with_centerline(mut self, centerline: bool) -> Self {
        self.options.centerline = centerline;
        self
    }

    /// Set the maximum fitting error in pixels.
    pub fn with_error_threshold(mut self, pixels: f64) -> Self {
        self.options.error_threshold = pixels;
        self
    }

    /// Get a reference to the current fitting options.
    pub fn options(&self) -> &FittingOptions {
        &self.options
    }

    /// Vectorize a bitmap in place.
    pub fn run(&self, bitmap: &mut Bitmap, diagnostics: &mut Diagnostics) -> VectorizeResult<Outcome> {
        vectorize(bitmap, &self.options, diagnostics)
    }

    /// Vectorize a bitmap with progress reporting and cancellation.
    pub fn run_with(
        &self,
        bitmap: &mut Bitmap,
        diagnostics: &mut Diagnostics,
        progress: &dyn Progress,
        cancel: &dyn Cancellation,
    ) -> VectorizeResult<Outcome> {
        vectorize_with(bitmap, &self.options, diagnostics, progress, cancel)
    }

    /// Decode an image through `reader` and vectorize it.
    pub fn for_file<R>(
        &self,
        reader: &R,
        path: impl AsRef<Path>,
        diagnostics: &mut Diagnostics,
    ) -> VectorizeResult<Outcome>
    where
        R: BitmapReader + ?Sized,
    {
        let mut bitmap = Bitmap::read(reader, path).inspect_err(|err| diagnostics.fatal(err.to_string()))?;
        self.run(&mut bitmap, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_formats() {
        assert_eq!(version(false), env!("CARGO_PKG_VERSION"));
        assert!(version(true).starts_with("splinetrace version "));
        assert!(version(true).ends_with(version(false)));
    }

    #[test]
    fn builder_sets_options() {
        let vectorizer = Vectorizer::new()
            .with_background_color(Some(Color::WHITE))
            .with_color_count(8)
            .with_centerline(true)
            .with_error_threshold(0.5);
        let options = vectorizer.options();
        assert_eq!(options.background_color, Some(Color::WHITE));
        assert_eq!(options.color_count, 8);
        assert!(options.centerline);
        assert_eq!(options.error_threshold, 0.5);
    }

    #[test]
    fn for_file_records_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut diagnostics = Diagnostics::new();
        let result = Vectorizer::new().for_file(&ImageFileReader, dir.path().join("none.png"), &mut diagnostics);
        assert!(result.is_err());
        assert!(diagnostics.has_fatal());
    }
}
