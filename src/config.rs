use crate::{Color, VectorizeError, VectorizeResult};

/// Largest accepted despeckle level; the size threshold is `2^level` pixels.
pub const MAX_DESPECKLE_LEVEL: u32 = 20;
/// Largest accepted despeckle tightness.
pub const MAX_DESPECKLE_TIGHTNESS: f32 = 8.0;
/// Largest accepted palette size for color reduction.
pub const MAX_COLOR_COUNT: u32 = 256;

/// Options consumed by every stage of the pipeline.
///
/// Cloning deep-copies everything, including the optional background color.
#[derive(Debug, Clone, PartialEq)]
pub struct FittingOptions {
    /// Background color. Pixels of this color are never traced and removed
    /// regions are repainted with it. When unset, white is used wherever a
    /// concrete background is required and every color is traced in outline mode.
    pub background_color: Option<Color>,
    /// Maximum number of colors after reduction; 0 disables quantization.
    pub color_count: u32,
    /// Interior angle in degrees below which a point is a corner candidate.
    pub corner_threshold: f64,
    /// Interior angle in degrees below which a point is a corner even when a
    /// sharper corner is nearby.
    pub corner_always_threshold: f64,
    /// Number of points on each side used to measure the angle at a point.
    pub corner_surround: usize,
    /// Number of points used to estimate a tangent at a segment end.
    pub tangent_surround: usize,
    /// Maximum distance in pixels between a source point and the fitted curve.
    pub error_threshold: f64,
    /// Despeckle level; components smaller than `2^level` pixels are removed.
    /// 0 disables despeckling.
    pub despeckle_level: u32,
    /// How much more aggressively near-background specks are removed.
    pub despeckle_tightness: f32,
    /// Trace skeleton centerlines instead of region outlines.
    pub centerline: bool,
}

impl Default for FittingOptions {
    fn default() -> Self {
        Self {
            background_color: None,
            color_count: 0,
            corner_threshold: 100.0,
            corner_always_threshold: 60.0,
            corner_surround: 4,
            tangent_surround: 3,
            error_threshold: 2.0,
            despeckle_level: 0,
            despeckle_tightness: 2.0,
            centerline: false,
        }
    }
}

impl FittingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background_color(mut self, color: Option<Color>) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_color_count(mut self, color_count: u32) -> Self {
        self.color_count = color_count;
        self
    }

    pub fn with_centerline(mut self, centerline: bool) -> Self {
        self.centerline = centerline;
        self
    }

    pub fn with_despeckle(mut self, level: u32, tightness: f32) -> Self {
        self.despeckle_level = level;
        self.despeckle_tightness = tightness;
        self
    }

    pub fn with_corner_threshold(mut self, degrees: f64) -> Self {
        self.corner_threshold = degrees;
        self
    }

    pub fn with_corner_always_threshold(mut self, degrees: f64) -> Self {
        self.corner_always_threshold = degrees;
        self
    }

    pub fn with_corner_surround(mut self, surround: usize) -> Self {
        self.corner_surround = surround;
        self
    }

    pub fn with_tangent_surround(mut self, surround: usize) -> Self {
        self.tangent_surround = surround;
        self
    }

    pub fn with_error_threshold(mut self, pixels: f64) -> Self {
        self.error_threshold = pixels;
        self
    }

    /// The background color to paint with when one is required.
    pub fn background_or_white(&self) -> Color {
        self.background_color.unwrap_or(Color::WHITE)
    }

    /// Check every option against its accepted range.
    pub fn validate(&self) -> VectorizeResult<()> {
        if self.despeckle_level > MAX_DESPECKLE_LEVEL {
            return Err(VectorizeError::invalid_option(
                "despeckle_level",
                format!("{} exceeds {MAX_DESPECKLE_LEVEL}", self.despeckle_level),
            ));
        }
        if !(0.0..=MAX_DESPECKLE_TIGHTNESS).contains(&self.despeckle_tightness) {
            return Err(VectorizeError::invalid_option(
                "despeckle_tightness",
                format!("{} is outside 0..={MAX_DESPECKLE_TIGHTNESS}", self.despeckle_tightness),
            ));
        }
        if self.color_count > MAX_COLOR_COUNT {
            return Err(VectorizeError::invalid_option(
                "color_count",
                format!("{} exceeds {MAX_COLOR_COUNT}", self.color_count),
            ));
        }
        check_angle("corner_threshold", self.corner_threshold)?;
        check_angle("corner_always_threshold", self.corner_always_threshold)?;
        if self.corner_surround == 0 {
            return Err(VectorizeError::invalid_option("corner_surround", "must be at least 1"));
        }
        if self.tangent_surround == 0 {
            return Err(VectorizeError::invalid_option("tangent_surround", "must be at least 1"));
        }
        if !self.error_threshold.is_finite() || self.error_threshold <= 0.0 {
            return Err(VectorizeError::invalid_option(
                "error_threshold",
                format!("{} is not a positive distance", self.error_threshold),
            ));
        }
        Ok(())
    }
}

fn check_angle(name: &'static str, degrees: f64) -> VectorizeResult<()> {
    if degrees.is_finite() && degrees > 0.0 && degrees <= 180.0 {
        Ok(())
    } else {
        Err(VectorizeError::invalid_option(
            name,
            format!("{degrees} is outside (0, 180] degrees"),
        ))
    }
}
