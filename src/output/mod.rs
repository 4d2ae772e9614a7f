use std::io;

use kurbo::Rect;

use crate::{SplineListArray, VectorizeResult};

/// A format that can serialize fitted splines.
pub trait VectorWriter {
    /// Write `splines` covering `bounds` (in pixel units) to `out`.
    fn write(
        &self,
        out: &mut dyn io::Write,
        name: &str,
        bounds: Rect,
        dpi: u32,
        splines: &SplineListArray,
    ) -> VectorizeResult<()>;
}

/// Write a spline array over its full image bounds.
pub fn write_splines(
    splines: &SplineListArray,
    out: &mut dyn io::Write,
    name: Option<&str>,
    dpi: u32,
    writer: &dyn VectorWriter,
) -> VectorizeResult<()> {
    writer.write(out, name.unwrap_or(""), splines.bounds(), dpi, splines)?;
    out.flush()?;
    Ok(())
}

/// Format a coordinate with at most three decimals and no trailing zeros.
pub(crate) fn coord(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let text = format!("{rounded:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" { "0".to_string() } else { text.to_string() }
}

#[cfg(feature = "osm-writer")]
pub mod osm;
#[cfg(feature = "svg-writer")]
pub mod svg;
