//! The five-stage pipeline: despeckle, quantize, thin, trace, fit.

use crate::control::{Cancellation, Flow, NeverCancel, NoProgress, Progress, StageProgress};
use crate::despeckle::despeckle;
use crate::fit::fit_splines;
use crate::quantize::quantize;
use crate::thin::thin;
use crate::trace::{find_centerline_pixels, find_outline_pixels};
use crate::{Bitmap, Diagnostics, FittingOptions, SplineListArray, VectorizeResult};

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// All stages completed.
    Finished(SplineListArray),
    /// The cancellation predicate fired; partial results were discarded.
    Cancelled,
}

impl Outcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// The splines, if the run finished.
    pub fn finished(self) -> Option<SplineListArray> {
        match self {
            Outcome::Finished(splines) => Some(splines),
            Outcome::Cancelled => None,
        }
    }
}

/// Vectorize `bitmap` without progress reporting or cancellation.
pub fn vectorize(
    bitmap: &mut Bitmap,
    options: &FittingOptions,
    diagnostics: &mut Diagnostics,
) -> VectorizeResult<Outcome> {
    vectorize_with(bitmap, options, diagnostics, &NoProgress, &NeverCancel)
}

/// Vectorize `bitmap`, reporting progress and polling `cancel` between
/// stages and inside the tracer and fitter.
///
/// The bitmap is preprocessed in place. Any error is also recorded as a
/// fatal diagnostic before it is returned.
pub fn vectorize_with(
    bitmap: &mut Bitmap,
    options: &FittingOptions,
    diagnostics: &mut Diagnostics,
    progress: &dyn Progress,
    cancel: &dyn Cancellation,
) -> VectorizeResult<Outcome> {
    let result = run(bitmap, options, diagnostics, progress, cancel);
    if let Err(err) = &result {
        diagnostics.fatal(err.to_string());
    }
    result
}

fn run(
    bitmap: &mut Bitmap,
    options: &FittingOptions,
    diagnostics: &mut Diagnostics,
    progress: &dyn Progress,
    cancel: &dyn Cancellation,
) -> VectorizeResult<Outcome> {
    options.validate()?;
    let mut options = options.clone();
    options.background_color = options.background_color.map(|c| bitmap.normalize_color(c));
    let background = bitmap.normalize_color(options.background_or_white());
    let (width, height) = bitmap.dimensions();
    tracing::debug!(width, height, planes = bitmap.planes(), centerline = options.centerline, "vectorizing");

    if cancel.is_cancelled() {
        return Ok(Outcome::Cancelled);
    }

    if options.despeckle_level > 0 {
        despeckle(
            bitmap,
            options.despeckle_level,
            options.despeckle_tightness,
            background,
            diagnostics,
        )?;
        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
    }

    if options.color_count > 0 {
        let palette = quantize(bitmap, options.color_count, options.background_color, diagnostics)?;
        tracing::debug!(colors = palette.len(), "quantized");
        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
    }

    if options.centerline {
        thin(bitmap, background, diagnostics)?;
        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
    }

    let trace_progress = StageProgress::new(progress, 0.0, 0.5);
    let traced = if options.centerline {
        find_centerline_pixels(bitmap, background, &trace_progress, cancel)?
    } else {
        find_outline_pixels(bitmap, options.background_color, &trace_progress, cancel)?
    };
    let Flow::Finished(outlines) = traced else {
        return Ok(Outcome::Cancelled);
    };
    if cancel.is_cancelled() {
        return Ok(Outcome::Cancelled);
    }

    let fit_progress = StageProgress::new(progress, 0.5, 1.0);
    let fitted = fit_splines(&outlines, width, height, &options, diagnostics, &fit_progress, cancel)?;
    let Flow::Finished(splines) = fitted else {
        return Ok(Outcome::Cancelled);
    };
    if cancel.is_cancelled() {
        return Ok(Outcome::Cancelled);
    }

    tracing::debug!(lists = splines.len(), splines = splines.spline_count(), "vectorized");
    Ok(Outcome::Finished(splines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, VectorizeError};
    use std::cell::Cell;

    #[test]
    fn invalid_options_are_fatal() {
        let mut bitmap = Bitmap::filled(2, 2, Color::BLACK).unwrap();
        let mut diagnostics = Diagnostics::new();
        let options = FittingOptions::default().with_error_threshold(-1.0);
        let err = vectorize(&mut bitmap, &options, &mut diagnostics).unwrap_err();
        assert!(matches!(err, VectorizeError::InvalidOption { name: "error_threshold", .. }));
        assert!(diagnostics.has_fatal());
    }

    #[test]
    fn cancellation_after_a_few_polls() {
        let mut bitmap = Bitmap::filled(6, 6, Color::WHITE).unwrap();
        bitmap.set_color(2, 2, Color::BLACK);
        let polls = Cell::new(0);
        let cancel = || {
            polls.set(polls.get() + 1);
            polls.get() > 3
        };
        let mut diagnostics = Diagnostics::new();
        let outcome = vectorize_with(
            &mut bitmap,
            &FittingOptions::default(),
            &mut diagnostics,
            &NoProgress,
            &cancel,
        )
        .unwrap();
        assert!(outcome.is_cancelled());
        assert!(!diagnostics.has_fatal());
    }

    #[test]
    fn gray_background_is_normalized() {
        let mut bitmap = Bitmap::new(4, 4, 1).unwrap();
        for i in 0..bitmap.pixel_count() {
            bitmap.set_color_at_index(i, Color::WHITE);
        }
        bitmap.set_color(1, 1, Color::BLACK);
        let options = FittingOptions::default().with_background_color(Some(Color::WHITE));
        let splines = vectorize(&mut bitmap, &options, &mut Diagnostics::new())
            .unwrap()
            .finished()
            .unwrap();
        assert_eq!(splines.len(), 1);
        assert_eq!(splines.lists[0].color, Color::BLACK);
        assert_eq!(splines.background_color, Some(Color::WHITE));
    }

    #[test]
    fn progress_is_monotonic_and_completes() {
        let seen = std::cell::RefCell::new(Vec::new());
        let mut bitmap = Bitmap::filled(5, 5, Color::WHITE).unwrap();
        bitmap.set_color(2, 2, Color::BLACK);
        let options = FittingOptions::default().with_background_color(Some(Color::WHITE));
        vectorize_with(
            &mut bitmap,
            &options,
            &mut Diagnostics::new(),
            &|f: f32| seen.borrow_mut().push(f),
            &NeverCancel,
        )
        .unwrap();
        let seen = seen.into_inner();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&1.0));
        assert!(seen.iter().all(|f| (0.0..=1.0).contains(f)));
    }
}
