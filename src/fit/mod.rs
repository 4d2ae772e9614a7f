//! Curve fitting: pixel chains to spline lists.
//!
//! Per chain:
//! 1. Detect corners
//! 2. Split into runs between corners (or synthetic boundaries)
//! 3. Fit each run to lines and cubics, splitting until within tolerance
//! 4. Stitch the runs into one list with the chain's color

pub mod bezier;
pub mod corners;

use kurbo::{Line, Point};

use crate::control::{Cancellation, Flow, Progress};
use crate::fit::bezier::{FitParams, fit_run};
use crate::fit::corners::{CornerParams, find_corners};
use crate::spline::{Spline, SplineList, SplineListArray};
use crate::trace::{PixelOutline, PixelOutlineList};
use crate::{Diagnostics, FittingOptions, VectorizeResult};

/// Fit every pixel chain in `outlines` to a spline list.
///
/// Lists come out in the same order as the chains. A closed chain yields a
/// closed list whose last segment ends where the first begins.
pub fn fit_splines(
    outlines: &PixelOutlineList,
    width: u32,
    height: u32,
    options: &FittingOptions,
    diagnostics: &mut Diagnostics,
    progress: &dyn Progress,
    cancel: &dyn Cancellation,
) -> VectorizeResult<Flow<SplineListArray>> {
    let mut array = SplineListArray {
        centerline: outlines.centerline,
        background_color: options.background_color,
        ..SplineListArray::new(width, height)
    };
    array.lists.try_reserve_exact(outlines.len())?;

    let corner_params = CornerParams {
        threshold: options.corner_threshold,
        always_threshold: options.corner_always_threshold,
        surround: options.corner_surround,
    };
    let fit_params = FitParams {
        tolerance: options.error_threshold,
        tangent_surround: options.tangent_surround,
    };

    let total = outlines.len();
    for (index, outline) in outlines.iter().enumerate() {
        if cancel.is_cancelled() {
            return Ok(Flow::Cancelled(array));
        }
        if outline.is_empty() {
            continue;
        }
        let list = fit_outline(outline, corner_params, fit_params, diagnostics)?;
        array.lists.push(list);
        progress.notify((index + 1) as f32 / total as f32);
    }

    progress.notify(1.0);
    tracing::debug!(
        lists = array.len(),
        splines = array.spline_count(),
        "curve fitting finished"
    );
    Ok(Flow::Finished(array))
}

/// Fit one chain to a spline list.
pub fn fit_outline(
    outline: &PixelOutline,
    corner_params: CornerParams,
    fit_params: FitParams,
    diagnostics: &mut Diagnostics,
) -> VectorizeResult<SplineList> {
    let points: Vec<Point> = outline.points.iter().map(|c| c.to_point()).collect();
    let mut splines = Vec::new();

    if points.len() == 1 {
        let p = points[0];
        diagnostics.warning(format!("degenerate single-pixel region at ({}, {})", p.x, p.y));
        splines.push(Spline::Line(Line::new(p, p)));
    } else {
        let closed = !outline.open;
        let corners = find_corners(&points, closed, corner_params);
        for (start, end) in runs(&corners, points.len(), closed) {
            let run: Vec<Point> = (start..=end).map(|i| points[i % points.len()]).collect();
            fit_run(&run, fit_params, &mut splines)?;
        }
    }

    Ok(SplineList {
        splines,
        color: outline.color,
        open: outline.open,
    })
}

/// Index ranges `(start, end)` to fit independently. For closed chains `end`
/// may exceed the chain length and wraps around.
fn runs(corners: &[usize], n: usize, closed: bool) -> Vec<(usize, usize)> {
    let mut bounds: Vec<usize> = if closed {
        match corners {
            [] => vec![0, n / 2],
            [only] => vec![*only, (*only + n / 2) % n],
            _ => corners.to_vec(),
        }
    } else {
        let mut bounds = Vec::with_capacity(corners.len() + 2);
        bounds.push(0);
        bounds.extend_from_slice(corners);
        bounds.push(n - 1);
        bounds
    };
    bounds.sort_unstable();
    bounds.dedup();

    let mut runs: Vec<(usize, usize)> = bounds.windows(2).map(|pair| (pair[0], pair[1])).collect();
    if closed {
        if let (Some(&first), Some(&last)) = (bounds.first(), bounds.last()) {
            runs.push((last, first + n));
        }
    }
    runs
}
