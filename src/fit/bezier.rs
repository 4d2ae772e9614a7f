//! Least-squares fitting of a run of points to lines and cubic Beziers.

use kurbo::{CubicBez, Line, ParamCurve, ParamCurveDeriv, Point, Vec2};

use crate::VectorizeResult;
use crate::spline::Spline;

/// Newton reparameterization passes before giving up and splitting.
const MAX_REPARAMETERIZE: usize = 4;

/// Reparameterize only while the error is within this multiple of the tolerance.
const REPARAMETERIZE_FACTOR: f64 = 4.0;

/// Fitting parameters for one run.
#[derive(Debug, Clone, Copy)]
pub struct FitParams {
    /// Maximum allowed distance, in pixels, between a point and its fitted position.
    pub tolerance: f64,
    /// Points to average over when estimating an end tangent.
    pub tangent_surround: usize,
}

/// Fit `points` (at least two) and append the segments to `out`.
///
/// The first segment starts at `points[0]`, the last ends at the final
/// point, and consecutive segments share endpoints exactly.
pub fn fit_run(points: &[Point], params: FitParams, out: &mut Vec<Spline>) -> VectorizeResult<()> {
    fit_recursive(points, None, None, params, out)
}

fn fit_recursive(
    points: &[Point],
    start_tangent: Option<Vec2>,
    end_tangent: Option<Vec2>,
    params: FitParams,
    out: &mut Vec<Spline>,
) -> VectorizeResult<()> {
    let k = points.len();
    let (first, last) = (points[0], points[k - 1]);
    if k <= 2 || within_chord(points, params.tolerance) {
        out.try_reserve(1)?;
        out.push(Spline::Line(Line::new(first, last)));
        return Ok(());
    }

    let chord = last - first;
    let surround = params.tangent_surround;
    let start_tangent =
        start_tangent.unwrap_or_else(|| estimate_tangent(points.iter().copied(), surround, chord));
    let end_tangent =
        end_tangent.unwrap_or_else(|| estimate_tangent(points.iter().rev().copied(), surround, -chord));

    let mut u = chord_length_parameters(points);
    let mut cubic = generate_cubic(points, &u, start_tangent, end_tangent);
    let (mut error, mut worst) = max_error(points, &u, &cubic);
    if error <= params.tolerance {
        out.try_reserve(1)?;
        out.push(Spline::Cubic(cubic));
        return Ok(());
    }

    if error < params.tolerance * REPARAMETERIZE_FACTOR {
        for _ in 0..MAX_REPARAMETERIZE {
            reparameterize(points, &mut u, &cubic);
            cubic = generate_cubic(points, &u, start_tangent, end_tangent);
            (error, worst) = max_error(points, &u, &cubic);
            if error <= params.tolerance {
                out.try_reserve(1)?;
                out.push(Spline::Cubic(cubic));
                return Ok(());
            }
        }
    }

    let split = worst.clamp(1, k - 2);
    let center = center_tangent(points, split);
    fit_recursive(&points[..=split], Some(start_tangent), Some(center), params, out)?;
    fit_recursive(&points[split..], Some(-center), Some(end_tangent), params, out)
}

/// Whether every point lies within `tolerance` of the segment joining the
/// run's ends.
fn within_chord(points: &[Point], tolerance: f64) -> bool {
    let (a, b) = (points[0], points[points.len() - 1]);
    points.iter().all(|&p| distance_to_segment(p, a, b) <= tolerance)
}

pub(crate) fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

/// Unit tangent at the head of `points`, averaged over up to `surround`
/// following points. Falls back to `fallback` when that cancels out.
fn estimate_tangent(mut points: impl Iterator<Item = Point>, surround: usize, fallback: Vec2) -> Vec2 {
    let Some(origin) = points.next() else {
        return unit_or(fallback, Vec2::new(1.0, 0.0));
    };
    let sum = points.take(surround.max(1)).fold(Vec2::ZERO, |acc, p| acc + (p - origin));
    unit_or(sum, unit_or(fallback, Vec2::new(1.0, 0.0)))
}

fn center_tangent(points: &[Point], split: usize) -> Vec2 {
    let across = points[split - 1] - points[split + 1];
    let along = points[split - 1] - points[split];
    unit_or(across, unit_or(along, Vec2::new(1.0, 0.0)))
}

fn unit_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let len = v.hypot();
    if len > f64::EPSILON { v / len } else { fallback }
}

/// Parameters proportional to cumulative chord length, in `[0, 1]`.
fn chord_length_parameters(points: &[Point]) -> Vec<f64> {
    let mut u = Vec::with_capacity(points.len());
    u.push(0.0);
    let mut total = 0.0;
    for pair in points.windows(2) {
        total += (pair[1] - pair[0]).hypot();
        u.push(total);
    }
    if total > 0.0 {
        u.iter_mut().for_each(|v| *v /= total);
    } else {
        let last = (points.len() - 1).max(1) as f64;
        u.iter_mut().enumerate().for_each(|(i, v)| *v = i as f64 / last);
    }
    u
}

fn bernstein(t: f64) -> [f64; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

/// Least-squares handle lengths along fixed end tangents (Schneider). Falls
/// back to a third of the chord (Wu–Barsky) when the system is degenerate or
/// gives a non-positive handle.
fn generate_cubic(points: &[Point], u: &[f64], t1: Vec2, t2: Vec2) -> CubicBez {
    let p0 = points[0];
    let p3 = points[points.len() - 1];
    let (mut c00, mut c01, mut c11, mut x0, mut x1) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (&p, &t) in points.iter().zip(u) {
        let b = bernstein(t);
        let a1 = t1 * b[1];
        let a2 = t2 * b[2];
        c00 += a1.dot(a1);
        c01 += a1.dot(a2);
        c11 += a2.dot(a2);
        let base = p0.to_vec2() * (b[0] + b[1]) + p3.to_vec2() * (b[2] + b[3]);
        let residual = p.to_vec2() - base;
        x0 += a1.dot(residual);
        x1 += a2.dot(residual);
    }

    let det = c00 * c11 - c01 * c01;
    let (alpha_l, alpha_r) = if det.abs() > 1e-12 {
        ((x0 * c11 - x1 * c01) / det, (c00 * x1 - c01 * x0) / det)
    } else {
        (0.0, 0.0)
    };

    let chord = (p3 - p0).hypot();
    let epsilon = 1e-6 * chord;
    if alpha_l <= epsilon || alpha_r <= epsilon {
        let handle = chord / 3.0;
        return CubicBez::new(p0, p0 + t1 * handle, p3 + t2 * handle, p3);
    }
    CubicBez::new(p0, p0 + t1 * alpha_l, p3 + t2 * alpha_r, p3)
}

/// Largest `|B(u_i) - P_i|` and the index where it occurs.
fn max_error(points: &[Point], u: &[f64], cubic: &CubicBez) -> (f64, usize) {
    points
        .iter()
        .zip(u)
        .enumerate()
        .map(|(i, (&p, &t))| ((cubic.eval(t) - p).hypot(), i))
        .fold((0.0, 0), |best, cur| if cur.0 > best.0 { cur } else { best })
}

/// One Newton step per parameter towards the nearest point on the curve.
fn reparameterize(points: &[Point], u: &mut [f64], cubic: &CubicBez) {
    let d1 = cubic.deriv();
    let d2 = d1.deriv();
    for (&p, t) in points.iter().zip(u.iter_mut()) {
        let diff = cubic.eval(*t) - p;
        let q1 = d1.eval(*t).to_vec2();
        let q2 = d2.eval(*t).to_vec2();
        let numerator = diff.dot(q1);
        let denominator = q1.dot(q1) + diff.dot(q2);
        if denominator.abs() > f64::EPSILON {
            *t = (*t - numerator / denominator).clamp(0.0, 1.0);
        }
    }
}
