use kurbo::{Point, Vec2};

/// Corner detection parameters, in degrees of interior angle.
#[derive(Debug, Clone, Copy)]
pub struct CornerParams {
    pub threshold: f64,
    pub always_threshold: f64,
    pub surround: usize,
}

/// Interior angle at `i`, from vectors summed over a `window` of neighbors
/// on each side. `None` when either side collapses to a point.
fn interior_angle(points: &[Point], i: usize, window: usize, closed: bool) -> Option<f64> {
    let n = points.len();
    let at = |k: isize| -> Point {
        if closed {
            points[k.rem_euclid(n as isize) as usize]
        } else {
            points[k as usize]
        }
    };
    let here = points[i];
    let mut incoming = Vec2::ZERO;
    let mut outgoing = Vec2::ZERO;
    for j in 1..=window as isize {
        incoming += here - at(i as isize - j);
        outgoing += at(i as isize + j) - here;
    }
    if incoming.hypot2() == 0.0 || outgoing.hypot2() == 0.0 {
        return None;
    }
    let turning = incoming.cross(outgoing).atan2(incoming.dot(outgoing)).abs();
    Some(180.0 - turning.to_degrees())
}

/// Indices of corner points along a chain, ascending.
///
/// A point is a candidate when its interior angle is below the threshold.
/// Candidates are accepted sharpest first (earlier index on ties) unless an
/// accepted corner lies within `w / 2` points, rounded down; points below the
/// always-threshold are accepted regardless. Open chains only test points with
/// a full window on both sides.
pub fn find_corners(points: &[Point], closed: bool, params: CornerParams) -> Vec<usize> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    let window = params.surround.min((n - 1) / 2).max(1);
    let range = if closed { 0..n } else { window..n - window };

    let mut candidates: Vec<(usize, f64)> = range
        .filter_map(|i| interior_angle(points, i, window, closed).map(|angle| (i, angle)))
        .filter(|&(_, angle)| angle < params.threshold || angle < params.always_threshold)
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let radius = window / 2;
    let distance = |a: usize, b: usize| {
        let d = a.abs_diff(b);
        if closed { d.min(n - d) } else { d }
    };

    let mut corners: Vec<usize> = Vec::new();
    for (i, angle) in candidates {
        let crowded = corners.iter().any(|&c| distance(c, i) <= radius);
        if angle < params.always_threshold || !crowded {
            corners.push(i);
        }
    }
    corners.sort_unstable();
    corners
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: CornerParams = CornerParams {
        threshold: 100.0,
        always_threshold: 60.0,
        surround: 4,
    };

    fn pts(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x as f64, y as f64)).collect()
    }

    /// Lattice outline of an `n`-pixel square at the origin, one vertex per step.
    fn square_outline(n: i32) -> Vec<Point> {
        let mut coords = Vec::new();
        coords.extend((0..n).map(|x| (x, 0)));
        coords.extend((0..n).map(|y| (n, y)));
        coords.extend((0..n).map(|x| (n - x, n)));
        coords.extend((0..n).map(|y| (0, n - y)));
        pts(&coords)
    }

    fn l_shape() -> Vec<Point> {
        let mut coords: Vec<_> = (0..=5).map(|x| (x, 0)).collect();
        coords.extend((1..=5).map(|y| (5, y)));
        pts(&coords)
    }

    #[test]
    fn square_has_four_corners() {
        for n in 1..8 {
            let corners = find_corners(&square_outline(n), true, DEFAULTS);
            let n = n as usize;
            assert_eq!(corners, vec![0, n, 2 * n, 3 * n]);
        }
    }

    #[test]
    fn straight_chain_has_none() {
        let line = pts(&(0..10).map(|x| (x, 3)).collect::<Vec<_>>());
        assert!(find_corners(&line, false, DEFAULTS).is_empty());
    }

    #[test]
    fn open_chain_corner_found_at_bend() {
        assert_eq!(find_corners(&l_shape(), false, DEFAULTS), vec![5]);
    }

    #[test]
    fn open_chain_ends_are_never_corners() {
        let corners = find_corners(&l_shape(), false, DEFAULTS);
        assert!(!corners.contains(&0));
        assert!(!corners.contains(&10));
    }

    #[test]
    fn always_threshold_overrides_low_threshold() {
        let strict = CornerParams {
            threshold: 10.0,
            always_threshold: 95.0,
            surround: 4,
        };
        assert_eq!(find_corners(&l_shape(), false, strict), vec![5]);

        let none = CornerParams {
            threshold: 10.0,
            always_threshold: 10.0,
            surround: 4,
        };
        assert!(find_corners(&l_shape(), false, none).is_empty());
    }

    /// Two rows joined by a one-pixel step at indices 5 and 6.
    fn step() -> Vec<Point> {
        let mut coords: Vec<_> = (0..=5).map(|x| (x, 0)).collect();
        coords.extend((5..=10).map(|x| (x, 1)));
        pts(&coords)
    }

    #[test]
    fn odd_surround_suppresses_within_half_window() {
        // w = 3: both step vertices measure 135 degrees and sit one apart,
        // inside the radius of 1, so only the earlier one survives.
        let wide = CornerParams {
            threshold: 140.0,
            always_threshold: 60.0,
            surround: 3,
        };
        assert_eq!(find_corners(&step(), false, wide), vec![5]);
    }

    #[test]
    fn single_point_window_keeps_adjacent_corners() {
        // w = 1 gives a radius of 0, the same resolution at which a
        // one-pixel square keeps all four of its corners.
        let narrow = CornerParams {
            surround: 1,
            ..DEFAULTS
        };
        assert_eq!(find_corners(&step(), false, narrow), vec![5, 6]);
    }

    #[test]
    fn short_chains_have_no_corners() {
        assert!(find_corners(&pts(&[(0, 0), (1, 0)]), true, DEFAULTS).is_empty());
    }
}
