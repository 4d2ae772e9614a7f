//! Fitted output: lines and cubic Beziers grouped into colored lists.

use kurbo::{CubicBez, Line, ParamCurve, Point};

use crate::Color;

/// Polynomial degree of a spline segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degree {
    Linear,
    Cubic,
}

/// One fitted segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spline {
    Line(Line),
    Cubic(CubicBez),
}

impl Spline {
    pub fn start(&self) -> Point {
        match self {
            Spline::Line(line) => line.p0,
            Spline::Cubic(cubic) => cubic.p0,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            Spline::Line(line) => line.p1,
            Spline::Cubic(cubic) => cubic.p3,
        }
    }

    pub fn degree(&self) -> Degree {
        match self {
            Spline::Line(_) => Degree::Linear,
            Spline::Cubic(_) => Degree::Cubic,
        }
    }

    pub fn eval(&self, t: f64) -> Point {
        match self {
            Spline::Line(line) => line.eval(t),
            Spline::Cubic(cubic) => cubic.eval(t),
        }
    }

    /// Promote to a cubic with the same shape.
    pub fn to_cubic(&self) -> CubicBez {
        match *self {
            Spline::Line(line) => CubicBez::new(
                line.p0,
                line.p0.lerp(line.p1, 1.0 / 3.0),
                line.p0.lerp(line.p1, 2.0 / 3.0),
                line.p1,
            ),
            Spline::Cubic(cubic) => cubic,
        }
    }
}

/// The fitted segments of one pixel chain.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineList {
    pub splines: Vec<Spline>,
    pub color: Color,
    pub open: bool,
}

impl SplineList {
    pub fn len(&self) -> usize {
        self.splines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Spline> {
        self.splines.iter()
    }
}

/// Everything fitted from one bitmap. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplineListArray {
    pub lists: Vec<SplineList>,
    pub width: u32,
    pub height: u32,
    pub centerline: bool,
    pub background_color: Option<Color>,
}

impl SplineListArray {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SplineList> {
        self.lists.iter()
    }

    /// Total number of segments over all lists.
    pub fn spline_count(&self) -> usize {
        self.lists.iter().map(SplineList::len).sum()
    }

    /// The full image rectangle in output coordinates.
    pub fn bounds(&self) -> kurbo::Rect {
        kurbo::Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

impl<'a> IntoIterator for &'a SplineListArray {
    type Item = &'a SplineList;
    type IntoIter = std::slice::Iter<'a, SplineList>;

    fn into_iter(self) -> Self::IntoIter {
        self.lists.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_degree() {
        let line = Spline::Line(Line::new((0.0, 0.0), (3.0, 0.0)));
        assert_eq!(line.start(), Point::new(0.0, 0.0));
        assert_eq!(line.end(), Point::new(3.0, 0.0));
        assert_eq!(line.degree(), Degree::Linear);

        let cubic = Spline::Cubic(CubicBez::new((0.0, 0.0), (1.0, 1.0), (2.0, 1.0), (3.0, 0.0)));
        assert_eq!(cubic.end(), Point::new(3.0, 0.0));
        assert_eq!(cubic.degree(), Degree::Cubic);
    }

    #[test]
    fn promoted_line_keeps_shape() {
        let line = Spline::Line(Line::new((0.0, 0.0), (3.0, 6.0)));
        let cubic = line.to_cubic();
        assert!((cubic.eval(0.5) - line.eval(0.5)).hypot() < 1e-9);
        assert!((cubic.p1 - Point::new(1.0, 2.0)).hypot() < 1e-9);
    }

    #[test]
    fn array_counts_segments() {
        let mut array = SplineListArray::new(4, 2);
        assert!(array.is_empty());
        array.lists.push(SplineList {
            splines: vec![Spline::Line(Line::new((0.0, 0.0), (1.0, 0.0))); 3],
            color: Color::BLACK,
            open: true,
        });
        assert_eq!(array.spline_count(), 3);
        assert_eq!(array.bounds(), kurbo::Rect::new(0.0, 0.0, 4.0, 2.0));
    }
}
