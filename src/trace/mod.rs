//! Pixel-chain extraction: region outlines or skeleton centerlines.

pub mod centerline;
pub mod outline;

pub use centerline::find_centerline_pixels;
pub use outline::find_outline_pixels;

use crate::Color;

/// An integer point: a lattice vertex (outline mode) or a pixel index
/// (centerline mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Coord {
    pub x: u32,
    pub y: u32,
}

impl Coord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance; 1 for 8-adjacent points.
    pub fn chebyshev(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    pub fn to_point(self) -> kurbo::Point {
        kurbo::Point::new(f64::from(self.x), f64::from(self.y))
    }
}

/// One chain of pixel coordinates with a uniform color.
///
/// Closed chains do not repeat their first point; the last point is adjacent
/// to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelOutline {
    pub points: Vec<Coord>,
    pub open: bool,
    pub color: Color,
}

impl PixelOutline {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area in y-down image coordinates. Outer region boundaries are
    /// positive, holes negative.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y)
            })
            .sum();
        twice as f64 / 2.0
    }
}

/// All chains found in one bitmap, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelOutlineList {
    pub outlines: Vec<PixelOutline>,
    pub centerline: bool,
}

impl PixelOutlineList {
    pub fn new(centerline: bool) -> Self {
        Self {
            outlines: Vec::new(),
            centerline,
        }
    }

    pub fn len(&self) -> usize {
        self.outlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outlines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PixelOutline> {
        self.outlines.iter()
    }

    pub(crate) fn push(&mut self, outline: PixelOutline) -> crate::VectorizeResult<()> {
        self.outlines.try_reserve(1)?;
        self.outlines.push(outline);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PixelOutlineList {
    type Item = &'a PixelOutline;
    type IntoIter = std::slice::Iter<'a, PixelOutline>;

    fn into_iter(self) -> Self::IntoIter {
        self.outlines.iter()
    }
}
