use std::io;

use kurbo::{BezPath, Rect};

use crate::output::{VectorWriter, coord};
use crate::spline::{Spline, SplineList};
use crate::{Color, SplineListArray, VectorizeResult};

/// Writes an SVG document with one `<path>` per run of same-colored lists.
///
/// Closed lists are filled with the nonzero rule, so holes traced with the
/// opposite winding stay empty. Open lists and centerline output are stroked.
/// The `dpi` argument is ignored; coordinates stay in pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgWriter;

#[derive(Clone, Copy, PartialEq)]
struct Style {
    color: Color,
    stroke: bool,
}

impl Style {
    fn of(list: &SplineList, centerline: bool) -> Self {
        Self {
            color: list.color,
            stroke: centerline || list.open,
        }
    }

    fn attribute(self) -> String {
        if self.stroke {
            format!("stroke:#{}; fill:none;", self.color)
        } else {
            format!("fill:#{}; stroke:none;", self.color)
        }
    }
}

impl VectorWriter for SvgWriter {
    fn write(
        &self,
        out: &mut dyn io::Write,
        name: &str,
        bounds: Rect,
        _dpi: u32,
        splines: &SplineListArray,
    ) -> VectorizeResult<()> {
        writeln!(out, "<?xml version=\"1.0\" standalone=\"yes\"?>")?;
        writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"{x} {y} {w} {h}\">",
            x = coord(bounds.x0),
            y = coord(bounds.y0),
            w = coord(bounds.width()),
            h = coord(bounds.height()),
        )?;
        if !name.is_empty() {
            writeln!(out, "<title>{}</title>", escape(name))?;
        }

        let mut current: Option<Style> = None;
        for list in splines.iter().filter(|list| !list.is_empty()) {
            let style = Style::of(list, splines.centerline);
            if current != Some(style) {
                if current.is_some() {
                    writeln!(out, "\"/>")?;
                }
                write!(out, "<path style=\"{}\" d=\"", style.attribute())?;
                current = Some(style);
            } else {
                write!(out, " ")?;
            }
            write!(out, "{}", to_bez_path(list, style.stroke).to_svg())?;
        }
        if current.is_some() {
            writeln!(out, "\"/>")?;
        }

        writeln!(out, "</svg>")?;
        Ok(())
    }
}

/// One subpath per list, closed unless the list is drawn as a stroke.
fn to_bez_path(list: &SplineList, open: bool) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(list.splines[0].start());
    for spline in list.iter() {
        match spline {
            Spline::Line(line) => path.line_to(line.p1),
            Spline::Cubic(c) => path.curve_to(c.p1, c.p2, c.p3),
        }
    }
    if !open {
        path.close_path();
    }
    path
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::write_splines;
    use kurbo::{CubicBez, Line, PathEl};

    fn list(color: Color, open: bool, splines: Vec<Spline>) -> SplineList {
        SplineList { splines, color, open }
    }

    fn square(color: Color) -> SplineList {
        let corners = [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        let splines = (0..4)
            .map(|i| Spline::Line(Line::new(corners[i], corners[(i + 1) % 4])))
            .collect();
        list(color, false, splines)
    }

    fn render(array: &SplineListArray, name: Option<&str>) -> String {
        let mut out = Vec::new();
        write_splines(array, &mut out, name, 72, &SvgWriter).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// The `d` attribute of every `<path>`, parsed back into kurbo paths.
    fn path_data(svg: &str) -> Vec<BezPath> {
        svg.split(" d=\"")
            .skip(1)
            .map(|rest| BezPath::from_svg(&rest[..rest.find('"').unwrap()]).unwrap())
            .collect()
    }

    fn square_path() -> BezPath {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((2.0, 0.0));
        path.line_to((2.0, 2.0));
        path.line_to((0.0, 2.0));
        path.line_to((0.0, 0.0));
        path.close_path();
        path
    }

    #[test]
    fn closed_list_is_filled_path() {
        let mut array = SplineListArray::new(4, 4);
        array.lists.push(square(Color::BLACK));
        let svg = render(&array, None);
        assert!(svg.contains("width=\"4\" height=\"4\""));
        assert!(svg.contains("<path style=\"fill:#000000; stroke:none;\" d=\""));
        assert_eq!(path_data(&svg), vec![square_path()]);
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(!svg.contains("<title>"));
    }

    #[test]
    fn same_color_lists_share_a_path() {
        let mut array = SplineListArray::new(4, 4);
        array.lists.push(square(Color::BLACK));
        array.lists.push(square(Color::BLACK));
        array.lists.push(square(Color::new(255, 0, 0)));
        let svg = render(&array, None);
        assert!(svg.contains("fill:#ff0000"));

        let paths = path_data(&svg);
        assert_eq!(paths.len(), 2);
        let subpaths = |path: &BezPath| path.elements().iter().filter(|el| matches!(el, PathEl::MoveTo(_))).count();
        assert_eq!(subpaths(&paths[0]), 2);
        assert_eq!(subpaths(&paths[1]), 1);
    }

    #[test]
    fn open_list_is_stroked_without_close() {
        let cubic = CubicBez::new((0.0, 0.0), (1.0, 2.0), (3.0, 2.0), (4.0, 0.0));
        let mut array = SplineListArray::new(5, 5);
        array.lists.push(list(Color::BLACK, true, vec![Spline::Cubic(cubic)]));
        let svg = render(&array, Some("a<b"));
        assert!(svg.contains("stroke:#000000; fill:none;"));
        assert!(svg.contains("<title>a&lt;b</title>"));

        let mut expected = BezPath::new();
        expected.move_to(cubic.p0);
        expected.curve_to(cubic.p1, cubic.p2, cubic.p3);
        assert_eq!(path_data(&svg), vec![expected]);
    }

    #[test]
    fn empty_array_has_no_paths() {
        let svg = render(&SplineListArray::new(0, 0), None);
        assert!(!svg.contains("<path"));
    }
}
