use std::f64::consts::FRAC_PI_2;
use std::io;

use kurbo::{ParamCurve, Point, Rect};

use crate::output::VectorWriter;
use crate::spline::Spline;
use crate::{SplineListArray, VectorizeResult};

/// Sphere radius of the Web-Mercator projection, in meters.
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Sample count per cubic segment.
const CUBIC_SAMPLES: u32 = 7;

/// First element id; ids count down from here.
const FIRST_ID: i64 = -10_000;

/// Writes OpenStreetMap XML, projecting pixel coordinates through a
/// Web-Mercator extent to WGS84 longitude and latitude.
///
/// Pixel `(0, 0)` maps to the upper-left corner `(min_x, max_y)`; one pixel
/// spans `resolution` meters. Each list becomes a chain of nodes, a way over
/// those nodes and a relation holding the way.
#[derive(Debug, Clone, PartialEq)]
pub struct OsmWriter {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub resolution: f64,
    pub tag_name: String,
}

impl Default for OsmWriter {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
            resolution: 1.0,
            tag_name: "water".to_string(),
        }
    }
}

impl OsmWriter {
    pub fn new(extent: Rect, resolution: f64) -> Self {
        Self {
            min_x: extent.x0,
            min_y: extent.y0,
            max_x: extent.x1,
            max_y: extent.y1,
            resolution,
            ..Self::default()
        }
    }

    pub fn with_tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = tag_name.into();
        self
    }

    /// Project a pixel position to `(lon, lat)` in degrees.
    pub fn project(&self, pixel: Point) -> (f64, f64) {
        mercator_to_lon_lat(
            self.min_x + pixel.x * self.resolution,
            self.max_y - pixel.y * self.resolution,
        )
    }
}

/// Inverse spherical Mercator, meters to degrees.
fn mercator_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
    (lon, lat)
}

impl VectorWriter for OsmWriter {
    fn write(
        &self,
        out: &mut dyn io::Write,
        _name: &str,
        _bounds: Rect,
        _dpi: u32,
        splines: &SplineListArray,
    ) -> VectorizeResult<()> {
        let (min_lon, max_lat) = mercator_to_lon_lat(self.min_x, self.max_y);
        let (max_lon, min_lat) = mercator_to_lon_lat(self.max_x, self.min_y);

        writeln!(out, "<?xml version=\"1.0\" encoding='utf-8' ?>")?;
        writeln!(out, "<osm generator=\"splinetrace\" version=\"0.6\">")?;
        write!(
            out,
            "<bounds maxlat=\"{max_lat:.6}\" maxlon=\"{max_lon:.6}\" minlat=\"{min_lat:.6}\" minlon=\"{min_lon:.6}\" />"
        )?;

        let mut id = FIRST_ID;
        for list in splines.iter().filter(|list| !list.is_empty()) {
            let first_node = id;
            self.write_node(out, &mut id, list.splines[0].start())?;
            for spline in list.iter() {
                match spline {
                    Spline::Line(line) => self.write_node(out, &mut id, line.p1)?,
                    Spline::Cubic(cubic) => {
                        for step in 1..=CUBIC_SAMPLES {
                            let t = f64::from(step) / f64::from(CUBIC_SAMPLES);
                            self.write_node(out, &mut id, cubic.eval(t))?;
                        }
                    }
                }
            }
            let last_node = id + 1;

            let way = id;
            id -= 1;
            write!(out, "\n\t<way id='{way}' visible='true'>")?;
            for node in (last_node..=first_node).rev() {
                write!(out, "\n\t\t<nd ref='{node}'/>")?;
            }
            write!(out, "\n\t\t<tag k='name' v='{}' />", self.tag_name)?;
            writeln!(out, "\n\t</way>")?;

            let relation = id;
            id -= 1;
            writeln!(out, "\n\t<relation id='{relation}' visible='true' changeset='0'>")?;
            writeln!(out, "\t\t<member type='way' ref='{way}' />")?;
            writeln!(out, "\t</relation>")?;
        }

        writeln!(out, "</osm>")?;
        Ok(())
    }
}

impl OsmWriter {
    fn write_node(&self, out: &mut dyn io::Write, id: &mut i64, pixel: Point) -> io::Result<()> {
        let (lon, lat) = self.project(pixel);
        write!(out, "\n\t<node id='{id}' lat='{lat:.6}' lon='{lon:.6}' visible='true' />")?;
        *id -= 1;
        Ok(())
    }
}
