use std::collections::VecDeque;

use crate::control::{Cancellation, Flow, Progress};
use crate::trace::{Coord, PixelOutline, PixelOutlineList};
use crate::{Bitmap, Color, VectorizeResult};

/// A step direction on the pixel-corner lattice (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Heading {
    dx: i64,
    dy: i64,
}

impl Heading {
    const EAST: Heading = Heading { dx: 1, dy: 0 };

    /// The side the region stays on.
    fn right(self) -> Heading {
        Heading {
            dx: -self.dy,
            dy: self.dx,
        }
    }

    fn reverse(self) -> Heading {
        Heading {
            dx: -self.dx,
            dy: -self.dy,
        }
    }
}

/// Region membership by label, one label per 4-connected same-color region.
struct Regions {
    width: i64,
    height: i64,
    labels: Vec<u32>,
}

impl Regions {
    fn contains(&self, x: i64, y: i64, label: u32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height && self.labels[(y * self.width + x) as usize] == label
    }

    /// Whether the pixel in the quadrant `(sx, sy)` around lattice vertex
    /// `(vx, vy)` belongs to the region.
    fn quadrant(&self, vx: i64, vy: i64, sx: i64, sy: i64, label: u32) -> bool {
        self.contains(vx + (sx - 1) / 2, vy + (sy - 1) / 2, label)
    }
}

/// Trace the boundary of every 4-connected single-color region.
///
/// Regions are discovered in raster order. Each region yields its outer
/// boundary first (positive [`PixelOutline::signed_area`]) followed by any
/// holes (negative area). Points are pixel-corner lattice vertices, one per
/// unit step, and every outline is closed. Pixels of `background` are not
/// traced; with `None` every color is.
pub fn find_outline_pixels(
    bitmap: &Bitmap,
    background: Option<Color>,
    progress: &dyn Progress,
    cancel: &dyn Cancellation,
) -> VectorizeResult<Flow<PixelOutlineList>> {
    let mut list = PixelOutlineList::new(false);
    if bitmap.is_empty() {
        progress.notify(1.0);
        return Ok(Flow::Finished(list));
    }
    let background = background.map(|c| bitmap.normalize_color(c));
    let (width, height) = bitmap.dimensions();
    let count = bitmap.pixel_count();

    let mut labels = Vec::new();
    labels.try_reserve_exact(count)?;
    labels.resize(count, 0u32);
    let mut regions = Regions {
        width: i64::from(width),
        height: i64::from(height),
        labels,
    };
    let mut top_marked = Vec::new();
    top_marked.try_reserve_exact(count)?;
    top_marked.resize(count, false);

    let mut next_label = 0u32;
    let mut queue = VecDeque::new();
    let mut members = Vec::new();
    for y in 0..height {
        if cancel.is_cancelled() {
            return Ok(Flow::Cancelled(list));
        }
        progress.notify(y as f32 / height as f32);

        for x in 0..width {
            let seed = bitmap.index(x, y);
            let color = bitmap.color_at_index(seed);
            if regions.labels[seed] != 0 || Some(color) == background {
                continue;
            }
            next_label += 1;
            flood_region(bitmap, &mut regions, seed, next_label, &mut queue, &mut members)?;
            members.sort_unstable();

            let mut first = true;
            for &index in &members {
                let (px, py) = ((index as i64) % regions.width, (index as i64) / regions.width);
                if top_marked[index] || regions.contains(px, py - 1, next_label) {
                    continue;
                }
                if !first && cancel.is_cancelled() {
                    return Ok(Flow::Cancelled(list));
                }
                first = false;
                let points = walk_contour(&regions, &mut top_marked, px, py, next_label)?;
                list.push(PixelOutline {
                    points,
                    open: false,
                    color,
                })?;
            }
        }
    }

    progress.notify(1.0);
    tracing::debug!(outlines = list.len(), regions = next_label, "outline tracing finished");
    Ok(Flow::Finished(list))
}

/// Label the 4-connected same-color region around `seed`, leaving its
/// indices in `members`.
fn flood_region(
    bitmap: &Bitmap,
    regions: &mut Regions,
    seed: usize,
    label: u32,
    queue: &mut VecDeque<usize>,
    members: &mut Vec<usize>,
) -> VectorizeResult<()> {
    let color = bitmap.color_at_index(seed);
    let width = regions.width as usize;
    let height = regions.height as usize;
    members.clear();
    queue.clear();
    regions.labels[seed] = label;
    queue.push_back(seed);

    while let Some(index) = queue.pop_front() {
        members.try_reserve(1)?;
        members.push(index);
        let (x, y) = (index % width, index / width);
        let neighbors = [
            (x > 0).then(|| index - 1),
            (x + 1 < width).then(|| index + 1),
            (y > 0).then(|| index - width),
            (y + 1 < height).then(|| index + width),
        ];
        for next in neighbors.into_iter().flatten() {
            if regions.labels[next] == 0 && bitmap.color_at_index(next) == color {
                regions.labels[next] = label;
                queue.try_reserve(1)?;
                queue.push_back(next);
            }
        }
    }
    Ok(())
}

/// Follow one crack-edge contour starting east along the top edge of pixel
/// `(px, py)`, keeping the region on the right.
fn walk_contour(
    regions: &Regions,
    top_marked: &mut [bool],
    px: i64,
    py: i64,
    label: u32,
) -> VectorizeResult<Vec<Coord>> {
    let start = (px, py);
    let mut vertex = start;
    let mut heading = Heading::EAST;
    let mut points = Vec::new();

    loop {
        points.try_reserve(1)?;
        points.push(Coord::new(vertex.0 as u32, vertex.1 as u32));
        if heading == Heading::EAST {
            top_marked[(vertex.1 * regions.width + vertex.0) as usize] = true;
        }
        vertex = (vertex.0 + heading.dx, vertex.1 + heading.dy);

        let right = heading.right();
        let ahead_right = regions.quadrant(vertex.0, vertex.1, heading.dx + right.dx, heading.dy + right.dy, label);
        let ahead_left = regions.quadrant(vertex.0, vertex.1, heading.dx - right.dx, heading.dy - right.dy, label);
        heading = if !ahead_right {
            right
        } else if !ahead_left {
            heading
        } else {
            right.reverse()
        };

        if vertex == start && heading == Heading::EAST {
            return Ok(points);
        }
    }
}
