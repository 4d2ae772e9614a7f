use crate::control::{Cancellation, Flow, Progress};
use crate::trace::{Coord, PixelOutline, PixelOutlineList};
use crate::{Bitmap, Color, VectorizeResult};

/// Neighbor offsets, indexed by direction. Opposite directions are four apart.
const OFFSETS: [(i64, i64); 8] = [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];

fn opposite(direction: usize) -> usize {
    (direction + 4) % 8
}

/// The skeleton graph: a per-pixel bitmask of m-adjacent neighbors and the
/// edges already walked.
struct Skeleton {
    width: i64,
    height: i64,
    adjacency: Vec<u8>,
    walked: Vec<u8>,
}

impl Skeleton {
    fn build(bitmap: &Bitmap, background: Color) -> VectorizeResult<Self> {
        let count = bitmap.pixel_count();
        let (width, height) = (i64::from(bitmap.width()), i64::from(bitmap.height()));
        let mut colors = Vec::new();
        colors.try_reserve_exact(count)?;
        colors.extend((0..count).map(|i| {
            let c = bitmap.color_at_index(i);
            (c != background).then_some(c)
        }));
        let at = |x: i64, y: i64| -> Option<Color> {
            if x < 0 || y < 0 || x >= width || y >= height {
                None
            } else {
                colors[(y * width + x) as usize]
            }
        };

        let mut adjacency = Vec::new();
        adjacency.try_reserve_exact(count)?;
        for index in 0..count {
            let (x, y) = ((index as i64) % width, (index as i64) / width);
            let mut mask = 0u8;
            if let Some(color) = colors[index] {
                for (direction, &(dx, dy)) in OFFSETS.iter().enumerate() {
                    if at(x + dx, y + dy) != Some(color) {
                        continue;
                    }
                    // A diagonal only counts when no orthogonal path joins the pair.
                    let diagonal = dx != 0 && dy != 0;
                    if diagonal && (at(x + dx, y) == Some(color) || at(x, y + dy) == Some(color)) {
                        continue;
                    }
                    mask |= 1 << direction;
                }
            }
            adjacency.push(mask);
        }

        let mut walked = Vec::new();
        walked.try_reserve_exact(count)?;
        walked.resize(count, 0u8);
        Ok(Self {
            width,
            height,
            adjacency,
            walked,
        })
    }

    fn degree(&self, index: usize) -> u32 {
        self.adjacency[index].count_ones()
    }

    fn step(&self, index: usize, direction: usize) -> usize {
        let (dx, dy) = OFFSETS[direction];
        let (x, y) = ((index as i64) % self.width + dx, (index as i64) / self.width + dy);
        (y * self.width + x) as usize
    }

    fn coord(&self, index: usize) -> Coord {
        let width = self.width as usize;
        Coord::new((index % width) as u32, (index / width) as u32)
    }

    fn unwalked(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        (0..8).filter(move |&d| self.adjacency[index] & !self.walked[index] & (1 << d) != 0)
    }

    fn mark(&mut self, index: usize, direction: usize) {
        self.walked[index] |= 1 << direction;
        let next = self.step(index, direction);
        self.walked[next] |= 1 << opposite(direction);
    }

    /// Walk from `start` along `direction` through degree-2 pixels. Stops at
    /// the next node, or on arriving back at `start`.
    fn walk(&mut self, start: usize, mut direction: usize) -> VectorizeResult<(Vec<Coord>, bool)> {
        let mut chain = Vec::new();
        chain.try_reserve(2)?;
        chain.push(self.coord(start));
        let mut current = start;
        loop {
            self.mark(current, direction);
            let next = self.step(current, direction);
            if next == start && self.degree(start) == 2 {
                return Ok((chain, true));
            }
            chain.try_reserve(1)?;
            chain.push(self.coord(next));
            if self.degree(next) != 2 {
                return Ok((chain, false));
            }
            match self.unwalked(next).next() {
                Some(d) => {
                    current = next;
                    direction = d;
                }
                None => return Ok((chain, false)),
            }
        }
    }
}

/// Extract pixel chains from a one-pixel-wide skeleton.
///
/// Adjacency is m-adjacency among pixels of the same non-background color.
/// Chains run between nodes (pixels whose degree is not 2) and are open; a
/// junction pixel ends every branch that meets it and appears as an endpoint
/// of each. An isolated pixel is a one-point open chain. What remains after
/// that are pure cycles, returned as closed chains.
///
/// Points are pixel indices, not pixel centers.
pub fn find_centerline_pixels(
    bitmap: &Bitmap,
    background: Color,
    progress: &dyn Progress,
    cancel: &dyn Cancellation,
) -> VectorizeResult<Flow<PixelOutlineList>> {
    let mut list = PixelOutlineList::new(true);
    if bitmap.is_empty() {
        progress.notify(1.0);
        return Ok(Flow::Finished(list));
    }
    let background = bitmap.normalize_color(background);
    let mut skeleton = Skeleton::build(bitmap, background)?;
    let rows = skeleton.height as usize;
    let width = skeleton.width as usize;

    // Open chains from every node.
    for y in 0..rows {
        if cancel.is_cancelled() {
            return Ok(Flow::Cancelled(list));
        }
        progress.notify(0.5 * y as f32 / rows as f32);
        for index in y * width..(y + 1) * width {
            let color = bitmap.color_at_index(index);
            if color == background || skeleton.degree(index) == 2 {
                continue;
            }
            if skeleton.degree(index) == 0 {
                list.push(PixelOutline {
                    points: vec![skeleton.coord(index)],
                    open: true,
                    color,
                })?;
                continue;
            }
            loop {
                let Some(direction) = skeleton.unwalked(index).next() else {
                    break;
                };
                let (points, _) = skeleton.walk(index, direction)?;
                list.push(PixelOutline {
                    points,
                    open: true,
                    color,
                })?;
            }
        }
    }

    // Whatever is left forms closed loops.
    for y in 0..rows {
        if cancel.is_cancelled() {
            return Ok(Flow::Cancelled(list));
        }
        progress.notify(0.5 + 0.5 * y as f32 / rows as f32);
        for index in y * width..(y + 1) * width {
            if skeleton.degree(index) != 2 {
                continue;
            }
            let Some(direction) = skeleton.unwalked(index).next() else {
                continue;
            };
            let (points, closed) = skeleton.walk(index, direction)?;
            list.push(PixelOutline {
                points,
                open: !closed,
                color: bitmap.color_at_index(index),
            })?;
        }
    }

    progress.notify(1.0);
    tracing::debug!(chains = list.len(), "centerline tracing finished");
    Ok(Flow::Finished(list))
}
