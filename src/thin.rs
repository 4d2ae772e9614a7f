//! Skeletonization of filled regions (Zhang–Suen with sequential confirmation).

use std::collections::BTreeSet;

use crate::{Bitmap, Color, Diagnostics, VectorizeResult};

/// A binary mask of one color with out-of-bounds reads as unset.
struct Mask {
    width: i64,
    height: i64,
    bits: Vec<bool>,
}

impl Mask {
    fn get(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }

    /// Neighbors P2..P9: N, NE, E, SE, S, SW, W, NW.
    fn ring(&self, x: i64, y: i64) -> [bool; 8] {
        [
            self.get(x, y - 1),
            self.get(x + 1, y - 1),
            self.get(x + 1, y),
            self.get(x + 1, y + 1),
            self.get(x, y + 1),
            self.get(x - 1, y + 1),
            self.get(x - 1, y),
            self.get(x - 1, y - 1),
        ]
    }

    /// Whether the pixel may be peeled in the given sub-iteration.
    fn removable(&self, x: i64, y: i64, first_pass: bool) -> bool {
        let p = self.ring(x, y);
        let count = p.iter().filter(|&&b| b).count();
        if !(2..=6).contains(&count) {
            return false;
        }
        let transitions = (0..8).filter(|&i| !p[i] && p[(i + 1) % 8]).count();
        if transitions != 1 {
            return false;
        }
        let [n, _, e, _, s, _, w, _] = p;
        if first_pass {
            !(n && e && s) && !(e && s && w)
        } else {
            !(n && e && w) && !(n && s && w)
        }
    }
}

/// Thin every non-background color of the bitmap to a one-pixel skeleton.
///
/// Each color is thinned independently; peeled pixels take the background
/// color. Candidates are collected per sub-iteration and then re-checked one
/// by one against the partially updated mask, so a deletion never separates
/// the remaining neighbors of a pixel. In practice this keeps every 8-connected
/// region connected and keeps 2-pixel-thick blocks from vanishing.
pub fn thin(bitmap: &mut Bitmap, background: Color, diagnostics: &mut Diagnostics) -> VectorizeResult<()> {
    if bitmap.is_empty() {
        return Ok(());
    }
    let background = bitmap.normalize_color(background);
    let colors: BTreeSet<Color> = (0..bitmap.pixel_count())
        .map(|i| bitmap.color_at_index(i))
        .filter(|&c| c != background)
        .collect();

    let mut peeled = 0usize;
    for color in colors {
        let mut bits = Vec::new();
        bits.try_reserve_exact(bitmap.pixel_count())?;
        bits.extend((0..bitmap.pixel_count()).map(|i| bitmap.color_at_index(i) == color));
        let mut mask = Mask {
            width: bitmap.width() as i64,
            height: bitmap.height() as i64,
            bits,
        };
        for index in peel(&mut mask) {
            bitmap.set_color_at_index(index, background);
            peeled += 1;
        }
    }

    if peeled == 0 {
        diagnostics.info("thinning found nothing to peel");
    }
    tracing::debug!(peeled, "thinning finished");
    Ok(())
}

/// Peel the mask until stable; returns the removed linear indices.
fn peel(mask: &mut Mask) -> Vec<usize> {
    let mut removed = Vec::new();
    let mut candidates = Vec::new();
    loop {
        let mut changed = false;
        for first_pass in [true, false] {
            candidates.clear();
            for y in 0..mask.height {
                for x in 0..mask.width {
                    if mask.get(x, y) && mask.removable(x, y, first_pass) {
                        candidates.push((x, y));
                    }
                }
            }
            for &(x, y) in &candidates {
                if mask.removable(x, y, first_pass) {
                    let index = (y * mask.width + x) as usize;
                    mask.bits[index] = false;
                    removed.push(index);
                    changed = true;
                }
            }
        }
        if !changed {
            return removed;
        }
    }
}
