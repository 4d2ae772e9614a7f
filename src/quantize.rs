//! Color reduction by median cut over the color histogram.

use std::collections::{BTreeMap, HashMap};

use crate::{Bitmap, Color, Diagnostics, VectorizeResult};

/// The colors present after quantization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn contains(&self, color: Color) -> bool {
        self.colors.contains(&color)
    }
}

/// A box of histogram entries; entries are `(color, pixel count)`.
#[derive(Debug, Clone)]
struct ColorBox {
    entries: Vec<(Color, u64)>,
}

impl ColorBox {
    fn population(&self) -> u64 {
        self.entries.iter().map(|&(_, n)| n).sum()
    }

    /// The widest channel and its range.
    fn widest_channel(&self) -> (usize, u8) {
        (0..3)
            .map(|channel| {
                let (lo, hi) = self.entries.iter().fold((u8::MAX, u8::MIN), |(lo, hi), (c, _)| {
                    let v = c.channel(channel);
                    (lo.min(v), hi.max(v))
                });
                (channel, hi.saturating_sub(lo))
            })
            .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best })
    }

    /// Split at the weighted median along the widest channel.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.entries
            .sort_by(|a, b| a.0.channel(channel).cmp(&b.0.channel(channel)).then(a.0.cmp(&b.0)));

        let half = self.population().div_ceil(2);
        let mut running = 0u64;
        let mut cut = self.entries.len() - 1;
        for (i, &(_, n)) in self.entries.iter().enumerate() {
            running += n;
            if running >= half {
                cut = i + 1;
                break;
            }
        }
        let cut = cut.clamp(1, self.entries.len() - 1);
        let upper = self.entries.split_off(cut);
        (self, ColorBox { entries: upper })
    }

    /// Population-weighted mean color.
    fn representative(&self) -> Color {
        let total = self.population().max(1);
        let mut sums = [0u64; 3];
        for &(c, n) in &self.entries {
            for (channel, sum) in sums.iter_mut().enumerate() {
                *sum += c.channel(channel) as u64 * n;
            }
        }
        let mean = |sum: u64| ((sum + total / 2) / total) as u8;
        Color::new(mean(sums[0]), mean(sums[1]), mean(sums[2]))
    }
}

/// Reduce the bitmap to at most `color_count` distinct colors, in place.
///
/// The optional `background` is excluded from clustering and keeps its exact
/// value; when it occurs in the image it takes one of the `color_count`
/// slots. Identical input always yields the identical palette. A bitmap that
/// already has few enough colors is left untouched. `color_count == 0` is a
/// no-op.
pub fn quantize(
    bitmap: &mut Bitmap,
    color_count: u32,
    background: Option<Color>,
    diagnostics: &mut Diagnostics,
) -> VectorizeResult<Palette> {
    let background = background.map(|c| bitmap.normalize_color(c));

    let mut histogram: BTreeMap<Color, u64> = BTreeMap::new();
    for index in 0..bitmap.pixel_count() {
        *histogram.entry(bitmap.color_at_index(index)).or_default() += 1;
    }

    if color_count == 0 || histogram.len() <= color_count as usize {
        return Ok(Palette {
            colors: histogram.into_keys().collect(),
        });
    }

    let background_present = background.is_some_and(|bg| histogram.contains_key(&bg));
    if let Some(bg) = background {
        histogram.remove(&bg);
    }
    let slots = color_count as usize - usize::from(background_present);

    let mapping: HashMap<Color, Color> = if slots == 0 {
        // Only the background fits; every other color collapses into it.
        diagnostics.warning(format!(
            "color count {color_count} leaves no room beside the background; foreground merged into background"
        ));
        let bg = background.unwrap_or(Color::WHITE);
        histogram.keys().map(|&c| (c, bg)).collect()
    } else {
        let boxes = median_cut(histogram.into_iter().collect(), slots);
        let mut mapping = HashMap::new();
        mapping.try_reserve(boxes.iter().map(|b| b.entries.len()).sum())?;
        for color_box in &boxes {
            let representative = color_box.representative();
            for &(c, _) in &color_box.entries {
                mapping.insert(c, representative);
            }
        }
        mapping
    };

    for index in 0..bitmap.pixel_count() {
        let color = bitmap.color_at_index(index);
        if let Some(&mapped) = mapping.get(&color) {
            if mapped != color {
                bitmap.set_color_at_index(index, mapped);
            }
        }
    }

    let mut colors: Vec<Color> = mapping.values().copied().collect();
    if background_present {
        colors.extend(background);
    }
    colors.sort();
    colors.dedup();
    tracing::debug!(requested = color_count, produced = colors.len(), "quantize finished");
    Ok(Palette { colors })
}

/// Partition histogram entries into at most `target` boxes.
fn median_cut(entries: Vec<(Color, u64)>, target: usize) -> Vec<ColorBox> {
    let mut boxes = vec![ColorBox { entries }];
    while boxes.len() < target {
        // Widest splittable box first; ties go to the larger population, then
        // to the earlier box.
        let pick = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.entries.len() > 1)
            .map(|(i, b)| (i, b.widest_channel().1, b.population()))
            .fold(None::<(usize, u8, u64)>, |best, cur| match best {
                Some(b) if (b.1, b.2) >= (cur.1, cur.2) => Some(b),
                _ => Some(cur),
            });
        let Some((index, _, _)) = pick else {
            break;
        };
        let (lower, upper) = boxes.swap_remove(index).split();
        boxes.push(lower);
        boxes.push(upper);
    }
    boxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn distinct(bitmap: &Bitmap) -> BTreeSet<Color> {
        (0..bitmap.pixel_count()).map(|i| bitmap.color_at_index(i)).collect()
    }

    fn gradient(w: u32, h: u32) -> Bitmap {
        let mut bitmap = Bitmap::new(w, h, 3).unwrap();
        for y in 0..h {
            for x in 0..w {
                bitmap.set_color(x, y, Color::new((x * 17) as u8, (y * 29) as u8, ((x + y) * 7) as u8));
            }
        }
        bitmap
    }

    mod unit {
        use super::*;

        #[test]
        fn fewer_colors_than_target_is_identity() {
            let mut bitmap = Bitmap::filled(3, 3, Color::WHITE).unwrap();
            bitmap.set_color(1, 1, Color::BLACK);
            let before = bitmap.clone();
            let palette = quantize(&mut bitmap, 2, None, &mut Diagnostics::new()).unwrap();
            assert_eq!(bitmap, before);
            assert_eq!(palette.colors(), &[Color::BLACK, Color::WHITE]);
        }

        #[test]
        fn zero_count_is_noop() {
            let mut bitmap = gradient(5, 5);
            let before = bitmap.clone();
            quantize(&mut bitmap, 0, None, &mut Diagnostics::new()).unwrap();
            assert_eq!(bitmap, before);
        }

        #[test]
        fn reduces_to_requested_count() {
            let mut bitmap = gradient(8, 8);
            let palette = quantize(&mut bitmap, 4, None, &mut Diagnostics::new()).unwrap();
            let colors = distinct(&bitmap);
            assert!(colors.len() <= 4);
            for c in colors {
                assert!(palette.contains(c));
            }
        }

        #[test]
        fn background_kept_exactly() {
            let bg = Color::new(1, 2, 3);
            let mut bitmap = gradient(8, 8);
            bitmap.set_color(0, 0, bg);
            bitmap.set_color(7, 7, bg);
            quantize(&mut bitmap, 3, Some(bg), &mut Diagnostics::new()).unwrap();

            assert_eq!(bitmap.color_at(0, 0), bg);
            assert_eq!(bitmap.color_at(7, 7), bg);
            assert!(distinct(&bitmap).len() <= 3);
        }

        #[test]
        fn single_slot_with_background_collapses_and_warns() {
            let mut bitmap = gradient(4, 4);
            bitmap.set_color(0, 0, Color::WHITE);
            let mut diagnostics = Diagnostics::new();
            quantize(&mut bitmap, 1, Some(Color::WHITE), &mut diagnostics).unwrap();
            assert_eq!(distinct(&bitmap).into_iter().collect::<Vec<_>>(), vec![Color::WHITE]);
            assert_eq!(diagnostics.warnings().count(), 1);
        }

        #[test]
        fn deterministic_palette() {
            let mut a = gradient(9, 7);
            let mut b = gradient(9, 7);
            let pa = quantize(&mut a, 5, None, &mut Diagnostics::new()).unwrap();
            let pb = quantize(&mut b, 5, None, &mut Diagnostics::new()).unwrap();
            assert_eq!(pa, pb);
            assert_eq!(a, b);
        }

        #[test]
        fn gray_stays_gray() {
            let mut bitmap = Bitmap::new(16, 1, 1).unwrap();
            for x in 0..16 {
                bitmap.set_color(x, 0, Color::gray((x * 16) as u8));
            }
            quantize(&mut bitmap, 3, None, &mut Diagnostics::new()).unwrap();
            assert!(distinct(&bitmap).len() <= 3);
            assert_eq!(bitmap.planes(), 1);
        }

        #[test]
        fn split_separates_two_clusters() {
            let entries = vec![
                (Color::new(0, 0, 0), 10),
                (Color::new(2, 0, 0), 10),
                (Color::new(250, 0, 0), 10),
                (Color::new(252, 0, 0), 10),
            ];
            let boxes = median_cut(entries, 2);
            assert_eq!(boxes.len(), 2);
            let mut reps: Vec<Color> = boxes.iter().map(ColorBox::representative).collect();
            reps.sort();
            assert_eq!(reps, vec![Color::new(1, 0, 0), Color::new(251, 0, 0)]);
        }
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The output never has more than N distinct colors.
            #[test]
            fn bounded_by_target(
                pixels in proptest::collection::vec(any::<(u8, u8, u8)>(), 1..120),
                n in 1u32..12
            ) {
                let w = pixels.len() as u32;
                let raw: Vec<u8> = pixels.iter().flat_map(|&(r, g, b)| [r, g, b]).collect();
                let mut bitmap = Bitmap::from_raw(w, 1, 3, raw).unwrap();
                quantize(&mut bitmap, n, None, &mut Diagnostics::new()).unwrap();
                prop_assert!(distinct(&bitmap).len() <= n as usize);
            }

            /// With a background, the bound includes it and it is preserved.
            #[test]
            fn bounded_with_background(
                pixels in proptest::collection::vec(any::<(u8, u8, u8)>(), 1..80),
                n in 1u32..8
            ) {
                let w = pixels.len() as u32 + 1;
                let mut raw = vec![255u8, 255, 255];
                raw.extend(pixels.iter().flat_map(|&(r, g, b)| [r, g, b]));
                let mut bitmap = Bitmap::from_raw(w, 1, 3, raw).unwrap();
                quantize(&mut bitmap, n, Some(Color::WHITE), &mut Diagnostics::new()).unwrap();
                prop_assert!(distinct(&bitmap).len() <= n as usize);
                prop_assert_eq!(bitmap.color_at(0, 0), Color::WHITE);
            }

            /// Input that already fits is returned pixel-identical.
            #[test]
            fn identity_when_within_bound(
                cells in proptest::collection::vec(0usize..4, 1..100),
                n in 4u32..10
            ) {
                const PALETTE: [Color; 4] = [
                    Color::WHITE,
                    Color::BLACK,
                    Color::new(10, 200, 30),
                    Color::new(90, 90, 250),
                ];
                let w = cells.len() as u32;
                let mut bitmap = Bitmap::new(w, 1, 3).unwrap();
                for (x, &c) in cells.iter().enumerate() {
                    bitmap.set_color(x as u32, 0, PALETTE[c]);
                }
                let before = bitmap.clone();
                quantize(&mut bitmap, n, None, &mut Diagnostics::new()).unwrap();
                prop_assert_eq!(bitmap, before);
            }
        }
    }
}
