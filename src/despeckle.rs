use image::{Rgb, RgbImage, imageops};
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::{Bitmap, Color, Diagnostics, VectorizeResult};

/// Color distance, per unit of tightness, within which a speck counts as
/// near-background.
const NEAR_BACKGROUND_RADIUS: f32 = 16.0;

/// Remove connected single-color regions smaller than `2^level` pixels by
/// repainting them with `background`.
///
/// Regions are 4-connected runs of identical color; background pixels are
/// never labelled. A region whose color lies within
/// `NEAR_BACKGROUND_RADIUS * tightness` of the background uses the larger
/// threshold `2^level * (1 + tightness)`.
///
/// Returns the number of repainted pixels. The bitmap dimensions never change
/// and running twice with the same parameters is the same as running once.
pub fn despeckle(
    bitmap: &mut Bitmap,
    level: u32,
    tightness: f32,
    background: Color,
    diagnostics: &mut Diagnostics,
) -> VectorizeResult<usize> {
    if level == 0 || bitmap.is_empty() {
        return Ok(0);
    }

    let background = bitmap.normalize_color(background);
    let labels = label_regions(bitmap, background)?;

    let component_count = labels.iter().copied().max().unwrap_or(0) as usize;
    let mut sizes = Vec::new();
    sizes.try_reserve_exact(component_count + 1)?;
    sizes.resize(component_count + 1, 0usize);
    let mut colors = vec![None::<Color>; component_count + 1];
    for (index, &label) in labels.iter().enumerate() {
        let label = label as usize;
        sizes[label] += 1;
        if colors[label].is_none() {
            colors[label] = Some(bitmap.color_at_index(index));
        }
    }

    let base = 1usize << level;
    let near_radius = NEAR_BACKGROUND_RADIUS * tightness;
    let near_threshold = (base as f32 * (1.0 + tightness)).round() as usize;
    let remove: Vec<bool> = sizes
        .iter()
        .zip(&colors)
        .enumerate()
        .map(|(label, (&size, color))| {
            if label == 0 {
                return false;
            }
            let Some(color) = color else {
                return false;
            };
            let distance = (color.distance_squared(background) as f32).sqrt();
            let threshold = if tightness > 0.0 && distance <= near_radius {
                near_threshold
            } else {
                base
            };
            size < threshold
        })
        .collect();

    let mut repainted = 0usize;
    for (index, &label) in labels.iter().enumerate() {
        if remove[label as usize] {
            bitmap.set_color_at_index(index, background);
            repainted += 1;
        }
    }

    let removed_regions = remove.iter().filter(|&&r| r).count();
    if removed_regions > 0 {
        diagnostics.info(format!(
            "despeckle removed {removed_regions} regions ({repainted} pixels) below {base} pixels"
        ));
    }
    tracing::debug!(level, tightness, removed_regions, repainted, "despeckle finished");
    Ok(repainted)
}

/// Label 4-connected regions of identical color, background excluded.
///
/// The image is labelled inside a one-pixel background border so the label
/// count always stays below the labelled pixel count, even when no pixel of
/// the bitmap itself is background.
fn label_regions(bitmap: &Bitmap, background: Color) -> VectorizeResult<Vec<u32>> {
    let (width, height) = bitmap.dimensions();
    let mut padded = RgbImage::from_pixel(width + 2, height + 2, Rgb::from(background));
    imageops::replace(&mut padded, &bitmap.to_rgb_image(), 1, 1);
    let padded = connected_components(&padded, Connectivity::Four, Rgb::from(background));

    let mut labels = Vec::new();
    labels.try_reserve_exact(bitmap.pixel_count())?;
    for y in 0..height {
        for x in 0..width {
            labels.push(padded.get_pixel(x + 1, y + 1)[0]);
        }
    }
    Ok(labels)
}
