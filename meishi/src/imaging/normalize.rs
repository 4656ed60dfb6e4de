use image::imageops::FilterType;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::edges::canny;
use imageproc::geometry::min_area_rect;
use imageproc::hough::{detect_lines, LineDetectionOptions};
use imageproc::point::Point;

use crate::config::PreprocessConfig;

const CANNY_LOW_THRESHOLD: f32 = 50.0;
const CANNY_HIGH_THRESHOLD: f32 = 150.0;
const HOUGH_SUPPRESSION_RADIUS: u32 = 8;

/// Normalize a decoded card photo for recognition.
///
/// Applies the following transformations:
/// 1. Upscales so the shorter side meets the resolution floor (cubic filter)
/// 2. Estimates the skew angle and rotates about the center to correct it
/// 3. Equalizes luminance contrast with CLAHE, leaving chrominance untouched
///
/// Skew estimation is two-staged: detected near-horizontal lines first, a
/// min-area rectangle around the thresholded foreground as fallback. When
/// neither stage produces a trustworthy angle the rotation is skipped. The
/// function is total — any input produces an output image with the same
/// channel layout.
pub fn normalize(image: &RgbImage, config: &PreprocessConfig) -> RgbImage {
    if image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let mut working = upscale_to_floor(image, config.upscale_floor_px);

    if let Some(estimate) = estimate_skew(&working, config) {
        if let Some(angle) = effective_rotation(estimate, config) {
            working = rotate_about_center(&working, angle);
        }
    }

    equalize_luminance(&working, config)
}

/// Upscale uniformly so the shorter side equals `floor_px`.
///
/// Recognition accuracy degrades sharply once the shorter side drops below
/// the floor; larger images pass through untouched.
fn upscale_to_floor(image: &RgbImage, floor_px: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let shorter = width.min(height);
    if shorter >= floor_px {
        return image.clone();
    }

    let scale = floor_px as f32 / shorter as f32;
    let new_width = ((width as f32 * scale).round() as u32).max(1);
    let new_height = ((height as f32 * scale).round() as u32).max(1);
    image::imageops::resize(image, new_width, new_height, FilterType::CatmullRom)
}

fn estimate_skew(image: &RgbImage, config: &PreprocessConfig) -> Option<f32> {
    let gray = image::imageops::grayscale(image);
    line_based_skew(&gray, config).or_else(|| bounding_box_skew(&gray, config))
}

/// Skew from detected straight lines.
///
/// The Hough vote threshold is a quarter of the shorter dimension, so an
/// accepted line is supported by at least that many edge pixels — the
/// segment-length floor expressed in accumulator votes. Lines steeper than
/// the configured cutoff are discarded as non-text edges, and the median of
/// the survivors is only trusted once enough of them agree.
fn line_based_skew(gray: &GrayImage, config: &PreprocessConfig) -> Option<f32> {
    let shorter = gray.width().min(gray.height());
    if shorter < 4 {
        return None;
    }

    let edges = canny(gray, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
    let options = LineDetectionOptions {
        vote_threshold: (shorter / 4).max(1),
        suppression_radius: HOUGH_SUPPRESSION_RADIUS,
    };

    let mut angles: Vec<f32> = detect_lines(&edges, options)
        .iter()
        .filter_map(|line| {
            // A polar line stores the angle of its normal; the line itself
            // runs 90 degrees away from it.
            let from_horizontal = fold_to_quarter_turn(line.angle_in_degrees as f32 - 90.0);
            (from_horizontal.abs() <= config.max_line_angle_degrees).then_some(from_horizontal)
        })
        .collect();

    if angles.len() < config.min_line_count {
        return None;
    }

    angles.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(median_of_sorted(&angles))
}

/// Fallback skew from the min-area rectangle around the foreground.
///
/// Used when the photo has too few straight edges for the line stage, e.g.
/// dense kanji blocks with no long rules. Requires a minimum amount of
/// foreground before the fit is trusted.
fn bounding_box_skew(gray: &GrayImage, config: &PreprocessConfig) -> Option<f32> {
    let level = otsu_level(gray);

    let points: Vec<Point<i32>> = gray
        .enumerate_pixels()
        .filter(|(_, _, pixel)| pixel[0] < level)
        .map(|(x, y, _)| Point::new(x as i32, y as i32))
        .collect();

    if points.is_empty() || points.len() < config.min_foreground_pixels {
        return None;
    }

    let corners = min_area_rect(&points);
    let edge_a = edge_vector(corners[0], corners[1]);
    let edge_b = edge_vector(corners[1], corners[2]);

    let (dx, dy) = if squared_length(edge_a) >= squared_length(edge_b) {
        edge_a
    } else {
        edge_b
    };
    if dx == 0.0 && dy == 0.0 {
        return None;
    }

    Some(fold_to_quarter_turn(dy.atan2(dx).to_degrees()))
}

fn edge_vector(from: Point<i32>, to: Point<i32>) -> (f32, f32) {
    ((to.x - from.x) as f32, (to.y - from.y) as f32)
}

fn squared_length((dx, dy): (f32, f32)) -> f32 {
    dx * dx + dy * dy
}

/// Fold an angle into [-45°, 45°], treating rotations a quarter turn apart
/// as equivalent. Vertical strokes measure the same skew as horizontal ones.
fn fold_to_quarter_turn(angle_degrees: f32) -> f32 {
    let mut angle = angle_degrees.rem_euclid(180.0);
    if angle > 90.0 {
        angle -= 180.0;
    }
    if angle > 45.0 {
        angle -= 90.0;
    } else if angle < -45.0 {
        angle += 90.0;
    }
    angle
}

fn median_of_sorted(sorted: &[f32]) -> f32 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Decide whether an estimated skew is worth rotating for.
///
/// Estimates at or below the skip threshold are noise. Larger magnitudes are
/// clamped: a card photographed at a steep angle reads as measurement error,
/// not real rotation.
fn effective_rotation(estimate: f32, config: &PreprocessConfig) -> Option<f32> {
    if estimate.abs() <= config.min_rotation_degrees {
        return None;
    }
    Some(estimate.clamp(-config.max_rotation_degrees, config.max_rotation_degrees))
}

/// Rotate about the image center, sampling bicubically with edge-replicated
/// borders. Replication keeps the margins card-colored instead of introducing
/// black wedges the recognition engine reads as strokes.
fn rotate_about_center(image: &RgbImage, degrees: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;

    let mut rotated = RgbImage::new(width, height);
    for (x, y, pixel) in rotated.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let src_x = cx + dx * cos - dy * sin;
        let src_y = cy + dx * sin + dy * cos;
        *pixel = sample_bicubic_clamped(image, src_x, src_y);
    }
    rotated
}

/// Catmull-Rom cubic kernel; weights over a 4-sample window sum to one.
fn catmull_rom(t: f32) -> f32 {
    let t = t.abs();
    if t < 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t < 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

fn sample_bicubic_clamped(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = image.dimensions();
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let mut acc = [0.0f32; 3];
    for j in -1i64..=2 {
        let weight_y = catmull_rom(j as f32 - fy);
        if weight_y == 0.0 {
            continue;
        }
        let sample_y = (y0 as i64 + j).clamp(0, height as i64 - 1) as u32;
        for i in -1i64..=2 {
            let weight = catmull_rom(i as f32 - fx) * weight_y;
            if weight == 0.0 {
                continue;
            }
            let sample_x = (x0 as i64 + i).clamp(0, width as i64 - 1) as u32;
            let sample = image.get_pixel(sample_x, sample_y);
            for channel in 0..3 {
                acc[channel] += weight * sample[channel] as f32;
            }
        }
    }

    Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

/// Contrast-limited adaptive histogram equalization on the luminance channel.
///
/// Works in YCbCr so uneven lighting is flattened without shifting hue; a
/// global stretch would blow out highlights on glossy card stock.
fn equalize_luminance(image: &RgbImage, config: &PreprocessConfig) -> RgbImage {
    let grid = config.clahe_grid_size;
    if grid == 0 {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let mut luma = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        luma.put_pixel(x, y, image::Luma([luminance(pixel)]));
    }

    let lookup = TileLookup::build(&luma, grid, config.clahe_clip_limit);

    let mut equalized = RgbImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let (_, cb, cr) = rgb_to_ycbcr(pixel);
        let mapped = lookup.map(x, y, luma.get_pixel(x, y)[0]);
        equalized.put_pixel(x, y, ycbcr_to_rgb(mapped as f32, cb, cr));
    }
    equalized
}

fn luminance(pixel: &Rgb<u8>) -> u8 {
    let (y, _, _) = rgb_to_ycbcr(pixel);
    y.round().clamp(0.0, 255.0) as u8
}

fn rgb_to_ycbcr(pixel: &Rgb<u8>) -> (f32, f32, f32) {
    let r = pixel[0] as f32;
    let g = pixel[1] as f32;
    let b = pixel[2] as f32;
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
    let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    (y, cb, cr)
}

fn ycbcr_to_rgb(y: f32, cb: f32, cr: f32) -> Rgb<u8> {
    let r = y + 1.402 * (cr - 128.0);
    let g = y - 0.344_136 * (cb - 128.0) - 0.714_136 * (cr - 128.0);
    let b = y + 1.772 * (cb - 128.0);
    Rgb([
        r.round().clamp(0.0, 255.0) as u8,
        g.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8,
    ])
}

/// Per-tile equalization lookup tables with bilinear blending between tile
/// centers, so tile seams never show up as contrast steps.
struct TileLookup {
    tables: Vec<[u8; 256]>,
    grid: u32,
    tile_width: u32,
    tile_height: u32,
}

impl TileLookup {
    fn build(luma: &GrayImage, grid: u32, clip_limit: f32) -> Self {
        let (width, height) = luma.dimensions();
        let tile_width = width.div_ceil(grid).max(1);
        let tile_height = height.div_ceil(grid).max(1);

        let mut tables = Vec::with_capacity((grid * grid) as usize);
        for tile_y in 0..grid {
            for tile_x in 0..grid {
                let x_start = tile_x * tile_width;
                let y_start = tile_y * tile_height;
                let x_end = (x_start + tile_width).min(width);
                let y_end = (y_start + tile_height).min(height);
                tables.push(tile_table(luma, x_start, x_end, y_start, y_end, clip_limit));
            }
        }

        Self {
            tables,
            grid,
            tile_width,
            tile_height,
        }
    }

    fn map(&self, x: u32, y: u32, value: u8) -> u8 {
        // Position relative to tile centers; border pixels clamp to the
        // outermost tiles.
        let max_tile = (self.grid - 1) as f32;
        let gx = ((x as f32 + 0.5) / self.tile_width as f32 - 0.5).clamp(0.0, max_tile);
        let gy = ((y as f32 + 0.5) / self.tile_height as f32 - 0.5).clamp(0.0, max_tile);

        let x0 = gx.floor() as u32;
        let y0 = gy.floor() as u32;
        let x1 = (x0 + 1).min(self.grid - 1);
        let y1 = (y0 + 1).min(self.grid - 1);
        let fx = gx - gx.floor();
        let fy = gy - gy.floor();

        let top = self.table_value(x0, y0, value) * (1.0 - fx) + self.table_value(x1, y0, value) * fx;
        let bottom =
            self.table_value(x0, y1, value) * (1.0 - fx) + self.table_value(x1, y1, value) * fx;
        (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
    }

    fn table_value(&self, tile_x: u32, tile_y: u32, value: u8) -> f32 {
        self.tables[(tile_y * self.grid + tile_x) as usize][value as usize] as f32
    }
}

fn tile_table(
    luma: &GrayImage,
    x_start: u32,
    x_end: u32,
    y_start: u32,
    y_end: u32,
    clip_limit: f32,
) -> [u8; 256] {
    let mut histogram = [0u32; 256];
    let mut area = 0u32;
    for y in y_start..y_end {
        for x in x_start..x_end {
            histogram[luma.get_pixel(x, y)[0] as usize] += 1;
            area += 1;
        }
    }

    if area == 0 {
        let mut identity = [0u8; 256];
        for (value, slot) in identity.iter_mut().enumerate() {
            *slot = value as u8;
        }
        return identity;
    }

    // Clip the histogram and redistribute the excess evenly; this bounds how
    // much any single bin can amplify noise in flat regions.
    let clip = ((clip_limit * area as f32 / 256.0).max(1.0)) as u32;
    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }
    let bonus = excess / 256;
    for count in histogram.iter_mut() {
        *count += bonus;
    }

    let total: u64 = histogram.iter().map(|&c| c as u64).sum();
    let mut table = [0u8; 256];
    let mut cumulative = 0u64;
    for (value, slot) in table.iter_mut().enumerate() {
        cumulative += histogram[value] as u64;
        *slot = ((cumulative * 255) / total.max(1)) as u8;
    }
    table
}
