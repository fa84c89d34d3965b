use crate::shared::region::RoiRect;
use crate::shared::surface::CHANNELS;

/// Precompute a normalized 1D Gaussian kernel whose standard deviation is
/// `radius` pixels.
///
/// The kernel spans three sigmas on each side, so its length is
/// `6 * radius + 1`. A zero radius yields the identity kernel.
pub fn kernel_for_radius(radius: u32) -> Vec<f32> {
    if radius == 0 {
        return vec![1.0];
    }
    let sigma = radius as f64;
    let half = 3 * radius as i64;
    let weights: Vec<f64> = (-half..=half)
        .map(|i| {
            let x = i as f64;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|&w| (w / sum) as f32).collect()
}

/// Blur an RGBA buffer in place with a separable kernel, reusing `temp`.
///
/// Samples past the buffer edge are clamped to the nearest edge pixel, so
/// nothing outside `data` ever contributes.
pub fn separable_blur_rgba(
    data: &mut [u8],
    width: usize,
    height: usize,
    kernel: &[f32],
    temp: &mut Vec<f32>,
) {
    if kernel.len() <= 1 || width == 0 || height == 0 {
        return;
    }
    let half = (kernel.len() / 2) as isize;
    temp.resize(width * height * CHANNELS, 0.0);

    // Horizontal pass: data -> temp
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            let mut acc = [0.0f32; CHANNELS];
            for (k, &w) in kernel.iter().enumerate() {
                let sx = clamp_index(x as isize + k as isize - half, width);
                let base = (row + sx) * CHANNELS;
                for (c, slot) in acc.iter_mut().enumerate() {
                    *slot += data[base + c] as f32 * w;
                }
            }
            temp[(row + x) * CHANNELS..(row + x + 1) * CHANNELS].copy_from_slice(&acc);
        }
    }

    // Vertical pass: temp -> data
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; CHANNELS];
            for (k, &w) in kernel.iter().enumerate() {
                let sy = clamp_index(y as isize + k as isize - half, height);
                let base = (sy * width + x) * CHANNELS;
                for (c, slot) in acc.iter_mut().enumerate() {
                    *slot += temp[base + c] * w;
                }
            }
            let out = (y * width + x) * CHANNELS;
            for (c, v) in acc.iter().enumerate() {
                data[out + c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Copy a rectangle of an RGBA surface into a reusable buffer.
pub fn extract_roi(data: &[u8], surface_width: usize, rect: RoiRect, roi: &mut Vec<u8>) {
    let row_bytes = rect.w * CHANNELS;
    roi.resize(rect.h * row_bytes, 0);
    for row in 0..rect.h {
        let src = ((rect.y + row) * surface_width + rect.x) * CHANNELS;
        roi[row * row_bytes..(row + 1) * row_bytes].copy_from_slice(&data[src..src + row_bytes]);
    }
}

/// Write a processed rectangle back into the surface it came from.
pub fn write_roi_back(data: &mut [u8], roi: &[u8], surface_width: usize, rect: RoiRect) {
    let row_bytes = rect.w * CHANNELS;
    for row in 0..rect.h {
        let dst = ((rect.y + row) * surface_width + rect.x) * CHANNELS;
        data[dst..dst + row_bytes].copy_from_slice(&roi[row * row_bytes..(row + 1) * row_bytes]);
    }
}
