use std::sync::Mutex;

use crate::effects::domain::effect_error::EffectError;
use crate::effects::domain::effect_spec::EffectStrength;
use crate::effects::domain::region_effect::{ensure_drawable, RegionEffect};
use crate::shared::region::FaceRegion;
use crate::shared::surface::PixelSurface;

use super::gaussian;

/// Blur radius in pixels for strengths 1 through 5.
pub const BLUR_RADII: [u32; 5] = [2, 4, 6, 8, 10];

pub fn blur_radius(strength: EffectStrength) -> u32 {
    BLUR_RADII[strength.index()]
}

/// Rectangular Gaussian blur restricted to each face region.
///
/// Each region is clipped to the surface, blurred using only its own pixels
/// (edges clamp), and composited back inside the rectangle.
pub struct BlurEffect {
    kernels: Vec<Vec<f32>>,
    scratch: Mutex<Scratch>,
}

#[derive(Default)]
struct Scratch {
    roi: Vec<u8>,
    temp: Vec<f32>,
}

impl BlurEffect {
    pub fn new() -> Self {
        Self {
            kernels: BLUR_RADII
                .iter()
                .map(|&r| gaussian::kernel_for_radius(r))
                .collect(),
            scratch: Mutex::new(Scratch::default()),
        }
    }
}

impl Default for BlurEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionEffect for BlurEffect {
    fn apply(
        &self,
        surface: &mut PixelSurface,
        regions: &[FaceRegion],
        strength: EffectStrength,
    ) -> Result<(), EffectError> {
        if regions.is_empty() {
            return Ok(());
        }
        ensure_drawable(surface)?;

        let sw = surface.width();
        let sh = surface.height();
        let kernel = &self.kernels[strength.index()];
        let mut scratch = self
            .scratch
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Scratch { roi, temp } = &mut *scratch;
        let data = surface.data_mut();

        for region in regions {
            let Some(rect) = region.clip(sw, sh) else {
                continue;
            };
            gaussian::extract_roi(data, sw as usize, rect, roi);
            gaussian::separable_blur_rgba(roi, rect.w, rect.h, kernel, temp);
            gaussian::write_roi_back(data, roi, sw as usize, rect);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::surface::CHANNELS;

    fn strength(v: u8) -> EffectStrength {
        EffectStrength::new(v).unwrap()
    }

    fn idx(width: u32, x: u32, y: u32) -> usize {
        ((y * width + x) as usize) * CHANNELS
    }

    /// Deterministic high-contrast pattern so any blur leaves a trace.
    fn checkerboard(width: u32, height: u32) -> PixelSurface {
        let mut surface = PixelSurface::blank(width, height);
        for y in 0..height {
            for x in 0..width {
                let v = if (x / 3 + y / 3) % 2 == 0 { 255 } else { 0 };
                surface.set_pixel(x, y, [v, 255 - v, (x % 256) as u8, 255]);
            }
        }
        surface
    }

    #[test]
    fn test_radii_strictly_increasing() {
        let radii: Vec<u32> = EffectStrength::all().map(blur_radius).collect();
        assert_eq!(radii, vec![2, 4, 6, 8, 10]);
        assert!(radii.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_no_regions_surface_unchanged() {
        let mut surface = checkerboard(40, 40);
        let original = surface.clone();
        BlurEffect::new()
            .apply(&mut surface, &[], strength(5))
            .unwrap();
        assert_eq!(surface, original);
    }

    #[test]
    fn test_no_regions_on_undrawable_surface_is_noop() {
        let mut surface = PixelSurface::blank(0, 0);
        assert!(BlurEffect::new().apply(&mut surface, &[], strength(1)).is_ok());
    }

    #[test]
    fn test_undrawable_surface_fails() {
        let mut surface = PixelSurface::blank(0, 0);
        let err = BlurEffect::new()
            .apply(&mut surface, &[FaceRegion::new(0, 0, 5, 5)], strength(1))
            .unwrap_err();
        assert_eq!(
            err,
            EffectError::TargetUnavailable {
                width: 0,
                height: 0
            }
        );
    }

    #[test]
    fn test_blur_modifies_region_pixels() {
        let mut surface = checkerboard(60, 60);
        let original = surface.clone();
        BlurEffect::new()
            .apply(&mut surface, &[FaceRegion::new(10, 10, 30, 30)], strength(2))
            .unwrap();
        assert_ne!(surface.pixel(20, 20), original.pixel(20, 20));
    }

    #[test]
    fn test_end_to_end_pixels_outside_regions_byte_identical() {
        let (w, h) = (800u32, 600u32);
        let mut surface = checkerboard(w, h);
        let original = surface.clone();
        let regions = [
            FaceRegion::new(100, 150, 200, 250),
            FaceRegion::new(400, 200, 180, 220),
        ];

        BlurEffect::new()
            .apply(&mut surface, &regions, strength(3))
            .unwrap();

        let inside = |x: u32, y: u32| {
            regions.iter().any(|r| {
                x >= r.x && (x as u64) < r.right() && y >= r.y && (y as u64) < r.bottom()
            })
        };
        let mut changed_inside = false;
        for y in 0..h {
            for x in 0..w {
                let i = idx(w, x, y);
                let same = surface.data()[i..i + CHANNELS] == original.data()[i..i + CHANNELS];
                if inside(x, y) {
                    changed_inside |= !same;
                } else {
                    assert!(same, "pixel ({x}, {y}) outside regions changed");
                }
            }
        }
        assert!(changed_inside);
    }

    #[test]
    fn test_region_overhanging_edge_is_clipped() {
        let mut surface = checkerboard(50, 50);
        BlurEffect::new()
            .apply(&mut surface, &[FaceRegion::new(40, 40, 100, 100)], strength(4))
            .unwrap();
        assert_eq!(surface.width(), 50);
        assert_eq!(surface.data().len(), 50 * 50 * CHANNELS);
    }

    #[test]
    fn test_region_fully_outside_is_skipped() {
        let mut surface = checkerboard(50, 50);
        let original = surface.clone();
        BlurEffect::new()
            .apply(&mut surface, &[FaceRegion::new(60, 60, 10, 10)], strength(4))
            .unwrap();
        assert_eq!(surface, original);
    }

    #[test]
    fn test_stronger_blur_smooths_more() {
        let stripes = |w: u32, h: u32| {
            let mut surface = PixelSurface::blank(w, h);
            for y in 0..h {
                for x in 0..w {
                    let v = if (x / 3) % 2 == 0 { 255 } else { 0 };
                    surface.set_pixel(x, y, [v, v, v, 255]);
                }
            }
            surface
        };
        let region = [FaceRegion::new(0, 0, 60, 60)];
        let mut weak = stripes(60, 60);
        let mut strong = stripes(60, 60);
        let effect = BlurEffect::new();
        effect.apply(&mut weak, &region, strength(1)).unwrap();
        effect.apply(&mut strong, &region, strength(5)).unwrap();

        // Measure away from the clamped edges.
        let spread = |s: &PixelSurface| {
            let reds: Vec<i32> = (20..40).map(|x| s.pixel(x, 30)[0] as i32).collect();
            reds.iter().max().unwrap() - reds.iter().min().unwrap()
        };
        assert!(spread(&strong) < spread(&weak));
    }
}
