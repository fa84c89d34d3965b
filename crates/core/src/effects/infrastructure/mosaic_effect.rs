use crate::effects::domain::effect_error::EffectError;
use crate::effects::domain::effect_spec::EffectStrength;
use crate::effects::domain::region_effect::{ensure_drawable, RegionEffect};
use crate::shared::region::{FaceRegion, RoiRect};
use crate::shared::surface::{PixelSurface, CHANNELS};

/// Mosaic cell edge length in pixels for strengths 1 through 5.
pub const MOSAIC_BLOCK_SIZES: [u32; 5] = [4, 8, 12, 16, 20];

pub fn mosaic_block_size(strength: EffectStrength) -> u32 {
    MOSAIC_BLOCK_SIZES[strength.index()]
}

/// Pixelation: every cell of a region grid is flattened to its mean color.
///
/// The grid is anchored at the clipped region's top-left corner, so cells on
/// the right and bottom boundary may be smaller than the block size.
#[derive(Default)]
pub struct MosaicEffect;

impl MosaicEffect {
    pub fn new() -> Self {
        Self
    }
}

impl RegionEffect for MosaicEffect {
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

        let block = mosaic_block_size(strength) as usize;
        let sw = surface.width();
        let sh = surface.height();
        for region in regions {
            if let Some(rect) = region.clip(sw, sh) {
                pixelate(surface.data_mut(), sw as usize, rect, block);
            }
        }
        Ok(())
    }
}

fn pixelate(data: &mut [u8], surface_width: usize, rect: RoiRect, block: usize) {
    let mut cy = rect.y;
    while cy < rect.y + rect.h {
        let ch = block.min(rect.y + rect.h - cy);
        let mut cx = rect.x;
        while cx < rect.x + rect.w {
            let cw = block.min(rect.x + rect.w - cx);
            let cell = RoiRect {
                x: cx,
                y: cy,
                w: cw,
                h: ch,
            };
            let mean = cell_mean(data, surface_width, cell);
            fill_cell(data, surface_width, cell, mean);
            cx += block;
        }
        cy += block;
    }
}

/// Per-channel arithmetic mean of a cell, rounded to nearest.
fn cell_mean(data: &[u8], surface_width: usize, cell: RoiRect) -> [u8; CHANNELS] {
    let mut sums = [0u64; CHANNELS];
    for y in cell.y..cell.y + cell.h {
        let row = (y * surface_width + cell.x) * CHANNELS;
        for px in data[row..row + cell.w * CHANNELS].chunks_exact(CHANNELS) {
            for (sum, &v) in sums.iter_mut().zip(px) {
                *sum += v as u64;
            }
        }
    }
    let count = (cell.w * cell.h) as u64;
    let mut mean = [0u8; CHANNELS];
    for (m, sum) in mean.iter_mut().zip(sums) {
        *m = ((sum + count / 2) / count) as u8;
    }
    mean
}

fn fill_cell(data: &mut [u8], surface_width: usize, cell: RoiRect, rgba: [u8; CHANNELS]) {
    for y in cell.y..cell.y + cell.h {
        let row = (y * surface_width + cell.x) * CHANNELS;
        for px in data[row..row + cell.w * CHANNELS].chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&rgba);
        }
    }
}
