use serde::{Deserialize, Serialize};

/// Boxes whose IoU exceeds this are treated as the same face.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.3;

/// Axis-aligned face bounding box in source-image pixel coordinates.
///
/// Width and height are always positive for regions produced by the
/// detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A region already clipped to a surface, in `usize` for buffer indexing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiRect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl FaceRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Intersection-over-union, 0.0 for disjoint or degenerate boxes.
    pub fn iou(&self, other: &FaceRegion) -> f64 {
        let ix1 = self.x.max(other.x) as u64;
        let iy1 = self.y.max(other.y) as u64;
        let ix2 = self.right().min(other.right());
        let iy2 = self.bottom().min(other.bottom());

        let inter = ix2.saturating_sub(ix1) as f64 * iy2.saturating_sub(iy1) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let union = self.area() as f64 + other.area() as f64 - inter;
        inter / union
    }

    /// Clip to `[0, width) x [0, height)`. `None` if nothing is left.
    pub fn clip(&self, width: u32, height: u32) -> Option<RoiRect> {
        let x2 = self.right().min(width as u64);
        let y2 = self.bottom().min(height as u64);
        let x1 = self.x as u64;
        let y1 = self.y as u64;
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some(RoiRect {
            x: x1 as usize,
            y: y1 as usize,
            w: (x2 - x1) as usize,
            h: (y2 - y1) as usize,
        })
    }

    /// Collapse overlapping detections to one box per cluster.
    ///
    /// Candidates are visited in index order. Each unconsumed candidate seeds
    /// a cluster and consumes every later candidate whose IoU with it exceeds
    /// `iou_threshold`. The cluster keeps its largest box; on equal areas the
    /// earliest one wins.
    pub fn suppress_overlaps(regions: &[FaceRegion], iou_threshold: f64) -> Vec<FaceRegion> {
        if regions.len() <= 1 {
            return regions.to_vec();
        }
        let mut consumed = vec![false; regions.len()];
        let mut kept = Vec::with_capacity(regions.len());

        for i in 0..regions.len() {
            if consumed[i] {
                continue;
            }
            consumed[i] = true;
            let mut best = i;
            for j in (i + 1)..regions.len() {
                if consumed[j] || regions[i].iou(&regions[j]) <= iou_threshold {
                    continue;
                }
                consumed[j] = true;
                if regions[j].area() > regions[best].area() {
                    best = j;
                }
            }
            kept.push(regions[best]);
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn region(x: u32, y: u32, w: u32, h: u32) -> FaceRegion {
        FaceRegion::new(x, y, w, h)
    }

    // ── IoU ──────────────────────────────────────────────────────────

    #[test]
    fn test_iou_identical_regions() {
        let a = region(10, 10, 100, 100);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = region(0, 0, 50, 50);
        let b = region(100, 100, 50, 50);
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // intersection 50*100 = 5000, union 15000
        let a = region(0, 0, 100, 100);
        let b = region(50, 0, 100, 100);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[test]
    fn test_iou_contained() {
        let a = region(0, 0, 100, 100);
        let b = region(25, 25, 50, 50);
        assert_relative_eq!(a.iou(&b), 2500.0 / 10000.0);
    }

    #[test]
    fn test_iou_touching_edges() {
        let a = region(0, 0, 50, 50);
        let b = region(50, 0, 50, 50);
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[rstest]
    #[case(region(0, 0, 100, 100), region(50, 0, 100, 100))]
    #[case(region(0, 0, 10, 40), region(5, 5, 100, 7))]
    #[case(region(3, 9, 21, 17), region(0, 0, 12, 12))]
    fn test_iou_is_symmetric(#[case] a: FaceRegion, #[case] b: FaceRegion) {
        assert_relative_eq!(a.iou(&b), b.iou(&a));
    }

    #[rstest]
    #[case::zero_width(region(0, 0, 0, 100), region(0, 0, 50, 50))]
    #[case::zero_height(region(0, 0, 100, 0), region(0, 0, 50, 50))]
    fn test_iou_degenerate(#[case] a: FaceRegion, #[case] b: FaceRegion) {
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    // ── Clipping ─────────────────────────────────────────────────────

    #[test]
    fn test_clip_inside_is_unchanged() {
        let roi = region(10, 20, 30, 40).clip(100, 100).unwrap();
        assert_eq!(roi, RoiRect { x: 10, y: 20, w: 30, h: 40 });
    }

    #[test]
    fn test_clip_overhanging_edges() {
        let roi = region(80, 90, 50, 50).clip(100, 100).unwrap();
        assert_eq!(roi, RoiRect { x: 80, y: 90, w: 20, h: 10 });
    }

    #[test]
    fn test_clip_fully_outside_is_none() {
        assert!(region(200, 0, 10, 10).clip(100, 100).is_none());
        assert!(region(0, 100, 10, 10).clip(100, 100).is_none());
    }

    // ── Suppression ──────────────────────────────────────────────────

    #[test]
    fn test_suppress_empty() {
        assert!(FaceRegion::suppress_overlaps(&[], DEFAULT_IOU_THRESHOLD).is_empty());
    }

    #[test]
    fn test_suppress_high_overlap_keeps_first_on_equal_area() {
        let regions = vec![region(0, 0, 100, 100), region(10, 10, 100, 100)];
        let result = FaceRegion::suppress_overlaps(&regions, DEFAULT_IOU_THRESHOLD);
        assert_eq!(result, vec![regions[0]]);
    }

    #[test]
    fn test_suppress_high_overlap_keeps_larger() {
        let regions = vec![region(0, 0, 100, 100), region(0, 0, 110, 110)];
        let result = FaceRegion::suppress_overlaps(&regions, DEFAULT_IOU_THRESHOLD);
        assert_eq!(result, vec![regions[1]]);
    }

    #[test]
    fn test_suppress_keeps_non_overlapping() {
        let regions = vec![region(0, 0, 50, 50), region(200, 200, 50, 50)];
        let result = FaceRegion::suppress_overlaps(&regions, DEFAULT_IOU_THRESHOLD);
        assert_eq!(result, regions);
    }

    #[test]
    fn test_suppress_iou_exactly_at_threshold_is_kept() {
        // Contained box with IoU 0.25 stays separate at threshold 0.25.
        let regions = vec![region(0, 0, 100, 100), region(25, 25, 50, 50)];
        let result = FaceRegion::suppress_overlaps(&regions, 0.25);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_suppress_one_representative_per_cluster() {
        let regions = vec![
            region(0, 0, 100, 100),
            region(300, 300, 60, 60),
            region(5, 5, 100, 100),
            region(302, 302, 70, 70),
        ];
        let result = FaceRegion::suppress_overlaps(&regions, DEFAULT_IOU_THRESHOLD);
        assert_eq!(result, vec![regions[0], regions[3]]);
    }

    #[test]
    fn test_default_threshold() {
        assert_relative_eq!(DEFAULT_IOU_THRESHOLD, 0.3);
    }
}
