use crate::shared::region::{FaceRegion, DEFAULT_IOU_THRESHOLD};

use super::face_model::RawFaceBox;

/// Boxes covering this share of the image or less are treated as noise.
pub const MIN_AREA_RATIO: f64 = 0.001;

/// Boxes covering this share of the image or more are implausible faces.
pub const MAX_AREA_RATIO: f64 = 0.5;

/// Post-processing applied to raw model output.
///
/// Order matters: relative-size filter, then clamping into integer pixel
/// regions, then overlap suppression.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionFilter {
    pub min_area_ratio: f64,
    pub max_area_ratio: f64,
    pub iou_threshold: f64,
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self {
            min_area_ratio: MIN_AREA_RATIO,
            max_area_ratio: MAX_AREA_RATIO,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }
}

impl DetectionFilter {
    pub fn apply(&self, raw: &[RawFaceBox], image_width: u32, image_height: u32) -> Vec<FaceRegion> {
        let image_area = image_width as f64 * image_height as f64;
        if image_area <= 0.0 {
            return Vec::new();
        }

        let regions: Vec<FaceRegion> = raw
            .iter()
            .filter(|b| self.plausible_size(b.area() / image_area))
            .filter_map(clamp_to_region)
            .collect();

        FaceRegion::suppress_overlaps(&regions, self.iou_threshold)
    }

    /// Open interval: both bounds are rejected.
    fn plausible_size(&self, ratio: f64) -> bool {
        ratio > self.min_area_ratio && ratio < self.max_area_ratio
    }
}

/// Clamp negative coordinates to zero and round to whole pixels.
///
/// The far edge stays where the model put it, so clamping shrinks the box
/// rather than shifting it. Boxes with nothing left are dropped.
fn clamp_to_region(b: &RawFaceBox) -> Option<FaceRegion> {
    let [x1, y1, x2, y2] = b.corners();
    let left = x1.max(0.0).round();
    let top = y1.max(0.0).round();
    let right = x2.round();
    let bottom = y2.round();
    if !(right > left && bottom > top) || !right.is_finite() || !bottom.is_finite() {
        return None;
    }
    Some(FaceRegion::new(
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn raw(x: f64, y: f64, w: f64, h: f64) -> RawFaceBox {
        RawFaceBox {
            x_min: x,
            y_min: y,
            width: w,
            height: h,
            score: 0.9,
        }
    }

    #[test]
    fn test_keeps_plausible_face() {
        let regions = DetectionFilter::default().apply(&[raw(100.0, 150.0, 200.0, 250.0)], 800, 600);
        assert_eq!(regions, vec![FaceRegion::new(100, 150, 200, 250)]);
    }

    #[rstest]
    // 1000x1000 image: 0.1% is 1000 px^2, 50% is 500_000 px^2
    #[case::tiny(raw(10.0, 10.0, 20.0, 20.0))]
    #[case::exactly_min(raw(10.0, 10.0, 25.0, 40.0))]
    #[case::exactly_max(raw(0.0, 0.0, 500.0, 1000.0))]
    #[case::huge(raw(0.0, 0.0, 900.0, 900.0))]
    fn test_area_filter_rejects(#[case] b: RawFaceBox) {
        assert!(DetectionFilter::default().apply(&[b], 1000, 1000).is_empty());
    }

    #[rstest]
    #[case::just_above_min(raw(10.0, 10.0, 33.0, 33.0))]
    #[case::just_below_max(raw(0.0, 0.0, 700.0, 700.0))]
    fn test_area_filter_accepts(#[case] b: RawFaceBox) {
        assert_eq!(DetectionFilter::default().apply(&[b], 1000, 1000).len(), 1);
    }

    #[test]
    fn test_negative_coordinates_clamped() {
        let regions = DetectionFilter::default().apply(&[raw(-20.0, -10.0, 120.0, 110.0)], 800, 600);
        assert_eq!(regions, vec![FaceRegion::new(0, 0, 100, 100)]);
    }

    #[test]
    fn test_box_entirely_left_of_image_dropped() {
        let regions = DetectionFilter::default().apply(&[raw(-200.0, 10.0, 150.0, 150.0)], 800, 600);
        assert!(regions.is_empty());
    }

    #[test]
    fn test_overlaps_suppressed_after_filtering() {
        let regions = DetectionFilter::default().apply(
            &[
                raw(0.0, 0.0, 100.0, 100.0),
                raw(10.0, 10.0, 100.0, 100.0),
                raw(400.0, 300.0, 80.0, 80.0),
            ],
            800,
            600,
        );
        assert_eq!(
            regions,
            vec![FaceRegion::new(0, 0, 100, 100), FaceRegion::new(400, 300, 80, 80)]
        );
    }

    #[test]
    fn test_empty_image_yields_nothing() {
        assert!(DetectionFilter::default()
            .apply(&[raw(0.0, 0.0, 1.0, 1.0)], 0, 0)
            .is_empty());
    }
}
