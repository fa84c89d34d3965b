//! Box geometry shared by the ONNX model decoders.

use crate::detection::domain::face_model::RawFaceBox;

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Greedy NMS: sort by score descending, suppress boxes overlapping a kept one.
pub fn nms(mut boxes: Vec<RawFaceBox>, iou_thresh: f64) -> Vec<RawFaceBox> {
    boxes.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawFaceBox> = Vec::new();
    for candidate in boxes {
        let corners = candidate.corners();
        if keep
            .iter()
            .all(|k| bbox_iou(&k.corners(), &corners) <= iou_thresh)
        {
            keep.push(candidate);
        }
    }
    keep
}
