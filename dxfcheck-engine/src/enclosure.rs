use serde::Serialize;

use crate::layer_index::LayerIndex;
use crate::normalize::{NormalizedPoint, Normalizer};
use crate::polygon::{Region, Ring};

/// 文字标签及其归一化插入点，用于把空间编号映射到所在区域。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledPoint {
    pub label: String,
    pub point: NormalizedPoint,
}

/// 首尾点相等（在 `tolerance` 范围内）即视为闭合；至少需要两个点。
///
/// `tolerance` 为 0 时退化为精确相等。
pub fn is_closed(ring: &Ring, tolerance: f64) -> bool {
    if ring.len() < 2 {
        return false;
    }
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => {
            let delta = (first.as_vec2() - last.as_vec2()).abs();
            delta.x <= tolerance && delta.y <= tolerance
        }
        _ => false,
    }
}

/// 图层上全部 TEXT 的标签与插入点，保持实体顺序。
pub fn labeled_points(
    index: &LayerIndex<'_>,
    layer: &str,
    normalizer: &Normalizer,
) -> Vec<LabeledPoint> {
    index
        .texts(layer)
        .map(|text| LabeledPoint {
            label: text.content.clone(),
            point: normalizer.normalize(text.insert),
        })
        .collect()
}

/// 为每个标签找出所有包含它的区域；一个标签可能落在多个区域内。
pub fn match_labels<'l, 'r>(
    labels: &'l [LabeledPoint],
    regions: &'r [Region],
) -> Vec<(&'l LabeledPoint, &'r Region)> {
    labels
        .iter()
        .flat_map(move |label| {
            regions
                .iter()
                .filter(move |region| region.contains(label.point))
                .map(move |region| (label, region))
        })
        .collect()
}

/// 落在未闭合区域内的标签。每个未闭合的包含区域各报告一次，不去重。
pub fn find_unenclosed<'l>(
    labels: &'l [LabeledPoint],
    regions: &[Region],
    tolerance: f64,
) -> Vec<&'l LabeledPoint> {
    match_labels(labels, regions)
        .into_iter()
        .filter(|(_, region)| !is_closed(region.ring(), tolerance))
        .map(|(label, _)| label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f64, f64)]) -> Ring {
        Ring::new(
            points
                .iter()
                .map(|(x, y)| NormalizedPoint::raw(*x, *y))
                .collect(),
        )
    }

    fn label(text: &str, x: f64, y: f64) -> LabeledPoint {
        LabeledPoint {
            label: text.to_string(),
            point: NormalizedPoint::raw(x, y),
        }
    }

    const CLOSED_SQUARE: [(f64, f64); 5] =
        [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)];
    const OPEN_SQUARE: [(f64, f64); 4] = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];

    #[test]
    fn closed_ring_requires_equal_endpoints() {
        assert!(is_closed(&ring(&CLOSED_SQUARE), 0.0));
        assert!(!is_closed(&ring(&OPEN_SQUARE), 0.0));
        assert!(!is_closed(&ring(&[(1.0, 1.0)]), 0.0));
        assert!(!is_closed(&ring(&[]), 0.0));
    }

    #[test]
    fn tolerance_absorbs_rounding() {
        let nearly = ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (1e-9, -1e-9)]);
        assert!(!is_closed(&nearly, 0.0));
        assert!(is_closed(&nearly, 1e-6));
    }

    #[test]
    fn label_inside_open_region_is_reported() {
        let regions = vec![Region::from_ring(ring(&OPEN_SQUARE)).unwrap()];
        let labels = vec![label("101", 5.0, 5.0), label("102", 50.0, 50.0)];
        let offending = find_unenclosed(&labels, &regions, 0.0);
        assert_eq!(offending.len(), 1);
        assert_eq!(offending[0].label, "101");
    }

    #[test]
    fn label_inside_closed_region_passes() {
        let regions = vec![Region::from_ring(ring(&CLOSED_SQUARE)).unwrap()];
        let labels = vec![label("101", 5.0, 5.0)];
        assert!(find_unenclosed(&labels, &regions, 0.0).is_empty());
    }

    #[test]
    fn label_in_several_open_regions_is_reported_each_time() {
        let regions = vec![
            Region::from_ring(ring(&OPEN_SQUARE)).unwrap(),
            Region::from_ring(ring(&[(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0)])).unwrap(),
            Region::from_ring(ring(&CLOSED_SQUARE)).unwrap(),
        ];
        let labels = vec![label("101", 5.0, 5.0)];
        assert_eq!(match_labels(&labels, &regions).len(), 3);
        let offending = find_unenclosed(&labels, &regions, 0.0);
        let names: Vec<&str> = offending.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(names, vec!["101", "101"]);
    }

    #[test]
    fn label_outside_every_region_is_not_matched() {
        let regions = vec![Region::from_ring(ring(&OPEN_SQUARE)).unwrap()];
        let labels = vec![label("999", -5.0, -5.0)];
        assert!(match_labels(&labels, &regions).is_empty());
        assert!(find_unenclosed(&labels, &regions, 0.0).is_empty());
    }
}
