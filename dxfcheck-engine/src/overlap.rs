use geo::Relate;
use tracing::debug;

use crate::layer_index::LayerIndex;
use crate::normalize::Normalizer;
use crate::polygon::{Region, build_ring};

/// 图层内第一对重叠区域（按实体顺序的区域下标）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapPair {
    pub first: usize,
    pub second: usize,
}

/// DE-9IM 意义上的重叠：内部相交，且互不包含。仅相邻（共享边）不算重叠。
pub fn overlaps(a: &Region, b: &Region) -> bool {
    a.polygon().relate(b.polygon()).is_overlaps()
}

/// 两两比较区域，找到第一对重叠即停止。复杂度 O(n²)。
pub fn first_overlap(regions: &[Region]) -> Option<OverlapPair> {
    for (i, outer) in regions.iter().enumerate() {
        for (j, inner) in regions.iter().enumerate().skip(i + 1) {
            if overlaps(outer, inner) {
                return Some(OverlapPair {
                    first: i,
                    second: j,
                });
            }
        }
    }
    None
}

/// 存在重叠区域的图层，按图层首次出现顺序返回；`exempt_layer` 不参与检查。
pub fn overlapping_layers<'a>(
    index: &LayerIndex<'a>,
    normalizer: &Normalizer,
    exempt_layer: &str,
) -> Vec<(&'a str, OverlapPair)> {
    let mut found = Vec::new();
    for (layer, entities) in index.layers() {
        if layer == exempt_layer {
            continue;
        }
        let regions: Vec<Region> = entities
            .iter()
            .filter_map(|entity| build_ring(entity, normalizer))
            .filter_map(Region::from_ring)
            .collect();
        if regions.len() < 2 {
            continue;
        }
        if let Some(pair) = first_overlap(&regions) {
            debug!(layer, first = pair.first, second = pair.second, "检测到重叠区域");
            found.push((layer, pair));
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use dxfcheck_core::document::Document;
    use dxfcheck_core::geometry::{Bounds2D, Point2};

    use super::*;

    fn square(doc: &mut Document, min: (f64, f64), max: (f64, f64), layer: &str) {
        doc.add_lwpolyline(
            [
                Point2::new(min.0, min.1),
                Point2::new(max.0, min.1),
                Point2::new(max.0, max.1),
                Point2::new(min.0, max.1),
                Point2::new(min.0, min.1),
            ],
            false,
            layer,
        );
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(Bounds2D::new(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0)))
    }

    #[test]
    fn overlapping_squares_fail_their_layer() {
        let mut doc = Document::new();
        square(&mut doc, (0.0, 0.0), (2.0, 2.0), "Planon_space");
        square(&mut doc, (1.0, 1.0), (3.0, 3.0), "Planon_space");
        let index = LayerIndex::build(&doc);
        let found = overlapping_layers(&index, &normalizer(), "Planon_construction");
        assert_eq!(
            found,
            vec![("Planon_space", OverlapPair { first: 0, second: 1 })]
        );
    }

    #[test]
    fn disjoint_and_adjacent_squares_pass() {
        let mut doc = Document::new();
        square(&mut doc, (0.0, 0.0), (2.0, 2.0), "Planon_space");
        square(&mut doc, (5.0, 5.0), (7.0, 7.0), "Planon_space");
        square(&mut doc, (2.0, 0.0), (4.0, 2.0), "Planon_space");
        let index = LayerIndex::build(&doc);
        assert!(overlapping_layers(&index, &normalizer(), "Planon_construction").is_empty());
    }

    #[test]
    fn nested_regions_do_not_overlap() {
        let mut doc = Document::new();
        square(&mut doc, (0.0, 0.0), (10.0, 10.0), "Planon_zone");
        square(&mut doc, (2.0, 2.0), (4.0, 4.0), "Planon_zone");
        let index = LayerIndex::build(&doc);
        assert!(overlapping_layers(&index, &normalizer(), "Planon_construction").is_empty());
    }

    #[test]
    fn exempt_layer_is_never_checked() {
        let mut doc = Document::new();
        square(&mut doc, (0.0, 0.0), (2.0, 2.0), "Planon_construction");
        square(&mut doc, (1.0, 1.0), (3.0, 3.0), "Planon_construction");
        let index = LayerIndex::build(&doc);
        assert!(overlapping_layers(&index, &normalizer(), "Planon_construction").is_empty());
        assert_eq!(overlapping_layers(&index, &normalizer(), "other").len(), 1);
    }

    #[test]
    fn scan_stops_at_first_pair_per_layer() {
        let mut doc = Document::new();
        square(&mut doc, (0.0, 0.0), (2.0, 2.0), "Planon_workspace");
        square(&mut doc, (5.0, 5.0), (7.0, 7.0), "Planon_workspace");
        square(&mut doc, (6.0, 6.0), (8.0, 8.0), "Planon_workspace");
        square(&mut doc, (1.0, 1.0), (3.0, 3.0), "Planon_workspace");
        let index = LayerIndex::build(&doc);
        let found = overlapping_layers(&index, &normalizer(), "Planon_construction");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1, OverlapPair { first: 0, second: 3 });
    }
}
