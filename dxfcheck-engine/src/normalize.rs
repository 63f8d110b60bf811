use dxfcheck_core::document::Document;
use dxfcheck_core::geometry::{Bounds2D, Point2};
use geo::Coord;
use glam::DVec2;
use serde::Serialize;

/// 报告空间中的点：原点位于图纸范围最小角，Y 轴向下。
///
/// 只能由 [`Normalizer`] 产生，避免图纸坐标与报告坐标混用。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedPoint(DVec2);

impl NormalizedPoint {
    #[inline]
    pub fn x(self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn as_vec2(self) -> DVec2 {
        self.0
    }

    #[inline]
    pub(crate) fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.0.x,
            y: self.0.y,
        }
    }

    #[cfg(test)]
    pub(crate) fn raw(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }
}

/// 图纸空间到报告空间的唯一转换入口。
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    min: DVec2,
    max_y: f64,
}

impl Normalizer {
    pub fn new(extents: Bounds2D) -> Self {
        Self {
            min: extents.min().as_vec2(),
            max_y: extents.max().y(),
        }
    }

    pub fn for_document(document: &Document) -> Self {
        Self::new(document.extents())
    }

    /// 返回 `(x - xmin, ymax - y - ymin)`。
    #[inline]
    pub fn normalize(&self, point: Point2) -> NormalizedPoint {
        NormalizedPoint(DVec2::new(
            point.x() - self.min.x,
            self.max_y - point.y() - self.min.y,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extents(min: (f64, f64), max: (f64, f64)) -> Bounds2D {
        Bounds2D::new(Point2::new(min.0, min.1), Point2::new(max.0, max.1))
    }

    #[test]
    fn flips_y_and_shifts_origin() {
        let normalizer = Normalizer::new(extents((10.0, 20.0), (110.0, 70.0)));
        let point = normalizer.normalize(Point2::new(15.0, 60.0));
        assert!((point.x() - 5.0).abs() < 1e-9);
        // 70 - 60 - 20
        assert!((point.y() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn origin_extents_only_flip_y() {
        let normalizer = Normalizer::new(extents((0.0, 0.0), (100.0, 50.0)));
        assert_eq!(
            normalizer.normalize(Point2::new(25.0, 10.0)),
            NormalizedPoint::raw(25.0, 40.0)
        );
        assert_eq!(
            normalizer.normalize(Point2::new(0.0, 50.0)),
            NormalizedPoint::raw(0.0, 0.0)
        );
    }

    #[test]
    fn normalization_is_deterministic() {
        let normalizer = Normalizer::new(extents((-3.25, 7.5), (12.125, 99.0)));
        let raw = Point2::new(4.2, 31.7);
        let first = normalizer.normalize(raw);
        let second = normalizer.normalize(raw);
        assert_eq!(first, second);
        assert_eq!(first, Normalizer::new(extents((-3.25, 7.5), (12.125, 99.0))).normalize(raw));
    }

    #[test]
    fn document_without_extents_uses_entity_bounds() {
        let mut document = Document::new();
        document.add_text(Point2::new(2.0, 4.0), "A", "0");
        document.add_text(Point2::new(6.0, 8.0), "B", "0");
        let normalizer = Normalizer::for_document(&document);
        assert_eq!(
            normalizer.normalize(Point2::new(2.0, 8.0)),
            NormalizedPoint::raw(0.0, -4.0)
        );
    }
}
