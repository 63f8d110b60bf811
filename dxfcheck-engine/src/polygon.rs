use dxfcheck_core::document::Entity;
use geo::{Contains, LineString, Point, Polygon};
use serde::Serialize;

use crate::layer_index::LayerIndex;
use crate::normalize::{NormalizedPoint, Normalizer};

/// 构成区域所需的最少顶点数。
pub const MIN_REGION_POINTS: usize = 3;

/// 由多段线顶点归一化得到的有序点列，未必闭合。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ring {
    points: Vec<NormalizedPoint>,
}

impl Ring {
    pub fn new(points: Vec<NormalizedPoint>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[NormalizedPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn first(&self) -> Option<NormalizedPoint> {
        self.points.first().copied()
    }

    #[inline]
    pub fn last(&self) -> Option<NormalizedPoint> {
        self.points.last().copied()
    }

    /// 少于三个点无法围成区域，不参与包含与重叠判断。
    #[inline]
    pub fn is_region(&self) -> bool {
        self.points.len() >= MIN_REGION_POINTS
    }
}

/// 可参与几何判断的区域：保留原始点列，同时缓存 `geo` 多边形。
#[derive(Debug, Clone)]
pub struct Region {
    ring: Ring,
    polygon: Polygon<f64>,
}

impl Region {
    pub fn from_ring(ring: Ring) -> Option<Self> {
        if !ring.is_region() {
            return None;
        }
        let exterior: LineString<f64> = ring
            .points()
            .iter()
            .map(|point| point.to_coord())
            .collect();
        // geo 会自动补齐外环终点，闭合与否由 `Ring` 自身记录。
        let polygon = Polygon::new(exterior, Vec::new());
        Some(Self { ring, polygon })
    }

    #[inline]
    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    #[inline]
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// 严格内部包含，边界上的点不算在内。
    pub fn contains(&self, point: NormalizedPoint) -> bool {
        self.polygon.contains(&Point::from(point.to_coord()))
    }
}

/// 将多段线实体转换为归一化点列；显式闭合的实体会在末尾追加首点副本。
/// 非多段线实体返回 `None`，由调用方过滤。
pub fn build_ring(entity: &Entity, normalizer: &Normalizer) -> Option<Ring> {
    let polyline = entity.as_polyline()?;
    let mut points: Vec<NormalizedPoint> = polyline
        .vertices
        .iter()
        .map(|vertex| normalizer.normalize(*vertex))
        .collect();
    if polyline.is_closed {
        if let Some(first) = points.first().copied() {
            points.push(first);
        }
    }
    Some(Ring::new(points))
}

/// 图层上所有多段线对应的点列，保持实体顺序。
pub fn layer_rings(index: &LayerIndex<'_>, layer: &str, normalizer: &Normalizer) -> Vec<Ring> {
    index
        .entities(layer)
        .iter()
        .filter_map(|entity| build_ring(entity, normalizer))
        .collect()
}

/// 图层上所有可构成区域的多段线。
pub fn layer_regions(index: &LayerIndex<'_>, layer: &str, normalizer: &Normalizer) -> Vec<Region> {
    layer_rings(index, layer, normalizer)
        .into_iter()
        .filter_map(Region::from_ring)
        .collect()
}
