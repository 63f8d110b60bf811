pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 图纸空间中的二维点，内部以 `glam::DVec2` 表示。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

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
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 轴对齐边界框，对应 DXF 头部的 `$EXTMIN` / `$EXTMAX`。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }
    }
}

pub mod document {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
    }

    impl Layer {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self { name: name.into() }
        }
    }

    /// 校验所关心的实体种类。其余 DXF 实体统一落入 `Other`，只参与计数。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum Entity {
        Text(Text),
        Polyline(Polyline),
        LwPolyline(Polyline),
        Other(OtherEntity),
    }

    impl Entity {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                Entity::Text(text) => &text.layer,
                Entity::Polyline(polyline) | Entity::LwPolyline(polyline) => &polyline.layer,
                Entity::Other(other) => &other.layer,
            }
        }

        /// DXF 中的实体类型名（组码 0 的值）。
        pub fn kind(&self) -> &str {
            match self {
                Entity::Text(_) => "TEXT",
                Entity::Polyline(_) => "POLYLINE",
                Entity::LwPolyline(_) => "LWPOLYLINE",
                Entity::Other(other) => &other.kind,
            }
        }

        /// 两种多段线表示都返回其几何数据，其他实体返回 `None`。
        #[inline]
        pub fn as_polyline(&self) -> Option<&Polyline> {
            match self {
                Entity::Polyline(polyline) | Entity::LwPolyline(polyline) => Some(polyline),
                _ => None,
            }
        }

        #[inline]
        pub fn as_text(&self) -> Option<&Text> {
            match self {
                Entity::Text(text) => Some(text),
                _ => None,
            }
        }

        /// 计算实体的 2D 轴对齐范围；`Other` 不携带几何信息。
        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            match self {
                Entity::Text(text) => bounds.include_point(text.insert),
                Entity::Polyline(polyline) | Entity::LwPolyline(polyline) => {
                    for vertex in &polyline.vertices {
                        bounds.include_point(*vertex);
                    }
                }
                Entity::Other(_) => {}
            }
            if bounds.is_empty() {
                None
            } else {
                Some(bounds)
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Polyline {
        pub vertices: Vec<Point2>,
        pub is_closed: bool,
        pub layer: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Text {
        pub insert: Point2,
        pub content: String,
        pub layer: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct OtherEntity {
        pub kind: String,
        pub layer: String,
    }

    /// 解析后的图纸。校验期间只读。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Document {
        layers: HashMap<String, Layer>,
        entities: Vec<(EntityId, Entity)>,
        next_entity_id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extents: Option<Bounds2D>,
        /// 被跳过的图纸空间实体数量。
        #[serde(default)]
        paper_space_entities: usize,
    }

    impl Document {
        pub fn new() -> Self {
            let mut doc = Self::default();
            doc.ensure_layer("0");
            doc
        }

        pub fn ensure_layer(&mut self, name: impl AsRef<str>) {
            let key = name.as_ref();
            self.layers
                .entry(key.to_string())
                .or_insert_with(|| Layer::new(key));
        }

        /// 记录头部声明的图纸范围（`$EXTMIN` / `$EXTMAX`）。
        pub fn set_extents(&mut self, extents: Bounds2D) {
            self.extents = Some(extents);
        }

        #[inline]
        pub fn header_extents(&self) -> Option<Bounds2D> {
            self.extents
        }

        /// 坐标归一化使用的范围：优先头部声明值，其次实体包围盒，最后退化为原点。
        pub fn extents(&self) -> Bounds2D {
            self.extents
                .or_else(|| self.bounds())
                .unwrap_or_else(|| Bounds2D::new(Point2::new(0.0, 0.0), Point2::new(0.0, 0.0)))
        }

        pub fn add_text(
            &mut self,
            insert: Point2,
            content: impl Into<String>,
            layer: impl Into<String>,
        ) -> EntityId {
            self.add_entity(Entity::Text(Text {
                insert,
                content: content.into(),
                layer: layer.into(),
            }))
        }

        pub fn add_polyline<I>(
            &mut self,
            vertices: I,
            is_closed: bool,
            layer: impl Into<String>,
        ) -> EntityId
        where
            I: IntoIterator<Item = Point2>,
        {
            self.add_entity(Entity::Polyline(Polyline {
                vertices: vertices.into_iter().collect(),
                is_closed,
                layer: layer.into(),
            }))
        }

        pub fn add_lwpolyline<I>(
            &mut self,
            vertices: I,
            is_closed: bool,
            layer: impl Into<String>,
        ) -> EntityId
        where
            I: IntoIterator<Item = Point2>,
        {
            self.add_entity(Entity::LwPolyline(Polyline {
                vertices: vertices.into_iter().collect(),
                is_closed,
                layer: layer.into(),
            }))
        }

        pub fn add_other(&mut self, kind: impl Into<String>, layer: impl Into<String>) -> EntityId {
            self.add_entity(Entity::Other(OtherEntity {
                kind: kind.into(),
                layer: layer.into(),
            }))
        }

        pub fn add_entity(&mut self, entity: Entity) -> EntityId {
            self.ensure_layer(entity.layer_name());
            let id = self.next_id();
            self.entities.push((id, entity));
            id
        }

        /// 图纸空间（布局）实体不参与校验，只保留其图层并计数。
        pub fn note_paper_space_entity(&mut self, layer: &str) {
            self.ensure_layer(layer);
            self.paper_space_entities += 1;
        }

        #[inline]
        pub fn paper_space_entity_count(&self) -> usize {
            self.paper_space_entities
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.values()
        }

        /// 图层名不区分大小写的存在性判断，与 DXF 图层表的语义一致。
        pub fn has_layer_ignore_case(&self, name: &str) -> bool {
            let wanted = name.to_lowercase();
            self.layers
                .keys()
                .any(|existing| existing.to_lowercase() == wanted)
        }

        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &(EntityId, Entity)> {
            self.entities.iter()
        }

        #[inline]
        pub fn entity_count(&self) -> usize {
            self.entities.len()
        }

        #[inline]
        pub fn entity(&self, id: EntityId) -> Option<&Entity> {
            self.entities
                .iter()
                .find_map(|(entity_id, entity)| (*entity_id == id).then_some(entity))
        }

        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            let mut has = false;
            for (_, entity) in &self.entities {
                if let Some(entity_bounds) = entity.bounds() {
                    bounds.include_bounds(&entity_bounds);
                    has = true;
                }
            }
            if has { Some(bounds) } else { None }
        }

        fn next_id(&mut self) -> EntityId {
            let id = EntityId::new(self.next_entity_id);
            self.next_entity_id += 1;
            id
        }
    }

}
