use std::collections::HashMap;

use dxfcheck_core::document::{Document, Entity, Text};
use tracing::debug;

/// 按图层名（区分大小写）分组的实体索引，每次校验构建一次。
///
/// 图层按在实体列表中首次出现的顺序排列，图层内保持实体原始顺序。
#[derive(Debug)]
pub struct LayerIndex<'a> {
    order: Vec<&'a str>,
    layers: HashMap<&'a str, Vec<&'a Entity>>,
}

impl<'a> LayerIndex<'a> {
    pub fn build(document: &'a Document) -> Self {
        let mut order = Vec::new();
        let mut layers: HashMap<&'a str, Vec<&'a Entity>> = HashMap::new();
        for (_, entity) in document.entities() {
            let name = entity.layer_name();
            layers
                .entry(name)
                .or_insert_with(|| {
                    order.push(name);
                    Vec::new()
                })
                .push(entity);
        }
        debug!(layer_count = order.len(), "已建立图层索引");
        Self { order, layers }
    }

    /// 图层缺失与图层为空等价，均返回空切片。
    pub fn entities(&self, layer: &str) -> &[&'a Entity] {
        self.layers.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn texts(&self, layer: &str) -> impl Iterator<Item = &'a Text> + '_ {
        self.entities(layer).iter().copied().filter_map(Entity::as_text)
    }

    /// 图层上两种多段线表示的总数。
    pub fn polyline_count(&self, layer: &str) -> usize {
        self.entities(layer)
            .iter()
            .filter(|entity| entity.as_polyline().is_some())
            .count()
    }

    pub fn layers(&self) -> impl Iterator<Item = (&'a str, &[&'a Entity])> + '_ {
        self.order
            .iter()
            .map(|name| (*name, self.entities(name)))
    }
}
