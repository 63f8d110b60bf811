use std::collections::HashMap;

use crate::layer_index::LayerIndex;

/// 出现不止一次的标签，按原始顺序列出每一次出现。
///
/// 返回空表示全部唯一。
pub fn duplicate_labels<'a, I>(labels: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let labels: Vec<&'a str> = labels.into_iter().collect();
    let mut counts: HashMap<&str, usize> = HashMap::with_capacity(labels.len());
    for label in &labels {
        *counts.entry(*label).or_default() += 1;
    }
    labels
        .into_iter()
        .filter(|label| counts.get(label).is_some_and(|count| *count > 1))
        .collect()
}

/// 图层上 TEXT 标签的重复项。
pub fn layer_duplicates<'a>(index: &LayerIndex<'a>, layer: &str) -> Vec<&'a str> {
    duplicate_labels(index.texts(layer).map(|text| text.content.as_str()))
}
