use dxfcheck_config::RulesConfig;
use dxfcheck_core::document::Document;
use serde::Serialize;
use tracing::{debug, info};

use crate::enclosure::{labeled_points, match_labels};
use crate::layer_index::LayerIndex;
use crate::layers;
use crate::normalize::{NormalizedPoint, Normalizer};
use crate::polygon::{Ring, layer_regions};
use crate::report::Report;
use crate::rules::{
    EntityCountRule, FloorEnclosedRule, FloorPolylineRule, OverlapRule, RequiredLayersRule, Rule,
    RuleContext, SPACES_ENCLOSED, UNIQUE_SPACE_NUMBERS, UNIQUE_WORKSPACE_NUMBERS,
    WORKSPACES_ENCLOSED, ZONES_ENCLOSED,
};

/// 图层门禁之后无条件执行的规则，按报告顺序排列。
const TRAILING_RULES: [&dyn Rule; 6] = [
    &SPACES_ENCLOSED,
    &WORKSPACES_ENCLOSED,
    &ZONES_ENCLOSED,
    &OverlapRule,
    &UNIQUE_WORKSPACE_NUMBERS,
    &UNIQUE_SPACE_NUMBERS,
];

/// 按固定顺序执行全部规则。
///
/// 必需图层缺失时只返回前两条结果；地板多段线数量不对时仅跳过地板闭合检查。
pub fn validate(document: &Document, config: &RulesConfig) -> Report {
    let context = RuleContext::new(document, config);
    let mut report = Report::new();
    let mut run = |rule: &dyn Rule| {
        let result = rule.run(&context);
        let passed = result.passed();
        report.push(rule.id(), result);
        passed
    };

    run(&EntityCountRule);
    if !run(&RequiredLayersRule) {
        info!("必需图层缺失，跳过其余检查");
        return report;
    }

    run(&EntityCountRule);
    if run(&FloorPolylineRule) {
        run(&FloorEnclosedRule);
    } else {
        debug!("地板多段线数量不符，跳过地板闭合检查");
    }

    for rule in TRAILING_RULES {
        run(rule);
    }

    info!(entries = report.len(), passed = report.passed(), "校验结束");
    report
}

/// 空间编号与包含它的空间区域。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Space {
    pub label: String,
    pub insert: NormalizedPoint,
    pub outline: Ring,
}

/// 把每个空间编号与所有包含它的 `Planon_space` 区域配对。
pub fn spaces(document: &Document) -> Vec<Space> {
    let index = LayerIndex::build(document);
    let normalizer = Normalizer::for_document(document);
    let labels = labeled_points(&index, layers::SPACE_NUMBER, &normalizer);
    let regions = layer_regions(&index, layers::SPACE, &normalizer);
    match_labels(&labels, &regions)
        .into_iter()
        .map(|(label, region)| Space {
            label: label.label.clone(),
            insert: label.point,
            outline: region.ring().clone(),
        })
        .collect()
}
