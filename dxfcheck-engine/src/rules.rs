use dxfcheck_config::RulesConfig;
use dxfcheck_core::document::Document;
use serde::Serialize;
use tracing::info;

use crate::enclosure::{find_unenclosed, is_closed, labeled_points};
use crate::layer_index::LayerIndex;
use crate::layers;
use crate::normalize::Normalizer;
use crate::overlap::overlapping_layers;
use crate::polygon::{build_ring, layer_regions};
use crate::report::{CheckResult, Diagnostic};
use crate::uniqueness::layer_duplicates;

/// 规则标识，决定报告标题与 JSON 中的名称。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    EntityCount,
    RequiredLayers,
    FloorPolyline,
    FloorEnclosed,
    SpacesEnclosed,
    WorkspacesEnclosed,
    ZonesEnclosed,
    Overlaps,
    UniqueWorkspaceNumbers,
    UniqueSpaceNumbers,
}

impl RuleId {
    pub fn name(self) -> &'static str {
        match self {
            RuleId::EntityCount => "entity-count",
            RuleId::RequiredLayers => "required-layers",
            RuleId::FloorPolyline => "floor-polyline",
            RuleId::FloorEnclosed => "floor-enclosed",
            RuleId::SpacesEnclosed => "spaces-enclosed",
            RuleId::WorkspacesEnclosed => "workspaces-enclosed",
            RuleId::ZonesEnclosed => "zones-enclosed",
            RuleId::Overlaps => "overlaps",
            RuleId::UniqueWorkspaceNumbers => "unique-workspace-numbers",
            RuleId::UniqueSpaceNumbers => "unique-space-numbers",
        }
    }

    /// 报告中该规则结果前的标题行。
    pub fn heading(self) -> &'static str {
        match self {
            RuleId::EntityCount => "Checking number of entities:",
            RuleId::RequiredLayers => "Checking layers present:",
            RuleId::FloorPolyline => "Checking the Planon_floor polyline:",
            RuleId::FloorEnclosed => "Checking floor is enclosed:",
            RuleId::SpacesEnclosed => "Checking spaces are enclosed:",
            RuleId::WorkspacesEnclosed => "Checking workspaces are enclosed:",
            RuleId::ZonesEnclosed => "Checking zones are enclosed:",
            RuleId::Overlaps => "Checking for overlapping polylines:",
            RuleId::UniqueWorkspaceNumbers => "Checking workspace numbers are unique:",
            RuleId::UniqueSpaceNumbers => "Checking space numbers are unique:",
        }
    }
}

/// 一次校验中所有规则共享的只读上下文。
pub struct RuleContext<'a> {
    pub document: &'a Document,
    pub index: LayerIndex<'a>,
    pub normalizer: Normalizer,
    pub config: &'a RulesConfig,
}

impl<'a> RuleContext<'a> {
    pub fn new(document: &'a Document, config: &'a RulesConfig) -> Self {
        Self {
            document,
            index: LayerIndex::build(document),
            normalizer: Normalizer::for_document(document),
            config,
        }
    }
}

pub trait Rule {
    fn id(&self) -> RuleId;
    fn check(&self, context: &RuleContext<'_>) -> CheckResult;

    /// 记录进度后执行检查。
    fn run(&self, context: &RuleContext<'_>) -> CheckResult {
        let id = self.id();
        info!(rule = id.name(), "开始检查");
        let result = self.check(context);
        info!(rule = id.name(), status = result.status.label(), "检查完成");
        result
    }
}

pub struct EntityCountRule;

impl Rule for EntityCountRule {
    fn id(&self) -> RuleId {
        RuleId::EntityCount
    }

    fn check(&self, context: &RuleContext<'_>) -> CheckResult {
        let count = context.document.entity_count();
        let message = format!("{count} entities.");
        let diagnostic = if count > context.config.max_entities {
            Diagnostic::error(message)
        } else {
            Diagnostic::info(message)
        };
        CheckResult::from_diagnostics(vec![diagnostic])
    }
}

pub struct RequiredLayersRule;

impl Rule for RequiredLayersRule {
    fn id(&self) -> RuleId {
        RuleId::RequiredLayers
    }

    fn check(&self, context: &RuleContext<'_>) -> CheckResult {
        let messages = context
            .config
            .required_layers
            .iter()
            .map(|layer| {
                if context.document.has_layer_ignore_case(layer) {
                    Diagnostic::info(format!("{layer}: FOUND"))
                } else {
                    Diagnostic::error(format!("{layer}: NOT FOUND"))
                }
            })
            .collect();
        CheckResult::from_diagnostics(messages)
    }
}

/// 地板图层必须恰好有一条多段线。
pub struct FloorPolylineRule;

impl Rule for FloorPolylineRule {
    fn id(&self) -> RuleId {
        RuleId::FloorPolyline
    }

    fn check(&self, context: &RuleContext<'_>) -> CheckResult {
        let diagnostic = match context.index.polyline_count(layers::FLOOR) {
            0 => Diagnostic::error(format!("{} has no polyline.", layers::FLOOR)),
            1 => Diagnostic::info(format!("{} has 1 polyline.", layers::FLOOR)),
            count => Diagnostic::error(format!("{} has {count} polylines.", layers::FLOOR)),
        };
        CheckResult::from_diagnostics(vec![diagnostic])
    }
}

/// 检查地板图层的第一条多段线是否首尾闭合。
pub struct FloorEnclosedRule;

impl Rule for FloorEnclosedRule {
    fn id(&self) -> RuleId {
        RuleId::FloorEnclosed
    }

    fn check(&self, context: &RuleContext<'_>) -> CheckResult {
        let closed = context
            .index
            .entities(layers::FLOOR)
            .iter()
            .find_map(|entity| build_ring(entity, &context.normalizer))
            .is_some_and(|ring| is_closed(&ring, context.config.closure_tolerance));
        if closed {
            CheckResult::from_diagnostics(Vec::new())
        } else {
            CheckResult::from_diagnostics(vec![Diagnostic::error(
                "The floor polyline is not enclosed.",
            )])
        }
    }
}

/// 标签落在哪个区域，哪个区域就必须闭合。
pub struct LabelsEnclosedRule {
    pub id: RuleId,
    pub label_layer: &'static str,
    pub region_layer: &'static str,
    /// 出现在诊断中的区域名称，如 `space`。
    pub noun: &'static str,
    /// 标签计数行的后缀。
    pub count_suffix: &'static str,
}

pub const SPACES_ENCLOSED: LabelsEnclosedRule = LabelsEnclosedRule {
    id: RuleId::SpacesEnclosed,
    label_layer: layers::SPACE_NUMBER,
    region_layer: layers::SPACE,
    noun: "space",
    count_suffix: "space and zone numbers found.",
};

pub const WORKSPACES_ENCLOSED: LabelsEnclosedRule = LabelsEnclosedRule {
    id: RuleId::WorkspacesEnclosed,
    label_layer: layers::WORKSPACE_NUMBER,
    region_layer: layers::WORKSPACE,
    noun: "workspace",
    count_suffix: "workspace numbers found.",
};

pub const ZONES_ENCLOSED: LabelsEnclosedRule = LabelsEnclosedRule {
    id: RuleId::ZonesEnclosed,
    label_layer: layers::SPACE_NUMBER,
    region_layer: layers::ZONE,
    noun: "zone",
    count_suffix: "space and zone numbers found.",
};

impl Rule for LabelsEnclosedRule {
    fn id(&self) -> RuleId {
        self.id
    }

    fn check(&self, context: &RuleContext<'_>) -> CheckResult {
        let labels = labeled_points(&context.index, self.label_layer, &context.normalizer);
        let regions = layer_regions(&context.index, self.region_layer, &context.normalizer);
        let mut messages = vec![Diagnostic::info(format!(
            "{} {}",
            labels.len(),
            self.count_suffix
        ))];
        messages.extend(
            find_unenclosed(&labels, &regions, context.config.closure_tolerance)
                .into_iter()
                .map(|label| {
                    Diagnostic::error(format!(
                        "The polyline of {} {} is not enclosed.",
                        self.noun, label.label
                    ))
                }),
        );
        CheckResult::from_diagnostics(messages)
    }
}

pub struct OverlapRule;

impl Rule for OverlapRule {
    fn id(&self) -> RuleId {
        RuleId::Overlaps
    }

    fn check(&self, context: &RuleContext<'_>) -> CheckResult {
        let messages = overlapping_layers(
            &context.index,
            &context.normalizer,
            &context.config.overlap_exempt_layer,
        )
        .into_iter()
        .map(|(layer, _)| Diagnostic::error(format!("Overlap detected in layer {layer}")))
        .collect();
        CheckResult::from_diagnostics(messages)
    }
}

/// 编号图层上的 TEXT 内容必须互不相同。
pub struct UniqueNumbersRule {
    pub id: RuleId,
    pub layer: &'static str,
    pub noun: &'static str,
}

pub const UNIQUE_WORKSPACE_NUMBERS: UniqueNumbersRule = UniqueNumbersRule {
    id: RuleId::UniqueWorkspaceNumbers,
    layer: layers::WORKSPACE_NUMBER,
    noun: "workspace",
};

pub const UNIQUE_SPACE_NUMBERS: UniqueNumbersRule = UniqueNumbersRule {
    id: RuleId::UniqueSpaceNumbers,
    layer: layers::SPACE_NUMBER,
    noun: "space",
};

impl Rule for UniqueNumbersRule {
    fn id(&self) -> RuleId {
        self.id
    }

    fn check(&self, context: &RuleContext<'_>) -> CheckResult {
        let duplicates = layer_duplicates(&context.index, self.layer);
        if duplicates.is_empty() {
            return CheckResult::from_diagnostics(Vec::new());
        }
        let mut messages = Vec::with_capacity(duplicates.len() + 1);
        messages.push(Diagnostic::error(format!(
            "Non-unique {} numbers found.",
            self.noun
        )));
        messages.extend(duplicates.into_iter().map(Diagnostic::error));
        CheckResult::from_diagnostics(messages)
    }
}
