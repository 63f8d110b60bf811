//! Planon 平面图校验引擎。
//!
//! 数据流：`Document` → `LayerIndex` → 多边形构建 / 坐标归一化 →
//! 闭合、重叠、唯一性检查 → 规则编排 → 报告。

pub mod enclosure;
pub mod layer_index;
pub mod normalize;
pub mod orchestrator;
pub mod overlap;
pub mod polygon;
pub mod report;
pub mod rules;
pub mod uniqueness;

pub use orchestrator::{spaces, validate};
pub use report::{CheckResult, Report, Status};
pub use rules::RuleId;

/// 规则使用的 Planon 内容图层与编号图层。
pub mod layers {
    pub const FLOOR: &str = "Planon_floor";
    pub const SPACE: &str = "Planon_space";
    pub const SPACE_NUMBER: &str = "Planon_space_number";
    pub const WORKSPACE: &str = "Planon_workspace";
    pub const WORKSPACE_NUMBER: &str = "Planon_workspace_number";
    pub const ZONE: &str = "Planon_zone";
}
