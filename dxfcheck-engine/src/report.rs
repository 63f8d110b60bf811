use serde::Serialize;

use crate::rules::RuleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    /// 预留状态，当前规则不会产生。
    Unknown,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

/// 一条诊断记录，渲染为报告中的一行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub detail: String,
}

impl Diagnostic {
    pub fn info(detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            detail: detail.into(),
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            detail: detail.into(),
        }
    }
}

/// 单条规则的结果，返回后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub status: Status,
    pub messages: Vec<Diagnostic>,
}

impl CheckResult {
    /// 只要存在 `Error` 级诊断即为 `Fail`。
    pub fn from_diagnostics(messages: Vec<Diagnostic>) -> Self {
        let status = if messages
            .iter()
            .any(|message| message.severity == Severity::Error)
        {
            Status::Fail
        } else {
            Status::Pass
        };
        Self { status, messages }
    }

    pub fn unknown(messages: Vec<Diagnostic>) -> Self {
        Self {
            status: Status::Unknown,
            messages,
        }
    }

    #[inline]
    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|message| message.detail.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub rule: RuleId,
    pub result: CheckResult,
}

/// 按执行顺序排列的规则结果；同一规则可能出现多次（实体数量检查）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: RuleId, result: CheckResult) {
        self.entries.push(ReportEntry { rule, result });
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 该规则第一次出现的结果。
    pub fn get(&self, rule: RuleId) -> Option<&CheckResult> {
        self.entries
            .iter()
            .find(|entry| entry.rule == rule)
            .map(|entry| &entry.result)
    }

    pub fn rules(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.entries.iter().map(|entry| entry.rule)
    }

    pub fn passed(&self) -> bool {
        self.entries.iter().all(|entry| entry.result.passed())
    }
}

/// 诊断行逐行输出，空一行后是状态行。
pub fn render_result(result: &CheckResult) -> String {
    let mut out = String::new();
    for line in result.lines() {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(result.status.label());
    out.push('\n');
    out
}

pub fn render_report(report: &Report) -> String {
    let mut out = String::new();
    for entry in report.entries() {
        out.push_str(entry.rule.heading());
        out.push_str("\n\n");
        out.push_str(&render_result(&entry.result));
        out.push('\n');
    }
    out
}
