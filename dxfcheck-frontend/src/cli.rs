use std::fs;
use std::path::Path;

use dxfcheck_config::{AppConfig, OutputFormat};
use dxfcheck_engine::report::render_report;
use dxfcheck_engine::{Report, spaces, validate};
use serde::Serialize;
use tracing::{Level, debug, enabled, info};

use crate::errors::FrontendError;
use crate::loader::load_document;
use crate::staging::{StagedUpload, stage_upload};

/// 一次校验的渲染结果与总体结论。
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub output: String,
    pub passed: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    file: &'a str,
    passed: bool,
    #[serde(flatten)]
    report: &'a Report,
}

/// 文本格式首行为读取提示，随后是逐条规则结果。
pub fn render(
    file_name: &str,
    report: &Report,
    format: OutputFormat,
) -> Result<String, FrontendError> {
    match format {
        OutputFormat::Text => Ok(format!(
            "Reading dxf file: {file_name}\n\n{}",
            render_report(report)
        )),
        OutputFormat::Json => {
            let payload = JsonReport {
                file: file_name,
                passed: report.passed(),
                report,
            };
            Ok(serde_json::to_string_pretty(&payload)?)
        }
    }
}

/// 校验已暂存的文件。
pub fn check_staged(
    staged: &StagedUpload,
    config: &AppConfig,
) -> Result<CheckOutcome, FrontendError> {
    let loaded = load_document(staged.path())?;
    if enabled!(Level::DEBUG) {
        for space in spaces(&loaded.document) {
            debug!(
                label = %space.label,
                x = space.insert.x(),
                y = space.insert.y(),
                vertices = space.outline.len(),
                "空间编号所在区域"
            );
        }
    }
    let report = validate(&loaded.document, &config.rules);
    let output = render(staged.file_name(), &report, config.output.format)?;
    Ok(CheckOutcome {
        output,
        passed: report.passed(),
    })
}

/// 暂存上传内容、校验并返回报告；临时目录在返回前删除。
pub fn check_upload(
    file_name: &str,
    contents: &[u8],
    config: &AppConfig,
) -> Result<CheckOutcome, FrontendError> {
    let staged = stage_upload(file_name, contents)?;
    let outcome = check_staged(&staged, config);
    debug!(dir = %staged.dir().display(), "清理暂存目录");
    outcome
}

/// 命令行入口：读取本地文件后按上传流程处理。
pub fn check_path(path: &Path, config: &AppConfig) -> Result<CheckOutcome, FrontendError> {
    let contents = fs::read(path).map_err(|source| FrontendError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!(path = %path.display(), "开始校验 DXF 文件");
    check_upload(&file_name, &contents, config)
}
