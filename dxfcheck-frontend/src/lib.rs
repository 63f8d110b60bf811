pub mod cli;
pub mod errors;
pub mod loader;
pub mod staging;

use std::path::Path;

use dxfcheck_config::AppConfig;
use errors::FrontendError;
use tracing::info;

pub use cli::CheckOutcome;

/// 校验命令行给出的 DXF 文件并返回渲染后的报告。
pub fn run_cli(path: &Path, config: &AppConfig) -> Result<CheckOutcome, FrontendError> {
    info!("启动命令行校验前端");
    cli::check_path(path, config)
}
