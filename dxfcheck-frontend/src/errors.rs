use std::path::PathBuf;

use dxfcheck_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("未提供文件名")]
    EmptyFileName,
    #[error("仅接受 .dxf 文件：{name}")]
    UnsupportedExtension { name: String },
    #[error("读取待校验文件 {path:?} 失败: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("暂存上传文件失败: {source}")]
    Staging {
        #[source]
        source: std::io::Error,
    },
    #[error("加载 DXF 失败: {0}")]
    Load(#[from] IoError),
    #[error("生成 JSON 报告失败: {0}")]
    Render(#[from] serde_json::Error),
}
