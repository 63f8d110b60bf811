use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::errors::FrontendError;

const ALLOWED_EXTENSION: &str = "dxf";

/// 扩展名（不区分大小写）必须为 `.dxf`。
pub fn is_allowed(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(ALLOWED_EXTENSION))
}

/// 去掉目录部分，只保留 `[A-Za-z0-9._-]`，空白替换为下划线，并去除首尾的点。
///
/// 结果为空时返回 `None`。
pub fn sanitize_file_name(file_name: &str) -> Option<String> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    let cleaned: String = base
        .chars()
        .filter_map(|ch| match ch {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '.' | '-' | '_' => Some(ch),
            ch if ch.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let trimmed = cleaned.trim_matches(|ch| ch == '.' || ch == '_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 暂存在独立临时目录中的上传文件；值被丢弃时目录随之删除。
#[derive(Debug)]
pub struct StagedUpload {
    dir: TempDir,
    path: PathBuf,
    file_name: String,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// 校验文件名并把内容写入新的临时目录。
pub fn stage_upload(file_name: &str, contents: &[u8]) -> Result<StagedUpload, FrontendError> {
    if file_name.trim().is_empty() {
        return Err(FrontendError::EmptyFileName);
    }
    if !is_allowed(file_name) {
        return Err(FrontendError::UnsupportedExtension {
            name: file_name.to_string(),
        });
    }
    let sanitized = sanitize_file_name(file_name).ok_or(FrontendError::EmptyFileName)?;
    // 清洗后可能丢掉扩展名前的分隔符，需再确认一次。
    if !is_allowed(&sanitized) {
        return Err(FrontendError::UnsupportedExtension {
            name: file_name.to_string(),
        });
    }

    let dir = tempfile::Builder::new()
        .prefix("dxfcheck-")
        .tempdir()
        .map_err(|source| FrontendError::Staging { source })?;
    let path = dir.path().join(&sanitized);
    fs::write(&path, contents).map_err(|source| FrontendError::Staging { source })?;
    debug!(path = %path.display(), bytes = contents.len(), "已暂存上传文件");

    Ok(StagedUpload {
        dir,
        path,
        file_name: sanitized,
    })
}
