use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 默认必须存在的 Planon 图层。
pub const DEFAULT_REQUIRED_LAYERS: [&str; 7] = [
    "Planon_floor",
    "Planon_space",
    "Planon_space_number",
    "Planon_workspace",
    "Planon_workspace_number",
    "Planon_zone",
    "Planon_construction",
];

pub const DEFAULT_MAX_ENTITIES: usize = 15_000;

pub const DEFAULT_OVERLAP_EXEMPT_LAYER: &str = "Planon_construction";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config
            .rules
            .validate()
            .map_err(|message| ConfigError::Invalid {
                path: path.to_path_buf(),
                message,
            })?;
        Ok(config)
    }

    /// 自动发现配置文件：优先读取环境变量 `DXFCHECK_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("DXFCHECK_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 校验规则的可调参数，缺省值即 Planon 交付要求。
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "RulesConfig::default_required_layers")]
    pub required_layers: Vec<String>,
    #[serde(default = "RulesConfig::default_max_entities")]
    pub max_entities: usize,
    #[serde(default = "RulesConfig::default_overlap_exempt_layer")]
    pub overlap_exempt_layer: String,
    /// 判定多段线闭合时首尾点允许的坐标差；0 表示精确相等。
    #[serde(default)]
    pub closure_tolerance: f64,
}

impl RulesConfig {
    fn default_required_layers() -> Vec<String> {
        DEFAULT_REQUIRED_LAYERS
            .iter()
            .map(|layer| layer.to_string())
            .collect()
    }

    fn default_max_entities() -> usize {
        DEFAULT_MAX_ENTITIES
    }

    fn default_overlap_exempt_layer() -> String {
        DEFAULT_OVERLAP_EXEMPT_LAYER.to_string()
    }

    /// 闭合容差必须是非负有限数。
    pub fn validate(&self) -> Result<(), String> {
        if self.closure_tolerance.is_finite() && self.closure_tolerance >= 0.0 {
            Ok(())
        } else {
            Err(format!(
                "closure_tolerance 必须为非负有限数（当前值：{}）",
                self.closure_tolerance
            ))
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            required_layers: Self::default_required_layers(),
            max_entities: Self::default_max_entities(),
            overlap_exempt_layer: Self::default_overlap_exempt_layer(),
            closure_tolerance: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("配置文件 {path:?} 取值无效: {message}")]
    Invalid { path: PathBuf, message: String },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
