use std::path::PathBuf;
use std::process::ExitCode;

use dxfcheck_config::{AppConfig, ConfigError, OutputFormat};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const USAGE: &str = "用法: dxfcheck [--config <路径>] [--json | --text] <图纸.dxf>";

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let mut format_override: Option<OutputFormat> = None;
    let mut config_override: Option<PathBuf> = None;
    let mut input: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => format_override = Some(OutputFormat::Json),
            "--text" => format_override = Some(OutputFormat::Text),
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    return ExitCode::from(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                return ExitCode::SUCCESS;
            }
            other if other.starts_with("--") => {
                eprintln!("未知参数：{other}");
                eprintln!("{USAGE}");
                return ExitCode::from(1);
            }
            other => {
                if input.replace(PathBuf::from(other)).is_some() {
                    eprintln!("只能指定一个 DXF 文件");
                    return ExitCode::from(1);
                }
            }
        }
    }

    let Some(input) = input else {
        eprintln!("{USAGE}");
        return ExitCode::from(1);
    };

    let (mut config, fallback) = match load_configuration(config_override) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };
    if let Some(format) = format_override {
        config.output.format = format;
    }
    init_logging(&config);
    if let Some(err) = &fallback {
        warn_fallback(err);
    }
    info!(path = %input.display(), "启动 DXF 校验");

    match dxfcheck_frontend::run_cli(&input, &config) {
        Ok(outcome) => {
            print!("{}", outcome.output);
            if !outcome.output.ends_with('\n') {
                println!();
            }
            if outcome.passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(err) => {
            error!(error = %err, "校验失败");
            ExitCode::from(1)
        }
    }
}

/// 显式指定的配置必须可用；自动发现失败时回退到内建默认值，错误留待日志初始化后报告。
fn load_configuration(
    override_path: Option<PathBuf>,
) -> Result<(AppConfig, Option<ConfigError>), ConfigError> {
    match override_path {
        Some(path) => AppConfig::from_file(&path).map(|config| (config, None)),
        None => Ok(fall_back_to_defaults(AppConfig::discover())),
    }
}

fn fall_back_to_defaults(
    discovered: Result<AppConfig, ConfigError>,
) -> (AppConfig, Option<ConfigError>) {
    match discovered {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    }
}

fn warn_fallback(err: &ConfigError) {
    match err {
        ConfigError::Io { path, .. }
        | ConfigError::Parse { path, .. }
        | ConfigError::Invalid { path, .. } => {
            warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
        }
        ConfigError::Context { .. } => {
            warn!(error = %err, "加载默认配置失败，使用内建默认值");
        }
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn broken_discovered_config_is_kept_for_reporting() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[rules\nmax_entities = ").expect("write temp file");
        let (config, fallback) = fall_back_to_defaults(AppConfig::from_file(file.path()));
        assert_eq!(config.rules.max_entities, 15_000);
        assert!(matches!(fallback, Some(ConfigError::Parse { .. })));
    }

    #[test]
    fn explicit_config_errors_are_fatal() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = load_configuration(Some(dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
