//! 应用配置
//!
//! 从环境变量 `CUTMETRICS_CONFIG` 指定的 TOML 文件读取；未设置时使用默认配置。

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cutmetrics_core::measure::DEFAULT_FLATTEN_TOLERANCE;
use cutmetrics_file::loader::DEFAULT_SVG_DPI;
use cutmetrics_file::ImportOptions;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// 指定配置文件路径的环境变量
pub const CONFIG_ENV: &str = "CUTMETRICS_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub measure: MeasureConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 解析 TOML 文本，无效的 `svg_dpi` 回退为默认值
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        config.import.normalize();
        Ok(config)
    }

    /// 读取 `CUTMETRICS_CONFIG` 指向的文件，未设置则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            svg_enabled: self.import.svg_enabled,
            svg_dpi: self.import.svg_dpi,
        }
    }
}

/// 日志配置，`RUST_LOG` 优先。
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

/// 导入配置
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// SVG 导入尚未完善，默认关闭
    #[serde(default)]
    pub svg_enabled: bool,
    #[serde(default = "ImportConfig::default_dpi")]
    pub svg_dpi: f64,
}

impl ImportConfig {
    fn default_dpi() -> f64 {
        DEFAULT_SVG_DPI
    }

    /// DPI 必须为正的有限值
    fn normalize(&mut self) {
        if !(self.svg_dpi.is_finite() && self.svg_dpi > 0.0) {
            warn!(
                "Invalid import.svg_dpi {}, using {}",
                self.svg_dpi, DEFAULT_SVG_DPI
            );
            self.svg_dpi = DEFAULT_SVG_DPI;
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            svg_enabled: false,
            svg_dpi: Self::default_dpi(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeasureConfig {
    #[serde(default = "MeasureConfig::default_tolerance")]
    pub flatten_tolerance: f64,
}

impl MeasureConfig {
    fn default_tolerance() -> f64 {
        DEFAULT_FLATTEN_TOLERANCE
    }
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            flatten_tolerance: Self::default_tolerance(),
        }
    }
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
}
