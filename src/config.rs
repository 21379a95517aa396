use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时处理的文档数量
    pub max_concurrent_documents: usize,
    /// 待处理作业图片所在目录
    pub upload_folder: String,
    /// 无法从文件名推断科目时使用的科目
    pub default_subject: String,
    /// 分析时使用的年级
    pub grade_level: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置（api_key 为空表示不启用） ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 视觉 OCR 配置（api_key 为空表示不启用） ---
    pub vision_api_key: String,
    pub vision_api_base_url: String,
    // --- 处理参数 ---
    pub ocr_confidence_threshold: f64,
    pub max_image_dimension: u32,
    pub max_upload_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 4,
            upload_folder: "uploads".to_string(),
            default_subject: "mathematics".to_string(),
            grade_level: "middle_school".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.anthropic.com/v1".to_string(),
            llm_model_name: "claude-3-5-sonnet-20241022".to_string(),
            vision_api_key: String::new(),
            vision_api_base_url: "https://vision.googleapis.com".to_string(),
            ocr_confidence_threshold: 0.7,
            max_image_dimension: 4096,
            max_upload_size: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → `HOMEWORK_CONFIG` 指向的 TOML 文件 → 环境变量
    ///
    /// 无法解析的环境变量会直接记录 warn 日志，需要日志订阅者已初始化。
    pub fn load() -> Result<Self, ConfigError> {
        let (config, warnings) = Self::load_with_warnings()?;
        log_warnings(&warnings);
        Ok(config)
    }

    /// 同 [`Config::load`]，但把无法解析的环境变量作为警告返回
    ///
    /// 用于日志初始化之前加载配置的场景。
    pub fn load_with_warnings() -> Result<(Self, Vec<ConfigError>), ConfigError> {
        let base = match std::env::var("HOMEWORK_CONFIG") {
            Ok(path) => Self::from_toml_file(&path)?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> Self {
        let (config, warnings) = Self::default().with_env_overrides();
        log_warnings(&warnings);
        config
    }

    /// 从 TOML 文件读取，缺省字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> (Self, Vec<ConfigError>) {
        let mut warnings = Vec::new();
        let w = &mut warnings;
        let config = Self {
            max_concurrent_documents: env_parsed("MAX_CONCURRENT_DOCUMENTS", self.max_concurrent_documents, w),
            upload_folder: std::env::var("UPLOAD_FOLDER").unwrap_or(self.upload_folder),
            default_subject: std::env::var("DEFAULT_SUBJECT").unwrap_or(self.default_subject),
            grade_level: std::env::var("GRADE_LEVEL").unwrap_or(self.grade_level),
            verbose_logging: env_parsed("VERBOSE_LOGGING", self.verbose_logging, w),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            vision_api_key: std::env::var("VISION_API_KEY").unwrap_or(self.vision_api_key),
            vision_api_base_url: std::env::var("VISION_API_BASE_URL").unwrap_or(self.vision_api_base_url),
            ocr_confidence_threshold: env_parsed("OCR_CONFIDENCE_THRESHOLD", self.ocr_confidence_threshold, w),
            max_image_dimension: env_parsed("MAX_IMAGE_DIMENSION", self.max_image_dimension, w),
            max_upload_size: env_parsed("MAX_UPLOAD_SIZE", self.max_upload_size, w),
        };
        (config, warnings)
    }
}

/// 解析数值型环境变量，失败时保留原值
fn env_parsed<T: FromStr>(var_name: &str, current: T, warnings: &mut Vec<ConfigError>) -> T {
    parse_override(var_name, std::env::var(var_name).ok(), current, warnings)
}

fn parse_override<T: FromStr>(
    var_name: &str,
    raw: Option<String>,
    current: T,
    warnings: &mut Vec<ConfigError>,
) -> T {
    let Some(raw) = raw else {
        return current;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            warnings.push(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value: raw,
                expected_type: std::any::type_name::<T>().to_string(),
            });
            current
        }
    }
}

/// 记录配置警告
pub fn log_warnings(warnings: &[ConfigError]) {
    for warning in warnings {
        warn!("⚠️ {}，使用默认值", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_only_given_fields() {
        let config = Config::from_toml_str(
            r#"
            max_concurrent_documents = 2
            ocr_confidence_threshold = 0.8
            "#,
        )
        .unwrap();

        assert_eq!(config.max_concurrent_documents, 2);
        assert_eq!(config.ocr_confidence_threshold, 0.8);
        assert_eq!(config.max_image_dimension, 4096);
        assert_eq!(config.upload_folder, "uploads");
        assert!(config.llm_api_key.is_empty());
    }

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(Config::from_toml_str("max_concurrent_documents = \"many\"").is_err());
    }

    #[test]
    fn unparsable_override_keeps_value_and_reports_warning() {
        let mut warnings = Vec::new();
        let raw = Some("many".to_string());
        let value = parse_override("MAX_CONCURRENT_DOCUMENTS", raw, 4usize, &mut warnings);
        assert_eq!(value, 4);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].to_string().contains("MAX_CONCURRENT_DOCUMENTS"));

        let raw = Some("2048".to_string());
        let value = parse_override("MAX_IMAGE_DIMENSION", raw, 4096u32, &mut warnings);
        assert_eq!(value, 2048);
        let value = parse_override("MAX_IMAGE_DIMENSION", None, 4096u32, &mut warnings);
        assert_eq!(value, 4096);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn missing_config_file_reports_path() {
        let err = Config::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
