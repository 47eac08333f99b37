use crate::core::ConfigProvider;
use crate::domain::model::GroupPolicy;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub policy: GroupPolicy,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSection {
    pub default_group_size: Option<usize>,
    pub default_reviews_per_submission: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_pretty() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            pretty: default_pretty(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    #[serde(default)]
    pub json: bool,
}

impl EngineConfig {
    /// 從檔案載入 TOML 配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = Self::substitute_env_vars(content)?;
        let config: EngineConfig = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// 替換 `${VAR_NAME}` 形式的環境變數，未設定時保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            crate::utils::error::EngineError::ConfigError {
                message: format!("invalid substitution pattern: {}", e),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::*;

        if let Some(size) = self.engine.default_group_size {
            validate_positive_number("engine.default_group_size", size, 1)?;
        }

        if let Some(count) = self.engine.default_reviews_per_submission {
            validate_positive_number("engine.default_reviews_per_submission", count, 1)?;
        }

        validate_path("output.path", &self.output.path)?;

        if let Some(level) = &self.logging.level {
            validate_non_empty_string("logging.level", level)?;
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level.to_lowercase().as_str()) {
                return Err(
                    crate::utils::error::EngineError::InvalidConfigValueError {
                        field: "logging.level".to_string(),
                        value: level.clone(),
                        reason: format!("Valid levels: {}", valid_levels.join(", ")),
                    },
                );
            }
        }

        Ok(())
    }
}

impl ConfigProvider for EngineConfig {
    fn default_group_size(&self) -> Option<usize> {
        self.engine.default_group_size
    }

    fn default_reviews_per_submission(&self) -> Option<usize> {
        self.engine.default_reviews_per_submission
    }

    fn seed(&self) -> Option<u64> {
        self.engine.seed
    }

    fn group_policy(&self) -> GroupPolicy {
        self.policy
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
