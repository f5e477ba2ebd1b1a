//! 配置管理
//!
//! 配置按以下顺序叠加：内置默认值、可选的TOML配置文件、`HOSPITAL_` 前缀的环境变量。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use hospital_storage::{CollectionFiles, FileStorage};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// 支持的日志级别
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 支持的日志格式
const LOG_FORMATS: [&str; 2] = ["full", "compact"];

/// 系统完整配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HospitalConfig {
    /// 存储配置
    pub storage: StorageConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// 数据目录
    pub data_dir: String,
    pub patients_file: String,
    pub doctors_file: String,
    pub appointments_file: String,
    pub records_file: String,
    /// 以缩进格式写出JSON
    pub pretty: bool,
}

impl StorageConfig {
    pub fn collection_files(&self) -> CollectionFiles {
        CollectionFiles {
            patients: self.patients_file.clone(),
            doctors: self.doctors_file.clone(),
            appointments: self.appointments_file.clone(),
            records: self.records_file.clone(),
        }
    }

    pub fn file_storage(&self) -> FileStorage {
        FileStorage::new(&self.data_dir).with_pretty(self.pretty)
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 日志格式
    pub format: String,
}

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: HospitalConfig,
    /// 配置文件路径
    config_path: Option<String>,
    /// 配置验证器
    validator: ConfigValidator,
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: String,
    /// 验证函数
    validator: fn(&HospitalConfig) -> Result<()>,
}

impl ConfigManager {
    /// 加载并验证配置，`config_path` 为空时只使用默认值和环境变量
    pub fn new(config_path: Option<&str>) -> Result<Self> {
        let config = Self::load_config(config_path)?;
        Self::with_config(config, config_path)
    }

    /// 使用给定配置创建管理器
    pub fn with_config(config: HospitalConfig, config_path: Option<&str>) -> Result<Self> {
        let validator = ConfigValidator::new();
        validator.validate(&config)?;

        Ok(Self {
            config,
            config_path: config_path.map(str::to_string),
            validator,
        })
    }

    fn load_config(config_path: Option<&str>) -> Result<HospitalConfig> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&HospitalConfig::default())
                .context("Failed to build default configuration")?,
        );

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("HOSPITAL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to load configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn config(&self) -> &HospitalConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    /// 应用命令行覆盖项
    pub fn apply_overrides(&mut self, data_dir: Option<&str>, log_level: Option<&str>) -> Result<()> {
        if let Some(data_dir) = data_dir {
            self.set_data_dir(data_dir)?;
        }
        if let Some(level) = log_level {
            self.set_log_level(level)?;
        }
        Ok(())
    }

    /// 覆盖数据目录
    pub fn set_data_dir(&mut self, data_dir: &str) -> Result<()> {
        let mut updated = self.config.clone();
        updated.storage.data_dir = data_dir.to_string();
        self.update_config(updated)
    }

    /// 覆盖日志级别
    pub fn set_log_level(&mut self, level: &str) -> Result<()> {
        let mut updated = self.config.clone();
        updated.logging.level = level.to_lowercase();
        self.update_config(updated)
    }

    /// 验证后替换当前配置
    pub fn update_config(&mut self, new_config: HospitalConfig) -> Result<()> {
        self.validator.validate(&new_config)?;
        self.config = new_config;
        Ok(())
    }

    /// 把当前配置以TOML格式写入文件
    pub async fn save_config(&self, path: &str) -> Result<()> {
        let config_str =
            toml::to_string_pretty(&self.config).context("Failed to serialize configuration")?;

        tokio::fs::write(path, config_str)
            .await
            .context("Failed to write configuration file")?;

        info!("Configuration saved to: {}", path);
        Ok(())
    }
}

impl ConfigValidator {
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "storage.data_dir".to_string(),
                validator: |config| {
                    if config.storage.data_dir.trim().is_empty() {
                        Err(anyhow::anyhow!("data directory cannot be empty"))
                    } else {
                        Ok(())
                    }
                },
            },
            ValidationRule {
                field_path: "storage.*_file".to_string(),
                validator: |config| {
                    let files = config.storage.collection_files();
                    let names = [
                        &files.patients,
                        &files.doctors,
                        &files.appointments,
                        &files.records,
                    ];
                    if names.iter().any(|name| name.trim().is_empty()) {
                        return Err(anyhow::anyhow!("collection file names cannot be empty"));
                    }
                    let unique: HashSet<&String> = names.iter().copied().collect();
                    if unique.len() != names.len() {
                        return Err(anyhow::anyhow!("collection file names must be distinct"));
                    }
                    Ok(())
                },
            },
            ValidationRule {
                field_path: "logging.level".to_string(),
                validator: |config| {
                    if LOG_LEVELS.contains(&config.logging.level.as_str()) {
                        Ok(())
                    } else {
                        Err(anyhow::anyhow!("unknown log level '{}'", config.logging.level))
                    }
                },
            },
            ValidationRule {
                field_path: "logging.format".to_string(),
                validator: |config| {
                    if LOG_FORMATS.contains(&config.logging.format.as_str()) {
                        Ok(())
                    } else {
                        Err(anyhow::anyhow!("unknown log format '{}'", config.logging.format))
                    }
                },
            },
        ];

        Self { validation_rules }
    }

    pub fn validate(&self, config: &HospitalConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                return Err(anyhow::anyhow!("Invalid {}: {}", rule.field_path, e));
            }
        }
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let files = CollectionFiles::default();
        Self {
            data_dir: "hospital_data".to_string(),
            patients_file: files.patients,
            doctors_file: files.doctors,
            appointments_file: files.appointments,
            records_file: files.records,
            pretty: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
        }
    }
}
