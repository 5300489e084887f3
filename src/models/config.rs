//! 配置数据模型

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::models::key::MAX_TOTAL_TIME_SECS;
use crate::utils::error::ConfigError;

/// 应用程序主配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 倒计时配置
    pub countdown: CountdownSettings,
    /// 密钥生成器配置
    pub key_generator: KeyGeneratorSettings,
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.countdown.validate()
            .map_err(|e| ConfigError::ValidationError(format!("倒计时配置无效: {}", e)))?;

        self.key_generator.validate()
            .map_err(|e| ConfigError::ValidationError(format!("密钥生成器配置无效: {}", e)))?;

        Ok(())
    }

    /// 修复无效的配置项，使用默认值替换
    pub fn fix_invalid_values(&mut self) {
        self.countdown.fix_invalid_values();
        self.key_generator.fix_invalid_values();
    }
}

/// 倒计时配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CountdownSettings {
    /// 刷新间隔（毫秒）
    pub tick_interval_ms: u64,
    /// 血条总宽度（像素）
    pub bar_width: u32,
    /// 到期提示音
    pub beep: BeepSettings,
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            bar_width: 300,
            beep: BeepSettings::default(),
        }
    }
}

impl CountdownSettings {
    /// 验证倒计时配置
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 || self.tick_interval_ms > 1000 {
            return Err(format!("刷新间隔必须在1-1000毫秒之间，当前值: {}", self.tick_interval_ms));
        }

        if self.bar_width == 0 {
            return Err("血条宽度必须大于0".to_string());
        }

        self.beep.validate()?;

        Ok(())
    }

    /// 修复无效的配置项
    pub fn fix_invalid_values(&mut self) {
        let default_settings = CountdownSettings::default();

        if self.tick_interval_ms == 0 || self.tick_interval_ms > 1000 {
            self.tick_interval_ms = default_settings.tick_interval_ms;
        }

        if self.bar_width == 0 {
            self.bar_width = default_settings.bar_width;
        }

        self.beep.fix_invalid_values();
    }
}

/// 提示音配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BeepSettings {
    /// 是否播放
    pub enabled: bool,
    /// 频率（赫兹）
    pub frequency_hz: u32,
    /// 时长（毫秒）
    pub duration_ms: u32,
}

/// Windows Beep 支持的频率范围
pub const BEEP_FREQUENCY_RANGE: std::ops::RangeInclusive<u32> = 37..=32767;

impl Default for BeepSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency_hz: 1000,
            duration_ms: 1000,
        }
    }
}

impl BeepSettings {
    /// 验证提示音配置
    pub fn validate(&self) -> Result<(), String> {
        if !BEEP_FREQUENCY_RANGE.contains(&self.frequency_hz) {
            return Err(format!(
                "提示音频率必须在{}-{}赫兹之间，当前值: {}",
                BEEP_FREQUENCY_RANGE.start(),
                BEEP_FREQUENCY_RANGE.end(),
                self.frequency_hz
            ));
        }

        if self.duration_ms == 0 {
            return Err("提示音时长必须大于0".to_string());
        }

        Ok(())
    }

    /// 修复无效的配置项
    pub fn fix_invalid_values(&mut self) {
        let default_settings = BeepSettings::default();

        if !BEEP_FREQUENCY_RANGE.contains(&self.frequency_hz) {
            self.frequency_hz = default_settings.frequency_hz;
        }

        if self.duration_ms == 0 {
            self.duration_ms = default_settings.duration_ms;
        }
    }
}

/// 密钥生成器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeyGeneratorSettings {
    /// 生成总时间（秒）
    pub total_time_secs: u64,
    /// 日志文件夹
    pub log_dir: PathBuf,
    /// 日志文件名
    pub log_file_name: String,
    /// 上次保存密钥的目录
    pub last_save_dir: Option<PathBuf>,
}

impl Default for KeyGeneratorSettings {
    fn default() -> Self {
        Self {
            total_time_secs: 10,
            log_dir: PathBuf::from("logs"),
            log_file_name: "key_generator_log.txt".to_string(),
            last_save_dir: None,
        }
    }
}

impl KeyGeneratorSettings {
    /// 验证密钥生成器配置
    pub fn validate(&self) -> Result<(), String> {
        if self.total_time_secs == 0 || self.total_time_secs > MAX_TOTAL_TIME_SECS {
            return Err(format!("生成时间必须在1到{}秒之间", MAX_TOTAL_TIME_SECS));
        }

        if self.log_dir.as_os_str().is_empty() {
            return Err("日志文件夹不能为空".to_string());
        }

        if self.log_file_name.trim().is_empty() {
            return Err("日志文件名不能为空".to_string());
        }

        Ok(())
    }

    /// 修复无效的配置项
    pub fn fix_invalid_values(&mut self) {
        let default_settings = KeyGeneratorSettings::default();

        if self.total_time_secs == 0 || self.total_time_secs > MAX_TOTAL_TIME_SECS {
            self.total_time_secs = default_settings.total_time_secs;
        }

        if self.log_dir.as_os_str().is_empty() {
            self.log_dir = default_settings.log_dir;
        }

        if self.log_file_name.trim().is_empty() {
            self.log_file_name = default_settings.log_file_name;
        }
    }

    /// 日志文件完整路径
    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file_name)
    }
}
