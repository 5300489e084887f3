//! 配置管理服务
//!
//! 负责应用程序配置的持久化存储和加载，支持异步保存和变更通知

use crate::models::config::AppConfig;
use crate::models::key::MAX_TOTAL_TIME_SECS;
use crate::utils::error::{ConfigError, ConfigResult};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{broadcast, RwLock};

/// 配置变更事件
#[derive(Debug, Clone)]
pub enum ConfigChangeEvent {
    /// 配置已加载
    Loaded,
    /// 配置已保存
    Saved,
    /// 配置已更新
    Updated,
    /// 配置保存失败
    SaveFailed(String),
}

/// 配置管理服务
///
/// 提供配置的持久化存储、加载、异步保存和变更通知功能
pub struct ConfigService {
    /// 配置数据
    config: Arc<RwLock<AppConfig>>,
    /// 配置文件路径
    config_path: PathBuf,
    /// 是否启用自动保存
    auto_save: bool,
    /// 变更通知发送器
    change_sender: broadcast::Sender<ConfigChangeEvent>,
}

impl ConfigService {
    /// 创建新的配置服务
    ///
    /// # 参数
    /// * `config_path` - 配置文件路径
    ///
    /// # 返回
    /// * `ConfigResult<Self>` - 配置服务实例或错误
    pub fn new(config_path: PathBuf) -> ConfigResult<Self> {
        info!("初始化配置服务，配置文件路径: {:?}", config_path);

        // 验证配置文件路径
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ConfigError::InvalidPath(format!(
                    "配置文件目录不存在: {:?}",
                    parent
                )));
            }
        }

        let (change_sender, _) = broadcast::channel(100);

        Ok(Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
            config_path,
            auto_save: true,
            change_sender,
        })
    }

    /// 创建配置服务并立即加载配置
    pub async fn new_and_load(config_path: PathBuf) -> ConfigResult<Self> {
        let mut service = Self::new(config_path)?;
        service.load_config().await?;
        Ok(service)
    }

    /// 加载配置文件
    ///
    /// 如果配置文件不存在，将使用默认配置并创建新文件
    /// 如果配置文件格式错误，将备份原文件并使用默认配置
    pub async fn load_config(&mut self) -> ConfigResult<()> {
        info!("加载配置文件: {:?}", self.config_path);

        if !self.config_path.exists() {
            warn!("配置文件不存在，使用默认配置: {:?}", self.config_path);
            self.replace_with_default().await?;
            return Ok(());
        }

        let content = fs::read_to_string(&self.config_path).await?;

        let mut parsed_config = match parse_config_content(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("配置文件格式错误: {}，使用默认配置并备份原文件", e);
                self.backup_corrupted_config().await?;
                self.replace_with_default().await?;
                return Ok(());
            }
        };

        // 验证配置
        if let Err(validation_error) = parsed_config.validate() {
            warn!("配置验证失败: {}, 尝试修复", validation_error);

            parsed_config.fix_invalid_values();

            if let Err(e) = parsed_config.validate() {
                error!("配置修复失败: {}", e);
                return Err(ConfigError::ValidationError(format!("配置修复失败: {}", e)));
            }

            info!("配置已修复，将保存修复后的配置");
            *self.config.write().await = parsed_config;
            self.save_config().await?;
        } else {
            *self.config.write().await = parsed_config;
        }

        info!("配置加载成功");
        let _ = self.change_sender.send(ConfigChangeEvent::Loaded);

        Ok(())
    }

    /// 保存配置到文件
    ///
    /// 使用JSON格式保存配置，确保格式化输出便于阅读
    pub async fn save_config(&self) -> ConfigResult<()> {
        debug!("保存配置到文件: {:?}", self.config_path);

        let content = {
            let config = self.config.read().await;
            config
                .validate()
                .map_err(|e| ConfigError::ValidationError(format!("保存前配置验证失败: {}", e)))?;
            serde_json::to_string_pretty(&*config)
                .map_err(|e| ConfigError::SerializationError(e.to_string()))?
        };

        write_config_file(&self.config_path, content, &self.change_sender).await
    }

    /// 异步保存配置
    ///
    /// 在后台异步保存配置，不阻塞当前操作
    pub fn save_config_async(&self) -> tokio::task::JoinHandle<ConfigResult<()>> {
        let config = self.config.clone();
        let config_path = self.config_path.clone();
        let change_sender = self.change_sender.clone();

        tokio::spawn(async move {
            debug!("异步保存配置到文件: {:?}", config_path);

            let content = {
                let config_data = config.read().await;
                config_data.validate().map_err(|e| {
                    ConfigError::ValidationError(format!("异步保存前配置验证失败: {}", e))
                })?;
                serde_json::to_string_pretty(&*config_data)
                    .map_err(|e| ConfigError::SerializationError(e.to_string()))?
            };

            write_config_file(&config_path, content, &change_sender).await
        })
    }

    /// 获取配置的只读副本（异步）
    pub async fn get_config_async(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// 获取配置的只读副本（同步，用于 UI 回调）
    ///
    /// 使用 try_read 避免在事件循环中阻塞，拿不到锁时返回默认配置
    pub fn get_config(&self) -> AppConfig {
        match self.config.try_read() {
            Ok(config) => config.clone(),
            Err(_) => {
                warn!("无法获取配置读锁，返回默认配置");
                AppConfig::default()
            }
        }
    }

    /// 获取配置的只读副本（阻塞等待读锁）
    ///
    /// 只能在非异步上下文的线程中调用，例如保存对话框线程
    pub fn get_config_blocking(&self) -> AppConfig {
        self.config.blocking_read().clone()
    }

    /// 更新配置
    ///
    /// 更新后的配置验证失败时不会生效
    pub async fn update_config<F>(&self, updater: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        debug!("更新配置");

        {
            let mut config = self.config.write().await;
            let mut updated = config.clone();
            updater(&mut updated);

            updated
                .validate()
                .map_err(|e| ConfigError::ValidationError(format!("配置更新后验证失败: {}", e)))?;

            *config = updated;
        }

        // 如果启用自动保存，异步保存配置
        if self.auto_save {
            let _save_handle = self.save_config_async();
        }

        info!("配置更新成功");
        let _ = self.change_sender.send(ConfigChangeEvent::Updated);

        Ok(())
    }

    /// 重置配置为默认值
    pub async fn reset_to_default(&self) -> ConfigResult<()> {
        info!("重置配置为默认值");

        *self.config.write().await = AppConfig::default();
        self.save_config().await?;

        info!("配置已重置为默认值");
        let _ = self.change_sender.send(ConfigChangeEvent::Updated);

        Ok(())
    }

    /// 订阅配置变更事件
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.change_sender.subscribe()
    }

    /// 设置自动保存状态
    pub fn set_auto_save(&mut self, enabled: bool) {
        self.auto_save = enabled;
        info!("自动保存设置为: {}", enabled);
    }

    /// 获取自动保存状态
    pub fn is_auto_save_enabled(&self) -> bool {
        self.auto_save
    }

    /// 获取配置文件路径
    pub fn get_config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// 备份损坏的配置文件
    async fn backup_corrupted_config(&self) -> ConfigResult<()> {
        let backup_path = self.config_path.with_extension("bak");

        info!("备份损坏的配置文件到: {:?}", backup_path);
        fs::copy(&self.config_path, &backup_path).await?;

        Ok(())
    }

    /// 使用默认配置覆盖内存与文件
    async fn replace_with_default(&self) -> ConfigResult<()> {
        *self.config.write().await = AppConfig::default();
        self.save_config().await?;
        let _ = self.change_sender.send(ConfigChangeEvent::Loaded);
        Ok(())
    }

    // ========== 便捷更新方法 ==========

    /// 更新密钥生成器设置（设置窗口保存时调用）
    ///
    /// 会先创建日志文件夹，创建失败则不更新配置
    pub async fn update_key_generator_settings(
        &self,
        total_time_secs: u64,
        log_dir: PathBuf,
    ) -> ConfigResult<()> {
        if total_time_secs == 0 || total_time_secs > MAX_TOTAL_TIME_SECS {
            return Err(ConfigError::validation_error(&format!(
                "时间必须在1到{}秒之间",
                MAX_TOTAL_TIME_SECS
            )));
        }
        if log_dir.as_os_str().is_empty() {
            return Err(ConfigError::validation_error("日志文件夹不能为空"));
        }

        fs::create_dir_all(&log_dir).await?;

        self.update_config(|config| {
            config.key_generator.total_time_secs = total_time_secs;
            config.key_generator.log_dir = log_dir;
        })
        .await
    }

    /// 记住上次保存密钥的目录
    pub async fn update_last_save_dir(&self, dir: PathBuf) -> ConfigResult<()> {
        self.update_config(|config| {
            config.key_generator.last_save_dir = Some(dir);
        })
        .await
    }
}

/// 解析配置内容，先尝试 JSON，再尝试 TOML
fn parse_config_content(content: &str) -> ConfigResult<AppConfig> {
    match serde_json::from_str(content) {
        Ok(config) => Ok(config),
        Err(json_err) => {
            debug!("JSON 解析失败: {}，尝试使用TOML格式", json_err);
            toml::from_str(content).map_err(|toml_err| {
                error!("TOML格式解析也失败: {}", toml_err);
                ConfigError::from(toml_err)
            })
        }
    }
}

/// 写入配置文件并发送对应事件
async fn write_config_file(
    config_path: &Path,
    content: String,
    change_sender: &broadcast::Sender<ConfigChangeEvent>,
) -> ConfigResult<()> {
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    fs::write(config_path, content).await.map_err(|e| {
        let error_msg = format!("保存配置文件失败: {}", e);
        error!("{}", error_msg);
        let _ = change_sender.send(ConfigChangeEvent::SaveFailed(error_msg.clone()));
        ConfigError::SaveError(error_msg)
    })?;

    info!("配置保存成功: {:?}", config_path);
    let _ = change_sender.send(ConfigChangeEvent::Saved);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tokio::time::{sleep, Duration};

    /// 创建临时配置文件路径
    fn create_temp_config_path() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("创建临时目录失败");
        let config_path = temp_dir.path().join("test_config.json");
        (temp_dir, config_path)
    }

    #[tokio::test]
    async fn test_config_service_new() {
        let (_temp_dir, config_path) = create_temp_config_path();

        let service = ConfigService::new(config_path.clone()).unwrap();

        assert_eq!(service.get_config_path(), &config_path);
        assert!(service.is_auto_save_enabled());
        assert_eq!(service.get_config(), AppConfig::default());
    }

    #[tokio::test]
    async fn test_config_service_new_invalid_path() {
        let (temp_dir, _) = create_temp_config_path();
        let invalid_path = temp_dir.path().join("nonexistent").join("config.json");

        let result = ConfigService::new(invalid_path);
        assert!(matches!(result, Err(ConfigError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_load_config_file_not_exists() {
        let (_temp_dir, config_path) = create_temp_config_path();

        let mut service = ConfigService::new(config_path.clone()).unwrap();
        service.load_config().await.unwrap();

        // 配置文件不存在时应该使用默认配置并创建文件
        assert!(config_path.exists());
        assert_eq!(service.get_config_async().await, AppConfig::default());
    }

    #[tokio::test]
    async fn test_load_config_valid_file() {
        let (_temp_dir, config_path) = create_temp_config_path();

        let mut test_config = AppConfig::default();
        test_config.key_generator.total_time_secs = 3;
        test_config.countdown.beep.enabled = false;
        fs::write(&config_path, serde_json::to_string_pretty(&test_config).unwrap()).unwrap();

        let service = ConfigService::new_and_load(config_path).await.unwrap();
        assert_eq!(service.get_config_async().await, test_config);
    }

    #[tokio::test]
    async fn test_load_config_invalid_json() {
        let (_temp_dir, config_path) = create_temp_config_path();

        fs::write(&config_path, "invalid json content").unwrap();

        let mut service = ConfigService::new(config_path.clone()).unwrap();
        service.load_config().await.unwrap();

        // 应该使用默认配置并备份原文件
        assert_eq!(service.get_config_async().await, AppConfig::default());
        let backup_path = config_path.with_extension("bak");
        assert_eq!(fs::read_to_string(backup_path).unwrap(), "invalid json content");

        // 新写入的配置是合法 JSON
        let content = fs::read_to_string(&config_path).unwrap();
        let saved: AppConfig = serde_json::from_str(&content).unwrap();
        assert_eq!(saved, AppConfig::default());
    }

    #[tokio::test]
    async fn test_load_config_toml_format() {
        let (_temp_dir, config_path) = create_temp_config_path();

        let mut test_config = AppConfig::default();
        test_config.countdown.tick_interval_ms = 20;
        fs::write(&config_path, toml::to_string(&test_config).unwrap()).unwrap();

        let service = ConfigService::new_and_load(config_path).await.unwrap();
        assert_eq!(service.get_config_async().await, test_config);
    }

    #[tokio::test]
    async fn test_load_config_fixes_invalid_values() {
        let (_temp_dir, config_path) = create_temp_config_path();

        fs::write(
            &config_path,
            r#"{ "key_generator": { "total_time_secs": 0, "log_dir": "my_logs" } }"#,
        )
        .unwrap();

        let service = ConfigService::new_and_load(config_path.clone()).await.unwrap();
        let config = service.get_config_async().await;
        assert_eq!(config.key_generator.total_time_secs, 10);
        assert_eq!(config.key_generator.log_dir, PathBuf::from("my_logs"));

        // 修复后的配置已写回文件
        let saved: AppConfig = serde_json::from_str(&fs::read_to_string(&config_path).unwrap()).unwrap();
        assert_eq!(saved, config);
    }

    #[tokio::test]
    async fn test_save_config_async() {
        let (_temp_dir, config_path) = create_temp_config_path();

        let service = ConfigService::new(config_path.clone()).unwrap();

        let handle = service.save_config_async();
        handle.await.unwrap().unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        let saved_config: AppConfig = serde_json::from_str(&content).unwrap();
        assert_eq!(saved_config, AppConfig::default());
    }

    #[tokio::test]
    async fn test_update_config() {
        let (_temp_dir, config_path) = create_temp_config_path();

        let service = ConfigService::new(config_path.clone()).unwrap();

        service
            .update_config(|config| {
                config.countdown.beep.frequency_hz = 880;
            })
            .await
            .unwrap();

        assert_eq!(service.get_config_async().await.countdown.beep.frequency_hz, 880);

        // 由于启用了自动保存，等待一下让异步保存完成
        sleep(Duration::from_millis(100)).await;
        assert!(config_path.exists());
    }

    #[tokio::test]
    async fn test_config_validation_during_update() {
        let (_temp_dir, config_path) = create_temp_config_path();

        let service = ConfigService::new(config_path).unwrap();

        let result = service
            .update_config(|config| {
                config.countdown.tick_interval_ms = 0;
            })
            .await;

        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
        // 配置应该保持原样
        assert_eq!(service.get_config_async().await.countdown.tick_interval_ms, 10);
    }

    #[tokio::test]
    async fn test_reset_to_default() {
        let (_temp_dir, config_path) = create_temp_config_path();

        let service = ConfigService::new(config_path.clone()).unwrap();
        service
            .update_config(|config| {
                config.key_generator.total_time_secs = 30;
            })
            .await
            .unwrap();

        service.reset_to_default().await.unwrap();

        assert_eq!(service.get_config_async().await, AppConfig::default());
        assert!(config_path.exists());
    }

    #[tokio::test]
    async fn test_config_change_events() {
        let (_temp_dir, config_path) = create_temp_config_path();

        let mut service = ConfigService::new(config_path).unwrap();
        service.set_auto_save(false);
        let mut receiver = service.subscribe_changes();

        // 文件不存在：先保存默认配置，再发送Loaded事件
        service.load_config().await.unwrap();
        assert!(matches!(receiver.recv().await.unwrap(), ConfigChangeEvent::Saved));
        assert!(matches!(receiver.recv().await.unwrap(), ConfigChangeEvent::Loaded));

        service
            .update_config(|config| {
                config.countdown.beep.enabled = false;
            })
            .await
            .unwrap();
        assert!(matches!(receiver.recv().await.unwrap(), ConfigChangeEvent::Updated));
    }

    #[tokio::test]
    async fn test_auto_save_control() {
        let (_temp_dir, config_path) = create_temp_config_path();

        let mut service = ConfigService::new(config_path.clone()).unwrap();
        service.set_auto_save(false);
        assert!(!service.is_auto_save_enabled());

        service
            .update_config(|config| {
                config.countdown.bar_width = 400;
            })
            .await
            .unwrap();

        // 由于禁用了自动保存，文件不应该存在
        sleep(Duration::from_millis(100)).await;
        assert!(!config_path.exists());

        service.save_config().await.unwrap();
        assert!(config_path.exists());
    }

    #[tokio::test]
    async fn test_update_key_generator_settings_creates_log_dir() {
        let (temp_dir, config_path) = create_temp_config_path();
        let log_dir = temp_dir.path().join("key_logs");

        let service = ConfigService::new(config_path).unwrap();
        service
            .update_key_generator_settings(5, log_dir.clone())
            .await
            .unwrap();

        assert!(log_dir.is_dir());
        let config = service.get_config_async().await;
        assert_eq!(config.key_generator.total_time_secs, 5);
        assert_eq!(config.key_generator.log_dir, log_dir);
    }

    #[tokio::test]
    async fn test_update_key_generator_settings_rejects_out_of_range_time() {
        let (temp_dir, config_path) = create_temp_config_path();

        let service = ConfigService::new(config_path).unwrap();
        let result = service
            .update_key_generator_settings(0, temp_dir.path().join("unused"))
            .await;

        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
        assert!(!temp_dir.path().join("unused").exists());

        let result = service
            .update_key_generator_settings(MAX_TOTAL_TIME_SECS + 1, temp_dir.path().join("unused"))
            .await;
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
        assert!(!temp_dir.path().join("unused").exists());
    }

    #[tokio::test]
    async fn test_get_config_blocking_waits_for_writer() {
        let (temp_dir, config_path) = create_temp_config_path();
        let service = Arc::new(ConfigService::new(config_path).unwrap());

        let mut guard = service.config.write().await;
        guard.key_generator.log_dir = temp_dir.path().join("custom_logs");

        let reader = Arc::clone(&service);
        let handle = tokio::task::spawn_blocking(move || reader.get_config_blocking());

        sleep(Duration::from_millis(50)).await;
        // 写锁未释放时同步读取拿不到配置
        assert_eq!(service.get_config(), AppConfig::default());
        drop(guard);

        let config = handle.await.unwrap();
        assert_eq!(config.key_generator.log_dir, temp_dir.path().join("custom_logs"));
    }

    #[tokio::test]
    async fn test_update_last_save_dir() {
        let (temp_dir, config_path) = create_temp_config_path();

        let service = ConfigService::new(config_path).unwrap();
        service
            .update_last_save_dir(temp_dir.path().to_path_buf())
            .await
            .unwrap();

        assert_eq!(
            service.get_config_async().await.key_generator.last_save_dir,
            Some(temp_dir.path().to_path_buf())
        );
    }
}
