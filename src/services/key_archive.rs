//! 密钥存档服务
//!
//! 负责将密钥写入用户选择的文本文件，并在日志文件夹中追加保存记录

use crate::models::KeyGeneratorSettings;
use crate::utils::{StorageError, StorageResult};
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// 默认的密钥文件扩展名
pub const KEY_FILE_EXTENSION: &str = "txt";

/// 密钥存档
#[derive(Debug, Clone)]
pub struct KeyArchive {
    log_dir: PathBuf,
    log_file_name: String,
}

impl KeyArchive {
    /// 创建新的密钥存档
    pub fn new(log_dir: impl Into<PathBuf>, log_file_name: impl Into<String>) -> Self {
        Self {
            log_dir: log_dir.into(),
            log_file_name: log_file_name.into(),
        }
    }

    /// 根据密钥生成器配置创建
    pub fn from_settings(settings: &KeyGeneratorSettings) -> Self {
        Self::new(settings.log_dir.clone(), settings.log_file_name.clone())
    }

    /// 日志文件路径
    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file_name)
    }

    /// 确保日志文件夹存在
    pub async fn ensure_log_dir(&self) -> StorageResult<()> {
        if !self.log_dir.exists() {
            info!("创建日志文件夹: {:?}", self.log_dir);
        }
        fs::create_dir_all(&self.log_dir).await?;
        Ok(())
    }

    /// 保存密钥并记录日志，返回实际写入的路径
    pub async fn save_and_log(&self, key: &str, path: &Path) -> StorageResult<PathBuf> {
        let saved_path = self.save_key(key, path).await?;
        self.append_log(&saved_path).await?;
        Ok(saved_path)
    }

    /// 将原始密钥（不含空格）写入文件
    pub async fn save_key(&self, key: &str, path: &Path) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }

        let path = with_default_extension(path);
        fs::write(&path, key)
            .await
            .map_err(|e| StorageError::write_failed(&path, e))?;

        info!("密钥已保存到 {:?}", path);
        Ok(path)
    }

    /// 在日志文件中追加一行保存记录
    pub async fn append_log(&self, saved_path: &Path) -> StorageResult<()> {
        self.ensure_log_dir().await?;

        let log_path = self.log_file_path();
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .await
            .map_err(|e| StorageError::write_failed(&log_path, e))?;

        let line = format!("密钥已保存到: {}\n", saved_path.display());
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StorageError::write_failed(&log_path, e))?;
        file.flush().await?;

        debug!("已写入保存日志: {:?}", log_path);
        Ok(())
    }
}

/// 没有扩展名时补上 `.txt`
pub fn with_default_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(KEY_FILE_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_archive(temp_dir: &TempDir) -> KeyArchive {
        KeyArchive::new(temp_dir.path().join("logs"), "key_generator_log.txt")
    }

    #[test]
    fn test_with_default_extension() {
        assert_eq!(with_default_extension(Path::new("key")), PathBuf::from("key.txt"));
        assert_eq!(with_default_extension(Path::new("key.txt")), PathBuf::from("key.txt"));
        assert_eq!(with_default_extension(Path::new("key.dat")), PathBuf::from("key.dat"));
    }

    #[tokio::test]
    async fn test_save_key_writes_raw_digits() {
        let temp_dir = TempDir::new().expect("创建临时目录失败");
        let archive = create_archive(&temp_dir);

        let saved = archive
            .save_key("12345678", &temp_dir.path().join("my_key"))
            .await
            .unwrap();

        assert_eq!(saved, temp_dir.path().join("my_key.txt"));
        let content = std::fs::read_to_string(&saved).unwrap();
        assert_eq!(content, "12345678");
    }

    #[tokio::test]
    async fn test_save_empty_key() {
        let temp_dir = TempDir::new().expect("创建临时目录失败");
        let archive = create_archive(&temp_dir);

        let result = archive.save_key("", &temp_dir.path().join("key.txt")).await;
        assert!(matches!(result, Err(StorageError::EmptyKey)));
        assert!(!temp_dir.path().join("key.txt").exists());
    }

    #[tokio::test]
    async fn test_save_and_log_appends_lines() {
        let temp_dir = TempDir::new().expect("创建临时目录失败");
        let archive = create_archive(&temp_dir);

        let first = archive
            .save_and_log("1111", &temp_dir.path().join("a.txt"))
            .await
            .unwrap();
        let second = archive
            .save_and_log("2222", &temp_dir.path().join("b.txt"))
            .await
            .unwrap();

        let log = std::fs::read_to_string(archive.log_file_path()).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("密钥已保存到: {}", first.display()));
        assert_eq!(lines[1], format!("密钥已保存到: {}", second.display()));
    }

    #[tokio::test]
    async fn test_save_to_missing_directory_fails() {
        let temp_dir = TempDir::new().expect("创建临时目录失败");
        let archive = create_archive(&temp_dir);

        let result = archive
            .save_key("1234", &temp_dir.path().join("missing").join("key.txt"))
            .await;
        assert!(matches!(result, Err(StorageError::WriteFailed { .. })));
    }

    #[tokio::test]
    async fn test_ensure_log_dir() {
        let temp_dir = TempDir::new().expect("创建临时目录失败");
        let archive = KeyArchive::from_settings(&KeyGeneratorSettings {
            log_dir: temp_dir.path().join("nested").join("logs"),
            ..KeyGeneratorSettings::default()
        });

        archive.ensure_log_dir().await.unwrap();
        assert!(temp_dir.path().join("nested").join("logs").is_dir());
        assert_eq!(
            archive.log_file_path(),
            temp_dir.path().join("nested").join("logs").join("key_generator_log.txt")
        );
    }
}
