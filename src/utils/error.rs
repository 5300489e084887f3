//! 统一错误处理系统
//!
//! 提供统一的错误类型定义、错误转换和错误信息格式化功能

use thiserror::Error;
use std::fmt;
use std::error::Error as StdError;

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// 信息级别 - 不影响功能
    Info,
    /// 警告级别 - 可能影响功能但可以继续
    Warning,
    /// 错误级别 - 影响功能但不致命
    Error,
    /// 致命级别 - 导致程序无法继续
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// 应用程序主要错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("倒计时错误: {0}")]
    Timer(#[from] TimerError),

    #[error("密钥生成错误: {0}")]
    KeyGen(#[from] KeyGenError),

    #[error("文件存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("UI错误: {0}")]
    UI(String),

    #[error("系统错误: {0}")]
    System(String),
}

impl AppError {
    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Config(e) => e.severity(),
            AppError::Timer(e) => e.severity(),
            AppError::KeyGen(e) => e.severity(),
            AppError::Storage(e) => e.severity(),
            AppError::UI(_) => ErrorSeverity::Error,
            AppError::System(_) => ErrorSeverity::Fatal,
        }
    }

    /// 获取错误的组件名称
    pub fn component(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::Timer(_) => "Timer",
            AppError::KeyGen(_) => "KeyGen",
            AppError::Storage(_) => "Storage",
            AppError::UI(_) => "UI",
            AppError::System(_) => "System",
        }
    }

    /// 格式化错误信息
    pub fn format_error(&self) -> String {
        format!("[{}] {}: {}", self.severity(), self.component(), self)
    }

    /// 创建系统错误
    pub fn system_error(message: &str) -> Self {
        AppError::System(message.to_string())
    }
}

/// 配置相关错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置文件格式错误: {0}")]
    ParseError(String),

    #[error("配置保存失败: {0}")]
    SaveError(String),

    #[error("配置验证失败: {0}")]
    ValidationError(String),

    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    SerializationError(String),

    #[error("配置路径无效: {0}")]
    InvalidPath(String),
}

impl ConfigError {
    /// 获取错误严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ConfigError::ParseError(_) => ErrorSeverity::Error,
            ConfigError::SaveError(_) => ErrorSeverity::Error,
            ConfigError::ValidationError(_) => ErrorSeverity::Warning,
            ConfigError::IoError(_) => ErrorSeverity::Error,
            ConfigError::SerializationError(_) => ErrorSeverity::Error,
            ConfigError::InvalidPath(_) => ErrorSeverity::Error,
        }
    }

    /// 创建验证错误
    pub fn validation_error(message: &str) -> Self {
        ConfigError::ValidationError(message.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// 倒计时相关错误
#[derive(Debug, Error, PartialEq)]
pub enum TimerError {
    #[error("输入无效: {0}")]
    InvalidInput(String),
}

impl TimerError {
    /// 获取错误严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TimerError::InvalidInput(_) => ErrorSeverity::Warning,
        }
    }

    /// 创建输入错误
    pub fn invalid_input(input: &str) -> Self {
        TimerError::InvalidInput(input.to_string())
    }
}

/// 密钥生成相关错误
#[derive(Debug, Error, PartialEq)]
pub enum KeyGenError {
    #[error("长度必须在1到{max}之间")]
    InvalidLength { max: usize },

    #[error("请输入有效的整数")]
    NotANumber,

    #[error("时间必须大于0")]
    InvalidDuration,

    #[error("时间不能超过{max}秒")]
    DurationTooLong { max: u64 },

    #[error("密钥正在生成中")]
    AlreadyRunning,

    #[error("生成线程异常: {0}")]
    WorkerFailed(String),
}

impl KeyGenError {
    /// 获取错误严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            KeyGenError::InvalidLength { .. } => ErrorSeverity::Warning,
            KeyGenError::NotANumber => ErrorSeverity::Warning,
            KeyGenError::InvalidDuration => ErrorSeverity::Warning,
            KeyGenError::DurationTooLong { .. } => ErrorSeverity::Warning,
            KeyGenError::AlreadyRunning => ErrorSeverity::Info,
            KeyGenError::WorkerFailed(_) => ErrorSeverity::Error,
        }
    }

    /// 创建线程错误
    pub fn worker_failed(message: &str) -> Self {
        KeyGenError::WorkerFailed(message.to_string())
    }
}

/// 密钥文件存储相关错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("请先生成一个密钥")]
    EmptyKey,

    #[error("保存已取消")]
    Cancelled,

    #[error("写入文件失败 {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// 获取错误严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StorageError::EmptyKey => ErrorSeverity::Info,
            StorageError::Cancelled => ErrorSeverity::Info,
            StorageError::WriteFailed { .. } => ErrorSeverity::Error,
            StorageError::IoError(_) => ErrorSeverity::Error,
        }
    }

    /// 创建写入错误
    pub fn write_failed(path: &std::path::Path, source: std::io::Error) -> Self {
        StorageError::WriteFailed {
            path: path.display().to_string(),
            source,
        }
    }
}

/// 错误信息格式化器
pub struct ErrorFormatter;

impl ErrorFormatter {
    /// 格式化用户友好的错误信息（显示在窗口内）
    pub fn format_user_message(error: &AppError) -> String {
        match error {
            AppError::Timer(TimerError::InvalidInput(_)) => "输入无效".to_string(),
            AppError::KeyGen(e @ (KeyGenError::InvalidLength { .. }
                | KeyGenError::NotANumber
                | KeyGenError::InvalidDuration
                | KeyGenError::DurationTooLong { .. })) => format!("输入无效: {}", e),
            AppError::KeyGen(e) => e.to_string(),
            AppError::Storage(StorageError::EmptyKey) => "请先生成一个密钥".to_string(),
            AppError::Storage(StorageError::Cancelled) => "保存已取消".to_string(),
            AppError::Storage(e) => format!("保存失败: {}", e),
            AppError::Config(e) => format!("配置错误: {}", e),
            AppError::UI(msg) => format!("界面错误: {}", msg),
            AppError::System(msg) => format!("系统错误: {}", msg),
        }
    }

    /// 格式化技术错误信息（写入日志）
    pub fn format_technical_message(error: &AppError) -> String {
        error.format_error()
    }

    /// 格式化错误链
    pub fn format_error_chain(error: &AppError) -> Vec<String> {
        let mut chain = vec![error.to_string()];
        let mut source = StdError::source(error);

        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }

        chain
    }
}

/// 错误报告器
pub struct ErrorReporter;

impl ErrorReporter {
    /// 报告错误到日志系统
    pub fn report_to_log(error: &AppError) {
        let technical_msg = ErrorFormatter::format_technical_message(error);

        match error.severity() {
            ErrorSeverity::Info => log::info!("{}", technical_msg),
            ErrorSeverity::Warning => log::warn!("{}", technical_msg),
            ErrorSeverity::Error => log::error!("{}", technical_msg),
            ErrorSeverity::Fatal => log::error!("FATAL: {}", technical_msg),
        }

        // 记录错误链
        let chain = ErrorFormatter::format_error_chain(error);
        if chain.len() > 1 {
            log::debug!("Error chain: {:#?}", chain);
        }
    }

    /// 报告错误到UI系统
    pub fn report_to_ui(error: &AppError) -> String {
        ErrorReporter::report_to_log(error);
        ErrorFormatter::format_user_message(error)
    }
}

/// 结果类型别名
pub type AppResult<T> = Result<T, AppError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type TimerResult<T> = Result<T, TimerError>;
pub type KeyGenResult<T> = Result<T, KeyGenError>;
pub type StorageResult<T> = Result<T, StorageError>;

/// 扩展Result类型的便利方法
pub trait ResultExt<T, E> {
    /// 记录错误并继续
    fn log_error(self) -> Self;

    /// 转换为用户友好的错误消息
    fn to_user_error(self) -> Result<T, String>;
}

impl<T, E> ResultExt<T, E> for Result<T, E>
where
    E: Into<AppError> + std::fmt::Debug,
    for<'a> &'a E: Into<ErrorSeverity>,
{
    fn log_error(self) -> Self {
        if let Err(ref e) = self {
            let severity: ErrorSeverity = e.into();
            match severity {
                ErrorSeverity::Info => log::info!("{:?}", e),
                ErrorSeverity::Warning => log::warn!("{:?}", e),
                _ => log::error!("{:?}", e),
            }
        }
        self
    }

    fn to_user_error(self) -> Result<T, String> {
        self.map_err(|e| ErrorReporter::report_to_ui(&e.into()))
    }
}

impl From<&AppError> for ErrorSeverity {
    fn from(error: &AppError) -> Self {
        error.severity()
    }
}

impl From<&ConfigError> for ErrorSeverity {
    fn from(error: &ConfigError) -> Self {
        error.severity()
    }
}

impl From<&TimerError> for ErrorSeverity {
    fn from(error: &TimerError) -> Self {
        error.severity()
    }
}

impl From<&KeyGenError> for ErrorSeverity {
    fn from(error: &KeyGenError) -> Self {
        error.severity()
    }
}

impl From<&StorageError> for ErrorSeverity {
    fn from(error: &StorageError) -> Self {
        error.severity()
    }
}
