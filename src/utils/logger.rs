//! 日志系统工具

use log::LevelFilter;
use std::io::Write;

/// 初始化日志系统
///
/// 默认级别为 Info，可通过 `RUST_LOG` 环境变量覆盖。
/// 重复调用返回 `SetLoggerError` 而不会 panic。
pub fn init_logger() -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);

    // 环境变量优先于默认级别
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] [{}:{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init()
}
