//! 随机密钥生成器
//!
//! 逐位生成数字密钥，可停止、初始化并保存到文本文件

use anyhow::Context;
use countdown_keygen::services::ConfigService;
use countdown_keygen::ui::KeyGeneratorApp;
use countdown_keygen::utils::{default_config_path, init_logger};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    init_logger().context("初始化日志失败")?;

    log::info!("正在启动随机密钥生成器...");

    let config_path = default_config_path().context("无法确定配置文件路径")?;
    let config_service = ConfigService::new_and_load(config_path)
        .await
        .context("加载配置失败")?;

    let app = KeyGeneratorApp::new(Arc::new(config_service), tokio::runtime::Handle::current())?;
    app.run().await?;

    log::info!("随机密钥生成器正常退出");
    Ok(())
}
