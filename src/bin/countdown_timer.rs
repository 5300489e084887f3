//! 倒计时
//!
//! 带血条显示的倒计时器，时间到时播放提示音

use anyhow::Context;
use countdown_keygen::services::ConfigService;
use countdown_keygen::ui::CountdownApp;
use countdown_keygen::utils::{default_config_path, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    init_logger().context("初始化日志失败")?;

    log::info!("正在启动倒计时...");

    let config_path = default_config_path().context("无法确定配置文件路径")?;
    let config_service = ConfigService::new_and_load(config_path)
        .await
        .context("加载配置失败")?;
    let config = config_service.get_config_async().await;

    let app = CountdownApp::new(&config)?;
    app.run()?;

    log::info!("倒计时正常退出");
    Ok(())
}
