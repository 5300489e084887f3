//! 系统相关工具函数

use std::path::PathBuf;

/// 应用程序目录名
pub const APP_DIR_NAME: &str = "countdown-keygen";

/// 获取应用程序配置目录
pub fn get_app_config_dir() -> Result<PathBuf, std::io::Error> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "无法获取系统配置目录"
        ))?;

    let app_dir = config_dir.join(APP_DIR_NAME);

    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir)
}

/// 获取配置文件路径，系统配置目录不可用时退回到当前目录
pub fn default_config_path() -> Result<PathBuf, std::io::Error> {
    match get_app_config_dir() {
        Ok(dir) => Ok(dir.join("config.json")),
        Err(e) => {
            log::warn!("无法使用系统配置目录: {}，改用当前目录", e);
            Ok(std::env::current_dir()?.join("config.json"))
        }
    }
}

/// 播放提示音（Windows）
#[cfg(windows)]
pub fn beep(frequency_hz: u32, duration_ms: u32) {
    use winapi::um::utilapiset::Beep;

    let ok = unsafe { Beep(frequency_hz, duration_ms) };
    if ok == 0 {
        log::warn!("播放提示音失败: {}Hz {}ms", frequency_hz, duration_ms);
    }
}

/// 播放提示音（非Windows，使用终端响铃）
#[cfg(not(windows))]
pub fn beep(frequency_hz: u32, duration_ms: u32) {
    use std::io::Write;

    log::debug!("终端响铃代替 {}Hz {}ms 提示音", frequency_hz, duration_ms);
    let mut stdout = std::io::stdout();
    if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
        log::warn!("播放提示音失败: {}", e);
    }
    std::thread::sleep(std::time::Duration::from_millis(u64::from(duration_ms)));
}

/// 在后台线程播放提示音，不阻塞 UI 事件循环
pub fn beep_async(frequency_hz: u32, duration_ms: u32) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || beep(frequency_hz, duration_ms))
}
