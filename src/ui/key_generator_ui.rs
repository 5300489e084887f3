//! 随机密钥生成器窗口
//!
//! 生成线程只发送事件，由转发线程投递到 Slint 事件循环后再更新界面

use super::{KeyGeneratorWindow, SettingsWindow};
use crate::models::{format_key, parse_key_length, parse_total_time_secs, GenerationState};
use crate::services::*;
use crate::utils::*;
use log::{debug, error, info, warn};
use slint::ComponentHandle;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// 密钥生成器应用
pub struct KeyGeneratorApp {
    /// 主窗口句柄
    ui_handle: KeyGeneratorWindow,
    /// 设置窗口句柄
    settings_window: SettingsWindow,
    /// 配置管理服务
    config_service: Arc<ConfigService>,
    /// 密钥生成器
    generator: Arc<Mutex<KeyGenerator>>,
    /// tokio 运行时句柄，用于在 UI 回调中执行异步任务
    runtime: tokio::runtime::Handle,
}

impl KeyGeneratorApp {
    /// 创建新的密钥生成器应用实例
    pub fn new(config_service: Arc<ConfigService>, runtime: tokio::runtime::Handle) -> AppResult<Self> {
        info!("初始化密钥生成器窗口");

        let ui_handle = KeyGeneratorWindow::new()
            .map_err(|e| AppError::UI(format!("创建UI失败: {}", e)))?;
        let settings_window = SettingsWindow::new()
            .map_err(|e| AppError::UI(format!("创建设置窗口失败: {}", e)))?;

        Ok(Self {
            ui_handle,
            settings_window,
            config_service,
            generator: Arc::new(Mutex::new(KeyGenerator::new())),
            runtime,
        })
    }

    /// 启动应用程序
    pub async fn run(&self) -> AppResult<()> {
        self.setup_ui_callbacks();
        self.spawn_event_forwarder()?;

        self.ui_handle.show()
            .map_err(|e| AppError::UI(format!("显示窗口失败: {}", e)))?;

        info!("密钥生成器窗口已显示，启动事件循环");
        slint::run_event_loop()
            .map_err(|e| AppError::UI(format!("事件循环失败: {}", e)))?;

        lock_generator(&self.generator).stop();
        self.save_config_on_exit().await;

        Ok(())
    }

    /// 把生成事件转发到 UI 线程
    fn spawn_event_forwarder(&self) -> AppResult<()> {
        let receiver = lock_generator(&self.generator).subscribe();
        let generator = Arc::clone(&self.generator);
        let ui_weak = self.ui_handle.as_weak();

        std::thread::Builder::new()
            .name("key-event-forwarder".to_string())
            .spawn(move || {
                for event in receiver.iter() {
                    let generator = Arc::clone(&generator);
                    let ui_weak = ui_weak.clone();
                    let delivered = slint::invoke_from_event_loop(move || {
                        // 忽略已停止或已初始化的旧会话
                        if lock_generator(&generator).session() != Some(event.session()) {
                            debug!("忽略过期会话事件: {}", event.session());
                            return;
                        }
                        if let Some(ui) = ui_weak.upgrade() {
                            apply_generation_event(&ui, &event);
                        }
                    });
                    if delivered.is_err() {
                        debug!("事件循环已退出，停止转发生成事件");
                        break;
                    }
                }
            })
            .map_err(|e| AppError::system_error(&format!("创建事件转发线程失败: {}", e)))?;

        Ok(())
    }

    /// 设置UI回调
    fn setup_ui_callbacks(&self) {
        debug!("设置UI回调函数");

        // ===== 生成密钥 =====
        let generator = Arc::clone(&self.generator);
        let config_service = Arc::clone(&self.config_service);
        let ui_weak = self.ui_handle.as_weak();
        self.ui_handle.on_generate_clicked(move |input| {
            let Some(ui) = ui_weak.upgrade() else { return };

            let total_time_secs = config_service.get_config().key_generator.total_time_secs;
            let result = parse_key_length(input.as_str())
                .and_then(|length| {
                    lock_generator(&generator).start(length, Duration::from_secs(total_time_secs))
                })
                .to_user_error();

            match result {
                Ok(session) => {
                    info!("用户开始生成密钥，会话 {}", session);
                    ui.set_generating(true);
                }
                Err(message) => ui.set_key_text(message.into()),
            }
        });

        // ===== 停止 =====
        let generator = Arc::clone(&self.generator);
        self.ui_handle.on_stop_clicked(move || {
            info!("用户请求停止生成");
            lock_generator(&generator).stop();
        });

        // ===== 初始化 =====
        let generator = Arc::clone(&self.generator);
        let ui_weak = self.ui_handle.as_weak();
        self.ui_handle.on_reset_clicked(move || {
            lock_generator(&generator).reset();
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_key_text("".into());
                ui.set_progress(0.0);
                ui.set_progress_visible(false);
                ui.set_length_input("".into());
                ui.set_generating(false);
            }
        });

        // ===== 保存密钥 =====
        let generator = Arc::clone(&self.generator);
        let config_service = Arc::clone(&self.config_service);
        let runtime = self.runtime.clone();
        let ui_weak = self.ui_handle.as_weak();
        self.ui_handle.on_save_clicked(move || {
            let key = lock_generator(&generator).current_key();
            if key.is_empty() {
                if let Some(ui) = ui_weak.upgrade() {
                    let message = ErrorReporter::report_to_ui(&StorageError::EmptyKey.into());
                    ui.set_key_text(message.into());
                }
                return;
            }

            let config_service = Arc::clone(&config_service);
            let runtime = runtime.clone();
            let ui_weak = ui_weak.clone();
            // 文件对话框会阻塞，放到独立线程
            std::thread::spawn(move || {
                let message = save_key_with_dialog(&key, &config_service, &runtime);
                let _ = slint::invoke_from_event_loop(move || {
                    if let Some(ui) = ui_weak.upgrade() {
                        ui.set_key_text(message.into());
                    }
                });
            });
        });

        // ===== 设置 =====
        let config_service = Arc::clone(&self.config_service);
        let settings_weak = self.settings_window.as_weak();
        self.ui_handle.on_settings_clicked(move || {
            let Some(settings_window) = settings_weak.upgrade() else { return };
            let config = config_service.get_config();
            settings_window.set_total_time_input(config.key_generator.total_time_secs.to_string().into());
            settings_window.set_log_dir_input(config.key_generator.log_dir.display().to_string().into());
            if let Err(e) = settings_window.show() {
                error!("显示设置窗口失败: {}", e);
            }
        });

        self.setup_settings_callbacks();

        debug!("UI回调函数设置完成");
    }

    /// 设置窗口回调
    fn setup_settings_callbacks(&self) {
        let config_service = Arc::clone(&self.config_service);
        let runtime = self.runtime.clone();
        let ui_weak = self.ui_handle.as_weak();
        let settings_weak = self.settings_window.as_weak();
        self.settings_window.on_save_clicked(move |total_time_input, log_dir_input| {
            let total_time_secs = match parse_total_time_secs(total_time_input.as_str()).to_user_error() {
                Ok(secs) => secs,
                Err(message) => {
                    if let Some(ui) = ui_weak.upgrade() {
                        ui.set_key_text(message.into());
                    }
                    return;
                }
            };
            let log_dir = PathBuf::from(log_dir_input.trim());

            let config_service = Arc::clone(&config_service);
            let ui_weak = ui_weak.clone();
            let settings_weak = settings_weak.clone();
            runtime.spawn(async move {
                let result = config_service
                    .update_key_generator_settings(total_time_secs, log_dir)
                    .await;

                let result = result.to_user_error();
                let _ = slint::invoke_from_event_loop(move || match result {
                    Ok(()) => {
                        info!("设置已保存");
                        if let Some(settings_window) = settings_weak.upgrade() {
                            let _ = settings_window.hide();
                        }
                    }
                    Err(message) => {
                        if let Some(ui) = ui_weak.upgrade() {
                            ui.set_key_text(message.into());
                        }
                    }
                });
            });
        });
    }

    /// 退出时保存配置
    async fn save_config_on_exit(&self) {
        info!("程序退出，保存配置");

        if let Err(e) = self.config_service.save_config().await {
            warn!("保存配置失败: {}", e);
        }
    }

    /// 获取UI句柄
    pub fn ui_handle(&self) -> &KeyGeneratorWindow {
        &self.ui_handle
    }
}

/// 根据生成事件更新界面
fn apply_generation_event(ui: &KeyGeneratorWindow, event: &GenerationEvent) {
    match event {
        GenerationEvent::Started { total, .. } => {
            debug!("开始生成 {} 位密钥", total);
            ui.set_key_text("".into());
            ui.set_progress(0.0);
            ui.set_progress_visible(true);
            ui.set_generating(true);
        }
        GenerationEvent::Progress { key, progress, .. } => {
            ui.set_key_text(format_key(key).into());
            ui.set_progress(progress.fraction());
        }
        GenerationEvent::Finished { state, key, .. } => {
            ui.set_generating(false);
            if *state == GenerationState::Stopped {
                info!("密钥生成已停止，保留已生成的 {} 位", key.len());
            }
        }
    }
}

/// 弹出保存对话框并写入密钥，返回要显示的提示
fn save_key_with_dialog(
    key: &str,
    config_service: &ConfigService,
    runtime: &tokio::runtime::Handle,
) -> String {
    // 对话框线程可以阻塞，等待正在进行的配置写入完成
    let settings = config_service.get_config_blocking().key_generator;

    let mut dialog = rfd::FileDialog::new()
        .set_title("保存密钥")
        .set_file_name("key.txt")
        .add_filter("Text files", &[KEY_FILE_EXTENSION]);
    if let Some(dir) = &settings.last_save_dir {
        dialog = dialog.set_directory(dir);
    }

    let Some(path) = dialog.save_file() else {
        info!("用户取消保存");
        return ErrorReporter::report_to_ui(&StorageError::Cancelled.into());
    };

    let archive = KeyArchive::from_settings(&settings);
    match runtime.block_on(archive.save_and_log(key, &path)).to_user_error() {
        Ok(saved_path) => {
            if let Some(dir) = saved_path.parent() {
                let dir = dir.to_path_buf();
                // 记录失败不影响保存结果
                let _ = runtime.block_on(config_service.update_last_save_dir(dir)).log_error();
            }
            format!("密钥已保存到 {}", saved_path.display())
        }
        Err(message) => message,
    }
}

fn lock_generator(generator: &Mutex<KeyGenerator>) -> MutexGuard<'_, KeyGenerator> {
    generator.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
