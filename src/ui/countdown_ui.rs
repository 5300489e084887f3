//! 倒计时窗口
//!
//! 将 `CountdownTimer` 接到 Slint 窗口上，由 `slint::Timer` 周期性驱动

use super::CountdownWindow;
use crate::models::{AppConfig, BeepSettings, RgbColor, TimerSnapshot, TimerStatus};
use crate::services::{CountdownTimer, TickOutcome};
use crate::utils::*;
use log::{debug, info};
use slint::ComponentHandle;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

/// 事件循环线程内共享的倒计时上下文
struct CountdownContext {
    ui: slint::Weak<CountdownWindow>,
    timer: RefCell<CountdownTimer>,
    ticker: slint::Timer,
    last_tick: Cell<Instant>,
    beep: BeepSettings,
}

impl CountdownContext {
    /// 把快照渲染到窗口
    fn render(&self, snapshot: &TimerSnapshot) {
        if let Some(ui) = self.ui.upgrade() {
            ui.set_time_text(snapshot.text.as_str().into());
            ui.set_bar_fill_width(snapshot.health.width as f32);
            ui.set_bar_color(to_slint_color(snapshot.health.color));
            ui.set_bar_label(snapshot.health.label.as_str().into());
        }
    }

    fn show_message(&self, message: &str) {
        if let Some(ui) = self.ui.upgrade() {
            ui.set_time_text(message.into());
        }
    }

    /// 开始周期刷新
    fn schedule_ticks(self: &Rc<Self>) {
        self.last_tick.set(Instant::now());
        let interval = self.timer.borrow().tick_interval();
        let weak = Rc::downgrade(self);
        self.ticker.start(slint::TimerMode::Repeated, interval, move || {
            if let Some(context) = weak.upgrade() {
                context.on_tick();
            }
        });
    }

    fn on_tick(&self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick.replace(now));

        let outcome = self.timer.borrow_mut().tick(elapsed);
        match outcome {
            TickOutcome::Idle => self.ticker.stop(),
            TickOutcome::Continue(snapshot) => self.render(&snapshot),
            TickOutcome::Expired(snapshot) => {
                self.ticker.stop();
                self.render(&snapshot);
                self.play_expiry_sound();
            }
        }
    }

    fn on_start(self: &Rc<Self>, input: &str) {
        let result = self.timer.borrow_mut().start(input);
        match result {
            Ok(snapshot) => {
                self.render(&snapshot);
                if snapshot.status == TimerStatus::Expired {
                    self.ticker.stop();
                    self.play_expiry_sound();
                } else {
                    self.schedule_ticks();
                }
            }
            Err(e) => {
                self.ticker.stop();
                let message = ErrorReporter::report_to_ui(&AppError::from(e));
                self.show_message(&message);
            }
        }
    }

    fn on_pause(&self) {
        if self.timer.borrow_mut().pause() {
            self.ticker.stop();
        }
    }

    fn on_resume(self: &Rc<Self>) {
        if self.timer.borrow_mut().resume() {
            self.schedule_ticks();
        }
    }

    fn on_reset(&self) {
        self.ticker.stop();
        let snapshot = self.timer.borrow_mut().reset();
        self.render(&snapshot);
    }

    fn play_expiry_sound(&self) {
        if self.beep.enabled {
            debug!("播放到期提示音");
            let _ = beep_async(self.beep.frequency_hz, self.beep.duration_ms);
        }
    }
}

/// 倒计时应用
pub struct CountdownApp {
    /// Slint UI 句柄
    ui_handle: CountdownWindow,
    /// 回调共享的上下文
    context: Rc<CountdownContext>,
}

impl CountdownApp {
    /// 创建新的倒计时应用实例
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        info!("初始化倒计时窗口");

        let ui_handle = CountdownWindow::new()
            .map_err(|e| AppError::UI(format!("创建UI失败: {}", e)))?;

        let settings = config.countdown.clone();
        ui_handle.set_bar_width(settings.bar_width as f32);

        let context = Rc::new(CountdownContext {
            ui: ui_handle.as_weak(),
            beep: settings.beep.clone(),
            timer: RefCell::new(CountdownTimer::new(settings)),
            ticker: slint::Timer::default(),
            last_tick: Cell::new(Instant::now()),
        });

        let app = Self { ui_handle, context };
        app.setup_ui_callbacks();
        app.context.render(&app.context.timer.borrow().snapshot());

        Ok(app)
    }

    /// 设置UI回调
    fn setup_ui_callbacks(&self) {
        let context = Rc::downgrade(&self.context);
        self.ui_handle.on_start_clicked(move |input| {
            if let Some(context) = context.upgrade() {
                context.on_start(input.as_str());
            }
        });

        let context = Rc::downgrade(&self.context);
        self.ui_handle.on_pause_clicked(move || {
            if let Some(context) = context.upgrade() {
                context.on_pause();
            }
        });

        let context = Rc::downgrade(&self.context);
        self.ui_handle.on_resume_clicked(move || {
            if let Some(context) = context.upgrade() {
                context.on_resume();
            }
        });

        let context = Rc::downgrade(&self.context);
        self.ui_handle.on_reset_clicked(move || {
            if let Some(context) = context.upgrade() {
                context.on_reset();
            }
        });
    }

    /// 显示窗口并运行事件循环，窗口关闭后返回
    pub fn run(&self) -> AppResult<()> {
        self.ui_handle.show()
            .map_err(|e| AppError::UI(format!("显示窗口失败: {}", e)))?;

        info!("倒计时窗口已显示，启动事件循环");
        slint::run_event_loop()
            .map_err(|e| AppError::UI(format!("事件循环失败: {}", e)))?;

        self.context.ticker.stop();
        Ok(())
    }

    /// 获取UI句柄
    pub fn ui_handle(&self) -> &CountdownWindow {
        &self.ui_handle
    }
}

/// 转换为 Slint 颜色
pub fn to_slint_color(color: RgbColor) -> slint::Color {
    slint::Color::from_rgb_u8(color.red, color.green, color.blue)
}
