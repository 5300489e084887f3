//! 倒计时服务
//!
//! 负责开始、暂停、继续、还原与逐帧扣减倒计时，
//! UI 通过 `slint::Timer` 定时调用 `tick` 驱动

use crate::models::{parse_seconds_to_ms, CountdownSettings, CountdownState, TimerSnapshot, TimerStatus};
use crate::utils::{TimerError, TimerResult};
use log::{debug, info};
use std::time::Duration;

/// 单次刷新的结果
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// 未运行（暂停、空闲或已到期），无需刷新
    Idle,
    /// 继续倒计时
    Continue(TimerSnapshot),
    /// 本次刷新时到期，只会报告一次
    Expired(TimerSnapshot),
}

/// 倒计时器
pub struct CountdownTimer {
    state: CountdownState,
    settings: CountdownSettings,
}

impl CountdownTimer {
    /// 使用给定配置创建倒计时器
    pub fn new(settings: CountdownSettings) -> Self {
        Self {
            state: CountdownState::new(),
            settings,
        }
    }

    /// 根据输入的秒数开始倒计时，正在运行时会重新开始
    pub fn start(&mut self, input: &str) -> TimerResult<TimerSnapshot> {
        let duration_ms = parse_seconds_to_ms(input)
            .ok_or_else(|| TimerError::invalid_input(input))?;

        self.state.begin(duration_ms);
        info!("开始倒计时: {} 毫秒", duration_ms);

        Ok(self.snapshot())
    }

    /// 暂停，仅在运行中有效，返回是否真正暂停
    pub fn pause(&mut self) -> bool {
        if !self.state.is_running() {
            debug!("倒计时未运行，忽略暂停请求");
            return false;
        }
        self.state.status = TimerStatus::Paused;
        info!("倒计时已暂停，剩余 {} 毫秒", self.state.time_left_ms);
        true
    }

    /// 继续，仅在暂停时有效，返回是否真正恢复
    pub fn resume(&mut self) -> bool {
        if !self.state.is_paused() {
            debug!("倒计时未暂停，忽略继续请求");
            return false;
        }
        self.state.status = TimerStatus::Running;
        info!("倒计时继续，剩余 {} 毫秒", self.state.time_left_ms);
        true
    }

    /// 还原到初始状态
    pub fn reset(&mut self) -> TimerSnapshot {
        self.state = CountdownState::new();
        info!("倒计时已还原");
        self.snapshot()
    }

    /// 扣减经过的时间
    pub fn tick(&mut self, elapsed: Duration) -> TickOutcome {
        if !self.state.is_running() {
            return TickOutcome::Idle;
        }

        let elapsed_ms = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
        if self.state.consume(elapsed_ms) {
            info!("倒计时结束");
            TickOutcome::Expired(self.snapshot())
        } else {
            TickOutcome::Continue(self.snapshot())
        }
    }

    /// 当前快照
    pub fn snapshot(&self) -> TimerSnapshot {
        self.state.snapshot(f64::from(self.settings.bar_width))
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status
    }

    pub fn time_left_ms(&self) -> i64 {
        self.state.time_left_ms
    }

    /// 刷新间隔
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.settings.tick_interval_ms)
    }

    pub fn settings(&self) -> &CountdownSettings {
        &self.settings
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(CountdownSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RgbColor, EXPIRED_TEXT, IDLE_TIME_TEXT};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_start_sets_full_bar() {
        let mut timer = CountdownTimer::default();
        let snapshot = timer.start("2.5").unwrap();

        assert_eq!(snapshot.status, TimerStatus::Running);
        assert_eq!(snapshot.time_left_ms, 2_500);
        assert_eq!(snapshot.text, "00:00:02.50");
        assert_eq!(snapshot.health.label, "100%");
        assert_eq!(snapshot.health.width, 300.0);
    }

    #[test]
    fn test_invalid_input() {
        let mut timer = CountdownTimer::default();
        assert_eq!(
            timer.start("ten"),
            Err(TimerError::InvalidInput("ten".to_string()))
        );
        assert!(timer.start("-1").is_err());
        assert_eq!(timer.status(), TimerStatus::Idle);
    }

    #[test]
    fn test_tick_until_expired() {
        let mut timer = CountdownTimer::default();
        timer.start("0.03").unwrap();

        match timer.tick(ms(10)) {
            TickOutcome::Continue(snapshot) => {
                assert_eq!(snapshot.time_left_ms, 20);
                assert_eq!(snapshot.health.label, "66%");
            }
            other => panic!("期望继续倒计时, 实际: {:?}", other),
        }

        assert!(matches!(timer.tick(ms(10)), TickOutcome::Continue(_)));

        match timer.tick(ms(15)) {
            TickOutcome::Expired(snapshot) => {
                assert_eq!(snapshot.text, EXPIRED_TEXT);
                assert_eq!(snapshot.time_left_ms, 0);
                assert_eq!(snapshot.health.color, RgbColor::gradient(0.0));
            }
            other => panic!("期望到期, 实际: {:?}", other),
        }

        // 到期只报告一次
        assert_eq!(timer.tick(ms(10)), TickOutcome::Idle);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut timer = CountdownTimer::default();
        timer.start("1").unwrap();
        timer.tick(ms(100));

        assert!(timer.pause());
        assert!(!timer.pause());
        assert_eq!(timer.status(), TimerStatus::Paused);
        assert_eq!(timer.tick(ms(500)), TickOutcome::Idle);
        assert_eq!(timer.time_left_ms(), 900);

        assert!(timer.resume());
        assert!(!timer.resume());
        timer.tick(ms(100));
        assert_eq!(timer.time_left_ms(), 800);
    }

    #[test]
    fn test_pause_when_not_running() {
        let mut timer = CountdownTimer::default();
        assert!(!timer.pause());
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert!(!timer.resume());

        // 到期后暂停同样无效
        timer.start("0.01").unwrap();
        timer.tick(Duration::from_millis(20));
        assert!(!timer.pause());
        assert_eq!(timer.status(), TimerStatus::Expired);
    }

    #[test]
    fn test_reset() {
        let mut timer = CountdownTimer::default();
        timer.start("5").unwrap();
        timer.tick(ms(2_500));

        let snapshot = timer.reset();
        assert_eq!(snapshot.text, IDLE_TIME_TEXT);
        assert_eq!(snapshot.health.label, "100%");
        assert_eq!(snapshot.health.color, RgbColor::GREEN);
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.tick(ms(10)), TickOutcome::Idle);
    }

    #[test]
    fn test_restart_while_running() {
        let mut timer = CountdownTimer::default();
        timer.start("1").unwrap();
        timer.tick(ms(400));

        let snapshot = timer.start("2").unwrap();
        assert_eq!(snapshot.time_left_ms, 2_000);
        assert_eq!(snapshot.health.label, "100%");
    }

    #[test]
    fn test_zero_duration() {
        let mut timer = CountdownTimer::default();
        let snapshot = timer.start("0").unwrap();
        assert_eq!(snapshot.status, TimerStatus::Expired);
        assert_eq!(snapshot.text, EXPIRED_TEXT);
    }
}
