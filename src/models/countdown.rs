//! 倒计时数据模型
//!
//! 剩余时间、血条比例与渐变颜色的纯计算，不依赖 UI

use serde::{Deserialize, Serialize};

/// 初始/还原时的显示文本
pub const IDLE_TIME_TEXT: &str = "00:00:00.00";
/// 时间到时的显示文本
pub const EXPIRED_TEXT: &str = "时间到！";
/// 输入无效时的显示文本
pub const INVALID_INPUT_TEXT: &str = "输入无效";

/// 倒计时状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerStatus {
    /// 未开始或已还原
    Idle,
    /// 运行中
    Running,
    /// 已暂停
    Paused,
    /// 时间到
    Expired,
}

impl std::fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerStatus::Idle => write!(f, "未开始"),
            TimerStatus::Running => write!(f, "运行中"),
            TimerStatus::Paused => write!(f, "已暂停"),
            TimerStatus::Expired => write!(f, "时间到"),
        }
    }
}

/// 十六进制 RGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    pub const GREEN: RgbColor = RgbColor { red: 0, green: 255, blue: 0 };

    /// 红到绿的渐变色，ratio 为 1 时纯绿，为 0 时纯红
    pub fn gradient(ratio: f64) -> Self {
        let ratio = ratio.clamp(0.0, 1.0);
        Self {
            red: (255.0 * (1.0 - ratio)) as u8,
            green: (255.0 * ratio) as u8,
            blue: 0,
        }
    }

    /// 转换为 `#rrggbb` 形式
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// 血条显示数据
#[derive(Debug, Clone, PartialEq)]
pub struct HealthBar {
    /// 剩余比例 [0, 1]
    pub ratio: f64,
    /// 当前宽度（像素）
    pub width: f64,
    /// 百分比文本
    pub label: String,
    /// 填充颜色
    pub color: RgbColor,
}

impl HealthBar {
    /// 满血状态
    pub fn full(bar_width: f64) -> Self {
        Self {
            ratio: 1.0,
            width: bar_width,
            label: "100%".to_string(),
            color: RgbColor::GREEN,
        }
    }

    /// 根据剩余时间计算血条
    pub fn from_remaining(time_left_ms: i64, max_ms: i64, bar_width: f64) -> Self {
        let ratio = if max_ms > 0 {
            (time_left_ms as f64 / max_ms as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            ratio,
            width: bar_width * ratio,
            label: format!("{}%", (ratio * 100.0) as i64),
            color: RgbColor::gradient(ratio),
        }
    }
}

/// 将毫秒格式化为 `HH:MM:SS.CC`，小时按 24 取模
pub fn format_time_left(time_left_ms: i64) -> String {
    let ms = time_left_ms.max(0);
    let centis = (ms % 1000) / 10;
    let seconds = (ms / 1000) % 60;
    let minutes = (ms / (1000 * 60)) % 60;
    let hours = (ms / (1000 * 60 * 60)) % 24;
    format!("{:02}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}

/// 把输入的秒数（可带小数）转换为毫秒
///
/// 空白、非数字、非有限值与负数返回 `None`。
pub fn parse_seconds_to_ms(input: &str) -> Option<i64> {
    let seconds: f64 = input.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let ms = (seconds * 1000.0).floor();
    if ms > i64::MAX as f64 {
        return None;
    }
    Some(ms as i64)
}

/// 倒计时当前快照，供 UI 渲染
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub time_left_ms: i64,
    pub text: String,
    pub health: HealthBar,
}

/// 倒计时运行状态
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownState {
    /// 剩余毫秒
    pub time_left_ms: i64,
    /// 开始时的总毫秒，仅用于计算比例
    pub max_ms: i64,
    /// 当前状态
    pub status: TimerStatus,
}

impl Default for CountdownState {
    fn default() -> Self {
        Self {
            time_left_ms: 0,
            max_ms: 0,
            status: TimerStatus::Idle,
        }
    }
}

impl CountdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定毫秒数开始
    pub fn begin(&mut self, duration_ms: i64) {
        let duration_ms = duration_ms.max(0);
        self.time_left_ms = duration_ms;
        self.max_ms = duration_ms;
        self.status = if duration_ms == 0 {
            TimerStatus::Expired
        } else {
            TimerStatus::Running
        };
    }

    /// 扣减时间，返回是否刚好到期
    pub fn consume(&mut self, elapsed_ms: i64) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        self.time_left_ms = (self.time_left_ms - elapsed_ms.max(0)).max(0);
        if self.time_left_ms == 0 {
            self.status = TimerStatus::Expired;
            return true;
        }
        false
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status == TimerStatus::Paused
    }

    /// 显示文本
    pub fn display_text(&self) -> String {
        match self.status {
            TimerStatus::Idle => IDLE_TIME_TEXT.to_string(),
            TimerStatus::Expired => EXPIRED_TEXT.to_string(),
            TimerStatus::Running | TimerStatus::Paused => format_time_left(self.time_left_ms),
        }
    }

    /// 生成快照
    pub fn snapshot(&self, bar_width: f64) -> TimerSnapshot {
        let health = match self.status {
            TimerStatus::Idle => HealthBar::full(bar_width),
            _ => HealthBar::from_remaining(self.time_left_ms, self.max_ms, bar_width),
        };

        TimerSnapshot {
            status: self.status,
            time_left_ms: self.time_left_ms,
            text: self.display_text(),
            health,
        }
    }
}
