//! 密钥生成状态数据模型

use serde::{Deserialize, Serialize};

/// 密钥生成状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationState {
    /// 空闲
    Idle,
    /// 生成中
    Generating,
    /// 已停止（用户中断）
    Stopped,
    /// 已完成
    Completed,
}

impl std::fmt::Display for GenerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationState::Idle => write!(f, "空闲"),
            GenerationState::Generating => write!(f, "生成中"),
            GenerationState::Stopped => write!(f, "已停止"),
            GenerationState::Completed => write!(f, "已完成"),
        }
    }
}

impl Default for GenerationState {
    fn default() -> Self {
        GenerationState::Idle
    }
}

impl GenerationState {
    /// 检查是否可以开始新的生成
    pub fn can_start(&self) -> bool {
        !matches!(self, GenerationState::Generating)
    }
}

/// 生成进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationProgress {
    /// 已生成位数
    pub generated: usize,
    /// 目标位数
    pub total: usize,
}

impl GenerationProgress {
    pub fn new(total: usize) -> Self {
        Self { generated: 0, total }
    }

    /// 完成比例 [0, 1]
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.generated as f32 / self.total as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.generated >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_state_transitions() {
        assert!(GenerationState::Idle.can_start());
        assert!(GenerationState::Stopped.can_start());
        assert!(GenerationState::Completed.can_start());
        assert!(!GenerationState::Generating.can_start());

        assert_eq!(GenerationState::Generating.to_string(), "生成中");
    }

    #[test]
    fn test_progress_fraction() {
        let mut progress = GenerationProgress::new(4);
        assert_eq!(progress.fraction(), 0.0);
        progress.generated = 2;
        assert_eq!(progress.fraction(), 0.5);
        assert!(!progress.is_complete());
        progress.generated = 4;
        assert!(progress.is_complete());

        assert_eq!(GenerationProgress::default().fraction(), 0.0);
    }
}
