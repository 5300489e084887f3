//! UI 模块
//!
//! 包含两个窗口的界面逻辑，Slint 组件由 build.rs 从 ui/main.slint 生成

// 引入 Slint 生成的模块
slint::include_modules!();

pub mod countdown_ui;
pub mod key_generator_ui;

pub use countdown_ui::*;
pub use key_generator_ui::*;
