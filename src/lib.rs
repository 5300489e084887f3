//! 倒计时与随机密钥生成器库
//!
//! 基于 Rust + Slint 技术栈的两个桌面小工具共用的模型、服务与界面

pub mod models;
pub mod services;
pub mod ui;
pub mod utils;

// 重新导出常用类型
pub use models::*;
pub use services::*;
pub use utils::*;
