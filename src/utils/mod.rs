//! 工具模块
//!
//! 包含通用的工具函数和辅助功能

pub mod error;
pub mod logger;
pub mod system;

pub use error::*;
pub use logger::*;
pub use system::*;
