//! 数据模型模块
//!
//! 包含应用程序的所有数据结构和类型定义

pub mod config;
pub mod countdown;
pub mod key;
pub mod state;

pub use config::*;
pub use countdown::*;
pub use key::*;
pub use state::*;
