//! 服务层模块
//!
//! 包含应用程序的核心业务逻辑和服务

pub mod config_service;
pub mod countdown_service;
pub mod key_archive;
pub mod key_generator_service;

pub use config_service::*;
pub use countdown_service::*;
pub use key_archive::*;
pub use key_generator_service::*;
