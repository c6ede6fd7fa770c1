//! # `stockboard-store` - 持久化适配器
//!
//! `SystemStore` 的 SQLite 实现，用户与看板统一存放在数据根目录下的 `app.db`。

pub mod config;
pub mod system;
