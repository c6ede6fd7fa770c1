//! # `stockboard-core` - 领域核心
//!
//! 定义实体、端口 (Trait) 与领域错误，不包含任何具体的 I/O 实现。
//! 具体实现由 `feed`、`store`、`metrics` 等 crate 提供，并在 `app` 中装配。

pub mod config;
pub mod common;

pub mod market {
    pub mod entity;
    pub mod error;
    pub mod port;
}

pub mod metrics {
    pub mod port;
}

pub mod store {
    pub mod error;
    pub mod port;
}

#[cfg(feature = "test-utils")]
pub mod test_utils;
