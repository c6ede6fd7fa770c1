//! # `stockboard-metrics` - 收益指标计算
//!
//! - `series`: 价格序列规范化与最近价格查找
//! - `returns`: 简单收益率与年化收益率
//! - `assembler`: 按固定参考日期组装 `StockMetrics`
//! - `service`: 对接行情提供者的 `StockMetricsPort` 实现
//!
//! 除 `service` 外全部为同步纯函数，不做任何 I/O。

pub mod assembler;
pub mod returns;
pub mod series;
pub mod service;
