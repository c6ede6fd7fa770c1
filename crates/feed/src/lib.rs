//! # `stockboard-feed` - 行情数据源适配器
//!
//! 目前只有 Yahoo Finance 一个实现。

pub mod yahoo;
