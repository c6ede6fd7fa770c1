//! # `stockboard-api` - HTTP API 网关
//!
//! 本 crate 是 Stockboard 股票看板的 HTTP/REST 服务入口。
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 接收来自浏览器前端的 HTTP 请求
//! - 注册 / 登录并颁发 JWT，受保护路由按用户隔离看板
//! - 调用下层 `StockMetricsPort` 与 `SystemStore` 完成业务操作
//! - 将领域模型转换为 DTO 返回给前端

pub mod types;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod server;
