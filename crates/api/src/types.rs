//! # DTO (Data Transfer Object) 层
//!
//! 将内部领域模型转化为面向前端 JSON 输出的轻量结构体。
//! 所有 DTO 必须派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use stockboard_core::store::port::{Dashboard, User};

// ============================================================
//  看板相关 DTO
// ============================================================

/// 看板 DTO，时间戳为毫秒级 Unix 时间
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// 看板 ID
    #[schema(example = "5f0c9a6e-2a41-4d1b-9d55-0f4f2e9c1a77")]
    pub id: String,
    /// 看板名称
    #[schema(example = "Big Tech")]
    pub name: String,
    /// 股票代码 (按添加顺序)
    #[schema(example = json!(["AAPL", "MSFT", "GOOGL"]))]
    pub tickers: Vec<String>,
    /// 创建时间 (毫秒级时间戳)
    #[schema(example = 1710000000000_i64)]
    pub created_at: i64,
    /// 最后修改时间 (毫秒级时间戳)
    #[schema(example = 1710000000000_i64)]
    pub updated_at: i64,
}

/// 创建看板请求体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDashboardRequest {
    /// 看板名称 (必填)
    #[serde(default)]
    #[schema(example = "Big Tech")]
    pub name: String,
    /// 初始股票代码
    #[serde(default)]
    #[schema(example = json!(["AAPL", "MSFT"]))]
    pub tickers: Vec<String>,
}

/// 更新看板请求体，缺省字段保持原值
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDashboardRequest {
    /// 新名称
    #[schema(example = "Mega Caps")]
    pub name: Option<String>,
    /// 整体替换的股票代码列表
    #[schema(example = json!(["AAPL", "NVDA"]))]
    pub tickers: Option<Vec<String>>,
}

/// 追加股票代码请求体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddTickersRequest {
    /// 一个或多个代码，以逗号或空白分隔
    #[serde(default)]
    #[schema(example = "AAPL, msft googl")]
    pub tickers: String,
}

// ============================================================
//  通用响应 DTO
// ============================================================

/// 统一 API 响应包装器
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T: Serialize + ToSchema> {
    /// 是否成功
    pub success: bool,
    /// 数据载荷 (成功时)
    pub data: Option<T>,
    /// 错误信息 (失败时)
    pub error: Option<String>,
}

impl<T: Serialize + ToSchema> ApiResponse<T> {
    /// 构建成功响应
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// 构建失败响应 (不含泛型载荷)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 固定为 false
    pub success: bool,
    /// 错误描述信息
    pub error: String,
}

impl ApiErrorResponse {
    /// 从错误信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

// ============================================================
//  鉴权 DTO
// ============================================================

/// 注册请求体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    /// 登录邮箱
    #[serde(default)]
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// 密码 (至少 6 位)
    #[serde(default)]
    #[schema(example = "password123")]
    pub password: String,
}

/// 登录请求体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// 登录邮箱
    #[serde(default)]
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// 密码
    #[serde(default)]
    #[schema(example = "password123")]
    pub password: String,
}

/// 用户基础信息响应 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// 用户唯一标识
    #[schema(example = "0b7e6c1c-8a0f-4f43-a5a4-5b8f0fdc2b1e")]
    pub id: String,
    /// 邮箱
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// 注册时间 (毫秒级时间戳)
    #[schema(example = 1710000000000_i64)]
    pub created_at: i64,
}

/// 登录成功返回的 Token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// JWT Bearer Token
    #[schema(example = "eyJhbGciOiJIUzI1NiIs...")]
    pub token: String,
    /// Token 过期时间 (秒)
    #[schema(example = 604800)]
    pub expires_in: u64,
    /// 当前用户
    pub user: UserResponse,
}

/// JWT Claims 内容 (内部使用，不暴露到 Swagger)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户唯一标识
    pub sub: String,
    /// 登录邮箱
    pub email: String,
    /// Token 过期时间 (Unix 时间戳)
    pub exp: u64,
}

// ============================================================
//  领域模型 → DTO 惯用转换 (impl From<T>)
// ============================================================

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self {
            id: d.id,
            name: d.name,
            tickers: d.tickers,
            created_at: d.created_at.timestamp_millis(),
            updated_at: d.updated_at.timestamp_millis(),
        }
    }
}

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            email: u.email.clone(),
            created_at: u.created_at.timestamp_millis(),
        }
    }
}
