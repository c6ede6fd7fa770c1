//! # 看板路由控制器
//!
//! 看板的增删改查、代码增删以及批量指标查询。所有接口都按当前用户隔离，
//! 访问他人看板与访问不存在的看板一样返回 404。

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use stockboard_core::common::{normalize_ticker, parse_ticker_list};
use stockboard_core::market::entity::StockMetrics;
use stockboard_core::store::port::Dashboard;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::auth::CurrentUser;
use crate::server::AppState;
use crate::types::{
    AddTickersRequest, ApiResponse, CreateDashboardRequest, DashboardResponse,
    UpdateDashboardRequest,
};

const DEFAULT_DASHBOARD_NAME: &str = "Dashboard";

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Dashboard {} not found", id))
}

fn normalize_all(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for t in raw.iter().filter_map(|t| normalize_ticker(t)) {
        if !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

async fn load_dashboard(state: &AppState, user_id: &str, id: &str) -> Result<Dashboard, ApiError> {
    state
        .system_store
        .get_dashboard(user_id, id)
        .await?
        .ok_or_else(|| not_found(id))
}

/// 列出当前用户的全部看板 (最近修改的在前)
#[utoipa::path(
    get,
    path = "/api/v1/user/dashboards",
    tag = "看板 (Dashboard)",
    security(("bearer_jwt" = [])),
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<Vec<DashboardResponse>>),
        (status = 401, description = "未登录")
    )
)]
pub async fn list_dashboards(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<DashboardResponse>>>, ApiError> {
    let dashboards = state.system_store.list_dashboards(&user.id).await?;
    Ok(Json(ApiResponse::ok(
        dashboards.into_iter().map(DashboardResponse::from).collect(),
    )))
}

/// 创建看板
///
/// # Logic
/// 1. 名称去除首尾空白后不能为空。
/// 2. 初始代码逐个规范化，非法代码静默丢弃，重复代码只保留第一次出现。
#[utoipa::path(
    post,
    path = "/api/v1/user/dashboards",
    tag = "看板 (Dashboard)",
    security(("bearer_jwt" = [])),
    request_body = CreateDashboardRequest,
    responses(
        (status = 201, description = "创建成功", body = ApiResponse<DashboardResponse>),
        (status = 400, description = "名称为空")
    )
)]
pub async fn create_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateDashboardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DashboardResponse>>), ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Dashboard name is required".into()));
    }

    let dashboard = Dashboard::new(
        uuid::Uuid::new_v4().to_string(),
        user.id.clone(),
        name.to_string(),
        normalize_all(&req.tickers),
    );
    state.system_store.save_dashboard(&dashboard).await?;

    tracing::info!("User {} created dashboard {}", user.id, dashboard.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(DashboardResponse::from(dashboard))),
    ))
}

/// 获取单个看板
#[utoipa::path(
    get,
    path = "/api/v1/user/dashboards/{id}",
    tag = "看板 (Dashboard)",
    security(("bearer_jwt" = [])),
    params(("id" = String, Path, description = "看板 ID")),
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<DashboardResponse>),
        (status = 404, description = "看板不存在")
    )
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DashboardResponse>>, ApiError> {
    let dashboard = load_dashboard(&state, &user.id, &id).await?;
    Ok(Json(ApiResponse::ok(DashboardResponse::from(dashboard))))
}

/// 保存看板 (Upsert)
///
/// # Logic
/// 看板存在时只覆盖请求中给出的字段；不存在时以该 ID 新建，缺省名称为 "Dashboard"。
/// 无论哪种情况都会刷新 `updatedAt`。
#[utoipa::path(
    put,
    path = "/api/v1/user/dashboards/{id}",
    tag = "看板 (Dashboard)",
    security(("bearer_jwt" = [])),
    params(("id" = String, Path, description = "看板 ID")),
    request_body = UpdateDashboardRequest,
    responses(
        (status = 200, description = "保存成功", body = ApiResponse<DashboardResponse>),
        (status = 400, description = "名称为空")
    )
)]
pub async fn update_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateDashboardRequest>,
) -> Result<Json<ApiResponse<DashboardResponse>>, ApiError> {
    let name = match req.name.as_deref().map(str::trim) {
        Some("") => return Err(ApiError::BadRequest("Dashboard name cannot be blank".into())),
        Some(n) => Some(n.to_string()),
        None => None,
    };
    let tickers = req.tickers.as_deref().map(normalize_all);

    let existing = state.system_store.get_dashboard(&user.id, &id).await?;
    let dashboard = match existing {
        Some(mut d) => {
            if let Some(n) = name {
                d.name = n;
            }
            if let Some(t) = tickers {
                d.tickers = t;
            }
            d.touch();
            d
        }
        None => Dashboard::new(
            id,
            user.id.clone(),
            name.unwrap_or_else(|| DEFAULT_DASHBOARD_NAME.to_string()),
            tickers.unwrap_or_default(),
        ),
    };

    state.system_store.save_dashboard(&dashboard).await?;
    Ok(Json(ApiResponse::ok(DashboardResponse::from(dashboard))))
}

/// 删除看板
///
/// # Returns
/// `data` 为 `true` 表示确实删除了记录，`false` 表示看板本就不存在。
#[utoipa::path(
    delete,
    path = "/api/v1/user/dashboards/{id}",
    tag = "看板 (Dashboard)",
    security(("bearer_jwt" = [])),
    params(("id" = String, Path, description = "看板 ID")),
    responses(
        (status = 200, description = "删除完成", body = ApiResponse<bool>)
    )
)]
pub async fn delete_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let deleted = state.system_store.delete_dashboard(&user.id, &id).await?;
    if deleted {
        tracing::info!("User {} deleted dashboard {}", user.id, id);
    }
    Ok(Json(ApiResponse::ok(deleted)))
}

/// 向看板追加股票代码
///
/// 输入为逗号或空白分隔的字符串，非法代码被忽略，已存在的代码被跳过。
#[utoipa::path(
    post,
    path = "/api/v1/user/dashboards/{id}/tickers",
    tag = "看板 (Dashboard)",
    security(("bearer_jwt" = [])),
    params(("id" = String, Path, description = "看板 ID")),
    request_body = AddTickersRequest,
    responses(
        (status = 200, description = "追加完成", body = ApiResponse<DashboardResponse>),
        (status = 404, description = "看板不存在")
    )
)]
pub async fn add_tickers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AddTickersRequest>,
) -> Result<Json<ApiResponse<DashboardResponse>>, ApiError> {
    let mut dashboard = load_dashboard(&state, &user.id, &id).await?;

    let tickers = parse_ticker_list(&req.tickers);
    if dashboard.add_tickers(&tickers) > 0 {
        state.system_store.save_dashboard(&dashboard).await?;
    }
    Ok(Json(ApiResponse::ok(DashboardResponse::from(dashboard))))
}

/// 从看板移除单个股票代码
#[utoipa::path(
    delete,
    path = "/api/v1/user/dashboards/{id}/tickers/{ticker}",
    tag = "看板 (Dashboard)",
    security(("bearer_jwt" = [])),
    params(
        ("id" = String, Path, description = "看板 ID"),
        ("ticker" = String, Path, description = "股票代码，大小写不敏感")
    ),
    responses(
        (status = 200, description = "移除完成", body = ApiResponse<DashboardResponse>),
        (status = 404, description = "看板不存在")
    )
)]
pub async fn remove_ticker(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, ticker)): Path<(String, String)>,
) -> Result<Json<ApiResponse<DashboardResponse>>, ApiError> {
    let mut dashboard = load_dashboard(&state, &user.id, &id).await?;

    let removed = normalize_ticker(&ticker)
        .map(|t| dashboard.remove_ticker(&t))
        .unwrap_or(false);
    if removed {
        state.system_store.save_dashboard(&dashboard).await?;
    }
    Ok(Json(ApiResponse::ok(DashboardResponse::from(dashboard))))
}

/// 批量获取看板内全部股票的指标
///
/// 结果顺序与看板中的代码顺序一致；单个代码失败只影响对应条目的 `error` 字段。
#[utoipa::path(
    get,
    path = "/api/v1/user/dashboards/{id}/metrics",
    tag = "看板 (Dashboard)",
    security(("bearer_jwt" = [])),
    params(("id" = String, Path, description = "看板 ID")),
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<Vec<StockMetrics>>),
        (status = 404, description = "看板不存在")
    )
)]
pub async fn dashboard_metrics(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<StockMetrics>>>, ApiError> {
    let dashboard = load_dashboard(&state, &user.id, &id).await?;
    let metrics = state.metrics.batch_metrics(&dashboard.tickers).await;
    Ok(Json(ApiResponse::ok(metrics)))
}
