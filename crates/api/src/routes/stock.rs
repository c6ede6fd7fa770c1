//! # 个股指标路由控制器

use axum::extract::{Path, State};
use axum::Json;

use stockboard_core::common::normalize_ticker;
use stockboard_core::market::entity::StockMetrics;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::ApiResponse;

/// 获取个股收益与估值指标
///
/// 行情抓取失败不会返回错误状态码，而是在 `error` 字段中说明原因，所有数值字段为 null。
#[utoipa::path(
    get,
    path = "/api/v1/stock/{ticker}",
    tag = "行情 (Stock)",
    params(
        ("ticker" = String, Path, description = "股票代码，大小写不敏感")
    ),
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<StockMetrics>),
        (status = 400, description = "非法的股票代码")
    )
)]
pub async fn get_stock_metrics(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ApiResponse<StockMetrics>>, ApiError> {
    let ticker = normalize_ticker(&ticker)
        .ok_or_else(|| ApiError::BadRequest("Invalid ticker symbol".into()))?;

    let metrics = state.metrics.stock_metrics(&ticker).await;
    Ok(Json(ApiResponse::ok(metrics)))
}
