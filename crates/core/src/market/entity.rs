use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// # Summary
/// 单个交易日的收盘价样本。
///
/// # Invariants
/// - 抓取之后不可变；`close` 的合法性由 `PriceSeries` 规范化时过滤。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    // 交易日 (交易所本地自然日)
    pub date: NaiveDate,
    // 收盘价
    pub close: f64,
}

impl PriceSample {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// # Summary
/// 行情快照：现价、名称以及估值倍数，全部直接取自数据源，不做派生计算。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    // 证券简称，缺失时由调用方回退为代码
    pub name: Option<String>,
    // 最新成交价
    pub current_price: Option<f64>,
    // 市盈率 (TTM)
    pub trailing_pe: Option<f64>,
    // 预期市盈率
    pub forward_pe: Option<f64>,
    // 市销率 (TTM)
    pub price_to_sales_ttm: Option<f64>,
}

/// # Summary
/// 单只股票的收益与估值指标，每次请求即时生成，不落库。
///
/// # Invariants
/// - 每个数值字段要么是有限值，要么为 `None` (JSON 中为 `null`)，绝不出现 NaN。
/// - `error` 仅在整体抓取失败时填充，此时所有数值字段均为 `None`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMetrics {
    /// 股票代码 (大写)
    #[schema(example = "AAPL")]
    pub ticker: String,
    /// 证券名称
    #[schema(example = "Apple Inc.")]
    pub name: String,
    /// 最新价
    #[schema(example = 231.5)]
    pub current_price: Option<f64>,
    /// 年初至今收益率 (%)
    pub ytd_return: Option<f64>,
    /// 2025 自然年收益率 (%)
    pub return_2025: Option<f64>,
    /// 2024 自然年收益率 (%)
    pub return_2024: Option<f64>,
    /// 2023 自然年收益率 (%)
    pub return_2023: Option<f64>,
    /// 5 年年化收益率 (%)
    pub return_5_year: Option<f64>,
    /// 10 年年化收益率 (%)
    pub return_10_year: Option<f64>,
    /// 市盈率 (TTM)
    #[serde(rename = "peLTM")]
    pub pe_ltm: Option<f64>,
    /// 预期市盈率
    #[serde(rename = "peNTM")]
    pub pe_ntm: Option<f64>,
    /// 市销率 (TTM)
    #[serde(rename = "psLTM")]
    pub ps_ltm: Option<f64>,
    /// 预期市销率 (暂以 TTM 市销率代替)
    #[serde(rename = "psNTM")]
    pub ps_ntm: Option<f64>,
    /// 抓取失败时的错误描述
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StockMetrics {
    /// # Summary
    /// 构造一个所有数值字段均缺失的指标记录。
    pub fn empty(ticker: impl Into<String>) -> Self {
        let ticker = ticker.into();
        Self {
            name: ticker.clone(),
            ticker,
            current_price: None,
            ytd_return: None,
            return_2025: None,
            return_2024: None,
            return_2023: None,
            return_5_year: None,
            return_10_year: None,
            pe_ltm: None,
            pe_ntm: None,
            ps_ltm: None,
            ps_ntm: None,
            error: None,
        }
    }

    /// 抓取失败时返回给调用方的记录
    pub fn failed(ticker: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(ticker)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_metrics_wire_names() {
        let mut m = StockMetrics::empty("AAPL");
        m.return_5_year = Some(12.5);
        m.pe_ltm = Some(30.0);

        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["ticker"], "AAPL");
        assert_eq!(json["name"], "AAPL");
        assert!(json["currentPrice"].is_null());
        assert!(json["return2025"].is_null());
        assert_eq!(json["return5Year"], 12.5);
        assert_eq!(json["peLTM"], 30.0);
        assert!(json["psNTM"].is_null());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failed_metrics_carry_error() {
        let m = StockMetrics::failed("ZZZZ", "Data not found");
        assert_eq!(m.error.as_deref(), Some("Data not found"));
        assert!(m.current_price.is_none());
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["error"], "Data not found");
    }
}
