use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use stockboard_core::market::entity::{PriceSample, QuoteSnapshot};
use stockboard_core::market::error::MarketError;
use stockboard_core::market::port::MarketDataProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const QUOTE_MODULES: &str = "price,summaryDetail,defaultKeyStatistics";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Yahoo 各接口地址，测试时可指向本地模拟服务
#[derive(Debug, Clone)]
pub struct YahooEndpoints {
    /// v8 chart 接口前缀，代码拼接在其后
    pub chart: String,
    /// v10 quoteSummary 接口前缀
    pub quote_summary: String,
    /// 下发会话 Cookie 的页面
    pub cookie: String,
    /// 基于会话 Cookie 签发 crumb 的接口
    pub crumb: String,
}

impl Default for YahooEndpoints {
    fn default() -> Self {
        Self {
            chart: CHART_URL.to_string(),
            quote_summary: QUOTE_SUMMARY_URL.to_string(),
            cookie: COOKIE_URL.to_string(),
            crumb: CRUMB_URL.to_string(),
        }
    }
}

/// # Summary
/// Yahoo Finance 行情提供者实现。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯，开启 Cookie 存储以保持会话。
/// - quoteSummary 必须携带与会话 Cookie 配对的 crumb；crumb 在实例内缓存，被拒绝时刷新一次。
#[derive(Clone)]
pub struct YahooProvider {
    /// 内部使用的 HTTP 客户端
    client: Client,
    endpoints: Arc<YahooEndpoints>,
    /// 当前会话的 crumb，首次查询快照时懒加载
    crumb: Arc<RwLock<Option<String>>>,
}

impl YahooProvider {
    /// # Summary
    /// 创建指向 Yahoo 正式接口的实例。
    ///
    /// # Returns
    /// 客户端构建失败 (如未安装 TLS 加密后端) 时返回 `MarketError::Network`。
    pub fn new() -> Result<Self, MarketError> {
        Self::with_endpoints(YahooEndpoints::default())
    }

    /// # Summary
    /// 以指定接口地址创建实例。
    ///
    /// # Logic
    /// 1. 配置 10 秒超时。
    /// 2. 设置伪装浏览器 Header (User-Agent) 以减少被拦截风险。
    /// 3. 开启 Cookie 存储，crumb 握手依赖会话 Cookie。
    pub fn with_endpoints(endpoints: YahooEndpoints) -> Result<Self, MarketError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| MarketError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoints: Arc::new(endpoints),
            crumb: Arc::new(RwLock::new(None)),
        })
    }

    /// 发起 GET 请求，返回状态码与正文
    async fn get_raw(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<(StatusCode, String), MarketError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;
        Ok((status, body))
    }

    /// # Summary
    /// 发起 GET 请求并取回响应正文。
    ///
    /// # Logic
    /// Yahoo 对未知代码返回 404 且正文仍是带 `error` 的 JSON，因此 404 交给解析层处理，
    /// 其余非 2xx 状态直接视为网络错误。
    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, MarketError> {
        let (status, body) = self.get_raw(url, query).await?;
        check_status(status)?;
        Ok(body)
    }

    /// 返回缓存的 crumb，没有则完成一次握手
    async fn current_crumb(&self) -> Result<String, MarketError> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }
        self.refresh_crumb(None).await
    }

    /// # Summary
    /// 重新握手获取 crumb。
    ///
    /// # Logic
    /// 1. 持有写锁，若缓存已被其他任务换成了不同于 `stale` 的新值则直接复用。
    /// 2. 访问 Cookie 页面建立会话；该页面通常返回 404，只关心 Set-Cookie。
    /// 3. 请求 crumb 接口，正文即 crumb。
    async fn refresh_crumb(&self, stale: Option<&str>) -> Result<String, MarketError> {
        let mut guard = self.crumb.write().await;
        if let Some(current) = guard.as_deref() {
            if stale != Some(current) {
                return Ok(current.to_string());
            }
        }

        if let Err(e) = self.get_raw(&self.endpoints.cookie, &[]).await {
            warn!("Yahoo cookie request failed: {}", e);
        }

        let (status, body) = self.get_raw(&self.endpoints.crumb, &[]).await?;
        let crumb = body.trim();
        if !status.is_success() || crumb.is_empty() || crumb.contains('<') || crumb.contains('{') {
            return Err(MarketError::Network(format!(
                "Failed to obtain Yahoo crumb: HTTP {}",
                status
            )));
        }

        debug!("Obtained new Yahoo crumb");
        *guard = Some(crumb.to_string());
        Ok(crumb.to_string())
    }

    async fn quote_summary(
        &self,
        ticker: &str,
        crumb: &str,
    ) -> Result<(StatusCode, String), MarketError> {
        let url = format!("{}/{}", self.endpoints.quote_summary, ticker);
        self.get_raw(
            &url,
            &[
                ("modules", QUOTE_MODULES.to_string()),
                ("crumb", crumb.to_string()),
            ],
        )
        .await
    }
}

fn check_status(status: StatusCode) -> Result<(), MarketError> {
    if !status.is_success() && status != StatusCode::NOT_FOUND {
        return Err(MarketError::Network(format!("HTTP {}", status)));
    }
    Ok(())
}

/// crumb 失效或与 Cookie 不匹配时 Yahoo 返回 401 (偶尔 403)
fn crumb_rejected(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

// ============================================================
//  v8 chart 接口
// ============================================================

/// # Summary
/// Yahoo chart 响应顶层结构。
#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Deserialize, Debug)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

/// # Summary
/// Yahoo API 错误详情，chart 与 quoteSummary 共用。
#[derive(Deserialize, Debug)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

impl YahooError {
    fn into_market_error(self) -> MarketError {
        match self.code.as_deref() {
            Some("Not Found") => MarketError::NotFound,
            _ => MarketError::Unknown(
                self.description
                    .or(self.code)
                    .unwrap_or_else(|| "Unknown Yahoo error".to_string()),
            ),
        }
    }
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    // 无成交数据时 Yahoo 会省略该字段
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    // 交易所相对 UTC 的偏移 (秒)，用于把时间戳换算成交易所本地日期
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Deserialize, Debug)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Deserialize, Debug)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// # Summary
/// 解析 chart 接口的响应正文为日线收盘价。
///
/// # Logic
/// 1. `error` 非空时映射为 `MarketError`。
/// 2. 时间戳加上交易所偏移后取自然日。
/// 3. 收盘价为 null 的交易日直接跳过。
fn parse_chart(body: &str) -> Result<Vec<PriceSample>, MarketError> {
    let json: ChartResponse =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(e.to_string()))?;

    if let Some(err) = json.chart.error {
        return Err(err.into_market_error());
    }

    let result = json
        .chart
        .result
        .ok_or(MarketError::NotFound)?
        .pop()
        .ok_or(MarketError::NotFound)?;

    let quote = result
        .indicators
        .quote
        .first()
        .ok_or(MarketError::Parse("No quote data".into()))?;

    let offset = result.meta.gmtoffset;
    let samples = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = quote.close.get(i).copied().flatten()?;
            let date = local_date(ts, offset)?;
            Some(PriceSample::new(date, close))
        })
        .collect();

    Ok(samples)
}

fn local_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts.checked_add(gmtoffset)?, 0).map(|t| t.date_naive())
}

// ============================================================
//  v10 quoteSummary 接口
// ============================================================

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryBody,
}

#[derive(Deserialize, Debug)]
struct QuoteSummaryBody {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<YahooError>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    price: PriceModule,
    #[serde(default)]
    summary_detail: SummaryDetailModule,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    regular_market_price: RawValue,
    short_name: Option<String>,
    long_name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct SummaryDetailModule {
    #[serde(default, rename = "trailingPE")]
    trailing_pe: RawValue,
    #[serde(default, rename = "forwardPE")]
    forward_pe: RawValue,
    #[serde(default)]
    price_to_sales_trailing12_months: RawValue,
}

/// Yahoo 数值字段的包装形式 `{ "raw": 1.23, "fmt": "1.23" }`，缺失时为 `{}`
#[derive(Deserialize, Debug, Default)]
struct RawValue {
    raw: Option<f64>,
}

/// # Summary
/// 解析 quoteSummary 响应正文为行情快照。
///
/// # Logic
/// 1. `error` 非空时映射为 `MarketError`。
/// 2. 名称优先取 `shortName`，其次 `longName`。
/// 3. 估值字段缺失时保持 None。
fn parse_quote_summary(body: &str) -> Result<QuoteSnapshot, MarketError> {
    let json: QuoteSummaryResponse =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(e.to_string()))?;

    if let Some(err) = json.quote_summary.error {
        return Err(err.into_market_error());
    }

    let result = json
        .quote_summary
        .result
        .ok_or(MarketError::NotFound)?
        .pop()
        .ok_or(MarketError::NotFound)?;

    Ok(QuoteSnapshot {
        name: result.price.short_name.or(result.price.long_name),
        current_price: result.price.regular_market_price.raw,
        trailing_pe: result.summary_detail.trailing_pe.raw,
        forward_pe: result.summary_detail.forward_pe.raw,
        price_to_sales_ttm: result.summary_detail.price_to_sales_trailing12_months.raw,
    })
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    /// # Summary
    /// 从 Yahoo Finance 抓取日线收盘价。
    ///
    /// # Logic
    /// 1. 构建包含 period1, period2, interval=1d 的 chart 请求。
    /// 2. 发起异步请求并解析嵌套的 JSON 数据。
    async fn fetch_daily_closes(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>, MarketError> {
        let url = format!("{}/{}", self.endpoints.chart, ticker);
        let body = self
            .get_text(
                &url,
                &[
                    ("period1", start.timestamp().to_string()),
                    ("period2", end.timestamp().to_string()),
                    ("interval", "1d".to_string()),
                ],
            )
            .await?;

        let samples = parse_chart(&body)?;
        debug!("Fetched {} daily closes for {}", samples.len(), ticker);
        Ok(samples)
    }

    /// # Summary
    /// 从 Yahoo Finance 抓取现价、名称与估值倍数。
    ///
    /// # Logic
    /// 1. 携带缓存的 crumb 请求 quoteSummary。
    /// 2. crumb 被拒绝时重新握手并重试一次，仍失败则返回网络错误。
    async fn fetch_quote(&self, ticker: &str) -> Result<QuoteSnapshot, MarketError> {
        let crumb = self.current_crumb().await?;
        let (mut status, mut body) = self.quote_summary(ticker, &crumb).await?;

        if crumb_rejected(status) {
            warn!("Yahoo rejected crumb ({}), refreshing session", status);
            let crumb = self.refresh_crumb(Some(&crumb)).await?;
            (status, body) = self.quote_summary(ticker, &crumb).await?;
        }

        check_status(status)?;
        parse_quote_summary(&body)
    }
}
