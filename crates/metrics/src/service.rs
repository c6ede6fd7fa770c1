use async_trait::async_trait;
use chrono::{DateTime, Months, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use stockboard_core::common::time::TimeProvider;
use stockboard_core::market::entity::StockMetrics;
use stockboard_core::market::error::MarketError;
use stockboard_core::market::port::MarketDataProvider;
use stockboard_core::metrics::port::StockMetricsPort;
use tracing::{debug, warn};

use crate::assembler::assemble_metrics;
use crate::series::PriceSeries;

/// # Summary
/// `MetricsService` 是指标查询的入口调度者，实现了 `StockMetricsPort`。
/// 负责抓取行情、规范化价格序列并调用纯函数组装器。
pub struct MetricsService {
    provider: Arc<dyn MarketDataProvider>,
    /// 用于确定"当前年份"与回看窗口终点
    clock: Arc<dyn TimeProvider>,
    /// 回看年数
    history_years: u32,
    /// 批量查询的并发上限
    max_concurrency: usize,
}

/// 未显式配置时的批量并发上限
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

impl MetricsService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, clock: Arc<dyn TimeProvider>, history_years: u32) -> Self {
        Self {
            provider,
            clock,
            history_years,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// 设置批量查询的并发上限，0 按 1 处理
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// 回看窗口起点
    fn history_start(&self, end: DateTime<Utc>) -> DateTime<Utc> {
        end.checked_sub_months(Months::new(self.history_years.saturating_mul(12)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// # Logic
    /// 1. 并发请求快照与日线收盘价，任一失败即整体失败。
    /// 2. 规范化收盘价序列。
    /// 3. 以时钟给出的当前年份组装指标。
    async fn load(&self, ticker: &str) -> Result<StockMetrics, MarketError> {
        let end = self.clock.now();
        let start = self.history_start(end);

        let (quote, closes) = futures::try_join!(
            self.provider.fetch_quote(ticker),
            self.provider.fetch_daily_closes(ticker, start, end)
        )?;

        let series = PriceSeries::new(closes);
        debug!(
            "{}: {} daily closes from {:?} to {:?}",
            ticker,
            series.len(),
            series.first().map(|s| s.date),
            series.last().map(|s| s.date)
        );

        Ok(assemble_metrics(ticker, &series, &quote, self.clock.current_year()))
    }
}

#[async_trait]
impl StockMetricsPort for MetricsService {
    /// # Logic
    /// 1. 代码去空白并转大写。
    /// 2. 抓取失败时不重试，返回带 `error` 的空指标。
    async fn stock_metrics(&self, ticker: &str) -> StockMetrics {
        let ticker = ticker.trim().to_uppercase();
        match self.load(&ticker).await {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!("Error fetching data for {}: {}", ticker, e);
                StockMetrics::failed(ticker, e.to_string())
            }
        }
    }

    /// # Logic
    /// 至多 `max_concurrency` 只股票同时抓取，`buffered` 保证结果与输入顺序一致。
    async fn batch_metrics(&self, tickers: &[String]) -> Vec<StockMetrics> {
        let futs: Vec<_> = tickers.iter().map(|t| self.stock_metrics(t)).collect();
        stream::iter(futs)
            .buffered(self.max_concurrency)
            .collect()
            .await
    }
}
