//! 测试辅助：内存版行情提供者，供下游 crate 的集成测试注入。

use crate::market::entity::{PriceSample, QuoteSnapshot};
use crate::market::error::MarketError;
use crate::market::port::MarketDataProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// # Summary
/// 预置数据的行情提供者。未登记的代码返回 `MarketError::NotFound`。
#[derive(Default)]
pub struct MockMarketDataProvider {
    data: DashMap<String, (Vec<PriceSample>, QuoteSnapshot)>,
}

impl MockMarketDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一只股票的历史收盘价与快照
    pub fn insert(&self, ticker: &str, closes: Vec<PriceSample>, quote: QuoteSnapshot) {
        self.data.insert(ticker.to_string(), (closes, quote));
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketDataProvider {
    async fn fetch_daily_closes(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>, MarketError> {
        let entry = self.data.get(ticker).ok_or(MarketError::NotFound)?;
        let (start, end) = (start.date_naive(), end.date_naive());
        Ok(entry
            .value()
            .0
            .iter()
            .filter(|s| s.date >= start && s.date <= end)
            .copied()
            .collect())
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<QuoteSnapshot, MarketError> {
        self.data
            .get(ticker)
            .map(|e| e.value().1.clone())
            .ok_or(MarketError::NotFound)
    }
}
