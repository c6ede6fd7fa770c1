use crate::market::entity::{PriceSample, QuoteSnapshot};
use crate::market::error::MarketError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// # Summary
/// 行情数据提供者接口（原始数据源）。
///
/// # Invariants
/// - 实现者只负责搬运数据，不做任何收益计算。
/// - 代码在进入本接口前已经规范化为大写。
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// # Summary
    /// 获取指定时间范围内的日线收盘价。
    ///
    /// # Logic
    /// 1. 构建日线级别的数据源请求。
    /// 2. 执行网络请求并解析响应。
    /// 3. 跳过收盘价缺失的交易日。
    ///
    /// # Arguments
    /// * `ticker`: 股票代码。
    /// * `start`: 开始时间。
    /// * `end`: 结束时间。
    ///
    /// # Returns
    /// 成功返回收盘价样本列表（顺序不做保证）。
    async fn fetch_daily_closes(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>, MarketError>;

    /// # Summary
    /// 获取现价、名称与估值倍数快照。
    ///
    /// # Arguments
    /// * `ticker`: 股票代码。
    ///
    /// # Returns
    /// 成功返回 `QuoteSnapshot`，其中任意字段都可能缺失。
    async fn fetch_quote(&self, ticker: &str) -> Result<QuoteSnapshot, MarketError>;
}
