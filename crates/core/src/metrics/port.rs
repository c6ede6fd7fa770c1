use crate::market::entity::StockMetrics;
use async_trait::async_trait;

/// # Summary
/// 股票指标查询端口，API 层只依赖此抽象。
///
/// # Invariants
/// - 永不返回错误：抓取失败体现在 `StockMetrics::error` 上。
#[async_trait]
pub trait StockMetricsPort: Send + Sync {
    /// # Summary
    /// 计算单只股票的收益与估值指标。
    ///
    /// # Arguments
    /// * `ticker`: 已规范化的大写代码。
    async fn stock_metrics(&self, ticker: &str) -> StockMetrics;

    /// # Summary
    /// 并发计算一组股票的指标，结果顺序与输入一致。
    async fn batch_metrics(&self, tickers: &[String]) -> Vec<StockMetrics>;
}
