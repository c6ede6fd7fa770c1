use chrono::NaiveDate;
use stockboard_core::market::entity::PriceSample;

/// # Summary
/// 规范化后的单只股票价格序列。
///
/// # Invariants
/// - 按日期升序排列，且每个日期只保留一个样本 (后出现的覆盖先出现的)。
/// - 所有 `close` 均为有限正数。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    samples: Vec<PriceSample>,
}

impl PriceSeries {
    /// # Summary
    /// 从原始样本构建序列。
    ///
    /// # Logic
    /// 1. 丢弃非有限或非正的收盘价。
    /// 2. 按日期稳定排序。
    /// 3. 合并同日样本，保留输入中最后出现的一条。
    pub fn new(raw: impl IntoIterator<Item = PriceSample>) -> Self {
        let mut sorted: Vec<PriceSample> = raw
            .into_iter()
            .filter(|s| s.close.is_finite() && s.close > 0.0)
            .collect();
        sorted.sort_by_key(|s| s.date);

        let mut samples: Vec<PriceSample> = Vec::with_capacity(sorted.len());
        for sample in sorted {
            match samples.last_mut() {
                Some(last) if last.date == sample.date => *last = sample,
                _ => samples.push(sample),
            }
        }
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    /// 最早的样本
    pub fn first(&self) -> Option<&PriceSample> {
        self.samples.first()
    }

    /// 最新的样本
    pub fn last(&self) -> Option<&PriceSample> {
        self.samples.last()
    }

    /// # Summary
    /// 查找目标日期当天或之前最近一个交易日的收盘价。
    ///
    /// # Logic
    /// 1. 二分定位第一个晚于 `target` 的位置。
    /// 2. 其前一个样本即为答案。
    /// 3. 若所有样本都晚于 `target`，回退为最早样本。
    ///
    /// # Returns
    /// 仅在序列为空时返回 None。
    pub fn closest_price(&self, target: NaiveDate) -> Option<f64> {
        let idx = self.samples.partition_point(|s| s.date <= target);
        let hit = match idx {
            0 => self.samples.first(),
            i => self.samples.get(i - 1),
        };
        hit.map(|s| s.close)
    }
}

/// # Summary
/// 在未排序的原始样本上查找最近价格，语义与 `PriceSeries::closest_price` 一致。
///
/// # Logic
/// 1. 取日期不晚于 `target` 的样本中日期最大的一条。
/// 2. 若不存在，取日期最早的一条。
///
/// 不修改输入，不要求输入有序。
pub fn resolve_closest_price(samples: &[PriceSample], target: NaiveDate) -> Option<f64> {
    samples
        .iter()
        .filter(|s| s.date <= target)
        .max_by_key(|s| s.date)
        .or_else(|| samples.iter().min_by_key(|s| s.date))
        .map(|s| s.close)
}
