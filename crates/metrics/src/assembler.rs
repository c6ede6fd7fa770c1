use chrono::NaiveDate;
use stockboard_core::market::entity::{QuoteSnapshot, StockMetrics};

use crate::returns::{annualized_return, simple_return};
use crate::series::PriceSeries;

/// `StockMetrics` 中带年份标签的自然年收益字段对应的最新年份
pub const LATEST_CALENDAR_YEAR: i32 = 2025;

/// 参考日期：当年 12 月 31 日
fn year_end(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31)
}

fn valid_price(price: f64) -> Option<f64> {
    (price.is_finite() && price > 0.0).then_some(price)
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// 两个价格都存在时计算简单收益率
fn pct_change(start: Option<f64>, end: Option<f64>) -> Option<f64> {
    let (start, end) = (start?, end?);
    finite(simple_return(start, end))
}

fn annualized(start: Option<f64>, end: Option<f64>, years: f64) -> Option<f64> {
    let (start, end) = (start?, end?);
    finite(annualized_return(start, end, years))
}

/// # Summary
/// 由价格序列与行情快照组装单只股票的全部指标。
///
/// # Logic
/// 1. 以各年 12 月 31 日为参考日期，通过 `closest_price` 解析年末价格。
/// 2. YTD：上一年年末价 → 现价。
/// 3. 2025：2024 年末 → 2025 年末，两者价格相同 (即期间尚无交易) 时置空。
/// 4. 2024、2023：相邻年末之间的简单收益率。
/// 5. 5 年 / 10 年：N 年前年末价 → 现价的年化收益率。
/// 6. 估值倍数直接透传快照。
///
/// # Arguments
/// * `ticker`: 股票代码。
/// * `series`: 规范化后的历史价格。
/// * `quote`: 现价、名称与估值快照。
/// * `current_year`: 当前自然年。
///
/// # Returns
/// 任一输入缺失时对应字段为 None；本函数不会失败。
pub fn assemble_metrics(
    ticker: &str,
    series: &PriceSeries,
    quote: &QuoteSnapshot,
    current_year: i32,
) -> StockMetrics {
    let ticker = ticker.trim().to_uppercase();
    let price_at_year_end = |year: i32| {
        year_end(year)
            .and_then(|date| series.closest_price(date))
            .and_then(valid_price)
    };

    let current_price = quote.current_price.and_then(valid_price);

    let ytd_return = pct_change(price_at_year_end(current_year - 1), current_price);

    let end_2022 = price_at_year_end(LATEST_CALENDAR_YEAR - 3);
    let end_2023 = price_at_year_end(LATEST_CALENDAR_YEAR - 2);
    let end_2024 = price_at_year_end(LATEST_CALENDAR_YEAR - 1);
    let end_2025 = price_at_year_end(LATEST_CALENDAR_YEAR);

    // 两个年末解析到同一价格说明该年尚无新数据，避免输出虚假的 0%
    let return_2025 = match (end_2024, end_2025) {
        (Some(start), Some(end)) if start != end => finite(simple_return(start, end)),
        _ => None,
    };
    let return_2024 = pct_change(end_2023, end_2024);
    let return_2023 = pct_change(end_2022, end_2023);

    let return_5_year = annualized(price_at_year_end(current_year - 5), current_price, 5.0);
    let return_10_year = annualized(price_at_year_end(current_year - 10), current_price, 10.0);

    let name = quote
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or_else(|| ticker.clone(), str::to_string);

    StockMetrics {
        ticker,
        name,
        current_price,
        ytd_return,
        return_2025,
        return_2024,
        return_2023,
        return_5_year,
        return_10_year,
        pe_ltm: quote.trailing_pe,
        pe_ntm: quote.forward_pe,
        ps_ltm: quote.price_to_sales_ttm,
        // FIXME: 数据源没有预期市销率字段，暂以 TTM 市销率代替，结果仅供参考
        ps_ntm: quote.price_to_sales_ttm,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockboard_core::market::entity::PriceSample;

    fn sample(y: i32, m: u32, d: u32, close: f64) -> PriceSample {
        PriceSample::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), close)
    }

    fn quote(price: Option<f64>) -> QuoteSnapshot {
        QuoteSnapshot {
            name: Some("Acme Corp".to_string()),
            current_price: price,
            trailing_pe: Some(25.0),
            forward_pe: Some(20.0),
            price_to_sales_ttm: Some(6.5),
        }
    }

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    fn scenario_series() -> PriceSeries {
        PriceSeries::new(vec![
            sample(2022, 12, 31, 100.0),
            sample(2023, 12, 31, 120.0),
            sample(2024, 12, 31, 150.0),
        ])
    }

    #[test]
    fn test_end_to_end_scenario() {
        let m = assemble_metrics("acme", &scenario_series(), &quote(Some(180.0)), 2025);

        assert_eq!(m.ticker, "ACME");
        assert_eq!(m.name, "Acme Corp");
        assert_eq!(m.current_price, Some(180.0));
        assert!(approx(m.return_2023, 20.0));
        assert!(approx(m.return_2024, 25.0));
        assert!(approx(m.ytd_return, 20.0));
        // 2025 年末与 2024 年末解析到同一样本
        assert_eq!(m.return_2025, None);
        // 5 年前早于序列起点，回退到最早价格 100
        assert!(approx(m.return_5_year, (1.8f64.powf(0.2) - 1.0) * 100.0));
        assert!(m.error.is_none());
    }

    #[test]
    fn test_valuation_ratios_pass_through() {
        let m = assemble_metrics("ACME", &scenario_series(), &quote(Some(180.0)), 2025);
        assert_eq!(m.pe_ltm, Some(25.0));
        assert_eq!(m.pe_ntm, Some(20.0));
        assert_eq!(m.ps_ltm, Some(6.5));
        assert_eq!(m.ps_ntm, Some(6.5));
    }

    #[test]
    fn test_return_2025_populated_once_year_has_data() {
        let mut raw = scenario_series().samples().to_vec();
        raw.push(sample(2025, 12, 31, 165.0));
        let m = assemble_metrics("ACME", &PriceSeries::new(raw), &quote(Some(180.0)), 2026);

        assert!(approx(m.return_2025, 10.0));
        // YTD 以 2025 年末为起点
        assert!(approx(m.ytd_return, (180.0 - 165.0) / 165.0 * 100.0));
    }

    #[test]
    fn test_missing_current_price_propagates() {
        let m = assemble_metrics("ACME", &scenario_series(), &quote(None), 2025);
        assert_eq!(m.current_price, None);
        assert_eq!(m.ytd_return, None);
        assert_eq!(m.return_5_year, None);
        assert_eq!(m.return_10_year, None);
        // 年度收益只依赖历史价格
        assert!(approx(m.return_2024, 25.0));
    }

    #[test]
    fn test_non_positive_price_treated_as_absent() {
        let m = assemble_metrics("ACME", &scenario_series(), &quote(Some(0.0)), 2025);
        assert_eq!(m.current_price, None);
        assert_eq!(m.ytd_return, None);
    }

    #[test]
    fn test_empty_series_yields_absent_returns() {
        let m = assemble_metrics("ACME", &PriceSeries::default(), &quote(Some(180.0)), 2025);
        assert_eq!(m.current_price, Some(180.0));
        assert_eq!(m.ytd_return, None);
        assert_eq!(m.return_2025, None);
        assert_eq!(m.return_2024, None);
        assert_eq!(m.return_2023, None);
        assert_eq!(m.return_5_year, None);
        assert_eq!(m.return_10_year, None);
        assert_eq!(m.pe_ltm, Some(25.0));
    }

    #[test]
    fn test_name_falls_back_to_ticker() {
        let mut q = quote(Some(10.0));
        q.name = Some("   ".to_string());
        let m = assemble_metrics(" msft ", &PriceSeries::default(), &q, 2025);
        assert_eq!(m.name, "MSFT");
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let series = scenario_series();
        let q = quote(Some(180.0));
        assert_eq!(
            assemble_metrics("ACME", &series, &q, 2025),
            assemble_metrics("ACME", &series, &q, 2025)
        );
    }

    #[test]
    fn test_all_fields_finite_or_absent() {
        let series = PriceSeries::new(vec![sample(2015, 6, 1, 1e-300), sample(2024, 12, 31, 1e300)]);
        let m = assemble_metrics("ACME", &series, &quote(Some(1e300)), 2025);
        for v in [
            m.ytd_return,
            m.return_2025,
            m.return_2024,
            m.return_2023,
            m.return_5_year,
            m.return_10_year,
        ]
        .into_iter()
        .flatten()
        {
            assert!(v.is_finite());
        }
    }
}
