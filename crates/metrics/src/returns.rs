/// 简单收益率 (%)：`(end - start) / start * 100`。
///
/// 不对 `start` 做任何校验，非正的 `start` 需由调用方拦截。
pub fn simple_return(start: f64, end: f64) -> f64 {
    (end - start) / start * 100.0
}

/// # Summary
/// 年化复合收益率 (%)：`((end / start) ^ (1 / years) - 1) * 100`。
///
/// # Returns
/// `years <= 0` 或 `start <= 0` 时返回 0.0。
pub fn annualized_return(start: f64, end: f64, years: f64) -> f64 {
    if years <= 0.0 || start <= 0.0 {
        return 0.0;
    }
    ((end / start).powf(1.0 / years) - 1.0) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_simple_return() {
        assert!(approx(simple_return(100.0, 110.0), 10.0));
        assert!(approx(simple_return(100.0, 90.0), -10.0));
        assert!(approx(simple_return(150.0, 180.0), 20.0));
    }

    #[test]
    fn test_annualized_return() {
        let r = annualized_return(100.0, 200.0, 5.0);
        assert!((r - 14.8698).abs() < 1e-3, "got {r}");

        assert!(approx(annualized_return(100.0, 100.0, 0.0), 0.0));
        assert!(approx(annualized_return(100.0, 150.0, -1.0), 0.0));
        assert!(approx(annualized_return(0.0, 150.0, 5.0), 0.0));
        assert!(approx(annualized_return(-5.0, 150.0, 5.0), 0.0));
    }

    #[test]
    fn test_annualized_matches_simple_over_one_year() {
        assert!(approx(annualized_return(80.0, 100.0, 1.0), simple_return(80.0, 100.0)));
    }
}
