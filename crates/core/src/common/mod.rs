pub mod time;

/// 单个代码允许的最大长度 (如 `BRK-B`、`^GSPC`、`EURUSD=X`)
const MAX_TICKER_LEN: usize = 16;

/// # Summary
/// 规范化单个股票代码：去除首尾空白并转为大写。
///
/// # Logic
/// 1. trim 后为空直接拒绝。
/// 2. 只接受字母、数字以及 `.` `-` `^` `=` 四种分隔符。
///
/// # Returns
/// 合法返回大写代码，否则返回 None。
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() || ticker.len() > MAX_TICKER_LEN {
        return None;
    }
    let valid = ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    valid.then_some(ticker)
}

/// # Summary
/// 解析用户输入的一组代码，例如 `"aapl, msft  googl"`。
///
/// # Logic
/// 1. 按逗号或任意空白切分。
/// 2. 逐个规范化，丢弃非法项。
/// 3. 保持输入顺序并去除重复。
pub fn parse_ticker_list(input: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in input.split(|c: char| c == ',' || c.is_whitespace()) {
        if let Some(ticker) = normalize_ticker(part) {
            if !out.contains(&ticker) {
                out.push(ticker);
            }
        }
    }
    out
}
