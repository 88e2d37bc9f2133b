use concat_string::concat_string;

pub mod quote;

const HOST: &str = "www.dfm.ae";

/// Rendered price block on the trading summary page. Layout dependent, so a
/// site redesign breaks these paths rather than silently reading wrong data.
pub(crate) const PRICE_REGION: &str =
    "//*[@id='__layout']/div/div[3]/section[1]/div/div/div[3]/div/div[2]";

/// Rendered change block, two lines: absolute change over percentage.
pub(crate) const CHANGE_REGION: &str =
    "//*[@id='__layout']/div/div[3]/section[1]/div/div/div[3]/div/div[3]";

/// 個股交易摘要頁
pub(crate) fn page_url(stock_symbol: &str) -> String {
    concat_string!(
        "https://",
        HOST,
        "/the-exchange/market-information/company/",
        urlencoding::encode(stock_symbol),
        "/trading/trading-summary"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url() {
        assert_eq!(
            page_url("SALIK"),
            "https://www.dfm.ae/the-exchange/market-information/company/SALIK/trading/trading-summary"
        );
    }

    #[test]
    fn test_page_url_encodes_symbol() {
        assert_eq!(
            page_url("A B/C"),
            "https://www.dfm.ae/the-exchange/market-information/company/A%20B%2FC/trading/trading-summary"
        );
    }
}
