use std::{sync::Arc, time::Duration};

use crate::{
    config::SETTINGS,
    crawler::dfm::{page_url, CHANGE_REGION, PRICE_REGION},
    declare::{ExtractionError, Quote},
    logging,
    util::{
        browser::{RenderingSession, SessionFactory},
        text,
    },
};

/// 取得個股的即時報價
///
/// Turns one ticker symbol into one validated [`Quote`] by driving a
/// disposable rendering session against the symbol's trading summary page.
/// One session per call, no pooling and no state across calls; every failure
/// surfaces as a tagged [`ExtractionError`].
pub struct QuoteExtractor {
    sessions: Arc<dyn SessionFactory>,
    region_wait_timeout: Duration,
}

impl QuoteExtractor {
    pub fn new(sessions: Arc<dyn SessionFactory>) -> Self {
        QuoteExtractor {
            sessions,
            region_wait_timeout: Duration::from_secs(SETTINGS.dfm.region_wait_timeout_secs),
        }
    }

    /// Extracts the current quote for one symbol. The session is released on
    /// every exit path before a result or failure propagates.
    pub async fn stock_quote(&self, stock_symbol: &str) -> Result<Quote, ExtractionError> {
        let url = page_url(stock_symbol);
        logging::debug_file_async(format!(
            "Fetching stock quote({}) from {}",
            stock_symbol, url
        ));

        let mut session = self.sessions.open().await?;
        let regions = self.fetch_rendered_regions(session.as_mut(), &url).await;
        session.shutdown().await;

        let (price_text, change_text) = regions?;

        to_quote(stock_symbol, &price_text, &change_text)
    }

    /// Navigates to the page and reads the raw text of both target regions.
    async fn fetch_rendered_regions(
        &self,
        session: &mut dyn RenderingSession,
        url: &str,
    ) -> Result<(String, String), ExtractionError> {
        session.navigate(url).await?;

        let price_text = session
            .wait_for_text(PRICE_REGION, self.region_wait_timeout)
            .await?;
        let change_text = session
            .wait_for_text(CHANGE_REGION, self.region_wait_timeout)
            .await?;

        Ok((price_text, change_text))
    }
}

/// Assembles a validated quote from the two raw region texts.
fn to_quote(
    stock_symbol: &str,
    price_text: &str,
    change_text: &str,
) -> Result<Quote, ExtractionError> {
    let price = parse_price(price_text)?;
    let (change, change_percentage) = parse_change_lines(change_text)?;

    Ok(Quote {
        symbol: stock_symbol.to_string(),
        price,
        change,
        change_percentage,
    })
}

/// 價格必須是非負數
fn parse_price(text: &str) -> Result<f64, ExtractionError> {
    let price = text::parse_f64(text, None)
        .map_err(|why| ExtractionError::MalformedQuoteText(format!("price {:?}: {}", text, why)))?;

    if !price.is_finite() || price < 0.0 {
        return Err(ExtractionError::MalformedQuoteText(format!(
            "price {:?} is not a non-negative number",
            text
        )));
    }

    Ok(price)
}

/// The change region renders as two lines, the absolute change above the
/// percentage. Decoration lines after the first two are ignored. A leading
/// `+` is stripped before conversion, `-` is kept.
fn parse_change_lines(text: &str) -> Result<(f64, f64), ExtractionError> {
    let mut lines = text.trim().lines();

    let change_line = lines.next().ok_or_else(|| {
        ExtractionError::MalformedQuoteText(format!("change text {:?} is empty", text))
    })?;
    let percentage_line = lines.next().ok_or_else(|| {
        ExtractionError::MalformedQuoteText(format!(
            "change text {:?} has fewer than two lines",
            text
        ))
    })?;

    let change = text::parse_f64(change_line, Some(vec!['+'])).map_err(|why| {
        ExtractionError::MalformedQuoteText(format!("change {:?}: {}", change_line, why))
    })?;
    let change_percentage = text::parse_f64(percentage_line, Some(vec!['+'])).map_err(|why| {
        ExtractionError::MalformedQuoteText(format!("percentage {:?}: {}", percentage_line, why))
    })?;

    Ok((change, change_percentage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        logging,
        util::browser::fake::{FakePage, FakeSessionFactory},
    };

    fn salik_page() -> FakePage {
        FakePage::default()
            .with_region(PRICE_REGION, "5.270")
            .with_region(CHANGE_REGION, "+ 0.030\n+ 0.57%")
    }

    fn extractor_with(page: FakePage) -> (QuoteExtractor, Arc<FakeSessionFactory>) {
        let factory = Arc::new(FakeSessionFactory::new(page));
        (QuoteExtractor::new(factory.clone()), factory)
    }

    #[tokio::test]
    async fn test_stock_quote() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 stock_quote".to_string());

        let (extractor, factory) = extractor_with(salik_page());
        let quote = extractor.stock_quote("SALIK").await.unwrap();

        assert_eq!(quote.symbol, "SALIK");
        assert_eq!(quote.price, 5.27);
        assert_eq!(quote.change, 0.03);
        assert_eq!(quote.change_percentage, 0.57);
        assert_eq!(quote.change_percentage_display(), "+0.57%");
        assert_eq!(factory.opened_count(), 1);
        assert_eq!(factory.closed_count(), 1);

        logging::debug_file_async("結束 stock_quote".to_string());
    }

    #[tokio::test]
    async fn test_stock_quote_negative_change() {
        dotenv::dotenv().ok();

        let page = FakePage::default()
            .with_region(PRICE_REGION, "12.340")
            .with_region(CHANGE_REGION, "-0.060\n-1.122%");
        let (extractor, _factory) = extractor_with(page);

        let quote = extractor.stock_quote("DTC").await.unwrap();

        assert_eq!(quote.price, 12.34);
        assert_eq!(quote.change, -0.06);
        assert_eq!(quote.change_percentage, -1.122);
        assert_eq!(quote.change_percentage_display(), "-1.122%");
    }

    #[tokio::test]
    async fn test_stock_quote_is_idempotent() {
        dotenv::dotenv().ok();

        let (extractor, factory) = extractor_with(salik_page());

        let first = extractor.stock_quote("SALIK").await.unwrap();
        let second = extractor.stock_quote("SALIK").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(factory.opened_count(), 2);
        assert_eq!(factory.closed_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_region_releases_session() {
        dotenv::dotenv().ok();

        // the change region never materializes
        let page = FakePage::default().with_region(PRICE_REGION, "5.270");
        let (extractor, factory) = extractor_with(page);

        let why = extractor.stock_quote("SALIK").await.unwrap_err();

        assert!(matches!(why, ExtractionError::ElementNotFound { .. }));
        assert_eq!(factory.opened_count(), 1);
        assert_eq!(factory.closed_count(), 1);
    }

    #[tokio::test]
    async fn test_navigation_failure_releases_session() {
        dotenv::dotenv().ok();

        let page = FakePage::failing_navigation("page load timed out");
        let (extractor, factory) = extractor_with(page);

        let why = extractor.stock_quote("SALIK").await.unwrap_err();

        assert!(matches!(why, ExtractionError::NavigationTimeout { .. }));
        assert_eq!(factory.closed_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_change_text_releases_session() {
        dotenv::dotenv().ok();

        let page = FakePage::default()
            .with_region(PRICE_REGION, "5.270")
            .with_region(CHANGE_REGION, "+ 0.030");
        let (extractor, factory) = extractor_with(page);

        let why = extractor.stock_quote("SALIK").await.unwrap_err();

        assert!(matches!(why, ExtractionError::MalformedQuoteText(_)));
        assert_eq!(factory.closed_count(), 1);
    }

    #[tokio::test]
    async fn test_session_open_failure() {
        dotenv::dotenv().ok();

        let factory = Arc::new(FakeSessionFactory::failing_open("chrome not found"));
        let extractor = QuoteExtractor::new(factory.clone());

        let why = extractor.stock_quote("SALIK").await.unwrap_err();

        assert!(matches!(why, ExtractionError::SessionInit(_)));
        assert_eq!(factory.opened_count(), 0);
        assert_eq!(factory.closed_count(), 0);
    }

    #[test]
    fn test_parse_change_lines() {
        assert_eq!(parse_change_lines("+ 0.050\n+ 1.89%").unwrap(), (0.05, 1.89));
        assert_eq!(parse_change_lines("-0.060\n-1.122%").unwrap(), (-0.06, -1.122));
        // trailing decoration lines are ignored
        assert_eq!(
            parse_change_lines("+ 0.030\n+ 0.57%\n52 week range").unwrap(),
            (0.03, 0.57)
        );
        assert_eq!(parse_change_lines("0.000\n0.00%").unwrap(), (0.0, 0.0));

        assert!(matches!(
            parse_change_lines(""),
            Err(ExtractionError::MalformedQuoteText(_))
        ));
        assert!(matches!(
            parse_change_lines("+ 0.030"),
            Err(ExtractionError::MalformedQuoteText(_))
        ));
        assert!(matches!(
            parse_change_lines("abc\ndef"),
            Err(ExtractionError::MalformedQuoteText(_))
        ));
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("12.340").unwrap(), 12.34);
        assert_eq!(parse_price(" 5.270 \n").unwrap(), 5.27);
        assert_eq!(parse_price("0.000").unwrap(), 0.0);

        assert!(matches!(
            parse_price("-1.0"),
            Err(ExtractionError::MalformedQuoteText(_))
        ));
        assert!(matches!(
            parse_price("N/A"),
            Err(ExtractionError::MalformedQuoteText(_))
        ));
        assert!(matches!(
            parse_price(""),
            Err(ExtractionError::MalformedQuoteText(_))
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn test_stock_quote_live() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 stock_quote_live".to_string());

        let factory = Arc::new(crate::util::browser::chrome::ChromeSessionFactory::new(
            &SETTINGS.dfm,
        ));
        let extractor = QuoteExtractor::new(factory);

        match extractor.stock_quote("SALIK").await {
            Ok(quote) => {
                dbg!(&quote);
                logging::debug_file_async(format!("stock_quote : {:#?}", quote));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to stock_quote because {:?}", why));
            }
        }

        logging::debug_file_async("結束 stock_quote_live".to_string());
    }
}
