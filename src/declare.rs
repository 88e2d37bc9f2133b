use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 報價快照
///
/// One symbol's price and change at the moment of extraction. Built fresh on
/// every fetch, never cached and never mutated afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    /// Last traded price, always non negative.
    pub price: f64,
    /// Absolute change against the previous close.
    pub change: f64,
    /// Percentage change kept as a plain signed number, 1.89 meaning +1.89%.
    pub change_percentage: f64,
}

impl Quote {
    /// Signed percent string for human facing payloads, e.g. "+0.57%".
    pub fn change_percentage_display(&self) -> String {
        format!("{:+}%", self.change_percentage)
    }

    /// Signed number without the percent sign, e.g. "+0.57", the form the
    /// tabular payloads carry.
    pub fn change_percentage_signed(&self) -> String {
        format!("{:+}", self.change_percentage)
    }
}

/// 擷取失敗的類別
///
/// Failure kinds surfaced by the quote extraction pipeline. Callers branch on
/// the kind, never on message text.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The rendering session could not be started or configured.
    #[error("rendering session init failed: {0}")]
    SessionInit(String),
    /// The page did not finish loading within the page load bound.
    #[error("navigation to {url} did not complete: {detail}")]
    NavigationTimeout { url: String, detail: String },
    /// A target region never materialized within the wait bound.
    #[error("target region {selector} not found: {detail}")]
    ElementNotFound { selector: String, detail: String },
    /// Region text was present but failed numeric or structural parsing.
    #[error("malformed quote text: {0}")]
    MalformedQuoteText(String),
}
