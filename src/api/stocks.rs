use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde_derive::Serialize;

use crate::{
    api::ServiceFailure, config::SETTINGS, crawler::QuoteExtractor, declare::Quote, logging,
    util::datetime,
};

pub(crate) const CSV_HEADER: &str = "Symbol,Price (AED),Change,Change %,Last Update";

#[derive(Serialize, Debug)]
pub(crate) struct StockPayload {
    symbol: String,
    price: f64,
    change: f64,
    change_percentage: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct StocksResponse {
    stocks: Vec<StockPayload>,
}

#[derive(Serialize, Debug)]
pub(crate) struct RawRow {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Price")]
    price: f64,
    #[serde(rename = "Change")]
    change: f64,
    #[serde(rename = "ChangePercentage")]
    change_percentage: f64,
    #[serde(rename = "LastUpdate")]
    last_update: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct RawResponse {
    stocks: Vec<RawRow>,
}

#[derive(Serialize, Debug)]
pub(crate) struct MstrColumn {
    name: &'static str,
    #[serde(rename = "dataType")]
    data_type: &'static str,
}

#[derive(Serialize, Debug)]
pub(crate) struct MstrResponse {
    name: &'static str,
    columns: Vec<MstrColumn>,
    data: Vec<(String, f64, f64, f64)>,
}

#[derive(Serialize, Debug)]
pub(crate) struct TableResponse {
    #[serde(rename = "columnHeaders")]
    column_headers: Vec<&'static str>,
    rows: Vec<[String; 4]>,
}

/// Runs the extractor once per configured symbol, in configuration order. The
/// first failure aborts the whole request with the uniform failure response.
async fn fetch_all(extractor: &QuoteExtractor) -> Result<Vec<Quote>, ServiceFailure> {
    let mut quotes = Vec::with_capacity(SETTINGS.dfm.symbols.len());

    for symbol in &SETTINGS.dfm.symbols {
        match extractor.stock_quote(symbol).await {
            Ok(quote) => quotes.push(quote),
            Err(why) => {
                logging::error_file_async(format!(
                    "Failed to fetch stock quote({}) because {:?}",
                    symbol, why
                ));
                return Err(ServiceFailure);
            }
        }
    }

    Ok(quotes)
}

/// GET /api/v1/stocks
pub(crate) async fn stocks(
    State(extractor): State<Arc<QuoteExtractor>>,
) -> Result<Json<StocksResponse>, ServiceFailure> {
    let quotes = fetch_all(&extractor).await?;

    Ok(Json(stocks_payload(&quotes)))
}

/// GET /api/v1/stocks/raw
pub(crate) async fn stocks_raw(
    State(extractor): State<Arc<QuoteExtractor>>,
) -> Result<Response, ServiceFailure> {
    let quotes = fetch_all(&extractor).await?;
    let now = datetime::now_iso8601();

    Ok((no_cache_headers(&now), Json(raw_payload(&quotes, &now))).into_response())
}

/// GET /api/v1/stocks/mstr
pub(crate) async fn stocks_mstr(
    State(extractor): State<Arc<QuoteExtractor>>,
) -> Result<Response, ServiceFailure> {
    let quotes = fetch_all(&extractor).await?;
    let now = datetime::now_iso8601();

    Ok((no_cache_headers(&now), Json(mstr_payload(&quotes))).into_response())
}

/// GET /api/v1/stocks/csv, a download with an attachment disposition.
pub(crate) async fn stocks_csv(
    State(extractor): State<Arc<QuoteExtractor>>,
) -> Result<Response, ServiceFailure> {
    let quotes = fetch_all(&extractor).await?;
    let now = datetime::now_iso8601();
    let filename = format!("dfm_stocks_{}.csv", datetime::filename_timestamp());

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache"),
    );
    if let Ok(disposition) = HeaderValue::from_str(&format!("attachment; filename={}", filename)) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok((headers, csv_payload(&quotes, &now)).into_response())
}

/// GET /api/v1/stocks/csv/simple, plain text for the snapshot job and other
/// line oriented consumers.
pub(crate) async fn stocks_csv_simple(
    State(extractor): State<Arc<QuoteExtractor>>,
) -> Result<Response, ServiceFailure> {
    let quotes = fetch_all(&extractor).await?;
    let now = datetime::now_iso8601();

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        simple_csv_payload(&quotes, &now),
    )
        .into_response())
}

/// GET /api/v1/stocks/data
pub(crate) async fn stocks_data(
    State(extractor): State<Arc<QuoteExtractor>>,
) -> Result<Json<TableResponse>, ServiceFailure> {
    let quotes = fetch_all(&extractor).await?;

    Ok(Json(table_payload(&quotes)))
}

fn no_cache_headers(now: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache"),
    );
    if let Ok(stamp) = HeaderValue::from_str(now) {
        headers.insert("x-data-timestamp", stamp);
    }
    headers
}

fn stocks_payload(quotes: &[Quote]) -> StocksResponse {
    StocksResponse {
        stocks: quotes
            .iter()
            .map(|quote| StockPayload {
                symbol: quote.symbol.clone(),
                price: quote.price,
                change: quote.change,
                change_percentage: quote.change_percentage_display(),
            })
            .collect(),
    }
}

fn raw_payload(quotes: &[Quote], now: &str) -> RawResponse {
    RawResponse {
        stocks: quotes
            .iter()
            .map(|quote| RawRow {
                symbol: quote.symbol.clone(),
                price: quote.price,
                change: quote.change,
                change_percentage: quote.change_percentage,
                last_update: now.to_string(),
            })
            .collect(),
    }
}

fn mstr_payload(quotes: &[Quote]) -> MstrResponse {
    MstrResponse {
        name: "DFM Stocks Data",
        columns: vec![
            MstrColumn {
                name: "Symbol",
                data_type: "string",
            },
            MstrColumn {
                name: "Price",
                data_type: "double",
            },
            MstrColumn {
                name: "Change",
                data_type: "double",
            },
            MstrColumn {
                name: "ChangePercentage",
                data_type: "double",
            },
        ],
        data: quotes
            .iter()
            .map(|quote| {
                (
                    quote.symbol.clone(),
                    quote.price,
                    quote.change,
                    quote.change_percentage,
                )
            })
            .collect(),
    }
}

fn table_payload(quotes: &[Quote]) -> TableResponse {
    TableResponse {
        column_headers: vec!["Symbol", "Price", "Change", "ChangePercentage"],
        rows: quotes
            .iter()
            .map(|quote| {
                [
                    quote.symbol.clone(),
                    quote.price.to_string(),
                    quote.change.to_string(),
                    quote.change_percentage_signed(),
                ]
            })
            .collect(),
    }
}

/// CRLF terminated CSV with a numeric percentage column.
fn csv_payload(quotes: &[Quote], now: &str) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push_str("\r\n");

    for quote in quotes {
        out.push_str(&format!(
            "{},{},{},{},{}\r\n",
            quote.symbol, quote.price, quote.change, quote.change_percentage, now
        ));
    }

    out
}

/// LF terminated CSV with a signed percentage column, e.g. "+0.57".
fn simple_csv_payload(quotes: &[Quote], now: &str) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for quote in quotes {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            quote.symbol,
            quote.price,
            quote.change,
            quote.change_percentage_signed(),
            now
        ));
    }

    out
}
