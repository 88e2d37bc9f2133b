use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use once_cell::sync::{Lazy, OnceCell};
use reqwest::{header, Client, Method, Response};
use tokio::sync::Semaphore;

use crate::logging::Logger;

pub mod user_agent;

/// 限制最多 5 個並發請求，避免被目標網站封禁。
static SEMAPHORE: Lazy<Semaphore> = Lazy::new(|| Semaphore::new(5));

/// Shared client, built once on first use.
static CLIENT: OnceCell<Client> = OnceCell::new();

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

/// HTTP 請求失敗時的最大重試次數。
const MAX_RETRIES: u32 = 2;

/// 每次請求後的禮貌性延遲
const COOL_DOWN: Duration = Duration::from_millis(300);

fn get_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .brotli(true)
            .gzip(true)
            .connect_timeout(Duration::from_secs(8))
            .timeout(Duration::from_secs(15))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .referer(true)
            .user_agent(user_agent::gen_random_ua())
            .build()
            .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))
    })
}

/// GET `url` and return the response body as text.
///
/// # Arguments
///
/// * `url`: Target of the request.
/// * `headers`: Extra headers to attach, on top of the client defaults.
///
/// # Returns
///
/// * `Result<String>`: The body text, or an error once every send attempt
///   has failed or the body cannot be decoded.
pub async fn get(url: &str, headers: Option<header::HeaderMap>) -> Result<String> {
    send(Method::GET, url, headers)
        .await?
        .text()
        .await
        .map_err(|e| anyhow!("Error parsing response text: {:?}", e))
}

/// Sends one request with up to MAX_RETRIES attempts. Each attempt holds a
/// semaphore permit, logs its latency, and on failure backs off with a delay
/// that doubles per attempt. The final error carries the attempt count and
/// the last underlying failure.
async fn send(
    method: Method,
    url: &str,
    headers: Option<header::HeaderMap>,
) -> Result<Response> {
    let client = get_client()?;
    let mut request = client.request(method.clone(), url);
    if let Some(h) = headers {
        request = request.headers(h);
    }

    let mut last_error = String::new();

    for attempt in 1..=MAX_RETRIES {
        let prepared = request
            .try_clone()
            .ok_or_else(|| anyhow!("Failed to clone RequestBuilder"))?;

        let _permit = SEMAPHORE.acquire().await;
        let started = Instant::now();
        let outcome = prepared.send().await;
        let elapsed = started.elapsed().as_millis();

        // 請求延遲，避免被目標網站封禁
        tokio::time::sleep(COOL_DOWN).await;
        drop(_permit);

        match outcome {
            Ok(response) => {
                LOGGER.info(format!(
                    "{} {} ({} ms, attempt {})",
                    method, url, elapsed, attempt
                ));
                return Ok(response);
            }
            Err(why) => {
                last_error = format!("{:?}", why);
                LOGGER.error(format!(
                    "{} {} failed after {} ms on attempt {} because {:?}",
                    method, url, elapsed, attempt, why
                ));
            }
        }

        if attempt < MAX_RETRIES {
            tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
        }
    }

    Err(anyhow!(
        "Failed to send request to {} after {} attempts; last error: {}",
        url,
        MAX_RETRIES,
        last_error
    ))
}
