use std::path::Path;

use anyhow::Result;

use crate::{config::SETTINGS, logging, util};

/// 將最新報價寫入快照檔
///
/// Pulls the simple CSV endpoint on the local API and persists the body to
/// the snapshot path, so /static/stocks.csv always serves the latest run.
pub async fn execute() -> Result<()> {
    let url = format!(
        "http://127.0.0.1:{}/api/v1/stocks/csv/simple",
        SETTINGS.system.port
    );
    let body = util::http::get(&url, None).await?;

    persist(&SETTINGS.snapshot.path, &body).await?;

    logging::info_file_async(format!(
        "Stock snapshot refreshed at {}",
        SETTINGS.snapshot.path
    ));

    Ok(())
}

async fn persist(path: &str, body: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    tokio::fs::write(path, body).await?;

    Ok(())
}
