pub mod api;
pub mod config;
pub mod crawler;
pub mod declare;
pub mod event;
pub mod logging;
pub mod scheduler;
pub mod util;

use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::JobScheduler;

use crate::{
    config::SETTINGS, crawler::QuoteExtractor, util::browser::chrome::ChromeSessionFactory,
};

#[cfg(all(target_os = "linux", target_env = "musl"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let sessions = Arc::new(ChromeSessionFactory::new(&SETTINGS.dfm));
    let extractor = Arc::new(QuoteExtractor::new(sessions));

    let sched = JobScheduler::new().await?;
    scheduler::start(&sched).await?;

    api::serve(extractor).await
}
