use std::future::Future;

use anyhow::{Error, Result};
use tokio::task;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_retry::{strategy::FixedInterval, Retry};

use crate::{event, logging};

/// 啟動排程
///
/// The snapshot job first waits for the local API to come up, retrying every
/// five seconds, then runs on a five minute cadence.
pub async fn start(sched: &JobScheduler) -> Result<()> {
    sched.start().await?;

    let s = sched.clone();

    task::spawn(async move {
        // 等待本機 API 可用後才排入週期性工作
        let first_snapshot = Retry::spawn(FixedInterval::from_millis(5000), || async {
            event::snapshot::execute().await.map_err(|why| {
                logging::debug_file_async(format!(
                    "Stock snapshot not ready yet because {:?}",
                    why
                ));
                why
            })
        })
        .await;

        if let Err(why) = first_snapshot {
            logging::error_file_async(format!("Failed to snapshot::execute because {:?}", why));
        }

        //                 sec  min  hour  day of month  month  day of week
        // UTC 時間，每五分鐘更新一次快照
        if let Ok(j) = create_job("0 */5 * * * *", event::snapshot::execute) {
            if let Err(why) = s.add(j).await {
                logging::error_file_async(format!("{:?}", why));
            }
        }
    });

    logging::info_file_async("Scheduler started".to_string());

    Ok(())
}

fn create_job<F, Fut>(cron_expr: &'static str, task: F) -> Result<Job>
where
    F: Fn() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    Ok(Job::new_async(cron_expr, move |_uuid, _l| {
        let task = task.clone();
        Box::pin(async move {
            if let Err(why) = task().await {
                logging::error_file_async(format!(
                    "Failed to execute task({}) because {:?}",
                    cron_expr, why
                ));
            }
        })
    })?)
}

#[cfg(test)]
mod tests {
    // 注意這個慣用法：在 tests 模組中，從外部範疇匯入所有名字。
    use super::*;

    #[tokio::test]
    async fn test_create_job() {
        assert!(create_job("0 */5 * * * *", event::snapshot::execute).is_ok());
        assert!(create_job("not a cron", event::snapshot::execute).is_err());
    }

    #[tokio::test]
    #[ignore]
    async fn test_start() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 scheduler::start".to_string());

        let sched = JobScheduler::new().await.expect("JobScheduler::new");
        start(&sched).await.expect("scheduler should start");

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;

        logging::debug_file_async("結束 scheduler::start".to_string());
    }
}
