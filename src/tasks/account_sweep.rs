use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::services::AccountService;

/// Starts the background sweep over all accounts on `schedule`
/// (six-field cron with seconds, e.g. `0 */30 * * * *`, evaluated in UTC).
///
/// The returned scheduler must be kept alive for the job to keep firing.
pub async fn start_account_sweep_scheduler(
    accounts: Arc<AccountService>,
    schedule: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let accounts = Arc::clone(&accounts);

        Box::pin(async move {
            tracing::info!("⏰ Executing scheduled account sweep");
            execute_sweep(&accounts).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!("✅ Account sweep scheduler started ({})", schedule);
    Ok(scheduler)
}

async fn execute_sweep(accounts: &AccountService) {
    let start = std::time::Instant::now();

    match accounts.reconcile_all().await {
        Ok(states) => {
            tracing::info!(
                "✅ Scheduled sweep finished: {} accounts in {}ms",
                states.len(),
                start.elapsed().as_millis()
            );
        }
        Err(e) => {
            tracing::error!("❌ Scheduled sweep failed: {}", e);
        }
    }
}
