use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::application::use_cases::notification::NotificationUseCases;

const POLL_INTERVAL_SECS: u64 = 2;
const RETRY_SWEEP_INTERVAL_SECS: u64 = 1;
const BATCH_SIZE: usize = 50;
const MAX_CONCURRENT_DELIVERIES: usize = 10;

pub async fn run_notification_worker(notification_uc: Arc<NotificationUseCases>) {
    let mut delivery_ticker = interval(Duration::from_secs(POLL_INTERVAL_SECS));
    let mut retry_ticker = interval(Duration::from_secs(RETRY_SWEEP_INTERVAL_SECS));

    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_DELIVERIES));

    info!(
        "Notification worker started (polling every {}s, max {} concurrent)",
        POLL_INTERVAL_SECS, MAX_CONCURRENT_DELIVERIES
    );

    loop {
        tokio::select! {
            _ = delivery_ticker.tick() => {
                process_batch(&notification_uc, &semaphore).await;
            }
            _ = retry_ticker.tick() => {
                promote_retries(&notification_uc).await;
            }
        }
    }
}

/// Claims one batch and delivers it. Returns how many tasks were claimed.
pub async fn process_batch(
    notification_uc: &Arc<NotificationUseCases>,
    semaphore: &Arc<Semaphore>,
) -> usize {
    let tasks = match notification_uc.claim_pending(BATCH_SIZE).await {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to claim pending notifications");
            return 0;
        }
    };

    if tasks.is_empty() {
        return 0;
    }

    let count = tasks.len();
    debug!(count, "Processing notifications");

    let mut handles = Vec::with_capacity(count);

    for task in tasks {
        let uc = Arc::clone(notification_uc);
        let sem = Arc::clone(semaphore);

        handles.push(tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            if let Err(e) = uc.deliver(&task).await {
                error!(task_id = %task.id, error = %e, "Failed to reschedule notification");
            }
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Notification delivery task panicked");
        }
    }

    count
}

async fn promote_retries(notification_uc: &NotificationUseCases) {
    match notification_uc.promote_due_retries().await {
        Ok(0) => {}
        Ok(moved) => debug!(moved, "Requeued notifications due for retry"),
        Err(e) => error!(error = %e, "Failed to requeue notifications due for retry"),
    }
}
