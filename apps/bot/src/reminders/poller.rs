//! Reminder delivery.
//!
//! Each poll scans the last `SCAN_WINDOW_SECS` discrete seconds with an
//! exact-match lookup per second. A reminder whose second is not covered by
//! any poll (late or skipped tick) is never delivered.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::messaging::Notifier;
use crate::models::reminder::ReminderRow;
use crate::replies;
use crate::store::ChatStore;

/// Seconds covered by one poll, ending at (and including) the poll time.
pub const SCAN_WINDOW_SECS: i64 = 60;

pub struct ReminderPoller {
    store: Arc<dyn ChatStore>,
    notifier: Arc<dyn Notifier>,
}

impl ReminderPoller {
    pub fn new(store: Arc<dyn ChatStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Delivers every reminder due in `[now - 59, now]` and returns how many
    /// were deleted.
    pub async fn poll(&self, now: i64) -> usize {
        let mut delivered = 0;

        for offset in 0..SCAN_WINDOW_SECS {
            let second = now - offset;
            let due = match self.store.reminders_at(second).await {
                Ok(due) => due,
                Err(e) => {
                    warn!("Reminder lookup for second {second} failed: {e}");
                    continue;
                }
            };

            for reminder in due {
                if self.deliver(&reminder).await {
                    delivered += 1;
                }
            }
        }

        delivered
    }

    /// Sends, then deletes regardless of the send outcome. Returns whether
    /// this call removed the record.
    async fn deliver(&self, reminder: &ReminderRow) -> bool {
        info!(
            "Delivering reminder {} to {}",
            reminder.reminder_id, reminder.phone_number
        );

        if let Err(e) = self
            .notifier
            .send(
                &reminder.phone_number,
                &replies::reminder_notification(&reminder.message),
            )
            .await
        {
            warn!(
                "Reminder {} could not be sent and is dropped: {e}",
                reminder.reminder_id
            );
        }

        match self.store.delete_reminder(&reminder.reminder_id).await {
            Ok(true) => true,
            Ok(false) => {
                debug!("Reminder {} was already removed", reminder.reminder_id);
                false
            }
            Err(e) => {
                warn!("Failed to delete reminder {}: {e}", reminder.reminder_id);
                false
            }
        }
    }
}

/// Polls on a fixed interval until the task is dropped.
pub async fn run_poller(poller: Arc<ReminderPoller>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Reminder poller started (every {}s)", every.as_secs());
    loop {
        ticker.tick().await;
        let delivered = poller.poll(Utc::now().timestamp()).await;
        info!("{delivered} reminder(s) delivered");
    }
}
