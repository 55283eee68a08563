// src/tasks/daily_reset.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tracing::{error, info};

use cb2bot_common::traits::ChatSink;

use crate::services::greeter::GreetingTracker;

pub const RESET_ANNOUNCEMENT: &str = "/me Seen users list cleared!";

/// Spawns a task that clears the greeted-users set every midnight in `tz`.
pub fn spawn_daily_reset_task(
    greeter: Arc<GreetingTracker>,
    chat: Arc<dyn ChatSink>,
    tz: Tz,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = duration_until_next_midnight(Utc::now(), tz);
            info!("Next seen-users reset in {}s ({})", wait.as_secs(), tz);
            tokio::time::sleep(wait).await;
            run_daily_reset(&greeter, chat.as_ref()).await;
        }
    })
}

/// Clears the set and announces it; returns how many users were forgotten.
pub async fn run_daily_reset(greeter: &GreetingTracker, chat: &dyn ChatSink) -> usize {
    let cleared = greeter.reset();
    info!("Daily reset: forgot {} greeted user(s)", cleared);
    if let Err(e) = chat.send_message(RESET_ANNOUNCEMENT).await {
        error!("Daily reset announcement failed: {}", e);
    }
    cleared
}

/// Time from `now` until the next local midnight in `tz`.
///
/// In zones where midnight falls inside a DST gap, the first valid instant after it is used.
pub fn duration_until_next_midnight(now: DateTime<Utc>, tz: Tz) -> Duration {
    let today = now.with_timezone(&tz).date_naive();
    let Some(tomorrow) = today.succ_opt() else {
        return Duration::from_secs(24 * 60 * 60);
    };
    let naive_midnight = tomorrow.and_time(NaiveTime::MIN);

    let next = tz
        .from_local_datetime(&naive_midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(naive_midnight + chrono::Duration::hours(1)))
                .earliest()
        });

    match next {
        Some(next) => (next.with_timezone(&Utc) - now)
            .to_std()
            .unwrap_or(Duration::from_secs(1)),
        None => Duration::from_secs(24 * 60 * 60),
    }
}
