use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveTime};
use tracing::{error, info, warn};

const CHECK_INTERVAL: Duration = Duration::from_millis(500);

/// Daily trigger driven by a plain-text `HH:MM` schedule file.
///
/// The file is re-read on every check so the trigger time can be changed
/// while the watcher is running.
pub struct Watcher {
    schedule_path: PathBuf,
    last_check: DateTime<Local>,
}

impl Watcher {
    pub fn new(schedule_path: PathBuf) -> Self {
        Self {
            schedule_path,
            last_check: Local::now(),
        }
    }

    /// True when `now` has crossed today's scheduled time since the last
    /// check. Fires at most once per crossing: a hit advances `last_check`
    /// past the trigger. An unreadable schedule skips the check.
    pub fn due(&mut self, now: DateTime<Local>) -> bool {
        let scheduled = match self.scheduled_time(now) {
            Ok(t) => t,
            Err(e) => {
                warn!(
                    "Unreadable schedule {}: {e:#}",
                    self.schedule_path.display()
                );
                return false;
            }
        };
        if self.last_check < scheduled && now > scheduled {
            self.last_check = now;
            return true;
        }
        false
    }

    fn scheduled_time(&self, now: DateTime<Local>) -> Result<DateTime<Local>> {
        let raw = std::fs::read_to_string(&self.schedule_path)?;
        let time = parse_schedule(&raw)?;
        now.date_naive()
            .and_time(time)
            .and_local_timezone(Local)
            .earliest()
            .context("scheduled time does not exist in the local timezone")
    }
}

/// Parse an `HH:MM` trigger time.
fn parse_schedule(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .with_context(|| format!("expected HH:MM, got {:?}", raw.trim()))
}

/// Check the schedule roughly every half second forever, running `run`
/// once per daily trigger. A failed run is logged; the loop keeps going.
pub async fn watch<F, Fut>(schedule_path: PathBuf, mut run: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut watcher = Watcher::new(schedule_path);
    loop {
        if watcher.due(Local::now()) {
            info!("Scheduled scrape triggered");
            if let Err(e) = run().await {
                error!("Scrape run failed: {e:#}");
            }
        }
        tokio::time::sleep(CHECK_INTERVAL).await;
    }
}
