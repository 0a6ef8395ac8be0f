use chrono::{DateTime, Local, Timelike};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const HOUR: Duration = Duration::from_secs(3600);

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Time left until the top of the next clock hour strictly after `now`.
/// At exactly hh:00:00.000 this is a full hour.
pub fn delay_until_next_hour(now: &impl Timelike) -> Duration {
    let into_hour = Duration::from_secs(u64::from(now.minute()) * 60 + u64::from(now.second()))
        + Duration::from_nanos(u64::from(now.nanosecond() % 1_000_000_000));

    HOUR - into_hour
}

pub fn next_hour(now: DateTime<Local>) -> DateTime<Local> {
    let delay = delay_until_next_hour(&now);
    now + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::hours(1))
}

/// One-shot refresh timer. Scheduling again cancels the pending timer, so at
/// most one refresh is ever due.
pub struct RefreshScheduler {
    tx: mpsc::UnboundedSender<(u64, String)>,
    rx: mpsc::UnboundedReceiver<(u64, String)>,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            generation: 0,
            pending: None,
        }
    }

    pub fn schedule(&mut self, city: &str, delay: Duration) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let city = city.to_string();
        let tx = self.tx.clone();
        info!("Next refresh of {} in {} min", city, delay.as_secs() / 60);

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver lives as long as the scheduler.
            let _ = tx.send((generation, city));
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
            debug!("Cancelled pending refresh (generation {})", self.generation);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Waits for the pending timer and returns the city it was scheduled
    /// for. Returns `None` straight away when nothing is scheduled.
    pub async fn tick(&mut self) -> Option<String> {
        while self.pending.is_some() {
            let (generation, city) = self.rx.recv().await?;
            if generation == self.generation {
                self.pending = None;
                return Some(city);
            }
            debug!("Dropping stale refresh tick (generation {})", generation);
        }
        None
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
