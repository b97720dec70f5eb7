//! Clocks and timers.

use crate::subscription::Subscription;
use crate::task::Task;
use futures::StreamExt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock time in milliseconds since the Unix epoch.
pub type Millis = u64;

/// A task that reads the current wall-clock time.
///
/// A clock set before 1970 reads as `0`.
pub fn now() -> Task<Millis> {
    Task::new(|| async {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|elapsed| Millis::try_from(elapsed.as_millis()).ok())
            .unwrap_or(0)
    })
}

/// A subscription that reads the clock every `interval`.
///
/// The timer is restarted whenever the model changes, so the first tick
/// after a change arrives one full `interval` later.
///
/// ```rust,ignore
/// fn subscriptions(model: &Model) -> Subscription<Msg> {
///     every(Duration::from_secs(1), Msg::Tick)
/// }
/// ```
pub fn every<Msg: Send + 'static>(
    interval: Duration,
    f: impl Fn(Millis) -> Msg + Send + Sync + 'static,
) -> Subscription<Msg> {
    let clock = now();
    Subscription::new(move || {
        tokio_stream::wrappers::IntervalStream::new(interval_after(interval))
            .then(move |_| clock.run())
            .map(f)
    })
}

// First tick one interval from now, like a JavaScript `setInterval`.
fn interval_after(period: Duration) -> tokio::time::Interval {
    tokio::time::interval_at(tokio::time::Instant::now() + period, period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::SubscriptionSwitch;
    use std::sync::Arc;

    #[tokio::test]
    async fn now_reads_wall_clock() {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as Millis;
        let read = now().run().await;
        assert!(read >= before);
    }

    #[tokio::test(start_paused = true)]
    async fn every_waits_one_interval_before_first_tick() {
        let started = tokio::time::Instant::now();
        let mut ticks = SubscriptionSwitch::new(
            futures::stream::iter([()]).boxed(),
            Arc::new(|_: &()| every(Duration::from_millis(100), |at| at)),
        );
        assert!(ticks.next().await.is_some());
        assert!(ticks.next().await.is_some());
        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}
