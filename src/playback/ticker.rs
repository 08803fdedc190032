// SPDX-License-Identifier: MPL-2.0
//! Periodic tick driver on the tokio runtime.

use super::weak_proxy::{TickTarget, WeakProxy};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Ticks `proxy` every `interval` until its target is dropped or finished.
///
/// The task holds only the weak proxy, so dropping the last strong reference
/// to the target ends the task on its next tick.
///
/// Must be called from within a tokio runtime.
pub fn spawn_ticker<T>(proxy: WeakProxy<T>, interval: Duration) -> JoinHandle<()>
where
    T: TickTarget + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last = ticker.tick().await;
        loop {
            let now: Instant = ticker.tick().await;
            if proxy.is_finished() {
                break;
            }
            proxy.tick(now.duration_since(last));
            last = now;
        }

        tracing::debug!("ticker stopped");
    })
}
