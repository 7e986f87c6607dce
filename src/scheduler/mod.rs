//! Recurring background ticks for the two accrual tracks.
//!
//! Each track runs on its own thread and a tick always runs to completion
//! before the next fire time is computed, so ticks of the same track never
//! overlap. Teller-facing operations run concurrently against the same
//! shared store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};
use uuid::Uuid;

use crate::accrual;
use crate::store::Store;

const STOP_POLL: Duration = Duration::from_millis(500);
const DEBUG_TICK_SECONDS: i64 = 60;

/// Tick times for the two tracks. The defaults stagger the tracks by 30
/// minutes so they do not contend for the store at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub savings_tick: NaiveTime,
    pub fd_tick: NaiveTime,
    /// Forces both tracks to a once-per-minute cadence for test
    /// environments.
    pub debug_fast: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            savings_tick: NaiveTime::from_hms_opt(3, 30, 0).expect("valid default tick time"),
            fd_tick: NaiveTime::from_hms_opt(3, 0, 0).expect("valid default tick time"),
            debug_fast: false,
        }
    }
}

/// Handle over the two track threads; dropping it detaches them,
/// [`SchedulerHandle::shutdown`] stops and joins them.
pub struct SchedulerHandle {
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Spawns the savings and FD accrual tracks against the shared store.
pub fn spawn(store: Arc<Store>, config: ScheduleConfig) -> SchedulerHandle {
    let stop = Arc::new(AtomicBool::new(false));
    if config.debug_fast {
        tracing::warn!("interest schedulers in debug mode: forcing every-minute ticks");
    }
    let savings = spawn_track(
        "savings-interest",
        Arc::clone(&store),
        Arc::clone(&stop),
        config.savings_tick,
        config.debug_fast,
        |store, run_id| {
            accrual::run_savings_tick(store, Utc::now().date_naive(), run_id).map(|_| ())
        },
    );
    let fd = spawn_track(
        "fd-interest",
        store,
        Arc::clone(&stop),
        config.fd_tick,
        config.debug_fast,
        |store, run_id| accrual::run_fd_tick(store, Utc::now().date_naive(), run_id).map(|_| ()),
    );
    tracing::info!(
        savings_tick = %config.savings_tick,
        fd_tick = %config.fd_tick,
        debug_fast = config.debug_fast,
        "interest schedulers started"
    );
    SchedulerHandle {
        stop,
        threads: vec![savings, fd],
    }
}

fn spawn_track(
    name: &'static str,
    store: Arc<Store>,
    stop: Arc<AtomicBool>,
    tick_time: NaiveTime,
    debug_fast: bool,
    tick: impl Fn(&Store, Uuid) -> crate::errors::LedgerResult<()> + Send + 'static,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || loop {
            let next = next_fire_after(Utc::now(), tick_time, debug_fast);
            if !sleep_until(next, &stop) {
                return;
            }
            let run_id = Uuid::new_v4();
            if let Err(err) = tick(&store, run_id) {
                // A whole-tick failure (e.g. the due query itself) is
                // retried at the next fire time.
                tracing::error!(track = name, %run_id, error = %err, "accrual tick failed");
            }
        })
        .expect("scheduler thread spawn")
}

/// The next fire instant strictly after `now`: the next occurrence of
/// `tick_time` (today or tomorrow), or `now + 60s` in debug mode.
pub fn next_fire_after(
    now: DateTime<Utc>,
    tick_time: NaiveTime,
    debug_fast: bool,
) -> DateTime<Utc> {
    if debug_fast {
        return now + chrono::Duration::seconds(DEBUG_TICK_SECONDS);
    }
    let today = now.date_naive();
    let candidate = today.and_time(tick_time).and_utc();
    if candidate > now {
        candidate
    } else {
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        tomorrow.and_time(tick_time).and_utc()
    }
}

/// Sleeps until `deadline`, waking periodically to honor `stop`. Returns
/// false when stopped.
fn sleep_until(deadline: DateTime<Utc>, stop: &AtomicBool) -> bool {
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let remaining = deadline - Utc::now();
        if remaining <= chrono::Duration::zero() {
            return true;
        }
        let nap = remaining
            .to_std()
            .map(|d| d.min(STOP_POLL))
            .unwrap_or(STOP_POLL);
        thread::sleep(nap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, h, m, 0).unwrap()
    }

    #[test]
    fn fires_later_today_when_tick_is_ahead() {
        let tick = NaiveTime::from_hms_opt(3, 30, 0).unwrap();
        let next = next_fire_after(at(1, 0), tick, false);
        assert_eq!(next, at(3, 30));
    }

    #[test]
    fn fires_tomorrow_when_tick_has_passed() {
        let tick = NaiveTime::from_hms_opt(3, 0, 0).unwrap();
        let next = next_fire_after(at(12, 0), tick, false);
        assert_eq!(
            next,
            Utc.with_ymd_and_hms(2025, 6, 11, 3, 0, 0).unwrap()
        );
    }

    #[test]
    fn debug_mode_fires_every_minute() {
        let tick = NaiveTime::from_hms_opt(3, 0, 0).unwrap();
        let now = at(12, 0);
        assert_eq!(next_fire_after(now, tick, true), now + chrono::Duration::seconds(60));
    }

    #[test]
    fn shutdown_stops_idle_tracks() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let handle = spawn(store, ScheduleConfig::default());
        handle.shutdown();
    }
}
