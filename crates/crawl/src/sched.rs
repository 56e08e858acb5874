// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Module: sched                                                       ┃
// ┃ Purpose: Night-window deferral with a clearable one-shot timer      ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-05                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;
use time::macros::time;
use time::{Duration, OffsetDateTime};

pub const WINDOW_START_HOUR: u8 = 2;
pub const WINDOW_END_HOUR: u8 = 4;

pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Deferred incremental crawls run between 02:00 and 04:00 local.
pub fn in_window(now: OffsetDateTime) -> bool {
    (WINDOW_START_HOUR..WINDOW_END_HOUR).contains(&now.hour())
}

pub fn next_window_start(now: OffsetDateTime) -> OffsetDateTime {
    let start = now.replace_time(time!(2:00));
    if now < start {
        start
    } else {
        start + Duration::days(1)
    }
}

pub fn delay_until(target: OffsetDateTime, now: OffsetDateTime) -> StdDuration {
    StdDuration::from_secs((target - now).whole_seconds().max(0) as u64)
}

/// Single-shot wall-clock timer on its own thread. Clearing (or dropping)
/// before the deadline suppresses the callback.
pub struct OneShotTimer {
    shared: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl OneShotTimer {
    pub fn arm<F: FnOnce() + Send + 'static>(delay: StdDuration, f: F) -> Self {
        let shared = Arc::new((Mutex::new(false), Condvar::new()));
        let thread_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            let (lock, cvar) = &*thread_shared;
            let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            let (guard, wait) = cvar
                .wait_timeout_while(guard, delay, |cleared| !*cleared)
                .unwrap_or_else(|e| e.into_inner());
            let fire = !*guard && wait.timed_out();
            drop(guard);
            if fire {
                f();
            }
        });
        Self { shared, handle: Some(handle) }
    }

    pub fn clear(&mut self) {
        let (lock, cvar) = &*self.shared;
        *lock.lock().unwrap_or_else(|e| e.into_inner()) = true;
        cvar.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for OneShotTimer {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use time::macros::datetime;

    #[test]
    fn window_membership() {
        assert!(!in_window(datetime!(2025-09-04 01:59 UTC)));
        assert!(in_window(datetime!(2025-09-04 02:00 UTC)));
        assert!(in_window(datetime!(2025-09-04 03:30 UTC)));
        assert!(!in_window(datetime!(2025-09-04 04:00 UTC)));
        assert!(!in_window(datetime!(2025-09-04 14:00 UTC)));
    }

    #[test]
    fn next_start_same_day_before_two() {
        let now = datetime!(2025-09-04 00:30 UTC);
        assert_eq!(next_window_start(now), datetime!(2025-09-04 02:00 UTC));
    }

    #[test]
    fn next_start_rolls_over_after_two() {
        let now = datetime!(2025-09-04 10:00 UTC);
        assert_eq!(next_window_start(now), datetime!(2025-09-05 02:00 UTC));
    }

    #[test]
    fn delay_is_never_negative() {
        let now = datetime!(2025-09-04 10:00 UTC);
        let past = datetime!(2025-09-04 09:00 UTC);
        assert_eq!(delay_until(past, now), StdDuration::ZERO);
        assert_eq!(delay_until(now + Duration::seconds(90), now), StdDuration::from_secs(90));
    }

    #[test]
    fn timer_fires_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let mut timer =
            OneShotTimer::arm(StdDuration::from_millis(20), move || flag.store(true, Ordering::SeqCst));
        std::thread::sleep(StdDuration::from_millis(200));
        timer.clear();
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn cleared_timer_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let mut timer =
            OneShotTimer::arm(StdDuration::from_secs(60), move || flag.store(true, Ordering::SeqCst));
        timer.clear();
        assert!(!fired.load(Ordering::SeqCst));
    }
}

//EOF
