//! Maps kernel and libinput event times onto the engine's `Instant` clock.

use std::time::{Duration, Instant, SystemTime};

/// Events older than this are assumed to come from a clock we misread.
const MAX_EVENT_AGE: Duration = Duration::from_secs(1);

/// Instant at which an event `age` old happened, relative to `now`.
///
/// Unknown or implausible ages fall back to `now`.
pub fn event_instant(now: Instant, age: Option<Duration>) -> Instant {
    match age {
        Some(age) if age <= MAX_EVENT_AGE => now.checked_sub(age).unwrap_or(now),
        _ => now,
    }
}

/// Evdev timestamps are wall-clock by default.
pub fn from_system_time(at: SystemTime) -> Instant {
    let age = SystemTime::now().duration_since(at).ok();
    event_instant(Instant::now(), age)
}

/// Libinput timestamps are `CLOCK_MONOTONIC` microseconds.
pub fn from_monotonic_usec(usec: u64) -> Instant {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let now = Instant::now();
    if unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) } != 0 {
        return now;
    }
    let mono = Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32);
    event_instant(now, mono.checked_sub(Duration::from_micros(usec)))
}
