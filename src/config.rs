use std::time::Duration;

/// Timing and distance limits for both recognizers.
///
/// Built once at startup and handed out by value; nothing mutates it afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Exact number of contacts that arms a tap
    pub minimum_fingers: usize,
    /// Longest 3-down to 0-down span that still counts as a tap (inclusive)
    pub max_tap_duration: Duration,
    /// How long a wrong finger count may persist before the tap is abandoned
    pub finger_count_tolerance: Duration,
    pub max_time_between_clicks: Duration,
    /// Euclidean radius, in device units, for clicks to join a sequence
    pub max_distance_between_clicks: f64,
    pub required_click_count: usize,
    /// Pause between the synthetic middle down and up
    pub click_release_delay: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            minimum_fingers: 3,
            max_tap_duration: Duration::from_millis(300),
            finger_count_tolerance: Duration::from_millis(100),
            max_time_between_clicks: Duration::from_millis(150),
            max_distance_between_clicks: 10.0,
            required_click_count: 3,
            click_release_delay: Duration::from_millis(16),
        }
    }
}

impl GestureConfig {
    /// Clicks older than this relative to the newest one are evicted.
    pub fn click_lookback(&self) -> Duration {
        self.max_time_between_clicks * self.required_click_count as u32
    }

    /// Longest first-to-last span for a complete click sequence.
    pub fn click_sequence_window(&self) -> Duration {
        self.max_time_between_clicks * self.required_click_count.saturating_sub(1) as u32
    }
}
