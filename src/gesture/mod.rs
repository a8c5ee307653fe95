pub mod clicks;
pub mod tap;

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureSource {
    ThreeFingerTap,
    RapidClicks,
}

/// Raised by a tracker once its input has been classified as the gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GestureDetected {
    pub source: GestureSource,
    /// Time from the first qualifying input to the completing one
    pub span: Duration,
}
