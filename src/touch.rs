//! Per-finger touch records and the set of fingers currently on the surface.

use std::collections::HashMap;
use std::time::Instant;
use tracing::trace;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Lifecycle of a single contact as reported by the touch provider.
///
/// The evdev provider only produces `Starting`, `Hovering`, `Touching` and
/// `Leaving`; the rest are part of the provider vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(not(test), allow(dead_code))]
pub enum TouchState {
    NotTouching,
    Starting,
    Hovering,
    Making,
    Touching,
    Breaking,
    Lingering,
    Leaving,
    /// A raw value the provider sent that we don't know about
    Unknown(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactCategory {
    Contacting,
    Leaving,
    Ignored,
}

impl TouchState {
    /// Decode the numeric state used by trackpad frame APIs (0..=7).
    #[cfg(test)]
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => TouchState::NotTouching,
            1 => TouchState::Starting,
            2 => TouchState::Hovering,
            3 => TouchState::Making,
            4 => TouchState::Touching,
            5 => TouchState::Breaking,
            6 => TouchState::Lingering,
            7 => TouchState::Leaving,
            other => TouchState::Unknown(other),
        }
    }

    pub fn category(&self) -> ContactCategory {
        match self {
            TouchState::Starting | TouchState::Making | TouchState::Touching => {
                ContactCategory::Contacting
            }
            TouchState::Breaking | TouchState::Leaving | TouchState::NotTouching => {
                ContactCategory::Leaving
            }
            TouchState::Hovering | TouchState::Lingering | TouchState::Unknown(_) => {
                ContactCategory::Ignored
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchRecord {
    pub id: i32,
    pub state: TouchState,
    /// Normalized device coordinates
    pub position: Point,
}

/// Every record the provider reported for one sync point.
#[derive(Clone, Debug)]
pub struct TouchFrame {
    pub timestamp: Instant,
    pub touches: Vec<TouchRecord>,
}

impl TouchFrame {
    pub fn new(timestamp: Instant, touches: Vec<TouchRecord>) -> Self {
        Self { timestamp, touches }
    }
}

/// Fingers currently in contact, keyed by contact id.
#[derive(Debug, Default, Clone)]
pub struct ActiveTouchSet {
    touches: HashMap<i32, TouchRecord>,
}

impl ActiveTouchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one frame and return the resulting finger count.
    ///
    /// Contacts missing from the frame are dropped first, since the provider
    /// reports every live contact on each frame.
    pub fn apply_frame(&mut self, touches: &[TouchRecord]) -> usize {
        self.touches
            .retain(|id, _| touches.iter().any(|touch| touch.id == *id));

        for touch in touches {
            match touch.state.category() {
                ContactCategory::Contacting => {
                    self.touches.insert(touch.id, *touch);
                }
                ContactCategory::Leaving => {
                    self.touches.remove(&touch.id);
                }
                ContactCategory::Ignored => {
                    trace!(id = touch.id, state = ?touch.state, "ignoring touch state");
                }
            }
        }

        self.touches.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.touches.values().map(|touch| touch.position)
    }
}
