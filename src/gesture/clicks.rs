//! Rapid-click recognizer used when no multitouch device is available.

use super::{GestureDetected, GestureSource};
use crate::config::GestureConfig;
use crate::touch::Point;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickKind {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickEvent {
    pub kind: ClickKind,
    pub position: Point,
    pub timestamp: Instant,
}

pub struct ClickTracker {
    config: GestureConfig,
    history: VecDeque<(Instant, Point)>,
}

impl ClickTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            history: VecDeque::with_capacity(config.required_click_count),
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn handle_click(&mut self, click: &ClickEvent) -> Option<GestureDetected> {
        let now = click.timestamp;
        let position = click.position;

        let lookback = self.config.click_lookback();
        while let Some(&(first, _)) = self.history.front() {
            if now.saturating_duration_since(first) > lookback {
                self.history.pop_front();
            } else {
                break;
            }
        }

        let same_area = self.history.back().map_or(true, |(_, last)| {
            position.distance_to(last) <= self.config.max_distance_between_clicks
        });
        if !same_area {
            self.history.clear();
            self.history.push_back((now, position));
            debug!(
                "click 1 at ({:.0}, {:.0}), new sequence",
                position.x, position.y
            );
            return None;
        }

        self.history.push_back((now, position));
        debug!(
            "click {} at ({:.0}, {:.0})",
            self.history.len(),
            position.x,
            position.y
        );

        if self.history.len() < self.config.required_click_count {
            return None;
        }

        let first = self.history.front().map_or(now, |&(first, _)| first);
        let span = now.saturating_duration_since(first);
        if span <= self.config.click_sequence_window() {
            self.history.clear();
            Some(GestureDetected {
                source: GestureSource::RapidClicks,
                span,
            })
        } else {
            // too spread out: only the newest click starts the next sequence
            self.history.clear();
            self.history.push_back((now, position));
            None
        }
    }
}
