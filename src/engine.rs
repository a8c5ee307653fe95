//! Single-threaded gesture engine.
//!
//! Owns all recognizer state. Every input reaches it through one queue and the
//! tolerance deadline is fired from the same loop, so nothing here is shared.

use crate::config::GestureConfig;
use crate::emitter::{ActionEmitter, InputSink, PointerLocator};
use crate::gesture::clicks::{ClickEvent, ClickTracker};
use crate::gesture::tap::TapTracker;
use crate::gesture::GestureDetected;
use crate::touch::{ActiveTouchSet, TouchFrame};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

const IDLE_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum EngineEvent {
    Touches(TouchFrame),
    Click(ClickEvent),
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingMode {
    Touch,
    Click,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub frames: u64,
    pub clicks: u64,
    pub gestures: u64,
    pub failed_emissions: u64,
}

pub struct GestureEngine<S, P> {
    mode: TrackingMode,
    touches: ActiveTouchSet,
    tap: TapTracker,
    clicks: ClickTracker,
    emitter: ActionEmitter<S, P>,
    stats: EngineStats,
}

impl<S: InputSink, P: PointerLocator> GestureEngine<S, P> {
    pub fn new(mode: TrackingMode, config: GestureConfig, sink: S, pointer: P) -> Self {
        Self {
            mode,
            touches: ActiveTouchSet::new(),
            tap: TapTracker::new(config),
            clicks: ClickTracker::new(config),
            emitter: ActionEmitter::new(sink, pointer, config.click_release_delay),
            stats: EngineStats::default(),
        }
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Process events until `Shutdown` arrives or every sender is gone.
    pub fn run(&mut self, events: mpsc::Receiver<EngineEvent>) -> EngineStats {
        loop {
            let wait = match self.tap.reset_deadline() {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => IDLE_WAIT,
            };

            match events.recv_timeout(wait) {
                Ok(EngineEvent::Shutdown) => {
                    debug!("shutdown requested");
                    break;
                }
                Ok(event) => self.handle(event),
                Err(RecvTimeoutError::Timeout) => self.fire_timers(Instant::now()),
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("all input sources closed");
                    break;
                }
            }
        }
        self.stats
    }

    pub fn handle(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Touches(frame) => self.handle_frame(&frame),
            EngineEvent::Click(click) => self.handle_click(&click),
            EngineEvent::Shutdown => {}
        }
    }

    pub fn fire_timers(&mut self, now: Instant) {
        self.tap.expire(now);
    }

    fn handle_frame(&mut self, frame: &TouchFrame) {
        if self.mode != TrackingMode::Touch {
            trace!("touch frame ignored in click mode");
            return;
        }
        self.stats.frames += 1;

        let was_active = self.tap.session().active;
        let fingers = self.touches.apply_frame(&frame.touches);
        let detected = self.tap.update(fingers, frame.timestamp);

        if !was_active && self.tap.session().active {
            let positions: Vec<String> = self
                .touches
                .positions()
                .map(|p| format!("({:.3}, {:.3})", p.x, p.y))
                .collect();
            debug!("initial positions: {}", positions.join(", "));
        }

        if let Some(gesture) = detected {
            self.dispatch(&gesture);
        }
    }

    fn handle_click(&mut self, click: &ClickEvent) {
        if self.mode != TrackingMode::Click {
            trace!("click ignored in touch mode");
            return;
        }
        self.stats.clicks += 1;
        trace!(kind = ?click.kind, pending = self.clicks.len(), "click received");

        if let Some(gesture) = self.clicks.handle_click(click) {
            self.dispatch(&gesture);
        }
    }

    fn dispatch(&mut self, gesture: &GestureDetected) {
        info!(
            "{:?} detected after {:.3}s",
            gesture.source,
            gesture.span.as_secs_f64()
        );
        if self.emitter.emit_or_log(gesture) {
            self.stats.gestures += 1;
        } else {
            self.stats.failed_emissions += 1;
        }
    }

    #[cfg(test)]
    fn is_pristine(&self) -> bool {
        self.touches.is_empty()
            && self.tap.session() == crate::gesture::tap::GestureSession::default()
            && self.clicks.is_empty()
    }
}
