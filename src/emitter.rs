//! Turns a detected gesture into a synthetic middle click.

use crate::gesture::GestureDetected;
use crate::input::InputError;
use crate::touch::Point;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Middle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseEventKind {
    Down,
    Up,
}

/// A synthetic button event ready to hand to an [`InputSink`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub button: MouseButton,
    pub position: Point,
    pub click_state: u32,
}

impl MouseEvent {
    pub fn middle(kind: MouseEventKind, position: Point) -> Result<Self, EmitError> {
        if !position.is_finite() {
            return Err(EmitError::InvalidPosition {
                x: position.x,
                y: position.y,
            });
        }
        Ok(Self {
            kind,
            button: MouseButton::Middle,
            position,
            click_state: 1,
        })
    }
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("cannot build mouse event at ({x}, {y})")]
    InvalidPosition { x: f64, y: f64 },
    #[error("failed to post mouse event: {0}")]
    Inject(#[from] InputError),
}

/// Where synthetic events go.
pub trait InputSink {
    fn post(&mut self, event: &MouseEvent) -> Result<(), InputError>;
}

/// Current on-screen pointer position, if known.
pub trait PointerLocator {
    fn location(&self) -> Option<Point>;
}

pub struct ActionEmitter<S, P> {
    sink: S,
    pointer: P,
    release_delay: Duration,
}

impl<S: InputSink, P: PointerLocator> ActionEmitter<S, P> {
    pub fn new(sink: S, pointer: P, release_delay: Duration) -> Self {
        Self {
            sink,
            pointer,
            release_delay,
        }
    }

    /// Post a middle down/up pair at the pointer.
    ///
    /// Both events are built before anything is posted, so a construction
    /// failure never leaves the button held.
    pub fn emit(&mut self, gesture: &GestureDetected) -> Result<(), EmitError> {
        let location = self.pointer.location().unwrap_or(Point::ORIGIN);
        info!(
            source = ?gesture.source,
            "generating middle click at ({:.0}, {:.0})",
            location.x,
            location.y
        );

        let down = MouseEvent::middle(MouseEventKind::Down, location)?;
        let up = MouseEvent::middle(MouseEventKind::Up, location)?;

        self.sink.post(&down)?;
        thread::sleep(self.release_delay);
        if let Err(e) = self.sink.post(&up) {
            // the button is held at this point; one more try before giving up
            warn!("middle release failed, retrying: {}", e);
            if let Err(retry) = self.sink.post(&up) {
                error!("middle button may be left pressed: {}", retry);
            }
            return Err(e.into());
        }

        debug!("middle click posted");
        Ok(())
    }

    /// Like [`emit`](Self::emit) but logs and drops the gesture on failure.
    pub fn emit_or_log(&mut self, gesture: &GestureDetected) -> bool {
        match self.emit(gesture) {
            Ok(()) => true,
            Err(e) => {
                error!("dropping middle click: {}", e);
                false
            }
        }
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::Cell;
    use std::time::Instant;

    #[derive(Default)]
    pub struct RecordingSink {
        pub posted: Vec<(MouseEvent, Instant)>,
        pub fail_on: Option<MouseEventKind>,
        /// Only the first post matching `fail_on` fails
        pub fail_once: bool,
        pub failed: bool,
    }

    impl InputSink for RecordingSink {
        fn post(&mut self, event: &MouseEvent) -> Result<(), InputError> {
            if self.fail_on == Some(event.kind) && !(self.fail_once && self.failed) {
                self.failed = true;
                return Err(InputError::SendEvent("sink closed".to_string()));
            }
            self.posted.push((*event, Instant::now()));
            Ok(())
        }
    }

    pub struct FixedPointer(pub Cell<Option<Point>>);

    impl FixedPointer {
        pub fn at(x: f64, y: f64) -> Self {
            Self(Cell::new(Some(Point::new(x, y))))
        }
    }

    impl PointerLocator for FixedPointer {
        fn location(&self) -> Option<Point> {
            self.0.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FixedPointer, RecordingSink};
    use super::*;
    use crate::gesture::GestureSource;
    use std::cell::Cell;

    fn tap() -> GestureDetected {
        GestureDetected {
            source: GestureSource::ThreeFingerTap,
            span: Duration::from_millis(100),
        }
    }

    #[test]
    fn posts_down_then_up_at_pointer() {
        let mut emitter = ActionEmitter::new(
            RecordingSink::default(),
            FixedPointer::at(640.0, 400.0),
            Duration::from_millis(16),
        );
        emitter.emit(&tap()).unwrap();

        let posted = &emitter.sink().posted;
        assert_eq!(posted.len(), 2);
        let (down, down_at) = posted[0];
        let (up, up_at) = posted[1];
        assert_eq!(down.kind, MouseEventKind::Down);
        assert_eq!(up.kind, MouseEventKind::Up);
        assert_eq!(down.button, MouseButton::Middle);
        assert_eq!(down.position, Point::new(640.0, 400.0));
        assert_eq!(up.position, down.position);
        assert_eq!(down.click_state, 1);
        assert_eq!(up.click_state, 1);
        assert!(up_at.duration_since(down_at) >= Duration::from_millis(16));
    }

    #[test]
    fn unknown_pointer_falls_back_to_origin() {
        let mut emitter = ActionEmitter::new(
            RecordingSink::default(),
            FixedPointer(Cell::new(None)),
            Duration::ZERO,
        );
        emitter.emit(&tap()).unwrap();
        assert_eq!(emitter.sink().posted[0].0.position, Point::ORIGIN);
    }

    #[test]
    fn bad_position_posts_nothing() {
        let mut emitter = ActionEmitter::new(
            RecordingSink::default(),
            FixedPointer::at(f64::NAN, 1.0),
            Duration::ZERO,
        );
        assert!(!emitter.emit_or_log(&tap()));
        assert!(emitter.sink().posted.is_empty());
    }

    #[test]
    fn sink_failure_is_reported() {
        let sink = RecordingSink {
            fail_on: Some(MouseEventKind::Down),
            ..Default::default()
        };
        let mut emitter = ActionEmitter::new(sink, FixedPointer::at(1.0, 1.0), Duration::ZERO);
        assert!(matches!(emitter.emit(&tap()), Err(EmitError::Inject(_))));
        assert!(emitter.sink().posted.is_empty());
    }

    #[test]
    fn failed_release_is_retried() {
        let sink = RecordingSink {
            fail_on: Some(MouseEventKind::Up),
            fail_once: true,
            ..Default::default()
        };
        let mut emitter = ActionEmitter::new(sink, FixedPointer::at(1.0, 1.0), Duration::ZERO);
        assert!(matches!(emitter.emit(&tap()), Err(EmitError::Inject(_))));

        let kinds: Vec<_> = emitter.sink().posted.iter().map(|(e, _)| e.kind).collect();
        assert_eq!(kinds, vec![MouseEventKind::Down, MouseEventKind::Up]);
    }

    #[test]
    fn persistent_release_failure_is_reported() {
        let sink = RecordingSink {
            fail_on: Some(MouseEventKind::Up),
            ..Default::default()
        };
        let mut emitter = ActionEmitter::new(sink, FixedPointer::at(1.0, 1.0), Duration::ZERO);
        assert!(!emitter.emit_or_log(&tap()));
        assert_eq!(emitter.sink().posted.len(), 1);
    }
}
