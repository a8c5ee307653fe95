use crate::emitter::PointerLocator;
use crate::touch::Point;
use std::sync::{Arc, Mutex};

/// Pointer position integrated from relative motion, shared between the
/// reader thread that updates it and the engine that reads it.
#[derive(Clone, Default)]
pub struct SharedPointer {
    inner: Arc<Mutex<Option<Point>>>,
}

impl SharedPointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_by(&self, dx: f64, dy: f64) {
        if let Ok(mut position) = self.inner.lock() {
            let current = position.unwrap_or(Point::ORIGIN);
            *position = Some(Point::new(current.x + dx, current.y + dy));
        }
    }

    pub fn current(&self) -> Point {
        self.location().unwrap_or(Point::ORIGIN)
    }
}

impl PointerLocator for SharedPointer {
    fn location(&self) -> Option<Point> {
        self.inner.lock().ok().and_then(|position| *position)
    }
}
