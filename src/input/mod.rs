#[cfg(target_os = "linux")]
pub mod evdev_backend;
#[cfg(target_os = "linux")]
pub mod uinput_sink;

use crate::engine::EngineEvent;
use std::path::PathBuf;
use std::sync::mpsc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("open failed: {0}")]
    OpenFailed(String),
    #[error("{} does not report multitouch slots", .0.display())]
    NotMultitouch(PathBuf),
    #[error("read error: {0}")]
    ReadError(String),
    #[error("libinput setup failed: {0}")]
    LibinputSetup(String),
    #[error("failed to create virtual device: {0}")]
    VirtualDevice(String),
    #[error("failed to send input event: {0}")]
    SendEvent(String),
}

/// Source of per-frame touch records.
///
/// Frames are pushed into the engine queue until `stop_listening` is called.
pub trait TouchProvider {
    fn start_listening(&mut self, frames: mpsc::Sender<EngineEvent>) -> Result<(), InputError>;
    fn stop_listening(&mut self);
}
