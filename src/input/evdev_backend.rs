use super::{InputError, TouchProvider};
use crate::engine::EngineEvent;
use crate::clock;
use crate::multitouch::{self, MTStateMachine};
use evdev::raw_stream::RawDevice;
use evdev::AbsoluteAxisType;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Reads multitouch slots straight from a touchpad's event node.
///
/// Uses the raw event stream so `SYN_DROPPED` reaches the slot machine.
pub struct EvdevTouchProvider {
    device_path: PathBuf,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl EvdevTouchProvider {
    pub fn new(device_path: &Path) -> Self {
        Self {
            device_path: device_path.to_path_buf(),
            stop: Arc::new(AtomicBool::new(false)),
            reader: None,
        }
    }

    fn open(&self) -> Result<RawDevice, InputError> {
        let device = RawDevice::open(&self.device_path).map_err(|e| {
            InputError::OpenFailed(format!("{}: {}", self.device_path.display(), e))
        })?;

        let has_slots = device
            .supported_absolute_axes()
            .map_or(false, |axes| axes.contains(AbsoluteAxisType::ABS_MT_SLOT));
        if !has_slots {
            return Err(InputError::NotMultitouch(self.device_path.clone()));
        }

        set_nonblocking(&device)?;
        Ok(device)
    }
}

fn set_nonblocking(device: &RawDevice) -> Result<(), InputError> {
    let fd = device.as_raw_fd();
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 || unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(InputError::OpenFailed(
            std::io::Error::last_os_error().to_string(),
        ));
    }
    Ok(())
}

impl TouchProvider for EvdevTouchProvider {
    fn start_listening(&mut self, frames: mpsc::Sender<EngineEvent>) -> Result<(), InputError> {
        let mut device = self.open()?;
        info!(
            "listening for touches on {} ({})",
            self.device_path.display(),
            device.name().unwrap_or("unnamed")
        );

        self.stop.store(false, Ordering::SeqCst);
        let stop = self.stop.clone();
        self.reader = Some(thread::spawn(move || {
            let mut machine = MTStateMachine::new();
            while !stop.load(Ordering::SeqCst) {
                match poll_frames(&mut device, &mut machine, &frames) {
                    Ok(true) => {}
                    Ok(false) => thread::sleep(Duration::from_millis(5)),
                    Err(e) => {
                        error!("touch input error: {}", e);
                        break;
                    }
                }
            }
            debug!("touch reader stopped");
        }));
        Ok(())
    }

    fn stop_listening(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

impl Drop for EvdevTouchProvider {
    fn drop(&mut self) {
        self.stop_listening();
    }
}

/// Drain pending kernel events. Returns false when nothing was available.
fn poll_frames(
    device: &mut RawDevice,
    machine: &mut MTStateMachine,
    frames: &mpsc::Sender<EngineEvent>,
) -> Result<bool, InputError> {
    match device.fetch_events() {
        Ok(events) => {
            for event in events {
                multitouch::trace_event(&event);
                let at = clock::from_system_time(event.timestamp());
                if let Some(frame) = machine.process(&event, at) {
                    frames
                        .send(EngineEvent::Touches(frame))
                        .map_err(|_| InputError::ReadError("engine queue closed".to_string()))?;
                }
            }
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(false),
        Err(e) => Err(InputError::ReadError(e.to_string())),
    }
}
