//! Libinput click tap: reports left/right presses and tracks pointer motion.

use crate::clock;
use crate::gesture::clicks::{ClickEvent, ClickKind};
use crate::input::InputError;
use crate::pointer::SharedPointer;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use input::event::pointer::{ButtonState, PointerEvent, PointerEventTrait};
use input::{Event, Libinput, LibinputInterface};

const BTN_LEFT: u32 = 0x110;
const BTN_RIGHT: u32 = 0x111;

/// What to do with an observed event. The tap is read-only, so events always
/// continue to the rest of the system; `Consume` is accepted but has no effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Disposition {
    Pass,
    Consume,
}

struct Interface;

impl LibinputInterface for Interface {
    fn open_restricted(&mut self, path: &Path, flags: i32) -> Result<OwnedFd, i32> {
        let path_cstr = match std::ffi::CString::new(path.as_os_str().as_encoded_bytes()) {
            Ok(c) => c,
            Err(_) => return Err(libc::EINVAL),
        };
        let fd = unsafe { libc::open(path_cstr.as_ptr(), flags) };
        if fd < 0 {
            Err(unsafe { *libc::__errno_location() })
        } else {
            Ok(unsafe { OwnedFd::from_raw_fd(fd) })
        }
    }

    fn close_restricted(&mut self, fd: OwnedFd) {
        drop(fd);
    }
}

/// Active click subscription. Dropping it stops the reader thread.
pub struct ClickTap {
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl ClickTap {
    /// Watch `devices` for button presses, calling `handler` for each one.
    ///
    /// Fails if none of the devices could be added to the libinput context.
    pub fn subscribe<F>(
        devices: &[PathBuf],
        pointer: SharedPointer,
        handler: F,
    ) -> Result<ClickTap, InputError>
    where
        F: FnMut(ClickEvent) -> Disposition + Send + 'static,
    {
        let paths = devices.to_vec();
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let thread_stop = stop.clone();
        let reader = thread::spawn(move || {
            let mut ctx = match open_context(&paths) {
                Ok(ctx) => {
                    let _ = ready_tx.send(Ok(()));
                    ctx
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            if let Err(e) = run_libinput_loop(&mut ctx, &thread_stop, &pointer, handler) {
                error!("libinput backend error: {}", e);
            }
            debug!("click tap stopped");
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(ClickTap {
                stop,
                reader: Some(reader),
            }),
            Ok(Err(e)) => {
                let _ = reader.join();
                Err(e)
            }
            Err(_) => Err(InputError::LibinputSetup(
                "reader thread exited during setup".to_string(),
            )),
        }
    }
}

impl Drop for ClickTap {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

fn open_context(devices: &[PathBuf]) -> Result<Libinput, InputError> {
    let mut ctx = Libinput::new_from_path(Interface);
    let mut added = 0;

    for path in devices {
        let Some(path_str) = path.to_str() else {
            warn!("skipping non UTF-8 device path {}", path.display());
            continue;
        };
        match ctx.path_add_device(path_str) {
            Some(mut device) => {
                // Enable tap-to-click (disabled by default in new_from_path contexts)
                if device.config_tap_finger_count() > 0 {
                    let _ = device.config_tap_set_enabled(true);
                }
                info!("watching clicks on {}", path.display());
                added += 1;
            }
            None => warn!("libinput could not add {}", path.display()),
        }
    }

    if added == 0 {
        return Err(InputError::LibinputSetup(
            "no pointer device could be added".to_string(),
        ));
    }
    Ok(ctx)
}

fn run_libinput_loop<F>(
    ctx: &mut Libinput,
    stop: &AtomicBool,
    pointer: &SharedPointer,
    mut handler: F,
) -> Result<(), InputError>
where
    F: FnMut(ClickEvent) -> Disposition,
{
    let mut pollfd = libc::pollfd {
        fd: ctx.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };

    while !stop.load(Ordering::SeqCst) {
        let ret = unsafe { libc::poll(&mut pollfd, 1, 100) };
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(InputError::ReadError(err.to_string()));
        }

        ctx.dispatch()
            .map_err(|e| InputError::ReadError(e.to_string()))?;

        for event in &mut *ctx {
            match event {
                Event::Pointer(PointerEvent::Motion(m)) => {
                    use input::event::pointer::PointerMotionEvent;
                    pointer.move_by(PointerMotionEvent::dx(&m), PointerMotionEvent::dy(&m));
                }
                Event::Pointer(PointerEvent::Button(b)) => {
                    if b.button_state() != ButtonState::Pressed {
                        continue;
                    }
                    let kind = match click_kind(b.button()) {
                        Some(kind) => kind,
                        None => continue,
                    };
                    let click = ClickEvent {
                        kind,
                        position: pointer.current(),
                        timestamp: clock::from_monotonic_usec(b.time_usec()),
                    };
                    if handler(click) == Disposition::Consume {
                        debug!("click tap is passive, passing event through");
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn click_kind(button: u32) -> Option<ClickKind> {
    match button {
        BTN_LEFT => Some(ClickKind::Left),
        BTN_RIGHT => Some(ClickKind::Right),
        _ => None,
    }
}
