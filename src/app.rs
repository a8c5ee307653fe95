use crate::config::GestureConfig;
use crate::discovery::udev_discovery::UdevDiscovery;
use crate::discovery::{DeviceDiscovery, DeviceInfo, DiscoveryError};
use crate::engine::{EngineEvent, EngineStats, GestureEngine, TrackingMode};
use crate::input::evdev_backend::EvdevTouchProvider;
use crate::input::uinput_sink::UinputSink;
use crate::input::{InputError, TouchProvider};
use crate::libinput_backend::{ClickTap, Disposition};
use crate::permissions::Permissions;
use crate::pointer::SharedPointer;
use std::path::PathBuf;
use std::sync::mpsc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StartError {
    #[error("input permissions missing")]
    PermissionDenied,
    #[error("click detection fallback failed: {0}")]
    FallbackFailed(InputError),
    #[error("cannot inject events: {0}")]
    SinkUnavailable(InputError),
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl StartError {
    pub fn exit_code(&self) -> i32 {
        match self {
            StartError::PermissionDenied | StartError::Signal(_) => 1,
            StartError::FallbackFailed(_) => 2,
            StartError::SinkUnavailable(_) => 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Use this node instead of asking udev
    pub device: Option<PathBuf>,
    /// Skip multitouch and go straight to click detection
    pub force_fallback: bool,
}

pub struct App {
    options: StartOptions,
    config: GestureConfig,
}

impl App {
    pub fn new(options: StartOptions) -> Self {
        Self {
            options,
            config: GestureConfig::default(),
        }
    }

    /// Touchpad and pointer nodes to watch.
    pub fn devices(&self) -> (Vec<PathBuf>, Vec<PathBuf>) {
        if let Some(device) = &self.options.device {
            return (vec![device.clone()], vec![device.clone()]);
        }

        let touchpads = devnodes(UdevDiscovery::find_touchpads());
        let mut pointers = touchpads.clone();
        for node in devnodes(UdevDiscovery::find_pointers()) {
            if !pointers.contains(&node) {
                pointers.push(node);
            }
        }
        (touchpads, pointers)
    }

    /// Run gesture detection until interrupted.
    pub fn start(&self) -> Result<EngineStats, StartError> {
        println!("Starting ThreeFingers...");

        let (touchpads, pointers) = self.devices();
        if !Permissions::new(pointers.clone()).is_trusted_with_prompt() {
            return Err(StartError::PermissionDenied);
        }

        let sink = UinputSink::create().map_err(StartError::SinkUnavailable)?;
        let pointer = SharedPointer::new();
        let (tx, rx) = mpsc::channel();

        let mut touch_provider = None;
        if !self.options.force_fallback {
            match start_multitouch(&touchpads, &tx) {
                Ok(provider) => touch_provider = Some(provider),
                Err(e) => warn!("multitouch setup failed: {}", e),
            }
        }

        let (mode, _click_tap) = if touch_provider.is_some() {
            // only keeps the pointer position current for the emitter
            let tap = match ClickTap::subscribe(&pointers, pointer.clone(), |_| Disposition::Pass)
            {
                Ok(tap) => Some(tap),
                Err(e) => {
                    warn!("pointer tracking unavailable, clicks report the origin: {}", e);
                    None
                }
            };
            print_touch_instructions();
            (TrackingMode::Touch, tap)
        } else {
            println!("Multitouch setup failed, falling back to click detection");
            let clicks = tx.clone();
            let tap = ClickTap::subscribe(&pointers, pointer.clone(), move |click| {
                let _ = clicks.send(EngineEvent::Click(click));
                Disposition::Pass
            })
            .map_err(StartError::FallbackFailed)?;
            print_click_instructions();
            (TrackingMode::Click, Some(tap))
        };

        let shutdown = tx.clone();
        ctrlc::set_handler(move || {
            println!();
            println!("Shutting down...");
            let _ = shutdown.send(EngineEvent::Shutdown);
        })?;
        drop(tx);

        info!(?mode, "gesture engine running");
        let mut engine = GestureEngine::new(mode, self.config, sink, pointer);
        let stats = engine.run(rx);

        if let Some(mut provider) = touch_provider {
            provider.stop_listening();
        }
        info!(
            frames = stats.frames,
            clicks = stats.clicks,
            gestures = stats.gestures,
            failed = stats.failed_emissions,
            "gesture engine stopped"
        );
        Ok(stats)
    }
}

fn devnodes(found: Result<Vec<DeviceInfo>, DiscoveryError>) -> Vec<PathBuf> {
    match found {
        Ok(devices) => devices.into_iter().map(|d| d.devnode).collect(),
        Err(e) => {
            warn!("device discovery: {}", e);
            Vec::new()
        }
    }
}

fn start_multitouch(
    touchpads: &[PathBuf],
    tx: &mpsc::Sender<EngineEvent>,
) -> Result<EvdevTouchProvider, InputError> {
    let mut last_error = InputError::OpenFailed("no touchpad found".to_string());
    for path in touchpads {
        let mut provider = EvdevTouchProvider::new(path);
        match provider.start_listening(tx.clone()) {
            Ok(()) => return Ok(provider),
            Err(e) => {
                warn!("{}: {}", path.display(), e);
                last_error = e;
            }
        }
    }
    Err(last_error)
}

fn print_touch_instructions() {
    println!("ThreeFingers is now running with 3-finger detection");
    println!("Instructions:");
    println!("   - Touch the touchpad with exactly 3 fingers simultaneously");
    println!("   - Lift them quickly (within 0.3s) for a middle click");
    println!("   - Press Ctrl+C to quit");
    println!();
}

fn print_click_instructions() {
    println!("ThreeFingers is running in click detection mode");
    println!("Instructions:");
    println!("   - Click rapidly 3 times in the same spot for a middle click");
    println!("   - This is a fallback when multitouch isn't available");
    println!("   - Press Ctrl+C to quit");
    println!();
}
