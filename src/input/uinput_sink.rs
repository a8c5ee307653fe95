use super::InputError;
use crate::emitter::{InputSink, MouseButton, MouseEvent, MouseEventKind};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key, RelativeAxisType};
use tracing::{debug, info, warn};

const DEVICE_NAME: &str = "threefingers virtual pointer";

/// Virtual pointer that posts synthetic button events through uinput.
///
/// Button events land wherever the system cursor currently is, so the
/// position carried by the event is informational only.
pub struct UinputSink {
    device: VirtualDevice,
}

impl UinputSink {
    pub fn create() -> Result<Self, InputError> {
        let mut keys = AttributeSet::<Key>::new();
        keys.insert(Key::BTN_LEFT);
        keys.insert(Key::BTN_RIGHT);
        keys.insert(Key::BTN_MIDDLE);

        // a pointer without relative axes is not treated as a mouse
        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);

        let device = VirtualDeviceBuilder::new()
            .and_then(|builder| builder.name(DEVICE_NAME).with_keys(&keys))
            .and_then(|builder| builder.with_relative_axes(&axes))
            .and_then(|builder| builder.build())
            .map_err(|e| InputError::VirtualDevice(e.to_string()))?;

        info!("created uinput device \"{}\"", DEVICE_NAME);
        Ok(Self { device })
    }
}

impl InputSink for UinputSink {
    fn post(&mut self, event: &MouseEvent) -> Result<(), InputError> {
        let key = match event.button {
            MouseButton::Middle => Key::BTN_MIDDLE,
        };
        let value = match event.kind {
            MouseEventKind::Down => 1,
            MouseEventKind::Up => 0,
        };
        debug!(
            click_state = event.click_state,
            "posting {:?} {:?} at ({:.0}, {:.0})",
            event.button,
            event.kind,
            event.position.x,
            event.position.y
        );
        // emit() terminates the batch with SYN_REPORT
        self.device
            .emit(&[InputEvent::new(EventType::KEY, key.code(), value)])
            .map_err(|e| InputError::SendEvent(e.to_string()))
    }
}

impl Drop for UinputSink {
    fn drop(&mut self) {
        // never leave a middle press behind when the device goes away
        let release = InputEvent::new(EventType::KEY, Key::BTN_MIDDLE.code(), 0);
        if let Err(e) = self.device.emit(&[release]) {
            warn!("failed to release middle button on shutdown: {}", e);
        }
    }
}
