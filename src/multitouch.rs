use crate::dimensions::Dimensions;
use crate::touch::{TouchFrame, TouchRecord, TouchState};
use evdev::{AbsoluteAxisType, EventType, InputEvent};
use std::time::Instant;
use tracing::{debug, trace};

pub const MAX_TOUCH_POINTS: usize = 10;

const SYN_REPORT: u16 = 0;
const SYN_DROPPED: u16 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SlotPhase {
    #[default]
    Idle,
    Starting,
    Touching,
    Leaving,
}

#[derive(Clone, Copy, Debug, Default)]
struct SlotData {
    phase: SlotPhase,
    tracking_id: i32,
    position_x: i32,
    position_y: i32,
    distance: i32,
}

impl SlotData {
    fn state(&self) -> Option<TouchState> {
        match self.phase {
            SlotPhase::Idle => None,
            SlotPhase::Starting | SlotPhase::Touching if self.distance > 0 => {
                Some(TouchState::Hovering)
            }
            SlotPhase::Starting => Some(TouchState::Starting),
            SlotPhase::Touching => Some(TouchState::Touching),
            SlotPhase::Leaving => Some(TouchState::Leaving),
        }
    }

    /// Move to the phase reported on the next frame.
    fn advance(&mut self) {
        match self.phase {
            SlotPhase::Starting => self.phase = SlotPhase::Touching,
            SlotPhase::Leaving => *self = SlotData::default(),
            SlotPhase::Idle | SlotPhase::Touching => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MTState {
    ReadReady,
    NeedsReset,
}

/// Multitouch protocol B slot tracker.
///
/// Collects `ABS_MT_*` updates per slot and turns each `SYN_REPORT` into a
/// frame of touch records, one per live slot.
pub struct MTStateMachine {
    state: MTState,
    slot: usize,
    slots: [SlotData; MAX_TOUCH_POINTS],
    dims: Dimensions,
}

impl Default for MTStateMachine {
    fn default() -> Self {
        Self {
            state: MTState::ReadReady,
            slot: 0,
            slots: [SlotData::default(); MAX_TOUCH_POINTS],
            dims: Dimensions::default(),
        }
    }
}

impl MTStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one kernel event; returns a frame at each sync point.
    pub fn process(&mut self, event: &InputEvent, now: Instant) -> Option<TouchFrame> {
        if self.state == MTState::NeedsReset {
            // events up to the next report are incomplete
            if event.event_type() == EventType::SYNCHRONIZATION && event.code() == SYN_REPORT {
                self.state = MTState::ReadReady;
                return Some(self.frame(now));
            }
            return None;
        }

        match event.event_type() {
            EventType::ABSOLUTE => {
                self.apply_abs(AbsoluteAxisType(event.code()), event.value());
                None
            }
            EventType::SYNCHRONIZATION => match event.code() {
                SYN_REPORT => Some(self.frame(now)),
                SYN_DROPPED => {
                    debug!("kernel dropped events, clearing all slots");
                    self.reset_slots();
                    self.state = MTState::NeedsReset;
                    None
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Lifts lost in the overrun can't be recovered, so every contact is
    /// forgotten; fingers still down only return with a new tracking id.
    fn reset_slots(&mut self) {
        self.slots = [SlotData::default(); MAX_TOUCH_POINTS];
    }

    fn apply_abs(&mut self, code: AbsoluteAxisType, value: i32) {
        let slot = &mut self.slots[self.slot];
        match code {
            AbsoluteAxisType::ABS_MT_SLOT => {
                if value >= 0 && (value as usize) < MAX_TOUCH_POINTS {
                    self.slot = value as usize;
                }
            }
            AbsoluteAxisType::ABS_MT_TRACKING_ID => {
                if value < 0 {
                    if slot.phase != SlotPhase::Idle {
                        slot.phase = SlotPhase::Leaving;
                    }
                } else {
                    *slot = SlotData {
                        phase: SlotPhase::Starting,
                        tracking_id: value,
                        ..*slot
                    };
                    slot.distance = 0;
                }
            }
            AbsoluteAxisType::ABS_MT_POSITION_X => slot.position_x = value,
            AbsoluteAxisType::ABS_MT_POSITION_Y => slot.position_y = value,
            AbsoluteAxisType::ABS_MT_DISTANCE => slot.distance = value,
            _ => {}
        }
    }

    fn frame(&mut self, now: Instant) -> TouchFrame {
        let mut touches = Vec::new();
        for slot in &mut self.slots {
            if let Some(state) = slot.state() {
                touches.push(TouchRecord {
                    id: slot.tracking_id,
                    state,
                    position: self.dims.normalize(slot.position_x, slot.position_y),
                });
            }
            slot.advance();
        }
        TouchFrame::new(now, touches)
    }
}

pub fn trace_event(event: &InputEvent) {
    let type_name = match event.event_type() {
        EventType::KEY => "EV_KEY",
        EventType::ABSOLUTE => "EV_ABS",
        EventType::MISC => "EV_MSC",
        EventType::SYNCHRONIZATION => "EV_SYN",
        _ => "EV_???",
    };
    match code_lookup(event.code()) {
        Some(name) => trace!("{}({}, {})", type_name, name, event.value()),
        None => trace!("{}(0x{:X}, {})", type_name, event.code(), event.value()),
    }
}

fn code_lookup(code: u16) -> Option<&'static str> {
    match code {
        0x2f => Some("SLOT"),
        0x35 => Some("POSITION_X"),
        0x36 => Some("POSITION_Y"),
        0x39 => Some("TRACKING_ID"),
        0x3b => Some("DISTANCE"),
        0x110 => Some("BTN_LEFT"),
        0x111 => Some("BTN_RIGHT"),
        0x14a => Some("BTN_TOUCH"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::ActiveTouchSet;

    fn abs(code: AbsoluteAxisType, value: i32) -> InputEvent {
        InputEvent::new(EventType::ABSOLUTE, code.0, value)
    }

    fn syn(code: u16) -> InputEvent {
        InputEvent::new(EventType::SYNCHRONIZATION, code, 0)
    }

    fn feed(machine: &mut MTStateMachine, events: &[InputEvent]) -> Vec<TouchFrame> {
        let now = Instant::now();
        events
            .iter()
            .filter_map(|event| machine.process(event, now))
            .collect()
    }

    fn touch_down(slot: i32, id: i32) -> Vec<InputEvent> {
        vec![
            abs(AbsoluteAxisType::ABS_MT_SLOT, slot),
            abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, id),
            abs(AbsoluteAxisType::ABS_MT_POSITION_X, 100 * (slot + 1)),
            abs(AbsoluteAxisType::ABS_MT_POSITION_Y, 200),
        ]
    }

    fn lift(slot: i32) -> Vec<InputEvent> {
        vec![
            abs(AbsoluteAxisType::ABS_MT_SLOT, slot),
            abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, -1),
        ]
    }

    fn states(frame: &TouchFrame) -> Vec<(i32, TouchState)> {
        frame.touches.iter().map(|t| (t.id, t.state)).collect()
    }

    #[test]
    fn contact_lifecycle() {
        let mut machine = MTStateMachine::new();
        let mut events = touch_down(0, 7);
        events.push(syn(SYN_REPORT));
        events.push(abs(AbsoluteAxisType::ABS_MT_POSITION_X, 150));
        events.push(syn(SYN_REPORT));
        events.extend(lift(0));
        events.push(syn(SYN_REPORT));
        events.push(syn(SYN_REPORT));

        let frames = feed(&mut machine, &events);
        assert_eq!(frames.len(), 4);
        assert_eq!(states(&frames[0]), vec![(7, TouchState::Starting)]);
        assert_eq!(states(&frames[1]), vec![(7, TouchState::Touching)]);
        assert_eq!(states(&frames[2]), vec![(7, TouchState::Leaving)]);
        assert!(frames[3].touches.is_empty());
    }

    #[test]
    fn three_slots_report_three_contacts() {
        let mut machine = MTStateMachine::new();
        let mut events = Vec::new();
        for slot in 0..3 {
            events.extend(touch_down(slot, 10 + slot));
        }
        events.push(syn(SYN_REPORT));

        let frames = feed(&mut machine, &events);
        assert_eq!(frames[0].touches.len(), 3);
        assert!(frames[0]
            .touches
            .iter()
            .all(|t| t.state == TouchState::Starting));
    }

    #[test]
    fn hovering_contact_is_marked() {
        let mut machine = MTStateMachine::new();
        let mut events = touch_down(1, 3);
        events.push(abs(AbsoluteAxisType::ABS_MT_DISTANCE, 5));
        events.push(syn(SYN_REPORT));
        events.push(abs(AbsoluteAxisType::ABS_MT_DISTANCE, 0));
        events.push(syn(SYN_REPORT));

        let frames = feed(&mut machine, &events);
        assert_eq!(states(&frames[0]), vec![(3, TouchState::Hovering)]);
        assert_eq!(states(&frames[1]), vec![(3, TouchState::Touching)]);
    }

    #[test]
    fn dropped_events_are_skipped_until_report() {
        let mut machine = MTStateMachine::new();
        let mut events = vec![syn(SYN_DROPPED)];
        events.extend(touch_down(0, 1));
        events.push(syn(SYN_REPORT));
        events.extend(touch_down(1, 2));
        events.push(syn(SYN_REPORT));

        let frames = feed(&mut machine, &events);
        assert_eq!(frames.len(), 2);
        assert!(frames[0].touches.is_empty());
        assert_eq!(states(&frames[1]), vec![(2, TouchState::Starting)]);
    }

    #[test]
    fn contact_lost_in_overrun_is_not_kept() {
        let mut machine = MTStateMachine::new();
        let mut active = ActiveTouchSet::new();
        let mut events = Vec::new();
        for slot in 0..3 {
            events.extend(touch_down(slot, 20 + slot));
        }
        events.push(syn(SYN_REPORT));
        events.push(syn(SYN_REPORT));
        // slot 1's lift is lost in the overrun
        events.push(syn(SYN_DROPPED));
        events.push(abs(AbsoluteAxisType::ABS_MT_POSITION_X, 400));
        events.push(syn(SYN_REPORT));
        // slot 0 keeps moving without a new tracking id
        events.push(abs(AbsoluteAxisType::ABS_MT_SLOT, 0));
        events.push(abs(AbsoluteAxisType::ABS_MT_POSITION_X, 120));
        events.push(syn(SYN_REPORT));

        let counts: Vec<usize> = feed(&mut machine, &events)
            .iter()
            .map(|frame| active.apply_frame(&frame.touches))
            .collect();
        assert_eq!(counts, vec![3, 3, 0, 0]);
        assert!(active.is_empty());

        // a fresh touch after the overrun is tracked again
        let mut events = touch_down(1, 30);
        events.push(syn(SYN_REPORT));
        let frames = feed(&mut machine, &events);
        assert_eq!(active.apply_frame(&frames[0].touches), 1);
    }

    #[test]
    fn out_of_range_slot_is_ignored() {
        let mut machine = MTStateMachine::new();
        let events = vec![
            abs(AbsoluteAxisType::ABS_MT_SLOT, MAX_TOUCH_POINTS as i32),
            abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, 4),
            syn(SYN_REPORT),
        ];
        let frames = feed(&mut machine, &events);
        // lands in the current slot (0)
        assert_eq!(states(&frames[0]), vec![(4, TouchState::Starting)]);
    }

    #[test]
    fn positions_are_normalized() {
        let mut machine = MTStateMachine::new();
        let mut events = touch_down(0, 1);
        events.push(syn(SYN_REPORT));
        let frames = feed(&mut machine, &events);
        let position = frames[0].touches[0].position;
        assert!(position.x > 0.0 && position.x <= 1.0);
        assert!(position.y > 0.0 && position.y <= 1.0);
    }
}
