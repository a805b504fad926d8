//! Multi-finger contact state, folded forward one message at a time.

use crate::err::DecodeError;
use crate::message::Message;
use crate::object_table::TouchReportIds;

/// T100 touch event, from the low nibble of the first payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    /// No event, the report carries a position only.
    NoEvent,
    /// The contact moved.
    Move,
    /// The contact is no longer suppressed and has been released.
    Unsuppress,
    /// The contact has been suppressed.
    Suppress,
    /// A finger touched the sensor.
    Down,
    /// A finger was lifted.
    Up,
    /// Unsuppressed then suppressed within one cycle.
    UnsuppressSuppress,
    /// Unsuppressed then released within one cycle.
    ///
    /// Leaves the tip as it was, unlike `Up`. The tip is only released by
    /// `Up`, `Unsuppress` and `DownUp`.
    UnsuppressUp,
    /// Touched then suppressed within one cycle.
    DownSuppress,
    /// Touched then released within one cycle.
    DownUp,
    /// Codes the chip reserves.
    Reserved(u8),
}

impl From<u8> for TouchEvent {
    fn from(value: u8) -> Self {
        match value & 0x0F {
            0 => Self::NoEvent,
            1 => Self::Move,
            2 => Self::Unsuppress,
            3 => Self::Suppress,
            4 => Self::Down,
            5 => Self::Up,
            6 => Self::UnsuppressSuppress,
            7 => Self::UnsuppressUp,
            8 => Self::DownSuppress,
            9 => Self::DownUp,
            code => Self::Reserved(code),
        }
    }
}

/// What an event does to the tip state of its finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipEffect {
    /// Tip becomes true.
    Press,
    /// Tip becomes false.
    Release,
    /// Tip is left as it was.
    Keep,
}

/// The effect of one event on a finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Effect on `tip`.
    pub tip: TipEffect,
    /// New value of `confidence`, set on every event.
    pub confidence: bool,
    /// Whether `x`/`y` take the reported position.
    pub update_position: bool,
}

impl TouchEvent {
    /// The state transition this event causes.
    pub const fn transition(self) -> Transition {
        let tip = match self {
            Self::Down => TipEffect::Press,
            Self::Up | Self::Unsuppress | Self::DownUp => TipEffect::Release,
            _ => TipEffect::Keep,
        };
        Transition {
            tip,
            confidence: !matches!(self, Self::Suppress | Self::DownSuppress),
            update_position: !matches!(self, Self::Up),
        }
    }
}

/// One finger as seen by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerContact {
    /// The finger is on the sensor.
    pub tip: bool,
    /// The position is trustworthy, i.e. not suppressed.
    pub confidence: bool,
    /// X coordinate in reported samples.
    pub x: u16,
    /// Y coordinate in reported samples.
    pub y: u16,
}

impl FingerContact {
    /// A finger that has never been reported.
    pub const INACTIVE: Self = Self {
        tip: false,
        confidence: false,
        x: 0,
        y: 0,
    };

    fn apply(&mut self, transition: Transition, x: u16, y: u16) {
        match transition.tip {
            TipEffect::Press => self.tip = true,
            TipEffect::Release => self.tip = false,
            TipEffect::Keep => {}
        }
        self.confidence = transition.confidence;
        if transition.update_position {
            self.x = x;
            self.y = y;
        }
    }
}

/// A decoded touchscreen contact report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactReport {
    /// The event.
    pub event: TouchEvent,
    /// Reported X, little endian on the wire.
    pub x: u16,
    /// Reported Y, little endian on the wire.
    pub y: u16,
}

impl From<&Message> for ContactReport {
    fn from(message: &Message) -> Self {
        let data = &message.data;
        Self {
            event: TouchEvent::from(data[0]),
            x: u16::from_le_bytes([data[1], data[2]]),
            y: u16::from_le_bytes([data[3], data[4]]),
        }
    }
}

/// What a message did to the digitizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The touch count report. Carries no state of interest yet.
    TouchCount,
    /// The finger at this index was updated.
    Contact(usize),
}

/// The state of up to `N` fingers, carried from one polling cycle to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digitizer<const N: usize> {
    /// Finger slots, indexed by contact id.
    pub fingers: [FingerContact; N],
}

impl<const N: usize> Default for Digitizer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Digitizer<N> {
    /// All fingers inactive.
    pub const fn new() -> Self {
        Self {
            fingers: [FingerContact::INACTIVE; N],
        }
    }

    /// Number of finger slots.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Fingers currently on the sensor.
    pub fn active(&self) -> impl Iterator<Item = (usize, &FingerContact)> {
        self.fingers.iter().enumerate().filter(|(_, finger)| finger.tip)
    }

    /// Applies one message to the state.
    ///
    /// On error the state is untouched.
    pub fn apply(&mut self, ids: &TouchReportIds, message: &Message) -> Result<Applied, DecodeError> {
        let report_id = message.report_id;
        if ids.is_touch_count(report_id) {
            return Ok(Applied::TouchCount);
        }
        let contact = ids
            .contact_index(report_id)
            .ok_or(DecodeError::UnrecognizedReportId(report_id))?;
        let finger = self
            .fingers
            .get_mut(contact)
            .ok_or(DecodeError::ContactOutOfRange { report_id, contact })?;
        let report = ContactReport::from(message);
        log::trace!("finger {contact}: {report:?}");
        finger.apply(report.event.transition(), report.x, report.y);
        Ok(Applied::Contact(contact))
    }
}
