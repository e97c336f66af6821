//! Per-key note state machines.
//!
//! The scanner owns one [`Note`] per key, writes its inputs every cycle and then
//! calls [`Note::poll`] once. `poll` is the only place events are sent.
//!
//! Two behaviours exist:
//! - [`BasicNote`]: a single switch, note on when it closes, note off when it opens.
//! - [`VelocityNote`]: two contacts per key; the scanner records when each one
//!   changed and the note derives velocity from the gap between them.

use embedded_hal::delay::DelayNs;
use wmidi::{Channel, Note as Pitch};

use crate::midi;
use crate::transport::{MidiSink, Transport};
use crate::velocity::calculate_velocity;

/// Microseconds from a free-running 32-bit counter.
pub type Timestamp = u32;

/// Single-switch key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BasicNote {
    /// Switch closure as last read by the scanner.
    pub state: bool,
    /// Value the last event was sent for.
    pub prev: bool,
}

impl BasicNote {
    pub fn poll<S: MidiSink, D: DelayNs>(&mut self, transport: &mut Transport<S, D>, channel: Channel, pitch: Pitch) {
        if self.state == self.prev {
            return;
        }
        self.prev = self.state;

        if self.state {
            transport.note_on_default(channel, pitch);
        } else {
            transport.note_off_default(channel, pitch);
        }
    }
}

/// Dual-contact key.
///
/// A zero timestamp means "no edge recorded yet". A measurement is complete
/// once both timestamps are non-zero; `poll` consumes it and clears both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VelocityNote {
    /// When the make contact (the one that closes last on a strike) changed.
    pub last_up_time: Timestamp,
    /// When the break contact (the one that closes first) changed.
    pub last_down_time: Timestamp,
}

impl VelocityNote {
    /// A measurement is waiting to be consumed.
    pub fn is_ready(&self) -> bool {
        self.last_up_time != 0 && self.last_down_time != 0
    }

    pub fn poll<S: MidiSink, D: DelayNs>(&mut self, transport: &mut Transport<S, D>, channel: Channel, pitch: Pitch) {
        if !self.is_ready() {
            return;
        }

        log::trace!("{} > {}", self.last_up_time, self.last_down_time);

        if self.last_down_time < self.last_up_time {
            transport.note_off_default(channel, pitch);
        } else {
            let velocity = calculate_velocity(self.last_down_time - self.last_up_time);
            transport.note_on(channel, pitch, midi::velocity(velocity));
        }

        self.last_up_time = 0;
        self.last_down_time = 0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteMode {
    Digital,
    Velocity,
}

impl NoteMode {
    /// The behaviour this firmware build was configured with.
    #[cfg(feature = "velocity-sensing")]
    pub const DEFAULT: NoteMode = NoteMode::Velocity;
    #[cfg(not(feature = "velocity-sensing"))]
    pub const DEFAULT: NoteMode = NoteMode::Digital;
}

impl Default for NoteMode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One key, in either mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Note {
    Digital(BasicNote),
    Velocity(VelocityNote),
}

impl Note {
    pub const fn new(mode: NoteMode) -> Self {
        match mode {
            NoteMode::Digital => Note::Digital(BasicNote { state: false, prev: false }),
            NoteMode::Velocity => Note::Velocity(VelocityNote {
                last_up_time: 0,
                last_down_time: 0,
            }),
        }
    }

    pub const fn mode(&self) -> NoteMode {
        match self {
            Note::Digital(_) => NoteMode::Digital,
            Note::Velocity(_) => NoteMode::Velocity,
        }
    }

    #[inline]
    pub fn poll<S: MidiSink, D: DelayNs>(&mut self, transport: &mut Transport<S, D>, channel: Channel, pitch: Pitch) {
        match self {
            Note::Digital(note) => note.poll(transport, channel, pitch),
            Note::Velocity(note) => note.poll(transport, channel, pitch),
        }
    }

    pub fn as_digital_mut(&mut self) -> Option<&mut BasicNote> {
        match self {
            Note::Digital(note) => Some(note),
            Note::Velocity(_) => None,
        }
    }

    pub fn as_velocity_mut(&mut self) -> Option<&mut VelocityNote> {
        match self {
            Note::Velocity(note) => Some(note),
            Note::Digital(_) => None,
        }
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new(NoteMode::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{UsbMidiPacket, channel, note, velocity};
    use crate::transport::tests::transport;
    use crate::transport::{DEFAULT_VELOCITY, NOTE_OFF_VELOCITY};

    const CH: u8 = 2;
    const PITCH: u8 = 64;

    fn on(vel: u8) -> UsbMidiPacket {
        UsbMidiPacket::note_on(channel(CH), note(PITCH), velocity(vel))
    }

    fn off() -> UsbMidiPacket {
        UsbMidiPacket::note_off(channel(CH), note(PITCH), velocity(NOTE_OFF_VELOCITY))
    }

    #[test]
    fn basic_note_idle_sends_nothing() {
        let mut t = transport();
        let mut n = BasicNote::default();
        n.poll(&mut t, channel(CH), note(PITCH));
        assert_eq!(t.sent(), 0);
    }

    #[test]
    fn basic_note_sends_once_per_transition() {
        let mut t = transport();
        let mut n = BasicNote::default();

        n.state = true;
        n.poll(&mut t, channel(CH), note(PITCH));
        n.poll(&mut t, channel(CH), note(PITCH));
        assert_eq!(t.sink().0, vec![on(DEFAULT_VELOCITY)]);
        assert!(n.prev);

        n.state = false;
        n.poll(&mut t, channel(CH), note(PITCH));
        n.poll(&mut t, channel(CH), note(PITCH));
        assert_eq!(t.sink().0, vec![on(DEFAULT_VELOCITY), off()]);
    }

    #[test]
    fn velocity_note_strike_sends_note_on_and_clears() {
        let mut t = transport();
        let mut n = VelocityNote {
            last_up_time: 1000,
            last_down_time: 1500,
        };

        n.poll(&mut t, channel(CH), note(PITCH));
        assert_eq!(t.sink().0, vec![on(calculate_velocity(500))]);
        assert_eq!(n, VelocityNote::default());

        n.poll(&mut t, channel(CH), note(PITCH));
        assert_eq!(t.sent(), 1);
    }

    #[test]
    fn velocity_note_gap_sets_velocity() {
        let mut t = transport();
        let mut n = VelocityNote {
            last_up_time: 100_000,
            last_down_time: 121_000,
        };

        n.poll(&mut t, channel(CH), note(PITCH));
        assert_eq!(t.sink().0, vec![on(64)]);
    }

    #[test]
    fn velocity_note_release_sends_note_off_and_clears() {
        let mut t = transport();
        let mut n = VelocityNote {
            last_up_time: 1500,
            last_down_time: 1000,
        };

        n.poll(&mut t, channel(CH), note(PITCH));
        assert_eq!(t.sink().0, vec![off()]);
        assert_eq!(n.last_up_time, 0);
        assert_eq!(n.last_down_time, 0);
    }

    #[test]
    fn velocity_note_equal_times_is_a_strike() {
        let mut t = transport();
        let mut n = VelocityNote {
            last_up_time: 7,
            last_down_time: 7,
        };

        n.poll(&mut t, channel(CH), note(PITCH));
        assert_eq!(t.sink().0, vec![on(calculate_velocity(0))]);
    }

    #[test]
    fn velocity_note_waits_for_both_edges() {
        let mut t = transport();
        let mut n = VelocityNote {
            last_up_time: 1000,
            last_down_time: 0,
        };

        n.poll(&mut t, channel(CH), note(PITCH));
        assert_eq!(t.sent(), 0);
        assert_eq!(n.last_up_time, 1000, "partial measurement is kept");

        n.last_down_time = 1800;
        n.poll(&mut t, channel(CH), note(PITCH));
        assert_eq!(t.sent(), 1);
    }

    #[test]
    fn note_dispatches_on_mode() {
        let mut t = transport();

        let mut digital = Note::new(NoteMode::Digital);
        digital.as_digital_mut().unwrap().state = true;
        assert!(digital.as_velocity_mut().is_none());
        digital.poll(&mut t, channel(CH), note(PITCH));

        let mut sensing = Note::new(NoteMode::Velocity);
        {
            let v = sensing.as_velocity_mut().unwrap();
            v.last_up_time = 1500;
            v.last_down_time = 1000;
        }
        sensing.poll(&mut t, channel(CH), note(PITCH));
        sensing.poll(&mut t, channel(CH), note(PITCH));

        assert_eq!(t.sink().0, vec![on(DEFAULT_VELOCITY), off()]);
        assert_eq!(sensing.mode(), NoteMode::Velocity);
    }

    #[test]
    fn default_note_follows_build_mode() {
        assert_eq!(Note::default().mode(), NoteMode::DEFAULT);
        #[cfg(feature = "velocity-sensing")]
        assert_eq!(NoteMode::DEFAULT, NoteMode::Velocity);
        #[cfg(not(feature = "velocity-sensing"))]
        assert_eq!(NoteMode::DEFAULT, NoteMode::Digital);
    }
}
