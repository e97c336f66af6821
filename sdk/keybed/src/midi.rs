//! USB-MIDI event packets for note messages.
//!
//! Every USB-MIDI event is four bytes:
//!
//! | Byte | Contents                                   |
//! |------|--------------------------------------------|
//! | 0    | cable number (high nibble), CIN (low)      |
//! | 1    | MIDI status byte: message type \| channel  |
//! | 2    | note number                                |
//! | 3    | velocity                                   |
//!
//! The keybed always talks on cable 0.

use core::fmt;

use wmidi::{Channel, Note, U7, Velocity};

const CIN_NOTE_OFF: u8 = 0x08;
const CIN_NOTE_ON: u8 = 0x09;

const NOTE_OFF_STATUS: u8 = 0x80;
const NOTE_ON_STATUS: u8 = 0x90;

/// Channel for a 0-based index; only the low nibble is used.
pub fn channel(index: u8) -> Channel {
    Channel::from_index(index & 0x0F).unwrap_or(Channel::Ch1)
}

/// Note for a raw note number; the top bit is dropped.
pub fn note(number: u8) -> Note {
    Note::from_u8_lossy(number)
}

/// Velocity for a raw value; the top bit is dropped.
pub fn velocity(value: u8) -> Velocity {
    U7::from_u8_lossy(value)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteEvent {
    On,
    Off,
}

impl NoteEvent {
    const fn code_index(self) -> u8 {
        match self {
            NoteEvent::On => CIN_NOTE_ON,
            NoteEvent::Off => CIN_NOTE_OFF,
        }
    }

    const fn status(self) -> u8 {
        match self {
            NoteEvent::On => NOTE_ON_STATUS,
            NoteEvent::Off => NOTE_OFF_STATUS,
        }
    }
}

/// A note message as it goes out on the USB-MIDI endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsbMidiPacket {
    pub event: NoteEvent,
    pub channel: Channel,
    pub note: Note,
    pub velocity: Velocity,
}

impl UsbMidiPacket {
    pub fn note_on(channel: Channel, note: Note, velocity: Velocity) -> Self {
        Self { event: NoteEvent::On, channel, note, velocity }
    }

    pub fn note_off(channel: Channel, note: Note, velocity: Velocity) -> Self {
        Self { event: NoteEvent::Off, channel, note, velocity }
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        [
            self.event.code_index(),
            self.event.status() | self.channel.index(),
            u8::from(self.note),
            u8::from(self.velocity),
        ]
    }
}

impl From<UsbMidiPacket> for [u8; 4] {
    fn from(packet: UsbMidiPacket) -> Self {
        packet.to_bytes()
    }
}

/// `09 90 3c 64`
impl fmt::Display for UsbMidiPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.to_bytes();
        write!(f, "{a:02x} {b:02x} {c:02x} {d:02x}")
    }
}
