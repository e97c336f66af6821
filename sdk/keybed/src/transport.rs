//! Outgoing note messages.
//!
//! The USB-MIDI consumer on the other end needs a gap between consecutive
//! messages. [`Transport`] owns that contract: every packet it writes is
//! followed by a [`MIN_MESSAGE_SPACING_US`] busy-wait, so callers never sleep
//! on their own.

use embedded_hal::delay::DelayNs;
use wmidi::{Channel, Note, Velocity};

use crate::midi::{self, NoteEvent, UsbMidiPacket};

/// Minimum gap between two packets, in microseconds.
pub const MIN_MESSAGE_SPACING_US: u32 = 300;

/// Velocity used for key presses on switches that cannot measure one.
pub const DEFAULT_VELOCITY: u8 = 100;

/// Release velocity sent with every note off.
pub const NOTE_OFF_VELOCITY: u8 = 127;

/// Where packets end up, e.g. the USB-MIDI IN endpoint.
pub trait MidiSink {
    fn send(&mut self, packet: UsbMidiPacket);
}

impl<S: MidiSink + ?Sized> MidiSink for &mut S {
    fn send(&mut self, packet: UsbMidiPacket) {
        (**self).send(packet)
    }
}

pub struct Transport<S, D> {
    sink: S,
    delay: D,
    sent: u32,
}

impl<S: MidiSink, D: DelayNs> Transport<S, D> {
    pub fn new(sink: S, delay: D) -> Self {
        Self { sink, delay, sent: 0 }
    }

    pub fn note_on(&mut self, channel: Channel, note: Note, velocity: Velocity) {
        self.write(UsbMidiPacket::note_on(channel, note, velocity));
    }

    pub fn note_off(&mut self, channel: Channel, note: Note, velocity: Velocity) {
        self.write(UsbMidiPacket::note_off(channel, note, velocity));
    }

    /// Note on at [`DEFAULT_VELOCITY`].
    pub fn note_on_default(&mut self, channel: Channel, note: Note) {
        self.note_on(channel, note, midi::velocity(DEFAULT_VELOCITY));
    }

    /// Note off at [`NOTE_OFF_VELOCITY`].
    pub fn note_off_default(&mut self, channel: Channel, note: Note) {
        self.note_off(channel, note, midi::velocity(NOTE_OFF_VELOCITY));
    }

    fn write(&mut self, packet: UsbMidiPacket) {
        self.sink.send(packet);
        self.delay.delay_us(MIN_MESSAGE_SPACING_US);
        self.sent = self.sent.wrapping_add(1);

        log::debug!(
            "{}-{}->{}",
            packet.channel.index(),
            u8::from(packet.note),
            match packet.event {
                NoteEvent::On => "ON",
                NoteEvent::Off => "OFF",
            }
        );
    }

    /// Packets written since construction.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (S, D) {
        (self.sink, self.delay)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::midi::{channel, note};

    /// Collects packets in memory.
    #[derive(Default)]
    pub struct Recorder(pub Vec<UsbMidiPacket>);

    impl MidiSink for Recorder {
        fn send(&mut self, packet: UsbMidiPacket) {
            self.0.push(packet);
        }
    }

    /// Adds up requested delays instead of waiting.
    #[derive(Default)]
    pub struct Clock {
        pub elapsed_ns: u64,
    }

    impl DelayNs for Clock {
        fn delay_ns(&mut self, ns: u32) {
            self.elapsed_ns += ns as u64;
        }
    }

    pub fn transport() -> Transport<Recorder, Clock> {
        Transport::new(Recorder::default(), Clock::default())
    }

    #[test]
    fn every_write_is_followed_by_the_spacing_delay() {
        let mut t = transport();
        t.note_on_default(channel(0), note(60));
        t.note_off_default(channel(0), note(60));

        assert_eq!(t.sent(), 2);
        let (sink, clock) = t.into_parts();
        assert_eq!(clock.elapsed_ns, 2 * MIN_MESSAGE_SPACING_US as u64 * 1_000);
        assert_eq!(sink.0[0].to_bytes(), [0x09, 0x90, 60, DEFAULT_VELOCITY]);
        assert_eq!(sink.0[1].to_bytes(), [0x08, 0x80, 60, NOTE_OFF_VELOCITY]);
    }

    #[test]
    fn explicit_velocity_is_passed_through() {
        let mut t = transport();
        t.note_on(channel(9), note(36), midi::velocity(42));
        assert_eq!(t.sink().0, vec![UsbMidiPacket::note_on(channel(9), note(36), midi::velocity(42))]);
    }

    #[test]
    fn sink_can_be_borrowed() {
        let mut recorder = Recorder::default();
        {
            let mut t = Transport::new(&mut recorder, Clock::default());
            t.note_off_default(channel(1), note(70));
        }
        assert_eq!(recorder.0.len(), 1);
    }
}
