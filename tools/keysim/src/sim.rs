//! Host-side stand-in for the keybed firmware.
//!
//! The simulator owns one note per MIDI pitch and a transport whose sink is a
//! plain `Vec` and whose delay only counts time. Script lines are applied in
//! order; every `poll` line polls all 128 notes in ascending pitch order, the
//! way the firmware's scan loop does once per cycle.

use embedded_hal::delay::DelayNs;
use keybed::{MidiSink, Note, NoteMode, Transport, UsbMidiPacket, midi};
use wmidi::Channel;

use crate::script::{Directive, Line, ScriptError};

pub const KEY_COUNT: usize = 128;

/// Sink collecting every packet in order.
#[derive(Debug, Default)]
pub struct PacketLog(pub Vec<UsbMidiPacket>);

impl MidiSink for PacketLog {
    fn send(&mut self, packet: UsbMidiPacket) {
        tracing::debug!(%packet, "packet");
        self.0.push(packet);
    }
}

/// Delay that advances a virtual clock instead of waiting.
#[derive(Debug, Default)]
pub struct VirtualClock {
    elapsed_ns: u64,
}

impl VirtualClock {
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_ns / 1_000
    }
}

impl DelayNs for VirtualClock {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
        tracing::trace!(ns, total_ns = self.elapsed_ns, "delay");
    }
}

pub struct Simulator {
    notes: [Note; KEY_COUNT],
    mode: NoteMode,
    channel: Channel,
    transport: Transport<PacketLog, VirtualClock>,
    polls: usize,
}

impl Simulator {
    pub fn new(mode: NoteMode, channel: Channel) -> Self {
        Self {
            notes: [Note::new(mode); KEY_COUNT],
            mode,
            channel,
            transport: Transport::new(PacketLog::default(), VirtualClock::default()),
            polls: 0,
        }
    }

    pub fn mode(&self) -> NoteMode {
        self.mode
    }

    pub fn run(&mut self, lines: &[Line]) -> Result<(), ScriptError> {
        for line in lines {
            self.apply(line)?;
        }
        Ok(())
    }

    pub fn apply(&mut self, line: &Line) -> Result<(), ScriptError> {
        let directive = line.directive;
        tracing::debug!(line = line.number, directive = directive.name(), "apply");

        if let Some(needed) = directive.mode() {
            if needed != self.mode {
                return Err(ScriptError::WrongMode {
                    line: line.number,
                    directive: directive.name(),
                    needed,
                    mode: self.mode,
                });
            }
        }

        match directive {
            Directive::Press(pitch) => self.set_switch(pitch, true),
            Directive::Release(pitch) => self.set_switch(pitch, false),
            Directive::Make(pitch, time) => {
                if time == 0 {
                    tracing::warn!(line = line.number, pitch, "timestamp 0 reads as no edge");
                }
                if let Some(note) = self.notes[pitch as usize].as_velocity_mut() {
                    note.last_up_time = time;
                }
            }
            Directive::Break(pitch, time) => {
                if time == 0 {
                    tracing::warn!(line = line.number, pitch, "timestamp 0 reads as no edge");
                }
                if let Some(note) = self.notes[pitch as usize].as_velocity_mut() {
                    note.last_down_time = time;
                }
            }
            Directive::Poll => self.poll(),
        }

        Ok(())
    }

    fn set_switch(&mut self, pitch: u8, closed: bool) {
        if let Some(note) = self.notes[pitch as usize].as_digital_mut() {
            note.state = closed;
        }
    }

    /// Poll every note once.
    pub fn poll(&mut self) {
        for (pitch, note) in self.notes.iter_mut().enumerate() {
            note.poll(&mut self.transport, self.channel, midi::note(pitch as u8));
        }
        self.polls += 1;
    }

    pub fn packets(&self) -> &[UsbMidiPacket] {
        &self.transport.sink().0
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    pub fn finish(self) -> Summary {
        let sent = self.transport.sent();
        let polls = self.polls;
        let (log, clock) = self.transport.into_parts();
        Summary {
            packets: log.0,
            sent,
            polls,
            elapsed_us: clock.elapsed_us(),
        }
    }
}

#[derive(Debug)]
pub struct Summary {
    pub packets: Vec<UsbMidiPacket>,
    pub sent: u32,
    pub polls: usize,
    pub elapsed_us: u64,
}
