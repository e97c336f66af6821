//! Key switch scanning and MIDI note generation for the Arduino Due keybed.
//!
//! # Note behaviour
//!
//! Enable the `velocity-sensing` feature to build for dual-contact keys; without
//! it every key is a plain on/off switch sent at a fixed velocity.
//!
//! # Example
//!
//! ```rust,ignore
//! use keybed::{midi, Note, Transport};
//! use keybed::quickpin::{self, PortSnapshot, PINS};
//!
//! quickpin::setup();
//! let mut transport = Transport::new(usb_midi, delay);
//! let mut notes = [Note::default(); 54];
//!
//! loop {
//!     let snapshot = PortSnapshot::capture();
//!     for (i, note) in notes.iter_mut().enumerate() {
//!         if let Some(key) = note.as_digital_mut() {
//!             key.state = PINS[i].read_from_pdsrs(&snapshot);
//!         }
//!         note.poll(&mut transport, midi::channel(0), midi::note(36 + i as u8));
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod midi;
pub mod note;
pub mod pio;
pub mod quickpin;
pub mod transport;
pub mod velocity;

pub use midi::{NoteEvent, UsbMidiPacket};
pub use note::{BasicNote, Note, NoteMode, Timestamp, VelocityNote};
pub use transport::{MidiSink, Transport};
pub use velocity::{VelocityCurve, calculate_velocity};
