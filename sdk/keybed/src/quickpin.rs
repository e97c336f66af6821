//! Fast digital input for the 54 Arduino Due header pins.
//!
//! Every logical pin is bound at compile time to a PIO port and a bit on that
//! port. A scanner should capture all four port data registers once per cycle
//! with [`PortSnapshot::capture`] and test each key against that snapshot, so
//! that every key of a cycle sees the same instant instead of a register that
//! keeps changing mid-scan.
//!
//! ```rust,ignore
//! use keybed::quickpin::{self, PortSnapshot, PINS};
//!
//! quickpin::setup();
//!
//! loop {
//!     let snapshot = PortSnapshot::capture();
//!     for (note, pin) in notes.iter_mut().zip(PINS.iter()) {
//!         note.state = pin.read_from_pdsrs(&snapshot);
//!     }
//! }
//! ```

use bit_field::BitField;

use crate::pio::{PORT_COUNT, PeripheralClocks, Pio, Pmc, Port};

/// Number of digital header pins.
pub const PIN_COUNT: usize = 54;

/// A header pin, resolved to its port and bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pin {
    port: Port,
    bit: u8,
    number: u8,
}

impl Pin {
    pub const fn new(port: Port, bit: u8, number: u8) -> Self {
        Self { port, bit, number }
    }

    #[inline(always)]
    pub const fn port(&self) -> Port {
        self.port
    }

    #[inline(always)]
    pub const fn bit(&self) -> u8 {
        self.bit
    }

    #[inline(always)]
    pub const fn mask(&self) -> u32 {
        1 << self.bit
    }

    /// The Arduino pin number this entry represents.
    #[inline(always)]
    pub const fn number(&self) -> u8 {
        self.number
    }

    /// Test this pin against a snapshot of the four port data registers.
    #[inline(always)]
    pub fn read_from_pdsrs(&self, snapshot: &PortSnapshot) -> bool {
        snapshot.word(self.port).get_bit(self.bit as usize)
    }

    /// Read the live level of this pin.
    #[inline(always)]
    pub fn read(&self) -> bool {
        self.read_from(self.port.registers())
    }

    #[inline(always)]
    pub fn read_from(&self, pio: &Pio) -> bool {
        pio.pdsr.read().get_bit(self.bit as usize)
    }
}

/// The four PDSR words, captured back to back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PortSnapshot(pub [u32; PORT_COUNT]);

impl PortSnapshot {
    #[inline(always)]
    pub fn capture() -> Self {
        Self::capture_from(|port| port.registers())
    }

    #[inline(always)]
    pub fn capture_from<'a>(registers: impl Fn(Port) -> &'a Pio) -> Self {
        Self(Port::ALL.map(|port| registers(port).pdsr.read()))
    }

    #[inline(always)]
    pub const fn word(&self, port: Port) -> u32 {
        self.0[port.index()]
    }
}

impl From<[u32; PORT_COUNT]> for PortSnapshot {
    fn from(words: [u32; PORT_COUNT]) -> Self {
        Self(words)
    }
}

use Port::{A, B, C, D};

/// Port and bit of every header pin, indexed by pin number.
const LAYOUT: [(Port, u8); PIN_COUNT] = [
    //  +0       +1       +2       +3       +4       +5       +6       +7       +8       +9
    (A, 8),  (A, 9),  (B, 25), (C, 28), (C, 26), (C, 25), (C, 24), (C, 23), (C, 22), (C, 21), // 0
    (C, 29), (D, 7),  (D, 8),  (B, 27), (D, 4),  (D, 5),  (A, 13), (A, 12), (A, 11), (A, 10), // 10
    (B, 12), (B, 13), (B, 26), (A, 14), (A, 15), (D, 0),  (D, 1),  (D, 2),  (D, 3),  (D, 6),  // 20
    (D, 9),  (A, 7),  (D, 10), (C, 1),  (C, 2),  (C, 3),  (C, 4),  (C, 5),  (C, 6),  (C, 7),  // 30
    (C, 8),  (C, 9),  (A, 19), (A, 20), (C, 19), (C, 18), (C, 17), (C, 16), (C, 15), (C, 14), // 40
    (C, 13), (C, 12), (B, 21), (B, 14),                                                       // 50
];

const fn pin_table() -> [Pin; PIN_COUNT] {
    let mut pins = [Pin::new(A, 0, 0); PIN_COUNT];
    let mut i = 0;
    while i < PIN_COUNT {
        let (port, bit) = LAYOUT[i];
        pins[i] = Pin::new(port, bit, i as u8);
        i += 1;
    }
    pins
}

/// All header pins, indexed by Arduino pin number.
pub static PINS: [Pin; PIN_COUNT] = pin_table();

/// Combined mask of every header pin on `port`.
pub const fn port_mask(port: Port) -> u32 {
    let mut mask = 0;
    let mut i = 0;
    while i < PIN_COUNT {
        if LAYOUT[i].0 as u8 == port as u8 {
            mask |= 1 << LAYOUT[i].1;
        }
        i += 1;
    }
    mask
}

/// Configure every header pin as a digital input.
///
/// Call once at startup, before the first scan.
pub fn setup() {
    setup_with(Pmc::get(), |port| port.registers());
}

pub fn setup_with<'a>(pmc: &Pmc, registers: impl Fn(Port) -> &'a Pio) {
    pmc.enable(PeripheralClocks::all());

    for port in Port::ALL {
        registers(port).configure_inputs(port_mask(port));
    }

    log::debug!("quickpin: {} pins configured as inputs", PIN_COUNT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pio::tests::{PDSR, PER, PIO_WORDS, as_pio};

    #[test]
    fn table_assigns_pin_numbers_in_order() {
        for (i, pin) in PINS.iter().enumerate() {
            assert_eq!(pin.number() as usize, i);
        }
        assert_eq!(PINS[2], Pin::new(B, 25, 2));
        assert_eq!(PINS[53], Pin::new(B, 14, 53));
        assert_eq!(PINS[31].mask(), 1 << 7);
    }

    #[test]
    fn no_two_pins_share_a_line() {
        for (i, a) in PINS.iter().enumerate() {
            for b in &PINS[i + 1..] {
                assert!(
                    a.port() != b.port() || a.bit() != b.bit(),
                    "pins {} and {} share {:?}{}",
                    a.number(),
                    b.number(),
                    a.port(),
                    a.bit()
                );
            }
        }
    }

    #[test]
    fn port_masks_cover_the_whole_table() {
        let total: u32 = Port::ALL.iter().map(|&p| port_mask(p).count_ones()).sum();
        assert_eq!(total as usize, PIN_COUNT);
        assert_eq!(port_mask(B), (1 << 25) | (1 << 27) | (1 << 12) | (1 << 13) | (1 << 26) | (1 << 21) | (1 << 14));
    }

    #[test]
    fn snapshot_read_only_looks_at_its_own_port() {
        let pin = PINS[2]; // PB25

        let mut words = [0u32; PORT_COUNT];
        words[B.index()] = 1 << 25;
        assert!(pin.read_from_pdsrs(&words.into()));

        // Same bit set on every other port, cleared on B.
        let snapshot = PortSnapshot([1 << 25, 0, 1 << 25, 1 << 25]);
        assert!(!pin.read_from_pdsrs(&snapshot));

        let snapshot = PortSnapshot([u32::MAX, !(1 << 25), u32::MAX, u32::MAX]);
        assert!(!pin.read_from_pdsrs(&snapshot));
    }

    #[test]
    fn snapshot_read_matches_mask_for_every_pin() {
        for pin in PINS.iter() {
            let mut words = [0u32; PORT_COUNT];
            assert!(!pin.read_from_pdsrs(&PortSnapshot(words)));
            words[pin.port().index()] = pin.mask();
            assert!(pin.read_from_pdsrs(&PortSnapshot(words)), "pin {}", pin.number());
        }
    }

    #[test]
    fn live_read_and_capture_use_pdsr() {
        let mut regs = [[0u32; PIO_WORDS]; PORT_COUNT];
        regs[C.index()][PDSR] = 1 << 28;
        regs[A.index()][PDSR] = 1 << 8;

        let pios = regs.each_mut().map(|words| as_pio(words));

        assert!(PINS[3].read_from(pios[C.index()]));
        assert!(!PINS[4].read_from(pios[C.index()]));

        let snapshot = PortSnapshot::capture_from(|port| pios[port.index()]);
        assert_eq!(snapshot, PortSnapshot([1 << 8, 0, 1 << 28, 0]));
        assert!(PINS[0].read_from_pdsrs(&snapshot));
        assert!(PINS[3].read_from_pdsrs(&snapshot));
    }

    #[test]
    fn setup_enables_clocks_and_inputs_on_every_port() {
        let mut regs = [[0u32; PIO_WORDS]; PORT_COUNT];
        let mut pmc_words = [0u32; 7];

        {
            let pmc = unsafe { &*(pmc_words.as_mut_ptr() as *const Pmc) };
            let pios = regs.each_mut().map(|words| as_pio(words));
            setup_with(pmc, |port| pios[port.index()]);
        }

        assert_eq!(pmc_words[4], PeripheralClocks::all().bits());
        for port in Port::ALL {
            assert_eq!(regs[port.index()][PER], port_mask(port));
        }
    }
}
