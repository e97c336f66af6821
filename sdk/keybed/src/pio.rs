//! SAM3X8E parallel I/O controller registers.
//!
//! The keybed is wired to the four PIO controllers of the SAM3X8E (Arduino Due).
//! Each controller exposes a 32-bit pin data status register (PDSR) that reflects
//! the level of every line on that port.
//!
//! | Port | Base         | Peripheral ID |
//! |------|--------------|---------------|
//! | A    | `0x400E0E00` | 11            |
//! | B    | `0x400E1000` | 12            |
//! | C    | `0x400E1200` | 13            |
//! | D    | `0x400E1400` | 14            |

use volatile_register::{RO, RW, WO};

/// Number of PIO controllers the keybed reads from.
pub const PORT_COUNT: usize = 4;

const PIOA_BASE: usize = 0x400E_0E00;
const PIOB_BASE: usize = 0x400E_1000;
const PIOC_BASE: usize = 0x400E_1200;
const PIOD_BASE: usize = 0x400E_1400;

const PMC_BASE: usize = 0x400E_0600;

bitflags::bitflags! {
    /// Bits of `PMC_PCER0`/`PMC_PCSR0` for the parallel I/O controllers.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct PeripheralClocks: u32 {
        const PIOA = 1 << 11;
        const PIOB = 1 << 12;
        const PIOC = 1 << 13;
        const PIOD = 1 << 14;
    }
}

/// PIO controller register block.
#[repr(C)]
pub struct Pio {
    pub per: WO<u32>,
    pub pdr: WO<u32>,
    pub psr: RO<u32>,
    _reserved0: u32,
    pub oer: WO<u32>,
    pub odr: WO<u32>,
    pub osr: RO<u32>,
    _reserved1: u32,
    pub ifer: WO<u32>,
    pub ifdr: WO<u32>,
    pub ifsr: RO<u32>,
    _reserved2: u32,
    pub sodr: WO<u32>,
    pub codr: WO<u32>,
    pub odsr: RW<u32>,
    /// Pin data status register
    pub pdsr: RO<u32>,
    pub ier: WO<u32>,
    pub idr: WO<u32>,
    pub imr: RO<u32>,
    pub isr: RO<u32>,
    pub mder: WO<u32>,
    pub mddr: WO<u32>,
    pub mdsr: RO<u32>,
    _reserved3: u32,
    pub pudr: WO<u32>,
    pub puer: WO<u32>,
    pub pusr: RO<u32>,
}

impl Pio {
    /// Hand a set of lines over to the PIO as plain inputs: no pull-up, no glitch
    /// filter, no interrupts, output driver off.
    #[inline(always)]
    pub fn configure_inputs(&self, mask: u32) {
        unsafe {
            self.idr.write(mask);
            self.pudr.write(mask);
            self.ifdr.write(mask);
            self.odr.write(mask);
            self.per.write(mask);
        }
    }
}

/// Power management controller, peripheral clock registers only.
#[repr(C)]
pub struct Pmc {
    pub scer: WO<u32>,
    pub scdr: WO<u32>,
    pub scsr: RO<u32>,
    _reserved0: u32,
    pub pcer0: WO<u32>,
    pub pcdr0: WO<u32>,
    pub pcsr0: RO<u32>,
}

impl Pmc {
    /// The chip's power management controller.
    #[inline(always)]
    pub fn get() -> &'static Pmc {
        unsafe { &*(PMC_BASE as *const Pmc) }
    }

    #[inline(always)]
    pub fn enable(&self, clocks: PeripheralClocks) {
        unsafe { self.pcer0.write(clocks.bits()) }
    }

    #[inline(always)]
    pub fn enabled(&self) -> PeripheralClocks {
        PeripheralClocks::from_bits_truncate(self.pcsr0.read())
    }
}

/// One of the four PIO controllers.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Port {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
}

impl Port {
    pub const ALL: [Port; PORT_COUNT] = [Port::A, Port::B, Port::C, Port::D];

    /// Position of this port in a [`PortSnapshot`](crate::quickpin::PortSnapshot).
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline(always)]
    pub const fn base(self) -> usize {
        match self {
            Port::A => PIOA_BASE,
            Port::B => PIOB_BASE,
            Port::C => PIOC_BASE,
            Port::D => PIOD_BASE,
        }
    }

    #[inline(always)]
    pub const fn clock(self) -> PeripheralClocks {
        match self {
            Port::A => PeripheralClocks::PIOA,
            Port::B => PeripheralClocks::PIOB,
            Port::C => PeripheralClocks::PIOC,
            Port::D => PeripheralClocks::PIOD,
        }
    }

    /// The memory-mapped register block of this port.
    #[inline(always)]
    pub fn registers(self) -> &'static Pio {
        unsafe { &*(self.base() as *const Pio) }
    }
}
