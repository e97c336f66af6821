//! Strike velocity from contact timing.
//!
//! A velocity keybed closes two contacts per key, one slightly after the other.
//! The faster the key travels, the shorter the gap between the two closures.
//! The gap is mapped linearly onto the MIDI velocity range: a gap of
//! [`MIN_VEL_MICROS`] or less gives [`MAX_VEL_OUT`], a gap of
//! [`MAX_VEL_MICROS`] or more gives [`MIN_VEL_OUT`].

/// Contact gap of the hardest strike the curve resolves.
pub const MIN_VEL_MICROS: u32 = 2_000;
/// Contact gap of the gentlest strike the curve resolves.
pub const MAX_VEL_MICROS: u32 = 40_000;
pub const MIN_VEL_OUT: u8 = 1;
pub const MAX_VEL_OUT: u8 = 127;

/// Linear mapping from contact gap (µs) to MIDI velocity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VelocityCurve {
    min_micros: u32,
    max_micros: u32,
    min_out: u8,
    max_out: u8,
}

impl VelocityCurve {
    pub const DEFAULT: Self = match Self::new(MIN_VEL_MICROS, MAX_VEL_MICROS, MIN_VEL_OUT, MAX_VEL_OUT) {
        Some(curve) => curve,
        None => panic!("velocity constants describe an empty range"),
    };

    /// Returns `None` unless both ranges are non-empty and the output fits in 7 bits.
    pub const fn new(min_micros: u32, max_micros: u32, min_out: u8, max_out: u8) -> Option<Self> {
        if min_micros >= max_micros || min_out >= max_out || max_out > 127 {
            return None;
        }
        Some(Self {
            min_micros,
            max_micros,
            min_out,
            max_out,
        })
    }

    pub const fn min_micros(&self) -> u32 {
        self.min_micros
    }

    pub const fn max_micros(&self) -> u32 {
        self.max_micros
    }

    pub const fn min_out(&self) -> u8 {
        self.min_out
    }

    pub const fn max_out(&self) -> u8 {
        self.max_out
    }

    /// Velocity for a contact gap of `delta_micros`.
    ///
    /// Gaps beyond the slow end give the minimum velocity. The result is only
    /// clamped at the top: anything at or below the slow end is already at least
    /// `min_out`.
    pub const fn velocity(&self, delta_micros: u32) -> u8 {
        if delta_micros > self.max_micros {
            return self.min_out;
        }

        let n = (self.max_micros - delta_micros) as u64;
        let span_micros = (self.max_micros - self.min_micros) as u64;
        let span_out = (self.max_out - self.min_out) as u64;

        // n / (span_micros / span_out), truncated
        let vel = n * span_out / span_micros + self.min_out as u64;

        if vel > self.max_out as u64 {
            self.max_out
        } else {
            vel as u8
        }
    }
}

impl Default for VelocityCurve {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// [`VelocityCurve::velocity`] on the firmware's curve.
pub const fn calculate_velocity(delta_micros: u32) -> u8 {
    VelocityCurve::DEFAULT.velocity(delta_micros)
}
