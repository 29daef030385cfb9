use std::fmt;

use crate::config::MAX_CHARGE;

/// Non-conductive cell
pub const BACKGROUND: u8 = 0;

/// Conductive cell carrying no pulse
pub const QUIESCENT: u8 = 1;

/// Freshly triggered pulse, the only value that triggers a neighbour
pub const PEAK: u8 = 2;

/// Charge held by a wire: `QUIESCENT`, `PEAK`, or a decay step up to `MAX_CHARGE`.
///
/// A wire is conductive by construction, so a charge is never `BACKGROUND`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Charge(u8);

impl Charge {
    pub const QUIESCENT: Charge = Charge(QUIESCENT);
    pub const PEAK: Charge = Charge(PEAK);
    pub const MAX: Charge = Charge(MAX_CHARGE);

    /// Wrap a conductive cell value; panics outside `QUIESCENT..=MAX_CHARGE`
    pub fn new(value: u8) -> Self {
        assert!(
            (QUIESCENT..=MAX_CHARGE).contains(&value),
            "charge {} outside {}..={}",
            value,
            QUIESCENT,
            MAX_CHARGE
        );
        Self(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_quiescent(self) -> bool {
        self.0 == QUIESCENT
    }

    pub fn is_peak(self) -> bool {
        self.0 == PEAK
    }

    /// Charge on the next generation.
    ///
    /// `triggered` is whether some adjacent wire currently sits at `PEAK`; it
    /// only matters while quiescent; a running pulse decays on its own and
    /// cannot be re-armed until it has returned to `QUIESCENT`.
    pub fn next(self, triggered: bool) -> Self {
        match self.0 {
            QUIESCENT if triggered => Self::PEAK,
            QUIESCENT => self,
            MAX_CHARGE => Self::QUIESCENT,
            value => Self(value + 1),
        }
    }
}

impl Default for Charge {
    fn default() -> Self {
        Self::QUIESCENT
    }
}

impl From<Charge> for u8 {
    fn from(charge: Charge) -> u8 {
        charge.0
    }
}

impl fmt::Display for Charge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
