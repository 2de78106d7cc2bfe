//! Block-spin renormalization.
//!
//! Each 2x2 block of the source lattice becomes one site of a lattice of half
//! the side length, carrying the sign of the block sum. A zero sum (two up,
//! two down) has no majority; [`TieBreak`] decides it so every coarse spin
//! stays ±1.

use itertools::iproduct;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::lattice::Lattice;
use crate::error::{IsingError, IsingResult};

/// Resolution of a zero block sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Take the block's top-left spin `(2i, 2j)`.
    #[default]
    TopLeft,
    /// Always +1.
    Up,
    /// Fair coin from the caller's RNG.
    Random,
}

impl TryFrom<&str> for TieBreak {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "top_left" => Ok(Self::TopLeft),
            "up" => Ok(Self::Up),
            "random" => Ok(Self::Random),
            _ => Err(format!(
                "unknown tie_break '{s}', expected 'top_left', 'up', or 'random'"
            )),
        }
    }
}

/// Coarse-grain `lattice` into a fresh lattice of side `L/2`.
///
/// The coarse neighbour sums are rebuilt from scratch.
pub fn coarse_grain<R: Rng + ?Sized>(
    lattice: &Lattice,
    tie_break: TieBreak,
    rng: &mut R,
) -> IsingResult<Lattice> {
    let size = lattice.size();
    if size % 2 != 0 {
        return Err(IsingError::OddLattice { size });
    }
    let half = size / 2;
    let mut spins = Vec::with_capacity(half * half);
    for (i, j) in iproduct!(0..half, 0..half) {
        let block_sum: i32 = iproduct!(0..2, 0..2)
            .map(|(di, dj)| lattice.spin(2 * i + di, 2 * j + dj) as i32)
            .sum();
        let spin = match block_sum.signum() {
            1 => 1,
            -1 => -1,
            _ => match tie_break {
                TieBreak::TopLeft => lattice.spin(2 * i, 2 * j),
                TieBreak::Up => 1,
                TieBreak::Random => {
                    if rng.gen_bool(0.5) {
                        1
                    } else {
                        -1
                    }
                }
            },
        };
        spins.push(spin);
    }
    Ok(Lattice::from_flat(half, spins))
}
