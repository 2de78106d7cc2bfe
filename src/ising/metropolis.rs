use rand::Rng;

use super::lattice::Lattice;

/// Counters collected over one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SweepStats {
    /// Update attempts made (always L² for a full sweep).
    pub attempts: usize,
    /// Attempts that flipped a spin.
    pub accepted: usize,
    /// Sum of ΔE over accepted flips.
    pub energy_change: f64,
}

impl SweepStats {
    pub fn acceptance_ratio(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempts as f64
        }
    }

    /// Fold another sweep's counters into this one.
    pub fn merge(&mut self, other: SweepStats) {
        self.attempts += other.attempts;
        self.accepted += other.accepted;
        self.energy_change += other.energy_change;
    }
}

/// Metropolis acceptance rule.
///
/// Downhill moves are always accepted; uphill moves with probability
/// `exp(-beta * dE)`. A uniform draw is consumed only for uphill moves.
#[inline]
pub fn accept<R: Rng + ?Sized>(delta_e: f64, beta: f64, rng: &mut R) -> bool {
    delta_e < 0.0 || rng.gen::<f64>() < (-beta * delta_e).exp()
}

/// Attempt a single Metropolis update at `(i, j)`.
///
/// Returns the energy change if the flip was accepted.
#[inline]
pub fn attempt_site<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    i: usize,
    j: usize,
    beta: f64,
    coupling: f64,
    field: f64,
    rng: &mut R,
) -> Option<f64> {
    let delta_e = lattice.local_delta_energy(i, j, coupling, field);
    if accept(delta_e, beta, rng) {
        lattice.flip_site(i, j);
        Some(delta_e)
    } else {
        None
    }
}

/// One Monte Carlo sweep: L² single-site attempts at uniformly random sites.
///
/// Sites are drawn with replacement, so a sweep need not visit every site.
/// `beta` must be finite and positive; callers validate this upfront.
pub fn sweep<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    beta: f64,
    coupling: f64,
    field: f64,
    rng: &mut R,
) -> SweepStats {
    let size = lattice.size();
    let mut stats = SweepStats {
        attempts: size * size,
        ..SweepStats::default()
    };
    for _ in 0..stats.attempts {
        let i = rng.gen_range(0..size);
        let j = rng.gen_range(0..size);
        if let Some(delta_e) = attempt_site(lattice, i, j, beta, coupling, field, rng) {
            stats.accepted += 1;
            stats.energy_change += delta_e;
        }
    }
    stats
}
