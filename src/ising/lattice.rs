use crate::error::{IsingError, IsingResult};

/// Offsets of the four nearest neighbours on the square lattice.
const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Square L x L spin lattice with periodic boundaries.
///
/// Next to the spins the lattice keeps a cache of neighbour sums:
/// `neighbor_sums[i, j]` is the sum of the four periodic nearest-neighbour
/// spins of site `(i, j)`. The cache is updated in O(1) on every flip, so the
/// local energy change of a flip never needs a full-lattice pass.
///
/// Sites are stored row-major in flat vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    size: usize,
    spins: Vec<i8>,
    neighbor_sums: Vec<i8>,
}

impl Lattice {
    /// Create a lattice with all spins up (ordered start).
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new_ordered(size: usize) -> Self {
        assert!(size > 0, "lattice side must be positive");
        Self::from_flat(size, vec![1i8; size * size])
    }

    /// Build a lattice from explicit rows of spins.
    ///
    /// Rows must form a non-empty square grid of ±1 values.
    pub fn from_spins(rows: &[Vec<i8>]) -> IsingResult<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(IsingError::InvalidConfig("lattice must not be empty".into()));
        }
        let mut spins = Vec::with_capacity(size * size);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(IsingError::InvalidConfig(format!(
                    "row {i} has length {}, expected {size}",
                    row.len()
                )));
            }
            if let Some(&bad) = row.iter().find(|&&s| s != 1 && s != -1) {
                return Err(IsingError::InvalidConfig(format!(
                    "spin value {bad} in row {i} is not ±1"
                )));
            }
            spins.extend_from_slice(row);
        }
        Ok(Self::from_flat(size, spins))
    }

    /// Wrap a flat row-major spin vector and compute its neighbour sums.
    pub(crate) fn from_flat(size: usize, spins: Vec<i8>) -> Self {
        debug_assert_eq!(spins.len(), size * size);
        let mut lattice = Self {
            size,
            spins,
            neighbor_sums: vec![0i8; size * size],
        };
        lattice.rebuild_neighbor_sums();
        lattice
    }

    /// Side length L.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of sites, L².
    pub fn n_sites(&self) -> usize {
        self.size * self.size
    }

    #[inline]
    fn index(&self, i: usize, j: usize) -> usize {
        i * self.size + j
    }

    /// Wrap a possibly out-of-range coordinate onto `[0, L)`.
    #[inline]
    pub(crate) fn wrap(&self, x: isize) -> usize {
        x.rem_euclid(self.size as isize) as usize
    }

    /// Spin at `(i, j)`.
    #[inline]
    pub fn spin(&self, i: usize, j: usize) -> i8 {
        self.spins[self.index(i, j)]
    }

    /// Cached neighbour sum at `(i, j)`.
    #[inline]
    pub fn neighbor_sum(&self, i: usize, j: usize) -> i8 {
        self.neighbor_sums[self.index(i, j)]
    }

    /// Flat row-major view of the spins.
    pub fn spins(&self) -> &[i8] {
        &self.spins
    }

    /// Copy the spins out as rows, for reporting.
    pub fn spin_rows(&self) -> Vec<Vec<i8>> {
        self.spins.chunks(self.size).map(<[i8]>::to_vec).collect()
    }

    /// Neighbour sums computed from scratch, without touching the cache.
    pub fn computed_neighbor_sums(&self) -> Vec<i8> {
        let mut sums = vec![0i8; self.n_sites()];
        for i in 0..self.size {
            for j in 0..self.size {
                sums[self.index(i, j)] = NEIGHBOR_OFFSETS
                    .iter()
                    .map(|&(di, dj)| {
                        let ni = self.wrap(i as isize + di);
                        let nj = self.wrap(j as isize + dj);
                        self.spin(ni, nj)
                    })
                    .sum();
            }
        }
        sums
    }

    /// Recompute the whole neighbour-sum cache. O(L²).
    pub fn rebuild_neighbor_sums(&mut self) {
        self.neighbor_sums = self.computed_neighbor_sums();
    }

    /// Whether the cache matches a from-scratch recomputation.
    pub fn neighbor_sums_consistent(&self) -> bool {
        self.neighbor_sums == self.computed_neighbor_sums()
    }

    /// Flip the spin at `(i, j)` and patch the four neighbours' cached sums.
    ///
    /// The spin is negated first; each neighbour then gains twice the new
    /// value, which is exactly the change in its sum.
    pub fn flip_site(&mut self, i: usize, j: usize) {
        let idx = self.index(i, j);
        self.spins[idx] = -self.spins[idx];
        let delta = 2 * self.spins[idx];
        for &(di, dj) in &NEIGHBOR_OFFSETS {
            let ni = self.wrap(i as isize + di);
            let nj = self.wrap(j as isize + dj);
            let nidx = self.index(ni, nj);
            self.neighbor_sums[nidx] += delta;
        }
    }

    /// Energy change from flipping `(i, j)` alone.
    ///
    /// ΔE = 2 J s nnsum + 2 H s, with s the spin before the flip.
    #[inline]
    pub fn local_delta_energy(&self, i: usize, j: usize, coupling: f64, field: f64) -> f64 {
        let idx = self.index(i, j);
        let s = self.spins[idx] as f64;
        let nn = self.neighbor_sums[idx] as f64;
        2.0 * coupling * s * nn + 2.0 * field * s
    }

    /// Mean spin (magnetization per site).
    pub fn mean_spin(&self) -> f64 {
        let total: i64 = self.spins.iter().map(|&s| s as i64).sum();
        total as f64 / self.n_sites() as f64
    }

    /// Total energy E = -J Σ<ij> s_i s_j - H Σ s_i.
    ///
    /// Each bond is counted once via the right and down neighbours.
    pub fn total_energy(&self, coupling: f64, field: f64) -> f64 {
        let mut bonds = 0i64;
        let mut magnet = 0i64;
        for i in 0..self.size {
            for j in 0..self.size {
                let s = self.spin(i, j) as i64;
                let right = self.spin(i, (j + 1) % self.size) as i64;
                let down = self.spin((i + 1) % self.size, j) as i64;
                bonds += s * (right + down);
                magnet += s;
            }
        }
        -coupling * bonds as f64 - field * magnet as f64
    }
}
