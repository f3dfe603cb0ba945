//! Buffer manager. Every buffer the protocol touches is allocated once
//! at startup and reused for the whole run; steady state never
//! reallocates.

use crate::error::SortError;
use crate::params::RunConfig;

/// Allocate a zeroed element buffer, reporting failure instead of
/// aborting so the rank can exit with its own diagnostic.
pub fn alloc_elems(rank: usize, elems: usize) -> Result<Vec<i32>, SortError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(elems)
        .map_err(|_| SortError::Allocation { rank, elems })?;
    buf.resize(elems, 0);
    Ok(buf)
}

fn alloc_flags(rank: usize, elems: usize) -> Result<Vec<u8>, SortError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(elems)
        .map_err(|_| SortError::Allocation { rank, elems })?;
    buf.resize(elems, 1);
    Ok(buf)
}

/// Fixed scratch storage for one rank.
///
/// `combined` is sized for the largest slice any rank holds, which
/// also covers the exchange merge output: its two inputs are at most
/// `max_slice / D` each and `D >= 2`. `right_val` holds the widest
/// border any peer can ship.
#[derive(Debug)]
pub struct Scratch {
    /// Merge destination, `max_slice` elements.
    pub combined: Vec<i32>,
    /// Values received from the right neighbour, `max_slice / D`
    /// elements.
    pub right_val: Vec<i32>,
    /// Agreement bitmap, one flag per rank, refreshed every round.
    /// `sorted[0]` stays true, rank 0 has no left neighbour.
    pub sorted: Vec<u8>,
}

impl Scratch {
    /// Allocate all scratch buffers for `rank`. On failure the buffers
    /// already allocated are dropped and the error names the rank and
    /// the size that could not be obtained.
    pub fn alloc(rank: usize, nprocs: usize, config: &RunConfig) -> Result<Self, SortError> {
        let max_slice = config.max_slice_len(nprocs);
        let combined = alloc_elems(rank, max_slice)?;
        let right_val = alloc_elems(rank, max_slice / config.divisor)?;
        let sorted = alloc_flags(rank, nprocs)?;
        Ok(Scratch {
            combined,
            right_val,
            sorted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_sizes() {
        let config = RunConfig {
            total: 10,
            divisor: 2,
            ..RunConfig::default()
        };
        let scratch = Scratch::alloc(0, 4, &config).unwrap();
        // max slice is rank 3's: 10/4 + 10%4 = 4
        assert_eq!(scratch.combined.len(), 4);
        assert_eq!(scratch.right_val.len(), 2);
        assert_eq!(scratch.sorted.len(), 4);
        assert!(scratch.sorted.iter().all(|&f| f == 1));
    }

    #[test]
    fn test_combined_covers_exchange_output() {
        // The exchange merges this rank's border with the peer's
        // shipment. Both are bounded by max_slice / D, so combined
        // never overflows while D >= 2.
        for (total, nprocs, divisor) in [(10, 4, 2), (55, 7, 3), (1_000_000, 6, 4)] {
            let config = RunConfig {
                total,
                divisor,
                ..RunConfig::default()
            };
            let max_slice = config.max_slice_len(nprocs);
            for rank in 0..nprocs.saturating_sub(1) {
                let own = config.border_len(rank, nprocs);
                let peer = config.border_len(rank + 1, nprocs);
                assert!(own + peer <= max_slice);
            }
        }
    }

    #[test]
    fn test_alloc_elems_zeroed() {
        let buf = alloc_elems(0, 8).unwrap();
        assert_eq!(buf, vec![0; 8]);
        assert!(alloc_elems(0, 0).unwrap().is_empty());
    }
}
