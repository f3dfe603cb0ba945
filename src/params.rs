use std::env;

use crate::error::SortError;

/// Launch parameters, fixed at startup and identical on every rank.
///
/// The defaults reproduce the reference deployment: one million
/// elements (forty in debug builds), half-slice borders, merge instead
/// of a full re-sort after the first round, and the full-publish
/// agreement that lets already sorted boundaries skip their exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Global element count `N`.
    pub total: usize,
    /// Border divisor `D`. A slice of length `S` trades `S / D`
    /// elements with each neighbour per round.
    pub divisor: usize,
    /// After round one, rebuild local order with a three-way merge of
    /// the surviving runs rather than sorting from scratch.
    pub prefer_merge: bool,
    /// Complete every broadcast of the agreement phase even after an
    /// unsorted boundary is seen. Costs extra broadcasts but lets
    /// sorted boundaries sit out phases E and F.
    pub full_converge: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            total: if cfg!(debug_assertions) { 40 } else { 1_000_000 },
            divisor: 2,
            prefer_merge: true,
            full_converge: true,
        }
    }
}

fn env_or(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl RunConfig {
    /// Read `N`, `CONV_DIV`, `PREFER_MERGE` and `FULL_CONVERGE` from
    /// the environment, falling back to the defaults above.
    pub fn from_env() -> Self {
        let defaults = RunConfig::default();
        RunConfig {
            total: env_or("N", defaults.total),
            divisor: env_or("CONV_DIV", defaults.divisor),
            prefer_merge: env_or("PREFER_MERGE", 1) != 0,
            full_converge: env_or("FULL_CONVERGE", 1) != 0,
        }
    }

    /// Reject parameter combinations the protocol cannot run on.
    pub fn validate(&self, nprocs: usize) -> Result<(), SortError> {
        if self.total < nprocs {
            return Err(SortError::TotalTooSmall {
                total: self.total,
                nprocs,
            });
        }
        if self.divisor < 2 {
            return Err(SortError::BadDivisor {
                divisor: self.divisor,
            });
        }
        // With neighbours present, every rank needs a border of at
        // least one element or an unsorted boundary can never change.
        if nprocs > 1 && self.total / nprocs < self.divisor {
            return Err(SortError::SliceTooThin {
                slice_len: self.total / nprocs,
                divisor: self.divisor,
            });
        }
        Ok(())
    }

    /// Size of the slice owned by `rank`. The last rank absorbs the
    /// remainder of an uneven split.
    pub fn slice_len(&self, rank: usize, nprocs: usize) -> usize {
        let base = self.total / nprocs;
        if rank == nprocs - 1 {
            base + self.total % nprocs
        } else {
            base
        }
    }

    /// Border width of the slice owned by `rank`.
    pub fn border_len(&self, rank: usize, nprocs: usize) -> usize {
        self.slice_len(rank, nprocs) / self.divisor
    }

    /// Largest slice held by any rank, used to size scratch buffers.
    pub fn max_slice_len(&self, nprocs: usize) -> usize {
        self.total / nprocs + self.total % nprocs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(total: usize, divisor: usize) -> RunConfig {
        RunConfig {
            total,
            divisor,
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_slice_geometry() {
        let c = config(10, 2);
        assert_eq!(c.slice_len(0, 4), 2);
        assert_eq!(c.slice_len(2, 4), 2);
        assert_eq!(c.slice_len(3, 4), 4);
        assert_eq!(c.max_slice_len(4), 4);
        assert_eq!(c.border_len(0, 4), 1);
        assert_eq!(c.border_len(3, 4), 2);
    }

    #[test]
    fn test_even_split() {
        let c = config(9, 3);
        for rank in 0..3 {
            assert_eq!(c.slice_len(rank, 3), 3);
        }
        assert_eq!(c.max_slice_len(3), 3);
    }

    #[test]
    fn test_slice_lengths_sum_to_total() {
        for (total, nprocs) in [(10, 4), (1_000_000, 7), (55, 7), (9, 3)] {
            let c = config(total, 2);
            let sum: usize = (0..nprocs).map(|r| c.slice_len(r, nprocs)).sum();
            assert_eq!(sum, total);
        }
    }

    #[test]
    fn test_validate_rejects_bad_domains() {
        assert_eq!(
            config(3, 2).validate(4),
            Err(SortError::TotalTooSmall {
                total: 3,
                nprocs: 4
            })
        );
        assert_eq!(
            config(10, 1).validate(2),
            Err(SortError::BadDivisor { divisor: 1 })
        );
        // N/P = 1 < D = 2, a zero-width border cannot make progress
        assert_eq!(
            config(4, 2).validate(4),
            Err(SortError::SliceTooThin {
                slice_len: 1,
                divisor: 2
            })
        );
        assert!(config(8, 2).validate(4).is_ok());
        // A single rank never exchanges, so a thin slice is fine there
        assert!(config(1, 2).validate(1).is_ok());
    }
}
