use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fill `values` with this rank's slice of the strictly decreasing
/// global sequence, the worst case for the exchange protocol. Rank `r`
/// starts `(N / P) * r` positions into the sequence, so the last rank
/// also covers the remainder of an uneven split.
pub fn worst_case(values: &mut [i32], total: usize, nprocs: usize, rank: usize) {
    let offset = (total / nprocs) * rank;
    for (i, v) in values.iter_mut().enumerate() {
        *v = (total - offset - i) as i32;
    }
}

/// Generate a reproducible random sequence, for testing.
pub fn random(len: usize, seed: u64) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1000..1000)).collect_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worst_case_is_strictly_decreasing_globally() {
        let total = 10;
        let nprocs = 4;
        let mut global = Vec::new();
        for rank in 0..nprocs {
            let len = if rank == nprocs - 1 {
                total / nprocs + total % nprocs
            } else {
                total / nprocs
            };
            let mut slice = vec![0; len];
            worst_case(&mut slice, total, nprocs, rank);
            global.extend_from_slice(&slice);
        }
        assert_eq!(global, vec![10, 9, 8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_worst_case_single_rank() {
        let mut slice = vec![0; 5];
        worst_case(&mut slice, 5, 1, 0);
        assert_eq!(slice, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_random_is_reproducible() {
        assert_eq!(random(32, 99), random(32, 99));
        assert_ne!(random(32, 99), random(32, 100));
    }
}
