use ndarray::{Array1, Array2, Zip};
use rand::Rng;

use crate::distinct_indices::distinct_indices;

/// Hybrid best/rand mutation: `x_base + F * (x_r1 - x_r2)` where the base is
/// the current best with probability one half and a third random member
/// otherwise. The coin is flipped independently for every candidate.
pub(crate) fn mutant_best_or_rand1<R: Rng + ?Sized>(
    i: usize,
    pop: &Array2<f64>,
    best_idx: usize,
    f: f64,
    rng: &mut R,
) -> Array1<f64> {
    let [r0, r1, r2] = distinct_indices::<3, _>(i, pop.nrows(), rng);
    let base = if rng.random::<f64>() <= 0.5 {
        best_idx
    } else {
        r0
    };

    Zip::from(pop.row(base))
        .and(pop.row(r1))
        .and(pop.row(r2))
        .map_collect(|&x0, &x1, &x2| x0 + f * (x1 - x2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::RngStream;

    fn ladder(npop: usize, n: usize) -> Array2<f64> {
        Array2::from_shape_fn((npop, n), |(i, j)| (i * 10 + j) as f64)
    }

    #[test]
    fn test_mutant_is_a_difference_step() {
        let pop = ladder(6, 3);
        let mut rng = RngStream::new(8);
        for i in 0..6 {
            let mutant = mutant_best_or_rand1(i, &pop, 5, 0.5, &mut rng);
            // Rows differ by multiples of 10 along every column, so the
            // mutant keeps the column offsets of the ladder.
            for j in 0..3 {
                let offset = (mutant[j] - j as f64).rem_euclid(5.0);
                assert!(offset.abs() < 1e-12, "unexpected mutant {:?}", mutant);
            }
        }
    }

    #[test]
    fn test_zero_weight_returns_a_member() {
        let pop = ladder(8, 2);
        let mut rng = RngStream::new(4);
        let mut used_best = false;
        let mut used_random = false;
        for _ in 0..100 {
            let mutant = mutant_best_or_rand1(0, &pop, 3, 0.0, &mut rng);
            let row = (mutant[0] / 10.0) as usize;
            assert_eq!(mutant, pop.row(row));
            assert_ne!(row, 0);
            if row == 3 {
                used_best = true;
            } else {
                used_random = true;
            }
        }
        assert!(used_best && used_random);
    }
}
