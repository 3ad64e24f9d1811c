use rand::Rng;

/// Draws `N` indices from `[0, pool_size)`, distinct from each other and
/// from `exclude`, redrawing on every collision.
///
/// Terminates with probability one when `pool_size > N`; the configuration
/// builder enforces a population of at least four for `N = 3`.
pub(crate) fn distinct_indices<const N: usize, R: Rng + ?Sized>(
    exclude: usize,
    pool_size: usize,
    rng: &mut R,
) -> [usize; N] {
    debug_assert!(N < pool_size);
    let mut out = [0usize; N];
    for k in 0..N {
        out[k] = loop {
            let candidate = rng.random_range(0..pool_size);
            if candidate != exclude && !out[..k].contains(&candidate) {
                break candidate;
            }
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::RngStream;

    #[test]
    fn test_indices_are_distinct() {
        let mut rng = RngStream::new(17);
        for i in 0..200 {
            let exclude = i % 4;
            let [a, b, c] = distinct_indices::<3, _>(exclude, 4, &mut rng);
            let mut all = vec![a, b, c, exclude];
            all.sort_unstable();
            all.dedup();
            assert_eq!(all.len(), 4, "draw {}: {:?}", i, [a, b, c]);
        }
    }

    #[test]
    fn test_indices_cover_pool() {
        let mut rng = RngStream::new(2);
        let mut seen = [0usize; 10];
        for _ in 0..2_000 {
            for idx in distinct_indices::<3, _>(0, 10, &mut rng) {
                seen[idx] += 1;
            }
        }
        assert_eq!(seen[0], 0);
        for (idx, &count) in seen.iter().enumerate().skip(1) {
            assert!(count > 400, "index {} drawn only {} times", idx, count);
        }
    }
}
