//! Splittable, keyed random streams.
//!
//! A [`RngStream`] is a ChaCha8 generator addressed by a 64-bit key and a
//! stream id, plus its word position. [`RngStream::split`] derives `n` child
//! streams from the parent's key and position: the children share one derived
//! key and differ by stream id. Each child is owned by exactly one computation
//! and can be consumed on any thread. [`RngStream::join`] folds the used
//! children back into a single continuation stream for the next generation.
//!
//! The same root seed and the same sequence of splits, draws and joins always
//! reproduce the same numbers, whatever the thread schedule.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;
const SEED_SALT: u64 = 0x6a09_e667_f3bc_c908;
const SPLIT_SALT: u64 = 0xbb67_ae85_84ca_a73b;
const JOIN_SALT: u64 = 0x3c6e_f372_fe94_f82b;

/// SplitMix64 finalizer, used only to derive keys.
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Folds a 128-bit word position into 64 bits.
#[inline]
fn fold_pos(pos: u128) -> u64 {
    (pos as u64) ^ ((pos >> 64) as u64)
}

/// Expands `key` into a 256-bit ChaCha seed and selects `stream`.
fn keyed_generator(key: u64, stream: u64) -> ChaCha8Rng {
    let mut seed = [0u8; 32];
    for (k, chunk) in seed.chunks_exact_mut(8).enumerate() {
        let word = mix64(key.wrapping_add((k as u64 + 1).wrapping_mul(GOLDEN_GAMMA)));
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    let mut rng = ChaCha8Rng::from_seed(seed);
    rng.set_stream(stream);
    rng
}

/// A deterministic pseudorandom stream keyed by `(key, stream id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RngStream {
    key: u64,
    rng: ChaCha8Rng,
}

impl RngStream {
    /// Creates the root stream for `seed`.
    pub fn new(seed: u64) -> Self {
        let key = mix64(seed ^ SEED_SALT);
        Self {
            key,
            rng: keyed_generator(key, 0),
        }
    }

    /// Number of 32-bit words drawn from this stream so far.
    pub fn draws(&self) -> u128 {
        self.rng.get_word_pos()
    }

    /// Derives `n` independent child streams.
    ///
    /// The children depend on the parent's key, stream id and on how far the
    /// parent has been consumed, so splitting the same stream at two
    /// different positions yields unrelated children.
    pub fn split(self, n: usize) -> Vec<RngStream> {
        let position = fold_pos(self.rng.get_word_pos()).wrapping_add(SPLIT_SALT);
        let base = mix64(self.key ^ mix64(position) ^ mix64(self.rng.get_stream() ^ GOLDEN_GAMMA));
        (0..n as u64)
            .map(|i| RngStream {
                key: base,
                rng: keyed_generator(base, i),
            })
            .collect()
    }

    /// Merges used child streams into one continuation stream.
    ///
    /// The fold runs over the children in index order and absorbs the key,
    /// stream id and word position of each child.
    pub fn join(streams: &[RngStream]) -> RngStream {
        let key = streams.iter().fold(JOIN_SALT, |acc, s| {
            let id = mix64(s.key ^ s.rng.get_stream().wrapping_mul(GOLDEN_GAMMA));
            mix64(acc ^ id).wrapping_add(mix64(fold_pos(s.rng.get_word_pos()) ^ GOLDEN_GAMMA))
        });
        let key = mix64(key);
        RngStream {
            key,
            rng: keyed_generator(key, 0),
        }
    }
}

impl RngCore for RngStream {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.rng.fill_bytes(dst)
    }
}

impl SeedableRng for RngStream {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}
