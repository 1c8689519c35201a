// Fisher-Yates shuffling over an injected random source.

use rand::seq::SliceRandom;
use rand::Rng;

/// Return a uniformly random permutation of `items`, leaving the input as is.
///
/// `SliceRandom::shuffle` walks from the last index down to 1 and swaps each
/// slot with a uniformly chosen index in `0..=i`.
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}
