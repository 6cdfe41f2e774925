//! Random selection for shuffle mode
//!
//! Shuffle here is a pick, not a permutation: every advance draws uniformly
//! from the whole queue, so the current track may come up again right away.
//! The stored queue order is never touched.

use rand::Rng;

/// Pick a uniformly random index in `[0, len)`
///
/// Returns `None` for an empty queue.
pub fn pick_random<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(rng.gen_range(0..len))
}
