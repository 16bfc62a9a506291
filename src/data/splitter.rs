// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Seeded shuffle, then cut:
//
//   [ s3 s0 s7 s1 … ] → train = first round(N·f), valid = rest
//
// Rows in the dataset files are often grouped by label, so the
// shuffle keeps both sets mixed. The same seed always gives the
// same split, which keeps trials of a run comparable.
//
// Reference: rand crate documentation (SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and return (train, validation),
/// where train holds `train_fraction` of the items (rounded).
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    samples.shuffle(&mut StdRng::seed_from_u64(seed));

    let cut   = (samples.len() as f64 * train_fraction.clamp(0.0, 1.0)).round() as usize;
    let valid = samples.split_off(cut.min(samples.len()));

    tracing::debug!("Split {} / {} with seed {seed}", samples.len(), valid.len());
    (samples, valid)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_follow_fraction() {
        let (train, valid) = split_train_val((0..100).collect::<Vec<u32>>(), 0.8, 42);
        assert_eq!((train.len(), valid.len()), (80, 20));

        let (train, valid) = split_train_val((0..10).collect::<Vec<u32>>(), 1.0, 42);
        assert_eq!((train.len(), valid.len()), (10, 0));
    }

    #[test]
    fn test_no_item_lost_or_duplicated() {
        let (mut train, valid) = split_train_val((0..50).collect::<Vec<u32>>(), 0.7, 3);
        train.extend(valid);
        train.sort_unstable();
        assert_eq!(train, (0..50).collect::<Vec<u32>>());
    }

    #[test]
    fn test_empty_input() {
        let (train, valid) = split_train_val(Vec::<u32>::new(), 0.8, 42);
        assert!(train.is_empty() && valid.is_empty());
    }

    #[test]
    fn test_same_seed_same_split() {
        let (a, _) = split_train_val((0..30).collect::<Vec<_>>(), 0.8, 9);
        let (b, _) = split_train_val((0..30).collect::<Vec<_>>(), 0.8, 9);
        let (c, _) = split_train_val((0..30).collect::<Vec<_>>(), 0.8, 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
