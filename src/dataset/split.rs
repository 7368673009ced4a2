//! Randomized train/test split.
//!
//! The table is shuffled once and cut at `floor(N * fraction)`. The row at the
//! cut index belongs to neither side, so the testing set holds
//! `N - floor(N * fraction) - 1` rows (or none when the cut reaches the end).

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{EmogifError, Result};

/// Shuffle `rows` with a fresh OS-seeded generator and split them.
pub fn split<T>(rows: Vec<T>, training_fraction: f64) -> Result<(Vec<T>, Vec<T>)> {
    split_with_rng(rows, training_fraction, &mut rand::rng())
}

/// Shuffle `rows` with the given generator and split them.
pub fn split_with_rng<T, R: Rng + ?Sized>(
    mut rows: Vec<T>,
    training_fraction: f64,
    rng: &mut R,
) -> Result<(Vec<T>, Vec<T>)> {
    if !(0.0..=1.0).contains(&training_fraction) {
        return Err(EmogifError::config(format!(
            "training fraction must be within [0, 1], got {training_fraction}"
        )));
    }

    rows.shuffle(rng);

    let total = rows.len();
    let training_count = ((total as f64) * training_fraction).floor() as usize;

    let mut testing = if training_count < total {
        rows.split_off(training_count + 1)
    } else {
        Vec::new()
    };
    rows.truncate(training_count);
    testing.shrink_to_fit();

    Ok((rows, testing))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_cardinality() {
        let mut rng = StdRng::seed_from_u64(7);
        for (n, fraction) in [(10usize, 0.8), (101, 0.8), (3, 0.5), (1, 0.0), (0, 0.8)] {
            let rows: Vec<usize> = (0..n).collect();
            let (train, test) = split_with_rng(rows, fraction, &mut rng).unwrap();
            let tc = ((n as f64) * fraction).floor() as usize;
            assert_eq!(train.len(), tc);
            assert_eq!(test.len(), n.saturating_sub(tc + 1));
        }
    }

    #[test]
    fn test_disjoint() {
        let mut rng = StdRng::seed_from_u64(42);
        let rows: Vec<usize> = (0..50).collect();
        let (train, test) = split_with_rng(rows, 0.8, &mut rng).unwrap();
        let train: HashSet<_> = train.into_iter().collect();
        assert!(test.iter().all(|row| !train.contains(row)));
        assert_eq!(train.len() + test.len(), 49);
    }

    #[test]
    fn test_whole_table_for_training() {
        let (train, test) = split((0..5).collect::<Vec<_>>(), 1.0).unwrap();
        assert_eq!(train.len(), 5);
        assert!(test.is_empty());
    }

    #[test]
    fn test_fraction_out_of_range() {
        assert!(split(vec![1, 2, 3], 1.5).is_err());
        assert!(split(vec![1, 2, 3], -0.1).is_err());
        assert!(split(vec![1, 2, 3], f64::NAN).is_err());
    }
}
