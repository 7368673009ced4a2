//! Stratified k-fold cross-validation.
//!
//! Folds are assigned without shuffling so that a given label sequence always
//! produces the same partition. Classes are numbered by first appearance,
//! the sorted label sequence is dealt round-robin over the folds to decide
//! how many samples of each class every fold receives, and each class then
//! fills its folds in index order.

use log::warn;

use crate::error::{EmogifError, Result};

/// One train/test partition of sample indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified k-fold splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    n_splits: usize,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Result<Self> {
        if n_splits < 2 {
            return Err(EmogifError::config(format!(
                "cross-validation needs at least 2 folds, got {n_splits}"
            )));
        }
        Ok(StratifiedKFold { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Fold index of every sample.
    pub fn test_folds<T: Eq>(&self, labels: &[T]) -> Result<Vec<usize>> {
        let n = labels.len();
        if self.n_splits > n {
            return Err(EmogifError::model(format!(
                "cannot have {} folds with only {n} samples",
                self.n_splits
            )));
        }

        // class numbers in order of first appearance
        let mut first_seen: Vec<&T> = Vec::new();
        let encoded: Vec<usize> = labels
            .iter()
            .map(|label| match first_seen.iter().position(|seen| *seen == label) {
                Some(class) => class,
                None => {
                    first_seen.push(label);
                    first_seen.len() - 1
                }
            })
            .collect();
        let n_classes = first_seen.len();

        let mut counts = vec![0usize; n_classes];
        for &class in &encoded {
            counts[class] += 1;
        }
        if counts.iter().all(|&count| count < self.n_splits) {
            return Err(EmogifError::model(format!(
                "{} folds exceed the number of members in every class",
                self.n_splits
            )));
        }
        if counts.iter().any(|&count| count < self.n_splits) {
            warn!(
                "The least populated class has only {} members, fewer than {} folds",
                counts.iter().min().copied().unwrap_or_default(),
                self.n_splits
            );
        }

        let mut sorted = encoded.clone();
        sorted.sort_unstable();
        // allocation[fold][class]
        let mut allocation = vec![vec![0usize; n_classes]; self.n_splits];
        for (position, &class) in sorted.iter().enumerate() {
            allocation[position % self.n_splits][class] += 1;
        }

        let mut queues: Vec<std::vec::IntoIter<usize>> = (0..n_classes)
            .map(|class| {
                (0..self.n_splits)
                    .flat_map(|fold| std::iter::repeat_n(fold, allocation[fold][class]))
                    .collect::<Vec<_>>()
                    .into_iter()
            })
            .collect();

        encoded
            .iter()
            .map(|&class| {
                queues[class]
                    .next()
                    .ok_or_else(|| EmogifError::other("fold allocation does not cover every sample"))
            })
            .collect()
    }

    /// Train/test index sets for every fold.
    pub fn split<T: Eq>(&self, labels: &[T]) -> Result<Vec<Fold>> {
        let test_folds = self.test_folds(labels)?;
        Ok((0..self.n_splits)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..labels.len()).partition(|&i| test_folds[i] == fold);
                Fold { train, test }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_partition_indices() {
        let labels = [0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 0, 1];
        let folds = StratifiedKFold::new(3).unwrap().split(&labels).unwrap();
        assert_eq!(folds.len(), 3);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..labels.len()).collect::<Vec<_>>());

        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), labels.len());
            assert!(fold.test.iter().all(|i| !fold.train.contains(i)));
        }
    }

    #[test]
    fn test_classes_are_spread_over_folds() {
        let labels = ["a", "a", "a", "b", "b", "b"];
        let folds = StratifiedKFold::new(3).unwrap().test_folds(&labels).unwrap();
        assert_eq!(folds, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_uneven_allocation_matches_round_robin() {
        // sorted: [0,0,0,0,0,1,1] dealt over 2 folds -> fold 0 gets 3x0 + 1x1
        let labels = [0, 1, 0, 0, 1, 0, 0];
        let folds = StratifiedKFold::new(2).unwrap().test_folds(&labels).unwrap();
        assert_eq!(folds, vec![0, 0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_too_many_folds() {
        assert!(StratifiedKFold::new(1).is_err());
        let splitter = StratifiedKFold::new(5).unwrap();
        assert!(splitter.test_folds(&[0, 1, 0]).is_err());
        assert!(splitter.test_folds(&[0, 0, 1, 1, 2, 2]).is_err());
        assert!(splitter.test_folds(&[0, 0, 0, 0, 0, 1]).is_ok());
    }
}
