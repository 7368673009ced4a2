//! Two-level stacked ensemble.
//!
//! The base learners are a [`LogisticRegression`] and a
//! [`SupportVectorClassifier`]. For every sample the meta learner sees
//!
//! ```text
//! [ logistic class probabilities (K) | SVC one-vs-rest decision values (K) ]
//! ```
//!
//! During fitting these meta features come from out-of-fold predictions of a
//! stratified k-fold split, so the meta learner never sees base predictions
//! for samples the base learners were trained on. The base learners are then
//! refit on all samples for inference.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EmogifError, Result};
use crate::ml::Classifier;
use crate::ml::logistic::{LogisticParams, LogisticRegression, Penalty, Solver};
use crate::ml::model_selection::StratifiedKFold;
use crate::ml::sparse::SparseVector;
use crate::ml::svm::{SupportVectorClassifier, SvcParams};

/// Number of folds used for the out-of-fold meta features.
pub const DEFAULT_STACKING_CV: usize = 5;

/// Parameters of the meta learner: L1, one-vs-rest, `C = 1`.
pub fn meta_learner_params() -> LogisticParams {
    LogisticParams {
        penalty: Penalty::L1,
        c: 1.0,
        solver: Solver::Ovr,
        max_iter: 10_000,
        tol: 1e-4,
    }
}

/// Stacking classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingClassifier {
    logistic: LogisticRegression,
    svc: SupportVectorClassifier,
    meta: LogisticRegression,
    cv: usize,
    n_classes: usize,
}

impl StackingClassifier {
    pub fn new(logistic: LogisticParams, svc: SvcParams, cv: usize) -> Self {
        StackingClassifier {
            logistic: LogisticRegression::new(logistic),
            svc: SupportVectorClassifier::new(svc),
            meta: LogisticRegression::new(meta_learner_params()),
            cv,
            n_classes: 0,
        }
    }

    pub fn logistic(&self) -> &LogisticRegression {
        &self.logistic
    }

    pub fn svc(&self) -> &SupportVectorClassifier {
        &self.svc
    }

    pub fn meta(&self) -> &LogisticRegression {
        &self.meta
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn meta_features(
        logistic: &LogisticRegression,
        svc: &SupportVectorClassifier,
        x: &SparseVector,
    ) -> Result<Vec<f64>> {
        let mut features = logistic.predict_proba(x)?;
        features.extend(svc.decision_function(x)?);
        Ok(features)
    }

    /// Meta features of one sample using the fitted base learners.
    pub fn transform(&self, x: &SparseVector) -> Result<Vec<f64>> {
        Self::meta_features(&self.logistic, &self.svc, x)
    }

    /// Class probabilities from the meta learner.
    pub fn predict_proba(&self, x: &SparseVector) -> Result<Vec<f64>> {
        let features = SparseVector::from_dense(&self.transform(x)?);
        self.meta.predict_proba(&features)
    }

    /// Out-of-fold meta features for every training sample.
    fn out_of_fold_features(
        &self,
        xs: &[SparseVector],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<Vec<SparseVector>> {
        let folds = StratifiedKFold::new(self.cv)?.split(labels)?;

        let fold_rows: Vec<Vec<(usize, SparseVector)>> = folds
            .into_par_iter()
            .map(|fold| {
                let train_x: Vec<SparseVector> = fold.train.iter().map(|&i| xs[i].clone()).collect();
                let train_y: Vec<usize> = fold.train.iter().map(|&i| labels[i]).collect();

                let mut logistic = self.logistic.clone();
                let mut svc = self.svc.clone();
                let (lr, sv) = rayon::join(
                    || logistic.fit(&train_x, &train_y, n_classes),
                    || svc.fit(&train_x, &train_y, n_classes),
                );
                lr?;
                sv?;

                fold.test
                    .iter()
                    .map(|&i| {
                        let row = Self::meta_features(&logistic, &svc, &xs[i])?;
                        Ok((i, SparseVector::from_dense(&row)))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let mut features = vec![SparseVector::new(); xs.len()];
        for (i, row) in fold_rows.into_iter().flatten() {
            features[i] = row;
        }
        Ok(features)
    }
}

impl Classifier for StackingClassifier {
    fn fit(&mut self, xs: &[SparseVector], labels: &[usize], n_classes: usize) -> Result<()> {
        if xs.len() != labels.len() {
            return Err(EmogifError::model(format!(
                "{} samples but {} labels",
                xs.len(),
                labels.len()
            )));
        }

        let meta_x = self.out_of_fold_features(xs, labels, n_classes)?;
        debug!("Built {} out-of-fold meta feature rows", meta_x.len());

        let (logistic, svc) = (&mut self.logistic, &mut self.svc);
        let (lr, sv) = rayon::join(
            || logistic.fit(xs, labels, n_classes),
            || svc.fit(xs, labels, n_classes),
        );
        lr?;
        sv?;

        self.meta.fit(&meta_x, labels, n_classes)?;
        self.n_classes = n_classes;
        Ok(())
    }

    fn predict(&self, x: &SparseVector) -> Result<usize> {
        let features = SparseVector::from_dense(&self.transform(x)?);
        self.meta.predict(&features)
    }

    fn is_fitted(&self) -> bool {
        self.meta.is_fitted() && self.logistic.is_fitted() && self.svc.is_fitted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::svm::kernel::KernelType;

    fn clusters() -> (Vec<SparseVector>, Vec<usize>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for k in 0..6 {
            for class in 0..3u32 {
                xs.push(SparseVector::from_pairs(vec![
                    (class, 1.0),
                    (3, 0.1 * k as f64),
                ]));
                ys.push(class as usize);
            }
        }
        (xs, ys)
    }

    fn ensemble() -> StackingClassifier {
        StackingClassifier::new(
            LogisticParams {
                penalty: Penalty::L2,
                c: 4.0,
                solver: Solver::Lbfgs,
                max_iter: 500,
                tol: 1e-4,
            },
            SvcParams {
                c: 10.0,
                gamma: 1.0,
                kernel: KernelType::Rbf,
                ..Default::default()
            },
            3,
        )
    }

    #[test]
    fn test_stacking_fits_and_predicts() {
        let (xs, ys) = clusters();
        let mut model = ensemble();
        assert!(!model.is_fitted());
        model.fit(&xs, &ys, 3).unwrap();
        assert!(model.is_fitted());

        assert_eq!(model.transform(&xs[0]).unwrap().len(), 6);
        assert_eq!(model.predict_batch(&xs).unwrap(), ys);

        let proba = model.predict_proba(&xs[4]).unwrap();
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_base_learner_failure_propagates() {
        let (xs, ys) = clusters();
        let mut model = StackingClassifier::new(
            LogisticParams {
                penalty: Penalty::L1,
                solver: Solver::Lbfgs,
                ..Default::default()
            },
            SvcParams::default(),
            3,
        );
        assert!(model.fit(&xs, &ys, 3).is_err());
    }
}
