//! Kernel support vector classification.
//!
//! Multi-class problems are split one-vs-one: one binary machine per pair of
//! classes, each solved by [`smo::solve`]. Prediction is a vote among the
//! pairwise machines; ties go to the lowest class code.
//!
//! [`SupportVectorClassifier::decision_function`] reports one-vs-rest shaped
//! scores derived from the votes, which is what the stacking layer consumes.

pub mod kernel;
pub mod smo;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EmogifError, Result};
use crate::ml::Classifier;
use crate::ml::sparse::SparseVector;

use self::kernel::{Kernel, KernelType};
use self::smo::SmoSettings;

/// Hyperparameters of [`SupportVectorClassifier`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvcParams {
    pub c: f64,
    pub gamma: f64,
    pub kernel: KernelType,
    pub degree: u32,
    pub coef0: f64,
    pub max_iter: usize,
    pub tol: f64,
    /// Kernel cache budget per binary problem, in megabytes.
    pub cache_size_mb: usize,
}

impl Default for SvcParams {
    fn default() -> Self {
        SvcParams {
            c: 1.0,
            gamma: 1.0,
            kernel: KernelType::Rbf,
            degree: 3,
            coef0: 0.0,
            max_iter: 10_000,
            tol: 1e-3,
            cache_size_mb: 200,
        }
    }
}

impl SvcParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(EmogifError::model(format!(
                "SVC C must be a positive number, got {}",
                self.c
            )));
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(EmogifError::model(format!(
                "SVC gamma must be a positive number, got {}",
                self.gamma
            )));
        }
        if self.max_iter == 0 {
            return Err(EmogifError::model("SVC max_iter must be at least 1"));
        }
        Ok(())
    }

    fn kernel(&self) -> Kernel {
        Kernel {
            kind: self.kernel,
            gamma: self.gamma,
            degree: self.degree,
            coef0: self.coef0,
        }
    }
}

/// One fitted binary machine separating `positive` from `negative`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PairMachine {
    positive: usize,
    negative: usize,
    support_vectors: Vec<SparseVector>,
    /// `alpha_i * y_i` per support vector.
    dual_coef: Vec<f64>,
    rho: f64,
}

impl PairMachine {
    fn decision(&self, kernel: &Kernel, x: &SparseVector, sq_x: f64) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, coef)| coef * kernel.eval(sv, sv.squared_norm(), x, sq_x))
            .sum::<f64>()
            - self.rho
    }
}

/// Support vector classifier over sparse features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportVectorClassifier {
    params: SvcParams,
    n_classes: usize,
    machines: Vec<PairMachine>,
}

impl SupportVectorClassifier {
    pub fn new(params: SvcParams) -> Self {
        SupportVectorClassifier {
            params,
            ..Default::default()
        }
    }

    pub fn params(&self) -> &SvcParams {
        &self.params
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Total number of stored support vectors across the pairwise machines.
    pub fn support_vector_count(&self) -> usize {
        self.machines.iter().map(|m| m.support_vectors.len()).sum()
    }

    /// Votes per class and summed pairwise confidences.
    fn votes(&self, x: &SparseVector) -> Result<(Vec<f64>, Vec<f64>)> {
        if !self.is_fitted() {
            return Err(EmogifError::model("SVC is not fitted"));
        }
        let kernel = self.params.kernel();
        let sq_x = x.squared_norm();
        let mut votes = vec![0.0; self.n_classes];
        let mut confidence = vec![0.0; self.n_classes];
        for machine in &self.machines {
            let decision = machine.decision(&kernel, x, sq_x);
            if decision > 0.0 {
                votes[machine.positive] += 1.0;
            } else {
                votes[machine.negative] += 1.0;
            }
            confidence[machine.positive] += decision;
            confidence[machine.negative] -= decision;
        }
        Ok((votes, confidence))
    }

    /// One-vs-rest shaped decision values: votes plus a confidence term
    /// squashed into `(-1/3, 1/3)` so it only breaks ties between vote
    /// counts.
    pub fn decision_function(&self, x: &SparseVector) -> Result<Vec<f64>> {
        let (votes, confidence) = self.votes(x)?;
        Ok(votes
            .into_iter()
            .zip(confidence)
            .map(|(v, c)| v + c / (3.0 * (c.abs() + 1.0)))
            .collect())
    }

    pub fn decision_function_batch(&self, xs: &[SparseVector]) -> Result<Vec<Vec<f64>>> {
        xs.iter().map(|x| self.decision_function(x)).collect()
    }
}

fn fit_pair(
    xs: &[SparseVector],
    labels: &[usize],
    positive: usize,
    negative: usize,
    params: &SvcParams,
) -> PairMachine {
    let (subset, y): (Vec<&SparseVector>, Vec<f64>) = xs
        .iter()
        .zip(labels)
        .filter(|(_, label)| **label == positive || **label == negative)
        .map(|(x, label)| (x, if *label == positive { 1.0 } else { -1.0 }))
        .unzip();

    let settings = SmoSettings {
        c: params.c,
        eps: params.tol,
        max_iter: params.max_iter,
        cache_bytes: params.cache_size_mb * 1024 * 1024,
    };
    let solution = smo::solve(&subset, &y, params.kernel(), settings);
    debug!(
        "SVC pair ({positive}, {negative}): {} samples, {} iterations, converged: {}",
        subset.len(),
        solution.iterations,
        solution.converged
    );

    let mut support_vectors = Vec::new();
    let mut dual_coef = Vec::new();
    for ((x, y), alpha) in subset.into_iter().zip(y).zip(solution.alpha) {
        if alpha > 0.0 {
            support_vectors.push(x.clone());
            dual_coef.push(alpha * y);
        }
    }

    PairMachine {
        positive,
        negative,
        support_vectors,
        dual_coef,
        rho: solution.rho,
    }
}

impl Classifier for SupportVectorClassifier {
    fn fit(&mut self, xs: &[SparseVector], labels: &[usize], n_classes: usize) -> Result<()> {
        self.params.validate()?;
        if xs.len() != labels.len() {
            return Err(EmogifError::model(format!(
                "{} samples but {} labels",
                xs.len(),
                labels.len()
            )));
        }

        let mut counts = vec![0usize; n_classes];
        for &label in labels {
            match counts.get_mut(label) {
                Some(count) => *count += 1,
                None => {
                    return Err(EmogifError::invalid_label(format!(
                        "class code {label} is out of range for {n_classes} classes"
                    )));
                }
            }
        }
        let present: Vec<usize> = (0..n_classes).filter(|&c| counts[c] > 0).collect();
        if present.len() < 2 {
            return Err(EmogifError::model("SVC needs samples of at least two classes"));
        }

        let pairs: Vec<(usize, usize)> = present
            .iter()
            .enumerate()
            .flat_map(|(i, &a)| present[i + 1..].iter().map(move |&b| (a, b)))
            .collect();

        let params = &self.params;
        let machines: Vec<PairMachine> = pairs
            .into_par_iter()
            .map(|(positive, negative)| fit_pair(xs, labels, positive, negative, params))
            .collect();

        self.n_classes = n_classes;
        self.machines = machines;
        Ok(())
    }

    fn predict(&self, x: &SparseVector) -> Result<usize> {
        let (votes, _) = self.votes(x)?;
        Ok(crate::ml::logistic::argmax(&votes))
    }

    fn is_fitted(&self) -> bool {
        !self.machines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters() -> (Vec<SparseVector>, Vec<usize>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for class in 0..3u32 {
            for k in 0..6 {
                xs.push(SparseVector::from_pairs(vec![
                    (class, 1.0),
                    (3, 0.1 * k as f64),
                ]));
                ys.push(class as usize);
            }
        }
        (xs, ys)
    }

    fn params(kernel: KernelType) -> SvcParams {
        SvcParams {
            c: 10.0,
            gamma: 1.0,
            kernel,
            ..Default::default()
        }
    }

    #[test]
    fn test_one_vs_one_fits_clusters() {
        let (xs, ys) = clusters();
        for kernel in [KernelType::Rbf, KernelType::Linear, KernelType::Poly] {
            let mut svc = SupportVectorClassifier::new(params(kernel));
            svc.fit(&xs, &ys, 3).unwrap();
            assert_eq!(svc.predict_batch(&xs).unwrap(), ys, "{kernel:?}");
            assert!(svc.support_vector_count() > 0);
        }
    }

    #[test]
    fn test_decision_function_shape_and_ordering() {
        let (xs, ys) = clusters();
        let mut svc = SupportVectorClassifier::new(params(KernelType::Rbf));
        svc.fit(&xs, &ys, 4).unwrap();

        let decision = svc.decision_function(&xs[7]).unwrap();
        assert_eq!(decision.len(), 4);
        // class 1 wins both of its pairs
        assert!(decision[1] > 1.5);
        assert!(decision[1] > decision[0] && decision[1] > decision[2]);
        // absent class gets no votes and no confidence
        assert_eq!(decision[3], 0.0);
        assert_eq!(svc.predict(&xs[7]).unwrap(), 1);
    }

    #[test]
    fn test_rejects_bad_input() {
        let (xs, ys) = clusters();
        let mut bad_gamma = params(KernelType::Rbf);
        bad_gamma.gamma = 0.0;
        assert!(SupportVectorClassifier::new(bad_gamma).fit(&xs, &ys, 3).is_err());

        let mut svc = SupportVectorClassifier::new(params(KernelType::Rbf));
        assert!(svc.fit(&xs, &vec![2; xs.len()], 3).is_err());
        assert!(svc.fit(&xs, &ys, 2).is_err());
        assert!(svc.decision_function(&xs[0]).is_err());
    }
}
