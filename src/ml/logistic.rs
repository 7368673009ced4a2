//! Regularized logistic regression.
//!
//! Two solvers are available:
//!
//! - [`Solver::Ovr`]: one binary problem per class, solved by accelerated
//!   proximal gradient (FISTA). Supports L1 and L2 penalties.
//! - [`Solver::Lbfgs`]: a single multinomial (softmax) problem solved by
//!   L-BFGS. Supports only the L2 penalty.
//!
//! Both minimize the mean log loss plus `penalty(w) / (C * n)`, which has the
//! same minimizer as the usual `C * sum(loss) + penalty(w)` form. Intercepts
//! are not penalized.
//!
//! Classes absent from the training labels are never predicted and get zero
//! probability.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{EmogifError, Result};
use crate::ml::Classifier;
use crate::ml::sparse::SparseVector;

/// Regularization penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Penalty {
    L1,
    L2,
}

/// Optimization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    /// One-vs-rest binary problems, proximal gradient.
    Ovr,
    /// Multinomial problem, L-BFGS.
    Lbfgs,
}

/// Hyperparameters of [`LogisticRegression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub penalty: Penalty,
    /// Inverse regularization strength, must be positive.
    pub c: f64,
    pub solver: Solver,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        LogisticParams {
            penalty: Penalty::L2,
            c: 1.0,
            solver: Solver::Lbfgs,
            max_iter: 100,
            tol: 1e-4,
        }
    }
}

impl LogisticParams {
    /// Reject combinations no solver can handle.
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(EmogifError::model(format!(
                "C must be a positive number, got {}",
                self.c
            )));
        }
        if self.penalty == Penalty::L1 && self.solver == Solver::Lbfgs {
            return Err(EmogifError::model(
                "the lbfgs solver supports only the l2 penalty",
            ));
        }
        if self.max_iter == 0 {
            return Err(EmogifError::model("max_iter must be at least 1"));
        }
        Ok(())
    }
}

/// Logistic regression classifier over sparse features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    params: LogisticParams,
    n_classes: usize,
    /// Codes of the classes seen in training, ascending.
    present: Vec<usize>,
    /// One weight row per fitted problem.
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

impl LogisticRegression {
    pub fn new(params: LogisticParams) -> Self {
        LogisticRegression {
            params,
            ..Default::default()
        }
    }

    pub fn params(&self) -> &LogisticParams {
        &self.params
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Class probabilities, one entry per class code.
    pub fn predict_proba(&self, x: &SparseVector) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(EmogifError::model("logistic regression is not fitted"));
        }

        let local = match (self.params.solver, self.present.len()) {
            (Solver::Ovr, 2) => {
                let p = sigmoid(self.score(0, x));
                vec![1.0 - p, p]
            }
            (Solver::Ovr, _) => {
                let mut p: Vec<f64> = (0..self.present.len())
                    .map(|row| sigmoid(self.score(row, x)))
                    .collect();
                let sum: f64 = p.iter().sum();
                if sum > 0.0 {
                    p.iter_mut().for_each(|v| *v /= sum);
                }
                p
            }
            (Solver::Lbfgs, _) => {
                let scores: Vec<f64> = (0..self.present.len())
                    .map(|row| self.score(row, x))
                    .collect();
                softmax(&scores)
            }
        };

        let mut proba = vec![0.0; self.n_classes];
        for (slot, p) in self.present.iter().zip(local) {
            proba[*slot] = p;
        }
        Ok(proba)
    }

    pub fn predict_proba_batch(&self, xs: &[SparseVector]) -> Result<Vec<Vec<f64>>> {
        xs.iter().map(|x| self.predict_proba(x)).collect()
    }

    fn score(&self, row: usize, x: &SparseVector) -> f64 {
        x.dot_dense(&self.coef[row]) + self.intercept[row]
    }

    fn fit_ovr(&mut self, xs: &[SparseVector], local: &[usize], n_features: usize) {
        let problems = if self.present.len() == 2 {
            vec![1]
        } else {
            (0..self.present.len()).collect()
        };

        self.coef.clear();
        self.intercept.clear();
        for class in problems {
            let targets: Vec<f64> = local
                .iter()
                .map(|&y| if y == class { 1.0 } else { -1.0 })
                .collect();
            let (w, b) = fista_binary(xs, &targets, n_features, &self.params);
            self.coef.push(w);
            self.intercept.push(b);
        }
    }

    fn fit_multinomial(&mut self, xs: &[SparseVector], local: &[usize], n_features: usize) {
        let k = self.present.len();
        let n = xs.len() as f64;
        let lambda = 1.0 / (self.params.c * n);
        let stride = n_features + 1;

        let objective = |params: &[f64], grad: &mut [f64]| -> f64 {
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut loss = 0.0;
            let mut scores = vec![0.0; k];
            for (x, &y) in xs.iter().zip(local) {
                for (c, score) in scores.iter_mut().enumerate() {
                    let row = &params[c * stride..c * stride + n_features];
                    *score = x.dot_dense(row) + params[c * stride + n_features];
                }
                let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let log_sum = max + scores.iter().map(|s| (s - max).exp()).sum::<f64>().ln();
                loss += log_sum - scores[y];
                for (c, score) in scores.iter().enumerate() {
                    let diff = (score - log_sum).exp() - if c == y { 1.0 } else { 0.0 };
                    let row = &mut grad[c * stride..c * stride + n_features];
                    x.axpy_into(diff / n, row);
                    grad[c * stride + n_features] += diff / n;
                }
            }
            loss /= n;
            for c in 0..k {
                for j in 0..n_features {
                    let w = params[c * stride + j];
                    loss += 0.5 * lambda * w * w;
                    grad[c * stride + j] += lambda * w;
                }
            }
            loss
        };

        let start = vec![0.0; k * stride];
        let outcome = lbfgs(objective, start, self.params.max_iter, self.params.tol);
        if !outcome.converged {
            debug!(
                "lbfgs stopped after {} iterations without converging",
                outcome.iterations
            );
        }

        self.coef = (0..k)
            .map(|c| outcome.x[c * stride..c * stride + n_features].to_vec())
            .collect();
        self.intercept = (0..k).map(|c| outcome.x[c * stride + n_features]).collect();
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, xs: &[SparseVector], labels: &[usize], n_classes: usize) -> Result<()> {
        self.params.validate()?;
        if xs.len() != labels.len() {
            return Err(EmogifError::model(format!(
                "{} samples but {} labels",
                xs.len(),
                labels.len()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&y| y >= n_classes) {
            return Err(EmogifError::invalid_label(format!(
                "class code {bad} is out of range for {n_classes} classes"
            )));
        }

        let mut present: Vec<usize> = labels.to_vec();
        present.sort_unstable();
        present.dedup();
        if present.len() < 2 {
            return Err(EmogifError::model(
                "logistic regression needs samples of at least two classes",
            ));
        }
        let local: Vec<usize> = labels
            .iter()
            .map(|y| present.binary_search(y).unwrap_or_default())
            .collect();

        let n_features = xs
            .iter()
            .filter_map(|x| x.indices().last())
            .map(|&i| i as usize + 1)
            .max()
            .unwrap_or(0);

        self.n_classes = n_classes;
        self.present = present;
        match self.params.solver {
            Solver::Ovr => self.fit_ovr(xs, &local, n_features),
            Solver::Lbfgs => self.fit_multinomial(xs, &local, n_features),
        }
        Ok(())
    }

    fn predict(&self, x: &SparseVector) -> Result<usize> {
        Ok(argmax(&self.predict_proba(x)?))
    }

    fn is_fitted(&self) -> bool {
        !self.coef.is_empty()
    }
}

/// Index of the largest value; the first one on ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Solve one binary problem with targets in `{-1, 1}`.
fn fista_binary(
    xs: &[SparseVector],
    targets: &[f64],
    n_features: usize,
    params: &LogisticParams,
) -> (Vec<f64>, f64) {
    let n = xs.len() as f64;
    let lambda = 1.0 / (params.c * n);
    let lipschitz = xs.iter().map(|x| x.squared_norm() + 1.0).sum::<f64>() / (4.0 * n);
    let step = 1.0 / lipschitz.max(f64::EPSILON);

    let mut w = vec![0.0; n_features];
    let mut b = 0.0;
    let mut zw = w.clone();
    let mut zb = b;
    let mut t = 1.0f64;
    let mut grad = vec![0.0; n_features];
    let mut converged = false;
    let mut iterations = 0;

    while iterations < params.max_iter {
        iterations += 1;

        grad.iter_mut().for_each(|g| *g = 0.0);
        let mut grad_b = 0.0;
        for (x, &y) in xs.iter().zip(targets) {
            let margin = y * (x.dot_dense(&zw) + zb);
            let g = -y * sigmoid(-margin) / n;
            x.axpy_into(g, &mut grad);
            grad_b += g;
        }

        let threshold = step * lambda;
        let mut delta: f64 = 0.0;
        let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
        let momentum = (t - 1.0) / t_next;

        for j in 0..n_features {
            let v = zw[j] - step * grad[j];
            let next = match params.penalty {
                Penalty::L1 => v.signum() * (v.abs() - threshold).max(0.0),
                Penalty::L2 => v / (1.0 + threshold),
            };
            delta = delta.max((next - w[j]).abs());
            zw[j] = next + momentum * (next - w[j]);
            w[j] = next;
        }
        let next_b = zb - step * grad_b;
        delta = delta.max((next_b - b).abs());
        zb = next_b + momentum * (next_b - b);
        b = next_b;
        t = t_next;

        if delta < params.tol {
            converged = true;
            break;
        }
    }

    if !converged {
        debug!("proximal gradient stopped after {iterations} iterations without converging");
    }
    (w, b)
}

pub(crate) struct LbfgsOutcome {
    pub x: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Limited-memory BFGS with backtracking (Armijo) line search.
///
/// `f` writes the gradient into its second argument and returns the value.
pub(crate) fn lbfgs<F>(f: F, mut x: Vec<f64>, max_iter: usize, tol: f64) -> LbfgsOutcome
where
    F: Fn(&[f64], &mut [f64]) -> f64,
{
    const MEMORY: usize = 10;
    const ARMIJO: f64 = 1e-4;
    const MAX_HALVINGS: usize = 40;

    let dim = x.len();
    let mut grad = vec![0.0; dim];
    let mut value = f(&x, &mut grad);
    let mut history: Vec<(Vec<f64>, Vec<f64>, f64)> = Vec::with_capacity(MEMORY);
    let mut next_grad = vec![0.0; dim];

    for iteration in 0..max_iter {
        if max_abs(&grad) < tol {
            return LbfgsOutcome {
                x,
                iterations: iteration,
                converged: true,
            };
        }

        let mut direction = two_loop(&grad, &history);
        let mut slope = dot(&grad, &direction);
        if slope >= 0.0 {
            history.clear();
            direction = grad.iter().map(|g| -g).collect();
            slope = -dot(&grad, &grad);
        }

        let mut step = if history.is_empty() {
            1.0 / max_abs(&grad).max(1.0)
        } else {
            1.0
        };
        let mut candidate = vec![0.0; dim];
        let mut accepted = None;
        for _ in 0..MAX_HALVINGS {
            for i in 0..dim {
                candidate[i] = x[i] + step * direction[i];
            }
            let candidate_value = f(&candidate, &mut next_grad);
            if candidate_value <= value + ARMIJO * step * slope {
                accepted = Some(candidate_value);
                break;
            }
            step *= 0.5;
        }

        let Some(next_value) = accepted else {
            return LbfgsOutcome {
                x,
                iterations: iteration,
                converged: max_abs(&grad) < tol,
            };
        };

        let s: Vec<f64> = candidate.iter().zip(&x).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = next_grad.iter().zip(&grad).map(|(a, b)| a - b).collect();
        let sy = dot(&s, &y);
        if sy > 1e-10 {
            if history.len() == MEMORY {
                history.remove(0);
            }
            history.push((s, y, 1.0 / sy));
        }

        let improvement = value - next_value;
        x = candidate;
        std::mem::swap(&mut grad, &mut next_grad);
        value = next_value;

        if improvement.abs() <= f64::EPSILON * value.abs().max(1.0) {
            return LbfgsOutcome {
                x,
                iterations: iteration + 1,
                converged: true,
            };
        }
    }

    let converged = max_abs(&grad) < tol;
    LbfgsOutcome {
        x,
        iterations: max_iter,
        converged,
    }
}

fn two_loop(grad: &[f64], history: &[(Vec<f64>, Vec<f64>, f64)]) -> Vec<f64> {
    let mut q = grad.to_vec();
    let mut alphas = Vec::with_capacity(history.len());
    for (s, y, rho) in history.iter().rev() {
        let alpha = rho * dot(s, &q);
        for (qi, yi) in q.iter_mut().zip(y) {
            *qi -= alpha * yi;
        }
        alphas.push(alpha);
    }

    let gamma = history
        .last()
        .map(|(s, y, _)| dot(s, y) / dot(y, y))
        .unwrap_or(1.0);
    q.iter_mut().for_each(|v| *v *= gamma);

    for ((s, y, rho), alpha) in history.iter().zip(alphas.into_iter().rev()) {
        let beta = rho * dot(y, &q);
        for (qi, si) in q.iter_mut().zip(s) {
            *qi += si * (alpha - beta);
        }
    }

    q.into_iter().map(|v| -v).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three well separated clusters on features 0, 1 and 2.
    fn clusters() -> (Vec<SparseVector>, Vec<usize>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for class in 0..3u32 {
            for k in 0..8 {
                let noise = 0.05 * k as f64;
                xs.push(SparseVector::from_pairs(vec![
                    (class, 1.0),
                    (3 + (k % 2) as u32, noise),
                ]));
                ys.push(class as usize);
            }
        }
        (xs, ys)
    }

    fn params(penalty: Penalty, solver: Solver) -> LogisticParams {
        LogisticParams {
            penalty,
            c: 10.0,
            solver,
            max_iter: 2000,
            tol: 1e-6,
        }
    }

    #[test]
    fn test_solvers_separate_clusters() {
        let (xs, ys) = clusters();
        for (penalty, solver) in [
            (Penalty::L2, Solver::Lbfgs),
            (Penalty::L2, Solver::Ovr),
            (Penalty::L1, Solver::Ovr),
        ] {
            let mut model = LogisticRegression::new(params(penalty, solver));
            model.fit(&xs, &ys, 3).unwrap();
            let predicted = model.predict_batch(&xs).unwrap();
            assert_eq!(predicted, ys, "{penalty:?} {solver:?}");

            let proba = model.predict_proba(&xs[0]).unwrap();
            assert_eq!(proba.len(), 3);
            assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_absent_class_gets_zero_probability() {
        let (xs, ys) = clusters();
        let mut model = LogisticRegression::new(params(Penalty::L2, Solver::Lbfgs));
        model.fit(&xs, &ys, 5).unwrap();
        let proba = model.predict_proba(&xs[20]).unwrap();
        assert_eq!(proba.len(), 5);
        assert_eq!(proba[3], 0.0);
        assert_eq!(proba[4], 0.0);
        assert_eq!(model.predict(&xs[20]).unwrap(), 2);
    }

    #[test]
    fn test_binary_ovr() {
        let (xs, ys) = clusters();
        let xs = &xs[..16];
        let ys = &ys[..16];
        let mut model = LogisticRegression::new(params(Penalty::L2, Solver::Ovr));
        model.fit(xs, ys, 2).unwrap();
        assert_eq!(model.predict_batch(xs).unwrap(), ys.to_vec());
    }

    #[test]
    fn test_invalid_configurations() {
        let (xs, ys) = clusters();
        let mut model = LogisticRegression::new(params(Penalty::L1, Solver::Lbfgs));
        assert!(model.fit(&xs, &ys, 3).is_err());

        let mut bad_c = params(Penalty::L2, Solver::Ovr);
        bad_c.c = 0.0;
        assert!(LogisticRegression::new(bad_c).fit(&xs, &ys, 3).is_err());

        let single = vec![0; xs.len()];
        let mut model = LogisticRegression::new(params(Penalty::L2, Solver::Ovr));
        assert!(model.fit(&xs, &single, 3).is_err());
        assert!(model.predict(&xs[0]).is_err());
    }

    #[test]
    fn test_lbfgs_quadratic() {
        let f = |x: &[f64], g: &mut [f64]| {
            g[0] = 2.0 * (x[0] - 3.0);
            g[1] = 4.0 * (x[1] + 1.0);
            (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2)
        };
        let outcome = lbfgs(f, vec![0.0, 0.0], 100, 1e-8);
        assert!(outcome.converged);
        assert!((outcome.x[0] - 3.0).abs() < 1e-6);
        assert!((outcome.x[1] + 1.0).abs() < 1e-6);
    }
}
