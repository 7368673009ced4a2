//! Sequential minimal optimization for the binary C-SVC dual.
//!
//! Solves
//!
//! ```text
//! min 1/2 a'Qa - e'a   subject to   0 <= a_i <= C,  y'a = 0
//! ```
//!
//! with `Q_ij = y_i y_j K(x_i, x_j)`. Each iteration picks the maximal
//! violating pair with second-order working set selection and updates the
//! two multipliers analytically. Kernel rows are computed on demand and kept
//! in a bounded cache.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::debug;

use crate::ml::sparse::SparseVector;
use crate::ml::svm::kernel::Kernel;

const TAU: f64 = 1e-12;

/// Solver settings.
#[derive(Debug, Clone, Copy)]
pub struct SmoSettings {
    pub c: f64,
    /// Stopping tolerance on the maximal KKT violation.
    pub eps: f64,
    pub max_iter: usize,
    /// Kernel cache budget in bytes.
    pub cache_bytes: usize,
}

/// Result of one binary problem.
#[derive(Debug, Clone)]
pub struct SmoSolution {
    /// Dual multipliers, one per sample.
    pub alpha: Vec<f64>,
    pub rho: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Kernel rows for a fixed sample set, computed lazily.
struct KernelRows<'a> {
    xs: &'a [&'a SparseVector],
    squared: Vec<f64>,
    kernel: Kernel,
    rows: HashMap<usize, Arc<Vec<f64>>>,
    order: VecDeque<usize>,
    capacity: usize,
}

impl<'a> KernelRows<'a> {
    fn new(xs: &'a [&'a SparseVector], kernel: Kernel, cache_bytes: usize) -> Self {
        let row_bytes = (xs.len() * std::mem::size_of::<f64>()).max(1);
        KernelRows {
            xs,
            squared: xs.iter().map(|x| x.squared_norm()).collect(),
            kernel,
            rows: HashMap::new(),
            order: VecDeque::new(),
            capacity: (cache_bytes / row_bytes).max(2),
        }
    }

    fn diagonal(&self) -> Vec<f64> {
        (0..self.xs.len()).map(|i| self.eval(i, i)).collect()
    }

    fn eval(&self, i: usize, j: usize) -> f64 {
        self.kernel
            .eval(self.xs[i], self.squared[i], self.xs[j], self.squared[j])
    }

    fn row(&mut self, i: usize) -> Arc<Vec<f64>> {
        if let Some(row) = self.rows.get(&i) {
            return Arc::clone(row);
        }
        if self.rows.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.rows.remove(&evicted);
            }
        }
        let row: Arc<Vec<f64>> = Arc::new((0..self.xs.len()).map(|j| self.eval(i, j)).collect());
        self.rows.insert(i, Arc::clone(&row));
        self.order.push_back(i);
        row
    }
}

/// Solve the dual for samples `xs` with labels `y` in `{-1, 1}`.
pub fn solve(xs: &[&SparseVector], y: &[f64], kernel: Kernel, settings: SmoSettings) -> SmoSolution {
    let n = xs.len();
    let c = settings.c;
    let mut rows = KernelRows::new(xs, kernel, settings.cache_bytes);
    let diagonal = rows.diagonal();

    let mut alpha = vec![0.0; n];
    // gradient of the dual objective: Q a - e
    let mut gradient = vec![-1.0; n];

    let is_upper = |a: f64| a >= c;
    let is_lower = |a: f64| a <= 0.0;

    let mut iterations = 0;
    let mut converged = false;

    while iterations < settings.max_iter {
        // first index: maximal violation
        let mut g_max = f64::NEG_INFINITY;
        let mut i_sel = None;
        for t in 0..n {
            if y[t] > 0.0 {
                if !is_upper(alpha[t]) && -gradient[t] >= g_max {
                    g_max = -gradient[t];
                    i_sel = Some(t);
                }
            } else if !is_lower(alpha[t]) && gradient[t] >= g_max {
                g_max = gradient[t];
                i_sel = Some(t);
            }
        }

        let Some(i) = i_sel else {
            converged = true;
            break;
        };
        let k_i = rows.row(i);

        // second index: largest decrease of the objective
        let mut g_max2 = f64::NEG_INFINITY;
        let mut j_sel = None;
        let mut best_decrease = f64::INFINITY;
        for t in 0..n {
            let q_it = y[i] * y[t] * k_i[t];
            if y[t] > 0.0 {
                if !is_lower(alpha[t]) {
                    let grad_diff = g_max + gradient[t];
                    g_max2 = g_max2.max(gradient[t]);
                    if grad_diff > 0.0 {
                        let quad = diagonal[i] + diagonal[t] - 2.0 * y[i] * q_it;
                        let decrease = -(grad_diff * grad_diff) / quad.max(TAU);
                        if decrease <= best_decrease {
                            j_sel = Some(t);
                            best_decrease = decrease;
                        }
                    }
                }
            } else if !is_upper(alpha[t]) {
                let grad_diff = g_max - gradient[t];
                g_max2 = g_max2.max(-gradient[t]);
                if grad_diff > 0.0 {
                    let quad = diagonal[i] + diagonal[t] + 2.0 * y[i] * q_it;
                    let decrease = -(grad_diff * grad_diff) / quad.max(TAU);
                    if decrease <= best_decrease {
                        j_sel = Some(t);
                        best_decrease = decrease;
                    }
                }
            }
        }

        let j = match j_sel {
            Some(j) if g_max + g_max2 >= settings.eps => j,
            _ => {
                converged = true;
                break;
            }
        };
        iterations += 1;

        let k_j = rows.row(j);
        let q_ij = y[i] * y[j] * k_i[j];
        let (old_i, old_j) = (alpha[i], alpha[j]);

        if y[i] != y[j] {
            let mut quad = diagonal[i] + diagonal[j] + 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (-gradient[i] - gradient[j]) / quad;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;

            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }
            // both bounds equal C, so the upper clip depends only on the sign of diff
            if diff > 0.0 {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = c - diff;
                }
            } else if alpha[j] > c {
                alpha[j] = c;
                alpha[i] = c + diff;
            }
        } else {
            let mut quad = diagonal[i] + diagonal[j] - 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (gradient[i] - gradient[j]) / quad;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;

            if sum > c {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = sum - c;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }
            if sum > c {
                if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = sum - c;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let delta_i = alpha[i] - old_i;
        let delta_j = alpha[j] - old_j;
        for t in 0..n {
            gradient[t] += y[t] * (y[i] * k_i[t] * delta_i + y[j] * k_j[t] * delta_j);
        }
    }

    if !converged {
        debug!("SMO stopped after {iterations} iterations without converging");
    }

    let rho = compute_rho(&alpha, &gradient, y, c);
    SmoSolution {
        alpha,
        rho,
        iterations,
        converged,
    }
}

fn compute_rho(alpha: &[f64], gradient: &[f64], y: &[f64], c: f64) -> f64 {
    let mut upper = f64::INFINITY;
    let mut lower = f64::NEG_INFINITY;
    let mut free_sum = 0.0;
    let mut free_count = 0usize;

    for t in 0..alpha.len() {
        let yg = y[t] * gradient[t];
        if alpha[t] >= c {
            if y[t] < 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else if alpha[t] <= 0.0 {
            if y[t] > 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else {
            free_count += 1;
            free_sum += yg;
        }
    }

    if free_count > 0 {
        free_sum / free_count as f64
    } else {
        (upper + lower) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::svm::kernel::KernelType;

    fn settings(c: f64) -> SmoSettings {
        SmoSettings {
            c,
            eps: 1e-3,
            max_iter: 10_000,
            cache_bytes: 1 << 20,
        }
    }

    #[test]
    fn test_separable_linear_problem() {
        let points = [
            SparseVector::from_dense(&[2.0, 2.0]),
            SparseVector::from_dense(&[3.0, 3.0]),
            SparseVector::from_dense(&[-2.0, -2.0]),
            SparseVector::from_dense(&[-3.0, -1.0]),
        ];
        let xs: Vec<&SparseVector> = points.iter().collect();
        let y = [1.0, 1.0, -1.0, -1.0];
        let kernel = Kernel {
            kind: KernelType::Linear,
            gamma: 1.0,
            degree: 3,
            coef0: 0.0,
        };

        let solution = solve(&xs, &y, kernel, settings(10.0));
        assert!(solution.converged);

        // equality constraint y'a = 0
        let balance: f64 = solution.alpha.iter().zip(&y).map(|(a, y)| a * y).sum();
        assert!(balance.abs() < 1e-9);
        assert!(solution.alpha.iter().all(|a| (0.0..=10.0).contains(a)));

        for (x, label) in xs.iter().zip(&y) {
            let decision: f64 = xs
                .iter()
                .zip(&solution.alpha)
                .zip(&y)
                .map(|((sv, a), ys)| a * ys * kernel.eval_pair(sv, x))
                .sum::<f64>()
                - solution.rho;
            assert!(decision * label > 0.0);
        }
    }

    #[test]
    fn test_iteration_cap() {
        let points: Vec<SparseVector> = (0..20)
            .map(|i| SparseVector::from_dense(&[i as f64 * 0.1, (i % 3) as f64]))
            .collect();
        let xs: Vec<&SparseVector> = points.iter().collect();
        let y: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let kernel = Kernel {
            kind: KernelType::Rbf,
            gamma: 1.0,
            degree: 3,
            coef0: 0.0,
        };
        let mut capped = settings(1.0);
        capped.max_iter = 1;
        let solution = solve(&xs, &y, kernel, capped);
        assert_eq!(solution.iterations, 1);
        assert!(solution.rho.is_finite());
    }
}
