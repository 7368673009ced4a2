//! Kernel functions over sparse vectors.

use serde::{Deserialize, Serialize};

use crate::ml::sparse::SparseVector;

/// Kernel type of a support vector classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelType {
    Linear,
    Poly,
    Rbf,
    Sigmoid,
}

/// A kernel with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    pub kind: KernelType,
    pub gamma: f64,
    pub degree: u32,
    pub coef0: f64,
}

impl Kernel {
    /// Evaluate the kernel. `sq_a` and `sq_b` are the squared norms of the
    /// inputs, used only by the RBF kernel.
    pub fn eval(&self, a: &SparseVector, sq_a: f64, b: &SparseVector, sq_b: f64) -> f64 {
        match self.kind {
            KernelType::Linear => a.dot(b),
            KernelType::Poly => (self.gamma * a.dot(b) + self.coef0).powi(self.degree as i32),
            KernelType::Rbf => {
                let distance = (sq_a + sq_b - 2.0 * a.dot(b)).max(0.0);
                (-self.gamma * distance).exp()
            }
            KernelType::Sigmoid => (self.gamma * a.dot(b) + self.coef0).tanh(),
        }
    }

    /// Evaluate the kernel, computing norms as needed.
    pub fn eval_pair(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        match self.kind {
            KernelType::Rbf => self.eval(a, a.squared_norm(), b, b.squared_norm()),
            _ => self.eval(a, 0.0, b, 0.0),
        }
    }
}
