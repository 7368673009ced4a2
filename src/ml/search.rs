//! Randomized hyperparameter search with stratified cross-validation.
//!
//! `n_iter` configurations are drawn from a [`SearchSpace`]. Every
//! (configuration, fold) pair is an independent unit of work on a dedicated
//! rayon pool. A unit that fails to fit scores NaN, which removes its
//! configuration from the running. The configuration with the highest mean
//! fold accuracy is refit on all training documents.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EmogifError, Result};
use crate::ml::logistic::{LogisticParams, Penalty, Solver};
use crate::ml::model_selection::StratifiedKFold;
use crate::ml::pipeline::{EmotionPipeline, PipelineParams};
use crate::ml::stacking::DEFAULT_STACKING_CV;
use crate::ml::svm::SvcParams;
use crate::ml::svm::kernel::KernelType;

/// Continuous uniform distribution over `[loc, loc + scale]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Uniform {
    pub loc: f64,
    pub scale: f64,
}

impl Uniform {
    pub fn new(loc: f64, scale: f64) -> Self {
        Uniform { loc, scale }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.loc + self.scale * rng.random::<f64>()
    }
}

/// Distributions the search draws configurations from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSpace {
    pub log_penalty: Vec<Penalty>,
    pub log_c: Uniform,
    pub log_solver: Vec<Solver>,
    pub log_max_iter: Vec<usize>,
    pub svm_c: Uniform,
    pub svm_gamma: Uniform,
    pub svm_kernel: Vec<KernelType>,
    pub svm_max_iter: Vec<usize>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        SearchSpace {
            log_penalty: vec![Penalty::L1, Penalty::L2],
            log_c: Uniform::new(0.0, 4.0),
            log_solver: vec![Solver::Ovr, Solver::Lbfgs],
            log_max_iter: vec![5000, 10_000],
            svm_c: Uniform::new(0.1, 99.8),
            svm_gamma: Uniform::new(0.0001, 9.9998),
            svm_kernel: vec![KernelType::Rbf, KernelType::Poly, KernelType::Sigmoid],
            svm_max_iter: vec![5000, 10_000],
        }
    }
}

fn pick<T: Copy, R: Rng + ?Sized>(choices: &[T], name: &str, rng: &mut R) -> Result<T> {
    choices
        .choose(rng)
        .copied()
        .ok_or_else(|| EmogifError::config(format!("search space `{name}` has no choices")))
}

impl SearchSpace {
    pub fn validate(&self) -> Result<()> {
        let lists = [
            ("log_penalty", self.log_penalty.is_empty()),
            ("log_solver", self.log_solver.is_empty()),
            ("log_max_iter", self.log_max_iter.is_empty()),
            ("svm_kernel", self.svm_kernel.is_empty()),
            ("svm_max_iter", self.svm_max_iter.is_empty()),
        ];
        if let Some((name, _)) = lists.iter().find(|(_, empty)| *empty) {
            return Err(EmogifError::config(format!("search space `{name}` has no choices")));
        }
        for (name, dist) in [
            ("log_c", self.log_c),
            ("svm_c", self.svm_c),
            ("svm_gamma", self.svm_gamma),
        ] {
            if !(dist.loc.is_finite() && dist.scale.is_finite() && dist.scale >= 0.0) {
                return Err(EmogifError::config(format!(
                    "search space `{name}` is not a valid uniform distribution"
                )));
            }
        }
        Ok(())
    }

    /// Draw one configuration.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, stacking_cv: usize) -> Result<PipelineParams> {
        let logistic = LogisticParams {
            penalty: pick(&self.log_penalty, "log_penalty", rng)?,
            c: self.log_c.sample(rng),
            solver: pick(&self.log_solver, "log_solver", rng)?,
            max_iter: pick(&self.log_max_iter, "log_max_iter", rng)?,
            ..Default::default()
        };
        let svm = SvcParams {
            c: self.svm_c.sample(rng),
            gamma: self.svm_gamma.sample(rng),
            kernel: pick(&self.svm_kernel, "svm_kernel", rng)?,
            max_iter: pick(&self.svm_max_iter, "svm_max_iter", rng)?,
            ..Default::default()
        };
        Ok(PipelineParams {
            logistic,
            svm,
            stacking_cv,
        })
    }
}

/// Search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of sampled configurations.
    pub n_iter: usize,
    /// Cross-validation folds per configuration.
    pub cv: usize,
    /// Folds for the stacking meta features.
    pub stacking_cv: usize,
    /// Worker threads; all cores when unset.
    pub n_jobs: Option<usize>,
    /// Seed for configuration sampling; OS entropy when unset.
    pub seed: Option<u64>,
    pub space: SearchSpace,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            n_iter: 10,
            cv: 7,
            stacking_cv: DEFAULT_STACKING_CV,
            n_jobs: None,
            seed: None,
            space: SearchSpace::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_iter == 0 {
            return Err(EmogifError::config("search.n_iter must be at least 1"));
        }
        if self.cv < 2 {
            return Err(EmogifError::config(format!(
                "search.cv must be at least 2, got {}",
                self.cv
            )));
        }
        if self.stacking_cv < 2 {
            return Err(EmogifError::config(format!(
                "search.stacking_cv must be at least 2, got {}",
                self.stacking_cv
            )));
        }
        if self.n_jobs == Some(0) {
            return Err(EmogifError::config("search.n_jobs must be at least 1"));
        }
        self.space.validate()
    }
}

/// Cross-validation result of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: PipelineParams,
    /// Accuracy per fold; NaN for folds that failed.
    pub fold_scores: Vec<f64>,
    /// Mean fold accuracy; NaN when any fold failed.
    pub mean_score: f64,
}

/// The outcome of a search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best configuration refit on all training documents.
    pub best: EmotionPipeline,
    pub best_index: usize,
    pub best_score: f64,
    pub candidates: Vec<CandidateResult>,
}

/// Randomized search driver.
#[derive(Debug, Clone)]
pub struct RandomizedSearch {
    config: SearchConfig,
}

impl RandomizedSearch {
    pub fn new(config: SearchConfig) -> Self {
        RandomizedSearch { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Draw the configurations to evaluate.
    pub fn sample_candidates(&self) -> Result<Vec<PipelineParams>> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        (0..self.config.n_iter)
            .map(|_| self.config.space.sample(&mut rng, self.config.stacking_cv))
            .collect()
    }

    /// Evaluate every candidate and refit the best one.
    pub fn fit(
        &self,
        documents: &[Vec<String>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<SearchOutcome> {
        self.config.validate()?;
        if documents.len() != labels.len() {
            return Err(EmogifError::model(format!(
                "{} documents but {} labels",
                documents.len(),
                labels.len()
            )));
        }

        let candidates = self.sample_candidates()?;
        let folds = StratifiedKFold::new(self.config.cv)?.split(labels)?;

        let threads = self.config.n_jobs.unwrap_or_else(num_cpus::get);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("emogif-search-{i}"))
            .build()
            .map_err(|e| EmogifError::other(format!("Failed to create thread pool: {e}")))?;

        info!(
            "Fitting {} folds for each of {} candidates, totalling {} fits on {threads} threads",
            folds.len(),
            candidates.len(),
            folds.len() * candidates.len()
        );

        let units: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let scores: Vec<f64> = pool.install(|| {
            units
                .par_iter()
                .map(|&(c, f)| {
                    let fold = &folds[f];
                    let train_docs: Vec<Vec<String>> =
                        fold.train.iter().map(|&i| documents[i].clone()).collect();
                    let train_y: Vec<usize> = fold.train.iter().map(|&i| labels[i]).collect();
                    let test_docs: Vec<Vec<String>> =
                        fold.test.iter().map(|&i| documents[i].clone()).collect();
                    let test_y: Vec<usize> = fold.test.iter().map(|&i| labels[i]).collect();

                    let mut pipeline = EmotionPipeline::new(candidates[c].clone());
                    let result = pipeline
                        .fit(&train_docs, &train_y, n_classes)
                        .and_then(|_| pipeline.score(&test_docs, &test_y));
                    match result {
                        Ok(score) => {
                            debug!("[CV {}/{}] candidate {c}: score={score:.3}", f + 1, folds.len());
                            score
                        }
                        Err(e) => {
                            warn!("Candidate {c} failed on fold {}: {e}", f + 1);
                            f64::NAN
                        }
                    }
                })
                .collect()
        });

        let n_folds = folds.len();
        let results: Vec<CandidateResult> = candidates
            .into_iter()
            .enumerate()
            .map(|(c, params)| {
                let fold_scores = scores[c * n_folds..(c + 1) * n_folds].to_vec();
                let mean_score = fold_scores.iter().sum::<f64>() / n_folds as f64;
                CandidateResult {
                    params,
                    fold_scores,
                    mean_score,
                }
            })
            .collect();

        let best_index = best_candidate(&results).ok_or_else(|| {
            EmogifError::model("every candidate configuration failed to fit")
        })?;
        let best_score = results[best_index].mean_score;
        info!(
            "Best candidate {best_index} with mean cross-validated accuracy {best_score:.4}: {:?}",
            results[best_index].params
        );

        let mut best = EmotionPipeline::new(results[best_index].params.clone());
        pool.install(|| best.fit(documents, labels, n_classes))?;

        Ok(SearchOutcome {
            best,
            best_index,
            best_score,
            candidates: results,
        })
    }
}

/// Index of the highest mean score, ignoring NaN; the first one on ties.
fn best_candidate(results: &[CandidateResult]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, result) in results.iter().enumerate() {
        if result.mean_score.is_nan() {
            continue;
        }
        match best {
            Some(b) if results[b].mean_score >= result.mean_score => {}
            _ => best = Some(i),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(mean_score: f64) -> CandidateResult {
        CandidateResult {
            params: SearchSpace::default()
                .sample(&mut StdRng::seed_from_u64(0), 5)
                .unwrap(),
            fold_scores: vec![mean_score],
            mean_score,
        }
    }

    #[test]
    fn test_samples_stay_in_space() {
        let space = SearchSpace::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let params = space.sample(&mut rng, 5).unwrap();
            assert!((0.0..=4.0).contains(&params.logistic.c));
            assert!((0.1..=99.9).contains(&params.svm.c));
            assert!((0.0001..=9.9999).contains(&params.svm.gamma));
            assert!([5000, 10_000].contains(&params.logistic.max_iter));
            assert!([5000, 10_000].contains(&params.svm.max_iter));
            assert_ne!(params.svm.kernel, KernelType::Linear);
            assert_eq!(params.stacking_cv, 5);
        }
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let config = SearchConfig {
            seed: Some(3),
            ..Default::default()
        };
        let a = RandomizedSearch::new(config.clone()).sample_candidates().unwrap();
        let b = RandomizedSearch::new(config).sample_candidates().unwrap();
        assert_eq!(a.len(), 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_best_candidate_skips_failures() {
        let results = vec![result(f64::NAN), result(0.5), result(0.7), result(0.7)];
        assert_eq!(best_candidate(&results), Some(2));
        assert_eq!(best_candidate(&[result(f64::NAN)]), None);
    }

    #[test]
    fn test_config_validation() {
        assert!(SearchConfig::default().validate().is_ok());
        let bad = SearchConfig {
            cv: 1,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let mut empty = SearchConfig::default();
        empty.space.svm_kernel.clear();
        assert!(empty.validate().is_err());
    }
}
