//! Fitted model artifacts: the scaler and classifier call contracts, their
//! JSON-backed implementations, and the loader that brings the schema,
//! scaler and classifier up together at process start.

use crate::config::ArtifactConfig;
use crate::errors::{PredictError, PredictResult};
use crate::schema::FeatureSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// A fitted feature scaler.
pub trait Scaler: Send + Sync {
    /// Width of the rows this scaler was fitted on.
    fn n_features_in(&self) -> usize;

    fn transform(&self, row: &[f64]) -> PredictResult<Vec<f64>>;
}

/// A fitted classifier over scaled rows.
pub trait Classifier: Send + Sync {
    fn n_features_in(&self) -> usize;

    fn n_classes(&self) -> usize;

    /// Class index for one row.
    fn predict(&self, row: &[f64]) -> PredictResult<usize>;

    /// Class distribution for one row, in class-index order.
    fn predict_proba(&self, row: &[f64]) -> PredictResult<Vec<f64>>;
}

/// Standardisation scaler: `(x - mean) / scale` per column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> PredictResult<Self> {
        if mean.len() != scale.len() {
            return Err(PredictError::artifact(
                "scaler",
                format!("mean has {} entries but scale has {}", mean.len(), scale.len()),
            ));
        }
        Ok(Self { mean, scale })
    }

    /// Identity scaler of the given width.
    pub fn identity(width: usize) -> Self {
        Self {
            mean: vec![0.0; width],
            scale: vec![1.0; width],
        }
    }
}

impl Scaler for StandardScaler {
    fn n_features_in(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, row: &[f64]) -> PredictResult<Vec<f64>> {
        if row.len() != self.n_features_in() {
            return Err(PredictError::feature_mismatch(self.n_features_in(), row.len()));
        }

        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (mean, scale))| {
                // Constant columns are fitted with scale 0; leave them centred only.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

/// Multinomial logistic regression: softmax over `coef · x + intercept`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticClassifier {
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

impl LogisticClassifier {
    pub fn new(coef: Vec<Vec<f64>>, intercept: Vec<f64>) -> PredictResult<Self> {
        if coef.is_empty() {
            return Err(PredictError::artifact("classifier", "no classes in coef"));
        }
        if coef.len() != intercept.len() {
            return Err(PredictError::artifact(
                "classifier",
                format!(
                    "coef has {} rows but intercept has {} entries",
                    coef.len(),
                    intercept.len()
                ),
            ));
        }
        let width = coef[0].len();
        if let Some(bad) = coef.iter().position(|row| row.len() != width) {
            return Err(PredictError::artifact(
                "classifier",
                format!("coef row {bad} does not have {width} entries"),
            ));
        }
        Ok(Self { coef, intercept })
    }

    fn decision_function(&self, row: &[f64]) -> PredictResult<Vec<f64>> {
        if row.len() != self.n_features_in() {
            return Err(PredictError::model_inference(format!(
                "classifier expects {} features, got {}",
                self.n_features_in(),
                row.len()
            )));
        }

        Ok(self
            .coef
            .iter()
            .zip(self.intercept.iter())
            .map(|(weights, bias)| bias + weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>())
            .collect())
    }
}

impl Classifier for LogisticClassifier {
    fn n_features_in(&self) -> usize {
        self.coef.first().map_or(0, Vec::len)
    }

    fn n_classes(&self) -> usize {
        self.coef.len()
    }

    fn predict(&self, row: &[f64]) -> PredictResult<usize> {
        let scores = self.decision_function(row)?;
        // First maximum wins on ties.
        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if score.is_nan() {
                return Err(PredictError::model_inference("decision function produced NaN"));
            }
            if *score > scores[best] {
                best = i;
            }
        }
        Ok(best)
    }

    fn predict_proba(&self, row: &[f64]) -> PredictResult<Vec<f64>> {
        let scores = self.decision_function(row)?;
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        Ok(exps.into_iter().map(|e| e / total).collect())
    }
}

/// The schema, scaler and classifier a process serves with.
#[derive(Clone)]
pub struct ModelArtifacts {
    pub schema: FeatureSchema,
    pub scaler: Arc<dyn Scaler>,
    pub classifier: Arc<dyn Classifier>,
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("schema", &self.schema)
            .field("scaler_width", &self.scaler.n_features_in())
            .field("classifier_width", &self.classifier.n_features_in())
            .field("classes", &self.classifier.n_classes())
            .finish()
    }
}

impl ModelArtifacts {
    pub fn new(
        schema: FeatureSchema,
        scaler: impl Scaler + 'static,
        classifier: impl Classifier + 'static,
    ) -> Self {
        Self {
            schema,
            scaler: Arc::new(scaler),
            classifier: Arc::new(classifier),
        }
    }

    /// Load all three artifacts. Every file is attempted and each failure
    /// logged; the first failure is returned.
    pub fn load(cfg: &ArtifactConfig) -> PredictResult<Self> {
        let dir = Path::new(&cfg.dir);

        let schema = load_logged(&dir.join(&cfg.features_file), &cfg.features_file, |p| {
            FeatureSchema::from_file(p)
        });
        let scaler = load_logged(&dir.join(&cfg.scaler_file), &cfg.scaler_file, |p| {
            read_json::<StandardScaler>(p).and_then(|s| StandardScaler::new(s.mean, s.scale))
        });
        let classifier = load_logged(&dir.join(&cfg.model_file), &cfg.model_file, |p| {
            read_json::<LogisticClassifier>(p)
                .and_then(|c| LogisticClassifier::new(c.coef, c.intercept))
        });

        let schema = schema?;
        let scaler = scaler?;
        let classifier = classifier?;

        info!(
            "Model artifacts ready: {} schema columns, {} classes",
            schema.width(),
            classifier.n_classes()
        );
        Ok(Self::new(schema, scaler, classifier))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> PredictResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| PredictError::io(format!("reading {}", path.display()), e))?;
    serde_json::from_str(&content)
        .map_err(|e| PredictError::serialization(format!("parsing {}", path.display()), e))
}

fn load_logged<T>(
    path: &Path,
    name: &str,
    load: impl FnOnce(&Path) -> PredictResult<T>,
) -> PredictResult<T> {
    match load(path) {
        Ok(value) => {
            info!("Loaded artifact {}", path.display());
            Ok(value)
        }
        Err(e) => {
            let reason = e.chain_message();
            error!("Could not load {}: {}", path.display(), reason);
            Err(PredictError::artifact(name, reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_scaler_centres_and_scales() {
        let scaler = StandardScaler::new(vec![50.0, 1.0], vec![10.0, 0.0]).unwrap();
        let out = scaler.transform(&[70.0, 3.0]).unwrap();
        assert_eq!(out, vec![2.0, 2.0]);
    }

    #[test]
    fn scaler_rejects_wrong_width() {
        let scaler = StandardScaler::identity(3);
        let err = scaler.transform(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, PredictError::FeatureMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn scaler_rejects_ragged_parameters() {
        assert!(StandardScaler::new(vec![0.0; 3], vec![1.0; 2]).is_err());
    }

    #[test]
    fn logistic_probabilities_sum_to_one() {
        let clf = LogisticClassifier::new(
            vec![vec![-1.0, 0.0], vec![0.0, 0.0], vec![1.0, 0.0]],
            vec![0.0, 0.5, 0.0],
        )
        .unwrap();
        let proba = clf.predict_proba(&[2.0, 5.0]).unwrap();
        assert_eq!(proba.len(), 3);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(clf.predict(&[2.0, 5.0]).unwrap(), 2);
        assert_eq!(clf.predict(&[-2.0, 5.0]).unwrap(), 0);
    }

    #[test]
    fn logistic_ties_pick_lowest_index() {
        let clf = LogisticClassifier::new(vec![vec![0.0]; 3], vec![0.0; 3]).unwrap();
        assert_eq!(clf.predict(&[1.0]).unwrap(), 0);
    }

    #[test]
    fn logistic_rejects_wrong_width() {
        let clf = LogisticClassifier::new(vec![vec![1.0, 1.0]; 3], vec![0.0; 3]).unwrap();
        let err = clf.predict(&[1.0]).unwrap_err();
        assert!(matches!(err, PredictError::ModelInference { .. }));
    }

    #[test]
    fn logistic_rejects_ragged_coef() {
        let err = LogisticClassifier::new(vec![vec![1.0, 1.0], vec![1.0]], vec![0.0; 2]).unwrap_err();
        assert!(matches!(err, PredictError::Artifact { .. }));
    }
}
