//! Inference gateway: schema projection, scaling and classification of one
//! canonical feature record.
//!
//! The gateway never guesses. A scaler fitted on a different width, a
//! classifier that rejects the row, or an answer outside the three-class
//! contract all surface as errors to the caller.

use crate::artifacts::ModelArtifacts;
use crate::errors::{PredictError, PredictResult};
use crate::features::{CanonicalFeatureRecord, PerformanceLevel};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Allowed drift of the probability sum from 1.0.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Outcome of a single inference call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub label: PerformanceLevel,
    pub class_index: usize,
    /// Ordered Low, Medium, High.
    pub probabilities: [f64; 3],
}

impl Prediction {
    /// Probabilities as percentages rounded to two decimals.
    pub fn percentages(&self) -> [f64; 3] {
        self.probabilities.map(|p| (p * 100.0 * 100.0).round() / 100.0)
    }
}

/// Serves predictions from a read-only artifact triple.
#[derive(Debug, Clone)]
pub struct InferenceGateway {
    artifacts: Arc<ModelArtifacts>,
}

impl InferenceGateway {
    pub fn new(artifacts: ModelArtifacts) -> Self {
        Self {
            artifacts: Arc::new(artifacts),
        }
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    /// Check the artifacts against each other without a request in hand.
    pub fn check_compatibility(&self) -> PredictResult<()> {
        let width = self.artifacts.schema.width();
        let scaler_width = self.artifacts.scaler.n_features_in();
        if scaler_width != width {
            return Err(PredictError::feature_mismatch(scaler_width, width));
        }
        let classifier_width = self.artifacts.classifier.n_features_in();
        if classifier_width != width {
            return Err(PredictError::model_inference(format!(
                "classifier expects {classifier_width} features, schema provides {width}"
            )));
        }
        let classes = self.artifacts.classifier.n_classes();
        if classes != PerformanceLevel::ALL.len() {
            return Err(PredictError::model_inference(format!(
                "classifier has {classes} classes, expected {}",
                PerformanceLevel::ALL.len()
            )));
        }
        Ok(())
    }

    pub fn predict(&self, record: &CanonicalFeatureRecord) -> PredictResult<Prediction> {
        let ModelArtifacts {
            schema,
            scaler,
            classifier,
        } = self.artifacts.as_ref();

        let row = schema.project(record);
        let unmatched = schema.unmatched_columns(record);
        if !unmatched.is_empty() {
            debug!("Zero-filled schema columns: {:?}", unmatched);
        }

        if scaler.n_features_in() != row.len() {
            return Err(PredictError::feature_mismatch(scaler.n_features_in(), row.len()));
        }
        let scaled = scaler.transform(&row)?;

        if classifier.n_features_in() != scaled.len() {
            return Err(PredictError::model_inference(format!(
                "classifier expects {} features, got {}",
                classifier.n_features_in(),
                scaled.len()
            )));
        }

        let class_index = classifier.predict(&scaled)?;
        let label = PerformanceLevel::from_index(class_index).ok_or_else(|| {
            PredictError::model_inference(format!("class index {class_index} is outside 0..=2"))
        })?;

        let probabilities = checked_distribution(classifier.predict_proba(&scaled)?)?;

        let argmax = argmax(&probabilities);
        if argmax != class_index {
            warn!(
                "Classifier predicted class {} but probability mass peaks at {}",
                class_index, argmax
            );
        }

        debug!(
            "Predicted {} (class {}) for average {:.3}",
            label, class_index, record.average_score
        );

        Ok(Prediction {
            label,
            class_index,
            probabilities,
        })
    }
}

fn checked_distribution(proba: Vec<f64>) -> PredictResult<[f64; 3]> {
    let probabilities: [f64; 3] = proba.try_into().map_err(|p: Vec<f64>| {
        PredictError::model_inference(format!("expected 3 probabilities, got {}", p.len()))
    })?;

    if probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(PredictError::model_inference(format!(
            "probabilities {probabilities:?} are not a distribution"
        )));
    }
    let sum: f64 = probabilities.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(PredictError::model_inference(format!(
            "probabilities sum to {sum}, not 1"
        )));
    }
    Ok(probabilities)
}

fn argmax(values: &[f64; 3]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
