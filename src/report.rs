//! Presentation-neutral summary of one prediction, shared by the CLI and
//! the HTTP surface.

use crate::features::{CanonicalFeatureRecord, PerformanceLevel};
use crate::gateway::Prediction;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceRow {
    pub level: PerformanceLevel,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionReport {
    pub label: PerformanceLevel,
    pub class_index: usize,
    pub probabilities: [f64; 3],
    pub confidence: Vec<ConfidenceRow>,
    pub average_score: f64,
    /// Band of the average on the 0/60/80/100 gauge.
    pub gauge_band: PerformanceLevel,
    pub gauge_reference: f64,
    pub delta_from_reference: f64,
}

impl PredictionReport {
    pub fn new(record: &CanonicalFeatureRecord, prediction: &Prediction, gauge_reference: f64) -> Self {
        let confidence = PerformanceLevel::ALL
            .iter()
            .zip(prediction.percentages())
            .map(|(level, percent)| ConfidenceRow {
                level: *level,
                percent,
            })
            .collect();

        Self {
            label: prediction.label,
            class_index: prediction.class_index,
            probabilities: prediction.probabilities,
            confidence,
            average_score: record.average_score,
            gauge_band: record.bucket(),
            gauge_reference,
            delta_from_reference: record.average_score - gauge_reference,
        }
    }
}

impl fmt::Display for PredictionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Predicted category: {}", self.label)?;
        writeln!(
            f,
            "Average score:      {:.2} ({} band, {:+.2} vs {:.0})",
            self.average_score, self.gauge_band, self.delta_from_reference, self.gauge_reference
        )?;
        writeln!(f, "Confidence:")?;
        for row in &self.confidence {
            writeln!(f, "  {:<8}{:>7.2}%", row.level.as_str(), row.percent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{derive, Gender};

    fn sample() -> PredictionReport {
        let record = derive(70, 90, 67, Gender::Female);
        let prediction = Prediction {
            label: PerformanceLevel::Medium,
            class_index: 1,
            probabilities: [0.1, 0.7, 0.2],
        };
        PredictionReport::new(&record, &prediction, 75.0)
    }

    #[test]
    fn report_carries_gauge_and_confidence() {
        let report = sample();
        assert_eq!(report.gauge_band, PerformanceLevel::Medium);
        assert!((report.delta_from_reference - (227.0 / 3.0 - 75.0)).abs() < 1e-12);
        assert_eq!(report.confidence.len(), 3);
        assert_eq!(report.confidence[1].level, PerformanceLevel::Medium);
        assert_eq!(report.confidence[1].percent, 70.0);
    }

    #[test]
    fn report_renders_as_text() {
        let text = sample().to_string();
        assert!(text.contains("Predicted category: Medium"));
        assert!(text.contains("75.67"));
        assert!(text.contains("Medium"));
    }

    #[test]
    fn report_serializes_labels_by_name() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["label"], "Medium");
        assert_eq!(json["confidence"][2]["level"], "High");
    }

    #[test]
    fn report_keys_are_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        for key in ["classIndex", "averageScore", "gaugeBand", "gaugeReference", "deltaFromReference"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json.get("class_index").is_none());
        assert!(json.get("gauge_band").is_none());
    }
}
