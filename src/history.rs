//! Append-only prediction history backed by sled.
//!
//! Each served prediction is written once under a monotonically increasing
//! key and never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{PredictError, PredictResult};
use crate::features::{Gender, PerformanceLevel, RawInput};
use crate::gateway::Prediction;

const HISTORY_TREE: &str = "predictions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub math_score: i32,
    pub reading_score: i32,
    pub writing_score: i32,
    pub gender: Gender,
    pub average_score: f64,
    pub label: PerformanceLevel,
    pub probabilities: [f64; 3],
}

impl HistoryEntry {
    pub fn new(input: &RawInput, average_score: f64, prediction: &Prediction) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            math_score: input.math_score,
            reading_score: input.reading_score,
            writing_score: input.writing_score,
            gender: input.gender,
            average_score,
            label: prediction.label,
            probabilities: prediction.probabilities,
        }
    }
}

pub struct PredictionHistory {
    db: Db,
}

impl PredictionHistory {
    pub fn open<P: AsRef<Path>>(path: P) -> PredictResult<Self> {
        let db = sled::open(path.as_ref())
            .map_err(|e| PredictError::database(format!("open {}", path.as_ref().display()), e))?;
        Ok(Self { db })
    }

    fn tree(&self) -> PredictResult<sled::Tree> {
        self.db
            .open_tree(HISTORY_TREE)
            .map_err(|e| PredictError::database("open predictions tree", e))
    }

    /// Append one entry and flush it to disk.
    pub fn append(&self, entry: &HistoryEntry) -> PredictResult<()> {
        let key = self.db.generate_id()?.to_be_bytes();
        let value = serde_json::to_vec(entry)
            .map_err(|e| PredictError::serialization("encode history entry", e))?;

        let tree = self.tree()?;
        tree.insert(key, value)?;
        tree.flush()?;

        debug!("Recorded prediction {} ({})", entry.id, entry.label);
        Ok(())
    }

    /// Newest entries first, at most `limit` of them.
    pub fn recent(&self, limit: usize) -> PredictResult<Vec<HistoryEntry>> {
        self.tree()?
            .iter()
            .rev()
            .take(limit)
            .map(|item| {
                let (_, bytes) = item?;
                serde_json::from_slice(&bytes)
                    .map_err(|e| PredictError::serialization("decode history entry", e))
            })
            .collect()
    }

    pub fn len(&self) -> PredictResult<usize> {
        Ok(self.tree()?.len())
    }

    pub fn is_empty(&self) -> PredictResult<bool> {
        Ok(self.tree()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive;

    fn entry(math: i32, label: PerformanceLevel) -> HistoryEntry {
        let input = RawInput::new(math, 80, 80, Gender::Female);
        let record = derive(math, 80, 80, Gender::Female);
        let prediction = Prediction {
            label,
            class_index: label.index() as usize,
            probabilities: [0.2, 0.3, 0.5],
        };
        HistoryEntry::new(&input, record.average_score, &prediction)
    }

    #[test]
    fn recent_returns_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let history = PredictionHistory::open(dir.path()).unwrap();
        assert!(history.is_empty().unwrap());

        history.append(&entry(10, PerformanceLevel::Low)).unwrap();
        history.append(&entry(50, PerformanceLevel::Medium)).unwrap();
        history.append(&entry(90, PerformanceLevel::High)).unwrap();

        assert_eq!(history.len().unwrap(), 3);
        let recent = history.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].math_score, 90);
        assert_eq!(recent[1].math_score, 50);
    }

    #[test]
    fn entries_serialize_camel_case() {
        let json = serde_json::to_value(entry(70, PerformanceLevel::Medium)).unwrap();
        assert!(json.get("recordedAt").is_some());
        assert_eq!(json["gender"], "female");
        assert_eq!(json["label"], "Medium");
    }
}
