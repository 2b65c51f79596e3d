// Feature schema: the ordered column layout a classifier was trained on.

use crate::errors::{PredictError, PredictResult};
use crate::features::CanonicalFeatureRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a schema stored as a JSON array of column names.
    pub fn from_file<P: AsRef<Path>>(path: P) -> PredictResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| PredictError::io(format!("reading {}", path.display()), e))?;
        serde_json::from_str(&content)
            .map_err(|e| PredictError::serialization(format!("parsing {}", path.display()), e))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Re-project a record onto this schema as one row.
    ///
    /// Total: columns the record lacks are zero-filled, record fields the
    /// schema lacks are dropped, and any non-finite cell becomes 0.
    pub fn project(&self, record: &CanonicalFeatureRecord) -> Vec<f64> {
        self.columns
            .iter()
            .map(|name| record.value(name).unwrap_or(0.0))
            .map(|v| if v.is_finite() { v } else { 0.0 })
            .collect()
    }

    /// Schema columns the canonical record cannot fill.
    pub fn unmatched_columns<'a>(&'a self, record: &'a CanonicalFeatureRecord) -> Vec<&'a str> {
        self.columns
            .iter()
            .filter(|name| record.value(name).is_none())
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{derive, Gender};

    #[test]
    fn projection_follows_schema_order() {
        let schema = FeatureSchema::new(["gender_male", "math score", "performance"]);
        let record = derive(70, 90, 67, Gender::Male);
        let row = schema.project(&record);
        assert_eq!(row, vec![1.0, 70.0, record.average_score]);
    }

    #[test]
    fn missing_columns_are_zero_filled() {
        let schema = FeatureSchema::new(["math score", "parental education", "lunch"]);
        let record = derive(55, 60, 65, Gender::Female);
        assert_eq!(schema.project(&record), vec![55.0, 0.0, 0.0]);
        assert_eq!(schema.unmatched_columns(&record), vec!["parental education", "lunch"]);
    }

    #[test]
    fn disjoint_schema_yields_all_zero_row() {
        let schema = FeatureSchema::new(["a", "b", "c", "d"]);
        let record = derive(100, 100, 100, Gender::Male);
        assert_eq!(schema.project(&record), vec![0.0; 4]);
    }

    #[test]
    fn empty_schema_yields_empty_row() {
        let schema = FeatureSchema::new(Vec::<String>::new());
        assert!(schema.project(&derive(1, 2, 3, Gender::Female)).is_empty());
    }

    #[test]
    fn schema_parses_from_json_array() {
        let schema: FeatureSchema = serde_json::from_str(r#"["math score","gender_encoded"]"#).unwrap();
        assert_eq!(schema.width(), 2);
        assert_eq!(schema.columns()[1], "gender_encoded");
    }
}
