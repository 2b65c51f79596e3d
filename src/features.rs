//! Feature derivation: raw exam scores and gender into the canonical record
//! the classifier's feature schema is drawn from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lower bound (inclusive) of the Medium bucket.
pub const MEDIUM_THRESHOLD: f64 = 60.0;
/// Lower bound (inclusive) of the High bucket.
pub const HIGH_THRESHOLD: f64 = 80.0;

/// Column names as the training pipeline wrote them.
pub const COL_MATH: &str = "math score";
pub const COL_READING: &str = "reading score";
pub const COL_WRITING: &str = "writing score";
pub const COL_AVERAGE: &str = "performance";
pub const COL_GENDER: &str = "gender_encoded";
pub const COL_BUCKET: &str = "performance_encoded";
pub const COL_FEMALE: &str = "gender_female";
pub const COL_MALE: &str = "gender_male";

/// Every column a canonical record can answer to, in record order.
pub const CANONICAL_COLUMNS: [&str; 8] = [
    COL_MATH,
    COL_READING,
    COL_WRITING,
    COL_AVERAGE,
    COL_GENDER,
    COL_BUCKET,
    COL_FEMALE,
    COL_MALE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }

    /// Binary encoding fixed by the trained artifacts: female 0, male 1.
    pub fn encoded(&self) -> u8 {
        match self {
            Gender::Female => 0,
            Gender::Male => 1,
        }
    }
}

/// Accepts "female"/"male" case-insensitively, ignoring surrounding whitespace.
impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("female") {
            Ok(Gender::Female)
        } else if trimmed.eq_ignore_ascii_case("male") {
            Ok(Gender::Male)
        } else {
            Err(format!("unknown gender '{s}', expected 'female' or 'male'"))
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-level category shared by the score bucket and the model's labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerformanceLevel {
    Low,
    Medium,
    High,
}

impl PerformanceLevel {
    /// Label order the classifier's class indices and probabilities follow.
    pub const ALL: [PerformanceLevel; 3] = [
        PerformanceLevel::Low,
        PerformanceLevel::Medium,
        PerformanceLevel::High,
    ];

    /// Bucket an average score. Evaluated on the raw float, lower bounds closed.
    pub fn from_average(average: f64) -> Self {
        if average < MEDIUM_THRESHOLD {
            PerformanceLevel::Low
        } else if average < HIGH_THRESHOLD {
            PerformanceLevel::Medium
        } else {
            PerformanceLevel::High
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> u8 {
        match self {
            PerformanceLevel::Low => 0,
            PerformanceLevel::Medium => 1,
            PerformanceLevel::High => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceLevel::Low => "Low",
            PerformanceLevel::Medium => "Medium",
            PerformanceLevel::High => "High",
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw attributes for one student, as collected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    pub math_score: i32,
    pub reading_score: i32,
    pub writing_score: i32,
    pub gender: Gender,
}

impl RawInput {
    pub fn new(math_score: i32, reading_score: i32, writing_score: i32, gender: Gender) -> Self {
        Self {
            math_score,
            reading_score,
            writing_score,
            gender,
        }
    }

    pub fn derive(&self) -> CanonicalFeatureRecord {
        derive(
            self.math_score,
            self.reading_score,
            self.writing_score,
            self.gender,
        )
    }
}

/// Fixed-shape derived representation of one student's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanonicalFeatureRecord {
    pub math_score: i32,
    pub reading_score: i32,
    pub writing_score: i32,
    pub average_score: f64,
    pub performance_bucket: u8,
    pub gender_binary: u8,
    pub gender_is_female: u8,
    pub gender_is_male: u8,
}

impl CanonicalFeatureRecord {
    /// Value for a training column name, `None` when the record has no such field.
    pub fn value(&self, column: &str) -> Option<f64> {
        let value = match column {
            COL_MATH => f64::from(self.math_score),
            COL_READING => f64::from(self.reading_score),
            COL_WRITING => f64::from(self.writing_score),
            COL_AVERAGE => self.average_score,
            COL_GENDER => f64::from(self.gender_binary),
            COL_BUCKET => f64::from(self.performance_bucket),
            COL_FEMALE => f64::from(self.gender_is_female),
            COL_MALE => f64::from(self.gender_is_male),
            _ => return None,
        };
        Some(value)
    }

    /// All (column, value) pairs in record order.
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        CANONICAL_COLUMNS
            .iter()
            .filter_map(move |&name| self.value(name).map(|v| (name, v)))
    }

    pub fn bucket(&self) -> PerformanceLevel {
        PerformanceLevel::from_average(self.average_score)
    }
}

/// Derive the canonical record. Scores outside 0..=100 pass through unchanged.
pub fn derive(math: i32, reading: i32, writing: i32, gender: Gender) -> CanonicalFeatureRecord {
    let average_score = (f64::from(math) + f64::from(reading) + f64::from(writing)) / 3.0;
    let performance_bucket = PerformanceLevel::from_average(average_score).index();

    let (gender_is_female, gender_is_male) = match gender {
        Gender::Female => (1, 0),
        Gender::Male => (0, 1),
    };

    CanonicalFeatureRecord {
        math_score: math,
        reading_score: reading,
        writing_score: writing,
        average_score,
        performance_bucket,
        gender_binary: gender.encoded(),
        gender_is_female,
        gender_is_male,
    }
}
