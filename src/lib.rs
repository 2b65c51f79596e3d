//! Library root for the `student_perf` crate
//! Feature derivation and inference serving for student performance categories

// Core error handling
pub mod errors;

// Serving path
pub mod features;
pub mod schema;
pub mod artifacts;
pub mod gateway;

// Outputs and persistence
pub mod report;
pub mod history;

// Boundary and hosting
pub mod input_validator;
pub mod web;
pub mod cli;

// Configuration & logging
pub mod config;
pub mod telemetry;

pub use artifacts::{Classifier, LogisticClassifier, ModelArtifacts, Scaler, StandardScaler};
pub use errors::{PredictError, PredictResult};
pub use features::{derive, CanonicalFeatureRecord, Gender, PerformanceLevel, RawInput};
pub use gateway::{InferenceGateway, Prediction};
pub use schema::FeatureSchema;
