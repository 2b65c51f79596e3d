use crate::errors::{PredictError, PredictResult};
use crate::features::{Gender, RawInput};

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// Boundary checks applied by the hosting surfaces before derivation.
#[derive(Debug, Clone)]
pub struct InputValidator {
    min_score: i32,
    max_score: i32,
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl InputValidator {
    pub fn new() -> Self {
        Self {
            min_score: MIN_SCORE,
            max_score: MAX_SCORE,
        }
    }

    pub fn validate_score(&self, field: &str, score: i32) -> PredictResult<()> {
        if !(self.min_score..=self.max_score).contains(&score) {
            return Err(PredictError::validation(
                field,
                format!(
                    "score {score} is outside {}..={}",
                    self.min_score, self.max_score
                ),
            ));
        }
        Ok(())
    }

    pub fn validate_scores(&self, math: i32, reading: i32, writing: i32) -> PredictResult<()> {
        self.validate_score("math", math)?;
        self.validate_score("reading", reading)?;
        self.validate_score("writing", writing)
    }

    pub fn parse_gender(&self, gender: &str) -> PredictResult<Gender> {
        gender
            .parse::<Gender>()
            .map_err(|e| PredictError::validation("gender", e))
    }

    /// Validate every field and assemble the raw input.
    pub fn raw_input(
        &self,
        math: i32,
        reading: i32,
        writing: i32,
        gender: &str,
    ) -> PredictResult<RawInput> {
        self.validate_scores(math, reading, writing)?;
        let gender = self.parse_gender(gender)?;
        Ok(RawInput::new(math, reading, writing, gender))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_inclusive_bounds() {
        let validator = InputValidator::new();
        assert!(validator.validate_scores(0, 100, 50).is_ok());
    }

    #[test]
    fn rejects_out_of_range_with_field_name() {
        let validator = InputValidator::new();
        match validator.validate_scores(50, 101, 50) {
            Err(PredictError::Validation { field, .. }) => assert_eq!(field, "reading"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(validator.validate_scores(-1, 0, 0).is_err());
    }

    #[test]
    fn raw_input_parses_gender() {
        let validator = InputValidator::new();
        let input = validator.raw_input(70, 90, 67, "Female").unwrap();
        assert_eq!(input.gender, Gender::Female);
        assert!(validator.raw_input(70, 90, 67, "x").is_err());
    }
}
