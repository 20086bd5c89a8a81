//! Task payload validation.

use thiserror::Error;

use crate::calc::{self, CalculationError, Operation, MAX_INPUT};

use super::types::{Task, CALCULATION_TASK_TYPE};

/// Reasons a task payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("task id must not be empty")]
    EmptyId,

    #[error("task title must not be empty")]
    EmptyTitle,

    #[error("invalid task type '{0}', expected 'calculation'")]
    InvalidTaskType(String),

    #[error("unsupported operation '{0}', expected one of factorial, fibonacci, prime_check")]
    UnsupportedOperation(String),

    #[error("input {input} out of range for {operation}: must be between {min} and {max}")]
    InputOutOfRange {
        operation: Operation,
        input: i64,
        min: i64,
        max: i64,
    },

    #[error("invalid priority {0}, expected 1 (low), 2 (medium) or 3 (high)")]
    InvalidPriority(i64),
}

impl From<CalculationError> for ValidationError {
    fn from(err: CalculationError) -> Self {
        match err {
            CalculationError::UnknownOperation(name) => ValidationError::UnsupportedOperation(name),
            CalculationError::InputTooSmall {
                operation, input, ..
            }
            | CalculationError::InputTooLarge {
                operation, input, ..
            } => {
                let (min, max) = operation.input_range();
                ValidationError::InputOutOfRange {
                    operation,
                    input,
                    min,
                    max,
                }
            }
        }
    }
}

impl Task {
    /// Validate identity, task type, operation and input bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.data.task_type != CALCULATION_TASK_TYPE {
            return Err(ValidationError::InvalidTaskType(self.data.task_type.clone()));
        }

        let operation = self.data.parsed_operation()?;
        let input = self.data.input;
        if !(0..=MAX_INPUT).contains(&input) {
            let (min, max) = operation.input_range();
            return Err(ValidationError::InputOutOfRange {
                operation,
                input,
                min,
                max,
            });
        }

        calc::validate_input(operation, input)?;
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
