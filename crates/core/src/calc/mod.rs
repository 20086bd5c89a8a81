//! Calculation operations executed by worker threads.
//!
//! Every operation takes a signed integer input and returns its result as a
//! decimal string so that large values (e.g. `fibonacci(1000)`) survive
//! serialization unchanged.

mod math;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use math::{factorial, fibonacci, prime_check};

/// Largest input accepted by any operation.
pub const MAX_INPUT: i64 = 100_000;

/// Largest input accepted by `factorial` (20! is the last value that fits in a u64).
pub const MAX_FACTORIAL_INPUT: i64 = 20;

/// Largest input accepted by `fibonacci`.
pub const MAX_FIBONACCI_INPUT: i64 = 1000;

/// Smallest input accepted by `prime_check`.
pub const MIN_PRIME_CHECK_INPUT: i64 = 2;

/// Errors raised by calculation functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculationError {
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("{operation} requires input >= {min}, got {input}")]
    InputTooSmall {
        operation: Operation,
        input: i64,
        min: i64,
    },

    #[error("{operation} requires input <= {max}, got {input}")]
    InputTooLarge {
        operation: Operation,
        input: i64,
        max: i64,
    },
}

/// Supported calculation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Factorial,
    Fibonacci,
    PrimeCheck,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::Factorial,
        Operation::Fibonacci,
        Operation::PrimeCheck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Factorial => "factorial",
            Operation::Fibonacci => "fibonacci",
            Operation::PrimeCheck => "prime_check",
        }
    }

    /// Inclusive input range accepted by this operation.
    pub fn input_range(&self) -> (i64, i64) {
        match self {
            Operation::Factorial => (0, MAX_FACTORIAL_INPUT),
            Operation::Fibonacci => (0, MAX_FIBONACCI_INPUT),
            Operation::PrimeCheck => (MIN_PRIME_CHECK_INPUT, MAX_INPUT),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "factorial" => Ok(Operation::Factorial),
            "fibonacci" => Ok(Operation::Fibonacci),
            "prime_check" => Ok(Operation::PrimeCheck),
            other => Err(CalculationError::UnknownOperation(other.to_string())),
        }
    }
}

/// Check that `input` is inside the range accepted by `operation`.
pub fn validate_input(operation: Operation, input: i64) -> Result<(), CalculationError> {
    let (min, max) = operation.input_range();
    if input < min {
        return Err(CalculationError::InputTooSmall {
            operation,
            input,
            min,
        });
    }
    if input > max {
        return Err(CalculationError::InputTooLarge {
            operation,
            input,
            max,
        });
    }
    Ok(())
}

/// Run `operation` on `input`.
pub fn execute(operation: Operation, input: i64) -> Result<String, CalculationError> {
    match operation {
        Operation::Factorial => factorial(input),
        Operation::Fibonacci => fibonacci(input),
        Operation::PrimeCheck => prime_check(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parse() {
        assert_eq!("factorial".parse::<Operation>().unwrap(), Operation::Factorial);
        assert_eq!("fibonacci".parse::<Operation>().unwrap(), Operation::Fibonacci);
        assert_eq!(
            "prime_check".parse::<Operation>().unwrap(),
            Operation::PrimeCheck
        );

        let err = "sqrt".parse::<Operation>().unwrap_err();
        assert_eq!(err, CalculationError::UnknownOperation("sqrt".to_string()));
    }

    #[test]
    fn test_operation_display_matches_wire_name() {
        for op in Operation::ALL {
            assert_eq!(op.to_string().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_operation_serde_names() {
        let json = serde_json::to_string(&Operation::PrimeCheck).unwrap();
        assert_eq!(json, "\"prime_check\"");
    }

    #[test]
    fn test_validate_input_bounds() {
        assert!(validate_input(Operation::Factorial, 0).is_ok());
        assert!(validate_input(Operation::Factorial, 20).is_ok());
        assert!(validate_input(Operation::Factorial, 21).is_err());
        assert!(validate_input(Operation::Factorial, -1).is_err());

        assert!(validate_input(Operation::Fibonacci, 1000).is_ok());
        assert!(validate_input(Operation::Fibonacci, 1001).is_err());

        assert!(validate_input(Operation::PrimeCheck, 2).is_ok());
        assert!(validate_input(Operation::PrimeCheck, 100_000).is_ok());
        assert!(validate_input(Operation::PrimeCheck, 100_001).is_err());
        assert!(matches!(
            validate_input(Operation::PrimeCheck, 1),
            Err(CalculationError::InputTooSmall { min: 2, .. })
        ));
    }

    #[test]
    fn test_execute_dispatch() {
        assert_eq!(execute(Operation::Factorial, 5).unwrap(), "120");
        assert_eq!(execute(Operation::Fibonacci, 10).unwrap(), "55");
        assert_eq!(execute(Operation::PrimeCheck, 17).unwrap(), "true");
    }

    #[test]
    fn test_error_display() {
        let err = CalculationError::InputTooLarge {
            operation: Operation::Factorial,
            input: 25,
            max: 20,
        };
        assert_eq!(err.to_string(), "factorial requires input <= 20, got 25");
    }
}
