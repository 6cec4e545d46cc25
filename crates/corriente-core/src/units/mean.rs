//! Arithmetic mean over a vector, as a standard algorithm.

use crate::algorithm::Algorithm;
use crate::error::CoreError;
use crate::types::Real;
use crate::value::{Value, ValueMap, ValueMapExt};

/// Computes the arithmetic mean of the `array` input into the `mean` output.
#[derive(Default)]
pub struct Mean;

impl Mean {
    /// Creates the algorithm.
    pub fn new() -> Self {
        Self
    }
}

impl Algorithm for Mean {
    fn name(&self) -> &'static str {
        "Mean"
    }

    fn compute(&mut self, inputs: &ValueMap, outputs: &mut ValueMap) -> Result<(), CoreError> {
        let array = inputs.vector_real("array")?;
        if array.is_empty() {
            return Err(CoreError::EmptyInput {
                name: "array".to_string(),
            });
        }
        let sum: f64 = array.iter().map(|&v| f64::from(v)).sum();
        let mean = (sum / array.len() as f64) as Real;
        outputs.insert("mean".to_string(), Value::Real(mean));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_known_values() {
        let mut algo = Mean::new();
        let mut inputs = ValueMap::new();
        inputs.insert("array".into(), Value::VectorReal(vec![1.0, 2.0, 3.0, 4.0]));
        let mut outputs = ValueMap::new();
        algo.compute(&inputs, &mut outputs).unwrap();
        assert_eq!(outputs.real("mean").unwrap(), 2.5);
    }

    #[test]
    fn empty_array_is_error() {
        let mut algo = Mean::new();
        let mut inputs = ValueMap::new();
        inputs.insert("array".into(), Value::VectorReal(vec![]));
        let mut outputs = ValueMap::new();
        let err = algo.compute(&inputs, &mut outputs).unwrap_err();
        assert!(matches!(err, CoreError::EmptyInput { .. }));
    }

    #[test]
    fn missing_input_is_error() {
        let mut algo = Mean::new();
        let err = algo.compute(&ValueMap::new(), &mut ValueMap::new()).unwrap_err();
        assert!(matches!(err, CoreError::MissingValue { .. }));
    }
}
