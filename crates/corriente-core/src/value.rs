//! Dynamically typed values for standard (pull-mode) algorithm IO.
//!
//! Standard algorithms exchange data through a [`ValueMap`]: named bindings of
//! [`Value`]. The [`ValueMapExt`] accessors return typed references and turn
//! absent or mistyped bindings into errors, so `compute()` bodies stay free of
//! manual matching.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::types::{Real, StereoSample, Tensor};

/// A dynamically typed IO value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Scalar real.
    Real(Real),
    /// String.
    Str(String),
    /// Vector of reals.
    VectorReal(Vec<Real>),
    /// Vector of strings.
    VectorString(Vec<String>),
    /// Rectangular matrix of reals, stored row by row.
    MatrixReal(Vec<Vec<Real>>),
    /// Vector of stereo samples.
    VectorStereo(Vec<StereoSample>),
    /// Dense n-dimensional tensor.
    Tensor(Tensor),
}

impl Value {
    /// Returns a short name for the stored type, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Real(_) => "real",
            Value::Str(_) => "string",
            Value::VectorReal(_) => "vector_real",
            Value::VectorString(_) => "vector_string",
            Value::MatrixReal(_) => "matrix_real",
            Value::VectorStereo(_) => "vector_stereo",
            Value::Tensor(_) => "tensor",
        }
    }
}

impl From<Real> for Value {
    fn from(v: Real) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Real>> for Value {
    fn from(v: Vec<Real>) -> Self {
        Value::VectorReal(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::VectorString(v)
    }
}

impl From<Vec<StereoSample>> for Value {
    fn from(v: Vec<StereoSample>) -> Self {
        Value::VectorStereo(v)
    }
}

impl From<Tensor> for Value {
    fn from(v: Tensor) -> Self {
        Value::Tensor(v)
    }
}

/// Named value bindings passed to and returned from `compute()`.
pub type ValueMap = BTreeMap<String, Value>;

/// Builds a [`Value::MatrixReal`] after checking that all rows share one length.
pub fn matrix_from_rows(name: &str, rows: Vec<Vec<Real>>) -> Result<Value, CoreError> {
    if let Some(first) = rows.first() {
        let expected = first.len();
        for row in &rows {
            if row.len() != expected {
                return Err(CoreError::RaggedMatrix {
                    name: name.to_string(),
                    expected,
                    found: row.len(),
                });
            }
        }
    }
    Ok(Value::MatrixReal(rows))
}

/// Typed accessors over a [`ValueMap`].
pub trait ValueMapExt {
    /// Returns a real binding.
    fn real(&self, name: &str) -> Result<Real, CoreError>;
    /// Returns a string binding.
    fn str(&self, name: &str) -> Result<&str, CoreError>;
    /// Returns a vector-of-reals binding.
    fn vector_real(&self, name: &str) -> Result<&[Real], CoreError>;
    /// Returns a vector-of-strings binding.
    fn vector_string(&self, name: &str) -> Result<&[String], CoreError>;
    /// Returns a matrix binding.
    fn matrix_real(&self, name: &str) -> Result<&[Vec<Real>], CoreError>;
    /// Returns a stereo-vector binding.
    fn vector_stereo(&self, name: &str) -> Result<&[StereoSample], CoreError>;
    /// Returns a tensor binding.
    fn tensor(&self, name: &str) -> Result<&Tensor, CoreError>;
}

fn fetch<'a>(map: &'a ValueMap, name: &str) -> Result<&'a Value, CoreError> {
    map.get(name).ok_or_else(|| CoreError::MissingValue {
        name: name.to_string(),
    })
}

fn mismatch(name: &str, expected: &'static str, found: &Value) -> CoreError {
    CoreError::ValueTypeMismatch {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

impl ValueMapExt for ValueMap {
    fn real(&self, name: &str) -> Result<Real, CoreError> {
        match fetch(self, name)? {
            Value::Real(v) => Ok(*v),
            other => Err(mismatch(name, "real", other)),
        }
    }

    fn str(&self, name: &str) -> Result<&str, CoreError> {
        match fetch(self, name)? {
            Value::Str(v) => Ok(v),
            other => Err(mismatch(name, "string", other)),
        }
    }

    fn vector_real(&self, name: &str) -> Result<&[Real], CoreError> {
        match fetch(self, name)? {
            Value::VectorReal(v) => Ok(v),
            other => Err(mismatch(name, "vector_real", other)),
        }
    }

    fn vector_string(&self, name: &str) -> Result<&[String], CoreError> {
        match fetch(self, name)? {
            Value::VectorString(v) => Ok(v),
            other => Err(mismatch(name, "vector_string", other)),
        }
    }

    fn matrix_real(&self, name: &str) -> Result<&[Vec<Real>], CoreError> {
        match fetch(self, name)? {
            Value::MatrixReal(v) => Ok(v),
            other => Err(mismatch(name, "matrix_real", other)),
        }
    }

    fn vector_stereo(&self, name: &str) -> Result<&[StereoSample], CoreError> {
        match fetch(self, name)? {
            Value::VectorStereo(v) => Ok(v),
            other => Err(mismatch(name, "vector_stereo", other)),
        }
    }

    fn tensor(&self, name: &str) -> Result<&Tensor, CoreError> {
        match fetch(self, name)? {
            Value::Tensor(v) => Ok(v),
            other => Err(mismatch(name, "tensor", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access() {
        let mut map = ValueMap::new();
        map.insert("x".into(), Value::Real(2.5));
        map.insert("v".into(), Value::VectorReal(vec![1.0, 2.0]));
        assert_eq!(map.real("x").unwrap(), 2.5);
        assert_eq!(map.vector_real("v").unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn missing_binding_is_error() {
        let map = ValueMap::new();
        assert!(matches!(
            map.real("x"),
            Err(CoreError::MissingValue { .. })
        ));
    }

    #[test]
    fn wrong_type_is_error() {
        let mut map = ValueMap::new();
        map.insert("x".into(), Value::Str("hi".into()));
        let err = map.real("x").unwrap_err();
        assert!(matches!(
            err,
            CoreError::ValueTypeMismatch {
                expected: "real",
                found: "string",
                ..
            }
        ));
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = matrix_from_rows("m", vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::RaggedMatrix {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn empty_matrix_is_fine() {
        assert!(matrix_from_rows("m", vec![]).is_ok());
    }
}
