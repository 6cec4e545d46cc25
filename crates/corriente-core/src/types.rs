//! Element types exchanged over ports and stored in the [`Pool`](crate::Pool).
//!
//! [`Real`] is the scalar sample type used throughout the framework. Composite
//! element types ([`StereoSample`], [`Tensor`]) are plain data with no behavior
//! beyond construction-time shape checking.

use crate::error::CoreError;

/// Scalar sample type used by all numeric ports and pool entries.
pub type Real = f32;

/// A left/right sample pair for stereo streams.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoSample {
    /// Left channel sample.
    pub left: Real,
    /// Right channel sample.
    pub right: Real,
}

impl StereoSample {
    /// Creates a stereo sample from channel values.
    pub const fn new(left: Real, right: Real) -> Self {
        Self { left, right }
    }

    /// Sums both channels to mono at equal gain.
    #[inline]
    pub fn mono(self) -> Real {
        0.5 * (self.left + self.right)
    }

    /// Returns true if both channels are finite (no NaN or infinity).
    #[inline]
    pub fn is_finite(self) -> bool {
        self.left.is_finite() && self.right.is_finite()
    }
}

/// Dense n-dimensional array of [`Real`] with row-major storage.
///
/// Shape is checked once at construction; the flat data length must equal the
/// product of the dimensions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<Real>,
}

impl Tensor {
    /// Builds a tensor from a shape and flat row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidShape`] if `data.len()` does not equal the
    /// product of `shape`.
    pub fn from_shape_vec(shape: Vec<usize>, data: Vec<Real>) -> Result<Self, CoreError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(CoreError::InvalidShape {
                expected,
                found: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Builds a zero-filled tensor with the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; len],
        }
    }

    /// Returns the dimensions.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the flat row-major data.
    pub fn data(&self) -> &[Real] {
        &self.data
    }

    /// Returns the total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if every element is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_mono_sum() {
        let s = StereoSample::new(1.0, 0.0);
        assert_eq!(s.mono(), 0.5);
    }

    #[test]
    fn stereo_finite_check() {
        assert!(StereoSample::new(0.1, -0.1).is_finite());
        assert!(!StereoSample::new(Real::NAN, 0.0).is_finite());
        assert!(!StereoSample::new(0.0, Real::INFINITY).is_finite());
    }

    #[test]
    fn tensor_shape_mismatch_is_error() {
        let err = Tensor::from_shape_vec(vec![2, 3], vec![0.0; 5]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidShape {
                expected: 6,
                found: 5
            }
        ));
    }

    #[test]
    fn tensor_zeros() {
        let t = Tensor::zeros(vec![2, 4]);
        assert_eq!(t.len(), 8);
        assert_eq!(t.shape(), &[2, 4]);
        assert!(t.is_finite());
    }
}
