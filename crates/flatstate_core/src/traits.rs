use crate::error::Result;
use nalgebra::DVector;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as leaf values of a flat encoding.
/// Must support float arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// An indexable sequence of f64 values used as the flat state representation.
///
/// The canonical representation is a plain `Vec<f64>`; alternative buffers
/// (nalgebra vectors, JS typed arrays) only need to provide allocation,
/// indexed access and conversion.
pub trait FloatBuffer {
    /// Allocates a zero-filled buffer holding exactly `len` floats.
    fn allocate(len: usize) -> Self
    where
        Self: Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the float at `index`. `index` must be below `len()`.
    fn get(&self, index: usize) -> f64;

    /// Writes the float at `index`. `index` must be below `len()`.
    fn put(&mut self, index: usize, value: f64);

    fn from_canonical(values: &[f64]) -> Self
    where
        Self: Sized;

    fn to_canonical(&self) -> Vec<f64>;
}

impl FloatBuffer for Vec<f64> {
    fn allocate(len: usize) -> Self {
        vec![0.0; len]
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> f64 {
        self[index]
    }

    fn put(&mut self, index: usize, value: f64) {
        self[index] = value;
    }

    fn from_canonical(values: &[f64]) -> Self {
        values.to_vec()
    }

    fn to_canonical(&self) -> Vec<f64> {
        self.clone()
    }
}

impl FloatBuffer for DVector<f64> {
    fn allocate(len: usize) -> Self {
        DVector::zeros(len)
    }

    fn len(&self) -> usize {
        self.nrows()
    }

    fn get(&self, index: usize) -> f64 {
        self[index]
    }

    fn put(&mut self, index: usize, value: f64) {
        self[index] = value;
    }

    fn from_canonical(values: &[f64]) -> Self {
        DVector::from_column_slice(values)
    }

    fn to_canonical(&self) -> Vec<f64> {
        self.as_slice().to_vec()
    }
}

/// The contract every explicit integrator fulfils.
///
/// An integrator receives the current flat state, a step size and a flat
/// derivative `f(y)` returning a buffer of identical length. It may call the
/// derivative any number of times and must return the next flat state without
/// assuming anything about where the buffers it receives come from.
pub trait ExplicitSolver {
    /// Performs one step of size `step_size` starting at `current`.
    fn step<B, F>(&self, current: &B, step_size: f64, derivative: F) -> Result<B>
    where
        B: FloatBuffer,
        F: FnMut(&B) -> Result<B>;
}
