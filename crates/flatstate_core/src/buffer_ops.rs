//! Element-wise arithmetic on flat buffers, used by the explicit integrators.
//!
//! Functions suffixed `_self` reuse their first argument's storage.

use crate::error::{Error, Result};
use crate::traits::FloatBuffer;

pub fn assert_same_length<A, B>(a: &A, b: &B) -> Result<()>
where
    A: FloatBuffer + ?Sized,
    B: FloatBuffer + ?Sized,
{
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Returns a new buffer holding `a * factor`.
pub fn scalar_multiply<B: FloatBuffer>(a: &B, factor: f64) -> B {
    let mut result = B::allocate(a.len());
    for i in 0..a.len() {
        result.put(i, a.get(i) * factor);
    }
    result
}

pub fn scalar_multiply_self<B: FloatBuffer>(mut a: B, factor: f64) -> B {
    for i in 0..a.len() {
        let value = a.get(i);
        a.put(i, value * factor);
    }
    a
}

/// Adds `other` into `a` element-wise.
pub fn add_self<B: FloatBuffer>(mut a: B, other: &B) -> Result<B> {
    assert_same_length(&a, other)?;
    for i in 0..a.len() {
        let value = a.get(i);
        a.put(i, value + other.get(i));
    }
    Ok(a)
}

/// Adds every buffer of `others` into `first`.
pub fn add_all_to_first<B: FloatBuffer>(first: B, others: &[&B]) -> Result<B> {
    others
        .iter()
        .try_fold(first, |accum, other| add_self(accum, other))
}
