use super::{DecodeContract, Descriptor, FloatReader, FloatWriter, Size};
use crate::error::{Error, Result};
use crate::traits::Scalar;
use std::fmt;
use std::marker::PhantomData;

/// Leaf codec for a single scalar. Always occupies exactly one float.
pub struct Primitive<S> {
    _scalar: PhantomData<fn() -> S>,
}

/// Descriptor for a single `f64`.
pub fn float() -> Primitive<f64> {
    primitive()
}

/// Descriptor for a single scalar of type `S`, widened to `f64` in the stream.
pub fn primitive<S: Scalar>() -> Primitive<S> {
    Primitive {
        _scalar: PhantomData,
    }
}

impl<S> Clone for Primitive<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Primitive<S> {}

impl<S> fmt::Debug for Primitive<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Primitive<{}>", std::any::type_name::<S>())
    }
}

impl<S: Scalar> Descriptor for Primitive<S> {
    type Value = S;

    fn size(&self) -> Size {
        Size::Fixed(1)
    }

    fn live_size(&self, _value: &S) -> usize {
        1
    }

    fn contract(&self) -> DecodeContract {
        DecodeContract::MutateInPlace
    }

    fn encode(&self, value: &S, writer: &mut FloatWriter<'_>) -> Result<()> {
        let widened = value
            .to_f64()
            .ok_or_else(|| Error::Unrepresentable(format!("{value:?}")))?;
        writer.write(widened)
    }

    /// Fails unless the float survives the narrowing to `S` unchanged.
    fn decode_into(&self, reader: &mut FloatReader<'_>, target: &mut S) -> Result<()> {
        let raw = reader.read()?;
        let unrepresentable = || Error::Unrepresentable(raw.to_string());
        let value = S::from_f64(raw).ok_or_else(unrepresentable)?;
        match value.to_f64() {
            Some(back) if back == raw || (back.is_nan() && raw.is_nan()) => {
                *target = value;
                Ok(())
            }
            _ => Err(unrepresentable()),
        }
    }
}
