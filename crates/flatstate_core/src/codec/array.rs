use super::{DecodeContract, Descriptor, FloatReader, FloatWriter, Size};
use crate::error::{Error, Result};

/// Homogeneous sequence of items described by `D`.
///
/// The stream never carries the length: encoding writes the items back to
/// back, decoding updates the items of the supplied template index by index
/// and never grows or shrinks it.
#[derive(Debug, Clone)]
pub struct ArrayDescriptor<D> {
    item: D,
    length: Option<usize>,
    size: Size,
}

/// Array whose length is taken from the live value.
pub fn array<D: Descriptor>(item: D) -> ArrayDescriptor<D> {
    ArrayDescriptor {
        item,
        length: None,
        size: Size::Dynamic,
    }
}

/// Array with exactly `length` items. Fixed size when the item is fixed size.
pub fn fixed_array<D: Descriptor>(item: D, length: usize) -> ArrayDescriptor<D> {
    let size = match item.size() {
        Size::Fixed(item_size) => Size::Fixed(item_size * length),
        Size::Dynamic => Size::Dynamic,
    };
    ArrayDescriptor {
        item,
        length: Some(length),
        size,
    }
}

impl<D: Descriptor> ArrayDescriptor<D> {
    fn check_length(&self, actual: usize) -> Result<()> {
        match self.length {
            Some(expected) if expected != actual => {
                Err(Error::LengthMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

impl<D: Descriptor> Descriptor for ArrayDescriptor<D> {
    type Value = Vec<D::Value>;

    fn size(&self) -> Size {
        self.size
    }

    fn live_size(&self, value: &Self::Value) -> usize {
        match (self.size, self.item.size()) {
            (Size::Fixed(size), _) => size,
            (Size::Dynamic, Size::Fixed(item_size)) => value.len() * item_size,
            (Size::Dynamic, Size::Dynamic) => {
                value.iter().map(|item| self.item.live_size(item)).sum()
            }
        }
    }

    fn contract(&self) -> DecodeContract {
        DecodeContract::MutateInPlace
    }

    fn encode(&self, value: &Self::Value, writer: &mut FloatWriter<'_>) -> Result<()> {
        self.check_length(value.len())?;
        for item in value {
            self.item.encode(item, writer)?;
        }
        Ok(())
    }

    fn decode_into(&self, reader: &mut FloatReader<'_>, target: &mut Self::Value) -> Result<()> {
        self.check_length(target.len())?;
        for item in target.iter_mut() {
            self.item.decode_into(reader, item)?;
        }
        Ok(())
    }
}
