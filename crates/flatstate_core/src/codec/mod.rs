//! Schema-driven mapping between structured values and flat `f64` sequences.
//!
//! A [`Descriptor`] is built once per schema from the primitive, array, object
//! and value combinators and then reused for any number of encode/decode calls.
//! Descriptors never store lengths in the stream: the shape of a dynamic value
//! is taken from the live value on encode and from the supplied template on decode.

pub mod array;
pub mod object;
pub mod primitive;
pub mod value;

pub use array::{array, fixed_array, ArrayDescriptor};
pub use object::{ObjectDescriptor, ObjectDescriptorBuilder};
pub use primitive::{float, primitive, Primitive};
pub use value::{ValueDescriptor, ValueDescriptorBuilder};

use crate::error::{Error, Result};
use crate::traits::FloatBuffer;
use std::sync::Arc;

/// Size classification of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// Every value encodes to exactly this many floats.
    Fixed(usize),
    /// The float count depends on the live value, see [`Descriptor::live_size`].
    Dynamic,
}

impl Size {
    pub fn fixed(self) -> Option<usize> {
        match self {
            Size::Fixed(size) => Some(size),
            Size::Dynamic => None,
        }
    }

    pub fn is_fixed(self) -> bool {
        matches!(self, Size::Fixed(_))
    }
}

/// How a descriptor produces the value returned from decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeContract {
    /// The supplied value is updated in place and handed back.
    MutateInPlace,
    /// A new value is built through a constructor; the supplied value is only read.
    Reconstruct,
}

/// Describes how values of `Self::Value` map to and from a flat float sequence.
pub trait Descriptor {
    type Value;

    fn size(&self) -> Size;

    /// Number of floats `encode` writes for `value`.
    /// Equals the declared size for fixed descriptors.
    fn live_size(&self, value: &Self::Value) -> usize;

    fn contract(&self) -> DecodeContract;

    /// Writes exactly `live_size(value)` floats.
    fn encode(&self, value: &Self::Value, writer: &mut FloatWriter<'_>) -> Result<()>;

    /// Reads the floats for one value into `target`, honoring [`Descriptor::contract`].
    fn decode_into(&self, reader: &mut FloatReader<'_>, target: &mut Self::Value) -> Result<()>;

    /// Reads one value, using `existing` as the shape template.
    fn decode(&self, reader: &mut FloatReader<'_>, existing: Self::Value) -> Result<Self::Value> {
        let mut value = existing;
        self.decode_into(reader, &mut value)?;
        Ok(value)
    }
}

macro_rules! forward_descriptor {
    ($($wrapper:ty),*) => {
        $(
            impl<D: Descriptor + ?Sized> Descriptor for $wrapper {
                type Value = D::Value;

                fn size(&self) -> Size {
                    (**self).size()
                }

                fn live_size(&self, value: &Self::Value) -> usize {
                    (**self).live_size(value)
                }

                fn contract(&self) -> DecodeContract {
                    (**self).contract()
                }

                fn encode(&self, value: &Self::Value, writer: &mut FloatWriter<'_>) -> Result<()> {
                    (**self).encode(value, writer)
                }

                fn decode_into(
                    &self,
                    reader: &mut FloatReader<'_>,
                    target: &mut Self::Value,
                ) -> Result<()> {
                    (**self).decode_into(reader, target)
                }
            }
        )*
    };
}

forward_descriptor!(&D, Box<D>, Arc<D>);

/// Sequential writer over a flat buffer.
pub struct FloatWriter<'a> {
    buffer: &'a mut dyn FloatBuffer,
    position: usize,
}

impl<'a> FloatWriter<'a> {
    pub fn new(buffer: &'a mut dyn FloatBuffer) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn write(&mut self, value: f64) -> Result<()> {
        let capacity = self.buffer.len();
        if self.position >= capacity {
            return Err(Error::BufferOverrun { capacity });
        }
        self.buffer.put(self.position, value);
        self.position += 1;
        Ok(())
    }

    /// Fails unless every float of the buffer has been written.
    pub fn finish(self) -> Result<()> {
        let expected = self.buffer.len();
        if self.position != expected {
            return Err(Error::SizeContractViolation {
                expected,
                actual: self.position,
            });
        }
        Ok(())
    }
}

/// Sequential reader over a flat buffer.
pub struct FloatReader<'a> {
    buffer: &'a dyn FloatBuffer,
    position: usize,
}

impl<'a> FloatReader<'a> {
    pub fn new(buffer: &'a dyn FloatBuffer) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn read(&mut self) -> Result<f64> {
        let capacity = self.buffer.len();
        if self.position >= capacity {
            return Err(Error::BufferOverrun { capacity });
        }
        let value = self.buffer.get(self.position);
        self.position += 1;
        Ok(value)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Fails unless every float of the buffer has been read.
    pub fn finish(self) -> Result<()> {
        let expected = self.buffer.len();
        if self.position != expected {
            return Err(Error::SizeContractViolation {
                expected,
                actual: self.position,
            });
        }
        Ok(())
    }
}

/// Encodes `value` into a freshly allocated buffer of exactly `live_size(value)` floats.
pub fn encode_to_buffer<B, D>(descriptor: &D, value: &D::Value) -> Result<B>
where
    B: FloatBuffer,
    D: Descriptor + ?Sized,
{
    let mut buffer = B::allocate(descriptor.live_size(value));
    let mut writer = FloatWriter::new(&mut buffer);
    descriptor.encode(value, &mut writer)?;
    writer.finish()?;
    Ok(buffer)
}

pub fn encode_to_vec<D>(descriptor: &D, value: &D::Value) -> Result<Vec<f64>>
where
    D: Descriptor + ?Sized,
{
    encode_to_buffer(descriptor, value)
}

/// Decodes the whole of `buffer`, using `existing` as the shape template.
pub fn decode_from_buffer<B, D>(descriptor: &D, buffer: &B, existing: D::Value) -> Result<D::Value>
where
    B: FloatBuffer,
    D: Descriptor + ?Sized,
{
    let mut reader = FloatReader::new(buffer);
    let value = descriptor.decode(&mut reader, existing)?;
    reader.finish()?;
    Ok(value)
}

/// Properties of a composite descriptor, split once into the statically sized
/// group and the group whose size depends on the live value.
pub(crate) struct PropertyGroups<F: ?Sized> {
    fixed: Vec<Arc<F>>,
    dynamic: Vec<Arc<F>>,
    fixed_size: usize,
}

impl<F: ?Sized> Clone for PropertyGroups<F> {
    fn clone(&self) -> Self {
        Self {
            fixed: self.fixed.clone(),
            dynamic: self.dynamic.clone(),
            fixed_size: self.fixed_size,
        }
    }
}

impl<F: ?Sized> PropertyGroups<F> {
    pub(crate) fn partition(properties: Vec<Arc<F>>, size_of: impl Fn(&F) -> Size) -> Self {
        let mut fixed = Vec::new();
        let mut dynamic = Vec::new();
        let mut fixed_size = 0;
        for property in properties {
            match size_of(property.as_ref()) {
                Size::Fixed(size) => {
                    fixed_size += size;
                    fixed.push(property);
                }
                Size::Dynamic => dynamic.push(property),
            }
        }
        Self {
            fixed,
            dynamic,
            fixed_size,
        }
    }

    pub(crate) fn size(&self) -> Size {
        if self.dynamic.is_empty() {
            Size::Fixed(self.fixed_size)
        } else {
            Size::Dynamic
        }
    }

    pub(crate) fn fixed_size(&self) -> usize {
        self.fixed_size
    }

    pub(crate) fn dynamic(&self) -> &[Arc<F>] {
        &self.dynamic
    }

    /// Serialization order: fixed group first, then dynamic group.
    pub(crate) fn in_order(&self) -> impl Iterator<Item = &Arc<F>> {
        self.fixed.iter().chain(self.dynamic.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_rejects_writes_past_capacity() {
        let mut buffer = vec![0.0; 1];
        let mut writer = FloatWriter::new(&mut buffer);
        writer.write(1.0).expect("first write fits");
        let err = writer.write(2.0).expect_err("second write overruns");
        assert_eq!(err, Error::BufferOverrun { capacity: 1 });
    }

    #[test]
    fn writer_finish_reports_short_writes() {
        let mut buffer = vec![0.0; 3];
        let mut writer = FloatWriter::new(&mut buffer);
        writer.write(1.0).expect("write fits");
        let err = writer.finish().expect_err("two floats missing");
        assert_eq!(
            err,
            Error::SizeContractViolation {
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn reader_reads_sequentially_and_stops_at_end() {
        let buffer = vec![4.0, 5.0];
        let mut reader = FloatReader::new(&buffer);
        assert_eq!(reader.read().expect("in bounds"), 4.0);
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.read().expect("in bounds"), 5.0);
        assert!(matches!(
            reader.read(),
            Err(Error::BufferOverrun { capacity: 2 })
        ));
    }

    #[test]
    fn decode_from_buffer_requires_full_consumption() {
        let buffer = vec![1.0, 2.0];
        let err = decode_from_buffer(&float(), &buffer, 0.0).expect_err("one float left over");
        assert_eq!(
            err,
            Error::SizeContractViolation {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn shared_descriptors_forward_everything() {
        let shared = Arc::new(fixed_array(float(), 2));
        let boxed: Box<dyn Descriptor<Value = Vec<f64>>> = Box::new(shared.clone());
        assert_eq!(boxed.size(), Size::Fixed(2));
        assert_eq!(boxed.contract(), DecodeContract::MutateInPlace);
        let encoded = encode_to_vec(&boxed, &vec![7.0, 8.0]).expect("encode should succeed");
        assert_eq!(encoded, vec![7.0, 8.0]);
        let decoded = decode_from_buffer(&*shared, &vec![1.0, 2.0], vec![0.0, 0.0])
            .expect("decode should succeed");
        assert_eq!(decoded, vec![1.0, 2.0]);
    }

    #[test]
    fn size_accessors() {
        assert_eq!(Size::Fixed(3).fixed(), Some(3));
        assert_eq!(Size::Dynamic.fixed(), None);
        assert!(Size::Fixed(0).is_fixed());
        assert!(!Size::Dynamic.is_fixed());
    }

    mod laws {
        use super::super::*;
        use crate::object_descriptor;
        use proptest::prelude::*;

        #[derive(Debug, Clone, PartialEq)]
        struct Cloud {
            weight: f64,
            points: Vec<Vec<f64>>,
            anchor: Vec<f64>,
        }

        fn cloud_descriptor() -> ObjectDescriptor<Cloud> {
            object_descriptor!(Cloud {
                points: array(array(float())),
                weight: float(),
                anchor: fixed_array(float(), 3),
            })
        }

        fn bits(values: &[f64]) -> Vec<u64> {
            values.iter().map(|v| v.to_bits()).collect()
        }

        proptest! {
            #[test]
            fn encode_writes_live_size_and_round_trips(
                weight in any::<f64>(),
                points in prop::collection::vec(prop::collection::vec(any::<f64>(), 0..4), 0..6),
                anchor in prop::collection::vec(any::<f64>(), 3),
            ) {
                let descriptor = cloud_descriptor();
                let value = Cloud { weight, points, anchor };

                let encoded = encode_to_vec(&descriptor, &value).expect("encode should succeed");
                prop_assert_eq!(encoded.len(), descriptor.live_size(&value));

                let template = Cloud {
                    weight: 0.0,
                    points: value.points.iter().map(|p| vec![0.0; p.len()]).collect(),
                    anchor: vec![0.0; 3],
                };
                let decoded = decode_from_buffer(&descriptor, &encoded, template)
                    .expect("decode should succeed");
                let reencoded = encode_to_vec(&descriptor, &decoded).expect("encode should succeed");
                prop_assert_eq!(bits(&reencoded), bits(&encoded));
                prop_assert_eq!(encoded[0].to_bits(), value.weight.to_bits());
                prop_assert_eq!(bits(&encoded[1..4]), bits(&value.anchor));
            }
        }
    }
}
