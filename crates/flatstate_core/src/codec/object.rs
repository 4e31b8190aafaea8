//! Named-property structs whose fields are updated in place on decode.

use super::{DecodeContract, Descriptor, FloatReader, FloatWriter, PropertyGroups, Size};
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

trait ObjectProperty<T>: Send + Sync {
    fn name(&self) -> &'static str;
    fn size(&self) -> Size;
    fn live_size(&self, object: &T) -> usize;
    fn encode(&self, object: &T, writer: &mut FloatWriter<'_>) -> Result<()>;
    fn decode_into(&self, reader: &mut FloatReader<'_>, object: &mut T) -> Result<()>;
}

struct Property<D, G, M> {
    name: &'static str,
    descriptor: D,
    get: G,
    get_mut: M,
}

impl<T, D, G, M> ObjectProperty<T> for Property<D, G, M>
where
    D: Descriptor + Send + Sync,
    G: Fn(&T) -> &D::Value + Send + Sync,
    M: Fn(&mut T) -> &mut D::Value + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn size(&self) -> Size {
        self.descriptor.size()
    }

    fn live_size(&self, object: &T) -> usize {
        self.descriptor.live_size((self.get)(object))
    }

    fn encode(&self, object: &T, writer: &mut FloatWriter<'_>) -> Result<()> {
        self.descriptor.encode((self.get)(object), writer)
    }

    fn decode_into(&self, reader: &mut FloatReader<'_>, object: &mut T) -> Result<()> {
        self.descriptor.decode_into(reader, (self.get_mut)(object))
    }
}

/// Descriptor over a subset of the fields of `T`.
///
/// Fields with a fixed size are streamed first, in declaration order, followed
/// by the dynamically sized fields. Only fields that have a [`Descriptor`] can
/// be declared, so text or function fields are rejected when the schema is
/// written rather than skipped at run time.
pub struct ObjectDescriptor<T> {
    properties: PropertyGroups<dyn ObjectProperty<T>>,
}

pub struct ObjectDescriptorBuilder<T> {
    properties: Vec<Arc<dyn ObjectProperty<T>>>,
}

impl<T: 'static> ObjectDescriptor<T> {
    pub fn builder() -> ObjectDescriptorBuilder<T> {
        ObjectDescriptorBuilder {
            properties: Vec::new(),
        }
    }

    /// Property names in serialization order.
    pub fn property_names(&self) -> Vec<&'static str> {
        self.properties.in_order().map(|p| p.name()).collect()
    }
}

impl<T: 'static> ObjectDescriptorBuilder<T> {
    /// Declares a property reached through `get`/`get_mut` and encoded by `descriptor`.
    pub fn property<D, G, M>(mut self, name: &'static str, descriptor: D, get: G, get_mut: M) -> Self
    where
        D: Descriptor + Send + Sync + 'static,
        G: Fn(&T) -> &D::Value + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut D::Value + Send + Sync + 'static,
    {
        self.properties.push(Arc::new(Property {
            name,
            descriptor,
            get,
            get_mut,
        }));
        self
    }

    pub fn build(self) -> ObjectDescriptor<T> {
        ObjectDescriptor {
            properties: PropertyGroups::partition(self.properties, |p| p.size()),
        }
    }
}

impl<T> Clone for ObjectDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            properties: self.properties.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for ObjectDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDescriptor")
            .field("properties", &self.property_names())
            .field("size", &self.properties.size())
            .finish()
    }
}

impl<T: 'static> Descriptor for ObjectDescriptor<T> {
    type Value = T;

    fn size(&self) -> Size {
        self.properties.size()
    }

    fn live_size(&self, value: &T) -> usize {
        self.properties.fixed_size()
            + self
                .properties
                .dynamic()
                .iter()
                .map(|p| p.live_size(value))
                .sum::<usize>()
    }

    fn contract(&self) -> DecodeContract {
        DecodeContract::MutateInPlace
    }

    fn encode(&self, value: &T, writer: &mut FloatWriter<'_>) -> Result<()> {
        for property in self.properties.in_order() {
            property.encode(value, writer)?;
        }
        Ok(())
    }

    fn decode_into(&self, reader: &mut FloatReader<'_>, target: &mut T) -> Result<()> {
        for property in self.properties.in_order() {
            property.decode_into(reader, target)?;
        }
        Ok(())
    }
}

/// Builds an [`ObjectDescriptor`] from `field: descriptor` pairs.
///
/// ```
/// use flatstate_core::codec::{encode_to_vec, float};
/// use flatstate_core::object_descriptor;
///
/// struct Point {
///     x: f64,
///     y: f64,
///     label: String,
/// }
///
/// let descriptor = object_descriptor!(Point { x: float(), y: float() });
/// let point = Point { x: 1.0, y: 2.0, label: "origin".to_string() };
/// assert_eq!(encode_to_vec(&descriptor, &point).unwrap(), vec![1.0, 2.0]);
/// # let _ = point.label;
/// ```
#[macro_export]
macro_rules! object_descriptor {
    ($ty:ty { $($field:ident : $descriptor:expr),* $(,)? }) => {
        $crate::codec::ObjectDescriptor::<$ty>::builder()
            $(
                .property(
                    stringify!($field),
                    $descriptor,
                    |value: &$ty| &value.$field,
                    |value: &mut $ty| &mut value.$field,
                )
            )*
            .build()
    };
}
