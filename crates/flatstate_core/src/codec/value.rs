//! Composites rebuilt through a constructor, for types that are not updated in place.

use super::{DecodeContract, Descriptor, FloatReader, FloatWriter, PropertyGroups, Size};
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

trait ValueProperty<T, P>: Send + Sync {
    fn name(&self) -> &'static str;
    fn size(&self) -> Size;
    fn live_size(&self, value: &T) -> usize;
    fn encode(&self, value: &T, writer: &mut FloatWriter<'_>) -> Result<()>;
    fn decode(&self, reader: &mut FloatReader<'_>, source: &T, params: &mut P) -> Result<()>;
}

struct Property<D, A, S> {
    name: &'static str,
    descriptor: D,
    accessor: A,
    assign: S,
}

impl<T, P, D, A, S> ValueProperty<T, P> for Property<D, A, S>
where
    D: Descriptor + Send + Sync,
    A: Fn(&T) -> D::Value + Send + Sync,
    S: Fn(&mut P, D::Value) + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn size(&self) -> Size {
        self.descriptor.size()
    }

    fn live_size(&self, value: &T) -> usize {
        match self.descriptor.size() {
            Size::Fixed(size) => size,
            Size::Dynamic => self.descriptor.live_size(&(self.accessor)(value)),
        }
    }

    fn encode(&self, value: &T, writer: &mut FloatWriter<'_>) -> Result<()> {
        self.descriptor.encode(&(self.accessor)(value), writer)
    }

    fn decode(&self, reader: &mut FloatReader<'_>, source: &T, params: &mut P) -> Result<()> {
        let decoded = self.descriptor.decode(reader, (self.accessor)(source))?;
        (self.assign)(params, decoded);
        Ok(())
    }
}

/// Descriptor for a type built from a parameter bag `P` by a constructor.
///
/// Decoding reads every property against the current value's extraction,
/// fills a fresh `P::default()` and calls the constructor; the decoded-into
/// value is replaced, never modified field by field.
pub struct ValueDescriptor<T, P> {
    constructor: Arc<dyn Fn(P) -> T + Send + Sync>,
    properties: PropertyGroups<dyn ValueProperty<T, P>>,
}

pub struct ValueDescriptorBuilder<T, P> {
    constructor: Arc<dyn Fn(P) -> T + Send + Sync>,
    properties: Vec<Arc<dyn ValueProperty<T, P>>>,
}

impl<T: 'static, P: Default + 'static> ValueDescriptor<T, P> {
    pub fn builder<C>(constructor: C) -> ValueDescriptorBuilder<T, P>
    where
        C: Fn(P) -> T + Send + Sync + 'static,
    {
        ValueDescriptorBuilder {
            constructor: Arc::new(constructor),
            properties: Vec::new(),
        }
    }

    /// Property names in serialization order.
    pub fn property_names(&self) -> Vec<&'static str> {
        self.properties.in_order().map(|p| p.name()).collect()
    }
}

impl<T: 'static, P: Default + 'static> ValueDescriptorBuilder<T, P> {
    /// Declares a property extracted by `accessor` and written into the
    /// constructor parameters by `assign`.
    pub fn property<D, A, S>(
        mut self,
        name: &'static str,
        descriptor: D,
        accessor: A,
        assign: S,
    ) -> Self
    where
        D: Descriptor + Send + Sync + 'static,
        A: Fn(&T) -> D::Value + Send + Sync + 'static,
        S: Fn(&mut P, D::Value) + Send + Sync + 'static,
    {
        self.properties.push(Arc::new(Property {
            name,
            descriptor,
            accessor,
            assign,
        }));
        self
    }

    pub fn build(self) -> ValueDescriptor<T, P> {
        ValueDescriptor {
            constructor: self.constructor,
            properties: PropertyGroups::partition(self.properties, |p| p.size()),
        }
    }
}

impl<T, P> Clone for ValueDescriptor<T, P> {
    fn clone(&self) -> Self {
        Self {
            constructor: Arc::clone(&self.constructor),
            properties: self.properties.clone(),
        }
    }
}

impl<T: 'static, P: Default + 'static> fmt::Debug for ValueDescriptor<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueDescriptor")
            .field("properties", &self.property_names())
            .field("size", &self.properties.size())
            .finish()
    }
}

impl<T: 'static, P: Default + 'static> Descriptor for ValueDescriptor<T, P> {
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
        DecodeContract::Reconstruct
    }

    fn encode(&self, value: &T, writer: &mut FloatWriter<'_>) -> Result<()> {
        for property in self.properties.in_order() {
            property.encode(value, writer)?;
        }
        Ok(())
    }

    fn decode_into(&self, reader: &mut FloatReader<'_>, target: &mut T) -> Result<()> {
        let mut params = P::default();
        for property in self.properties.in_order() {
            property.decode(reader, target, &mut params)?;
        }
        *target = (self.constructor)(params);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{array, decode_from_buffer, encode_to_vec, fixed_array, float};
    use crate::object_descriptor;
    use std::rc::Rc;

    /// Immutable complex number, only reachable through accessors.
    #[derive(Debug, Clone, PartialEq)]
    struct Complex {
        re: f64,
        im: f64,
    }

    impl Complex {
        fn new(re: f64, im: f64) -> Self {
            Self { re, im }
        }

        fn re(&self) -> f64 {
            self.re
        }

        fn im(&self) -> f64 {
            self.im
        }
    }

    #[derive(Default)]
    struct ComplexParams {
        re: f64,
        im: f64,
    }

    fn complex_descriptor() -> ValueDescriptor<Complex, ComplexParams> {
        ValueDescriptor::builder(|p: ComplexParams| Complex::new(p.re, p.im))
            .property("re", float(), Complex::re, |p: &mut ComplexParams, v| p.re = v)
            .property("im", float(), Complex::im, |p: &mut ComplexParams, v| p.im = v)
            .build()
    }

    #[test]
    fn value_descriptor_reconstructs() {
        let descriptor = complex_descriptor();
        assert_eq!(descriptor.size(), Size::Fixed(2));
        assert_eq!(descriptor.contract(), DecodeContract::Reconstruct);

        let original = Complex::new(1.0, -1.0);
        let encoded = encode_to_vec(&descriptor, &original).expect("encode should succeed");
        assert_eq!(encoded, vec![1.0, -1.0]);

        let decoded = decode_from_buffer(&descriptor, &vec![2.0, 3.0], original.clone())
            .expect("decode should succeed");
        assert_eq!(decoded, Complex::new(2.0, 3.0));
        assert_eq!(original, Complex::new(1.0, -1.0));
    }

    #[test]
    fn shared_instances_are_not_mutated() {
        let descriptor = ValueDescriptor::builder(|p: ComplexParams| Rc::new(Complex::new(p.re, p.im)))
            .property("re", float(), |c: &Rc<Complex>| c.re(), |p: &mut ComplexParams, v| p.re = v)
            .property("im", float(), |c: &Rc<Complex>| c.im(), |p: &mut ComplexParams, v| p.im = v)
            .build();
        let shared = Rc::new(Complex::new(1.0, 2.0));
        let decoded = decode_from_buffer(&descriptor, &vec![5.0, 6.0], Rc::clone(&shared))
            .expect("decode should succeed");
        assert_eq!(*decoded, Complex::new(5.0, 6.0));
        assert_eq!(*shared, Complex::new(1.0, 2.0));
        assert!(!Rc::ptr_eq(&decoded, &shared));
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Polyline {
        weight: f64,
        points: Vec<Complex>,
    }

    #[derive(Default)]
    struct PolylineParams {
        weight: f64,
        points: Vec<Complex>,
    }

    #[test]
    fn dynamic_properties_decode_against_extraction() {
        let descriptor = ValueDescriptor::builder(|p: PolylineParams| Polyline {
            weight: p.weight,
            points: p.points,
        })
        .property(
            "points",
            array(complex_descriptor()),
            |l: &Polyline| l.points.clone(),
            |p: &mut PolylineParams, v| p.points = v,
        )
        .property(
            "weight",
            float(),
            |l: &Polyline| l.weight,
            |p: &mut PolylineParams, v| p.weight = v,
        )
        .build();
        assert_eq!(descriptor.property_names(), vec!["weight", "points"]);
        assert_eq!(descriptor.size(), Size::Dynamic);

        let line = Polyline {
            weight: 0.5,
            points: vec![Complex::new(1.0, 2.0), Complex::new(3.0, 4.0)],
        };
        assert_eq!(descriptor.live_size(&line), 5);
        let encoded = encode_to_vec(&descriptor, &line).expect("encode should succeed");
        assert_eq!(encoded, vec![0.5, 1.0, 2.0, 3.0, 4.0]);

        let decoded = decode_from_buffer(&descriptor, &vec![1.5, 0.0, 0.0, -1.0, -1.0], line)
            .expect("decode should succeed");
        assert_eq!(decoded.weight, 1.5);
        assert_eq!(
            decoded.points,
            vec![Complex::new(0.0, 0.0), Complex::new(-1.0, -1.0)]
        );
    }

    #[test]
    fn values_compose_inside_objects_and_arrays() {
        #[derive(Debug, Clone, PartialEq)]
        struct Signal {
            gain: f64,
            samples: Vec<Complex>,
        }
        let descriptor = object_descriptor!(Signal {
            samples: fixed_array(complex_descriptor(), 2),
            gain: float(),
        });
        assert_eq!(descriptor.size(), Size::Fixed(5));
        assert_eq!(descriptor.property_names(), vec!["samples", "gain"]);

        let template = Signal {
            gain: 0.0,
            samples: vec![Complex::new(0.0, 0.0); 2],
        };
        let decoded = decode_from_buffer(&descriptor, &vec![1.0, 2.0, 3.0, 4.0, 9.0], template)
            .expect("decode should succeed");
        assert_eq!(
            decoded,
            Signal {
                gain: 9.0,
                samples: vec![Complex::new(1.0, 2.0), Complex::new(3.0, 4.0)],
            }
        );
    }
}
