use flatstate_core::traits::FloatBuffer;
use js_sys::Float64Array;

/// Flat buffer backed by a JS `Float64Array`, so integrator stages stay on the JS heap.
#[derive(Debug, Clone)]
pub struct Float64Buffer(Float64Array);

impl Float64Buffer {
    pub fn new(array: Float64Array) -> Self {
        Self(array)
    }

    pub fn as_array(&self) -> &Float64Array {
        &self.0
    }

    pub fn into_inner(self) -> Float64Array {
        self.0
    }

    /// Copies the buffer into a new, independent `Float64Array`.
    pub fn detached_copy(&self) -> Float64Array {
        self.0.slice(0, self.0.length())
    }

    /// Same contents backed by a fresh `Float64Array`.
    pub fn detached(&self) -> Self {
        Self(self.detached_copy())
    }
}

/// Converts a buffer length or index to the `u32` JS typed arrays are indexed by.
///
/// # Panics
///
/// Panics when `value` exceeds `u32::MAX`. A `Float64Array` cannot hold that
/// many floats, so such a buffer could never be allocated.
fn typed_array_index(value: usize) -> u32 {
    u32::try_from(value)
        .unwrap_or_else(|_| panic!("Float64Array cannot address {value} floats (limit u32::MAX)"))
}

impl FloatBuffer for Float64Buffer {
    fn allocate(len: usize) -> Self {
        Self(Float64Array::new_with_length(typed_array_index(len)))
    }

    fn len(&self) -> usize {
        self.0.length() as usize
    }

    fn get(&self, index: usize) -> f64 {
        self.0.get_index(typed_array_index(index))
    }

    fn put(&mut self, index: usize, value: f64) {
        self.0.set_index(typed_array_index(index), value);
    }

    fn from_canonical(values: &[f64]) -> Self {
        Self(Float64Array::from(values))
    }

    fn to_canonical(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}
