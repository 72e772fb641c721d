//! Zero-copy typed views over packed per-sample FORMAT data.
//!
//! Every record keeps all of its FORMAT values in one shared allocation. A
//! field occupies a contiguous block of `stride * sample_count` bytes starting
//! at its offset; sample `i` starts at `offset + i * stride` and holds
//! `stride / width` little-endian values.
//!
//! Views hold a strong reference to the allocation, so they stay valid after the
//! record that produced them is dropped. Writes through a view land in the shared
//! buffer and are visible to the record and to every other view over it.

use crate::error::{Result, VcfError};
use std::cell::RefCell;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::rc::Rc;

/// Missing value marker for 16-bit integer storage.
pub const INT16_MISSING: i16 = i16::MIN;
/// End-of-vector padding for 16-bit integer storage.
pub const INT16_END_OF_VECTOR: i16 = i16::MIN + 1;
/// Missing value marker for 32-bit integer storage.
pub const INT32_MISSING: i32 = i32::MIN;
/// End-of-vector padding for 32-bit integer storage.
pub const INT32_END_OF_VECTOR: i32 = i32::MIN + 1;
/// Bit pattern of the missing float (a signalling NaN).
pub const FLOAT32_MISSING_BITS: u32 = 0x7F80_0001;
/// Bit pattern of the float end-of-vector padding.
pub const FLOAT32_END_OF_VECTOR_BITS: u32 = 0x7F80_0002;
/// Missing allele in genotype storage.
pub const UINT8_MISSING: u8 = 0;
/// End-of-vector padding for genotype storage.
pub const UINT8_END_OF_VECTOR: u8 = 0x81;
/// Padding after the last character of a character value.
pub const CHAR_END_OF_VECTOR: u8 = 0;

/// The smallest 16-bit value that is not reserved for a sentinel.
const INT16_MIN_VALUE: i32 = i16::MIN as i32 + 8;

/// Storage type of a packed FORMAT field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    UInt8,
    Int16,
    Int32,
    Float32,
    Char,
}

impl ValueType {
    /// Byte width of one value.
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            ValueType::UInt8 | ValueType::Char => 1,
            ValueType::Int16 => 2,
            ValueType::Int32 | ValueType::Float32 => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ValueType::UInt8 => "uint8",
            ValueType::Int16 => "int16",
            ValueType::Int32 => "int32",
            ValueType::Float32 => "float32",
            ValueType::Char => "char",
        }
    }

    /// Narrowest integer storage holding every value in `min..=max`.
    pub fn for_integer_range(min: i32, max: i32) -> Self {
        if min >= INT16_MIN_VALUE && max <= i16::MAX as i32 {
            ValueType::Int16
        } else {
            ValueType::Int32
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust value type that can be decoded from, and encoded into, packed storage.
///
/// Each implementation is one row of the decode/encode table: which storage types
/// it may be read from and how the bytes map to the value.
pub trait FieldValue: Copy + fmt::Debug {
    /// Name used in type-mismatch errors.
    const NAME: &'static str;

    /// Whether values of this type can be read from `storage`.
    fn accepts(storage: ValueType) -> bool;

    /// Decode one value. `bytes` is exactly `storage.width()` long.
    fn decode(storage: ValueType, bytes: &[u8]) -> Self;

    /// Encode into `out` (exactly `storage.width()` long). Returns false when the
    /// value cannot be represented in `storage`.
    fn encode(self, storage: ValueType, out: &mut [u8]) -> bool;

    fn is_missing(self) -> bool;

    fn is_end_of_vector(self) -> bool;
}

impl FieldValue for u8 {
    const NAME: &'static str = "u8";

    #[inline]
    fn accepts(storage: ValueType) -> bool {
        matches!(storage, ValueType::UInt8 | ValueType::Char)
    }

    // One-byte storage: the stored byte is the value.
    #[inline(always)]
    fn decode(_storage: ValueType, bytes: &[u8]) -> Self {
        bytes[0]
    }

    #[inline(always)]
    fn encode(self, _storage: ValueType, out: &mut [u8]) -> bool {
        out[0] = self;
        true
    }

    fn is_missing(self) -> bool {
        self == UINT8_MISSING
    }

    fn is_end_of_vector(self) -> bool {
        self == UINT8_END_OF_VECTOR
    }
}

impl FieldValue for i16 {
    const NAME: &'static str = "i16";

    #[inline]
    fn accepts(storage: ValueType) -> bool {
        storage == ValueType::Int16
    }

    #[inline]
    fn decode(_storage: ValueType, bytes: &[u8]) -> Self {
        i16::from_le_bytes([bytes[0], bytes[1]])
    }

    #[inline]
    fn encode(self, _storage: ValueType, out: &mut [u8]) -> bool {
        out.copy_from_slice(&self.to_le_bytes());
        true
    }

    fn is_missing(self) -> bool {
        self == INT16_MISSING
    }

    fn is_end_of_vector(self) -> bool {
        self == INT16_END_OF_VECTOR
    }
}

impl FieldValue for i32 {
    const NAME: &'static str = "i32";

    #[inline]
    fn accepts(storage: ValueType) -> bool {
        matches!(storage, ValueType::Int16 | ValueType::Int32)
    }

    /// 16-bit sentinels widen to their 32-bit counterparts.
    #[inline]
    fn decode(storage: ValueType, bytes: &[u8]) -> Self {
        match storage {
            ValueType::Int16 => match i16::from_le_bytes([bytes[0], bytes[1]]) {
                INT16_MISSING => INT32_MISSING,
                INT16_END_OF_VECTOR => INT32_END_OF_VECTOR,
                v => v as i32,
            },
            _ => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }

    #[inline]
    fn encode(self, storage: ValueType, out: &mut [u8]) -> bool {
        match storage {
            ValueType::Int16 => {
                let narrow = match self {
                    INT32_MISSING => INT16_MISSING,
                    INT32_END_OF_VECTOR => INT16_END_OF_VECTOR,
                    v if (INT16_MIN_VALUE..=i16::MAX as i32).contains(&v) => v as i16,
                    _ => return false,
                };
                out.copy_from_slice(&narrow.to_le_bytes());
                true
            }
            _ => {
                out.copy_from_slice(&self.to_le_bytes());
                true
            }
        }
    }

    fn is_missing(self) -> bool {
        self == INT32_MISSING
    }

    fn is_end_of_vector(self) -> bool {
        self == INT32_END_OF_VECTOR
    }
}

impl FieldValue for f32 {
    const NAME: &'static str = "f32";

    #[inline]
    fn accepts(storage: ValueType) -> bool {
        storage == ValueType::Float32
    }

    #[inline]
    fn decode(_storage: ValueType, bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn encode(self, _storage: ValueType, out: &mut [u8]) -> bool {
        out.copy_from_slice(&self.to_le_bytes());
        true
    }

    fn is_missing(self) -> bool {
        self.to_bits() == FLOAT32_MISSING_BITS
    }

    fn is_end_of_vector(self) -> bool {
        self.to_bits() == FLOAT32_END_OF_VECTOR_BITS
    }
}

/// Reference-counted packed sample buffer shared by a record and its views.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer(Rc<RefCell<Vec<u8>>>);

impl SampleBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Rc::new(RefCell::new(bytes)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live handles (record plus views) to the allocation.
    pub fn owners(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Whether both handles point at the same bytes.
    pub fn shares_allocation(&self, other: &SampleBuffer) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Copy of the raw bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    #[inline]
    fn read<T: FieldValue>(&self, storage: ValueType, at: usize) -> T {
        let bytes = self.0.borrow();
        T::decode(storage, &bytes[at..at + storage.width()])
    }

    #[inline]
    fn write<T: FieldValue>(&self, storage: ValueType, at: usize, value: T) -> bool {
        let mut bytes = self.0.borrow_mut();
        value.encode(storage, &mut bytes[at..at + storage.width()])
    }

    fn read_bytes(&self, at: usize, len: usize) -> Vec<u8> {
        self.0.borrow()[at..at + len].to_vec()
    }
}

/// Location and layout of one FORMAT field inside a record's sample buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatField {
    id: Rc<str>,
    value_type: ValueType,
    stride: usize,
    offset: usize,
}

impl FormatField {
    /// Layout of a field stored at `offset` with `stride` bytes per sample.
    pub fn new(id: &str, value_type: ValueType, stride: usize, offset: usize) -> Self {
        Self {
            id: Rc::from(id),
            value_type,
            stride,
            offset,
        }
    }

    /// FORMAT key.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Bytes per sample.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Byte offset of sample 0.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn values_per_sample(&self) -> usize {
        self.stride / self.value_type.width()
    }

    /// Check that `sample_count` samples of this field lie inside a buffer of
    /// `buffer_len` bytes.
    pub fn check_layout(&self, sample_count: usize, buffer_len: usize) -> Result<()> {
        if self.stride % self.value_type.width() != 0 {
            return Err(VcfError::MalformedRecord(format!(
                "FORMAT field {} has stride {} which is not a multiple of the {} width",
                self.id, self.stride, self.value_type
            )));
        }
        let end = self
            .stride
            .checked_mul(sample_count)
            .and_then(|n| n.checked_add(self.offset));
        match end {
            Some(end) if end <= buffer_len => Ok(()),
            _ => Err(VcfError::MalformedRecord(format!(
                "FORMAT field {} needs {} x {} bytes at offset {} but the sample buffer holds {}",
                self.id, self.stride, sample_count, self.offset, buffer_len
            ))),
        }
    }
}

/// Random-access typed view over one FORMAT field of one record.
///
/// `value_at` / `set_at` address the first value of a sample; the `element`
/// variants address the other values of multi-valued fields (AD, PL, ...).
#[derive(Debug, Clone)]
pub struct FieldView<T> {
    buffer: SampleBuffer,
    field: FormatField,
    sample_count: usize,
    _marker: PhantomData<T>,
}

impl<T: FieldValue> FieldView<T> {
    /// Bind a view to `field` inside `buffer`.
    ///
    /// Fails with `TypeMismatch` when `T` cannot be read from the field's storage
    /// type and with `MalformedRecord` when the field does not fit the buffer.
    pub fn new(buffer: SampleBuffer, field: FormatField, sample_count: usize) -> Result<Self> {
        if !T::accepts(field.value_type) {
            return Err(VcfError::TypeMismatch {
                field: field.id().to_string(),
                stored: field.value_type,
                requested: T::NAME,
            });
        }
        field.check_layout(sample_count, buffer.len())?;
        Ok(Self {
            buffer,
            field,
            sample_count,
            _marker: PhantomData,
        })
    }

    /// FORMAT key of the viewed field.
    pub fn id(&self) -> &str {
        self.field.id()
    }

    /// Layout of the viewed field.
    pub fn field(&self) -> &FormatField {
        &self.field
    }

    /// Storage type of the viewed field.
    pub fn value_type(&self) -> ValueType {
        self.field.value_type
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.sample_count
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Number of values stored per sample.
    pub fn values_per_sample(&self) -> usize {
        self.field.values_per_sample()
    }

    /// The shared buffer this view reads and writes.
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    #[inline]
    fn locate(&self, sample: usize, element: usize) -> Result<usize> {
        if sample >= self.sample_count {
            return Err(VcfError::OutOfRange {
                index: sample,
                len: self.sample_count,
            });
        }
        let per_sample = self.values_per_sample();
        if element >= per_sample {
            return Err(VcfError::OutOfRange {
                index: element,
                len: per_sample,
            });
        }
        Ok(self.field.offset + sample * self.field.stride + element * self.field.value_type.width())
    }

    /// First value of `sample`.
    #[inline]
    pub fn value_at(&self, sample: usize) -> Result<T> {
        self.element_at(sample, 0)
    }

    /// Overwrite the first value of `sample` in the shared buffer.
    #[inline]
    pub fn set_at(&self, sample: usize, value: T) -> Result<()> {
        self.set_element_at(sample, 0, value)
    }

    /// Value `element` of `sample`.
    pub fn element_at(&self, sample: usize, element: usize) -> Result<T> {
        let at = self.locate(sample, element)?;
        Ok(self.buffer.read(self.field.value_type, at))
    }

    /// Overwrite value `element` of `sample`.
    pub fn set_element_at(&self, sample: usize, element: usize, value: T) -> Result<()> {
        let at = self.locate(sample, element)?;
        if self.buffer.write(self.field.value_type, at, value) {
            Ok(())
        } else {
            Err(VcfError::Unrepresentable {
                field: self.field.id().to_string(),
                stored: self.field.value_type,
            })
        }
    }

    /// Whether the first value of `sample` is the missing sentinel.
    pub fn is_missing_at(&self, sample: usize) -> Result<bool> {
        self.value_at(sample).map(FieldValue::is_missing)
    }

    /// The values of one sample, up to its end-of-vector padding.
    pub fn sample(&self, sample: usize) -> Result<SampleValues<'_, T>> {
        self.locate(sample, 0)?;
        let width = self.values_per_sample();
        let len = (0..width)
            .position(|j| {
                self.buffer
                    .read::<T>(self.field.value_type, self.slot(sample, j))
                    .is_end_of_vector()
            })
            .unwrap_or(width);
        Ok(SampleValues {
            view: self,
            sample,
            front: 0,
            back: len,
        })
    }

    #[inline]
    fn slot(&self, sample: usize, element: usize) -> usize {
        self.field.offset + sample * self.field.stride + element * self.field.value_type.width()
    }

    /// First value of every sample, in sample order.
    pub fn iter(&self) -> FieldIter<'_, T> {
        FieldIter {
            view: self,
            front: 0,
            back: self.sample_count,
        }
    }

    /// First value of every sample.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl FieldView<u8> {
    /// Character value of `sample` without its trailing padding.
    pub fn string_at(&self, sample: usize) -> Result<String> {
        let at = self.locate(sample, 0)?;
        let bytes = self.buffer.read_bytes(at, self.field.stride);
        let end = memchr::memchr(CHAR_END_OF_VECTOR, &bytes).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

impl<'a, T: FieldValue> IntoIterator for &'a FieldView<T> {
    type Item = T;
    type IntoIter = FieldIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the first value of each sample.
#[derive(Debug, Clone)]
pub struct FieldIter<'a, T> {
    view: &'a FieldView<T>,
    front: usize,
    back: usize,
}

impl<T: FieldValue> Iterator for FieldIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        let at = self.view.slot(self.front, 0);
        self.front += 1;
        Some(self.view.buffer.read(self.view.field.value_type, at))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<T> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<T: FieldValue> DoubleEndedIterator for FieldIter<'_, T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        let at = self.view.slot(self.back, 0);
        Some(self.view.buffer.read(self.view.field.value_type, at))
    }
}

impl<T: FieldValue> ExactSizeIterator for FieldIter<'_, T> {}
impl<T: FieldValue> FusedIterator for FieldIter<'_, T> {}

/// Iterator over the values of a single sample.
#[derive(Debug, Clone)]
pub struct SampleValues<'a, T> {
    view: &'a FieldView<T>,
    sample: usize,
    front: usize,
    back: usize,
}

impl<T: FieldValue> SampleValues<'_, T> {
    /// Number of values before the end-of-vector padding.
    pub fn len(&self) -> usize {
        self.back - self.front
    }

    pub fn is_empty(&self) -> bool {
        self.front >= self.back
    }
}

impl<T: FieldValue> Iterator for SampleValues<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        let at = self.view.slot(self.sample, self.front);
        self.front += 1;
        Some(self.view.buffer.read(self.view.field.value_type, at))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T: FieldValue> ExactSizeIterator for SampleValues<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn dp_view() -> FieldView<i32> {
        let buffer = SampleBuffer::new(vec![
            0x05, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        ]);
        let field = FormatField::new("DP", ValueType::Int32, 4, 0);
        FieldView::new(buffer, field, 3).unwrap()
    }

    #[test]
    fn test_decode_int32_samples() {
        let view = dp_view();
        assert_eq!(view.value_at(0).unwrap(), 5);
        assert_eq!(view.value_at(1).unwrap(), 10);
        assert_eq!(view.value_at(2).unwrap(), -1);
        assert_eq!(view.to_vec(), vec![5, 10, -1]);
    }

    #[test]
    fn test_out_of_range() {
        let view = dp_view();
        assert!(matches!(
            view.value_at(3),
            Err(VcfError::OutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            view.set_at(3, 1),
            Err(VcfError::OutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            view.element_at(0, 1),
            Err(VcfError::OutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_set_is_visible_through_other_views() {
        let view = dp_view();
        let other = view.clone();
        view.set_at(1, 42).unwrap();
        assert_eq!(other.value_at(1).unwrap(), 42);
        assert_eq!(view.value_at(0).unwrap(), 5);
        assert_eq!(view.value_at(2).unwrap(), -1);
        assert!(view.buffer().shares_allocation(other.buffer()));
    }

    #[test]
    fn test_type_mismatch() {
        let buffer = SampleBuffer::new(vec![0; 8]);
        let field = FormatField::new("DP", ValueType::Int32, 4, 0);
        let err = FieldView::<f32>::new(buffer, field, 2).unwrap_err();
        assert!(matches!(err, VcfError::TypeMismatch { requested: "f32", .. }));
    }

    #[test]
    fn test_layout_exceeding_buffer() {
        let buffer = SampleBuffer::new(vec![0; 7]);
        let field = FormatField::new("DP", ValueType::Int32, 4, 0);
        assert!(matches!(
            FieldView::<i32>::new(buffer, field, 2),
            Err(VcfError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_int16_widening_and_sentinels() {
        let mut bytes = Vec::new();
        for v in [7i16, INT16_MISSING, -3] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let buffer = SampleBuffer::new(bytes);
        let field = FormatField::new("GQ", ValueType::Int16, 2, 0);
        let wide = FieldView::<i32>::new(buffer.clone(), field.clone(), 3).unwrap();
        assert_eq!(wide.value_at(0).unwrap(), 7);
        assert_eq!(wide.value_at(1).unwrap(), INT32_MISSING);
        assert!(wide.is_missing_at(1).unwrap());
        assert_eq!(wide.value_at(2).unwrap(), -3);

        let narrow = FieldView::<i16>::new(buffer, field, 3).unwrap();
        assert_eq!(narrow.value_at(1).unwrap(), INT16_MISSING);

        assert!(matches!(
            wide.set_at(0, 100_000),
            Err(VcfError::Unrepresentable { .. })
        ));
        wide.set_at(0, 300).unwrap();
        assert_eq!(narrow.value_at(0).unwrap(), 300);
    }

    #[test]
    fn test_multi_value_samples() {
        let mut bytes = Vec::new();
        for v in [10i32, 2, 8, INT32_END_OF_VECTOR] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let buffer = SampleBuffer::new(bytes);
        let field = FormatField::new("AD", ValueType::Int32, 8, 0);
        let view = FieldView::<i32>::new(buffer, field, 2).unwrap();

        assert_eq!(view.values_per_sample(), 2);
        assert_eq!(view.sample(0).unwrap().collect::<Vec<_>>(), vec![10, 2]);
        assert_eq!(view.sample(1).unwrap().collect::<Vec<_>>(), vec![8]);
        assert_eq!(view.element_at(0, 1).unwrap(), 2);

        view.set_element_at(0, 1, 5).unwrap();
        assert_eq!(view.sample(0).unwrap().collect::<Vec<_>>(), vec![10, 5]);
        assert_eq!(view.value_at(0).unwrap(), 10);
    }

    #[test]
    fn test_iteration_is_restartable_and_double_ended() {
        let view = dp_view();
        let forward: Vec<i32> = view.iter().collect();
        let again: Vec<i32> = (&view).into_iter().collect();
        assert_eq!(forward, again);
        let backward: Vec<i32> = view.iter().rev().collect();
        assert_eq!(backward, vec![-1, 10, 5]);
        assert_eq!(view.iter().len(), 3);
    }

    #[test]
    fn test_char_strings() {
        let buffer = SampleBuffer::new(b"ab\0xyz".to_vec());
        let field = FormatField::new("FT", ValueType::Char, 3, 0);
        let view = FieldView::<u8>::new(buffer, field, 2).unwrap();
        assert_eq!(view.string_at(0).unwrap(), "ab");
        assert_eq!(view.string_at(1).unwrap(), "xyz");
        assert_eq!(view.value_at(1).unwrap(), b'x');
    }

    #[test]
    fn test_float_missing() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend_from_slice(&FLOAT32_MISSING_BITS.to_le_bytes());
        let buffer = SampleBuffer::new(bytes);
        let field = FormatField::new("GL", ValueType::Float32, 4, 0);
        let view = FieldView::<f32>::new(buffer, field, 2).unwrap();
        assert_eq!(view.value_at(0).unwrap(), 1.5);
        assert!(view.is_missing_at(1).unwrap());
    }

    #[test]
    fn test_integer_range_storage() {
        assert_eq!(ValueType::for_integer_range(0, 99), ValueType::Int16);
        assert_eq!(ValueType::for_integer_range(-32_760, 32_767), ValueType::Int16);
        assert_eq!(ValueType::for_integer_range(-32_761, 0), ValueType::Int32);
        assert_eq!(ValueType::for_integer_range(0, 40_000), ValueType::Int32);
    }
}
