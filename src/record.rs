use crate::dtype::NpyScalar;
use crate::error::{NpyError, Result};

/// One column of a record: its label and on-disk type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// column name, empty for scalar streams
    pub label: String,
    /// numpy kind code, see `dtype`
    pub format_code: char,
    /// width in bytes
    pub byte_size: usize,
}

/// A value that can be written as one element of a `.npy` array.
///
/// Implemented for every [`NpyScalar`] (a single unnamed field) and for
/// tuples of up to twelve scalars (one field per tuple member).
pub trait Record {
    /// number of fields in the record
    const FIELD_COUNT: usize;

    /// `(format_code, byte_size)` of each field, in declaration order
    fn dtypes() -> Vec<(char, usize)>;

    /// copies each field into `slot` at the matching entry of `offsets`
    fn write_fields(&self, slot: &mut [u8], offsets: &[usize]);
}

impl<T: NpyScalar> Record for T {
    const FIELD_COUNT: usize = 1;

    fn dtypes() -> Vec<(char, usize)> {
        vec![(T::FORMAT_CODE, T::SIZE)]
    }

    #[inline]
    fn write_fields(&self, slot: &mut [u8], offsets: &[usize]) {
        let start = offsets[0];
        self.write_native(&mut slot[start..start + T::SIZE]);
    }
}

macro_rules! impl_record_tuple {
    ($n:expr; $($name:ident : $idx:tt),+) => {
        impl<$($name: NpyScalar),+> Record for ($($name,)+) {
            const FIELD_COUNT: usize = $n;

            fn dtypes() -> Vec<(char, usize)> {
                vec![$(($name::FORMAT_CODE, $name::SIZE)),+]
            }

            #[inline]
            fn write_fields(&self, slot: &mut [u8], offsets: &[usize]) {
                $(
                    let start = offsets[$idx];
                    self.$idx.write_native(&mut slot[start..start + $name::SIZE]);
                )+
            }
        }
    };
}

impl_record_tuple!(1; A: 0);
impl_record_tuple!(2; A: 0, B: 1);
impl_record_tuple!(3; A: 0, B: 1, C: 2);
impl_record_tuple!(4; A: 0, B: 1, C: 2, D: 3);
impl_record_tuple!(5; A: 0, B: 1, C: 2, D: 3, E: 4);
impl_record_tuple!(6; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_record_tuple!(7; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_record_tuple!(8; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
impl_record_tuple!(9; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
impl_record_tuple!(10; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
impl_record_tuple!(11; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
impl_record_tuple!(12; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);

/// Byte layout of one record: field descriptors plus their offsets
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    fields: Vec<FieldDescriptor>,
    offsets: Vec<usize>,
    record_size: usize,
    structured: bool,
}

impl RecordLayout {
    /// layout of a plain, unlabelled array of one type
    pub fn scalar(format_code: char, byte_size: usize) -> Self {
        RecordLayout {
            fields: vec![FieldDescriptor {
                label: String::new(),
                format_code,
                byte_size,
            }],
            offsets: vec![0],
            record_size: byte_size,
            structured: false,
        }
    }

    /// layout of a structured array, fields packed in the given order
    pub fn structured(fields: Vec<FieldDescriptor>) -> Self {
        let mut offsets = Vec::with_capacity(fields.len());
        let mut record_size = 0;
        for field in &fields {
            offsets.push(record_size);
            record_size += field.byte_size;
        }
        RecordLayout {
            fields,
            offsets,
            record_size,
            structured: true,
        }
    }

    /// Layout for `R` without explicit labels.
    ///
    /// A single-field record is written as a plain array, wider records
    /// become structured with fields named `f0`, `f1`, ...
    pub fn of<R: Record>() -> Self {
        let dtypes = R::dtypes();
        if dtypes.len() == 1 {
            let (format_code, byte_size) = dtypes[0];
            return RecordLayout::scalar(format_code, byte_size);
        }
        let fields = dtypes
            .into_iter()
            .enumerate()
            .map(|(i, (format_code, byte_size))| FieldDescriptor {
                label: format!("f{}", i),
                format_code,
                byte_size,
            })
            .collect();
        RecordLayout::structured(fields)
    }

    /// Structured layout for `R` with one label per field.
    ///
    /// An empty label list falls back to [`RecordLayout::of`] for
    /// single-field records.
    pub fn labelled<R: Record, S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        if labels.is_empty() && R::FIELD_COUNT == 1 {
            return Ok(RecordLayout::of::<R>());
        }
        if labels.len() != R::FIELD_COUNT {
            return Err(NpyError::LabelMismatch {
                labels: labels.len(),
                fields: R::FIELD_COUNT,
            });
        }
        let fields = labels
            .iter()
            .zip(R::dtypes())
            .map(|(label, (format_code, byte_size))| FieldDescriptor {
                label: label.as_ref().to_owned(),
                format_code,
                byte_size,
            })
            .collect();
        Ok(RecordLayout::structured(fields))
    }

    /// field descriptors in on-disk order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// byte offset of each field within a record
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// total bytes per record
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// whether the header describes named fields
    pub fn is_structured(&self) -> bool {
        self.structured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;

    #[test]
    fn should_compute_prefix_sum_offsets() {
        let layout = RecordLayout::of::<(u8, f64, i16, Complex<f32>)>();
        assert_eq!(layout.offsets(), &[0, 1, 9, 11]);
        assert_eq!(layout.record_size(), 1 + 8 + 2 + 8);
        assert!(layout.is_structured());
    }

    #[test]
    fn should_auto_label_wide_records() {
        let layout = RecordLayout::of::<(i32, f32, u64)>();
        let labels: Vec<&str> = layout.fields().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["f0", "f1", "f2"]);
    }

    #[test]
    fn should_treat_single_field_as_scalar() {
        let layout = RecordLayout::of::<f64>();
        assert!(!layout.is_structured());
        assert_eq!(layout.fields()[0].label, "");
        assert_eq!(layout.record_size(), 8);

        let layout = RecordLayout::of::<(u16,)>();
        assert!(!layout.is_structured());
    }

    #[test]
    fn should_keep_single_labelled_field_structured() {
        let layout = RecordLayout::labelled::<f32, _>(&["x"]).unwrap();
        assert!(layout.is_structured());
        assert_eq!(
            layout.fields(),
            &[FieldDescriptor {
                label: "x".to_owned(),
                format_code: 'f',
                byte_size: 4
            }]
        );
    }

    #[test]
    fn should_reject_wrong_label_count() {
        match RecordLayout::labelled::<(i32, i32), _>(&["a"]) {
            Err(NpyError::LabelMismatch { labels: 1, fields: 2 }) => (),
            other => panic!("unexpected {:?}", other),
        }
        assert!(RecordLayout::labelled::<(i32, i32), &str>(&[]).is_err());
    }

    #[test]
    fn should_write_fields_at_offsets() {
        let layout = RecordLayout::of::<(u8, u32)>();
        let mut slot = vec![0u8; layout.record_size()];
        (7u8, 0xAABB_CCDDu32).write_fields(&mut slot, layout.offsets());
        assert_eq!(slot[0], 7);
        assert_eq!(&slot[1..], &0xAABB_CCDDu32.to_ne_bytes());
    }
}
