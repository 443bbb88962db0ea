//!
//! Header codec for the `.npy` format, version 1.0
//!
//! Header layout:
//! Offset 00: ([u8; 6]) magic value 0x93 "NUMPY"
//! Offset 06: (u8) major version, 1
//! Offset 07: (u8) minor version, 0
//! Offset 08: (u16, little endian) length L of the dict text
//! Offset 10: ([u8; L]) python dict literal, space padded, ends with '\n'
//! Offset 10 + L: -- records --
//!
//! `10 + L` is always a multiple of 16.
//!
//! Dict text:
//!     scalar:     {'descr': '<i4', 'fortran_order': False, 'shape': (3,), }
//!     structured: {'descr': [('a', '<i4'), ('b', '<f8')], 'fortran_order': False, 'shape': (3,), }

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use std::iter;

use crate::dtype::type_str;
use crate::error::{NpyError, Result};
use crate::record::RecordLayout;

static MAGIC_VALUE: &[u8] = &[0x93, 0x4E, 0x55, 0x4D, 0x50, 0x59]; // \x93NUMPY
const VERSION_MAJOR: u8 = 0x01;
const VERSION_MINOR: u8 = 0x00;
/// magic, version and dict length
pub const PREAMBLE_LEN: usize = 10;
/// offset of the 2-byte dict length field
pub const DICT_LEN_OFFSET: usize = 8;
const ALIGNMENT: usize = 16;
const MAX_DICT_LEN: usize = 0xFFFF;

/// Memory layout flag written to `fortran_order`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryOrder {
    /// C order, last index varies fastest
    RowMajor,
    /// Fortran order, first index varies fastest
    ColumnMajor,
}

impl Default for MemoryOrder {
    fn default() -> Self {
        MemoryOrder::RowMajor
    }
}

impl MemoryOrder {
    fn as_py_bool(self) -> &'static str {
        match self {
            MemoryOrder::RowMajor => "False",
            MemoryOrder::ColumnMajor => "True",
        }
    }
}

/// python tuple literal, `(3,)` for one dimension and `(2, 3)` otherwise
fn shape_literal(shape: &[u64]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    if dims.len() == 1 {
        format!("({},)", dims[0])
    } else {
        format!("({})", dims.join(", "))
    }
}

fn push_tail(dict: &mut String, shape: &[u64], memory_order: MemoryOrder) {
    dict.push_str(", 'fortran_order': ");
    dict.push_str(memory_order.as_py_bool());
    dict.push_str(", 'shape': ");
    dict.push_str(&shape_literal(shape));
    dict.push_str(", }");
}

/// Header for an unlabelled array of a single type
pub fn create_scalar_header(
    shape: &[u64],
    format_code: char,
    byte_size: usize,
    memory_order: MemoryOrder,
) -> Result<Vec<u8>> {
    let mut dict = String::from("{'descr': '");
    dict.push_str(&type_str(format_code, byte_size));
    dict.push('\'');
    push_tail(&mut dict, shape, memory_order);

    finalize_header(dict.into_bytes())
}

/// Header for a structured array.
///
/// `labels`, `format_codes` and `byte_sizes` describe one field each and
/// must have the same length.
pub fn create_structured_header<S: AsRef<str>>(
    shape: &[u64],
    labels: &[S],
    format_codes: &[char],
    byte_sizes: &[usize],
    memory_order: MemoryOrder,
) -> Result<Vec<u8>> {
    if labels.len() != format_codes.len() || format_codes.len() != byte_sizes.len() {
        return Err(NpyError::DescriptorMismatch {
            labels: labels.len(),
            codes: format_codes.len(),
            sizes: byte_sizes.len(),
        });
    }

    let fields: Vec<String> = labels
        .iter()
        .zip(format_codes.iter().zip(byte_sizes))
        .map(|(label, (&code, &size))| {
            format!("('{}', '{}')", label.as_ref(), type_str(code, size))
        })
        .collect();

    let mut dict = String::from("{'descr': [");
    dict.push_str(&fields.join(", "));
    // a one-element list literal gets a trailing comma
    if fields.len() == 1 {
        dict.push(',');
    }
    dict.push(']');
    push_tail(&mut dict, shape, memory_order);

    finalize_header(dict.into_bytes())
}

/// Header describing `layout` with the given shape, row major
pub fn create_header(layout: &RecordLayout, shape: &[u64]) -> Result<Vec<u8>> {
    let fields = layout.fields();
    if layout.is_structured() {
        let labels: Vec<&str> = fields.iter().map(|f| f.label.as_str()).collect();
        let codes: Vec<char> = fields.iter().map(|f| f.format_code).collect();
        let sizes: Vec<usize> = fields.iter().map(|f| f.byte_size).collect();
        create_structured_header(shape, &labels, &codes, &sizes, MemoryOrder::RowMajor)
    } else {
        let field = &fields[0];
        create_scalar_header(shape, field.format_code, field.byte_size, MemoryOrder::RowMajor)
    }
}

/// Pads `dict` to the 16 byte boundary, terminates it with '\n' and
/// prepends magic, version and length.
pub fn finalize_header(mut dict: Vec<u8>) -> Result<Vec<u8>> {
    // always at least one byte so the newline never overwrites the dict
    let padding = ALIGNMENT - (PREAMBLE_LEN + dict.len()) % ALIGNMENT;
    dict.extend(iter::repeat(b' ').take(padding));
    if let Some(last) = dict.last_mut() {
        *last = b'\n';
    }

    if dict.len() > MAX_DICT_LEN {
        return Err(NpyError::HeaderTooLarge(dict.len()));
    }

    let mut header = Vec::with_capacity(PREAMBLE_LEN + dict.len());
    header.write_all(MAGIC_VALUE)?;
    header.write_u8(VERSION_MAJOR)?;
    header.write_u8(VERSION_MINOR)?;
    header.write_u16::<LittleEndian>(dict.len() as u16)?;
    header.extend_from_slice(&dict);

    Ok(header)
}

/// Writes the dict length of `header` into bytes 8 and 9, low byte first.
///
/// The length field is always little endian, whatever the host or the
/// record data use.
///
/// # Panics
///
/// Panics if `header` is shorter than the preamble or its dict does not fit
/// the 16-bit length field.
pub fn patch_dict_len(header: &mut [u8]) {
    assert!(
        header.len() >= PREAMBLE_LEN,
        "header of {} bytes is shorter than the {} byte preamble",
        header.len(),
        PREAMBLE_LEN
    );
    let dict_len = header.len() - PREAMBLE_LEN;
    assert!(
        dict_len <= MAX_DICT_LEN,
        "dict of {} bytes does not fit the length field",
        dict_len
    );
    header[DICT_LEN_OFFSET] = (dict_len % 0x100) as u8;
    header[DICT_LEN_OFFSET + 1] = (dict_len / 0x100) as u8;
}

/// Rebuilds the header of `layout` for `values_written` records, padded to
/// exactly `header_end_pos` bytes so it can overwrite the placeholder.
///
/// Panics if the rebuilt header is longer than `header_end_pos`: the data
/// already follows the reserved region and would be overwritten.
pub fn rewrite_header(
    header_end_pos: usize,
    values_written: u64,
    layout: &RecordLayout,
) -> Result<Vec<u8>> {
    let mut updated = create_header(layout, &[values_written])?;
    assert!(
        updated.len() <= header_end_pos,
        "rebuilt header is {} bytes but only {} were reserved",
        updated.len(),
        header_end_pos
    );

    let missing = header_end_pos - updated.len();
    let newline = updated.split_off(updated.len() - 1);
    updated.extend(iter::repeat(b' ').take(missing));
    updated.extend(newline);
    patch_dict_len(&mut updated);

    debug_assert_eq!(updated.len(), header_end_pos);
    Ok(updated)
}
