//! Type descriptor table
//!
//! Every type that may appear in a `.npy` record maps to a one-character
//! format code and a byte width:
//!
//! | rust type                    | code | size  |
//! |------------------------------|------|-------|
//! | `i8` `i16` `i32` `i64`       | `i`  | 1-8   |
//! | `u8` `u16` `u32` `u64`       | `u`  | 1-8   |
//! | `f32` `f64`                  | `f`  | 4, 8  |
//! | `Complex<f32>` `Complex<f64>`| `c`  | 8, 16 |
//!
//! Values are always written in host byte order, which the header declares
//! through [`NATIVE_ENDIAN`].

use byteorder::{ByteOrder, NativeEndian};
use num_complex::Complex;
use std::mem;

#[cfg(not(any(target_endian = "little", target_endian = "big")))]
compile_error!("mixed-endian targets are not supported");

/// Byte order symbol of the host as it appears in a `.npy` type string
#[cfg(target_endian = "little")]
pub const NATIVE_ENDIAN: char = '<';
/// Byte order symbol of the host as it appears in a `.npy` type string
#[cfg(target_endian = "big")]
pub const NATIVE_ENDIAN: char = '>';

mod private {
    pub trait Sealed {}
}

/// A numeric scalar with a fixed `.npy` representation.
///
/// Sealed: only the types in the table above implement it.
pub trait NpyScalar: Copy + private::Sealed {
    /// one-character numpy kind code
    const FORMAT_CODE: char;
    /// width in bytes
    const SIZE: usize;

    /// writes the native-endian bytes of `self` into `out[..Self::SIZE]`
    fn write_native(&self, out: &mut [u8]);

    /// encodes `values` back to back into `out[..values.len() * Self::SIZE]`
    fn encode_into(values: &[Self], out: &mut [u8]) {
        let out = &mut out[..values.len() * Self::SIZE];
        for (chunk, value) in out.chunks_exact_mut(Self::SIZE).zip(values) {
            value.write_native(chunk);
        }
    }
}

macro_rules! impl_npy_scalar {
    ($t:ty, $code:expr, $write:ident) => {
        impl private::Sealed for $t {}

        impl NpyScalar for $t {
            const FORMAT_CODE: char = $code;
            const SIZE: usize = mem::size_of::<$t>();

            #[inline]
            fn write_native(&self, out: &mut [u8]) {
                NativeEndian::$write(&mut out[..Self::SIZE], *self);
            }
        }
    };
}

impl private::Sealed for i8 {}
impl NpyScalar for i8 {
    const FORMAT_CODE: char = 'i';
    const SIZE: usize = 1;

    #[inline]
    fn write_native(&self, out: &mut [u8]) {
        out[0] = *self as u8;
    }
}

impl private::Sealed for u8 {}
impl NpyScalar for u8 {
    const FORMAT_CODE: char = 'u';
    const SIZE: usize = 1;

    #[inline]
    fn write_native(&self, out: &mut [u8]) {
        out[0] = *self;
    }
}

impl_npy_scalar!(i16, 'i', write_i16);
impl_npy_scalar!(i32, 'i', write_i32);
impl_npy_scalar!(i64, 'i', write_i64);
impl_npy_scalar!(u16, 'u', write_u16);
impl_npy_scalar!(u32, 'u', write_u32);
impl_npy_scalar!(u64, 'u', write_u64);
impl_npy_scalar!(f32, 'f', write_f32);
impl_npy_scalar!(f64, 'f', write_f64);

// complex values are two floats of the same width, real part first
impl private::Sealed for Complex<f32> {}
impl NpyScalar for Complex<f32> {
    const FORMAT_CODE: char = 'c';
    const SIZE: usize = 2 * mem::size_of::<f32>();

    #[inline]
    fn write_native(&self, out: &mut [u8]) {
        NativeEndian::write_f32(&mut out[0..4], self.re);
        NativeEndian::write_f32(&mut out[4..8], self.im);
    }
}

impl private::Sealed for Complex<f64> {}
impl NpyScalar for Complex<f64> {
    const FORMAT_CODE: char = 'c';
    const SIZE: usize = 2 * mem::size_of::<f64>();

    #[inline]
    fn write_native(&self, out: &mut [u8]) {
        NativeEndian::write_f64(&mut out[0..8], self.re);
        NativeEndian::write_f64(&mut out[8..16], self.im);
    }
}

/// `.npy` type string such as `<f8` for a format code and byte size
pub fn type_str(format_code: char, byte_size: usize) -> String {
    format!("{}{}{}", NATIVE_ENDIAN, format_code, byte_size)
}
