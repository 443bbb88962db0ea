//! npystream writes NumPy `.npy` files whose length is not known up front.
//!
//! A placeholder header sized for `u64::MAX` records is written when the
//! stream is opened, records are appended through a small fixed buffer, and
//! the header is patched in place with the true count when the stream is
//! closed or dropped.
//!
//! ```no_run
//! use npystream::NpyStream;
//!
//! let mut stream = NpyStream::<(u32, f64)>::with_labels("ticks.npy", &["seq", "price"]).unwrap();
//! stream.push((1, 5100.01)).unwrap();
//! stream.push((2, 5100.02)).unwrap();
//! stream.close().unwrap();
//! ```
#![deny(missing_docs)]

extern crate byteorder;
extern crate num_complex;
#[macro_use]
extern crate log;

/// error type shared by the header codec and the stream
pub mod error;
/// native scalar types and their `.npy` type codes
pub mod dtype;
/// record layouts: field descriptors, offsets, tuple records
pub mod record;
/// `.npy` header construction and in-place rewrite
pub mod header;
/// buffered append-only `.npy` writer
pub mod stream;

pub use crate::dtype::NpyScalar;
pub use crate::error::{NpyError, Result};
pub use crate::header::MemoryOrder;
pub use crate::record::{FieldDescriptor, Record, RecordLayout};
pub use crate::stream::NpyStream;
pub use num_complex::Complex;
