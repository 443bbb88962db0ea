extern crate npystream;
extern crate tempdir;

use npystream::dtype::NATIVE_ENDIAN;
use npystream::{Complex, NpyError, NpyStream};
use std::fs;
use std::path::Path;
use tempdir::TempDir;

/// splits a finished file into (dict text, record bytes)
fn read_npy(path: &Path) -> (String, Vec<u8>) {
    let bytes = fs::read(path).unwrap();
    assert_eq!(&bytes[..8], b"\x93NUMPY\x01\x00");
    let dict_len = bytes[8] as usize + 0x100 * bytes[9] as usize;
    let header_len = 10 + dict_len;
    assert_eq!(header_len % 16, 0);
    assert_eq!(bytes[header_len - 1], b'\n');
    let dict = String::from_utf8(bytes[10..header_len].to_vec()).unwrap();
    (dict, bytes[header_len..].to_vec())
}

fn i32s(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks(4)
        .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[test]
fn should_write_scalar_stream() {
    let dir = TempDir::new("npystream").unwrap();
    let path = dir.path().join("ints.npy");

    let mut stream = NpyStream::<i32>::create(&path).unwrap();
    stream.write_iter(&[1i32, 2, 3]).unwrap();
    stream.close().unwrap();

    let (dict, data) = read_npy(&path);
    assert!(dict.starts_with(&format!(
        "{{'descr': '{}i4', 'fortran_order': False, 'shape': (3,), }}",
        NATIVE_ENDIAN
    )));
    assert_eq!(i32s(&data), vec![1, 2, 3]);
}

#[test]
fn should_declare_true_count_after_many_flushes() {
    let dir = TempDir::new("npystream").unwrap();
    let path = dir.path().join("many.npy");

    let n = 10_007;
    let mut stream = NpyStream::<i32>::create(&path).unwrap();
    for i in 0..n {
        stream.push(i).unwrap();
    }
    let header_len = stream.header_len();
    stream.close().unwrap();

    let (dict, data) = read_npy(&path);
    assert_eq!(10 + dict.len(), header_len);
    assert!(dict.contains(&format!("'shape': ({},), }}", n)));
    assert_eq!(i32s(&data), (0..n).collect::<Vec<_>>());
}

#[test]
fn should_write_empty_stream() {
    let dir = TempDir::new("npystream").unwrap();
    let path = dir.path().join("empty.npy");

    NpyStream::<f64>::create(&path).unwrap().close().unwrap();

    let (dict, data) = read_npy(&path);
    assert!(dict.contains("'shape': (0,), }"));
    assert!(data.is_empty());
}

#[test]
fn should_finalize_on_drop() {
    let dir = TempDir::new("npystream").unwrap();
    let path = dir.path().join("dropped.npy");

    {
        let mut stream = NpyStream::<u8>::create(&path).unwrap();
        stream.write_slice(b"abc").unwrap();
        stream.push(b'd').unwrap();
    }

    let (dict, data) = read_npy(&path);
    assert!(dict.contains(&format!("'descr': '{}u1'", NATIVE_ENDIAN)));
    assert!(dict.contains("'shape': (4,), }"));
    assert_eq!(data, b"abcd");
}

#[test]
fn should_finalize_on_early_return() {
    fn write_until_error(path: &Path) -> Result<(), String> {
        let mut stream = NpyStream::<u16>::create(path).map_err(|e| e.to_string())?;
        for i in 0..5u16 {
            if i == 3 {
                return Err("stopped".to_owned());
            }
            stream.push(i).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    let dir = TempDir::new("npystream").unwrap();
    let path = dir.path().join("early.npy");
    assert!(write_until_error(&path).is_err());

    let (dict, data) = read_npy(&path);
    assert!(dict.contains("'shape': (3,), }"));
    assert_eq!(data.len(), 6);
}

#[test]
fn should_write_labelled_records() {
    let dir = TempDir::new("npystream").unwrap();
    let path = dir.path().join("ticks.npy");

    let mut stream = NpyStream::<(u64, f32, i8)>::with_labels(&path, &["ts", "price", "side"]).unwrap();
    stream.push((1_000, 5100.5, 1)).unwrap();
    stream.push((1_001, 5100.25, -1)).unwrap();
    stream.close().unwrap();

    let (dict, data) = read_npy(&path);
    assert!(dict.starts_with(&format!(
        "{{'descr': [('ts', '{e}u8'), ('price', '{e}f4'), ('side', '{e}i1')], 'fortran_order': False, 'shape': (2,), }}",
        e = NATIVE_ENDIAN
    )));

    assert_eq!(data.len(), 2 * 13);
    let second = &data[13..];
    assert_eq!(&second[..8], &1_001u64.to_ne_bytes());
    assert_eq!(&second[8..12], &5100.25f32.to_ne_bytes());
    assert_eq!(second[12], 0xFF);
}

#[test]
fn should_auto_label_unnamed_records() {
    let dir = TempDir::new("npystream").unwrap();
    let path = dir.path().join("pairs.npy");

    let records = vec![(1i16, 2.0f64), (3, 4.0)];
    let mut stream = NpyStream::<(i16, f64)>::create(&path).unwrap();
    stream.write_iter(records.iter()).unwrap();
    stream.close().unwrap();

    let (dict, data) = read_npy(&path);
    assert!(dict.starts_with(&format!(
        "{{'descr': [('f0', '{e}i2'), ('f1', '{e}f8')], ",
        e = NATIVE_ENDIAN
    )));
    assert_eq!(data.len(), 2 * 10);
}

#[test]
fn should_write_single_labelled_field_with_trailing_comma() {
    let dir = TempDir::new("npystream").unwrap();
    let path = dir.path().join("x.npy");

    let mut stream = NpyStream::<f32>::with_labels(&path, &["x"]).unwrap();
    stream.push(0.5).unwrap();
    stream.close().unwrap();

    let (dict, _) = read_npy(&path);
    assert!(dict.starts_with(&format!("{{'descr': [('x', '{}f4'),], ", NATIVE_ENDIAN)));
}

#[test]
fn should_write_complex_values() {
    let dir = TempDir::new("npystream").unwrap();
    let path = dir.path().join("complex.npy");

    let mut stream = NpyStream::<Complex<f64>>::create(&path).unwrap();
    stream
        .write_slice(&[Complex::new(1.0, 2.0), Complex::new(-3.0, 0.5)])
        .unwrap();
    stream.close().unwrap();

    let (dict, data) = read_npy(&path);
    assert!(dict.contains(&format!("'descr': '{}c16'", NATIVE_ENDIAN)));
    assert!(dict.contains("'shape': (2,), }"));
    assert_eq!(&data[16..24], &(-3.0f64).to_ne_bytes());
    assert_eq!(&data[24..32], &0.5f64.to_ne_bytes());
}

#[test]
fn should_keep_header_length_of_placeholder() {
    let dir = TempDir::new("npystream").unwrap();
    let path = dir.path().join("stable.npy");

    let stream = NpyStream::<(u8, u8)>::create(&path).unwrap();
    let reserved = stream.header_len();
    drop(stream);

    let (dict, _) = read_npy(&path);
    assert_eq!(10 + dict.len(), reserved);
    assert!(dict.trim_end().ends_with("'shape': (0,), }"));
}

#[test]
fn should_report_io_error_on_unwritable_path() {
    let dir = TempDir::new("npystream").unwrap();
    let path = dir.path().join("missing").join("a.npy");

    match NpyStream::<i32>::create(&path) {
        Err(NpyError::Io(_)) => (),
        Err(err) => panic!("expected an io error, got {}", err),
        Ok(_) => panic!("created a stream under a missing directory"),
    }
    assert!(!path.exists());
}

#[cfg(target_os = "linux")]
#[test]
fn should_report_io_error_when_device_is_full() {
    let mut stream = NpyStream::<u8>::create("/dev/full").unwrap();
    // larger than the writer's own buffer so the write reaches the device
    match stream.write_slice(&vec![0u8; 64 * 1024]) {
        Err(NpyError::Io(_)) => (),
        other => panic!("expected an io error, got {:?}", other),
    }
    match stream.close() {
        Err(NpyError::Io(_)) => (),
        other => panic!("expected an io error, got {:?}", other),
    }
}
