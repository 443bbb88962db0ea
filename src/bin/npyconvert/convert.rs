use npystream::dtype::NATIVE_ENDIAN;
use npystream::{NpyScalar, NpyStream, Record};
use std::error::Error;
use std::fmt::Display;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// what ended up on disk, printed as JSON when done
#[derive(Serialize, Debug, PartialEq)]
pub struct Summary {
    pub path: String,
    pub count: u64,
    pub header_len: usize,
}

fn tokens<'a>(line: &'a str, delimiter: Option<char>) -> Vec<&'a str> {
    match delimiter {
        Some(d) => line.split(d).map(str::trim).filter(|t| !t.is_empty()).collect(),
        None => line.split_whitespace().collect(),
    }
}

fn parse<T>(token: &str, lineno: usize) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    token
        .parse::<T>()
        .map_err(|err| format!("line {}: cannot parse {:?}: {}", lineno, token, err).into())
}

fn summarize<R: Record>(stream: NpyStream<R>) -> Result<Summary> {
    let summary = Summary {
        path: stream.path().map(|p| p.display().to_string()).unwrap_or_default(),
        count: stream.len(),
        header_len: stream.header_len(),
    };
    stream.close()?;
    Ok(summary)
}

/// Streams every value of the input into a one-dimensional array of `T`.
pub fn convert_scalars<T, B>(rdr: B, output: &Path, delimiter: Option<char>) -> Result<Summary>
where
    T: NpyScalar + FromStr,
    T::Err: Display,
    B: BufRead,
{
    let mut stream = NpyStream::<T>::create(output)?;
    let mut row = Vec::new();
    for (i, line) in rdr.lines().enumerate() {
        let line = line?;
        row.clear();
        for token in tokens(&line, delimiter) {
            row.push(parse::<T>(token, i + 1)?);
        }
        stream.write_slice(&row)?;
    }
    debug!("Converted {} values", stream.len());
    summarize(stream)
}

/// Streams each input line as one record of `labels.len()` f8 fields.
pub fn convert_records<R, B, F>(
    rdr: B,
    output: &Path,
    delimiter: Option<char>,
    labels: &[String],
    make: F,
) -> Result<Summary>
where
    R: Record,
    B: BufRead,
    F: Fn(&[f64]) -> R,
{
    let mut stream = NpyStream::<R>::with_labels(output, labels)?;
    let mut row = Vec::with_capacity(labels.len());
    for (i, line) in rdr.lines().enumerate() {
        let line = line?;
        let cols = tokens(&line, delimiter);
        if cols.is_empty() {
            continue;
        }
        if cols.len() != labels.len() {
            return Err(format!(
                "line {}: expected {} columns, found {}",
                i + 1,
                labels.len(),
                cols.len()
            )
            .into());
        }
        row.clear();
        for token in cols {
            row.push(parse::<f64>(token, i + 1)?);
        }
        stream.push(make(&row))?;
    }
    debug!("Converted {} records", stream.len());
    summarize(stream)
}

/// Strips the byte order from a type string such as `<i4`.
///
/// Values are written in host order, so an explicit prefix must name it.
fn native_code(dtype: &str) -> Result<&str> {
    let mut chars = dtype.chars();
    match chars.next() {
        Some('=') | Some('|') => Ok(chars.as_str()),
        Some(c) if c == NATIVE_ENDIAN => Ok(chars.as_str()),
        Some(c) if c == '<' || c == '>' => Err(format!(
            "byte order {:?} of {:?} does not match host byte order {:?}",
            c, dtype, NATIVE_ENDIAN
        )
        .into()),
        _ => Ok(dtype),
    }
}

/// Picks the record shape from `labels`: scalar mode when empty.
pub fn run<B: BufRead>(
    rdr: B,
    output: &Path,
    dtype: &str,
    delimiter: Option<char>,
    labels: &[String],
) -> Result<Summary> {
    match labels.len() {
        0 => (),
        1 => return convert_records(rdr, output, delimiter, labels, |c| (c[0],)),
        2 => return convert_records(rdr, output, delimiter, labels, |c| (c[0], c[1])),
        3 => return convert_records(rdr, output, delimiter, labels, |c| (c[0], c[1], c[2])),
        4 => {
            return convert_records(rdr, output, delimiter, labels, |c| {
                (c[0], c[1], c[2], c[3])
            })
        }
        n => return Err(format!("record mode supports 1 to 4 columns, got {}", n).into()),
    }

    match native_code(dtype)? {
        "i1" => convert_scalars::<i8, _>(rdr, output, delimiter),
        "i2" => convert_scalars::<i16, _>(rdr, output, delimiter),
        "i4" => convert_scalars::<i32, _>(rdr, output, delimiter),
        "i8" => convert_scalars::<i64, _>(rdr, output, delimiter),
        "u1" => convert_scalars::<u8, _>(rdr, output, delimiter),
        "u2" => convert_scalars::<u16, _>(rdr, output, delimiter),
        "u4" => convert_scalars::<u32, _>(rdr, output, delimiter),
        "u8" => convert_scalars::<u64, _>(rdr, output, delimiter),
        "f4" => convert_scalars::<f32, _>(rdr, output, delimiter),
        "f8" => convert_scalars::<f64, _>(rdr, output, delimiter),
        other => Err(format!("unsupported dtype {:?}", other).into()),
    }
}
