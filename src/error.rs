use std::error;
use std::fmt;
use std::io;

/// Errors raised while building headers or streaming records
#[derive(Debug)]
pub enum NpyError {
    /// labels, format codes and byte sizes passed to the header builder differ in length
    DescriptorMismatch {
        /// number of labels
        labels: usize,
        /// number of format codes
        codes: usize,
        /// number of byte sizes
        sizes: usize,
    },
    /// number of labels does not match the number of fields in the record type
    LabelMismatch {
        /// number of labels given
        labels: usize,
        /// number of fields in the record
        fields: usize,
    },
    /// header dict does not fit in the 2-byte length field
    HeaderTooLarge(usize),
    /// underlying file operation failed
    Io(io::Error),
}
use self::NpyError::*;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, NpyError>;

impl error::Error for NpyError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for NpyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DescriptorMismatch { labels, codes, sizes } => write!(
                f,
                "DescriptorMismatch: {} labels, {} format codes, {} sizes",
                labels, codes, sizes
            ),
            LabelMismatch { labels, fields } => write!(
                f,
                "LabelMismatch: {} labels given for a record of {} fields",
                labels, fields
            ),
            HeaderTooLarge(len) => write!(
                f,
                "HeaderTooLarge: dict of {} bytes exceeds {} bytes",
                len,
                u16::max_value()
            ),
            Io(ref err) => write!(f, "IoError: {}", err),
        }
    }
}

impl From<io::Error> for NpyError {
    fn from(err: io::Error) -> Self {
        NpyError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_label_mismatch() {
        let err = LabelMismatch { labels: 1, fields: 3 };
        assert_eq!(
            format!("{}", err),
            "LabelMismatch: 1 labels given for a record of 3 fields"
        );
    }

    #[test]
    fn should_wrap_io_error() {
        let err: NpyError = io::Error::new(io::ErrorKind::Other, "disk full").into();
        assert!(error::Error::source(&err).is_some());
        assert_eq!(format!("{}", err), "IoError: disk full");
    }
}
