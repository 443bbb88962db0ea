use std::borrow::Borrow;
use std::cmp;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::dtype::NpyScalar;
use crate::error::Result;
use crate::header::{self, DICT_LEN_OFFSET};
use crate::record::{FieldDescriptor, Record, RecordLayout};

/// record count declared by the placeholder header, wide enough for any final count
const PLACEHOLDER_COUNT: u64 = u64::max_value();
/// approximate size of the in-memory record buffer
const BUFFER_TARGET_BYTES: usize = 256;

/// number of records buffered before a flush, at least one
fn buffer_capacity(record_size: usize) -> usize {
    cmp::max(1, BUFFER_TARGET_BYTES / record_size)
}

fn file_writer(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// header reserved up front: full length, but dict and its length zeroed
fn placeholder_header(layout: &RecordLayout) -> Result<Vec<u8>> {
    let mut header = header::create_header(layout, &[PLACEHOLDER_COUNT])?;
    for byte in header[DICT_LEN_OFFSET..].iter_mut() {
        *byte = 0;
    }
    Ok(header)
}

/// Handle to a `.npy` stream of records of type `R`, written to `W`.
///
/// The header is reserved when the stream is created and patched with the
/// number of records written when the stream is closed. Dropping an open
/// stream closes it too; use [`NpyStream::close`] to observe errors.
///
/// ```no_run
/// # use npystream::NpyStream;
/// let mut stream = NpyStream::<f32>::create("samples.npy")?;
/// stream.write_slice(&[0.5, 0.25])?;
/// stream.push(0.125)?;
/// stream.close()?;
/// # Ok::<(), npystream::NpyError>(())
/// ```
pub struct NpyStream<R: Record, W: Write + Seek = BufWriter<File>> {
    /// used in log lines only
    name: String,
    path: Option<PathBuf>,
    wtr: W,
    layout: RecordLayout,
    /// writer position of the magic string
    header_start: u64,
    /// length of the reserved header region, where records start
    header_end_pos: usize,
    values_written: u64,
    buffer: Vec<u8>,
    buffer_capacity: usize,
    buffer_fill: usize,
    finalized: bool,
    _record: PhantomData<R>,
}

impl<R: Record> NpyStream<R> {
    /// Creates a `.npy` file at `path`.
    ///
    /// Single-field records produce a plain array, wider records a
    /// structured array with fields `f0`, `f1`, ...
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_file(path.as_ref(), RecordLayout::of::<R>())
    }

    /// Creates a structured `.npy` file at `path` with one label per field.
    ///
    /// Fails before touching the file system if the number of labels does
    /// not match the number of fields in `R`.
    pub fn with_labels<P: AsRef<Path>, S: AsRef<str>>(path: P, labels: &[S]) -> Result<Self> {
        let layout = RecordLayout::labelled::<R, S>(labels)?;
        Self::create_file(path.as_ref(), layout)
    }

    fn create_file(path: &Path, layout: RecordLayout) -> Result<Self> {
        let header = placeholder_header(&layout)?;
        let wtr = file_writer(path)?;
        Self::start(wtr, layout, header, Some(path.to_owned()))
    }
}

impl<R: Record, W: Write + Seek> NpyStream<R, W> {
    /// Starts a stream on an arbitrary seekable writer.
    ///
    /// The header is written at the writer's current position and patched
    /// there on close.
    pub fn from_writer(wtr: W) -> Result<Self> {
        let layout = RecordLayout::of::<R>();
        let header = placeholder_header(&layout)?;
        Self::start(wtr, layout, header, None)
    }

    /// Like [`NpyStream::from_writer`], with one label per field.
    pub fn from_writer_with_labels<S: AsRef<str>>(wtr: W, labels: &[S]) -> Result<Self> {
        let layout = RecordLayout::labelled::<R, S>(labels)?;
        let header = placeholder_header(&layout)?;
        Self::start(wtr, layout, header, None)
    }

    fn start(mut wtr: W, layout: RecordLayout, header: Vec<u8>, path: Option<PathBuf>) -> Result<Self> {
        let header_start = wtr.seek(SeekFrom::Current(0))?;
        wtr.write_all(&header)?;

        let name = match path {
            Some(ref path) => path.display().to_string(),
            None => "<writer>".to_owned(),
        };
        let header_end_pos = header.len();
        let record_size = layout.record_size();
        let buffer_capacity = buffer_capacity(record_size);
        debug!(
            "Created {} ({} byte header, {} byte records, buffering {})",
            name, header_end_pos, record_size, buffer_capacity
        );

        Ok(NpyStream {
            name,
            path,
            wtr,
            layout,
            header_start,
            header_end_pos,
            values_written: 0,
            buffer: vec![0; buffer_capacity * record_size],
            buffer_capacity,
            buffer_fill: 0,
            finalized: false,
            _record: PhantomData,
        })
    }

    /// append one record
    pub fn push(&mut self, record: R) -> Result<()> {
        self.write(&record)
    }

    /// Appends one record, flushing the buffer once it is full.
    pub fn write(&mut self, record: &R) -> Result<()> {
        assert!(self.buffer_fill < self.buffer_capacity, "record buffer overrun");
        let record_size = self.layout.record_size();
        let start = self.buffer_fill * record_size;
        let slot = &mut self.buffer[start..start + record_size];
        record.write_fields(slot, self.layout.offsets());

        self.buffer_fill += 1;
        self.values_written += 1;
        if self.buffer_fill == self.buffer_capacity {
            self.flush_buffer()?;
        }
        Ok(())
    }

    /// Appends every record yielded by `records`, in order.
    pub fn write_iter<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<R>,
    {
        for record in records {
            self.write(record.borrow())?;
        }
        Ok(())
    }

    /// Hands the buffered records to the file writer and empties the buffer.
    pub fn flush_buffer(&mut self) -> Result<()> {
        if self.buffer_fill == 0 {
            return Ok(());
        }
        let end = self.buffer_fill * self.layout.record_size();
        self.wtr.write_all(&self.buffer[..end])?;
        trace!("Flushed {} records to {}", self.buffer_fill, self.name);
        self.buffer_fill = 0;
        Ok(())
    }

    /// Pushes buffered records all the way to the file.
    ///
    /// The header keeps its placeholder until the stream is closed.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_buffer()?;
        self.wtr.flush()?;
        Ok(())
    }

    /// Flushes outstanding records and patches the header with the final
    /// record count.
    ///
    /// The header is patched even if flushing the records failed, so the
    /// file stays readable; the first error is returned.
    pub fn close(mut self) -> Result<()> {
        self.finalize()
    }

    fn finalize(&mut self) -> Result<()> {
        // runs at most once, even if it fails halfway
        self.finalized = true;
        let flushed = self.flush_buffer();
        let patched = self.write_header();
        flushed.and(patched)?;

        debug!("Finalized {} with {} records", self.name, self.values_written);
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        let header =
            header::rewrite_header(self.header_end_pos, self.values_written, &self.layout)?;
        self.wtr.seek(SeekFrom::Start(self.header_start))?;
        self.wtr.write_all(&header)?;
        self.wtr.flush()?;
        Ok(())
    }

    /// number of records written so far, buffered ones included
    pub fn len(&self) -> u64 {
        self.values_written
    }

    /// true if nothing was written yet
    pub fn is_empty(&self) -> bool {
        self.values_written == 0
    }

    /// size of the reserved header in bytes, i.e. where record data starts
    pub fn header_len(&self) -> usize {
        self.header_end_pos
    }

    /// path the stream was created at, if it writes to a file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref().map(PathBuf::as_path)
    }

    /// field descriptors as declared in the header
    pub fn fields(&self) -> &[FieldDescriptor] {
        self.layout.fields()
    }

    /// number of records held in memory between flushes
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }
}

impl<T: NpyScalar, W: Write + Seek> NpyStream<T, W> {
    /// Appends a contiguous block of values.
    ///
    /// Buffered records are flushed first so ordering is preserved; the
    /// values are then encoded through the record buffer one chunk at a time.
    pub fn write_slice(&mut self, values: &[T]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.flush_buffer()?;
        for chunk in values.chunks(self.buffer_capacity) {
            let end = chunk.len() * T::SIZE;
            T::encode_into(chunk, &mut self.buffer[..end]);
            self.wtr.write_all(&self.buffer[..end])?;
            self.values_written += chunk.len() as u64;
        }
        Ok(())
    }
}

impl<R: Record, W: Write + Seek> Drop for NpyStream<R, W> {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        if let Err(err) = self.finalize() {
            error!("Error finalizing {}: {}", self.name, err);
        }
    }
}
