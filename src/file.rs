use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use base64::Engine as _;
use log::debug;

use crate::error::{EdfError, Result};
use crate::reader::EdfReader;
use crate::types::{Header, Signal};
use crate::writer::EdfWriter;

/// Byte source kept open by a lazily opened [`EdfFile`]
trait Source: Read + Seek {}

impl<T: Read + Seek> Source for T {}

/// A whole EDF container: header, signals and, for lazily opened files, the
/// byte source they are read from.
///
/// Two read modes are supported:
///
/// * **eager** ([`open`](Self::open), [`from_bytes`](Self::from_bytes),
///   [`from_base64`](Self::from_base64), [`from_reader`](Self::from_reader)):
///   every signal is decoded and the source is released before the
///   constructor returns, whether it succeeds or not.
/// * **lazy** ([`open_lazy`](Self::open_lazy),
///   [`lazy_from_reader`](Self::lazy_from_reader)): only the header is
///   decoded; signals start with empty buffers and are filled on demand by
///   [`read_signal`](Self::read_signal) or
///   [`read_signal_by_label`](Self::read_signal_by_label). The source stays
///   open until [`close`](Self::close) or drop.
///
/// An `EdfFile` owns exactly one source and every read seeks it, so it is a
/// single-owner value; share it across threads only behind your own lock.
///
/// # Examples
///
/// ## Eager read
///
/// ```rust
/// use edfcodec::EdfFile;
///
/// # let dir = tempfile::tempdir()?;
/// # let path = dir.path().join("recording.edf");
/// # edfcodec::doctest_utils::create_two_signal_file(&path)?;
/// let file = EdfFile::open(&path)?;
///
/// println!("{}", file);
/// assert_eq!(file.signals().len(), 2);
/// assert_eq!(file.signals()[0].samples.len(), 10);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// ## Lazy read of one channel
///
/// ```rust
/// use edfcodec::EdfFile;
///
/// # let dir = tempfile::tempdir()?;
/// # let path = dir.path().join("recording.edf");
/// # edfcodec::doctest_utils::create_two_signal_file(&path)?;
/// let mut file = EdfFile::open_lazy(&path)?;
///
/// match file.read_signal_by_label("SOUND")? {
///     Some(signal) => println!("{}", signal),
///     None => println!("no such signal"),
/// }
/// assert!(file.read_signal_by_label("EEG")?.is_none());
///
/// file.close();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct EdfFile {
    header: Option<Header>,
    signals: Vec<Signal>,
    source: Option<EdfReader<BufReader<Box<dyn Source + Send>>>>,
}

impl EdfFile {
    /// An empty container with no header; saving it writes nothing
    pub fn new() -> Self {
        EdfFile {
            header: None,
            signals: Vec::new(),
            source: None,
        }
    }

    /// A container ready to be saved
    pub fn with_signals(header: Header, signals: Vec<Signal>) -> Self {
        EdfFile {
            header: Some(header),
            signals,
            source: None,
        }
    }

    /// Opens `path` and decodes the header and every signal
    ///
    /// # Errors
    ///
    /// * `EdfError::Io` - the file cannot be opened or read
    /// * any decode error of [`EdfReader`]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        debug!("Opening {}", path.as_ref().display());
        Self::from_reader(BufReader::new(file))
    }

    /// Decodes an in-memory image of a whole file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Decodes a base64 encoded image of a whole file
    ///
    /// ```rust
    /// use base64::Engine as _;
    /// use edfcodec::EdfFile;
    ///
    /// # let bytes = edfcodec::doctest_utils::two_signal_bytes()?;
    /// let text = base64::engine::general_purpose::STANDARD.encode(&bytes);
    /// let file = EdfFile::from_base64(&text)?;
    /// assert_eq!(file.header().map(|h| h.signal_count), Some(2));
    /// # Ok::<(), edfcodec::EdfError>(())
    /// ```
    pub fn from_base64(text: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(text.trim())?;
        Self::from_bytes(&bytes)
    }

    /// Decodes the header and every signal from `source`, which is dropped
    /// before returning
    pub fn from_reader<R: Read + Seek>(source: R) -> Result<Self> {
        let mut reader = EdfReader::new(source);
        let header = reader.read_header()?;
        let signals = reader.read_signals(&header)?;

        Ok(EdfFile {
            header: Some(header),
            signals,
            source: None,
        })
    }

    /// Opens `path` and decodes only the header, keeping the file open for
    /// later single-signal reads
    pub fn open_lazy<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        debug!("Opening {} for on-demand reads", path.as_ref().display());
        Self::lazy_from_reader(file)
    }

    /// Decodes only the header of `source` and keeps it for later
    /// single-signal reads. The source is buffered here, so pass it unbuffered.
    pub fn lazy_from_reader<R: Read + Seek + Send + 'static>(source: R) -> Result<Self> {
        let boxed: Box<dyn Source + Send> = Box::new(source);
        // 缓冲层放在 Box 外面，跳过其他信号时才能复用缓冲区
        let mut reader = EdfReader::new(BufReader::new(boxed));
        let header = reader.read_header()?;
        let signals = reader.allocate_signals(&header);

        Ok(EdfFile {
            header: Some(header),
            signals,
            source: Some(reader),
        })
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn header_mut(&mut self) -> Option<&mut Header> {
        self.header.as_mut()
    }

    pub fn set_header(&mut self, header: Header) {
        self.header = Some(header);
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn signals_mut(&mut self) -> &mut Vec<Signal> {
        &mut self.signals
    }

    pub fn set_signals(&mut self, signals: Vec<Signal>) {
        self.signals = signals;
    }

    /// First signal whose label equals `label`
    pub fn signal_by_label(&self, label: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.label == label)
    }

    /// Whether a byte source is still held for on-demand reads
    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Fills the sample buffer of signal `index` from the held source.
    ///
    /// A failed read leaves every buffer, including the target's, unchanged.
    ///
    /// # Errors
    ///
    /// * `EdfError::NoSource` - the file was not opened lazily, or was closed
    /// * `EdfError::InvalidSignalIndex` - no signal `index`
    /// * any decode error of [`EdfReader::read_signal`]
    pub fn read_signal(&mut self, index: usize) -> Result<&Signal> {
        let header = self.header.as_ref().ok_or(EdfError::NoSource)?;
        let reader = self.source.as_mut().ok_or(EdfError::NoSource)?;
        let signal = self
            .signals
            .get_mut(index)
            .ok_or(EdfError::InvalidSignalIndex(index))?;

        reader.read_signal(header, signal)?;
        Ok(&self.signals[index])
    }

    /// Like [`read_signal`](Self::read_signal) for the first signal labelled
    /// `label`. A missing label is `Ok(None)`, not an error.
    pub fn read_signal_by_label(&mut self, label: &str) -> Result<Option<&Signal>> {
        match self.signals.iter().position(|s| s.label == label) {
            Some(index) => self.read_signal(index).map(Some),
            None => Ok(None),
        }
    }

    /// Releases the held byte source; already read buffers stay available
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            debug!("Byte source released");
        }
    }

    /// Encodes the container into `path`, replacing any existing file.
    ///
    /// Without a header this does nothing and creates no file.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if self.header.is_none() {
            return Ok(());
        }

        let file = File::create(&path)?;
        debug!("Saving {}", path.as_ref().display());
        self.write_to(BufWriter::new(file))
    }

    /// Encodes the container into `sink`. Without a header nothing is written.
    pub fn write_to<W: Write>(&mut self, sink: W) -> Result<()> {
        let header = match self.header.as_mut() {
            Some(header) => header,
            None => return Ok(()),
        };

        let mut writer = EdfWriter::new(sink);
        writer.write_edf(header, &self.signals)
    }

    /// Encodes the container into a new buffer
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }
}

impl Default for EdfFile {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EdfFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdfFile")
            .field("header", &self.header)
            .field("signals", &self.signals)
            .field("open", &self.is_open())
            .finish()
    }
}

impl fmt::Display for EdfFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.header {
            Some(header) => writeln!(f, "{}", header)?,
            None => writeln!(f, "(no header)")?,
        }
        for signal in &self.signals {
            writeln!(f, "{}", signal)?;
        }
        Ok(())
    }
}
