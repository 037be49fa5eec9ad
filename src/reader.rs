use std::io::{self, Read, Seek, SeekFrom};

use log::{debug, error, trace, warn};

use crate::error::{EdfError, Result};
use crate::fields::{self, Field};
use crate::types::{Header, Signal, SignalColumns};
use crate::utils::{parse_float, parse_int, trim_padding};

/// Decoder over any seekable byte source
///
/// The reader has no state of its own besides the stream position, so one
/// header can be decoded once and then used for any number of
/// [`read_signal`](Self::read_signal) calls.
///
/// # Examples
///
/// ## Decoding everything
///
/// ```rust
/// use edfcodec::EdfReader;
/// use std::io::Cursor;
///
/// # let bytes = edfcodec::doctest_utils::two_signal_bytes()?;
/// let mut reader = EdfReader::new(Cursor::new(bytes));
/// let header = reader.read_header()?;
/// let signals = reader.read_signals(&header)?;
///
/// assert_eq!(signals.len(), 2);
/// for signal in &signals {
///     println!("{}", signal);
/// }
/// # Ok::<(), edfcodec::EdfError>(())
/// ```
///
/// ## Decoding a single channel
///
/// Only the target channel's samples are kept in memory; the other channels'
/// blocks are skipped with relative seeks.
///
/// ```rust
/// use edfcodec::EdfReader;
/// use std::io::Cursor;
///
/// # let bytes = edfcodec::doctest_utils::two_signal_bytes()?;
/// let mut reader = EdfReader::new(Cursor::new(bytes));
/// let header = reader.read_header()?;
///
/// let mut signals = reader.allocate_signals(&header);
/// reader.read_signal(&header, &mut signals[1])?;
///
/// assert_eq!(signals[1].label, "SOUND");
/// assert_eq!(signals[1].samples.len(), 10);
/// assert!(signals[0].samples.is_empty());
/// # Ok::<(), edfcodec::EdfError>(())
/// ```
pub struct EdfReader<R> {
    inner: R,
}

impl<R: Read + Seek> EdfReader<R> {
    pub fn new(inner: R) -> Self {
        EdfReader { inner }
    }

    /// Gives back the underlying byte source
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Decodes the fixed header block followed by the column-major signal
    /// metadata block.
    ///
    /// # Errors
    ///
    /// * `EdfError::Truncated` - the source ends inside a slot
    /// * `EdfError::InvalidNumber` - a numeric slot does not hold a number
    /// * `EdfError::Io` - any other read or seek failure
    pub fn read_header(&mut self) -> Result<Header> {
        self.inner.seek(SeekFrom::Start(0))?;

        // 固定头部 (256字节)
        let version = self.read_ascii(fields::VERSION)?;
        let patient_id = self.read_ascii(fields::PATIENT_ID)?;
        let record_id = self.read_ascii(fields::RECORD_ID)?;
        let start_date = self.read_ascii(fields::START_DATE)?;
        let start_time = self.read_ascii(fields::START_TIME)?;
        let header_size_bytes: usize = self.read_number(fields::HEADER_SIZE_BYTES)?;
        let reserved = self.read_ascii(fields::RESERVED)?;
        let record_count: usize = self.read_number(fields::RECORD_COUNT)?;
        let record_duration_seconds = self.read_float(fields::RECORD_DURATION)?;
        let signal_count: i32 = self.read_number(fields::SIGNAL_COUNT)?;

        if signal_count < 0 {
            warn!("Negative signal count {}, decoding no signals", signal_count);
        }
        let ns = signal_count.max(0) as usize;

        // 信号头部，每个字段所有信号连续存放
        let signals = SignalColumns {
            labels: self.read_ascii_column(fields::LABEL, ns)?,
            transducer_types: self.read_ascii_column(fields::TRANSDUCER_TYPE, ns)?,
            physical_dimensions: self.read_ascii_column(fields::PHYSICAL_DIMENSION, ns)?,
            physical_minimums: self.read_float_column(fields::PHYSICAL_MINIMUM, ns)?,
            physical_maximums: self.read_float_column(fields::PHYSICAL_MAXIMUM, ns)?,
            digital_minimums: self.read_number_column(fields::DIGITAL_MINIMUM, ns)?,
            digital_maximums: self.read_number_column(fields::DIGITAL_MAXIMUM, ns)?,
            prefilterings: self.read_ascii_column(fields::PREFILTERING, ns)?,
            samples_per_record: self.read_number_column(fields::SAMPLES_PER_RECORD, ns)?,
            reserveds: self.read_ascii_column(fields::SIGNAL_RESERVED, ns)?,
        };

        debug!(
            "Header decoded: {} signals, {} records of {}s, header size {}",
            ns, record_count, record_duration_seconds, header_size_bytes
        );

        Ok(Header {
            version,
            patient_id,
            record_id,
            start_date,
            start_time,
            header_size_bytes,
            reserved,
            record_count,
            record_duration_seconds,
            signal_count,
            signals,
        })
    }

    /// Builds one [`Signal`] per declared channel with metadata copied out of
    /// the header and an empty sample buffer.
    pub fn allocate_signals(&self, header: &Header) -> Vec<Signal> {
        (0..header.signal_len())
            .map(|i| Signal::from_columns(&header.signals, i))
            .collect()
    }

    /// Reads every record, keeping only the samples of `signal` and skipping
    /// over all other channels.
    ///
    /// On success the signal's buffer is replaced by exactly
    /// `record_count * samples_per_record` samples. On failure it is left as
    /// it was.
    ///
    /// # Errors
    ///
    /// * `EdfError::InvalidSignalIndex` - `signal.index` is not a declared channel
    /// * `EdfError::Truncated` - the body is shorter than the declared records
    pub fn read_signal(&mut self, header: &Header, signal: &mut Signal) -> Result<()> {
        let ns = header.signal_len();
        if signal.index >= ns || signal.index >= header.signals.samples_per_record.len() {
            return Err(EdfError::InvalidSignalIndex(signal.index));
        }

        let records = self.check_body(header)?;
        self.inner.seek(SeekFrom::Start(header.header_size_bytes as u64))?;

        // 记录数已与流长度核对过，乘积不会溢出
        let per_record = header.signals.samples_per_record[signal.index];
        let mut samples: Vec<i16> = Vec::with_capacity(records * per_record);
        let allocated = samples.capacity();
        let mut buffer = Vec::new();

        for record in 0..records {
            trace!("Record {} of signal {}", record, signal.index);
            for (i, &count) in header.signals.samples_per_record.iter().take(ns).enumerate() {
                if i == signal.index {
                    let label = header.signals.labels.get(i).map(String::as_str).unwrap_or("");
                    self.read_samples(&mut buffer, count, record, label)?;
                    samples.extend_from_slice(&buffer);
                } else {
                    self.skip_samples(count)?;
                }
            }
        }

        if samples.capacity() != allocated {
            // 预分配的缓冲区不应被扩容
            error!("Sample buffer of signal {} was resized", signal.index);
        }

        signal.samples = samples;
        Ok(())
    }

    /// Reads every record into every channel in a single pass
    ///
    /// # Errors
    ///
    /// * `EdfError::Truncated` - the body is shorter than the declared records
    pub fn read_signals(&mut self, header: &Header) -> Result<Vec<Signal>> {
        let records = self.check_body(header)?;

        let mut signals = self.allocate_signals(header);
        for signal in signals.iter_mut() {
            signal.samples.reserve_exact(records * signal.samples_per_record);
        }
        let allocated: Vec<usize> = signals.iter().map(|s| s.samples.capacity()).collect();

        self.inner.seek(SeekFrom::Start(header.header_size_bytes as u64))?;

        let mut buffer = Vec::new();
        for record in 0..records {
            trace!("Record {} of {}", record, header.record_count);
            for signal in signals.iter_mut() {
                self.read_samples(&mut buffer, signal.samples_per_record, record, &signal.label)?;
                signal.samples.extend_from_slice(&buffer);
            }
        }

        for (signal, &capacity) in signals.iter().zip(&allocated) {
            if signal.samples.capacity() != capacity {
                error!("Sample buffer of signal {} was resized", signal.index);
            }
        }

        debug!("Decoded {} records for {} signals", header.record_count, signals.len());
        Ok(signals)
    }

    /// Checks the declared records against the stream length before any
    /// buffer is sized from them.
    ///
    /// Returns the number of records to walk: `record_count`, or zero when a
    /// record holds no samples.
    fn check_body(&mut self, header: &Header) -> Result<usize> {
        let record_size = header
            .signals
            .samples_per_record
            .iter()
            .take(header.signal_len())
            .try_fold(0usize, |acc, &n| acc.checked_add(n))
            .and_then(|n| n.checked_mul(crate::SAMPLE_SIZE));
        if record_size == Some(0) || header.record_count == 0 {
            return Ok(0);
        }

        let declared_end = record_size
            .and_then(|size| size.checked_mul(header.record_count))
            .and_then(|body| body.checked_add(header.header_size_bytes));
        let stream_len = self.inner.seek(SeekFrom::End(0))?;

        match (record_size, declared_end) {
            (Some(_), Some(end)) if end as u64 <= stream_len => Ok(header.record_count),
            _ => {
                let available = usize::try_from(stream_len)
                    .unwrap_or(usize::MAX)
                    .saturating_sub(header.header_size_bytes);
                let complete = record_size.map_or(0, |size| available / size);
                warn!(
                    "{} records declared, stream of {} bytes holds {}",
                    header.record_count, stream_len, complete
                );
                Err(EdfError::Truncated {
                    field: format!("data record {} of {}", complete, header.record_count),
                })
            }
        }
    }

    /// Reads `count` little-endian i16 samples into `out` with one read call
    fn read_samples(&mut self, out: &mut Vec<i16>, count: usize, record: usize, label: &str) -> Result<()> {
        let mut bytes = vec![0u8; count * crate::SAMPLE_SIZE];
        self.inner.read_exact(&mut bytes).map_err(|e| {
            truncated(e, format!("data record {} of signal {:?}", record, label))
        })?;

        out.clear();
        out.extend(
            bytes
                .chunks_exact(crate::SAMPLE_SIZE)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]])),
        );
        Ok(())
    }

    fn skip_samples(&mut self, count: usize) -> Result<()> {
        // BufReader 在缓冲区内跳转时保留缓冲
        self.inner.seek_relative((count * crate::SAMPLE_SIZE) as i64)?;
        Ok(())
    }

    fn read_slot(&mut self, field: Field) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; field.width];
        self.inner
            .read_exact(&mut bytes)
            .map_err(|e| truncated(e, field.name.to_string()))?;
        Ok(bytes)
    }

    fn read_ascii(&mut self, field: Field) -> Result<String> {
        Ok(trim_padding(&self.read_slot(field)?))
    }

    fn read_number<T: std::str::FromStr>(&mut self, field: Field) -> Result<T> {
        let text = self.read_ascii(field)?;
        parse_int(field, &text)
    }

    fn read_float(&mut self, field: Field) -> Result<f64> {
        let text = self.read_ascii(field)?;
        parse_float(field, &text)
    }

    fn read_ascii_column(&mut self, field: Field, count: usize) -> Result<Vec<String>> {
        (0..count).map(|_| self.read_ascii(field)).collect()
    }

    fn read_number_column<T: std::str::FromStr>(&mut self, field: Field, count: usize) -> Result<Vec<T>> {
        (0..count).map(|_| self.read_number(field)).collect()
    }

    fn read_float_column(&mut self, field: Field, count: usize) -> Result<Vec<f64>> {
        (0..count).map(|_| self.read_float(field)).collect()
    }
}

fn truncated(e: io::Error, field: String) -> EdfError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        EdfError::Truncated { field }
    } else {
        EdfError::Io(e)
    }
}
