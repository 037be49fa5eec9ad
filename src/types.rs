use std::fmt;

use chrono::NaiveDateTime;

use crate::error::{EdfError, Result};
use crate::fields;
use crate::utils::{format_timestamp, millis, parse_start_datetime};

/// Per-signal metadata as stored in the file: one vector per column,
/// each indexed by signal number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalColumns {
    pub labels: Vec<String>,
    pub transducer_types: Vec<String>,
    pub physical_dimensions: Vec<String>,
    pub physical_minimums: Vec<f64>,
    pub physical_maximums: Vec<f64>,
    pub digital_minimums: Vec<i32>,
    pub digital_maximums: Vec<i32>,
    pub prefilterings: Vec<String>,
    pub samples_per_record: Vec<usize>,
    pub reserveds: Vec<String>,
}

impl SignalColumns {
    /// Rebuilds the column set from per-channel signals
    pub fn from_signals(signals: &[Signal]) -> Self {
        SignalColumns {
            labels: signals.iter().map(|s| s.label.clone()).collect(),
            transducer_types: signals.iter().map(|s| s.transducer_type.clone()).collect(),
            physical_dimensions: signals.iter().map(|s| s.physical_dimension.clone()).collect(),
            physical_minimums: signals.iter().map(|s| s.physical_minimum).collect(),
            physical_maximums: signals.iter().map(|s| s.physical_maximum).collect(),
            digital_minimums: signals.iter().map(|s| s.digital_minimum).collect(),
            digital_maximums: signals.iter().map(|s| s.digital_maximum).collect(),
            prefilterings: signals.iter().map(|s| s.prefiltering.clone()).collect(),
            samples_per_record: signals.iter().map(|s| s.samples_per_record).collect(),
            reserveds: signals.iter().map(|s| s.reserved.clone()).collect(),
        }
    }

    /// Number of signals described, i.e. the length of the label column
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Recording-level metadata plus the column-major signal metadata block
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: String,
    pub patient_id: String,
    pub record_id: String,
    /// "dd.mm.yy"
    pub start_date: String,
    /// "hh.mm.ss"
    pub start_time: String,
    /// Always `256 + 256 * signal_count`; recomputed by the writer
    pub header_size_bytes: usize,
    pub reserved: String,
    pub record_count: usize,
    pub record_duration_seconds: f64,
    pub signal_count: i32,
    pub signals: SignalColumns,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            version: "0".to_string(),
            patient_id: String::new(),
            record_id: String::new(),
            start_date: String::new(),
            start_time: String::new(),
            header_size_bytes: crate::HEADER_BLOCK_SIZE,
            reserved: String::new(),
            record_count: 0,
            record_duration_seconds: 1.0,
            signal_count: 0,
            signals: SignalColumns::default(),
        }
    }
}

impl Header {
    /// Declared signal count, with non-positive values meaning no signals
    pub fn signal_len(&self) -> usize {
        self.signal_count.max(0) as usize
    }

    /// Header size implied by the declared signal count
    pub fn expected_header_size(&self) -> usize {
        crate::HEADER_BLOCK_SIZE + crate::SIGNAL_BLOCK_SIZE * self.signal_len()
    }

    /// Bytes occupied by one data record
    pub fn record_size(&self) -> usize {
        self.signals.samples_per_record.iter().sum::<usize>() * crate::SAMPLE_SIZE
    }

    /// Recording start from `start_date` + `start_time`
    pub fn start_instant(&self) -> Result<NaiveDateTime> {
        parse_start_datetime(&self.start_date, &self.start_time)
    }

    /// Start of data record `record`
    pub fn record_instant(&self, record: usize) -> Result<NaiveDateTime> {
        let start = self.start_instant()?;
        self.offset_instant(start, record as f64 * self.record_duration_seconds)
    }

    /// Instant of sample `sample` of `signal`, with millisecond precision.
    ///
    /// A signal without samples per record has no timeline and yields
    /// [`EdfError::NoTimeline`].
    pub fn sample_instant(&self, signal: &Signal, sample: usize) -> Result<NaiveDateTime> {
        let per_record = signal.samples_per_record;
        if per_record == 0 {
            return Err(EdfError::NoTimeline { label: signal.label.clone() });
        }

        let record_start = self.record_instant(sample / per_record)?;
        let step = self.record_duration_seconds / per_record as f64;
        self.offset_instant(record_start, (sample % per_record) as f64 * step)
    }

    fn offset_instant(&self, base: NaiveDateTime, seconds: f64) -> Result<NaiveDateTime> {
        millis(seconds)
            .and_then(|offset| base.checked_add_signed(offset))
            .ok_or(EdfError::TimestampOutOfRange { seconds })
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------- EDF File Header ----------")?;
        writeln!(f, "{}b\tVersion [{}]", fields::VERSION.width, self.version)?;
        writeln!(f, "{}b\tPatient ID [{}]", fields::PATIENT_ID.width, self.patient_id)?;
        writeln!(f, "{}b\tRecording ID [{}]", fields::RECORD_ID.width, self.record_id)?;
        writeln!(f, "{}b\tStart date [{}]", fields::START_DATE.width, self.start_date)?;
        writeln!(f, "{}b\tStart time [{}]", fields::START_TIME.width, self.start_time)?;
        if let Ok(instant) = self.start_instant() {
            writeln!(f, "\tStart instant [{}]", format_timestamp(&instant))?;
        }
        writeln!(f, "{}b\tNumber of bytes in header [{}]", fields::HEADER_SIZE_BYTES.width, self.header_size_bytes)?;
        writeln!(f, "{}b\tReserved [{}]", fields::RESERVED.width, self.reserved)?;
        writeln!(f, "{}b\tNumber of data records [{}]", fields::RECORD_COUNT.width, self.record_count)?;
        writeln!(f, "{}b\tDuration of data record [{}]", fields::RECORD_DURATION.width, self.record_duration_seconds)?;
        writeln!(f, "{}b\tNumber of signals [{}]", fields::SIGNAL_COUNT.width, self.signal_count)?;

        let columns = &self.signals;
        for i in 0..columns.len() {
            writeln!(f, "---------- Signal Header {} ----------", i)?;
            writeln!(f, "\tLabel [{}]", columns.labels[i])?;
            if let Some(v) = columns.transducer_types.get(i) {
                writeln!(f, "\tTransducer type [{}]", v)?;
            }
            if let Some(v) = columns.physical_dimensions.get(i) {
                writeln!(f, "\tPhysical dimension [{}]", v)?;
            }
            if let Some(v) = columns.physical_minimums.get(i) {
                writeln!(f, "\tPhysical minimum [{}]", v)?;
            }
            if let Some(v) = columns.physical_maximums.get(i) {
                writeln!(f, "\tPhysical maximum [{}]", v)?;
            }
            if let Some(v) = columns.digital_minimums.get(i) {
                writeln!(f, "\tDigital minimum [{}]", v)?;
            }
            if let Some(v) = columns.digital_maximums.get(i) {
                writeln!(f, "\tDigital maximum [{}]", v)?;
            }
            if let Some(v) = columns.prefilterings.get(i) {
                writeln!(f, "\tPrefiltering [{}]", v)?;
            }
            if let Some(v) = columns.samples_per_record.get(i) {
                writeln!(f, "\tNumber of samples in data record [{}]", v)?;
            }
            if let Some(v) = columns.reserveds.get(i) {
                writeln!(f, "\tSignal reserved [{}]", v)?;
            }
        }

        write!(f, "-------------------------------------")
    }
}

/// One channel: metadata copied out of the header plus its digital samples.
///
/// Changing a signal's metadata does not touch the header it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
    /// Position of this signal in the file's signal list
    pub index: usize,
    pub label: String,
    pub transducer_type: String,
    pub physical_dimension: String,
    pub physical_minimum: f64,
    pub physical_maximum: f64,
    pub digital_minimum: i32,
    pub digital_maximum: i32,
    pub prefiltering: String,
    pub samples_per_record: usize,
    pub reserved: String,
    pub samples: Vec<i16>,
}

impl Signal {
    /// Copies column `index` out of `columns`, with an empty sample buffer.
    ///
    /// Columns shorter than `index` leave the matching field at its default.
    pub fn from_columns(columns: &SignalColumns, index: usize) -> Self {
        Signal {
            index,
            label: columns.labels.get(index).cloned().unwrap_or_default(),
            transducer_type: columns.transducer_types.get(index).cloned().unwrap_or_default(),
            physical_dimension: columns.physical_dimensions.get(index).cloned().unwrap_or_default(),
            physical_minimum: columns.physical_minimums.get(index).copied().unwrap_or_default(),
            physical_maximum: columns.physical_maximums.get(index).copied().unwrap_or_default(),
            digital_minimum: columns.digital_minimums.get(index).copied().unwrap_or_default(),
            digital_maximum: columns.digital_maximums.get(index).copied().unwrap_or_default(),
            prefiltering: columns.prefilterings.get(index).cloned().unwrap_or_default(),
            samples_per_record: columns.samples_per_record.get(index).copied().unwrap_or_default(),
            reserved: columns.reserveds.get(index).cloned().unwrap_or_default(),
            samples: Vec::new(),
        }
    }

    /// 计算物理值转换参数: (物理最大 - 物理最小) / (数字最大 - 数字最小)
    ///
    /// This is a flat gain without an offset term; digital zero maps to
    /// physical zero.
    pub fn scale_factor(&self) -> Result<f64> {
        let digital_span = self.digital_maximum as i64 - self.digital_minimum as i64;
        if digital_span == 0 {
            return Err(EdfError::DigitalMinEqualsMax);
        }
        Ok((self.physical_maximum - self.physical_minimum) / digital_span as f64)
    }

    /// Sample `index` multiplied by [`scale_factor`](Self::scale_factor)
    pub fn scaled_sample(&self, index: usize) -> Result<f64> {
        let sample = *self.samples.get(index).ok_or(EdfError::InvalidSignalIndex(index))?;
        Ok(sample as f64 * self.scale_factor()?)
    }

    /// All samples multiplied by [`scale_factor`](Self::scale_factor)
    pub fn scaled_samples(&self) -> Result<Vec<f64>> {
        let scale = self.scale_factor()?;
        Ok(self.samples.iter().map(|&s| s as f64 * scale).collect())
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: Vec<String> = self.samples.iter().take(10).map(|s| s.to_string()).collect();
        write!(
            f,
            "{} {}/{} [{} ...]",
            self.label,
            self.samples_per_record,
            self.samples.len(),
            head.join(",")
        )
    }
}
