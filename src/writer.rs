use std::io::Write;

use log::{debug, trace, warn};

use crate::error::{EdfError, Result};
use crate::fields;
use crate::types::{Header, Signal, SignalColumns};
use crate::utils::{format_float, format_int, pad_ascii};

/// Encoder writing a [`Header`] and its [`Signal`]s to any byte sink
///
/// Every slot is written at exactly its declared width: text is cut or padded
/// with spaces, numbers are formatted first and then fitted the same way.
///
/// # Examples
///
/// ```rust
/// use edfcodec::{EdfWriter, Header, Signal};
///
/// let signal = Signal {
///     label: "ECG".to_string(),
///     physical_dimension: "mV".to_string(),
///     physical_minimum: -10.2325,
///     physical_maximum: 10.2325,
///     digital_minimum: -2048,
///     digital_maximum: 2047,
///     samples_per_record: 4,
///     samples: vec![1, 2, 3, 4, 5, 6, 7, 8],
///     ..Default::default()
/// };
///
/// let mut header = Header {
///     start_date: "11.11.16".to_string(),
///     start_time: "12.12.12".to_string(),
///     record_count: 2,
///     signal_count: 1,
///     ..Default::default()
/// };
///
/// let mut writer = EdfWriter::new(Vec::new());
/// writer.write_edf(&mut header, &[signal])?;
/// let bytes = writer.into_inner();
///
/// assert_eq!(header.header_size_bytes, 512);
/// assert_eq!(bytes.len(), 512 + 2 * 4 * 2);
/// # Ok::<(), edfcodec::EdfError>(())
/// ```
pub struct EdfWriter<W> {
    inner: W,
}

impl<W: Write> EdfWriter<W> {
    pub fn new(inner: W) -> Self {
        EdfWriter { inner }
    }

    /// Gives back the underlying sink
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Writes the header block, the signal metadata block and all data records.
    ///
    /// Before anything is written the derived header state is refreshed:
    /// `header_size_bytes` becomes `256 + 256 * signal_count` and the header's
    /// signal columns are rebuilt from `signals`.
    ///
    /// # Errors
    ///
    /// * `EdfError::SignalCountMismatch` - `signals.len()` differs from the declared count
    /// * `EdfError::SampleCountMismatch` - a signal holds fewer than
    ///   `record_count * samples_per_record` samples
    /// * `EdfError::Io` - the sink failed
    pub fn write_edf(&mut self, header: &mut Header, signals: &[Signal]) -> Result<()> {
        if header.signal_len() != signals.len() {
            return Err(EdfError::SignalCountMismatch {
                declared: header.signal_count,
                supplied: signals.len(),
            });
        }

        for signal in signals {
            // an unrepresentable count can never be met by a real buffer
            let expected = header
                .record_count
                .checked_mul(signal.samples_per_record)
                .unwrap_or(usize::MAX);
            if signal.samples.len() < expected {
                return Err(EdfError::SampleCountMismatch {
                    label: signal.label.clone(),
                    expected,
                    actual: signal.samples.len(),
                });
            }
            if signal.samples.len() > expected {
                warn!(
                    "Signal {:?} holds {} samples, only {} are written",
                    signal.label,
                    signal.samples.len(),
                    expected
                );
            }
        }

        header.header_size_bytes = header.expected_header_size();
        header.signals = SignalColumns::from_signals(signals);

        self.write_header(header)?;
        self.write_signal_headers(signals)?;
        debug!("Writer position after header: {}", header.header_size_bytes);

        self.write_records(header, signals)?;
        self.inner.flush()?;

        debug!(
            "Wrote {} records, {} bytes total",
            header.record_count,
            header
                .record_count
                .saturating_mul(header.record_size())
                .saturating_add(header.header_size_bytes)
        );
        Ok(())
    }

    /// 写入主头部 (256字节)
    fn write_header(&mut self, header: &Header) -> Result<()> {
        let mut block = Vec::with_capacity(crate::HEADER_BLOCK_SIZE);

        block.extend(pad_ascii(&header.version, fields::VERSION.width));
        block.extend(pad_ascii(&header.patient_id, fields::PATIENT_ID.width));
        block.extend(pad_ascii(&header.record_id, fields::RECORD_ID.width));
        block.extend(pad_ascii(&header.start_date, fields::START_DATE.width));
        block.extend(pad_ascii(&header.start_time, fields::START_TIME.width));
        block.extend(format_int(header.header_size_bytes, fields::HEADER_SIZE_BYTES.width));
        block.extend(pad_ascii(&header.reserved, fields::RESERVED.width));
        block.extend(format_int(header.record_count, fields::RECORD_COUNT.width));
        block.extend(format_float(header.record_duration_seconds, fields::RECORD_DURATION.width));
        block.extend(format_int(header.signal_count, fields::SIGNAL_COUNT.width));

        self.inner.write_all(&block)?;
        Ok(())
    }

    /// 按字段顺序写入信号头部，每个字段所有信号一起写
    fn write_signal_headers(&mut self, signals: &[Signal]) -> Result<()> {
        let mut block = Vec::with_capacity(crate::SIGNAL_BLOCK_SIZE * signals.len());

        // 1. 标签
        for signal in signals {
            block.extend(pad_ascii(&signal.label, fields::LABEL.width));
        }
        // 2. 传感器
        for signal in signals {
            block.extend(pad_ascii(&signal.transducer_type, fields::TRANSDUCER_TYPE.width));
        }
        // 3. 物理单位
        for signal in signals {
            block.extend(pad_ascii(&signal.physical_dimension, fields::PHYSICAL_DIMENSION.width));
        }
        // 4. 物理最小值
        for signal in signals {
            block.extend(format_float(signal.physical_minimum, fields::PHYSICAL_MINIMUM.width));
        }
        // 5. 物理最大值
        for signal in signals {
            block.extend(format_float(signal.physical_maximum, fields::PHYSICAL_MAXIMUM.width));
        }
        // 6. 数字最小值
        for signal in signals {
            block.extend(format_int(signal.digital_minimum, fields::DIGITAL_MINIMUM.width));
        }
        // 7. 数字最大值
        for signal in signals {
            block.extend(format_int(signal.digital_maximum, fields::DIGITAL_MAXIMUM.width));
        }
        // 8. 预滤波
        for signal in signals {
            block.extend(pad_ascii(&signal.prefiltering, fields::PREFILTERING.width));
        }
        // 9. 每记录样本数
        for signal in signals {
            block.extend(format_int(signal.samples_per_record, fields::SAMPLES_PER_RECORD.width));
        }
        // 10. 保留字段
        for signal in signals {
            block.extend(pad_ascii(&signal.reserved, fields::SIGNAL_RESERVED.width));
        }

        self.inner.write_all(&block)?;
        Ok(())
    }

    /// Multiplexes the sample buffers: record by record, each signal
    /// contributes its next `samples_per_record` samples.
    fn write_records(&mut self, header: &Header, signals: &[Signal]) -> Result<()> {
        let record_size = header.record_size();
        if record_size == 0 {
            return Ok(());
        }
        let mut record = Vec::with_capacity(record_size);

        for index in 0..header.record_count {
            trace!("Writing record {} of {}", index, header.record_count);
            record.clear();
            for signal in signals {
                let start = index * signal.samples_per_record;
                let end = start + signal.samples_per_record;
                for sample in &signal.samples[start..end] {
                    record.extend_from_slice(&sample.to_le_bytes());
                }
            }
            self.inner.write_all(&record)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(label: &str, spr: usize, samples: Vec<i16>) -> Signal {
        Signal {
            label: label.to_string(),
            physical_minimum: -1.0,
            physical_maximum: 1.0,
            digital_minimum: -32768,
            digital_maximum: 32767,
            samples_per_record: spr,
            samples,
            ..Default::default()
        }
    }

    fn encode(header: &mut Header, signals: &[Signal]) -> Result<Vec<u8>> {
        let mut writer = EdfWriter::new(Vec::new());
        writer.write_edf(header, signals)?;
        Ok(writer.into_inner())
    }

    #[test]
    fn test_header_size_recomputed() {
        let mut header = Header {
            header_size_bytes: 12345,
            signal_count: 2,
            record_count: 1,
            ..Default::default()
        };
        let signals = vec![signal("A", 1, vec![1]), signal("B", 1, vec![2])];
        let bytes = encode(&mut header, &signals).unwrap();

        assert_eq!(header.header_size_bytes, 768);
        assert_eq!(&bytes[184..192], b"768     ");
        assert_eq!(bytes.len(), 768 + 4);
    }

    #[test]
    fn test_column_major_layout() {
        let mut header = Header { signal_count: 2, ..Default::default() };
        let signals = vec![signal("FIRST", 0, vec![]), signal("SECOND", 0, vec![])];
        let bytes = encode(&mut header, &signals).unwrap();

        // 标签列: 两个信号的标签连续存放
        assert_eq!(&bytes[256..272], b"FIRST           ");
        assert_eq!(&bytes[272..288], b"SECOND          ");
        // 数字最小值列从 256 + 2 * (16 + 80 + 8 + 8 + 8) 开始
        let dig_min = 256 + 2 * 120;
        assert_eq!(&bytes[dig_min..dig_min + 8], b"-32768  ");
        assert_eq!(&bytes[dig_min + 8..dig_min + 16], b"-32768  ");
    }

    #[test]
    fn test_records_are_multiplexed() {
        let mut header = Header { signal_count: 2, record_count: 2, ..Default::default() };
        let signals = vec![signal("A", 2, vec![1, 2, 3, 4]), signal("B", 1, vec![-1, -2])];
        let bytes = encode(&mut header, &signals).unwrap();

        let body: Vec<i16> = bytes[768..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(body, vec![1, 2, -1, 3, 4, -2]);
    }

    #[test]
    fn test_long_strings_truncated() {
        let mut header = Header {
            patient_id: "X".repeat(100),
            signal_count: 1,
            ..Default::default()
        };
        let signals = vec![signal("A LABEL LONGER THAN SIXTEEN", 0, vec![])];
        let bytes = encode(&mut header, &signals).unwrap();

        assert_eq!(bytes.len(), 512);
        assert_eq!(&bytes[8..88], "X".repeat(80).as_bytes());
        assert_eq!(&bytes[256..272], b"A LABEL LONGER T");
    }

    #[test]
    fn test_signal_count_mismatch() {
        let mut header = Header { signal_count: 3, ..Default::default() };
        let signals = vec![signal("A", 0, vec![])];
        let mut writer = EdfWriter::new(Vec::new());
        assert!(matches!(
            writer.write_edf(&mut header, &signals),
            Err(EdfError::SignalCountMismatch { declared: 3, supplied: 1 })
        ));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_short_sample_buffer() {
        let mut header = Header { signal_count: 1, record_count: 2, ..Default::default() };
        let signals = vec![signal("A", 3, vec![1, 2, 3, 4])];
        assert!(matches!(
            encode(&mut header, &signals),
            Err(EdfError::SampleCountMismatch { expected: 6, actual: 4, .. })
        ));
    }

    #[test]
    fn test_overflowing_sample_count_is_mismatch() {
        let mut header = Header { signal_count: 1, record_count: usize::MAX, ..Default::default() };
        let signals = vec![signal("A", 3, vec![1, 2, 3])];
        assert!(matches!(
            encode(&mut header, &signals),
            Err(EdfError::SampleCountMismatch { expected: usize::MAX, actual: 3, .. })
        ));
    }

    #[test]
    fn test_zero_width_records_write_no_body() {
        let mut header = Header { signal_count: 1, record_count: 1_000_000, ..Default::default() };
        let bytes = encode(&mut header, &[signal("EMPTY", 0, Vec::new())]).unwrap();
        assert_eq!(bytes.len(), 512);
    }

    #[test]
    fn test_flat_digital_range_still_encodes() {
        let mut header = Header { signal_count: 1, record_count: 1, ..Default::default() };
        let mut flat = signal("FLAT", 2, vec![5, 5]);
        flat.digital_minimum = 0;
        flat.digital_maximum = 0;
        let bytes = encode(&mut header, &[flat]).unwrap();
        assert_eq!(bytes.len(), 512 + 4);
    }
}
