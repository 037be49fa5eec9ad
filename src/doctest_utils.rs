// Internal utilities for documentation tests
// This file contains helper functions to generate test files for doctests

use crate::{EdfFile, Header, Result, Signal};
use std::path::Path;

/// Two one-record signals, ECG and SOUND, ten samples each
pub fn two_signal_file() -> EdfFile {
    let ecg = Signal {
        index: 0,
        label: "ECG".to_string(),
        transducer_type: "UNKNOWN".to_string(),
        physical_dimension: "mV".to_string(),
        physical_minimum: -10.2325,
        physical_maximum: 10.2325,
        digital_minimum: -2048,
        digital_maximum: 2047,
        prefiltering: "UNKNOWN".to_string(),
        samples_per_record: 10,
        reserved: "RESERVED".to_string(),
        samples: vec![100, 50, 23, 75, 12, 88, 73, 12, 34, 83],
    };

    let sound = Signal {
        index: 1,
        label: "SOUND".to_string(),
        physical_minimum: -44.0,
        physical_maximum: 44.0,
        samples: vec![11, 200, 300, 123, 87, 204, 145, 234, 222, 75],
        ..ecg.clone()
    };

    let header = Header {
        version: "0".to_string(),
        patient_id: "TEST PATIENT ID".to_string(),
        record_id: "TEST RECORD ID".to_string(),
        start_date: "11.11.16".to_string(),
        start_time: "12.12.12".to_string(),
        reserved: "RESERVED".to_string(),
        record_count: 1,
        record_duration_seconds: 1.0,
        signal_count: 2,
        ..Default::default()
    };

    EdfFile::with_signals(header, vec![ecg, sound])
}

/// Encoded bytes of [`two_signal_file`]
pub fn two_signal_bytes() -> Result<Vec<u8>> {
    two_signal_file().to_bytes()
}

/// Writes [`two_signal_file`] to `path`
pub fn create_two_signal_file<P: AsRef<Path>>(path: P) -> Result<()> {
    two_signal_file().save(path)
}
