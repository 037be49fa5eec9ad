use edfcodec::{EdfError, EdfFile, EdfReader, EdfWriter, Header, Signal};
use std::fs;
use std::io::Cursor;

// 创建测试信号的辅助函数
fn create_ecg_signal() -> Signal {
    Signal {
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
    }
}

fn create_sound_signal() -> Signal {
    Signal {
        index: 1,
        label: "SOUND".to_string(),
        transducer_type: "UNKNOWN".to_string(),
        physical_dimension: "mV".to_string(),
        physical_minimum: -44.0,
        physical_maximum: 44.0,
        digital_minimum: -2048,
        digital_maximum: 2047,
        prefiltering: "UNKNOWN".to_string(),
        samples_per_record: 10,
        reserved: "RESERVED".to_string(),
        samples: vec![11, 200, 300, 123, 87, 204, 145, 234, 222, 75],
    }
}

fn create_header(signal_count: i32, record_count: usize) -> Header {
    Header {
        version: "0".to_string(),
        patient_id: "TEST PATIENT ID".to_string(),
        record_id: "TEST RECORD ID".to_string(),
        start_date: "11.11.16".to_string(),
        start_time: "12.12.12".to_string(),
        reserved: "RESERVED".to_string(),
        record_count,
        record_duration_seconds: 1.0,
        signal_count,
        ..Default::default()
    }
}

fn encode(header: &mut Header, signals: &[Signal]) -> Vec<u8> {
    let mut writer = EdfWriter::new(Vec::new());
    writer.write_edf(header, signals).unwrap();
    writer.into_inner()
}

fn decode(bytes: Vec<u8>) -> (Header, Vec<Signal>) {
    let mut reader = EdfReader::new(Cursor::new(bytes));
    let header = reader.read_header().unwrap();
    let signals = reader.read_signals(&header).unwrap();
    (header, signals)
}

/// 生成多记录信号: 每个记录的样本值都不同
fn multi_record_signals(records: usize) -> Vec<Signal> {
    let mut eeg = create_ecg_signal();
    eeg.label = "EEG C3".to_string();
    eeg.samples_per_record = 7;
    eeg.samples = (0..records * 7).map(|i| (i as i16) * 3 - 500).collect();

    let mut resp = create_sound_signal();
    resp.label = "RESP".to_string();
    resp.samples_per_record = 3;
    resp.physical_minimum = -0.5;
    resp.physical_maximum = 0.75;
    resp.samples = (0..records * 3).map(|i| 2000 - (i as i16) * 11).collect();

    vec![eeg, resp]
}

#[test]
fn test_two_signal_scenario() {
    let mut header = create_header(2, 1);
    let signals = vec![create_ecg_signal(), create_sound_signal()];

    let bytes = encode(&mut header, &signals);
    let (decoded, decoded_signals) = decode(bytes);

    assert_eq!(decoded.signal_count, 2);
    assert_eq!(decoded_signals.len(), 2);
    assert_eq!(decoded_signals[0].samples, vec![100, 50, 23, 75, 12, 88, 73, 12, 34, 83]);
    assert_eq!(decoded_signals[1].samples, vec![11, 200, 300, 123, 87, 204, 145, 234, 222, 75]);
    assert_eq!(decoded_signals[0].physical_maximum, 10.2325);
    assert_eq!(decoded_signals[1].physical_minimum, -44.0);
}

#[test]
fn test_round_trip_single_and_multi_record() {
    for records in [1usize, 5] {
        let mut header = create_header(2, records);
        let signals = multi_record_signals(records);

        let bytes = encode(&mut header, &signals);
        assert_eq!(bytes.len(), 768 + records * (7 + 3) * 2);

        let (decoded, decoded_signals) = decode(bytes);
        assert_eq!(decoded, header, "header mismatch for {} records", records);
        assert_eq!(decoded_signals, signals, "signal mismatch for {} records", records);
    }
}

#[test]
fn test_reencode_is_bit_identical() {
    let mut header = create_header(2, 5);
    let signals = multi_record_signals(5);
    let first = encode(&mut header, &signals);

    let (mut decoded, decoded_signals) = decode(first.clone());
    let second = encode(&mut decoded, &decoded_signals);
    assert_eq!(first, second);
}

#[test]
fn test_header_size_always_recomputed() {
    for stale in [0usize, 256, 999_999] {
        let mut header = create_header(2, 1);
        header.header_size_bytes = stale;
        let signals = vec![create_ecg_signal(), create_sound_signal()];

        let bytes = encode(&mut header, &signals);
        assert_eq!(header.header_size_bytes, 256 + 256 * 2);

        let (decoded, _) = decode(bytes);
        assert_eq!(decoded.header_size_bytes, 768);
    }
}

#[test]
fn test_padding_and_truncation() {
    let mut header = create_header(1, 1);
    header.patient_id = "P".repeat(95);
    header.record_id = "  short  ".trim().to_string();

    let mut signal = create_ecg_signal();
    signal.label = "EXTREMELY LONG SIGNAL LABEL".to_string();
    signal.physical_dimension = "uV".to_string();

    let bytes = encode(&mut header, &[signal]);

    // 截断为字段宽度
    assert_eq!(&bytes[8..88], "P".repeat(80).as_bytes());
    // 右侧补空格
    assert_eq!(&bytes[88..93], b"short");
    assert!(bytes[93..168].iter().all(|&b| b == b' '));

    let (decoded, decoded_signals) = decode(bytes);
    assert_eq!(decoded.patient_id, "P".repeat(80));
    assert_eq!(decoded.record_id, "short");
    assert_eq!(decoded_signals[0].label, "EXTREMELY LONG S");
    assert_eq!(decoded_signals[0].physical_dimension, "uV");
}

#[test]
fn test_file_save_and_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test_basic_cycle.edf");

    let mut file = EdfFile::with_signals(create_header(2, 5), multi_record_signals(5));
    file.save(&path).unwrap();

    let written = fs::read(&path).unwrap();
    assert_eq!(written.len(), 768 + 5 * 20);

    let reopened = EdfFile::open(&path).unwrap();
    assert_eq!(reopened.header(), file.header());
    assert_eq!(reopened.signals(), file.signals());
    assert!(!reopened.is_open());
}

#[test]
fn test_bytes_and_base64_sources_agree() {
    use base64::Engine as _;

    let mut file = EdfFile::with_signals(create_header(2, 1), vec![create_ecg_signal(), create_sound_signal()]);
    let bytes = file.to_bytes().unwrap();

    let from_bytes = EdfFile::from_bytes(&bytes).unwrap();
    let text = base64::engine::general_purpose::STANDARD.encode(&bytes);
    let from_base64 = EdfFile::from_base64(&format!("  {}\n", text)).unwrap();

    assert_eq!(from_bytes.header(), from_base64.header());
    assert_eq!(from_bytes.signals(), from_base64.signals());
    assert_eq!(from_bytes.signals()[1].label, "SOUND");
}

#[test]
fn test_physical_scaling_after_decode() {
    let mut header = create_header(2, 1);
    let bytes = encode(&mut header, &[create_ecg_signal(), create_sound_signal()]);
    let (_, signals) = decode(bytes);

    let scale = signals[1].scale_factor().unwrap();
    assert!((scale - 88.0 / 4095.0).abs() < 1e-12);
    let scaled = signals[1].scaled_samples().unwrap();
    assert!((scaled[2] - 300.0 * scale).abs() < 1e-12);
}

#[test]
fn test_recording_timeline() {
    let mut header = create_header(2, 1);
    let bytes = encode(&mut header, &[create_ecg_signal(), create_sound_signal()]);
    let (decoded, signals) = decode(bytes);

    let start = decoded.start_instant().unwrap();
    assert_eq!(edfcodec::utils::format_timestamp(&start), "11.11.2016 12:12:12.000");

    let fifth = decoded.sample_instant(&signals[0], 5).unwrap();
    assert_eq!(edfcodec::utils::format_timestamp(&fifth), "11.11.2016 12:12:12.500");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nonexistent.edf");

    match EdfFile::open(&path) {
        Err(EdfError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(EdfFile::open_lazy(&path), Err(EdfError::Io(_))));
}

#[test]
fn test_truncated_file_aborts_decode() {
    let mut header = create_header(2, 1);
    let bytes = encode(&mut header, &[create_ecg_signal(), create_sound_signal()]);

    // 头部被截断
    let err = EdfFile::from_bytes(&bytes[..300]).unwrap_err();
    assert!(err.is_format_error());
    assert!(matches!(err, EdfError::Truncated { .. }));

    // 数据记录被截断
    let err = EdfFile::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, EdfError::Truncated { .. }));
}

#[test]
fn test_oversized_declared_body_is_truncated() {
    let mut header = create_header(1, 1);
    let mut bytes = encode(&mut header, &[create_ecg_signal()]);
    // 记录数与第一个信号的每记录样本数都改成极大值
    bytes[236..244].copy_from_slice(b"99999999");
    let spr = 256 + 16 + 80 + 8 + 8 + 8 + 8 + 8 + 80;
    bytes[spr..spr + 8].copy_from_slice(b"99999999");
    assert_eq!(bytes.len(), 512 + 20);

    match EdfFile::from_bytes(&bytes) {
        Err(EdfError::Truncated { field }) => assert_eq!(field, "data record 0 of 99999999"),
        other => panic!("unexpected result: {:?}", other),
    }

    let mut lazy = EdfFile::lazy_from_reader(Cursor::new(bytes)).unwrap();
    assert!(matches!(lazy.read_signal(0), Err(EdfError::Truncated { .. })));
    assert!(lazy.signals()[0].samples.is_empty());
}

#[test]
fn test_garbage_numeric_field_aborts_decode() {
    let mut header = create_header(2, 1);
    let mut bytes = encode(&mut header, &[create_ecg_signal(), create_sound_signal()]);
    // 第一个信号的数字最大值
    let dig_max = 256 + 2 * (16 + 80 + 8 + 8 + 8 + 8);
    bytes[dig_max..dig_max + 8].copy_from_slice(b"2,047   ");

    match EdfFile::from_bytes(&bytes) {
        Err(EdfError::InvalidNumber { field, text }) => {
            assert_eq!(field, "digitalMaximum");
            assert_eq!(text, "2,047");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_signal_count_mismatch_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mismatch.edf");

    let mut file = EdfFile::with_signals(create_header(3, 1), vec![create_ecg_signal()]);
    assert!(matches!(
        file.save(&path),
        Err(EdfError::SignalCountMismatch { declared: 3, supplied: 1 })
    ));
}

#[test]
fn test_zero_signals_round_trip() {
    let mut file = EdfFile::with_signals(create_header(0, 0), Vec::new());
    let bytes = file.to_bytes().unwrap();
    assert_eq!(bytes.len(), 256);

    let decoded = EdfFile::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.header().map(|h| h.signal_count), Some(0));
    assert!(decoded.signals().is_empty());
}
