//! Fixed-width ASCII slots of the header.
//!
//! The same table drives both [`EdfReader`](crate::EdfReader) and
//! [`EdfWriter`](crate::EdfWriter), so a value written into a slot is always
//! read back from the same byte range.

/// Name and byte width of one ASCII header slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub width: usize,
}

impl Field {
    pub const fn new(name: &'static str, width: usize) -> Self {
        Field { name, width }
    }
}

// 固定头部字段 (256字节)
pub const VERSION: Field = Field::new("version", 8);
pub const PATIENT_ID: Field = Field::new("patientId", 80);
pub const RECORD_ID: Field = Field::new("recordId", 80);
pub const START_DATE: Field = Field::new("startDate", 8);
pub const START_TIME: Field = Field::new("startTime", 8);
pub const HEADER_SIZE_BYTES: Field = Field::new("headerSizeBytes", 8);
pub const RESERVED: Field = Field::new("reserved", 44);
pub const RECORD_COUNT: Field = Field::new("recordCount", 8);
pub const RECORD_DURATION: Field = Field::new("recordDurationSeconds", 8);
pub const SIGNAL_COUNT: Field = Field::new("signalCount", 4);

// 每个信号的字段 (256字节 × 信号数，按列存储)
pub const LABEL: Field = Field::new("label", 16);
pub const TRANSDUCER_TYPE: Field = Field::new("transducerType", 80);
pub const PHYSICAL_DIMENSION: Field = Field::new("physicalDimension", 8);
pub const PHYSICAL_MINIMUM: Field = Field::new("physicalMinimum", 8);
pub const PHYSICAL_MAXIMUM: Field = Field::new("physicalMaximum", 8);
pub const DIGITAL_MINIMUM: Field = Field::new("digitalMinimum", 8);
pub const DIGITAL_MAXIMUM: Field = Field::new("digitalMaximum", 8);
pub const PREFILTERING: Field = Field::new("prefiltering", 80);
pub const SAMPLES_PER_RECORD: Field = Field::new("sampleCountPerRecord", 8);
pub const SIGNAL_RESERVED: Field = Field::new("signalReserved", 32);

/// Fixed header slots in file order
pub const HEADER_FIELDS: [Field; 10] = [
    VERSION,
    PATIENT_ID,
    RECORD_ID,
    START_DATE,
    START_TIME,
    HEADER_SIZE_BYTES,
    RESERVED,
    RECORD_COUNT,
    RECORD_DURATION,
    SIGNAL_COUNT,
];

/// Per-signal columns in file order
pub const SIGNAL_FIELDS: [Field; 10] = [
    LABEL,
    TRANSDUCER_TYPE,
    PHYSICAL_DIMENSION,
    PHYSICAL_MINIMUM,
    PHYSICAL_MAXIMUM,
    DIGITAL_MINIMUM,
    DIGITAL_MAXIMUM,
    PREFILTERING,
    SAMPLES_PER_RECORD,
    SIGNAL_RESERVED,
];

/// Looks up the byte width of a slot by name
pub fn width(name: &str) -> Option<usize> {
    HEADER_FIELDS
        .iter()
        .chain(SIGNAL_FIELDS.iter())
        .find(|field| field.name == name)
        .map(|field| field.width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_are_256_bytes() {
        let fixed: usize = HEADER_FIELDS.iter().map(|f| f.width).sum();
        let per_signal: usize = SIGNAL_FIELDS.iter().map(|f| f.width).sum();
        assert_eq!(fixed, crate::HEADER_BLOCK_SIZE);
        assert_eq!(per_signal, crate::SIGNAL_BLOCK_SIZE);
    }

    #[test]
    fn test_width_lookup() {
        assert_eq!(width("patientId"), Some(80));
        assert_eq!(width("signalCount"), Some(4));
        assert_eq!(width("label"), Some(16));
        assert_eq!(width("signalReserved"), Some(32));
        assert_eq!(width("nonexistent"), None);
    }
}
